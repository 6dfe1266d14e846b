//! One run: locate the newest session, read it, extract metadata, parse and
//! aggregate rows, hand the result to a sink.

use crate::aggregate::{aggregate, Series};
use crate::config::PlotConfig;
use crate::header::{extract_header, HeaderMetadata};
use crate::locator::{locate_latest, LocateError, Located};
use crate::parser::{parse_rows, ParseError};
use crate::render::{ChartInput, ChartSink, RenderError};
use crate::session::SessionLog;
use std::path::PathBuf;

/// Header and series derived from one session file. A pure function of the
/// file content.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub header: HeaderMetadata,
    pub series: Vec<Series>,
}

/// How a run ended when nothing went wrong.
#[derive(Debug)]
pub enum RunOutcome {
    /// No file matched the session pattern.
    NoSessions { dir: PathBuf },
    /// The newest session has no data rows.
    EmptyData { file: PathBuf },
    /// The session was rendered by the sink.
    Rendered {
        file: PathBuf,
        count: usize,
        analysis: Analysis,
    },
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        0
    }
}

#[derive(Debug)]
pub enum RunError {
    Locate(LocateError),
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse { path: PathBuf, source: ParseError },
    Render(RenderError),
}

impl RunError {
    /// Schema errors and uncategorised I/O or render failures all exit 1.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Locate(e) => write!(f, "{e}"),
            RunError::Read { path, source } => {
                write!(f, "failed to read session {}: {}", path.display(), source)
            }
            RunError::Parse { path, source } => write!(f, "{}: {}", path.display(), source),
            RunError::Render(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Locate(e) => Some(e),
            RunError::Read { source, .. } => Some(source),
            RunError::Parse { source, .. } => Some(source),
            RunError::Render(e) => Some(e),
        }
    }
}

impl From<LocateError> for RunError {
    fn from(e: LocateError) -> Self {
        RunError::Locate(e)
    }
}

impl From<RenderError> for RunError {
    fn from(e: RenderError) -> Self {
        RunError::Render(e)
    }
}

/// Derive header and series from a loaded session.
pub fn analyze(log: &SessionLog) -> Result<Analysis, ParseError> {
    let header = extract_header(&log.lines());
    let rows = parse_rows(log.content())?;
    let series = aggregate(&rows);
    Ok(Analysis { header, series })
}

/// Run the full pipeline against the configured session directory.
pub fn run(config: &PlotConfig, sink: &dyn ChartSink) -> Result<RunOutcome, RunError> {
    let sessions = &config.sessions;
    let (path, count) = match locate_latest(&sessions.dir, &sessions.pattern)? {
        Located::Found { path, count } => (path, count),
        Located::NoSessionsFound => {
            tracing::info!(dir = %sessions.dir.display(), "no session files found");
            return Ok(RunOutcome::NoSessions {
                dir: sessions.dir.clone(),
            });
        }
    };
    tracing::info!(file = %path.display(), count, "selected latest session");

    let log = SessionLog::read(&path).map_err(|e| RunError::Read {
        path: path.clone(),
        source: e,
    })?;

    let analysis = match analyze(&log) {
        Ok(a) => a,
        Err(ParseError::EmptyData) => {
            tracing::info!(file = %path.display(), "session has no data rows");
            return Ok(RunOutcome::EmptyData { file: path });
        }
        Err(e) => return Err(RunError::Parse { path, source: e }),
    };

    tracing::debug!(
        sink = sink.name(),
        destination = %sink.destination().display(),
        series = analysis.series.len(),
        "rendering session"
    );
    sink.render(&ChartInput {
        file: log.path(),
        header: &analysis.header,
        series: &analysis.series,
    })?;

    Ok(RunOutcome::Rendered {
        file: path,
        count,
        analysis,
    })
}
