mod aggregate;
mod config;
mod header;
mod locator;
mod parser;
mod pipeline;
mod render;
mod session;

use clap::Parser;
use config::{OutputFormat, PlotConfig};
use parser::ParseError;
use pipeline::{RunError, RunOutcome};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Plot the most recent hardware temperature session log: one line per
/// sensor, with threshold bands and the capture delay/total from the
/// session's comment headers.
#[derive(Parser, Debug)]
#[command(name = "twatch", version, about)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "twatch.toml")]
    config: PathBuf,

    /// Session directory (overrides config)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Session file glob, relative to the session directory (overrides config)
    #[arg(short, long)]
    pattern: Option<String>,

    /// Chart or report output path; `-` writes the json report to stdout (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (overrides config)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Don't shade the temperature threshold bands
    #[arg(long)]
    no_bands: bool,

    /// List matching session files and exit
    #[arg(long)]
    list: bool,

    /// Print resolved settings and the selected session, don't plot
    #[arg(long)]
    dry_run: bool,

    /// Extra logging (session selection, parse details)
    #[arg(short, long)]
    verbose: bool,

    /// Only warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut PlotConfig) {
        if let Some(dir) = &self.dir {
            config.sessions.dir = dir.clone();
        }
        if let Some(pattern) = &self.pattern {
            config.sessions.pattern = pattern.clone();
        }
        if let Some(output) = &self.output {
            config.chart.output = output.clone();
        }
        if let Some(format) = self.format {
            config.chart.format = format;
        }
        if self.no_bands {
            config.chart.bands = false;
        }
    }

    fn default_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.default_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    tracing::debug!(?cli, "parsed CLI arguments");
    std::process::exit(real_main(&cli));
}

fn real_main(cli: &Cli) -> i32 {
    let mut config = match PlotConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return 1;
        }
    };
    cli.apply_overrides(&mut config);
    if let Err(e) = config.validate() {
        eprintln!("error: {e}");
        return 1;
    }

    if cli.list {
        return list_sessions(&config);
    }

    if cli.dry_run {
        return dry_run(&config);
    }

    let sink = render::sink_for(&config.chart);
    match pipeline::run(&config, sink.as_ref()) {
        Ok(outcome) => {
            report_outcome(&outcome, sink.destination());
            outcome.exit_code()
        }
        Err(e) => {
            report_error(&e);
            e.exit_code()
        }
    }
}

fn list_sessions(config: &PlotConfig) -> i32 {
    match locator::find_sessions(&config.sessions.dir, &config.sessions.pattern) {
        Ok(sessions) => {
            for path in &sessions {
                println!("{}", path.display());
            }
            println!("{} session file(s)", sessions.len());
            0
        }
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    }
}

fn dry_run(config: &PlotConfig) -> i32 {
    println!("twatch v{}", env!("CARGO_PKG_VERSION"));
    println!(
        "Sessions: {}/{}",
        config.sessions.dir.display(),
        config.sessions.pattern
    );
    println!(
        "Output: {} ({:?})",
        config.chart.output.display(),
        config.chart.format
    );
    match locator::locate_latest(&config.sessions.dir, &config.sessions.pattern) {
        Ok(locator::Located::Found { path, count }) => {
            println!("Latest of {count} session(s): {}", path.display());
            0
        }
        Ok(locator::Located::NoSessionsFound) => {
            println!("Found 0 sessions");
            0
        }
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    }
}

fn report_outcome(outcome: &RunOutcome, destination: &std::path::Path) {
    match outcome {
        RunOutcome::NoSessions { dir } => {
            println!("Found 0 sessions in {}", dir.display());
            println!("Nothing to plot.");
        }
        RunOutcome::EmptyData { file } => {
            println!("Session {} has no data rows, nothing to plot.", file.display());
        }
        RunOutcome::Rendered {
            file,
            count,
            analysis,
        } => {
            // stdout carries the JSON report; validation keeps `-` json-only
            if destination.as_os_str() == config::STDOUT_OUTPUT {
                return;
            }
            println!("Found {count} session(s), plotting {}", file.display());
            let samples: usize = analysis.series.iter().map(aggregate::Series::len).sum();
            println!(
                "Delay: {} ms, Total: {} s, {} series, {samples} samples",
                analysis.header.delay_label(),
                analysis.header.total_label(),
                analysis.series.len()
            );
            println!("Wrote {}", destination.display());
        }
    }
}

fn report_error(err: &RunError) {
    match err {
        RunError::Parse {
            path,
            source: ParseError::Schema { missing, available },
        } => {
            eprintln!(
                "error: {} has no {missing:?} column; regenerate the session file",
                path.display()
            );
            eprintln!("available columns: {}", available.join(", "));
        }
        other => eprintln!("error: {other}"),
    }
}
