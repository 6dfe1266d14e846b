use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Output path that sends the JSON report to stdout.
pub const STDOUT_OUTPUT: &str = "-";

/// Top-level configuration loaded from twatch.toml.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct PlotConfig {
    pub sessions: SessionsConfig,
    pub chart: ChartConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionsConfig {
    pub dir: PathBuf,
    pub pattern: String,
}

/// Output formats for the rendered session.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Svg,
    Json,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartConfig {
    pub output: PathBuf,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub max_temperature: u32,
    pub y_steps: u32,
    pub bands: bool,
}

// --- Default implementations ---

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("session"),
            pattern: "session_*.csv".to_string(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("session_plot.svg"),
            format: OutputFormat::Svg,
            width: 1000,
            height: 400,
            max_temperature: 110,
            y_steps: 5,
            bands: true,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse config {}: {}", path.display(), source)
            }
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl PlotConfig {
    /// Load config from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(config = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Reject settings no sink can honour, after CLI overrides are merged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chart.format == OutputFormat::Svg && self.chart.output.as_os_str() == STDOUT_OUTPUT {
            return Err(ConfigError::Invalid(
                "output `-` (stdout) is only supported with the json format".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let cfg = PlotConfig::load(&dir.path().join("twatch.toml")).unwrap();
        assert_eq!(cfg, PlotConfig::default());
        assert_eq!(cfg.sessions.dir, PathBuf::from("session"));
        assert_eq!(cfg.sessions.pattern, "session_*.csv");
        assert_eq!(cfg.chart.max_temperature, 110);
        assert_eq!(cfg.chart.format, OutputFormat::Svg);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("twatch.toml");
        std::fs::write(
            &path,
            "[sessions]\ndir = \"logs\"\n\n[chart]\nformat = \"json\"\nbands = false\n",
        )
        .unwrap();

        let cfg = PlotConfig::load(&path).unwrap();
        assert_eq!(cfg.sessions.dir, PathBuf::from("logs"));
        assert_eq!(cfg.sessions.pattern, "session_*.csv");
        assert_eq!(cfg.chart.format, OutputFormat::Json);
        assert!(!cfg.chart.bands);
        assert_eq!(cfg.chart.width, 1000);
    }

    #[test]
    fn defaults_are_valid() {
        assert!(PlotConfig::default().validate().is_ok());
    }

    #[test]
    fn stdout_output_requires_json() {
        let mut cfg = PlotConfig::default();
        cfg.chart.output = PathBuf::from("-");
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("only supported with the json format"));

        cfg.chart.format = OutputFormat::Json;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("twatch.toml");
        std::fs::write(&path, "[chart]\nwidth = \"wide\"\n").unwrap();

        let err = PlotConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("failed to parse config"));
    }
}
