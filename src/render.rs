//! Output sinks for an aggregated session.
//!
//! `SvgChart` draws the temperature chart with plotters; `JsonReport` writes
//! the aggregated series and header as JSON for headless use.

use crate::aggregate::Series;
use crate::config::{ChartConfig, OutputFormat, STDOUT_OUTPUT};
use crate::header::HeaderMetadata;
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Readings below this are drawn on the "normal" band.
pub const WARM_FROM_C: f64 = 60.0;
/// Readings at or above this are drawn on the "hot" band.
pub const HOT_FROM_C: f64 = 80.0;

/// Everything a sink needs to render one session.
#[derive(Debug, Clone, Copy)]
pub struct ChartInput<'a> {
    pub file: &'a Path,
    pub header: &'a HeaderMetadata,
    pub series: &'a [Series],
}

#[derive(Debug)]
pub enum RenderError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Serialize(serde_json::Error),
    Draw(String),
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Io { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            RenderError::Serialize(e) => write!(f, "failed to serialize report: {e}"),
            RenderError::Draw(msg) => write!(f, "failed to draw chart: {msg}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Io { source, .. } => Some(source),
            RenderError::Serialize(e) => Some(e),
            RenderError::Draw(_) => None,
        }
    }
}

/// Consumes an aggregated session and produces output.
pub trait ChartSink {
    /// Short sink name for logs ("svg", "json").
    fn name(&self) -> &str;

    /// Where output goes.
    fn destination(&self) -> &Path;

    fn render(&self, input: &ChartInput<'_>) -> Result<(), RenderError>;
}

/// Build the sink selected by the chart config.
pub fn sink_for(config: &ChartConfig) -> Box<dyn ChartSink> {
    match config.format {
        OutputFormat::Svg => Box::new(SvgChart::from_config(config)),
        OutputFormat::Json => Box::new(JsonReport::new(config.output.clone())),
    }
}

/// A horizontal temperature band shaded behind the series.
#[derive(Clone, Copy)]
pub struct Band {
    pub low: f64,
    pub high: f64,
    pub color: RGBColor,
}

/// Normal, warm and hot bands clamped to `0..y_max`. Empty bands are omitted.
pub fn threshold_bands(y_max: f64) -> Vec<Band> {
    [
        (0.0, WARM_FROM_C, RGBColor(46, 160, 67)),
        (WARM_FROM_C, HOT_FROM_C, RGBColor(230, 160, 0)),
        (HOT_FROM_C, f64::INFINITY, RGBColor(215, 40, 40)),
    ]
    .into_iter()
    .map(|(low, high, color)| Band {
        low: low.min(y_max),
        high: high.min(y_max),
        color,
    })
    .filter(|b| b.high > b.low)
    .collect()
}

pub struct SvgChart {
    output: PathBuf,
    width: u32,
    height: u32,
    max_temperature: f64,
    y_steps: u32,
    bands: bool,
}

impl SvgChart {
    pub fn from_config(config: &ChartConfig) -> Self {
        Self {
            output: config.output.clone(),
            width: config.width,
            height: config.height,
            max_temperature: f64::from(config.max_temperature),
            y_steps: config.y_steps.max(1),
            bands: config.bands,
        }
    }

    /// Upper y bound: the configured maximum, raised if a reading exceeds it.
    fn y_max(&self, series: &[Series]) -> f64 {
        series
            .iter()
            .flat_map(|s| s.points.iter().map(|&(_, t)| t))
            .filter(|t| t.is_finite())
            .fold(self.max_temperature, f64::max)
            .ceil()
    }

    fn draw<DB: DrawingBackend>(
        &self,
        root: DrawingArea<DB, Shift>,
        input: &ChartInput<'_>,
    ) -> Result<(), RenderError> {
        let x_max = input
            .series
            .iter()
            .flat_map(|s| s.points.last().map(|&(ord, _)| ord + 1))
            .max()
            .unwrap_or(1)
            .max(1) as f64;
        let y_max = self.y_max(input.series);

        root.fill(&WHITE).map_err(draw_err)?;

        let caption = format!(
            "HWMON Devices Temperature (delay {} ms, total {} s)",
            input.header.delay_label(),
            input.header.total_label()
        );
        let mut chart = ChartBuilder::on(&root)
            .caption(caption, ("sans-serif", 20).into_font())
            .margin(20)
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(0.0..x_max, 0.0..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_desc("Captures")
            .y_desc("Temperature (°C)")
            .y_labels(self.y_steps as usize + 1)
            .x_label_formatter(&|v| format!("{:.0}", v))
            .y_label_formatter(&|v| format!("{:.0}°C", v))
            .draw()
            .map_err(draw_err)?;

        if self.bands {
            for band in threshold_bands(y_max) {
                chart
                    .draw_series(std::iter::once(Rectangle::new(
                        [(0.0, band.low), (x_max, band.high)],
                        band.color.mix(0.12).filled(),
                    )))
                    .map_err(draw_err)?;
            }
        }

        for (idx, series) in input.series.iter().enumerate() {
            let color = Palette99::pick(idx).to_rgba();
            chart
                .draw_series(LineSeries::new(
                    series.points.iter().map(|&(ord, temp)| (ord as f64, temp)),
                    color.stroke_width(2),
                ))
                .map_err(draw_err)?
                .label(series.key.to_string())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }

        if !input.series.is_empty() {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()
                .map_err(draw_err)?;
        }

        root.present().map_err(draw_err)?;
        Ok(())
    }
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

impl ChartSink for SvgChart {
    fn name(&self) -> &str {
        "svg"
    }

    fn destination(&self) -> &Path {
        &self.output
    }

    fn render(&self, input: &ChartInput<'_>) -> Result<(), RenderError> {
        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| RenderError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let root = SVGBackend::new(&self.output, (self.width, self.height)).into_drawing_area();
        self.draw(root, input)?;
        tracing::info!(
            output = %self.output.display(),
            series = input.series.len(),
            "rendered session chart"
        );
        Ok(())
    }
}

/// JSON shape written by `JsonReport`.
#[derive(Debug, Serialize)]
struct Report<'a> {
    file: String,
    header: &'a HeaderMetadata,
    series: &'a [Series],
}

/// Writes the aggregated session as pretty JSON. An output of `-` means stdout.
pub struct JsonReport {
    output: PathBuf,
}

impl JsonReport {
    pub fn new(output: PathBuf) -> Self {
        Self { output }
    }

    pub fn to_json(input: &ChartInput<'_>) -> Result<String, RenderError> {
        let report = Report {
            file: input.file.display().to_string(),
            header: input.header,
            series: input.series,
        };
        serde_json::to_string_pretty(&report).map_err(RenderError::Serialize)
    }
}

impl ChartSink for JsonReport {
    fn name(&self) -> &str {
        "json"
    }

    fn destination(&self) -> &Path {
        &self.output
    }

    fn render(&self, input: &ChartInput<'_>) -> Result<(), RenderError> {
        let json = Self::to_json(input)?;
        if self.output.as_os_str() == STDOUT_OUTPUT {
            println!("{json}");
            return Ok(());
        }
        std::fs::write(&self.output, json).map_err(|e| RenderError::Io {
            path: self.output.clone(),
            source: e,
        })?;
        tracing::info!(output = %self.output.display(), "wrote session report");
        Ok(())
    }
}
