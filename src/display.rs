//! Output collaborators: telemetry renderers and the summary display.

use crate::core::telemetry::{SeriesKind, Summary, TelemetrySnapshot};
use std::io::Write;

/// Receives a snapshot after every series mutation.
pub trait Renderer: Send {
    fn render(&mut self, snapshot: &TelemetrySnapshot);
}

/// Receives the headline figures after every mutation and at session start.
pub trait SummaryDisplay: Send {
    fn display(&mut self, summary: &Summary);
}

/// Block glyphs from low to high.
const SPARK_GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render one series as a sparkline scaled to its fixed axis range.
pub fn sparkline(kind: SeriesKind, values: &[Option<f64>]) -> String {
    let (min, max) = kind.axis_range();
    values
        .iter()
        .map(|value| match value {
            Some(v) => {
                let ratio = ((v - min) / (max - min)).clamp(0.0, 1.0);
                let idx = (ratio * (SPARK_GLYPHS.len() - 1) as f64).round() as usize;
                SPARK_GLYPHS[idx]
            }
            None => ' ',
        })
        .collect()
}

/// Write raw-mode lines and flush.
fn write_lines<W: Write>(out: &mut W, lines: &[String]) -> std::io::Result<()> {
    for line in lines {
        write!(out, "{line}\r\n")?;
    }
    out.flush()
}

/// Prints a compact, line-oriented chart to stdout.
///
/// Lines end in `\r\n` so output stays aligned while the terminal is in
/// raw mode.
#[derive(Debug, Default)]
pub struct ConsoleRenderer;

impl ConsoleRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Format a snapshot as display lines.
    pub fn format(snapshot: &TelemetrySnapshot) -> Vec<String> {
        let mut lines = vec![format!(
            "[{:>7}ms #{:<4}] {:?}",
            snapshot.at_ms, snapshot.sequence, snapshot.state
        )];

        for kind in SeriesKind::ALL {
            let values = kind.values(snapshot);
            let latest = values
                .iter()
                .rev()
                .flatten()
                .next()
                .map(|v| kind.tooltip(*v))
                .unwrap_or_else(|| format!("{}: --", kind.label()));
            lines.push(format!(
                "  {:<17} |{}| {}",
                kind.label(),
                sparkline(kind, &values),
                latest
            ));
        }

        lines
    }
}

impl Renderer for ConsoleRenderer {
    fn render(&mut self, snapshot: &TelemetrySnapshot) {
        if let Err(e) = write_lines(&mut std::io::stdout().lock(), &Self::format(snapshot)) {
            tracing::warn!("Failed to draw snapshot: {e}");
        }
    }
}

/// Writes every snapshot as one JSON line.
pub struct JsonLinesRenderer<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesRenderer<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> Renderer for JsonLinesRenderer<W> {
    fn render(&mut self, snapshot: &TelemetrySnapshot) {
        match serde_json::to_string(snapshot) {
            Ok(json) => {
                if let Err(e) = writeln!(self.writer, "{json}") {
                    tracing::warn!("Failed to write snapshot: {e}");
                }
            }
            Err(e) => tracing::warn!("Failed to serialize snapshot: {e}"),
        }
    }
}

/// Prints the summary cards as a single line.
#[derive(Debug, Default)]
pub struct ConsoleSummary {
    last: Option<Summary>,
}

impl ConsoleSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format(summary: &Summary) -> String {
        format!(
            "Steps: {} | Heart: {} BPM | Sleep: {} hrs",
            summary.total_steps, summary.heart_rate, summary.sleep_hours
        )
    }
}

impl SummaryDisplay for ConsoleSummary {
    fn display(&mut self, summary: &Summary) {
        // Unchanged cards are not reprinted
        if self.last.as_ref() == Some(summary) {
            return;
        }
        let line = Self::format(summary);
        if let Err(e) = write_lines(&mut std::io::stdout().lock(), &[line]) {
            tracing::warn!("Failed to print summary: {e}");
            return;
        }
        self.last = Some(summary.clone());
    }
}

/// Discards all output.
#[derive(Debug, Default)]
pub struct NullDisplay;

impl Renderer for NullDisplay {
    fn render(&mut self, _snapshot: &TelemetrySnapshot) {}
}

impl SummaryDisplay for NullDisplay {
    fn display(&mut self, _summary: &Summary) {}
}
