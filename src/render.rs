//! Drawing collaborators for the dashboard and auxiliary pages.

use std::io::Write;

use tracing::warn;

use crate::errors::BenchmarkMismatchWarning;
use crate::pages::{CfgListing, IrDump, LatexTable};
use crate::run::ChartMode;
use crate::view::View;

const BAR_WIDTH: usize = 40;

pub trait ViewRenderer {
    fn draw_chart(&mut self, view: &View);
    fn draw_summary(&mut self, view: &View);
    fn clear_warnings(&mut self);
    fn show_warning(&mut self, warning: &BenchmarkMismatchWarning);
}

pub trait PageRenderer {
    fn render_ir(&mut self, ir: &IrDump);
    fn render_cfgs(&mut self, cfgs: &CfgListing);
    fn render_table(&mut self, table: &LatexTable);
}

/// Accepts every draw call and discards it.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRenderer;

impl ViewRenderer for NullRenderer {
    fn draw_chart(&mut self, _view: &View) {}
    fn draw_summary(&mut self, _view: &View) {}
    fn clear_warnings(&mut self) {}
    fn show_warning(&mut self, _warning: &BenchmarkMismatchWarning) {}
}

/// Plain-text renderer for terminals.
pub struct TextRenderer<W: Write> {
    out: W,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(err) = self.out.write_all(text.as_bytes()) {
            warn!(error = %err, "failed to write rendered output");
        }
    }
}

impl<W: Write> ViewRenderer for TextRenderer<W> {
    fn draw_chart(&mut self, view: &View) {
        let text = format_chart(view);
        self.emit(&text);
    }

    fn draw_summary(&mut self, view: &View) {
        let text = format_summary(view);
        self.emit(&text);
    }

    fn clear_warnings(&mut self) {}

    fn show_warning(&mut self, warning: &BenchmarkMismatchWarning) {
        self.emit(&format!("warning: {warning}\n"));
    }
}

impl<W: Write> PageRenderer for TextRenderer<W> {
    fn render_ir(&mut self, ir: &IrDump) {
        let mut text = format!("== IR: {} / {} ==\n", ir.benchmark, ir.mode);
        text.push_str(&ir.text);
        if !ir.text.ends_with('\n') {
            text.push('\n');
        }
        self.emit(&text);
    }

    fn render_cfgs(&mut self, cfgs: &CfgListing) {
        let mut text = format!("== CFGs: {} / {} ==\n", cfgs.benchmark, cfgs.mode);
        if cfgs.images.is_empty() {
            text.push_str("(none)\n");
        }
        for image in &cfgs.images {
            text.push_str(&format!("  {image}\n"));
        }
        self.emit(&text);
    }

    fn render_table(&mut self, table: &LatexTable) {
        let mut text = format!("== {} ==\n", table.name);
        text.push_str(&table.tex);
        if !table.tex.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&format!("pdf: {}\n", table.pdf_link));
        self.emit(&text);
    }
}

pub fn format_chart(view: &View) -> String {
    let mut out = match view.chart_mode {
        ChartMode::Absolute => String::from("-- mean time (s) --\n"),
        ChartMode::Speedup => String::from("-- speedup vs baseline (baseline / current) --\n"),
    };
    if view.is_empty() {
        out.push_str("(nothing selected)\n");
        return out;
    }
    let values = view.chart_values();
    let max = values
        .iter()
        .flatten()
        .copied()
        .fold(0.0_f64, f64::max);
    let label_width = view
        .rows
        .iter()
        .map(|r| r.benchmark.len() + r.mode.len() + 3)
        .max()
        .unwrap_or(0);
    let bar_width = BAR_WIDTH;
    for (row, value) in view.rows.iter().zip(values) {
        let label = format!("{} / {}", row.benchmark, row.mode);
        match value {
            Some(v) => {
                let len = if max > 0.0 {
                    ((v / max) * bar_width as f64).round() as usize
                } else {
                    0
                };
                out.push_str(&format!(
                    "{label:<label_width$} |{:<bar_width$}| {v:.4}\n",
                    "#".repeat(len.max(1))
                ));
            }
            None => out.push_str(&format!("{label:<label_width$} |{:<bar_width$}| n/a\n", "")),
        }
    }
    out
}

pub fn format_summary(view: &View) -> String {
    let mut out = format!(
        "{:<28}{:<28}{:>12}{:>12}{:>10}\n",
        "benchmark", "mode", "current", "baseline", "speedup"
    );
    for row in &view.rows {
        out.push_str(&format!(
            "{:<28}{:<28}{:>12}{:>12}{:>10}\n",
            row.benchmark,
            row.mode,
            fmt_opt(row.current_mean, 4),
            fmt_opt(row.baseline_mean, 4),
            fmt_speedup(row.speedup),
        ));
    }
    if !view.summary.is_empty() {
        out.push_str("\nper mode:\n");
        for s in &view.summary {
            out.push_str(&format!(
                "  {:<28} rows={:<4} compared={:<4} geomean={}\n",
                s.mode,
                s.rows,
                s.compared,
                fmt_speedup(s.geomean_speedup)
            ));
        }
    }
    out
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{v:.precision$}"))
        .unwrap_or_else(|| "-".to_string())
}

fn fmt_speedup(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.3}x"))
        .unwrap_or_else(|| "-".to_string())
}
