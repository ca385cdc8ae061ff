//! HTML rendering for the dashboard server.

use std::fmt::Write as _;

use crate::errors::BenchmarkMismatchWarning;
use crate::pages::{CfgListing, IrDump, LatexTable};
use crate::render::{PageRenderer, ViewRenderer};
use crate::run::{ChartMode, RunSummary};
use crate::store::DataStore;
use crate::view::View;

/// Keeps the most recently drawn fragments so a page can be assembled on request.
#[derive(Clone, Debug, Default)]
pub struct HtmlRenderer {
    chart: String,
    summary: String,
    warnings: Vec<String>,
    page: Option<String>,
}

impl HtmlRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chart_html(&self) -> &str {
        &self.chart
    }

    pub fn summary_html(&self) -> &str {
        &self.summary
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Drains whatever an auxiliary page rendered since the last call.
    pub fn take_page(&mut self) -> Option<String> {
        self.page.take()
    }

    fn push_page(&mut self, fragment: String) {
        match &mut self.page {
            Some(page) => page.push_str(&fragment),
            None => self.page = Some(fragment),
        }
    }

    pub fn index_page(
        &self,
        store: &DataStore,
        previous_runs: &[RunSummary],
        selected: Option<usize>,
    ) -> String {
        let mut body = String::new();
        body.push_str("<h1>Nightly results</h1>\n");

        body.push_str("<div id=\"warnings\">\n");
        for w in &self.warnings {
            let _ = writeln!(body, "<div class=\"warning\">{}</div>", escape(w));
        }
        body.push_str("</div>\n");

        body.push_str("<label>Compare against <select id=\"comparison\" onchange=\"act('/api/baseline?url='+encodeURIComponent(this.value))\">\n");
        for (idx, run) in previous_runs.iter().enumerate() {
            let sel = if Some(idx) == selected { " selected" } else { "" };
            let _ = writeln!(
                body,
                "<option value=\"{}\"{sel}>{}</option>",
                escape(&run.url),
                escape(&run.display_name())
            );
        }
        body.push_str("</select></label>\n");

        let modes = store.current_run().modes();
        let benchmarks = store.current_run().benchmarks();
        checkbox_group(&mut body, "modeCheckboxes", "mode", &modes, |id| {
            store.is_mode_enabled(id)
        });
        checkbox_group(
            &mut body,
            "benchmarkCheckboxes",
            "benchmark",
            &benchmarks,
            |id| store.is_benchmark_enabled(id),
        );

        let speedup = store.chart_mode() == ChartMode::Speedup;
        let _ = writeln!(
            body,
            "<div id=\"chart-mode\"><label><input type=\"radio\" name=\"mode\" value=\"absolute\"{} onclick=\"act('/api/chart?mode=absolute')\">absolute</label>\
             <label><input type=\"radio\" name=\"mode\" value=\"speedup\"{} onclick=\"act('/api/chart?mode=speedup')\">speedup</label></div>",
            if speedup { "" } else { " checked" },
            if speedup { " checked" } else { "" },
        );
        let _ = writeln!(
            body,
            "<div id=\"speedup-formula\" style=\"visibility:{}\">speedup = baseline / current</div>",
            if speedup { "visible" } else { "hidden" }
        );

        body.push_str(&self.chart);
        body.push_str(&self.summary);
        document("Nightly results", &body)
    }
}

impl ViewRenderer for HtmlRenderer {
    fn draw_chart(&mut self, view: &View) {
        let values = view.chart_values();
        let max = values.iter().flatten().copied().fold(0.0_f64, f64::max);
        let mut out = String::from("<div id=\"chart\">\n");
        for (row, value) in view.rows.iter().zip(values) {
            let (width, label) = match value {
                Some(v) if max > 0.0 => (v / max * 100.0, format!("{v:.4}")),
                _ => (0.0, "n/a".to_string()),
            };
            let _ = writeln!(
                out,
                "<div class=\"bar-row\"><span class=\"bar-label\">{} / {}</span>\
                 <span class=\"bar\" style=\"width:{width:.1}%\"></span><span>{label}</span></div>",
                escape(&row.benchmark),
                escape(&row.mode)
            );
        }
        out.push_str("</div>\n");
        self.chart = out;
    }

    fn draw_summary(&mut self, view: &View) {
        let mut out = String::from(
            "<table id=\"summary\"><tr><th>benchmark</th><th>mode</th><th>current (s)</th><th>baseline (s)</th><th>speedup</th></tr>\n",
        );
        for row in &view.rows {
            let _ = writeln!(
                out,
                "<tr><td><a href=\"/llvm?benchmark={}&amp;runmode={}\">{b}</a></td><td>{m}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                query_value(&row.benchmark),
                query_value(&row.mode),
                cell(row.current_mean, 4),
                cell(row.baseline_mean, 4),
                cell(row.speedup, 3),
                b = escape(&row.benchmark),
                m = escape(&row.mode),
            );
        }
        out.push_str("</table>\n<table id=\"mode-summary\"><tr><th>mode</th><th>rows</th><th>compared</th><th>geomean speedup</th></tr>\n");
        for s in &view.summary {
            let _ = writeln!(
                out,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&s.mode),
                s.rows,
                s.compared,
                cell(s.geomean_speedup, 3)
            );
        }
        out.push_str("</table>\n");
        self.summary = out;
    }

    fn clear_warnings(&mut self) {
        self.warnings.clear();
    }

    fn show_warning(&mut self, warning: &BenchmarkMismatchWarning) {
        self.warnings.push(warning.to_string());
    }
}

impl PageRenderer for HtmlRenderer {
    fn render_ir(&mut self, ir: &IrDump) {
        let fragment = format!(
            "<h2>{} / {}</h2>\n<button onclick=\"navigator.clipboard.writeText(document.getElementById('ir').innerText)\">Copy</button>\n<pre id=\"ir\">{}</pre>\n",
            escape(&ir.benchmark),
            escape(&ir.mode),
            escape(&ir.text)
        );
        self.push_page(fragment);
    }

    fn render_cfgs(&mut self, cfgs: &CfgListing) {
        let mut fragment = String::from("<h3>CFGs</h3>\n<ul id=\"cfgs\">\n");
        for image in &cfgs.images {
            let _ = writeln!(
                fragment,
                "<li><a href=\"{src}\">{src}</a></li>",
                src = escape(image)
            );
        }
        fragment.push_str("</ul>\n");
        self.push_page(fragment);
    }

    fn render_table(&mut self, table: &LatexTable) {
        let fragment = format!(
            "<h2 id=\"table-header\">{name}</h2>\n<pre id=\"table\">{}</pre>\n<a id=\"table-pdf\" href=\"{}\">pdf</a>\n",
            escape(&table.tex),
            escape(&table.pdf_link),
            name = escape(&table.name)
        );
        self.push_page(fragment);
    }
}

pub fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title>\n<style>{STYLE}</style>\n\
         <script>function act(u){{fetch(u).then(()=>location.reload());}}</script></head>\n<body>\n{body}</body></html>\n",
        escape(title)
    )
}

/// Form-encodes a query value. The result needs no further HTML escaping.
pub fn query_value(text: &str) -> String {
    url::form_urlencoded::byte_serialize(text.as_bytes()).collect()
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

const STYLE: &str = "body{font-family:sans-serif}.warning{background:#fee;padding:4px}\
.bar-row{display:flex;gap:8px}.bar-label{width:320px}.bar{background:#48c;height:12px;display:inline-block}\
table{border-collapse:collapse}td,th{border:1px solid #ccc;padding:2px 6px}";

fn checkbox_group<P: Fn(&str) -> bool>(
    out: &mut String,
    container: &str,
    kind: &str,
    ids: &[String],
    enabled: P,
) {
    let _ = writeln!(
        out,
        "<fieldset id=\"{container}\"><legend>{kind}s \
         <a href=\"#\" onclick=\"act('/api/select?kind={kind}&enabled=true')\">all</a> \
         <a href=\"#\" onclick=\"act('/api/select?kind={kind}&enabled=false')\">none</a></legend>"
    );
    for id in ids {
        let checked = if enabled(id) { " checked" } else { "" };
        let _ = writeln!(
            out,
            "<label><input type=\"checkbox\" id=\"{id}\"{checked} onclick=\"act('/api/toggle?kind={kind}&id='+encodeURIComponent(this.id))\">{id}</label>",
            id = escape(id)
        );
    }
    out.push_str("</fieldset>\n");
}

fn cell(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{v:.precision$}"))
        .unwrap_or_else(|| "-".to_string())
}
