//! IR/CFG viewer and LaTeX table pages. Each is a straight fetch-then-render
//! sequence driven by query parameters.

use ahash::AHashMap;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::errors::{DashboardError, Result};
use crate::fetch::{Fetcher, join_location};
use crate::loader::RunLoader;
use crate::render::PageRenderer;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: AHashMap<String, String>,
}

impl QueryParams {
    /// Decodes `a=1&b=two%20words`. A leading `?` is accepted; repeated keys keep the first value.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = AHashMap::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }
        Self { params }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Present and non-empty.
    pub fn require(&self, key: &str) -> Result<&str> {
        match self.get(key) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(DashboardError::missing_param(key)),
        }
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.params.insert(key.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::default();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IrDump {
    pub benchmark: String,
    pub mode: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CfgListing {
    pub benchmark: String,
    pub mode: String,
    /// Image locations, ready to link.
    pub images: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LatexTable {
    pub name: String,
    pub tex: String,
    pub pdf_link: String,
}

/// Accepts `value` only if joining it under the site root stays inside the site:
/// no absolute paths, no `..` segments, no `scheme:` prefixes.
pub fn site_relative<'a>(key: &str, value: &'a str) -> Result<&'a str> {
    let escapes = value.starts_with(['/', '\\'])
        || value.contains(':')
        || value.split(['/', '\\']).any(|segment| segment == "..");
    if escapes {
        return Err(DashboardError::invalid_input(format!(
            "{key} must name a file inside the site, got {value}"
        )));
    }
    Ok(value)
}

pub fn ir_dir(root: &str, benchmark: &str, mode: &str) -> String {
    join_location(root, &format!("data/llvm/{benchmark}/{mode}"))
}

/// Loads the IR dump and CFG listing for `benchmark` and `runmode`.
///
/// Both parameters are required. When either is missing nothing is fetched
/// or rendered and [`DashboardError::MissingParam`] is returned.
pub fn load_ir_page<F, R>(
    loader: &RunLoader<F>,
    root: &str,
    params: &QueryParams,
    renderer: &mut R,
) -> Result<()>
where
    F: Fetcher,
    R: PageRenderer + ?Sized,
{
    let (benchmark, mode) = match (params.require("benchmark"), params.require("runmode")) {
        (Ok(b), Ok(m)) => (b, m),
        (Err(err), _) | (_, Err(err)) => {
            error!(%err, "missing query params, not rendering IR page");
            return Err(err);
        }
    };
    if let Err(err) = site_relative("benchmark", benchmark).and(site_relative("runmode", mode)) {
        error!(%err, "rejecting IR page request");
        return Err(err);
    }
    show_ir(loader, root, benchmark, mode, renderer)?;
    show_cfgs(loader, root, benchmark, mode, renderer)
}

fn show_ir<F: Fetcher, R: PageRenderer + ?Sized>(
    loader: &RunLoader<F>,
    root: &str,
    benchmark: &str,
    mode: &str,
    renderer: &mut R,
) -> Result<()> {
    let location = join_location(&ir_dir(root, benchmark, mode), "optimized.ll");
    let text = loader.fetch_text(&location)?;
    renderer.render_ir(&IrDump {
        benchmark: benchmark.to_string(),
        mode: mode.to_string(),
        text,
    });
    Ok(())
}

fn show_cfgs<F: Fetcher, R: PageRenderer + ?Sized>(
    loader: &RunLoader<F>,
    root: &str,
    benchmark: &str,
    mode: &str,
    renderer: &mut R,
) -> Result<()> {
    let dir = ir_dir(root, benchmark, mode);
    let names: Vec<String> = loader.fetch_json(&join_location(&dir, "cfgs.json"))?;
    renderer.render_cfgs(&CfgListing {
        benchmark: benchmark.to_string(),
        mode: mode.to_string(),
        images: names
            .iter()
            .filter(|name| match site_relative("cfg image", name) {
                Ok(_) => true,
                Err(err) => {
                    warn!(%err, "skipping cfg image");
                    false
                }
            })
            .map(|name| join_location(&dir, name))
            .collect(),
    });
    Ok(())
}

/// Loads `data/<table>.tex` and links `data/<table>.pdf`. The table name is used
/// verbatim, but a name that would leave the site is rejected before anything is fetched.
pub fn load_table_page<F, R>(
    loader: &RunLoader<F>,
    root: &str,
    params: &QueryParams,
    renderer: &mut R,
) -> Result<()>
where
    F: Fetcher,
    R: PageRenderer + ?Sized,
{
    if let Some(name) = params.get("table") {
        site_relative("table", name).inspect_err(|err| error!(%err, "rejecting table request"))?;
    }
    let run = loader.fetch_run(root)?;
    let name = params.require("table").inspect_err(|err| {
        error!(%err, "no table requested");
    })?;
    let tex = loader.fetch_text(&join_location(root, &format!("data/{name}.tex")))?;
    info!(table = name, records = run.len(), "rendering table page");
    renderer.render_table(&LatexTable {
        name: name.to_string(),
        tex,
        pdf_link: join_location(root, &format!("data/{name}.pdf")),
    });
    Ok(())
}
