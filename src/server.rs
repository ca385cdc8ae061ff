//! HTTP server exposing the dashboard as a page plus a query-string API.
//!
//! Every interaction the page offers is a `GET` on `/api/...`; the browser
//! reloads afterwards. Connections are served by `hyper` on a tokio runtime.
//! Routes run on the blocking pool because fetches use a blocking client, and
//! fetches run outside the state lock, so a slow baseline download never
//! blocks filter changes.

use std::convert::Infallible;
use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::dashboard::Dashboard;
use crate::errors::{DashboardError, Result};
use crate::fetch::Fetcher;
use crate::filter::{FilterEvent, FilterKind};
use crate::html::{HtmlRenderer, document, escape};
use crate::loader::RunLoader;
use crate::pages::{QueryParams, load_ir_page, load_table_page};
use crate::run::{ChartMode, RunSummary};

pub struct ServerState<F> {
    dashboard: Dashboard<F, HtmlRenderer>,
    previous_runs: Vec<RunSummary>,
    selected: Option<usize>,
    root: String,
}

pub type SharedState<F> = Arc<Mutex<ServerState<F>>>;

impl<F: Fetcher> ServerState<F> {
    /// Performs the index page load for `root`.
    pub fn initialize(loader: RunLoader<F>, root: &str, chart_mode: ChartMode) -> Result<Self> {
        let mut dashboard = Dashboard::new(loader, HtmlRenderer::new());
        dashboard.set_chart_mode(chart_mode);
        let load = dashboard.load_index(root)?;
        Ok(Self {
            dashboard,
            previous_runs: load.previous_runs,
            selected: load.selected,
            root: root.to_string(),
        })
    }

    pub fn dashboard(&self) -> &Dashboard<F, HtmlRenderer> {
        &self.dashboard
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn into_shared(self) -> SharedState<F> {
        Arc::new(Mutex::new(self))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    fn html(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body,
        }
    }

    fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self {
                status: 200,
                content_type: "application/json",
                body,
            },
            Err(err) => Self::error(500, &err.to_string()),
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: json!({ "error": message }).to_string(),
        }
    }

    fn from_error(err: &DashboardError) -> Self {
        let status = match err {
            DashboardError::MissingParam(_) | DashboardError::InvalidInput(_) => 400,
            DashboardError::Fetch(_) | DashboardError::Parse(_) => 502,
            _ => 500,
        };
        Self::error(status, &err.to_string())
    }

    fn into_hyper(self) -> hyper::Response<Full<Bytes>> {
        let mut response = hyper::Response::new(Full::new(Bytes::from(self.body)));
        *response.status_mut() =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(self.content_type));
        response
    }
}

/// Binds `addr` and serves until the process exits.
pub fn serve<F>(state: SharedState<F>, addr: &str) -> Result<()>
where
    F: Fetcher + Clone + Send + Sync + 'static,
{
    serve_listener(state, StdTcpListener::bind(addr)?)
}

/// Serves on an already bound listener until the process exits.
pub fn serve_listener<F>(state: SharedState<F>, listener: StdTcpListener) -> Result<()>
where
    F: Fetcher + Clone + Send + Sync + 'static,
{
    listener.set_nonblocking(true)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_io()
        .build()?;
    runtime.block_on(accept_loop(state, listener))
}

async fn accept_loop<F>(state: SharedState<F>, listener: StdTcpListener) -> Result<()>
where
    F: Fetcher + Clone + Send + Sync + 'static,
{
    let listener = TcpListener::from_std(listener)?;
    info!(addr = %listener.local_addr()?, "dashboard server listening");
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(err) => {
                warn!(error = %err, "connection error");
                continue;
            }
        };
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let service = service_fn(move |req| handle(Arc::clone(&state), req));
            if let Err(err) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                debug!(error = %err, %peer, "connection failed");
            }
        });
    }
}

async fn handle<F>(
    state: SharedState<F>,
    req: Request<Incoming>,
) -> std::result::Result<hyper::Response<Full<Bytes>>, Infallible>
where
    F: Fetcher + Clone + Send + Sync + 'static,
{
    let response = if *req.method() != Method::GET {
        Response::error(405, "only GET is supported")
    } else {
        let path = req.uri().path().to_string();
        let params = QueryParams::parse(req.uri().query().unwrap_or(""));
        debug!(%path, "request");
        match tokio::task::spawn_blocking(move || route(&state, &path, &params)).await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "route handler failed");
                Response::error(500, "internal error")
            }
        }
    };
    debug!(status = response.status, "responding");
    Ok(response.into_hyper())
}

pub fn route<F: Fetcher + Clone>(
    state: &SharedState<F>,
    path: &str,
    params: &QueryParams,
) -> Response {
    match path {
        "/" | "/index.html" => {
            let s = state.lock();
            Response::html(s.dashboard.renderer().index_page(
                s.dashboard.store(),
                &s.previous_runs,
                s.selected,
            ))
        }
        "/api/view" => Response::json(&state.lock().dashboard.view()),
        "/api/runs" => {
            let s = state.lock();
            Response::json(&json!({ "runs": s.previous_runs, "selected": s.selected }))
        }
        "/api/toggle" => with_kind(params, |kind| {
            let id = params.require("id")?;
            state.lock().dashboard.toggle(kind, id);
            Ok(())
        }),
        "/api/select" => with_kind(params, |kind| {
            let enabled = parse_bool(params.require("enabled")?)?;
            state.lock().dashboard.set_all(kind, enabled);
            Ok(())
        }),
        "/api/filter" => with_kind(params, |kind| {
            let event = FilterEvent::new(
                kind,
                params.require("id")?,
                parse_bool(params.require("enabled")?)?,
            );
            state.lock().dashboard.apply(&event);
            Ok(())
        }),
        "/api/chart" => match params.require("mode") {
            Ok(mode) => {
                let mode = ChartMode::from_input(mode);
                state.lock().dashboard.set_chart_mode(mode);
                Response::json(&json!({ "chart_mode": mode }))
            }
            Err(err) => Response::from_error(&err),
        },
        "/api/baseline" => match params.require("url") {
            Ok(url) => load_baseline(state, url),
            Err(err) => Response::from_error(&err),
        },
        "/llvm" => render_page(state, "IR", |loader, root, renderer| {
            load_ir_page(loader, root, params, renderer)
        }),
        "/table" => render_page(state, "Table", |loader, root, renderer| {
            load_table_page(loader, root, params, renderer)
        }),
        _ => Response::error(404, "not found"),
    }
}

fn load_baseline<F: Fetcher + Clone>(state: &SharedState<F>, url: &str) -> Response {
    let (ticket, loader) = {
        let mut s = state.lock();
        if !s.previous_runs.iter().any(|r| r.url == url) {
            warn!(url, "baseline is not in the run catalog");
            return Response::from_error(&DashboardError::invalid_input(format!(
                "{url} is not in the run catalog"
            )));
        }
        let ticket = s.dashboard.begin_baseline_load();
        (ticket, s.dashboard.loader().clone())
    };
    let run = match loader.fetch_run(url) {
        Ok(run) => run,
        Err(err) => {
            error!(%err, url, "baseline fetch failed");
            state.lock().dashboard.abandon_baseline_load(ticket);
            return Response::from_error(&err);
        }
    };
    let mut s = state.lock();
    match s.dashboard.finish_baseline_load(ticket, run) {
        Some(warnings) => {
            s.selected = s.previous_runs.iter().position(|r| r.url == url);
            let messages: Vec<String> = warnings.iter().map(ToString::to_string).collect();
            Response::json(&json!({ "stale": false, "warnings": messages }))
        }
        None => Response::json(&json!({ "stale": true, "warnings": [] })),
    }
}

fn render_page<F, P>(state: &SharedState<F>, title: &str, page: P) -> Response
where
    F: Fetcher + Clone,
    P: FnOnce(&RunLoader<F>, &str, &mut HtmlRenderer) -> Result<()>,
{
    let (loader, root) = {
        let s = state.lock();
        (s.dashboard.loader().clone(), s.root.clone())
    };
    let mut renderer = HtmlRenderer::new();
    match page(&loader, &root, &mut renderer) {
        Ok(()) => Response::html(document(title, &renderer.take_page().unwrap_or_default())),
        Err(err) => {
            let mut resp = Response::from_error(&err);
            resp.content_type = "text/html; charset=utf-8";
            resp.body = document(title, &format!("<p class=\"warning\">{}</p>", escape(&err.to_string())));
            resp
        }
    }
}

fn with_kind<A>(params: &QueryParams, action: A) -> Response
where
    A: FnOnce(FilterKind) -> Result<()>,
{
    let result = params
        .require("kind")
        .and_then(|kind| kind.parse::<FilterKind>().map_err(DashboardError::invalid_input))
        .and_then(action);
    match result {
        Ok(()) => Response::json(&json!({ "ok": true })),
        Err(err) => Response::from_error(&err),
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" => Ok(false),
        other => Err(DashboardError::invalid_input(format!("expected a boolean, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MemoryFetcher;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::thread;
    use std::time::Duration;

    const PROFILE: &str = r#"[
        {"benchmark": "fib", "runMethod": "llvm-O0", "hyperfine": {"results": [{"mean": 2.0}]}},
        {"benchmark": "fib", "runMethod": "llvm-O3", "hyperfine": {"results": [{"mean": 1.0}]}}
    ]"#;

    fn fetcher() -> MemoryFetcher {
        MemoryFetcher::new()
            .with("current/data/profile.json", PROFILE)
            .with("old/data/profile.json", PROFILE)
            .with("runs.json", r#"[{"url": "old", "timestamp": 2}, {"url": "broken", "timestamp": 1}]"#)
    }

    fn shared(fetcher: &MemoryFetcher, mode: ChartMode) -> SharedState<&MemoryFetcher> {
        ServerState::initialize(RunLoader::new(fetcher, "runs.json"), "current", mode)
            .unwrap()
            .into_shared()
    }

    #[test]
    fn test_baseline_fetch_failure_keeps_previous() {
        let fetcher = fetcher();
        let state = shared(&fetcher, ChartMode::Absolute);
        let resp = route(&state, "/api/baseline", &QueryParams::parse("url=broken"));
        assert_eq!(resp.status, 502);
        let s = state.lock();
        assert_eq!(s.dashboard().state(), crate::dashboard::PageState::Ready);
        assert!(s.dashboard().store().baseline_run().is_some());
        assert_eq!(s.selected(), Some(0));
    }

    #[test]
    fn test_request_split_across_writes() {
        let fetcher: &'static MemoryFetcher = Box::leak(Box::new(fetcher()));
        let state = shared(fetcher, ChartMode::Absolute);
        let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || serve_listener(state, listener));

        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(b"GE").unwrap();
        stream.flush().unwrap();
        thread::sleep(Duration::from_millis(200));
        stream
            .write_all(b"T /api/view HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        assert!(response.contains("\"rows\""));
    }

    #[test]
    fn test_baseline_outside_catalog_is_rejected() {
        let fetcher = fetcher();
        let state = shared(&fetcher, ChartMode::Absolute);
        let before = fetcher.request_count();
        let resp = route(&state, "/api/baseline", &QueryParams::parse("url=/etc"));
        assert_eq!(resp.status, 400);
        assert_eq!(fetcher.request_count(), before);
        assert_eq!(state.lock().dashboard().state(), crate::dashboard::PageState::Ready);
    }

    #[test]
    fn test_toggle_route_updates_store() {
        let fetcher = fetcher();
        let state = shared(&fetcher, ChartMode::Absolute);
        let resp = route(&state, "/api/toggle", &QueryParams::parse("kind=mode&id=llvm-O0"));
        assert_eq!(resp.status, 200);
        assert!(!state.lock().dashboard().store().is_mode_enabled("llvm-O0"));
    }

    #[test]
    fn test_bad_kind_is_400() {
        let fetcher = fetcher();
        let state = shared(&fetcher, ChartMode::Absolute);
        let resp = route(&state, "/api/select", &QueryParams::parse("kind=colour&enabled=true"));
        assert_eq!(resp.status, 400);
    }

    #[test]
    fn test_index_page_lists_checkboxes() {
        let fetcher = fetcher();
        let state = shared(&fetcher, ChartMode::Speedup);
        let resp = route(&state, "/", &QueryParams::default());
        assert_eq!(resp.status, 200);
        assert!(resp.body.contains("id=\"modeCheckboxes\""));
        assert!(resp.body.contains("id=\"llvm-O3\""));
        assert_eq!(state.lock().selected(), Some(0));
    }

    #[test]
    fn test_missing_ir_params_is_400() {
        let fetcher = fetcher();
        let state = shared(&fetcher, ChartMode::Absolute);
        let before = fetcher.request_count();
        let resp = route(&state, "/llvm", &QueryParams::parse("benchmark=fib"));
        assert_eq!(resp.status, 400);
        assert_eq!(fetcher.request_count(), before);
    }
}
