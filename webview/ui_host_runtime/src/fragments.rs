//! Screen fragments declared with `data-partial="<name>"`.
//!
//! All fragments are fetched concurrently and injected in one pass once the
//! whole batch has settled. A failed fetch only affects its own region.

use std::path::PathBuf;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::{Client, Url};
use tracing::{debug, info, warn};

use crate::document::{Document, WidgetId};
use crate::error::{UiError, UiResult};

pub const PARTIAL_ATTR: &str = "data-partial";

/// Anything that can hand back markup by relative path.
#[async_trait]
pub trait FragmentSource: Send + Sync {
    async fn fetch(&self, path: &str) -> UiResult<String>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Content served from a local directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FragmentSource for DirectorySource {
    async fn fetch(&self, path: &str) -> UiResult<String> {
        let full = self.root.join(path);
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|err| UiError::ContentUnavailable {
                location: full.display().to_string(),
                reason: err.to_string(),
            })
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Content served over HTTP relative to a base URL.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base: Url,
}

impl HttpSource {
    pub fn new(base: Url) -> Self {
        Self::with_client(Client::new(), base)
    }

    pub fn with_client(client: Client, base: Url) -> Self {
        Self { client, base }
    }
}

#[async_trait]
impl FragmentSource for HttpSource {
    async fn fetch(&self, path: &str) -> UiResult<String> {
        let url = self
            .base
            .join(path)
            .map_err(|err| UiError::InvalidLocation(format!("{path}: {err}")))?;

        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    fn describe(&self) -> String {
        self.base.to_string()
    }
}

pub fn fragment_path(name: &str) -> String {
    format!("screens/{name}.html")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentTask {
    pub name: String,
    pub region: WidgetId,
}

#[derive(Debug)]
pub struct FragmentResult {
    pub task: FragmentTask,
    pub body: UiResult<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentReport {
    pub injected: Vec<String>,
    pub failed: Vec<String>,
}

impl FragmentReport {
    pub fn total(&self) -> usize {
        self.injected.len() + self.failed.len()
    }
}

/// Regions still waiting for content. Blank names need no fetch and are
/// left out.
pub fn pending_tasks(doc: &Document) -> Vec<FragmentTask> {
    doc.elements_with_attr(PARTIAL_ATTR)
        .into_iter()
        .filter_map(|region| {
            let name = doc.attr(region, PARTIAL_ATTR)?.trim();
            if name.is_empty() {
                debug!(%region, "empty fragment name; nothing to fetch");
                return None;
            }
            Some(FragmentTask {
                name: name.to_string(),
                region,
            })
        })
        .collect()
}

/// Fetch every task concurrently. Resolves once every fetch has finished,
/// successfully or not.
pub async fn fetch_all(source: &dyn FragmentSource, tasks: Vec<FragmentTask>) -> Vec<FragmentResult> {
    let fetches = tasks.into_iter().map(|task| async move {
        let body = source.fetch(&fragment_path(&task.name)).await;
        FragmentResult { task, body }
    });

    join_all(fetches).await
}

pub fn inject_all(doc: &mut Document, results: Vec<FragmentResult>) -> FragmentReport {
    let mut report = FragmentReport::default();

    for FragmentResult { task, body } in results {
        let injected = body.and_then(|markup| doc.set_inner_markup(task.region, &markup));

        match injected {
            Ok(()) => {
                debug!(fragment = %task.name, "fragment injected");
                report.injected.push(task.name);
            }
            Err(err) => {
                warn!(fragment = %task.name, error = %err, "fragment failed to load");
                show_placeholder(doc, &task);
                report.failed.push(task.name);
            }
        }
    }

    info!(
        injected = report.injected.len(),
        failed = report.failed.len(),
        "fragment batch settled"
    );
    report
}

fn show_placeholder(doc: &mut Document, task: &FragmentTask) {
    doc.clear_children(task.region);
    let message = format!("Unable to load {}.html", task.name);
    if doc
        .append_element(task.region, "div", &[("class", "partial-error")], &message)
        .is_none()
    {
        debug!(fragment = %task.name, "fragment region left the tree");
    }
}

/// Fetch and inject every pending fragment.
pub async fn load_all(doc: &mut Document, source: &dyn FragmentSource) -> FragmentReport {
    let tasks = pending_tasks(doc);
    let results = fetch_all(source, tasks).await;
    inject_all(doc, results)
}
