use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use reqwest::Url;

use crate::error::UiError;
use crate::fragments::{DirectorySource, FragmentSource, HttpSource};
use crate::render::PLACEHOLDER_ART;

pub const DEFAULT_UI_OUTBOUND_QUEUE_CAP: usize = 256;
pub const DEFAULT_CONTENT: &str = "webview/assets";
pub const DEFAULT_SHELL: &str = "index.xhtml";
pub const DEFAULT_ART: &str = PLACEHOLDER_ART;

/// Where the shell and screen fragments live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentLocation {
    Directory(PathBuf),
    Http(Url),
}

impl FromStr for ContentLocation {
    type Err = UiError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(UiError::InvalidLocation("empty content location".to_string()));
        }

        if raw.starts_with("http://") || raw.starts_with("https://") {
            // Url::join drops the last segment unless the base ends with '/'.
            let with_slash = if raw.ends_with('/') {
                raw.to_string()
            } else {
                format!("{raw}/")
            };
            let url = Url::parse(&with_slash)
                .map_err(|err| UiError::InvalidLocation(format!("{raw}: {err}")))?;
            return Ok(ContentLocation::Http(url));
        }

        Ok(ContentLocation::Directory(PathBuf::from(raw)))
    }
}

impl fmt::Display for ContentLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentLocation::Directory(path) => write!(f, "{}", path.display()),
            ContentLocation::Http(url) => write!(f, "{url}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HostConfig {
    pub content: ContentLocation,
    pub shell: String,
    pub outbound_queue_cap: usize,
    pub default_art: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            content: ContentLocation::Directory(PathBuf::from(DEFAULT_CONTENT)),
            shell: DEFAULT_SHELL.to_string(),
            outbound_queue_cap: DEFAULT_UI_OUTBOUND_QUEUE_CAP,
            default_art: DEFAULT_ART.to_string(),
        }
    }
}

impl HostConfig {
    pub fn source(&self) -> Box<dyn FragmentSource> {
        match &self.content {
            ContentLocation::Directory(path) => Box::new(DirectorySource::new(path.clone())),
            ContentLocation::Http(url) => Box::new(HttpSource::new(url.clone())),
        }
    }

    /// A zero capacity would make every send fail; fall back to the default.
    pub fn queue_capacity(&self) -> usize {
        if self.outbound_queue_cap == 0 {
            DEFAULT_UI_OUTBOUND_QUEUE_CAP
        } else {
            self.outbound_queue_cap
        }
    }
}
