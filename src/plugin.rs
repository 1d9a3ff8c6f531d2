//! The documentation plugin: one style guide request, the lookup tables it
//! produced, and re-application to subtrees added later.
//!
//! Failures never surface as errors here. They are logged through `tracing`
//! and leave the document untouched.

use std::fmt;

use crate::apply::{apply_styles, ApplyOptions, ApplyStats};
use crate::dom::Dom;
use crate::error::{ErrorKind, Result};
use crate::fetch::{HttpResponse, Transport};
use crate::guide;
use crate::index::StyleDataMap;

/// Construction options.
#[derive(Debug, Clone)]
pub struct PluginOptions<N> {
    /// Subtree styled after a successful load. Defaults to the body.
    pub root: Option<N>,
    pub apply: ApplyOptions,
}

impl<N> Default for PluginOptions<N> {
    fn default() -> Self {
        Self {
            root: None,
            apply: ApplyOptions::default(),
        }
    }
}

impl<N> PluginOptions<N> {
    pub fn with_root(root: N) -> Self {
        Self {
            root: Some(root),
            ..Default::default()
        }
    }
}

/// Options for [`DocsPlugin::refresh`].
#[derive(Debug, Clone)]
pub struct RefreshOptions<N> {
    /// Subtree to restyle. Defaults to the body.
    pub root: Option<N>,
}

impl<N> Default for RefreshOptions<N> {
    fn default() -> Self {
        Self { root: None }
    }
}

impl<N> RefreshOptions<N> {
    pub fn with_root(root: N) -> Self {
        Self { root: Some(root) }
    }
}

/// What a completed request did to the plugin and the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A style guide was indexed and applied.
    Applied(ApplyStats),
    /// The response carried no style guide; nothing changed.
    Empty,
    /// The request or the body failed; nothing changed.
    Failed,
}

pub struct DocsPlugin<N> {
    url: String,
    root: Option<N>,
    apply: ApplyOptions,
    style_data: Option<StyleDataMap>,
}

impl<N: fmt::Debug> fmt::Debug for DocsPlugin<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocsPlugin")
            .field("url", &self.url)
            .field("root", &self.root)
            .field("loaded", &self.style_data.is_some())
            .finish()
    }
}

impl<N: Copy + Eq + fmt::Debug> DocsPlugin<N> {
    /// A plugin that has not issued its request yet.
    pub fn new(url: impl Into<String>, options: PluginOptions<N>) -> Self {
        Self {
            url: url.into(),
            root: options.root,
            apply: options.apply,
            style_data: None,
        }
    }

    /// Create a plugin, request the style guide and apply it.
    ///
    /// Always returns a usable plugin; a failed request only means there is
    /// no style data until a later [`reload`](Self::reload) succeeds.
    pub async fn load<T, D>(
        url: impl Into<String>,
        options: PluginOptions<N>,
        transport: &T,
        dom: &mut D,
    ) -> Self
    where
        T: Transport,
        D: Dom<Node = N>,
    {
        let mut plugin = Self::new(url, options);
        plugin.reload(transport, dom).await;
        plugin
    }

    /// Issue the request again and apply the result.
    pub async fn reload<T, D>(&mut self, transport: &T, dom: &mut D) -> LoadOutcome
    where
        T: Transport,
        D: Dom<Node = N>,
    {
        tracing::debug!(url = %self.url, "requesting style guide");
        let result = transport.get(&self.url).await;
        self.complete(result, dom)
    }

    /// Handle a finished request: index a 200 body and apply it to the
    /// configured root. Earlier style data survives anything else.
    pub fn complete<D>(&mut self, result: Result<HttpResponse>, dom: &mut D) -> LoadOutcome
    where
        D: Dom<Node = N>,
    {
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    url = %self.url,
                    "style guide request failed, verify the network connection and the url: {e}"
                );
                return LoadOutcome::Failed;
            }
        };

        let body = match response.into_body() {
            Ok(Some(body)) => body,
            Ok(None) => return LoadOutcome::Empty,
            Err(e) => {
                if let ErrorKind::Status(status) = e.kind {
                    tracing::error!(
                        url = %self.url,
                        status,
                        "loading the style guide failed, check the access token in the url"
                    );
                }
                return LoadOutcome::Failed;
            }
        };

        let guide = match guide::parse(&body) {
            Ok(Some(guide)) => guide,
            Ok(None) => {
                tracing::debug!(url = %self.url, "style guide response was empty");
                return LoadOutcome::Empty;
            }
            Err(e) => {
                tracing::error!(url = %self.url, "style guide response is not usable: {e}");
                return LoadOutcome::Failed;
            }
        };

        let data = StyleDataMap::from_guide(&guide);
        let root = self.root.unwrap_or_else(|| dom.body());
        let stats = apply_styles(dom, root, &data, &self.apply);
        tracing::info!(
            url = %self.url,
            styled = stats.styled,
            unresolved = stats.unresolved,
            "applied style guide"
        );
        self.style_data = Some(data);
        LoadOutcome::Applied(stats)
    }

    /// Reapply the last loaded style guide without requesting it again.
    ///
    /// Returns `None`, and logs an error, when nothing has loaded yet.
    pub fn refresh<D>(&self, dom: &mut D, options: RefreshOptions<N>) -> Option<ApplyStats>
    where
        D: Dom<Node = N>,
    {
        let Some(data) = &self.style_data else {
            tracing::error!(
                url = %self.url,
                "no style data to refresh with, the style guide has not loaded"
            );
            return None;
        };
        let root = options.root.unwrap_or_else(|| dom.body());
        Some(apply_styles(dom, root, data, &self.apply))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn style_data(&self) -> Option<&StyleDataMap> {
        self.style_data.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.style_data.is_some()
    }
}
