//! Local preview server: serves a directory of HTML pages with the style
//! guide applied on every request.
//!
//! When the style guide comes from a file, the file is watched and
//! re-indexed whenever it changes, so a browser reload shows the edit.

use std::fs;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tiny_http::{Header, Response, Server};

use crate::apply::ApplyOptions;
use crate::error::{BrandError, Result};
use crate::index::StyleDataMap;

/// Preview server settings.
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    /// Directory holding the `.html` pages to serve.
    pub pages: PathBuf,
    /// Style guide file to watch, if the data came from disk.
    pub guide_file: Option<PathBuf>,
    pub port: u16,
    pub apply: ApplyOptions,
}

/// A response before it is handed to `tiny_http`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    fn html(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body,
        }
    }

    fn json(body: String) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body,
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: message.to_string(),
        }
    }
}

pub struct PreviewServer {
    server: Server,
    pages: PathBuf,
    apply: ApplyOptions,
    data: Arc<RwLock<StyleDataMap>>,
    _watcher: Option<RecommendedWatcher>,
}

impl PreviewServer {
    /// Bind to `127.0.0.1:<port>` (port 0 picks a free one) and start
    /// watching the style guide file.
    pub fn bind(config: PreviewConfig, data: StyleDataMap) -> Result<Self> {
        let server = Server::http(("127.0.0.1", config.port))
            .map_err(|e| BrandError::message(&format!("cannot bind port {}: {e}", config.port)))?;
        let data = Arc::new(RwLock::new(data));
        let watcher = match &config.guide_file {
            Some(path) => Some(watch_guide(path, Arc::clone(&data))?),
            None => None,
        };

        Ok(Self {
            server,
            pages: config.pages,
            apply: config.apply,
            data,
            _watcher: watcher,
        })
    }

    pub fn addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Serve requests until the listener shuts down.
    pub fn run(self) {
        for request in self.server.incoming_requests() {
            let reply = handle(&self.pages, &self.data, &self.apply, request.url());
            tracing::debug!(url = request.url(), status = reply.status, "preview request");

            let mut response = Response::from_string(reply.body).with_status_code(reply.status);
            if let Ok(header) = Header::from_bytes("Content-Type", reply.content_type) {
                response = response.with_header(header);
            }
            if let Err(e) = request.respond(response) {
                tracing::warn!("failed to send preview response: {e}");
            }
        }
    }
}

fn watch_guide(path: &Path, data: Arc<RwLock<StyleDataMap>>) -> Result<RecommendedWatcher> {
    let target = path.to_path_buf();
    let file_name = target.file_name().map(|n| n.to_os_string());
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let Ok(event) = res else {
            return;
        };
        let touches_guide = event
            .paths
            .iter()
            .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
        if !(event.kind.is_modify() || event.kind.is_create()) || !touches_guide {
            return;
        }
        reload_guide(&target, &data);
    })
    .map_err(|e| BrandError::message(&format!("cannot watch style guide: {e}")))?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .map_err(|e| BrandError::message(&format!("cannot watch {}: {e}", dir.display())))?;
    Ok(watcher)
}

/// Re-index `path` into `data`. A file that no longer indexes leaves the
/// previous tables in place. Returns whether the tables were replaced.
fn reload_guide(path: &Path, data: &RwLock<StyleDataMap>) -> bool {
    match load_guide_file(path) {
        Ok(fresh) => {
            let mut guard = data.write().unwrap_or_else(|poisoned| {
                tracing::warn!("style data lock was poisoned, replacing its contents");
                poisoned.into_inner()
            });
            *guard = fresh;
            tracing::info!(path = %path.display(), "reloaded style guide");
            true
        }
        Err(e) => {
            tracing::error!(path = %path.display(), "style guide reload failed: {e}");
            false
        }
    }
}

/// Read and index a style guide file.
pub fn load_guide_file(path: &Path) -> Result<StyleDataMap> {
    let body = fs::read_to_string(path)?;
    crate::index_json(&body)
}

/// Route one request path.
pub fn handle(
    pages: &Path,
    data: &RwLock<StyleDataMap>,
    apply: &ApplyOptions,
    url: &str,
) -> Reply {
    let path = url.split(['?', '#']).next().unwrap_or("/");

    match path {
        "/" => match list_pages(pages) {
            Ok(names) => Reply::html(index_page(&names)),
            Err(e) => Reply::error(500, &format!("cannot list pages: {e}")),
        },
        "/style-data.json" => {
            let guard = data.read().unwrap_or_else(PoisonError::into_inner);
            match serde_json::to_string_pretty(&*guard) {
                Ok(json) => Reply::json(json),
                Err(e) => Reply::error(500, &e.to_string()),
            }
        }
        _ => {
            let Some(file) = page_path(pages, path) else {
                return Reply::error(404, "not found");
            };
            let Ok(html) = fs::read_to_string(&file) else {
                return Reply::error(404, "not found");
            };
            let guard = data.read().unwrap_or_else(PoisonError::into_inner);
            match crate::style_html_with(&html, &guard, None, apply) {
                Ok((out, _)) => Reply::html(out),
                Err(e) => Reply::error(500, &format!("{}: {e}", file.display())),
            }
        }
    }
}

/// Map a request path to an `.html` file inside `pages`, refusing anything
/// that would leave the directory.
fn page_path(pages: &Path, request: &str) -> Option<PathBuf> {
    let relative = Path::new(request.trim_start_matches('/'));
    if relative.extension().and_then(|e| e.to_str()) != Some("html") {
        return None;
    }
    if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(pages.join(relative))
}

fn list_pages(pages: &Path) -> std::io::Result<Vec<String>> {
    let mut names: Vec<String> = fs::read_dir(pages)?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".html"))
        .collect();
    names.sort();
    Ok(names)
}

fn index_page(names: &[String]) -> String {
    let items: String = names
        .iter()
        .map(|n| {
            let n = html_escape(n);
            format!("<li><a href=\"/{n}\">{n}</a></li>")
        })
        .collect();
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>brandoc preview</title></head>\
         <body><h1>Pages</h1><ul>{items}</ul><p><a href=\"/style-data.json\">style data</a></p></body></html>"
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("brandoc-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn colors() -> RwLock<StyleDataMap> {
        RwLock::new(
            crate::index_json(r#"{"colors": [{"colors": [{"kebabName": "brand-1", "value": "red"}]}]}"#)
                .unwrap(),
        )
    }

    #[test]
    fn serves_styled_page() {
        let dir = scratch_dir("page");
        fs::write(dir.join("a.html"), "<body><p data-color='brand-1'>x</p></body>").unwrap();
        let reply = handle(&dir, &colors(), &ApplyOptions::default(), "/a.html?v=1");
        assert_eq!(reply.status, 200);
        assert!(reply.body.contains("style=\"color: red;\""));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn lists_pages() {
        let dir = scratch_dir("list");
        fs::write(dir.join("b.html"), "").unwrap();
        fs::write(dir.join("a.html"), "").unwrap();
        fs::write(dir.join("notes.txt"), "").unwrap();
        let reply = handle(&dir, &colors(), &ApplyOptions::default(), "/");
        assert_eq!(reply.status, 200);
        let a = reply.body.find("/a.html").unwrap();
        let b = reply.body.find("/b.html").unwrap();
        assert!(a < b);
        assert!(!reply.body.contains("notes.txt"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn style_data_endpoint() {
        let dir = scratch_dir("data");
        let reply = handle(&dir, &colors(), &ApplyOptions::default(), "/style-data.json");
        assert_eq!(reply.content_type, "application/json");
        let json: serde_json::Value = serde_json::from_str(&reply.body).unwrap();
        assert_eq!(json["colors"]["brand-1"]["value"], "red");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn unusable_guide_file_keeps_previous_tables() {
        let dir = scratch_dir("reload");
        let guide = dir.join("guide.json");
        let data = colors();

        fs::write(&guide, r#"{"colors": [{"colors": [{"kebabName": "brand-1", "value": "blue"}]}]}"#)
            .unwrap();
        assert!(reload_guide(&guide, &data));
        assert_eq!(data.read().unwrap().color("brand-1").unwrap().value.as_deref(), Some("blue"));

        fs::write(&guide, "{\"colors\": [").unwrap();
        assert!(!reload_guide(&guide, &data));
        assert!(!reload_guide(&dir.join("missing.json"), &data));
        assert_eq!(data.read().unwrap().color("brand-1").unwrap().value.as_deref(), Some("blue"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn poisoned_style_data_is_still_served_and_replaced() {
        let dir = scratch_dir("poison");
        let guide = dir.join("guide.json");
        let data = Arc::new(colors());
        let shared = Arc::clone(&data);
        let _ = std::thread::spawn(move || {
            let _guard = shared.write().unwrap();
            panic!("writer died");
        })
        .join();
        assert!(data.is_poisoned());

        let reply = handle(&dir, &data, &ApplyOptions::default(), "/style-data.json");
        assert_eq!(reply.status, 200);

        fs::write(&guide, r#"{"colors": [{"colors": [{"kebabName": "brand-1", "value": "blue"}]}]}"#)
            .unwrap();
        assert!(reload_guide(&guide, &data));
        let reply = handle(&dir, &data, &ApplyOptions::default(), "/style-data.json");
        assert!(reply.body.contains("blue"));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn refuses_paths_outside_pages() {
        let dir = scratch_dir("escape");
        for url in ["/../secret.html", "/a.txt", "/missing.html"] {
            let reply = handle(&dir, &colors(), &ApplyOptions::default(), url);
            assert_eq!(reply.status, 404, "{url}");
        }
        let _ = fs::remove_dir_all(&dir);
    }
}
