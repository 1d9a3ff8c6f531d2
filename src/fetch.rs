//! Retrieval of the style guide document.

use std::future::Future;

use crate::error::{BrandError, Result};

/// Status and body of a completed GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// `None` when the server sent no body at all.
    pub body: Option<String>,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: Some(body.into()),
        }
    }

    pub fn status(status: u16) -> Self {
        Self { status, body: None }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// The body of a 200 response; any other status is an error.
    pub fn into_body(self) -> Result<Option<String>> {
        if self.is_ok() {
            Ok(self.body)
        } else {
            Err(BrandError::status(self.status))
        }
    }
}

/// Something that can issue a single GET request.
///
/// Transport failures (no response at all) are `Err`; any HTTP status,
/// including errors, is an `Ok` response for the caller to judge.
pub trait Transport {
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse>>;
}

/// [`Transport`] backed by a `reqwest` client.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

#[cfg(not(target_arch = "wasm32"))]
impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(BrandError::network)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(BrandError::network)?;
        Ok(HttpResponse {
            status,
            body: Some(body),
        })
    }
}

/// Fetch and parse a style guide, treating non-200 statuses as errors.
pub async fn fetch_guide<T: Transport>(
    transport: &T,
    url: &str,
) -> Result<Option<crate::guide::StyleGuide>> {
    let body = transport.get(url).await?.into_body()?;
    match body {
        Some(body) => crate::guide::parse(&body),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    struct Canned(HttpResponse);

    impl Transport for Canned {
        async fn get(&self, _url: &str) -> Result<HttpResponse> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn non_200_is_an_error() {
        let err = HttpResponse::status(404).into_body().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Status(404)));
        assert!(HttpResponse::status(204).into_body().is_err());
    }

    #[tokio::test]
    async fn fetch_guide_parses_body() {
        let transport = Canned(HttpResponse::ok(r#"{"logos": [{"kebabName": "a", "url": "u"}]}"#));
        let guide = fetch_guide(&transport, "http://x").await.unwrap().unwrap();
        assert_eq!(guide.logos.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fetch_guide_without_body() {
        let transport = Canned(HttpResponse::status(200));
        assert!(fetch_guide(&transport, "http://x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fetch_guide_reports_status() {
        let transport = Canned(HttpResponse::status(500));
        let err = fetch_guide(&transport, "http://x").await.unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Status(500)));
    }
}
