//! # HTTP executor
//!
//! Blocking `reqwest` client with HTTP basic auth. Bodies are sent for
//! every method, `GET` and `DELETE` included: the backend reads queries
//! from the body of a `GET`.

use reqwest::blocking::Client as HttpClient;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::debug;

use crate::config::{ClientConfig, Credentials};
use crate::executor::{Executor, Method, RawResponse, Request};
use tq_core::{Error, Result};

pub struct HttpExecutor {
    http: HttpClient,
    base_url: String,
    credentials: Credentials,
}

impl HttpExecutor {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = config.base_url()?;
        let http = HttpClient::builder()
            .timeout(config.timeout())
            .user_agent(concat!("tq-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url,
            credentials: config.credentials.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

impl Executor for HttpExecutor {
    fn execute(&self, request: &Request) -> Result<RawResponse> {
        let url = self.url(&request.path);
        let mut builder = self
            .http
            .request(http_method(request.method), &url)
            .basic_auth(&self.credentials.key, Some(&self.credentials.secret));
        if !request.accept.is_empty() {
            builder = builder.header(ACCEPT, request.accept.join(", "));
        }
        if let Some(body) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, request.content_type.as_str())
                .body(serde_json::to_vec(body)?);
        }

        debug!(method = %request.method, url = %url, "sending request");
        let response = builder
            .send()
            .map_err(|e| Error::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| Error::Transport(e.to_string()))?;
        debug!(status = status.as_u16(), bytes = body.len(), "response received");

        Ok(RawResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}
