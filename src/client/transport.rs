use crate::errors::AppResult;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Delivers a body to the server. Swapped for an in-memory fake in tests.
pub trait Transport {
    fn post(&self, path: &str, body: String) -> AppResult<TransportResponse>;
}

/// JSON string literals go out as JSON, anything else as CSV text.
pub fn content_type_for(body: &str) -> &'static str {
    if body.trim_start().starts_with('"') {
        "application/json"
    } else {
        "text/csv; charset=utf-8"
    }
}

pub struct HttpTransport {
    base_url: String,
    client: Client,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> AppResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Transport for HttpTransport {
    fn post(&self, path: &str, body: String) -> AppResult<TransportResponse> {
        let resp = self
            .client
            .post(self.url_for(path))
            .header(CONTENT_TYPE, content_type_for(&body))
            .body(body)
            .send()?;

        let status = resp.status().as_u16();
        let body = resp.text()?;
        Ok(TransportResponse { status, body })
    }
}
