use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

use crate::utils::config::ExchangeConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Form(Vec<(String, String)>),
    /// Sent byte-for-byte as given; header-style signatures cover this exact text.
    Json(String),
}

#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub path: &'static str,
    pub query: Vec<(&'static str, String)>,
    pub headers: Vec<(&'static str, String)>,
    pub body: RequestBody,
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Plain request/response channel to the exchange REST API.
///
/// Signing and payload interpretation live in `protocol`; this type only moves bytes.
#[derive(Debug, Clone)]
pub struct ExchangeClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ExchangeClient {
    pub fn new(config: &ExchangeConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, reqwest::Error> {
        let url = format!("{}{}", self.base_url, request.path);
        debug!(method = ?request.method, %url, "sending exchange request");

        let mut builder = match request.method {
            HttpMethod::Get => self.http_client.get(&url),
            HttpMethod::Post => self.http_client.post(&url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Form(fields) => builder.form(fields),
            RequestBody::Json(text) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(text.clone()),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, "exchange responded");

        Ok(RawResponse { status, body })
    }
}
