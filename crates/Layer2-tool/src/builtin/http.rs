//! HTTP request tool - outbound proxy for simple API calls

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::{Tool, ToolDef};
use toolgate_foundation::ToolResult;

/// Maximum response body size returned to the caller (64KB)
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Upper bound on the per-request timeout
const MAX_TIMEOUT_SECS: u64 = 30;

/// Outbound HTTP request tool
pub struct HttpRequestTool {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct HttpParams {
    url: String,
    #[serde(default = "default_method")]
    method: String,
    #[serde(default)]
    headers: Option<HashMap<String, String>>,
    #[serde(default)]
    body: Option<Value>,
    #[serde(default = "default_timeout")]
    timeout_secs: u64,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl HttpRequestTool {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpRequestTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for HttpRequestTool {
    fn definition(&self) -> ToolDef {
        ToolDef::builder(
            "http_request",
            "Perform an HTTP request and return status, headers and body.",
        )
        .string_param("url", "Target URL (http or https)", true)
        .enum_param(
            "method",
            "HTTP method (default: GET)",
            vec!["GET", "POST", "PUT", "DELETE", "HEAD"],
            false,
        )
        .object_param("headers", "Request headers as a string map", false)
        .object_param("body", "JSON body for POST/PUT requests", false)
        .integer_param("timeout_secs", "Request timeout in seconds (default: 10)", false)
        .build()
    }

    async fn execute(&self, params: Value) -> ToolResult {
        let params: HttpParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::fail(format!("Invalid parameters: {}", e)),
        };

        if !params.url.starts_with("http://") && !params.url.starts_with("https://") {
            return ToolResult::fail(format!(
                "Unsupported URL scheme: {} (only http/https)",
                params.url
            ));
        }

        let method = match params.method.to_uppercase().as_str() {
            "GET" => reqwest::Method::GET,
            "POST" => reqwest::Method::POST,
            "PUT" => reqwest::Method::PUT,
            "DELETE" => reqwest::Method::DELETE,
            "HEAD" => reqwest::Method::HEAD,
            other => return ToolResult::fail(format!("Unsupported HTTP method: {}", other)),
        };

        let timeout = Duration::from_secs(params.timeout_secs.clamp(1, MAX_TIMEOUT_SECS));
        let mut request = self
            .client
            .request(method, &params.url)
            .timeout(timeout);

        if let Some(headers) = &params.headers {
            for (name, value) in headers {
                request = request.header(name, value);
            }
        }
        if let Some(body) = &params.body {
            request = request.json(body);
        }

        debug!(url = %params.url, method = %params.method, "http_request outbound");

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => return ToolResult::fail(format!("Request failed: {}", e)),
        };

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|val| (k.to_string(), val.to_string()))
            })
            .collect();

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => return ToolResult::fail(format!("Failed to read response body: {}", e)),
        };

        let truncated = body.len() > MAX_BODY_BYTES;
        let body = if truncated {
            let mut end = MAX_BODY_BYTES;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            body[..end].to_string()
        } else {
            body
        };

        ToolResult::ok(json!({
            "status": status,
            "headers": headers,
            "body": body,
            "truncated": truncated,
        }))
    }
}
