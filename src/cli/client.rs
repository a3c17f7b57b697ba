use anyhow::Context;
use reqwest::{Client, Method};
use serde_json::Value;

/// Thin JSON client for the admin API
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: Client,
}

/// Decoded response envelope
#[derive(Debug)]
pub struct ApiReply {
    pub status: u16,
    pub body: Value,
}

impl ApiReply {
    pub fn success(&self) -> bool {
        self.body.get("success").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn error_message(&self) -> String {
        self.body
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("request failed with status {}", self.status))
    }
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("protoctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            http,
        })
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<ApiReply> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Option<Value>) -> anyhow::Result<ApiReply> {
        self.send(Method::POST, path, body).await
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> anyhow::Result<ApiReply> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("failed to reach {}", url))?;
        let status = response.status().as_u16();
        let body = response
            .json::<Value>()
            .await
            .with_context(|| format!("{} returned a non-JSON response (status {})", url, status))?;

        Ok(ApiReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reply_reads_envelope() {
        let ok = ApiReply {
            status: 200,
            body: json!({"success": true, "data": {"is_clean": true}}),
        };
        assert!(ok.success());
        assert_eq!(ok.data()["is_clean"], true);

        let failed = ApiReply {
            status: 409,
            body: json!({"success": false, "error": "busy", "code": "CONFLICT"}),
        };
        assert!(!failed.success());
        assert_eq!(failed.error_message(), "busy");

        let bare = ApiReply { status: 502, body: json!({}) };
        assert_eq!(bare.error_message(), "request failed with status 502");
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let client = ApiClient::new("http://localhost:5000/", None).unwrap();
        assert_eq!(client.base_url, "http://localhost:5000");
    }
}
