use crate::error::{Error, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Thin wrapper over `reqwest::Client` that maps HTTP failures onto [`Error`].
///
/// Requests are sent once. Callers surface failures to the user rather than retrying.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::http(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    pub async fn get_text_authed(&self, url: &str, token: &str) -> Result<String> {
        let req = self
            .client
            .get(url)
            .bearer_auth(token)
            .timeout(self.timeout);
        let resp = self.send(req).await?;
        resp.text().await.map_err(|e| Error::http(e.to_string()))
    }

    /// POST a JSON body and return the full response text.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        token: &str,
    ) -> Result<String> {
        let req = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .timeout(self.timeout);
        let resp = self.send(req).await?;
        resp.text().await.map_err(|e| Error::http(e.to_string()))
    }

    /// POST a JSON body and hand back the response for incremental reading.
    ///
    /// No overall timeout applies: a long stream is bounded only by the server.
    pub async fn post_json_stream<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        token: &str,
    ) -> Result<Response> {
        let req = self
            .client
            .post(url)
            .bearer_auth(token)
            .header(header::ACCEPT, "text/event-stream")
            .json(body);
        self.send(req).await
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let resp = req.send().await.map_err(|e| {
            warn!("request failed: {e}");
            Error::http(e.to_string())
        })?;
        debug!(status = %resp.status(), url = %resp.url(), "response received");
        check_status(resp).await
    }
}

async fn check_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let url = resp.url().to_string();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = resp
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        return Err(Error::RateLimit {
            platform: extract_domain(&url),
            retry_after_secs: retry_after,
        });
    }

    let body = resp.text().await.unwrap_or_default();
    Err(Error::api_with_status(
        extract_domain(&url),
        body,
        status.as_u16(),
    ))
}

fn extract_domain(url: &str) -> String {
    url.split("//")
        .nth(1)
        .and_then(|s| s.split('/').next())
        .unwrap_or("unknown")
        .to_string()
}
