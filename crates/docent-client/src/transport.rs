use std::pin::Pin;

use async_trait::async_trait;
use docent_types::{ChatRequestBody, ChatTurn};
use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use serde::Deserialize;

use crate::error::ClientError;

/// Incremental access to an open event stream
#[async_trait]
pub trait StreamReader: Send {
    /// Next chunk of bytes, `None` once the stream is exhausted
    async fn read(&mut self) -> Result<Option<Vec<u8>>, ClientError>;

    /// Close the underlying connection
    async fn release(&mut self);
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn open_stream(
        &self,
        project_id: &str,
        body: &ChatRequestBody,
    ) -> Result<Box<dyn StreamReader>, ClientError>;

    /// Recent turns in chronological order
    async fn fetch_history(&self, project_id: &str, limit: usize) -> Result<Vec<ChatTurn>, ClientError>;
}

type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, reqwest::Error>> + Send>>;

/// Transport over the HTTP API
pub struct HttpTransport {
    http_client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct HistoryResponse {
    messages: Vec<ChatTurn>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpTransport {
    /// `identity_header` carries the caller id the way the upstream session layer would
    pub fn new(
        base_url: impl Into<String>,
        identity_header: &str,
        caller_id: &str,
    ) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        let name = HeaderName::from_bytes(identity_header.as_bytes())
            .map_err(|e| ClientError::Decode(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::from_str(caller_id)
            .map_err(|e| ClientError::Decode(format!("Invalid caller id: {}", e)))?;
        headers.insert(name, value);

        let http_client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or(text);
        Err(ClientError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn open_stream(
        &self,
        project_id: &str,
        body: &ChatRequestBody,
    ) -> Result<Box<dyn StreamReader>, ClientError> {
        let response = self
            .http_client
            .post(format!("{}/projects/{}/chat", self.base_url, project_id))
            .header(ACCEPT, "text/event-stream")
            .json(body)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let stream: ByteStream = Box::pin(response.bytes_stream().map(|r| r.map(|b| b.to_vec())));
        Ok(Box::new(HttpStreamReader { stream: Some(stream) }))
    }

    async fn fetch_history(&self, project_id: &str, limit: usize) -> Result<Vec<ChatTurn>, ClientError> {
        let response = self
            .http_client
            .get(format!("{}/projects/{}/messages", self.base_url, project_id))
            .query(&[("limit", limit)])
            .send()
            .await?;
        let parsed: HistoryResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(parsed.messages)
    }
}

struct HttpStreamReader {
    stream: Option<ByteStream>,
}

#[async_trait]
impl StreamReader for HttpStreamReader {
    async fn read(&mut self) -> Result<Option<Vec<u8>>, ClientError> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };
        match stream.next().await {
            Some(chunk) => Ok(Some(chunk?)),
            None => Ok(None),
        }
    }

    async fn release(&mut self) {
        // Dropping the body stream closes the connection
        self.stream = None;
    }
}
