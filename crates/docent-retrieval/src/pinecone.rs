use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, RetrievalError};
use crate::index::{IndexMatch, VectorIndex};

const API_VERSION: &str = "2024-07";
const TEXT_KEY: &str = "text";

/// Pinecone data-plane adapter (HTTP direct, no SDK)
pub struct PineconeIndex {
    http_client: reqwest::Client,
    host: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    namespace: &'a str,
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

impl PineconeIndex {
    /// `host` is the index host, e.g. `https://docs-abc123.svc.us-east1-gcp.pinecone.io`
    pub fn new(host: impl Into<String>, api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "Api-Key",
            HeaderValue::from_str(api_key)
                .map_err(|e| RetrievalError::Misconfigured(format!("Invalid API key: {}", e)))?,
        );
        headers.insert("X-Pinecone-API-Version", HeaderValue::from_static(API_VERSION));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| RetrievalError::Misconfigured(e.to_string()))?;

        let host = host.into();
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("https://{}", host)
        };

        Ok(Self {
            http_client,
            host: host.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(&self, namespace: &str, vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>> {
        let body = QueryRequest {
            namespace,
            vector,
            top_k,
            include_metadata: true,
        };

        let response = self
            .http_client
            .post(format!("{}/query", self.host))
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrievalError::Unavailable(format!("Vector index unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = format!("Vector index error ({}): {}", status, error_text);
            return Err(match status {
                StatusCode::UNAUTHORIZED
                | StatusCode::FORBIDDEN
                | StatusCode::NOT_FOUND
                | StatusCode::BAD_REQUEST => RetrievalError::Misconfigured(message),
                _ => RetrievalError::Unavailable(message),
            });
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::Unavailable(format!("Malformed query response: {}", e)))?;

        Ok(parsed
            .matches
            .into_iter()
            .map(|m| {
                let mut metadata = m.metadata.unwrap_or_default();
                let text = match metadata.remove(TEXT_KEY) {
                    Some(Value::String(s)) => s,
                    _ => String::new(),
                };
                IndexMatch {
                    id: m.id,
                    score: m.score,
                    text,
                    metadata,
                }
            })
            .collect())
    }
}
