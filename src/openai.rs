//! OpenAI-compatible HTTP collaborators: embeddings, contextual enrichment
//! via chat completions, and reranking.
//!
//! All three clients accept a custom base URL so they work against gateways
//! and self-hosted OpenAI-compatible services. This module is only
//! available when the `openai` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::document::BlockMeta;
use crate::embedding::EmbeddingProvider;
use crate::enrich::Enricher;
use crate::error::{RagError, Result};
use crate::reranker::{RerankDoc, Reranker};

/// The default OpenAI API base URL.
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// The default model for OpenAI embeddings.
const DEFAULT_EMBED_MODEL: &str = "text-embedding-3-small";

/// The default dimensionality for `text-embedding-3-small`.
const DEFAULT_DIMENSIONS: usize = 1536;

/// Prompt for the situating-context call. Asks for a summary sentence, a
/// header breadcrumb, and keywords — roughly 50–100 tokens.
const ENRICH_PROMPT: &str = r#"<filename>
{FILE_NAME}
</filename>
<position>
{HEADER_PATH}
</position>
Here is the chunk we want to situate within the whole document:
<chunk>
{CHUNK_CONTENT}
</chunk>

Example response:
<example_response>
SUMMARY CONTEXT: Summary context of chunk in the document in {LANGUAGE}

HEADER:
- <file_name>/<header_of_chunk>/<subheader_of_chunk>/...

KEYWORDS: <keyword1>, <keyword2>, <keyword3>, ...
</example_response>

Please give a short succinct context to situate this chunk within the overall document for the purposes of improving search retrieval of the chunk.
Add headers/sub-headers of the chunk in the document.
Add keywords of the chunk.
Answer only with the succinct context and nothing else."#;

fn request_error(provider: &str, e: reqwest::Error) -> RagError {
    error!(provider, error = %e, "request failed");
    RagError::EmbeddingError {
        provider: provider.to_string(),
        message: format!("request failed: {e}"),
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

async fn error_detail(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail =
        serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);
    format!("API returned {status}: {detail}")
}

// ── Embeddings ─────────────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by an OpenAI-compatible embeddings API.
///
/// # Example
///
/// ```rust,ignore
/// use ragmark::openai::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::new("sk-...")?
///     .with_base_url("https://my-gateway.internal/v1");
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
    /// If set, passed to the API for Matryoshka dimension truncation.
    request_dimensions: Option<usize>,
}

impl OpenAIEmbeddingProvider {
    /// Create a new provider with the given API key and default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::EmbeddingError {
                provider: "OpenAI".into(),
                message: "API key must not be empty".into(),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: OPENAI_BASE_URL.into(),
            api_key,
            model: DEFAULT_EMBED_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
            request_dimensions: None,
        })
    }

    /// Create a new provider using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| RagError::EmbeddingError {
            provider: "OpenAI".into(),
            message: "OPENAI_API_KEY environment variable not set".into(),
        })?;
        Self::new(api_key)
    }

    /// Point the client at an OpenAI-compatible gateway.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model name (e.g. `text-embedding-3-large`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the output dimensions (Matryoshka support).
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.request_dimensions = Some(dims);
        self
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| RagError::EmbeddingError {
            provider: "OpenAI".into(),
            message: "API returned empty response".into(),
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = "OpenAI", batch_size = texts.len(), model = %self.model, "embedding batch");

        let request_body = EmbeddingRequest {
            model: &self.model,
            input: texts.to_vec(),
            dimensions: self.request_dimensions,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| request_error("OpenAI", e))?;

        if !response.status().is_success() {
            let message = error_detail(response).await;
            error!(provider = "OpenAI", detail = %message, "API error");
            return Err(RagError::EmbeddingError { provider: "OpenAI".into(), message });
        }

        let embedding_response: EmbeddingResponse = response.json().await.map_err(|e| {
            RagError::EmbeddingError {
                provider: "OpenAI".into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(embedding_response.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ── Contextual enrichment via chat completions ─────────────────────

/// An [`Enricher`] backed by an OpenAI-compatible chat completions API.
///
/// Sends the situating-context prompt and returns the model's answer
/// verbatim (summary + header breadcrumb + keywords).
pub struct ChatEnricher {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatEnricher {
    /// Create a new enricher for the given chat model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::EnrichmentError {
                provider: "OpenAI".into(),
                message: "API key must not be empty".into(),
            });
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: OPENAI_BASE_URL.into(),
            api_key,
            model: model.into(),
        })
    }

    /// Point the client at an OpenAI-compatible gateway.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[async_trait]
impl Enricher for ChatEnricher {
    async fn enrich(&self, meta: &BlockMeta, text: &str, language: &str) -> Result<String> {
        let system = ENRICH_PROMPT
            .replace("{FILE_NAME}", &meta.file_name)
            .replace("{HEADER_PATH}", meta.header_path_str())
            .replace("{CHUNK_CONTENT}", text)
            .replace("{LANGUAGE}", language);
        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: &system },
                ChatMessage {
                    role: "user",
                    content: "Please give a short succinct context, skip the greeting or \
                              introduction, just only the content.",
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| RagError::EnrichmentError {
                provider: "OpenAI".into(),
                message: format!("request failed: {e}"),
            })?;

        if !response.status().is_success() {
            let message = error_detail(response).await;
            return Err(RagError::EnrichmentError { provider: "OpenAI".into(), message });
        }

        let chat: ChatResponse = response.json().await.map_err(|e| RagError::EnrichmentError {
            provider: "OpenAI".into(),
            message: format!("failed to parse response: {e}"),
        })?;

        chat.choices.into_iter().next().map(|c| c.message.content.trim().to_string()).ok_or_else(
            || RagError::EnrichmentError {
                provider: "OpenAI".into(),
                message: "API returned no choices".into(),
            },
        )
    }
}

// ── Reranking ──────────────────────────────────────────────────────

/// A [`Reranker`] backed by a text-embeddings-inference style `/rerank`
/// endpoint.
///
/// The request carries the query plus the sanitized candidate texts; the
/// response is a ranked list of input indices, which the client maps back
/// to candidate identifiers.
pub struct HttpReranker {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpReranker {
    /// Create a new reranker client for the given endpoint and model.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    texts: Vec<&'a str>,
    top_n: usize,
}

#[derive(Deserialize)]
struct RerankResult {
    index: usize,
}

#[async_trait]
impl Reranker for HttpReranker {
    async fn rerank(&self, query: &str, docs: &[RerankDoc], top_n: usize) -> Result<Vec<String>> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }

        debug!(reranker = "http", doc_count = docs.len(), top_n, "reranking candidates");

        let request_body = RerankRequest {
            model: &self.model,
            query,
            texts: docs.iter().map(|d| d.text.as_str()).collect(),
            top_n,
        };

        let response = self
            .client
            .post(format!("{}/rerank", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| RagError::RerankerError {
                reranker: "http".into(),
                message: format!("request failed: {e}"),
            })?;

        if !response.status().is_success() {
            let message = error_detail(response).await;
            error!(reranker = "http", detail = %message, "API error");
            return Err(RagError::RerankerError { reranker: "http".into(), message });
        }

        let results: Vec<RerankResult> =
            response.json().await.map_err(|e| RagError::RerankerError {
                reranker: "http".into(),
                message: format!("failed to parse response: {e}"),
            })?;

        let mut ids = Vec::with_capacity(results.len());
        for result in results.into_iter().take(top_n) {
            let doc = docs.get(result.index).ok_or_else(|| RagError::RerankerError {
                reranker: "http".into(),
                message: format!("response index {} out of range", result.index),
            })?;
            ids.push(doc.id.clone());
        }
        Ok(ids)
    }
}
