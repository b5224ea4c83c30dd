//! Vertex AI implementation of [`ManualAnswerer`].
//!
//! Sends the question to Gemini `generateContent` with a retrieval tool
//! pointing at the manual corpus, so the answer is grounded in the manuals.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sherpa_core::config::{Credentials, HttpConfig, ManualConfig};

use crate::error::ManualError;
use crate::ManualAnswerer;

/// Compose the question sent to the model.
pub fn build_prompt(model: &str, problem: &str) -> String {
    format!("My car is a {}. {}", model.trim(), problem.trim())
}

/// Manual answerer backed by Vertex AI RAG.
pub struct VertexRagAnswerer {
    client: Client,
    endpoint: String,
    api_key: SecretString,
    access_token: Option<SecretString>,
    corpus_name: String,
    similarity_top_k: u32,
    vector_distance_threshold: f64,
    timeout_secs: u64,
}

impl VertexRagAnswerer {
    pub fn new(
        credentials: &Credentials,
        manual: &ManualConfig,
        http: &HttpConfig,
    ) -> Result<Self, ManualError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(http.request_timeout_secs))
            .build()
            .map_err(|e| ManualError::Request(e.to_string()))?;

        let base_url = manual.base_url.clone().unwrap_or_else(|| {
            format!(
                "https://{}-aiplatform.googleapis.com",
                credentials.google_cloud_location
            )
        });
        let endpoint = format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            credentials.google_cloud_project,
            credentials.google_cloud_location,
            manual.model
        );

        Ok(Self {
            client,
            endpoint,
            api_key: credentials.google_api_key.clone(),
            access_token: credentials.google_access_token.clone(),
            corpus_name: credentials.corpus_name.clone(),
            similarity_top_k: manual.similarity_top_k,
            vector_distance_threshold: manual.vector_distance_threshold,
            timeout_secs: http.request_timeout_secs,
        })
    }

    /// The `generateContent` URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_request(&self, prompt: String) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: Some(prompt) }],
            }],
            tools: vec![Tool {
                retrieval: Retrieval {
                    vertex_rag_store: VertexRagStore {
                        rag_resources: vec![RagResource {
                            rag_corpus: self.corpus_name.clone(),
                        }],
                        similarity_top_k: self.similarity_top_k,
                        vector_distance_threshold: self.vector_distance_threshold,
                    },
                },
            }],
        }
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => req.bearer_auth(token.expose_secret()),
            None => req.header("x-goog-api-key", self.api_key.expose_secret()),
        }
    }
}

#[async_trait]
impl ManualAnswerer for VertexRagAnswerer {
    async fn answer(&self, model: &str, problem: &str) -> Result<String, ManualError> {
        let body = self.build_request(build_prompt(model, problem));

        tracing::debug!(model, "Querying manual corpus");

        let response = self
            .authorize(self.client.post(&self.endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ManualError::Timeout(self.timeout_secs)
                } else {
                    ManualError::Request(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ManualError::Request(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(classify_http_error(status.as_u16(), &text));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| ManualError::Malformed(format!("failed to parse response: {e}")))?;
        let answer = parsed.into_answer()?;

        tracing::info!(model, answer_len = answer.len(), "Manual answer received");
        Ok(answer)
    }
}

fn classify_http_error(status: u16, body: &str) -> ManualError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());
    match status {
        401 | 403 => ManualError::Auth(message),
        _ => ManualError::Api { status, message },
    }
}

// Vertex AI wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct Tool {
    retrieval: Retrieval,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Retrieval {
    vertex_rag_store: VertexRagStore,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VertexRagStore {
    rag_resources: Vec<RagResource>,
    similarity_top_k: u32,
    vector_distance_threshold: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RagResource {
    rag_corpus: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GenerateContentResponse {
    fn into_answer(self) -> Result<String, ManualError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(ManualError::Blocked(reason));
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ManualError::Malformed("no candidates in response".to_string()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(match candidate.finish_reason.as_deref() {
                Some("SAFETY") | Some("RECITATION") | Some("BLOCKLIST") => {
                    ManualError::Blocked(candidate.finish_reason.unwrap_or_default())
                }
                _ => ManualError::Malformed("candidate has no text".to_string()),
            });
        }
        Ok(text)
    }
}
