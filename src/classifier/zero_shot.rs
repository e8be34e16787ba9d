// Zero-shot classification over HTTP
// Speaks the Hugging Face inference API "zero-shot-classification" task, e.g.
// https://api-inference.huggingface.co/models/facebook/bart-large-mnli
// Self-hosted text-embeddings-inference / transformers servers use the same shape.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{Classifier, ClassifierError};
use crate::config::ClassifierConfig;

pub struct ZeroShotClient {
    client: Client,
    url: String,
    api_token: Option<String>,
    max_input_chars: usize,
}

#[derive(Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: ZeroShotParameters<'a>,
}

#[derive(Serialize)]
struct ZeroShotParameters<'a> {
    candidate_labels: &'a [String],
    multi_label: bool,
}

// Older deployments answer with parallel label/score arrays, newer ones with
// a list of {label, score} pairs. Both are already sorted best-first.
#[derive(Deserialize)]
#[serde(untagged)]
enum ZeroShotResponse {
    Columns {
        labels: Vec<String>,
        #[serde(default)]
        #[allow(dead_code)]
        scores: Vec<f64>,
    },
    Pairs(Vec<LabelScore>),
}

#[derive(Deserialize)]
struct LabelScore {
    label: String,
    #[allow(dead_code)]
    score: f64,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

impl ZeroShotClient {
    pub fn new(url: impl Into<String>, api_token: Option<String>, timeout: Duration) -> Result<Self, ClassifierError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            api_token,
            max_input_chars: 4000,
        })
    }

    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let mut client = Self::new(
            config.url.clone(),
            config.api_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        client.max_input_chars = config.max_input_chars;
        Ok(client)
    }

    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }
}

#[async_trait]
impl Classifier for ZeroShotClient {
    async fn classify(&self, text: &str, labels: &[String]) -> Result<Vec<String>, ClassifierError> {
        let inputs = truncate_chars(text, self.max_input_chars);
        let body = ZeroShotRequest {
            inputs,
            parameters: ZeroShotParameters {
                candidate_labels: labels,
                multi_label: false,
            },
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        debug!(url = %self.url, input_chars = inputs.chars().count(), "Sending zero-shot request");
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&raw)
                .map(|e| e.error)
                .unwrap_or(raw);
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ZeroShotResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::InvalidResponse(e.to_string()))?;

        Ok(match parsed {
            ZeroShotResponse::Columns { labels, .. } => labels,
            ZeroShotResponse::Pairs(pairs) => pairs.into_iter().map(|p| p.label).collect(),
        })
    }

    fn name(&self) -> &str {
        "zero-shot"
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
