//! Remote annotator: delegates tagging and entity recognition to an external
//! NLP service that returns spaCy's `Doc.to_json()` layout:
//!
//! ```json
//! {"text": "...",
//!  "tokens": [{"start": 0, "end": 4, "pos": "PROPN", "lemma": "Jane"}],
//!  "ents":   [{"start": 0, "end": 8, "label": "PERSON"}]}
//! ```
//!
//! Offsets in the response are character offsets; they are converted to byte
//! offsets here. Retries on 429 and 5xx with exponential backoff.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::nlp::{AnnotatedDoc, AnnotatedToken, Annotator, AnnotatorError, EntitySpan, Pos};

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Serialize)]
struct AnnotateRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct RemoteDoc {
    #[serde(default)]
    tokens: Vec<RemoteToken>,
    #[serde(default)]
    ents: Vec<RemoteEntity>,
}

#[derive(Debug, Deserialize)]
struct RemoteToken {
    start: usize,
    end: usize,
    #[serde(default)]
    pos: Option<String>,
    #[serde(default)]
    lemma: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoteEntity {
    start: usize,
    end: usize,
    label: String,
}

#[derive(Clone)]
pub struct RemoteAnnotator {
    client: Client,
    endpoint: String,
}

impl RemoteAnnotator {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, AnnotatorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch(&self, text: &str) -> Result<RemoteDoc, AnnotatorError> {
        let body = AnnotateRequest { text };
        let mut last_error: Option<AnnotatorError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // 500ms, 1s
                let delay = Duration::from_millis(500 * (1 << (attempt - 1)));
                warn!(
                    "Annotation attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.post(&self.endpoint).json(&body).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(AnnotatorError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                let message = response.text().await.unwrap_or_default();
                warn!("Annotation service returned {}: {}", status, message);
                last_error = Some(AnnotatorError::Service {
                    status: status.as_u16(),
                    message,
                });
                continue;
            }
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(AnnotatorError::Service {
                    status: status.as_u16(),
                    message,
                });
            }

            let doc: RemoteDoc = response.json().await?;
            debug!(
                "Annotation succeeded: tokens={}, ents={}",
                doc.tokens.len(),
                doc.ents.len()
            );
            return Ok(doc);
        }

        Err(last_error.unwrap_or(AnnotatorError::Unavailable {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl Annotator for RemoteAnnotator {
    fn backend(&self) -> &'static str {
        "remote"
    }

    async fn annotate(&self, text: &str) -> Result<AnnotatedDoc, AnnotatorError> {
        let remote = self.fetch(text).await?;
        convert_remote_doc(text, remote)
    }
}

/// Byte offset of every char boundary, plus the end of the text.
fn char_to_byte_offsets(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(text.len()))
        .collect()
}

fn convert_remote_doc(text: &str, remote: RemoteDoc) -> Result<AnnotatedDoc, AnnotatorError> {
    let offsets = char_to_byte_offsets(text);
    let byte_at = |char_offset: usize| {
        offsets.get(char_offset).copied().ok_or_else(|| {
            AnnotatorError::InvalidResponse(format!(
                "offset {char_offset} is outside the {} character text",
                offsets.len() - 1
            ))
        })
    };

    let mut tokens = Vec::with_capacity(remote.tokens.len());
    for token in &remote.tokens {
        if token.end < token.start {
            return Err(AnnotatorError::InvalidResponse(format!(
                "token span {}..{} is reversed",
                token.start, token.end
            )));
        }
        let (start, end) = (byte_at(token.start)?, byte_at(token.end)?);
        let surface = &text[start..end];
        let pos = token
            .pos
            .as_deref()
            .and_then(|p| p.parse::<Pos>().ok())
            .unwrap_or(Pos::X);
        let lemma = token
            .lemma
            .clone()
            .unwrap_or_else(|| surface.to_lowercase());
        tokens.push(AnnotatedToken::new(surface, pos, lemma, start));
    }

    let mut doc = AnnotatedDoc {
        text: text.to_string(),
        tokens,
        entities: Vec::new(),
    };

    for ent in &remote.ents {
        let (start, end) = (byte_at(ent.start)?, byte_at(ent.end)?);
        let first = doc.tokens.iter().position(|t| t.start >= start);
        let last = doc.tokens.iter().rposition(|t| t.end <= end);
        if let (Some(first), Some(last)) = (first, last) {
            if first <= last {
                let span: EntitySpan = doc.entity(&ent.label, first, last + 1);
                doc.entities.push(span);
            }
        }
    }
    doc.entities.sort_by_key(|e| e.start);

    Ok(doc)
}
