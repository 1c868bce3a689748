use super::{ImageSource, OcrClient, ServiceAccountKey, TokenProvider, VisionConfig, VISION_SCOPE};
use crate::error::{Error, Result};
use crate::vision::{
    AnnotateFileRequest, AnnotateImageRequest, BatchAnnotateFilesRequest,
    BatchAnnotateImagesRequest, ErrorEnvelope,
};
use reqwest::blocking::{Client, Response};
use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;

/// Google Cloud Vision client using service-account authentication.
#[derive(Debug)]
pub struct VisionClient {
    http: Client,
    config: VisionConfig,
    tokens: TokenProvider,
}

impl VisionClient {
    /// Create a client from a configuration and a token provider.
    pub fn new(config: VisionConfig, tokens: TokenProvider) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    /// Create a client from a service-account key file.
    pub fn from_credentials_file<P: AsRef<Path>>(path: P, config: VisionConfig) -> Result<Self> {
        let key = ServiceAccountKey::from_file(path)?;
        log::info!("Using service account {}", key.client_email);
        Self::new(config, TokenProvider::new(key, VISION_SCOPE))
    }

    /// Fetch an access token now, so unusable credentials fail before any
    /// file is sent.
    pub fn authenticate(&self) -> Result<()> {
        self.tokens.token(&self.http).map(|_| ())
    }

    pub fn config(&self) -> &VisionConfig {
        &self.config
    }

    fn post<B: Serialize>(&self, url: &str, body: &B) -> Result<Value> {
        let token = self.tokens.token(&self.http)?;
        let response = self.http.post(url).bearer_auth(token).json(body).send()?;
        Self::handle_response(response)
    }

    fn handle_response(response: Response) -> Result<Value> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json()?);
        }

        let body = response.text().unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .ok()
            .map(|e| e.error.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| body.trim().to_string());

        log::debug!("Vision API returned {}: {}", status, message);

        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }

    fn annotate_document(&self, source: &ImageSource) -> Result<Value> {
        let request = BatchAnnotateFilesRequest {
            requests: vec![AnnotateFileRequest::first_page(
                &source.content,
                source.format.mime_type(),
            )],
        };

        log::debug!("files:annotate {} ({} bytes)", source.name, source.content.len());
        let body = self.post(&self.config.files_url(), &request)?;
        first_page_response(body)
    }

    fn annotate_images(&self, sources: &[&ImageSource]) -> Result<Vec<Value>> {
        let request = BatchAnnotateImagesRequest {
            requests: sources
                .iter()
                .map(|s| AnnotateImageRequest::document_text(&s.content))
                .collect(),
        };

        log::debug!("images:annotate with {} image(s)", sources.len());
        let body = self.post(&self.config.images_url(), &request)?;
        let responses = take_responses(body)?;

        if responses.len() != sources.len() {
            return Err(Error::UnexpectedResponse(format!(
                "expected {} responses, got {}",
                sources.len(),
                responses.len()
            )));
        }
        Ok(responses)
    }
}

impl OcrClient for VisionClient {
    fn annotate(&self, source: &ImageSource) -> Result<Value> {
        if source.format.is_document() {
            return self.annotate_document(source);
        }

        self.annotate_images(&[source])?
            .pop()
            .ok_or_else(|| Error::UnexpectedResponse("empty responses".to_string()))
    }

    /// Rasters share `images:annotate` calls, as many per call as the
    /// payload budget allows; documents are sent one by one through
    /// `files:annotate`.
    fn annotate_batch(&self, sources: &[ImageSource]) -> Vec<Result<Value>> {
        let mut results: Vec<Option<Result<Value>>> = sources.iter().map(|_| None).collect();

        let (documents, rasters): (Vec<_>, Vec<_>) = sources
            .iter()
            .enumerate()
            .partition(|(_, s)| s.format.is_document());

        for (index, source) in documents {
            results[index] = Some(self.annotate_document(source));
        }

        let groups = payload_groups(&rasters, self.config.max_request_bytes, |(_, s)| {
            encoded_len(s.content.len())
        });
        if groups.len() > 1 {
            log::debug!(
                "Splitting {} image(s) into {} requests by payload size",
                rasters.len(),
                groups.len()
            );
        }

        for group in groups {
            let batch: Vec<&ImageSource> = group.iter().map(|(_, s)| *s).collect();
            match self.annotate_images(&batch) {
                Ok(values) => {
                    for ((index, _), value) in group.iter().zip(values) {
                        results[*index] = Some(Ok(value));
                    }
                }
                Err(e) => {
                    log::warn!("Batch of {} image(s) failed: {}", group.len(), e);
                    for (index, _) in group {
                        results[*index] = Some(Err(shared_error(&e)));
                    }
                }
            }
        }

        results
            .into_iter()
            .map(|r| r.unwrap_or_else(|| Err(Error::UnexpectedResponse("missing result".into()))))
            .collect()
    }
}

/// Split `items` into consecutive groups whose summed `size` stays within
/// `limit`. An item larger than `limit` forms a group of its own.
fn payload_groups<T>(items: &[T], limit: usize, size: impl Fn(&T) -> usize) -> Vec<&[T]> {
    let mut groups = Vec::new();
    let mut start = 0;
    let mut total = 0;

    for (i, item) in items.iter().enumerate() {
        let n = size(item);
        if i > start && total + n > limit {
            groups.push(&items[start..i]);
            start = i;
            total = 0;
        }
        total += n;
    }

    if start < items.len() {
        groups.push(&items[start..]);
    }
    groups
}

/// Length of `bytes` raw bytes once base64 encoded.
fn encoded_len(bytes: usize) -> usize {
    bytes.div_ceil(3) * 4
}

/// Copy of a batch-wide error for each item it affected.
fn shared_error(error: &Error) -> Error {
    match error {
        Error::Api { status, message } => Error::Api {
            status: *status,
            message: message.clone(),
        },
        other => Error::Request(other.to_string()),
    }
}

fn take_responses(mut body: Value) -> Result<Vec<Value>> {
    match body.get_mut("responses").map(Value::take) {
        Some(Value::Array(items)) => Ok(items),
        Some(Value::Null) | None => Ok(Vec::new()),
        Some(_) => Err(Error::UnexpectedResponse(
            "'responses' is not an array".to_string(),
        )),
    }
}

/// Reduce a `files:annotate` body to the image response of its first page.
///
/// A file-level error becomes an in-body error so the item is still dumped.
fn first_page_response(body: Value) -> Result<Value> {
    let mut file = take_responses(body)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::UnexpectedResponse("no file response".to_string()))?;

    if let Some(error) = file.get("error").filter(|e| !e.is_null()).cloned() {
        return Ok(json!({ "error": error }));
    }

    Ok(take_responses(file.take())?
        .into_iter()
        .next()
        .unwrap_or_else(|| json!({})))
}
