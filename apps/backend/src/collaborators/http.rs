//! JSON-over-HTTP clients for the narration and image synthesis services.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{
    CollaboratorError, ConclusionContext, GenerationContext, ImageBackend, ImageGenerator,
    IntroductionContext, Narrator, RoundContext,
};
use crate::domain::RoundOutcome;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone)]
struct JsonClient {
    client: reqwest::Client,
    base_url: String,
    service: &'static str,
}

impl JsonClient {
    fn new(base_url: impl Into<String>, service: &'static str) -> Result<Self, CollaboratorError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CollaboratorError::Unavailable(format!("{service}: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            service,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, CollaboratorError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|e| CollaboratorError::Unavailable(format!("{}: {e}", self.service)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<response body unavailable>".to_string());
            return Err(CollaboratorError::Unavailable(format!(
                "{} returned {status}: {body}",
                self.service
            )));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| CollaboratorError::InvalidResponse(format!("{}: {e}", self.service)))
    }
}

/// Narration service client: `POST /introduce`, `/resolve`, `/conclude`.
#[derive(Clone)]
pub struct HttpNarrator {
    inner: JsonClient,
}

impl HttpNarrator {
    pub fn new(base_url: impl Into<String>) -> Result<Self, CollaboratorError> {
        Ok(Self {
            inner: JsonClient::new(base_url, "narrator")?,
        })
    }
}

#[async_trait]
impl Narrator for HttpNarrator {
    async fn introduce(&self, ctx: IntroductionContext) -> Result<RoundOutcome, CollaboratorError> {
        self.inner.post("introduce", &ctx).await
    }

    async fn resolve_round(&self, ctx: RoundContext) -> Result<RoundOutcome, CollaboratorError> {
        self.inner.post("resolve", &ctx).await
    }

    async fn conclude(&self, ctx: ConclusionContext) -> Result<RoundOutcome, CollaboratorError> {
        self.inner.post("conclude", &ctx).await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    prompt: &'a str,
    backend: ImageBackend,
    reference_images: Vec<String>,
    wizard_descriptions: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    image_base64: String,
}

/// Image synthesis client: `POST /generate`, image bytes returned as base64.
#[derive(Clone)]
pub struct HttpImageGenerator {
    inner: JsonClient,
    backend: ImageBackend,
}

impl HttpImageGenerator {
    pub fn new(base_url: impl Into<String>, backend: ImageBackend) -> Result<Self, CollaboratorError> {
        Ok(Self {
            inner: JsonClient::new(base_url, "image-generator")?,
            backend,
        })
    }
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    async fn generate(
        &self,
        prompt: &str,
        ctx: GenerationContext,
    ) -> Result<Vec<u8>, CollaboratorError> {
        let request = GenerateRequest {
            prompt,
            backend: self.backend,
            reference_images: ctx
                .reference_images
                .iter()
                .map(|r| BASE64.encode(&r.bytes))
                .collect(),
            wizard_descriptions: ctx.wizard_descriptions,
        };
        let response: GenerateResponse = self.inner.post("generate", &request).await?;

        BASE64
            .decode(response.image_base64.as_bytes())
            .map_err(|e| CollaboratorError::InvalidResponse(format!("image payload: {e}")))
    }
}
