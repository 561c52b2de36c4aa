//! OpenAI speech client. One request per call, no retries.

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;

use super::model::{AudioFormat, TtsModel, Voice};
use crate::{error::ApiError, metrics};

#[derive(Debug, Clone, Error)]
pub enum TtsError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("empty audio response")]
    EmptyAudio,
}

impl From<TtsError> for ApiError {
    fn from(err: TtsError) -> Self {
        tracing::warn!(error = %err, "TTS provider call failed");
        Self::Upstream(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct TtsClientConfig {
    pub api_key: String,
    /// e.g. `https://api.openai.com/v1`
    pub base_url: String,
    pub timeout_secs: u64,
}

/// What to synthesise
#[derive(Debug, Clone, Copy)]
pub struct SpeechRequest<'a> {
    pub input: &'a str,
    pub voice: Voice,
    pub model: TtsModel,
    pub format: AudioFormat,
    pub speed: f64,
}

#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    model: &'static str,
    input: &'a str,
    voice: &'static str,
    response_format: &'static str,
    speed: f64,
}

impl<'a> From<&SpeechRequest<'a>> for SpeechBody<'a> {
    fn from(req: &SpeechRequest<'a>) -> Self {
        Self {
            model: req.model.as_str(),
            input: req.input,
            voice: req.voice.as_str(),
            response_format: req.format.as_str(),
            speed: req.speed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TtsClient {
    http: Client,
    api_key: String,
    speech_url: String,
}

impl TtsClient {
    pub fn new(config: TtsClientConfig) -> Result<Self, TtsError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("mlp-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TtsError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key: config.api_key,
            speech_url: speech_url(&config.base_url),
        })
    }

    /// Returns the raw audio bytes in the requested format.
    pub async fn synthesize(&self, request: &SpeechRequest<'_>) -> Result<Vec<u8>, TtsError> {
        let started = Instant::now();
        let result = self.send(request).await;

        metrics::record_tts_call(
            request.model.as_str(),
            result.is_ok(),
            started.elapsed().as_secs_f64(),
            request.input.chars().count(),
        );

        result
    }

    async fn send(&self, request: &SpeechRequest<'_>) -> Result<Vec<u8>, TtsError> {
        let res = self
            .http
            .post(&self.speech_url)
            .bearer_auth(&self.api_key)
            .json(&SpeechBody::from(request))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => {
                let bytes = res.bytes().await.map_err(map_reqwest_error)?;
                if bytes.is_empty() {
                    return Err(TtsError::EmptyAudio);
                }
                Ok(bytes.to_vec())
            }
            StatusCode::UNAUTHORIZED => Err(TtsError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => Err(TtsError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(TtsError::Http { status, body })
            }
        }
    }
}

fn speech_url(base_url: &str) -> String {
    format!("{}/audio/speech", base_url.trim_end_matches('/'))
}

fn map_reqwest_error(e: reqwest::Error) -> TtsError {
    if e.is_timeout() {
        TtsError::Timeout
    } else {
        TtsError::Transport(e.to_string())
    }
}
