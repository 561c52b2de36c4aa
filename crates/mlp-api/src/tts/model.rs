use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::not_blank;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    #[default]
    Alloy,
    Echo,
    Fable,
    Onyx,
    Nova,
    Shimmer,
}

impl Voice {
    pub const ALL: [Self; 6] = [
        Self::Alloy,
        Self::Echo,
        Self::Fable,
        Self::Onyx,
        Self::Nova,
        Self::Shimmer,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alloy => "alloy",
            Self::Echo => "echo",
            Self::Fable => "fable",
            Self::Onyx => "onyx",
            Self::Nova => "nova",
            Self::Shimmer => "shimmer",
        }
    }

    const fn description(self) -> &'static str {
        match self {
            Self::Alloy => "Neutral and balanced",
            Self::Echo => "Warm and clear",
            Self::Fable => "Expressive, storytelling",
            Self::Onyx => "Deep and authoritative",
            Self::Nova => "Bright and energetic",
            Self::Shimmer => "Soft and gentle",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TtsModel {
    #[default]
    #[serde(rename = "tts-1")]
    Tts1,
    #[serde(rename = "tts-1-hd")]
    Tts1Hd,
}

impl TtsModel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tts1 => "tts-1",
            Self::Tts1Hd => "tts-1-hd",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Opus,
    Aac,
    Flac,
    Wav,
    Pcm,
}

impl AudioFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Opus => "opus",
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Pcm => "pcm",
        }
    }

    /// Playable `data:audio/<format>;base64,...` URL for stored audio.
    pub fn data_url(self, audio: &[u8]) -> String {
        format!("data:audio/{};base64,{}", self.as_str(), STANDARD.encode(audio))
    }
}

const fn default_speed() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(alias = "input")]
    #[validate(
        length(min = 1, max = 4096, message = "must be 1-4096 characters"),
        custom(function = "not_blank")
    )]
    pub text: String,
    #[serde(default)]
    pub voice: Voice,
    #[serde(default)]
    pub model: TtsModel,
    #[serde(default, alias = "response_format", alias = "responseFormat")]
    pub format: AudioFormat,
    #[serde(default = "default_speed")]
    #[validate(range(min = 0.25, max = 4.0, message = "must be between 0.25 and 4.0"))]
    pub speed: f64,
    #[serde(default)]
    pub save: bool,
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub title: Option<String>,
    pub lesson_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    #[serde(alias = "input")]
    #[validate(length(min = 1, max = 4096, message = "must be 1-4096 characters"))]
    pub text: String,
    #[serde(default)]
    pub model: TtsModel,
    #[serde(default = "default_speed")]
    #[validate(range(min = 0.25, max = 4.0, message = "must be between 0.25 and 4.0"))]
    pub speed: f64,
}

/// Items are validated one by one so a bad entry fails alone.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BatchRequest {
    #[validate(length(min = 1, max = 10, message = "must contain 1-10 items"))]
    pub items: Vec<GenerateRequest>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceInfo {
    pub id: &'static str,
    pub description: &'static str,
}

pub fn voice_catalog() -> Vec<VoiceInfo> {
    Voice::ALL
        .into_iter()
        .map(|voice| VoiceInfo {
            id: voice.as_str(),
            description: voice.description(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoicesResponse {
    pub voices: Vec<VoiceInfo>,
    pub models: [&'static str; 2],
    pub formats: [&'static str; 6],
}

impl VoicesResponse {
    pub fn catalog() -> Self {
        Self {
            voices: voice_catalog(),
            models: [TtsModel::Tts1.as_str(), TtsModel::Tts1Hd.as_str()],
            formats: ["mp3", "opus", "aac", "flac", "wav", "pcm"],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    pub characters: usize,
    pub model: TtsModel,
    pub estimated_cost: f64,
    pub estimated_duration_seconds: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAudio {
    pub audio_url: String,
    pub voice: Voice,
    pub model: TtsModel,
    pub format: AudioFormat,
    pub speed: f64,
    pub characters: usize,
    pub cost: f64,
    pub duration_seconds: f64,
    /// Present when the request asked for `save`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_item_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BatchOutcome {
    Success { index: usize, result: GeneratedAudio },
    Failure { index: usize, error: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BatchOutcome>,
}

impl BatchResponse {
    pub fn from_outcomes(results: Vec<BatchOutcome>) -> Self {
        let failed = results
            .iter()
            .filter(|r| matches!(r, BatchOutcome::Failure { .. }))
            .count();
        Self {
            succeeded: results.len() - failed,
            failed,
            results,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryFilter {
    pub lesson_id: Option<Uuid>,
}

/// Library title: the caller's, else the first words of the text.
pub fn library_title(title: Option<&str>, text: &str) -> String {
    if let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) {
        return title.to_string();
    }
    let mut preview: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if preview.chars().count() > 50 {
        preview = preview.chars().take(50).collect::<String>() + "...";
    }
    preview
}
