use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{
    ApiConfig,
    config::Environment,
    tts::client::{TtsClient, TtsClientConfig},
};

#[derive(Clone)]
pub struct ApiState {
    pub pool: PgPool,
    pub auth: AuthConfig,
    pub environment: Environment,
    /// `None` when no OpenAI key is configured
    pub tts: Option<TtsClient>,
    pub uploads: UploadConfig,
}

/// Everything the auth layer needs besides the database
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub refresh_token_expiry_days: i64,
    pub bcrypt_cost: u32,
}

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub base_url: String,
    pub max_bytes: i64,
}

impl ApiState {
    pub fn new(config: ApiConfig, pool: PgPool) -> anyhow::Result<Self> {
        let tts = match config.openai_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Some(TtsClient::new(TtsClientConfig {
                api_key: key.to_string(),
                base_url: config.openai_base_url.clone(),
                timeout_secs: config.tts_timeout_secs,
            })?),
            _ => {
                tracing::warn!("OPENAI_API_KEY not set, TTS endpoints will return 503");
                None
            }
        };

        Ok(Self {
            pool,
            auth: AuthConfig {
                jwt_secret: config.jwt_secret,
                jwt_expiry_hours: config.jwt_expiry_hours,
                refresh_token_expiry_days: config.refresh_token_expiry_days,
                bcrypt_cost: config.bcrypt_cost,
            },
            environment: config.env,
            tts,
            uploads: UploadConfig {
                base_url: config.upload_base_url.trim_end_matches('/').to_string(),
                max_bytes: config.upload_max_bytes,
            },
        })
    }
}

impl FromRef<ApiState> for AuthConfig {
    fn from_ref(state: &ApiState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<ApiState> for PgPool {
    fn from_ref(state: &ApiState) -> Self {
        state.pool.clone()
    }
}
