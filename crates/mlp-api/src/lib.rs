pub mod admin;
pub mod auth;
pub mod challenge;
pub mod comment;
pub mod config;
pub mod error;
pub mod jobs;
pub mod leaderboard;
pub mod lesson;
pub mod metrics;
pub mod middleware;
pub mod normalization;
pub mod progress;
pub mod response;
pub mod router;
pub mod state;
pub mod tracing;
pub mod tts;
pub mod upload;
pub mod v1;
pub mod validation;

pub use config::ApiConfig;
pub use state::{ApiState, AuthConfig};
