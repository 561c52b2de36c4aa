//! Per-IP rate limiting tiers.
//!
//! Each route group builds its own limiter with [`make_rate_limit_layer!`](crate::make_rate_limit_layer),
//! so buckets are not shared between tiers. Client IPs come from `X-Forwarded-For`,
//! `X-Real-IP` or `Forwarded` before falling back to the peer address.

/// Credential endpoints: 5 requests per second, burst of 10
pub const AUTH_RATE_PER_SECOND: u64 = 5;
pub const AUTH_BURST_SIZE: u32 = 10;

/// Everything else: 10 requests per second, burst of 20
pub const GENERAL_RATE_PER_SECOND: u64 = 10;
pub const GENERAL_BURST_SIZE: u32 = 20;

/// Paid speech synthesis: 1 request per second, burst of 5
pub const TTS_RATE_PER_SECOND: u64 = 1;
pub const TTS_BURST_SIZE: u32 = 5;

/// Build a `GovernorLayer` keyed on the client IP.
///
/// A macro rather than a function so callers never spell out the layer's generic parameters.
#[macro_export]
macro_rules! make_rate_limit_layer {
    ($per_second:expr, $burst:expr) => {{
        let config = ::tower_governor::governor::GovernorConfigBuilder::default()
            .per_second($per_second)
            .burst_size($burst)
            .key_extractor(::tower_governor::key_extractor::SmartIpKeyExtractor)
            .use_headers()
            .finish()
            .expect("rate limiter values are non-zero");
        ::tower_governor::GovernorLayer::new(config)
    }};
}
