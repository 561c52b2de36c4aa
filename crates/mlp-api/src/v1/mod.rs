use axum::Router;

use crate::{
    admin, auth, challenge, comment, leaderboard, lesson, make_rate_limit_layer,
    middleware::rate_limit, progress, state::ApiState, tts, upload,
};

/// Everything mounted under `/v1`.
///
/// `auth` and `tts` bring their own limiters; the rest share the general tier.
pub fn routes() -> Router<ApiState> {
    let general = Router::new()
        .merge(lesson::routes())
        .merge(comment::routes())
        .merge(challenge::routes())
        .merge(progress::routes())
        .merge(leaderboard::routes())
        .merge(upload::routes())
        .merge(admin::routes())
        .layer(make_rate_limit_layer!(
            rate_limit::GENERAL_RATE_PER_SECOND,
            rate_limit::GENERAL_BURST_SIZE
        ));

    Router::new()
        .merge(auth::routes())
        .merge(tts::routes())
        .merge(general)
}
