mod model;
mod routes;

pub use model::{CommentThread, LikeResponse, REPLY_PREVIEW_LIMIT};
pub use routes::routes;
