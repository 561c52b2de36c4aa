mod model;
mod routes;
pub mod service;

pub use model::{FeedItem, MilestoneView, ReactionResponse, ShareDetail, StatsResponse};
pub use routes::routes;
