mod model;
mod routes;
mod service;

pub use model::{ClaimResponse, RankedEntry, StreakResponse};
pub use routes::routes;
