pub mod client;
pub mod cost;
mod model;
mod routes;

pub use model::{AudioFormat, TtsModel, Voice};
pub use routes::routes;
