mod model;
mod routes;

pub use model::{CompletionResponse, CreateLessonRequest, UpdateLessonRequest};
pub use routes::routes;
