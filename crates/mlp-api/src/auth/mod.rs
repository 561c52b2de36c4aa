pub mod jwt;
pub mod middleware;
pub mod password;
pub mod refresh_token;
pub mod routes;
pub mod service;
pub mod validation;

pub use middleware::{AdminUser, AuthUser};
pub use routes::routes;
