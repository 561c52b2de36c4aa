mod model;
mod routes;

pub use routes::routes;
