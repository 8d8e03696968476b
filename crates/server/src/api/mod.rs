pub mod admin;
pub mod audit;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod professor;
pub mod requests;
pub mod routes;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
