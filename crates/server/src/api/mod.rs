pub mod books;
pub mod cache;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use routes::create_router;

use serde::Serialize;

/// Error body shared by all API handlers.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
