pub mod auth_handlers;
pub mod catalog_handlers;
pub mod error;
pub mod middleware;
pub mod profile_handlers;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::router;
pub use state::AppState;
