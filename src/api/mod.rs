//! HTTP API: service, documentation, crawl and workflow endpoints.

pub mod docs;
pub mod handlers;
pub mod marketing;
pub mod response;
pub mod routes;

pub use docs::ApiDoc;
pub use handlers::AppState;
pub use response::{ApiJson, ResponseModel};
pub use routes::create_router;
