/// HTTP surface
///
/// Thin handlers over `SyncEngine`, `JobTracker` and `TokenAuthority`.

pub mod auth_handlers;
pub mod handlers;
pub mod openapi;
pub mod price_handlers;
pub mod responses;
pub mod routes;

pub use openapi::ApiDoc;
pub use price_handlers::PriceState;
pub use responses::*;
pub use routes::create_router;
