//! JSON API over the cached station feed.
//!
//! Feed failures never become HTTP errors: list endpoints answer 200 with
//! an empty table and an `error` string so a dashboard can keep rendering.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
