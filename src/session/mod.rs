//! Session module
//!
//! One [`SessionContext`] exists per run. It owns the cookie jar that carries the
//! login, the HTTP client bound to that jar, and the tokens refreshed as the run
//! progresses. Every stage receives it by reference (or `Arc`) instead of reaching
//! for shared globals.

mod context;
mod credentials;

pub use context::{next_bearer_token, SessionContext, BEARER_TOKEN_FIELD};
pub use credentials::Credentials;
