pub mod auth;

pub use auth::{ProjectScope, API_KEY_HEADER};
