pub mod auth;
pub mod errors;

pub use auth::{AuthUser, MaybeAuthUser};
