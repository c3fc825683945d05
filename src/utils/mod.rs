pub mod error;
pub mod jwt;
pub mod password;
pub mod response;
pub mod slug;
pub mod tokens;
