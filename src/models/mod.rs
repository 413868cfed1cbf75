pub mod auth;
pub mod receipt;
pub mod template;
pub mod user;
