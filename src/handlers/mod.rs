pub mod auth;
pub mod func;
