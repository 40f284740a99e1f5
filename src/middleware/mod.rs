pub mod auth;
pub mod ownership;
pub mod response;
pub mod security;
