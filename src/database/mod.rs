pub mod manager;
pub mod models;
pub mod repository;

pub use manager::DatabaseError;
pub use repository::Repository;
