pub mod cache;
pub mod error;
pub mod mapping;
pub mod providers;
pub mod repos;
pub mod services;
