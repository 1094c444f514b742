pub mod db;
pub mod error;
pub mod http;
pub mod providers;
pub mod telemetry;
