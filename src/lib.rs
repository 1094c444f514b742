//! cityscout: a location-centric data aggregator.
//!
//! A free-text query is geocoded once and stored; weather, dining, and movie
//! data for that location are fetched from third-party providers on demand
//! and cached in Postgres with a fixed staleness window.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
