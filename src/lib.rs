//! Nalssi Library
//!
//! Weather data acquisition with a TTL cache, deterministic synthetic
//! fallback and forecast interpolation. The binary is a thin JSON front end
//! over [`service::WeatherService`].

pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod data;
pub mod service;
