//! Core ReportApp library (session, API clients, geocoding, controllers).

pub mod api;
pub mod config;
pub mod controllers;
pub mod device;
pub mod error;
pub mod geocode;
pub mod models;
pub mod navigation;
pub mod session;

pub use error::{ClientError, ClientResult};
