//! SolarScout Core - Domain models, errors, and configuration
//!
//! This crate contains the data model shared by the normalizer, the dataset
//! builder and the analysis engine, plus the port through which raw
//! geographic features enter the system.

pub mod config;
pub mod error;
pub mod formats;
pub mod models;
pub mod ports;

pub use error::{Result, SolarscoutError};
