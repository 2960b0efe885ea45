//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the playback core:
//! - Logging and tracing infrastructure
//! - Bridge configuration (dependency injection)
//! - Event bus for observers
//!
//! ## Overview
//!
//! This crate contains the runtime utilities `core-playback` depends on. It
//! establishes the logging conventions, the fail-fast wiring of platform
//! bridges and the broadcast channel hosts subscribe to.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
