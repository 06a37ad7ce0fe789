//! bmcfan - remote fan control for server management controllers
//!
//! This library drives HP iLO4 and Supermicro BMC fan speeds from local
//! and remote temperature readings via configurable fan curves, with a
//! resilient command layer over flaky management-controller sessions.
//!
//! # Modules
//!
//! - [`actuator`]: Dialects, transports, and the resilient command client
//! - [`cli`]: Command-line interface definitions
//! - [`commands`]: Command handlers
//! - [`config`]: Configuration system
//! - [`control`]: Control loop, safety overrides, cross-cycle state
//! - [`domain`]: Domain models with validation
//! - [`error`]: Error types
//! - [`sensors`]: Temperature sources and the per-zone reader

pub mod actuator;
pub mod cli;
pub mod commands;
pub mod config;
pub mod control;
pub mod domain;
pub mod error;
pub mod exec;
pub mod sensors;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{AppError, Result};
