//! Core types and trait definitions for the Punchcard attendance bridge.
//!
//! This crate is deliberately free of broker and database dependencies.
//! The store, codec and bridge crates build on it.

pub mod attendance;
pub mod error;
pub mod event;
pub mod identity;
pub mod response;
pub mod store;

pub use error::{Error, Result};
