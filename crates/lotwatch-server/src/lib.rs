//! # lotwatch-server
//!
//! HTTP server library for lotwatch.
//!
//! This library provides the API handlers and state management for the
//! parking lot and shuttle status service.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod api;
pub mod logging;
pub mod state;
