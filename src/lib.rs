//! wxpanel library
//!
//! Current conditions and a multi-day forecast from Open-Meteo, laid out as a
//! terminal dashboard. The binary in `main.rs` wires these modules together;
//! they are exposed here for integration tests.

pub mod adapter;
pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod format;
pub mod presentation;
pub mod refresh;
pub mod ui;
