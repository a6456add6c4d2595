//! Inside Airbnb dataset fetcher
//!
//! This library provides the download, extraction and bookkeeping used by the
//! `airbnb-fetch` CLI.

pub mod commands;
pub mod core;
pub mod error;
pub mod utils;
