//! # Sanduq Support
//!
//! Shared helpers for the Sanduq crates.
//!
//! This crate provides:
//! - Text rendering for error messages and registry descriptions

pub mod rendering;
