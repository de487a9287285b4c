//! fooderator library crate.
//!
//! Barcode scanning against a product lookup service, and rendering of what
//! comes back. The binary in `main.rs` is a thin CLI over these modules.

pub mod api;
pub mod camera;
pub mod config;
pub mod display;
pub mod lookup;
pub mod nutrition;
pub mod scanner;
