//! Dashboard UI Module
//!
//! The desktop window: drawing surface on the left, prediction and
//! preview images on the right.

pub mod app;
pub mod components;
pub mod theme;

pub use app::{run_dashboard, DashboardApp};
