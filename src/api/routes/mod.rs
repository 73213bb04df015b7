//! API Routes
//!
//! Route handlers organized by functionality.

pub mod health;
pub mod readings;
pub mod stats;
