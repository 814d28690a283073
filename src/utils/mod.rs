//! Utility functions
//!
//! Provides the breadcrumb trail, logging setup and timing helpers.

pub mod breadcrumb;
pub mod logger;
pub mod timer;
