//! Floating-point comparison precision
//!
//! Process-wide number of significant figures used when comparing doubles.

use std::sync::atomic::{AtomicU32, Ordering};

/// Precision applied before every test
pub const SIGNIFICANT_FIGURES: u32 = 8;

static FIGURES: AtomicU32 = AtomicU32::new(SIGNIFICANT_FIGURES);

pub fn set_significant_figures(figures: u32) {
    FIGURES.store(figures, Ordering::Relaxed);
}

pub fn significant_figures() -> u32 {
    FIGURES.load(Ordering::Relaxed)
}

/// Compare two doubles to the configured number of significant figures
pub fn doubles_are_equal(left: f64, right: f64) -> bool {
    if left == right {
        return true;
    }
    let scale = left.abs().max(right.abs());
    let tolerance = scale * 10f64.powi(-(significant_figures() as i32 - 1)) / 2.0;
    (left - right).abs() <= tolerance
}
