//! Canonical report model.
//!
//! This module defines the normalized, order-preserving structures the
//! extraction adapter produces and every renderer consumes. Analyzer output of
//! any shape is converted into these types exactly once, so renderers only
//! ever see the canonical content variants.

mod content;
mod field;
mod report;

pub use content::*;
pub use field::*;
pub use report::*;
