//! # Formats Module
//!
//! Serialization formats for pipeline artifacts.
//!
//! Pure transformations only: file I/O lives in [`crate::loader`] and in the
//! app layer.

mod artifact;

pub use artifact::*;
