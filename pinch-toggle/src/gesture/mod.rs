//! Gesture core: landmark projection, fingertip geometry and debouncing.
//!
//! Pure logic with no I/O: the pipeline feeds it frames and acts on the
//! `Decision` it returns.

pub mod debounce;
pub mod geometry;
pub mod landmarks;

pub use debounce::{GestureConfig, RearmPolicy};
