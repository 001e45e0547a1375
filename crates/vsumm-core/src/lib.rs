//! # vsumm-core
//!
//! Tensor primitives shared by the vsumm crates.
//!
//! This crate provides:
//! - [`Tensor`] — immutable, Arc-backed f32 array (feature matrices, score vectors)
//! - [`Shape`] — dimension sizes and row-major strides
//! - [`DType`] — on-disk element types and their decoding to f32
//! - [`Error`] / [`Result`] — tensor construction errors

pub mod dtype;
pub mod error;
pub mod shape;
pub mod tensor;

pub use dtype::DType;
pub use error::{Error, Result};
pub use shape::Shape;
pub use tensor::Tensor;
