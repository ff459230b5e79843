#![deny(missing_docs)]
//! Image types for the filtra convolution engine

/// image representation with interleaved 8-bit channels.
pub mod image;

/// Error types for the image module.
pub mod error;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize};
