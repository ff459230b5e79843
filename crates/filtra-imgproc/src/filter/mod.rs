//! Filter operations
//!
//! This module provides kernel convolution operations for image processing.

use filtra_image::ImageError;

use crate::parallel::ParallelError;

/// Filter kernels and the kernel registry
pub mod kernels;

/// Convolution operations
mod convolution;
pub use convolution::*;

/// Filter entry points
mod ops;
pub use ops::*;

/// An error type for the filter module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FilterError {
    /// The kernel name is not present in the registry.
    #[error("Unknown kernel name: {0}")]
    UnknownKernelName(String),

    /// The kernel size is even or zero.
    #[error("Kernel size must be a positive odd integer, got {0}")]
    InvalidKernelSize(usize),

    /// The number of kernel coefficients does not match the kernel size.
    #[error("Kernel of size {0} requires {1} coefficients, got {2}")]
    InvalidKernelLength(usize, usize, usize),

    /// The source and destination images do not have the same shape.
    #[error("Source ({0}x{1}x{2}) and destination ({3}x{4}x{5}) shapes do not match")]
    DimensionMismatch(usize, usize, usize, usize, usize, usize),

    /// Failed to create an image.
    #[error("Failed to create image. {0}")]
    ImageCreationError(#[from] ImageError),

    /// Failed to execute in parallel.
    #[error("Failed to execute in parallel. {0}")]
    ParallelError(#[from] ParallelError),
}
