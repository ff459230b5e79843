use std::sync::OnceLock;

use filtra_image::Image;

use super::kernels::KernelRegistry;
use super::{convolve, FilterError};
use crate::parallel::PartitionStrategy;

/// The process-wide kernel registry, built on first use and read-only after.
fn registry() -> &'static KernelRegistry {
    static REGISTRY: OnceLock<KernelRegistry> = OnceLock::new();
    REGISTRY.get_or_init(KernelRegistry::new)
}

/// Apply a named convolution filter to an image.
///
/// Resolves the kernel name in the built-in registry, allocates an output
/// image with the same shape as the source, and convolves the source into it
/// with the given partition strategy and worker count. All errors are
/// reported before any pixel is computed; no partial output is ever exposed.
///
/// # Arguments
///
/// * `src` - The source image with interleaved 8-bit channels.
/// * `kernel_name` - One of the registry names (`identity`, `edge`,
///   `sharpen`, `blur`, `gaussian`, `emboss`), matched case-sensitively.
/// * `num_threads` - The number of worker threads, must be > 0.
/// * `strategy` - How to divide the rows among the workers.
///
/// # Returns
///
/// The filtered image with the same size and channel count as the source.
///
/// # Examples
///
/// ```
/// use filtra_image::{Image, ImageSize};
/// use filtra_imgproc::filter::apply_convolution;
/// use filtra_imgproc::parallel::PartitionStrategy;
///
/// let src = Image::from_size_val(ImageSize { width: 8, height: 6 }, 3, 127).unwrap();
/// let dst = apply_convolution(&src, "blur", 4, PartitionStrategy::StaticRows).unwrap();
///
/// assert_eq!(dst.size(), src.size());
/// assert_eq!(dst.num_channels(), src.num_channels());
/// ```
pub fn apply_convolution(
    src: &Image,
    kernel_name: &str,
    num_threads: usize,
    strategy: PartitionStrategy,
) -> Result<Image, FilterError> {
    let kernel = registry().get(kernel_name)?;
    let mut dst = Image::from_size_val(src.size(), src.num_channels(), 0)?;
    convolve(src, &mut dst, kernel, strategy, num_threads)?;
    Ok(dst)
}
