use filtra_image::Image;

use super::kernels::Kernel;
use super::FilterError;
use crate::parallel::{self, PartitionStrategy, WorkUnit};

/// Compute one output channel value by applying the kernel window at a pixel.
///
/// Neighbor coordinates outside the image are clamped per axis into
/// `[0, dim - 1]` (replicate border, never wrapping). The weighted sum is
/// accumulated in `f32`, clamped into `[0, 255]` and truncated toward zero;
/// truncation rather than rounding is the byte conversion policy and callers
/// depend on it.
///
/// Reads only the shared source buffer, so it is safe to call concurrently
/// for disjoint outputs.
pub fn convolve_channel(src: &Image, x: usize, y: usize, channel: usize, kernel: &Kernel) -> u8 {
    convolve_at(
        src.as_slice(),
        src.width(),
        src.height(),
        src.num_channels(),
        x,
        y,
        channel,
        kernel,
    )
}

#[allow(clippy::too_many_arguments)]
fn convolve_at(
    data: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    x: usize,
    y: usize,
    channel: usize,
    kernel: &Kernel,
) -> u8 {
    let half = kernel.half() as isize;
    let coeffs = kernel.as_slice();
    let kernel_size = kernel.size() as isize;

    let mut sum = 0.0f32;
    for ky in -half..=half {
        let src_y = (y as isize + ky).clamp(0, height as isize - 1) as usize;
        for kx in -half..=half {
            let src_x = (x as isize + kx).clamp(0, width as isize - 1) as usize;
            let pixel = data[(src_y * width + src_x) * channels + channel];
            let coeff = coeffs[((ky + half) * kernel_size + (kx + half)) as usize];
            sum += f32::from(pixel) * coeff;
        }
    }

    // `as` truncates toward zero, not rounds
    sum.clamp(0.0, 255.0) as u8
}

/// Convolve the rows of one work unit into its output band.
fn convolve_unit(src: &Image, kernel: &Kernel, unit: &WorkUnit, band: &mut [u8]) {
    let width = src.width();
    let height = src.height();
    let channels = src.num_channels();
    let data = src.as_slice();

    let mut idx = 0;
    for y in unit.start..unit.end {
        for x in 0..width {
            for channel in 0..channels {
                band[idx] = convolve_at(data, width, height, channels, x, y, channel, kernel);
                idx += 1;
            }
        }
    }
}

/// Convolve an image with a square kernel.
///
/// Every output pixel depends only on the read-only source buffer, so the
/// rows are partitioned with the given strategy and dispatched to a pool of
/// `num_threads` workers; the result is byte-for-byte identical regardless of
/// the strategy or worker count.
///
/// # Arguments
///
/// * `src` - The source image with interleaved 8-bit channels.
/// * `dst` - The destination image, same shape as `src`.
/// * `kernel` - The convolution kernel.
/// * `strategy` - How to divide the rows among the workers.
/// * `num_threads` - The number of worker threads, must be > 0.
///
/// # Errors
///
/// Fails before any write if the shapes differ, the thread count is zero, or
/// the strategy parameters are invalid.
///
/// # Examples
///
/// ```
/// use filtra_image::{Image, ImageSize};
/// use filtra_imgproc::filter::{convolve, kernels};
/// use filtra_imgproc::parallel::PartitionStrategy;
///
/// let src = Image::from_size_val(ImageSize { width: 4, height: 4 }, 1, 128).unwrap();
/// let mut dst = Image::from_size_val(src.size(), 1, 0).unwrap();
///
/// convolve(
///     &src,
///     &mut dst,
///     &kernels::identity_kernel(),
///     PartitionStrategy::StaticRows,
///     2,
/// ).unwrap();
///
/// assert_eq!(dst.as_slice(), src.as_slice());
/// ```
pub fn convolve(
    src: &Image,
    dst: &mut Image,
    kernel: &Kernel,
    strategy: PartitionStrategy,
    num_threads: usize,
) -> Result<(), FilterError> {
    if src.size() != dst.size() || src.num_channels() != dst.num_channels() {
        return Err(FilterError::DimensionMismatch(
            src.width(),
            src.height(),
            src.num_channels(),
            dst.width(),
            dst.height(),
            dst.num_channels(),
        ));
    }

    let units = strategy.partition(src.height(), num_threads)?;
    let row_stride = src.row_stride();

    parallel::run_units(
        dst.as_slice_mut(),
        row_stride,
        &units,
        num_threads,
        |unit, band| convolve_unit(src, kernel, unit, band),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::kernels;
    use filtra_image::ImageSize;

    fn image_3x3() -> Image {
        Image::new(
            ImageSize {
                width: 3,
                height: 3,
            },
            1,
            vec![10, 20, 30, 40, 50, 60, 70, 80, 90],
        )
        .unwrap()
    }

    #[test]
    fn identity_preserves_pixels() {
        let src = image_3x3();
        let kernel = kernels::identity_kernel();
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(
                    convolve_channel(&src, x, y, 0, &kernel),
                    src.get(x, y, 0).unwrap()
                );
            }
        }
    }

    #[test]
    fn edge_kernel_center_clamps_to_zero() {
        // 8 * 50 - (10 + 20 + 30 + 40 + 60 + 70 + 80 + 90) = 0
        let src = image_3x3();
        assert_eq!(convolve_channel(&src, 1, 1, 0, &kernels::edge_kernel()), 0);
    }

    #[test]
    fn emboss_kernel_replicates_borders() {
        // at (0, 0) the out-of-image neighbors replicate the edge values:
        // -2*10 - 10 - 10 + 10 + 20 + 40 + 2*50 = 130
        let src = image_3x3();
        assert_eq!(
            convolve_channel(&src, 0, 0, 0, &kernels::emboss_kernel()),
            130
        );
    }

    #[test]
    fn truncates_toward_zero() {
        let src = Image::new(
            ImageSize {
                width: 1,
                height: 1,
            },
            1,
            vec![101],
        )
        .unwrap();
        let kernel = Kernel::new(1, vec![0.5]).unwrap();
        // 101 * 0.5 = 50.5 truncates to 50
        assert_eq!(convolve_channel(&src, 0, 0, 0, &kernel), 50);
    }

    #[test]
    fn clamps_to_byte_range() {
        let src = Image::new(
            ImageSize {
                width: 1,
                height: 1,
            },
            2,
            vec![200, 10],
        )
        .unwrap();
        let doubling = Kernel::new(1, vec![2.0]).unwrap();
        let negating = Kernel::new(1, vec![-1.0]).unwrap();
        assert_eq!(convolve_channel(&src, 0, 0, 0, &doubling), 255);
        assert_eq!(convolve_channel(&src, 0, 0, 1, &negating), 0);
    }

    #[test]
    fn convolve_rejects_shape_mismatch() {
        let src = image_3x3();
        let mut dst = Image::from_size_val(
            ImageSize {
                width: 2,
                height: 3,
            },
            1,
            0,
        )
        .unwrap();
        let res = convolve(
            &src,
            &mut dst,
            &kernels::identity_kernel(),
            PartitionStrategy::StaticRows,
            1,
        );
        assert_eq!(res, Err(FilterError::DimensionMismatch(3, 3, 1, 2, 3, 1)));
    }

    #[test]
    fn convolve_rejects_zero_threads() {
        let src = image_3x3();
        let mut dst = Image::from_size_val(src.size(), 1, 0).unwrap();
        let res = convolve(
            &src,
            &mut dst,
            &kernels::identity_kernel(),
            PartitionStrategy::StaticRows,
            0,
        );
        assert!(matches!(res, Err(FilterError::ParallelError(_))));
    }
}
