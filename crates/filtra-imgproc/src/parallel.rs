use rayon::prelude::*;
use thiserror::Error;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// The chunk size for DynamicChunks must be valid.
    #[error("chunk size must be > 0 rows for the dynamic strategy")]
    InvalidChunkSize(usize),

    /// The row stride of the destination buffer must be valid.
    #[error("row stride must be > 0")]
    InvalidRowStride(usize),

    /// The work units do not cover the row range contiguously.
    #[error("work units must be contiguous: expected row {expected}, got {found}")]
    NonContiguousUnits {
        /// The row the next unit was expected to start at.
        expected: usize,
        /// The row the unit actually starts at.
        found: usize,
    },

    /// The work units do not cover the destination buffer exactly.
    #[error("work units do not cover the destination buffer exactly")]
    SizeMismatch,
}

/// A contiguous range of image rows `[start, end)` assigned to one worker.
///
/// The units of a partition cover `[0, height)` exactly once, ordered by
/// `start`, with no gaps or overlaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkUnit {
    /// The first row of the range (inclusive).
    pub start: usize,
    /// The last row of the range (exclusive), always greater than `start`.
    pub end: usize,
}

impl WorkUnit {
    /// The number of rows in the range.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the range contains no rows.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Controls how the image rows are divided among concurrent workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartitionStrategy {
    /// Divide the rows into one contiguous band per worker.
    ///
    /// Each band has `height / num_workers` rows (rounding down) and the last
    /// band absorbs the remainder. Deterministic for a fixed worker count.
    #[default]
    StaticRows,

    /// Divide the rows into chunks of at most the given number of rows.
    ///
    /// The chunks are fed to the worker pool's shared queue so idle workers
    /// pull the next available chunk. This balances load when per-row cost is
    /// uneven; the output is identical to [`PartitionStrategy::StaticRows`].
    DynamicChunks(usize),
}

impl PartitionStrategy {
    /// Divide `[0, height)` into ordered, disjoint, gap-free work units.
    ///
    /// # Arguments
    ///
    /// * `height` - The number of image rows to cover.
    /// * `num_workers` - The number of concurrent workers, must be > 0.
    ///
    /// # Returns
    ///
    /// The work units ordered by start row. Every unit spans at least one row,
    /// so fewer units than workers are returned when `height < num_workers`.
    ///
    /// # Examples
    ///
    /// ```
    /// use filtra_imgproc::parallel::PartitionStrategy;
    ///
    /// let units = PartitionStrategy::StaticRows.partition(10, 4).unwrap();
    /// assert_eq!(units.len(), 4);
    /// assert_eq!(units[0].start, 0);
    /// assert_eq!(units[3].end, 10);
    /// ```
    pub fn partition(
        &self,
        height: usize,
        num_workers: usize,
    ) -> Result<Vec<WorkUnit>, ParallelError> {
        if num_workers == 0 {
            return Err(ParallelError::InvalidThreadCount(num_workers));
        }

        let units = match *self {
            PartitionStrategy::StaticRows => {
                let band = height / num_workers;
                (0..num_workers)
                    .filter_map(|i| {
                        let start = i * band;
                        // the last band ends exactly at `height`
                        let end = if i + 1 == num_workers {
                            height
                        } else {
                            start + band
                        };
                        (end > start).then_some(WorkUnit { start, end })
                    })
                    .collect()
            }
            PartitionStrategy::DynamicChunks(chunk_rows) => {
                if chunk_rows == 0 {
                    return Err(ParallelError::InvalidChunkSize(chunk_rows));
                }
                (0..height)
                    .step_by(chunk_rows)
                    .map(|start| WorkUnit {
                        start,
                        end: (start + chunk_rows).min(height),
                    })
                    .collect()
            }
        };

        Ok(units)
    }
}

/// Run a row operation over disjoint bands of the destination buffer.
///
/// The destination is split into one mutable band per work unit, so each byte
/// is written by exactly one worker and no locking is needed. The work units
/// are dispatched on a local thread pool with exactly `num_threads` threads;
/// rayon's work-stealing queue hands the next pending unit to an idle worker,
/// and the call only returns once every unit has completed.
///
/// # Arguments
///
/// * `dst` - The destination buffer, covering all rows of the partition.
/// * `row_stride` - The number of bytes per image row.
/// * `units` - The work units, ordered by start row and covering `dst` exactly.
/// * `num_threads` - The number of worker threads, must be > 0.
/// * `op` - The operation to run for each unit, given its output band.
///
/// # Errors
///
/// Fails before any unit runs if the units are out of order, overlap, leave a
/// gap, or do not cover `dst` exactly.
pub fn run_units<F>(
    dst: &mut [u8],
    row_stride: usize,
    units: &[WorkUnit],
    num_threads: usize,
    op: F,
) -> Result<(), ParallelError>
where
    F: Fn(&WorkUnit, &mut [u8]) + Send + Sync,
{
    if num_threads == 0 {
        return Err(ParallelError::InvalidThreadCount(num_threads));
    }
    if row_stride == 0 {
        return Err(ParallelError::InvalidRowStride(row_stride));
    }

    // split the destination into one disjoint mutable band per unit
    let mut jobs = Vec::with_capacity(units.len());
    let mut rest = dst;
    let mut next_row = 0;
    for unit in units {
        if unit.is_empty() || unit.start != next_row {
            return Err(ParallelError::NonContiguousUnits {
                expected: next_row,
                found: unit.start,
            });
        }
        let band_len = unit.len() * row_stride;
        if band_len > rest.len() {
            return Err(ParallelError::SizeMismatch);
        }
        let (band, tail) = std::mem::take(&mut rest).split_at_mut(band_len);
        jobs.push((unit, band));
        rest = tail;
        next_row = unit.end;
    }
    if !rest.is_empty() {
        return Err(ParallelError::SizeMismatch);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| ParallelError::BuildError(e.to_string()))?;

    // install returns after all units are consumed, acting as the join barrier
    pool.install(|| {
        jobs.into_par_iter().for_each(|(unit, band)| op(unit, band));
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_coverage(units: &[WorkUnit], height: usize) {
        let mut next = 0;
        for unit in units {
            assert_eq!(unit.start, next, "gap or overlap at row {next}");
            assert!(unit.end > unit.start, "empty unit at row {next}");
            next = unit.end;
        }
        assert_eq!(next, height, "units do not end at the image height");
    }

    #[test]
    fn static_partition_covers_all_rows() {
        for height in [1, 2, 3, 7, 16, 33, 100, 257] {
            for num_workers in 1..=12 {
                let units = PartitionStrategy::StaticRows
                    .partition(height, num_workers)
                    .unwrap();
                check_coverage(&units, height);
                assert!(units.len() <= num_workers);
            }
        }
    }

    #[test]
    fn static_partition_last_band_absorbs_remainder() {
        let units = PartitionStrategy::StaticRows.partition(10, 4).unwrap();
        assert_eq!(
            units,
            vec![
                WorkUnit { start: 0, end: 2 },
                WorkUnit { start: 2, end: 4 },
                WorkUnit { start: 4, end: 6 },
                WorkUnit { start: 6, end: 10 },
            ]
        );
    }

    #[test]
    fn static_partition_more_workers_than_rows() {
        let units = PartitionStrategy::StaticRows.partition(3, 8).unwrap();
        check_coverage(&units, 3);
    }

    #[test]
    fn dynamic_partition_covers_all_rows() {
        for height in [1, 2, 3, 7, 16, 33, 100] {
            for chunk_rows in [1, 2, 3, 5, 64] {
                let units = PartitionStrategy::DynamicChunks(chunk_rows)
                    .partition(height, 4)
                    .unwrap();
                check_coverage(&units, height);
                assert!(units.iter().all(|u| u.len() <= chunk_rows));
            }
        }
    }

    #[test]
    fn dynamic_partition_single_row_chunks() {
        let units = PartitionStrategy::DynamicChunks(1).partition(5, 2).unwrap();
        assert_eq!(units.len(), 5);
        check_coverage(&units, 5);
    }

    #[test]
    fn partition_zero_workers() {
        let res = PartitionStrategy::StaticRows.partition(10, 0);
        assert_eq!(res, Err(ParallelError::InvalidThreadCount(0)));
    }

    #[test]
    fn partition_zero_chunk_rows() {
        let res = PartitionStrategy::DynamicChunks(0).partition(10, 4);
        assert_eq!(res, Err(ParallelError::InvalidChunkSize(0)));
    }

    #[test]
    fn run_units_writes_each_band_once() {
        let height = 7;
        let row_stride = 3;
        let mut dst = vec![0u8; height * row_stride];
        let units = PartitionStrategy::StaticRows.partition(height, 3).unwrap();

        run_units(&mut dst, row_stride, &units, 3, |unit, band| {
            band.fill(unit.start as u8 + 1);
        })
        .unwrap();

        for (row, chunk) in dst.chunks_exact(row_stride).enumerate() {
            let unit = units.iter().find(|u| u.start <= row && row < u.end).unwrap();
            assert!(chunk.iter().all(|&v| v == unit.start as u8 + 1));
        }
    }

    #[test]
    fn run_units_zero_threads() {
        let mut dst = vec![0u8; 4];
        let units = [WorkUnit { start: 0, end: 4 }];
        let res = run_units(&mut dst, 1, &units, 0, |_, _| {});
        assert_eq!(res, Err(ParallelError::InvalidThreadCount(0)));
    }

    #[test]
    fn run_units_rejects_gap() {
        let mut dst = vec![0u8; 4];
        let units = [WorkUnit { start: 0, end: 1 }, WorkUnit { start: 2, end: 4 }];
        let res = run_units(&mut dst, 1, &units, 1, |_, _| {});
        assert_eq!(
            res,
            Err(ParallelError::NonContiguousUnits {
                expected: 1,
                found: 2
            })
        );
    }

    #[test]
    fn run_units_rejects_short_coverage() {
        let mut dst = vec![0u8; 4];
        let units = [WorkUnit { start: 0, end: 3 }];
        let res = run_units(&mut dst, 1, &units, 1, |_, _| {});
        assert_eq!(res, Err(ParallelError::SizeMismatch));
    }

    #[test]
    fn run_units_rejects_overrun() {
        let mut dst = vec![0u8; 4];
        let units = [WorkUnit { start: 0, end: 5 }];
        let res = run_units(&mut dst, 1, &units, 1, |_, _| {});
        assert_eq!(res, Err(ParallelError::SizeMismatch));
    }
}
