//! Binarizers: luminance source in, black/white [`BitMatrix`] out.
//!
//! [`HybridBinarizer`] thresholds each 8x8 block against the average of
//! its 5x5 block neighbourhood, which copes with shadows and gradients.
//! [`GlobalHistogramBinarizer`] picks one threshold for the whole frame
//! from a coarse histogram, which still works on flat, low-contrast
//! captures where every block looks featureless to the hybrid strategy.

use log::trace;

use crate::models::{BinarizerKind, BitMatrix};
use crate::utils::luminance::LuminanceSource;

const BLOCK_SIZE_POWER: usize = 3;
const BLOCK_SIZE: usize = 1 << BLOCK_SIZE_POWER;
const BLOCK_SIZE_MASK: usize = BLOCK_SIZE - 1;
const MINIMUM_DIMENSION: usize = BLOCK_SIZE * 5;
/// Blocks whose max-min spread does not exceed this are treated as flat
const MIN_DYNAMIC_RANGE: u32 = 24;

const LUMINANCE_BITS: usize = 5;
const LUMINANCE_SHIFT: usize = 8 - LUMINANCE_BITS;
const LUMINANCE_BUCKETS: usize = 1 << LUMINANCE_BITS;

/// Strategy turning luminance into a bit matrix
pub trait Binarizer: Send + Sync {
    /// Which strategy this is, reported back in scan results
    fn kind(&self) -> BinarizerKind;

    /// Binarize `source`; `None` when no usable threshold exists
    fn binarize(&self, source: &LuminanceSource) -> Option<BitMatrix>;
}

/// Simple global threshold binarization: `luma < threshold` is black
pub fn threshold_binarize(source: &LuminanceSource, threshold: u8) -> BitMatrix {
    BitMatrix::from_fn(source.width(), source.height(), |x, y| {
        source.get(x, y) < threshold
    })
}

/// Histogram-based single-threshold binarizer
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalHistogramBinarizer;

impl GlobalHistogramBinarizer {
    /// Histogram of the central band of four sample rows, bucketed to 5 bits
    fn sample_histogram(source: &LuminanceSource) -> [u32; LUMINANCE_BUCKETS] {
        let mut buckets = [0u32; LUMINANCE_BUCKETS];
        let (width, height) = (source.width(), source.height());
        let left = width / 5;
        let right = (width * 4) / 5;
        for y in 1..5 {
            let row = source.row(height * y / 5);
            for &pixel in &row[left..right] {
                buckets[(pixel as usize) >> LUMINANCE_SHIFT] += 1;
            }
        }
        buckets
    }

    /// Find the valley between the two dominant histogram peaks
    fn estimate_black_point(buckets: &[u32; LUMINANCE_BUCKETS]) -> Option<u8> {
        let mut max_bucket_count = 0u32;
        let mut first_peak = 0usize;
        let mut first_peak_size = 0u32;
        for (x, &count) in buckets.iter().enumerate() {
            if count > first_peak_size {
                first_peak = x;
                first_peak_size = count;
            }
            max_bucket_count = max_bucket_count.max(count);
        }

        // Second peak: far from the first and reasonably tall
        let mut second_peak = first_peak;
        let mut second_peak_score = 0u64;
        for (x, &count) in buckets.iter().enumerate() {
            let distance = x.abs_diff(first_peak) as u64;
            let score = count as u64 * distance * distance;
            if score > second_peak_score {
                second_peak = x;
                second_peak_score = score;
            }
        }

        if first_peak > second_peak {
            std::mem::swap(&mut first_peak, &mut second_peak);
        }
        if second_peak - first_peak <= LUMINANCE_BUCKETS / 16 {
            trace!("global histogram: peaks {first_peak} and {second_peak} too close");
            return None;
        }

        let mut best_valley = second_peak - 1;
        let mut best_valley_score = -1i64;
        for x in (first_peak + 1..second_peak).rev() {
            let from_first = (x - first_peak) as i64;
            let score = from_first
                * from_first
                * (second_peak - x) as i64
                * (max_bucket_count - buckets[x]) as i64;
            if score > best_valley_score {
                best_valley = x;
                best_valley_score = score;
            }
        }

        Some((best_valley << LUMINANCE_SHIFT) as u8)
    }
}

impl Binarizer for GlobalHistogramBinarizer {
    fn kind(&self) -> BinarizerKind {
        BinarizerKind::GlobalHistogram
    }

    fn binarize(&self, source: &LuminanceSource) -> Option<BitMatrix> {
        if source.width() < 5 || source.height() < 5 {
            return None;
        }
        let buckets = Self::sample_histogram(source);
        let black_point = Self::estimate_black_point(&buckets)?;
        trace!("global histogram black point {black_point}");
        Some(threshold_binarize(source, black_point))
    }
}

/// Block-adaptive binarizer; frames under 40 px on a side use the global
/// histogram strategy instead
#[derive(Debug, Clone, Copy, Default)]
pub struct HybridBinarizer;

impl HybridBinarizer {
    fn calculate_black_points(
        source: &LuminanceSource,
        sub_width: usize,
        sub_height: usize,
    ) -> Vec<u32> {
        let max_y_offset = source.height() - BLOCK_SIZE;
        let max_x_offset = source.width() - BLOCK_SIZE;
        let mut black_points = vec![0u32; sub_width * sub_height];

        for y in 0..sub_height {
            let y_offset = (y << BLOCK_SIZE_POWER).min(max_y_offset);
            for x in 0..sub_width {
                let x_offset = (x << BLOCK_SIZE_POWER).min(max_x_offset);
                let mut sum = 0u32;
                let mut min = 0xFFu32;
                let mut max = 0u32;
                let mut yy = 0;
                while yy < BLOCK_SIZE {
                    let row = &source.row(y_offset + yy)[x_offset..x_offset + BLOCK_SIZE];
                    for &pixel in row {
                        let pixel = pixel as u32;
                        sum += pixel;
                        min = min.min(pixel);
                        max = max.max(pixel);
                    }
                    yy += 1;
                    if max - min > MIN_DYNAMIC_RANGE {
                        // Contrast found; only the sum matters for the rest
                        for rest in yy..BLOCK_SIZE {
                            let row =
                                &source.row(y_offset + rest)[x_offset..x_offset + BLOCK_SIZE];
                            sum += row.iter().map(|&p| p as u32).sum::<u32>();
                        }
                        break;
                    }
                }

                let mut average = sum >> (BLOCK_SIZE_POWER * 2);
                if max - min <= MIN_DYNAMIC_RANGE {
                    // Flat block: assume background unless neighbours say otherwise
                    average = min / 2;
                    if y > 0 && x > 0 {
                        let neighbors = black_points[(y - 1) * sub_width + x]
                            + 2 * black_points[y * sub_width + x - 1]
                            + black_points[(y - 1) * sub_width + x - 1];
                        let average_neighbor = neighbors / 4;
                        if min < average_neighbor {
                            average = average_neighbor;
                        }
                    }
                }
                black_points[y * sub_width + x] = average;
            }
        }
        black_points
    }

    fn calculate_threshold_for_blocks(
        source: &LuminanceSource,
        sub_width: usize,
        sub_height: usize,
        black_points: &[u32],
        matrix: &mut BitMatrix,
    ) {
        let max_y_offset = source.height() - BLOCK_SIZE;
        let max_x_offset = source.width() - BLOCK_SIZE;
        for y in 0..sub_height {
            let y_offset = (y << BLOCK_SIZE_POWER).min(max_y_offset);
            let top = cap(y, sub_height - 3);
            for x in 0..sub_width {
                let x_offset = (x << BLOCK_SIZE_POWER).min(max_x_offset);
                let left = cap(x, sub_width - 3);
                let mut sum = 0u32;
                for row in top - 2..=top + 2 {
                    let start = row * sub_width + left - 2;
                    sum += black_points[start..start + 5].iter().sum::<u32>();
                }
                let average = sum / 25;
                for yy in 0..BLOCK_SIZE {
                    let row = source.row(y_offset + yy);
                    for xx in 0..BLOCK_SIZE {
                        if row[x_offset + xx] as u32 <= average {
                            matrix.set(x_offset + xx, y_offset + yy, true);
                        }
                    }
                }
            }
        }
    }
}

fn cap(value: usize, max: usize) -> usize {
    if value < 2 { 2 } else { value.min(max) }
}

impl Binarizer for HybridBinarizer {
    fn kind(&self) -> BinarizerKind {
        BinarizerKind::Hybrid
    }

    fn binarize(&self, source: &LuminanceSource) -> Option<BitMatrix> {
        let (width, height) = (source.width(), source.height());
        if width < MINIMUM_DIMENSION || height < MINIMUM_DIMENSION {
            return GlobalHistogramBinarizer.binarize(source);
        }

        let mut sub_width = width >> BLOCK_SIZE_POWER;
        if width & BLOCK_SIZE_MASK != 0 {
            sub_width += 1;
        }
        let mut sub_height = height >> BLOCK_SIZE_POWER;
        if height & BLOCK_SIZE_MASK != 0 {
            sub_height += 1;
        }

        let black_points = Self::calculate_black_points(source, sub_width, sub_height);
        let mut matrix = BitMatrix::new(width, height);
        Self::calculate_threshold_for_blocks(
            source,
            sub_width,
            sub_height,
            &black_points,
            &mut matrix,
        );
        Some(matrix)
    }
}
