//! Batch planning and orchestration
//!
//! Builds a size distribution and format assignment for a whole batch,
//! drives the generator over each request sequentially, and reports
//! aggregate statistics. A failed request is logged and skipped; the batch
//! always runs to completion and always prints a summary.

use crate::error::{GenError, Result};
use crate::{Acceptance, GenerationRequest, Generator, ImageFormat};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::fs;
use std::path::Path;

fn mb(bytes: f64) -> f64 {
    bytes / (1024.0 * 1024.0)
}

/// Target-size distribution for a batch.
///
/// Sizes are drawn from a normal distribution, clamped into fixed bounds,
/// then rescaled so the batch mean matches the requested mean exactly (up
/// to floating point). The rescale happens *after* the clamp, so individual
/// values can land back outside the clamp bounds; that ordering is part of
/// the distribution's observable behavior and is kept as-is.
#[derive(Debug, Clone, Copy)]
pub struct SizeDistribution {
    mean: f64,
    stddev: f64,
    min: f64,
    max: f64,
}

impl SizeDistribution {
    /// Distribution with explicit parameters, all in bytes
    #[must_use]
    pub fn new(mean: f64, stddev: f64, min: f64, max: f64) -> Self {
        Self { mean, stddev, min, max }
    }

    /// The standard fixture distribution around a mean size: 30% relative
    /// standard deviation, clamped into [0.5 MiB, 4 MiB]
    #[must_use]
    pub fn around_mean(avg_size_bytes: f64) -> Self {
        Self {
            mean: avg_size_bytes,
            stddev: avg_size_bytes * 0.3,
            min: 0.5 * 1024.0 * 1024.0,
            max: 4.0 * 1024.0 * 1024.0,
        }
    }

    /// Draw `count` sizes and clamp each into the distribution's bounds.
    ///
    /// # Errors
    ///
    /// Returns an error when the distribution parameters cannot be sampled
    /// (non-finite mean or negative/non-finite standard deviation).
    pub fn sample_clamped<R: Rng>(&self, count: usize, rng: &mut R) -> Result<Vec<f64>> {
        let normal = Normal::new(self.mean, self.stddev).map_err(|_| {
            GenError::InvalidDistribution("mean and standard deviation must be finite, stddev >= 0")
        })?;
        Ok((0..count)
            .map(|_| normal.sample(rng).clamp(self.min, self.max))
            .collect())
    }

    /// Rescale a sampled set so its mean equals the distribution's mean.
    ///
    /// Applied after clamping, so values may leave the clamp bounds here.
    pub fn rescale_to_mean(&self, sizes: &mut [f64]) {
        if sizes.is_empty() {
            return;
        }
        let current = sizes.iter().sum::<f64>() / sizes.len() as f64;
        if current > 0.0 {
            let factor = self.mean / current;
            for size in sizes.iter_mut() {
                *size *= factor;
            }
        }
    }

    /// Sample, clamp, and rescale a full batch of byte targets.
    ///
    /// # Errors
    ///
    /// Propagates [`SizeDistribution::sample_clamped`] failures.
    pub fn targets<R: Rng>(&self, count: usize, rng: &mut R) -> Result<Vec<u64>> {
        let mut sizes = self.sample_clamped(count, rng)?;
        self.rescale_to_mean(&mut sizes);
        Ok(sizes.into_iter().map(|s| s as u64).collect())
    }
}

/// Format assignment for a batch: 70 JPEG : 20 PNG : 10 WEBP per 100 photos,
/// reproduced proportionally for other batch sizes (largest-remainder
/// apportionment, ties resolved in JPEG, PNG, WEBP order). The returned list
/// is in ratio order; callers shuffle it.
#[must_use]
pub fn format_ratio(count: usize) -> Vec<ImageFormat> {
    const RATIO: [(ImageFormat, usize); 3] = [
        (ImageFormat::Jpeg, 70),
        (ImageFormat::Png, 20),
        (ImageFormat::Webp, 10),
    ];

    let mut counts = [0usize; 3];
    let mut remainders = [0usize; 3];
    let mut assigned = 0;
    for (i, (_, weight)) in RATIO.iter().enumerate() {
        counts[i] = count * weight / 100;
        remainders[i] = count * weight % 100;
        assigned += counts[i];
    }

    // Distribute the rounding leftover to the largest remainders; the sort
    // is stable, so ties keep the JPEG, PNG, WEBP declaration order
    let mut order = [0usize, 1, 2];
    order.sort_by_key(|&i| std::cmp::Reverse(remainders[i]));
    for &i in order.iter().take(count - assigned) {
        counts[i] += 1;
    }

    let mut formats = Vec::with_capacity(count);
    for (i, (format, _)) in RATIO.iter().enumerate() {
        formats.extend(std::iter::repeat(*format).take(counts[i]));
    }
    formats
}

/// Ordered generation requests for one batch run
#[derive(Debug, Clone)]
pub struct BatchPlan {
    /// Requests in output-filename order
    pub requests: Vec<GenerationRequest>,
}

impl BatchPlan {
    /// Build a plan: sample target sizes, assign formats by ratio, and
    /// shuffle the assignment so format order is uncorrelated with size
    /// order. Filenames are `sample_photo_NNN.<ext>` under `output_dir`.
    ///
    /// # Errors
    ///
    /// Propagates size-distribution sampling failures.
    pub fn build<R: Rng>(
        output_dir: &Path,
        count: usize,
        distribution: &SizeDistribution,
        rng: &mut R,
    ) -> Result<Self> {
        let targets = distribution.targets(count, rng)?;
        let mut formats = format_ratio(count);
        formats.shuffle(rng);

        let requests = targets
            .into_iter()
            .zip(formats)
            .enumerate()
            .map(|(i, (target_size_bytes, format))| GenerationRequest {
                target_size_bytes,
                format,
                output_path: output_dir
                    .join(format!("sample_photo_{:03}.{}", i + 1, format.extension())),
            })
            .collect();

        Ok(Self { requests })
    }
}

/// Aggregate statistics over the files a batch actually produced
#[derive(Debug, Clone)]
pub struct BatchSummary {
    /// Number of requests the plan contained
    pub requested: usize,
    /// Byte sizes of the successfully generated files, in request order
    pub sizes: Vec<u64>,
}

impl BatchSummary {
    /// Number of files generated
    #[must_use]
    pub fn count(&self) -> usize {
        self.sizes.len()
    }

    /// Total bytes written
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.sizes.iter().sum()
    }

    /// Mean file size in bytes, or 0.0 for an empty batch
    #[must_use]
    pub fn mean_bytes(&self) -> f64 {
        if self.sizes.is_empty() {
            0.0
        } else {
            self.total_bytes() as f64 / self.sizes.len() as f64
        }
    }

    /// Smallest generated file in bytes
    #[must_use]
    pub fn min_bytes(&self) -> u64 {
        self.sizes.iter().copied().min().unwrap_or(0)
    }

    /// Largest generated file in bytes
    #[must_use]
    pub fn max_bytes(&self) -> u64 {
        self.sizes.iter().copied().max().unwrap_or(0)
    }

    /// Population standard deviation of generated sizes in bytes
    #[must_use]
    pub fn stddev_bytes(&self) -> f64 {
        if self.sizes.is_empty() {
            return 0.0;
        }
        let mean = self.mean_bytes();
        let variance = self
            .sizes
            .iter()
            .map(|&s| {
                let d = s as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / self.sizes.len() as f64;
        variance.sqrt()
    }

    /// Print the end-of-run summary block
    pub fn print(&self) {
        println!("\n{}", "=".repeat(60));
        println!("Generation Summary:");
        println!("  Total photos generated: {}", self.count());
        println!("  Total size: {:.2} MB", mb(self.total_bytes() as f64));
        println!("  Average size: {:.2} MB", mb(self.mean_bytes()));
        println!("  Min size: {:.2} MB", mb(self.min_bytes() as f64));
        println!("  Max size: {:.2} MB", mb(self.max_bytes() as f64));
        println!("  Std deviation: {:.2} MB", mb(self.stddev_bytes()));
        println!("{}", "=".repeat(60));
    }
}

/// Sequential batch runner wrapping a [`Generator`]
#[derive(Debug, Clone, Default)]
pub struct Batch {
    generator: Generator,
}

impl Batch {
    /// Batch runner with default generator parameters
    #[must_use]
    pub fn new() -> Self {
        Self {
            generator: Generator::new(),
        }
    }

    /// Batch runner with custom generator parameters
    #[must_use]
    pub fn with_generator(generator: Generator) -> Self {
        Self { generator }
    }

    /// Plan and generate a full batch into `output_dir`, printing progress
    /// and the final summary. Per-request failures are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only for batch-level failures: the output directory
    /// cannot be created, or the size distribution cannot be sampled.
    pub fn run<R: Rng>(
        &self,
        output_dir: &Path,
        num_photos: usize,
        avg_size_mb: f64,
        rng: &mut R,
    ) -> Result<BatchSummary> {
        fs::create_dir_all(output_dir).map_err(GenError::from)?;

        let avg_size_bytes = avg_size_mb * 1024.0 * 1024.0;
        let distribution = SizeDistribution::around_mean(avg_size_bytes);
        let plan = BatchPlan::build(output_dir, num_photos, &distribution, rng)?;

        println!("Generating {num_photos} sample photos averaging {avg_size_mb}MB...");
        println!("Output directory: {}\n", output_dir.display());

        let summary = self.execute(&plan, rng);
        summary.print();
        Ok(summary)
    }

    /// Generate every request in the plan, in order, one progress line per
    /// request. A failed request is reported, its partial output file (if
    /// any) removed, and the batch continues; nothing is retried.
    pub fn execute<R: Rng>(&self, plan: &BatchPlan, rng: &mut R) -> BatchSummary {
        let total = plan.requests.len();
        let mut sizes = Vec::with_capacity(total);

        for (i, request) in plan.requests.iter().enumerate() {
            let name = request
                .output_path
                .file_name()
                .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
            print!(
                "Generating {}/{}: {} (target: {:.2}MB, format: {})",
                i + 1,
                total,
                name,
                mb(request.target_size_bytes as f64),
                request.format
            );

            match self.generator.generate(request, rng) {
                Ok(result) => {
                    let actual = mb(result.actual_size_bytes as f64);
                    match result.acceptance {
                        Acceptance::WithinTolerance => println!(" -> {actual:.2}MB"),
                        Acceptance::BestEffort => println!(" -> {actual:.2}MB (best effort)"),
                    }
                    sizes.push(result.actual_size_bytes);
                }
                Err(e) => {
                    println!(" -> ERROR: {e}");
                    if request.output_path.exists() {
                        let _ = fs::remove_file(&request.output_path);
                    }
                }
            }
        }

        BatchSummary {
            requested: total,
            sizes,
        }
    }
}

/// Generate a batch with default parameters and an OS-seeded RNG.
///
/// Convenience entry point matching the CLI:
/// `run("sample_photos".as_ref(), 100, 2.0)`.
///
/// # Errors
///
/// See [`Batch::run`].
pub fn run(output_dir: &Path, num_photos: usize, avg_size_mb: f64) -> Result<BatchSummary> {
    let mut rng = StdRng::from_os_rng();
    Batch::new().run(output_dir, num_photos, avg_size_mb, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_formats(formats: &[ImageFormat]) -> (usize, usize, usize) {
        let jpeg = formats.iter().filter(|f| **f == ImageFormat::Jpeg).count();
        let png = formats.iter().filter(|f| **f == ImageFormat::Png).count();
        let webp = formats.iter().filter(|f| **f == ImageFormat::Webp).count();
        (jpeg, png, webp)
    }

    #[test]
    fn test_format_ratio_for_100() {
        assert_eq!(count_formats(&format_ratio(100)), (70, 20, 10));
    }

    #[test]
    fn test_format_ratio_proportional() {
        assert_eq!(count_formats(&format_ratio(10)), (7, 2, 1));
        assert_eq!(count_formats(&format_ratio(200)), (140, 40, 20));
        // Leftover goes to the largest remainders, JPEG winning ties
        assert_eq!(count_formats(&format_ratio(5)), (4, 1, 0));
        assert_eq!(count_formats(&format_ratio(1)), (1, 0, 0));
        assert!(format_ratio(0).is_empty());
    }

    #[test]
    fn test_format_ratio_total() {
        for n in 0..50 {
            assert_eq!(format_ratio(n).len(), n);
        }
    }

    #[test]
    fn test_samples_respect_clamp_before_rescale() {
        let mut rng = StdRng::seed_from_u64(42);
        let dist = SizeDistribution::around_mean(2.0 * 1024.0 * 1024.0);
        let sizes = dist.sample_clamped(500, &mut rng).unwrap();
        assert_eq!(sizes.len(), 500);
        for s in sizes {
            assert!((0.5 * 1024.0 * 1024.0..=4.0 * 1024.0 * 1024.0).contains(&s));
        }
    }

    #[test]
    fn test_rescale_restores_requested_mean() {
        let mut rng = StdRng::seed_from_u64(7);
        let mean = 2.0 * 1024.0 * 1024.0;
        let dist = SizeDistribution::around_mean(mean);
        let mut sizes = dist.sample_clamped(100, &mut rng).unwrap();
        dist.rescale_to_mean(&mut sizes);
        let realized = sizes.iter().sum::<f64>() / sizes.len() as f64;
        assert!((realized - mean).abs() / mean < 1e-9);
    }

    #[test]
    fn test_rescale_empty_is_noop() {
        let dist = SizeDistribution::around_mean(1024.0);
        let mut sizes: Vec<f64> = Vec::new();
        dist.rescale_to_mean(&mut sizes);
        assert!(sizes.is_empty());
    }

    #[test]
    fn test_invalid_distribution_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let dist = SizeDistribution::new(1024.0, -1.0, 0.0, 2048.0);
        assert!(dist.sample_clamped(3, &mut rng).is_err());
    }

    #[test]
    fn test_plan_filenames_and_extensions() {
        let mut rng = StdRng::seed_from_u64(99);
        let dist = SizeDistribution::around_mean(1024.0 * 1024.0);
        let plan = BatchPlan::build(Path::new("out"), 12, &dist, &mut rng).unwrap();

        assert_eq!(plan.requests.len(), 12);
        for (i, request) in plan.requests.iter().enumerate() {
            let expected = format!(
                "sample_photo_{:03}.{}",
                i + 1,
                request.format.extension()
            );
            assert_eq!(
                request.output_path,
                Path::new("out").join(expected)
            );
            assert!(request.target_size_bytes > 0);
        }

        // 12 photos: floors (8, 2, 1), leftover 1 to JPEG (largest remainder, tie)
        let formats: Vec<ImageFormat> = plan.requests.iter().map(|r| r.format).collect();
        assert_eq!(count_formats(&formats), (9, 2, 1));
    }

    #[test]
    fn test_summary_statistics() {
        let summary = BatchSummary {
            requested: 4,
            sizes: vec![100, 200, 300, 400],
        };
        assert_eq!(summary.count(), 4);
        assert_eq!(summary.total_bytes(), 1000);
        assert!((summary.mean_bytes() - 250.0).abs() < 1e-12);
        assert_eq!(summary.min_bytes(), 100);
        assert_eq!(summary.max_bytes(), 400);
        // Population stddev of {100,200,300,400}
        assert!((summary.stddev_bytes() - 111.80339887498948).abs() < 1e-6);
    }

    #[test]
    fn test_empty_summary_does_not_panic() {
        let summary = BatchSummary {
            requested: 5,
            sizes: Vec::new(),
        };
        assert_eq!(summary.count(), 0);
        assert_eq!(summary.min_bytes(), 0);
        assert_eq!(summary.max_bytes(), 0);
        assert_eq!(summary.mean_bytes(), 0.0);
        assert_eq!(summary.stddev_bytes(), 0.0);
        summary.print();
    }
}
