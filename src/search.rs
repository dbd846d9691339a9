//! Size-targeting search loops
//!
//! One bounded search per output format. Each search paints a canvas,
//! encodes it, measures the encoded size against the target, and adjusts
//! dimensions and/or quality. Tolerance bands are deliberately asymmetric
//! across formats: 10% for JPEG, 15% for WebP, and none for PNG beyond a
//! single resample correction. None of the searches guarantees convergence;
//! the non-converging paths accept the last encode as a best effort.

use crate::error::{GenError, Result};
use crate::paint;
use crate::{Acceptance, Generator};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};

/// Descending coarse quality sweep shared by the lossy formats
const QUALITY_SWEEP: [u8; 7] = [95, 90, 85, 80, 75, 70, 65];

/// Relative-error band accepted by the JPEG search
const JPEG_TOLERANCE: f64 = 0.10;
/// Relative-error band accepted by the WebP search
const WEBP_TOLERANCE: f64 = 0.15;
/// Quality used for the final uncorrected JPEG encode
const FALLBACK_QUALITY: u8 = 85;

/// Size and acceptance classification returned by a format search
pub(crate) struct SearchOutcome {
    pub size: u64,
    pub acceptance: Acceptance,
}

/// Explicit states of the JPEG search.
///
/// Keeping the fallback as a state (rather than fall-through control flow)
/// makes the uncorrected acceptance path visible and testable.
enum SearchState {
    /// Encode at the sweep level's quality and classify the result
    SweepQuality { level: usize },
    /// Scale both dimensions by `factor`, then resume the sweep at
    /// `next_level` (0 restarts the sweep after an upscale)
    RescaleDimensions { factor: f64, next_level: usize },
    /// Single fixed-quality encode, accepted without a tolerance check
    FallbackAccept,
}

fn relative_error(actual: u64, target: u64) -> f64 {
    (actual as f64 - target as f64).abs() / target as f64
}

fn tmp_path(output: &Path) -> PathBuf {
    let mut os = output.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}

fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder
        .encode(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
        .map_err(GenError::from)?;
    Ok(buf)
}

fn encode_png(img: &RgbImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new(&mut buf);
    encoder
        .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
        .map_err(GenError::from)?;
    Ok(buf)
}

/// JPEG search: quality sweep with dimension rescaling.
///
/// Attempts are written to `<output>.tmp` and renamed into place on
/// acceptance, so a killed process never leaves a half-written output file
/// under the final name. The temp file is removed on the error and fallback
/// paths.
pub(crate) fn jpeg<R: Rng>(
    config: &Generator,
    target: u64,
    output: &Path,
    rng: &mut R,
) -> Result<SearchOutcome> {
    let tmp = tmp_path(output);
    let outcome = jpeg_search(config, target, output, &tmp, rng);
    if outcome.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    outcome
}

fn jpeg_search<R: Rng>(
    config: &Generator,
    target: u64,
    output: &Path,
    tmp: &Path,
    rng: &mut R,
) -> Result<SearchOutcome> {
    let t = target as f64;
    let mut width = config.jpeg_base;
    let mut height = config.jpeg_base;
    let mut rescales = 0u32;
    let mut state = SearchState::SweepQuality { level: 0 };

    loop {
        match state {
            SearchState::SweepQuality { level } => {
                let Some(&quality) = QUALITY_SWEEP.get(level) else {
                    state = SearchState::FallbackAccept;
                    continue;
                };

                // Fresh canvas per attempt: repainting keeps block/ellipse
                // entropy independent of earlier attempts at other sizes.
                let canvas = paint::blocks_and_ellipses(width, height, rng);
                let bytes = encode_jpeg(&canvas, quality)?;
                fs::write(tmp, &bytes).map_err(GenError::from)?;
                let actual = bytes.len() as u64;

                if relative_error(actual, target) < JPEG_TOLERANCE {
                    fs::rename(tmp, output).map_err(GenError::from)?;
                    return Ok(SearchOutcome {
                        size: actual,
                        acceptance: Acceptance::WithinTolerance,
                    });
                }

                if (actual as f64) < 0.9 * t {
                    // Too small: grow the canvas and restart the sweep
                    state = SearchState::RescaleDimensions {
                        factor: (t / actual as f64).sqrt(),
                        next_level: 0,
                    };
                    continue;
                }

                if actual > target {
                    // Too large but close: walk quality down one step at a
                    // time before giving up on these dimensions
                    let floor = (quality - 5).max(61);
                    let mut last = actual;
                    for q in (floor..quality).rev() {
                        let bytes = encode_jpeg(&canvas, q)?;
                        fs::write(tmp, &bytes).map_err(GenError::from)?;
                        last = bytes.len() as u64;
                        if last as f64 <= 1.1 * t {
                            fs::rename(tmp, output).map_err(GenError::from)?;
                            let acceptance = if relative_error(last, target) < JPEG_TOLERANCE {
                                Acceptance::WithinTolerance
                            } else {
                                Acceptance::BestEffort
                            };
                            return Ok(SearchOutcome { size: last, acceptance });
                        }
                    }
                    state = SearchState::RescaleDimensions {
                        factor: (t / last as f64).sqrt(),
                        next_level: level + 1,
                    };
                    continue;
                }

                // Between 90% and 100% of target without meeting the band:
                // try the next coarse level at the same dimensions
                state = SearchState::SweepQuality { level: level + 1 };
            }

            SearchState::RescaleDimensions { factor, next_level } => {
                if rescales >= config.max_rescales {
                    state = SearchState::FallbackAccept;
                    continue;
                }
                rescales += 1;
                width = ((width as f64 * factor) as u32).max(1);
                height = ((height as f64 * factor) as u32).max(1);
                state = SearchState::SweepQuality { level: next_level };
            }

            SearchState::FallbackAccept => {
                let canvas = paint::blocks_and_ellipses(width, height, rng);
                let bytes = encode_jpeg(&canvas, FALLBACK_QUALITY)?;
                let _ = fs::remove_file(tmp);
                fs::write(output, &bytes).map_err(GenError::from)?;
                return Ok(SearchOutcome {
                    size: bytes.len() as u64,
                    acceptance: Acceptance::BestEffort,
                });
            }
        }
    }
}

/// PNG search: one lossless encode, then at most one upscale correction.
///
/// PNG has no quality knob, so the only lever is pixel count. A result
/// below target is resampled up by `sqrt(target/actual)` and re-encoded
/// once; whatever size that produces stands.
pub(crate) fn png<R: Rng>(
    config: &Generator,
    target: u64,
    output: &Path,
    rng: &mut R,
) -> Result<SearchOutcome> {
    let canvas = paint::color_blocks(config.png_base, config.png_base, paint::PNG_BLOCK, rng);
    let bytes = encode_png(&canvas)?;
    fs::write(output, &bytes).map_err(GenError::from)?;
    let mut size = bytes.len() as u64;

    if size < target {
        let scale = (target as f64 / size as f64).sqrt();
        let new_width = ((canvas.width() as f64 * scale) as u32).max(1);
        let new_height = ((canvas.height() as f64 * scale) as u32).max(1);
        let resized = image::imageops::resize(&canvas, new_width, new_height, FilterType::Lanczos3);
        let bytes = encode_png(&resized)?;
        fs::write(output, &bytes).map_err(GenError::from)?;
        size = bytes.len() as u64;
    }

    // No tolerance band for PNG; the (possibly corrected) size stands
    Ok(SearchOutcome {
        size,
        acceptance: Acceptance::BestEffort,
    })
}

/// WebP search: quality sweep over a single painted canvas.
///
/// Each attempt overwrites the output path directly; the first encode
/// within the 15% band wins, otherwise the last attempt's file stands.
pub(crate) fn webp<R: Rng>(
    config: &Generator,
    target: u64,
    output: &Path,
    rng: &mut R,
) -> Result<SearchOutcome> {
    let canvas = paint::blocks_and_ellipses(config.webp_base, config.webp_base, rng);
    let encoder = webp::Encoder::from_rgb(canvas.as_raw(), canvas.width(), canvas.height());

    let mut last = 0u64;
    for quality in QUALITY_SWEEP {
        let encoded = encoder.encode(f32::from(quality));
        fs::write(output, &*encoded).map_err(GenError::from)?;
        last = encoded.len() as u64;
        if relative_error(last, target) < WEBP_TOLERANCE {
            return Ok(SearchOutcome {
                size: last,
                acceptance: Acceptance::WithinTolerance,
            });
        }
    }

    Ok(SearchOutcome {
        size: last,
        acceptance: Acceptance::BestEffort,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_error() {
        assert_eq!(relative_error(100, 100), 0.0);
        assert!((relative_error(95, 100) - 0.05).abs() < 1e-12);
        assert!((relative_error(110, 100) - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_tmp_path_appends_suffix() {
        let tmp = tmp_path(Path::new("out/sample_photo_001.jpg"));
        assert_eq!(tmp, Path::new("out/sample_photo_001.jpg.tmp"));
    }

    #[test]
    fn test_quality_sweep_is_descending() {
        assert!(QUALITY_SWEEP.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(QUALITY_SWEEP.first(), Some(&95));
        assert_eq!(QUALITY_SWEEP.last(), Some(&65));
    }
}
