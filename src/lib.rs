//! Synthetic photo fixture generator
//!
//! This crate produces batches of procedurally painted JPEG/PNG/WebP files
//! whose byte sizes approximate requested targets, for benchmarking photo
//! upload pipelines and similar fixtures-hungry test setups. File sizes are
//! approximate: each format runs a bounded search over dimensions and
//! encoding quality and accepts the first result inside its tolerance band,
//! falling back to a best-effort encode when the search does not converge.
//!
//! # Example
//!
//! ```ignore
//! use photoset::{GenerationRequest, Generator, ImageFormat};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let request = GenerationRequest {
//!     target_size_bytes: 2 << 20,
//!     format: ImageFormat::Jpeg,
//!     output_path: "fixture.jpg".into(),
//! };
//! let result = Generator::new().generate(&request, &mut rng)?;
//! println!("wrote {} bytes", result.actual_size_bytes);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
pub mod batch;
pub mod paint;
mod search;

pub use batch::{run, Batch, BatchPlan, BatchSummary, SizeDistribution};
pub use error::{GenError, Result};

use rand::Rng;
use std::fmt;
use std::path::PathBuf;

/// Output encoding for a generated photo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// Lossy JPEG, quality-swept toward the target size
    Jpeg,
    /// Lossless PNG, size steered by resampling only
    Png,
    /// Lossy WebP, quality-swept toward the target size
    Webp,
}

impl ImageFormat {
    /// File extension used for output filenames
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg => write!(f, "JPEG"),
            Self::Png => write!(f, "PNG"),
            Self::Webp => write!(f, "WEBP"),
        }
    }
}

/// A single photo to generate. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Byte size the output file should approximate (must be positive)
    pub target_size_bytes: u64,
    /// Output encoding
    pub format: ImageFormat,
    /// Where the file is written on success
    pub output_path: PathBuf,
}

/// How a generated file's size relates to its request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// The format's tolerance band was met
    WithinTolerance,
    /// Uncorrected fallback: the search did not converge (or the format
    /// enforces no band) and the last encode was accepted as-is
    BestEffort,
}

/// Outcome of one generation request
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Byte size of the file actually written
    pub actual_size_bytes: u64,
    /// Path of the written file
    pub output_path: PathBuf,
    /// Whether the tolerance band was met or the fallback path accepted
    pub acceptance: Acceptance,
}

/// Size-targeting photo generator.
///
/// Holds the search parameters: base canvas dimensions per format and the
/// bound on dimension-rescale steps for the JPEG search. Defaults match the
/// canonical fixture set (2000 px JPEG/WebP canvases, 1500 px PNG).
#[derive(Debug, Clone)]
pub struct Generator {
    pub(crate) jpeg_base: u32,
    pub(crate) png_base: u32,
    pub(crate) webp_base: u32,
    pub(crate) max_rescales: u32,
}

impl Generator {
    /// Create a generator with default search parameters
    #[must_use]
    pub fn new() -> Self {
        Self {
            jpeg_base: 2000,
            png_base: 1500,
            webp_base: 2000,
            max_rescales: 4,
        }
    }

    /// Override the square base canvas dimensions per format.
    ///
    /// Smaller canvases make generation much cheaper for small targets
    /// (useful in tests); the search still rescales as needed.
    #[must_use]
    pub fn with_base_dimensions(mut self, jpeg: u32, png: u32, webp: u32) -> Self {
        self.jpeg_base = jpeg.max(1);
        self.png_base = png.max(1);
        self.webp_base = webp.max(1);
        self
    }

    /// Override the bound on dimension-rescale transitions in the JPEG search
    #[must_use]
    pub fn with_max_rescales(mut self, max_rescales: u32) -> Self {
        self.max_rescales = max_rescales;
        self
    }

    /// Generate one photo approximating the request's target size.
    ///
    /// Writes the output file and returns its measured size. Colors and
    /// shapes are drawn from `rng`, so a seeded generator reproduces the
    /// same pixel content (encoded sizes included).
    ///
    /// # Errors
    ///
    /// Returns an error on a zero-byte target, an encoder failure, or a
    /// filesystem failure. A partially written temp file is cleaned up on
    /// the error path; the caller is responsible for removing a partial
    /// output file.
    pub fn generate<R: Rng>(
        &self,
        request: &GenerationRequest,
        rng: &mut R,
    ) -> Result<GenerationResult> {
        if request.target_size_bytes == 0 {
            return Err(GenError::InvalidRequest("target size must be positive").into());
        }

        let outcome = match request.format {
            ImageFormat::Jpeg => {
                search::jpeg(self, request.target_size_bytes, &request.output_path, rng)?
            }
            ImageFormat::Png => {
                search::png(self, request.target_size_bytes, &request.output_path, rng)?
            }
            ImageFormat::Webp => {
                search::webp(self, request.target_size_bytes, &request.output_path, rng)?
            }
        };

        Ok(GenerationResult {
            actual_size_bytes: outcome.size,
            output_path: request.output_path.clone(),
            acceptance: outcome.acceptance,
        })
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}
