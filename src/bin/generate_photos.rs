//! Generate a directory of synthetic sample photos
//!
//! Usage: generate_photos [output_dir] [num_photos] [avg_size_mb]
//!
//! All arguments are optional positionals; defaults are `sample_photos`,
//! 100 photos, 2.0 MB average. Per-file failures are reported and skipped;
//! the process always finishes with a summary.

use std::env;
use std::path::Path;

fn main() {
    let mut args = env::args().skip(1);

    let output_dir = args.next().unwrap_or_else(|| "sample_photos".to_string());
    let num_photos: usize = args
        .next()
        .map_or(100, |s| s.parse().expect("num_photos must be an integer"));
    let avg_size_mb: f64 = args
        .next()
        .map_or(2.0, |s| s.parse().expect("avg_size_mb must be a number"));

    if let Err(e) = photoset::run(Path::new(&output_dir), num_photos, avg_size_mb) {
        println!("ERROR: {e}");
    }
}
