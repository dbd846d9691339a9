//! Procedural canvas painting
//!
//! Fixture photos are painted, not loaded: a coarse grid of random-colored
//! blocks with random ellipses layered on top. The block grid keeps plenty
//! of hard edges in the image, which resists lossy compression enough that
//! encoded sizes respond predictably to dimension and quality changes.

use image::{Rgb, RgbImage};
use rand::Rng;

/// Block edge length for JPEG/WebP canvases
pub const BLOCK: u32 = 50;
/// Block edge length for PNG canvases (finer grid, lossless output)
pub const PNG_BLOCK: u32 = 30;

const ELLIPSE_COUNT: u32 = 20;

fn random_color<R: Rng>(rng: &mut R) -> Rgb<u8> {
    Rgb([rng.random(), rng.random(), rng.random()])
}

/// Paint a canvas as a grid of `block`-sized random-colored squares.
pub fn color_blocks<R: Rng>(width: u32, height: u32, block: u32, rng: &mut R) -> RgbImage {
    let mut img = RgbImage::new(width, height);
    let block = block.max(1);

    let mut y0 = 0;
    while y0 < height {
        let mut x0 = 0;
        while x0 < width {
            let color = random_color(rng);
            for y in y0..(y0 + block).min(height) {
                for x in x0..(x0 + block).min(width) {
                    img.put_pixel(x, y, color);
                }
            }
            x0 += block;
        }
        y0 += block;
    }
    img
}

/// Paint the standard lossy-format canvas: 50-px block grid plus random
/// ellipses for extra complexity.
pub fn blocks_and_ellipses<R: Rng>(width: u32, height: u32, rng: &mut R) -> RgbImage {
    let mut img = color_blocks(width, height, BLOCK, rng);

    for _ in 0..ELLIPSE_COUNT {
        let x1 = rng.random_range(0..width.saturating_sub(100).max(1));
        let y1 = rng.random_range(0..height.saturating_sub(100).max(1));
        let x2 = (x1 + rng.random_range(50..=200)).min(width);
        let y2 = (y1 + rng.random_range(50..=200)).min(height);
        let color = random_color(rng);
        fill_ellipse(&mut img, x1, y1, x2, y2, color);
    }
    img
}

/// Fill the ellipse inscribed in the bounding box `[x1, x2) × [y1, y2)`.
fn fill_ellipse(img: &mut RgbImage, x1: u32, y1: u32, x2: u32, y2: u32, color: Rgb<u8>) {
    let cx = (x1 + x2) as f64 / 2.0;
    let cy = (y1 + y2) as f64 / 2.0;
    let rx = (x2.saturating_sub(x1) as f64 / 2.0).max(0.5);
    let ry = (y2.saturating_sub(y1) as f64 / 2.0).max(0.5);

    for y in y1..y2.min(img.height()) {
        for x in x1..x2.min(img.width()) {
            let dx = (x as f64 + 0.5 - cx) / rx;
            let dy = (y as f64 + 0.5 - cy) / ry;
            if dx * dx + dy * dy <= 1.0 {
                img.put_pixel(x, y, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_canvas_dimensions() {
        let mut rng = StdRng::seed_from_u64(1);
        let img = color_blocks(120, 80, BLOCK, &mut rng);
        assert_eq!(img.width(), 120);
        assert_eq!(img.height(), 80);
    }

    #[test]
    fn test_seeded_painting_is_deterministic() {
        let a = blocks_and_ellipses(200, 200, &mut StdRng::seed_from_u64(7));
        let b = blocks_and_ellipses(200, 200, &mut StdRng::seed_from_u64(7));
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_blocks_vary() {
        let mut rng = StdRng::seed_from_u64(3);
        let img = color_blocks(500, 500, BLOCK, &mut rng);
        // With 100 random blocks the canvas is all but guaranteed non-uniform
        let first = img.get_pixel(0, 0);
        assert!(img.pixels().any(|p| p != first));
    }

    #[test]
    fn test_ellipse_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        // Canvas smaller than the ellipse size range; must not panic
        let img = blocks_and_ellipses(60, 60, &mut rng);
        assert_eq!(img.width(), 60);
    }
}
