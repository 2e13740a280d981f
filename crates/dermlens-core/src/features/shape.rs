//! Outline of the dominant foreground region.
//!
//! The grayscale image is binarized with Otsu's threshold; the outer contour
//! enclosing the largest area is measured. Pixels outside the frame count as
//! background, so foreground touching the border still has a closed outline.

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, Contour};
use imageproc::point::Point;
use imageproc::stats::histogram;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShapeFeatures {
    /// Polygon area enclosed by the largest outer contour
    pub largest_area: f64,
    /// Closed length of that contour
    pub perimeter: f64,
    /// 4π·area / perimeter², 0 when there is no perimeter
    pub circularity: f64,
}

/// Measure the largest outer contour. All zeros when none is found.
pub fn analyze(gray: &GrayImage) -> ShapeFeatures {
    let level = otsu_threshold(&histogram(gray).channels[0]);

    // One pixel of background on every side.
    let binary = GrayImage::from_fn(gray.width() + 2, gray.height() + 2, |x, y| {
        let inside = x >= 1 && y >= 1 && x <= gray.width() && y <= gray.height();
        if inside && gray.get_pixel(x - 1, y - 1)[0] > level {
            Luma([255])
        } else {
            Luma([0])
        }
    });

    let contours: Vec<Contour<i32>> = find_contours(&binary);

    // First contour wins among equal areas
    let largest = contours
        .iter()
        .filter(|c| c.parent.is_none())
        .map(|c| (polygon_area(&c.points), c))
        .reduce(|best, cur| if cur.0 > best.0 { cur } else { best });

    let Some((area, contour)) = largest else {
        tracing::trace!("No outer contour found (otsu level {level})");
        return ShapeFeatures::default();
    };

    // The padding offset cancels out of both area and length.
    let perimeter = closed_length(&contour.points);
    let circularity = if perimeter > 0.0 {
        4.0 * std::f64::consts::PI * area / (perimeter * perimeter)
    } else {
        0.0
    };

    ShapeFeatures {
        largest_area: area,
        perimeter,
        circularity,
    }
}

/// Otsu's threshold over a 256-bin gray histogram.
///
/// Picks the level maximizing between-class variance, the lowest level on
/// ties, and 0 when fewer than two levels are populated. Sums are kept in
/// u64/f64 so very large images cannot overflow.
pub fn otsu_threshold(hist: &[u32; 256]) -> u8 {
    let total: u64 = hist.iter().map(|&h| u64::from(h)).sum();
    let total_sum: f64 = hist
        .iter()
        .enumerate()
        .map(|(level, &h)| level as f64 * f64::from(h))
        .sum();

    let mut background_weight: u64 = 0;
    let mut background_sum = 0f64;
    let mut best_variance = 0f64;
    let mut best_level = 0u8;

    for (level, &count) in hist.iter().enumerate() {
        background_weight += u64::from(count);
        if background_weight == 0 {
            continue;
        }
        let foreground_weight = total - background_weight;
        if foreground_weight == 0 {
            break;
        }

        background_sum += level as f64 * f64::from(count);
        let background_mean = background_sum / background_weight as f64;
        let foreground_mean = (total_sum - background_sum) / foreground_weight as f64;

        let variance = background_weight as f64
            * foreground_weight as f64
            * (background_mean - foreground_mean).powi(2);
        if variance > best_variance {
            best_variance = variance;
            best_level = level as u8;
        }
    }

    best_level
}

/// Shoelace area of a closed polygon.
fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    (twice as f64 / 2.0).abs()
}

/// Length of a polygon including the closing edge.
fn closed_length(points: &[Point<i32>]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| {
            let dx = (b.x - a.x) as f64;
            let dy = (b.y - a.y) as f64;
            (dx * dx + dy * dy).sqrt()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(points: &[(i32, i32)]) -> Vec<Point<i32>> {
        points.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_polygon_helpers() {
        let pts = square(&[(0, 0), (4, 0), (4, 4), (0, 4)]);
        assert_eq!(polygon_area(&pts), 16.0);
        assert_eq!(closed_length(&pts), 16.0);
        assert_eq!(polygon_area(&pts[..2]), 0.0);
        assert_eq!(closed_length(&pts[..1]), 0.0);
    }

    #[test]
    fn test_filled_square() {
        let img = GrayImage::from_fn(100, 100, |x, y| {
            if (30..70).contains(&x) && (30..70).contains(&y) {
                Luma([255])
            } else {
                Luma([0])
            }
        });
        let shape = analyze(&img);
        // Boundary runs through pixel centers: a 39×39 square
        assert!((shape.largest_area - 1521.0).abs() < 1e-6);
        assert!((shape.perimeter - 156.0).abs() < 1e-6);
        assert!((shape.circularity - std::f64::consts::PI / 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_largest_of_two_blobs() {
        let img = GrayImage::from_fn(100, 60, |x, y| {
            let small = (5..15).contains(&x) && (5..15).contains(&y);
            let large = (40..90).contains(&x) && (10..50).contains(&y);
            if small || large {
                Luma([200])
            } else {
                Luma([20])
            }
        });
        let shape = analyze(&img);
        assert!((shape.largest_area - 49.0 * 39.0).abs() < 1e-6);
    }

    #[test]
    fn test_single_pixel_has_zero_circularity() {
        let img = GrayImage::from_fn(9, 9, |x, y| Luma([if x == 4 && y == 4 { 255 } else { 0 }]));
        let shape = analyze(&img);
        assert_eq!(shape.largest_area, 0.0);
        assert_eq!(shape.circularity, 0.0);
    }

    #[test]
    fn test_otsu_splits_two_levels() {
        let mut hist = [0u32; 256];
        hist[40] = 500;
        hist[200] = 300;
        assert_eq!(otsu_threshold(&hist), 40);
    }

    #[test]
    fn test_otsu_handles_huge_counts() {
        // 6000×4000 pixels at one level, then two heavily populated levels.
        let mut hist = [0u32; 256];
        hist[255] = 24_000_000;
        assert_eq!(otsu_threshold(&hist), 0);

        hist[10] = 30_000_000;
        assert_eq!(otsu_threshold(&hist), 10);
    }

    #[test]
    fn test_otsu_matches_imageproc_on_small_images() {
        let img = GrayImage::from_fn(37, 23, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]));
        assert_eq!(
            otsu_threshold(&histogram(&img).channels[0]),
            imageproc::contrast::otsu_level(&img)
        );
    }

    #[test]
    fn test_uniform_image_outlines_the_frame() {
        let shape = analyze(&GrayImage::from_pixel(300, 300, Luma([180])));
        assert!((shape.largest_area - 89401.0).abs() < 1e-6);
        assert!((shape.perimeter - 1196.0).abs() < 1e-6);
        assert!((shape.circularity - std::f64::consts::PI / 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_blob_touching_the_border() {
        let img = GrayImage::from_fn(50, 40, |x, _| Luma([if x < 20 { 230 } else { 30 }]));
        let shape = analyze(&img);
        assert!((shape.largest_area - 19.0 * 39.0).abs() < 1e-6);
        assert!((shape.perimeter - 2.0 * (19.0 + 39.0)).abs() < 1e-6);
    }

    #[test]
    fn test_black_image_has_no_contour() {
        let shape = analyze(&GrayImage::new(20, 20));
        assert_eq!(shape, ShapeFeatures::default());
    }
}
