//! Anti-aliased filled circles.
//!
//! A disk is drawn hard-edged at `diameter × factor` pixels and then reduced
//! to `diameter` with a Lanczos3 filter, which gives a smooth edge without any
//! analytic coverage computation. The result carries coverage in its alpha
//! channel over white, so callers tint it with whatever color they paint.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use image::{ImageBuffer, Rgba, RgbaImage, imageops};
use log::trace;

/// Supersampling factor used for bubbles unless configured otherwise.
pub const DEFAULT_DISK_SUPERSAMPLE: u32 = 8;

/// Renders a `diameter × diameter` anti-aliased disk.
///
/// A `diameter` of zero yields an empty image and a `factor` of zero is
/// treated as one. The output is fully determined by the two arguments.
///
/// # Examples
///
/// ```
/// # use callout_raster::disk::make_disk;
/// let disk = make_disk(40, 8);
/// assert_eq!(disk.dimensions(), (40, 40));
/// assert_eq!(disk.get_pixel(20, 20)[3], 255);
/// assert_eq!(disk.get_pixel(0, 0)[3], 0);
/// ```
pub fn make_disk(diameter: u32, factor: u32) -> RgbaImage {
    if diameter == 0 {
        return RgbaImage::new(0, 0);
    }
    let factor = factor.max(1);
    let big = diameter.saturating_mul(factor);
    let radius = big as f32 / 2.0;
    let radius_sq = radius * radius;

    let hard = ImageBuffer::from_fn(big, big, |px, py| {
        let dx = px as f32 + 0.5 - radius;
        let dy = py as f32 + 0.5 - radius;
        if dx * dx + dy * dy <= radius_sq {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([255, 255, 255, 0])
        }
    });

    if factor == 1 {
        return hard;
    }
    imageops::resize(&hard, diameter, diameter, imageops::FilterType::Lanczos3)
}

/// Memoizes [`make_disk`] results by `(diameter, factor)`.
///
/// Safe to share between threads.
#[derive(Debug, Default)]
pub struct DiskCache {
    disks: Mutex<HashMap<(u32, u32), Arc<RgbaImage>>>,
}

impl DiskCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the disk for the given size, rendering it on first use.
    pub fn get(&self, diameter: u32, factor: u32) -> Arc<RgbaImage> {
        let key = (diameter, factor.max(1));
        let mut disks = self.disks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(disks.entry(key).or_insert_with(|| {
            trace!(diameter, factor = key.1; "Rendering disk");
            Arc::new(make_disk(key.0, key.1))
        }))
    }

    /// Number of distinct disks held.
    pub fn len(&self) -> usize {
        self.disks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_diameter_is_empty() {
        let disk = make_disk(0, 8);
        assert_eq!(disk.dimensions(), (0, 0));
    }

    #[test]
    fn test_zero_factor_treated_as_one() {
        assert_eq!(make_disk(10, 0), make_disk(10, 1));
    }

    #[test]
    fn test_disk_is_opaque_inside_and_clear_outside() {
        let disk = make_disk(160, 8);
        assert_eq!(disk.dimensions(), (160, 160));
        assert_eq!(disk.get_pixel(80, 80)[3], 255);
        assert_eq!(disk.get_pixel(80, 10)[3], 255);
        assert_eq!(disk.get_pixel(0, 0)[3], 0);
        assert_eq!(disk.get_pixel(159, 159)[3], 0);
    }

    #[test]
    fn test_disk_edge_is_smoothed() {
        let disk = make_disk(40, 8);
        let partial = disk
            .pixels()
            .filter(|p| p[3] > 10 && p[3] < 245)
            .count();
        assert!(partial > 0, "expected intermediate alpha along the rim");

        let hard = make_disk(40, 1);
        let hard_partial = hard.pixels().filter(|p| p[3] > 0 && p[3] < 255).count();
        assert_eq!(hard_partial, 0);
    }

    #[test]
    fn test_disk_is_symmetric() {
        let disk = make_disk(40, 8);
        for y in 0..40 {
            for x in 0..40 {
                let left = disk.get_pixel(x, y)[3] as i16;
                let right = disk.get_pixel(39 - x, y)[3] as i16;
                assert!((left - right).abs() <= 1, "asymmetry at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_cache_reuses_disks() {
        let cache = DiskCache::new();
        assert!(cache.is_empty());

        let a = cache.get(40, 8);
        let b = cache.get(40, 8);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);

        let c = cache.get(40, 0);
        let d = cache.get(40, 1);
        assert!(Arc::ptr_eq(&c, &d));
        assert_eq!(cache.len(), 2);
    }
}
