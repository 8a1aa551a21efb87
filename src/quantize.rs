//! Palette reduction for the working raster.
//!
//! K-means in CIE Lab picks the palette, every pixel is mapped onto it (optionally with
//! Floyd-Steinberg error diffusion), and each palette entry is finally moved to the mean
//! true-color value of the pixels it received so the result stays close to the original.

use image::RgbImage;
use palette::{white_point::D65, Lab};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::error::PatternError;
use crate::thread_palette::{lab_to_rgb, rgb_distance_sq, rgb_to_lab};

/// Upper bound on the pixels k-means trains on; larger images are sampled with a stride.
const MAX_TRAINING_PIXELS: usize = 50_000;
const MAX_ITERATIONS: usize = 16;
/// Cluster labels are `u16`, so a palette can hold at most this many entries.
pub const MAX_PALETTE_SIZE: u32 = u16::MAX as u32 + 1;

/// Reduce `raster` to at most `max_colors` distinct colors.
///
/// Returns a new raster; the input is never touched.
pub fn reduce_palette(
    raster: &RgbImage,
    max_colors: u32,
    dither: bool,
) -> Result<RgbImage, PatternError> {
    let (width, height) = raster.dimensions();
    if width == 0 || height == 0 {
        return Err(PatternError::Resample(
            "cannot reduce the palette of an empty image".to_string(),
        ));
    }
    if max_colors > MAX_PALETTE_SIZE {
        return Err(PatternError::Resample(format!(
            "color budget {} exceeds the palette limit of {}",
            max_colors, MAX_PALETTE_SIZE
        )));
    }
    let k = max_colors.max(1) as usize;

    let pixels: Vec<[u8; 3]> = raster.pixels().map(|p| p.0).collect();
    let distinct: HashSet<[u8; 3]> = pixels.iter().copied().collect();
    if distinct.len() <= k {
        log::debug!(
            "Palette already within budget: {} colors <= {}",
            distinct.len(),
            k
        );
        return Ok(raster.clone());
    }

    let labs: Vec<Lab<D65, f32>> = pixels.par_iter().map(|p| rgb_to_lab(*p)).collect();
    let stride = (labs.len() / MAX_TRAINING_PIXELS).max(1);
    let training: Vec<Lab<D65, f32>> = labs.iter().step_by(stride).copied().collect();

    let centers = kmeans_quantize(&training, k, MAX_ITERATIONS);
    let palette_rgb: Vec<[u8; 3]> = centers.iter().map(|lab| lab_to_rgb(*lab)).collect();

    let labels = if dither {
        floyd_steinberg(&pixels, width as usize, height as usize, &palette_rgb)
    } else {
        assign_labels(&labs, &centers)
    };

    let matched = match_palette(&pixels, &labels, &palette_rgb);

    let mut buffer = Vec::with_capacity(pixels.len() * 3);
    for &label in &labels {
        buffer.extend_from_slice(&matched[label as usize]);
    }
    RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        PatternError::Resample("quantized buffer does not match image dimensions".to_string())
    })
}

/// Number of distinct colors in a raster.
pub fn count_colors(raster: &RgbImage) -> usize {
    raster.pixels().map(|p| p.0).collect::<HashSet<_>>().len()
}

fn lab_distance_sq(a: &Lab<D65, f32>, b: &Lab<D65, f32>) -> f32 {
    let dl = a.l - b.l;
    let da = a.a - b.a;
    let db = a.b - b.b;
    dl * dl + da * da + db * db
}

fn nearest_center(pixel: &Lab<D65, f32>, centers: &[Lab<D65, f32>]) -> u16 {
    let mut best_idx = 0u16;
    let mut best_dist = f32::MAX;
    for (i, center) in centers.iter().enumerate() {
        let dist = lab_distance_sq(pixel, center);
        if dist < best_dist {
            best_dist = dist;
            best_idx = i as u16;
        }
    }
    best_idx
}

fn assign_labels(labs: &[Lab<D65, f32>], centers: &[Lab<D65, f32>]) -> Vec<u16> {
    labs.par_iter()
        .map(|pixel| nearest_center(pixel, centers))
        .collect()
}

/// K-means clustering center
#[derive(Clone)]
struct KMeansCenter {
    lab: Lab<D65, f32>,
    sum_l: f64,
    sum_a: f64,
    sum_b: f64,
    count: u64,
}

impl KMeansCenter {
    fn new(lab: Lab<D65, f32>) -> Self {
        Self {
            lab,
            sum_l: 0.0,
            sum_a: 0.0,
            sum_b: 0.0,
            count: 0,
        }
    }

    fn add_sample(&mut self, lab: Lab<D65, f32>) {
        self.sum_l += lab.l as f64;
        self.sum_a += lab.a as f64;
        self.sum_b += lab.b as f64;
        self.count += 1;
    }

    fn update_centroid(&mut self) {
        if self.count > 0 {
            self.lab = Lab::new(
                (self.sum_l / self.count as f64) as f32,
                (self.sum_a / self.count as f64) as f32,
                (self.sum_b / self.count as f64) as f32,
            );
        }
        self.sum_l = 0.0;
        self.sum_a = 0.0;
        self.sum_b = 0.0;
        self.count = 0;
    }
}

fn kmeans_quantize(
    pixels: &[Lab<D65, f32>],
    k: usize,
    max_iterations: usize,
) -> Vec<Lab<D65, f32>> {
    if pixels.is_empty() || k == 0 {
        return Vec::new();
    }
    let k = k.min(pixels.len());

    let mut centers = farthest_point_init(pixels, k);
    let mut labels = vec![u16::MAX; pixels.len()];

    for iteration in 0..max_iterations {
        let lab_centers: Vec<Lab<D65, f32>> = centers.iter().map(|c| c.lab).collect();
        let new_labels = assign_labels(pixels, &lab_centers);

        let changed = new_labels
            .iter()
            .zip(labels.iter())
            .filter(|(a, b)| a != b)
            .count();
        labels = new_labels;
        log::debug!("k-means iteration {}: {} labels changed", iteration, changed);

        if changed == 0 {
            break;
        }

        for (pixel, &label) in pixels.iter().zip(labels.iter()) {
            centers[label as usize].add_sample(*pixel);
        }
        for center in &mut centers {
            center.update_centroid();
        }
    }

    centers.into_iter().map(|c| c.lab).collect()
}

/// Deterministic seeding: start at the median-luminance pixel, then repeatedly take the
/// pixel farthest from every center chosen so far.
fn farthest_point_init(pixels: &[Lab<D65, f32>], k: usize) -> Vec<KMeansCenter> {
    let n = pixels.len();
    let mut centers = Vec::with_capacity(k);
    let mut chosen = HashSet::new();

    let mut sorted_by_l: Vec<(usize, f32)> =
        pixels.iter().enumerate().map(|(i, p)| (i, p.l)).collect();
    sorted_by_l.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    let first_idx = sorted_by_l[n / 2].0;
    centers.push(KMeansCenter::new(pixels[first_idx]));
    chosen.insert(first_idx);

    let first_lab = pixels[first_idx];
    let mut min_distances: Vec<f32> = pixels
        .par_iter()
        .map(|p| lab_distance_sq(p, &first_lab))
        .collect();

    while centers.len() < k {
        let best = min_distances
            .iter()
            .enumerate()
            .filter(|(i, _)| !chosen.contains(i))
            .fold(None::<(usize, f32)>, |best, (i, &d)| match best {
                Some((_, best_d)) if d <= best_d => best,
                _ => Some((i, d)),
            });
        let Some((best_idx, best_dist)) = best else {
            break;
        };
        // Every remaining pixel already coincides with a center.
        if best_dist <= 0.0 {
            break;
        }

        chosen.insert(best_idx);
        let new_lab = pixels[best_idx];
        min_distances
            .par_iter_mut()
            .zip(pixels.par_iter())
            .for_each(|(min_d, pixel)| {
                let d = lab_distance_sq(pixel, &new_lab);
                if d < *min_d {
                    *min_d = d;
                }
            });

        centers.push(KMeansCenter::new(new_lab));
    }

    centers
}

/// Floyd-Steinberg error diffusion onto a fixed palette.
///
/// ```text
///        X   7
///    3   5   1
/// ```
fn floyd_steinberg(
    pixels: &[[u8; 3]],
    width: usize,
    height: usize,
    palette: &[[u8; 3]],
) -> Vec<u16> {
    let mut work: Vec<[f32; 3]> = pixels
        .iter()
        .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
        .collect();
    let mut labels = vec![0u16; pixels.len()];
    let mut cache: HashMap<[u8; 3], u16> = HashMap::new();

    for y in 0..height {
        for x in 0..width {
            let idx = y * width + x;
            let value = work[idx].map(|c| c.round().clamp(0.0, 255.0) as u8);
            let label = *cache
                .entry(value)
                .or_insert_with(|| nearest_rgb(value, palette));
            labels[idx] = label;

            let chosen = palette[label as usize];
            let error = [
                work[idx][0] - chosen[0] as f32,
                work[idx][1] - chosen[1] as f32,
                work[idx][2] - chosen[2] as f32,
            ];

            let mut spread = |nx: usize, ny: usize, weight: f32| {
                let n = ny * width + nx;
                for c in 0..3 {
                    work[n][c] += error[c] * weight;
                }
            };
            if x + 1 < width {
                spread(x + 1, y, 7.0 / 16.0);
            }
            if y + 1 < height {
                if x > 0 {
                    spread(x - 1, y + 1, 3.0 / 16.0);
                }
                spread(x, y + 1, 5.0 / 16.0);
                if x + 1 < width {
                    spread(x + 1, y + 1, 1.0 / 16.0);
                }
            }
        }
    }

    labels
}

fn nearest_rgb(value: [u8; 3], palette: &[[u8; 3]]) -> u16 {
    palette
        .iter()
        .enumerate()
        .min_by_key(|(i, p)| (rgb_distance_sq(value, **p), *i))
        .map(|(i, _)| i as u16)
        .unwrap_or(0)
}

/// Move every palette entry to the mean of the original pixels mapped to it.
fn match_palette(pixels: &[[u8; 3]], labels: &[u16], palette: &[[u8; 3]]) -> Vec<[u8; 3]> {
    let mut sums: Vec<(u64, u64, u64, u64)> = vec![(0, 0, 0, 0); palette.len()];
    for (pixel, &label) in pixels.iter().zip(labels.iter()) {
        let s = &mut sums[label as usize];
        s.0 += pixel[0] as u64;
        s.1 += pixel[1] as u64;
        s.2 += pixel[2] as u64;
        s.3 += 1;
    }

    sums.iter()
        .zip(palette.iter())
        .map(|(&(r, g, b, count), &fallback)| {
            if count == 0 {
                return fallback;
            }
            let mean = |sum: u64| ((sum as f64 / count as f64).round() as u64).min(255) as u8;
            [mean(r), mean(g), mean(b)]
        })
        .collect()
}
