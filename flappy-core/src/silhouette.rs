//! Binary per-pixel occupancy masks and exact overlap testing.

use std::collections::HashMap;

use crate::constants::{
    AGENT_HEIGHT, AGENT_WIDTH, BARRIER_BODY_INSET, BARRIER_CAP_ROWS, BARRIER_HEIGHT, BARRIER_WIDTH,
};

// Rotated extents that land within this of an integer are treated as exact.
const EXTENT_EPSILON: f64 = 1e-9;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Silhouette {
    width: i32,
    height: i32,
    /// Words per row. Rows start on a word boundary; padding bits stay clear.
    stride: usize,
    bits: Vec<u64>,
}

impl Silhouette {
    pub fn empty(width: i32, height: i32) -> Self {
        debug_assert!(width >= 0 && height >= 0);
        let stride = (width.max(0) as usize).div_ceil(64);
        Self {
            width,
            height,
            stride,
            bits: vec![0; stride * height.max(0) as usize],
        }
    }

    pub fn from_fn(width: i32, height: i32, mut filled: impl FnMut(i32, i32) -> bool) -> Self {
        let mut mask = Self::empty(width, height);
        for y in 0..height {
            for x in 0..width {
                if filled(x, y) {
                    mask.set(x, y);
                }
            }
        }
        mask
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    fn word_index(&self, x: i32, y: i32) -> usize {
        (y as usize) * self.stride + (x as usize) / 64
    }

    fn set(&mut self, x: i32, y: i32) {
        let word = self.word_index(x, y);
        self.bits[word] |= 1u64 << (x % 64);
    }

    /// Pixels outside the mask read as empty.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return false;
        }
        (self.bits[self.word_index(x, y)] >> (x % 64)) & 1 == 1
    }

    /// Up to 64 pixels of row `y` starting at column `x`; bit 0 is column `x`.
    /// Columns past the right edge read as empty.
    fn row_window(&self, x: i32, y: i32) -> u64 {
        let start = (y as usize) * self.stride;
        let row = &self.bits[start..start + self.stride];
        let word = (x as usize) / 64;
        let shift = (x as usize) % 64;
        let low = row.get(word).copied().unwrap_or(0) >> shift;
        if shift == 0 {
            low
        } else {
            low | row.get(word + 1).copied().unwrap_or(0) << (64 - shift)
        }
    }

    pub fn count(&self) -> u32 {
        self.bits.iter().map(|word| word.count_ones()).sum()
    }

    pub fn flipped_vertical(&self) -> Self {
        Self::from_fn(self.width, self.height, |x, y| {
            self.get(x, self.height - 1 - y)
        })
    }

    /// Counter-clockwise rotation on screen (y grows downward). The result is
    /// sized to the rotated bounding box and shares the source's centre.
    pub fn rotated(&self, degrees: f64) -> Self {
        if degrees == 0.0 {
            return self.clone();
        }

        let (sin, cos) = degrees.to_radians().sin_cos();
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        let out_w = ((w * cos).abs() + (h * sin).abs() - EXTENT_EPSILON).ceil() as i32;
        let out_h = ((w * sin).abs() + (h * cos).abs() - EXTENT_EPSILON).ceil() as i32;
        let half_out_w = f64::from(out_w) / 2.0;
        let half_out_h = f64::from(out_h) / 2.0;

        Self::from_fn(out_w, out_h, |x, y| {
            let dx = f64::from(x) + 0.5 - half_out_w;
            let dy = f64::from(y) + 0.5 - half_out_h;
            let src_x = dx * cos - dy * sin + w / 2.0;
            let src_y = dx * sin + dy * cos + h / 2.0;
            self.get(src_x.floor() as i32, src_y.floor() as i32)
        })
    }

    /// True if any pixel is set in both masks at the same absolute position.
    pub fn overlaps(
        &self,
        origin: (i32, i32),
        other: &Silhouette,
        other_origin: (i32, i32),
    ) -> bool {
        self.first_overlap(origin, other, other_origin).is_some()
    }

    /// First shared pixel in absolute coordinates, scanning row-major.
    pub fn first_overlap(
        &self,
        origin: (i32, i32),
        other: &Silhouette,
        other_origin: (i32, i32),
    ) -> Option<(i32, i32)> {
        let x0 = origin.0.max(other_origin.0);
        let x1 = origin
            .0
            .saturating_add(self.width)
            .min(other_origin.0.saturating_add(other.width));
        let y0 = origin.1.max(other_origin.1);
        let y1 = origin
            .1
            .saturating_add(self.height)
            .min(other_origin.1.saturating_add(other.height));
        if x0 >= x1 || y0 >= y1 {
            return None;
        }

        // AND the two rows 64 columns at a time.
        for y in y0..y1 {
            let mut x = x0;
            while x < x1 {
                let span = (x1 - x).min(64);
                let in_span = if span == 64 {
                    u64::MAX
                } else {
                    (1u64 << span) - 1
                };
                let shared = self.row_window(x - origin.0, y - origin.1)
                    & other.row_window(x - other_origin.0, y - other_origin.1)
                    & in_span;
                if shared != 0 {
                    return Some((x + shared.trailing_zeros() as i32, y));
                }
                x += span;
            }
        }
        None
    }
}

/// Ellipse inscribed in the agent sprite.
pub fn agent_silhouette() -> Silhouette {
    let half_w = f64::from(AGENT_WIDTH) / 2.0;
    let half_h = f64::from(AGENT_HEIGHT) / 2.0;
    Silhouette::from_fn(AGENT_WIDTH, AGENT_HEIGHT, |x, y| {
        let nx = (f64::from(x) + 0.5 - half_w) / half_w;
        let ny = (f64::from(y) + 0.5 - half_h) / half_h;
        nx * nx + ny * ny <= 1.0
    })
}

/// Lower barrier: a full-width cap on top of an inset body.
pub fn barrier_silhouette() -> Silhouette {
    Silhouette::from_fn(BARRIER_WIDTH, BARRIER_HEIGHT, |x, y| {
        y < BARRIER_CAP_ROWS
            || (BARRIER_BODY_INSET..BARRIER_WIDTH - BARRIER_BODY_INSET).contains(&x)
    })
}

#[derive(Clone, Debug)]
pub struct Barriers {
    pub top: Silhouette,
    pub bottom: Silhouette,
}

/// Shared silhouettes plus a memo of agent rotations keyed by tilt.
#[derive(Clone, Debug)]
pub struct SilhouetteSet {
    agent: Silhouette,
    barriers: Barriers,
    rotations: HashMap<u64, Silhouette>,
}

impl Default for SilhouetteSet {
    fn default() -> Self {
        Self::new()
    }
}

impl SilhouetteSet {
    pub fn new() -> Self {
        let bottom = barrier_silhouette();
        Self {
            agent: agent_silhouette(),
            barriers: Barriers {
                top: bottom.flipped_vertical(),
                bottom,
            },
            rotations: HashMap::new(),
        }
    }

    pub fn barriers(&self) -> &Barriers {
        &self.barriers
    }

    /// Agent silhouette rotated to `tilt_deg`, alongside the barrier masks.
    pub fn pose(&mut self, tilt_deg: f64) -> (&Silhouette, &Barriers) {
        let agent = &self.agent;
        let posed = self
            .rotations
            .entry(tilt_deg.to_bits())
            .or_insert_with(|| agent.rotated(tilt_deg));
        (posed, &self.barriers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: i32) -> Silhouette {
        Silhouette::from_fn(size, size, |_, _| true)
    }

    #[test]
    fn overlap_is_symmetric() {
        let agent = agent_silhouette().rotated(25.0);
        let barrier = barrier_silhouette();
        for dx in (-120..120).step_by(7) {
            for dy in (-90..90).step_by(5) {
                let a = agent.overlaps((0, 0), &barrier, (dx, dy));
                let b = barrier.overlaps((dx, dy), &agent, (0, 0));
                assert_eq!(a, b, "asymmetric at offset ({dx}, {dy})");
            }
        }
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = square(10);
        let b = square(10);
        assert!(!a.overlaps((0, 0), &b, (10, 0)));
        assert!(!a.overlaps((0, 0), &b, (0, 10)));
        assert_eq!(a.first_overlap((0, 0), &b, (9, 9)), Some((9, 9)));
    }

    fn first_overlap_by_pixel(
        a: &Silhouette,
        a_origin: (i32, i32),
        b: &Silhouette,
        b_origin: (i32, i32),
    ) -> Option<(i32, i32)> {
        let x0 = a_origin.0.max(b_origin.0);
        let x1 = (a_origin.0 + a.width()).min(b_origin.0 + b.width());
        let y0 = a_origin.1.max(b_origin.1);
        let y1 = (a_origin.1 + a.height()).min(b_origin.1 + b.height());
        (y0..y1)
            .flat_map(|y| (x0..x1).map(move |x| (x, y)))
            .find(|&(x, y)| {
                a.get(x - a_origin.0, y - a_origin.1) && b.get(x - b_origin.0, y - b_origin.1)
            })
    }

    #[test]
    fn word_scan_matches_pixel_scan_on_wide_masks() {
        let set = SilhouetteSet::new();
        let agents = [
            agent_silhouette(),
            agent_silhouette().rotated(25.0),
            agent_silhouette().rotated(-70.0),
        ];
        // Sparse stripes across a mask wider than two words.
        let comb = Silhouette::from_fn(150, 20, |x, y| (x * 7 + y * 3) % 11 == 0);
        let barriers = [&set.barriers().top, &set.barriers().bottom, &comb];

        for agent in &agents {
            for barrier in barriers {
                for dx in (-160..160).step_by(9) {
                    for dy in (-90..90).step_by(13) {
                        let by_word = agent.first_overlap((0, 0), barrier, (dx, dy));
                        let by_pixel = first_overlap_by_pixel(agent, (0, 0), barrier, (dx, dy));
                        assert_eq!(by_word, by_pixel, "offset ({dx}, {dy})");
                    }
                }
            }
        }
    }

    #[test]
    fn far_off_origins_do_not_overflow() {
        let set = SilhouetteSet::new();
        let agent = agent_silhouette();
        let top = &set.barriers().top;
        assert!(!agent.overlaps((230, 350), top, (230, i32::MIN)));
        assert!(!agent.overlaps((230, 350), top, (230, i32::MAX - 10)));
    }

    #[test]
    fn bounding_boxes_overlap_but_pixels_do_not() {
        // Corner of the ellipse's box is empty.
        let agent = agent_silhouette();
        let dot = square(2);
        assert!(!agent.overlaps((0, 0), &dot, (0, 0)));
        assert!(agent.overlaps((0, 0), &dot, (33, 23)));
    }

    #[test]
    fn rotation_grows_bounding_box_and_keeps_area() {
        let agent = agent_silhouette();
        let upright = agent.rotated(25.0);
        assert_eq!((upright.width(), upright.height()), (82, 73));

        let diving = agent.rotated(-90.0);
        assert_eq!((diving.width(), diving.height()), (48, 68));

        let area = f64::from(agent.count());
        for rotated in [&upright, &diving] {
            let ratio = f64::from(rotated.count()) / area;
            assert!((0.95..1.05).contains(&ratio), "area ratio {ratio}");
        }
    }

    #[test]
    fn quarter_turn_swaps_axes() {
        let bar = Silhouette::from_fn(6, 2, |_, _| true);
        let turned = bar.rotated(90.0);
        assert_eq!((turned.width(), turned.height()), (2, 6));
        assert_eq!(turned.count(), 12);
    }

    #[test]
    fn top_barrier_has_cap_at_bottom() {
        let set = SilhouetteSet::new();
        let top = &set.barriers().top;
        assert!(top.get(0, BARRIER_HEIGHT - 1));
        assert!(!top.get(0, 0));
        assert!(set.barriers().bottom.get(0, 0));
    }

    #[test]
    fn posed_agent_is_memoised() {
        let mut set = SilhouetteSet::new();
        let first = set.pose(-35.0).0.clone();
        let second = set.pose(-35.0).0.clone();
        assert_eq!(first, second);
        assert_eq!(set.rotations.len(), 1);
    }
}
