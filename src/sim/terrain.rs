//! Procedural terrain: immutable segments, the random-walk generator and the
//! bounded streaming window
//!
//! World coordinates grow downward (screen convention). A larger `y` is lower
//! ground; the walk's restoring term pulls `y` back toward half the viewport
//! height.

use std::collections::VecDeque;
use std::collections::vec_deque;

use glam::DVec2;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::error::SimError;
use crate::settings::{ExtensionPolicy, TerrainParams};

/// One straight piece of the ground polyline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainSegment {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
    slope: f64,
    intercept: f64,
}

impl TerrainSegment {
    /// Build a segment, rejecting vertical or right-to-left ones
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Result<Self, SimError> {
        if x2 <= x1 {
            return Err(SimError::InvalidSegment { x1, y1, x2, y2 });
        }
        Ok(Self::spanning(x1, y1, x2, y2))
    }

    /// Caller guarantees `x2 > x1`
    fn spanning(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        let slope = (y2 - y1) as f64 / (x2 - x1) as f64;
        let intercept = y1 as f64 - slope * x1 as f64;
        Self {
            x1,
            y1,
            x2,
            y2,
            slope,
            intercept,
        }
    }

    pub fn x1(&self) -> i32 {
        self.x1
    }

    pub fn y1(&self) -> i32 {
        self.y1
    }

    pub fn x2(&self) -> i32 {
        self.x2
    }

    pub fn y2(&self) -> i32 {
        self.y2
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn start(&self) -> DVec2 {
        DVec2::new(self.x1 as f64, self.y1 as f64)
    }

    pub fn end(&self) -> DVec2 {
        DVec2::new(self.x2 as f64, self.y2 as f64)
    }

    /// Ground height on the segment's infinite line
    #[inline]
    pub fn height_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    #[inline]
    pub fn contains_x(&self, x: f64) -> bool {
        x >= self.x1 as f64 && x <= self.x2 as f64
    }

    /// Direction of travel along the ground in the up-positive frame
    /// (rising ground gives a positive angle)
    pub fn tangent_angle(&self) -> f64 {
        -self.slope.atan()
    }
}

/// Uniform samples in `[0, 1)` for the terrain walk and pickup placement
pub trait UniformSource {
    fn next_unit(&mut self) -> f64;
}

impl UniformSource for Pcg32 {
    fn next_unit(&mut self) -> f64 {
        self.random::<f64>()
    }
}

impl<S: UniformSource + ?Sized> UniformSource for &mut S {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

/// Replays a fixed list of samples, wrapping around at the end
///
/// An empty list yields `0.0` forever.
#[derive(Debug, Clone, Default)]
pub struct SequenceSource {
    values: Vec<f64>,
    index: usize,
}

impl SequenceSource {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, index: 0 }
    }

    /// Always returns the same sample
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl UniformSource for SequenceSource {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.index % self.values.len()];
        self.index = self.index.wrapping_add(1);
        value
    }
}

/// Generation cursor for the biased random walk
#[derive(Debug, Clone)]
pub struct TerrainGenerator {
    last_x: i32,
    last_y: i32,
    slope: f64,
    difficulty: f64,
    step: i32,
    irregularity: f64,
    max_slope: f64,
    difficulty_increment: f64,
    viewport_height: f64,
    viewport_width: i32,
}

impl TerrainGenerator {
    /// Cursor at `(0, viewport_height / 2)` with a flat walk
    pub fn new(params: &TerrainParams) -> Self {
        Self {
            last_x: 0,
            last_y: params.viewport_height / 2,
            slope: 0.0,
            difficulty: params.initial_difficulty,
            step: params.step,
            irregularity: params.irregularity,
            max_slope: params.max_slope,
            difficulty_increment: params.difficulty_increment,
            viewport_height: params.viewport_height as f64,
            viewport_width: params.viewport_width,
        }
    }

    pub fn last_x(&self) -> i32 {
        self.last_x
    }

    pub fn last_y(&self) -> i32 {
        self.last_y
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn difficulty(&self) -> f64 {
        self.difficulty
    }

    pub fn step(&self) -> i32 {
        self.step
    }

    /// Draw one sample and emit the next segment of the walk
    ///
    /// Returns `None` without touching the cursor once the next endpoint
    /// would leave the `i32` coordinate range.
    pub fn emit_next(&mut self, source: &mut impl UniformSource) -> Option<TerrainSegment> {
        let next_x = self.last_x.checked_add(self.step)?;

        let r = source.next_unit();
        let bias = r - self.last_y as f64 / self.viewport_height;
        let slope = (self.slope + bias * self.difficulty).clamp(-self.max_slope, self.max_slope);

        let shaped = slope * slope.abs().powf(self.irregularity);
        let delta_y = (shaped * self.step as f64).round() as i32;
        let next_y = self.last_y.checked_add(delta_y)?;

        let segment = TerrainSegment::spanning(self.last_x, self.last_y, next_x, next_y);
        self.slope = slope;
        self.last_x = next_x;
        self.last_y = next_y;
        self.difficulty += self.difficulty_increment;
        Some(segment)
    }

    /// Emit the segments covering the first viewport width plus one step
    pub fn seed_window(&mut self, source: &mut impl UniformSource) -> Vec<TerrainSegment> {
        let count = (self.viewport_width / self.step.max(1)) as usize + 1;
        (0..count).map_while(|_| self.emit_next(source)).collect()
    }
}

/// Active terrain: oldest segment first, bounded length
#[derive(Debug, Clone)]
pub struct TerrainWindow {
    segments: VecDeque<TerrainSegment>,
    generator: TerrainGenerator,
    capacity: usize,
    /// Viewpoint x up to which terrain has been requested
    farthest_x: f64,
    exhausted: bool,
}

impl TerrainWindow {
    /// Seed the initial window from a fresh generator
    pub fn seeded(params: &TerrainParams, source: &mut impl UniformSource) -> Self {
        let mut generator = TerrainGenerator::new(params);
        let segments: VecDeque<_> = generator.seed_window(source).into();
        let mut window = Self {
            segments,
            generator,
            capacity: params.eviction_threshold(),
            farthest_x: 0.0,
            exhausted: false,
        };
        window.evict_overflow();
        log::info!(
            "Seeded terrain window: {} segments to x={} (capacity {})",
            window.len(),
            window.rightmost_x().unwrap_or(0),
            window.capacity
        );
        window
    }

    pub fn segments(&self) -> vec_deque::Iter<'_, TerrainSegment> {
        self.segments.iter()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn farthest_x(&self) -> f64 {
        self.farthest_x
    }

    pub fn generator(&self) -> &TerrainGenerator {
        &self.generator
    }

    pub fn leftmost_x(&self) -> Option<i32> {
        self.segments.front().map(|s| s.x1())
    }

    pub fn rightmost_x(&self) -> Option<i32> {
        self.segments.back().map(|s| s.x2())
    }

    /// Segment whose span covers `x` (left one on a shared endpoint)
    pub fn segment_at(&self, x: f64) -> Option<&TerrainSegment> {
        let idx = self.segments.partition_point(|s| (s.x2() as f64) < x);
        self.segments.get(idx).filter(|s| s.contains_x(x))
    }

    pub fn height_at(&self, x: f64) -> Option<f64> {
        self.segment_at(x).map(|s| s.height_at(x))
    }

    /// Stream terrain forward once the viewpoint passes the farthest marker
    ///
    /// Returns `(emitted, evicted)` segment counts.
    pub fn extend_if_needed(
        &mut self,
        cam_x: f64,
        policy: ExtensionPolicy,
        source: &mut impl UniformSource,
    ) -> (usize, usize) {
        let budget = match policy {
            ExtensionPolicy::OnePerTick => 1,
            ExtensionPolicy::CatchUp => self.capacity,
        };

        let mut emitted = 0;
        while cam_x > self.farthest_x && emitted < budget {
            let Some(segment) = self.generator.emit_next(source) else {
                if !self.exhausted {
                    log::warn!("Terrain reached the end of the coordinate range at x={}", self.generator.last_x());
                    self.exhausted = true;
                }
                break;
            };
            self.farthest_x += self.generator.step() as f64;
            log::debug!(
                "Emitted terrain ({},{})-({},{}) slope={:.3} difficulty={:.4}",
                segment.x1(),
                segment.y1(),
                segment.x2(),
                segment.y2(),
                self.generator.slope(),
                self.generator.difficulty()
            );
            self.segments.push_back(segment);
            emitted += 1;
        }

        let evicted = self.evict_overflow();
        (emitted, evicted)
    }

    fn evict_overflow(&mut self) -> usize {
        let mut evicted = 0;
        while self.segments.len() > self.capacity {
            if let Some(old) = self.segments.pop_front() {
                log::debug!("Evicted terrain segment starting at x={}", old.x1());
            }
            evicted += 1;
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn flat_params() -> TerrainParams {
        TerrainParams {
            initial_difficulty: 0.0,
            difficulty_increment: 0.0,
            ..TerrainParams::default()
        }
    }

    #[test]
    fn test_segment_caches_slope_and_intercept() {
        let seg = TerrainSegment::new(0, 100, 20, 110).unwrap();
        assert_eq!(seg.slope(), 0.5);
        assert_eq!(seg.intercept(), 100.0);
        assert_eq!(seg.height_at(10.0), 105.0);
        assert!(seg.contains_x(0.0) && seg.contains_x(20.0));
        assert!(!seg.contains_x(20.5));
    }

    #[test]
    fn test_vertical_segment_rejected() {
        assert_eq!(
            TerrainSegment::new(5, 0, 5, 10),
            Err(SimError::InvalidSegment { x1: 5, y1: 0, x2: 5, y2: 10 })
        );
        assert!(TerrainSegment::new(10, 0, 5, 0).is_err());
    }

    #[test]
    fn test_tangent_angle_rises_with_ground() {
        // y grows downward, so a decreasing y is rising ground
        let rising = TerrainSegment::new(0, 100, 20, 80).unwrap();
        assert!(rising.tangent_angle() > 0.0);
        let flat = TerrainSegment::new(0, 100, 20, 100).unwrap();
        assert_eq!(flat.tangent_angle(), 0.0);
    }

    #[test]
    fn test_centered_flat_walk_emits_flat_segment() {
        let params = flat_params();
        let mut generator = TerrainGenerator::new(&params);
        assert_eq!(generator.last_y(), params.viewport_height / 2);

        let seg = generator.emit_next(&mut SequenceSource::constant(0.5)).unwrap();
        assert_eq!(seg.y1(), seg.y2());
        assert_eq!(seg.x2() - seg.x1(), params.step);
        assert_eq!(generator.slope(), 0.0);
    }

    #[test]
    fn test_difficulty_increases_every_emission() {
        let params = TerrainParams::default();
        let mut generator = TerrainGenerator::new(&params);
        let mut source = SequenceSource::new(vec![0.1, 0.9]);
        let mut last = generator.difficulty();
        for _ in 0..10 {
            generator.emit_next(&mut source);
            assert!(generator.difficulty() > last);
            last = generator.difficulty();
        }
    }

    #[test]
    fn test_walk_is_pulled_back_toward_center() {
        // Sample 0 with the cursor at mid-height biases the slope negative (upward)
        let params = TerrainParams::default();
        let mut generator = TerrainGenerator::new(&params);
        generator.emit_next(&mut SequenceSource::constant(0.0));
        assert!(generator.slope() < 0.0);
    }

    #[test]
    fn test_seed_window_covers_viewport() {
        let params = TerrainParams::default();
        let window = TerrainWindow::seeded(&params, &mut SequenceSource::constant(0.5));
        assert_eq!(window.len(), 41);
        assert_eq!(window.leftmost_x(), Some(0));
        assert_eq!(window.rightmost_x(), Some(820));
        assert_eq!(window.farthest_x(), 0.0);
    }

    #[test]
    fn test_segment_lookup() {
        let params = TerrainParams::default();
        let window = TerrainWindow::seeded(&params, &mut SequenceSource::constant(0.5));
        let seg = window.segment_at(30.0).unwrap();
        assert_eq!(seg.x1(), 20);
        assert_eq!(window.segment_at(20.0).unwrap().x1(), 0);
        assert!(window.segment_at(-1.0).is_none());
        assert!(window.segment_at(10_000.0).is_none());
        assert!(window.height_at(400.0).is_some());
    }

    #[test]
    fn test_one_segment_per_tick_even_after_jump() {
        let params = TerrainParams::default();
        let mut source = SequenceSource::constant(0.5);
        let mut window = TerrainWindow::seeded(&params, &mut source);

        let (emitted, evicted) = window.extend_if_needed(500.0, ExtensionPolicy::OnePerTick, &mut source);
        assert_eq!((emitted, evicted), (1, 0));
        assert_eq!(window.farthest_x(), 20.0);

        let (emitted, _) = window.extend_if_needed(-10.0, ExtensionPolicy::OnePerTick, &mut source);
        assert_eq!(emitted, 0);
    }

    #[test]
    fn test_catch_up_emits_until_marker_passes() {
        let params = TerrainParams::default();
        let mut source = SequenceSource::constant(0.5);
        let mut window = TerrainWindow::seeded(&params, &mut source);

        let (emitted, _) = window.extend_if_needed(95.0, ExtensionPolicy::CatchUp, &mut source);
        assert_eq!(emitted, 5);
        assert_eq!(window.farthest_x(), 100.0);
    }

    #[test]
    fn test_oldest_segment_evicted_past_capacity() {
        let params = TerrainParams::default();
        let mut source = SequenceSource::constant(0.5);
        let mut window = TerrainWindow::seeded(&params, &mut source);
        let capacity = window.capacity();

        let mut cam_x = 0.0;
        let mut total_evicted = 0;
        for _ in 0..200 {
            cam_x += 20.0;
            let (_, evicted) = window.extend_if_needed(cam_x, ExtensionPolicy::OnePerTick, &mut source);
            total_evicted += evicted;
            assert!(window.len() <= capacity);
        }
        assert_eq!(window.len(), capacity);
        assert_eq!(total_evicted, 41 + 200 - capacity);
    }

    #[test]
    fn test_walk_stops_at_coordinate_limit() {
        let params = TerrainParams::default();
        let mut generator = TerrainGenerator::new(&params);
        generator.last_x = i32::MAX - 10;
        let before = generator.difficulty();

        assert_eq!(generator.emit_next(&mut SequenceSource::constant(0.5)), None);
        assert_eq!(generator.last_x(), i32::MAX - 10);
        assert_eq!(generator.difficulty(), before);
    }

    #[test]
    fn test_exhausted_window_stops_streaming() {
        let params = TerrainParams::default();
        let mut source = SequenceSource::constant(0.5);
        let mut window = TerrainWindow::seeded(&params, &mut source);
        window.generator.last_x = i32::MAX - 10;
        let len = window.len();

        let (emitted, evicted) = window.extend_if_needed(500.0, ExtensionPolicy::CatchUp, &mut source);
        assert_eq!((emitted, evicted), (0, 0));
        assert_eq!(window.len(), len);
        assert_eq!(window.farthest_x(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_slope_stays_bounded(samples in prop::collection::vec(0.0f64..1.0, 1..300)) {
            let params = TerrainParams::default();
            let mut generator = TerrainGenerator::new(&params);
            let mut source = SequenceSource::new(samples.clone());
            for _ in 0..samples.len() {
                generator.emit_next(&mut source);
                prop_assert!(generator.slope() >= -1.0 && generator.slope() <= 1.0);
            }
        }

        #[test]
        fn prop_window_is_continuous(seed in any::<u64>(), ticks in 0usize..400) {
            let params = TerrainParams::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut window = TerrainWindow::seeded(&params, &mut rng);
            for i in 0..ticks {
                window.extend_if_needed(i as f64 * 7.0, ExtensionPolicy::OnePerTick, &mut rng);
                prop_assert!(window.len() <= window.capacity());
            }
            let segments: Vec<_> = window.segments().copied().collect();
            for pair in segments.windows(2) {
                prop_assert_eq!(pair[0].x2(), pair[1].x1());
                prop_assert_eq!(pair[0].y2(), pair[1].y1());
            }
        }
    }
}
