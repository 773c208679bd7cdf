//! Viewport projection: clip world geometry into a screen rectangle
//!
//! Pure queries with no simulation state. The offset is added to world
//! coordinates before clipping; for a world viewpoint `(camX, camY)` it is
//! `(-camX, camY)`.

use glam::DVec2;

use crate::sim::{Body, TerrainSegment};

/// Axis-aligned target rectangle in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub min: DVec2,
    pub max: DVec2,
}

impl ScreenRect {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min: DVec2::new(x1.min(x2), y1.min(y2)),
            max: DVec2::new(x1.max(x2), y1.max(y2)),
        }
    }

    /// Rectangle at the origin with the given size
    pub fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }
}

/// World-space geometry to project
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Segment { a: DVec2, b: DVec2 },
    Circle { center: DVec2, radius: f64 },
}

impl From<&TerrainSegment> for Shape {
    fn from(segment: &TerrainSegment) -> Self {
        Shape::Segment {
            a: segment.start(),
            b: segment.end(),
        }
    }
}

impl From<&Body> for Shape {
    fn from(body: &Body) -> Self {
        Shape::Circle {
            center: body.pos,
            radius: body.radius(),
        }
    }
}

/// Screen-space result of a visible projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projected {
    Segment { a: DVec2, b: DVec2 },
    Circle { center: DVec2, radius: f64 },
}

/// Target rectangle plus translation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub rect: ScreenRect,
    pub offset: DVec2,
}

impl Viewport {
    pub fn new(rect: ScreenRect, offset: DVec2) -> Self {
        Self { rect, offset }
    }

    /// Screen of `width`×`height` following a world viewpoint `(camX, camY)`
    pub fn following(viewpoint: DVec2, width: f64, height: f64) -> Self {
        Self::new(ScreenRect::sized(width, height), DVec2::new(-viewpoint.x, viewpoint.y))
    }

    pub fn project(&self, shape: Shape) -> Option<Projected> {
        match shape {
            Shape::Segment { a, b } => self
                .clip(a + self.offset, b + self.offset)
                .map(|(a, b)| Projected::Segment { a, b }),
            Shape::Circle { center, radius } => self.project_circle(center, radius),
        }
    }

    pub fn project_segment(&self, segment: &TerrainSegment) -> Option<Projected> {
        self.project(segment.into())
    }

    /// Translated circle, or `None` if its bounding box misses the rectangle
    pub fn project_circle(&self, center: DVec2, radius: f64) -> Option<Projected> {
        let c = center + self.offset;
        let r = self.rect;
        if c.x + radius < r.min.x || c.x - radius > r.max.x || c.y + radius < r.min.y || c.y - radius > r.max.y {
            return None;
        }
        Some(Projected::Circle { center: c, radius })
    }

    pub fn project_body(&self, body: &Body) -> Option<Projected> {
        self.project(body.into())
    }

    /// Liang–Barsky clipping of the screen-space segment `a`→`b`
    fn clip(&self, a: DVec2, b: DVec2) -> Option<(DVec2, DVec2)> {
        let d = b - a;
        let r = self.rect;
        let edges = [
            (-d.x, a.x - r.min.x),
            (d.x, r.max.x - a.x),
            (-d.y, a.y - r.min.y),
            (d.y, r.max.y - a.y),
        ];

        let (mut t0, mut t1) = (0.0f64, 1.0f64);
        for (p, q) in edges {
            if p == 0.0 {
                // Parallel to this edge: reject if outside it
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let t = q / p;
            if p < 0.0 {
                if t > t1 {
                    return None;
                }
                t0 = t0.max(t);
            } else {
                if t < t0 {
                    return None;
                }
                t1 = t1.min(t);
            }
        }
        Some((a + d * t0, a + d * t1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn screen() -> Viewport {
        Viewport::new(ScreenRect::sized(800.0, 600.0), DVec2::ZERO)
    }

    fn segment(a: (f64, f64), b: (f64, f64)) -> Shape {
        Shape::Segment {
            a: DVec2::new(a.0, a.1),
            b: DVec2::new(b.0, b.1),
        }
    }

    #[test]
    fn test_inside_segment_only_translated() {
        let vp = Viewport::new(ScreenRect::sized(800.0, 600.0), DVec2::new(-100.0, 50.0));
        let projected = vp.project(segment((200.0, 100.0), (300.0, 200.0)));
        assert_eq!(
            projected,
            Some(Projected::Segment {
                a: DVec2::new(100.0, 150.0),
                b: DVec2::new(200.0, 250.0),
            })
        );
    }

    #[test]
    fn test_segment_clipped_at_left_edge() {
        let projected = screen().project(segment((-100.0, 300.0), (100.0, 100.0)));
        let Some(Projected::Segment { a, b }) = projected else {
            panic!("expected a visible segment");
        };
        assert!((a - DVec2::new(0.0, 200.0)).length() < 1e-9);
        assert_eq!(b, DVec2::new(100.0, 100.0));
    }

    #[test]
    fn test_segment_clipped_on_both_ends() {
        let projected = screen().project(segment((-200.0, 300.0), (1000.0, 300.0)));
        let Some(Projected::Segment { a, b }) = projected else {
            panic!("expected a visible segment");
        };
        assert!((a - DVec2::new(0.0, 300.0)).length() < 1e-9);
        assert!((b - DVec2::new(800.0, 300.0)).length() < 1e-9);
    }

    #[test]
    fn test_offscreen_segments_rejected() {
        assert_eq!(screen().project(segment((-50.0, 10.0), (-10.0, 20.0))), None);
        assert_eq!(screen().project(segment((100.0, 700.0), (300.0, 650.0))), None);
        // Crosses the corner region without entering
        assert_eq!(screen().project(segment((-100.0, 50.0), (50.0, -100.0))), None);
    }

    #[test]
    fn test_circle_bounding_box_rejection() {
        let vp = screen();
        assert_eq!(
            vp.project_circle(DVec2::new(-15.0, 300.0), 20.0),
            Some(Projected::Circle {
                center: DVec2::new(-15.0, 300.0),
                radius: 20.0,
            })
        );
        assert_eq!(vp.project_circle(DVec2::new(-25.0, 300.0), 20.0), None);
        assert_eq!(vp.project_circle(DVec2::new(400.0, 625.0), 20.0), None);
    }

    #[test]
    fn test_following_centres_viewpoint() {
        // camX = mean.x - 200, camY = -mean.y + 300
        let mean = DVec2::new(1000.0, 450.0);
        let vp = Viewport::following(DVec2::new(mean.x - 200.0, -mean.y + 300.0), 800.0, 600.0);
        assert_eq!(
            vp.project_circle(mean, 20.0),
            Some(Projected::Circle {
                center: DVec2::new(200.0, 300.0),
                radius: 20.0,
            })
        );
    }

    #[test]
    fn test_terrain_and_body_conversions() {
        let vp = screen();
        let seg = TerrainSegment::new(0, 300, 20, 310).unwrap();
        assert!(matches!(vp.project_segment(&seg), Some(Projected::Segment { .. })));
        let body = Body::new(10.0, 290.0, 20.0).unwrap();
        assert!(matches!(vp.project_body(&body), Some(Projected::Circle { .. })));
    }

    proptest! {
        #[test]
        fn prop_projection_is_pure_and_inside(
            ax in -500.0f64..1300.0, ay in -500.0f64..1100.0,
            bx in -500.0f64..1300.0, by in -500.0f64..1100.0,
            ox in -200.0f64..200.0, oy in -200.0f64..200.0,
        ) {
            let vp = Viewport::new(ScreenRect::sized(800.0, 600.0), DVec2::new(ox, oy));
            let shape = segment((ax, ay), (bx, by));
            let first = vp.project(shape);
            prop_assert_eq!(first, vp.project(shape));

            if let Some(Projected::Segment { a, b }) = first {
                for p in [a, b] {
                    prop_assert!(p.x >= -1e-9 && p.x <= 800.0 + 1e-9);
                    prop_assert!(p.y >= -1e-9 && p.y <= 600.0 + 1e-9);
                }
            }
        }
    }
}
