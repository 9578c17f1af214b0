use geo::{BoundingRect, Contains, MultiPolygon, Point, Rect};
use rand::{Rng, rngs::StdRng};
use rstar::{AABB, RTree, primitives::Line};

use crate::dots::error::DotsError;

/// Point-in-polygon capability used by the sampler.
///
/// Injected rather than looked up globally so callers can swap the spatial
/// index for a plain predicate (or a mock) without touching the loop.
pub trait Containment {
    fn contains_xy(&self, x: f64, y: f64) -> bool;
}

/// Reference predicate, used as the oracle in tests.
impl Containment for MultiPolygon<f64> {
    fn contains_xy(&self, x: f64, y: f64) -> bool {
        self.contains(&Point::new(x, y))
    }
}

/// R-tree over every ring edge of a multipolygon, answering containment by
/// horizontal-ray crossing parity. Only edges whose envelope meets the ray
/// are visited, so a test costs O(log E + hits) instead of O(E); the
/// rejection loop below may call this millions of times per run.
#[derive(Debug)]
pub struct EdgeIndex {
    tree: RTree<Line<[f64; 2]>>,
    east: f64,
}

impl EdgeIndex {
    pub fn new(geometry: &MultiPolygon<f64>) -> Self {
        let mut edges = Vec::new();
        for polygon in &geometry.0 {
            for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
                for pair in ring.0.windows(2) {
                    edges.push(Line::new([pair[0].x, pair[0].y], [pair[1].x, pair[1].y]));
                }
            }
        }
        let east = geometry
            .bounding_rect()
            .map_or(0.0, |bounds| bounds.max().x);
        Self { tree: RTree::bulk_load(edges), east }
    }
}

impl Containment for EdgeIndex {
    fn contains_xy(&self, x: f64, y: f64) -> bool {
        // Any edge crossed by the rightward ray from (x, y) has an envelope
        // intersecting the ray segment out to the east bound.
        let ray = AABB::from_corners([x, y], [self.east, y]);
        let mut inside = false;
        for edge in self.tree.locate_in_envelope_intersecting(&ray) {
            let [ax, ay] = edge.from;
            let [bx, by] = edge.to;
            if (ay > y) != (by > y) {
                let crossing = ax + (y - ay) / (by - ay) * (bx - ax);
                if x < crossing {
                    inside = !inside;
                }
            }
        }
        inside
    }
}

/// Tuning for the rejection loop.
#[derive(Debug, Clone, Copy)]
pub struct SamplerConfig {
    /// Total candidate-draw budget, per requested point. Exceeding
    /// `max_draws_per_point * n` draws aborts with `SamplingStalled`.
    pub max_draws_per_point: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self { max_draws_per_point: 10_000 }
    }
}

/// Lazily yields exactly `n` points uniformly distributed inside a polygon.
///
/// Candidates are drawn uniformly on the half-open bounding box
/// `[west, east) x [south, north)` in batches sized to the number of points
/// still needed, and filtered through the containment predicate.
///
/// Performance hazard: the expected draw count is `n * bbox_area / area`,
/// so a polygon tiny relative to its bounding box rejects almost every
/// candidate. The draw budget turns that pathology into a
/// `SamplingStalled` error item, after which the iterator is fused.
#[derive(Debug)]
pub struct RejectionSampler<C: Containment = EdgeIndex> {
    index: C,
    bounds: Rect<f64>,
    needed: u64,
    remaining: u64,
    batch: Vec<(f64, f64)>,
    pos: usize,
    rng: StdRng,
    drawn: u64,
    budget: u64,
    stalled: bool,
}

impl RejectionSampler<EdgeIndex> {
    /// Sampler over `geometry` with the edge-index predicate.
    ///
    /// `n = 0` succeeds for any geometry, including an empty one. For
    /// `n > 0` an empty or zero-extent geometry is rejected up front.
    pub fn new(
        geometry: &MultiPolygon<f64>,
        n: u64,
        rng: StdRng,
        config: &SamplerConfig,
    ) -> Result<Self, DotsError> {
        if n == 0 {
            let bounds = Rect::new((0.0, 0.0), (0.0, 0.0));
            return Ok(Self::with_containment(EdgeIndex::new(geometry), bounds, 0, rng, config));
        }
        let bounds = geometry.bounding_rect().ok_or(DotsError::DegenerateGeometry)?;
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return Err(DotsError::DegenerateGeometry);
        }
        Ok(Self::with_containment(EdgeIndex::new(geometry), bounds, n, rng, config))
    }
}

impl<C: Containment> RejectionSampler<C> {
    /// Sampler with an explicit containment predicate and bounding box.
    pub fn with_containment(
        index: C,
        bounds: Rect<f64>,
        n: u64,
        rng: StdRng,
        config: &SamplerConfig,
    ) -> Self {
        Self {
            index,
            bounds,
            needed: n,
            remaining: n,
            batch: Vec::new(),
            pos: 0,
            rng,
            drawn: 0,
            budget: config.max_draws_per_point.saturating_mul(n),
            stalled: false,
        }
    }

    /// Draw one batch of candidates, sized to the points still needed but
    /// capped to the remaining draw budget.
    fn draw_batch(&mut self) {
        let size = self.remaining.min(self.budget - self.drawn) as usize;
        let (min, max) = (self.bounds.min(), self.bounds.max());
        self.batch.clear();
        self.pos = 0;
        for _ in 0..size {
            self.batch.push((
                self.rng.random_range(min.x..max.x),
                self.rng.random_range(min.y..max.y),
            ));
        }
        self.drawn += size as u64;
    }
}

impl<C: Containment> Iterator for RejectionSampler<C> {
    type Item = Result<(f64, f64), DotsError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 || self.stalled {
            return None;
        }
        loop {
            while self.pos < self.batch.len() {
                let (x, y) = self.batch[self.pos];
                self.pos += 1;
                if self.index.contains_xy(x, y) {
                    self.remaining -= 1;
                    return Some(Ok((x, y)));
                }
            }
            if self.drawn >= self.budget {
                self.stalled = true;
                return Some(Err(DotsError::SamplingStalled {
                    drawn: self.drawn,
                    accepted: self.needed - self.remaining,
                    needed: self.needed,
                }));
            }
            self.draw_batch();
        }
    }
}

/// Sample exactly `n` uniform interior points of `geometry`.
pub fn sample_points(
    geometry: &MultiPolygon<f64>,
    n: u64,
    rng: StdRng,
    config: &SamplerConfig,
) -> Result<RejectionSampler<EdgeIndex>, DotsError> {
    RejectionSampler::new(geometry, n, rng, config)
}
