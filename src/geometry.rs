use serde::{Deserialize, Serialize};

const SEGMENT_EPS: f64 = 1e-9;
const EDGE_POINT_BIAS: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle given by its top-left corner and extent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn centered(center: Point, size: Size) -> Self {
        Self {
            x: center.x - size.width * 0.5,
            y: center.y - size.height * 0.5,
            width: size.width,
            height: size.height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        overlap_area(self, other) > 0.0
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Rect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }
}

pub fn overlap_area(a: &Rect, b: &Rect) -> f64 {
    let x0 = a.x.max(b.x);
    let y0 = a.y.max(b.y);
    let x1 = a.right().min(b.right());
    let y1 = a.bottom().min(b.bottom());
    let w = (x1 - x0).max(0.0);
    let h = (y1 - y0).max(0.0);
    w * h
}

/// Bounding box of all rectangles, `None` for an empty input.
pub fn bounding_box<I>(rects: I) -> Option<Rect>
where
    I: IntoIterator<Item = Rect>,
{
    rects.into_iter().reduce(|acc, rect| acc.union(&rect))
}

fn orient(a: Point, b: Point, c: Point) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: Point, b: Point, c: Point) -> bool {
    c.x >= a.x.min(b.x) - SEGMENT_EPS
        && c.x <= a.x.max(b.x) + SEGMENT_EPS
        && c.y >= a.y.min(b.y) - SEGMENT_EPS
        && c.y <= a.y.max(b.y) + SEGMENT_EPS
}

/// True when segment `a-b` touches or crosses segment `c-d`.
pub fn segments_intersect(a: Point, b: Point, c: Point, d: Point) -> bool {
    let o1 = orient(a, b, c);
    let o2 = orient(a, b, d);
    let o3 = orient(c, d, a);
    let o4 = orient(c, d, b);
    if (o1 > SEGMENT_EPS && o2 < -SEGMENT_EPS || o1 < -SEGMENT_EPS && o2 > SEGMENT_EPS)
        && (o3 > SEGMENT_EPS && o4 < -SEGMENT_EPS || o3 < -SEGMENT_EPS && o4 > SEGMENT_EPS)
    {
        return true;
    }
    if o1.abs() <= SEGMENT_EPS && on_segment(a, b, c) {
        return true;
    }
    if o2.abs() <= SEGMENT_EPS && on_segment(a, b, d) {
        return true;
    }
    if o3.abs() <= SEGMENT_EPS && on_segment(c, d, a) {
        return true;
    }
    if o4.abs() <= SEGMENT_EPS && on_segment(c, d, b) {
        return true;
    }
    false
}

/// A connection point on a node outline, relative to the node center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdgePoint {
    pub location: Point,
    pub is_corner: bool,
}

/// Corners and side midpoints of a node box. Midpoints sit slightly outside
/// the outline so a corner wins ties against its neighbouring midpoint.
pub fn edge_points(size: Size) -> [EdgePoint; 8] {
    let w2 = size.width * 0.5;
    let h2 = size.height * 0.5;
    let point = |x, y, is_corner| EdgePoint {
        location: Point::new(x, y),
        is_corner,
    };
    [
        point(-w2, h2, true),
        point(0.0, h2 + EDGE_POINT_BIAS, false),
        point(w2, h2, true),
        point(w2 + EDGE_POINT_BIAS, 0.0, false),
        point(w2, -h2, true),
        point(0.0, -h2 - EDGE_POINT_BIAS, false),
        point(-w2, -h2, true),
        point(-w2 - EDGE_POINT_BIAS, 0.0, false),
    ]
}

/// Closest pair of connection points between two placed boxes, returned in
/// absolute coordinates.
pub fn nearest_edge_points(
    center0: Point,
    size0: Size,
    center1: Point,
    size1: Size,
) -> (Point, Point) {
    let mut best = f64::MAX;
    let mut best_pair = (center0, center1);
    for p0 in edge_points(size0) {
        let a = center0.offset(p0.location.x, p0.location.y);
        for p1 in edge_points(size1) {
            let b = center1.offset(p1.location.x, p1.location.y);
            let dx = a.x - b.x;
            let dy = a.y - b.y;
            let distance = dx * dx + dy * dy;
            if distance < best {
                best = distance;
                best_pair = (a, b);
            }
        }
    }
    best_pair
}
