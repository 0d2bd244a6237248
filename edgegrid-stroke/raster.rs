use edgegrid_core::{Point, Segment};

/// Rasterize a segment into the 8-connected pixels covering it.
///
/// Integer-only Bresenham stepping along the major axis. The walk always
/// starts from the endpoint with the smaller major-axis coordinate so that a
/// segment and its reverse cover the same pixels; the result is then returned
/// in drawing order (`start` first, `end` last).
pub fn rasterize(segment: Segment) -> Vec<Point> {
    let Segment { start, end } = segment;
    let dx = (end.x - start.x).abs();
    let dy = (end.y - start.y).abs();
    let x_major = dx >= dy;

    let flipped = if x_major { start.x > end.x } else { start.y > end.y };
    let (from, to) = if flipped { (end, start) } else { (start, end) };

    let mut points = if x_major {
        walk(from.x, from.y, to.y, dx, dy, |major, minor| Point::new(major, minor))
    } else {
        walk(from.y, from.x, to.x, dy, dx, |major, minor| Point::new(minor, major))
    };

    if flipped {
        points.reverse();
    }
    points
}

/// Pixel count of the rasterized segment: `max(|dx|, |dy|) + 1`
pub fn rasterized_len(segment: Segment) -> usize {
    let dx = (segment.end.x - segment.start.x).unsigned_abs();
    let dy = (segment.end.y - segment.start.y).unsigned_abs();
    dx.max(dy) as usize + 1
}

/// Step `d_major + 1` times along the (increasing) major axis, moving the
/// minor axis towards `minor_end` whenever the decision value turns positive.
fn walk<F>(major_start: i32, minor_start: i32, minor_end: i32, d_major: i32, d_minor: i32, to_point: F) -> Vec<Point>
where
    F: Fn(i32, i32) -> Point,
{
    let step = if minor_end >= minor_start { 1 } else { -1 };
    let mut points = Vec::with_capacity(d_major as usize + 1);

    let mut err = 2 * d_minor - d_major;
    let mut minor = minor_start;
    for k in 0..=d_major {
        points.push(to_point(major_start + k, minor));
        if err > 0 {
            minor += step;
            err -= 2 * d_major;
        }
        err += 2 * d_minor;
    }
    points
}
