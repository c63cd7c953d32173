//! Fill and stroke expansion
//!
//! Turns the flattened polylines in the [`PathCache`] into triangle fans
//! (fills) and triangle strips (strokes and anti-aliasing fringes). The
//! vertex (u, v) channel carries coverage: u runs 0..1 across the stroke or
//! fringe and 0.5 marks fully-covered interior.

use std::f32::consts::PI;

use vexel_core::geometry::normalize;

use crate::backend::{Vertex, VertexRange};
use crate::cache::{PathCache, PathPoint, PointFlags};
use crate::state::{LineCap, LineJoin};

/// Number of segments for a round join or cap spanning `arc` radians at
/// radius `r`, such that the chord error stays within `tol`.
pub(crate) fn curve_divs(r: f32, arc: f32, tol: f32) -> usize {
    let da = (r / (r + tol)).acos() * 2.0;
    ((arc / da).ceil() as usize).max(2)
}

/// Classifies every join: computes extrusion bisectors, marks left turns,
/// picks miter or bevel per the limit, and counts bevels per path. Also
/// decides per-path convexity, which gates the stencil-free fill fast path.
pub(crate) fn calculate_joins(cache: &mut PathCache, w: f32, line_join: LineJoin, miter_limit: f32) {
    let iw = if w > 0.0 { 1.0 / w } else { 0.0 };

    for i in 0..cache.paths.len() {
        let path = cache.paths[i];
        let pts = &mut cache.points[path.first..path.first + path.count];
        let count = path.count;
        let mut nleft = 0;
        let mut nbevel = 0;

        let mut i0 = count.wrapping_sub(1);
        for i1 in 0..count {
            let p0 = pts[i0];
            let p1 = &mut pts[i1];

            let dlx0 = p0.dy;
            let dly0 = -p0.dx;
            let dlx1 = p1.dy;
            let dly1 = -p1.dx;

            // Extrusion along the join bisector, scaled so that extruding by
            // the half width lands on the miter point. Near-reversals cap
            // the scale to keep the miter finite.
            p1.dmx = (dlx0 + dlx1) * 0.5;
            p1.dmy = (dly0 + dly1) * 0.5;
            let dmr2 = p1.dmx * p1.dmx + p1.dmy * p1.dmy;
            if dmr2 > 0.000001 {
                let scale = (1.0 / dmr2).min(600.0);
                p1.dmx *= scale;
                p1.dmy *= scale;
            }

            // Clear flags but keep the corner bit.
            p1.flags &= PointFlags::CORNER;

            let cross = p1.dx * p0.dy - p0.dx * p1.dy;
            if cross > 0.0 {
                nleft += 1;
                p1.flags |= PointFlags::LEFT;
            }

            // Inner join: bevel when the miter point would fall past the
            // shorter adjacent segment.
            let limit = (p0.len.min(p1.len) * iw).max(1.01);
            if dmr2 * limit * limit < 1.0 {
                p1.flags |= PointFlags::INNER_BEVEL;
            }

            if p1.flags.contains(PointFlags::CORNER)
                && (dmr2 * miter_limit * miter_limit < 1.0
                    || line_join == LineJoin::Bevel
                    || line_join == LineJoin::Round)
            {
                p1.flags |= PointFlags::BEVEL;
            }

            if p1.flags.intersects(PointFlags::BEVEL | PointFlags::INNER_BEVEL) {
                nbevel += 1;
            }

            i0 = i1;
        }

        cache.paths[i].nbevel = nbevel;
        cache.paths[i].convex = nleft == count;
    }
}

fn vset(verts: &mut Vec<Vertex>, x: f32, y: f32, u: f32, v: f32) {
    verts.push(Vertex::new(x, y, u, v));
}

/// The two outer attachment points for a join: the bevel edge normals when
/// the inner side is beveled, the shared miter point otherwise.
fn choose_bevel(bevel: bool, p0: PathPoint, p1: PathPoint, w: f32) -> (f32, f32, f32, f32) {
    if bevel {
        (
            p1.x + p0.dy * w,
            p1.y - p0.dx * w,
            p1.x + p1.dy * w,
            p1.y - p1.dx * w,
        )
    } else {
        (
            p1.x + p1.dmx * w,
            p1.y + p1.dmy * w,
            p1.x + p1.dmx * w,
            p1.y + p1.dmy * w,
        )
    }
}

#[allow(clippy::too_many_arguments)]
fn round_join(
    verts: &mut Vec<Vertex>,
    p0: PathPoint,
    p1: PathPoint,
    lw: f32,
    rw: f32,
    lu: f32,
    ru: f32,
    ncap: usize,
) {
    let dlx0 = p0.dy;
    let dly0 = -p0.dx;
    let dlx1 = p1.dy;
    let dly1 = -p1.dx;
    let inner = p1.flags.contains(PointFlags::INNER_BEVEL);

    if p1.flags.contains(PointFlags::LEFT) {
        let (lx0, ly0, lx1, ly1) = choose_bevel(inner, p0, p1, lw);
        let a0 = (-dly0).atan2(-dlx0);
        let mut a1 = (-dly1).atan2(-dlx1);
        if a1 > a0 {
            a1 -= PI * 2.0;
        }

        vset(verts, lx0, ly0, lu, 1.0);
        vset(verts, p1.x - dlx0 * rw, p1.y - dly0 * rw, ru, 1.0);

        let n = ((((a0 - a1) / PI) * ncap as f32).ceil() as usize).clamp(2, ncap);
        for i in 0..n {
            let u = i as f32 / (n - 1) as f32;
            let a = a0 + u * (a1 - a0);
            let rx = p1.x + a.cos() * rw;
            let ry = p1.y + a.sin() * rw;
            vset(verts, p1.x, p1.y, 0.5, 1.0);
            vset(verts, rx, ry, ru, 1.0);
        }

        vset(verts, lx1, ly1, lu, 1.0);
        vset(verts, p1.x - dlx1 * rw, p1.y - dly1 * rw, ru, 1.0);
    } else {
        let (rx0, ry0, rx1, ry1) = choose_bevel(inner, p0, p1, -rw);
        let a0 = dly0.atan2(dlx0);
        let mut a1 = dly1.atan2(dlx1);
        if a1 < a0 {
            a1 += PI * 2.0;
        }

        vset(verts, p1.x + dlx0 * rw, p1.y + dly0 * rw, lu, 1.0);
        vset(verts, rx0, ry0, ru, 1.0);

        let n = ((((a1 - a0) / PI) * ncap as f32).ceil() as usize).clamp(2, ncap);
        for i in 0..n {
            let u = i as f32 / (n - 1) as f32;
            let a = a0 + u * (a1 - a0);
            let lx = p1.x + a.cos() * lw;
            let ly = p1.y + a.sin() * lw;
            vset(verts, lx, ly, lu, 1.0);
            vset(verts, p1.x, p1.y, 0.5, 1.0);
        }

        vset(verts, p1.x + dlx1 * rw, p1.y + dly1 * rw, lu, 1.0);
        vset(verts, rx1, ry1, ru, 1.0);
    }
}

#[allow(clippy::too_many_arguments)]
fn bevel_join(
    verts: &mut Vec<Vertex>,
    p0: PathPoint,
    p1: PathPoint,
    lw: f32,
    rw: f32,
    lu: f32,
    ru: f32,
) {
    let dlx0 = p0.dy;
    let dly0 = -p0.dx;
    let dlx1 = p1.dy;
    let dly1 = -p1.dx;
    let inner = p1.flags.contains(PointFlags::INNER_BEVEL);

    if p1.flags.contains(PointFlags::LEFT) {
        let (lx0, ly0, lx1, ly1) = choose_bevel(inner, p0, p1, lw);

        vset(verts, lx0, ly0, lu, 1.0);
        vset(verts, p1.x - dlx0 * rw, p1.y - dly0 * rw, ru, 1.0);

        if p1.flags.contains(PointFlags::BEVEL) {
            vset(verts, lx0, ly0, lu, 1.0);
            vset(verts, p1.x - dlx0 * rw, p1.y - dly0 * rw, ru, 1.0);

            vset(verts, lx1, ly1, lu, 1.0);
            vset(verts, p1.x - dlx1 * rw, p1.y - dly1 * rw, ru, 1.0);
        } else {
            let rx0 = p1.x - p1.dmx * rw;
            let ry0 = p1.y - p1.dmy * rw;

            vset(verts, p1.x, p1.y, 0.5, 1.0);
            vset(verts, p1.x - dlx0 * rw, p1.y - dly0 * rw, ru, 1.0);

            vset(verts, rx0, ry0, ru, 1.0);
            vset(verts, rx0, ry0, ru, 1.0);

            vset(verts, p1.x, p1.y, 0.5, 1.0);
            vset(verts, p1.x - dlx1 * rw, p1.y - dly1 * rw, ru, 1.0);
        }

        vset(verts, lx1, ly1, lu, 1.0);
        vset(verts, p1.x - dlx1 * rw, p1.y - dly1 * rw, ru, 1.0);
    } else {
        let (rx0, ry0, rx1, ry1) = choose_bevel(inner, p0, p1, -rw);

        vset(verts, p1.x + dlx0 * lw, p1.y + dly0 * lw, lu, 1.0);
        vset(verts, rx0, ry0, ru, 1.0);

        if p1.flags.contains(PointFlags::BEVEL) {
            vset(verts, p1.x + dlx0 * lw, p1.y + dly0 * lw, lu, 1.0);
            vset(verts, rx0, ry0, ru, 1.0);

            vset(verts, p1.x + dlx1 * lw, p1.y + dly1 * lw, lu, 1.0);
            vset(verts, rx1, ry1, ru, 1.0);
        } else {
            let lx0 = p1.x + p1.dmx * lw;
            let ly0 = p1.y + p1.dmy * lw;

            vset(verts, p1.x + dlx0 * lw, p1.y + dly0 * lw, lu, 1.0);
            vset(verts, p1.x, p1.y, 0.5, 1.0);

            vset(verts, lx0, ly0, lu, 1.0);
            vset(verts, lx0, ly0, lu, 1.0);

            vset(verts, p1.x + dlx1 * lw, p1.y + dly1 * lw, lu, 1.0);
            vset(verts, p1.x, p1.y, 0.5, 1.0);
        }

        vset(verts, p1.x + dlx1 * lw, p1.y + dly1 * lw, lu, 1.0);
        vset(verts, rx1, ry1, ru, 1.0);
    }
}

#[allow(clippy::too_many_arguments)]
fn butt_cap_start(
    verts: &mut Vec<Vertex>,
    p: PathPoint,
    dx: f32,
    dy: f32,
    w: f32,
    d: f32,
    aa: f32,
    u0: f32,
    u1: f32,
) {
    let px = p.x - dx * d;
    let py = p.y - dy * d;
    let dlx = dy;
    let dly = -dx;
    vset(verts, px + dlx * w - dx * aa, py + dly * w - dy * aa, u0, 0.0);
    vset(verts, px - dlx * w - dx * aa, py - dly * w - dy * aa, u1, 0.0);
    vset(verts, px + dlx * w, py + dly * w, u0, 1.0);
    vset(verts, px - dlx * w, py - dly * w, u1, 1.0);
}

#[allow(clippy::too_many_arguments)]
fn butt_cap_end(
    verts: &mut Vec<Vertex>,
    p: PathPoint,
    dx: f32,
    dy: f32,
    w: f32,
    d: f32,
    aa: f32,
    u0: f32,
    u1: f32,
) {
    let px = p.x + dx * d;
    let py = p.y + dy * d;
    let dlx = dy;
    let dly = -dx;
    vset(verts, px + dlx * w, py + dly * w, u0, 1.0);
    vset(verts, px - dlx * w, py - dly * w, u1, 1.0);
    vset(verts, px + dlx * w + dx * aa, py + dly * w + dy * aa, u0, 0.0);
    vset(verts, px - dlx * w + dx * aa, py - dly * w + dy * aa, u1, 0.0);
}

#[allow(clippy::too_many_arguments)]
fn round_cap_start(
    verts: &mut Vec<Vertex>,
    p: PathPoint,
    dx: f32,
    dy: f32,
    w: f32,
    ncap: usize,
    u0: f32,
    u1: f32,
) {
    let dlx = dy;
    let dly = -dx;
    for i in 0..ncap {
        let a = i as f32 / (ncap - 1) as f32 * PI;
        let ax = a.cos() * w;
        let ay = a.sin() * w;
        vset(verts, p.x - dlx * ax - dx * ay, p.y - dly * ax - dy * ay, u0, 1.0);
        vset(verts, p.x, p.y, 0.5, 1.0);
    }
    vset(verts, p.x + dlx * w, p.y + dly * w, u0, 1.0);
    vset(verts, p.x - dlx * w, p.y - dly * w, u1, 1.0);
}

#[allow(clippy::too_many_arguments)]
fn round_cap_end(
    verts: &mut Vec<Vertex>,
    p: PathPoint,
    dx: f32,
    dy: f32,
    w: f32,
    ncap: usize,
    u0: f32,
    u1: f32,
) {
    let dlx = dy;
    let dly = -dx;
    vset(verts, p.x + dlx * w, p.y + dly * w, u0, 1.0);
    vset(verts, p.x - dlx * w, p.y - dly * w, u1, 1.0);
    for i in 0..ncap {
        let a = i as f32 / (ncap - 1) as f32 * PI;
        let ax = a.cos() * w;
        let ay = a.sin() * w;
        vset(verts, p.x, p.y, 0.5, 1.0);
        vset(verts, p.x - dlx * ax + dx * ay, p.y - dly * ax + dy * ay, u0, 1.0);
    }
}

/// Expands every cached path into a stroke strip. `w` is the half width
/// (already including half the fringe); `fringe` is the anti-aliasing band,
/// zero when anti-aliasing is off.
pub(crate) fn expand_stroke(
    cache: &mut PathCache,
    mut w: f32,
    fringe: f32,
    line_cap: LineCap,
    line_join: LineJoin,
    miter_limit: f32,
    tess_tol: f32,
) {
    let aa = fringe;
    // Divisions per half circle for round joins and caps.
    let ncap = curve_divs(w, PI, tess_tol);

    w += aa * 0.5;

    // Without anti-aliasing the coverage gradient collapses to solid.
    let (u0, u1) = if aa == 0.0 { (0.5, 0.5) } else { (0.0, 1.0) };

    calculate_joins(cache, w, line_join, miter_limit);

    // Conservative vertex budget so the buffer grows once, not per push.
    let mut cverts = 0;
    for path in &cache.paths {
        if line_join == LineJoin::Round {
            cverts += (path.count + path.nbevel * (ncap + 2) + 1) * 2;
        } else {
            cverts += (path.count + path.nbevel * 5 + 1) * 2;
        }
        if !path.closed {
            if line_cap == LineCap::Round {
                cverts += (ncap * 2 + 2) * 2;
            } else {
                cverts += (3 + 3) * 2;
            }
        }
    }

    cache.verts.clear();
    cache.verts.reserve(cverts);

    for i in 0..cache.paths.len() {
        let path = cache.paths[i];
        cache.paths[i].fill = None;

        // A lone move-to has nothing to stroke.
        if path.count < 2 {
            cache.paths[i].stroke = None;
            continue;
        }

        let pts = &cache.points[path.first..path.first + path.count];
        let count = path.count;
        let verts = &mut cache.verts;
        let start = verts.len();

        let looped = path.closed;
        let (s, e, mut i0, mut i1) = if looped {
            (0, count, count - 1, 0)
        } else {
            (1, count - 1, 0, 1)
        };

        if !looped {
            let p0 = pts[0];
            let p1 = pts[1];
            let mut dx = p1.x - p0.x;
            let mut dy = p1.y - p0.y;
            normalize(&mut dx, &mut dy);
            match line_cap {
                LineCap::Butt => butt_cap_start(verts, p0, dx, dy, w, -aa * 0.5, aa, u0, u1),
                LineCap::Square => butt_cap_start(verts, p0, dx, dy, w, w - aa, aa, u0, u1),
                LineCap::Round => round_cap_start(verts, p0, dx, dy, w, ncap, u0, u1),
            }
        }

        for _ in s..e {
            let p0 = pts[i0];
            let p1 = pts[i1];
            if p1.flags.intersects(PointFlags::BEVEL | PointFlags::INNER_BEVEL) {
                if line_join == LineJoin::Round {
                    round_join(verts, p0, p1, w, w, u0, u1, ncap);
                } else {
                    bevel_join(verts, p0, p1, w, w, u0, u1);
                }
            } else {
                vset(verts, p1.x + p1.dmx * w, p1.y + p1.dmy * w, u0, 1.0);
                vset(verts, p1.x - p1.dmx * w, p1.y - p1.dmy * w, u1, 1.0);
            }
            i0 = i1;
            i1 += 1;
        }

        if looped {
            // Wrap the strip back to its first two vertices.
            let (x0, y0) = (verts[start].x, verts[start].y);
            let (x1, y1) = (verts[start + 1].x, verts[start + 1].y);
            vset(verts, x0, y0, u0, 1.0);
            vset(verts, x1, y1, u1, 1.0);
        } else {
            let p0 = pts[i0];
            let p1 = pts[i1];
            let mut dx = p1.x - p0.x;
            let mut dy = p1.y - p0.y;
            normalize(&mut dx, &mut dy);
            match line_cap {
                LineCap::Butt => butt_cap_end(verts, p1, dx, dy, w, -aa * 0.5, aa, u0, u1),
                LineCap::Square => butt_cap_end(verts, p1, dx, dy, w, w - aa, aa, u0, u1),
                LineCap::Round => round_cap_end(verts, p1, dx, dy, w, ncap, u0, u1),
            }
        }

        cache.paths[i].stroke = Some(VertexRange {
            offset: start,
            len: verts.len() - start,
        });
    }
}

/// Expands every cached path into a fill fan plus, when `w > 0`, an
/// anti-aliasing fringe strip. The fill is inset by half the fringe so fan
/// and fringe together cover exactly the shape.
pub(crate) fn expand_fill(
    cache: &mut PathCache,
    w: f32,
    line_join: LineJoin,
    miter_limit: f32,
    fringe_width: f32,
) {
    let aa = fringe_width;
    let fringe = w > 0.0;

    calculate_joins(cache, w, line_join, miter_limit);

    let mut cverts = 0;
    for path in &cache.paths {
        cverts += path.count + path.nbevel + 1;
        if fringe {
            cverts += (path.count + path.nbevel * 5 + 1) * 2;
        }
    }

    cache.verts.clear();
    cache.verts.reserve(cverts);

    // A single convex path can be drawn without stenciling.
    let convex = cache.paths.len() == 1 && cache.paths[0].convex;

    for i in 0..cache.paths.len() {
        let path = cache.paths[i];
        let pts = &cache.points[path.first..path.first + path.count];
        let count = path.count;
        let woff = 0.5 * aa;
        let verts = &mut cache.verts;
        let fill_start = verts.len();

        if fringe {
            let mut i0 = count - 1;
            for i1 in 0..count {
                let p0 = pts[i0];
                let p1 = pts[i1];
                if p1.flags.contains(PointFlags::BEVEL) {
                    let dlx0 = p0.dy;
                    let dly0 = -p0.dx;
                    let dlx1 = p1.dy;
                    let dly1 = -p1.dx;
                    if p1.flags.contains(PointFlags::LEFT) {
                        let lx = p1.x + p1.dmx * woff;
                        let ly = p1.y + p1.dmy * woff;
                        vset(verts, lx, ly, 0.5, 1.0);
                    } else {
                        vset(verts, p1.x + dlx0 * woff, p1.y + dly0 * woff, 0.5, 1.0);
                        vset(verts, p1.x + dlx1 * woff, p1.y + dly1 * woff, 0.5, 1.0);
                    }
                } else {
                    vset(verts, p1.x + p1.dmx * woff, p1.y + p1.dmy * woff, 0.5, 1.0);
                }
                i0 = i1;
            }
        } else {
            for p in pts.iter().take(count) {
                vset(verts, p.x, p.y, 0.5, 1.0);
            }
        }

        cache.paths[i].fill = Some(VertexRange {
            offset: fill_start,
            len: verts.len() - fill_start,
        });

        if fringe {
            let mut lw = w + woff;
            let rw = w - woff;
            let mut lu = 0.0;
            let ru = 1.0;
            let stroke_start = verts.len();

            // Half a fringe for convex shapes: the inner edge coincides
            // with the fill inset and fades from the middle.
            if convex {
                lw = woff;
                lu = 0.5;
            }

            let mut i0 = count - 1;
            for i1 in 0..count {
                let p0 = pts[i0];
                let p1 = pts[i1];
                if p1.flags.intersects(PointFlags::BEVEL | PointFlags::INNER_BEVEL) {
                    bevel_join(verts, p0, p1, lw, rw, lu, ru);
                } else {
                    vset(verts, p1.x + p1.dmx * lw, p1.y + p1.dmy * lw, lu, 1.0);
                    vset(verts, p1.x - p1.dmx * rw, p1.y - p1.dmy * rw, ru, 1.0);
                }
                i0 = i1;
            }

            // Wrap the strip.
            let (x0, y0) = (verts[stroke_start].x, verts[stroke_start].y);
            let (x1, y1) = (verts[stroke_start + 1].x, verts[stroke_start + 1].y);
            vset(verts, x0, y0, lu, 1.0);
            vset(verts, x1, y1, ru, 1.0);

            cache.paths[i].stroke = Some(VertexRange {
                offset: stroke_start,
                len: verts.len() - stroke_start,
            });
        } else {
            cache.paths[i].stroke = None;
        }
    }
}
