//! Swept-volume collision against brush geometry.
//!
//! ✔ ray, sphere and axis-aligned box sweeps
//! ✔ brushes reached through BSP descent, nearest entry wins
//! ✔ slide response along the hit plane, step-up over short ledges
//!
//! Every query runs on its own `TraceContext`, so `&Level` can be shared
//! between callers.

use glam::Vec3;

use crate::world::geometry::{Brush, Level, NodeRef, Plane};

/// Distance kept between a swept volume and the plane it hits.
pub const M_EPS: f32 = 0.03125;
/// Highest ledge a sphere or box sweep climbs, tried in 1-unit increments.
pub const MAX_STEP_HEIGHT: f32 = 10.0;
/// Planes whose normal has at least this Y component can be stood on.
pub const GROUND_NORMAL_Y: f32 = 0.2;
/// Successive slide planes followed within one query.
pub const MAX_SLIDE_DEPTH: u32 = 8;

/// Volume swept from `start` to `end`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TraceShape {
    Ray,
    Sphere { radius: f32 },
    Box { mins: Vec3, maxs: Vec3, extents: Vec3 },
}

impl TraceShape {
    pub fn sphere(radius: f32) -> Self {
        TraceShape::Sphere { radius }
    }

    /// Box relative to its origin; `extents` is the per-axis max of
    /// `|mins|` and `|maxs|`.
    pub fn aabb(mins: Vec3, maxs: Vec3) -> Self {
        TraceShape::Box {
            mins,
            maxs,
            extents: mins.abs().max(maxs.abs()),
        }
    }

    /// Half-thickness of the slab around a splitter that the volume may
    /// touch from either side.
    #[inline]
    fn node_offset(&self, normal: Vec3) -> f32 {
        match *self {
            TraceShape::Ray => 0.0,
            TraceShape::Sphere { radius } => radius,
            TraceShape::Box { extents, .. } => (extents * normal).abs().element_sum(),
        }
    }

    /// Signed distances of the leading point of the volume at `start` and
    /// `end` to a brush side.
    #[inline]
    fn side_distances(&self, plane: &Plane, start: Vec3, end: Vec3) -> (f32, f32) {
        match *self {
            TraceShape::Ray => (plane.distance(start), plane.distance(end)),
            TraceShape::Sphere { radius } => (plane.distance(start) - radius, plane.distance(end) - radius),
            TraceShape::Box { mins, maxs, .. } => {
                // corner furthest along -normal
                let corner = Vec3::select(plane.normal.cmplt(Vec3::ZERO), maxs, mins);
                (plane.distance(start + corner), plane.distance(end + corner))
            }
        }
    }

    #[inline]
    fn can_step(&self) -> bool {
        !matches!(self, TraceShape::Ray)
    }
}

/// Outcome of one sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Trace {
    /// Resolved end position after sliding and stepping.
    pub position: Vec3,
    /// The sweep was shortened by a solid brush.
    pub collided: bool,
    /// The volume came to rest on an upward-facing plane.
    pub grounded: bool,
    /// Normal of the last plane hit; zero when nothing was hit.
    pub normal: Vec3,
}

/* ─────────────────────────  PER-QUERY STATE  ───────────────────────── */

struct TraceContext<'a> {
    level: &'a Level,
    shape: TraceShape,
    /// segment of the current `trace` call; brushes are clipped against it
    start: Vec3,
    end: Vec3,
    /// fraction of `start → end` travelled before the first hit
    ratio: f32,
    collided: bool,
    normal: Vec3,
    try_step: bool,
    grounded: bool,
}

impl<'a> TraceContext<'a> {
    fn new(level: &'a Level, shape: TraceShape) -> Self {
        Self {
            level,
            shape,
            start: Vec3::ZERO,
            end: Vec3::ZERO,
            ratio: 1.0,
            collided: false,
            normal: Vec3::ZERO,
            try_step: false,
            grounded: false,
        }
    }

    /// Sweep and slide; returns the resolved position.
    fn trace(&mut self, start: Vec3, end: Vec3, depth: u32) -> Vec3 {
        self.start = start;
        self.end = end;
        self.ratio = 1.0;

        self.check_node(Level::ROOT, start, end);

        if self.ratio == 1.0 {
            return end;
        }

        let contact = start + (end - start) * self.ratio;
        let position = if depth < MAX_SLIDE_DEPTH {
            // drop the part of the remaining move that points into the plane
            let n = self.normal;
            let slide_end = end - n * (end - contact).dot(n);
            self.trace(contact, slide_end, depth + 1)
        } else {
            contact
        };

        if self.normal.y > GROUND_NORMAL_Y {
            self.grounded = true;
        }
        position
    }

    /// Re-run the sweep raised by 1, 2, … `MAX_STEP_HEIGHT` units; the first
    /// height that clears wins, otherwise stay at `position`.
    fn try_step(&mut self, position: Vec3, end: Vec3) -> Vec3 {
        for h in 1..=MAX_STEP_HEIGHT as u32 {
            self.collided = false;
            self.try_step = false;

            let y = position.y + h as f32;
            let stepped = self.trace(Vec3::new(position.x, y, position.z), Vec3::new(end.x, y, end.z), 0);
            if !self.collided {
                return stepped;
            }
        }
        position
    }

    /// Collect the brushes of every leaf the swept volume can touch.
    fn check_node(&mut self, node: NodeRef, start: Vec3, end: Vec3) {
        let level = self.level;

        let idx = match node {
            NodeRef::Leaf(leaf) => {
                for b in level.leaf_brush_ids(leaf) {
                    let brush = &level.brushes[b];
                    if !brush.sides.is_empty() && level.textures[brush.texture].is_solid() {
                        self.check_brush(brush);
                    }
                }
                return;
            }
            NodeRef::Node(idx) => idx,
        };

        let node = &level.nodes[idx];
        let plane = &level.planes[node.plane];
        let [front, back] = node.children;

        let sd = plane.distance(start);
        let ed = plane.distance(end);
        let offset = self.shape.node_offset(plane.normal);

        if sd >= offset && ed >= offset {
            self.check_node(front, start, end);
        } else if sd < -offset && ed < -offset {
            self.check_node(back, start, end);
        } else {
            // straddles the inflated splitter: near half first, then far half
            let (near, far, r1, r2) = if sd < ed {
                let inv = 1.0 / (sd - ed);
                (back, front, (sd - offset - M_EPS) * inv, (sd + offset + M_EPS) * inv)
            } else if sd > ed {
                let inv = 1.0 / (sd - ed);
                (front, back, (sd + offset + M_EPS) * inv, (sd - offset - M_EPS) * inv)
            } else {
                (front, back, 1.0, 0.0)
            };
            let r1 = r1.clamp(0.0, 1.0);
            let r2 = r2.clamp(0.0, 1.0);

            self.check_node(near, start, start.lerp(end, r1));
            self.check_node(far, start.lerp(end, r2), end);
        }
    }

    /// Clip the whole query segment against one convex brush.
    fn check_brush(&mut self, brush: &Brush) {
        let level = self.level;
        let (start, end) = (self.start, self.end);

        let mut start_ratio = -1.0f32;
        let mut end_ratio = 1.0f32;
        let mut starts_out = false;

        let mut normal = Vec3::ZERO;
        let mut try_step = false;
        let mut grounded = false;

        for side in &level.brush_sides[brush.sides.range()] {
            let plane = &level.planes[side.plane];
            let (sd, ed) = self.shape.side_distances(plane, start, end);

            if sd > 0.0 {
                starts_out = true;
            }
            // entirely in front of one side: never enters the brush
            if sd > 0.0 && ed > 0.0 {
                return;
            }
            if sd <= 0.0 && ed <= 0.0 {
                continue;
            }

            if sd > ed {
                // entering
                let r = (sd - M_EPS) / (sd - ed);
                if r > start_ratio {
                    start_ratio = r;
                    normal = plane.normal;
                    if (start.x != end.x || start.z != end.z) && plane.normal.y != 1.0 {
                        try_step = true;
                    }
                    if plane.normal.y >= GROUND_NORMAL_Y {
                        grounded = true;
                    }
                }
            } else {
                // leaving
                end_ratio = end_ratio.min((sd + M_EPS) / (sd - ed));
            }
        }

        if !starts_out {
            return;
        }

        if start_ratio < end_ratio && start_ratio > -1.0 && start_ratio < self.ratio {
            self.ratio = start_ratio.max(0.0);
            self.collided = true;
            self.normal = normal;
            self.try_step |= try_step;
            self.grounded |= grounded;
        }
    }
}

/* ─────────────────────────  PUBLIC QUERIES  ───────────────────────── */

impl Level {
    /// Sweep `shape` from `start` to `end`, sliding along whatever it hits.
    /// Sphere and box sweeps that are blocked sideways try to step up.
    pub fn sweep(&self, shape: TraceShape, start: Vec3, end: Vec3) -> Trace {
        let mut ctx = TraceContext::new(self, shape);
        let mut position = ctx.trace(start, end, 0);

        if shape.can_step() && ctx.collided && ctx.try_step {
            position = ctx.try_step(position, end);
        }

        Trace {
            position,
            collided: ctx.collided,
            grounded: ctx.grounded,
            normal: ctx.normal,
        }
    }

    #[inline]
    pub fn trace_ray(&self, start: Vec3, end: Vec3) -> Trace {
        self.sweep(TraceShape::Ray, start, end)
    }

    #[inline]
    pub fn trace_sphere(&self, start: Vec3, end: Vec3, radius: f32) -> Trace {
        self.sweep(TraceShape::sphere(radius), start, end)
    }

    /// `mins` / `maxs` are relative to the box origin.
    #[inline]
    pub fn trace_box(&self, start: Vec3, end: Vec3, mins: Vec3, maxs: Vec3) -> Trace {
        self.sweep(TraceShape::aabb(mins, maxs), start, end)
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
