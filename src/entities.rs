//! Game entities and the geometry capability they share.
//!
//! Everything lives in a continuous pixel-space viewport; the display layer
//! owns the mapping to terminal cells. All randomness comes through an
//! injected `Rng` handle so callers control determinism.

use std::sync::Arc;

use rand::Rng;

use crate::sprites::Sprite;

// ── Movement constants ────────────────────────────────────────────────────────

/// Horizontal ship speed, pixels per frame per held key.
pub const SHIP_SPEED_X: f32 = 3.0;
/// Vertical ship speed, pixels per frame per held key.
pub const SHIP_SPEED_Y: f32 = 3.0;

// ── Viewport & input snapshot ─────────────────────────────────────────────────

/// Session-constant play area, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Viewport { width, height }
    }
}

/// Per-frame snapshot of the four directional keys. Built by the shell from
/// raw key events; entities only ever read it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

// ── Geometry ──────────────────────────────────────────────────────────────────

/// Axis-aligned bounding rectangle in pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

/// Shared capability of everything that occupies the viewport: a bounding
/// rectangle derived from the current position, edge-visibility testing, and
/// the intersection test used for collisions.
pub trait Visual {
    /// Bounding rectangle for the current position. Always recomputed; never
    /// cached.
    fn rect(&self) -> Rect;

    /// Edge test against the viewport. `Top`, `Bottom` and `Right` report a
    /// full exit past that edge. `Left` reports the opposite: true while any
    /// part of the rectangle still lies right of x = 0. Callers negate it to
    /// detect a full exit on the left.
    fn is_visible(&self, edge: Edge, viewport: Viewport) -> bool {
        let rect = self.rect();
        match edge {
            Edge::Top => rect.bottom < 0.0,
            Edge::Bottom => rect.top > viewport.height,
            Edge::Left => rect.right > 0.0,
            Edge::Right => rect.left > viewport.width,
        }
    }

    /// Strict bounding-box intersection: on each axis one of self's edges
    /// must fall strictly inside the other's span, and both axes must agree.
    /// Rectangles that merely touch edges, or coincide exactly, do not
    /// intersect.
    fn intersects(&self, other: &impl Visual) -> bool {
        let a = self.rect();
        let b = other.rect();
        let intersect_y =
            (a.top > b.top && a.top < b.bottom) || (a.bottom > b.top && a.bottom < b.bottom);
        let intersect_x =
            (a.left > b.left && a.left < b.right) || (a.right > b.left && a.right < b.right);
        intersect_x && intersect_y
    }
}

// ── Player ship ───────────────────────────────────────────────────────────────

/// The player's ship. Alive for the whole session; movement is frame-based
/// and clamped so the sprite never leaves the viewport.
#[derive(Clone, Debug)]
pub struct Xwing {
    pub x: f32,
    pub y: f32,
    sprite: Arc<Sprite>,
}

impl Xwing {
    pub fn new(sprite: Arc<Sprite>) -> Self {
        Xwing {
            x: 0.0,
            y: 0.0,
            sprite,
        }
    }

    pub fn sprite(&self) -> &Arc<Sprite> {
        &self.sprite
    }

    /// Apply one frame of keyboard movement, then clamp to the viewport.
    /// `dt` is accepted for signature symmetry with the drifters; the ship
    /// moves a fixed distance per frame.
    pub fn update(&mut self, _dt: f32, keys: KeyState, viewport: Viewport) {
        if keys.left {
            self.x -= SHIP_SPEED_X;
        }
        if keys.right {
            self.x += SHIP_SPEED_X;
        }
        if keys.up {
            self.y -= SHIP_SPEED_Y;
        }
        if keys.down {
            self.y += SHIP_SPEED_Y;
        }

        let rect = self.rect();
        if rect.top < 0.0 {
            self.y = 0.0;
        } else if rect.bottom > viewport.height {
            self.y = viewport.height - self.sprite.height();
        }
        if rect.left < 0.0 {
            self.x = 0.0;
        } else if rect.right > viewport.width {
            self.x = viewport.width - self.sprite.width();
        }
    }
}

impl Visual for Xwing {
    fn rect(&self) -> Rect {
        Rect {
            top: self.y,
            bottom: self.y + self.sprite.height(),
            left: self.x,
            right: self.x + self.sprite.width(),
        }
    }
}

// ── Drifting entities ─────────────────────────────────────────────────────────

/// The two spawned kinds. The kind fixes the score delta applied when the
/// ship collides with the entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrifterKind {
    TieFighter,
    Plasma,
}

impl DrifterKind {
    pub fn score_delta(self) -> i64 {
        match self {
            DrifterKind::TieFighter => -2,
            DrifterKind::Plasma => 1,
        }
    }
}

/// An enemy or projectile drifting leftward across the viewport. Destroyed
/// drifters are only marked here; the engine's compaction pass removes them,
/// so a hit still counts exactly once in the frame it happened.
#[derive(Clone, Debug)]
pub struct Drifter {
    pub x: f32,
    pub y: f32,
    kind: DrifterKind,
    sprite: Arc<Sprite>,
    speed_divisor: f32,
    destroyed: bool,
}

impl Drifter {
    pub fn new(
        kind: DrifterKind,
        sprite: Arc<Sprite>,
        x: f32,
        y: f32,
        speed_divisor: f32,
    ) -> Self {
        Drifter {
            x,
            y,
            kind,
            sprite,
            speed_divisor,
            destroyed: false,
        }
    }

    /// Spawn at the right edge: x = viewport width, y a uniform whole number
    /// of pixels in [0, height), speed divisor uniform in 10..=14.
    pub fn spawn(
        kind: DrifterKind,
        sprite: Arc<Sprite>,
        viewport: Viewport,
        rng: &mut impl Rng,
    ) -> Self {
        let speed_divisor = rng.gen_range(10..=14) as f32;
        let y = rng.gen_range(0..viewport.height as u32) as f32;
        Drifter::new(kind, sprite, viewport.width, y, speed_divisor)
    }

    pub fn kind(&self) -> DrifterKind {
        self.kind
    }

    pub fn sprite(&self) -> &Arc<Sprite> {
        &self.sprite
    }

    pub fn speed_divisor(&self) -> f32 {
        self.speed_divisor
    }

    pub fn score_delta(&self) -> i64 {
        self.kind.score_delta()
    }

    /// Drift left by `dt / divisor` pixels — the divisor scales time down,
    /// so a larger divisor means a slower drifter. y never changes.
    pub fn update(&mut self, dt: f32) {
        self.x -= dt / self.speed_divisor;
    }

    /// Mark for removal at the next compaction pass.
    pub fn destroy(&mut self) {
        self.destroyed = true;
    }

    /// True once destroyed, or once the rectangle has fully left through the
    /// left edge.
    pub fn is_deletable(&self, viewport: Viewport) -> bool {
        self.destroyed || !self.is_visible(Edge::Left, viewport)
    }
}

impl Visual for Drifter {
    fn rect(&self) -> Rect {
        Rect {
            top: self.y,
            bottom: self.y + self.sprite.height(),
            left: self.x,
            right: self.x + self.sprite.width(),
        }
    }
}
