//! The game loop core.
//!
//! The engine owns the viewport, the ship, the drifter collection, the score
//! and the two spawn schedules, and drives one update → draw → collide →
//! score → compact cycle per call. It knows nothing about terminals: all
//! drawing goes through the `Canvas` seam, and time arrives as a caller
//! supplied millisecond value, so tests run against a recording canvas and a
//! virtual clock.

use std::io;

use log::debug;
use rand::Rng;

use crate::entities::{Drifter, DrifterKind, KeyState, Viewport, Visual, Xwing};
use crate::sprites::{Sprite, SpriteKind, SpriteStore};

/// A tie fighter spawns this often.
pub const TIE_FIGHTER_PERIOD_MS: u64 = 1500;
/// A plasma bolt spawns this often.
pub const PLASMA_PERIOD_MS: u64 = 2000;

// ── Rendering seam ────────────────────────────────────────────────────────────

/// What the engine needs from a rendering surface. The terminal
/// implementation lives in `display`; tests substitute a recording double.
pub trait Canvas {
    fn clear(&mut self) -> io::Result<()>;
    fn draw_sprite(&mut self, sprite: &Sprite, x: f32, y: f32) -> io::Result<()>;
    fn draw_score(&mut self, score: i64) -> io::Result<()>;
    /// Flush the finished frame to the surface.
    fn present(&mut self) -> io::Result<()>;
}

// ── Spawn scheduling ──────────────────────────────────────────────────────────

/// Fixed-period due-time bookkeeping. `poll` reports how many periods have
/// elapsed by the given clock value and advances the due time past it, so a
/// stalled loop catches up instead of dropping spawns.
#[derive(Clone, Copy, Debug)]
pub struct Spawner {
    period_ms: u64,
    next_due_ms: u64,
}

impl Spawner {
    pub fn new(period_ms: u64, now_ms: u64) -> Self {
        Spawner {
            period_ms,
            next_due_ms: now_ms + period_ms,
        }
    }

    pub fn poll(&mut self, now_ms: u64) -> u32 {
        let mut fired = 0;
        while now_ms >= self.next_due_ms {
            self.next_due_ms += self.period_ms;
            fired += 1;
        }
        fired
    }
}

// ── Engine ────────────────────────────────────────────────────────────────────

pub struct Engine {
    viewport: Viewport,
    sprites: SpriteStore,
    ship: Xwing,
    drifters: Vec<Drifter>,
    score: i64,
    last_frame_ms: u64,
    tie_spawner: Spawner,
    plasma_spawner: Spawner,
}

impl Engine {
    pub fn new(viewport: Viewport, sprites: SpriteStore, start_ms: u64) -> Self {
        debug!(
            "spawn schedules: tie fighter every {TIE_FIGHTER_PERIOD_MS} ms, \
             plasma every {PLASMA_PERIOD_MS} ms"
        );
        let ship = Xwing::new(sprites.get(SpriteKind::Xwing));
        Engine {
            viewport,
            sprites,
            ship,
            drifters: Vec::new(),
            score: 0,
            last_frame_ms: start_ms,
            tie_spawner: Spawner::new(TIE_FIGHTER_PERIOD_MS, start_ms),
            plasma_spawner: Spawner::new(PLASMA_PERIOD_MS, start_ms),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn ship(&self) -> &Xwing {
        &self.ship
    }

    pub fn drifters(&self) -> &[Drifter] {
        &self.drifters
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    /// Append a drifter to the live collection.
    pub fn push_drifter(&mut self, drifter: Drifter) {
        self.drifters.push(drifter);
    }

    pub fn add_tie_fighter(&mut self, rng: &mut impl Rng) {
        let sprite = self.sprites.get(SpriteKind::TieFighter);
        let drifter = Drifter::spawn(DrifterKind::TieFighter, sprite, self.viewport, rng);
        self.push_drifter(drifter);
    }

    pub fn add_plasma(&mut self, rng: &mut impl Rng) {
        let sprite = self.sprites.get(SpriteKind::Plasma);
        let drifter = Drifter::spawn(DrifterKind::Plasma, sprite, self.viewport, rng);
        self.push_drifter(drifter);
    }

    /// Drop every drifter whose deletion predicate holds. Idempotent between
    /// spawns and collisions.
    pub fn compact(&mut self) {
        let viewport = self.viewport;
        self.drifters.retain(|d| !d.is_deletable(viewport));
    }

    /// Run one full frame at clock value `now_ms`.
    pub fn frame(
        &mut self,
        now_ms: u64,
        keys: KeyState,
        rng: &mut impl Rng,
        canvas: &mut impl Canvas,
    ) -> io::Result<()> {
        for _ in 0..self.tie_spawner.poll(now_ms) {
            self.add_tie_fighter(rng);
        }
        for _ in 0..self.plasma_spawner.poll(now_ms) {
            self.add_plasma(rng);
        }

        let dt = now_ms.saturating_sub(self.last_frame_ms) as f32;
        self.last_frame_ms = now_ms;

        canvas.clear()?;

        self.ship.update(dt, keys, self.viewport);
        canvas.draw_sprite(self.ship.sprite(), self.ship.x, self.ship.y)?;

        for drifter in &mut self.drifters {
            drifter.update(dt);
            canvas.draw_sprite(drifter.sprite(), drifter.x, drifter.y)?;
        }

        // Collisions resolve after everything has been drawn, so a hit
        // drifter shows for one final frame before compaction removes it.
        let collided: Vec<usize> = self
            .drifters
            .iter()
            .enumerate()
            .filter(|(_, drifter)| self.ship.intersects(*drifter))
            .map(|(i, _)| i)
            .collect();

        let mut delta: i64 = 0;
        for &i in &collided {
            self.drifters[i].destroy();
            delta += self.drifters[i].score_delta();
        }
        self.score += delta;

        canvas.draw_score(self.score)?;

        self.compact();

        canvas.present()
    }
}
