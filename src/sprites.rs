//! Sprite assets: three fixed images, decoded once at startup and shared
//! read-only by every entity instance of the same kind.
//!
//! Loading follows the all-or-nothing contract of the game's startup: each
//! image decodes on its own worker thread, results funnel through a channel,
//! and the loader only returns once every worker has reported. A single
//! failure surfaces as an error naming the sprite; nothing is retried.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use image::RgbaImage;
use log::debug;
use thiserror::Error;

// ── Sprite kinds ──────────────────────────────────────────────────────────────

/// The three image kinds the game ever draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpriteKind {
    Xwing,
    TieFighter,
    Plasma,
}

impl SpriteKind {
    pub const ALL: [SpriteKind; 3] = [SpriteKind::Xwing, SpriteKind::TieFighter, SpriteKind::Plasma];

    /// File name under the asset directory, without the `.png` extension.
    pub fn file_stem(self) -> &'static str {
        match self {
            SpriteKind::Xwing => "xwing",
            SpriteKind::TieFighter => "tieFighter",
            SpriteKind::Plasma => "plasma",
        }
    }
}

/// `<base>/<name>.png` — the fixed path convention for every sprite.
pub fn sprite_path(base: &Path, kind: SpriteKind) -> PathBuf {
    base.join(format!("{}.png", kind.file_stem()))
}

// ── Sprite data ───────────────────────────────────────────────────────────────

/// A decoded image with known pixel dimensions. Immutable once built; shared
/// between entities via `Arc`.
#[derive(Clone, Debug)]
pub struct Sprite {
    kind: SpriteKind,
    image: RgbaImage,
}

impl Sprite {
    pub fn new(kind: SpriteKind, image: RgbaImage) -> Self {
        Sprite { kind, image }
    }

    pub fn kind(&self) -> SpriteKind {
        self.kind
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn width(&self) -> f32 {
        self.image.width() as f32
    }

    pub fn height(&self) -> f32 {
        self.image.height() as f32
    }
}

/// One shared sprite per kind, never per instance.
#[derive(Clone, Debug)]
pub struct SpriteStore {
    xwing: Arc<Sprite>,
    tie_fighter: Arc<Sprite>,
    plasma: Arc<Sprite>,
}

impl SpriteStore {
    pub fn new(xwing: Sprite, tie_fighter: Sprite, plasma: Sprite) -> Self {
        SpriteStore {
            xwing: Arc::new(xwing),
            tie_fighter: Arc::new(tie_fighter),
            plasma: Arc::new(plasma),
        }
    }

    pub fn get(&self, kind: SpriteKind) -> Arc<Sprite> {
        match kind {
            SpriteKind::Xwing => Arc::clone(&self.xwing),
            SpriteKind::TieFighter => Arc::clone(&self.tie_fighter),
            SpriteKind::Plasma => Arc::clone(&self.plasma),
        }
    }
}

// ── Loader ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SpriteError {
    #[error("failed to load sprite \"{name}\"")]
    Load {
        name: &'static str,
        #[source]
        source: image::ImageError,
    },
    #[error("a sprite loader worker exited without reporting")]
    WorkerLost,
}

/// Decode every sprite under `base`, one worker thread per image. Waits for
/// all workers before returning, success or not, then reports the first
/// failure if there was one.
pub fn load_sprites(base: &Path) -> Result<SpriteStore, SpriteError> {
    let (tx, rx) = mpsc::channel();
    for kind in SpriteKind::ALL {
        let tx = tx.clone();
        let path = sprite_path(base, kind);
        thread::spawn(move || {
            let result = image::open(&path).map(|img| img.to_rgba8());
            let _ = tx.send((kind, result));
        });
    }
    drop(tx);

    let mut xwing = None;
    let mut tie_fighter = None;
    let mut plasma = None;
    let mut failure: Option<SpriteError> = None;

    // Every worker reports exactly once; drain all of them before deciding.
    for _ in 0..SpriteKind::ALL.len() {
        let (kind, result) = rx.recv().map_err(|_| SpriteError::WorkerLost)?;
        match result {
            Ok(image) => {
                debug!(
                    "decoded sprite {} ({}x{})",
                    kind.file_stem(),
                    image.width(),
                    image.height()
                );
                let sprite = Sprite::new(kind, image);
                match kind {
                    SpriteKind::Xwing => xwing = Some(sprite),
                    SpriteKind::TieFighter => tie_fighter = Some(sprite),
                    SpriteKind::Plasma => plasma = Some(sprite),
                }
            }
            Err(source) => {
                failure.get_or_insert(SpriteError::Load {
                    name: kind.file_stem(),
                    source,
                });
            }
        }
    }

    if let Some(err) = failure {
        return Err(err);
    }
    let (Some(xwing), Some(tie_fighter), Some(plasma)) = (xwing, tie_fighter, plasma) else {
        return Err(SpriteError::WorkerLost);
    };
    Ok(SpriteStore::new(xwing, tie_fighter, plasma))
}
