use std::collections::HashMap;
use std::io::{stdout, BufWriter, Write};
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};
use log::info;
use rand::thread_rng;

use starfighter::display::{TermCanvas, CELL_HEIGHT, CELL_WIDTH};
use starfighter::engine::{Canvas, Engine};
use starfighter::entities::{KeyState, Viewport};
use starfighter::sprites::{load_sprites, SpriteStore};

const FRAME: Duration = Duration::from_millis(16); // ≈60 FPS

/// Directory holding xwing.png, tieFighter.png and plasma.png.
const ASSET_DIR: &str = "images";

// ── Simultaneous-input constants ──────────────────────────────────────────────

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames.  Covers terminals that don't emit key-release events:
/// the OS key-repeat rate is ≥ 15 Hz, so a window of 8 frames (≈133 ms) is
/// always refreshed before expiry.
const HOLD_WINDOW: u64 = 8;

/// Returns true if `key` was seen within the last `HOLD_WINDOW` frames.
fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn held_any(key_frame: &HashMap<KeyCode, u64>, frame: u64, keys: &[KeyCode]) -> bool {
    keys.iter().any(|key| is_held(key_frame, key, frame))
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Runs until the player quits (q / Esc / Ctrl-C).
///
/// Input model: instead of acting on each key event individually, we maintain
/// a `key_frame` map that records the frame number of the last press/repeat
/// event for every key.  Each frame we check which keys are still "fresh"
/// (within `HOLD_WINDOW` frames) and reduce them to the `KeyState` snapshot
/// the engine consumes, so any combination of directions can be held at once.
///
/// Works on two classes of terminal:
/// * **Keyboard-enhancement capable** (Ghostty, kitty, etc.): proper
///   `Press` / `Repeat` / `Release` events → keys are removed on release.
/// * **Classic terminals**: only `Press` events (OS key-repeat shows as
///   repeated `Press`).  Keys expire naturally after `HOLD_WINDOW` frames of
///   silence, which is shorter than the OS repeat interval, so the key stays
///   live while it is actively generating repeats.
fn game_loop(
    canvas: &mut impl Canvas,
    engine: &mut Engine,
    rx: &mpsc::Receiver<Event>,
) -> std::io::Result<()> {
    let mut rng = thread_rng();
    let clock = Instant::now();

    // Maps each held key → the frame it was last seen (press or repeat).
    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut frame: u64 = 0;

    loop {
        let frame_start = Instant::now();
        frame += 1;

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(Event::Key(KeyEvent {
            code,
            kind,
            modifiers,
            ..
        })) = rx.try_recv()
        {
            match kind {
                // Press: record key + handle quit
                KeyEventKind::Press => {
                    key_frame.insert(code, frame);
                    match code {
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                            return Ok(());
                        }
                        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(());
                        }
                        _ => {}
                    }
                }
                // Repeat: refresh timestamp so key stays "held"
                KeyEventKind::Repeat => {
                    key_frame.insert(code, frame);
                }
                // Release: remove key immediately (keyboard-enhancement path)
                KeyEventKind::Release => {
                    key_frame.remove(&code);
                }
            }
        }

        let keys = KeyState {
            up: held_any(
                &key_frame,
                frame,
                &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')],
            ),
            down: held_any(
                &key_frame,
                frame,
                &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')],
            ),
            left: held_any(
                &key_frame,
                frame,
                &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')],
            ),
            right: held_any(
                &key_frame,
                frame,
                &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')],
            ),
        };

        engine.frame(clock.elapsed().as_millis() as u64, keys, &mut rng, canvas)?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            std::thread::sleep(FRAME - elapsed);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // The game does not start until every sprite has decoded; a failed load
    // aborts here, before the terminal is put into raw mode.
    let sprites = load_sprites(Path::new(ASSET_DIR))?;
    info!("sprites loaded from {ASSET_DIR}/");

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from the terminal.
    // Ghostty / kitty-protocol terminals support this; others fall back gracefully.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break; // receiver dropped → program exiting
                }
            }
            Err(_) => break,
        }
    });

    let result = run(&mut out, sprites, &rx);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result.map_err(Into::into)
}

fn run<W: Write>(
    out: &mut W,
    sprites: SpriteStore,
    rx: &mpsc::Receiver<Event>,
) -> std::io::Result<()> {
    // The terminal size is read once; the viewport is fixed for the session.
    let (cols, rows) = terminal::size()?;
    let viewport = Viewport::new(cols as f32 * CELL_WIDTH, rows as f32 * CELL_HEIGHT);
    info!(
        "viewport {}x{} px over a {cols}x{rows} cell grid",
        viewport.width, viewport.height
    );

    let mut canvas = TermCanvas::new(out, viewport);
    canvas.init()?;

    let mut engine = Engine::new(viewport, sprites, 0);
    game_loop(&mut canvas, &mut engine, rx)
}
