//! Rendering layer — all terminal I/O lives here.
//!
//! `TermCanvas` translates the engine's pixel-space draw calls into crossterm
//! commands. A terminal cell stands for a 10x20 pixel block; each cell a
//! sprite covers is painted with a block glyph in the average color of the
//! opaque source pixels underneath it. No game logic is performed here.

use std::io::{self, Write};

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal, QueueableCommand,
};
use image::Rgba;

use crate::engine::Canvas;
use crate::entities::Viewport;
use crate::sprites::Sprite;

/// Pixel width of one terminal cell.
pub const CELL_WIDTH: f32 = 10.0;
/// Pixel height of one terminal cell.
pub const CELL_HEIGHT: f32 = 20.0;

/// Fixed pixel position of the score text.
const SCORE_X: f32 = 5.0;
const SCORE_Y: f32 = 25.0;

const C_BACKGROUND: Color = Color::Black;
const C_SCORE: Color = Color::Rgb {
    r: 255,
    g: 251,
    b: 28,
};

/// A cell is painted only when at least 1/COVERAGE_DIVISOR of its sampled
/// pixels are opaque; anything thinner reads as transparent fringe.
const COVERAGE_DIVISOR: u32 = 4;

pub struct TermCanvas<W: Write> {
    out: W,
    viewport: Viewport,
}

impl<W: Write> TermCanvas<W> {
    pub fn new(out: W, viewport: Viewport) -> Self {
        TermCanvas { out, viewport }
    }

    /// Paint the session background once before the first frame.
    pub fn init(&mut self) -> io::Result<()> {
        self.out.queue(style::SetBackgroundColor(C_BACKGROUND))?;
        self.out.queue(terminal::Clear(terminal::ClearType::All))?;
        self.out.flush()
    }

    fn grid_cols(&self) -> i32 {
        (self.viewport.width / CELL_WIDTH) as i32
    }

    fn grid_rows(&self) -> i32 {
        (self.viewport.height / CELL_HEIGHT) as i32
    }
}

impl<W: Write> Canvas for TermCanvas<W> {
    fn clear(&mut self) -> io::Result<()> {
        self.out.queue(style::SetBackgroundColor(C_BACKGROUND))?;
        self.out.queue(terminal::Clear(terminal::ClearType::All))?;
        Ok(())
    }

    fn draw_sprite(&mut self, sprite: &Sprite, x: f32, y: f32) -> io::Result<()> {
        let image = sprite.image();
        let cell_cols = (sprite.width() / CELL_WIDTH).ceil() as u32;
        let cell_rows = (sprite.height() / CELL_HEIGHT).ceil() as u32;
        let base_col = (x / CELL_WIDTH).floor() as i32;
        let base_row = (y / CELL_HEIGHT).floor() as i32;

        for row in 0..cell_rows {
            for col in 0..cell_cols {
                let screen_col = base_col + col as i32;
                let screen_row = base_row + row as i32;
                if screen_col < 0
                    || screen_row < 0
                    || screen_col >= self.grid_cols()
                    || screen_row >= self.grid_rows()
                {
                    continue;
                }

                // Average the source pixels that land in this cell.
                let px0 = (col as f32 * CELL_WIDTH) as u32;
                let px1 = (((col + 1) as f32 * CELL_WIDTH).min(sprite.width())) as u32;
                let py0 = (row as f32 * CELL_HEIGHT) as u32;
                let py1 = (((row + 1) as f32 * CELL_HEIGHT).min(sprite.height())) as u32;

                let mut sum = [0u32; 3];
                let mut opaque = 0u32;
                let mut total = 0u32;
                for py in py0..py1 {
                    for px in px0..px1 {
                        total += 1;
                        let Rgba([r, g, b, a]) = *image.get_pixel(px, py);
                        if a < 128 {
                            continue;
                        }
                        opaque += 1;
                        sum[0] += r as u32;
                        sum[1] += g as u32;
                        sum[2] += b as u32;
                    }
                }
                if opaque == 0 || opaque * COVERAGE_DIVISOR < total {
                    continue;
                }

                self.out
                    .queue(cursor::MoveTo(screen_col as u16, screen_row as u16))?;
                self.out.queue(style::SetForegroundColor(Color::Rgb {
                    r: (sum[0] / opaque) as u8,
                    g: (sum[1] / opaque) as u8,
                    b: (sum[2] / opaque) as u8,
                }))?;
                self.out.queue(Print("█"))?;
            }
        }
        Ok(())
    }

    fn draw_score(&mut self, score: i64) -> io::Result<()> {
        let col = (SCORE_X / CELL_WIDTH) as u16;
        let row = (SCORE_Y / CELL_HEIGHT) as u16;
        self.out.queue(cursor::MoveTo(col, row))?;
        self.out.queue(style::SetForegroundColor(C_SCORE))?;
        self.out.queue(Print(score))?;
        Ok(())
    }

    fn present(&mut self) -> io::Result<()> {
        // Park cursor in a harmless spot and flush
        self.out.queue(style::ResetColor)?;
        let park_row = (self.grid_rows() as u16).saturating_sub(1);
        self.out.queue(cursor::MoveTo(0, park_row))?;
        self.out.flush()
    }
}
