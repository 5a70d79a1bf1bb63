//! Drawing surfaces for the road.
//!
//! The game hands a [`Frame`] to a [`Surface`] after each tick. Positions are
//! percentages of the play area: the player is anchored from the bottom edge,
//! oncoming cars from the top edge.

use std::io::Write;

use color_eyre::Result;
use crate::car::Car;

/// Car footprint, as a percentage of the play area.
const CAR_WIDTH: f64 = 10.0;
const CAR_HEIGHT: f64 = 16.0;

const PLAYER_GLYPH: char = '@';
const OBSTACLE_GLYPH: char = '#';
const ROAD_GLYPH: char = '.';

const CLEAR_SCREEN: &str = "\x1b[H\x1b[2J";

/// Everything a surface needs to draw one moment of the game.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub player: Car,
    pub obstacles: Vec<Car>,
    pub score: u64,
    pub over: bool,
}

pub trait Surface {
    fn draw(&mut self, frame: &Frame) -> Result<()>;
}

/// Draws nothing. Used for headless runs.
#[derive(Debug, Default)]
pub struct NullSurface;

impl Surface for NullSurface {
    fn draw(&mut self, _frame: &Frame) -> Result<()> {
        Ok(())
    }
}

/// Character-grid surface writing to any [`Write`].
pub struct TextSurface<W: Write> {
    out: W,
    columns: usize,
    rows: usize,
    clear: bool,
}

impl<W: Write> TextSurface<W> {
    pub fn new(out: W, columns: usize, rows: usize) -> Self {
        Self {
            out,
            columns,
            rows,
            clear: false,
        }
    }

    /// Clear the terminal before each frame instead of appending.
    #[must_use]
    pub fn clearing(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn render(&self, frame: &Frame) -> String {
        let mut grid = vec![vec![ROAD_GLYPH; self.columns]; self.rows];

        if frame.over {
            let lines = [
                "GAME OVER".to_string(),
                format!("score: {}", frame.score),
                "restart to play again".to_string(),
            ];
            let top = self.rows.saturating_sub(lines.len()) / 2;
            for (offset, line) in lines.iter().enumerate() {
                self.write_centered(&mut grid, top + offset, line);
            }
        } else {
            for obstacle in &frame.obstacles {
                self.fill(&mut grid, obstacle.x, obstacle.y, OBSTACLE_GLYPH);
            }
            let player = &frame.player;
            self.fill(
                &mut grid,
                player.x,
                100.0 - player.y - CAR_HEIGHT,
                PLAYER_GLYPH,
            );
        }

        let mut text = String::with_capacity((self.columns + 1) * (self.rows + 1));
        for row in grid {
            text.extend(row);
            text.push('\n');
        }
        text.push_str(&format!("score: {}\n", frame.score));
        text
    }

    /// Fills the car-sized rectangle whose top-left corner is at (`left`, `top`) percent.
    fn fill(&self, grid: &mut [Vec<char>], left: f64, top: f64, glyph: char) {
        let (x0, x1) = span(left, CAR_WIDTH, self.columns);
        let (y0, y1) = span(top, CAR_HEIGHT, self.rows);
        for row in grid.iter_mut().take(y1).skip(y0) {
            for cell in row.iter_mut().take(x1).skip(x0) {
                *cell = glyph;
            }
        }
    }

    fn write_centered(&self, grid: &mut [Vec<char>], row: usize, line: &str) {
        let Some(cells) = grid.get_mut(row) else {
            return;
        };
        let start = self.columns.saturating_sub(line.chars().count()) / 2;
        for (cell, ch) in cells.iter_mut().skip(start).zip(line.chars()) {
            *cell = ch;
        }
    }
}

impl<W: Write> Surface for TextSurface<W> {
    fn draw(&mut self, frame: &Frame) -> Result<()> {
        let text = self.render(frame);
        if self.clear {
            self.out.write_all(CLEAR_SCREEN.as_bytes())?;
        }
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

/// Converts a percentage interval into a clipped half-open cell range.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn span(start: f64, length: f64, cells: usize) -> (usize, usize) {
    let scale = cells as f64 / 100.0;
    let from = (start * scale).floor().max(0.0);
    let to = ((start + length) * scale).ceil().max(0.0);
    (
        (from as usize).min(cells),
        (to as usize).min(cells),
    )
}
