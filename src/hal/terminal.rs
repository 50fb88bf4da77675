//! Périphériques hôte : terminal ANSI, stdin, logs

use super::{Button, Indicator, Indicators, Screen, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::game::Color;
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Taille d'une cellule du terminal (px)
const CELL_WIDTH: i32 = 8;
const CELL_HEIGHT: i32 = 16;

/// Écran rendu dans le terminal
///
/// Les pixels sont ramenés à une grille 80x30 ; la taille du texte est
/// rendue en gras au-delà de 2.
pub struct TerminalScreen<W: Write = std::io::Stdout> {
    out: W,
    color: Color,
    size: u8,
    cursor: (i32, i32),
}

impl TerminalScreen {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TerminalScreen<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            color: Color::White,
            size: 1,
            cursor: (0, 0),
        }
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::warn!("Écriture terminal impossible: {}", e);
        }
    }
}

fn to_cell(x: i32, y: i32) -> (i32, i32) {
    let col = x.clamp(0, SCREEN_WIDTH - 1) / CELL_WIDTH + 1;
    let row = y.clamp(0, SCREEN_HEIGHT - 1) / CELL_HEIGHT + 1;
    (row, col)
}

fn ansi_color(color: Color) -> u8 {
    match color {
        Color::Red => 31,
        Color::Green => 32,
        Color::Yellow => 33,
        Color::Blue => 34,
        Color::Magenta => 35,
        Color::Cyan => 36,
        Color::White => 37,
    }
}

impl<W: Write> Screen for TerminalScreen<W> {
    fn clear_region(&mut self, x: i32, y: i32, width: i32, height: i32) {
        if x <= 0 && y <= 0 && width >= SCREEN_WIDTH && height >= SCREEN_HEIGHT {
            self.emit("\x1b[2J\x1b[H");
            return;
        }

        let (top, left) = to_cell(x, y);
        let (bottom, right) = to_cell(x + width - 1, y + height - 1);
        let blank = " ".repeat((right - left + 1).max(0) as usize);
        let mut seq = String::new();
        for row in top..=bottom {
            seq.push_str(&format!("\x1b[{};{}H{}", row, left, blank));
        }
        self.emit(&seq);
    }

    fn set_text_size(&mut self, size: u8) {
        self.size = size;
    }

    fn set_text_color(&mut self, color: Color) {
        self.color = color;
    }

    fn set_cursor(&mut self, x: i32, y: i32) {
        self.cursor = (x, y);
    }

    fn write_str(&mut self, text: &str) {
        let (row, col) = to_cell(self.cursor.0, self.cursor.1);
        let weight = if self.size > 2 { "1;" } else { "" };
        let seq = format!(
            "\x1b[{};{}H\x1b[{}{}m{}\x1b[0m",
            row,
            col,
            weight,
            ansi_color(self.color),
            text
        );
        self.emit(&seq);
    }
}

/// Bouton simulé : chaque ligne lue sur stdin est un appui
///
/// Le niveau reste bas pendant une seule scrutation.
pub struct StdinButton {
    pressed: Arc<AtomicBool>,
}

impl StdinButton {
    pub fn spawn() -> Self {
        let pressed = Arc::new(AtomicBool::new(false));
        let reader_pressed = Arc::clone(&pressed);

        let spawned = thread::Builder::new()
            .name("stdin-button".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    if line.is_err() {
                        break;
                    }
                    reader_pressed.store(true, Ordering::Release);
                }
                tracing::debug!("stdin fermé, plus aucun appui possible");
            });
        if let Err(e) = spawned {
            tracing::error!("Lecture du bouton impossible: {}", e);
        }

        Self { pressed }
    }
}

impl Button for StdinButton {
    fn is_low(&mut self) -> bool {
        self.pressed.swap(false, Ordering::AcqRel)
    }
}

/// Voyants tracés dans les logs
#[derive(Debug, Default)]
pub struct LogIndicators {
    states: [bool; 4],
}

impl LogIndicators {
    fn slot(indicator: Indicator) -> usize {
        match indicator {
            Indicator::General => 0,
            Indicator::Red => 1,
            Indicator::Green => 2,
            Indicator::Yellow => 3,
        }
    }

    #[cfg(test)]
    pub fn is_on(&self, indicator: Indicator) -> bool {
        self.states[Self::slot(indicator)]
    }
}

impl Indicators for LogIndicators {
    fn set(&mut self, indicator: Indicator, on: bool) {
        let slot = &mut self.states[Self::slot(indicator)];
        if *slot != on {
            tracing::debug!("Voyant {:?}: {}", indicator, if on { "allumé" } else { "éteint" });
        }
        *slot = on;
    }
}
