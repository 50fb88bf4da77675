//! Module de jeu
//!
//! Tirage des manches, évaluation des résultats et boucle principale.

mod evaluator;
mod game_loop;
mod palette;
mod state;

pub use game_loop::{GameLoop, Peripherals};
pub use palette::Color;
