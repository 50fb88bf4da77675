//! Périphériques du jeu
//!
//! Écran texte, bouton actif bas et voyants. Le cœur du jeu ne dépend que de
//! ces traits ; les implémentations hôte sont dans [`terminal`].

mod terminal;

pub use terminal::{LogIndicators, StdinButton, TerminalScreen};

use crate::game::Color;

/// Largeur de l'écran (px)
pub const SCREEN_WIDTH: i32 = 640;
/// Hauteur de l'écran (px)
pub const SCREEN_HEIGHT: i32 = 480;

/// Surface de rendu texte
///
/// Appels séquentiels, jamais relue par le jeu.
pub trait Screen {
    /// Efface un rectangle (fond noir)
    fn clear_region(&mut self, x: i32, y: i32, width: i32, height: i32);

    fn set_text_size(&mut self, size: u8);

    fn set_text_color(&mut self, color: Color);

    fn set_cursor(&mut self, x: i32, y: i32);

    /// Écrit à la position du curseur
    fn write_str(&mut self, text: &str);

    /// Efface tout l'écran
    fn clear(&mut self) {
        self.clear_region(0, 0, SCREEN_WIDTH, SCREEN_HEIGHT);
    }
}

/// Bouton de déclenchement, scruté
#[cfg_attr(test, mockall::automock)]
pub trait Button {
    /// Niveau bas = bouton enfoncé
    fn is_low(&mut self) -> bool;
}

/// Voyants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// Voyant général, allumé sur une bonne réponse
    General,
    Red,
    Green,
    Yellow,
}

impl Indicator {
    /// Voyants associés à une classe
    pub const CLASSES: [Indicator; 3] = [Indicator::Red, Indicator::Green, Indicator::Yellow];

    /// Voyant de la classe détectée, si elle en a un
    pub fn for_color(color: Color) -> Option<Self> {
        match color {
            Color::Red => Some(Indicator::Red),
            Color::Green => Some(Indicator::Green),
            Color::Yellow => Some(Indicator::Yellow),
            _ => None,
        }
    }
}

/// Lignes de sortie des voyants
#[cfg_attr(test, mockall::automock)]
pub trait Indicators {
    fn set(&mut self, indicator: Indicator, on: bool);
}
