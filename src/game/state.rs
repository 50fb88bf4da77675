//! État d'une partie : tirage de la manche et série en cours

use super::evaluator::Verdict;
use super::palette::{Color, Word, WORDS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Mot affiché et couleur de la police
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prompt {
    pub color: Color,
    pub word: Word,
}

impl Prompt {
    /// Tire une manche ; la graine est re-dérivée à chaque manche
    pub fn draw(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let color = Color::ALL[rng.gen_range(0..Color::ALL.len())];
        let word = WORDS[rng.gen_range(0..WORDS.len())];
        Self { color, word }
    }
}

/// État partagé entre les manches, possédé par la boucle de jeu
#[derive(Debug, Clone, Default)]
pub struct GameState {
    /// Bonnes réponses consécutives
    pub streak: u32,
    /// Manche en cours
    pub prompt: Option<Prompt>,
    /// Dernier label détecté
    pub last_detected: Option<String>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reporte le verdict d'une manche
    pub fn apply(&mut self, verdict: &Verdict) {
        self.streak = verdict.streak;
        self.last_detected = verdict.detected.clone();
    }
}
