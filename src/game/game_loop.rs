//! Boucle de jeu
//!
//! Machine à états d'une seule tâche coopérative :
//! `Idle` → `Prompting` → `Recording` → `Classifying` → `Scoring` →
//! `Feedback` → `Idle`. Seule la sortie d'`Idle` attend un événement (front
//! descendant du bouton) ; les autres transitions sont inconditionnelles.

use super::evaluator::{check_labels, evaluate, Outcome, Verdict};
use super::state::{GameState, Prompt};
use super::palette::WORD_CURSOR_Y;
use crate::audio::{AcquisitionController, AnalogFrontEnd, CaptureError};
use crate::config::GameConfig;
use crate::hal::{Button, Indicator, Indicators, Screen};
use crate::inference::{classify, ClassificationResult, InferenceEngine, InferenceError};
use crate::game::Color;
use std::time::Instant;
use thiserror::Error;
use tokio::time::{sleep, Duration};

/// Position du compteur de série
const STREAK_AT: (i32, i32) = (500, 20);
/// Zone effacée avant de redessiner le compteur
const STREAK_REGION: (i32, i32) = (120, 100);
/// Position du message de résultat
const FEEDBACK_AT: (i32, i32) = (180, 100);
const WORD_TEXT_SIZE: u8 = 10;
const STATUS_TEXT_SIZE: u8 = 2;

/// Erreurs d'une manche, absorbées à la frontière de la manche
#[derive(Error, Debug)]
pub enum GameError {
    #[error("Erreur d'enregistrement: {0}")]
    Capture(#[from] CaptureError),

    #[error("Erreur de classification: {0}")]
    Inference(#[from] InferenceError),
}

/// État de la boucle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// En attente d'un appui
    Idle,
    /// Affichage du mot
    Prompting,
    /// Session d'enregistrement en cours
    Recording,
    /// Moteur d'inférence en cours
    Classifying,
    /// Évaluation du résultat
    Scoring,
    /// Affichage du verdict
    Feedback,
}

/// Périphériques pilotés par la boucle
pub struct Peripherals {
    pub screen: Box<dyn Screen>,
    pub button: Box<dyn Button>,
    pub indicators: Box<dyn Indicators>,
}

/// Boucle de jeu
pub struct GameLoop<E: InferenceEngine, F: AnalogFrontEnd> {
    config: GameConfig,
    recorder: AcquisitionController<F>,
    engine: E,
    io: Peripherals,
    state: GameState,
    status: GameStatus,
    booted_at: Instant,
    button_was_low: bool,
}

impl<E: InferenceEngine, F: AnalogFrontEnd> GameLoop<E, F> {
    /// Crée la boucle ; l'acquisition doit être initialisée
    pub fn new(
        config: GameConfig,
        recorder: AcquisitionController<F>,
        engine: E,
        io: Peripherals,
    ) -> Self {
        Self {
            config,
            recorder,
            engine,
            io,
            state: GameState::new(),
            status: GameStatus::Idle,
            booted_at: Instant::now(),
            button_was_low: false,
        }
    }

    #[cfg(test)]
    pub fn status(&self) -> GameStatus {
        self.status
    }

    #[cfg(test)]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    fn set_status(&mut self, status: GameStatus) {
        if self.status != status {
            tracing::trace!("{:?} → {:?}", self.status, status);
        }
        self.status = status;
    }

    /// Tourne indéfiniment
    pub async fn run(&mut self) {
        tracing::info!("Boucle de jeu démarrée (moteur: {})", self.engine.name());
        loop {
            self.wait_for_press().await;
            self.play_round().await;
            sleep(Duration::from_millis(self.config.feedback_ms)).await;
        }
    }

    /// `Idle` : attend un front descendant du bouton
    ///
    /// Le niveau est relu à l'entrée : un appui déjà en cours (ou mémorisé
    /// pendant la manche précédente) ne lance pas de manche.
    pub async fn wait_for_press(&mut self) {
        self.set_status(GameStatus::Idle);
        self.button_was_low = self.io.button.is_low();
        let poll = Duration::from_millis(self.config.button_poll_ms);
        while !self.poll_button() {
            sleep(poll).await;
        }
        tracing::info!("Bouton appuyé");
    }

    /// Détection de front : vrai uniquement au passage haut → bas
    fn poll_button(&mut self) -> bool {
        let low = self.io.button.is_low();
        let pressed = low && !self.button_was_low;
        self.button_was_low = low;
        pressed
    }

    /// Tire une manche et la joue
    pub async fn play_round(&mut self) -> Verdict {
        let seed = self.booted_at.elapsed().as_millis() as u64;
        self.play_prompt(Prompt::draw(seed)).await
    }

    /// Joue une manche avec le mot et la couleur donnés
    pub async fn play_prompt(&mut self, prompt: Prompt) -> Verdict {
        self.set_status(GameStatus::Prompting);
        self.state.prompt = Some(prompt);
        tracing::info!(
            "Manche: mot {} en {}",
            prompt.word.text,
            prompt.color.display_name()
        );
        self.draw_prompt(prompt);
        sleep(Duration::from_millis(self.config.settle_ms)).await;

        let verdict = match self.capture_and_classify().await {
            Ok(result) => {
                self.set_status(GameStatus::Scoring);
                evaluate(
                    &result,
                    prompt.color,
                    self.state.streak,
                    self.config.confidence_threshold,
                )
            }
            Err(e) => {
                tracing::warn!("Manche échouée: {}", e);
                Verdict::failed()
            }
        };

        self.set_status(GameStatus::Feedback);
        self.state.apply(&verdict);
        self.show_verdict(&verdict);

        self.set_status(GameStatus::Idle);
        verdict
    }

    async fn capture_and_classify(&mut self) -> Result<ClassificationResult, GameError> {
        self.set_status(GameStatus::Recording);
        let recorded = self.recorder.record().await;
        self.io.indicators.set(Indicator::General, false);
        recorded?;

        self.set_status(GameStatus::Classifying);
        let buffer = self.recorder.buffer()?;
        let result = classify(&mut self.engine, buffer)?;
        check_labels(&result)?;
        Ok(result)
    }

    fn draw_prompt(&mut self, prompt: Prompt) {
        let screen = &mut self.io.screen;
        screen.clear();
        screen.set_text_size(WORD_TEXT_SIZE);
        screen.set_text_color(prompt.color);
        screen.set_cursor(prompt.word.cursor_x, WORD_CURSOR_Y);
        screen.write_str(prompt.word.text);
        self.draw_streak();
    }

    fn draw_streak(&mut self) {
        let screen = &mut self.io.screen;
        screen.set_text_size(STATUS_TEXT_SIZE);
        screen.set_text_color(Color::White);
        screen.set_cursor(STREAK_AT.0, STREAK_AT.1);
        screen.write_str(&format!("Streak: {}", self.state.streak));
    }

    fn show_verdict(&mut self, verdict: &Verdict) {
        let indicators = &mut self.io.indicators;
        for indicator in Indicator::CLASSES {
            indicators.set(indicator, false);
        }
        if let Some(indicator) = verdict.detected_color().and_then(Indicator::for_color) {
            indicators.set(indicator, true);
        }

        let expected = self.state.prompt.map_or("?", |p| p.color.label());
        match verdict.outcome {
            Outcome::Correct => {
                tracing::info!("Gagné : {} ! Série: {}", expected, self.state.streak);
                indicators.set(Indicator::General, true);
            }
            Outcome::Incorrect => tracing::info!(
                "Dommage... détecté {:?}, attendu {}",
                self.state.last_detected,
                expected
            ),
            Outcome::Failed => tracing::info!("Classification échouée"),
        }

        let screen = &mut self.io.screen;
        screen.set_text_size(STATUS_TEXT_SIZE);
        screen.set_text_color(Color::White);
        screen.clear_region(STREAK_AT.0, STREAK_AT.1, STREAK_REGION.0, STREAK_REGION.1);
        screen.set_cursor(FEEDBACK_AT.0, FEEDBACK_AT.1);
        screen.write_str(&verdict.message());
        self.draw_streak();
    }
}
