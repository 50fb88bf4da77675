//! Configuration du jeu
//!
//! Valeurs par défaut calquées sur le montage d'origine (micro amplifié,
//! ADC 12 bits, fenêtre de classification d'une seconde à 16kHz).

use anyhow::Context;
use std::str::FromStr;
use std::time::Duration;

/// Tension de référence de l'ADC (V)
const ADC_VREF: f32 = 3.3;
/// Polarisation de l'amplificateur micro (VCC/2)
const AMP_BIAS_VOLTS: f32 = 1.65;
/// Pleine échelle de l'ADC 12 bits
const ADC_FULL_SCALE: f32 = 4095.0;

/// Configuration d'une partie
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Taux d'échantillonnage de la capture (Hz)
    pub sample_rate: u32,
    /// Nombre d'échantillons bruts par fenêtre de classification
    pub n_samples: usize,
    /// Probabilité au-delà de laquelle une classe est considérée détectée
    pub confidence_threshold: f32,
    /// Point milieu de l'ADC, soustrait à chaque lecture
    pub adc_bias: i16,
    /// Délai entre l'affichage du mot et le début de l'enregistrement (ms)
    pub settle_ms: u64,
    /// Pause après l'affichage du résultat (ms)
    pub feedback_ms: u64,
    /// Période de scrutation du bouton (ms)
    pub button_poll_ms: u64,
    /// Commande du moteur d'inférence externe
    pub engine_command: Option<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            n_samples: 16000, // 1 seconde d'audio
            confidence_threshold: 0.6,
            adc_bias: default_adc_bias(),
            settle_ms: 700,
            feedback_ms: 500,
            button_poll_ms: 10,
            engine_command: None,
        }
    }
}

/// Code ADC correspondant à la polarisation de l'amplificateur
pub fn default_adc_bias() -> i16 {
    ((AMP_BIAS_VOLTS * ADC_FULL_SCALE) / ADC_VREF) as i16
}

impl GameConfig {
    /// Charge la configuration depuis les variables `STROOP_*`
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        override_from(&lookup, "STROOP_SAMPLE_RATE", &mut config.sample_rate)?;
        override_from(&lookup, "STROOP_N_SAMPLES", &mut config.n_samples)?;
        override_from(&lookup, "STROOP_THRESHOLD", &mut config.confidence_threshold)?;
        override_from(&lookup, "STROOP_ADC_BIAS", &mut config.adc_bias)?;
        override_from(&lookup, "STROOP_SETTLE_MS", &mut config.settle_ms)?;
        override_from(&lookup, "STROOP_FEEDBACK_MS", &mut config.feedback_ms)?;
        override_from(&lookup, "STROOP_BUTTON_POLL_MS", &mut config.button_poll_ms)?;

        if let Some(command) = lookup("STROOP_ENGINE_CMD") {
            let command = command.trim().to_string();
            if !command.is_empty() {
                config.engine_command = Some(command);
            }
        }

        anyhow::ensure!(config.sample_rate > 0, "STROOP_SAMPLE_RATE doit être > 0");
        anyhow::ensure!(
            (0.0..=1.0).contains(&config.confidence_threshold),
            "STROOP_THRESHOLD doit être dans [0, 1]"
        );

        Ok(config)
    }

    /// Période d'échantillonnage (62,5µs à 16kHz)
    pub fn sampling_period(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.sample_rate))
    }
}

fn override_from<F, T>(lookup: &F, key: &str, target: &mut T) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Some(raw) = lookup(key) {
        *target = raw
            .trim()
            .parse()
            .with_context(|| format!("valeur invalide pour {}: {:?}", key, raw))?;
    }
    Ok(())
}
