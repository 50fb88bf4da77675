//! Stroop - jeu de couleurs à commande vocale
//!
//! Un mot s'affiche dans une couleur ; le joueur prononce la couleur de la
//! police, un moteur d'inférence classe l'enregistrement et la série avance.

mod audio;
mod config;
mod game;
mod hal;
mod inference;

use audio::{AcquisitionConfig, AcquisitionController, Microphone};
use config::GameConfig;
use game::{GameLoop, Peripherals};
use hal::{LogIndicators, StdinButton, TerminalScreen};
use inference::ExternalEngine;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialiser le logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stroop=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Stroop v{}", env!("CARGO_PKG_VERSION"));

    let config = GameConfig::from_env()?;
    tracing::debug!("Configuration: {:?}", config);

    let devices = Microphone::list_devices();
    tracing::info!("Périphériques audio détectés: {:?}", devices);

    // Le stream doit vivre aussi longtemps que la partie
    let (_microphone, front_end) = match Microphone::open(config.sample_rate, config.n_samples, config.adc_bias) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!("Impossible d'ouvrir le micro: {}", e);
            return idle().await;
        }
    };

    let recorder = AcquisitionController::new(
        front_end,
        AcquisitionConfig {
            sampling_period: config.sampling_period(),
            n_samples: config.n_samples,
            adc_bias: config.adc_bias,
        },
    );
    if !recorder.is_initialized() {
        return idle().await;
    }

    let engine = ExternalEngine::new(config.engine_command.as_deref());

    println!("🎤 Stroop - dites la couleur de la police, pas le mot");
    println!("   Appuyez sur Entrée pour lancer une manche");
    if !engine.is_configured() {
        println!("   ⚠️  Aucun moteur d'inférence (STROOP_ENGINE_CMD) : chaque manche échouera");
    }

    let io = Peripherals {
        screen: Box::new(TerminalScreen::stdout()),
        button: Box::new(StdinButton::spawn()),
        indicators: Box::new(LogIndicators::default()),
    };

    let mut game = GameLoop::new(config, recorder, engine, io);
    game.run().await;
    Ok(())
}

/// Démarrage raté : on reste en vie, sans jamais lancer de manche
async fn idle() -> anyhow::Result<()> {
    tracing::error!("Échantillonnage audio indisponible, aucune manche possible");
    std::future::pending().await
}
