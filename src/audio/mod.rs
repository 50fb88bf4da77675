//! Module d'acquisition audio
//!
//! Échantillonnage périodique du frontal analogique dans un buffer fixe,
//! et session d'enregistrement bloquante côté premier plan.

mod acquisition;
mod buffer;
mod frontend;
mod timer;

pub use acquisition::{AcquisitionConfig, AcquisitionController};
pub use buffer::SampleBuffer;
pub use frontend::{AnalogFrontEnd, Microphone};

use thiserror::Error;

/// Erreurs liées à l'acquisition
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Allocation du buffer impossible ({requested} échantillons)")]
    Allocation { requested: usize },

    #[error("Acquisition non initialisée")]
    NotInitialized,

    #[error("Une session d'enregistrement est déjà armée")]
    AlreadyArmed,

    #[error("Lecture hors du buffer: offset {offset}, longueur {length}, capacité {capacity}")]
    OutOfRange {
        offset: usize,
        length: usize,
        capacity: usize,
    },

    #[error("Aucun périphérique audio trouvé")]
    NoDevice,

    #[error("Erreur de configuration: {0}")]
    ConfigError(String),

    #[error("Erreur de stream: {0}")]
    StreamError(String),
}
