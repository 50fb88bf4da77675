//! Module d'inférence
//!
//! Frontière avec le moteur de classification externe : signal tiré à la
//! demande, résultat par classe, erreurs de statut.

mod engine;
mod external;
mod signal;

pub use engine::{ClassificationResult, InferenceEngine, InferenceError};
#[cfg(test)]
pub use engine::{Prediction, SignalSource};
pub use external::ExternalEngine;
pub use signal::classify;
