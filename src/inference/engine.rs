//! Trait principal pour les moteurs d'inférence

use thiserror::Error;

/// Probabilité associée à une classe
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub value: f32,
}

impl Prediction {
    pub fn new(label: impl Into<String>, value: f32) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Durées mesurées par le moteur (ms)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timing {
    /// Extraction de caractéristiques
    pub dsp_ms: u64,
    /// Évaluation du modèle
    pub classification_ms: u64,
    /// Détection d'anomalie
    pub anomaly_ms: u64,
}

/// Résultat d'une classification
///
/// Les prédictions sont dans l'ordre des labels du modèle entraîné.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub predictions: Vec<Prediction>,
    pub timing: Timing,
    pub anomaly: Option<f32>,
}

impl ClassificationResult {
    /// Résultat sans timing ni anomalie
    pub fn from_predictions(predictions: Vec<Prediction>) -> Self {
        Self {
            predictions,
            timing: Timing::default(),
            anomaly: None,
        }
    }

    /// Rendu `[p0, p1, ...(, anomalie)]` pour les logs
    pub fn format_values(&self) -> String {
        let mut values: Vec<String> = self
            .predictions
            .iter()
            .map(|p| format!("{:.5}", p.value))
            .collect();
        if let Some(anomaly) = self.anomaly {
            values.push(format!("{:.3}", anomaly));
        }
        format!("[{}]", values.join(", "))
    }
}

/// Erreurs du moteur d'inférence
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Le moteur a retourné le statut {0}")]
    Status(i32),

    #[error("Lecture du signal impossible: {0}")]
    Signal(String),

    #[error("Lancement du moteur impossible: {0}")]
    Spawn(String),

    #[error("Sortie du moteur invalide: {0}")]
    Malformed(String),

    #[error("Aucun moteur configuré")]
    NotConfigured,
}

/// Signal fourni au moteur, lu à la demande
///
/// Le moteur tire les données par fenêtres `(offset, out.len())`.
pub trait SignalSource {
    /// Nombre total d'échantillons
    fn total_length(&self) -> usize;

    /// Remplit `out` avec les échantillons à partir de `offset`
    fn get_data(&self, offset: usize, out: &mut [f32]) -> Result<(), InferenceError>;
}

/// Trait principal pour les moteurs d'inférence
///
/// L'appel est synchrone : il bloque l'appelant le temps de la classification.
pub trait InferenceEngine: Send {
    /// Classifie le signal ; aucun résultat partiel en cas d'erreur
    fn run_classifier(
        &mut self,
        signal: &dyn SignalSource,
    ) -> Result<ClassificationResult, InferenceError>;

    /// Retourne le nom du moteur
    fn name(&self) -> &str;
}
