//! Adaptateur entre le buffer de capture et le moteur d'inférence

use super::engine::{ClassificationResult, InferenceEngine, InferenceError, SignalSource};
use crate::audio::SampleBuffer;

/// Vue du buffer rempli, exposée au moteur comme signal
pub struct AudioSignal<'a> {
    buffer: &'a SampleBuffer,
}

impl<'a> AudioSignal<'a> {
    pub fn new(buffer: &'a SampleBuffer) -> Self {
        Self { buffer }
    }
}

impl SignalSource for AudioSignal<'_> {
    fn total_length(&self) -> usize {
        self.buffer.capacity()
    }

    fn get_data(&self, offset: usize, out: &mut [f32]) -> Result<(), InferenceError> {
        self.buffer
            .copy_as_f32(offset, out)
            .map_err(|e| InferenceError::Signal(e.to_string()))
    }
}

/// Lance une classification sur le buffer d'une session terminée
pub fn classify<E>(engine: &mut E, buffer: &SampleBuffer) -> Result<ClassificationResult, InferenceError>
where
    E: InferenceEngine + ?Sized,
{
    if !buffer.is_ready() {
        return Err(InferenceError::Signal(
            "le buffer n'est pas prêt".to_string(),
        ));
    }

    let signal = AudioSignal::new(buffer);
    let result = engine.run_classifier(&signal)?;

    tracing::info!(
        "Prédictions (DSP: {} ms., Classification: {} ms., Anomalie: {} ms.): {}",
        result.timing.dsp_ms,
        result.timing.classification_ms,
        result.timing.anomaly_ms,
        result.format_values()
    );
    Ok(result)
}
