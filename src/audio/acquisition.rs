//! Contrôleur d'acquisition et session d'enregistrement
//!
//! Le contrôleur arme un [`RepeatingTimer`] dont chaque tick lit un
//! échantillon du frontal, retire la polarisation et l'écrit dans le
//! [`SampleBuffer`]. Une session d'enregistrement remet le buffer à zéro,
//! arme le timer, attend `ready` puis désarme.

use super::buffer::SampleBuffer;
use super::frontend::AnalogFrontEnd;
use super::timer::{RepeatingTimer, TimerCallback};
use super::CaptureError;
use std::sync::Arc;
use std::time::Duration;

/// Configuration de l'acquisition
#[derive(Debug, Clone)]
pub struct AcquisitionConfig {
    /// Période entre deux ticks
    pub sampling_period: Duration,
    /// Nombre d'échantillons par session
    pub n_samples: usize,
    /// Code ADC soustrait à chaque lecture
    pub adc_bias: i16,
}

/// Handler d'interruption : un échantillon par tick
struct SamplingIsr<F> {
    buffer: Arc<SampleBuffer>,
    front_end: F,
    bias: i16,
}

impl<F: AnalogFrontEnd> TimerCallback for SamplingIsr<F> {
    /// Tant qu'il reste de la place : lecture, correction de polarisation,
    /// écriture. Ensuite `ready` est publié et le frontal n'est plus lu.
    /// C'est le premier plan qui désarme.
    fn fire(&mut self) -> bool {
        if self.buffer.is_full() {
            self.buffer.publish_ready();
        } else {
            let value = (self.front_end.read() as i16).wrapping_sub(self.bias);
            self.buffer.push(value);
        }
        true
    }
}

enum TimerState<F> {
    Disarmed(F),
    Armed(RepeatingTimer<SamplingIsr<F>>),
}

/// Contrôleur d'acquisition
///
/// Au plus une session armée à la fois. Si le buffer n'a pas pu être alloué
/// au démarrage, le contrôleur existe mais refuse toute session.
pub struct AcquisitionController<F: AnalogFrontEnd> {
    config: AcquisitionConfig,
    buffer: Option<Arc<SampleBuffer>>,
    // `None` si le thread du timer a paniqué et emporté le frontal
    state: Option<TimerState<F>>,
}

impl<F: AnalogFrontEnd> AcquisitionController<F> {
    /// Alloue le buffer et prend possession du frontal
    pub fn new(front_end: F, config: AcquisitionConfig) -> Self {
        let buffer = match SampleBuffer::try_allocate(config.n_samples) {
            Ok(buffer) => Some(Arc::new(buffer)),
            Err(e) => {
                tracing::error!("Impossible de préparer l'échantillonnage audio: {}", e);
                None
            }
        };

        Self {
            config,
            buffer,
            state: Some(TimerState::Disarmed(front_end)),
        }
    }

    /// Le buffer a-t-il été alloué ?
    pub fn is_initialized(&self) -> bool {
        self.buffer.is_some()
    }

    /// Le timer est-il armé ?
    pub fn is_armed(&self) -> bool {
        matches!(self.state, Some(TimerState::Armed(_)))
    }

    /// Buffer de la dernière session
    pub fn buffer(&self) -> Result<&SampleBuffer, CaptureError> {
        self.buffer.as_deref().ok_or(CaptureError::NotInitialized)
    }

    /// Arme le timer d'échantillonnage
    pub fn start(&mut self) -> Result<(), CaptureError> {
        let buffer = Arc::clone(self.buffer.as_ref().ok_or(CaptureError::NotInitialized)?);

        let mut front_end = match self.state.take() {
            Some(TimerState::Disarmed(front_end)) => front_end,
            Some(armed) => {
                self.state = Some(armed);
                return Err(CaptureError::AlreadyArmed);
            }
            None => return Err(CaptureError::NotInitialized),
        };
        front_end.prepare();

        let isr = SamplingIsr {
            buffer,
            front_end,
            bias: self.config.adc_bias,
        };

        // Si le thread ne peut être créé, le frontal part avec l'ISR
        let timer = RepeatingTimer::start(self.config.sampling_period, isr)
            .map_err(|e| CaptureError::StreamError(e.to_string()))?;
        self.state = Some(TimerState::Armed(timer));
        tracing::trace!("Timer d'échantillonnage armé");
        Ok(())
    }

    /// Désarme le timer ; sans effet s'il ne l'est pas
    pub fn stop(&mut self) {
        match self.state.take() {
            Some(TimerState::Armed(timer)) => match timer.cancel() {
                Some(isr) => self.state = Some(TimerState::Disarmed(isr.front_end)),
                None => tracing::error!("Le timer d'échantillonnage a paniqué"),
            },
            other => self.state = other,
        }
    }

    /// Session d'enregistrement complète
    ///
    /// Au retour le buffer contient exactement `n_samples` échantillons.
    pub async fn record(&mut self) -> Result<(), CaptureError> {
        let buffer = Arc::clone(self.buffer.as_ref().ok_or(CaptureError::NotInitialized)?);
        if self.is_armed() {
            return Err(CaptureError::AlreadyArmed);
        }

        buffer.reset();
        debug_assert!(buffer.is_empty());
        self.start()?;

        tracing::debug!("En attente du buffer");
        buffer.wait_ready().await;
        tracing::debug!("Buffer prêt");

        self.stop();
        Ok(())
    }
}

impl<F: AnalogFrontEnd> Drop for AcquisitionController<F> {
    fn drop(&mut self) {
        self.stop();
    }
}
