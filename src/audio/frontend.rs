//! Frontal analogique : source d'un échantillon par tick
//!
//! Sur l'hôte, le micro est capturé avec cpal et bufferisé dans un ringbuf ;
//! le timer d'échantillonnage y prélève un échantillon à chaque tick.

use super::CaptureError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};
use ringbuf::{traits::*, HeapCons, HeapRb};

/// Valeur maximale d'un code ADC 12 bits
pub const ADC_MAX: u16 = 4095;

/// Source d'échantillons lue depuis le contexte d'interruption
///
/// `read` doit être O(1), sans allocation ni blocage.
pub trait AnalogFrontEnd: Send + 'static {
    /// Lit un code ADC 12 bits
    fn read(&mut self) -> u16;

    /// Appelé avant chaque armement du timer
    fn prepare(&mut self) {}
}

/// Stream micro actif
///
/// Le `Stream` cpal n'est pas `Send` : il reste au premier plan, seul le
/// consommateur du ring passe au timer via [`MicrophoneFrontEnd`].
pub struct Microphone {
    _stream: Stream,
}

impl Microphone {
    /// Ouvre le micro par défaut en mono au taux demandé
    ///
    /// Les échantillons sont centrés sur `adc_bias`, le code du silence.
    pub fn open(
        sample_rate: u32,
        ring_size: usize,
        adc_bias: i16,
    ) -> Result<(Self, MicrophoneFrontEnd), CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoDevice)?;

        let stream_config = StreamConfig {
            channels: 1,
            sample_rate: SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let rb = HeapRb::<f32>::new(ring_size.max(1));
        let (mut producer, consumer) = rb.split();

        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Les échantillons en trop sont perdus, le timer ne lit qu'à 16kHz
                    producer.push_slice(data);
                },
                |err| {
                    tracing::error!("Erreur stream audio: {}", err);
                },
                None,
            )
            .map_err(|e| CaptureError::StreamError(e.to_string()))?;

        stream
            .play()
            .map_err(|e| CaptureError::StreamError(e.to_string()))?;
        tracing::info!("Micro ouvert à {} Hz", sample_rate);

        Ok((
            Self { _stream: stream },
            MicrophoneFrontEnd::new(consumer, adc_bias),
        ))
    }

    /// Liste les périphériques d'entrée disponibles
    pub fn list_devices() -> Vec<String> {
        let host = cpal::default_host();
        host.input_devices()
            .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
            .unwrap_or_default()
    }
}

/// Frontal lisant le micro capturé par [`Microphone`]
pub struct MicrophoneFrontEnd {
    consumer: HeapCons<f32>,
    bias: u16,
}

impl MicrophoneFrontEnd {
    fn new(consumer: HeapCons<f32>, adc_bias: i16) -> Self {
        Self {
            consumer,
            bias: adc_bias.clamp(0, ADC_MAX as i16) as u16,
        }
    }
}

impl AnalogFrontEnd for MicrophoneFrontEnd {
    fn read(&mut self) -> u16 {
        match self.consumer.try_pop() {
            Some(sample) => float_to_adc(sample, self.bias),
            // Ring vide : silence
            None => self.bias,
        }
    }

    fn prepare(&mut self) {
        // Jette ce qui a été capturé entre deux sessions
        let stale = self.consumer.clear();
        if stale > 0 {
            tracing::trace!("{} échantillons périmés ignorés", stale);
        }
    }
}

/// Ramène un échantillon [-1, 1] sur l'échelle de l'ADC 12 bits, 0.0 tombant
/// exactement sur `bias`
pub fn float_to_adc(sample: f32, bias: u16) -> u16 {
    let half_span = f32::from(ADC_MAX) / 2.0;
    let code = f32::from(bias) + sample.clamp(-1.0, 1.0) * half_span;
    code.round().clamp(0.0, f32::from(ADC_MAX)) as u16
}
