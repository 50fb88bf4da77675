//! Buffer d'échantillons partagé entre l'interruption et le premier plan
//!
//! L'interruption est le seul écrivain pendant une session ; le premier plan
//! ne lit qu'après avoir observé `ready`. Le drapeau est publié en `Release`
//! après la dernière écriture, et lu en `Acquire`.

use super::CaptureError;
use std::sync::atomic::{AtomicBool, AtomicI16, AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Buffer de capture de taille fixe
pub struct SampleBuffer {
    samples: Box<[AtomicI16]>,
    cursor: AtomicUsize,
    ready: AtomicBool,
    complete: Notify,
}

impl SampleBuffer {
    /// Réserve un buffer de `n_samples` échantillons
    ///
    /// Échoue sans paniquer si l'allocation est impossible.
    pub fn try_allocate(n_samples: usize) -> Result<Self, CaptureError> {
        if n_samples == 0 {
            return Err(CaptureError::ConfigError(
                "le buffer doit contenir au moins un échantillon".to_string(),
            ));
        }

        let mut samples = Vec::new();
        samples
            .try_reserve_exact(n_samples)
            .map_err(|_| CaptureError::Allocation {
                requested: n_samples,
            })?;
        samples.extend((0..n_samples).map(|_| AtomicI16::new(0)));

        Ok(Self {
            samples: samples.into_boxed_slice(),
            cursor: AtomicUsize::new(0),
            ready: AtomicBool::new(false),
            complete: Notify::new(),
        })
    }

    /// Remet le curseur à zéro et baisse le drapeau
    ///
    /// Ne doit être appelé que timer désarmé.
    pub fn reset(&self) {
        self.cursor.store(0, Ordering::Relaxed);
        self.ready.store(false, Ordering::Release);
    }

    /// Un tick d'acquisition
    ///
    /// Stocke `value` tant qu'il reste de la place. Une fois plein, le tick
    /// suivant publie `ready` sans rien écrire. Retourne `true` si
    /// l'échantillon a été stocké.
    pub fn push(&self, value: i16) -> bool {
        let index = self.cursor.load(Ordering::Relaxed);
        if index < self.samples.len() {
            self.samples[index].store(value, Ordering::Relaxed);
            self.cursor.store(index + 1, Ordering::Relaxed);
            true
        } else {
            self.publish_ready();
            false
        }
    }

    /// Indique si le prochain tick publiera `ready`
    pub fn is_full(&self) -> bool {
        self.cursor.load(Ordering::Relaxed) >= self.samples.len()
    }

    /// Publie `ready` ; dernière écriture de l'interruption
    pub fn publish_ready(&self) {
        // On ne réveille le premier plan qu'à la transition
        if !self.ready.swap(true, Ordering::AcqRel) {
            self.complete.notify_one();
        }
    }

    /// Le buffer est-il complet et publié ?
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Attend la publication de `ready`
    pub async fn wait_ready(&self) {
        loop {
            let notified = self.complete.notified();
            if self.is_ready() {
                return;
            }
            notified.await;
        }
    }

    /// Nombre d'échantillons écrits depuis le dernier reset
    pub fn len(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacité fixe du buffer
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Lit l'échantillon `index`
    #[cfg(test)]
    pub fn get(&self, index: usize) -> Option<i16> {
        self.samples.get(index).map(|s| s.load(Ordering::Relaxed))
    }

    /// Copie `out.len()` échantillons depuis `offset`, convertis en float
    ///
    /// Simple conversion de type, sans mise à l'échelle.
    pub fn copy_as_f32(&self, offset: usize, out: &mut [f32]) -> Result<(), CaptureError> {
        let end = offset
            .checked_add(out.len())
            .filter(|&end| end <= self.samples.len())
            .ok_or(CaptureError::OutOfRange {
                offset,
                length: out.len(),
                capacity: self.samples.len(),
            })?;

        for (dst, src) in out.iter_mut().zip(&self.samples[offset..end]) {
            *dst = f32::from(src.load(Ordering::Relaxed));
        }
        Ok(())
    }
}

impl std::fmt::Debug for SampleBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleBuffer")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_buffer_is_empty_and_not_ready() {
        let buffer = SampleBuffer::try_allocate(4).unwrap();
        assert_eq!(buffer.capacity(), 4);
        assert!(buffer.is_empty());
        assert!(!buffer.is_ready());
    }

    #[test]
    fn ready_is_published_on_the_tick_after_the_last_sample() {
        let buffer = SampleBuffer::try_allocate(3).unwrap();

        assert!(buffer.push(10));
        assert!(buffer.push(-20));
        assert!(buffer.push(30));
        assert!(buffer.is_full());
        assert!(!buffer.is_ready());

        assert!(!buffer.push(99));
        assert!(buffer.is_ready());
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.get(2), Some(30));
    }

    #[test]
    fn no_writes_after_ready() {
        let buffer = SampleBuffer::try_allocate(2).unwrap();
        buffer.push(1);
        buffer.push(2);
        buffer.push(3);
        buffer.push(4);

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.get(0), Some(1));
        assert_eq!(buffer.get(1), Some(2));
        assert_eq!(buffer.get(2), None);
    }

    #[test]
    fn reset_starts_a_new_window() {
        let buffer = SampleBuffer::try_allocate(1).unwrap();
        buffer.push(5);
        buffer.push(0);
        assert!(buffer.is_ready());

        buffer.reset();
        assert!(buffer.is_empty());
        assert!(!buffer.is_ready());
        assert!(buffer.push(7));
        assert_eq!(buffer.get(0), Some(7));
    }

    #[test]
    fn allocation_failures_are_reported() {
        assert!(matches!(
            SampleBuffer::try_allocate(0),
            Err(CaptureError::ConfigError(_))
        ));
        assert!(matches!(
            SampleBuffer::try_allocate(usize::MAX),
            Err(CaptureError::Allocation { .. })
        ));
    }

    #[test]
    fn copy_as_f32_is_a_plain_cast() {
        let buffer = SampleBuffer::try_allocate(4).unwrap();
        for v in [-2048, -1, 0, 2047] {
            buffer.push(v);
        }

        let mut out = [0.0f32; 2];
        buffer.copy_as_f32(1, &mut out).unwrap();
        assert_eq!(out, [-1.0, 0.0]);

        let mut too_long = [0.0f32; 3];
        assert!(matches!(
            buffer.copy_as_f32(2, &mut too_long),
            Err(CaptureError::OutOfRange { offset: 2, length: 3, capacity: 4 })
        ));
    }

    #[tokio::test]
    async fn wait_ready_returns_once_published_from_another_thread() {
        let buffer = std::sync::Arc::new(SampleBuffer::try_allocate(8).unwrap());
        let writer = std::sync::Arc::clone(&buffer);

        let handle = std::thread::spawn(move || {
            for i in 0..9 {
                writer.push(i);
            }
        });

        buffer.wait_ready().await;
        assert_eq!(buffer.len(), 8);
        assert_eq!(buffer.get(7), Some(7));
        handle.join().unwrap();
    }
}
