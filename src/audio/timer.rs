//! Timer périodique jouant le rôle d'interruption d'échantillonnage
//!
//! Chaque échéance est mesurée depuis le déclenchement précédent, et non
//! depuis l'échéance précédente (délai « négatif » du SDK Pico).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// En dessous de ce délai on attend activement plutôt que de dormir
const SPIN_THRESHOLD: Duration = Duration::from_millis(1);

/// Callback exécuté à chaque échéance, dans le thread du timer
///
/// Retourner `false` arrête le timer.
pub trait TimerCallback: Send + 'static {
    fn fire(&mut self) -> bool;
}

/// Timer répétitif exécutant un callback dans un thread dédié
pub struct RepeatingTimer<C> {
    stop: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<C>>,
}

impl<C: TimerCallback> RepeatingTimer<C> {
    /// Arme le timer
    ///
    /// Le callback est appelé toutes les `period`.
    pub fn start(period: Duration, mut callback: C) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let thread_handle = thread::Builder::new()
            .name("sampling-timer".to_string())
            .spawn(move || {
                let mut deadline = Instant::now() + period;
                while !thread_stop.load(Ordering::Acquire) {
                    wait_until(deadline);
                    let fired_at = Instant::now();
                    if !callback.fire() {
                        break;
                    }
                    deadline = fired_at + period;
                }
                callback
            })?;

        Ok(Self {
            stop,
            thread_handle: Some(thread_handle),
        })
    }

    /// Désarme le timer et rend le callback
    ///
    /// Retourne `None` si le thread du timer a paniqué.
    pub fn cancel(mut self) -> Option<C> {
        self.stop.store(true, Ordering::Release);
        self.thread_handle.take().and_then(|handle| handle.join().ok())
    }
}

impl<C> Drop for RepeatingTimer<C> {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

fn wait_until(deadline: Instant) {
    loop {
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        let remaining = deadline - now;
        if remaining > SPIN_THRESHOLD {
            thread::sleep(remaining - SPIN_THRESHOLD);
        } else {
            std::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    struct Countdown {
        remaining: usize,
        fired: usize,
    }

    impl TimerCallback for Countdown {
        fn fire(&mut self) -> bool {
            self.fired += 1;
            self.remaining = self.remaining.saturating_sub(1);
            self.remaining > 0
        }
    }

    struct Shared {
        ticks: Arc<AtomicUsize>,
    }

    impl TimerCallback for Shared {
        fn fire(&mut self) -> bool {
            self.ticks.fetch_add(1, Ordering::Relaxed);
            true
        }
    }

    struct Stamps {
        stamps: Arc<Mutex<Vec<Instant>>>,
        limit: usize,
    }

    impl TimerCallback for Stamps {
        fn fire(&mut self) -> bool {
            let mut stamps = self.stamps.lock().unwrap();
            stamps.push(Instant::now());
            stamps.len() < self.limit
        }
    }

    #[test]
    fn callback_returning_false_stops_the_timer() {
        let timer = RepeatingTimer::start(
            Duration::from_micros(50),
            Countdown {
                remaining: 5,
                fired: 0,
            },
        )
        .unwrap();

        thread::sleep(Duration::from_millis(20));
        let callback = timer.cancel().unwrap();
        assert_eq!(callback.fired, 5);
    }

    #[test]
    fn cancel_stops_further_ticks() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let timer = RepeatingTimer::start(
            Duration::from_micros(100),
            Shared {
                ticks: Arc::clone(&ticks),
            },
        )
        .unwrap();

        thread::sleep(Duration::from_millis(10));
        assert!(timer.cancel().is_some());

        let after_cancel = ticks.load(Ordering::Relaxed);
        assert!(after_cancel > 0);
        thread::sleep(Duration::from_millis(5));
        assert_eq!(ticks.load(Ordering::Relaxed), after_cancel);
    }

    #[test]
    fn ticks_are_spaced_by_at_least_one_period() {
        let period = Duration::from_millis(2);
        let stamps = Arc::new(Mutex::new(Vec::new()));
        let timer = RepeatingTimer::start(
            period,
            Stamps {
                stamps: Arc::clone(&stamps),
                limit: 4,
            },
        )
        .unwrap();

        thread::sleep(Duration::from_millis(50));
        assert!(timer.cancel().is_some());

        let stamps = stamps.lock().unwrap();
        assert_eq!(stamps.len(), 4);
        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= period);
        }
    }
}
