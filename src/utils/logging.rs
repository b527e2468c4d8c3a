use log::{log_enabled, warn, Level};
use std::time::{Duration, Instant};

/// Scoped timer that traces the start and end of a labelled section and, when
/// given a sink, adds the elapsed time to it on drop.
pub struct ScopedTimer<'a> {
    label: &'a str,
    start: Instant,
    sink: Option<&'a mut Duration>,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(label: &'a str) -> Self {
        if log_enabled!(Level::Trace) {
            log::trace!("start {label}");
        }
        Self {
            label,
            start: Instant::now(),
            sink: None,
        }
    }

    pub fn recording(label: &'a str, sink: &'a mut Duration) -> Self {
        let mut timer = Self::new(label);
        timer.sink = Some(sink);
        timer
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        if let Some(sink) = self.sink.as_mut() {
            **sink += elapsed;
        }
        if log_enabled!(Level::Trace) {
            log::trace!("end {} ({} µs)", self.label, elapsed.as_micros());
        }
    }
}

/// Warns when a step left any particle with a non-finite position or velocity.
/// Returns true if such a particle was found.
pub fn warn_if_non_finite<I>(states: I, time: f32) -> bool
where
    I: IntoIterator<Item = (usize, glam::Vec2, glam::Vec2)>,
{
    let bad = states
        .into_iter()
        .find(|(_, p, v)| !p.is_finite() || !v.is_finite());
    match bad {
        Some((index, p, v)) => {
            warn!("non-finite state at t={time:.4}: particle {index} p={p} v={v}");
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn recording_timer_accumulates() {
        let mut total = Duration::ZERO;
        {
            let _timer = ScopedTimer::recording("section", &mut total);
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(total >= Duration::from_millis(1));
    }

    #[test]
    fn detects_nan_velocity() {
        let states = vec![
            (0, Vec2::ZERO, Vec2::ZERO),
            (1, Vec2::ONE, Vec2::new(f32::NAN, 0.0)),
        ];
        assert!(warn_if_non_finite(states, 0.0));
        assert!(!warn_if_non_finite(vec![(0, Vec2::ONE, Vec2::ONE)], 0.0));
    }
}
