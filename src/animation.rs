//! Time-based tween that moves the displayed value towards a target.
//!
//! The animator never sleeps or schedules anything itself. The host calls
//! [`ValueAnimator::tick`] from its frame loop and passes the current time in.

use std::f64::consts::PI;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::text::round_to_tenth;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Slow start, fast middle, slow end: `cos((t + 1)π) / 2 + 0.5`.
    #[default]
    AccelerateDecelerate,
    Linear,
}

impl Easing {
    /// Maps progress in `[0, 1]` to eased progress in `[0, 1]`.
    #[inline]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::AccelerateDecelerate => ((t + 1.0) * PI).cos() / 2.0 + 0.5,
            Easing::Linear => t,
        }
    }
}

#[inline]
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

#[derive(Debug, Clone)]
struct Tween {
    from: f64,
    to: f64,
    started_at: Instant,
}

/// Drives `current_value` from wherever it is to a target over a fixed duration.
#[derive(Debug, Clone)]
pub struct ValueAnimator {
    current: f64,
    tween: Option<Tween>,
    duration: Duration,
    easing: Easing,
}

impl ValueAnimator {
    pub fn new(duration: Duration) -> Self {
        Self {
            current: 0.0,
            tween: None,
            duration,
            easing: Easing::default(),
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    #[inline]
    pub fn current_value(&self) -> f64 {
        self.current
    }

    #[inline]
    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    /// Where the value will settle once the tween in flight (if any) finishes.
    pub fn target_value(&self) -> f64 {
        self.tween.as_ref().map(|t| t.to).unwrap_or(self.current)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Starts a tween from the live value, replacing any tween in flight.
    pub fn animate_to(&mut self, target: f64, now: Instant) {
        self.tween = Some(Tween {
            from: self.current,
            to: target,
            started_at: now,
        });
    }

    /// Advances the tween to `now`. Returns `true` when a new value was published.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(tween) = self.tween.as_ref() else {
            return false;
        };

        let elapsed = now.saturating_duration_since(tween.started_at);
        if elapsed >= self.duration {
            // land exactly on the target, never on a rounded approximation
            self.current = tween.to;
            self.tween = None;
            return true;
        }

        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        let previous = self.current;
        self.current = round_to_tenth(lerp(tween.from, tween.to, self.easing.apply(t)));
        self.current != previous
    }
}
