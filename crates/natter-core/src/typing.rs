//! Three-dot "assistant is typing" animation
//!
//! Each dot waits out its stagger, fades in, fades out, and then repeats the
//! whole sequence, wait included. Later dots therefore run on longer cycles. Everything is a pure function of elapsed time; callers decide how
//! often to redraw.

use std::time::{Duration, Instant};

pub const DOT_COUNT: usize = 3;

const STAGGER: Duration = Duration::from_millis(150);
const FADE: Duration = Duration::from_millis(300);

/// Opacity of each dot, in `[0.0, 1.0]`, `elapsed` after the animation started
pub fn opacities(elapsed: Duration) -> [f32; DOT_COUNT] {
    let mut out = [0.0; DOT_COUNT];
    let fade = FADE.as_millis();

    for (i, opacity) in out.iter_mut().enumerate() {
        let delay = (STAGGER * i as u32).as_millis();
        let phase = elapsed.as_millis() % (delay + fade * 2);
        if phase < delay {
            continue;
        }

        let phase = phase - delay;
        *opacity = if phase < fade {
            phase as f32 / fade as f32
        } else {
            (fade * 2 - phase) as f32 / fade as f32
        };
    }

    out
}

/// Text rendering of the dots for terminals: faint, mid, bright
pub fn frame(elapsed: Duration) -> String {
    opacities(elapsed)
        .iter()
        .map(|&o| {
            if o < 0.34 {
                "·"
            } else if o < 0.67 {
                "•"
            } else {
                "●"
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// An animation anchored at the moment it started
#[derive(Debug, Clone, Copy)]
pub struct TypingIndicator {
    started: Instant,
}

impl TypingIndicator {
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    pub fn started_at(started: Instant) -> Self {
        Self { started }
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn opacities_at(&self, now: Instant) -> [f32; DOT_COUNT] {
        opacities(now.saturating_duration_since(self.started))
    }

    pub fn frame_at(&self, now: Instant) -> String {
        frame(now.saturating_duration_since(self.started))
    }

    pub fn frame_now(&self) -> String {
        self.frame_at(Instant::now())
    }
}

impl Default for TypingIndicator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_dots_start_staggered() {
        assert_eq!(opacities(ms(0)), [0.0, 0.0, 0.0]);

        let at_100 = opacities(ms(100));
        assert!(at_100[0] > 0.0);
        assert_eq!(at_100[1], 0.0);
        assert_eq!(at_100[2], 0.0);

        let at_200 = opacities(ms(200));
        assert!(at_200[1] > 0.0);
        assert_eq!(at_200[2], 0.0);
    }

    #[test]
    fn test_peak_and_trough() {
        assert!((opacities(ms(300))[0] - 1.0).abs() < 0.0001);
        assert!(opacities(ms(600))[0].abs() < 0.0001);
        // Second dot peaks one stagger later
        assert!((opacities(ms(450))[1] - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_each_dot_repeats_its_delay() {
        // Periods are 600, 750 and 900ms
        assert!((opacities(ms(900))[0] - 1.0).abs() < 0.0001);
        assert!((opacities(ms(1200))[1] - 1.0).abs() < 0.0001);
        assert!((opacities(ms(1500))[2] - 1.0).abs() < 0.0001);

        // Dot 1 is dark again during the wait at the start of its second cycle
        assert_eq!(opacities(ms(800))[1], 0.0);
    }

    #[test]
    fn test_opacities_stay_in_range() {
        for t in (0..5_000).step_by(7) {
            for o in opacities(ms(t)) {
                assert!((0.0..=1.0).contains(&o), "opacity {} out of range at {}ms", o, t);
            }
        }
    }

    #[test]
    fn test_frame_text() {
        assert_eq!(frame(ms(0)), "· · ·");
        assert_eq!(frame(ms(300)), "● • ·");
    }

    #[test]
    fn test_indicator_before_start_is_dark() {
        let now = Instant::now();
        let indicator = TypingIndicator::started_at(now + ms(1_000));
        assert_eq!(indicator.opacities_at(now), [0.0, 0.0, 0.0]);
    }
}
