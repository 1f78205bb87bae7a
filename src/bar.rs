//! Incremental level bars (battery, volume).
//!
//! A bar of N LEDs shows a 0-100 level. Each animation is planned up front
//! as a list of single-LED steps and then replayed by the player one step at
//! a time, so the player can stop between any two steps and still know
//! exactly what is on screen.

use heapless::Vec;

use crate::frame::{Frame, MAX_FRAME_LEN, blank};
use crate::scheduler::AnimationClass;
use crate::status::BarMemory;

/// Which bar an animation drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarKind {
    Battery,
    Volume,
}

impl BarKind {
    pub const fn class(self) -> AnimationClass {
        match self {
            Self::Battery => AnimationClass::Charging,
            Self::Volume => AnimationClass::Volume,
        }
    }
}

/// Number of LEDs lit for `level` on a bar of `leds` LEDs
///
/// A reserved dot LED (battery) is always lit together with the first level LED.
pub fn amount(level: u8, leds: usize, has_dot: bool) -> usize {
    let offset = if has_dot { 2 } else { 1 };
    let level = f64::from(level.min(100));
    let span = leds.saturating_sub(offset) as f64;
    let lit = libm::floor(level / 100.0 * span) as usize + offset;
    lit.min(leds)
}

/// One step of a bar animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarStep {
    /// LED changed by this step, recorded as the bar's last LED
    pub led: Option<usize>,
    /// Whether the frame must be flushed after this step
    pub render: bool,
    /// Whether the player waits one frame interval after flushing
    pub pace: bool,
}

#[derive(Debug, Clone, Copy)]
struct Op {
    led: Option<usize>,
    value: u16,
    render: bool,
    pace: bool,
}

impl Op {
    const fn lit(led: usize, value: u16, animate: bool) -> Self {
        Self {
            led: Some(led),
            value,
            render: animate,
            pace: animate,
        }
    }

    const fn flush() -> Self {
        Self {
            led: None,
            value: 0,
            render: true,
            pace: false,
        }
    }
}

/// Planned bar animation
///
/// Iterating applies each step to [`BarAnimation::frame`].
#[derive(Debug, Clone)]
pub struct BarAnimation {
    frame: Frame,
    ops: Vec<Op, { MAX_FRAME_LEN + 1 }>,
    cursor: usize,
}

impl BarAnimation {
    fn new(frame: Frame) -> Self {
        Self {
            frame,
            ops: Vec::new(),
            cursor: 0,
        }
    }

    fn push(&mut self, op: Op) {
        let _ = self.ops.push(op);
    }

    /// Battery level bar
    ///
    /// Grows one LED per frame from an empty bar. When the previous run left
    /// LEDs behind (`led_last != 0`) the final bar is shown in one frame. The
    /// dot LED never gets a frame of its own.
    ///
    /// Bars are capped at [`MAX_FRAME_LEN`] LEDs.
    pub fn charging(level: u8, memory: &BarMemory, leds: usize, dot: bool, max: u16) -> Self {
        let leds = leds.min(MAX_FRAME_LEN);
        let mut animation = Self::new(blank(leds));
        if level == 0 {
            animation.push(Op::flush());
            return animation;
        }

        let grow = memory.led_last == 0;
        for led in 0..amount(level, leds, dot) {
            let skip_frame = dot && led == 0;
            animation.push(Op::lit(led, max, grow && !skip_frame));
        }
        if !grow {
            animation.push(Op::flush());
        }
        animation
    }

    /// Volume level bar
    ///
    /// From an empty bar the LEDs grow one per frame. Otherwise the previous
    /// bar is extended (`increase`) or shrunk (`decrease`) starting at the
    /// last touched LED. A bar without LEDs plays nothing.
    ///
    /// Bars are capped at [`MAX_FRAME_LEN`] LEDs.
    pub fn volume(
        level: u8,
        memory: &BarMemory,
        leds: usize,
        increase: bool,
        decrease: bool,
        max: u16,
    ) -> Self {
        let leds = leds.min(MAX_FRAME_LEN);
        if level == 0 {
            let mut animation = Self::new(blank(leds));
            animation.push(Op {
                led: Some(0),
                value: 0,
                render: true,
                pace: false,
            });
            return animation;
        }

        let amount = amount(level, leds, false);
        let Some(next) = amount.checked_sub(1) else {
            return Self::new(blank(leds));
        };
        let last = memory.led_last;

        if last == 0 {
            let mut animation = Self::new(blank(leds));
            for led in 0..=next {
                animation.push(Op::lit(led, max, true));
            }
            return animation;
        }

        let previous = match &memory.snapshot {
            Some(snapshot) if snapshot.len() == leds => snapshot.clone(),
            _ => blank(leds),
        };
        let mut animation = Self::new(previous);
        if increase {
            for led in last..=next {
                animation.push(Op::lit(led, max, true));
            }
        } else if decrease {
            for led in (amount..=last.min(leds.saturating_sub(1))).rev() {
                animation.push(Op::lit(led, 0, true));
            }
        }
        animation
    }

    /// Reverse of the last stored bar, turning lit LEDs off from the top down
    ///
    /// Returns `None` when nothing was ever played, the last level was zero or
    /// the bar is already dark.
    pub fn dismiss(memory: &BarMemory) -> Option<Self> {
        if memory.level_last == 0 {
            return None;
        }
        let snapshot = memory.snapshot.clone()?;
        let mut animation = Self::new(snapshot);
        for led in (0..animation.frame.len()).rev() {
            if animation.frame[led] != 0 {
                animation.push(Op::lit(led, 0, true));
            }
        }
        (animation.remaining() > 0).then_some(animation)
    }

    /// Bar as it stands after the steps taken so far
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Number of steps left
    pub fn remaining(&self) -> usize {
        self.ops.len() - self.cursor
    }
}

impl Iterator for BarAnimation {
    type Item = BarStep;

    fn next(&mut self) -> Option<Self::Item> {
        let op = *self.ops.get(self.cursor)?;
        self.cursor += 1;
        if let Some(slot) = op.led.and_then(|led| self.frame.get_mut(led)) {
            *slot = op.value;
        }
        Some(BarStep {
            led: op.led,
            render: op.render,
            pace: op.pace,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: u16 = 4000;

    fn lit(frame: &Frame) -> usize {
        frame.iter().filter(|value| **value != 0).count()
    }

    fn memory(led_last: usize, level_last: u8, snapshot: Option<Frame>) -> BarMemory {
        BarMemory {
            led_last,
            level_last,
            snapshot,
        }
    }

    #[test]
    fn test_amount_matches_formula() {
        for leds in 1..=MAX_FRAME_LEN {
            let mut previous = 0;
            for level in 0..=100u8 {
                let expected =
                    libm::floor(f64::from(level) / 100.0 * (leds - 1) as f64) as usize + 1;
                let value = amount(level, leds, false);
                assert_eq!(value, expected);
                assert!(value >= previous);
                previous = value;
            }
            assert_eq!(amount(100, leds, false), leds);
        }
    }

    #[test]
    fn test_amount_with_dot() {
        assert_eq!(amount(1, 8, true), 2);
        assert_eq!(amount(50, 8, true), 5);
        assert_eq!(amount(100, 8, true), 8);
    }

    #[test]
    fn test_battery_dot_skips_first_frame() {
        let mut animation = BarAnimation::charging(1, &BarMemory::default(), 8, true, MAX);
        let steps: std::vec::Vec<_> = animation.by_ref().collect();
        assert_eq!(steps.len(), 2);
        assert!(!steps[0].render);
        assert_eq!(steps[0].led, Some(0));
        assert!(steps[1].render);
        assert_eq!(lit(animation.frame()), 2);
    }

    #[test]
    fn test_battery_resume_renders_once() {
        let mut animation = BarAnimation::charging(100, &memory(3, 50, None), 8, true, MAX);
        let rendered = animation.by_ref().filter(|step| step.render).count();
        assert_eq!(rendered, 1);
        assert_eq!(lit(animation.frame()), 8);
    }

    #[test]
    fn test_volume_increase_starts_at_last_led() {
        let first = amount(40, 10, false);
        let mut from_empty = BarAnimation::volume(40, &BarMemory::default(), 10, true, false, MAX);
        let leds: std::vec::Vec<_> = from_empty.by_ref().filter_map(|step| step.led).collect();
        assert_eq!(leds, (0..first).collect::<std::vec::Vec<_>>());

        let stored = memory(first - 1, 40, Some(from_empty.frame().clone()));
        let mut grow = BarAnimation::volume(70, &stored, 10, true, false, MAX);
        let leds: std::vec::Vec<_> = grow.by_ref().filter_map(|step| step.led).collect();
        assert_eq!(leds, (first - 1..amount(70, 10, false)).collect::<std::vec::Vec<_>>());
        assert_eq!(lit(grow.frame()), amount(70, 10, false));
    }

    #[test]
    fn test_volume_decrease_clears_top_down() {
        let mut snapshot = blank(10);
        snapshot.iter_mut().for_each(|value| *value = MAX);
        let mut shrink = BarAnimation::volume(30, &memory(9, 100, Some(snapshot)), 10, false, true, MAX);
        let leds: std::vec::Vec<_> = shrink.by_ref().filter_map(|step| step.led).collect();
        let target = amount(30, 10, false);
        assert_eq!(leds, (target..=9).rev().collect::<std::vec::Vec<_>>());
        assert_eq!(lit(shrink.frame()), target);
    }

    #[test]
    fn test_zero_level_clears_in_one_step() {
        let mut battery = BarAnimation::charging(0, &memory(4, 50, None), 8, true, MAX);
        assert_eq!(battery.remaining(), 1);
        assert_eq!(battery.next().map(|step| step.pace), Some(false));
        assert_eq!(lit(battery.frame()), 0);

        let volume = BarAnimation::volume(0, &memory(4, 50, None), 8, false, true, MAX);
        assert_eq!(volume.remaining(), 1);
    }

    #[test]
    fn test_grow_then_dismiss_restores_empty_bar() {
        for level in 1..=100u8 {
            let mut grow = BarAnimation::volume(level, &BarMemory::default(), 12, false, false, MAX);
            grow.by_ref().for_each(drop);
            let stored = memory(amount(level, 12, false) - 1, level, Some(grow.frame().clone()));
            let mut dismiss = BarAnimation::dismiss(&stored).unwrap();
            dismiss.by_ref().for_each(drop);
            assert_eq!(lit(dismiss.frame()), 0);
        }
    }

    #[test]
    fn test_bar_without_leds_plays_nothing() {
        let volume = BarAnimation::volume(50, &BarMemory::default(), 0, true, false, MAX);
        assert_eq!(volume.remaining(), 0);
        assert!(volume.frame().is_empty());

        let battery = BarAnimation::charging(50, &BarMemory::default(), 0, true, MAX);
        assert_eq!(battery.remaining(), 0);
    }

    #[test]
    fn test_oversized_bar_is_capped() {
        let mut volume =
            BarAnimation::volume(100, &BarMemory::default(), MAX_FRAME_LEN + 10, true, false, MAX);
        assert_eq!(volume.remaining(), MAX_FRAME_LEN);
        volume.by_ref().for_each(drop);
        assert_eq!(volume.frame().len(), MAX_FRAME_LEN);
        assert_eq!(lit(volume.frame()), MAX_FRAME_LEN);

        let battery = BarAnimation::charging(
            100,
            &memory(3, 50, None),
            MAX_FRAME_LEN + 10,
            true,
            MAX,
        );
        // Every LED plus the final flush
        assert_eq!(battery.remaining(), MAX_FRAME_LEN + 1);
    }

    #[test]
    fn test_dismiss_without_state_is_noop() {
        assert!(BarAnimation::dismiss(&BarMemory::default()).is_none());
        assert!(BarAnimation::dismiss(&memory(0, 0, Some(blank(8)))).is_none());
        assert!(BarAnimation::dismiss(&memory(0, 30, None)).is_none());
        assert!(BarAnimation::dismiss(&memory(3, 30, Some(blank(8)))).is_none());
    }
}
