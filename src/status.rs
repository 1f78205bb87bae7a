//! Shared playback status.
//!
//! One register owned by the conductor and lent to every player. All fields
//! live behind a single critical-section mutex so readers never observe a
//! torn combination of owner, flags and bar memory.

use core::cell::RefCell;

use critical_section::Mutex;
use embassy_sync::waitqueue::MultiWakerRegistration;

use crate::bar::BarKind;
use crate::frame::Frame;
use crate::scheduler::AnimationClass;

/// Number of tasks that can park on the register before all of them are woken early.
const MAX_WAITERS: usize = 8;

/// Who currently owns the LEDs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Idle,
    Animation(AnimationClass),
    Call,
}

/// Last rendered state of a bar animation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BarMemory {
    /// Index of the LED touched by the last step
    pub led_last: usize,
    /// Level (0-100) of the last played animation
    pub level_last: u8,
    /// Bar as it was left on screen, `None` until first played
    pub snapshot: Option<Frame>,
}

impl BarMemory {
    const fn new() -> Self {
        Self {
            led_last: 0,
            level_last: 0,
            snapshot: None,
        }
    }
}

pub(crate) struct Status {
    pub(crate) owner: Owner,
    pub(crate) ticket: u32,
    pub(crate) call_enabled: bool,
    pub(crate) all_leds_active: bool,
    pub(crate) essential_active: bool,
    pub(crate) brightness: u16,
    pub(crate) battery: BarMemory,
    pub(crate) volume: BarMemory,
    pub(crate) waiters: MultiWakerRegistration<MAX_WAITERS>,
}

impl Status {
    pub(crate) fn bar_mut(&mut self, kind: BarKind) -> &mut BarMemory {
        match kind {
            BarKind::Battery => &mut self.battery,
            BarKind::Volume => &mut self.volume,
        }
    }
}

/// Playback status shared by every trigger and player
pub struct StatusRegister {
    inner: Mutex<RefCell<Status>>,
}

impl StatusRegister {
    /// Create an idle register with the given global brightness
    pub const fn new(brightness: u16) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Status {
                owner: Owner::Idle,
                ticket: 0,
                call_enabled: false,
                all_leds_active: false,
                essential_active: false,
                brightness,
                battery: BarMemory::new(),
                volume: BarMemory::new(),
                waiters: MultiWakerRegistration::new(),
            })),
        }
    }

    /// Run `f` with exclusive access to the status
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut Status) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow(cs).borrow_mut()))
    }

    /// Run `f` with exclusive access and wake every parked waiter afterwards
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut Status) -> R) -> R {
        self.with(|status| {
            let result = f(status);
            status.waiters.wake();
            result
        })
    }

    pub fn owner(&self) -> Owner {
        self.with(|status| status.owner)
    }

    /// Check if an ordinary (non-call) animation owns the LEDs
    pub fn is_animation_active(&self) -> bool {
        matches!(self.owner(), Owner::Animation(_))
    }

    /// Check if the call animation owns the LEDs
    pub fn is_call_active(&self) -> bool {
        self.owner() == Owner::Call
    }

    pub fn is_call_enabled(&self) -> bool {
        self.with(|status| status.call_enabled)
    }

    pub fn set_call_enabled(&self, enabled: bool) {
        self.update(|status| status.call_enabled = enabled);
    }

    pub fn all_leds_active(&self) -> bool {
        self.with(|status| status.all_leds_active)
    }

    pub fn set_all_leds_active(&self, active: bool) {
        self.update(|status| status.all_leds_active = active);
    }

    pub fn is_essential_active(&self) -> bool {
        self.with(|status| status.essential_active)
    }

    pub fn set_essential_active(&self, active: bool) {
        self.update(|status| status.essential_active = active);
    }

    /// Current global brightness
    pub fn brightness(&self) -> u16 {
        self.with(|status| status.brightness)
    }

    /// Set the global brightness
    ///
    /// Returns `true` if the value changed.
    pub fn set_brightness(&self, brightness: u16) -> bool {
        self.with(|status| {
            let changed = status.brightness != brightness;
            status.brightness = brightness;
            changed
        })
    }

    /// Snapshot of the battery bar memory
    pub fn battery(&self) -> BarMemory {
        self.bar(BarKind::Battery)
    }

    /// Snapshot of the volume bar memory
    pub fn volume(&self) -> BarMemory {
        self.bar(BarKind::Volume)
    }

    pub fn bar(&self, kind: BarKind) -> BarMemory {
        self.with(|status| status.bar_mut(kind).clone())
    }

    pub(crate) fn set_led_last(&self, kind: BarKind, led: usize) {
        self.with(|status| status.bar_mut(kind).led_last = led);
    }

    pub(crate) fn store_bar(&self, kind: BarKind, level: Option<u8>, snapshot: &Frame) {
        self.with(|status| {
            let memory = status.bar_mut(kind);
            if let Some(level) = level {
                memory.level_last = level;
            }
            memory.snapshot = Some(snapshot.clone());
        });
    }
}
