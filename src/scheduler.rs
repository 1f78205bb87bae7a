//! Admission control and interruption checks.
//!
//! Every player asks [`admit`] before touching the LEDs and polls
//! [`should_interrupt`] once per rendered step. Ownership is handed out as a
//! [`PlaybackGuard`]; dropping the guard gives the LEDs back, whatever way the
//! player exits.

use core::future::poll_fn;
use core::task::Poll;

use embassy_time::{Instant, with_deadline};

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::config::ADMISSION_TIMEOUT;
use crate::status::{Owner, Status, StatusRegister};

/// Kind of animation asking for the LEDs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationClass {
    /// Named notification pattern
    Pattern,
    /// Looping ringtone pattern
    Call,
    /// Battery level bar
    Charging,
    /// Volume level bar
    Volume,
    /// Essential indicator ramp
    Essential,
}

impl AnimationClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::Call => "call",
            Self::Charging => "charging",
            Self::Volume => "volume",
            Self::Essential => "essential",
        }
    }
}

/// Why a request was not started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    /// All LEDs are reserved by the diagnostic mode
    AllLedsActive,
    /// The call animation owns the LEDs
    CallActive,
    /// Another animation owns the LEDs and the request may not wait
    Busy,
    /// Another animation kept the LEDs for longer than the admission timeout
    TimedOut,
}

/// Ownership of the LEDs, released on drop
#[must_use = "the LEDs are released as soon as the guard is dropped"]
pub struct PlaybackGuard<'a> {
    status: &'a StatusRegister,
    class: AnimationClass,
    ticket: u32,
}

impl PlaybackGuard<'_> {
    pub const fn class(&self) -> AnimationClass {
        self.class
    }
}

impl Drop for PlaybackGuard<'_> {
    fn drop(&mut self) {
        let ticket = self.ticket;
        self.status.update(|status| {
            // A stale guard must not clear a newer owner
            if status.ticket == ticket {
                status.owner = Owner::Idle;
            }
        });
    }
}

/// Admission rules, independent of the requesting class
fn rules(status: &Status) -> Result<(), Refusal> {
    if status.all_leds_active {
        return Err(Refusal::AllLedsActive);
    }
    match status.owner {
        Owner::Call => Err(Refusal::CallActive),
        Owner::Animation(_) => Err(Refusal::Busy),
        Owner::Idle => Ok(()),
    }
}

/// Evaluate the admission rules and take ownership on success
fn evaluate(status: &mut Status, class: AnimationClass) -> Result<u32, Refusal> {
    rules(status)?;
    status.owner = match class {
        AnimationClass::Call => Owner::Call,
        class => Owner::Animation(class),
    };
    status.ticket = status.ticket.wrapping_add(1);
    Ok(status.ticket)
}

/// Check the admission rules without taking the LEDs
pub fn check(status: &StatusRegister) -> Result<(), Refusal> {
    status.with(|inner| rules(inner))
}

/// Try to take the LEDs without waiting
pub fn try_admit(
    status: &StatusRegister,
    class: AnimationClass,
) -> Result<PlaybackGuard<'_>, Refusal> {
    let ticket = status.with(|inner| evaluate(inner, class))?;
    Ok(PlaybackGuard {
        status,
        class,
        ticket,
    })
}

/// Deadline for a waiting request made now
pub fn admission_deadline() -> Instant {
    Instant::now() + ADMISSION_TIMEOUT
}

/// Ask for the LEDs
///
/// With `wait` set, a request that finds another animation playing parks
/// until the LEDs are released, for at most [`ADMISSION_TIMEOUT`]. The other
/// rules are re-checked on every wake, so an all-on override or a call that
/// appears while waiting refuses the request immediately.
pub async fn admit(
    status: &StatusRegister,
    class: AnimationClass,
    wait: bool,
) -> Result<PlaybackGuard<'_>, Refusal> {
    admit_by(status, class, wait, admission_deadline()).await
}

/// Ask for the LEDs, waiting no later than `deadline`
///
/// A waiting request whose deadline already passed is refused without
/// looking at the LEDs.
pub async fn admit_by(
    status: &StatusRegister,
    class: AnimationClass,
    wait: bool,
    deadline: Instant,
) -> Result<PlaybackGuard<'_>, Refusal> {
    if wait && Instant::now() >= deadline {
        #[cfg(feature = "esp32-log")]
        println!("[admit] refused {} (expired before start)", class.as_str());
        return Err(Refusal::TimedOut);
    }

    let first = try_admit(status, class);
    if !(wait && matches!(first, Err(Refusal::Busy))) {
        #[cfg(feature = "esp32-log")]
        if let Err(refusal) = first {
            println!("[admit] refused {} ({:?})", class.as_str(), refusal);
        }
        return first;
    }

    #[cfg(feature = "esp32-log")]
    println!("[admit] {} waiting for the current animation", class.as_str());

    let waiting = poll_fn(|cx| {
        let outcome = status.with(|inner| {
            let outcome = evaluate(inner, class);
            if outcome == Err(Refusal::Busy) {
                inner.waiters.register(cx.waker());
            }
            outcome
        });
        match outcome {
            Err(Refusal::Busy) => Poll::Pending,
            other => Poll::Ready(other),
        }
    });

    let ticket = with_deadline(deadline, waiting)
        .await
        .unwrap_or(Err(Refusal::TimedOut));

    #[cfg(feature = "esp32-log")]
    if let Err(refusal) = ticket {
        println!("[admit] refused {} after waiting ({:?})", class.as_str(), refusal);
    }

    Ok(PlaybackGuard {
        status,
        class,
        ticket: ticket?,
    })
}

/// Check whether a running animation of `class` must stop
///
/// The all-on override stops everything, an enabled call stops every other
/// class, and a disabled call stops the call loop.
pub fn should_interrupt(status: &StatusRegister, class: AnimationClass) -> bool {
    status.with(|inner| {
        inner.all_leds_active
            || match class {
                AnimationClass::Call => !inner.call_enabled,
                _ => inner.call_enabled,
            }
    })
}

/// Give up call ownership regardless of which guard holds it
pub(crate) fn release_call(status: &StatusRegister) {
    status.update(|inner| {
        if inner.owner == Owner::Call {
            inner.owner = Owner::Idle;
        }
    });
}
