//! Request lanes between triggers and players.
//!
//! Triggers never run animations themselves: they post a [`GlyphRequest`]
//! and return. Each animation class has its own lane, which plays at most one
//! request at a time and keeps only the newest pending one of that class.
//! A waiting request must be admitted within [`ADMISSION_TIMEOUT`] of being
//! posted, time spent pending in its lane included. State changes that must
//! preempt a running lane (hang up, all-on override, brightness) are applied
//! on the spot.

use embassy_futures::join::join_array;
use embassy_futures::select::{Either, select};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::{Instant, Timer};

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::GlyphDriver;
use crate::ambient::{MusicZone, VolumeTracker};
use crate::config::{ADMISSION_TIMEOUT, VOLUME_DISMISS_DELAY};
use crate::glyphs::Glyphs;
use crate::pattern::AnimationSource;
use crate::scheduler::check;

/// Something a trigger wants the glyphs to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphRequest {
    Pattern { name: &'static str, wait: bool },
    Call { name: &'static str },
    StopCall,
    Charging { level: u8, wait: bool },
    DismissCharging,
    Volume {
        level: u8,
        wait: bool,
        increase: bool,
        decrease: bool,
    },
    DismissVolume,
    Essential,
    StopEssential,
    Music(MusicZone),
    AllLeds(bool),
    Brightness(u16),
    AmbientLux(u32),
}

impl GlyphRequest {
    /// `Some(false)` for requests that must be dropped when the LEDs are busy
    const fn wait(self) -> Option<bool> {
        match self {
            Self::Pattern { wait, .. } | Self::Charging { wait, .. } | Self::Volume { wait, .. } => {
                Some(wait)
            }
            Self::DismissCharging | Self::DismissVolume => Some(false),
            _ => None,
        }
    }
}

/// A request with the moment it was posted
#[derive(Debug, Clone, Copy)]
struct Posted {
    request: GlyphRequest,
    at: Instant,
}

impl Posted {
    /// Latest admission for a waiting request, counted from posting
    fn deadline(&self) -> Instant {
        self.at + ADMISSION_TIMEOUT
    }
}

/// Latest-wins slot for one animation class
type Lane = Signal<CriticalSectionRawMutex, Posted>;

/// One stream volume reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeSample {
    pub current: u32,
    pub max: u32,
}

/// Queue of stream volume readings for [`Glyphs::serve_volume`]
pub type VolumeSamples = Channel<CriticalSectionRawMutex, VolumeSample, 4>;

const LANE_COUNT: usize = 6;

/// Request lanes, one per animation class plus the music flasher
pub struct Lanes {
    pattern: Lane,
    essential: Lane,
    charging: Lane,
    volume: Lane,
    call: Lane,
    music: Lane,
}

impl Lanes {
    pub const fn new() -> Self {
        Self {
            pattern: Signal::new(),
            essential: Signal::new(),
            charging: Signal::new(),
            volume: Signal::new(),
            call: Signal::new(),
            music: Signal::new(),
        }
    }

    /// Lane serving `request`, `None` for requests applied immediately
    fn lane(&self, request: GlyphRequest) -> Option<&Lane> {
        match request {
            GlyphRequest::Pattern { .. } => Some(&self.pattern),
            GlyphRequest::Essential => Some(&self.essential),
            GlyphRequest::Charging { .. } | GlyphRequest::DismissCharging => Some(&self.charging),
            GlyphRequest::Volume { .. } | GlyphRequest::DismissVolume => Some(&self.volume),
            GlyphRequest::Call { .. } => Some(&self.call),
            GlyphRequest::Music(_) => Some(&self.music),
            GlyphRequest::StopCall
            | GlyphRequest::StopEssential
            | GlyphRequest::AllLeds(_)
            | GlyphRequest::Brightness(_)
            | GlyphRequest::AmbientLux(_) => None,
        }
    }

    fn all(&self) -> [&Lane; LANE_COUNT] {
        [
            &self.pattern,
            &self.essential,
            &self.charging,
            &self.volume,
            &self.call,
            &self.music,
        ]
    }
}

impl Default for Lanes {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: GlyphDriver, S: AnimationSource> Glyphs<D, S> {
    /// Hand a request over without blocking
    ///
    /// Returns `false` when the request was dropped: a non-waiting request
    /// that finds the LEDs busy is refused here rather than queued.
    pub fn post(&self, lanes: &Lanes, request: GlyphRequest) -> bool {
        if request.wait() == Some(false) {
            if let Err(_refusal) = check(self.status()) {
                #[cfg(feature = "esp32-log")]
                println!("[dispatch] dropped {:?} ({:?})", request, _refusal);
                return false;
            }
        }

        match lanes.lane(request) {
            Some(lane) => lane.signal(Posted {
                request,
                at: Instant::now(),
            }),
            None => self.apply(request),
        }
        true
    }

    /// Apply a request that never waits for a lane
    fn apply(&self, request: GlyphRequest) {
        match request {
            GlyphRequest::StopCall => self.stop_call(),
            GlyphRequest::StopEssential => self.stop_essential(),
            GlyphRequest::AllLeds(active) => self.set_all_leds_active(active),
            GlyphRequest::Brightness(brightness) => {
                self.set_brightness(brightness);
            }
            GlyphRequest::AmbientLux(lux) => {
                self.ambient_lux(lux);
            }
            _ => {}
        }
    }

    /// Play one request to completion
    pub async fn handle(&self, request: GlyphRequest) {
        self.handle_posted(Posted {
            request,
            at: Instant::now(),
        })
        .await;
    }

    async fn handle_posted(&self, posted: Posted) {
        let deadline = posted.deadline();
        let _outcome = match posted.request {
            GlyphRequest::Pattern { name, wait } => self.play_pattern_by(name, wait, deadline).await,
            GlyphRequest::Call { name } => self.play_call_by(name, deadline).await,
            GlyphRequest::Charging { level, wait } => {
                self.play_charging_by(level, wait, deadline).await
            }
            GlyphRequest::DismissCharging => self.dismiss_charging().await,
            GlyphRequest::Volume {
                level,
                wait,
                increase,
                decrease,
            } => {
                self.play_volume_by(level, wait, increase, decrease, deadline)
                    .await
            }
            GlyphRequest::DismissVolume => self.dismiss_volume().await,
            GlyphRequest::Essential => self.play_essential_by(deadline).await,
            GlyphRequest::Music(zone) => {
                self.flash_music(zone).await;
                return;
            }
            immediate => {
                self.apply(immediate);
                return;
            }
        };

        #[cfg(feature = "esp32-log")]
        if let Err(refusal) = _outcome {
            println!("[dispatch] {:?} refused ({:?})", posted.request, refusal);
        }
    }

    async fn serve_lane(&self, lane: &Lane) {
        loop {
            let posted = lane.wait().await;
            self.handle_posted(posted).await;
        }
    }

    /// Serve every lane, forever
    pub async fn serve(&self, lanes: &Lanes) {
        join_array(lanes.all().map(|lane| self.serve_lane(lane))).await;
    }

    /// Turn stream volume readings into volume bars, forever
    ///
    /// The bar follows each change and is dismissed [`VOLUME_DISMISS_DELAY`]
    /// after the last change. Readings that do not move the volume leave the
    /// dismissal where it was.
    pub async fn serve_volume(&self, samples: &VolumeSamples, initial: u32) {
        let mut tracker = VolumeTracker::new(initial);
        let mut dismiss_at: Option<Instant> = None;
        loop {
            let sample = match dismiss_at {
                Some(at) => match select(samples.receive(), Timer::at(at)).await {
                    Either::First(sample) => sample,
                    Either::Second(()) => {
                        dismiss_at = None;
                        let _ = self.dismiss_volume().await;
                        continue;
                    }
                },
                None => samples.receive().await,
            };

            if let Some(change) = tracker.sample(sample.current, sample.max) {
                let _ = self
                    .play_volume(change.level, false, change.increase, change.decrease)
                    .await;
                dismiss_at = Some(Instant::now() + VOLUME_DISMISS_DELAY);
            }
        }
    }
}
