//! Glyphs conductor - the players behind every exposed operation
//!
//! Owns the status register, the driver and the animation source, and lends
//! them to the pattern, bar, call, essential and music players.

use core::cell::RefCell;
use core::future::poll_fn;
use core::task::Poll;

use critical_section::Mutex;
use embassy_time::{Instant, Timer};

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::GlyphDriver;
use crate::ambient::{MUSIC_FRAME_LEN, MusicZone, brightness_for_lux};
use crate::bar::{BarAnimation, BarKind};
use crate::config::{ESSENTIAL_RAMP, FRAME_INTERVAL, GlyphConfig, MUSIC_DWELL};
use crate::frame::blank;
use crate::pattern::{AnimationSource, PatternKind, RowError, parse_row};
use crate::renderer::{RenderContext, render_frame, render_single};
use crate::scheduler::{
    AnimationClass, Refusal, admission_deadline, admit, admit_by, release_call, should_interrupt,
};
use crate::status::{Owner, StatusRegister};

/// How an admitted animation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every frame was played
    Completed,
    /// A higher priority state stopped the animation
    Interrupted,
    /// A definition row was rejected
    Malformed(RowError),
    /// The definition does not exist
    Missing,
    /// There was nothing to play
    Empty,
}

/// Animation conductor for one glyph device
pub struct Glyphs<D: GlyphDriver, S: AnimationSource> {
    config: GlyphConfig,
    status: StatusRegister,
    driver: Mutex<RefCell<D>>,
    source: S,
}

impl<D: GlyphDriver, S: AnimationSource> Glyphs<D, S> {
    pub fn new(config: GlyphConfig, driver: D, source: S) -> Self {
        Self {
            status: StatusRegister::new(config.default_brightness),
            config,
            driver: Mutex::new(RefCell::new(driver)),
            source,
        }
    }

    pub fn config(&self) -> &GlyphConfig {
        &self.config
    }

    pub fn status(&self) -> &StatusRegister {
        &self.status
    }

    /// Run `f` with exclusive access to the driver
    pub fn with_driver<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        critical_section::with(|cs| f(&mut self.driver.borrow(cs).borrow_mut()))
    }

    fn render(&self, frame: &[u16]) {
        let ctx = RenderContext::capture(&self.config, &self.status);
        let rendered = render_frame(frame, &ctx, self.config.essential_slot(frame.len()));
        self.with_driver(|driver| driver.write_frame(&rendered));
    }

    fn render_led(&self, led: usize, value: f32) {
        let ctx = RenderContext::capture(&self.config, &self.status);
        let brightness = render_single(led, value, &ctx, self.config.essential_led);
        self.with_driver(|driver| driver.write_single(led, brightness));
    }

    /// Blank frame in the primary pattern layout
    fn reset(&self) {
        let len = self
            .config
            .supported_pattern_lengths
            .first()
            .copied()
            .unwrap_or(MUSIC_FRAME_LEN);
        self.render(&blank(len));
    }

    /// Play rows of a definition until it ends or `class` is interrupted
    async fn run_pattern(&self, name: &str, kind: PatternKind, class: AnimationClass) -> Outcome {
        let Some(rows) = self.source.rows(name, kind) else {
            #[cfg(feature = "esp32-log")]
            println!("[glyphs] no animation named {}", name);
            return Outcome::Missing;
        };

        for row in rows {
            if should_interrupt(&self.status, class) {
                return Outcome::Interrupted;
            }
            match parse_row(row, self.config.supported_pattern_lengths) {
                Ok(frame) => self.render(&frame),
                Err(err) => {
                    #[cfg(feature = "esp32-log")]
                    println!("[glyphs] {}: {} in row {:?}", name, err, row);
                    return Outcome::Malformed(err);
                }
            }
            Timer::after(FRAME_INTERVAL).await;
        }
        Outcome::Completed
    }

    /// Play a named notification pattern
    ///
    /// The LEDs are blanked afterwards, however the pattern ended.
    pub async fn play_pattern(&self, name: &str, wait: bool) -> Result<Outcome, Refusal> {
        self.play_pattern_by(name, wait, admission_deadline()).await
    }

    pub(crate) async fn play_pattern_by(
        &self,
        name: &str,
        wait: bool,
        deadline: Instant,
    ) -> Result<Outcome, Refusal> {
        let guard = admit_by(&self.status, AnimationClass::Pattern, wait, deadline).await?;
        let outcome = self
            .run_pattern(name, PatternKind::Notification, AnimationClass::Pattern)
            .await;
        self.reset();
        drop(guard);

        #[cfg(feature = "esp32-log")]
        println!("[glyphs] pattern {} done ({:?})", name, outcome);
        Ok(outcome)
    }

    /// Ring: enable the call and loop its pattern until [`Glyphs::stop_call`]
    ///
    /// Waits for a running animation to give up the LEDs. While the all-on
    /// override is active the loop parks and resumes once it clears.
    pub async fn play_call(&self, name: &str) -> Result<Outcome, Refusal> {
        self.play_call_by(name, admission_deadline()).await
    }

    pub(crate) async fn play_call_by(&self, name: &str, deadline: Instant) -> Result<Outcome, Refusal> {
        self.status.set_call_enabled(true);
        let guard = admit_by(&self.status, AnimationClass::Call, true, deadline).await?;

        #[cfg(feature = "esp32-log")]
        println!("[glyphs] call {} playing", name);

        let mut outcome = Outcome::Completed;
        while self.status.is_call_enabled() {
            outcome = self
                .run_pattern(name, PatternKind::Call, AnimationClass::Call)
                .await;
            match outcome {
                Outcome::Missing => {
                    self.status.set_call_enabled(false);
                    self.reset();
                    break;
                }
                Outcome::Malformed(_) => Timer::after(FRAME_INTERVAL).await,
                _ => {}
            }
            if self.status.all_leds_active() {
                #[cfg(feature = "esp32-log")]
                println!("[glyphs] all LEDs active, call {} paused", name);
                self.all_leds_released().await;
            }
        }
        drop(guard);
        Ok(outcome)
    }

    /// Resolves once the all-on override clears or the call is disabled
    async fn all_leds_released(&self) {
        poll_fn(|cx| {
            let parked = self.status.with(|status| {
                let parked = status.all_leds_active && status.call_enabled;
                if parked {
                    status.waiters.register(cx.waker());
                }
                parked
            });
            if parked { Poll::Pending } else { Poll::Ready(()) }
        })
        .await;
    }

    /// Hang up: disable the call, blank the LEDs and free them
    pub fn stop_call(&self) {
        #[cfg(feature = "esp32-log")]
        println!("[glyphs] disabling call animation");
        self.status.set_call_enabled(false);
        self.reset();
        release_call(&self.status);
    }

    /// Battery bar at `level` percent
    pub async fn play_charging(&self, level: u8, wait: bool) -> Result<Outcome, Refusal> {
        self.play_charging_by(level, wait, admission_deadline()).await
    }

    pub(crate) async fn play_charging_by(
        &self,
        level: u8,
        wait: bool,
        deadline: Instant,
    ) -> Result<Outcome, Refusal> {
        let guard = admit_by(&self.status, AnimationClass::Charging, wait, deadline).await?;
        let animation = BarAnimation::charging(
            level,
            &self.status.battery(),
            self.config.battery_leds,
            self.config.battery_dot,
            self.config.max_pattern_brightness,
        );
        let outcome = self.run_bar(BarKind::Battery, animation, Some(level)).await;
        drop(guard);
        Ok(outcome)
    }

    /// Volume bar at `level` percent
    ///
    /// `increase` and `decrease` say how to move from the bar already on screen.
    pub async fn play_volume(
        &self,
        level: u8,
        wait: bool,
        increase: bool,
        decrease: bool,
    ) -> Result<Outcome, Refusal> {
        self.play_volume_by(level, wait, increase, decrease, admission_deadline())
            .await
    }

    pub(crate) async fn play_volume_by(
        &self,
        level: u8,
        wait: bool,
        increase: bool,
        decrease: bool,
        deadline: Instant,
    ) -> Result<Outcome, Refusal> {
        let guard = admit_by(&self.status, AnimationClass::Volume, wait, deadline).await?;
        let animation = BarAnimation::volume(
            level,
            &self.status.volume(),
            self.config.volume_leds,
            increase,
            decrease,
            self.config.max_pattern_brightness,
        );
        let outcome = self.run_bar(BarKind::Volume, animation, Some(level)).await;
        drop(guard);
        Ok(outcome)
    }

    pub async fn dismiss_charging(&self) -> Result<Outcome, Refusal> {
        self.dismiss_bar(BarKind::Battery).await
    }

    pub async fn dismiss_volume(&self) -> Result<Outcome, Refusal> {
        self.dismiss_bar(BarKind::Volume).await
    }

    async fn dismiss_bar(&self, kind: BarKind) -> Result<Outcome, Refusal> {
        if BarAnimation::dismiss(&self.status.bar(kind)).is_none() {
            return Ok(Outcome::Empty);
        }
        let guard = admit(&self.status, kind.class(), false).await?;
        // Re-read under ownership, the bar may have moved while admitting
        let Some(animation) = BarAnimation::dismiss(&self.status.bar(kind)) else {
            return Ok(Outcome::Empty);
        };
        let outcome = self.run_bar(kind, animation, None).await;
        drop(guard);
        Ok(outcome)
    }

    /// Step through a bar animation and remember where it stopped
    ///
    /// An interrupted bar freezes at its partial state instead of rolling back.
    async fn run_bar(&self, kind: BarKind, mut animation: BarAnimation, level: Option<u8>) -> Outcome {
        let class = kind.class();
        let mut outcome = Outcome::Completed;
        while animation.remaining() > 0 {
            if should_interrupt(&self.status, class) {
                outcome = Outcome::Interrupted;
                break;
            }
            let Some(step) = animation.next() else {
                break;
            };
            if let Some(led) = step.led {
                self.status.set_led_last(kind, led);
            }
            if step.render {
                self.render(animation.frame());
            }
            if step.pace {
                Timer::after(FRAME_INTERVAL).await;
            }
        }

        if outcome == Outcome::Interrupted && !self.status.all_leds_active() {
            self.render(animation.frame());
        }
        self.status.store_bar(kind, level, animation.frame());

        #[cfg(feature = "esp32-log")]
        println!("[glyphs] {} bar done ({:?})", class.as_str(), outcome);
        outcome
    }

    /// Light the essential indicator
    ///
    /// The first call ramps the LED up and marks the indicator active; later
    /// calls only re-apply its floor brightness.
    pub async fn play_essential(&self) -> Result<Outcome, Refusal> {
        self.play_essential_by(admission_deadline()).await
    }

    pub(crate) async fn play_essential_by(&self, deadline: Instant) -> Result<Outcome, Refusal> {
        if self.status.is_essential_active() {
            self.refresh_essential();
            return Ok(Outcome::Completed);
        }

        let guard = admit_by(&self.status, AnimationClass::Essential, true, deadline).await?;
        let max = self.config.max_pattern_brightness;
        let mut outcome = Outcome::Completed;
        for percent in ESSENTIAL_RAMP {
            if should_interrupt(&self.status, AnimationClass::Essential) {
                outcome = Outcome::Interrupted;
                break;
            }
            self.render_led(self.config.essential_led, f32::from(max / 100 * percent));
            Timer::after(FRAME_INTERVAL).await;
        }
        drop(guard);
        self.status.set_essential_active(true);

        #[cfg(feature = "esp32-log")]
        println!("[glyphs] essential on ({:?})", outcome);
        Ok(outcome)
    }

    fn refresh_essential(&self) {
        if self.status.all_leds_active() {
            return;
        }
        let ctx = RenderContext::capture(&self.config, &self.status);
        self.render_led(self.config.essential_led, ctx.essential_floor());
    }

    /// Turn the essential indicator off
    ///
    /// The LED is blanked only when nothing else owns the LEDs.
    pub fn stop_essential(&self) {
        #[cfg(feature = "esp32-log")]
        println!("[glyphs] disabling essential animation");
        self.status.set_essential_active(false);
        if self.status.owner() == Owner::Idle && !self.status.all_leds_active() {
            self.render_led(self.config.essential_led, 0.0);
        }
    }

    /// Flash one music zone at full brightness
    ///
    /// Bypasses admission entirely.
    pub async fn flash_music(&self, zone: MusicZone) {
        let mut frame = blank(MUSIC_FRAME_LEN);
        if let Some(value) = frame.get_mut(zone.slot()) {
            *value = self.config.max_pattern_brightness;
        }
        self.render(&frame);
        Timer::after(MUSIC_DWELL).await;
        self.render(&blank(MUSIC_FRAME_LEN));
    }

    /// Flash a music zone by name, `false` if the name is unknown
    pub async fn flash_music_named(&self, name: &str) -> bool {
        let Some(zone) = MusicZone::parse_from_str(name) else {
            #[cfg(feature = "esp32-log")]
            println!("[glyphs] no music zone named {}", name);
            return false;
        };
        self.flash_music(zone).await;
        true
    }

    pub fn all_leds_active(&self) -> bool {
        self.status.all_leds_active()
    }

    /// Engage or release the all-on override
    pub fn set_all_leds_active(&self, active: bool) {
        self.status.set_all_leds_active(active);
    }

    /// Change the global brightness
    ///
    /// Returns `true` if it changed; an active essential indicator is
    /// re-applied at the new brightness.
    pub fn set_brightness(&self, brightness: u16) -> bool {
        if !self.status.set_brightness(brightness) {
            return false;
        }

        #[cfg(feature = "esp32-log")]
        println!("[glyphs] brightness changed to {}", brightness);

        if self.status.is_essential_active() {
            self.refresh_essential();
        }
        true
    }

    /// Apply an ambient light reading
    pub fn ambient_lux(&self, lux: u32) -> bool {
        brightness_for_lux(
            lux,
            self.config.auto_brightness_lux,
            self.config.brightness_levels,
        )
        .is_some_and(|brightness| self.set_brightness(brightness))
    }
}
