//! Static configuration of the glyph layout and timings.

use embassy_time::Duration;

/// Frame pacing, roughly 60 frames per second.
pub const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// How long a waiting request may block before it is refused.
pub const ADMISSION_TIMEOUT: Duration = Duration::from_millis(2500);

/// How long a music zone stays lit.
pub const MUSIC_DWELL: Duration = Duration::from_millis(106);

/// Quiet period after the last volume change before the bar is dismissed.
pub const VOLUME_DISMISS_DELAY: Duration = Duration::from_millis(3000);

/// Essential indicator ramp, in percent of the maximum pattern brightness.
pub const ESSENTIAL_RAMP: [u16; 5] = [12, 24, 36, 48, 60];

/// Minimum brightness of the essential indicator, in percent.
pub const ESSENTIAL_FLOOR_PERCENT: f32 = 60.0;

/// Configuration of the glyph hardware
#[derive(Debug, Clone)]
pub struct GlyphConfig {
    /// Top of the abstract brightness scale used by animation definitions
    pub max_pattern_brightness: u16,
    /// Frame widths accepted from animation definitions
    pub supported_pattern_lengths: &'static [usize],
    /// `(frame length, index)` pairs locating the essential indicator inside a frame
    pub essential_slots: &'static [(usize, usize)],
    /// Hardware channel of the essential indicator for single-LED writes
    pub essential_led: usize,
    /// Number of LEDs in the battery bar
    pub battery_leds: usize,
    /// Whether the first battery LED is a reserved dot
    pub battery_dot: bool,
    /// Number of LEDs in the volume bar
    pub volume_leds: usize,
    /// Global brightness levels selectable by ambient light
    pub brightness_levels: &'static [u16],
    /// Lux thresholds, one per brightness level, ascending
    pub auto_brightness_lux: &'static [u32],
    /// Global brightness applied until the first change
    pub default_brightness: u16,
}

impl GlyphConfig {
    /// Five-zone layout with a 33-segment alternate pattern width
    pub const fn phone() -> Self {
        Self {
            max_pattern_brightness: 4000,
            supported_pattern_lengths: &[5, 33],
            essential_slots: &[(5, 1), (33, 2)],
            essential_led: 1,
            battery_leds: 8,
            battery_dot: true,
            volume_leds: 8,
            brightness_levels: &[700, 1500, 2500, 3300, 4095],
            auto_brightness_lux: &[0, 20, 200, 1000, 4000],
            default_brightness: 2500,
        }
    }

    /// Essential indicator index for a frame of the given length, if the layout is known
    pub fn essential_slot(&self, len: usize) -> Option<usize> {
        self.essential_slots
            .iter()
            .find(|(slot_len, _)| *slot_len == len)
            .map(|(_, index)| *index)
    }
}

impl Default for GlyphConfig {
    fn default() -> Self {
        Self::phone()
    }
}
