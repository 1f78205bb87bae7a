//! Trigger-side helpers: ambient light, volume tracking and music zones.

const ZONE_NAME_LOW: &str = "low";
const ZONE_NAME_MID_LOW: &str = "mid_low";
const ZONE_NAME_MID: &str = "mid";
const ZONE_NAME_MID_HIGH: &str = "mid_high";
const ZONE_NAME_HIGH: &str = "high";

/// Width of the frame used by the music visualizer
pub const MUSIC_FRAME_LEN: usize = 5;

/// Pick the global brightness for an ambient light reading
///
/// The highest lux threshold not above `lux` selects the level; the first
/// level is used below every threshold. Returns `None` without levels.
pub fn brightness_for_lux(lux: u32, lux_levels: &[u32], brightness_levels: &[u16]) -> Option<u16> {
    let mut index = 0;
    for (i, threshold) in lux_levels.iter().enumerate().skip(1) {
        if lux < *threshold {
            break;
        }
        index = i;
    }
    brightness_levels
        .get(index)
        .or_else(|| brightness_levels.last())
        .copied()
}

/// Volume level change derived from two stream volume samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeChange {
    /// New level, 0-100
    pub level: u8,
    pub increase: bool,
    pub decrease: bool,
}

/// Turns raw stream volume samples into bar requests
#[derive(Debug, Clone, Copy)]
pub struct VolumeTracker {
    previous: u32,
}

impl VolumeTracker {
    pub const fn new(current: u32) -> Self {
        Self { previous: current }
    }

    /// Feed a sample, returns the change if the volume moved
    pub fn sample(&mut self, current: u32, max: u32) -> Option<VolumeChange> {
        if current == self.previous {
            return None;
        }
        let change = VolumeChange {
            level: percent(current, max),
            increase: current > self.previous,
            decrease: current < self.previous,
        };
        self.previous = current;
        Some(change)
    }
}

fn percent(current: u32, max: u32) -> u8 {
    if max == 0 {
        return 0;
    }
    let level = libm::round(100.0 / f64::from(max) * f64::from(current));
    level.clamp(0.0, 100.0) as u8
}

/// Frequency band of the music visualizer, one LED each
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicZone {
    Low,
    MidLow,
    Mid,
    MidHigh,
    High,
}

impl MusicZone {
    pub fn parse_from_str(s: &str) -> Option<Self> {
        match s {
            ZONE_NAME_LOW => Some(Self::Low),
            ZONE_NAME_MID_LOW => Some(Self::MidLow),
            ZONE_NAME_MID => Some(Self::Mid),
            ZONE_NAME_MID_HIGH => Some(Self::MidHigh),
            ZONE_NAME_HIGH => Some(Self::High),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => ZONE_NAME_LOW,
            Self::MidLow => ZONE_NAME_MID_LOW,
            Self::Mid => ZONE_NAME_MID,
            Self::MidHigh => ZONE_NAME_MID_HIGH,
            Self::High => ZONE_NAME_HIGH,
        }
    }

    /// Index of the zone's LED in the music frame
    pub const fn slot(self) -> usize {
        match self {
            Self::Low => 4,
            Self::MidLow => 3,
            Self::Mid => 2,
            Self::MidHigh => 0,
            Self::High => 1,
        }
    }
}
