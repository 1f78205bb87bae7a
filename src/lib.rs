#![cfg_attr(not(test), no_std)]

pub mod ambient;
pub mod bar;
pub mod config;
pub mod dispatch;
pub mod frame;
pub mod glyphs;
pub mod pattern;
pub mod renderer;
pub mod scheduler;
pub mod status;

pub use ambient::{MusicZone, VolumeChange, VolumeTracker, brightness_for_lux};
pub use bar::{BarAnimation, BarKind, BarStep, amount};
pub use config::GlyphConfig;
pub use dispatch::{GlyphRequest, Lanes, VolumeSample, VolumeSamples};
pub use frame::{Frame, MAX_FRAME_LEN, RenderedFrame};
pub use glyphs::{Glyphs, Outcome};
pub use pattern::{AnimationSource, PatternEntry, PatternKind, RowError, StaticAnimations};
pub use renderer::RenderContext;
pub use scheduler::{AnimationClass, PlaybackGuard, Refusal, admit, should_interrupt, try_admit};
pub use status::{BarMemory, Owner, StatusRegister};

pub use embassy_time::{Duration, Instant};

/// Abstract glyph driver trait
///
/// Implement this trait to support different hardware platforms.
/// Values are already scaled to the current global brightness.
pub trait GlyphDriver {
    /// Write a whole frame, one value per LED of the frame layout
    fn write_frame(&mut self, frame: &[f32]);

    /// Write a single LED channel
    fn write_single(&mut self, led: usize, brightness: f32);
}
