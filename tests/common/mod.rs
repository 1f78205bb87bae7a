#![allow(dead_code)]

use glyph_composer::{GlyphConfig, GlyphDriver, Glyphs, PatternEntry, StaticAnimations};

/// Top of the pattern scale; tests run at full brightness so rendered values equal pattern values
pub const MAX: u16 = 4000;
pub const FULL: f32 = 4000.0;

pub const ANIMATIONS: &[PatternEntry] = &[
    PatternEntry::notification("blink", "4000,0,0,0,0\n0,4000,0,0,0\n0,0,4000,0,0,"),
    PatternEntry::notification("broken", "4000,0,0,0,0\n1,2,3\n0,0,0,0,0"),
    PatternEntry::notification("dim", "0,400,0,0,0"),
    PatternEntry::notification(
        "long",
        "4000,0,4000,0,4000\n\
         0,4000,0,4000,0\n\
         4000,0,4000,0,4000\n\
         0,4000,0,4000,0\n\
         4000,0,4000,0,4000\n\
         0,4000,0,4000,0\n\
         4000,0,4000,0,4000\n\
         0,4000,0,4000,0\n\
         4000,0,4000,0,4000\n\
         0,4000,0,4000,0\n\
         4000,0,4000,0,4000\n\
         0,4000,0,4000,0\n\
         4000,0,4000,0,4000\n\
         0,4000,0,4000,0\n\
         4000,0,4000,0,4000\n\
         0,4000,0,4000,0\n\
         4000,0,4000,0,4000\n\
         0,4000,0,4000,0\n\
         4000,0,4000,0,4000\n\
         0,4000,0,4000,0\n\
         4000,0,4000,0,4000\n\
         0,4000,0,4000,0\n\
         4000,0,4000,0,4000\n\
         0,4000,0,4000,0\n\
         4000,0,4000,0,4000\n\
         0,4000,0,4000,0\n\
         4000,0,4000,0,4000\n\
         0,4000,0,4000,0\n\
         4000,0,4000,0,4000\n\
         0,4000,0,4000,0\n\
         4000,0,4000,0,4000\n\
         0,4000,0,4000,0\n\
         4000,0,4000,0,4000\n\
         0,4000,0,4000,0\n\
         4000,0,4000,0,4000\n\
         0,4000,0,4000,0\n\
         4000,0,4000,0,4000\n\
         0,4000,0,4000,0\n\
         4000,0,4000,0,4000\n\
         0,4000,0,4000,0",
    ),
    PatternEntry::call(
        "ring",
        "0,0,4000,0,0\n\
         0,2000,4000,2000,0\n\
         4000,4000,4000,4000,4000\n\
         0,2000,4000,2000,0",
    ),
];

/// One driver write
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Frame(Vec<f32>),
    Single(usize, f32),
}

/// Driver that records every write
#[derive(Debug, Default)]
pub struct Recorder {
    pub writes: Vec<Write>,
}

impl Recorder {
    pub fn frames(&self) -> Vec<Vec<f32>> {
        self.writes
            .iter()
            .filter_map(|write| match write {
                Write::Frame(frame) => Some(frame.clone()),
                Write::Single(..) => None,
            })
            .collect()
    }

    pub fn singles(&self) -> Vec<(usize, f32)> {
        self.writes
            .iter()
            .filter_map(|write| match write {
                Write::Single(led, value) => Some((*led, *value)),
                Write::Frame(_) => None,
            })
            .collect()
    }
}

impl GlyphDriver for Recorder {
    fn write_frame(&mut self, frame: &[f32]) {
        self.writes.push(Write::Frame(frame.to_vec()));
    }

    fn write_single(&mut self, led: usize, brightness: f32) {
        self.writes.push(Write::Single(led, brightness));
    }
}

pub type TestGlyphs = Glyphs<Recorder, StaticAnimations<'static>>;

pub fn config() -> GlyphConfig {
    GlyphConfig {
        default_brightness: MAX,
        battery_leds: 8,
        battery_dot: true,
        volume_leds: 10,
        ..GlyphConfig::phone()
    }
}

pub fn glyphs() -> TestGlyphs {
    Glyphs::new(config(), Recorder::default(), StaticAnimations::new(ANIMATIONS))
}

pub fn frames(glyphs: &TestGlyphs) -> Vec<Vec<f32>> {
    glyphs.with_driver(|driver| driver.frames())
}

pub fn lit(frame: &[f32]) -> usize {
    frame.iter().filter(|value| **value != 0.0).count()
}
