//! Brightness math between animation frames and the driver.
//!
//! Two transforms, applied in order:
//! 1. Essential floor: while the essential indicator is on, its LED never
//!    drops below 60% of the pattern scale.
//! 2. Global brightness: `value / max * brightness`.

use crate::config::{ESSENTIAL_FLOOR_PERCENT, GlyphConfig};
use crate::frame::RenderedFrame;
use crate::status::StatusRegister;

/// Snapshot of everything the brightness math depends on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    /// Top of the abstract pattern scale
    pub max_brightness: u16,
    /// Current global brightness
    pub brightness: u16,
    /// Whether the essential indicator is on
    pub essential_active: bool,
}

impl RenderContext {
    pub fn capture(config: &GlyphConfig, status: &StatusRegister) -> Self {
        Self {
            max_brightness: config.max_pattern_brightness,
            brightness: status.brightness(),
            essential_active: status.is_essential_active(),
        }
    }

    /// Lowest value the essential indicator may show, on the pattern scale
    pub fn essential_floor(&self) -> f32 {
        f32::from(self.max_brightness) / 100.0 * ESSENTIAL_FLOOR_PERCENT
    }

    /// Rescale a pattern value to the global brightness
    pub fn scale(&self, value: f32) -> f32 {
        if self.max_brightness == 0 {
            return 0.0;
        }
        value * f32::from(self.brightness) / f32::from(self.max_brightness)
    }

    fn floor_essential(&self, value: f32) -> f32 {
        if self.essential_active {
            value.max(self.essential_floor())
        } else {
            value
        }
    }
}

/// Render a whole frame
///
/// `essential_slot` is the indicator index for this frame's layout, `None`
/// when the layout is not recognized.
pub fn render_frame(frame: &[u16], ctx: &RenderContext, essential_slot: Option<usize>) -> RenderedFrame {
    let mut rendered = RenderedFrame::new();
    for (index, value) in frame.iter().enumerate() {
        let mut value = f32::from(*value);
        if essential_slot == Some(index) {
            value = ctx.floor_essential(value);
        }
        // Both buffers share the same capacity
        let _ = rendered.push(ctx.scale(value));
    }
    rendered
}

/// Render one LED
///
/// The essential floor applies only when `led` is the essential indicator.
pub fn render_single(led: usize, value: f32, ctx: &RenderContext, essential_led: usize) -> f32 {
    let value = if led == essential_led {
        ctx.floor_essential(value)
    } else {
        value
    };
    ctx.scale(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTX: RenderContext = RenderContext {
        max_brightness: 4000,
        brightness: 2000,
        essential_active: true,
    };

    #[test]
    fn test_essential_floor_raises_indicator() {
        // 10% on the indicator slot is forced to 60% before scaling
        let rendered = render_frame(&[0, 400, 0, 0, 4000], &CTX, Some(1));
        assert_eq!(rendered.as_slice(), &[0.0, 1200.0, 0.0, 0.0, 2000.0]);
    }

    #[test]
    fn test_essential_floor_never_lowers() {
        let rendered = render_frame(&[0, 4000, 0, 0, 0], &CTX, Some(1));
        assert_eq!(rendered[1], 2000.0);
    }

    #[test]
    fn test_unknown_layout_is_only_scaled() {
        let rendered = render_frame(&[400, 0, 0], &CTX, None);
        assert_eq!(rendered.as_slice(), &[200.0, 0.0, 0.0]);
    }

    #[test]
    fn test_inactive_essential_is_only_scaled() {
        let ctx = RenderContext {
            essential_active: false,
            ..CTX
        };
        let rendered = render_frame(&[0, 400, 0, 0, 0], &ctx, Some(1));
        assert_eq!(rendered[1], 200.0);
    }

    #[test]
    fn test_render_single() {
        assert_eq!(render_single(1, 0.0, &CTX, 1), 1200.0);
        assert_eq!(render_single(2, 0.0, &CTX, 1), 0.0);
        assert_eq!(render_single(2, 4000.0, &CTX, 1), 2000.0);
    }
}
