use heapless::Vec;

/// Largest frame the engine can hold
pub const MAX_FRAME_LEN: usize = 64;

/// Per-LED brightness on the abstract pattern scale
pub type Frame = Vec<u16, MAX_FRAME_LEN>;

/// Per-LED brightness after global scaling, ready for the driver
pub type RenderedFrame = Vec<f32, MAX_FRAME_LEN>;

/// Build an all-zero frame of `len` LEDs
///
/// Lengths above [`MAX_FRAME_LEN`] are truncated.
pub fn blank(len: usize) -> Frame {
    let mut frame = Frame::new();
    let _ = frame.resize(len.min(MAX_FRAME_LEN), 0);
    frame
}
