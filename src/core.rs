use crate::error::{MathmotionError, MathmotionResult};

pub use kurbo::{Affine, Point, Vec2};

/// Absolute 0-based frame index in session timeline space.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames per second of a render session.
///
/// Sessions run at a fixed integer rate; the pipeline default is 30.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps(pub u32);

impl Fps {
    pub const DEFAULT: Fps = Fps(30);

    /// Create a validated FPS value.
    pub fn new(fps: u32) -> MathmotionResult<Self> {
        if fps == 0 {
            return Err(MathmotionError::validation("fps must be > 0"));
        }
        Ok(Self(fps))
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }

    /// Seconds elapsed at the start of `frame`.
    pub fn frame_to_secs(self, frame: u64) -> f64 {
        frame as f64 / self.as_f64()
    }

    /// Frame count covering `secs` seconds, using round semantics.
    pub fn secs_to_frames(self, secs: f64) -> u64 {
        (secs * self.as_f64()).round().max(0.0) as u64
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> MathmotionResult<Self> {
        if width == 0 || height == 0 {
            return Err(MathmotionError::validation(
                "canvas width/height must be > 0",
            ));
        }
        Ok(Self { width, height })
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
        }
    }
}

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Opaque color from a packed `0xRRGGBB` value. High bits are ignored.
    pub fn from_packed_rgb(packed: u32) -> Self {
        Self::rgb(
            ((packed >> 16) & 0xff) as u8,
            ((packed >> 8) & 0xff) as u8,
            (packed & 0xff) as u8,
        )
    }

    /// Parse `#rrggbb` or `0xrrggbb` color notation.
    ///
    /// Returns `None` for anything else; callers at untrusted boundaries fall
    /// back to their type-specific default instead of failing.
    pub fn parse(text: &str) -> Option<Self> {
        let hex = text
            .trim()
            .strip_prefix('#')
            .or_else(|| text.trim().strip_prefix("0x"))?;
        if hex.len() != 6 {
            return None;
        }
        let packed = u32::from_str_radix(hex, 16).ok()?;
        Some(Self::from_packed_rgb(packed))
    }
}
