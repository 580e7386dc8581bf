//! Data models shared between the capture component and its host
//!
//! This module defines the small value types exchanged with the engine:
//! - Key codes and triggers used for input mapping
//! - Pixel viewport rectangles
//! - Cameras with a normalized viewport

/// Name of the input action that requests a screenshot
pub const SCREENSHOT_ACTION: &str = "ScreenShot";

/// Platform key code as delivered by the input subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(pub u32);

impl KeyCode {
    /// Print Screen / SysRq
    pub const SYSRQ: KeyCode = KeyCode(0xB7);
    /// Escape
    pub const ESCAPE: KeyCode = KeyCode(0x01);
    /// F12
    pub const F12: KeyCode = KeyCode(0x58);
}

/// Trigger firing an action when a specific key changes state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyTrigger {
    /// Key that fires the trigger
    pub key: KeyCode,
}

impl KeyTrigger {
    /// Creates a trigger for the given key
    pub fn new(key: KeyCode) -> Self {
        Self { key }
    }
}

/// Rectangle in frame-buffer pixels, origin at the bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportRect {
    pub x:      u32,
    pub y:      u32,
    pub width:  u32,
    pub height: u32,
}

impl ViewportRect {
    /// Creates a new rectangle
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle covering a whole `width` x `height` surface
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Number of pixels covered by the rectangle
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Camera with a pixel resolution and a normalized viewport
///
/// The viewport is expressed as fractions of the resolution, so a camera
/// rendering into the left half of the screen has `left = 0.0` and
/// `right = 0.5`.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    width:           u32,
    height:          u32,
    viewport_left:   f32,
    viewport_right:  f32,
    viewport_bottom: f32,
    viewport_top:    f32,
}

impl Camera {
    /// Creates a camera with a full-screen viewport
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            viewport_left: 0.0,
            viewport_right: 1.0,
            viewport_bottom: 0.0,
            viewport_top: 1.0,
        }
    }

    /// Sets the normalized viewport
    pub fn set_viewport(&mut self, left: f32, right: f32, bottom: f32, top: f32) {
        self.viewport_left = left;
        self.viewport_right = right;
        self.viewport_bottom = bottom;
        self.viewport_top = top;
    }

    /// Updates the pixel resolution, keeping the normalized viewport
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel rectangle covered by this camera's viewport
    ///
    /// Each component is truncated toward zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use framegrab::model::{Camera, ViewportRect};
    ///
    /// let mut camera = Camera::new(800, 600);
    /// camera.set_viewport(0.5, 1.0, 0.0, 0.5);
    /// assert_eq!(camera.viewport_rect(), ViewportRect::new(400, 0, 400, 300));
    /// ```
    pub fn viewport_rect(&self) -> ViewportRect {
        let w = self.width as f32;
        let h = self.height as f32;
        ViewportRect {
            x:      (self.viewport_left * w) as u32,
            y:      (self.viewport_bottom * h) as u32,
            width:  ((self.viewport_right - self.viewport_left) * w) as u32,
            height: ((self.viewport_top - self.viewport_bottom) * h) as u32,
        }
    }
}
