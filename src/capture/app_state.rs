//! Screenshot app state
//!
//! [`ScreenshotAppState`] plugs into a host application twice: as an
//! [`ActionListener`] bound to the Print Screen key and as a
//! [`SceneProcessor`] appended to the last post view. A key press (or
//! [`take_screenshot`](ScreenshotAppState::take_screenshot)) sets a capture
//! flag; the next `post_frame` clears it, reads the frame buffer back and
//! hands a [`Screenshot`] to the configured [`ScreenshotHandler`].
//!
//! The flag holds at most one pending request, so any number of triggers
//! between two frames produce a single screenshot.
//!
//! # Examples
//!
//! ```
//! use framegrab::{
//!     capture::{NamingScheme, Screenshot, ScreenshotAppState},
//!     error::CaptureResult,
//!     host::headless::HeadlessApp,
//!     model::KeyCode,
//! };
//!
//! let mut app = HeadlessApp::new(320, 240);
//! let state = ScreenshotAppState::with_file_path(Some("/tmp/"))
//!     .with_handler(|shot: Screenshot, _naming: &NamingScheme| -> CaptureResult<()> {
//!         assert_eq!(shot.sequence_number(), 1);
//!         Ok(())
//!     });
//!
//! app.attach_state(Box::new(state.clone()));
//! app.update(0.016).unwrap();
//!
//! app.key_event(KeyCode::SYSRQ, true);
//! app.update(0.016).unwrap();
//! assert_eq!(state.next_sequence_number(), 2);
//! ```

use std::{
    any::Any,
    cell::{Cell, RefCell},
    rc::Rc,
};

use tracing::{debug, info};

use super::{CaptureSession, NamingScheme, ScreenshotHandler};
use crate::{
    error::{CaptureError, CaptureResult},
    host::{
        ActionListener, AppState, Application, FrameBuffer, RenderContext, RenderQueue,
        SceneProcessor,
    },
    model::{Camera, KeyCode, KeyTrigger, SCREENSHOT_ACTION},
    util::{png_writer::PngFileHandler, storage::SystemStorage},
};

/// Captures the frame buffer to a handler when Print Screen is pressed
///
/// Cloning is cheap and every clone refers to the same state: the host keeps
/// one clone as input listener and one as scene processor while the caller
/// keeps another to trigger captures or change the output path.
#[derive(Clone)]
pub struct ScreenshotAppState {
    shared: Rc<Shared>,
}

struct Shared {
    capture:    Cell<bool>,
    registered: Cell<bool>,
    naming:     RefCell<NamingScheme>,
    session:    RefCell<CaptureSession>,
    handler:    RefCell<Box<dyn ScreenshotHandler>>,
}

impl ScreenshotAppState {
    /// Writes numbered PNG files to the system default storage folder
    pub fn new() -> Self {
        Self::with_naming_scheme(NamingScheme::new())
    }

    /// Writes numbered PNG files under `file_path`
    ///
    /// Include the trailing separator. An empty string selects the current
    /// application directory and `None` the system default storage folder.
    pub fn with_file_path(file_path: Option<impl Into<String>>) -> Self {
        Self::with_naming_scheme(NamingScheme::with_file_path(file_path))
    }

    /// Uses `scheme` to name output files
    pub fn with_naming_scheme(scheme: NamingScheme) -> Self {
        Self {
            shared: Rc::new(Shared {
                capture:    Cell::new(false),
                registered: Cell::new(false),
                naming:     RefCell::new(scheme),
                session:    RefCell::new(CaptureSession::new()),
                handler:    RefCell::new(Box::new(PngFileHandler::new(SystemStorage::new()))),
            }),
        }
    }

    /// Replaces the default PNG writer with `handler`
    pub fn with_handler(self, handler: impl ScreenshotHandler + 'static) -> Self {
        self.set_handler(handler);
        self
    }

    /// Replaces the handler invoked for each capture
    ///
    /// # Panics
    ///
    /// Panics when called from inside the current handler.
    pub fn set_handler(&self, handler: impl ScreenshotHandler + 'static) {
        *self.shared.handler.borrow_mut() = Box::new(handler);
    }

    /// Requests a capture at the end of the next frame
    pub fn take_screenshot(&self) {
        self.shared.capture.set(true);
    }

    /// Whether a capture is waiting for the next frame
    pub fn is_capture_pending(&self) -> bool {
        self.shared.capture.get()
    }

    /// Changes the output directory prefix
    ///
    /// Include the trailing separator. An empty string selects the current
    /// application directory and `None` the system default storage folder.
    pub fn set_file_path(&self, file_path: Option<String>) {
        self.shared.naming.borrow_mut().set_file_path(file_path);
    }

    /// Snapshot of the current naming scheme
    pub fn naming_scheme(&self) -> NamingScheme {
        self.shared.naming.borrow().clone()
    }

    /// Size of the readback scratch buffer in bytes
    pub fn scratch_len(&self) -> usize {
        self.shared.session.borrow().scratch_len()
    }

    /// Surface dimensions the next capture will use
    pub fn dimensions(&self) -> (u32, u32) {
        self.shared.session.borrow().dimensions()
    }

    /// Sequence number the next screenshot will receive
    pub fn next_sequence_number(&self) -> u32 {
        self.shared.session.borrow().next_sequence_number()
    }

    /// Registered with the application and bound to the render pipeline
    pub fn is_initialized(&self) -> bool {
        self.shared.registered.get() && self.shared.session.borrow().is_bound()
    }
}

impl Default for ScreenshotAppState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScreenshotAppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenshotAppState")
            .field("capture", &self.shared.capture.get())
            .field("registered", &self.shared.registered.get())
            .field("naming", &self.shared.naming.borrow())
            .field("session", &self.shared.session.borrow())
            .finish_non_exhaustive()
    }
}

impl AppState for ScreenshotAppState {
    fn initialize(&mut self, app: &mut dyn Application) -> CaptureResult<()> {
        if self.shared.registered.get() {
            return Ok(());
        }

        let views = app.render_manager().post_views_mut();
        let last = views.last_mut().ok_or(CaptureError::NoOutputView)?;
        last.add_processor(Box::new(self.clone()));
        let view_name = last.name().to_string();

        let input = app.input_manager();
        input.add_mapping(SCREENSHOT_ACTION, KeyTrigger::new(KeyCode::SYSRQ));
        input.add_listener(Box::new(self.clone()), &[SCREENSHOT_ACTION]);

        {
            let mut naming = self.shared.naming.borrow_mut();
            if naming.shot_name().is_none() {
                naming.set_shot_name(app.type_name());
            }
        }

        self.shared.registered.set(true);
        info!(
            view = %view_name,
            action = SCREENSHOT_ACTION,
            shot_name = ?self.shared.naming.borrow().shot_name(),
            "Screenshot state attached"
        );
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        ScreenshotAppState::is_initialized(self)
    }
}

impl ActionListener for ScreenshotAppState {
    fn on_action(&mut self, name: &str, pressed: bool, _tpf: f32) {
        if pressed {
            debug!(action = name, "Screenshot requested");
            self.take_screenshot();
        }
    }
}

impl SceneProcessor for ScreenshotAppState {
    fn initialize(&mut self, _ctx: &mut dyn RenderContext, camera: &Camera) -> CaptureResult<()> {
        self.shared.session.borrow_mut().bind();
        self.reshape(camera, camera.width(), camera.height())
    }

    fn is_initialized(&self) -> bool {
        self.shared.session.borrow().is_bound()
    }

    fn reshape(&mut self, _camera: &Camera, width: u32, height: u32) -> CaptureResult<()> {
        self.shared.session.borrow_mut().reshape(width, height)
    }

    fn pre_frame(&mut self, _tpf: f32) {}

    fn post_queue(&mut self, _queue: &RenderQueue) {}

    fn post_frame(
        &mut self,
        ctx: &mut dyn RenderContext,
        out: Option<&FrameBuffer>,
    ) -> CaptureResult<()> {
        if !self.shared.capture.replace(false) {
            return Ok(());
        }

        let screenshot = self.shared.session.borrow_mut().capture(ctx, out)?;
        let naming = self.naming_scheme();
        debug!(
            sequence = screenshot.sequence_number(),
            width = screenshot.width(),
            height = screenshot.height(),
            "Captured frame"
        );

        self.shared
            .handler
            .borrow_mut()
            .screenshot_captured(screenshot, &naming)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_screenshot_sets_flag() {
        let state = ScreenshotAppState::new();
        assert!(!state.is_capture_pending());

        state.take_screenshot();
        state.take_screenshot();
        assert!(state.is_capture_pending());
    }

    #[test]
    fn test_key_up_does_not_request_capture() {
        let mut state = ScreenshotAppState::new();
        state.on_action(SCREENSHOT_ACTION, false, 0.016);
        assert!(!state.is_capture_pending());

        state.on_action(SCREENSHOT_ACTION, true, 0.016);
        assert!(state.is_capture_pending());
    }

    #[test]
    fn test_clones_share_state() {
        let state = ScreenshotAppState::with_file_path(Some("/tmp/"));
        let listener = state.clone();

        listener.take_screenshot();
        assert!(state.is_capture_pending());

        listener.set_file_path(None);
        assert_eq!(state.naming_scheme().file_path(), None);
    }

    #[test]
    fn test_processor_reshape_sizes_buffer() {
        let mut state = ScreenshotAppState::new();
        let camera = Camera::new(8, 4);

        state.reshape(&camera, 8, 4).unwrap();
        assert_eq!(state.scratch_len(), 8 * 4 * 4);
        assert_eq!(state.dimensions(), (8, 4));
    }

    #[test]
    fn test_not_initialized_before_attach() {
        let state = ScreenshotAppState::new();
        assert!(!state.is_initialized());
        assert_eq!(state.next_sequence_number(), 1);
    }

    #[test]
    fn test_debug_output() {
        let state = ScreenshotAppState::new();
        let debug = format!("{:?}", state);
        assert!(debug.contains("ScreenshotAppState"));
        assert!(debug.contains("capture: false"));
    }
}
