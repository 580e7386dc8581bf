//! Shared helpers for integration tests

#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use framegrab::{
    capture::{NamingScheme, Screenshot, ScreenshotAppState},
    error::{CaptureError, CaptureResult},
    host::headless::HeadlessApp,
};

/// Frame time used by every test update
pub const TPF: f32 = 1.0 / 60.0;

/// One handler invocation: the screenshot and the naming snapshot it got
pub struct Captured {
    pub screenshot: Screenshot,
    pub naming:     NamingScheme,
}

/// Handle to everything a recording handler has received
#[derive(Clone, Default)]
pub struct Recorded {
    inner: Rc<RefCell<Vec<Captured>>>,
}

impl Recorded {
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn sequence_numbers(&self) -> Vec<u32> {
        self.inner
            .borrow()
            .iter()
            .map(|c| c.screenshot.sequence_number())
            .collect()
    }

    pub fn dimensions(&self) -> Vec<(u32, u32)> {
        self.inner
            .borrow()
            .iter()
            .map(|c| (c.screenshot.width(), c.screenshot.height()))
            .collect()
    }

    /// Runs `f` on the most recent capture
    pub fn with_last<R>(&self, f: impl FnOnce(&Captured) -> R) -> Option<R> {
        self.inner.borrow().last().map(f)
    }
}

/// Handler that stores every capture for later inspection
pub fn recording_handler(
    recorded: &Recorded,
) -> impl FnMut(Screenshot, &NamingScheme) -> CaptureResult<()> + 'static {
    let inner = recorded.inner.clone();
    move |screenshot, naming| {
        inner.borrow_mut().push(Captured {
            screenshot,
            naming: naming.clone(),
        });
        Ok(())
    }
}

/// Handler that always fails
pub fn failing_handler() -> impl FnMut(Screenshot, &NamingScheme) -> CaptureResult<()> + 'static
{
    |_screenshot, _naming| {
        Err(CaptureError::EncodingFailed {
            format: "png".to_string(),
            reason: "disk full".to_string(),
        })
    }
}

/// App with an attached, initialized screenshot state that records captures
pub fn recording_app(width: u32, height: u32) -> (HeadlessApp, ScreenshotAppState, Recorded) {
    let recorded = Recorded::default();
    let state = ScreenshotAppState::new().with_handler(recording_handler(&recorded));

    let mut app = HeadlessApp::new(width, height);
    app.attach_state(Box::new(state.clone()));
    app.update(TPF).expect("initial frame should render");

    (app, state, recorded)
}
