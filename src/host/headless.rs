//! Headless reference host
//!
//! An in-memory implementation of the host traits, for tests, benchmarks and
//! the demo binary. It needs no GPU or window:
//!
//! - [`HeadlessRenderer`] keeps an RGBA back buffer filled with a test
//!   pattern and records every viewport change
//! - [`HeadlessInput`] maps keys to actions and dispatches key events
//! - [`HeadlessRenderManager`] owns the post views and drives scene
//!   processors through a frame
//! - [`HeadlessApp`] ties them together with an app-state list
//!
//! # Examples
//!
//! ```
//! use framegrab::{host::headless::HeadlessApp, model::KeyCode};
//!
//! let mut app = HeadlessApp::new(64, 48);
//! app.update(0.016).unwrap();
//! assert_eq!(app.pipeline().frame_count(), 1);
//!
//! // No mapping for this key yet
//! assert_eq!(app.key_event(KeyCode::F12, true), 0);
//! ```

use std::collections::HashMap;

use tracing::{debug, trace};

use super::{
    ActionListener, AppState, Application, FrameBuffer, InputManager, RenderContext,
    RenderManager, RenderQueue, Renderer, SceneProcessor, ViewPort,
};
use crate::{
    error::{CaptureError, CaptureResult},
    model::{Camera, KeyCode, KeyTrigger, ViewportRect},
};

/// Name of the post view every headless render manager starts with
pub const DEFAULT_POST_VIEW: &str = "Gui Default";

/// Software renderer with a single RGBA8 back buffer
///
/// Pixels are stored bottom-up, matching what a GPU readback returns.
/// Reads cover the active viewport only.
#[derive(Debug)]
pub struct HeadlessRenderer {
    width:            u32,
    height:           u32,
    pixels:           Vec<u8>,
    viewport:         ViewportRect,
    viewport_history: Vec<ViewportRect>,
    read_count:       usize,
    last_read_target: Option<FrameBuffer>,
    error_injection:  Option<String>,
}

impl HeadlessRenderer {
    /// Creates a renderer whose back buffer holds a test pattern
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: Self::test_pattern(width, height),
            viewport: ViewportRect::full(width, height),
            viewport_history: Vec::new(),
            read_count: 0,
            last_read_target: None,
            error_injection: None,
        }
    }

    /// Makes every readback fail with `reason`
    pub fn with_read_error(mut self, reason: impl Into<String>) -> Self {
        self.error_injection = Some(reason.into());
        self
    }

    /// Reallocates the back buffer and redraws the test pattern
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = Self::test_pattern(width, height);
        debug!(width, height, "Resized headless back buffer");
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Every viewport set so far, oldest first
    pub fn viewport_history(&self) -> &[ViewportRect] {
        &self.viewport_history
    }

    /// Number of successful readbacks
    pub fn read_count(&self) -> usize {
        self.read_count
    }

    /// Target passed to the most recent successful readback
    pub fn last_read_target(&self) -> Option<&FrameBuffer> {
        self.last_read_target.as_ref()
    }

    /// RGBA value at (`x`, `y`), with `y = 0` the bottom row
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.pixels[offset..offset + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Vertical gradient from blue at the top of the screen to cyan at the
    /// bottom, stored bottom-up
    fn test_pattern(width: u32, height: u32) -> Vec<u8> {
        let start = [0.0f32, 0.0, 255.0];
        let end = [0.0f32, 255.0, 255.0];

        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for row in 0..height {
            let screen_row = height - 1 - row;
            let ratio = screen_row as f32 / height.max(1) as f32;
            let color = [
                (start[0] * (1.0 - ratio) + end[0] * ratio) as u8,
                (start[1] * (1.0 - ratio) + end[1] * ratio) as u8,
                (start[2] * (1.0 - ratio) + end[2] * ratio) as u8,
                255,
            ];
            for _ in 0..width {
                pixels.extend_from_slice(&color);
            }
        }
        pixels
    }
}

impl Renderer for HeadlessRenderer {
    fn set_viewport(&mut self, rect: ViewportRect) {
        self.viewport = rect;
        self.viewport_history.push(rect);
    }

    fn viewport(&self) -> ViewportRect {
        self.viewport
    }

    fn read_frame_buffer(
        &mut self,
        frame_buffer: Option<&FrameBuffer>,
        out: &mut [u8],
    ) -> CaptureResult<()> {
        if let Some(reason) = &self.error_injection {
            return Err(CaptureError::ReadbackFailed {
                reason: reason.clone(),
            });
        }

        let vp = self.viewport;
        let right = vp.x as u64 + vp.width as u64;
        let top = vp.y as u64 + vp.height as u64;
        if right > self.width as u64 || top > self.height as u64 {
            return Err(CaptureError::ReadbackFailed {
                reason: format!(
                    "viewport {}x{} at {},{} exceeds {}x{} surface",
                    vp.width, vp.height, vp.x, vp.y, self.width, self.height
                ),
            });
        }

        let required = vp.area() * 4;
        if out.len() < required {
            return Err(CaptureError::BufferTooSmall {
                required,
                actual: out.len(),
            });
        }

        let row_bytes = vp.width as usize * 4;
        for row in 0..vp.height as usize {
            let src = ((vp.y as usize + row) * self.width as usize + vp.x as usize) * 4;
            let dst = row * row_bytes;
            out[dst..dst + row_bytes].copy_from_slice(&self.pixels[src..src + row_bytes]);
        }

        self.read_count += 1;
        self.last_read_target = frame_buffer.cloned();
        trace!(width = vp.width, height = vp.height, "Read back frame buffer");
        Ok(())
    }
}

/// Key-to-action mapping with listener dispatch
#[derive(Default)]
pub struct HeadlessInput {
    mappings:  HashMap<String, Vec<KeyTrigger>>,
    listeners: Vec<(Vec<String>, Box<dyn ActionListener>)>,
}

impl HeadlessInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Triggers mapped to `name`
    pub fn mapping(&self, name: &str) -> Option<&[KeyTrigger]> {
        self.mappings.get(name).map(Vec::as_slice)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Dispatches a key state change
    ///
    /// Returns the number of listener callbacks made.
    pub fn key_event(&mut self, key: KeyCode, pressed: bool, tpf: f32) -> usize {
        let actions: Vec<&String> = self
            .mappings
            .iter()
            .filter(|(_, triggers)| triggers.iter().any(|t| t.key == key))
            .map(|(name, _)| name)
            .collect();

        let mut dispatched = 0;
        for action in actions {
            for (names, listener) in self.listeners.iter_mut() {
                if names.iter().any(|n| n == action) {
                    listener.on_action(action, pressed, tpf);
                    dispatched += 1;
                }
            }
        }
        dispatched
    }
}

impl InputManager for HeadlessInput {
    fn add_mapping(&mut self, name: &str, trigger: KeyTrigger) {
        let triggers = self.mappings.entry(name.to_string()).or_default();
        if !triggers.contains(&trigger) {
            triggers.push(trigger);
        }
    }

    fn add_listener(&mut self, listener: Box<dyn ActionListener>, names: &[&str]) {
        let names = names.iter().map(|n| n.to_string()).collect();
        self.listeners.push((names, listener));
    }
}

impl std::fmt::Debug for HeadlessInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessInput")
            .field("mappings", &self.mappings)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Per-view context handed to scene processors
struct FrameContext<'a> {
    renderer: &'a mut HeadlessRenderer,
    camera:   &'a Camera,
}

impl RenderContext for FrameContext<'_> {
    fn renderer(&mut self) -> &mut dyn Renderer {
        &mut *self.renderer
    }

    fn current_camera(&self) -> &Camera {
        self.camera
    }
}

/// Drives post views and their scene processors
#[derive(Debug)]
pub struct HeadlessRenderManager {
    renderer:   HeadlessRenderer,
    post_views: Vec<ViewPort>,
    frames:     u64,
}

impl HeadlessRenderManager {
    /// Creates a manager with one full-screen post view
    pub fn new(width: u32, height: u32) -> Self {
        let view = ViewPort::new(DEFAULT_POST_VIEW, Camera::new(width, height));
        Self::with_renderer(HeadlessRenderer::new(width, height)).with_post_view(view)
    }

    /// Creates a manager with no post views
    pub fn with_renderer(renderer: HeadlessRenderer) -> Self {
        Self {
            renderer,
            post_views: Vec::new(),
            frames: 0,
        }
    }

    /// Appends a post view
    pub fn with_post_view(mut self, view: ViewPort) -> Self {
        self.post_views.push(view);
        self
    }

    pub fn renderer(&self) -> &HeadlessRenderer {
        &self.renderer
    }

    pub fn post_views(&self) -> &[ViewPort] {
        &self.post_views
    }

    /// Number of frames rendered so far
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Resizes the output surface and notifies initialized processors
    pub fn resize(&mut self, width: u32, height: u32) -> CaptureResult<()> {
        self.renderer.resize(width, height);
        for view in self.post_views.iter_mut() {
            view.camera_mut().resize(width, height);
            let (camera, _, processors) = view.parts_mut();
            for processor in processors.iter_mut() {
                if processor.is_initialized() {
                    processor.reshape(camera, width, height)?;
                }
            }
        }
        Ok(())
    }

    /// Renders one frame of every post view
    ///
    /// Uninitialized processors are initialized first, then each processor
    /// receives `pre_frame`, `post_queue` and `post_frame` in that order.
    pub fn render_frame(&mut self, tpf: f32) -> CaptureResult<()> {
        let Self {
            renderer,
            post_views,
            frames,
        } = self;

        for view in post_views.iter_mut() {
            let (camera, output, processors) = view.parts_mut();
            renderer.set_viewport(camera.viewport_rect());
            let mut ctx = FrameContext {
                renderer: &mut *renderer,
                camera,
            };

            for processor in processors.iter_mut() {
                if !processor.is_initialized() {
                    processor.initialize(&mut ctx, camera)?;
                }
            }
            for processor in processors.iter_mut() {
                processor.pre_frame(tpf);
            }

            let queue = RenderQueue::default();
            for processor in processors.iter_mut() {
                processor.post_queue(&queue);
            }
            for processor in processors.iter_mut() {
                processor.post_frame(&mut ctx, output)?;
            }
        }

        *frames += 1;
        Ok(())
    }
}

impl RenderManager for HeadlessRenderManager {
    fn post_views_mut(&mut self) -> &mut [ViewPort] {
        &mut self.post_views
    }
}

/// Minimal application: input, render pipeline and attached app states
pub struct HeadlessApp {
    input:          HeadlessInput,
    render_manager: HeadlessRenderManager,
    pending:        Vec<Box<dyn AppState>>,
    states:         Vec<Box<dyn AppState>>,
    last_tpf:       f32,
}

impl HeadlessApp {
    /// Creates an app rendering a `width` x `height` surface
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_render_manager(HeadlessRenderManager::new(width, height))
    }

    pub fn with_render_manager(render_manager: HeadlessRenderManager) -> Self {
        Self {
            input: HeadlessInput::new(),
            render_manager,
            pending: Vec::new(),
            states: Vec::new(),
            last_tpf: 0.0,
        }
    }

    /// Queues `state` for initialization on the next update
    pub fn attach_state(&mut self, state: Box<dyn AppState>) {
        self.pending.push(state);
    }

    /// Initializes pending states, then renders one frame
    ///
    /// A state whose initialization fails stays attached but uninitialized;
    /// the error is returned and no frame is rendered.
    pub fn update(&mut self, tpf: f32) -> CaptureResult<()> {
        self.last_tpf = tpf;

        let mut pending = std::mem::take(&mut self.pending).into_iter();
        while let Some(mut state) = pending.next() {
            let result = state.initialize(self);
            self.states.push(state);
            if let Err(e) = result {
                self.pending.extend(pending);
                return Err(e);
            }
        }

        self.render_manager.render_frame(tpf)
    }

    /// Delivers a key state change to the input listeners
    pub fn key_event(&mut self, key: KeyCode, pressed: bool) -> usize {
        self.input.key_event(key, pressed, self.last_tpf)
    }

    /// Presses and releases `key`
    pub fn tap_key(&mut self, key: KeyCode) -> usize {
        self.key_event(key, true) + self.key_event(key, false)
    }

    /// Resizes the output surface
    pub fn resize(&mut self, width: u32, height: u32) -> CaptureResult<()> {
        self.render_manager.resize(width, height)
    }

    pub fn input(&self) -> &HeadlessInput {
        &self.input
    }

    pub fn pipeline(&self) -> &HeadlessRenderManager {
        &self.render_manager
    }

    pub fn states(&self) -> &[Box<dyn AppState>] {
        &self.states
    }
}

impl Application for HeadlessApp {
    fn input_manager(&mut self) -> &mut dyn InputManager {
        &mut self.input
    }

    fn render_manager(&mut self) -> &mut dyn RenderManager {
        &mut self.render_manager
    }
}

impl std::fmt::Debug for HeadlessApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessApp")
            .field("input", &self.input)
            .field("render_manager", &self.render_manager)
            .field("pending", &self.pending.len())
            .field("states", &self.states.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use super::*;

    #[derive(Default)]
    struct RecordingListener {
        events: std::rc::Rc<std::cell::RefCell<Vec<(String, bool)>>>,
    }

    impl ActionListener for RecordingListener {
        fn on_action(&mut self, name: &str, pressed: bool, _tpf: f32) {
            self.events.borrow_mut().push((name.to_string(), pressed));
        }
    }

    /// Records callback order
    #[derive(Default)]
    struct TraceProcessor {
        calls:       Vec<&'static str>,
        initialized: bool,
    }

    impl SceneProcessor for TraceProcessor {
        fn initialize(&mut self, _ctx: &mut dyn RenderContext, _camera: &Camera) -> CaptureResult<()> {
            self.initialized = true;
            self.calls.push("initialize");
            Ok(())
        }

        fn is_initialized(&self) -> bool {
            self.initialized
        }

        fn reshape(&mut self, _camera: &Camera, _width: u32, _height: u32) -> CaptureResult<()> {
            self.calls.push("reshape");
            Ok(())
        }

        fn pre_frame(&mut self, _tpf: f32) {
            self.calls.push("pre_frame");
        }

        fn post_queue(&mut self, _queue: &RenderQueue) {
            self.calls.push("post_queue");
        }

        fn post_frame(
            &mut self,
            _ctx: &mut dyn RenderContext,
            _out: Option<&FrameBuffer>,
        ) -> CaptureResult<()> {
            self.calls.push("post_frame");
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_pattern_is_bottom_up_gradient() {
        let renderer = HeadlessRenderer::new(4, 100);

        // Top of the screen is the last stored row
        assert_eq!(renderer.pixel(0, 99), Some([0, 0, 255, 255]));
        let bottom = renderer.pixel(0, 0).unwrap();
        assert!(bottom[1] > 200);
        assert_eq!(renderer.pixel(4, 0), None);
    }

    #[test]
    fn test_readback_respects_viewport() {
        let mut renderer = HeadlessRenderer::new(4, 4);
        renderer.set_viewport(ViewportRect::new(2, 2, 2, 2));

        let mut out = vec![0u8; 16];
        renderer.read_frame_buffer(None, &mut out).unwrap();
        assert_eq!(&out[0..4], &renderer.pixel(2, 2).unwrap());
        assert_eq!(renderer.read_count(), 1);
    }

    #[test]
    fn test_readback_buffer_too_small() {
        let mut renderer = HeadlessRenderer::new(4, 4);
        let mut out = vec![0u8; 8];

        let result = renderer.read_frame_buffer(None, &mut out);
        assert!(matches!(
            result,
            Err(CaptureError::BufferTooSmall {
                required: 64,
                actual:   8,
            })
        ));
        assert_eq!(renderer.read_count(), 0);
    }

    #[test]
    fn test_readback_viewport_outside_surface() {
        let mut renderer = HeadlessRenderer::new(4, 4);
        renderer.set_viewport(ViewportRect::new(2, 0, 4, 4));

        let mut out = vec![0u8; 64];
        assert!(matches!(
            renderer.read_frame_buffer(None, &mut out),
            Err(CaptureError::ReadbackFailed { .. })
        ));
    }

    #[test]
    fn test_readback_error_injection() {
        let mut renderer = HeadlessRenderer::new(2, 2).with_read_error("context lost");
        let mut out = vec![0u8; 16];

        let err = renderer.read_frame_buffer(None, &mut out).unwrap_err();
        assert!(err.to_string().contains("context lost"));
    }

    #[test]
    fn test_readback_records_target() {
        let mut renderer = HeadlessRenderer::new(2, 2);
        let target = FrameBuffer {
            id:     7,
            width:  2,
            height: 2,
        };
        let mut out = vec![0u8; 16];

        renderer.read_frame_buffer(Some(&target), &mut out).unwrap();
        assert_eq!(renderer.last_read_target(), Some(&target));
    }

    #[test]
    fn test_input_dispatch_to_registered_listener() {
        let mut input = HeadlessInput::new();
        let listener = RecordingListener::default();
        let events = listener.events.clone();

        input.add_mapping("Capture", KeyTrigger::new(KeyCode::F12));
        input.add_listener(Box::new(listener), &["Capture"]);

        assert_eq!(input.key_event(KeyCode::F12, true, 0.0), 1);
        assert_eq!(input.key_event(KeyCode::ESCAPE, true, 0.0), 0);
        assert_eq!(*events.borrow(), vec![("Capture".to_string(), true)]);
    }

    #[test]
    fn test_input_mapping_is_deduplicated() {
        let mut input = HeadlessInput::new();
        input.add_mapping("Capture", KeyTrigger::new(KeyCode::F12));
        input.add_mapping("Capture", KeyTrigger::new(KeyCode::F12));

        assert_eq!(input.mapping("Capture").map(<[KeyTrigger]>::len), Some(1));
        assert_eq!(input.mapping("Missing"), None);
    }

    #[test]
    fn test_processor_callback_order() {
        let mut manager = HeadlessRenderManager::new(8, 8);
        manager.post_views_mut()[0].add_processor(Box::new(TraceProcessor::default()));

        manager.render_frame(0.016).unwrap();
        manager.render_frame(0.016).unwrap();
        manager.resize(16, 16).unwrap();

        let processor = manager.post_views()[0].processors()[0]
            .as_any()
            .downcast_ref::<TraceProcessor>()
            .unwrap();
        assert_eq!(
            processor.calls,
            vec![
                "initialize",
                "pre_frame",
                "post_queue",
                "post_frame",
                "pre_frame",
                "post_queue",
                "post_frame",
                "reshape",
            ]
        );
        assert_eq!(manager.frame_count(), 2);
    }

    #[test]
    fn test_render_frame_sets_camera_viewport() {
        let mut manager = HeadlessRenderManager::new(100, 50);
        manager.post_views_mut()[0]
            .camera_mut()
            .set_viewport(0.0, 0.5, 0.0, 1.0);

        manager.render_frame(0.016).unwrap();
        assert_eq!(manager.renderer().viewport(), ViewportRect::new(0, 0, 50, 50));
    }

    #[test]
    fn test_app_type_name() {
        let app = HeadlessApp::new(1, 1);
        assert_eq!(app.type_name(), "HeadlessApp");
    }

    #[test]
    fn test_resize_updates_cameras() {
        let mut app = HeadlessApp::new(10, 10);
        app.resize(20, 30).unwrap();

        assert_eq!(app.pipeline().renderer().dimensions(), (20, 30));
        let camera = app.pipeline().post_views()[0].camera();
        assert_eq!((camera.width(), camera.height()), (20, 30));
    }
}
