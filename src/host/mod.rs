//! Host engine collaborator traits
//!
//! The capture component never owns the engine. Everything it needs from the
//! host is expressed here as small traits:
//!
//! - [`Application`] exposes the input and render managers to app states
//! - [`AppState`] is the attach/initialize lifecycle of a pluggable state
//! - [`InputManager`] and [`ActionListener`] map keys to named actions
//! - [`RenderManager`], [`RenderContext`] and [`Renderer`] expose the render
//!   pipeline, the current camera and pixel readback
//! - [`SceneProcessor`] is a per-view post-processing stage driven every frame
//! - [`StorageFolder`] provides the default output directory
//!
//! All callbacks run on the render thread. A reference implementation lives
//! in [`headless`].

use std::{any::Any, path::PathBuf};

use crate::{
    error::CaptureResult,
    model::{Camera, KeyTrigger, ViewportRect},
};

pub mod headless;

/// Receives named input actions
pub trait ActionListener {
    /// Called when a mapped trigger changes state
    ///
    /// `pressed` is `true` on key-down and `false` on key-up.
    fn on_action(&mut self, name: &str, pressed: bool, tpf: f32);
}

/// Maps triggers to named actions and dispatches them to listeners
pub trait InputManager {
    /// Maps `trigger` to the action `name`
    fn add_mapping(&mut self, name: &str, trigger: KeyTrigger);

    /// Registers `listener` for the given action names
    fn add_listener(&mut self, listener: Box<dyn ActionListener>, names: &[&str]);
}

/// Pixel access to the frame being rendered
pub trait Renderer {
    /// Sets the active viewport
    fn set_viewport(&mut self, rect: ViewportRect);

    /// Returns the active viewport
    fn viewport(&self) -> ViewportRect;

    /// Reads RGBA8 pixels of the active viewport into `out`
    ///
    /// Rows are written bottom-up. `out` must hold at least
    /// `viewport.width * viewport.height * 4` bytes. `frame_buffer` is the
    /// view's output target, `None` for the default back buffer.
    fn read_frame_buffer(
        &mut self,
        frame_buffer: Option<&FrameBuffer>,
        out: &mut [u8],
    ) -> CaptureResult<()>;
}

/// Per-frame context handed to scene processors
pub trait RenderContext {
    /// Renderer for the current view
    fn renderer(&mut self) -> &mut dyn Renderer;

    /// Camera of the view currently being rendered
    fn current_camera(&self) -> &Camera;
}

/// Post-processing stage attached to a view
///
/// The render manager calls [`initialize`](SceneProcessor::initialize) once
/// before the first frame, then every frame [`pre_frame`],
/// [`post_queue`] and [`post_frame`] in that order.
///
/// [`pre_frame`]: SceneProcessor::pre_frame
/// [`post_queue`]: SceneProcessor::post_queue
/// [`post_frame`]: SceneProcessor::post_frame
pub trait SceneProcessor {
    /// Binds the processor to the render pipeline
    fn initialize(&mut self, ctx: &mut dyn RenderContext, camera: &Camera) -> CaptureResult<()>;

    /// Whether [`initialize`](SceneProcessor::initialize) has run
    fn is_initialized(&self) -> bool;

    /// Called when the output surface changes size
    fn reshape(&mut self, camera: &Camera, width: u32, height: u32) -> CaptureResult<()>;

    fn pre_frame(&mut self, _tpf: f32) {}

    fn post_queue(&mut self, _queue: &RenderQueue) {}

    /// Called after the view has been rendered into `out`
    fn post_frame(
        &mut self,
        ctx: &mut dyn RenderContext,
        out: Option<&FrameBuffer>,
    ) -> CaptureResult<()>;

    /// Enables downcasting to the concrete processor type
    fn as_any(&self) -> &dyn Any;
}

/// Access to the render pipeline's views
pub trait RenderManager {
    /// Views rendered after the main scene, in render order
    fn post_views_mut(&mut self) -> &mut [ViewPort];
}

/// Host application as seen by an app state
pub trait Application {
    fn input_manager(&mut self) -> &mut dyn InputManager;

    fn render_manager(&mut self) -> &mut dyn RenderManager;

    /// Short type name of the application, e.g. `"HeadlessApp"`
    fn type_name(&self) -> &'static str {
        simple_type_name(std::any::type_name::<Self>())
    }
}

/// Pluggable application state
pub trait AppState {
    /// Called once when the state is attached to `app`
    fn initialize(&mut self, app: &mut dyn Application) -> CaptureResult<()>;

    fn is_initialized(&self) -> bool;
}

/// Provides the host's default storage folder
pub trait StorageFolder {
    fn storage_folder(&self) -> PathBuf;
}

impl StorageFolder for PathBuf {
    fn storage_folder(&self) -> PathBuf {
        self.clone()
    }
}

/// Off-screen render target a view renders into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pub id:     u32,
    pub width:  u32,
    pub height: u32,
}

/// Geometry queued for a view in the current frame
#[derive(Debug, Clone, Default)]
pub struct RenderQueue {
    opaque:      usize,
    transparent: usize,
}

impl RenderQueue {
    pub fn new(opaque: usize, transparent: usize) -> Self {
        Self {
            opaque,
            transparent,
        }
    }

    pub fn len(&self) -> usize {
        self.opaque + self.transparent
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A camera, its output target and the processors run after it renders
pub struct ViewPort {
    name:       String,
    camera:     Camera,
    output:     Option<FrameBuffer>,
    processors: Vec<Box<dyn SceneProcessor>>,
}

impl ViewPort {
    /// Creates a view rendering to the default back buffer
    pub fn new(name: impl Into<String>, camera: Camera) -> Self {
        Self {
            name: name.into(),
            camera,
            output: None,
            processors: Vec::new(),
        }
    }

    /// Renders the view into an off-screen target instead of the back buffer
    pub fn with_output(mut self, output: FrameBuffer) -> Self {
        self.output = Some(output);
        self
    }

    /// Appends `processor` as the last post-processing stage
    pub fn add_processor(&mut self, processor: Box<dyn SceneProcessor>) {
        self.processors.push(processor);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn output(&self) -> Option<&FrameBuffer> {
        self.output.as_ref()
    }

    pub fn processors(&self) -> &[Box<dyn SceneProcessor>] {
        &self.processors
    }

    /// Splits the view into the parts a render loop needs at the same time
    pub(crate) fn parts_mut(
        &mut self,
    ) -> (&Camera, Option<&FrameBuffer>, &mut [Box<dyn SceneProcessor>]) {
        (&self.camera, self.output.as_ref(), &mut self.processors)
    }
}

impl std::fmt::Debug for ViewPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewPort")
            .field("name", &self.name)
            .field("camera", &self.camera)
            .field("output", &self.output)
            .field("processors", &self.processors.len())
            .finish()
    }
}

/// Strips the module path and generic arguments from a type name
fn simple_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_type_name() {
        assert_eq!(simple_type_name("framegrab::host::headless::HeadlessApp"), "HeadlessApp");
        assert_eq!(simple_type_name("my_game::Game<my_game::Assets>"), "Game");
        assert_eq!(simple_type_name("Plain"), "Plain");
    }

    #[test]
    fn test_render_queue_len() {
        let queue = RenderQueue::new(3, 2);
        assert_eq!(queue.len(), 5);
        assert!(!queue.is_empty());
        assert!(RenderQueue::default().is_empty());
    }

    #[test]
    fn test_path_storage_folder_is_unmodified() {
        let folder = PathBuf::from("/var/lib/game/storage");
        assert_eq!(folder.storage_folder(), PathBuf::from("/var/lib/game/storage"));
    }

    #[test]
    fn test_viewport_debug_counts_processors() {
        let view = ViewPort::new("Gui", Camera::new(10, 10));
        let debug = format!("{:?}", view);
        assert!(debug.contains("Gui"));
        assert!(debug.contains("processors: 0"));
    }
}
