//! SpriteFrame Core
//!
//! Turntable sprite-frame orchestration. For every selected animation action
//! the camera orbits the world origin at N evenly spaced angles and the
//! action's frame range is rendered at each angle into
//! `root/<action>/direction_<j>/frame_####`.
//!
//! # Architecture
//!
//! The crate never renders anything itself. It drives a host through the
//! [`Host`] and [`Compositor`] traits:
//!
//! 1. **Settings applier** - copies resolution, fps and frame step onto the
//!    host and aims the camera at the origin
//! 2. **Render controller** - validates a job, runs the action × angle loop on
//!    a worker thread, polls it and cancels it cooperatively
//! 3. **Compositor graph builder** - describes a pixelate and posterize node
//!    graph for the host to build
//!
//! The Blender implementation of the host traits lives in
//! `spriteframe-backend-blender`; [`MemoryHost`] is an in-memory host for
//! dry runs and tests.
//!
//! # Example
//!
//! ```ignore
//! use spriteframe_core::{RenderConfig, RenderController};
//!
//! let mut controller = RenderController::new(host);
//! controller.start(&RenderConfig::default().with_output_path("renders"))?;
//! let outcome = controller.run(|| false, |event| println!("{}", event))?;
//! println!("{} renders", outcome.summary().render_calls);
//! ```
//!
//! # Crate Structure
//!
//! - [`geometry`] - Camera orbit math
//! - [`config`] - Persisted render configuration
//! - [`host`] - Host traits and scene data
//! - [`settings`] - Render settings applier
//! - [`controller`] - Batch render state machine
//! - [`job`] - Worker loop, stop flag and progress events
//! - [`layout`] - Output folder layout
//! - [`composite`] - Pixel-art compositor graph
//! - [`memory`] - In-memory host
//! - [`error`] - Error types

pub mod composite;
pub mod config;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod host;
pub mod job;
pub mod layout;
pub mod memory;
pub mod settings;

// Re-export main types at crate root
pub use composite::{confirm_and_generate, generate_composite_nodes, pixel_art_graph, CompositeGraph};
pub use config::{ActionSelection, CameraSettings, PixelArtSettings, RenderConfig};
pub use controller::{JobOutcome, JobState, RenderController, Tick};
pub use error::{BoxedHostError, CodedError, CoreError, CoreResult};
pub use geometry::{CameraPose, Euler, Vec3};
pub use host::{Action, Compositor, Host, RenderSettings, SceneObject};
pub use job::{JobEvent, JobSummary, StopHandle};
pub use memory::MemoryHost;
pub use settings::apply_render_settings;
