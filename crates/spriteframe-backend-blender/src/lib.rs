//! SpriteFrame Blender Backend
//!
//! This crate runs SpriteFrame jobs against a `.blend` project, using Blender
//! as a subprocess.
//!
//! # Architecture
//!
//! The backend uses a two-part architecture:
//!
//! 1. **Rust Orchestrator** - Spawns Blender on the project, passes requests
//!    and collects reports
//! 2. **Python Entrypoint** - Runs inside Blender to inspect the scene, apply
//!    settings, render, or rebuild the compositor graph
//!
//! Communication happens via JSON files:
//! - A request JSON with the scene changes is written to a temp file
//! - Blender writes a report JSON with the scene description or the outcome
//!
//! # Example
//!
//! ```ignore
//! use spriteframe_backend_blender::{BlenderHost, OrchestratorConfig};
//! use spriteframe_core::{RenderConfig, RenderController};
//!
//! let host = BlenderHost::open("hero.blend", OrchestratorConfig::default())?;
//! let mut controller = RenderController::new(host);
//! controller.start(&RenderConfig::default().with_output_path("renders"))?;
//! let outcome = controller.run(|| false, |event| println!("{}", event))?;
//! ```
//!
//! # Blender Requirements
//!
//! The orchestrator searches for Blender in:
//!
//! 1. The configured path
//! 2. `BLENDER_PATH` environment variable
//! 3. System PATH
//! 4. Common installation locations (platform-specific)
//!
//! Blender 3.3 or newer is required for the Separate/Combine Color nodes.
//!
//! # Crate Structure
//!
//! - [`host`] - `BlenderHost`, the core host implementation
//! - [`orchestrator`] - Blender subprocess management
//! - [`report`] - Request and report JSON documents
//! - [`error`] - Error types

pub mod error;
pub mod host;
pub mod orchestrator;
pub mod report;

// Re-export main types at crate root
pub use error::{BlenderError, BlenderResult};
pub use host::BlenderHost;
pub use orchestrator::{BlenderMode, Orchestrator, OrchestratorConfig};
pub use report::{BlenderReport, BlenderRequest, CameraInfo, ObjectInfo, SceneInfo};
