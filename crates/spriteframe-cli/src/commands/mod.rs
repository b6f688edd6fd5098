//! Command implementations for the SpriteFrame CLI.

pub mod apply_settings;
pub mod composite;
pub mod doctor;
pub mod init;
pub mod inspect;
pub mod render;

use anyhow::{Context, Result};
use spriteframe_backend_blender::{BlenderHost, OrchestratorConfig};
use std::path::Path;

/// Options shared by every command that opens a project.
#[derive(Debug, Clone, Default)]
pub struct BlenderOptions {
    /// Explicit Blender executable.
    pub blender: Option<String>,
    /// Per-render timeout in seconds.
    pub render_timeout_secs: Option<u64>,
}

impl BlenderOptions {
    /// Orchestrator configuration for these options.
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        let mut config = OrchestratorConfig::default();
        if let Some(path) = &self.blender {
            config = config.blender_path(path);
        }
        if let Some(secs) = self.render_timeout_secs {
            config = config.render_timeout_secs(secs);
        }
        config
    }
}

/// Opens and inspects a project.
pub(crate) fn open_project(project: &Path, options: &BlenderOptions) -> Result<BlenderHost> {
    BlenderHost::open(project, options.orchestrator_config())
        .with_context(|| format!("failed to open {}", project.display()))
}
