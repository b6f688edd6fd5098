//! Render configuration.
//!
//! The configuration lives next to the project file and is edited by the
//! user between jobs. Integer settings are limited to `1..=10000`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::host::{Action, RenderSettings};

/// Upper bound shared by every integer setting.
pub const MAX_SETTING: u32 = 10_000;

/// Upper bound for the pixel-art scalars.
pub const MAX_COMPOSITE_SCALAR: f64 = 10_000.0;

/// Default file name for a persisted configuration.
pub const CONFIG_FILE_NAME: &str = "spriteframe.json";

/// Output folder used when none is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "sprites";

/// Complete configuration for a sprite frame job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    /// Output resolution `[width, height]` in pixels.
    #[serde(default = "default_resolution")]
    pub resolution: [u32; 2],

    /// Number of evenly spaced camera angles around the Z axis.
    #[serde(default = "default_rotation_angles")]
    pub rotation_angles: u32,

    /// Frames per second.
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Frame step between rendered frames.
    #[serde(default = "default_frame_step")]
    pub frame_step: u32,

    /// Output root folder. Relative paths resolve against the project folder.
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Which actions to render.
    #[serde(default)]
    pub actions: ActionSelection,

    /// Camera behaviour during a job.
    #[serde(default)]
    pub camera: CameraSettings,

    /// Pixel-art compositor parameters.
    #[serde(default)]
    pub composite: PixelArtSettings,
}

fn default_resolution() -> [u32; 2] {
    [1920, 1080]
}

fn default_rotation_angles() -> u32 {
    4
}

fn default_fps() -> u32 {
    30
}

fn default_frame_step() -> u32 {
    1
}

fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            rotation_angles: default_rotation_angles(),
            fps: default_fps(),
            frame_step: default_frame_step(),
            output_path: default_output_path(),
            actions: ActionSelection::default(),
            camera: CameraSettings::default(),
            composite: PixelArtSettings::default(),
        }
    }
}

impl RenderConfig {
    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serializes the configuration as pretty JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Sets the output root.
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = path.into();
        self
    }

    /// Sets the number of rotation angles.
    pub fn with_rotation_angles(mut self, count: u32) -> Self {
        self.rotation_angles = count;
        self
    }

    /// Sets the output resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = [width, height];
        self
    }

    /// Render settings the host should apply.
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            resolution: self.resolution,
            fps: self.fps,
            frame_step: self.frame_step,
        }
    }

    /// Output root resolved against `base` when relative.
    pub fn resolved_output_path(&self, base: &Path) -> PathBuf {
        if self.output_path.is_absolute() {
            self.output_path.clone()
        } else {
            base.join(&self.output_path)
        }
    }

    /// Checks every field is inside its allowed range.
    pub fn validate(&self) -> CoreResult<()> {
        check_setting("resolution.width", self.resolution[0])?;
        check_setting("resolution.height", self.resolution[1])?;
        check_setting("rotation_angles", self.rotation_angles)?;
        check_setting("fps", self.fps)?;
        check_setting("frame_step", self.frame_step)?;
        self.composite.validate()?;

        // Action folders under the root are deleted before rendering, so the
        // root may not be the base folder itself.
        if self
            .output_path
            .components()
            .all(|c| matches!(c, Component::CurDir))
        {
            return Err(CoreError::invalid_config(
                "output_path",
                "must name a folder, not the current or project folder",
            ));
        }

        if !self.camera.yaw_correction_degrees.is_finite() {
            return Err(CoreError::invalid_config(
                "camera.yaw_correction_degrees",
                "must be a finite number",
            ));
        }
        Ok(())
    }
}

fn check_setting(field: &'static str, value: u32) -> CoreResult<()> {
    if (1..=MAX_SETTING).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::invalid_config(
            field,
            format!("{} is outside 1..={}", value, MAX_SETTING),
        ))
    }
}

/// Mapping from action name to inclusion flag.
///
/// Actions are keyed by name, so flags stay attached to the right action
/// when actions are added, removed or reordered in the project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionSelection {
    /// Explicit per-action flags.
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,

    /// Whether actions without an explicit flag are rendered.
    #[serde(default = "default_include_unlisted")]
    pub include_unlisted: bool,
}

fn default_include_unlisted() -> bool {
    true
}

impl Default for ActionSelection {
    fn default() -> Self {
        Self {
            flags: BTreeMap::new(),
            include_unlisted: default_include_unlisted(),
        }
    }
}

impl ActionSelection {
    /// A selection that renders only the named actions.
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            flags: names.into_iter().map(|n| (n.into(), true)).collect(),
            include_unlisted: false,
        }
    }

    /// A selection listing every action with the same flag.
    pub fn from_actions(actions: &[Action], flag: bool) -> Self {
        Self {
            flags: actions.iter().map(|a| (a.name.clone(), flag)).collect(),
            include_unlisted: default_include_unlisted(),
        }
    }

    /// Sets the flag for one action.
    pub fn set(&mut self, name: impl Into<String>, included: bool) {
        self.flags.insert(name.into(), included);
    }

    /// Whether the named action is rendered.
    pub fn is_included(&self, name: &str) -> bool {
        self.flags
            .get(name)
            .copied()
            .unwrap_or(self.include_unlisted)
    }

    /// Included actions, in the order the host lists them.
    pub fn resolve(&self, actions: &[Action]) -> Vec<Action> {
        actions
            .iter()
            .filter(|a| self.is_included(&a.name))
            .cloned()
            .collect()
    }

    /// Flagged names that match no action.
    pub fn unknown<'a>(&'a self, actions: &[Action]) -> Vec<&'a str> {
        self.flags
            .keys()
            .filter(|name| !actions.iter().any(|a| &a.name == *name))
            .map(String::as_str)
            .collect()
    }
}

/// Camera behaviour during a render job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraSettings {
    /// Yaw added after aiming at the origin, in degrees.
    #[serde(default = "default_yaw_correction_degrees")]
    pub yaw_correction_degrees: f64,

    /// Move the camera back to its job-start location before each action.
    #[serde(default = "default_reset_each_action")]
    pub reset_each_action: bool,
}

fn default_yaw_correction_degrees() -> f64 {
    0.0
}

fn default_reset_each_action() -> bool {
    true
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            yaw_correction_degrees: default_yaw_correction_degrees(),
            reset_each_action: default_reset_each_action(),
        }
    }
}

impl CameraSettings {
    /// Yaw correction in radians.
    pub fn yaw_correction(&self) -> f64 {
        self.yaw_correction_degrees.to_radians()
    }
}

/// Pixel-art compositor parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PixelArtSettings {
    /// Size of one output pixel block, in rendered pixels.
    #[serde(default = "default_pixel_size")]
    pub pixel_size: f64,

    /// Number of brightness levels kept by posterization.
    #[serde(default = "default_color_palette_size")]
    pub color_palette_size: f64,
}

fn default_pixel_size() -> f64 {
    12.0
}

fn default_color_palette_size() -> f64 {
    30.0
}

impl Default for PixelArtSettings {
    fn default() -> Self {
        Self {
            pixel_size: default_pixel_size(),
            color_palette_size: default_color_palette_size(),
        }
    }
}

impl PixelArtSettings {
    /// Creates new settings.
    pub fn new(pixel_size: f64, color_palette_size: f64) -> Self {
        Self {
            pixel_size,
            color_palette_size,
        }
    }

    /// Checks both scalars are inside `1.0..=10000.0`.
    pub fn validate(&self) -> CoreResult<()> {
        for (field, value) in [
            ("composite.pixel_size", self.pixel_size),
            ("composite.color_palette_size", self.color_palette_size),
        ] {
            if !(1.0..=MAX_COMPOSITE_SCALAR).contains(&value) {
                return Err(CoreError::invalid_config(
                    field,
                    format!("{} is outside 1.0..={}", value, MAX_COMPOSITE_SCALAR),
                ));
            }
        }
        Ok(())
    }
}
