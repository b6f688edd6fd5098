//! Output folder layout.
//!
//! Frames land in `root/<action>/direction_<j>/frame_####.<ext>`, with `j`
//! counting from zero and `####` replaced by the zero-padded frame number.

use std::path::{Component, Path, PathBuf};

use crate::error::{CoreError, CoreResult};

/// Prefix of every per-angle folder.
pub const DIRECTION_PREFIX: &str = "direction_";

/// File stem template for rendered frames.
pub const FRAME_TEMPLATE: &str = "frame_####";

/// Folder holding every direction of one action.
pub fn action_dir(root: &Path, action: &str) -> PathBuf {
    root.join(action)
}

/// Folder for one camera angle of one action.
pub fn direction_dir(root: &Path, action: &str, direction: u32) -> PathBuf {
    action_dir(root, action).join(format!("{}{}", DIRECTION_PREFIX, direction))
}

/// Output path template handed to the renderer for one direction folder.
pub fn frame_template(direction_dir: &Path) -> PathBuf {
    direction_dir.join(FRAME_TEMPLATE)
}

/// Replaces the last run of `#` in `template` with `frame`, zero-padded to
/// the run's width. Templates without `#` get four digits appended.
pub fn expand_frame_template(template: &str, frame: i32) -> String {
    match template.rfind('#') {
        Some(end) => {
            let start = template[..=end].trim_end_matches('#').len();
            let width = end + 1 - start;
            format!(
                "{}{:0width$}{}",
                &template[..start],
                frame,
                &template[end + 1..],
                width = width
            )
        }
        None => format!("{}{:04}", template, frame),
    }
}

/// Checks an action name can be used as a single folder name under the
/// output root.
pub fn check_action_name(name: &str) -> CoreResult<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(CoreError::InvalidActionName {
            name: name.to_string(),
        }),
    }
}
