//! Applying render settings to the host.

use crate::config::RenderConfig;
use crate::error::{CoreError, CoreResult};
use crate::geometry::CameraPose;
use crate::host::Host;

/// Copies resolution, fps and frame step onto the host and re-aims the
/// active camera at the world origin without moving it.
///
/// Returns the camera pose that was applied. Calling this twice leaves the
/// host in the same state as calling it once.
pub fn apply_render_settings<H: Host>(host: &mut H, config: &RenderConfig) -> CoreResult<CameraPose> {
    host.apply_render_settings(&config.render_settings())
        .map_err(CoreError::host)?;

    let location = host.camera_location().map_err(CoreError::host)?;
    let pose = CameraPose::aimed_at_origin(location);
    host.set_camera_pose(pose).map_err(CoreError::host)?;

    log::debug!(
        "Applied render settings {}x{} @ {} fps, step {}",
        config.resolution[0],
        config.resolution[1],
        config.fps,
        config.frame_step
    );
    Ok(pose)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{look_at_origin, Vec3};
    use crate::host::RenderSettings;
    use crate::memory::MemoryHost;

    #[test]
    fn test_apply_copies_settings_and_aims_camera() {
        let mut host = MemoryHost::new(Vec3::new(4.0, -4.0, 2.0));
        host.set_camera_pose(CameraPose::default()).unwrap();

        let mut config = RenderConfig::default().with_resolution(256, 128);
        config.fps = 12;
        config.frame_step = 2;
        let pose = apply_render_settings(&mut host, &config).unwrap();

        assert_eq!(
            host.settings(),
            Some(RenderSettings {
                resolution: [256, 128],
                fps: 12,
                frame_step: 2,
            })
        );
        assert_eq!(pose.location, Vec3::default());
        assert_eq!(host.camera(), pose);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut host = MemoryHost::new(Vec3::new(3.0, -6.0, 2.0));
        let config = RenderConfig::default();
        let first = apply_render_settings(&mut host, &config).unwrap();
        let second = apply_render_settings(&mut host, &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.rotation, look_at_origin(Vec3::new(3.0, -6.0, 2.0)));
    }
}
