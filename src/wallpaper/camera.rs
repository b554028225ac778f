use anyhow::{Context, Result};
use std::path::Path;

use super::copy_to_dirs;
use crate::common::paths;
use crate::common::process::run_checked;
use crate::ui::prelude::*;

/// Place the image in the Camera app background libraries and register it
/// as a capture background.
///
/// Best effort, like the Teams placement.
pub fn set_camera_background(path: &Path) {
    if let Err(e) = place_and_register(path) {
        emit(
            Level::Error,
            "camera.set.failed",
            &format!("Error setting Camera background: {:#}", e),
        );
    }
}

fn place_and_register(path: &Path) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("image path has no file name")?;

    let dirs = paths::camera_background_dirs()?;
    copy_to_dirs(&dirs, path, file_name, "camera background")?;

    register_capture_background(path);

    emit(
        Level::Info,
        "camera.set",
        &format!("Camera background set to: {}", path.display()),
    );
    Ok(())
}

/// Preference-level registration. Neither key is honored on every macOS
/// release, so a failure here only warns.
fn register_capture_background(path: &Path) {
    let path = path.display().to_string();
    let commands: [(&str, Vec<&str>); 2] = [
        (
            "defaults",
            vec![
                "write",
                "com.apple.AVFoundation",
                "AVCaptureBackgroundImageURL",
                "-string",
                &path,
            ],
        ),
        ("systemsetup", vec!["-setdesktoppicture", &path]),
    ];

    for (program, args) in &commands {
        match run_checked(program, args) {
            Ok(()) => emit(
                Level::Info,
                "camera.registered",
                &format!("Registered capture background via {}", program),
            ),
            Err(e) => emit(
                Level::Warn,
                "camera.register.failed",
                &format!("Capture background registration failed: {:#}", e),
            ),
        }
    }
}
