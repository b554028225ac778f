pub mod camera;
pub mod desktop;
pub mod teams;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::ui::prelude::*;

#[derive(Error, Debug)]
pub enum PlacementError {
    #[error("Image not found: {0}")]
    ImageNotFound(PathBuf),

    #[error("Could not set desktop wallpaper using any mechanism")]
    AllMechanismsFailed,
}

/// Copy `src` into every directory in `dirs` as `file_name`, creating
/// directories as needed. Existing copies are overwritten, so reruns leave a
/// single file per directory. Stops at the first failure.
pub(crate) fn copy_to_dirs(dirs: &[PathBuf], src: &Path, file_name: &str, what: &str) -> Result<()> {
    for dir in dirs {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

        let dest = dir.join(file_name);
        fs::copy(src, &dest)
            .with_context(|| format!("copying {} to {}", src.display(), dest.display()))?;

        emit(
            Level::Info,
            "wallpaper.copied",
            &format!("Copied {} to {}", what, dest.display()),
        );
    }
    Ok(())
}
