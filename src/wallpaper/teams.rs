use anyhow::Result;
use std::path::Path;

use super::copy_to_dirs;
use crate::common::paths;
use crate::ui::prelude::*;

const TEAMS_FILENAME: &str = "bing-background.jpg";

/// Place the image in the Teams background libraries.
///
/// Best effort: Teams may not be installed at all, so nothing here aborts
/// the rest of the run.
pub fn set_teams_background(path: &Path) {
    if let Err(e) = copy_into_upload_dirs(path) {
        emit(
            Level::Error,
            "teams.set.failed",
            &format!("Error setting Teams background: {:#}", e),
        );
    }
}

fn copy_into_upload_dirs(path: &Path) -> Result<()> {
    let dirs = paths::teams_upload_dirs()?;
    copy_to_dirs(&dirs, path, TEAMS_FILENAME, "Teams background")
}
