use anyhow::{Context, Result};
use std::path::PathBuf;

/// Centralized path management for bingwall
/// Every filesystem location the service touches lives here

pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().context("Unable to determine home directory")
}

/// Get the log directory, creating it if needed
pub fn log_dir() -> Result<PathBuf> {
    let dir = home_dir()?.join("Library").join("Logs");

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating log directory at {}", dir.display()))?;

    Ok(dir)
}

/// Get the log file path
pub fn log_file() -> Result<PathBuf> {
    Ok(log_dir()?.join("bingwall.log"))
}

/// Get the directory the downloaded image is stored in
pub fn backgrounds_dir() -> Result<PathBuf> {
    Ok(home_dir()?.join("Pictures").join("Backgrounds"))
}

/// Get the bingwall config directory, creating it if needed
pub fn config_dir() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join("bingwall");

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating config directory at {}", dir.display()))?;

    Ok(dir)
}

/// Get the launchd agent directory, creating it if needed
pub fn launch_agents_dir() -> Result<PathBuf> {
    let dir = home_dir()?.join("Library").join("LaunchAgents");

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating launch agent directory at {}", dir.display()))?;

    Ok(dir)
}

/// Teams background upload directories, newest install layout first
pub fn teams_upload_dirs() -> Result<[PathBuf; 2]> {
    let home = home_dir()?;
    Ok([
        home.join(
            "Library/Containers/com.microsoft.teams2/Data/Library/Application Support/Microsoft/MSTeams/Backgrounds/Uploads",
        ),
        home.join("Library/Application Support/Microsoft/Teams/Backgrounds/Uploads"),
    ])
}

/// Camera app background directories
pub fn camera_background_dirs() -> Result<[PathBuf; 4]> {
    let home = home_dir()?;
    Ok([
        home.join("Library/Containers/com.apple.Camera/Data/Library/Backgrounds"),
        home.join("Library/Preferences/Camera/Backgrounds"),
        home.join("Pictures/Camera Backgrounds"),
        home.join("Library/Application Support/com.apple.Camera/Backgrounds"),
    ])
}

/// The Dock preference database consulted by the wallpaper fallback
pub fn dock_picture_db() -> Result<PathBuf> {
    Ok(home_dir()?.join("Library/Application Support/Dock/desktoppicture.db"))
}
