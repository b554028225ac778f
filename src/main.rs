mod bing;
mod common;
mod config;
mod launch_agent;
mod self_update;
mod ui;
mod wallpaper;

use anyhow::Result;
use clap::Parser;

use crate::config::ServiceConfig;
use crate::ui::prelude::*;

/// Bing image of the day as desktop, Teams and Camera background
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Install the launch agent and exit
    #[arg(long)]
    install: bool,

    /// Activate debug mode
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    ui::set_debug_mode(cli.debug);
    match common::paths::log_file() {
        Ok(path) => ui::init(Some(path), true),
        Err(e) => {
            ui::init(None, true);
            emit(
                Level::Warn,
                "log.file.unavailable",
                &format!("Logging to console only: {:#}", e),
            );
        }
    }

    if cli.install {
        if launch_agent::install() {
            emit(
                Level::Info,
                "agent.ready",
                "Launch agent installed. The service will run at login and once a day.",
            );
        }
        return Ok(());
    }

    if !self_update::check_for_updates().await {
        return Ok(());
    }

    let config = match ServiceConfig::load() {
        Ok(config) => config,
        Err(e) => {
            emit(
                Level::Warn,
                "config.load.failed",
                &format!("Falling back to default config: {:#}", e),
            );
            ServiceConfig::default()
        }
    };

    if let Err(e) = apply_backgrounds(&config).await {
        emit(
            Level::Error,
            "run.failed",
            &format!("Failed to update backgrounds: {:#}", e),
        );
    }

    Ok(())
}

async fn apply_backgrounds(config: &ServiceConfig) -> Result<()> {
    let image_path = bing::download_image_of_the_day(config).await?;

    // Placements are independent; one failing must not keep the image out
    // of the other locations.
    if let Err(e) = wallpaper::desktop::set_desktop_wallpaper(&image_path) {
        emit(
            Level::Error,
            "desktop.set.failed",
            &format!("Error setting desktop wallpaper: {:#}", e),
        );
    }
    wallpaper::teams::set_teams_background(&image_path);
    wallpaper::camera::set_camera_background(&image_path);

    emit(
        Level::Success,
        "run.done",
        "Background update completed successfully",
    );
    Ok(())
}
