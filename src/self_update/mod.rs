use anyhow::{Context, Result, anyhow};
use sha2::Digest;
use std::env;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::ui::prelude::*;

const REPO_OWNER: &str = "jpdfr-msft";
const REPO_NAME: &str = "bing-wallpaper-service";
const BIN_NAME: &str = "bingwall";
const GITHUB_API_URL: &str = "https://api.github.com/repos";

#[derive(serde::Deserialize, Debug)]
struct GitHubAsset {
    name: String,
    browser_download_url: String,
}

#[derive(serde::Deserialize, Debug)]
struct GitHubRelease {
    tag_name: String,
    assets: Vec<GitHubAsset>,
}

#[derive(Debug)]
enum UpdatePlan<'a> {
    UpToDate,
    NoMatchingAsset,
    Install {
        asset: &'a GitHubAsset,
        checksum: Option<&'a GitHubAsset>,
    },
}

/// Decide what to do about a published release. Versions are compared for
/// equality only: a rollback published as "latest" must be installed too.
fn plan_update<'a>(release: &'a GitHubRelease, current_version: &str) -> UpdatePlan<'a> {
    if release.tag_name.trim_start_matches('v') == current_version {
        return UpdatePlan::UpToDate;
    }

    match find_asset(release, BIN_NAME) {
        Some(asset) => UpdatePlan::Install {
            asset,
            checksum: find_asset(release, &format!("{}.sha256", BIN_NAME)),
        },
        None => UpdatePlan::NoMatchingAsset,
    }
}

fn find_asset<'a>(release: &'a GitHubRelease, name: &str) -> Option<&'a GitHubAsset> {
    release.assets.iter().find(|a| a.name == name)
}

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(format!("{}/{}", BIN_NAME, env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")
}

/// Fetch the latest release from GitHub
async fn fetch_latest_release(client: &reqwest::Client) -> Result<GitHubRelease> {
    let url = format!(
        "{}/{}/{}/releases/latest",
        GITHUB_API_URL, REPO_OWNER, REPO_NAME
    );

    let response = client
        .get(&url)
        .header("Accept", "application/vnd.github+json")
        .send()
        .await
        .context("Failed to fetch release information")?;

    if !response.status().is_success() {
        return Err(anyhow!("GitHub API returned status: {}", response.status()));
    }

    response
        .json::<GitHubRelease>()
        .await
        .context("Failed to parse release information")
}

/// Download a file from URL
async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> Result<()> {
    let response = client
        .get(url)
        .send()
        .await
        .context("Failed to download file")?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Download failed with status: {}",
            response.status()
        ));
    }

    let bytes = response.bytes().await.context("Failed to read response")?;
    fs::write(dest, bytes).context("Failed to write file")?;

    Ok(())
}

/// Verify the payload against a published checksum, when one exists.
async fn verify_checksum(
    client: &reqwest::Client,
    payload: &Path,
    sha_url: Option<&str>,
) -> Result<()> {
    let Some(sha_url) = sha_url else {
        emit(
            Level::Warn,
            "update.checksum.skip",
            "No checksum available; skipping verification",
        );
        return Ok(());
    };

    let checksum_file = payload.with_extension("sha256");
    download_file(client, sha_url, &checksum_file).await?;

    let checksum_content =
        fs::read_to_string(&checksum_file).context("Failed to read checksum file")?;

    let expected_hash = checksum_content
        .split_whitespace()
        .next()
        .ok_or_else(|| anyhow!("Invalid checksum file format"))?;

    let payload_bytes = fs::read(payload).context("Failed to read payload for verification")?;

    let actual_hash = format!("{:x}", sha2::Sha256::digest(payload_bytes));

    if actual_hash != expected_hash {
        return Err(anyhow!("Checksum verification failed"));
    }

    emit(Level::Success, "update.checksum.verified", "Checksum verified");
    Ok(())
}

fn backup_path(exe: &Path) -> Result<PathBuf> {
    let name = exe
        .file_name()
        .and_then(|n| n.to_str())
        .context("executable has no file name")?;
    Ok(exe.with_file_name(format!("{}.bak", name)))
}

/// Replace the running executable with the downloaded payload.
///
/// The payload is staged beside the target so the final rename stays on one
/// filesystem; a half-written update can never be left in place of the
/// binary.
fn install_over(current_exe: &Path, payload: &Path) -> Result<()> {
    let backup = backup_path(current_exe)?;
    fs::copy(current_exe, &backup).context("Failed to create backup copy")?;
    emit(
        Level::Info,
        "update.backup",
        &format!("Created backup at: {}", backup.display()),
    );

    let staged = current_exe.with_file_name(format!(".{}.update", BIN_NAME));
    fs::copy(payload, &staged).context("Failed to stage update")?;

    let mut perms = fs::metadata(&staged)
        .context("Failed to get staged binary permissions")?
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&staged, perms).context("Failed to set staged binary permissions")?;

    fs::rename(&staged, current_exe).context("Failed to move update into place")?;
    Ok(())
}

/// Check for a newer release and install it over the running binary.
///
/// Returns whether the run should proceed. Failing to check is never fatal:
/// every error path logs and proceeds with the current version. The false
/// return is reserved for "update installed but restart failed" - the new
/// binary is on disk and the next scheduled run will use it, so this run
/// must not continue with the stale image.
pub async fn check_for_updates() -> bool {
    match try_update().await {
        Ok(proceed) => proceed,
        Err(e) => {
            emit(
                Level::Error,
                "update.check.failed",
                &format!("Error checking for updates: {:#}", e),
            );
            true
        }
    }
}

async fn try_update() -> Result<bool> {
    let current_version = env!("CARGO_PKG_VERSION");
    let client = http_client()?;
    let release = fetch_latest_release(&client).await?;

    let latest_version = release.tag_name.trim_start_matches('v');
    if latest_version.is_empty() {
        emit(
            Level::Warn,
            "update.version.unknown",
            "Could not determine latest version",
        );
        return Ok(true);
    }

    let (asset, checksum) = match plan_update(&release, current_version) {
        UpdatePlan::UpToDate => {
            emit(Level::Info, "update.current", "Using latest version");
            return Ok(true);
        }
        UpdatePlan::NoMatchingAsset => {
            emit(
                Level::Warn,
                "update.asset.missing",
                "Update available but couldn't find a download for this binary",
            );
            return Ok(true);
        }
        UpdatePlan::Install { asset, checksum } => (asset, checksum),
    };

    emit(
        Level::Info,
        "update.available",
        &format!(
            "New version available: {} (current: {})",
            latest_version, current_version
        ),
    );

    let current_exe = env::current_exe().context("Failed to get current executable path")?;

    let temp_dir = tempfile::tempdir().context("Failed to create temporary directory")?;
    let payload = temp_dir.path().join(BIN_NAME);

    emit(Level::Info, "update.downloading", "Downloading update...");
    download_file(&client, &asset.browser_download_url, &payload).await?;
    verify_checksum(
        &client,
        &payload,
        checksum.map(|a| a.browser_download_url.as_str()),
    )
    .await?;

    install_over(&current_exe, &payload)?;
    emit(
        Level::Success,
        "update.installed",
        &format!("Updated to version {}", latest_version),
    );

    // Replace this process with the updated binary on the same arguments.
    // Does not return on success.
    let err = Command::new(&current_exe)
        .args(env::args_os().skip(1))
        .exec();
    emit(
        Level::Error,
        "update.restart.failed",
        &format!("Failed to restart after update: {}", err),
    );
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(tag: &str, asset_names: &[&str]) -> GitHubRelease {
        GitHubRelease {
            tag_name: tag.to_string(),
            assets: asset_names
                .iter()
                .map(|name| GitHubAsset {
                    name: name.to_string(),
                    browser_download_url: format!("https://example.com/{}", name),
                })
                .collect(),
        }
    }

    #[test]
    fn test_same_version_means_up_to_date() {
        let release = release("1.0.0", &["bingwall"]);
        assert!(matches!(
            plan_update(&release, "1.0.0"),
            UpdatePlan::UpToDate
        ));
    }

    #[test]
    fn test_v_prefix_is_ignored() {
        let release = release("v1.0.0", &["bingwall"]);
        assert!(matches!(
            plan_update(&release, "1.0.0"),
            UpdatePlan::UpToDate
        ));
    }

    #[test]
    fn test_comparison_is_equality_not_ordering() {
        // A published rollback counts as an update too
        let release = release("v0.9.0", &["bingwall"]);
        assert!(matches!(
            plan_update(&release, "1.0.0"),
            UpdatePlan::Install { .. }
        ));
    }

    #[test]
    fn test_different_version_without_asset_proceeds() {
        let release = release("v1.1.0", &["bingwall-x86_64.tar.gz"]);
        assert!(matches!(
            plan_update(&release, "1.0.0"),
            UpdatePlan::NoMatchingAsset
        ));
    }

    #[test]
    fn test_install_plan_picks_exact_asset_and_checksum() {
        let release = release("v1.1.0", &["bingwall", "bingwall.sha256"]);
        match plan_update(&release, "1.0.0") {
            UpdatePlan::Install { asset, checksum } => {
                assert_eq!(asset.name, "bingwall");
                assert_eq!(
                    asset.browser_download_url,
                    "https://example.com/bingwall"
                );
                assert_eq!(checksum.unwrap().name, "bingwall.sha256");
            }
            other => panic!("expected install plan, got {:?}", other),
        }
    }

    #[test]
    fn test_install_plan_without_checksum_asset() {
        let release = release("v1.1.0", &["bingwall"]);
        match plan_update(&release, "1.0.0") {
            UpdatePlan::Install { checksum, .. } => assert!(checksum.is_none()),
            other => panic!("expected install plan, got {:?}", other),
        }
    }

    #[test]
    fn test_backup_path_is_single_slot() {
        let backup = backup_path(Path::new("/usr/local/bin/bingwall")).unwrap();
        assert_eq!(backup, Path::new("/usr/local/bin/bingwall.bak"));
    }
}
