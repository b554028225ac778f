use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::common::paths;
use crate::config::ServiceConfig;
use crate::ui::prelude::*;

const IMAGE_ARCHIVE_URL: &str = "https://www.bing.com/HPImageArchive.aspx?format=js&idx=0&n=1";
const IMAGE_HOST: &str = "https://www.bing.com";
const IMAGE_FILENAME: &str = "bing-image-of-the-day.jpg";

#[derive(Deserialize, Debug)]
struct ImageArchive {
    images: Vec<ImageOfTheDay>,
}

#[derive(Deserialize, Debug)]
struct ImageOfTheDay {
    urlbase: String,
    #[serde(default)]
    copyright: Option<String>,
}

/// Full image URL at the configured resolution
fn image_url(urlbase: &str, resolution: &str) -> String {
    format!("{}{}_{}.jpg", IMAGE_HOST, urlbase, resolution)
}

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(format!("bingwall/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")
}

/// Download today's image and persist it to the backgrounds directory.
///
/// This is the one step of a run that is allowed to fail it: without the
/// image there is nothing to place anywhere.
pub async fn download_image_of_the_day(config: &ServiceConfig) -> Result<PathBuf> {
    let client = http_client()?;

    let archive_url = format!("{}&mkt={}", IMAGE_ARCHIVE_URL, config.market);
    let archive: ImageArchive = client
        .get(&archive_url)
        .send()
        .await
        .context("Failed to fetch image-of-the-day metadata")?
        .error_for_status()
        .context("Image-of-the-day endpoint returned an error")?
        .json()
        .await
        .context("Failed to parse image-of-the-day metadata")?;

    let today = archive
        .images
        .first()
        .context("Image-of-the-day metadata contained no images")?;
    let full_image_url = image_url(&today.urlbase, &config.resolution);
    emit(Level::Debug, "bing.image.url", &format!("Image URL: {}", full_image_url));

    let pictures_dir = paths::backgrounds_dir()?;
    fs::create_dir_all(&pictures_dir)
        .await
        .with_context(|| format!("creating {}", pictures_dir.display()))?;

    let bytes = client
        .get(&full_image_url)
        .send()
        .await
        .context("Failed to download image")?
        .error_for_status()
        .context("Image download returned an error")?
        .bytes()
        .await
        .context("Failed to read image body")?;

    let image_path = pictures_dir.join(IMAGE_FILENAME);
    let mut file = fs::File::create(&image_path)
        .await
        .with_context(|| format!("creating {}", image_path.display()))?;
    file.write_all(&bytes)
        .await
        .with_context(|| format!("writing {}", image_path.display()))?;

    if let Some(copyright) = &today.copyright {
        emit(Level::Info, "bing.image.copyright", copyright);
    }
    emit(
        Level::Info,
        "bing.image.downloaded",
        &format!("Downloaded Bing image: {}", image_path.display()),
    );

    Ok(image_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_url_derivation() {
        assert_eq!(
            image_url("/th?id=X", "1920x1080"),
            "https://www.bing.com/th?id=X_1920x1080.jpg"
        );
    }

    #[test]
    fn test_image_url_honors_resolution() {
        assert_eq!(
            image_url("/th?id=OHR.Example", "3840x2160"),
            "https://www.bing.com/th?id=OHR.Example_3840x2160.jpg"
        );
    }

    #[test]
    fn test_archive_parsing() {
        let body = r#"{
            "images": [
                {
                    "startdate": "20260807",
                    "urlbase": "/th?id=OHR.Example",
                    "copyright": "Somewhere nice (© Someone)"
                }
            ]
        }"#;
        let archive: ImageArchive = serde_json::from_str(body).unwrap();
        assert_eq!(archive.images.len(), 1);
        assert_eq!(archive.images[0].urlbase, "/th?id=OHR.Example");
        assert_eq!(
            archive.images[0].copyright.as_deref(),
            Some("Somewhere nice (© Someone)")
        );
    }

    #[test]
    fn test_archive_parsing_without_copyright() {
        let body = r#"{"images": [{"urlbase": "/th?id=OHR.Example"}]}"#;
        let archive: ImageArchive = serde_json::from_str(body).unwrap();
        assert!(archive.images[0].copyright.is_none());
    }

    #[test]
    fn test_archive_parsing_empty() {
        let body = r#"{"images": []}"#;
        let archive: ImageArchive = serde_json::from_str(body).unwrap();
        assert!(archive.images.first().is_none());
    }
}
