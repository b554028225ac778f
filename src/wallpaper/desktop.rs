use anyhow::{Context, Result};
use std::path::Path;

use super::PlacementError;
use crate::common::paths;
use crate::common::process::{run_checked, run_unchecked};
use crate::ui::prelude::*;

type Mechanism<'a> = (&'static str, Box<dyn Fn() -> Result<()> + 'a>);

/// Set the desktop wallpaper, trying each known mechanism in order.
///
/// The AppleScript route works on a stock system; the Dock database and
/// preference-key routes cover configurations where System Events is locked
/// down. Restarting the Dock alone at least picks up a previously configured
/// picture.
pub fn set_desktop_wallpaper(path: &Path) -> Result<()> {
    if !path.is_absolute() || !path.exists() {
        return Err(PlacementError::ImageNotFound(path.to_path_buf()).into());
    }

    let mechanisms: Vec<Mechanism> = vec![
        ("osascript", Box::new(|| osascript_set(path))),
        ("dock-database", Box::new(|| dock_database_set(path))),
        ("defaults-write", Box::new(|| defaults_set(path))),
        ("dock-restart", Box::new(restart_dock)),
    ];

    let used = try_in_order(&mechanisms)?;
    emit(
        Level::Success,
        "desktop.set",
        &format!("Set desktop wallpaper via {}: {}", used, path.display()),
    );
    Ok(())
}

/// Run the named mechanisms in order; the first success wins and the rest
/// are never attempted.
fn try_in_order(mechanisms: &[Mechanism]) -> Result<&'static str> {
    for &(name, ref run) in mechanisms {
        match run() {
            Ok(()) => return Ok(name),
            Err(e) => emit(
                Level::Warn,
                "desktop.mechanism.failed",
                &format!("Mechanism {} failed: {:#}", name, e),
            ),
        }
    }
    Err(PlacementError::AllMechanismsFailed.into())
}

fn osascript_set(path: &Path) -> Result<()> {
    let script = format!(
        r#"tell application "System Events"
    tell current desktop
        set picture to POSIX file "{}"
    end tell
end tell"#,
        path.display()
    );
    run_checked("osascript", &["-e", &script])
}

fn dock_database_set(path: &Path) -> Result<()> {
    let db = paths::dock_picture_db()?;
    let db = db.to_str().context("non-UTF-8 Dock database path")?;
    let sql = format!("UPDATE data SET value = '{}';", path.display());

    run_checked("sqlite3", &[db, &sql])?;
    run_checked("killall", &["Dock"])
}

fn defaults_set(path: &Path) -> Result<()> {
    let path = path.display().to_string();
    run_checked(
        "defaults",
        &[
            "write",
            "com.apple.desktop",
            "Background",
            "-dict-add",
            "Changes",
            "-string",
            &path,
        ],
    )?;
    run_checked("killall", &["Dock"])
}

fn restart_dock() -> Result<()> {
    run_unchecked("killall", &["Dock"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_missing_image_is_image_not_found() {
        let err = set_desktop_wallpaper(Path::new("/no/such/image.jpg")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlacementError>(),
            Some(PlacementError::ImageNotFound(_))
        ));
    }

    #[test]
    fn test_relative_path_is_image_not_found() {
        let err = set_desktop_wallpaper(Path::new("image.jpg")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlacementError>(),
            Some(PlacementError::ImageNotFound(_))
        ));
    }

    #[test]
    fn test_first_success_short_circuits() {
        let attempts = RefCell::new(Vec::new());
        let mechanisms: Vec<Mechanism> = vec![
            (
                "first",
                Box::new(|| {
                    attempts.borrow_mut().push("first");
                    anyhow::bail!("boom")
                }),
            ),
            (
                "second",
                Box::new(|| {
                    attempts.borrow_mut().push("second");
                    Ok(())
                }),
            ),
            (
                "third",
                Box::new(|| {
                    attempts.borrow_mut().push("third");
                    Ok(())
                }),
            ),
        ];

        let used = try_in_order(&mechanisms).unwrap();
        assert_eq!(used, "second");
        assert_eq!(*attempts.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_all_mechanisms_failing_is_reported() {
        let mechanisms: Vec<Mechanism> = vec![
            ("first", Box::new(|| anyhow::bail!("boom"))),
            ("second", Box::new(|| anyhow::bail!("boom"))),
        ];

        let err = try_in_order(&mechanisms).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlacementError>(),
            Some(PlacementError::AllMechanismsFailed)
        ));
    }
}
