use anyhow::{Context, Result};
use serde::Serialize;
use std::env;
use std::path::PathBuf;

use crate::common::paths;
use crate::common::process::{run_checked, run_unchecked};
use crate::ui::prelude::*;

pub const AGENT_LABEL: &str = "com.user.bingwall";
const DAY_SECONDS: u32 = 86_400;

/// launchd agent descriptor, serialized as an XML property list
#[derive(Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct LaunchAgent {
    label: String,
    program_arguments: Vec<String>,
    run_at_load: bool,
    keep_alive: bool,
    start_interval: u32,
}

impl LaunchAgent {
    fn for_current_exe() -> Result<Self> {
        let exe = env::current_exe().context("Failed to get current executable path")?;
        Ok(Self {
            label: AGENT_LABEL.to_string(),
            program_arguments: vec![exe.to_string_lossy().into_owned()],
            run_at_load: true,
            keep_alive: false,
            start_interval: DAY_SECONDS,
        })
    }
}

/// Register the agent so the service runs at login and once a day.
pub fn install() -> bool {
    match register() {
        Ok(plist_path) => {
            emit(
                Level::Success,
                "agent.installed",
                &format!("Created and loaded launch agent: {}", plist_path.display()),
            );
            true
        }
        Err(e) => {
            emit(
                Level::Error,
                "agent.install.failed",
                &format!("Error creating launch agent: {:#}", e),
            );
            false
        }
    }
}

fn register() -> Result<PathBuf> {
    which::which("launchctl").context("launchctl not found; is this a macOS system?")?;

    let agent = LaunchAgent::for_current_exe()?;
    let plist_path = paths::launch_agents_dir()?.join(format!("{}.plist", AGENT_LABEL));
    plist::to_file_xml(&plist_path, &agent)
        .with_context(|| format!("writing {}", plist_path.display()))?;

    let plist_str = plist_path.to_str().context("non-UTF-8 plist path")?;

    // a stale registration under the same label must not shadow the new one
    let _ = run_unchecked("launchctl", &["unload", plist_str]);
    run_checked("launchctl", &["load", "-w", plist_str])?;

    Ok(plist_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_agent() -> LaunchAgent {
        LaunchAgent {
            label: AGENT_LABEL.to_string(),
            program_arguments: vec!["/usr/local/bin/bingwall".to_string()],
            run_at_load: true,
            keep_alive: false,
            start_interval: DAY_SECONDS,
        }
    }

    #[test]
    fn test_descriptor_serializes_launchd_keys() {
        let mut buf = Vec::new();
        plist::to_writer_xml(&mut buf, &sample_agent()).unwrap();

        let value = plist::Value::from_reader_xml(buf.as_slice()).unwrap();
        let dict = value.as_dictionary().unwrap();

        assert_eq!(
            dict.get("Label").and_then(|v| v.as_string()),
            Some("com.user.bingwall")
        );
        let args = dict
            .get("ProgramArguments")
            .and_then(|v| v.as_array())
            .unwrap();
        assert_eq!(args[0].as_string(), Some("/usr/local/bin/bingwall"));
        assert_eq!(
            dict.get("StartInterval")
                .and_then(|v| v.as_unsigned_integer()),
            Some(86_400)
        );
    }

    #[test]
    fn test_descriptor_flags() {
        let mut buf = Vec::new();
        plist::to_writer_xml(&mut buf, &sample_agent()).unwrap();

        let value = plist::Value::from_reader_xml(buf.as_slice()).unwrap();
        let dict = value.as_dictionary().unwrap();

        // RunAtLoad on, KeepAlive off: one shot at login, rescheduled by
        // StartInterval rather than kept alive by launchd
        assert_eq!(dict.get("RunAtLoad").and_then(|v| v.as_boolean()), Some(true));
        assert_eq!(dict.get("KeepAlive").and_then(|v| v.as_boolean()), Some(false));
    }
}
