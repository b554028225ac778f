use chrono::Local;
use colored::*;
use lazy_static::lazy_static;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy)]
pub enum Level {
    Info,
    Success,
    Warn,
    Error,
    Debug,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Success => "success",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Debug => "debug",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    pub color: bool,
    pub log_file: Option<PathBuf>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            color: true,
            log_file: None,
        }
    }
}

lazy_static! {
    static ref RENDERER: RwLock<Renderer> = RwLock::new(Renderer::default());
}

// Global debug state
static DEBUG_MODE: AtomicBool = AtomicBool::new(false);

pub fn set_debug_mode(enabled: bool) {
    DEBUG_MODE.store(enabled, Ordering::Relaxed);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_MODE.load(Ordering::Relaxed)
}

pub fn init(log_file: Option<PathBuf>, color: bool) {
    if let Ok(mut r) = RENDERER.write() {
        r.log_file = log_file;
        r.color = color;
    }
}

fn colorize(level: Level, s: &str, enable: bool) -> String {
    if !enable {
        return s.to_string();
    }
    match level {
        Level::Info => s.normal().to_string(),
        Level::Success => s.green().bold().to_string(),
        Level::Warn => s.yellow().bold().to_string(),
        Level::Error => s.red().bold().to_string(),
        Level::Debug => s.cyan().to_string(),
    }
}

pub fn emit(level: Level, code: &str, message: &str) {
    if matches!(level, Level::Debug) && !is_debug_enabled() {
        return;
    }

    let r = RENDERER.read().expect("renderer poisoned").clone();

    let line = colorize(level, message, r.color);
    let mut out: Box<dyn Write> = match level {
        Level::Error | Level::Warn => Box::new(io::stderr()),
        _ => Box::new(io::stdout()),
    };
    let _ = writeln!(out, "{}", line);

    // The scheduled runs happen with nobody at the console; the log file is
    // the record that survives them.
    if let Some(path) = &r.log_file {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let entry = format!("{} - {} [{}]: {}\n", stamp, level.as_str(), code, message);
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = file.write_all(entry.as_bytes());
        }
    }
}

pub mod prelude {
    pub use super::{Level, emit};
}
