//! Runtime configuration for the server.
//!
//! Everything has a sensible local-dev default and can be overridden via
//! `CLIPSTREAM_*` environment variables.

use std::env;
use std::io;
use std::path::PathBuf;

/// Video container extensions accepted by `/upload`.
pub const ALLOWED_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "flv", "wmv"];

/// Upload size cap: 500 MB.
pub const MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub db_path: PathBuf,
    /// Skip opening the browser on startup (tests, headless deploys).
    pub open_browser: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let host = env::var("CLIPSTREAM_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("CLIPSTREAM_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let upload_dir = env::var("CLIPSTREAM_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));
        let output_dir = env::var("CLIPSTREAM_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("outputs"));
        let db_path = env::var("CLIPSTREAM_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("users.db"));
        let open_browser = env::var("CLIPSTREAM_NO_BROWSER").is_err();

        Config {
            host,
            port,
            upload_dir,
            output_dir,
            db_path,
            open_browser,
        }
    }

    pub fn ensure_dirs(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.upload_dir)?;
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}
