//! Integration test common infrastructure.
//!
//! Runs the slircbot binary against a temporary resource directory, feeding
//! console lines on stdin.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// A bot instance with its own resource directory.
pub struct TestBot {
    dir: TempDir,
    config_path: PathBuf,
}

impl TestBot {
    /// Write a config with one home and one guest channel.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_nickname("slircbot")
    }

    pub fn with_nickname(nickname: &str) -> anyhow::Result<Self> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("slircbot.toml");
        let config = format!(
            r##"
[bot]
nickname = "{nickname}"
prefix = "!"
home_channels = ["#straylight"]
guest_channels = ["#sprawl"]

[resources]
directory = "{}"

[settings.printer]
bell = "off"
"##,
            dir.path().join("resources").display()
        );
        std::fs::write(&config_path, config)?;
        Ok(Self { dir, config_path })
    }

    pub fn resources(&self) -> PathBuf {
        self.dir.path().join("resources")
    }

    /// Seed a resource file before the bot starts.
    pub fn seed(&self, name: &str, contents: &str) -> anyhow::Result<()> {
        std::fs::create_dir_all(self.resources())?;
        std::fs::write(self.resources().join(name), contents)?;
        Ok(())
    }

    /// Run the bot to completion with `lines` on stdin.
    pub fn run(&self, lines: &[&str]) -> anyhow::Result<Output> {
        run_binary(&self.config_path, lines)
    }
}

fn run_binary(config: &Path, lines: &[&str]) -> anyhow::Result<Output> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_slircbot"))
        .arg(config)
        .env("RUST_LOG", "info")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        for line in lines {
            writeln!(stdin, "{line}")?;
        }
    }
    Ok(child.wait_with_output()?)
}
