//! Common test utilities and fixtures
//!
//! This module provides shared test infrastructure

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

use school_console::types::{Board, NewSchool, School, SchoolId};

/// A school with the given id and activation flag
pub fn school(id: &str, is_active: bool) -> School {
    let mut school = NewSchool::new(format!("School {}", id)).into_school(SchoolId::from(id));
    school.is_active = is_active;
    school
}

/// A school with a specific name and address
pub fn named_school(id: &str, name: &str, address: &str) -> School {
    let mut school = school(id, true);
    school.name = name.to_string();
    school.address = address.to_string();
    school
}

pub fn board(id: &str, name: &str) -> Board {
    Board {
        id: id.to_string(),
        name: name.to_string(),
    }
}

/// Isolated data directory plus a config file pointing at it
pub struct TestEnvironment {
    pub root: TempDir,
    pub config_path: PathBuf,
    pub data_dir: PathBuf,
}

impl TestEnvironment {
    /// Environment with no remote API and no session role
    pub fn new() -> Self {
        Self::with_session("")
    }

    /// Environment whose config carries the given `[session]` body
    pub fn with_session(session: &str) -> Self {
        let root = TempDir::new().expect("Failed to create temp directory");
        let data_dir = root.path().join("data");
        let config_path = root.path().join("config.toml");

        let config = format!(
            r#"
[api]
base_url = ""

[session]
{session}

[storage]
data_dir = "{data_dir}"
seed_file = "seed.json"

[logging]
level = "warn"
"#,
            session = session,
            data_dir = data_dir.display()
        );
        fs::write(&config_path, config).expect("Failed to write config");

        Self {
            root,
            config_path,
            data_dir,
        }
    }

    pub fn seed_path(&self) -> PathBuf {
        self.data_dir.join("seed.json")
    }

    pub fn config(&self) -> &Path {
        &self.config_path
    }

    /// The console binary with this environment's config and a clean env
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("school-console").expect("binary should build");
        cmd.arg("--config")
            .arg(&self.config_path)
            .env_remove("SCHOOL_CONSOLE_API_URL")
            .env_remove("SCHOOL_CONSOLE_ROLE")
            .env_remove("SCHOOL_CONSOLE_SCHOOL_ID")
            .env_remove("SCHOOL_CONSOLE_DATA_DIR")
            .env_remove("SCHOOL_CONSOLE_CONFIG")
            .env_remove("RUST_LOG");
        cmd
    }
}
