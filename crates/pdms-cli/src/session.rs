//! The persisted login session: which server to talk to and the bearer token
//! it issued.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pdms_core::account::Role;
use serde::{Deserialize, Serialize};

pub const DEFAULT_URL: &str = "http://localhost:4000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
  pub base_url: String,
  #[serde(default)]
  pub token:    Option<String>,
  #[serde(default)]
  pub role:     Option<Role>,
}

impl Session {
  /// A session with no token, for logging in.
  pub fn anonymous(base_url: impl Into<String>) -> Self {
    Self { base_url: base_url.into(), token: None, role: None }
  }

  /// Default location: `$HOME/.config/pdms/session.toml`.
  pub fn default_path() -> PathBuf {
    std::env::var_os("HOME")
      .map(PathBuf::from)
      .unwrap_or_default()
      .join(".config/pdms/session.toml")
  }

  /// Read the session at `path`; `None` if there is none.
  pub fn load(path: &Path) -> Result<Option<Self>> {
    if !path.exists() {
      return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading session file {}", path.display()))?;
    let session = toml::from_str(&raw)
      .with_context(|| format!("parsing session file {}", path.display()))?;
    Ok(Some(session))
  }

  pub fn save(&self, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
      std::fs::create_dir_all(dir)
        .with_context(|| format!("creating {}", dir.display()))?;
    }
    let raw = toml::to_string(self).context("serialising session")?;
    std::fs::write(path, raw)
      .with_context(|| format!("writing session file {}", path.display()))
  }

  /// Delete the session at `path`. Returns `false` if there was none.
  pub fn remove(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
      Ok(()) => Ok(true),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
      Err(e) => {
        Err(e).with_context(|| format!("removing session file {}", path.display()))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_path() -> PathBuf {
    std::env::temp_dir()
      .join(format!("pdms-session-{}", uuid::Uuid::new_v4()))
      .join("session.toml")
  }

  #[test]
  fn save_load_remove() {
    let path = temp_path();
    assert!(Session::load(&path).unwrap().is_none());

    let session = Session {
      base_url: "http://pd.example.edu".into(),
      token:    Some("abc.def.ghi".into()),
      role:     Some(Role::Creator),
    };
    session.save(&path).unwrap();
    assert_eq!(Session::load(&path).unwrap(), Some(session));

    assert!(Session::remove(&path).unwrap());
    assert!(!Session::remove(&path).unwrap());
    assert!(Session::load(&path).unwrap().is_none());
  }
}
