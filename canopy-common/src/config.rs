//! Configuration loading and root folder resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "canopy.db";

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file (`root_folder` key)
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, env_var_name: &str) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = locate_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return PathBuf::from(root_folder);
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Ensure the root folder exists, creating it if necessary
pub fn ensure_root_folder(root: &Path) -> Result<()> {
    if !root.exists() {
        std::fs::create_dir_all(root)?;
    }
    if !root.is_dir() {
        return Err(Error::Config(format!(
            "Root folder is not a directory: {}",
            root.display()
        )));
    }
    Ok(())
}

/// Path to the database file inside the root folder
pub fn database_path(root: &Path) -> PathBuf {
    root.join(DATABASE_FILE)
}

/// Locate the configuration file for the platform
fn locate_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/canopy/config.toml first, then /etc/canopy/config.toml
        if let Some(path) = dirs::config_dir().map(|d| d.join("canopy").join("config.toml")) {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/canopy/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        Err(Error::Config("No config file found".to_string()))
    } else {
        let path = dirs::config_dir()
            .map(|d| d.join("canopy").join("config.toml"))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {:?}", path)))
        }
    }
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("canopy"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/canopy"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("canopy"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/canopy"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("canopy"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\canopy"))
    } else {
        PathBuf::from("./canopy_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_cli_arg_wins() {
        let root = resolve_root_folder(Some("/tmp/canopy-cli"), "CANOPY_TEST_UNSET");
        assert_eq!(root, PathBuf::from("/tmp/canopy-cli"));
    }

    #[test]
    #[serial]
    fn test_env_var_used_when_no_cli_arg() {
        std::env::set_var("CANOPY_TEST_ROOT", "/tmp/canopy-env");
        let root = resolve_root_folder(None, "CANOPY_TEST_ROOT");
        std::env::remove_var("CANOPY_TEST_ROOT");
        assert_eq!(root, PathBuf::from("/tmp/canopy-env"));
    }

    #[test]
    #[serial]
    fn test_fallback_without_cli_or_env() {
        std::env::remove_var("CANOPY_TEST_ROOT");
        let root = resolve_root_folder(None, "CANOPY_TEST_ROOT");
        // Falls through to config file or compiled default; either way non-empty
        assert!(!root.as_os_str().is_empty());
    }

    #[test]
    fn test_database_path() {
        let root = PathBuf::from("/data/canopy");
        assert_eq!(database_path(&root), PathBuf::from("/data/canopy/canopy.db"));
    }

    #[test]
    fn test_ensure_root_folder_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("nested").join("root");
        ensure_root_folder(&root).unwrap();
        assert!(root.is_dir());
    }
}
