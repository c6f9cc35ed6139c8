//! XDG Base Directory paths for switchboard.
//!
//! CLI tools should use XDG paths for cross-platform consistency,
//! not platform-native paths.

use std::path::PathBuf;

const APP_DIR: &str = "switchboard";

/// File name of the user configuration.
pub const CONFIG_FILE: &str = "config.toml";

/// File name of the model catalog.
pub const CATALOG_FILE: &str = "models.toml";

/// Get the switchboard config directory.
///
/// Returns `$XDG_CONFIG_HOME/switchboard` if set, otherwise
/// `~/.config/switchboard`.
///
/// # Examples
///
/// ```
/// use switchboard_paths::config_dir;
///
/// let catalog = config_dir().join("models.toml");
/// ```
pub fn config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config")
}

/// User configuration file, `config_dir()/config.toml`.
pub fn config_file() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

/// Default model catalog, `config_dir()/models.toml`.
pub fn catalog_file() -> PathBuf {
    config_dir().join(CATALOG_FILE)
}

fn xdg_dir(var: &str, home_relative: &str) -> PathBuf {
    match std::env::var_os(var).filter(|v| !v.is_empty()) {
        Some(base) => PathBuf::from(base).join(APP_DIR),
        None => dirs::home_dir()
            .unwrap_or_default()
            .join(home_relative)
            .join(APP_DIR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_dir_ends_with_app_name() {
        assert!(config_dir().ends_with("switchboard"));
    }

    #[test]
    #[serial]
    fn test_config_dir_respects_xdg_env() {
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", "/tmp/test-config");
        }
        assert_eq!(config_dir(), PathBuf::from("/tmp/test-config/switchboard"));
        assert_eq!(
            catalog_file(),
            PathBuf::from("/tmp/test-config/switchboard/models.toml")
        );
        unsafe {
            std::env::remove_var("XDG_CONFIG_HOME");
        }
    }

    #[test]
    #[serial]
    fn test_empty_xdg_env_is_ignored() {
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", "");
        }
        assert!(config_file().ends_with(".config/switchboard/config.toml"));
        unsafe {
            std::env::remove_var("XDG_CONFIG_HOME");
        }
    }
}
