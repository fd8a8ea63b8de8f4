use std::path::PathBuf;

pub const APP_DIR_NAME: &str = "pocketchat";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const TRANSCRIPT_FILE_NAME: &str = "transcript.json";

/// Per-user config directory: `$XDG_CONFIG_HOME`, then `~/.config`, then the working dir.
pub fn default_config_dir() -> PathBuf {
    config_dir_from(
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

fn config_dir_from(xdg: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    let base = xdg
        .filter(|p| p.is_absolute())
        .or_else(|| home.map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(APP_DIR_NAME)
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_xdg_then_home() {
        assert_eq!(
            config_dir_from(Some("/xdg".into()), Some("/home/u".into())),
            PathBuf::from("/xdg/pocketchat")
        );
        assert_eq!(
            config_dir_from(Some("relative".into()), Some("/home/u".into())),
            PathBuf::from("/home/u/.config/pocketchat")
        );
        assert_eq!(config_dir_from(None, None), PathBuf::from("./pocketchat"));
    }
}
