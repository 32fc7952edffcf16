use dirs::data_dir;
use once_cell::sync::Lazy;
use std::{
    fs,
    path::{Path, PathBuf},
};

static DATA_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    let base = data_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    base.join("fide-ics")
});

pub fn data_root() -> PathBuf {
    DATA_ROOT.clone()
}

/// `$FIDE_ICS_CONFIG` when set, otherwise `config.json` under the data root.
pub fn config_path() -> PathBuf {
    match std::env::var_os("FIDE_ICS_CONFIG") {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => data_root().join("config.json"),
    }
}

pub fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
