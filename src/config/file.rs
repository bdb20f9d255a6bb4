//! Reading and writing the TOML configuration file.

use crate::config::{Config, config_file_path};
use crate::error::{Error, Result};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Parse the configuration at `path`.
///
/// A missing file is not an error; every setting then takes its built-in default.
pub fn load_config_file(path: &Path) -> Result<Config> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        Err(source) => {
            return Err(Error::ConfigRead {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let config = toml::from_str(&text).map_err(|source| Error::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Load the user's configuration file.
///
/// Platforms without a config directory run on built-in defaults.
pub fn load_default_config() -> Result<Config> {
    match config_file_path() {
        Ok(path) => load_config_file(&path),
        Err(e) => {
            debug!("{e}; using built-in defaults");
            Ok(Config::default())
        }
    }
}

/// Write `config` to `path` as TOML, creating missing parent directories.
///
/// The file is replaced in one rename, so a reader never sees half a file.
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let write_failed = |source: std::io::Error| Error::ConfigWrite {
        path: path.to_path_buf(),
        source,
    };

    let text = toml::to_string_pretty(config).map_err(|source| Error::ConfigSerialize { source })?;

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(write_failed)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_failed)?;
    tmp.write_all(text.as_bytes()).map_err(write_failed)?;
    tmp.persist(path).map_err(|e| write_failed(e.error))?;
    Ok(())
}

/// Write `config` to the user's configuration file and return its path.
pub fn save_default_config(config: &Config) -> Result<PathBuf> {
    let path = config_file_path()?;
    save_config(config, &path)?;
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::config::InferenceDevice;
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    #[test]
    fn test_load_nonexistent_file_returns_default() {
        let path = Path::new("/nonexistent/path/config.toml");
        let config = load_config_file(path).unwrap();
        assert_eq!(config.defaults.tracker, "bytetrack.yaml");
        assert_eq!(config.inference.device, InferenceDevice::Auto);
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[defaults]
model = "/models/yolov8s-pose.onnx"
confidence = 0.45
imgsz = 960

[inference]
device = "cuda:1"

[output]
pretty_json = true
"#
        )
        .unwrap();

        let config = load_config_file(file.path()).unwrap();
        assert_eq!(config.defaults.confidence, 0.45);
        assert_eq!(config.defaults.imgsz, Some(960));
        assert_eq!(config.defaults.iou, 0.5);
        assert_eq!(config.inference.device, InferenceDevice::Cuda(1));
        assert!(config.output.pretty_json);
        assert_eq!(config.output.codec, "mpeg4");
    }

    #[test]
    fn test_load_invalid_device_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[inference]\ndevice = \"npu\"").unwrap();

        let result = load_config_file(file.path());
        assert!(matches!(result, Err(Error::ConfigParse { .. })));
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not valid toml {{{{").unwrap();

        let config = load_config_file(file.path());
        assert!(config.is_err());
    }

    #[test]
    fn test_load_directory_is_read_error() {
        let dir = tempdir().unwrap();
        let result = load_config_file(dir.path());
        assert!(matches!(result, Err(Error::ConfigRead { .. })));
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "stale = true\n").unwrap();

        save_config(&Config::default(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(!text.contains("stale"));
        assert_eq!(load_config_file(&path).unwrap().defaults.tracker, "bytetrack.yaml");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.defaults.confidence = 0.6;
        config.inference.device = InferenceDevice::Cpu;
        save_config(&config, &path).unwrap();

        let loaded = load_config_file(&path).unwrap();
        assert_eq!(loaded.defaults.confidence, 0.6);
        assert_eq!(loaded.inference.device, InferenceDevice::Cpu);
    }
}
