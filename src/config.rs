// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{collections::HashSet, path::Path};

use config::{File, FileFormat};
use serde::Deserialize;

mod error;
mod layer;
mod listener;

pub use self::error::ConfigError;
pub use self::layer::ChannelBinding;
pub use self::listener::ListenerConfig;

/// The presenter used when the config doesn't name one.
pub const DEFAULT_PRESENTER: &str = "log";

/// A YAML representation of the whole configuration file.
#[derive(Deserialize)]
struct ConfigFile {
    /// The Art-Net listener settings.
    listener: listener::Listener,

    /// The layers and the DMX channels driving them.
    #[serde(default)]
    layers: Vec<layer::Layer>,

    /// The presenter that receives sampled intensities.
    presenter: Option<String>,
}

/// Validated configuration. Read-only after loading.
#[derive(Clone, Debug)]
pub struct Config {
    listener: ListenerConfig,
    bindings: Vec<ChannelBinding>,
    presenter: String,
}

impl Config {
    /// Loads and validates a configuration file. The format is inferred from the extension.
    pub fn deserialize(path: &Path) -> Result<Config, ConfigError> {
        let file: ConfigFile = config::Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize()?;
        file.validate()
    }

    /// Loads and validates configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Config, ConfigError> {
        let file: ConfigFile = config::Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize()?;
        file.validate()
    }

    /// The listener configuration.
    pub fn listener(&self) -> &ListenerConfig {
        &self.listener
    }

    /// The layer bindings, in configuration order.
    pub fn bindings(&self) -> &[ChannelBinding] {
        &self.bindings
    }

    /// The name of the presenter to use.
    pub fn presenter(&self) -> &str {
        &self.presenter
    }
}

impl ConfigFile {
    fn validate(self) -> Result<Config, ConfigError> {
        let listener = self.listener.to_listener_config()?;

        let mut seen: HashSet<String> = HashSet::new();
        let bindings = self
            .layers
            .iter()
            .map(|layer| {
                let binding = layer.to_binding()?;
                if !seen.insert(binding.identifier().to_string()) {
                    return Err(ConfigError::DuplicateLayer(binding.identifier().to_string()));
                }
                Ok(binding)
            })
            .collect::<Result<Vec<ChannelBinding>, ConfigError>>()?;

        Ok(Config {
            listener,
            bindings,
            presenter: self
                .presenter
                .unwrap_or_else(|| DEFAULT_PRESENTER.to_string()),
        })
    }
}

#[cfg(test)]
mod test {
    use std::{fs, path::PathBuf};

    use super::*;

    const CONFIG: &str = r#"
listener:
  bind_address: 127.0.0.1
  port: 6454
  universe: 0
layers:
  - name: background
    channel: 1
  - name: logo
    channel: 2
  - name: overlay
    channel: 3
presenter: mock-presenter
"#;

    #[test]
    fn test_parse() {
        let config = Config::parse(CONFIG).unwrap();
        assert_eq!("127.0.0.1:6454", config.listener().socket_addr().to_string());
        assert_eq!(0, config.listener().universe_filter());
        assert_eq!(
            vec![("background", 1), ("logo", 2), ("overlay", 3)],
            config
                .bindings()
                .iter()
                .map(|binding| (binding.identifier(), binding.dmx_channel()))
                .collect::<Vec<(&str, u16)>>()
        );
        assert_eq!("mock-presenter", config.presenter());
    }

    #[test]
    fn test_default_presenter_and_no_layers() {
        let config = Config::parse("listener:\n  bind_address: 0.0.0.0\n").unwrap();
        assert!(config.bindings().is_empty());
        assert_eq!(DEFAULT_PRESENTER, config.presenter());
    }

    #[test]
    fn test_invalid_channel() {
        let yaml = r#"
listener:
  bind_address: 0.0.0.0
layers:
  - name: background
    channel: 513
"#;
        assert!(matches!(
            Config::parse(yaml),
            Err(ConfigError::InvalidChannel { channel: 513, .. })
        ));
    }

    #[test]
    fn test_duplicate_layer() {
        let yaml = r#"
listener:
  bind_address: 0.0.0.0
layers:
  - name: background
    channel: 1
  - name: background
    channel: 2
"#;
        assert!(matches!(
            Config::parse(yaml),
            Err(ConfigError::DuplicateLayer(name)) if name == "background"
        ));
    }

    #[test]
    fn test_missing_listener() {
        assert!(matches!(
            Config::parse("layers: []\n"),
            Err(ConfigError::Load(_))
        ));
    }

    #[test]
    fn test_deserialize_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("dmxlayers.yaml");
        fs::write(&path, CONFIG).unwrap();

        let config = Config::deserialize(&path).unwrap();
        assert_eq!(3, config.bindings().len());
    }

    #[test]
    fn test_deserialize_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::deserialize(&dir.path().join("missing.yaml")),
            Err(ConfigError::Load(_))
        ));
    }
}
