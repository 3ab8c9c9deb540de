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
use std::{
    fmt,
    net::{IpAddr, SocketAddr},
};

use serde::Deserialize;

use super::error::ConfigError;
use crate::artnet::{ANY_UNIVERSE, ARTNET_PORT};

/// A YAML representation of the Art-Net listener configuration.
#[derive(Deserialize, Clone)]
pub(super) struct Listener {
    /// The IP address to bind to.
    bind_address: String,

    /// The UDP port to bind to. Defaults to the Art-Net port.
    port: Option<i64>,

    /// Only accept packets from this sender IP. Empty or missing accepts any sender.
    sender: Option<String>,

    /// Only accept packets for this universe. -1 or missing accepts any universe.
    universe: Option<i64>,
}

impl Listener {
    /// Validates the YAML listener configuration.
    pub(super) fn to_listener_config(&self) -> Result<ListenerConfig, ConfigError> {
        let bind_address: IpAddr = self
            .bind_address
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddress(self.bind_address.clone()))?;

        let port = self.port.unwrap_or(i64::from(ARTNET_PORT));
        let port = u16::try_from(port)
            .ok()
            .filter(|port| *port != 0)
            .ok_or(ConfigError::InvalidPort(port))?;

        let universe = self.universe.unwrap_or(i64::from(ANY_UNIVERSE));
        let universe = i32::try_from(universe)
            .ok()
            .filter(|universe| (ANY_UNIVERSE..=i32::from(u16::MAX)).contains(universe))
            .ok_or(ConfigError::InvalidUniverse(universe))?;

        Ok(ListenerConfig::new(
            bind_address,
            port,
            self.sender.clone(),
            universe,
        ))
    }
}

/// Settings for the Art-Net listener. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenerConfig {
    bind_address: IpAddr,
    port: u16,
    sender_filter: Option<String>,
    universe_filter: i32,
}

impl ListenerConfig {
    /// Creates a new listener configuration. An empty sender filter is the same as none.
    pub fn new(
        bind_address: IpAddr,
        port: u16,
        sender_filter: Option<String>,
        universe_filter: i32,
    ) -> ListenerConfig {
        ListenerConfig {
            bind_address,
            port,
            sender_filter: sender_filter
                .map(|sender| sender.trim().to_string())
                .filter(|sender| !sender.is_empty()),
            universe_filter,
        }
    }

    /// The address the listener binds to.
    pub fn bind_address(&self) -> IpAddr {
        self.bind_address
    }

    /// The port the listener binds to.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The full socket address to bind.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    /// The sender IP that packets must come from, if any.
    pub fn sender_filter(&self) -> Option<&str> {
        self.sender_filter.as_deref()
    }

    /// The universe filter. -1 matches any universe.
    pub fn universe_filter(&self) -> i32 {
        self.universe_filter
    }

    /// Returns true if a datagram from the given sender should be decoded.
    pub fn accepts_sender(&self, sender: &SocketAddr) -> bool {
        match &self.sender_filter {
            Some(filter) => sender.ip().to_string() == *filter,
            None => true,
        }
    }
}

impl fmt::Display for ListenerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())?;
        match self.universe_filter {
            ANY_UNIVERSE => write!(f, ", any universe")?,
            universe => write!(f, ", universe {}", universe)?,
        }
        match &self.sender_filter {
            Some(sender) => write!(f, ", sender {}", sender),
            None => write!(f, ", any sender"),
        }
    }
}

#[cfg(test)]
mod test {
    use config::{Config, File, FileFormat};

    use super::*;

    fn parse(yaml: &str) -> Result<ListenerConfig, ConfigError> {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize::<Listener>()?
            .to_listener_config()
    }

    #[test]
    fn test_defaults() {
        let config = parse("bind_address: 0.0.0.0").unwrap();
        assert_eq!("0.0.0.0:6454", config.socket_addr().to_string());
        assert_eq!(None, config.sender_filter());
        assert_eq!(ANY_UNIVERSE, config.universe_filter());
    }

    #[test]
    fn test_full() {
        let config = parse(
            r#"
            bind_address: 127.0.0.1
            port: 7000
            sender: 10.0.0.9
            universe: 5
        "#,
        )
        .unwrap();
        assert_eq!("127.0.0.1:7000", config.socket_addr().to_string());
        assert_eq!(Some("10.0.0.9"), config.sender_filter());
        assert_eq!(5, config.universe_filter());
        assert_eq!(
            "127.0.0.1:7000, universe 5, sender 10.0.0.9",
            config.to_string()
        );
    }

    #[test]
    fn test_empty_sender_is_any() {
        let config = parse(
            r#"
            bind_address: 127.0.0.1
            sender: ""
        "#,
        )
        .unwrap();
        assert_eq!(None, config.sender_filter());
        assert!(config.accepts_sender(&"192.168.1.1:6454".parse().unwrap()));
    }

    #[test]
    fn test_sender_filter_matches_ip_only() {
        let config = ListenerConfig::new(
            "0.0.0.0".parse().unwrap(),
            6454,
            Some("10.0.0.9".into()),
            ANY_UNIVERSE,
        );
        assert!(config.accepts_sender(&"10.0.0.9:1234".parse().unwrap()));
        assert!(config.accepts_sender(&"10.0.0.9:6454".parse().unwrap()));
        assert!(!config.accepts_sender(&"127.0.0.1:6454".parse().unwrap()));
        assert!(!config.accepts_sender(&"10.0.0.90:6454".parse().unwrap()));
    }

    #[test]
    fn test_invalid_bind_address() {
        assert!(matches!(
            parse("bind_address: localhost"),
            Err(ConfigError::InvalidBindAddress(address)) if address == "localhost"
        ));
    }

    #[test]
    fn test_invalid_port() {
        for port in [0i64, 65536, -1] {
            let yaml = format!("bind_address: 0.0.0.0\nport: {}", port);
            assert!(
                matches!(parse(&yaml), Err(ConfigError::InvalidPort(p)) if p == port),
                "port {} should be rejected",
                port
            );
        }
        assert!(parse("bind_address: 0.0.0.0\nport: 65535").is_ok());
        assert!(parse("bind_address: 0.0.0.0\nport: 1").is_ok());
    }

    #[test]
    fn test_invalid_universe() {
        for universe in [-2i64, 65536] {
            let yaml = format!("bind_address: 0.0.0.0\nuniverse: {}", universe);
            assert!(
                matches!(parse(&yaml), Err(ConfigError::InvalidUniverse(u)) if u == universe),
                "universe {} should be rejected",
                universe
            );
        }
        assert_eq!(
            65535,
            parse("bind_address: 0.0.0.0\nuniverse: 65535")
                .unwrap()
                .universe_filter()
        );
    }
}
