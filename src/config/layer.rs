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
use std::fmt;

use serde::Deserialize;

use super::error::ConfigError;
use crate::dmx::UNIVERSE_SIZE;

/// A YAML representation of a layer bound to a DMX channel.
#[derive(Deserialize, Clone)]
pub(super) struct Layer {
    /// The layer identifier handed to the presenter.
    name: String,

    /// The DMX channel (1..512) that drives this layer.
    channel: i64,
}

impl Layer {
    pub(super) fn to_binding(&self) -> Result<ChannelBinding, ConfigError> {
        ChannelBinding::new(self.name.clone(), self.channel)
    }
}

/// Binds a presentation layer to a DMX channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelBinding {
    identifier: String,
    dmx_channel: u16,
}

impl ChannelBinding {
    /// Creates a new binding. Channels outside of 1..=512 are rejected.
    pub fn new(identifier: String, dmx_channel: i64) -> Result<ChannelBinding, ConfigError> {
        match u16::try_from(dmx_channel) {
            Ok(channel) if channel >= 1 && usize::from(channel) <= UNIVERSE_SIZE => {
                Ok(ChannelBinding {
                    identifier,
                    dmx_channel: channel,
                })
            }
            _ => Err(ConfigError::InvalidChannel {
                identifier,
                channel: dmx_channel,
            }),
        }
    }

    /// The layer identifier.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The 1-based DMX channel.
    pub fn dmx_channel(&self) -> u16 {
        self.dmx_channel
    }

    /// The 0-based index into the DMX buffer.
    pub fn index(&self) -> usize {
        usize::from(self.dmx_channel) - 1
    }
}

impl fmt::Display for ChannelBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- channel {}", self.identifier, self.dmx_channel)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_valid_channels() {
        let first = ChannelBinding::new("first".into(), 1).unwrap();
        assert_eq!(1, first.dmx_channel());
        assert_eq!(0, first.index());

        let last = ChannelBinding::new("last".into(), 512).unwrap();
        assert_eq!(511, last.index());
        assert_eq!("last <- channel 512", last.to_string());
    }

    #[test]
    fn test_invalid_channels() {
        for channel in [0i64, 513, -1, 70000] {
            match ChannelBinding::new("layer".into(), channel) {
                Err(ConfigError::InvalidChannel {
                    identifier,
                    channel: c,
                }) => {
                    assert_eq!("layer", identifier);
                    assert_eq!(channel, c);
                }
                other => panic!("channel {} should be rejected, got {:?}", channel, other),
            }
        }
    }
}
