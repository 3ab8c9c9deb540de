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

/// Typed error for config load/parse/validation failures so callers can distinguish
/// e.g. a missing file from a bad channel number without string matching.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config load/parse error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid bind address '{0}': expected an IP literal")]
    InvalidBindAddress(String),

    #[error("Invalid port {0}: must be between 1 and 65535")]
    InvalidPort(i64),

    #[error("Invalid universe {0}: must be -1 (any) or between 0 and 65535")]
    InvalidUniverse(i64),

    #[error("Invalid DMX channel {channel} for layer '{identifier}': must be between 1 and 512")]
    InvalidChannel { identifier: String, channel: i64 },

    #[error("Layer '{0}' is bound more than once")]
    DuplicateLayer(String),
}
