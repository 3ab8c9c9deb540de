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
use parking_lot::Mutex;

/// A DMX universe is 512 channels.
pub const UNIVERSE_SIZE: usize = 512;

/// A copy of the DMX buffer taken at a single point in time.
#[derive(Clone, PartialEq, Eq)]
pub struct DmxSnapshot {
    /// Channel values, index 0 is DMX channel 1.
    pub channels: [u8; UNIVERSE_SIZE],
    /// False until the first accepted frame has been written.
    pub has_data: bool,
}

impl DmxSnapshot {
    /// Gets the value of the given DMX channel (1..=512).
    pub fn channel(&self, channel: u16) -> Option<u8> {
        let index = usize::from(channel).checked_sub(1)?;
        self.channels.get(index).copied()
    }
}

impl std::fmt::Debug for DmxSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self
            .channels
            .iter()
            .rposition(|value| *value != 0)
            .map_or(0, |index| index + 1);
        f.debug_struct("DmxSnapshot")
            .field("has_data", &self.has_data)
            .field("channels", &&self.channels[..used])
            .finish()
    }
}

struct State {
    channels: [u8; UNIVERSE_SIZE],
    has_data: bool,
}

/// The most recent DMX frame. Written by the listener, read by the sampler. Both
/// operations copy the whole universe under one lock, so readers never see a mix of
/// two frames.
pub struct DmxBuffer {
    state: Mutex<State>,
}

impl Default for DmxBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl DmxBuffer {
    /// Creates a zeroed buffer with no data.
    pub fn new() -> DmxBuffer {
        DmxBuffer {
            state: Mutex::new(State {
                channels: [0; UNIVERSE_SIZE],
                has_data: false,
            }),
        }
    }

    /// Replaces the buffer contents with the given payload. Channels past the end of the
    /// payload are zeroed and anything past 512 bytes is dropped.
    pub fn update(&self, payload: &[u8]) {
        let len = payload.len().min(UNIVERSE_SIZE);
        let mut state = self.state.lock();
        state.channels = [0; UNIVERSE_SIZE];
        state.channels[..len].copy_from_slice(&payload[..len]);
        state.has_data = true;
    }

    /// Copies out the current channels and the data flag.
    pub fn snapshot(&self) -> DmxSnapshot {
        let state = self.state.lock();
        DmxSnapshot {
            channels: state.channels,
            has_data: state.has_data,
        }
    }

    /// Returns true once any frame has been written.
    pub fn has_data(&self) -> bool {
        self.state.lock().has_data
    }
}
