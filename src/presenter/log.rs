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
use std::{collections::HashMap, fmt};

use parking_lot::Mutex;
use tracing::info;

use super::LayerIntensity;

/// Intensity changes smaller than half a DMX step aren't logged. A full step doesn't
/// survive f32 rounding, so comparing against it would drop most one-step changes.
const CHANGE_THRESHOLD: f32 = 0.5 / 255.0;

/// A presenter that logs layer intensities whenever they change.
pub struct Presenter {
    last: Mutex<HashMap<String, f32>>,
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter {
    pub fn new() -> Presenter {
        Presenter {
            last: Mutex::new(HashMap::new()),
        }
    }

    /// Records the batch and returns the updates that differ from what was last seen.
    fn changes(&self, updates: &[LayerIntensity]) -> Vec<LayerIntensity> {
        let mut last = self.last.lock();
        updates
            .iter()
            .filter(|update| {
                let changed = last
                    .get(&update.identifier)
                    .map_or(true, |previous| {
                        (previous - update.intensity).abs() >= CHANGE_THRESHOLD
                    });
                if changed {
                    last.insert(update.identifier.clone(), update.intensity);
                }
                changed
            })
            .cloned()
            .collect()
    }
}

impl super::Presenter for Presenter {
    fn present(&self, updates: &[LayerIntensity]) {
        for update in self.changes(updates) {
            info!(
                layer = update.identifier.as_str(),
                intensity = f64::from(update.intensity),
                "Layer intensity changed."
            );
        }
    }
}

impl fmt::Display for Presenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "log")
    }
}
