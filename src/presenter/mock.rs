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
use std::{fmt, sync::Arc};

use parking_lot::Mutex;

use super::LayerIntensity;

/// A mock presenter. Doesn't render anything, just records what it was given.
#[derive(Clone)]
pub struct Presenter {
    name: String,
    batches: Arc<Mutex<Vec<Vec<LayerIntensity>>>>,
}

impl Presenter {
    /// Gets the given mock presenter.
    pub fn get(name: &str) -> Presenter {
        Presenter {
            name: name.to_string(),
            batches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The number of batches presented so far.
    pub fn batch_count(&self) -> usize {
        self.batches.lock().len()
    }

    /// The most recently presented batch.
    pub fn last_batch(&self) -> Option<Vec<LayerIntensity>> {
        self.batches.lock().last().cloned()
    }

    /// The intensity most recently presented for the given layer.
    pub fn last_intensity(&self, identifier: &str) -> Option<f32> {
        self.batches.lock().last().and_then(|batch| {
            batch
                .iter()
                .find(|update| update.identifier == identifier)
                .map(|update| update.intensity)
        })
    }
}

impl super::Presenter for Presenter {
    fn present(&self, updates: &[LayerIntensity]) {
        self.batches.lock().push(updates.to_vec());
    }
}

impl fmt::Display for Presenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
