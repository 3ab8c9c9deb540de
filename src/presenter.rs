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
use std::{error::Error, fmt, sync::Arc};

mod log;
mod mock;

/// A normalized intensity for a single layer.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerIntensity {
    /// The layer identifier from the channel binding.
    pub identifier: String,
    /// The intensity, 0.0 to 1.0 inclusive.
    pub intensity: f32,
}

/// Consumes the sampled layer intensities. Called from the sampler thread once per tick
/// with one entry per configured binding.
pub trait Presenter: fmt::Display + std::marker::Send + std::marker::Sync {
    /// Presents a batch of layer intensities.
    fn present(&self, updates: &[LayerIntensity]);
}

/// Gets a presenter with the given name.
pub fn get_presenter(name: &str) -> Result<Arc<dyn Presenter>, Box<dyn Error>> {
    if name.starts_with("mock") {
        return Ok(Arc::new(mock::Presenter::get(name)));
    }

    match name {
        "log" => Ok(Arc::new(log::Presenter::new())),
        _ => Err(format!("unknown presenter '{}'", name).into()),
    }
}

pub mod test {
    pub use super::mock::Presenter;
}
