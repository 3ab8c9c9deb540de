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
    io,
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use tracing::{info, span, Level};

use crate::{
    config::ChannelBinding,
    dmx::DmxBuffer,
    playsync::CancelHandle,
    presenter::{LayerIntensity, Presenter},
};

/// The target number of samples per second.
pub const TARGET_HZ: f64 = 30.0;

/// Converts a raw DMX value into an intensity between 0.0 and 1.0.
pub fn intensity(value: u8) -> f32 {
    f32::from(value) / f32::from(u8::MAX)
}

/// Samples the DMX buffer on a fixed clock and forwards the bound channels to the
/// presenter.
#[derive(Clone)]
pub struct Sampler {
    buffer: Arc<DmxBuffer>,
    bindings: Arc<Vec<ChannelBinding>>,
    presenter: Arc<dyn Presenter>,
}

impl Sampler {
    /// Creates a new sampler.
    pub fn new(
        buffer: Arc<DmxBuffer>,
        bindings: Vec<ChannelBinding>,
        presenter: Arc<dyn Presenter>,
    ) -> Sampler {
        Sampler {
            buffer,
            bindings: Arc::new(bindings),
            presenter,
        }
    }

    /// Reads the current intensity of every binding. Returns None until the buffer has
    /// received its first frame.
    pub fn sample(&self) -> Option<Vec<LayerIntensity>> {
        let snapshot = self.buffer.snapshot();
        if !snapshot.has_data {
            return None;
        }

        Some(
            self.bindings
                .iter()
                .map(|binding| LayerIntensity {
                    identifier: binding.identifier().to_string(),
                    intensity: intensity(snapshot.channels[binding.index()]),
                })
                .collect(),
        )
    }

    /// Performs a single sampling step. Returns true if a batch was presented.
    pub fn tick(&self) -> bool {
        match self.sample() {
            Some(updates) => {
                self.presenter.present(&updates);
                true
            }
            None => false,
        }
    }

    /// Starts a thread that ticks at [TARGET_HZ] until the cancel handle is cancelled.
    pub fn start_thread(&self, cancel_handle: CancelHandle) -> io::Result<JoinHandle<()>> {
        let sampler = self.clone();

        thread::Builder::new()
            .name("dmx-sampler".into())
            .spawn(move || {
                let span = span!(Level::INFO, "DMX sampler");
                let _enter = span.enter();

                info!(
                    layers = sampler.bindings.len(),
                    presenter = sampler.presenter.to_string(),
                    "Sampler started."
                );

                let mut next_tick = Instant::now();
                let tick_duration = Duration::from_secs(1).div_f64(TARGET_HZ);

                while !cancel_handle.is_cancelled() {
                    sampler.tick();

                    next_tick += tick_duration;
                    let now = Instant::now();
                    if next_tick < now {
                        // Don't burst to catch up after a stall.
                        next_tick = now;
                    }
                    spin_sleep::sleep(next_tick - now);
                }

                info!("Sampler stopped.");
            })
    }
}
