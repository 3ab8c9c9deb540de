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
use std::{error::Error, sync::Arc, thread::JoinHandle};

use tracing::{error, info, warn};

use crate::{
    config::{ChannelBinding, ListenerConfig},
    dmx::DmxBuffer,
    listener::{Listener, ListenerError},
    playsync::CancelHandle,
    presenter::Presenter,
    sampler::Sampler,
};

/// Owns the DMX buffer and the two threads that share it: the listener writing frames in
/// and the sampler reading them out.
pub struct Pipeline {
    buffer: Arc<DmxBuffer>,
    listener: Listener,
    sampler_handle: Option<JoinHandle<()>>,
    cancel_handle: CancelHandle,
}

impl Pipeline {
    /// Starts the listener and the sampler. A listener that can't bind is reported and
    /// left in its failed state; the sampler still runs and stays idle.
    pub fn start(
        listener_config: ListenerConfig,
        bindings: Vec<ChannelBinding>,
        presenter: Arc<dyn Presenter>,
    ) -> Result<Pipeline, Box<dyn Error>> {
        let buffer = Arc::new(DmxBuffer::new());
        let cancel_handle = CancelHandle::new();

        let listener = Listener::new(listener_config);
        let result = {
            let buffer = buffer.clone();
            listener.start(move |payload| buffer.update(payload), cancel_handle.clone())
        };
        match result {
            Ok(()) => {}
            Err(e @ ListenerError::Bind { .. }) => {
                warn!(
                    err = e.to_string(),
                    "Art-Net listener unavailable, no DMX data will be received."
                );
            }
            Err(e) => return Err(e.into()),
        }

        let sampler = Sampler::new(buffer.clone(), bindings, presenter);
        let sampler_handle = match sampler.start_thread(cancel_handle.clone()) {
            Ok(handle) => handle,
            Err(e) => {
                listener.stop();
                return Err(e.into());
            }
        };

        Ok(Pipeline {
            buffer,
            listener,
            sampler_handle: Some(sampler_handle),
            cancel_handle,
        })
    }

    /// The shared DMX buffer.
    pub fn buffer(&self) -> &Arc<DmxBuffer> {
        &self.buffer
    }

    /// The Art-Net listener.
    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    /// Stops both threads and waits for them. Safe to call more than once.
    pub fn stop(&mut self) {
        self.cancel_handle.cancel();
        self.listener.stop();
        if let Some(sampler_handle) = self.sampler_handle.take() {
            if sampler_handle.join().is_err() {
                error!("Sampler thread panicked.");
            }
            info!("Pipeline stopped.");
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.stop();
    }
}
