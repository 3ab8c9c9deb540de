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
    fmt, io,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr, UdpSocket},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use parking_lot::Mutex;
use socket2::{Domain, Protocol, SockRef, Socket, Type};
use tracing::{debug, error, info, span, trace, Level};

use crate::{artnet, config::ListenerConfig, playsync::CancelHandle};

mod stats;

pub use self::stats::{ListenerStats, StatsSnapshot};

/// Large enough for any UDP datagram, so oversized packets are never silently cut.
const RECEIVE_BUFFER_SIZE: usize = 65536;

/// The lifecycle of a listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListenerState {
    /// Not running. The initial state, and the state after a clean cancellation.
    Stopped,
    /// Binding the socket.
    Starting,
    /// Receiving datagrams.
    Listening,
    /// Cancellation requested, waiting for the receive loop to exit.
    Cancelling,
    /// Binding failed or the socket broke. The listener can't be restarted.
    Failed,
}

impl fmt::Display for ListenerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            ListenerState::Stopped => "Stopped",
            ListenerState::Starting => "Starting",
            ListenerState::Listening => "Listening",
            ListenerState::Cancelling => "Cancelling",
            ListenerState::Failed => "Failed",
        };
        write!(f, "{}", state)
    }
}

/// Errors that can be reported when starting a listener.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("unable to bind Art-Net listener to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("the listener is already running")]
    AlreadyStarted,
    #[error("the listener has failed and must be recreated")]
    Failed,
    #[error("unable to spawn listener thread: {0}")]
    Spawn(#[source] io::Error),
}

/// State shared between the listener handle and its threads.
struct Shared {
    state: Mutex<ListenerState>,
    /// Bumped on every start so threads from an earlier run can't touch the state.
    generation: AtomicU64,
    local_addr: Mutex<Option<SocketAddr>>,
    stats: ListenerStats,
}

impl Shared {
    fn set_state(&self, state: ListenerState) {
        *self.state.lock() = state;
    }
}

/// Receives ArtDmx frames for a single universe and hands each accepted payload to a
/// consumer function.
pub struct Listener {
    config: ListenerConfig,
    shared: Arc<Shared>,
    cancel_handle: Mutex<Option<CancelHandle>>,
    join_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Listener {
    /// Creates a new listener. Nothing is bound until [Listener::start] is called.
    pub fn new(config: ListenerConfig) -> Listener {
        Listener {
            config,
            shared: Arc::new(Shared {
                state: Mutex::new(ListenerState::Stopped),
                generation: AtomicU64::new(0),
                local_addr: Mutex::new(None),
                stats: ListenerStats::default(),
            }),
            cancel_handle: Mutex::new(None),
            join_handles: Mutex::new(Vec::new()),
        }
    }

    /// The listener configuration.
    pub fn config(&self) -> &ListenerConfig {
        &self.config
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ListenerState {
        *self.shared.state.lock()
    }

    /// The address the socket is actually bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.shared.local_addr.lock()
    }

    /// Counters for accepted and discarded datagrams.
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Binds the socket and starts the receive loop on a background thread. `on_frame` is
    /// called synchronously for every accepted payload; the next datagram isn't read until
    /// it returns. Cancelling `cancel_handle` stops the loop.
    pub fn start<F>(&self, on_frame: F, cancel_handle: CancelHandle) -> Result<(), ListenerError>
    where
        F: FnMut(&[u8]) + Send + 'static,
    {
        let generation = {
            let mut state = self.shared.state.lock();
            match *state {
                ListenerState::Stopped => *state = ListenerState::Starting,
                ListenerState::Failed => return Err(ListenerError::Failed),
                _ => return Err(ListenerError::AlreadyStarted),
            }
            self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        let addr = self.config.socket_addr();
        let socket = match bind(addr) {
            Ok(socket) => Arc::new(socket),
            Err(source) => {
                self.shared.set_state(ListenerState::Failed);
                return Err(ListenerError::Bind { addr, source });
            }
        };
        let local_addr = socket.local_addr().unwrap_or(addr);
        *self.shared.local_addr.lock() = Some(local_addr);

        // Set before the threads exist so a cancel can only ever move us forward.
        self.shared.set_state(ListenerState::Listening);
        info!(
            addr = local_addr.to_string(),
            config = self.config.to_string(),
            "Art-Net listener started."
        );

        let finished = Arc::new(AtomicBool::new(false));
        let watcher = {
            let socket = socket.clone();
            let shared = self.shared.clone();
            let cancel_handle = cancel_handle.clone();
            let finished = finished.clone();
            thread::Builder::new()
                .name("artnet-cancel".into())
                .spawn(move || {
                    Self::watch_cancel(
                        &socket,
                        local_addr,
                        &shared,
                        generation,
                        &cancel_handle,
                        finished,
                    )
                })
        };
        let watcher = match watcher {
            Ok(watcher) => watcher,
            Err(e) => {
                self.shared.set_state(ListenerState::Failed);
                return Err(ListenerError::Spawn(e));
            }
        };

        let receiver = {
            let config = self.config.clone();
            let shared = self.shared.clone();
            let cancel_handle = cancel_handle.clone();
            let finished = finished.clone();
            thread::Builder::new().name("artnet-listener".into()).spawn(move || {
                let span = span!(Level::INFO, "Art-Net listener");
                let _enter = span.enter();

                Self::receive_loop(&socket, &config, &shared, &cancel_handle, on_frame);

                finished.store(true, Ordering::Relaxed);
                cancel_handle.notify();
            })
        };
        let receiver = match receiver {
            Ok(receiver) => receiver,
            Err(e) => {
                self.shared.set_state(ListenerState::Failed);
                finished.store(true, Ordering::Relaxed);
                cancel_handle.notify();
                let _ = watcher.join();
                return Err(ListenerError::Spawn(e));
            }
        };

        *self.cancel_handle.lock() = Some(cancel_handle);
        self.join_handles.lock().extend([receiver, watcher]);
        Ok(())
    }

    /// Cancels the receive loop and waits for it to exit. Safe to call any number of times.
    /// Note that this cancels the handle that was passed to [Listener::start].
    pub fn stop(&self) {
        if let Some(cancel_handle) = self.cancel_handle.lock().take() {
            cancel_handle.cancel();
        }
        self.join();
    }

    /// Waits for the listener threads to exit without cancelling them.
    pub fn join(&self) {
        let join_handles: Vec<JoinHandle<()>> = self.join_handles.lock().drain(..).collect();
        for join_handle in join_handles {
            if join_handle.join().is_err() {
                error!("Art-Net listener thread panicked.");
            }
        }
    }

    /// Runs until the socket fails or the cancel handle is cancelled.
    fn receive_loop<F>(
        socket: &UdpSocket,
        config: &ListenerConfig,
        shared: &Shared,
        cancel_handle: &CancelHandle,
        mut on_frame: F,
    ) where
        F: FnMut(&[u8]),
    {
        let mut buf = vec![0u8; RECEIVE_BUFFER_SIZE];

        loop {
            let result = socket.recv_from(&mut buf);

            // Any wakeup after a cancel, error or not, is the socket being shut down.
            if cancel_handle.is_cancelled() {
                shared.set_state(ListenerState::Stopped);
                info!("Art-Net listener stopped.");
                return;
            }

            match result {
                Ok((size, sender)) => {
                    Self::handle_datagram(&buf[..size], sender, config, shared, &mut on_frame)
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    shared.set_state(ListenerState::Failed);
                    error!(err = e.to_string(), "Error receiving Art-Net data, listener stopped.");
                    return;
                }
            }
        }
    }

    /// Filters and decodes a single datagram.
    fn handle_datagram<F>(
        datagram: &[u8],
        sender: SocketAddr,
        config: &ListenerConfig,
        shared: &Shared,
        on_frame: &mut F,
    ) where
        F: FnMut(&[u8]),
    {
        if !config.accepts_sender(&sender) {
            shared.stats.record_filtered_sender();
            debug!(sender = sender.to_string(), "Ignoring datagram from unexpected sender.");
            return;
        }

        match artnet::decode(datagram, config.universe_filter()) {
            Ok(frame) => {
                shared.stats.record_accepted();
                trace!(
                    universe = frame.universe(),
                    length = frame.payload().len(),
                    "Accepted ArtDmx frame."
                );
                on_frame(frame.payload());
            }
            Err(rejection) => {
                shared.stats.record_rejection(&rejection);
                if rejection.is_routine() {
                    trace!(sender = sender.to_string(), "Ignoring datagram: {}", rejection);
                } else {
                    debug!(sender = sender.to_string(), "Ignoring datagram: {}", rejection);
                }
            }
        }
    }

    /// Waits for cancellation and then shuts down the socket, which unblocks the pending
    /// receive. Returns without touching the socket if the receive loop finishes first.
    fn watch_cancel(
        socket: &UdpSocket,
        local_addr: SocketAddr,
        shared: &Shared,
        generation: u64,
        cancel_handle: &CancelHandle,
        finished: Arc<AtomicBool>,
    ) {
        cancel_handle.wait(finished);
        if !cancel_handle.is_cancelled() {
            return;
        }

        {
            // The receive loop may already have stopped and the listener been restarted.
            let mut state = shared.state.lock();
            if *state == ListenerState::Listening
                && shared.generation.load(Ordering::SeqCst) == generation
            {
                *state = ListenerState::Cancelling;
            }
        }

        // Linux wakes blocked receivers even though unconnected UDP sockets report
        // ENOTCONN here. Elsewhere, a datagram to ourselves does the job.
        if let Err(e) = SockRef::from(socket).shutdown(Shutdown::Both) {
            debug!(err = e.to_string(), "Shutting down listener socket reported an error.");
            if let Err(e) = wake(local_addr) {
                error!(err = e.to_string(), "Unable to wake Art-Net listener.");
            }
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Creates a UDP socket with address reuse enabled and binds it.
fn bind(addr: SocketAddr) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    Ok(socket.into())
}

/// Sends an empty datagram to the given listener address.
fn wake(local_addr: SocketAddr) -> io::Result<()> {
    let target_ip = match local_addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    let source = match target_ip {
        IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
        IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
    };
    UdpSocket::bind(source)?.send_to(&[], SocketAddr::new(target_ip, local_addr.port()))?;
    Ok(())
}
