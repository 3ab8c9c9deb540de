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
    sync::atomic::{AtomicU64, Ordering},
};

use crate::artnet::Rejection;

/// Datagram counters, updated by the receive loop and readable from any thread.
#[derive(Default)]
pub struct ListenerStats {
    accepted: AtomicU64,
    filtered_sender: AtomicU64,
    too_short: AtomicU64,
    bad_signature: AtomicU64,
    wrong_opcode: AtomicU64,
    universe_mismatch: AtomicU64,
    empty_payload: AtomicU64,
    truncated: AtomicU64,
}

impl ListenerStats {
    pub(super) fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_filtered_sender(&self) {
        self.filtered_sender.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_rejection(&self, rejection: &Rejection) {
        let counter = match rejection {
            Rejection::TooShort => &self.too_short,
            Rejection::BadSignature => &self.bad_signature,
            Rejection::WrongOpcode(_) => &self.wrong_opcode,
            Rejection::UniverseMismatch(_) => &self.universe_mismatch,
            Rejection::EmptyPayload => &self.empty_payload,
            Rejection::Truncated { .. } => &self.truncated,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            filtered_sender: self.filtered_sender.load(Ordering::Relaxed),
            too_short: self.too_short.load(Ordering::Relaxed),
            bad_signature: self.bad_signature.load(Ordering::Relaxed),
            wrong_opcode: self.wrong_opcode.load(Ordering::Relaxed),
            universe_mismatch: self.universe_mismatch.load(Ordering::Relaxed),
            empty_payload: self.empty_payload.load(Ordering::Relaxed),
            truncated: self.truncated.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [ListenerStats].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub accepted: u64,
    pub filtered_sender: u64,
    pub too_short: u64,
    pub bad_signature: u64,
    pub wrong_opcode: u64,
    pub universe_mismatch: u64,
    pub empty_payload: u64,
    pub truncated: u64,
}

impl StatsSnapshot {
    /// The number of datagrams the decoder rejected.
    pub fn rejected(&self) -> u64 {
        self.too_short
            + self.bad_signature
            + self.wrong_opcode
            + self.universe_mismatch
            + self.empty_payload
            + self.truncated
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accepted: {}, other senders: {}, rejected: {} (short: {}, signature: {}, opcode: {}, universe: {}, empty: {}, truncated: {})",
            self.accepted,
            self.filtered_sender,
            self.rejected(),
            self.too_short,
            self.bad_signature,
            self.wrong_opcode,
            self.universe_mismatch,
            self.empty_payload,
            self.truncated,
        )
    }
}
