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

//! Drives visual layers from Art-Net DMX data.
//!
//! ArtDmx datagrams are received by the [listener], decoded by [artnet], and written into
//! a shared [dmx::DmxBuffer]. The [sampler] reads that buffer at a fixed rate and hands
//! normalized layer intensities to a [presenter::Presenter].

pub mod artnet;
pub mod config;
pub mod dmx;
pub mod listener;
pub mod pipeline;
pub mod playsync;
pub mod presenter;
pub mod sampler;
#[cfg(test)]
mod testutil;
