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
use std::error::Error;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{crate_version, Parser, Subcommand};
use dmxlayers::artnet::{ANY_UNIVERSE, ARTNET_PORT};
use dmxlayers::config::{Config, ListenerConfig};
use dmxlayers::dmx::{DmxBuffer, DmxSnapshot};
use dmxlayers::listener::Listener;
use dmxlayers::pipeline::Pipeline;
use dmxlayers::playsync::CancelHandle;
use dmxlayers::presenter;
use tracing::info;

/// The most channels the monitor prints per line.
const MONITOR_CHANNELS: usize = 16;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Drives visual layers from Art-Net DMX."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Starts listening for Art-Net and driving the configured layers.
    Start {
        /// The path to the config file.
        config_path: String,
    },
    /// Loads and validates a config file without starting anything.
    Verify {
        /// The path to the config file.
        config_path: String,
    },
    /// Listens for Art-Net and prints what arrives.
    Monitor {
        /// The IP address to bind to.
        #[arg(short, long, default_value = "0.0.0.0")]
        bind: IpAddr,
        /// The UDP port to bind to.
        #[arg(short, long, default_value_t = ARTNET_PORT, value_parser = clap::value_parser!(u16).range(1..))]
        port: u16,
        /// Only accept this universe. -1 accepts any universe.
        #[arg(short, long, default_value_t = ANY_UNIVERSE, allow_negative_numbers = true, value_parser = clap::value_parser!(i32).range(-1..=65535))]
        universe: i32,
        /// Only accept packets from this sender IP.
        #[arg(short, long)]
        sender: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start { config_path } => {
            let config = Config::deserialize(&PathBuf::from(&config_path))?;
            let presenter = presenter::get_presenter(config.presenter())?;
            let mut pipeline = Pipeline::start(
                config.listener().clone(),
                config.bindings().to_vec(),
                presenter,
            )?;

            tokio::signal::ctrl_c().await?;
            info!("Shutting down.");
            tokio::task::spawn_blocking(move || pipeline.stop()).await?;
        }
        Commands::Verify { config_path } => {
            let config = Config::deserialize(&PathBuf::from(&config_path))?;

            println!("Listener: {}", config.listener());
            println!("Presenter: {}", config.presenter());
            if config.bindings().is_empty() {
                println!("No layers configured.");
                return Ok(());
            }
            println!("Layers (count: {}):", config.bindings().len());
            for binding in config.bindings() {
                println!("- {}", binding);
            }
        }
        Commands::Monitor {
            bind,
            port,
            universe,
            sender,
        } => {
            let listener = Listener::new(ListenerConfig::new(bind, port, sender, universe));
            let buffer = Arc::new(DmxBuffer::new());
            {
                let buffer = buffer.clone();
                listener.start(move |payload| buffer.update(payload), CancelHandle::new())?;
            }

            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        println!("{}", listener.stats());
                        println!("  {}", format_channels(&buffer.snapshot()));
                    }
                    result = tokio::signal::ctrl_c() => {
                        result?;
                        break;
                    }
                }
            }
            tokio::task::spawn_blocking(move || listener.stop()).await?;
        }
    }

    Ok(())
}

/// Formats the leading channels of a snapshot as channel=value pairs.
fn format_channels(snapshot: &DmxSnapshot) -> String {
    if !snapshot.has_data {
        return "no data".to_string();
    }

    let used = snapshot
        .channels
        .iter()
        .rposition(|value| *value != 0)
        .map_or(0, |index| index + 1)
        .min(MONITOR_CHANNELS);
    if used == 0 {
        return "all channels 0".to_string();
    }

    snapshot.channels[..used]
        .iter()
        .enumerate()
        .map(|(index, value)| format!("{}={}", index + 1, value))
        .collect::<Vec<String>>()
        .join(" ")
}
