// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! ino-connect command line client

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ino_connect::bluetooth::{parse_address, BluetoothManager, RfcommConnection};
use ino_connect::config::Config;
use ino_connect::discovery::{BondState, PeerDescriptor};
use ino_connect::events::EventProcessor;
use ino_connect::state::AppState;
use ino_connect::{ConnectionEvent, PinKind, PinMode};

/// Read and drive the pins of an Arduino board over Bluetooth serial.
#[derive(Parser, Debug)]
#[command(name = "ino-connect", version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan for nearby devices
    Scan {
        /// Print the result as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List paired devices
    Paired,
    /// Remember a device as the default target
    Use { address: String },
    /// Read a pin
    Read {
        kind: PinKind,
        pin: u8,
        #[arg(short, long)]
        address: Option<String>,
    },
    /// Write a pin (digital 0/1, analog 0-1023)
    Write {
        kind: PinKind,
        pin: u8,
        value: u16,
        #[arg(short, long)]
        address: Option<String>,
    },
    /// Set a pin to input or output
    Mode {
        kind: PinKind,
        pin: u8,
        mode: PinMode,
        #[arg(short, long)]
        address: Option<String>,
    },
    /// Send a raw change command (value 0/1)
    Change {
        kind: PinKind,
        pin: u8,
        value: u16,
        #[arg(short, long)]
        address: Option<String>,
    },
}

/// Pin operation to run on a connected device.
enum PinCommand {
    Read(PinKind, u8),
    Write(PinKind, u8, u16),
    Change(PinKind, u8, u16),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose {
        "ino_connect=debug"
    } else {
        "ino_connect=info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.parse()?))
        .init();

    info!("Starting ino-connect v{}", env!("CARGO_PKG_VERSION"));

    let config_path = args.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load_from(&config_path)?;
    info!("Configuration loaded from {}", config_path.display());

    let state = AppState::new();
    let processor = EventProcessor::new(state.clone());

    let (address, command) = match args.command {
        Command::Scan { json } => return scan(&config, &processor, &state, json).await,
        Command::Paired => {
            let manager = BluetoothManager::new(&config.bluetooth).await?;
            for peer in manager.paired_devices().await? {
                println!("{}  {}", peer.address, peer.name);
            }
            return Ok(());
        }
        Command::Use { address } => {
            let address = parse_address(&address)?.to_string();
            config.bluetooth.default_address = Some(address.clone());
            config.save_to(&config_path)?;
            println!("Default device set to {}", address);
            return Ok(());
        }
        Command::Read { kind, pin, address } => (address, PinCommand::Read(kind, pin)),
        Command::Write {
            kind,
            pin,
            value,
            address,
        } => (address, PinCommand::Write(kind, pin, value)),
        Command::Mode {
            kind,
            pin,
            mode,
            address,
        } => (address, PinCommand::Change(kind, pin, mode.value())),
        Command::Change {
            kind,
            pin,
            value,
            address,
        } => (address, PinCommand::Change(kind, pin, value)),
    };

    let address = address
        .or_else(|| config.bluetooth.default_address.clone())
        .context("no device address given and no default device configured (see `ino-connect use`)")?;

    let manager = BluetoothManager::new(&config.bluetooth).await?;
    let address = parse_address(&address)?;
    let peer = match manager.describe(address).await {
        Ok(peer) => peer,
        Err(e) => {
            debug!("Device {} not known to the adapter: {}", address, e);
            PeerDescriptor::new(None, address.to_string(), BondState::None)
        }
    };

    state.set_connecting(peer.address.clone());
    info!("Status: {}", state.get_status().as_str());

    let (event_tx, event_rx) = mpsc::channel::<ConnectionEvent>(8);
    let mut connection = match manager.connect(&peer, event_tx).await {
        Ok(connection) => connection,
        Err(e) => {
            processor.process_connection(ConnectionEvent::Error(e.to_string()));
            return Err(e);
        }
    };

    let outcome = run_pin_command(&mut connection, command).await;
    connection.close().await;
    drop(connection);
    processor.run_connection(event_rx).await;
    info!("Status: {}", state.get_status().as_str());

    println!("{}", outcome?);
    Ok(())
}

async fn run_pin_command(connection: &mut RfcommConnection, command: PinCommand) -> Result<u16> {
    let result = match command {
        PinCommand::Read(kind, pin) => connection.read_pin(kind, pin).await?,
        PinCommand::Write(kind, pin, value) => {
            u16::from(connection.write_pin(kind, pin, value).await?)
        }
        PinCommand::Change(kind, pin, value) => {
            u16::from(connection.change_pin(kind, pin, value).await?)
        }
    };
    Ok(result)
}

async fn scan(
    config: &Config,
    processor: &EventProcessor,
    state: &AppState,
    json: bool,
) -> Result<()> {
    let manager = BluetoothManager::new(&config.bluetooth).await?;
    let (event_tx, event_rx) = mpsc::channel(32);

    let (result, ()) = tokio::join!(manager.scan(event_tx), processor.run_discovery(event_rx));
    result?;

    let ledger = state.get_ledger();
    if json {
        println!("{}", serde_json::to_string_pretty(&ledger)?);
    } else {
        for peer in ledger.peers() {
            println!(
                "{}  {:<24} {}",
                peer.address,
                peer.name,
                peer.bond_state.display_name()
            );
        }
        info!("{} device(s) found", ledger.peers().len());
    }

    Ok(())
}
