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

//! BlueZ adapter access and RFCOMM connections.

use anyhow::{Context, Result};
use bluer::rfcomm::{SocketAddr, Stream};
use bluer::{Adapter, Address};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::BluetoothConfig;
use crate::connection::{Connection, ConnectionEvent};
use crate::discovery::{BondState, PeerDescriptor};
use crate::transport::StreamTransport;

/// Standard SPP UUID.
pub const SPP_UUID: Uuid = Uuid::from_u128(0x00001101_0000_1000_8000_00805F9B34FB);

/// Connection to a device over RFCOMM.
pub type RfcommConnection = Connection<StreamTransport<Stream>>;

/// Manager for the local Bluetooth adapter.
pub struct BluetoothManager {
    pub(super) adapter: Adapter,
    pub(super) config: BluetoothConfig,
}

impl BluetoothManager {
    /// Open the configured adapter and power it on.
    pub async fn new(config: &BluetoothConfig) -> Result<Self> {
        info!("Initializing Bluetooth...");

        let session = bluer::Session::new()
            .await
            .context("failed to connect to BlueZ")?;

        let adapter = match &config.adapter {
            Some(name) => session
                .adapter(name)
                .with_context(|| format!("Bluetooth adapter {} not found", name))?,
            None => session.default_adapter().await?,
        };
        info!("Using Bluetooth adapter: {}", adapter.name());

        if !adapter.is_powered().await? {
            info!("Powering on Bluetooth adapter...");
            adapter.set_powered(true).await?;
        }

        Ok(Self {
            adapter,
            config: config.clone(),
        })
    }

    /// Look up what the adapter knows about a device.
    pub async fn describe(&self, address: Address) -> Result<PeerDescriptor> {
        let device = self.adapter.device(address)?;
        let name = device.name().await?;
        let bond_state = if device.is_paired().await? {
            BondState::Bonded
        } else {
            BondState::None
        };
        Ok(PeerDescriptor::new(name, address.to_string(), bond_state))
    }

    /// Get paired devices. Devices that vanish while being read are skipped.
    pub async fn paired_devices(&self) -> Result<Vec<PeerDescriptor>> {
        let mut described = Vec::new();
        for address in self.adapter.device_addresses().await? {
            described.push((address, self.describe(address).await));
        }
        Ok(bonded_peers(described))
    }

    /// Open an RFCOMM stream to `peer` on the configured channel. The
    /// connection reports its lifecycle on `event_tx`.
    pub async fn connect(
        &self,
        peer: &PeerDescriptor,
        event_tx: mpsc::Sender<ConnectionEvent>,
    ) -> Result<RfcommConnection> {
        let address = parse_address(&peer.address)?;
        let target = SocketAddr::new(address, self.config.rfcomm_channel);
        info!(
            "Connecting to {} ({}) on RFCOMM channel {} (SPP {})",
            peer.name, address, self.config.rfcomm_channel, SPP_UUID
        );

        let stream = Stream::connect(target)
            .await
            .with_context(|| format!("couldn't connect to {}", peer.address))?;
        info!("Connected to {}", peer.address);

        let transport = StreamTransport::new(stream);
        Ok(Connection::open(transport, peer.address.clone(), event_tx).await)
    }
}

fn bonded_peers(described: Vec<(Address, Result<PeerDescriptor>)>) -> Vec<PeerDescriptor> {
    described
        .into_iter()
        .filter_map(|(address, peer)| match peer {
            Ok(peer) => Some(peer),
            Err(e) => {
                warn!("Couldn't read device {}: {}", address, e);
                None
            }
        })
        .filter(|peer| peer.bond_state == BondState::Bonded)
        .collect()
}

/// Parse a Bluetooth address such as `98:D3:31:F5:2A:11`.
pub fn parse_address(address: &str) -> Result<Address> {
    address
        .trim()
        .parse::<Address>()
        .with_context(|| format!("invalid Bluetooth address: {}", address))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        let address = parse_address("98:D3:31:F5:2A:11").unwrap();
        assert_eq!(address.to_string(), "98:D3:31:F5:2A:11");

        assert!(parse_address("98:D3:31").is_err());
        assert!(parse_address("not an address").is_err());
    }

    #[test]
    fn test_spp_uuid() {
        assert_eq!(
            SPP_UUID.to_string(),
            "00001101-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_bonded_peers_skips_unreadable_devices() {
        let first = parse_address("98:D3:31:F5:2A:11").unwrap();
        let gone = parse_address("98:D3:31:F5:2A:12").unwrap();
        let unpaired = parse_address("98:D3:31:F5:2A:13").unwrap();

        let peers = bonded_peers(vec![
            (
                first,
                Ok(PeerDescriptor::new(
                    Some("HC-05".to_string()),
                    first.to_string(),
                    BondState::Bonded,
                )),
            ),
            (gone, Err(anyhow::anyhow!("device removed"))),
            (
                unpaired,
                Ok(PeerDescriptor::new(None, unpaired.to_string(), BondState::None)),
            ),
        ]);

        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].address, "98:D3:31:F5:2A:11");
        assert_eq!(peers[0].name, "HC-05");
    }
}
