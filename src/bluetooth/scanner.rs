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

//! Device discovery on the adapter.

use anyhow::Result;
use bluer::AdapterEvent;
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::adapter::BluetoothManager;
use crate::discovery::DiscoveryEvent;

impl BluetoothManager {
    /// Run one scan, reporting progress on `event_tx`.
    ///
    /// Paired devices are reported first, then every device found during
    /// the configured scan window. `ScanFinished` is sent even if discovery
    /// fails part way.
    pub async fn scan(&self, event_tx: mpsc::Sender<DiscoveryEvent>) -> Result<()> {
        let duration = Duration::from_secs(self.config.scan_duration_secs);
        info!("Scanning for {} seconds...", duration.as_secs());

        let _ = event_tx.send(DiscoveryEvent::ScanStarted).await;
        let result = self.discover(duration, &event_tx).await;
        let _ = event_tx.send(DiscoveryEvent::ScanFinished).await;

        result
    }

    async fn discover(
        &self,
        duration: Duration,
        event_tx: &mpsc::Sender<DiscoveryEvent>,
    ) -> Result<()> {
        for peer in self.paired_devices().await? {
            let _ = event_tx.send(DiscoveryEvent::PeerFound(peer)).await;
        }

        let events = self.adapter.discover_devices().await?;
        tokio::pin!(events);
        let deadline = tokio::time::sleep(duration);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => break,
                event = events.next() => match event {
                    Some(AdapterEvent::DeviceAdded(address)) => {
                        match self.describe(address).await {
                            Ok(peer) => {
                                let _ = event_tx.send(DiscoveryEvent::PeerFound(peer)).await;
                            }
                            Err(e) => warn!("Couldn't read device {}: {}", address, e),
                        }
                    }
                    Some(other) => debug!("Adapter event: {:?}", other),
                    None => break,
                },
            }
        }

        // Dropping the event stream stops discovery.
        Ok(())
    }
}
