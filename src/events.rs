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

//! Event processing and state updates.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::connection::ConnectionEvent;
use crate::discovery::DiscoveryEvent;
use crate::state::AppState;

/// Applies discovery and connection events to the application state.
pub struct EventProcessor {
    state: Arc<AppState>,
}

impl EventProcessor {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub fn process_discovery(&self, event: DiscoveryEvent) {
        match &event {
            DiscoveryEvent::ScanStarted => info!("Scan started"),
            DiscoveryEvent::PeerFound(peer) => {
                debug!("Peer found: {} ({})", peer.name, peer.address)
            }
            DiscoveryEvent::ScanFinished => info!("Scan finished"),
        }
        self.state.apply_discovery(event);
    }

    pub fn process_connection(&self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Connected { peer } => {
                info!("Device connected: {}", peer);
                self.state.set_connected(peer);
            }
            ConnectionEvent::Disconnected { peer } => {
                info!("Device disconnected: {}", peer);
                self.state.set_disconnected();
            }
            ConnectionEvent::Error(e) => {
                error!("Connection error: {}", e);
                self.state.set_error();
            }
        }
    }

    /// Drain discovery events until the sender side is dropped.
    pub async fn run_discovery(&self, mut event_rx: mpsc::Receiver<DiscoveryEvent>) {
        while let Some(event) = event_rx.recv().await {
            self.process_discovery(event);
        }
    }

    /// Drain connection events until the sender side is dropped.
    pub async fn run_connection(&self, mut event_rx: mpsc::Receiver<ConnectionEvent>) {
        while let Some(event) = event_rx.recv().await {
            self.process_connection(event);
        }
    }
}
