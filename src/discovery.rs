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

//! Bookkeeping of discovered peers.

use serde::{Deserialize, Serialize};

/// Name shown for peers that do not report one.
pub const UNKNOWN_PEER_NAME: &str = "<unknown>";

/// Pairing state of a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BondState {
    Bonded,
    Bonding,
    None,
}

impl BondState {
    /// Label shown next to a peer. Unpaired peers get no label.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Bonded => "Bonded",
            Self::Bonding => "Bonding",
            Self::None => "",
        }
    }
}

/// A peer reported by the discovery source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerDescriptor {
    pub name: String,
    pub address: String,
    pub bond_state: BondState,
}

impl PeerDescriptor {
    pub fn new(name: Option<String>, address: impl Into<String>, bond_state: BondState) -> Self {
        Self {
            name: name.unwrap_or_else(|| UNKNOWN_PEER_NAME.to_string()),
            address: address.into(),
            bond_state,
        }
    }

    /// Peers are identified by address. Case is not significant.
    pub fn same_peer(&self, address: &str) -> bool {
        self.address.eq_ignore_ascii_case(address)
    }
}

/// Events emitted by the discovery source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    ScanStarted,
    PeerFound(PeerDescriptor),
    ScanFinished,
}

/// Discovered peers in discovery order, plus whether a scan is running.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryLedger {
    peers: Vec<PeerDescriptor>,
    scanning: bool,
}

impl DiscoveryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peers(&self) -> &[PeerDescriptor] {
        &self.peers
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    pub fn find(&self, address: &str) -> Option<&PeerDescriptor> {
        self.peers.iter().find(|peer| peer.same_peer(address))
    }

    pub fn on_scan_started(&mut self) {
        self.peers.clear();
        self.scanning = true;
    }

    /// Record a peer unless its address is already known.
    ///
    /// Peers arriving after the scan finished are still recorded.
    /// Returns whether the peer was added.
    pub fn on_peer_found(&mut self, peer: PeerDescriptor) -> bool {
        if self.find(&peer.address).is_some() {
            return false;
        }
        self.peers.push(peer);
        true
    }

    pub fn on_scan_finished(&mut self) {
        self.scanning = false;
    }

    /// Apply an event in place.
    pub fn apply(&mut self, event: DiscoveryEvent) {
        match event {
            DiscoveryEvent::ScanStarted => self.on_scan_started(),
            DiscoveryEvent::PeerFound(peer) => {
                self.on_peer_found(peer);
            }
            DiscoveryEvent::ScanFinished => self.on_scan_finished(),
        }
    }

    /// Reduce an event into a new ledger.
    pub fn reduce(mut self, event: DiscoveryEvent) -> Self {
        self.apply(event);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(name: &str, address: &str) -> PeerDescriptor {
        PeerDescriptor::new(Some(name.to_string()), address, BondState::None)
    }

    #[test]
    fn test_scan_deduplicates_by_address() {
        let a = peer("HC-05", "98:D3:31:F5:2A:11");
        let b = peer("HC-06", "98:D3:31:F5:2A:22");

        let ledger = [
            DiscoveryEvent::ScanStarted,
            DiscoveryEvent::PeerFound(a.clone()),
            DiscoveryEvent::PeerFound(a.clone()),
            DiscoveryEvent::PeerFound(b.clone()),
            DiscoveryEvent::ScanFinished,
        ]
        .into_iter()
        .fold(DiscoveryLedger::new(), DiscoveryLedger::reduce);

        assert_eq!(ledger.peers(), &[a, b]);
        assert!(!ledger.is_scanning());
    }

    #[test]
    fn test_scan_start_resets() {
        let mut ledger = DiscoveryLedger::new();
        ledger.on_scan_started();
        assert!(ledger.on_peer_found(peer("uno", "00:11:22:33:44:55")));
        ledger.on_scan_finished();

        ledger.on_scan_started();
        assert!(ledger.is_scanning());
        assert!(ledger.peers().is_empty());
    }

    #[test]
    fn test_peer_after_scan_finished_is_recorded() {
        let mut ledger = DiscoveryLedger::new();
        ledger.apply(DiscoveryEvent::ScanStarted);
        ledger.apply(DiscoveryEvent::ScanFinished);
        ledger.apply(DiscoveryEvent::PeerFound(peer("late", "AA:BB:CC:DD:EE:FF")));

        assert_eq!(ledger.peers().len(), 1);
        assert!(!ledger.is_scanning());
    }

    #[test]
    fn test_address_match_ignores_case() {
        let mut ledger = DiscoveryLedger::new();
        assert!(ledger.on_peer_found(peer("nano", "aa:bb:cc:dd:ee:ff")));
        assert!(!ledger.on_peer_found(peer("nano", "AA:BB:CC:DD:EE:FF")));
        assert_eq!(ledger.find("AA:bb:CC:dd:EE:ff").map(|p| p.name.as_str()), Some("nano"));
    }

    #[test]
    fn test_unknown_name_and_bond_labels() {
        let unnamed = PeerDescriptor::new(None, "00:00:00:00:00:01", BondState::Bonded);
        assert_eq!(unnamed.name, UNKNOWN_PEER_NAME);
        assert_eq!(BondState::Bonded.display_name(), "Bonded");
        assert_eq!(BondState::None.display_name(), "");
    }
}
