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

//! Pin control for Arduino-class boards over Bluetooth serial.

pub mod bluetooth;
pub mod config;
pub mod connection;
pub mod discovery;
pub mod events;
pub mod protocol;
pub mod state;
pub mod transport;

pub use connection::{Connection, ConnectionError, ConnectionEvent, ConnectionHandle};
pub use protocol::{CommandKind, PinKind, PinMode};
pub use transport::{DeviceTransport, StreamTransport};
