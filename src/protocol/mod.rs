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

//! Pin command protocol spoken by the device firmware.
//!
//! Every command is a single byte, except analog writes which need a second
//! byte for the low eight bits of the 10-bit value.

mod command;
mod pin;

use thiserror::Error;

pub use command::{encode, CommandFrame, CommandKind, EncodedFrame};
pub use pin::{
    is_valid_pin_index, PinKind, PinMode, ANALOG_MAX_VALUE, ANALOG_PIN_COUNT, DIGITAL_PIN_COUNT,
};

/// Errors raised before a command reaches the wire.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PinError {
    /// Pin index outside the range of the pin kind.
    #[error("{kind} pin {index} does not exist (valid: 0..={max})")]
    InvalidPin { kind: PinKind, index: u8, max: u8 },

    /// Value outside the domain of the command for this pin kind.
    #[error("value {value} is not valid for {command} on a {kind} pin")]
    InvalidValue {
        command: CommandKind,
        kind: PinKind,
        value: u16,
    },

    #[error("unknown pin kind: {0}")]
    UnknownPinKind(String),

    #[error("unknown pin mode: {0}")]
    UnknownPinMode(String),
}
