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

//! Command frames and their bit layout.
//!
//! First byte, MSB first:
//!
//! ```text
//! digital: M M 1 P P P P V
//! analog:  M M 0 P P P V V
//! ```
//!
//! `MM` is the opcode. Analog writes carry the top two value bits in `VV`
//! and the low eight bits in a second byte.

use std::fmt;

use super::pin::{PinKind, ANALOG_MAX_VALUE};
use super::PinError;

/// Operation selected by the 2-bit opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Change pin configuration (pin mode).
    Change,
    Read,
    Write,
}

impl CommandKind {
    pub fn opcode(&self) -> u8 {
        match self {
            Self::Change => 0b00,
            Self::Read => 0b01,
            Self::Write => 0b10,
        }
    }

    /// Whether `value` is in the domain of this command for `pin_kind`.
    pub fn is_valid_value(&self, pin_kind: PinKind, value: u16) -> bool {
        match (self, pin_kind) {
            (Self::Read, _) => value == 0,
            (Self::Change, _) => value <= 1,
            (Self::Write, PinKind::Digital) => value <= 1,
            (Self::Write, PinKind::Analog) => value <= ANALOG_MAX_VALUE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Change => "change",
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bytes of one encoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedFrame {
    bytes: [u8; 2],
    len: usize,
}

impl EncodedFrame {
    fn single(byte: u8) -> Self {
        Self {
            bytes: [byte, 0],
            len: 1,
        }
    }

    fn pair(first: u8, second: u8) -> Self {
        Self {
            bytes: [first, second],
            len: 2,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl AsRef<[u8]> for EncodedFrame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// A validated command. Constructing one is the only way to get bytes to
/// send, so invalid pins and values never reach the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    kind: CommandKind,
    pin_kind: PinKind,
    pin: u8,
    value: u16,
}

impl CommandFrame {
    /// Validate and build a frame.
    pub fn new(kind: CommandKind, pin_kind: PinKind, pin: u8, value: u16) -> Result<Self, PinError> {
        if !pin_kind.is_valid_index(pin) {
            return Err(PinError::InvalidPin {
                kind: pin_kind,
                index: pin,
                max: pin_kind.max_index(),
            });
        }

        if !kind.is_valid_value(pin_kind, value) {
            return Err(PinError::InvalidValue {
                command: kind,
                kind: pin_kind,
                value,
            });
        }

        Ok(Self {
            kind,
            pin_kind,
            pin,
            value,
        })
    }

    pub fn read(pin_kind: PinKind, pin: u8) -> Result<Self, PinError> {
        Self::new(CommandKind::Read, pin_kind, pin, 0)
    }

    pub fn write(pin_kind: PinKind, pin: u8, value: u16) -> Result<Self, PinError> {
        Self::new(CommandKind::Write, pin_kind, pin, value)
    }

    pub fn change(pin_kind: PinKind, pin: u8, value: u16) -> Result<Self, PinError> {
        Self::new(CommandKind::Change, pin_kind, pin, value)
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn pin_kind(&self) -> PinKind {
        self.pin_kind
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    /// Encode into wire bytes.
    pub fn encode(&self) -> EncodedFrame {
        let header = (self.kind.opcode() << 6) | (self.pin_kind.type_bit() << 5);

        match (self.kind, self.pin_kind) {
            (_, PinKind::Digital) => {
                EncodedFrame::single(header | (self.pin << 1) | (self.value as u8 & 0b1))
            }
            (CommandKind::Write, PinKind::Analog) => {
                let high = ((self.value >> 8) & 0b11) as u8;
                let low = (self.value & 0xFF) as u8;
                EncodedFrame::pair(header | (self.pin << 2) | high, low)
            }
            (_, PinKind::Analog) => {
                EncodedFrame::single(header | (self.pin << 2) | (self.value as u8 & 0b1))
            }
        }
    }

    /// Number of bytes the device answers with.
    pub fn response_len(&self) -> usize {
        match (self.kind, self.pin_kind) {
            (CommandKind::Read, PinKind::Analog) => 2,
            _ => 1,
        }
    }

    /// Combine response bytes into the result of the command.
    ///
    /// Analog readings arrive high byte first. Acknowledgements are returned
    /// as-is. Returns `None` if `response` is not exactly
    /// [`response_len`](Self::response_len) bytes.
    pub fn decode_response(&self, response: &[u8]) -> Option<u16> {
        match (self.response_len(), response) {
            (1, [byte]) => Some(u16::from(*byte)),
            (2, [high, low]) => Some(u16::from_be_bytes([*high, *low])),
            _ => None,
        }
    }
}

/// Validate and encode a command in one step.
pub fn encode(
    kind: CommandKind,
    pin_kind: PinKind,
    pin: u8,
    value: u16,
) -> Result<EncodedFrame, PinError> {
    Ok(CommandFrame::new(kind, pin_kind, pin, value)?.encode())
}
