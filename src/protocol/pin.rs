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

//! Pin addressing of the board.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::PinError;

/// Number of digital pins (D0..D13).
pub const DIGITAL_PIN_COUNT: u8 = 14;

/// Number of analog channels (A0..A6).
pub const ANALOG_PIN_COUNT: u8 = 7;

/// Largest value of the 10-bit analog range.
pub const ANALOG_MAX_VALUE: u16 = 1023;

/// Addressing class of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinKind {
    Digital,
    Analog,
}

impl PinKind {
    /// Number of addressable pins of this kind.
    ///
    /// This is the board topology, not what the frame's pin field could
    /// address (4 bits for digital, 3 bits for analog).
    pub fn pin_count(&self) -> u8 {
        match self {
            Self::Digital => DIGITAL_PIN_COUNT,
            Self::Analog => ANALOG_PIN_COUNT,
        }
    }

    /// Highest valid pin index.
    pub fn max_index(&self) -> u8 {
        self.pin_count() - 1
    }

    pub fn is_valid_index(&self, index: u8) -> bool {
        index < self.pin_count()
    }

    /// Type bit carried at position 5 of the first frame byte.
    pub fn type_bit(&self) -> u8 {
        match self {
            Self::Digital => 1,
            Self::Analog => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Digital => "digital",
            Self::Analog => "analog",
        }
    }
}

impl fmt::Display for PinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PinKind {
    type Err = PinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "digital" | "d" => Ok(Self::Digital),
            "analog" | "a" => Ok(Self::Analog),
            _ => Err(PinError::UnknownPinKind(s.to_string())),
        }
    }
}

/// Check that `index` addresses an existing pin of `kind`.
pub fn is_valid_pin_index(kind: PinKind, index: u8) -> bool {
    kind.is_valid_index(index)
}

/// Direction a pin is configured for, applied with a change command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinMode {
    Input,
    Output,
}

impl PinMode {
    /// Value sent in the change command.
    pub fn value(&self) -> u16 {
        match self {
            Self::Input => 0,
            Self::Output => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for PinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PinMode {
    type Err = PinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "input" | "in" | "0" => Ok(Self::Input),
            "output" | "out" | "1" => Ok(Self::Output),
            _ => Err(PinError::UnknownPinMode(s.to_string())),
        }
    }
}

impl From<PinMode> for u16 {
    fn from(mode: PinMode) -> Self {
        mode.value()
    }
}
