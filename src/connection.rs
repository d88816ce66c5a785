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

//! Command session over a single device transport.

use std::io;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info, warn};

use crate::protocol::{CommandFrame, PinError, PinKind};
use crate::transport::DeviceTransport;

/// Errors returned by pin operations.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The command was rejected before any I/O.
    #[error(transparent)]
    Invalid(#[from] PinError),

    /// The connection was already closed.
    #[error("connection is closed")]
    Closed,

    /// Reading or writing the transport failed. The connection is closed.
    #[error("transport failure: {0}")]
    Transport(#[from] io::Error),
}

/// Events emitted by a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Connection opened with events attached.
    Connected { peer: String },
    /// Connection closed.
    Disconnected { peer: String },
    /// Transport failure.
    Error(String),
}

/// State of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closed,
}

/// Session owning one transport. Runs one command exchange at a time.
pub struct Connection<T: DeviceTransport> {
    transport: T,
    state: ConnectionState,
    peer: String,
    event_tx: Option<mpsc::Sender<ConnectionEvent>>,
    /// Set to true once a close was requested. Aborts a pending exchange.
    shutdown: Arc<watch::Sender<bool>>,
}

impl<T: DeviceTransport> Connection<T> {
    /// Create an open connection over an established transport.
    pub fn new(transport: T, peer: impl Into<String>) -> Self {
        Self {
            transport,
            state: ConnectionState::Open,
            peer: peer.into(),
            event_tx: None,
            shutdown: Arc::new(watch::channel(false).0),
        }
    }

    /// Create an open connection reporting lifecycle changes on `event_tx`,
    /// starting with `Connected`.
    pub async fn open(
        transport: T,
        peer: impl Into<String>,
        event_tx: mpsc::Sender<ConnectionEvent>,
    ) -> Self {
        let mut connection = Self::new(transport, peer);
        connection.event_tx = Some(event_tx);
        connection
            .emit(ConnectionEvent::Connected {
                peer: connection.peer.clone(),
            })
            .await;
        connection
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Read a pin. Digital pins yield 0 or 1, analog pins 0..=1023.
    pub async fn read_pin(&mut self, pin_kind: PinKind, pin: u8) -> Result<u16, ConnectionError> {
        self.ensure_open()?;
        let frame = CommandFrame::read(pin_kind, pin)?;
        self.execute(frame).await
    }

    /// Write a pin value and return the device acknowledgement.
    pub async fn write_pin(
        &mut self,
        pin_kind: PinKind,
        pin: u8,
        value: u16,
    ) -> Result<u8, ConnectionError> {
        self.ensure_open()?;
        let frame = CommandFrame::write(pin_kind, pin, value)?;
        self.execute(frame).await.map(|ack| ack as u8)
    }

    /// Change a pin configuration and return the device acknowledgement.
    pub async fn change_pin(
        &mut self,
        pin_kind: PinKind,
        pin: u8,
        value: u16,
    ) -> Result<u8, ConnectionError> {
        self.ensure_open()?;
        let frame = CommandFrame::change(pin_kind, pin, value)?;
        self.execute(frame).await.map(|ack| ack as u8)
    }

    /// Close the connection. Only the first call releases the transport.
    pub async fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }

        self.state = ConnectionState::Closed;
        self.shutdown.send_replace(true);
        self.transport.close().await;
        info!("Connection to {} closed", self.peer);

        self.emit(ConnectionEvent::Disconnected {
            peer: self.peer.clone(),
        })
        .await;
    }

    fn ensure_open(&self) -> Result<(), ConnectionError> {
        if self.state == ConnectionState::Closed || *self.shutdown.borrow() {
            return Err(ConnectionError::Closed);
        }
        Ok(())
    }

    async fn execute(&mut self, frame: CommandFrame) -> Result<u16, ConnectionError> {
        debug!(
            "{} {} pin {} value {}",
            frame.kind(),
            frame.pin_kind(),
            frame.pin(),
            frame.value()
        );

        let shutdown = self.shutdown.subscribe();
        let result = tokio::select! {
            result = self.exchange(&frame) => result,
            () = wait_for_shutdown(shutdown) => {
                info!("Exchange with {} aborted by close", self.peer);
                self.close().await;
                return Err(ConnectionError::Closed);
            }
        };

        match result {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!("Exchange with {} failed: {}", self.peer, e);
                self.emit(ConnectionEvent::Error(e.to_string())).await;
                self.close().await;
                Err(ConnectionError::Transport(e))
            }
        }
    }

    async fn exchange(&mut self, frame: &CommandFrame) -> io::Result<u16> {
        let encoded = frame.encode();
        debug!("Sending frame: {:02X?}", encoded.as_bytes());

        match encoded.as_bytes() {
            [byte] => self.transport.write_byte(*byte).await?,
            bytes => self.transport.write(bytes).await?,
        }
        self.transport.flush().await?;

        let mut buf = [0u8; 2];
        let response = &mut buf[..frame.response_len()];
        self.read_full(response).await?;
        debug!("Received response: {:02X?}", response);

        frame.decode_response(response).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "unexpected response length")
        })
    }

    async fn read_full(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.transport.read(&mut buf[filled..]).await? {
                0 => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "device closed the stream",
                    ))
                }
                n => filled += n,
            }
        }
        Ok(())
    }

    async fn emit(&mut self, event: ConnectionEvent) {
        if let Some(tx) = self.event_tx.clone() {
            let _ = tx.send(event).await;
        }
    }
}

async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    // The sender lives as long as the connection, so this only returns on close.
    let _ = shutdown.wait_for(|closed| *closed).await;
}

/// Cloneable handle serializing commands from several tasks onto one
/// connection.
pub struct ConnectionHandle<T: DeviceTransport> {
    inner: Arc<Mutex<Connection<T>>>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl<T: DeviceTransport> Clone for ConnectionHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

impl<T: DeviceTransport> ConnectionHandle<T> {
    pub fn new(connection: Connection<T>) -> Self {
        Self {
            shutdown: Arc::clone(&connection.shutdown),
            inner: Arc::new(Mutex::new(connection)),
        }
    }

    pub async fn is_open(&self) -> bool {
        self.inner.lock().await.is_open()
    }

    pub async fn read_pin(&self, pin_kind: PinKind, pin: u8) -> Result<u16, ConnectionError> {
        self.inner.lock().await.read_pin(pin_kind, pin).await
    }

    pub async fn write_pin(
        &self,
        pin_kind: PinKind,
        pin: u8,
        value: u16,
    ) -> Result<u8, ConnectionError> {
        self.inner.lock().await.write_pin(pin_kind, pin, value).await
    }

    pub async fn change_pin(
        &self,
        pin_kind: PinKind,
        pin: u8,
        value: u16,
    ) -> Result<u8, ConnectionError> {
        self.inner.lock().await.change_pin(pin_kind, pin, value).await
    }

    /// Close the connection. An exchange in progress, such as a read waiting
    /// on a silent device, fails with `Closed` instead of finishing first.
    pub async fn close(&self) {
        self.shutdown.send_replace(true);
        self.inner.lock().await.close().await;
    }
}
