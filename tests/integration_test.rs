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

//! Integration tests for the full command flow against a simulated board.

use ino_connect::connection::{ConnectionError, ConnectionEvent, ConnectionState};
use ino_connect::{Connection, ConnectionHandle, PinKind, StreamTransport};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

/// Pin state kept by the simulated firmware.
#[derive(Debug, Default, Clone, PartialEq)]
struct Board {
    digital: [u16; 14],
    analog: [u16; 7],
    digital_modes: [u8; 14],
}

/// Acknowledgement the simulated firmware sends for writes and changes.
const ACK: u8 = 0x06;

/// Decode frames the way the firmware does and answer them.
async fn run_board(mut stream: DuplexStream, mut board: Board) -> Board {
    loop {
        let first = match stream.read_u8().await {
            Ok(byte) => byte,
            Err(_) => return board,
        };

        let opcode = first >> 6;
        let digital = (first >> 5) & 1 == 1;

        let reply: Vec<u8> = match (opcode, digital) {
            (0b01, true) => {
                let pin = ((first >> 1) & 0b1111) as usize;
                vec![board.digital[pin] as u8]
            }
            (0b01, false) => {
                let pin = ((first >> 2) & 0b111) as usize;
                board.analog[pin].to_be_bytes().to_vec()
            }
            (0b10, true) => {
                let pin = ((first >> 1) & 0b1111) as usize;
                board.digital[pin] = u16::from(first & 1);
                vec![ACK]
            }
            (0b10, false) => {
                let pin = ((first >> 2) & 0b111) as usize;
                let low = match stream.read_u8().await {
                    Ok(byte) => byte,
                    Err(_) => return board,
                };
                board.analog[pin] = (u16::from(first & 0b11) << 8) | u16::from(low);
                vec![ACK]
            }
            (0b00, true) => {
                let pin = ((first >> 1) & 0b1111) as usize;
                board.digital_modes[pin] = first & 1;
                vec![ACK]
            }
            _ => vec![ACK],
        };

        if stream.write_all(&reply).await.is_err() {
            return board;
        }
    }
}

fn connect(board: Board) -> (Connection<StreamTransport<DuplexStream>>, JoinHandle<Board>) {
    let (client, device) = tokio::io::duplex(64);
    let firmware = tokio::spawn(run_board(device, board));
    (Connection::new(StreamTransport::new(client), "sim"), firmware)
}

#[tokio::test]
async fn test_read_pins() {
    let mut board = Board::default();
    board.digital[7] = 1;
    board.analog[3] = 564;
    board.analog[6] = 1023;
    let (mut conn, firmware) = connect(board);

    assert_eq!(conn.read_pin(PinKind::Digital, 7).await.unwrap(), 1);
    assert_eq!(conn.read_pin(PinKind::Digital, 8).await.unwrap(), 0);
    assert_eq!(conn.read_pin(PinKind::Analog, 3).await.unwrap(), 564);
    assert_eq!(conn.read_pin(PinKind::Analog, 6).await.unwrap(), 1023);

    conn.close().await;
    firmware.await.unwrap();
}

#[tokio::test]
async fn test_writes_reach_the_board() {
    let (mut conn, firmware) = connect(Board::default());

    assert_eq!(conn.write_pin(PinKind::Digital, 13, 1).await.unwrap(), ACK);
    assert_eq!(conn.write_pin(PinKind::Analog, 2, 777).await.unwrap(), ACK);
    assert_eq!(conn.change_pin(PinKind::Digital, 4, 1).await.unwrap(), ACK);

    // Read back through the same session.
    assert_eq!(conn.read_pin(PinKind::Digital, 13).await.unwrap(), 1);
    assert_eq!(conn.read_pin(PinKind::Analog, 2).await.unwrap(), 777);

    conn.close().await;
    let board = firmware.await.unwrap();
    assert_eq!(board.digital[13], 1);
    assert_eq!(board.analog[2], 777);
    assert_eq!(board.digital_modes[4], 1);
}

#[tokio::test]
async fn test_invalid_commands_never_reach_the_board() {
    let (mut conn, firmware) = connect(Board::default());

    assert!(matches!(
        conn.write_pin(PinKind::Digital, 14, 1).await,
        Err(ConnectionError::Invalid(_))
    ));
    assert!(matches!(
        conn.write_pin(PinKind::Analog, 0, 1024).await,
        Err(ConnectionError::Invalid(_))
    ));
    assert!(matches!(
        conn.change_pin(PinKind::Analog, 1, 2).await,
        Err(ConnectionError::Invalid(_))
    ));
    assert!(conn.is_open());

    conn.close().await;
    assert_eq!(firmware.await.unwrap(), Board::default());
}

#[tokio::test]
async fn test_device_hangup_is_reported_once() {
    let (client, device) = tokio::io::duplex(64);
    drop(device);

    let (tx, mut rx) = mpsc::channel(8);
    let mut conn = Connection::open(StreamTransport::new(client), "sim", tx).await;

    assert!(matches!(
        conn.read_pin(PinKind::Analog, 0).await,
        Err(ConnectionError::Transport(_))
    ));
    assert_eq!(conn.state(), ConnectionState::Closed);
    assert!(matches!(
        conn.read_pin(PinKind::Analog, 0).await,
        Err(ConnectionError::Closed)
    ));

    drop(conn);
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], ConnectionEvent::Connected { .. }));
    assert!(matches!(events[1], ConnectionEvent::Error(_)));
    assert_eq!(
        events[2],
        ConnectionEvent::Disconnected {
            peer: "sim".to_string()
        }
    );
}

#[tokio::test]
async fn test_shared_handle_from_many_tasks() {
    let mut board = Board::default();
    for pin in 0..14 {
        board.digital[pin] = (pin % 2) as u16;
    }
    let (conn, firmware) = connect(board);
    let handle = ConnectionHandle::new(conn);

    let tasks: Vec<_> = (0..14u8)
        .map(|pin| {
            let handle = handle.clone();
            tokio::spawn(async move { (pin, handle.read_pin(PinKind::Digital, pin).await) })
        })
        .collect();

    for task in tasks {
        let (pin, value) = task.await.unwrap();
        assert_eq!(value.unwrap(), u16::from(pin % 2));
    }

    handle.close().await;
    firmware.await.unwrap();
}

#[tokio::test]
async fn test_close_interrupts_read_from_silent_device() {
    let (client, mut device) = tokio::io::duplex(64);
    let handle = ConnectionHandle::new(Connection::new(StreamTransport::new(client), "sim"));

    let reader = handle.clone();
    let pending = tokio::spawn(async move { reader.read_pin(PinKind::Digital, 3).await });

    // The frame arrives but the device never answers.
    assert_eq!(device.read_u8().await.unwrap(), 0b0110_0110);

    timeout(Duration::from_secs(2), handle.close())
        .await
        .expect("close waited for the pending read");

    let result = timeout(Duration::from_secs(2), pending)
        .await
        .expect("pending read never finished")
        .unwrap();
    assert!(matches!(result, Err(ConnectionError::Closed)));
    assert!(!handle.is_open().await);

    // The transport was shut down.
    let mut rest = Vec::new();
    assert_eq!(device.read_to_end(&mut rest).await.unwrap(), 0);
}
