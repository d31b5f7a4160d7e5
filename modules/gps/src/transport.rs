// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::error::Result;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};
use tracing::debug;

/// The byte channel to the receiver.
///
/// Reading and writing go through tokio's async IO traits, the baud rate can
/// be changed while the channel is open.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send + 'static {
    fn configure(&mut self, baud_rate: u32) -> Result<()>;
}

impl Transport for SerialStream {
    fn configure(&mut self, baud_rate: u32) -> Result<()> {
        debug!("Set serial baud rate to {baud_rate}");
        self.set_baud_rate(baud_rate)?;
        Ok(())
    }
}

/// Opens the serial port at `path`, e.g. `/dev/ttyS1`.
pub fn open_serial(path: &str, baud_rate: u32) -> Result<SerialStream> {
    debug!("Open serial port {path} with {baud_rate} baud");
    Ok(tokio_serial::new(path, baud_rate).open_native_async()?)
}
