// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Stand-ins for the hardware of a [`GpsDevice`](crate::GpsDevice).

use crate::{
    error::Result,
    poll_source::{FixRegisters, RegisterFix},
    transport::Transport,
};
use embedded_hal::digital::{ErrorType, OutputPin};
use std::{
    collections::VecDeque,
    convert::Infallible,
    io,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll},
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, ReadBuf};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory transport, the other end is a [`MockReceiver`].
pub struct MockTransport {
    stream: DuplexStream,
    baud_rates: Arc<Mutex<Vec<u32>>>,
}

/// The receiver side of a [`MockTransport`].
pub struct MockReceiver {
    stream: DuplexStream,
    baud_rates: Arc<Mutex<Vec<u32>>>,
}

/// Creates a connected transport and receiver.
pub fn mock_transport() -> (MockTransport, MockReceiver) {
    let (driver, receiver) = tokio::io::duplex(4096);
    let baud_rates = Arc::new(Mutex::new(Vec::new()));
    (
        MockTransport {
            stream: driver,
            baud_rates: baud_rates.clone(),
        },
        MockReceiver {
            stream: receiver,
            baud_rates,
        },
    )
}

impl AsyncRead for MockTransport {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for MockTransport {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.stream).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_shutdown(cx)
    }
}

impl Transport for MockTransport {
    fn configure(&mut self, baud_rate: u32) -> Result<()> {
        lock(&self.baud_rates).push(baud_rate);
        Ok(())
    }
}

impl MockReceiver {
    /// Sends bytes to the driver.
    pub async fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes).await
    }

    /// Reads exactly `len` bytes the driver wrote.
    pub async fn read_exact(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0; len];
        self.stream.read_exact(&mut buf).await?;
        Ok(buf)
    }

    /// All baud rates the driver configured, in order.
    pub fn baud_rates(&self) -> Vec<u32> {
        lock(&self.baud_rates).clone()
    }
}

/// Output pin that records every level it is driven to, `true` is high.
#[derive(Clone, Debug, Default)]
pub struct MockPin {
    levels: Arc<Mutex<Vec<bool>>>,
}

impl MockPin {
    pub fn levels(&self) -> Vec<bool> {
        lock(&self.levels).clone()
    }

    /// Number of times the pin was driven high.
    pub fn pulses(&self) -> usize {
        lock(&self.levels).iter().filter(|high| **high).count()
    }
}

impl ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> std::result::Result<(), Self::Error> {
        lock(&self.levels).push(false);
        Ok(())
    }

    fn set_high(&mut self) -> std::result::Result<(), Self::Error> {
        lock(&self.levels).push(true);
        Ok(())
    }
}

/// Fix registers returning queued reads, `None` once the queue is empty.
#[derive(Clone, Debug, Default)]
pub struct MockRegisters {
    reads: Arc<Mutex<VecDeque<Option<RegisterFix>>>>,
}

impl MockRegisters {
    pub fn push(&self, fix: Option<RegisterFix>) {
        lock(&self.reads).push_back(fix);
    }
}

impl FixRegisters for MockRegisters {
    fn read_fix(&mut self) -> Result<Option<RegisterFix>> {
        Ok(lock(&self.reads).pop_front().flatten())
    }
}
