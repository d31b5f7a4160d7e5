// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use bytes::{Bytes, BytesMut};
use std::ops::Deref;
use tokio::io::AsyncRead;
use tokio_util::codec::{Decoder, FramedRead};

/// Every sentence starts with this byte.
pub const SENTINEL: u8 = b'$';

/// The shortest packet that can carry a sentence: the sentinel, a two letter
/// talker id and a three letter sentence type.
pub const MIN_SENTENCE_LEN: usize = 6;

/// The bytes between two sentinels, starting with the first one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet(Bytes);

impl Packet {
    /// Returns true if the packet can be handed to a sentence decoder.
    ///
    /// Bytes received before the first sentinel form a packet that does not
    /// start with the sentinel.
    pub fn is_sentence(&self) -> bool {
        self.0.len() >= MIN_SENTENCE_LEN && self.0[0] == SENTINEL
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl Deref for Packet {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for Packet {
    fn from(bytes: &[u8]) -> Self {
        Packet(Bytes::copy_from_slice(bytes))
    }
}

/// Splits a byte stream into [`Packet`]s.
///
/// The read buffer is the packet in progress. A sentinel terminates the packet in
/// progress if it is not empty and starts the next one. A packet is emitted as
/// soon as the following sentinel arrives, chunks may contain any number of
/// sentinels.
#[derive(Debug, Default)]
pub struct Packetizer {
    /// Bytes of the buffer before this index are already scanned.
    next_index: usize,
}

impl Packetizer {
    pub fn new() -> Self {
        Packetizer::default()
    }
}

impl Decoder for Packetizer {
    type Item = Packet;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, Self::Error> {
        // The byte at index 0 belongs to the packet in progress in any case.
        let start = self.next_index.max(1);
        let position = src
            .get(start..)
            .and_then(|bytes| bytes.iter().position(|b| *b == SENTINEL));
        match position {
            Some(offset) => {
                self.next_index = 0;
                Ok(Some(Packet(src.split_to(start + offset).freeze())))
            }
            None => {
                self.next_index = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, Self::Error> {
        if let Some(packet) = self.decode(src)? {
            return Ok(Some(packet));
        }
        if src.is_empty() {
            return Ok(None);
        }
        self.next_index = 0;
        Ok(Some(Packet(src.split().freeze())))
    }
}

/// Wraps a reader into the lazy stream of its packets.
pub fn packetize<R: AsyncRead>(reader: R) -> FramedRead<R, Packetizer> {
    FramedRead::new(reader, Packetizer::new())
}
