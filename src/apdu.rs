/*******************************************************************************
*   (c) 2020 ZondaX GmbH
*
*  Licensed under the Apache License, Version 2.0 (the "License");
*  you may not use this file except in compliance with the License.
*  You may obtain a copy of the License at
*
*      http://www.apache.org/licenses/LICENSE-2.0
*
*  Unless required by applicable law or agreed to in writing, software
*  distributed under the License is distributed on an "AS IS" BASIS,
*  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
*  See the License for the specific language governing permissions and
*  limitations under the License.
********************************************************************************/
//! APDU construction, chunking and response reassembly
//!
//! APDU Header: `CLA + INS + P1 + P2`, followed by up to [`CHUNK_SIZE`] payload
//! bytes per frame. Larger payloads are split over several frames and P1
//! carries the segment position of each one.

use std::fmt::{Debug, Display};

use ledger_transport::{APDUCommand, Exchange};
use log::{debug, trace, warn};

use crate::error::{ApduError, Error};
use crate::params::{
    CHUNK_SIZE, P1_FIRST, P1_LAST, P1_MORE, P1_SINGLE, PAYLOAD_MAX, SW_OK,
};

/// Meaning of the P1 header byte for a command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Param1 {
    /// Fixed value, e.g. a confirmation flag
    Flag(u8),
    /// P1 carries the payload segment position
    Segmented,
}

/// Position of a frame within a payload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SegmentFlag {
    /// N == 1
    Single = P1_SINGLE,
    /// First frame where N > 1
    First = P1_FIRST,
    /// Frames 2..N-1 where N > 2
    More = P1_MORE,
    /// Nth frame where N > 1
    Last = P1_LAST,
}

impl SegmentFlag {
    /// Flag for the chunk at `index` out of `count` chunks
    ///
    /// A payload split into exactly one chunk is flagged [`SegmentFlag::First`].
    pub fn for_chunk(index: usize, count: usize) -> Self {
        if index > 0 && index + 1 < count {
            SegmentFlag::More
        } else if index + 1 == count && count > 1 {
            SegmentFlag::Last
        } else {
            SegmentFlag::First
        }
    }
}

/// A single device command
#[derive(Clone, Debug)]
pub struct Apdu {
    cla: u8,
    ins: u8,
    p1: Param1,
    p2: u8,
    payload: Vec<u8>,
}

impl Apdu {
    /// Create a command, rejecting payloads of [`PAYLOAD_MAX`] bytes or more
    pub fn new(
        cla: u8,
        ins: u8,
        p1: Param1,
        p2: u8,
        payload: Vec<u8>,
    ) -> Result<Self, ApduError> {
        if payload.len() >= PAYLOAD_MAX {
            return Err(ApduError::PayloadLength {
                length: payload.len(),
                limit: PAYLOAD_MAX,
            });
        }

        Ok(Apdu {
            cla,
            ins,
            p1,
            p2,
            payload,
        })
    }

    /// Command payload
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Frames to put on the wire, in order
    pub fn frames(&self) -> Result<Vec<APDUCommand<&[u8]>>, ApduError> {
        if self.payload.len() < CHUNK_SIZE {
            let p1 = match self.p1 {
                Param1::Flag(p1) => p1,
                Param1::Segmented => SegmentFlag::Single as u8,
            };
            return Ok(vec![self.frame(p1, &self.payload)]);
        }

        self.chunked(&self.payload)
    }

    fn chunked<'a>(
        &'a self,
        payload: &'a [u8],
    ) -> Result<Vec<APDUCommand<&'a [u8]>>, ApduError> {
        let chunks: Vec<&[u8]> = payload.chunks(CHUNK_SIZE).collect();
        if chunks.is_empty() {
            return Err(ApduError::PayloadChunk);
        }

        if let Param1::Flag(p1) = self.p1 {
            warn!(
                "ins 0x{:02x}: p1 0x{:02x} replaced by segment flags for a {} byte payload",
                self.ins,
                p1,
                payload.len()
            );
        }

        let count = chunks.len();
        Ok(chunks
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| {
                self.frame(SegmentFlag::for_chunk(index, count) as u8, chunk)
            })
            .collect())
    }

    fn frame<'a>(&self, p1: u8, data: &'a [u8]) -> APDUCommand<&'a [u8]> {
        APDUCommand {
            cla: self.cla,
            ins: self.ins,
            p1,
            p2: self.p2,
            data,
        }
    }

    /// Send the command and return the response body
    ///
    /// Frames are exchanged one at a time, each response is awaited before the
    /// next frame is sent. The status word of every response is checked and
    /// stripped, and the bodies are concatenated in order.
    ///
    /// The caller must hold exclusive use of `transport` for the whole call.
    pub async fn send<E>(&self, transport: &E) -> Result<Vec<u8>, Error<E::Error>>
    where
        E: Exchange + Send + Sync,
        E::Error: Display + Debug,
    {
        let frames = self.frames()?;
        let mut response = Vec::new();

        for (index, frame) in frames.iter().enumerate() {
            debug!(
                "-> [{}/{}] cla=0x{:02x} ins=0x{:02x} p1=0x{:02x} p2=0x{:02x} len={}",
                index + 1,
                frames.len(),
                frame.cla,
                frame.ins,
                frame.p1,
                frame.p2,
                frame.data.len()
            );

            let answer = transport.exchange(frame).await.map_err(Error::Transport)?;

            if answer.retcode() != SW_OK {
                debug!("<- status 0x{:04x}", answer.retcode());
                return Err(Error::Status(answer.retcode()));
            }

            trace!("<- {}", hex::encode(answer.data()));
            response.extend_from_slice(answer.data());
        }

        Ok(response)
    }
}
