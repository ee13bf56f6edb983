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
use std::fmt::{Debug, Display};

/// BIP32 path parsing errors
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The path string is empty
    #[error("Invalid Bip32 Path")]
    Empty,

    /// A path level is not a valid index
    #[error("Invalid Bip32 Element: {0:?}")]
    Element(String),

    /// The path has more levels than the length byte can describe
    #[error("Bip32 Path is too deep ({0} levels)")]
    Depth(usize),
}

/// APDU construction errors
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApduError {
    /// The payload does not fit in the allowed number of frames
    #[error("Payload length of {length} exceeds {limit}")]
    PayloadLength {
        /// Actual payload length
        length: usize,
        /// Exclusive upper bound
        limit: usize,
    },

    /// The payload could not be split into chunks
    #[error("Payload could not be split into chunks")]
    PayloadChunk,
}

/// Ledger ARK App Error
///
/// `E` is the error type of the underlying transport, passed through untouched.
#[derive(Debug, thiserror::Error)]
pub enum Error<E: Display + Debug> {
    /// Invalid path
    #[error("Invalid path: {0}")]
    Path(#[from] PathError),

    /// Invalid command
    #[error("Invalid APDU: {0}")]
    Apdu(#[from] ApduError),

    /// Transport failure
    #[error("Transport error: {0}")]
    Transport(E),

    /// The device answered with an error status word
    #[error("Device returned status 0x{0:04x}")]
    Status(u16),

    /// Another operation is running on this device
    #[error("Ledger device is busy ({0} rejected)")]
    Busy(&'static str),

    /// Invalid version error
    #[error("This version is not supported")]
    InvalidVersion,

    /// Public Key is invalid
    #[error("received an invalid PK")]
    InvalidPK,

    /// Public key decoding errors
    #[error("Secp256k1 error: {0}")]
    Secp256k1(#[from] k256::elliptic_curve::Error),
}
