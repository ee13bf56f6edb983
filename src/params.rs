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
//! APDU header values understood by the ARK app
//!
//! App / PublicKey context:
//! - P1 selects user approval (`P1_NON_CONFIRM`, `P1_CONFIRM`)
//! - P2 selects chaincode output (`P2_NO_CHAINCODE`, `P2_CHAINCODE`)
//!
//! Signing context:
//! - P1 carries the payload segment (`P1_SINGLE`, `P1_FIRST`, `P1_MORE`, `P1_LAST`)
//! - P2 selects the signature scheme (`P2_ECDSA`)

/// APDU Class byte
pub const CLA: u8 = 0xe0;

/// Get a public key from the device
pub const INS_GET_PUBLIC_KEY: u8 = 0x02;
/// Sign a transaction
pub const INS_SIGN_TRANSACTION: u8 = 0x04;
/// Get the ARK app version
pub const INS_GET_VERSION: u8 = 0x06;
/// Sign a message
pub const INS_SIGN_MESSAGE: u8 = 0x08;

/// Do not request user approval
pub const P1_NON_CONFIRM: u8 = 0x00;
/// Request user approval
pub const P1_CONFIRM: u8 = 0x01;

/// Payload sent as one frame (N == 1)
pub const P1_SINGLE: u8 = 0x80;
/// First segment of a chunked payload
pub const P1_FIRST: u8 = 0x00;
/// Segments 2..N-1 of a chunked payload (N > 2)
pub const P1_MORE: u8 = 0x01;
/// Last segment of a chunked payload (N > 1)
pub const P1_LAST: u8 = 0x81;

/// Don't return a chaincode
pub const P2_NO_CHAINCODE: u8 = 0x00;
/// Return a chaincode
pub const P2_CHAINCODE: u8 = 0x01;

/// Use ECDSA signatures
pub const P2_ECDSA: u8 = 0x40;

/// Largest payload carried by one frame
pub const CHUNK_SIZE: usize = 255;

/// Maximum number of frames for one command
pub const CHUNK_MAX: usize = 10;

/// Payload lengths must stay strictly below this value
pub const PAYLOAD_MAX: usize = CHUNK_MAX * CHUNK_SIZE;

/// BIP32 hardened derivation flag
pub const BIP32_HARDENED: u32 = 0x8000_0000;

/// Status word for a successful command
pub const SW_OK: u16 = 0x9000;
