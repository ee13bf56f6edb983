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
//! Support library for ARK Ledger Nano S/X apps
//!
//! [`ArkApp`] sends commands to the ARK app over any
//! [`ledger_transport::Exchange`] implementation. Signing and key derivation
//! happen on the device; this crate only builds, chunks and decodes APDUs.
//!
//! Only one operation may run on a transport at a time. [`ArkApp`] enforces
//! this for its own methods (see [`Exclusivity`]); other users of the same
//! device must be kept away by the caller.

#![deny(warnings, trivial_casts, trivial_numeric_casts)]
#![deny(unused_import_braces, unused_qualifications)]
#![deny(missing_docs)]

use std::fmt::{self, Debug, Display};

pub use ledger_transport::Exchange;

pub mod apdu;
pub mod bip32;
mod error;
pub mod params;
mod transport;

pub use apdu::{Apdu, Param1, SegmentFlag};
pub use bip32::KeyPath;
pub use error::{ApduError, Error, PathError};
pub use transport::Exclusivity;

use params::{
    CLA, INS_GET_PUBLIC_KEY, INS_GET_VERSION, INS_SIGN_MESSAGE, INS_SIGN_TRANSACTION,
    P1_CONFIRM, P1_NON_CONFIRM, P2_ECDSA, P2_NO_CHAINCODE,
};
use transport::Exclusive;

/// ArkApp App Version
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Version {
    /// Application Mode
    pub mode: u8,
    /// Version Major
    pub major: u8,
    /// Version Minor
    pub minor: u8,
    /// Version Patch
    pub patch: u8,
}

impl Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// ARK App
///
/// Every method takes the device for its whole duration, including all frames
/// of a chunked payload. Overlapping calls are rejected or queued according to
/// the [`Exclusivity`] policy. No method retries or times out on its own.
pub struct ArkApp<E> {
    transport: Exclusive<E>,
}

impl<E> ArkApp<E>
where
    E: Exchange + Send + Sync,
    E::Error: Display + Debug,
{
    /// Create a new app, rejecting overlapping calls
    pub fn new(transport: E) -> Self {
        Self::with_exclusivity(transport, Exclusivity::default())
    }

    /// Create a new app with the given policy for overlapping calls
    pub fn with_exclusivity(transport: E, exclusivity: Exclusivity) -> Self {
        ArkApp {
            transport: Exclusive::new(transport, exclusivity),
        }
    }

    /// Policy applied to overlapping calls
    pub fn exclusivity(&self) -> Exclusivity {
        self.transport.policy()
    }

    /// Release the underlying transport
    pub fn into_inner(self) -> E {
        self.transport.into_inner()
    }

    /// Retrieve the app version as `major.minor.patch`
    pub async fn get_version(&self) -> Result<String, Error<E::Error>> {
        let transport = self.transport.acquire("get_version").await?;
        Ok(Self::read_version(&*transport).await?.to_string())
    }

    /// Retrieve the app version
    pub async fn version(&self) -> Result<Version, Error<E::Error>> {
        let transport = self.transport.acquire("version").await?;
        Self::read_version(&*transport).await
    }

    /// Retrieve the compressed public key for `path`, hex encoded
    pub async fn get_public_key(&self, path: &str) -> Result<String, Error<E::Error>> {
        let path: KeyPath = path.parse()?;
        let transport = self.transport.acquire("get_public_key").await?;

        let key = Self::read_public_key(&*transport, &path, P1_NON_CONFIRM).await?;
        Ok(hex::encode(key))
    }

    /// Retrieve the public key for `path`, optionally asking the user to confirm it
    pub async fn public_key(
        &self,
        path: &str,
        require_confirmation: bool,
    ) -> Result<k256::PublicKey, Error<E::Error>> {
        let path: KeyPath = path.parse()?;
        let p1 = if require_confirmation {
            P1_CONFIRM
        } else {
            P1_NON_CONFIRM
        };
        let transport = self.transport.acquire("public_key").await?;

        let key = Self::read_public_key(&*transport, &path, p1).await?;
        Ok(k256::PublicKey::from_sec1_bytes(&key)?)
    }

    /// Sign a message, returns the hex encoded signature
    pub async fn sign_message(
        &self,
        path: &str,
        message: &[u8],
    ) -> Result<String, Error<E::Error>> {
        self.sign("sign_message", INS_SIGN_MESSAGE, path, message).await
    }

    /// Sign a serialized transaction, returns the hex encoded signature
    pub async fn sign_transaction(
        &self,
        path: &str,
        transaction: &[u8],
    ) -> Result<String, Error<E::Error>> {
        self.sign("sign_transaction", INS_SIGN_TRANSACTION, path, transaction)
            .await
    }

    async fn sign(
        &self,
        operation: &'static str,
        ins: u8,
        path: &str,
        payload: &[u8],
    ) -> Result<String, Error<E::Error>> {
        let path: KeyPath = path.parse()?;
        let mut data = path.to_bytes();
        data.extend_from_slice(payload);

        // Built before taking the device so oversized payloads fail without I/O
        let command = Apdu::new(CLA, ins, Param1::Segmented, P2_ECDSA, data)?;

        let transport = self.transport.acquire(operation).await?;
        let response = command.send(&*transport).await?;

        Ok(hex::encode(response))
    }

    async fn read_version(transport: &E) -> Result<Version, Error<E::Error>> {
        let command = Apdu::new(
            CLA,
            INS_GET_VERSION,
            Param1::Flag(P1_NON_CONFIRM),
            P2_NO_CHAINCODE,
            Vec::new(),
        )?;

        let response = command.send(transport).await?;
        if response.len() < 4 {
            return Err(Error::InvalidVersion);
        }

        Ok(Version {
            mode: response[0],
            major: response[1],
            minor: response[2],
            patch: response[3],
        })
    }

    async fn read_public_key(
        transport: &E,
        path: &KeyPath,
        p1: u8,
    ) -> Result<Vec<u8>, Error<E::Error>> {
        let command = Apdu::new(
            CLA,
            INS_GET_PUBLIC_KEY,
            Param1::Flag(p1),
            P2_NO_CHAINCODE,
            path.to_bytes(),
        )?;

        let response = command.send(transport).await?;

        let len = match response.first() {
            Some(len) => *len as usize,
            None => return Err(Error::InvalidPK),
        };
        match response.get(1..1 + len) {
            Some(key) => Ok(key.to_vec()),
            None => Err(Error::InvalidPK),
        }
    }
}
