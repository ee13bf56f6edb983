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
//! Exclusive access to a device transport
//!
//! The device handles one command sequence at a time, so the frames of two
//! operations must never interleave on the same transport.

use std::fmt::{Debug, Display};
use std::ops::Deref;

use ledger_transport::Exchange;
use log::{debug, warn};
use tokio::sync::{Mutex, MutexGuard};

use crate::error::Error;

/// What happens to an operation started while another one is running
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exclusivity {
    /// Fail immediately with [`Error::Busy`]
    Reject,
    /// Wait for the running operation to finish
    Queue,
}

impl Default for Exclusivity {
    fn default() -> Self {
        Exclusivity::Reject
    }
}

/// Transport guarded for one operation at a time
pub(crate) struct Exclusive<E> {
    transport: E,
    lock: Mutex<()>,
    policy: Exclusivity,
}

/// Exclusive use of the transport for the lifetime of one operation
pub(crate) struct Session<'a, E> {
    transport: &'a E,
    _guard: MutexGuard<'a, ()>,
}

impl<E> Exclusive<E>
where
    E: Exchange,
    E::Error: Display + Debug,
{
    pub(crate) fn new(transport: E, policy: Exclusivity) -> Self {
        Exclusive {
            transport,
            lock: Mutex::new(()),
            policy,
        }
    }

    pub(crate) fn policy(&self) -> Exclusivity {
        self.policy
    }

    pub(crate) fn into_inner(self) -> E {
        self.transport
    }

    /// Start `operation`, honouring the exclusivity policy
    pub(crate) async fn acquire(
        &self,
        operation: &'static str,
    ) -> Result<Session<'_, E>, Error<E::Error>> {
        let guard = match self.policy {
            Exclusivity::Reject => self.lock.try_lock().map_err(|_| {
                warn!("{} rejected, device busy", operation);
                Error::Busy(operation)
            })?,
            Exclusivity::Queue => self.lock.lock().await,
        };

        debug!("{}", operation);

        Ok(Session {
            transport: &self.transport,
            _guard: guard,
        })
    }
}

impl<'a, E> Deref for Session<'a, E> {
    type Target = E;

    fn deref(&self) -> &E {
        self.transport
    }
}
