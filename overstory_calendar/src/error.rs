// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use thiserror::Error;
use understory_json_item::ItemError;

/// A calendar operation was rejected.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CalendarError {
    /// No entry with this id is held.
    #[error("no entry with id {0:?}")]
    UnknownEntry(String),

    /// Incoming data does not name an entry.
    #[error("incoming data carries no entry id")]
    MissingId,

    /// The entry rejected the incoming data.
    #[error(transparent)]
    Item(#[from] ItemError),
}
