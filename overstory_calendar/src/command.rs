// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Commands shipped to the client.

use serde_json::Value as JsonValue;

/// What a [`Command`] asks the client to do.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Add entries; the payload holds create projections.
    AddEntries,
    /// Update entries; the payload holds update projections.
    UpdateEntries,
    /// Remove entries; the payload holds delete projections.
    RemoveEntries,
}

impl CommandKind {
    /// Returns the client-side function name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AddEntries => "addEvents",
            Self::UpdateEntries => "updateEvents",
            Self::RemoveEntries => "removeEvents",
        }
    }
}

/// A serialized batch of item projections.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    /// The operation.
    pub kind: CommandKind,
    /// A JSON array of projections.
    pub payload: JsonValue,
}

/// Receives commands bound for the client.
///
/// The transport is up to the implementor. `Vec<Command>` collects them,
/// which is handy in tests.
pub trait CommandSink {
    /// Sends one command.
    fn send(&mut self, command: Command);
}

impl CommandSink for Vec<Command> {
    fn send(&mut self, command: Command) {
        self.push(command);
    }
}
