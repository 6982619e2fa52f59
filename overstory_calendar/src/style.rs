// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Color keys shared by every calendar item that can be painted.

use understory_json_item::{Key, KeySet};

/// Base color, used for background and border unless those are set.
pub static COLOR: Key<String> = Key::new("color");
/// Background color.
pub static BACKGROUND_COLOR: Key<String> = Key::new("backgroundColor");
/// Border color.
pub static BORDER_COLOR: Key<String> = Key::new("borderColor");
/// Text color.
pub static TEXT_COLOR: Key<String> = Key::new("textColor");

/// The style keys, included into the registries of styled item types.
pub static STYLE_KEYS: KeySet = &[&COLOR, &BACKGROUND_COLOR, &BORDER_COLOR, &TEXT_COLOR];
