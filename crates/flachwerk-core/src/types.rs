// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Flachwerk transparency flattener.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Insertion position of new artwork relative to an anchor object.
///
/// Paint order is a strict ordering: flattened output is placed either as a
/// sibling of the anchor (above or below it in the stack) or as a child of
/// the anchor when the anchor is a container (group or layer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaintOrder {
    /// Directly above the anchor, as a sibling.
    Above,
    /// Directly below the anchor, as a sibling.
    Below,
    /// As the frontmost child of the anchor container.
    InsideOnTop,
    /// As the backmost child of the anchor container.
    InsideAtBottom,
}
