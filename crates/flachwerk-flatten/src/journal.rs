// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transaction journal for flattening attempts.
//
// Every document mutation a backend makes during an attempt goes through
// `Txn`, which performs the edit and records its inverse.  On failure or
// cancellation the journal replays the inverses in reverse, restoring the
// pre-call tree under the original handles.  On success the journal is
// committed (discarded).

use tracing::{debug, warn};

use flachwerk_core::error::Result;
use flachwerk_core::types::PaintOrder;
use flachwerk_document::art::ArtObject;
use flachwerk_document::document::{ArtId, DetachedArt, Document, LayerId};

/// One reversible document edit.
#[derive(Debug)]
pub enum ChangeOp {
    /// An art object was inserted into the arena (unattached).
    ArtCreated { id: ArtId },
    /// An unattached art object was attached to a container.
    ArtAttached { id: ArtId },
    /// The value of a live art object was swapped.
    ArtReplaced { id: ArtId, previous: Box<ArtObject> },
    /// An attached subtree was removed.
    ArtRemoved { detached: DetachedArt },
}

/// Journal of reversible edits made during one flattening attempt.
#[derive(Debug, Default)]
pub struct ChangeJournal {
    ops: Vec<ChangeOp>,
}

impl ChangeJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    fn record(&mut self, op: ChangeOp) {
        self.ops.push(op);
    }

    /// Keep all changes: the attempt succeeded.
    pub fn commit(self) {
        debug!(ops = self.ops.len(), "flattening changes committed");
    }

    /// Undo all changes in reverse order.
    ///
    /// Rollback must not abandon the document halfway, so an individual undo
    /// failure is logged and skipped rather than propagated; the ops are
    /// recorded by `Txn` in an order that makes each undo valid by the time
    /// it runs.
    pub fn rollback(self, doc: &mut Document) {
        let count = self.ops.len();
        for op in self.ops.into_iter().rev() {
            let outcome = match op {
                ChangeOp::ArtCreated { id } => doc.discard_art(id).map(|_| ()),
                ChangeOp::ArtAttached { id } => doc.detach_art(id).map(|_| ()),
                ChangeOp::ArtReplaced { id, previous } => {
                    doc.replace_art(id, *previous).map(|_| ())
                }
                ChangeOp::ArtRemoved { detached } => doc.restore_subtree(detached),
            };
            if let Err(err) = outcome {
                warn!(%err, "rollback step failed; continuing");
            }
        }
        debug!(ops = count, "flattening changes rolled back");
    }
}

/// Journaled view of a document.  Backends mutate exclusively through this,
/// so every edit is guaranteed to be reversible.
pub struct Txn<'a> {
    doc: &'a mut Document,
    journal: &'a mut ChangeJournal,
}

impl<'a> Txn<'a> {
    pub fn new(doc: &'a mut Document, journal: &'a mut ChangeJournal) -> Self {
        Self { doc, journal }
    }

    /// Read-only view of the document.
    pub fn doc(&self) -> &Document {
        self.doc
    }

    /// Insert an art object into the arena, unattached.
    pub fn create_art(&mut self, art: ArtObject) -> ArtId {
        let id = self.doc.create_art(art);
        self.journal.record(ChangeOp::ArtCreated { id });
        id
    }

    /// Attach an unattached art object at the top of a layer.
    pub fn attach_to_layer_top(&mut self, layer: LayerId, id: ArtId) -> Result<()> {
        self.doc.attach_to_layer_top(layer, id)?;
        self.journal.record(ChangeOp::ArtAttached { id });
        Ok(())
    }

    /// Attach an unattached art object relative to an anchor.
    pub fn attach_relative(&mut self, id: ArtId, order: PaintOrder, anchor: ArtId) -> Result<()> {
        self.doc.attach_relative(id, order, anchor)?;
        self.journal.record(ChangeOp::ArtAttached { id });
        Ok(())
    }

    /// Swap the value of a live art object.
    pub fn replace_art(&mut self, id: ArtId, art: ArtObject) -> Result<()> {
        let previous = self.doc.replace_art(id, art)?;
        self.journal.record(ChangeOp::ArtReplaced {
            id,
            previous: Box::new(previous),
        });
        Ok(())
    }

    /// Remove an attached subtree.
    pub fn remove_subtree(&mut self, id: ArtId) -> Result<()> {
        let detached = self.doc.remove_subtree(id)?;
        self.journal.record(ChangeOp::ArtRemoved { detached });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flachwerk_document::art::{ArtKind, Color};

    fn path(opacity: f64) -> ArtObject {
        ArtObject::opaque(ArtKind::Path {
            fill: Some(Color::Process {
                c: 0.0,
                m: 1.0,
                y: 1.0,
                k: 0.0,
            }),
            stroke: None,
            stroke_width: 0.0,
            simplified: false,
        })
        .with_opacity(opacity)
    }

    #[test]
    fn rollback_restores_create_attach_replace_and_remove() {
        let mut doc = Document::new();
        let layer = doc.top_layer().expect("layer");
        let original = doc.create_art(path(0.5));
        doc.attach_to_layer_top(layer, original).expect("attach");
        let before = doc.content_digest().expect("digest");

        let mut journal = ChangeJournal::new();
        {
            let mut txn = Txn::new(&mut doc, &mut journal);
            // Replace the original's value, remove it, and add a new object.
            txn.replace_art(original, path(1.0)).expect("replace");
            txn.remove_subtree(original).expect("remove");
            let fresh = txn.create_art(path(1.0));
            txn.attach_to_layer_top(layer, fresh).expect("attach");
        }
        assert_ne!(doc.content_digest().expect("digest"), before);
        assert_eq!(journal.len(), 4);

        journal.rollback(&mut doc);
        assert_eq!(doc.content_digest().expect("digest"), before);
        assert!(doc.art(original).is_ok());
    }

    #[test]
    fn commit_keeps_changes() {
        let mut doc = Document::new();
        let layer = doc.top_layer().expect("layer");
        let before = doc.content_digest().expect("digest");

        let mut journal = ChangeJournal::new();
        {
            let mut txn = Txn::new(&mut doc, &mut journal);
            let fresh = txn.create_art(path(1.0));
            txn.attach_to_layer_top(layer, fresh).expect("attach");
        }
        journal.commit();
        assert_ne!(doc.content_digest().expect("digest"), before);
    }

    #[test]
    fn empty_journal_rollback_is_a_no_op() {
        let mut doc = Document::new();
        let before = doc.content_digest().expect("digest");
        let journal = ChangeJournal::new();
        assert!(journal.is_empty());
        journal.rollback(&mut doc);
        assert_eq!(doc.content_digest().expect("digest"), before);
    }
}
