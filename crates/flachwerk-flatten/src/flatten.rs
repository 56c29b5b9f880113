// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The flattening invoker.
//
// Entry points validate every precondition before touching the document,
// then hand the request to a backend under a transaction journal.  Unless
// the caller opts out, a failed or cancelled attempt is rolled back before
// the error is returned, giving all-or-nothing semantics per invocation.
//
// Only one flattening operation per document may be in flight; the
// exclusive `&mut Document` borrow enforces that within a process.

use tracing::{info, instrument, warn};

use flachwerk_core::error::{FlattenError, Result};
use flachwerk_core::options::{FlatteningOptions, MAX_SPOT_COLORS};
use flachwerk_core::types::PaintOrder;
use flachwerk_document::document::{ArtId, Document, LayerId};

use crate::backend::{Destination, FlattenRequest, FlattenerBackend};
use crate::journal::{ChangeJournal, Txn};
use crate::progress::{ProgressSink, ScaledProgress};

/// Flatten a set of artwork into an equivalent collection of opaque
/// artwork, inserting the output at `paint_order` relative to `anchor`.
///
/// On success the transparent members of `art_set` have been replaced by
/// opaque output and the produced root objects are returned; info about
/// placed and linked-EPS output is recorded on the document for
/// [`crate::info::collect_document_flattening_info`].
#[instrument(skip_all, fields(doc = %doc.id, set_len = art_set.len()))]
pub fn flatten_art(
    doc: &mut Document,
    backend: &dyn FlattenerBackend,
    art_set: &[ArtId],
    options: &FlatteningOptions,
    paint_order: PaintOrder,
    anchor: ArtId,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<ArtId>> {
    options.validate()?;
    if art_set.is_empty() {
        return Err(FlattenError::EmptyArtSet);
    }
    doc.resolve_set(art_set)?;
    doc.art(anchor)?;
    check_content_preconditions(doc, art_set)?;

    run(
        doc,
        backend,
        art_set,
        options,
        Destination::Relative {
            order: paint_order,
            anchor,
        },
        progress,
    )
}

/// Flatten all artwork in the document into `layer`, using the document's
/// persisted general flattening preset.
///
/// `layer` is typically (but not necessarily) a temporary flattening layer.
/// An empty document is a no-op, not an error.
#[instrument(skip_all, fields(doc = %doc.id))]
pub fn flatten_document_to_layer(
    doc: &mut Document,
    backend: &dyn FlattenerBackend,
    layer: LayerId,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<ArtId>> {
    doc.layer(layer)?;
    let options = doc.settings.general;
    flatten_document_with(doc, backend, layer, options, progress)
}

/// Flatten all artwork in the document into `layer`, using the persisted
/// save preset for the chosen output format (`is_eps` selects the EPS
/// preset over the native one).
#[instrument(skip_all, fields(doc = %doc.id, is_eps))]
pub fn flatten_ai_document_to_layer(
    doc: &mut Document,
    backend: &dyn FlattenerBackend,
    layer: LayerId,
    is_eps: bool,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<ArtId>> {
    doc.layer(layer)?;
    let options = *doc.settings.save_preset(is_eps);
    flatten_document_with(doc, backend, layer, options, progress)
}

fn flatten_document_with(
    doc: &mut Document,
    backend: &dyn FlattenerBackend,
    layer: LayerId,
    options: FlatteningOptions,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<ArtId>> {
    options.validate()?;
    let art_set = doc.all_roots_except(layer);
    if art_set.is_empty() {
        info!("document has no art to flatten");
        return Ok(Vec::new());
    }
    check_content_preconditions(doc, &art_set)?;
    run(
        doc,
        backend,
        &art_set,
        &options,
        Destination::Layer(layer),
        progress,
    )
}

/// Content preconditions, checked before any mutation: the spot-color
/// census and the linked-mask scan.
fn check_content_preconditions(doc: &Document, art_set: &[ArtId]) -> Result<()> {
    let count = doc.spot_color_count(art_set)?;
    if count > MAX_SPOT_COLORS {
        return Err(FlattenError::TooManySpots {
            count,
            limit: MAX_SPOT_COLORS,
        });
    }
    if doc.has_linked_mask(art_set)? {
        return Err(FlattenError::HasLinkedMask);
    }
    Ok(())
}

fn run(
    doc: &mut Document,
    backend: &dyn FlattenerBackend,
    art_set: &[ArtId],
    options: &FlatteningOptions,
    destination: Destination,
    progress: &mut dyn ProgressSink,
) -> Result<Vec<ArtId>> {
    let mut journal = ChangeJournal::new();
    let mut scaled = ScaledProgress::new(progress, options);
    let request = FlattenRequest {
        art_set,
        options,
        destination,
    };

    let result = {
        let mut txn = Txn::new(doc, &mut journal);
        backend.flatten(&mut txn, &request, &mut scaled)
    };

    match result {
        Ok(outcome) => {
            journal.commit();
            doc.set_flattening_info(outcome.info);
            info!(produced = outcome.produced.len(), "flattening committed");
            Ok(outcome.produced)
        }
        Err(err) => {
            if options.flags.dont_undo_changes_on_error {
                warn!(%err, "flattening failed; leaving changes in place as requested");
            } else {
                journal.rollback(doc);
            }
            Err(err)
        }
    }
}
