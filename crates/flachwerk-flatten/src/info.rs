// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The flattening info channel.
//
// A successful flattening run records one snippet per qualifying output
// object on the document.  This module delivers those snippets to a
// caller-supplied receiver, strictly after the flattening operation and on
// the caller's thread.

use tracing::debug;

use flachwerk_core::error::Result;
use flachwerk_document::document::{Document, FlatteningInfo};

/// Deliver the recorded flattening info to `receiver`, one call per
/// snippet.
///
/// Each snippet is delivered exactly once.  An output object that is both a
/// linked EPS and placed art yields two separate snippets, and no ordering
/// is guaranteed — between those two or across the sequence; receivers must
/// not rely on delivery order.
///
/// Receiver-failure policy: an error returned by the receiver aborts the
/// remaining enumeration and is propagated to the caller.  Snippets already
/// delivered are not re-sent by a later call.
pub fn collect_document_flattening_info<F>(doc: &Document, mut receiver: F) -> Result<()>
where
    F: FnMut(&FlatteningInfo) -> Result<()>,
{
    let snippets = doc.flattening_info();
    for snippet in snippets {
        receiver(snippet)?;
    }
    debug!(count = snippets.len(), "flattening info delivered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flachwerk_core::error::FlattenError;
    use flachwerk_document::art::{ArtKind, ArtObject};

    /// A document with recorded info for one linked EPS (two snippets) and
    /// one plain placed object (one snippet).
    fn doc_with_info() -> Document {
        let mut doc = Document::new();
        let layer = doc.top_layer().expect("layer");
        let eps = doc.create_art(ArtObject::opaque(ArtKind::Placed { eps: None }));
        let plain = doc.create_art(ArtObject::opaque(ArtKind::Placed { eps: None }));
        doc.attach_to_layer_top(layer, eps).expect("attach");
        doc.attach_to_layer_top(layer, plain).expect("attach");
        doc.set_flattening_info(vec![
            FlatteningInfo::PlacedArt { object: eps },
            FlatteningInfo::LinkedEps {
                object: eps,
                interacts: true,
                parse_ok: true,
            },
            FlatteningInfo::PlacedArt { object: plain },
        ]);
        doc
    }

    #[test]
    fn every_snippet_is_delivered_exactly_once() {
        let doc = doc_with_info();
        let mut seen = Vec::new();
        collect_document_flattening_info(&doc, |snippet| {
            seen.push(*snippet);
            Ok(())
        })
        .expect("collect");

        assert_eq!(seen.len(), 3);
        let linked = seen
            .iter()
            .filter(|s| matches!(s, FlatteningInfo::LinkedEps { .. }))
            .count();
        let placed = seen
            .iter()
            .filter(|s| matches!(s, FlatteningInfo::PlacedArt { .. }))
            .count();
        assert_eq!(linked, 1);
        assert_eq!(placed, 2);
    }

    #[test]
    fn receiver_error_aborts_the_enumeration() {
        let doc = doc_with_info();
        let mut calls = 0usize;
        let err = collect_document_flattening_info(&doc, |_| {
            calls += 1;
            if calls == 2 {
                Err(FlattenError::Receiver("consumer full".into()))
            } else {
                Ok(())
            }
        })
        .expect_err("must abort");

        assert!(matches!(err, FlattenError::Receiver(_)));
        assert_eq!(calls, 2, "no snippets delivered after the failure");
    }

    #[test]
    fn empty_record_delivers_nothing() {
        let doc = Document::new();
        let mut calls = 0usize;
        collect_document_flattening_info(&doc, |_| {
            calls += 1;
            Ok(())
        })
        .expect("collect");
        assert_eq!(calls, 0);
    }
}
