// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Temporary output layer lifecycle.
//
// Flattening can be destructive and exploratory: isolating output in a
// disposable marked layer lets the caller inspect, accept or discard
// results without touching the original art.  The layer is otherwise a
// normal layer; only the queryable marker distinguishes it.

use tracing::{debug, info};

use flachwerk_core::error::{FlattenError, Result};
use flachwerk_document::document::{Document, LayerId};

/// Name given to temporary flattening layers.
pub const TEMP_LAYER_NAME: &str = "Flattening Output";

/// Create a new temporary flattening layer at the top of the layer stack.
///
/// Not idempotent: calling twice creates two layers.  The creator owns the
/// layer and must remove it with [`remove_temporary_flattening_layer`] when
/// it is no longer needed.
pub fn create_temporary_flattening_layer(doc: &mut Document) -> Result<LayerId> {
    let id = doc.add_layer(TEMP_LAYER_NAME);
    doc.layer_mut(id)?.temporary_flattening = true;
    info!(layer = ?id, "temporary flattening layer created");
    Ok(id)
}

/// Whether `layer` carries the temporary-flattening marker.
///
/// Pure query.  A stale or nonexistent handle is a lifecycle error, not
/// `false`.
pub fn is_temporary_flattening_layer(doc: &Document, layer: LayerId) -> Result<bool> {
    Ok(doc.layer(layer)?.temporary_flattening)
}

/// Remove the topmost temporary flattening layer and all art it contains.
///
/// Reports [`FlattenError::NoTemporaryLayer`] when none exists; callers
/// must not assume deletion succeeded without checking.
pub fn remove_temporary_flattening_layer(doc: &mut Document) -> Result<()> {
    let found = doc
        .layers()
        .filter(|(_, layer)| layer.temporary_flattening)
        .map(|(id, _)| id)
        .last();
    match found {
        Some(id) => {
            doc.remove_layer(id)?;
            debug!(layer = ?id, "temporary flattening layer removed");
            Ok(())
        }
        None => Err(FlattenError::NoTemporaryLayer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flachwerk_document::art::{ArtKind, ArtObject, Color};

    fn path() -> ArtObject {
        ArtObject::opaque(ArtKind::Path {
            fill: Some(Color::Gray {
                level: 1.0,
                colorized: false,
            }),
            stroke: None,
            stroke_width: 0.0,
            simplified: false,
        })
    }

    #[test]
    fn created_layer_carries_the_marker() {
        let mut doc = Document::new();
        let base = doc.top_layer().expect("layer");
        let temp = create_temporary_flattening_layer(&mut doc).expect("create");

        assert!(is_temporary_flattening_layer(&doc, temp).expect("query"));
        assert!(!is_temporary_flattening_layer(&doc, base).expect("query"));
        assert_eq!(doc.top_layer(), Some(temp));
    }

    #[test]
    fn creation_is_not_idempotent() {
        let mut doc = Document::new();
        let first = create_temporary_flattening_layer(&mut doc).expect("create");
        let second = create_temporary_flattening_layer(&mut doc).expect("create");
        assert_ne!(first, second);
        assert_eq!(doc.layers().count(), 3);
    }

    #[test]
    fn remove_deletes_the_layer_and_its_art() {
        let mut doc = Document::new();
        let temp = create_temporary_flattening_layer(&mut doc).expect("create");
        let art = doc.create_art(path());
        doc.attach_to_layer_top(temp, art).expect("attach");

        remove_temporary_flattening_layer(&mut doc).expect("remove");
        assert!(matches!(doc.art(art), Err(FlattenError::ArtMissing)));

        // Querying the stale handle reports a lifecycle error, not a bool.
        assert!(matches!(
            is_temporary_flattening_layer(&doc, temp),
            Err(FlattenError::LayerMissing)
        ));
    }

    #[test]
    fn remove_takes_the_topmost_marked_layer_first() {
        let mut doc = Document::new();
        let first = create_temporary_flattening_layer(&mut doc).expect("create");
        let second = create_temporary_flattening_layer(&mut doc).expect("create");

        remove_temporary_flattening_layer(&mut doc).expect("remove");
        assert!(doc.layer(first).is_ok());
        assert!(matches!(doc.layer(second), Err(FlattenError::LayerMissing)));

        remove_temporary_flattening_layer(&mut doc).expect("remove");
        assert!(matches!(
            remove_temporary_flattening_layer(&mut doc),
            Err(FlattenError::NoTemporaryLayer)
        ));
    }
}
