// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Flachwerk — Art-object model: the document tree that flattening operates on.
//
// Artwork and layer handles are generational arena indices.  Every lookup is
// liveness-checked, so a handle that outlives its object reports a lifecycle
// error instead of dereferencing stale state.

pub mod art;
pub mod document;

pub use art::{ArtKind, ArtObject, BlendMode, Color, EpsLink, Mask, RasterColorModel, Rect};
pub use document::{ArtId, ArtParent, DetachedArt, DetachedLayer, Document, FlatteningInfo, Layer, LayerId};
