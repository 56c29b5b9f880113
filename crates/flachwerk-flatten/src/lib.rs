// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Flachwerk — Flattening invoker: converts artwork containing transparency,
// blend modes, masks and spot-color effects into an equivalent collection
// of fully opaque vector/raster artwork.
//
// The invocation surface is synchronous and per-document: callers build a
// `FlatteningOptions`, call one of the `flatten_*` entry points, then pull
// structured results through the info channel.  Failures roll back unless
// suppressed, and are turned into uniform user-facing diagnostics by
// `flachwerk_core::human_errors::report_error`.

pub mod backend;
pub mod flatten;
pub mod info;
pub mod journal;
pub mod progress;
pub mod temp_layer;

pub use backend::{
    Destination, FlattenOutcome, FlattenRequest, FlattenerBackend, RegionBackend, default_backend,
};
pub use flatten::{flatten_ai_document_to_layer, flatten_art, flatten_document_to_layer};
pub use info::collect_document_flattening_info;
pub use journal::{ChangeJournal, Txn};
pub use progress::{NullProgress, ProgressSink};
pub use temp_layer::{
    create_temporary_flattening_layer, is_temporary_flattening_layer,
    remove_temporary_flattening_layer,
};
