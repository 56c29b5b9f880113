// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the flattening hot path: document-level
// flattening of a synthetic document of layered transparent groups.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use flachwerk_document::art::{ArtKind, ArtObject, Color};
use flachwerk_document::document::Document;
use flachwerk_flatten::{NullProgress, default_backend, flatten_document_to_layer};

/// Build a document with `groups` transparent groups of eight paths each.
fn build_document(groups: usize) -> Document {
    let mut doc = Document::new();
    let layer = doc.top_layer().expect("layer");
    for g in 0..groups {
        let children: Vec<_> = (0..8)
            .map(|i| {
                doc.create_art(ArtObject::opaque(ArtKind::Path {
                    fill: Some(Color::Process {
                        c: (i as f64) / 8.0,
                        m: 0.5,
                        y: 0.0,
                        k: 0.1,
                    }),
                    stroke: None,
                    stroke_width: 0.0,
                    simplified: false,
                }))
            })
            .collect();
        let group = doc.create_art(
            ArtObject::opaque(ArtKind::Group {
                children,
                knockout: false,
            })
            .with_opacity(0.5 + (g % 4) as f64 * 0.1),
        );
        doc.attach_to_layer_top(layer, group).expect("attach");
    }
    doc
}

fn bench_flatten_document(c: &mut Criterion) {
    let doc = build_document(32);

    c.bench_function("flatten_document (32 transparent groups)", |b| {
        b.iter(|| {
            let mut doc = doc.clone();
            let dest = doc.add_layer("Output");
            let produced =
                flatten_document_to_layer(&mut doc, &default_backend(), dest, &mut NullProgress)
                    .expect("flatten");
            black_box(produced);
        });
    });
}

criterion_group!(benches, bench_flatten_document);
criterion_main!(benches);
