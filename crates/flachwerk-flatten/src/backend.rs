// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The flattening backend: balance-driven raster/vector decomposition.
//
// The invoker talks to a backend through the `FlattenerBackend` trait and
// obtains one through `default_backend()`.  `RegionBackend` is the built-in
// implementation: it decides per region whether to emit vector or raster
// output, honours every option flag, and performs all document edits through
// the transaction journal so a failed attempt can be rolled back.

use tracing::debug;

use flachwerk_core::error::Result;
use flachwerk_core::options::{FlatteningOptions, MAX_BALANCE};
use flachwerk_core::types::PaintOrder;
use flachwerk_document::art::{ArtKind, ArtObject, BlendMode, Color, RasterColorModel, Rect};
use flachwerk_document::document::{ArtId, Document, FlatteningInfo, LayerId};

use crate::journal::Txn;
use crate::progress::ScaledProgress;

/// Subtree node count above which a region counts as geometrically dense
/// and is rasterized+clipped when complex-region clipping is in effect.
pub const COMPLEX_REGION_NODE_LIMIT: usize = 16;

/// Where flattened output is inserted.
#[derive(Debug, Clone, Copy)]
pub enum Destination {
    /// Relative to an anchor object, at the given paint order.
    Relative { order: PaintOrder, anchor: ArtId },
    /// At the top of a layer.
    Layer(LayerId),
}

/// One flattening request, as handed to a backend.
#[derive(Debug)]
pub struct FlattenRequest<'a> {
    /// Root art objects to decompose.
    pub art_set: &'a [ArtId],
    pub options: &'a FlatteningOptions,
    pub destination: Destination,
}

/// What a backend produced.
#[derive(Debug, Default)]
pub struct FlattenOutcome {
    /// Roots of the attached output art.
    pub produced: Vec<ArtId>,
    /// Info snippets about placed and linked-EPS objects in the output.
    pub info: Vec<FlatteningInfo>,
}

/// Capability set of a flattening engine.
///
/// Preconditions (options validity, spot census, linked masks) are the
/// invoker's job; a backend may assume they hold.  All document edits must
/// go through the transaction, and progress must be stepped between regions
/// so cancellation stays cooperative.
pub trait FlattenerBackend {
    fn flatten(
        &self,
        txn: &mut Txn<'_>,
        request: &FlattenRequest<'_>,
        progress: &mut ScaledProgress<'_>,
    ) -> Result<FlattenOutcome>;
}

/// Acquire the default flattening backend.
pub fn default_backend() -> RegionBackend {
    RegionBackend
}

/// The built-in region decomposer.
pub struct RegionBackend;

impl FlattenerBackend for RegionBackend {
    fn flatten(
        &self,
        txn: &mut Txn<'_>,
        request: &FlattenRequest<'_>,
        progress: &mut ScaledProgress<'_>,
    ) -> Result<FlattenOutcome> {
        let opts = request.options;
        let mut info = Vec::new();
        let mut replacements = Vec::new();
        let total = request.art_set.len().max(1);

        for (index, &root) in request.art_set.iter().enumerate() {
            let interacts = subtree_interacts(txn.doc(), root)?;
            let untouched = (!interacts && !opts.flags.planarize_opaque_regions)
                || (interacts
                    && opts.flags.preserve_simple_transparency
                    && subtree_only_simple_transparency(txn.doc(), root)?);
            if untouched {
                progress.step((index + 1) as f64 / total as f64)?;
                continue;
            }

            let replacement = self.flatten_root(txn, root, opts, interacts, &mut info)?;
            txn.remove_subtree(root)?;
            replacements.push(replacement);
            progress.step((index + 1) as f64 / total as f64)?;
        }

        let attach_roots = if opts.flags.into_knockout_group && !replacements.is_empty() {
            let group = txn.create_art(ArtObject::opaque(ArtKind::Group {
                children: replacements.clone(),
                knockout: true,
            }));
            vec![group]
        } else {
            replacements
        };

        attach_at(txn, request.destination, &attach_roots)?;
        debug!(
            regions = request.art_set.len(),
            produced = attach_roots.len(),
            "regions decomposed"
        );
        Ok(FlattenOutcome {
            produced: attach_roots,
            info,
        })
    }
}

impl RegionBackend {
    /// Decompose one region: decide raster vs. vector, then build the
    /// opaque replacement subtree (unattached).
    fn flatten_root(
        &self,
        txn: &mut Txn<'_>,
        root: ArtId,
        opts: &FlatteningOptions,
        interacts: bool,
        info: &mut Vec<FlatteningInfo>,
    ) -> Result<ArtId> {
        let doc = txn.doc();
        let subtree = doc.subtree_ids(root)?;
        let rasterize = opts.balance == 0
            || (opts.clip_complex_regions_effective() && subtree.len() > COMPLEX_REGION_NODE_LIMIT);
        if rasterize {
            let mut bounds = doc.art(root)?.bounds;
            for id in &subtree {
                bounds = bounds.union(&doc.art(*id)?.bounds);
            }
            return Ok(txn.create_art(raster_region(bounds, opts)));
        }
        self.flatten_node(txn, root, opts, interacts, info)
    }

    /// Build the opaque equivalent of one subtree node.
    fn flatten_node(
        &self,
        txn: &mut Txn<'_>,
        id: ArtId,
        opts: &FlatteningOptions,
        in_transparency: bool,
        info: &mut Vec<FlatteningInfo>,
    ) -> Result<ArtId> {
        let art = txn.doc().art(id)?.clone();
        let in_transparency = in_transparency || art.is_transparent();
        let overprint = art.overprint && opts.flags.preserve_overprints;

        let kind = match &art.kind {
            ArtKind::Group { children, knockout } => {
                let mut flattened = Vec::with_capacity(children.len());
                for child in children {
                    flattened.push(self.flatten_node(txn, *child, opts, in_transparency, info)?);
                }
                ArtKind::Group {
                    children: flattened,
                    knockout: *knockout,
                }
            }

            ArtKind::Path {
                fill,
                stroke,
                stroke_width,
                simplified,
            } => {
                let fill = fill.as_ref().map(|c| flatten_color(c, art.opacity, opts));
                let stroke = stroke.as_ref().map(|c| flatten_color(c, art.opacity, opts));
                let simplified = *simplified || opts.flags.simplify_paths;
                if opts.flags.outline_strokes && stroke.is_some() {
                    // The stroke becomes a filled outline shape.
                    ArtKind::Path {
                        fill: fill.or(stroke),
                        stroke: None,
                        stroke_width: 0.0,
                        simplified,
                    }
                } else {
                    ArtKind::Path {
                        fill,
                        stroke,
                        stroke_width: *stroke_width,
                        simplified,
                    }
                }
            }

            ArtKind::Text { content, fill } => {
                let fill = flatten_color(fill, art.opacity, opts);
                if opts.flags.outline_text {
                    ArtKind::Path {
                        fill: Some(fill),
                        stroke: None,
                        stroke_width: 0.0,
                        simplified: opts.flags.simplify_paths,
                    }
                } else {
                    ArtKind::Text {
                        content: content.clone(),
                        fill,
                    }
                }
            }

            ArtKind::Raster { color_model, .. } => ArtKind::Raster {
                width_px: px(art.bounds.width(), opts.raster_resolution),
                height_px: px(art.bounds.height(), opts.raster_resolution),
                resolution: opts.raster_resolution,
                color_model: constrain_color_model(*color_model, opts),
                anti_aliased: opts.flags.use_anti_aliasing,
            },

            ArtKind::Mesh { stops, resolution } => {
                if opts.balance == MAX_BALANCE {
                    // Pure vector output keeps the mesh as a vector shade.
                    ArtKind::Mesh {
                        stops: stops
                            .iter()
                            .map(|c| flatten_color(c, art.opacity, opts))
                            .collect(),
                        resolution: *resolution,
                    }
                } else {
                    // Smooth shades rasterize at the coarser mesh resolution.
                    ArtKind::Raster {
                        width_px: px(art.bounds.width(), opts.mesh_resolution),
                        height_px: px(art.bounds.height(), opts.mesh_resolution),
                        resolution: opts.mesh_resolution,
                        color_model: RasterColorModel::Cmyk,
                        anti_aliased: opts.flags.use_anti_aliasing,
                    }
                }
            }

            ArtKind::Placed { eps } => ArtKind::Placed { eps: eps.clone() },
        };

        let replacement = ArtObject {
            name: art.name.clone(),
            kind,
            opacity: 1.0,
            blend: BlendMode::Normal,
            mask: None,
            overprint,
            bounds: art.bounds,
        };
        let new_id = txn.create_art(replacement);

        if let ArtKind::Placed { eps } = &txn.doc().art(new_id)?.kind {
            info.push(FlatteningInfo::PlacedArt { object: new_id });
            if let Some(link) = eps {
                info.push(FlatteningInfo::LinkedEps {
                    object: new_id,
                    interacts: in_transparency,
                    parse_ok: link.parseable,
                });
            }
        }
        Ok(new_id)
    }
}

/// A rasterized, clipped stand-in for an entire region.
fn raster_region(bounds: Rect, opts: &FlatteningOptions) -> ArtObject {
    ArtObject::opaque(ArtKind::Raster {
        width_px: px(bounds.width(), opts.raster_resolution),
        height_px: px(bounds.height(), opts.raster_resolution),
        resolution: opts.raster_resolution,
        color_model: RasterColorModel::Cmyk,
        anti_aliased: opts.flags.use_anti_aliasing,
    })
    .with_bounds(bounds)
}

/// Pixel extent of a physical length at the given resolution.
fn px(points: f64, dpi: f64) -> u32 {
    ((points / 72.0) * dpi).ceil().max(1.0) as u32
}

/// Composite an object's opacity into its ink weights, converting spot
/// colors to process when full foreign-object conversion is requested.
fn flatten_color(color: &Color, opacity: f64, opts: &FlatteningOptions) -> Color {
    let color = if opts.flags.foreign_object_conversion_full {
        match color {
            // Ink-weight approximation of the spot tint.
            Color::Spot { tint, .. } => Color::Process {
                c: 0.0,
                m: 0.0,
                y: 0.0,
                k: *tint,
            },
            other => other.clone(),
        }
    } else {
        color.clone()
    };
    match color {
        Color::Process { c, m, y, k } => Color::Process {
            c: c * opacity,
            m: m * opacity,
            y: y * opacity,
            k: k * opacity,
        },
        Color::Spot { name, tint } => Color::Spot {
            name,
            tint: tint * opacity,
        },
        Color::Gray { level, colorized } => Color::Gray {
            level: level * opacity,
            colorized,
        },
    }
}

/// Apply the raster color-model restrictions.
fn constrain_color_model(model: RasterColorModel, opts: &FlatteningOptions) -> RasterColorModel {
    if model == RasterColorModel::ColorizedGray && opts.flags.disallow_colorized_gray {
        return RasterColorModel::Cmyk;
    }
    if model.is_indexed_class() && opts.flags.disallow_indexed_images {
        return RasterColorModel::Cmyk;
    }
    model
}

/// Whether any node of the subtree participates in transparency.
fn subtree_interacts(doc: &Document, root: ArtId) -> Result<bool> {
    for id in doc.subtree_ids(root)? {
        if doc.art(id)?.is_transparent() {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Whether every transparent node of the subtree is simple blend-mode
/// transparency (safe to leave unflattened on request).
fn subtree_only_simple_transparency(doc: &Document, root: ArtId) -> Result<bool> {
    for id in doc.subtree_ids(root)? {
        let art = doc.art(id)?;
        if art.is_transparent() && !art.is_simple_transparency() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Attach output roots at the destination, preserving their order.
fn attach_at(txn: &mut Txn<'_>, destination: Destination, ids: &[ArtId]) -> Result<()> {
    match destination {
        Destination::Layer(layer) => {
            for id in ids {
                txn.attach_to_layer_top(layer, *id)?;
            }
        }
        Destination::Relative { order, anchor } => match order {
            // These insert at a fixed position, so attach back-to-front.
            PaintOrder::Above | PaintOrder::InsideAtBottom => {
                for id in ids.iter().rev() {
                    txn.attach_relative(*id, order, anchor)?;
                }
            }
            PaintOrder::Below | PaintOrder::InsideOnTop => {
                for id in ids {
                    txn.attach_relative(*id, order, anchor)?;
                }
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flachwerk_core::options::FlatteningOptions;

    #[test]
    fn px_rounds_up_and_never_hits_zero() {
        assert_eq!(px(72.0, 300.0), 300);
        assert_eq!(px(1.0, 1.0), 1);
        assert_eq!(px(0.0, 300.0), 1);
    }

    #[test]
    fn spot_colors_convert_only_under_full_conversion() {
        let spot = Color::Spot {
            name: "PANTONE 186 C".into(),
            tint: 0.8,
        };
        let mut opts = FlatteningOptions::default();

        let kept = flatten_color(&spot, 1.0, &opts);
        assert!(matches!(kept, Color::Spot { .. }));

        opts.flags.foreign_object_conversion_full = true;
        let converted = flatten_color(&spot, 1.0, &opts);
        assert_eq!(
            converted,
            Color::Process {
                c: 0.0,
                m: 0.0,
                y: 0.0,
                k: 0.8
            }
        );
    }

    #[test]
    fn opacity_is_composited_into_ink_weights() {
        let color = Color::Process {
            c: 1.0,
            m: 0.5,
            y: 0.0,
            k: 0.0,
        };
        let opts = FlatteningOptions::default();
        let out = flatten_color(&color, 0.5, &opts);
        assert_eq!(
            out,
            Color::Process {
                c: 0.5,
                m: 0.25,
                y: 0.0,
                k: 0.0
            }
        );
    }

    #[test]
    fn color_model_restrictions_apply() {
        let mut opts = FlatteningOptions::default();
        assert_eq!(
            constrain_color_model(RasterColorModel::ColorizedGray, &opts),
            RasterColorModel::ColorizedGray
        );

        opts.flags.disallow_colorized_gray = true;
        assert_eq!(
            constrain_color_model(RasterColorModel::ColorizedGray, &opts),
            RasterColorModel::Cmyk
        );

        assert_eq!(
            constrain_color_model(RasterColorModel::Indexed, &opts),
            RasterColorModel::Indexed
        );
        opts.flags.disallow_indexed_images = true;
        for model in [
            RasterColorModel::Indexed,
            RasterColorModel::NChannel,
            RasterColorModel::Separation,
        ] {
            assert_eq!(constrain_color_model(model, &opts), RasterColorModel::Cmyk);
        }
    }
}
