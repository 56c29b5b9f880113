// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Art objects: the units of artwork that flattening decomposes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::document::ArtId;

/// Transparency blend modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

/// Paint color.  Spot colors are named inks; the flattener must keep their
/// count below the engine limit and may convert them to process colors when
/// full foreign-object conversion is requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Color {
    /// Process (CMYK) color, components in [0,1].
    Process { c: f64, m: f64, y: f64, k: f64 },
    /// Named spot ink at a tint in [0,1].
    Spot { name: String, tint: f64 },
    /// Grayscale, level in [0,1].  A colorized gray carries a tint color in
    /// the host and is subject to the disallow-colorized-gray restriction.
    Gray { level: f64, colorized: bool },
}

/// Color models a raster art object can be encoded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterColorModel {
    Rgb,
    Cmyk,
    ColorizedGray,
    Indexed,
    NChannel,
    Separation,
}

impl RasterColorModel {
    /// Whether this model falls under the disallow-indexed-images restriction.
    pub fn is_indexed_class(self) -> bool {
        matches!(self, Self::Indexed | Self::NChannel | Self::Separation)
    }
}

/// An opacity or clipping mask attached to an art object.
///
/// A mask is either embedded in the document or linked to an external file.
/// Linked masks cannot be flattened and are a hard precondition failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mask {
    /// True if the mask content lives outside the document.
    pub linked: bool,
    /// Source reference for a linked mask.
    pub source: Option<String>,
}

impl Mask {
    pub fn embedded() -> Self {
        Self {
            linked: false,
            source: None,
        }
    }

    pub fn linked(source: impl Into<String>) -> Self {
        Self {
            linked: true,
            source: Some(source.into()),
        }
    }
}

/// Link information for a placed EPS object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpsLink {
    /// Source reference of the linked file.
    pub source: String,
    /// Whether the linked content's original structure can be recovered by
    /// parsing.  A linked DCS, for example, cannot.
    pub parseable: bool,
}

/// Axis-aligned bounds in document points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        (self.x1 - self.x0).abs()
    }

    pub fn height(&self) -> f64 {
        (self.y1 - self.y0).abs()
    }

    /// Smallest rect containing both.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::new(0.0, 0.0, 100.0, 100.0)
    }
}

/// The kind-specific payload of an art object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArtKind {
    /// A filled and/or stroked vector path.
    Path {
        fill: Option<Color>,
        stroke: Option<Color>,
        stroke_width: f64,
        /// True once the path is guaranteed non-self-intersecting.
        simplified: bool,
    },
    /// A container of child art, back-to-front.
    Group { children: Vec<ArtId>, knockout: bool },
    /// Live text.
    Text { content: String, fill: Color },
    /// A pixel image.
    Raster {
        width_px: u32,
        height_px: u32,
        resolution: f64,
        color_model: RasterColorModel,
        anti_aliased: bool,
    },
    /// A smooth shade (gradient mesh).  Rasterized at the mesh resolution,
    /// which may be coarser than the raster resolution without banding.
    Mesh { stops: Vec<Color>, resolution: f64 },
    /// Placed (external) art.  Carries EPS link information when the
    /// placement is a linked EPS.
    Placed { eps: Option<EpsLink> },
}

/// One node of the art tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtObject {
    pub name: Option<String>,
    pub kind: ArtKind,
    /// Object opacity in [0,1].
    pub opacity: f64,
    pub blend: BlendMode,
    pub mask: Option<Mask>,
    /// Overprint paint attribute.
    pub overprint: bool,
    pub bounds: Rect,
}

impl ArtObject {
    /// A fully opaque, unmasked object of the given kind.
    pub fn opaque(kind: ArtKind) -> Self {
        Self {
            name: None,
            kind,
            opacity: 1.0,
            blend: BlendMode::Normal,
            mask: None,
            overprint: false,
            bounds: Rect::default(),
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_mask(mut self, mask: Mask) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }

    /// Whether this object participates in transparency on its own account.
    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0 || self.blend != BlendMode::Normal || self.mask.is_some()
    }

    /// Whether the only transparency is a simple blend mode: fully opaque,
    /// unmasked, non-Normal blend.  Such objects can survive flattening
    /// unchanged when the caller asks for it.
    pub fn is_simple_transparency(&self) -> bool {
        self.blend != BlendMode::Normal && self.opacity >= 1.0 && self.mask.is_none()
    }

    /// Collect the names of all spot colors painted directly by this object.
    pub fn collect_spots(&self, out: &mut BTreeSet<String>) {
        let mut push = |color: &Color| {
            if let Color::Spot { name, .. } = color {
                out.insert(name.clone());
            }
        };
        match &self.kind {
            ArtKind::Path { fill, stroke, .. } => {
                if let Some(fill) = fill {
                    push(fill);
                }
                if let Some(stroke) = stroke {
                    push(stroke);
                }
            }
            ArtKind::Text { fill, .. } => push(fill),
            ArtKind::Mesh { stops, .. } => {
                for stop in stops {
                    push(stop);
                }
            }
            ArtKind::Group { .. } | ArtKind::Raster { .. } | ArtKind::Placed { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_path() -> ArtKind {
        ArtKind::Path {
            fill: Some(Color::Process {
                c: 0.0,
                m: 0.0,
                y: 0.0,
                k: 1.0,
            }),
            stroke: None,
            stroke_width: 0.0,
            simplified: false,
        }
    }

    #[test]
    fn opaque_art_is_not_transparent() {
        let art = ArtObject::opaque(plain_path());
        assert!(!art.is_transparent());
        assert!(!art.is_simple_transparency());
    }

    #[test]
    fn reduced_opacity_is_transparent_but_not_simple() {
        let art = ArtObject::opaque(plain_path()).with_opacity(0.5);
        assert!(art.is_transparent());
        assert!(!art.is_simple_transparency());
    }

    #[test]
    fn blend_only_transparency_is_simple() {
        let art = ArtObject::opaque(plain_path()).with_blend(BlendMode::Multiply);
        assert!(art.is_transparent());
        assert!(art.is_simple_transparency());
    }

    #[test]
    fn masked_art_is_not_simple() {
        let art = ArtObject::opaque(plain_path())
            .with_blend(BlendMode::Multiply)
            .with_mask(Mask::embedded());
        assert!(art.is_transparent());
        assert!(!art.is_simple_transparency());
    }

    #[test]
    fn spot_census_covers_fill_stroke_and_mesh() {
        let mut spots = BTreeSet::new();

        let path = ArtObject::opaque(ArtKind::Path {
            fill: Some(Color::Spot {
                name: "PANTONE 186 C".into(),
                tint: 1.0,
            }),
            stroke: Some(Color::Spot {
                name: "PANTONE 300 C".into(),
                tint: 0.5,
            }),
            stroke_width: 1.0,
            simplified: false,
        });
        path.collect_spots(&mut spots);

        let mesh = ArtObject::opaque(ArtKind::Mesh {
            stops: vec![
                Color::Spot {
                    name: "PANTONE 186 C".into(),
                    tint: 0.3,
                },
                Color::Process {
                    c: 1.0,
                    m: 0.0,
                    y: 0.0,
                    k: 0.0,
                },
            ],
            resolution: 150.0,
        });
        mesh.collect_spots(&mut spots);

        // Duplicate spot names collapse.
        assert_eq!(spots.len(), 2);
    }
}
