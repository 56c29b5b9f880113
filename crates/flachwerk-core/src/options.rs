// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The flattening options model.
//
// An options value is built by the caller, validated once at the start of an
// invocation, and read-only for the duration of the operation.  The balance
// drives the raster/vector decomposition policy; the two resolutions are
// deliberately independent because smooth shades tolerate coarser sampling
// than high-frequency detail, which keeps output size down.

use serde::{Deserialize, Serialize};

use crate::error::{FlattenError, Result};

/// Default resolution of raster images generated by flattening, in DPI.
pub const DEFAULT_RESOLUTION: f64 = 300.0;
/// Minimum accepted rasterization resolution, in DPI.
pub const MIN_RESOLUTION: f64 = 1.0;
/// Maximum accepted rasterization resolution, in DPI.
pub const MAX_RESOLUTION: f64 = 9600.0;
/// Minimum raster/vector balance (maximally raster).
pub const MIN_BALANCE: u8 = 0;
/// Maximum raster/vector balance (maximally vector).
pub const MAX_BALANCE: u8 = 100;
/// Maximum number of distinct spot colors allowed in artwork to be flattened.
pub const MAX_SPOT_COLORS: usize = 27;

/// Independent boolean options controlling a flattening operation.
///
/// Every field can be combined freely with every other.  The one exception
/// is `clip_complex_regions`, which is suppressed when the balance is 100 —
/// see [`FlatteningOptions::clip_complex_regions_effective`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatteningFlags {
    /// Emit text as vector outlines instead of live text.
    pub outline_text: bool,
    /// Convert all strokes to filled shapes, even outside transparency.
    pub outline_strokes: bool,
    /// Rasterize and clip geometrically dense regions for speed and simpler
    /// output.  Ignored when the balance is 100.
    pub clip_complex_regions: bool,
    /// Keep overprint semantics in opaque regions instead of simulating them.
    pub preserve_overprints: bool,
    /// Report progress during the operation.
    pub show_progress: bool,
    /// Keep simple blend-mode transparency unflattened when safe.
    pub preserve_simple_transparency: bool,
    /// Force planar-map decomposition even for regions with no transparency.
    pub planarize_opaque_regions: bool,
    /// Do not roll back document changes on failure or cancel.  The caller
    /// owns recovery (e.g. live effects that manage their own undo).
    pub dont_undo_changes_on_error: bool,
    /// Allow full conversion of foreign objects that exist to preserve spot
    /// colors.  May increase lossiness.
    pub foreign_object_conversion_full: bool,
    /// Post-process flattened paths into non-self-intersecting paths.
    pub simplify_paths: bool,
    /// Wrap flattened output in a knockout group.
    pub into_knockout_group: bool,
    /// Disallow colorized grayscale images in the flattened output.
    pub disallow_colorized_gray: bool,
    /// Disallow NChannel/Separation/Indexed colorspace images in the output.
    pub disallow_indexed_images: bool,
    /// Anti-alias rasterized regions.
    pub use_anti_aliasing: bool,
}

/// Range into which backend-relative progress is mapped when progress
/// reporting is requested.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressRange {
    /// Start of the progress range, usually 0.0.
    pub start: f64,
    /// End of the progress range, usually 1.0.
    pub end: f64,
}

impl Default for ProgressRange {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 1.0,
        }
    }
}

/// Options that control how a flattening operation behaves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlatteningOptions {
    /// Independent boolean options.
    pub flags: FlatteningFlags,
    /// Balance between rasters and vectors in the output art, in 0..=100.
    /// 0 biases maximally toward raster output, 100 maximally toward vector.
    pub balance: u8,
    /// Rasterization resolution for high-frequency (detailed) regions, DPI.
    pub raster_resolution: f64,
    /// Rasterization resolution for smooth shades and meshes, DPI.
    pub mesh_resolution: f64,
    /// Progress range, meaningful only when `flags.show_progress` is set.
    pub progress: ProgressRange,
}

impl Default for FlatteningOptions {
    fn default() -> Self {
        Self {
            flags: FlatteningFlags::default(),
            balance: 75,
            raster_resolution: DEFAULT_RESOLUTION,
            mesh_resolution: DEFAULT_RESOLUTION,
            progress: ProgressRange::default(),
        }
    }
}

impl FlatteningOptions {
    /// Check every invariant of the options value.
    ///
    /// Out-of-range values are rejected, not clamped: a resolution outside
    /// [`MIN_RESOLUTION`]..=[`MAX_RESOLUTION`] or a balance above
    /// [`MAX_BALANCE`] is an error.  Both boundary resolutions are accepted.
    pub fn validate(&self) -> Result<()> {
        if self.balance > MAX_BALANCE {
            return Err(FlattenError::InvalidBalance {
                value: self.balance as u16,
            });
        }
        for value in [self.raster_resolution, self.mesh_resolution] {
            if !value.is_finite() || value < MIN_RESOLUTION || value > MAX_RESOLUTION {
                return Err(FlattenError::ResolutionOutOfRange {
                    value,
                    min: MIN_RESOLUTION,
                    max: MAX_RESOLUTION,
                });
            }
        }
        if self.flags.show_progress && self.progress.start > self.progress.end {
            return Err(FlattenError::InvalidProgressRange {
                start: self.progress.start,
                end: self.progress.end,
            });
        }
        Ok(())
    }

    /// Whether complex-region clipping is actually in effect.
    ///
    /// A balance of 100 requests pure vector output, so region rasterization
    /// is suppressed regardless of the flag state.
    pub fn clip_complex_regions_effective(&self) -> bool {
        self.flags.clip_complex_regions && self.balance < MAX_BALANCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let opts = FlatteningOptions::default();
        opts.validate().expect("default options validate");
        assert_eq!(opts.balance, 75);
        assert_eq!(opts.raster_resolution, DEFAULT_RESOLUTION);
        assert_eq!(opts.mesh_resolution, DEFAULT_RESOLUTION);
    }

    #[test]
    fn boundary_resolutions_accepted() {
        let mut opts = FlatteningOptions::default();
        opts.raster_resolution = MIN_RESOLUTION;
        opts.mesh_resolution = MAX_RESOLUTION;
        opts.validate().expect("boundary resolutions are legal");
    }

    #[test]
    fn out_of_range_resolutions_rejected() {
        let mut opts = FlatteningOptions::default();
        opts.raster_resolution = 0.5;
        assert!(matches!(
            opts.validate(),
            Err(FlattenError::ResolutionOutOfRange { .. })
        ));

        opts.raster_resolution = DEFAULT_RESOLUTION;
        opts.mesh_resolution = 9600.1;
        assert!(matches!(
            opts.validate(),
            Err(FlattenError::ResolutionOutOfRange { .. })
        ));
    }

    #[test]
    fn balance_above_100_rejected() {
        let mut opts = FlatteningOptions::default();
        opts.balance = 101;
        assert!(matches!(
            opts.validate(),
            Err(FlattenError::InvalidBalance { value: 101 })
        ));
    }

    #[test]
    fn balance_100_suppresses_complex_region_clipping() {
        let mut opts = FlatteningOptions::default();
        opts.flags.clip_complex_regions = true;
        opts.balance = 99;
        assert!(opts.clip_complex_regions_effective());

        opts.balance = 100;
        assert!(!opts.clip_complex_regions_effective());
    }

    #[test]
    fn inverted_progress_range_rejected_only_when_reporting() {
        let mut opts = FlatteningOptions::default();
        opts.progress = ProgressRange {
            start: 0.8,
            end: 0.2,
        };
        // Without show_progress the range is inert and not validated.
        opts.validate().expect("range ignored without show_progress");

        opts.flags.show_progress = true;
        assert!(matches!(
            opts.validate(),
            Err(FlattenError::InvalidProgressRange { .. })
        ));
    }
}
