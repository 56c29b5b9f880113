// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for flattening failures.
//
// Every caller that needs to show a flattening error to the user goes
// through `report_error`, so the same failure always produces the same
// message.  The taxonomy uses four severity levels that drive UI
// presentation.

use crate::error::FlattenError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Resource blip — retrying (possibly with lighter settings) may work.
    Transient,
    /// User must change something (embed a mask, drop spot colors, fix a
    /// setting) before retrying.
    ActionRequired,
    /// Cannot be fixed by retrying or user action.
    Permanent,
    /// Not a failure in the user's eyes (cancellation, nothing to remove).
    Informational,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether the operation is worth retrying as-is.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Map a flattening error to the uniform user-facing diagnostic.
///
/// Pure presentation: no state is mutated and nothing is retried here.
pub fn report_error(err: &FlattenError) -> HumanError {
    match err {
        // -- Preconditions --
        FlattenError::HasLinkedMask => HumanError {
            message: "The artwork uses a linked mask.".into(),
            suggestion: "Embed the linked mask file into the document, then flatten again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FlattenError::TooManySpots { count, limit } => HumanError {
            message: "The artwork uses too many spot colors.".into(),
            suggestion: format!(
                "Flattening supports up to {limit} spot colors and this artwork uses {count}. \
                 Convert some spot colors to process colors, then flatten again."
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FlattenError::EmptyArtSet => HumanError {
            message: "There is nothing to flatten.".into(),
            suggestion: "Select the artwork you want to flatten, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FlattenError::InvalidBalance { value } => HumanError {
            message: "The raster/vector balance setting is out of range.".into(),
            suggestion: format!("The balance must be between 0 and 100 (it is {value})."),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FlattenError::ResolutionOutOfRange { value, min, max } => HumanError {
            message: "The flattening resolution is out of range.".into(),
            suggestion: format!(
                "Resolutions must be between {min} and {max} dpi (it is {value} dpi). \
                 Adjust the setting, then flatten again."
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FlattenError::InvalidProgressRange { .. } => HumanError {
            message: "The progress settings are inconsistent.".into(),
            suggestion: "The progress range start must not exceed its end.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        // -- Handle liveness / lifecycle --
        FlattenError::ArtMissing => HumanError {
            message: "Some of the selected artwork no longer exists.".into(),
            suggestion: "The selection is out of date. Re-select the artwork, then try again."
                .into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FlattenError::AnchorNotContainer => HumanError {
            message: "Flattened output can't be placed inside that object.".into(),
            suggestion: "Choose a group or layer as the destination, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FlattenError::LayerMissing => HumanError {
            message: "That layer no longer exists.".into(),
            suggestion: "The layer may have been deleted. Pick a layer from the current list."
                .into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        FlattenError::NoTemporaryLayer => HumanError {
            message: "There is no temporary flattening layer to remove.".into(),
            suggestion: "It may already have been removed. No action is needed.".into(),
            retriable: false,
            severity: Severity::Informational,
        },

        // -- Operational --
        FlattenError::Backend(detail) => HumanError {
            message: "Flattening did not complete.".into(),
            suggestion: format!(
                "Try again with a lower resolution or a lower raster/vector balance. \
                 ({detail})"
            ),
            retriable: true,
            severity: Severity::Transient,
        },

        FlattenError::Cancelled => HumanError {
            message: "Flattening was cancelled.".into(),
            suggestion: "No changes were kept.".into(),
            retriable: false,
            severity: Severity::Informational,
        },

        FlattenError::Receiver(detail) => HumanError {
            message: "Collecting flattening information was interrupted.".into(),
            suggestion: format!("The information consumer reported a problem. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        },

        // -- Storage --
        FlattenError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The settings file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Default settings will be used."
                        .into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, check the available disk space."
                        .into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        FlattenError::Serialization(_) => HumanError {
            message: "The flattening settings file is damaged.".into(),
            suggestion: "Delete the settings file to restore the defaults, then try again.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}
