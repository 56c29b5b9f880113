// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Progress reporting and cooperative cancellation.
//
// The flattener blocks its caller, so progress reporting doubles as the
// cancellation point: each report gives the sink a chance to request an
// abort, which surfaces as `FlattenError::Cancelled` and triggers the same
// rollback policy as an operational failure.

use flachwerk_core::error::{FlattenError, Result};
use flachwerk_core::options::{FlatteningOptions, ProgressRange};

/// Receiver for progress reports during a flattening operation.
pub trait ProgressSink {
    /// Report overall progress.  `fraction` is within the progress range
    /// configured in the flattening options.  Return `false` to request
    /// cancellation of the operation.
    fn report(&mut self, fraction: f64) -> bool;
}

/// Sink that ignores progress and never cancels.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&mut self, _fraction: f64) -> bool {
        true
    }
}

/// Maps operation-relative progress in [0,1] into the options' progress
/// range and forwards it to the caller's sink.  Inert unless the options
/// request progress reporting.
pub struct ScaledProgress<'a> {
    sink: &'a mut dyn ProgressSink,
    range: ProgressRange,
    enabled: bool,
}

impl<'a> ScaledProgress<'a> {
    pub fn new(sink: &'a mut dyn ProgressSink, options: &FlatteningOptions) -> Self {
        Self {
            sink,
            range: options.progress,
            enabled: options.flags.show_progress,
        }
    }

    /// Report operation-relative progress; fails with `Cancelled` when the
    /// sink requests an abort.
    pub fn step(&mut self, fraction: f64) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let fraction = fraction.clamp(0.0, 1.0);
        let mapped = self.range.start + (self.range.end - self.range.start) * fraction;
        if self.sink.report(mapped) {
            Ok(())
        } else {
            Err(FlattenError::Cancelled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recording {
        seen: Vec<f64>,
    }

    impl ProgressSink for Recording {
        fn report(&mut self, fraction: f64) -> bool {
            self.seen.push(fraction);
            true
        }
    }

    #[test]
    fn disabled_progress_reports_nothing() {
        let mut sink = Recording { seen: Vec::new() };
        let options = FlatteningOptions::default();
        let mut scaled = ScaledProgress::new(&mut sink, &options);
        scaled.step(0.5).expect("step");
        assert!(sink.seen.is_empty());
    }

    #[test]
    fn steps_are_mapped_into_the_configured_range() {
        let mut sink = Recording { seen: Vec::new() };
        let mut options = FlatteningOptions::default();
        options.flags.show_progress = true;
        options.progress = ProgressRange {
            start: 0.25,
            end: 0.75,
        };
        let mut scaled = ScaledProgress::new(&mut sink, &options);
        scaled.step(0.0).expect("step");
        scaled.step(0.5).expect("step");
        scaled.step(1.0).expect("step");
        assert_eq!(sink.seen, vec![0.25, 0.5, 0.75]);
    }

    struct CancelAfter {
        remaining: usize,
    }

    impl ProgressSink for CancelAfter {
        fn report(&mut self, _fraction: f64) -> bool {
            if self.remaining == 0 {
                return false;
            }
            self.remaining -= 1;
            true
        }
    }

    #[test]
    fn sink_refusal_becomes_cancelled() {
        let mut sink = CancelAfter { remaining: 1 };
        let mut options = FlatteningOptions::default();
        options.flags.show_progress = true;
        let mut scaled = ScaledProgress::new(&mut sink, &options);
        scaled.step(0.2).expect("first step accepted");
        assert!(matches!(
            scaled.step(0.4),
            Err(FlattenError::Cancelled)
        ));
    }
}
