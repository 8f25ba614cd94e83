//! Tracking loop over a frame source with periodic reporting.
//!
//! The estimation cycle in [`ParticleTracker`] stays free of any rendering or
//! file-system concern; this module pulls frames, drives the cycle and hands
//! every `report_every`-th frame to a [`ReportSink`].

use nalgebra::DVector;

use crate::tracker::Estimate;
use crate::{Error, Frame, FrameSource, ParticleTracker, Population, Result, State, TrackerConfig, TrackingResults};

/// Everything a sink gets for one reported frame.
#[derive(Debug)]
pub struct FrameReport<'a> {
    /// 1-based frame index (the bootstrap frame is 1).
    pub frame_index: usize,
    pub frame: &'a Frame,
    pub population: &'a Population,
    pub weights: &'a DVector<f64>,
    pub mean: Estimate,
    pub map: Estimate,
}

/// Receives reported frames, e.g. to render or log them.
pub trait ReportSink {
    fn report(&mut self, report: &FrameReport<'_>) -> Result<()>;
}

impl<F> ReportSink for F
where
    F: FnMut(&FrameReport<'_>) -> Result<()>,
{
    fn report(&mut self, report: &FrameReport<'_>) -> Result<()> {
        self(report)
    }
}

/// Sink that discards every report.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl ReportSink for NoopSink {
    fn report(&mut self, _report: &FrameReport<'_>) -> Result<()> {
        Ok(())
    }
}

/// Track the target through every frame of `source`.
///
/// The first frame bootstraps the tracker from `initial_state`; each later
/// frame runs one steady cycle. Frames whose index is a multiple of
/// `config.report_every` are passed to `sink` and recorded in the returned
/// tables.
///
/// # Errors
/// * [`Error::EmptySequence`] if the source yields no frame at all
/// * Any error from the source, the tracker or the sink, which ends the run
pub fn run_tracking<S, R>(
    config: TrackerConfig,
    initial_state: State,
    source: &mut S,
    sink: &mut R,
) -> Result<TrackingResults>
where
    S: FrameSource + ?Sized,
    R: ReportSink + ?Sized,
{
    let first = source.next_frame().ok_or(Error::EmptySequence)??;
    let mut tracker = ParticleTracker::bootstrap(config, &first, initial_state)?;
    let mut results = TrackingResults::new();

    report_if_due(&tracker, &first, &mut results, sink)?;

    while let Some(frame) = source.next_frame() {
        let frame = frame?;
        tracker.step(&frame)?;
        report_if_due(&tracker, &frame, &mut results, sink)?;
    }

    log::info!(
        "tracking finished after {} frames, {} reported",
        tracker.frame_index(),
        results.len()
    );
    Ok(results)
}

fn report_if_due<R: ReportSink + ?Sized>(
    tracker: &ParticleTracker,
    frame: &Frame,
    results: &mut TrackingResults,
    sink: &mut R,
) -> Result<()> {
    let frame_index = tracker.frame_index();
    if frame_index % tracker.config().report_every != 0 {
        return Ok(());
    }

    let report = FrameReport {
        frame_index,
        frame,
        population: tracker.population(),
        weights: tracker.weights(),
        mean: tracker.mean_estimate()?,
        map: tracker.map_estimate(),
    };
    sink.report(&report)?;
    results.record(frame_index, &report.mean, &report.map);
    Ok(())
}
