//! Rendering of tracking estimates onto frames.
//!
//! Requires the `drawing` feature.

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::pipeline::{FrameReport, ReportSink};
use crate::tracker::Estimate;
use crate::{Error, Frame, Result};

/// Color of the weighted-mean box.
pub const MEAN_COLOR: Rgb<u8> = Rgb([0, 200, 0]);

/// Color of the MAP box.
pub const MAP_COLOR: Rgb<u8> = Rgb([220, 0, 0]);

/// Rectangle covering the same pixels the histogram model crops for `estimate`.
///
/// Returns `None` for boxes with no positive extent.
pub fn estimate_rect(estimate: &Estimate) -> Option<Rect> {
    let left = (estimate.x - estimate.half_width).floor();
    let top = (estimate.y - estimate.half_height).floor();
    let width = (2.0 * estimate.half_width).floor();
    let height = (2.0 * estimate.half_height).floor();
    if !(width >= 1.0 && height >= 1.0) || !left.is_finite() || !top.is_finite() {
        return None;
    }
    Some(Rect::at(left as i32, top as i32).of_size(width as u32, height as u32))
}

/// Draw `estimate` onto `image` with a one-pixel frame (two pixels thick
/// when `thick` is set).
pub fn draw_estimate(image: &mut RgbImage, estimate: &Estimate, color: Rgb<u8>, thick: bool) {
    if let Some(rect) = estimate_rect(estimate) {
        draw_hollow_rect_mut(image, rect, color);
        if thick && rect.width() > 2 && rect.height() > 2 {
            let inner = Rect::at(rect.left() + 1, rect.top() + 1).of_size(rect.width() - 2, rect.height() - 2);
            draw_hollow_rect_mut(image, inner, color);
        }
    }
}

/// Copy of `frame` with the weighted-mean box in green and the MAP box in red.
pub fn draw_estimates(frame: &Frame, mean: &Estimate, map: &Estimate) -> RgbImage {
    let mut canvas = frame.as_image().clone();
    draw_estimate(&mut canvas, mean, MEAN_COLOR, true);
    draw_estimate(&mut canvas, map, MAP_COLOR, true);
    canvas
}

/// Report sink that saves an annotated PNG for every reported frame.
///
/// Files are named `<prefix>-<frame_index>.png`.
#[derive(Clone, Debug)]
pub struct PngReportSink {
    output_dir: PathBuf,
    prefix: String,
}

impl PngReportSink {
    /// Create the sink, creating `output_dir` if needed.
    pub fn new<P: AsRef<Path>>(output_dir: P, prefix: impl Into<String>) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir).map_err(|e| {
            Error::IoError(std::io::Error::new(
                e.kind(),
                format!("failed to create output folder '{}': {}", output_dir.display(), e),
            ))
        })?;
        Ok(Self {
            output_dir,
            prefix: prefix.into(),
        })
    }

    pub fn path_for(&self, frame_index: usize) -> PathBuf {
        self.output_dir.join(format!("{}-{}.png", self.prefix, frame_index))
    }
}

impl ReportSink for PngReportSink {
    fn report(&mut self, report: &FrameReport<'_>) -> Result<()> {
        let canvas = draw_estimates(report.frame, &report.mean, &report.map);
        let path = self.path_for(report.frame_index);
        canvas.save(&path)?;
        log::debug!("saved report frame {} to {}", report.frame_index, path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Population, State};
    use nalgebra::DVector;
    use tempfile::TempDir;

    #[test]
    fn test_estimate_rect_matches_crop() {
        let estimate = Estimate { x: 25.0, y: 20.0, half_width: 5.0, half_height: 3.0 };
        let rect = estimate_rect(&estimate).unwrap();
        assert_eq!((rect.left(), rect.top()), (20, 17));
        assert_eq!((rect.width(), rect.height()), (10, 6));
    }

    #[test]
    fn test_degenerate_estimate_has_no_rect() {
        let estimate = Estimate { x: 25.0, y: 20.0, half_width: -1.0, half_height: 3.0 };
        assert!(estimate_rect(&estimate).is_none());
    }

    #[test]
    fn test_draw_estimates_outlines_box() {
        let frame = Frame::filled(50, 50, [0, 0, 0]);
        let mean = Estimate { x: 25.0, y: 25.0, half_width: 5.0, half_height: 5.0 };
        let map = Estimate { x: 10.0, y: 10.0, half_width: 3.0, half_height: 3.0 };

        let canvas = draw_estimates(&frame, &mean, &map);
        assert_eq!(*canvas.get_pixel(20, 25), MEAN_COLOR);
        assert_eq!(*canvas.get_pixel(7, 7), MAP_COLOR);
        assert_eq!(*canvas.get_pixel(25, 25), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_png_sink_writes_file() {
        let dir = TempDir::new().unwrap();
        let mut sink = PngReportSink::new(dir.path().join("out"), "run").unwrap();

        let frame = Frame::filled(30, 30, [50, 50, 50]);
        let population = Population::replicate(&State::new(15.0, 15.0, 4.0, 4.0, 0.0, 0.0), 3);
        let weights = DVector::from_element(3, 1.0 / 3.0);
        let estimate = Estimate { x: 15.0, y: 15.0, half_width: 4.0, half_height: 4.0 };
        let report = FrameReport {
            frame_index: 10,
            frame: &frame,
            population: &population,
            weights: &weights,
            mean: estimate,
            map: estimate,
        };

        sink.report(&report).unwrap();
        assert!(sink.path_for(10).exists());
    }
}
