//! Quantized color histogram appearance model.
//!
//! Each channel is quantized into [`BINS_PER_CHANNEL`] equal-width bins and the
//! joint histogram over a cropped box is flattened into a vector of
//! [`DESCRIPTOR_LEN`] entries. Flattening is channel-major: the bin for a pixel
//! `(c0, c1, c2)` sits at `(c0 / 16) * 256 + (c1 / 16) * 16 + c2 / 16`.

use nalgebra::DVector;

use crate::{Frame, State};

/// Number of quantization bins per color channel.
pub const BINS_PER_CHANNEL: usize = 16;

/// Width of one bin in intensity units (256 / 16).
pub const BIN_WIDTH: u8 = 16;

/// Length of a flattened descriptor (16 x 16 x 16).
pub const DESCRIPTOR_LEN: usize = BINS_PER_CHANNEL * BINS_PER_CHANNEL * BINS_PER_CHANNEL;

/// Normalized appearance descriptor.
///
/// Sums to 1 for a non-empty crop; all zeros for an empty crop.
pub type Descriptor = DVector<f64>;

/// Flattened bin index for one pixel.
#[inline]
pub fn bin_index(pixel: [u8; 3]) -> usize {
    let c0 = (pixel[0] / BIN_WIDTH) as usize;
    let c1 = (pixel[1] / BIN_WIDTH) as usize;
    let c2 = (pixel[2] / BIN_WIDTH) as usize;
    (c0 * BINS_PER_CHANNEL + c1) * BINS_PER_CHANNEL + c2
}

/// Compute the normalized color histogram of the box described by `state`.
///
/// The box is floored to integer pixels and cropped to rows
/// `[y - half_height, y + half_height)` and columns `[x - half_width, x + half_width)`,
/// clamped to the frame. Boxes that fall entirely outside the frame (or have
/// non-positive extents) produce the all-zero descriptor.
pub fn compute_descriptor(frame: &Frame, state: &State) -> Descriptor {
    let mut hist = DVector::zeros(DESCRIPTOR_LEN);
    let pixel_box = state.pixel_box();

    let (rows, cols) = match (pixel_box.row_span(frame.height()), pixel_box.col_span(frame.width())) {
        (Some(rows), Some(cols)) => (rows, cols),
        _ => return hist,
    };

    let mut count = 0usize;
    for y in rows.0..rows.1 {
        for x in cols.0..cols.1 {
            hist[bin_index(frame.pixel(x, y))] += 1.0;
            count += 1;
        }
    }

    if count > 0 {
        hist /= count as f64;
    }
    hist
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bin_index_ordering() {
        assert_eq!(bin_index([0, 0, 0]), 0);
        assert_eq!(bin_index([0, 0, 16]), 1);
        assert_eq!(bin_index([0, 16, 0]), 16);
        assert_eq!(bin_index([16, 0, 0]), 256);
        assert_eq!(bin_index([255, 255, 255]), DESCRIPTOR_LEN - 1);
        assert_eq!(bin_index([15, 31, 47]), 16 + 2);
    }

    #[test]
    fn test_single_color_crop() {
        let frame = Frame::filled(50, 50, [200, 100, 30]);
        let state = State::new(25.0, 25.0, 5.0, 5.0, 0.0, 0.0);

        let hist = compute_descriptor(&frame, &state);
        assert_eq!(hist.len(), DESCRIPTOR_LEN);
        assert_relative_eq!(hist.sum(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(hist[bin_index([200, 100, 30])], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_two_color_split() {
        // Left half of the box is red, right half is blue.
        let mut frame = Frame::filled(40, 40, [0, 0, 255]);
        frame.fill_rect(0, 0, 20, 40, [255, 0, 0]);
        let state = State::new(20.0, 20.0, 4.0, 4.0, 0.0, 0.0);

        let hist = compute_descriptor(&frame, &state);
        assert_relative_eq!(hist[bin_index([255, 0, 0])], 0.5, epsilon = 1e-12);
        assert_relative_eq!(hist[bin_index([0, 0, 255])], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_partially_outside_box_is_clamped() {
        let frame = Frame::filled(20, 20, [10, 10, 10]);
        let state = State::new(0.0, 0.0, 5.0, 5.0, 0.0, 0.0);

        let hist = compute_descriptor(&frame, &state);
        assert_relative_eq!(hist.sum(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_box_outside_frame_is_zero() {
        let frame = Frame::filled(20, 20, [10, 10, 10]);

        for state in [
            State::new(-30.0, 10.0, 5.0, 5.0, 0.0, 0.0),
            State::new(10.0, 100.0, 5.0, 5.0, 0.0, 0.0),
            State::new(10.0, 10.0, -2.0, 5.0, 0.0, 0.0),
            State::new(10.0, 10.0, 0.0, 0.0, 0.0, 0.0),
        ] {
            let hist = compute_descriptor(&frame, &state);
            assert_eq!(hist.len(), DESCRIPTOR_LEN);
            assert_eq!(hist.sum(), 0.0);
        }
    }

    #[test]
    fn test_fractional_state_is_floored() {
        let mut frame = Frame::filled(20, 20, [0, 0, 0]);
        // Column 11 is white; the floored columns [7, 11) must not include it.
        frame.fill_rect(11, 0, 12, 20, [255, 255, 255]);
        let state = State::new(9.9, 10.0, 2.9, 2.0, 0.0, 0.0);

        let hist = compute_descriptor(&frame, &state);
        assert_relative_eq!(hist[0], 1.0, epsilon = 1e-12);
    }
}
