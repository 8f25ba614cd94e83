//! Frame sources feeding the tracking loop.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Frame, Result};

/// Supplies frames one at a time, in order.
///
/// `None` marks the end of the sequence; `Some(Err(..))` is a fatal read or
/// decode failure.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<Result<Frame>>;
}

/// Frames decoded lazily from the image files of a directory, in filename order.
pub struct ImageDirectorySource {
    paths: VecDeque<PathBuf>,
}

impl ImageDirectorySource {
    /// List the regular files of `dir` and sort them by filename.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|e| {
            Error::IoError(std::io::Error::new(
                e.kind(),
                format!("failed to open frame directory '{}': {}", dir.display(), e),
            ))
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(Error::IoError)?;
            if entry.file_type().map_err(Error::IoError)?.is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        log::info!("found {} frames in {}", paths.len(), dir.display());
        Ok(Self { paths: paths.into() })
    }

    /// Number of frames not yet read.
    pub fn remaining(&self) -> usize {
        self.paths.len()
    }

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter()
    }
}

impl FrameSource for ImageDirectorySource {
    fn next_frame(&mut self) -> Option<Result<Frame>> {
        let path = self.paths.pop_front()?;
        let frame = image::open(&path)
            .map(|img| Frame::from_rgb_image(img.to_rgb8()))
            .map_err(|e| {
                log::error!("failed to decode frame {}: {}", path.display(), e);
                Error::Image(e)
            });
        Some(frame)
    }
}

impl Iterator for ImageDirectorySource {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame()
    }
}

/// In-memory frame sequence.
#[derive(Clone, Debug, Default)]
pub struct VecFrameSource {
    frames: VecDeque<Frame>,
}

impl VecFrameSource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames: frames.into() }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for VecFrameSource {
    fn next_frame(&mut self) -> Option<Result<Frame>> {
        self.frames.pop_front().map(Ok)
    }
}

impl Iterator for VecFrameSource {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, color: [u8; 3]) {
        RgbImage::from_pixel(4, 3, Rgb(color))
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn test_directory_frames_in_filename_order() {
        let dir = TempDir::new().unwrap();
        write_png(dir.path(), "010.png", [3, 3, 3]);
        write_png(dir.path(), "001.png", [1, 1, 1]);
        write_png(dir.path(), "002.png", [2, 2, 2]);
        fs::create_dir(dir.path().join("subdir")).unwrap();

        let mut source = ImageDirectorySource::open(dir.path()).unwrap();
        assert_eq!(source.remaining(), 3);

        let colors: Vec<u8> = std::iter::from_fn(|| source.next_frame())
            .map(|frame| frame.unwrap().pixel(0, 0)[0])
            .collect();
        assert_eq!(colors, vec![1, 2, 3]);
        assert!(source.next_frame().is_none());
    }

    #[test]
    fn test_corrupt_frame_is_error() {
        let dir = TempDir::new().unwrap();
        write_png(dir.path(), "001.png", [1, 1, 1]);
        fs::write(dir.path().join("002.png"), b"not an image").unwrap();

        let mut source = ImageDirectorySource::open(dir.path()).unwrap();
        assert!(source.next_frame().unwrap().is_ok());
        assert!(source.next_frame().unwrap().is_err());
    }

    #[test]
    fn test_missing_directory() {
        assert!(ImageDirectorySource::open("/nonexistent/pftrack/frames").is_err());
    }

    #[test]
    fn test_vec_source() {
        let mut source = VecFrameSource::new(vec![
            Frame::filled(2, 2, [0, 0, 0]),
            Frame::filled(2, 2, [9, 9, 9]),
        ]);
        assert_eq!(source.len(), 2);
        assert_eq!(source.next().unwrap().unwrap().pixel(1, 1), [0, 0, 0]);
        assert_eq!(source.next().unwrap().unwrap().pixel(1, 1), [9, 9, 9]);
        assert!(source.next().is_none());
    }
}
