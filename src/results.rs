//! Per-frame estimate tables accumulated over a run.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::tracker::Estimate;
use crate::{Error, Result};

/// File name of the weighted-mean table.
pub const MEAN_STATES_FILE: &str = "frame_index_to_avg_state.json";

/// File name of the MAP table.
pub const MAP_STATES_FILE: &str = "frame_index_to_max_state.json";

/// Two index-keyed tables: frame index -> `[x, y, half_width, half_height]`
/// for the weighted mean and for the MAP particle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingResults {
    pub mean_states: BTreeMap<usize, [f64; 4]>,
    pub map_states: BTreeMap<usize, [f64; 4]>,
}

impl TrackingResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record both estimates for `frame_index`, replacing any earlier entry.
    pub fn record(&mut self, frame_index: usize, mean: &Estimate, map: &Estimate) {
        self.mean_states.insert(frame_index, mean.to_array());
        self.map_states.insert(frame_index, map.to_array());
    }

    pub fn len(&self) -> usize {
        self.mean_states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean_states.is_empty()
    }

    /// Write both tables as pretty-printed JSON into `dir` (created if missing).
    pub fn save_json<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| {
            Error::IoError(std::io::Error::new(
                e.kind(),
                format!("failed to create results folder '{}': {}", dir.display(), e),
            ))
        })?;

        write_table(&dir.join(MEAN_STATES_FILE), &self.mean_states)?;
        write_table(&dir.join(MAP_STATES_FILE), &self.map_states)?;
        log::info!("saved {} reported frames to {}", self.len(), dir.display());
        Ok(())
    }

    /// Read tables previously written by [`TrackingResults::save_json`].
    pub fn load_json<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        Ok(Self {
            mean_states: read_table(&dir.join(MEAN_STATES_FILE))?,
            map_states: read_table(&dir.join(MAP_STATES_FILE))?,
        })
    }
}

fn write_table(path: &Path, table: &BTreeMap<usize, [f64; 4]>) -> Result<()> {
    let file = File::create(path).map_err(|e| {
        Error::IoError(std::io::Error::new(
            e.kind(),
            format!("failed to create output file '{}': {}", path.display(), e),
        ))
    })?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, table)?;
    writer.flush().map_err(Error::IoError)
}

fn read_table(path: &Path) -> Result<BTreeMap<usize, [f64; 4]>> {
    let file = File::open(path).map_err(|e| {
        Error::IoError(std::io::Error::new(
            e.kind(),
            format!("failed to open results file '{}': {}", path.display(), e),
        ))
    })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
