//! Track a target through a directory of image frames.
//!
//! Usage:
//!     cargo run --release --features drawing --example track_directory -- <frames_dir> [output_dir] [config.json]
//!
//! Example:
//!     RUST_LOG=info cargo run --release --features drawing --example track_directory -- Images results

use std::env;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use pftrack_rs::drawing::PngReportSink;
use pftrack_rs::{run_tracking, ImageDirectorySource, State, TrackerConfig};

// Initial box on the first frame of the reference sequence.
const INITIAL_STATE: [f64; 6] = [297.0, 139.0, 16.0, 43.0, 0.0, 0.0];

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let frames_dir = match args.get(1) {
        Some(dir) => PathBuf::from(dir),
        None => {
            eprintln!("usage: {} <frames_dir> [output_dir] [config.json]", args[0]);
            process::exit(2);
        }
    };
    let output_dir = args.get(2).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("results"));

    if let Err(e) = run(frames_dir, output_dir, args.get(3).map(PathBuf::from)) {
        log::error!("tracking failed: {}", e);
        process::exit(1);
    }
}

fn run(frames_dir: PathBuf, output_dir: PathBuf, config_path: Option<PathBuf>) -> pftrack_rs::Result<()> {
    let config = match config_path {
        Some(path) => TrackerConfig::from_json_file(path)?,
        None => TrackerConfig::default(),
    };

    let mut source = ImageDirectorySource::open(&frames_dir)?;
    let total = source.remaining();
    let mut sink = PngReportSink::new(&output_dir, "pftrack")?;

    let start = Instant::now();
    let results = run_tracking(config, State::from_array(INITIAL_STATE), &mut source, &mut sink)?;
    let elapsed = start.elapsed().as_secs_f64();

    results.save_json(&output_dir)?;
    println!(
        "Processed {} frames in {:.2}s ({:.1} fps), {} reported",
        total,
        elapsed,
        total as f64 / elapsed.max(1e-9),
        results.len()
    );
    Ok(())
}
