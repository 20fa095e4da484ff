//! kitti-loader: load one camera stream of a KITTI raw drive and print what it holds.
//!
//! nalgebra
//! https://docs.rs/nalgebra/latest/nalgebra/
//!
//! ndarray
//! https://docs.rs/ndarray/latest/ndarray/all.html

// image path datasets/2011_09_26/2011_09_26_drive_0018_extract/image_02/data/ **
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use kitti_loader::calib::CalibParseOptions;
use kitti_loader::dataset::DefaultDataset;
use kitti_loader::{DatasetConfig, SequenceOptions};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect one camera stream of a KITTI raw drive")]
struct Args {
    /// JSON file describing the sequence; replaces the positional inputs.
    #[arg(long, env = "KITTI_CONFIG")]
    config: Option<PathBuf>,

    /// Camera directory, e.g. `.../2011_09_26_drive_0018_extract/image_02`.
    image_dir: Option<PathBuf>,

    /// `calib_cam_to_cam.txt`
    calib_path: Option<PathBuf>,

    /// `timestamps.txt` of the same camera.
    timestamps_path: Option<PathBuf>,

    /// Decode frames as single channel.
    #[arg(long)]
    grayscale: bool,

    /// Fail on the `calib_time:` line instead of skipping it.
    #[arg(long)]
    strict_calib: bool,

    /// Decode every frame and log its shape.
    #[arg(long)]
    walk: bool,

    /// Write the camera model (K, D, S) of the sequence as JSON.
    #[arg(long)]
    export_camera: Option<PathBuf>,
}

impl Args {
    fn dataset_config(&self) -> Result<DatasetConfig> {
        if let Some(path) = &self.config {
            return DatasetConfig::read_from_json(path);
        }
        let (Some(image_dir), Some(calib_path), Some(timestamps_path)) =
            (&self.image_dir, &self.calib_path, &self.timestamps_path)
        else {
            bail!("either --config or IMAGE_DIR CALIB_PATH TIMESTAMPS_PATH is required");
        };
        let calib = if self.strict_calib {
            CalibParseOptions::default()
        } else {
            CalibParseOptions::kitti_raw()
        };
        Ok(DatasetConfig {
            image_dir: image_dir.clone(),
            calib_path: calib_path.clone(),
            timestamps_path: timestamps_path.clone(),
            grayscale: self.grayscale,
            options: SequenceOptions {
                calib,
                ..SequenceOptions::default()
            },
        })
    }
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_nanos()
        .init();
    let args = Args::parse();

    let config = args.dataset_config()?;
    log::info!("image dir: {:?}", config.image_dir);
    let dataset = DefaultDataset::from_config(&config)
        .with_context(|| format!("load sequence {}", config.image_dir.display()))?;

    let k = dataset.intrinsics()?;
    log::info!(
        "sequence {} ({}): {} frames, fx={} fy={} cx={} cy={}",
        dataset.sequence_id(),
        dataset.camera_key(),
        dataset.len(),
        k.fx,
        k.fy,
        k.cx,
        k.cy
    );
    if !dataset.is_empty() {
        let size = dataset.frame_dimensions()?;
        log::info!("frame size: {}x{}", size.width, size.height);
    }
    let timestamps = dataset.timestamps();
    if let (Some(first), Some(last)) = (timestamps.get(0), timestamps.iter().last()) {
        log::info!("timestamps: {first} .. {last}");
        if let (Ok(t0), Ok(t1)) = (timestamps.parse_row(0), timestamps.parse_row(timestamps.len() - 1)) {
            log::info!("duration: {:.3}s", t1.duration_since(&t0));
        }
    }

    if let Some(path) = &args.export_camera {
        dataset.camera()?.write_to_json(path)?;
        log::info!("camera written to {}", path.display());
    }

    if args.walk {
        for frame in dataset.frames() {
            let frame = frame?;
            log::debug!(
                "frame {} {:?} {}",
                frame.index,
                frame.image.shape(),
                frame.timestamp.as_deref().unwrap_or("-")
            );
        }
        log::info!("decoded {} frames", dataset.len());
    }
    Ok(())
}
