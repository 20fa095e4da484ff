use std::path::{Path, PathBuf};

use super::{DatasetTrait, TimestampTable};
use crate::calib::{self, CalibValue, CalibrationRecord};
use crate::camera::{intrinsic_key, PinholeCamera, PinholeParameters};
use crate::config::{DatasetConfig, SequenceOptions};
use crate::decoder::{ColorMode, DefaultDecoder, ImageDecoder, ImageSize, PixelArray};
use crate::error::{KittiError, Result};

/// One camera stream of a KITTI raw drive, e.g. `2011_09_26_drive_0018_extract/image_02`.
///
/// Calibration, timestamps and the image list are read once in the constructor. Pixels are
/// decoded on every [`KittiSequence::get`]; nothing is cached.
#[derive(Debug)]
pub struct KittiSequence<D = DefaultDecoder> {
    image_dir: PathBuf,
    sequence_id: u32,
    calibration: CalibrationRecord,
    camera_key: String,
    camera_matrix: CalibValue,
    /// sorted by full path string
    image_paths: Vec<PathBuf>,
    timestamps: TimestampTable,
    grayscale: bool,
    decoder: D,
}

/// A decoded image and its timestamp row.
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: usize,
    pub path: PathBuf,
    /// `None` only when timestamp validation is off and the table is shorter.
    pub timestamp: Option<String>,
    pub image: PixelArray,
}

impl KittiSequence {
    pub fn new(
        image_dir: impl AsRef<Path>,
        calib_path: impl AsRef<Path>,
        timestamps_path: impl AsRef<Path>,
        grayscale: bool,
    ) -> Result<Self> {
        Self::with_options(
            image_dir,
            calib_path,
            timestamps_path,
            grayscale,
            SequenceOptions::default(),
        )
    }

    pub fn with_options(
        image_dir: impl AsRef<Path>,
        calib_path: impl AsRef<Path>,
        timestamps_path: impl AsRef<Path>,
        grayscale: bool,
        options: SequenceOptions,
    ) -> Result<Self> {
        KittiSequence::with_decoder(
            image_dir,
            calib_path,
            timestamps_path,
            grayscale,
            options,
            DefaultDecoder::default(),
        )
    }

    pub fn from_config(config: &DatasetConfig) -> Result<Self> {
        Self::with_options(
            &config.image_dir,
            &config.calib_path,
            &config.timestamps_path,
            config.grayscale,
            config.options.clone(),
        )
    }
}

impl<D: ImageDecoder> KittiSequence<D> {
    pub fn with_decoder(
        image_dir: impl AsRef<Path>,
        calib_path: impl AsRef<Path>,
        timestamps_path: impl AsRef<Path>,
        grayscale: bool,
        options: SequenceOptions,
        decoder: D,
    ) -> Result<Self> {
        let image_dir = image_dir.as_ref();
        if !image_dir.exists() {
            return Err(KittiError::PathNotFound {
                path: image_dir.to_path_buf(),
            });
        }

        let calibration = calib::parse_with(calib_path.as_ref(), &options.calib)?;
        let sequence_id = sequence_id_from_dir(image_dir)?;
        let camera_key = intrinsic_key(sequence_id)?;
        let camera_matrix = calibration.require(&camera_key)?.clone();
        let timestamps = TimestampTable::read(timestamps_path.as_ref())?;

        let image_paths = discover_images(image_dir, &options.image_extension)?;
        if options.validate_filenames {
            check_filenames(&image_paths)?;
        }
        if options.validate_timestamps && image_paths.len() != timestamps.len() {
            return Err(KittiError::TimestampCountMismatch {
                images: image_paths.len(),
                timestamps: timestamps.len(),
            });
        }

        log::info!(
            "loaded sequence {} from {}: {} images, {} timestamps, decoder {}",
            sequence_id,
            image_dir.display(),
            image_paths.len(),
            timestamps.len(),
            decoder.name()
        );

        Ok(Self {
            image_dir: image_dir.to_path_buf(),
            sequence_id,
            calibration,
            camera_key,
            camera_matrix,
            image_paths,
            timestamps,
            grayscale,
            decoder,
        })
    }

    pub fn len(&self) -> usize {
        self.image_paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image_paths.is_empty()
    }

    /// Decodes frame `index` from disk. Single channel when the sequence is grayscale.
    pub fn get(&self, index: usize) -> Result<PixelArray> {
        let path = self.image_path(index)?;
        self.decoder
            .decode(path, ColorMode::from_grayscale(self.grayscale))
    }

    pub fn frame(&self, index: usize) -> Result<Frame> {
        let image = self.get(index)?;
        Ok(Frame {
            index,
            path: self.image_paths[index].clone(),
            timestamp: self.timestamps.get(index).map(str::to_string),
            image,
        })
    }

    pub fn frames(&self) -> Frames<'_, D> {
        Frames {
            sequence: self,
            current: 0,
        }
    }

    pub fn image_path(&self, index: usize) -> Result<&Path> {
        self.image_paths
            .get(index)
            .map(PathBuf::as_path)
            .ok_or(KittiError::IndexOutOfRange {
                index,
                len: self.len(),
            })
    }

    /// `(fx, fy, cx, cy)` of the `K_0<id>:` matrix.
    pub fn intrinsics(&self) -> Result<PinholeParameters> {
        PinholeParameters::from_camera_matrix(&self.camera_key, &self.camera_matrix)
    }

    pub fn camera(&self) -> Result<PinholeCamera> {
        PinholeCamera::from_calibration(&self.calibration, self.sequence_id)
    }

    /// Width and height of the first image.
    pub fn frame_dimensions(&self) -> Result<ImageSize> {
        let first = self.image_paths.first().ok_or(KittiError::EmptySequence)?;
        self.decoder.dimensions(first)
    }

    pub fn timestamps(&self) -> &TimestampTable {
        &self.timestamps
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    pub fn sequence_id(&self) -> u32 {
        self.sequence_id
    }

    pub fn calibration(&self) -> &CalibrationRecord {
        &self.calibration
    }

    pub fn camera_key(&self) -> &str {
        &self.camera_key
    }

    pub fn camera_matrix(&self) -> &CalibValue {
        &self.camera_matrix
    }

    pub fn image_paths(&self) -> &[PathBuf] {
        &self.image_paths
    }

    pub fn grayscale(&self) -> bool {
        self.grayscale
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }
}

impl<D: ImageDecoder> DatasetTrait for KittiSequence<D> {
    type Item = PixelArray;

    fn len(&self) -> usize {
        KittiSequence::len(self)
    }

    fn get(&self, index: usize) -> Result<PixelArray> {
        KittiSequence::get(self, index)
    }

    fn timestamps(&self) -> &TimestampTable {
        KittiSequence::timestamps(self)
    }
}

/// Lazy iterator over [`Frame`]s, decoding one image per step.
pub struct Frames<'a, D> {
    sequence: &'a KittiSequence<D>,
    current: usize,
}

impl<D: ImageDecoder> Iterator for Frames<'_, D> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.sequence.len() {
            return None;
        }
        let frame = self.sequence.frame(self.current);
        self.current += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.sequence.len().saturating_sub(self.current);
        (remaining, Some(remaining))
    }
}

/// `.../image_02` -> 2: last `_`-separated token of the final path segment.
fn sequence_id_from_dir(image_dir: &Path) -> Result<u32> {
    let segment = image_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| KittiError::SequenceIdFormat {
            segment: image_dir.display().to_string(),
        })?;
    let token = segment.rsplit('_').next().unwrap_or_default();
    token
        .parse::<u32>()
        .map_err(|_| KittiError::SequenceIdFormat { segment: segment.clone() })
}

/// Every file ending in `.<extension>` below `root`, sorted lexicographically by path string.
fn discover_images(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = std::fs::read_dir(&dir).map_err(|e| KittiError::io(&dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| KittiError::io(&dir, e))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| KittiError::io(&path, e))?;
            if file_type.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == extension) && path.is_file() {
                found.push(path);
            }
        }
    }

    found.sort_by_cached_key(|p| p.to_string_lossy().into_owned());
    log::debug!("found {} .{} files under {}", found.len(), extension, root.display());
    Ok(found)
}

/// Lexicographic order is frame order only for zero-padded names of one width.
fn check_filenames(paths: &[PathBuf]) -> Result<()> {
    let mut width = None;
    for path in paths {
        let bad = |message: String| KittiError::FilenameFormat {
            path: path.clone(),
            message,
        };
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad("file name is not a frame number".to_string()));
        }
        match width {
            None => width = Some(stem.len()),
            Some(w) if w != stem.len() => {
                return Err(bad(format!("expected {w} digits, found {}", stem.len())));
            }
            Some(_) => {}
        }
    }
    Ok(())
}
