use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{Rgb, RgbImage};
use kitti_loader::decoder::ImageRsDecoder;
use kitti_loader::{
    ColorMode, DatasetConfig, DatasetTrait, ImageDecoder, ImageSize, KittiError, KittiSequence,
    PixelArray, SequenceOptions,
};
use tempfile::TempDir;

const CALIB: &str = "\
K_00: 9.842439e+02 0.000000e+00 6.900000e+02 0.000000e+00 9.808141e+02 2.331966e+02 0.000000e+00 0.000000e+00 1.000000e+00
D_00: -3.728755e-01 2.037299e-01 2.219027e-03 1.383707e-03 -7.233722e-02
K_02: 1 0 2 0 1 3 0 0 1
S_02: 6 4
P_rect_02: 7.215377e+02 0.000000e+00 6.095593e+02 4.485728e+01 0.000000e+00 7.215377e+02 1.728540e+02 2.163791e-01 0.000000e+00 0.000000e+00 1.000000e+00 2.745884e-03
";

const TIMESTAMPS: [&str; 3] = [
    "2011-09-26 13:02:25.964389445",
    "2011-09-26 13:02:26.067700456",
    "2011-09-26 13:02:26.171011032",
];

struct Drive {
    _root: TempDir,
    image_dir: PathBuf,
    calib_path: PathBuf,
    timestamps_path: PathBuf,
}

impl Drive {
    /// `<root>/2011_09_26_drive_0018_extract/<camera>/data/%010d.png` with 6x4 RGB frames
    /// whose top-left pixel encodes the frame index.
    fn new(camera: &str, frames: usize, timestamps: usize, calib: &str) -> Self {
        let root = tempfile::tempdir().unwrap();
        let image_dir = root.path().join("2011_09_26_drive_0018_extract").join(camera);
        let data = image_dir.join("data");
        std::fs::create_dir_all(&data).unwrap();
        for i in 0..frames {
            let mut img = RgbImage::from_pixel(6, 4, Rgb([10, 20, 30]));
            img.put_pixel(0, 0, Rgb([i as u8, 0, 0]));
            img.save(data.join(format!("{i:010}.png"))).unwrap();
        }

        let timestamps_path = image_dir.join("timestamps.txt");
        let text: String = (0..timestamps)
            .map(|i| format!("{}\n", TIMESTAMPS[i % TIMESTAMPS.len()]))
            .collect();
        std::fs::write(&timestamps_path, text).unwrap();

        let calib_path = root.path().join("calib_cam_to_cam.txt");
        std::fs::write(&calib_path, calib).unwrap();

        Self {
            _root: root,
            image_dir,
            calib_path,
            timestamps_path,
        }
    }

    fn open(&self, grayscale: bool) -> kitti_loader::Result<KittiSequence> {
        KittiSequence::new(&self.image_dir, &self.calib_path, &self.timestamps_path, grayscale)
    }

    fn open_with(&self, options: SequenceOptions) -> kitti_loader::Result<KittiSequence> {
        KittiSequence::with_options(
            &self.image_dir,
            &self.calib_path,
            &self.timestamps_path,
            false,
            options,
        )
    }
}

#[test]
fn test_indexed_access() {
    let drive = Drive::new("image_02", 3, 3, CALIB);
    let seq = drive.open(false).unwrap();

    assert_eq!(seq.len(), 3);
    assert_eq!(seq.sequence_id(), 2);
    assert_eq!(seq.camera_key(), "K_02:");
    for i in 0..seq.len() {
        let img = seq.get(i).unwrap();
        assert_eq!(img.shape(), &[4, 6, 3]);
        assert_eq!(img[[0, 0, 0]], i as u8);
        assert_eq!(img[[3, 5, 2]], 30);
    }
    match seq.get(3) {
        Err(KittiError::IndexOutOfRange { index, len }) => assert_eq!((index, len), (3, 3)),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_grayscale_is_single_channel() {
    let drive = Drive::new("image_02", 3, 3, CALIB);
    let seq = drive.open(true).unwrap();
    assert!(seq.grayscale());
    for i in 0..seq.len() {
        let img = seq.get(i).unwrap();
        assert_eq!(img.ndim(), 2);
        assert_eq!(img.shape(), &[4, 6]);
    }
}

#[test]
fn test_intrinsics() {
    let drive = Drive::new("image_02", 1, 1, CALIB);
    let seq = drive.open(false).unwrap();
    let k = seq.intrinsics().unwrap();
    assert_eq!((k.fx, k.fy, k.cx, k.cy), (1.0, 1.0, 2.0, 3.0));

    let camera = seq.camera().unwrap();
    assert_eq!(camera.image_size, Some(ImageSize::new(6, 4)));
    assert_eq!(camera.distortion, None);
}

#[test]
fn test_frame_dimensions_are_width_then_height() {
    let drive = Drive::new("image_02", 2, 2, CALIB);
    let seq = drive.open(false).unwrap();
    let size = seq.frame_dimensions().unwrap();
    assert_eq!(size.width, 6);
    assert_eq!(size.height, 4);
}

#[test]
fn test_missing_intrinsic_key() {
    let drive = Drive::new("image_07", 1, 1, CALIB);
    match drive.open(false) {
        Err(KittiError::KeyNotFound { key }) => assert_eq!(key, "K_07:"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_missing_image_dir() {
    let drive = Drive::new("image_02", 1, 1, CALIB);
    let err = KittiSequence::new(
        drive.image_dir.with_file_name("image_03"),
        &drive.calib_path,
        &drive.timestamps_path,
        false,
    )
    .unwrap_err();
    assert!(matches!(err, KittiError::PathNotFound { .. }));
}

#[test]
fn test_directory_without_sequence_id() {
    let drive = Drive::new("image_left", 1, 1, CALIB);
    let err = drive.open(false).unwrap_err();
    assert!(matches!(err, KittiError::SequenceIdFormat { .. }));
}

#[test]
fn test_two_digit_sequence_id_rejected() {
    let drive = Drive::new("image_12", 1, 1, CALIB);
    let err = drive.open(false).unwrap_err();
    assert!(matches!(err, KittiError::UnsupportedSequenceId { id: 12 }));
}

#[test]
fn test_calibration_errors_propagate() {
    let drive = Drive::new("image_02", 1, 1, "K_02: 1 0 2 0 one 3 0 0 1\n");
    let err = drive.open(false).unwrap_err();
    assert!(matches!(err, KittiError::Parse { line: 1, .. }));

    let drive = Drive::new("image_02", 1, 1, CALIB);
    let err = KittiSequence::new(
        &drive.image_dir,
        drive.calib_path.with_file_name("calib_velo_to_cam.txt"),
        &drive.timestamps_path,
        false,
    )
    .unwrap_err();
    assert!(matches!(err, KittiError::Io { .. }));
}

#[test]
fn test_missing_timestamps_file_is_io_error() {
    let drive = Drive::new("image_02", 1, 1, CALIB);
    let missing = drive.timestamps_path.with_file_name("timestamps_missing.txt");
    let err = KittiSequence::new(&drive.image_dir, &drive.calib_path, &missing, false).unwrap_err();
    match err {
        KittiError::Io { path, source } => {
            assert_eq!(path, missing);
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_intrinsics_from_vector() {
    let drive = Drive::new("image_02", 1, 1, "K_02: 1 2 3 4\n");
    let seq = drive.open(false).unwrap();
    assert!(matches!(
        seq.intrinsics(),
        Err(KittiError::NotAMatrix { len: 4, .. })
    ));
}

#[test]
fn test_timestamp_count_mismatch() {
    let drive = Drive::new("image_02", 3, 2, CALIB);
    match drive.open(false) {
        Err(KittiError::TimestampCountMismatch { images, timestamps }) => {
            assert_eq!((images, timestamps), (3, 2))
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let seq = drive
        .open_with(SequenceOptions {
            validate_timestamps: false,
            ..SequenceOptions::default()
        })
        .unwrap();
    assert_eq!(seq.len(), 3);
    assert!(seq.frame(1).unwrap().timestamp.is_some());
    assert_eq!(seq.frame(2).unwrap().timestamp, None);
}

#[test]
fn test_unpadded_file_names() {
    let drive = Drive::new("image_02", 2, 3, CALIB);
    let img = RgbImage::new(6, 4);
    img.save(drive.image_dir.join("data").join("2.png")).unwrap();

    let err = drive.open(false).unwrap_err();
    assert!(matches!(err, KittiError::FilenameFormat { .. }));

    let seq = drive
        .open_with(SequenceOptions {
            validate_filenames: false,
            ..SequenceOptions::default()
        })
        .unwrap();
    assert_eq!(seq.len(), 3);
    // lexicographic: "0000000000.png" < "0000000001.png" < "2.png"
    assert!(seq.image_paths()[2].ends_with("data/2.png"));
}

#[test]
fn test_empty_sequence() {
    let drive = Drive::new("image_02", 0, 0, CALIB);
    let seq = drive.open(false).unwrap();
    assert!(seq.is_empty());
    assert!(matches!(seq.frame_dimensions(), Err(KittiError::EmptySequence)));
    assert!(matches!(seq.get(0), Err(KittiError::IndexOutOfRange { index: 0, len: 0 })));
    assert_eq!(seq.frames().count(), 0);
}

#[test]
fn test_frames_pair_images_with_timestamps() {
    let drive = Drive::new("image_02", 3, 3, CALIB);
    let seq = drive.open(true).unwrap();

    let frames: Vec<_> = seq.frames().collect::<Result<_, _>>().unwrap();
    assert_eq!(frames.len(), 3);
    for (i, frame) in frames.iter().enumerate() {
        assert_eq!(frame.index, i);
        assert_eq!(frame.timestamp.as_deref(), Some(TIMESTAMPS[i]));
        assert_eq!(frame.image.shape(), &[4, 6]);
    }

    let t0 = seq.timestamps().parse_row(0).unwrap();
    let t2 = seq.timestamps().parse_row(2).unwrap();
    assert!(t2 > t0);
}

fn count_frames<D: DatasetTrait>(dataset: &D) -> usize {
    (0..dataset.len()).filter(|i| dataset.get(*i).is_ok()).count()
}

#[test]
fn test_dataset_trait() {
    let drive = Drive::new("image_02", 2, 2, CALIB);
    let seq = drive.open(false).unwrap();
    assert_eq!(count_frames(&seq), 2);
    assert_eq!(DatasetTrait::timestamps(&seq).len(), 2);
}

/// Counts decode calls and forwards to the `image` crate.
#[derive(Debug, Default)]
struct CountingDecoder {
    decodes: AtomicUsize,
}

impl ImageDecoder for CountingDecoder {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn decode(&self, path: &Path, mode: ColorMode) -> kitti_loader::Result<PixelArray> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        ImageRsDecoder.decode(path, mode)
    }

    fn dimensions(&self, path: &Path) -> kitti_loader::Result<ImageSize> {
        ImageRsDecoder.dimensions(path)
    }
}

#[test]
fn test_frames_are_decoded_on_every_access() {
    let drive = Drive::new("image_02", 2, 2, CALIB);
    let seq = KittiSequence::with_decoder(
        &drive.image_dir,
        &drive.calib_path,
        &drive.timestamps_path,
        false,
        SequenceOptions::default(),
        CountingDecoder::default(),
    )
    .unwrap();
    assert_eq!(seq.decoder().decodes.load(Ordering::SeqCst), 0);

    let first = seq.get(1).unwrap();
    let second = seq.get(1).unwrap();
    assert_eq!(first, second);
    assert_eq!(seq.decoder().decodes.load(Ordering::SeqCst), 2);
}

#[test]
fn test_from_config() {
    let drive = Drive::new("image_02", 2, 2, CALIB);
    let config_path = drive.image_dir.join("sequence.json");
    let config = DatasetConfig {
        image_dir: drive.image_dir.clone(),
        calib_path: drive.calib_path.clone(),
        timestamps_path: drive.timestamps_path.clone(),
        grayscale: true,
        options: SequenceOptions::default(),
    };
    std::fs::write(&config_path, serde_json::to_string(&config).unwrap()).unwrap();

    let loaded = DatasetConfig::read_from_json(&config_path).unwrap();
    assert_eq!(loaded, config);
    let seq = KittiSequence::from_config(&loaded).unwrap();
    assert_eq!(seq.len(), 2);
    assert_eq!(seq.get(0).unwrap().ndim(), 2);
}
