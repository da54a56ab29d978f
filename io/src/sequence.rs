use std::path::{Path, PathBuf};

use solid_closure::GroundTruth;
use solid_common::{point_cloud::PointCloud, points::PointXyzI};

use crate::{load_ground_truth_file, read_bin_file, read_pcd_file, read_ply_file, IoError};

/// Location of the known closures, relative to a sequence root.
pub const GROUND_TRUTH_PATH: &str = "loop_closure/gt_closures.txt";

/// On-disk scan encodings, told apart by file extension.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ScanFormat {
    /// Packed little-endian `f32` records, as in KITTI.
    Bin,
    Pcd,
    Ply,
}

impl ScanFormat {
    /// In the order [`SequenceDir::open`] tries them.
    pub const ALL: [ScanFormat; 3] = [ScanFormat::Bin, ScanFormat::Pcd, ScanFormat::Ply];

    pub fn extension(&self) -> &'static str {
        match self {
            ScanFormat::Bin => "bin",
            ScanFormat::Pcd => "pcd",
            ScanFormat::Ply => "ply",
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let extension = path.as_ref().extension()?;
        { Self::ALL.into_iter() }.find(|format| extension == format.extension())
    }

    pub fn read(&self, path: impl AsRef<Path>) -> Result<PointCloud<PointXyzI<f64>>, IoError> {
        match self {
            ScanFormat::Bin => read_bin_file(path),
            ScanFormat::Pcd => read_pcd_file(path),
            ScanFormat::Ply => read_ply_file(path),
        }
    }
}

/// Reads a scan with the reader its extension calls for.
pub fn read_scan_file(path: impl AsRef<Path>) -> Result<PointCloud<PointXyzI<f64>>, IoError> {
    let path = path.as_ref();
    match ScanFormat::from_path(path) {
        Some(format) => format.read(path),
        None => Err(IoError::UnsupportedFormat(path.to_owned())),
    }
}

/// Regular files in `dir` with the given extension, sorted by path.
pub fn scan_files(dir: impl AsRef<Path>, extension: &str) -> Result<Vec<PathBuf>, IoError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(IoError::MissingDirectory(dir.to_owned()));
    }
    let mut files = Vec::new();
    for entry in dir.read_dir()? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// A recorded sequence: scans of one [`ScanFormat`] in one directory, plus
/// optional ground truth at [`GROUND_TRUTH_PATH`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceDir {
    root: PathBuf,
    format: ScanFormat,
    scans: Vec<PathBuf>,
    ground_truth: Option<PathBuf>,
}

impl SequenceDir {
    /// `scans` is the scan directory relative to `root`. The format is the
    /// first of [`ScanFormat::ALL`] with any file there.
    pub fn open(root: impl AsRef<Path>, scans: impl AsRef<Path>) -> Result<Self, IoError> {
        let dir = root.as_ref().join(scans);
        for format in ScanFormat::ALL {
            if !scan_files(&dir, format.extension())?.is_empty() {
                return Self::open_with(root, &dir, format);
            }
        }
        Self::open_with(root, &dir, ScanFormat::Bin)
    }

    pub fn open_with(
        root: impl AsRef<Path>,
        scans: impl AsRef<Path>,
        format: ScanFormat,
    ) -> Result<Self, IoError> {
        let root = root.as_ref().to_owned();
        let scans = scan_files(root.join(scans), format.extension())?;
        let ground_truth = Some(root.join(GROUND_TRUTH_PATH)).filter(|path| path.is_file());

        log::debug!("sequence: {} {format:?} scans under {root:?}", scans.len());
        if ground_truth.is_none() {
            log::info!("sequence: no ground truth under {root:?}, metrics will be skipped");
        }
        Ok(SequenceDir {
            root,
            format,
            scans,
            ground_truth,
        })
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The last component of the root, used to title reports.
    pub fn name(&self) -> String {
        { self.root.file_name() }
            .map_or_else(|| "sequence".to_owned(), |name| name.to_string_lossy().into_owned())
    }

    #[inline]
    pub fn format(&self) -> ScanFormat {
        self.format
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.scans.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }

    #[inline]
    pub fn scan_paths(&self) -> &[PathBuf] {
        &self.scans
    }

    pub fn read_scan(&self, index: usize) -> Option<Result<PointCloud<PointXyzI<f64>>, IoError>> {
        self.scans.get(index).map(|path| self.format.read(path))
    }

    /// Reads the scans lazily, in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = Result<PointCloud<PointXyzI<f64>>, IoError>> + '_ {
        self.scans.iter().map(|path| self.format.read(path))
    }

    pub fn ground_truth(&self) -> Result<Option<GroundTruth>, IoError> {
        self.ground_truth
            .as_ref()
            .map(load_ground_truth_file)
            .transpose()
    }
}
