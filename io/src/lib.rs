mod bin;
mod error;
mod field;
mod ground_truth;
mod pcd;
mod pipeline;
mod ply;
mod report;
mod sequence;

pub use self::{
    bin::{read_bin_file, read_bin_scan, write_bin_scan, RECORD_SIZE},
    error::IoError,
    field::{Endian, Field, FieldType, Layout},
    ground_truth::{load_ground_truth, load_ground_truth_file},
    pcd::{read_pcd_file, read_pcd_scan, PcdData, PcdHeader},
    pipeline::run_sequence,
    ply::{read_ply_file, read_ply_scan, PlyEncoding, PlyHeader},
    report::{write_closures, write_metrics, write_predicted_closures, write_results},
    sequence::{read_scan_file, scan_files, ScanFormat, SequenceDir, GROUND_TRUTH_PATH},
};
