use std::path::Path;

use solid_closure::{RunResults, Session};
use solid_common::SolidConfig;

use crate::{write_results, IoError, SequenceDir};

/// Runs every scan of `sequence` through a [`Session`] built from `config`,
/// scores the run if the sequence has ground truth, and writes the reports
/// into `out`.
///
/// Only closures are kept, not the full comparison log.
pub fn run_sequence(
    sequence: &SequenceDir,
    config: &SolidConfig,
    out: impl AsRef<Path>,
) -> Result<RunResults<f64>, IoError> {
    let name = sequence.name();
    let mut session = Session::<f64>::from_config(config)?.keep_comparisons(false);
    // Read up front so a malformed file fails before the scans are processed.
    let ground_truth = sequence.ground_truth()?;

    log::info!(
        "pipeline: {name}: {} {:?} scans",
        sequence.len(),
        sequence.format()
    );
    for (index, scan) in sequence.iter().enumerate() {
        let outcome = session.process_raw(&scan?);
        if !outcome.degeneracy.is_clean() {
            log::debug!("pipeline: {name}: scan {index} is degenerate: {:?}", outcome.degeneracy);
        }
        if (index + 1) % 100 == 0 {
            log::info!("pipeline: {name}: {}/{} scans", index + 1, sequence.len());
        }
    }

    let results = session.finish(ground_truth.as_ref());
    write_results(out, &name, &results)?;
    Ok(results)
}
