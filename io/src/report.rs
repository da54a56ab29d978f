use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use nalgebra::RealField;
use num::ToPrimitive;
use solid_closure::{Comparison, PredictedClosures, RunResults, ThresholdMetrics};

use crate::IoError;

/// `%.18e`, with the exponent signed and at least two digits wide.
fn scientific(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value > 0. { "inf" } else { "-inf" }.to_owned();
    }
    let formatted = format!("{value:.18e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => match exponent.strip_prefix('-') {
            Some(exponent) => format!("{mantissa}e-{exponent:0>2}"),
            None => format!("{mantissa}e+{exponent:0>2}"),
        },
        None => formatted,
    }
}

fn fixed(value: f64) -> String {
    if value.is_nan() {
        "nan".to_owned()
    } else {
        format!("{value:.4}")
    }
}

/// Writes one `candidate query heading` row per closure. A closure without a
/// heading gets `nan`.
pub fn write_closures<'a, W, T, I>(mut writer: W, closures: I) -> Result<(), IoError>
where
    W: Write,
    T: ToPrimitive + Copy + 'a,
    I: IntoIterator<Item = &'a Comparison<T>>,
{
    for closure in closures {
        let heading = { closure.heading.as_ref() }
            .and_then(|heading| heading.degrees.to_f64())
            .unwrap_or(f64::NAN);
        writeln!(
            writer,
            "{} {} {}",
            scientific(closure.candidate as f64),
            scientific(closure.query as f64),
            scientific(heading)
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes one `threshold older newer` row per predicted pair, thresholds
/// ascending and pairs in order within each.
pub fn write_predicted_closures<W, T>(
    mut writer: W,
    predicted: &PredictedClosures<T>,
) -> Result<(), IoError>
where
    W: Write,
    T: RealField + Copy + ToPrimitive,
{
    for (threshold, pairs) in predicted.iter() {
        let threshold = scientific(threshold.to_f64().unwrap_or(f64::NAN));
        for (older, newer) in pairs {
            writeln!(writer, "{threshold} {older} {newer}")?;
        }
    }
    writer.flush()?;
    Ok(())
}

const HEADERS: [&str; 7] = [
    "SOLiD Threshold",
    "True Positives",
    "False Positives",
    "False Negatives",
    "Precision",
    "Recall",
    "F1 score",
];

/// Writes the metrics as an ASCII table titled `name`, one row per threshold.
///
/// With the default sweep the table has nine rows, `0.0040` to `0.0360`:
/// a threshold that would land on the `0.04` stop is never produced.
pub fn write_metrics<W, T>(
    mut writer: W,
    name: &str,
    metrics: &[ThresholdMetrics<T>],
) -> Result<(), IoError>
where
    W: Write,
    T: ToPrimitive + Copy,
{
    let rows = { metrics.iter() }
        .map(|ThresholdMetrics { threshold, metrics }| {
            [
                fixed(threshold.to_f64().unwrap_or(f64::NAN)),
                metrics.true_positives.to_string(),
                metrics.false_positives.to_string(),
                metrics.false_negatives.to_string(),
                fixed(metrics.precision),
                fixed(metrics.recall),
                fixed(metrics.f1),
            ]
        })
        .collect::<Vec<_>>();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }
    let rule = |fill: char| {
        let mut line = String::from("+");
        for width in widths {
            line.extend(std::iter::repeat(fill).take(width + 2));
            line.push('+');
        }
        line
    };
    let line = |cells: &[String; 7]| {
        let mut line = String::from("|");
        for (index, (cell, &width)) in cells.iter().zip(&widths).enumerate() {
            // Counts are centered, ratios left-aligned.
            if index < 4 {
                line += &format!(" {cell:^width$} |");
            } else {
                line += &format!(" {cell:<width$} |");
            }
        }
        line
    };

    writeln!(writer, "{name}")?;
    writeln!(writer, "{}", rule('-'))?;
    writeln!(writer, "{}", line(&HEADERS.map(str::to_owned)))?;
    writeln!(writer, "{}", rule('='))?;
    for row in &rows {
        writeln!(writer, "{}", line(row))?;
    }
    writeln!(writer, "{}", rule('-'))?;
    writer.flush()?;
    Ok(())
}

/// Writes `closures.txt`, holding the closures of the strictest threshold,
/// `predicted_closures.txt` with the pairs of every threshold, and
/// `metrics.txt` if the run was evaluated, into `dir`.
pub fn write_results<T>(
    dir: impl AsRef<Path>,
    name: &str,
    results: &RunResults<T>,
) -> Result<(), IoError>
where
    T: RealField + Copy + ToPrimitive,
{
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let file = File::create(dir.join("closures.txt"))?;
    write_closures(BufWriter::new(file), results.closures_at(0))?;
    let file = File::create(dir.join("predicted_closures.txt"))?;
    write_predicted_closures(BufWriter::new(file), &results.predicted)?;
    if !results.metrics.is_empty() {
        let file = File::create(dir.join("metrics.txt"))?;
        write_metrics(BufWriter::new(file), name, &results.metrics)?;
    }
    log::info!("report: results of {name} written to {dir:?}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use solid_closure::{GroundTruth, Metrics, ThresholdSet};
    use solid_features::Heading;

    use super::*;

    #[test]
    fn test_scientific() {
        assert_eq!(scientific(140.), "1.400000000000000000e+02");
        assert_eq!(scientific(0.), "0.000000000000000000e+00");
        assert_eq!(scientific(-0.004), "-4.000000000000000083e-03");
        assert_eq!(scientific(1024.), "1.024000000000000000e+03");
        assert_eq!(scientific(f64::NAN), "nan");
    }

    #[test]
    fn test_closures() {
        let closure = |candidate, query, degrees: Option<f64>| Comparison {
            query,
            candidate,
            distance: 0.001,
            passed: Some(0),
            heading: degrees.map(|degrees| Heading {
                shift: 0,
                degrees,
                residual: 0.,
            }),
        };
        let closures = [closure(0, 140, Some(354.)), closure(3, 201, None)];

        let mut out = Vec::new();
        write_closures(&mut out, &closures).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "0.000000000000000000e+00 1.400000000000000000e+02 3.540000000000000000e+02\n\
             3.000000000000000000e+00 2.010000000000000000e+02 nan\n"
        );
    }

    #[test]
    fn test_metrics_table() {
        let metrics = [
            ThresholdMetrics {
                threshold: 0.004,
                metrics: Metrics::new(0, 0, 3),
            },
            ThresholdMetrics {
                threshold: 0.008,
                metrics: Metrics::new(2, 2, 1),
            },
        ];
        let mut out = Vec::new();
        write_metrics(&mut out, "kitti_00", &metrics).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines = out.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "kitti_00");
        assert!(lines[1].starts_with("+---") && lines[3].starts_with("+==="));
        assert!(lines[2].contains("| SOLiD Threshold |"));
        assert!(lines[4].starts_with("|     0.0040      |"));
        assert!(lines[4].ends_with("| nan       | 0.0000 | nan      |"));
        assert!(lines[5].contains("| 0.5000    | 0.6667 | 0.5714   |"));
        assert!(lines.iter().skip(1).all(|line| line.len() == lines[1].len()));
    }

    #[test]
    fn test_predicted_closures() {
        let thresholds = ThresholdSet::from_values(vec![0.25, 0.5]).unwrap();
        let mut predicted = PredictedClosures::new(thresholds);
        let closure = |candidate, query, passed| Comparison {
            query,
            candidate,
            distance: 0.1,
            passed: Some(passed),
            heading: None,
        };
        predicted.insert(&closure(3, 201, 1));
        predicted.insert(&closure(0, 140, 0));

        let mut out = Vec::new();
        write_predicted_closures(&mut out, &predicted).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "2.500000000000000000e-01 0 140\n\
             5.000000000000000000e-01 0 140\n\
             5.000000000000000000e-01 3 201\n"
        );
    }

    #[test]
    fn test_default_metrics_rows() {
        let thresholds = ThresholdSet::<f64>::from_config(&Default::default()).unwrap();
        let predicted = PredictedClosures::new(thresholds);
        let metrics = predicted.compute_metrics(&GroundTruth::new([(0, 140)]));

        let mut out = Vec::new();
        write_metrics(&mut out, "kitti_00", &metrics).unwrap();
        let out = String::from_utf8(out).unwrap();
        let thresholds = { out.lines().filter(|line| line.starts_with("| ")).skip(1) }
            .map(|row| row.split('|').nth(1).unwrap().trim().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(thresholds.len(), 9);
        assert_eq!(thresholds[0], "0.0040");
        assert_eq!(thresholds[8], "0.0360");
    }

    #[test]
    fn test_results_dir() {
        let dir = tempfile::tempdir().unwrap();
        let results = solid_closure::Session::<f64>::from_config(&Default::default())
            .unwrap()
            .finish(None);
        write_results(dir.path().join("out"), "empty", &results).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("out/closures.txt")).unwrap(), "");
        let predicted = dir.path().join("out/predicted_closures.txt");
        assert_eq!(fs::read_to_string(predicted).unwrap(), "");
        assert!(!dir.path().join("out/metrics.txt").exists());
    }
}
