use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use solid_closure::GroundTruth;

use crate::IoError;

fn parse_index(token: &str, line: usize) -> Result<usize, IoError> {
    let malformed = |reason: String| IoError::MalformedGroundTruth { line, reason };
    let value = { token.parse::<f64>() }.map_err(|err| malformed(format!("{token:?}: {err}")))?;
    if !(value.is_finite() && value >= 0. && value.fract() == 0. && value <= usize::MAX as f64) {
        return Err(malformed(format!("{token:?} is not a scan index")));
    }
    Ok(value as usize)
}

/// Loads known closures from whitespace-separated text.
///
/// The usual layout is one `a b` pair per row. A table of exactly two rows
/// with any other column count is read column-wise instead. Everything after
/// a `#` is ignored, and indices may be spelled as floats (`12.0`).
pub fn load_ground_truth<R: BufRead>(reader: R) -> Result<GroundTruth, IoError> {
    let mut rows = Vec::<Vec<usize>>::new();
    let mut columns = None;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let data = line.split_once('#').map_or(&*line, |(data, _)| data);
        let row = { data.split_whitespace() }
            .map(|token| parse_index(token, index + 1))
            .collect::<Result<Vec<_>, _>>()?;
        if row.is_empty() {
            continue;
        }

        match columns {
            None => columns = Some(row.len()),
            Some(columns) if columns != row.len() => {
                return Err(IoError::MalformedGroundTruth {
                    line: index + 1,
                    reason: format!("expected {columns} columns, got {}", row.len()),
                })
            }
            Some(_) => {}
        }
        rows.push(row);
    }

    match (rows.len(), columns) {
        (_, None) => {
            log::warn!("ground truth: no closures listed");
            Ok(GroundTruth::default())
        }
        (_, Some(2)) => Ok(rows.iter().map(|row| (row[0], row[1])).collect()),
        (2, Some(_)) => Ok(rows[0].iter().copied().zip(rows[1].iter().copied()).collect()),
        (_, Some(columns)) => Err(IoError::MalformedGroundTruth {
            line: 1,
            reason: format!(
                "{} rows of {columns} columns are neither pairs nor a 2xN table",
                rows.len()
            ),
        }),
    }
}

pub fn load_ground_truth_file(path: impl AsRef<Path>) -> Result<GroundTruth, IoError> {
    let file = File::open(path.as_ref())?;
    load_ground_truth(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs() {
        let text = "# loop closures\n0 140\n\n151 12.0  # revisit\n\
            3.000000000000000000e+00 2.010000000000000000e+02\n";
        let gt = load_ground_truth(text.as_bytes()).unwrap();
        assert_eq!(gt.len(), 3);
        assert!(gt.contains(0, 140));
        assert!(gt.contains(12, 151));
        assert!(gt.contains(3, 201));
        assert_eq!(gt.iter().next(), Some(&(0, 140)));
    }

    #[test]
    fn test_transposed() {
        let gt = load_ground_truth("0 5 9\n140 300 120\n".as_bytes()).unwrap();
        assert_eq!(
            gt.iter().copied().collect::<Vec<_>>(),
            vec![(0, 140), (5, 300), (9, 120)]
        );

        // Two rows of two stay row-wise.
        let gt = load_ground_truth("0 5\n140 300\n".as_bytes()).unwrap();
        assert!(gt.contains(0, 5) && gt.contains(140, 300));
    }

    #[test]
    fn test_malformed() {
        for text in ["0 1\n2 3 4\n", "1 2 3\n4 5 6\n7 8 9\n", "0 -1\n", "0 1.5\n", "a b\n"] {
            assert!(
                matches!(
                    load_ground_truth(text.as_bytes()),
                    Err(IoError::MalformedGroundTruth { .. })
                ),
                "{text:?}"
            );
        }
        assert!(load_ground_truth("# nothing\n".as_bytes()).unwrap().is_empty());
    }
}
