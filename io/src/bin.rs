use std::{
    fs::File,
    io::{BufReader, Read, Write},
    path::Path,
};

use solid_common::{point_cloud::PointCloud, points::PointXyzI};

use crate::IoError;

/// Bytes of one `x y z intensity` record, each a little-endian `f32`.
pub const RECORD_SIZE: usize = 16;

/// Reads a raw `.bin` scan, as produced by KITTI-style datasets.
pub fn read_bin_scan<R: Read>(mut reader: R) -> Result<PointCloud<PointXyzI<f64>>, IoError> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    if data.len() % RECORD_SIZE != 0 {
        return Err(IoError::TruncatedRecord {
            len: data.len(),
            record: RECORD_SIZE,
        });
    }

    let cloud = { data.chunks_exact(RECORD_SIZE) }
        .map(|record| {
            let value = |k: usize| {
                let bytes = &record[k * 4..][..4];
                f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64
            };
            PointXyzI::with_intensity(value(0), value(1), value(2), value(3))
        })
        .collect::<PointCloud<_>>();
    if !cloud.is_bounded() {
        log::warn!("bin: scan holds non-finite points, which will be skipped");
    }
    Ok(cloud)
}

pub fn read_bin_file(path: impl AsRef<Path>) -> Result<PointCloud<PointXyzI<f64>>, IoError> {
    let file = File::open(path.as_ref())?;
    read_bin_scan(BufReader::new(file))
}

/// Writes the cloud in the layout [`read_bin_scan`] reads, narrowing every
/// value to `f32`.
pub fn write_bin_scan<W: Write>(
    mut writer: W,
    cloud: &PointCloud<PointXyzI<f64>>,
) -> Result<(), IoError> {
    for point in cloud.iter() {
        let values = [
            point.coords.x,
            point.coords.y,
            point.coords.z,
            point.extra.intensity,
        ];
        for value in values {
            writer.write_all(&(value as f32).to_le_bytes())?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_records() {
        let mut data = Vec::new();
        for value in [1.5f32, -2., 0.25, 7., 10., 20., -30., 0.] {
            data.extend(value.to_le_bytes());
        }
        let cloud = read_bin_scan(&data[..]).unwrap();
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud[0], PointXyzI::with_intensity(1.5, -2., 0.25, 7.));
        assert_eq!(cloud[1].coords.z, -30.);
        assert!(cloud.is_bounded());

        assert!(read_bin_scan(&[][..]).unwrap().is_empty());
    }

    #[test]
    fn test_truncated() {
        let data = vec![0u8; RECORD_SIZE * 3 + 5];
        assert!(matches!(
            read_bin_scan(&data[..]),
            Err(IoError::TruncatedRecord { len: 53, record: 16 })
        ));
    }

    #[test]
    fn test_file() {
        let cloud: PointCloud<_> = [
            PointXyzI::with_intensity(3., 4., 5., 0.5),
            PointXyzI::with_intensity(-8., 0.125, 2., 1.),
        ]
        .into_iter()
        .collect();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("000000.bin");
        write_bin_scan(File::create(&path).unwrap(), &cloud).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 32);
        assert_eq!(read_bin_file(&path).unwrap(), cloud);
    }
}
