use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::Path,
};

use solid_common::{point_cloud::PointCloud, points::PointXyzI};

use crate::{
    field::{into_cloud, malformed, Endian, Field, FieldType, Layout},
    IoError,
};

const FORMAT: &str = "pcd";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PcdData {
    Ascii,
    Binary,
    BinaryCompressed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcdHeader {
    pub layout: Layout,
    pub width: usize,
    pub height: usize,
    pub data: PcdData,
}

fn parse_list(key: &str, value: &str) -> Result<Vec<usize>, IoError> {
    { value.split_whitespace() }
        .map(|token| {
            { token.parse::<usize>() }
                .map_err(|err| malformed(FORMAT, format!("{key} {token:?}: {err}")))
        })
        .collect()
}

fn parse_number(key: &str, value: &str) -> Result<usize, IoError> {
    { value.parse::<usize>() }
        .map_err(|err| malformed(FORMAT, format!("{key} {value:?}: {err}")))
}

impl PcdHeader {
    /// Reads header lines up to and including `DATA`, leaving `reader` at the
    /// first byte of the point data.
    pub fn parse<R: BufRead>(mut reader: R) -> Result<Self, IoError> {
        let mut string = String::new();

        let mut names = Vec::new();
        let mut sizes = Vec::new();
        let mut types = Vec::new();
        let mut counts = Vec::new();
        let mut width = None;
        let mut height = None;
        let mut points = None;

        let data = loop {
            string.clear();
            if reader.read_line(&mut string)? == 0 {
                return Err(malformed(FORMAT, "header ends before DATA"));
            }
            let line = string.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            let value = value.trim();

            match key {
                "VERSION" | "VIEWPOINT" => {}
                "FIELDS" | "COLUMNS" => {
                    names = value.split_whitespace().map(str::to_owned).collect();
                }
                "SIZE" => sizes = parse_list(key, value)?,
                "TYPE" => types = value.split_whitespace().map(str::to_owned).collect(),
                "COUNT" => counts = parse_list(key, value)?,
                "WIDTH" => width = Some(parse_number(key, value)?),
                "HEIGHT" => height = Some(parse_number(key, value)?),
                "POINTS" => points = Some(parse_number(key, value)?),
                "DATA" => {
                    break match value {
                        "ascii" => PcdData::Ascii,
                        "binary" => PcdData::Binary,
                        "binary_compressed" => PcdData::BinaryCompressed,
                        _ => return Err(malformed(FORMAT, format!("unknown DATA {value:?}"))),
                    }
                }
                _ => log::debug!("pcd: skipping header line {line:?}"),
            }
        };

        let fields = { names.into_iter().enumerate() }
            .map(|(index, name)| {
                let size = sizes.get(index).copied().unwrap_or(4);
                let ty = types.get(index).map_or("F", String::as_str);
                let count = counts.get(index).copied().unwrap_or(1);
                match FieldType::from_pcd(size, ty) {
                    Some(ty) if count > 0 => Ok(Field { name, ty, count }),
                    _ => Err(malformed(
                        FORMAT,
                        format!("field {name:?} has SIZE {size}, TYPE {ty} and COUNT {count}"),
                    )),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let (width, height) = match (width, height, points) {
            (Some(width), Some(height), points) => match width.checked_mul(height) {
                Some(len) if points.map_or(true, |points| points == len) => (width, height),
                _ => {
                    return Err(malformed(
                        FORMAT,
                        format!("POINTS {points:?} conflicts with WIDTH {width} * HEIGHT {height}"),
                    ))
                }
            },
            (Some(width), None, Some(points)) if width > 0 && points % width == 0 => {
                (width, points / width)
            }
            (None, Some(height), Some(points)) if height > 0 && points % height == 0 => {
                (points / height, height)
            }
            (None, None, Some(points)) => (points, 1),
            _ => return Err(malformed(FORMAT, "WIDTH, HEIGHT and POINTS do not fit")),
        };

        Ok(PcdHeader {
            layout: Layout { fields },
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn points(&self) -> usize {
        self.width * self.height
    }
}

/// `binary_compressed` data is one LZF block, preceded by its compressed and
/// uncompressed sizes, holding every field for all points in turn. Returns the
/// same bytes as packed records.
fn read_compressed<R: Read>(mut reader: R, header: &PcdHeader) -> Result<Vec<u8>, IoError> {
    let points = header.points();
    let record = header.layout.record_size();
    if points == 0 {
        return Ok(Vec::new());
    }

    let mut word = [0; 4];
    reader.read_exact(&mut word)?;
    let compressed_size = u32::from_le_bytes(word) as usize;
    reader.read_exact(&mut word)?;
    let uncompressed_size = u32::from_le_bytes(word) as usize;

    let mut block = vec![0; compressed_size];
    reader.read_exact(&mut block)?;
    let columns = { lzf::decompress(&block, uncompressed_size) }
        .map_err(|err| malformed(FORMAT, format!("decompression failed: {err:?}")))?;
    if columns.len() < record * points {
        return Err(malformed(
            FORMAT,
            format!("{} decompressed bytes hold fewer than {points} points", columns.len()),
        ));
    }

    let mut output = vec![0; record * points];
    let mut temp = &columns[..];
    let mut offset = 0;
    for field in &header.layout.fields {
        let field_size = field.ty.size() * field.count;
        for (index, src) in temp.chunks_exact(field_size).take(points).enumerate() {
            output[(record * index + offset)..][..field_size].copy_from_slice(src);
        }
        temp = &temp[(field_size * points)..];
        offset += field_size;
    }
    Ok(output)
}

/// Reads a PCD scan in any of the `ascii`, `binary` and `binary_compressed`
/// encodings. Binary data is little-endian.
pub fn read_pcd_scan<R: BufRead>(mut reader: R) -> Result<PointCloud<PointXyzI<f64>>, IoError> {
    let header = PcdHeader::parse(&mut reader)?;
    let points = header.points();
    let layout = &header.layout;

    let storage = match header.data {
        PcdData::Ascii => layout.parse_lines(reader, points, FORMAT)?,
        PcdData::Binary => {
            let mut data = Vec::new();
            reader.read_to_end(&mut data)?;
            layout.decode(&data, points, Endian::Little, FORMAT)?
        }
        PcdData::BinaryCompressed => {
            let data = read_compressed(reader, &header)?;
            layout.decode(&data, points, Endian::Little, FORMAT)?
        }
    };
    log::debug!("pcd: {points} points in {:?} layout", header.data);
    into_cloud(storage, header.width, header.height, FORMAT)
}

pub fn read_pcd_file(path: impl AsRef<Path>) -> Result<PointCloud<PointXyzI<f64>>, IoError> {
    let file = File::open(path.as_ref())?;
    read_pcd_scan(BufReader::new(file))
}
