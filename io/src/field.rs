//! Record layouts shared by the PCD and PLY readers.

use std::io::BufRead;

use solid_common::{point_cloud::PointCloud, points::PointXyzI};

use crate::IoError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    U64,
    I64,
    F64,
}

impl FieldType {
    pub fn size(&self) -> usize {
        use FieldType::*;
        match self {
            U8 | I8 => 1,
            U16 | I16 => 2,
            U32 | I32 | F32 => 4,
            U64 | I64 | F64 => 8,
        }
    }

    /// From the `SIZE` and `TYPE` columns of a PCD header.
    pub fn from_pcd(size: usize, ty: &str) -> Option<Self> {
        use FieldType::*;
        Some(match (size, ty) {
            (1, "U") => U8,
            (1, "I") => I8,
            (2, "U") => U16,
            (2, "I") => I16,
            (4, "U") => U32,
            (4, "I") => I32,
            (4, "F") => F32,
            (8, "U") => U64,
            (8, "I") => I64,
            (8, "F") => F64,
            _ => return None,
        })
    }

    /// From the type of a PLY `property` line.
    pub fn from_ply(name: &str) -> Option<Self> {
        use FieldType::*;
        Some(match name {
            "char" | "int8" => I8,
            "uchar" | "uint8" => U8,
            "short" | "int16" => I16,
            "ushort" | "uint16" => U16,
            "int" | "int32" => I32,
            "uint" | "uint32" => U32,
            "float" | "float32" => F32,
            "double" | "float64" => F64,
            _ => return None,
        })
    }

    /// `bytes` must hold at least [`FieldType::size`] bytes.
    fn decode(&self, bytes: &[u8], endian: Endian) -> f64 {
        macro_rules! decode {
            ($ty:ty) => {{
                let mut buf = [0; std::mem::size_of::<$ty>()];
                buf.copy_from_slice(&bytes[..std::mem::size_of::<$ty>()]);
                let value = match endian {
                    Endian::Little => <$ty>::from_le_bytes(buf),
                    Endian::Big => <$ty>::from_be_bytes(buf),
                };
                value as f64
            }};
        }
        use FieldType::*;
        match self {
            U8 => decode!(u8),
            I8 => decode!(i8),
            U16 => decode!(u16),
            I16 => decode!(i16),
            U32 => decode!(u32),
            I32 => decode!(i32),
            F32 => decode!(f32),
            U64 => decode!(u64),
            I64 => decode!(i64),
            F64 => decode!(f64),
        }
    }

    fn parse(&self, token: &str) -> Option<f64> {
        use FieldType::*;
        match self {
            F32 => token.parse::<f32>().ok().map(f64::from),
            F64 => token.parse().ok(),
            U8 | U16 | U32 | U64 => token.parse::<u64>().ok().map(|value| value as f64),
            I8 | I16 | I32 | I64 => token.parse::<i64>().ok().map(|value| value as f64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
    /// Number of consecutive values of `ty`, at least one.
    pub count: usize,
}

/// Where one scan channel sits inside a record.
#[derive(Debug, Copy, Clone)]
struct Slot {
    ty: FieldType,
    /// Byte offset in a binary record.
    offset: usize,
    /// Token index in a text record.
    column: usize,
}

#[derive(Debug, Copy, Clone)]
struct Channels {
    xyz: [Slot; 3],
    intensity: Option<Slot>,
}

impl Channels {
    fn point<E>(
        &self,
        mut value: impl FnMut(&Slot) -> Result<f64, E>,
    ) -> Result<PointXyzI<f64>, E> {
        let [x, y, z] = &self.xyz;
        let intensity = match &self.intensity {
            Some(slot) => value(slot)?,
            None => 0.,
        };
        Ok(PointXyzI::with_intensity(value(x)?, value(y)?, value(z)?, intensity))
    }
}

/// The fields of one point record, in storage order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Layout {
    pub fields: Vec<Field>,
}

impl Layout {
    pub fn record_size(&self) -> usize {
        { self.fields.iter() }.fold(0, |acc, field| acc + field.count * field.ty.size())
    }

    /// Values per text record.
    pub fn columns(&self) -> usize {
        self.fields.iter().map(|field| field.count).sum()
    }

    /// Only the first value of `x`, `y`, `z` and `intensity` (or `i`) is read;
    /// every other field is skipped. A missing intensity reads as zero.
    fn channels(&self, format: &'static str) -> Result<Channels, IoError> {
        let mut slots = [None; 4];
        let (mut offset, mut column) = (0, 0);
        for field in &self.fields {
            let channel = match &*field.name {
                "x" => Some(0),
                "y" => Some(1),
                "z" => Some(2),
                "intensity" | "i" => Some(3),
                _ => None,
            };
            if let Some(channel) = channel {
                slots[channel].get_or_insert(Slot {
                    ty: field.ty,
                    offset,
                    column,
                });
            }
            offset += field.count * field.ty.size();
            column += field.count;
        }
        match slots {
            [Some(x), Some(y), Some(z), intensity] => Ok(Channels {
                xyz: [x, y, z],
                intensity,
            }),
            _ => Err(malformed(format, "records lack an x, y or z field")),
        }
    }

    /// Decodes `points` packed binary records from the front of `data`.
    pub(crate) fn decode(
        &self,
        data: &[u8],
        points: usize,
        endian: Endian,
        format: &'static str,
    ) -> Result<Vec<PointXyzI<f64>>, IoError> {
        let channels = self.channels(format)?;
        let record = self.record_size();
        let len = record.saturating_mul(points);
        if data.len() < len {
            return Err(malformed(
                format,
                format!(
                    "{points} records of {record} bytes need {len} bytes, got {}",
                    data.len()
                ),
            ));
        }
        if points == 0 {
            return Ok(Vec::new());
        }
        { data[..len].chunks_exact(record) }
            .map(|record| {
                channels.point(|slot| Ok(slot.ty.decode(&record[slot.offset..], endian)))
            })
            .collect()
    }

    /// Parses `points` whitespace-separated records, one per non-empty line.
    /// Anything after the last record is left unread.
    pub(crate) fn parse_lines<R: BufRead>(
        &self,
        reader: R,
        points: usize,
        format: &'static str,
    ) -> Result<Vec<PointXyzI<f64>>, IoError> {
        let channels = self.channels(format)?;
        let columns = self.columns();
        let mut storage = Vec::with_capacity(points);
        let mut lines = reader.lines();

        while storage.len() < points {
            let Some(line) = lines.next() else {
                return Err(malformed(
                    format,
                    format!("expected {points} records, got {}", storage.len()),
                ));
            };
            let line = line?;
            let tokens = line.split_whitespace().collect::<Vec<_>>();
            if tokens.is_empty() {
                continue;
            }
            if tokens.len() < columns {
                return Err(malformed(
                    format,
                    format!(
                        "record {} has {} of {columns} values",
                        storage.len(),
                        tokens.len()
                    ),
                ));
            }
            let point = channels.point(|slot| {
                let token = tokens[slot.column];
                { slot.ty.parse(token) }
                    .ok_or_else(|| malformed(format, format!("{token:?} is not a {:?}", slot.ty)))
            })?;
            storage.push(point);
        }
        Ok(storage)
    }
}

pub(crate) fn malformed(format: &'static str, reason: impl Into<String>) -> IoError {
    IoError::MalformedScan {
        format,
        reason: reason.into(),
    }
}

/// Keeps the `width x height` organization when there is more than one row.
pub(crate) fn into_cloud(
    storage: Vec<PointXyzI<f64>>,
    width: usize,
    height: usize,
    format: &'static str,
) -> Result<PointCloud<PointXyzI<f64>>, IoError> {
    let cloud = if height > 1 {
        PointCloud::try_from_vec(storage, width).map_err(|storage| {
            malformed(format, format!("{} points in rows of {width}", storage.len()))
        })?
    } else {
        PointCloud::from_points(storage)
    };
    if !cloud.is_bounded() {
        log::warn!("{format}: scan holds non-finite points, which will be skipped");
    }
    Ok(cloud)
}
