use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use solid_common::{point_cloud::PointCloud, points::PointXyzI};

use crate::{
    field::{into_cloud, malformed, Endian, Field, FieldType, Layout},
    IoError,
};

const FORMAT: &str = "ply";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlyEncoding {
    Ascii,
    Binary(Endian),
}

/// The `vertex` element of a PLY header. Elements declared after it are
/// never read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlyHeader {
    pub layout: Layout,
    pub vertices: usize,
    pub encoding: PlyEncoding,
}

impl PlyHeader {
    pub fn parse<R: BufRead>(mut reader: R) -> Result<Self, IoError> {
        let mut string = String::new();
        let mut next_line = |string: &mut String| -> Result<(), IoError> {
            string.clear();
            match reader.read_line(string)? {
                0 => Err(malformed(FORMAT, "header ends before end_header")),
                _ => Ok(()),
            }
        };

        next_line(&mut string)?;
        if string.trim_end() != "ply" {
            return Err(malformed(FORMAT, "missing the `ply` magic line"));
        }

        let mut encoding = None;
        let mut vertices = None;
        let mut in_vertex = false;
        let mut fields = Vec::new();
        loop {
            next_line(&mut string)?;
            let tokens = string.split_whitespace().collect::<Vec<_>>();
            match tokens[..] {
                [] | ["comment", ..] | ["obj_info", ..] => {}
                ["format", format, _] => {
                    encoding = Some(match format {
                        "ascii" => PlyEncoding::Ascii,
                        "binary_little_endian" => PlyEncoding::Binary(Endian::Little),
                        "binary_big_endian" => PlyEncoding::Binary(Endian::Big),
                        _ => return Err(malformed(FORMAT, format!("unknown format {format:?}"))),
                    })
                }
                ["element", "vertex", count] => {
                    let count = { count.parse::<usize>() }
                        .map_err(|err| malformed(FORMAT, format!("vertex count {count:?}: {err}")))?;
                    vertices = Some(count);
                    in_vertex = true;
                }
                ["element", name, _] => {
                    if vertices.is_none() {
                        return Err(malformed(
                            FORMAT,
                            format!("element {name:?} precedes the vertices"),
                        ));
                    }
                    in_vertex = false;
                }
                ["property", "list", ..] if in_vertex => {
                    return Err(malformed(FORMAT, "list properties on vertices"));
                }
                ["property", ty, name] if in_vertex => {
                    let ty = { FieldType::from_ply(ty) }
                        .ok_or_else(|| malformed(FORMAT, format!("unknown property type {ty:?}")))?;
                    fields.push(Field {
                        name: name.to_owned(),
                        ty,
                        count: 1,
                    });
                }
                ["property", ..] => {}
                ["end_header"] => break,
                _ => {
                    return Err(malformed(
                        FORMAT,
                        format!("unexpected header line {:?}", string.trim_end()),
                    ))
                }
            }
        }

        match (encoding, vertices) {
            (Some(encoding), Some(vertices)) => Ok(PlyHeader {
                layout: Layout { fields },
                vertices,
                encoding,
            }),
            (None, _) => Err(malformed(FORMAT, "missing format line")),
            (_, None) => Err(malformed(FORMAT, "no vertex element")),
        }
    }
}

/// Reads the vertices of a PLY file as an unorganized scan.
pub fn read_ply_scan<R: BufRead>(mut reader: R) -> Result<PointCloud<PointXyzI<f64>>, IoError> {
    let header = PlyHeader::parse(&mut reader)?;
    let layout = &header.layout;
    let storage = match header.encoding {
        PlyEncoding::Ascii => layout.parse_lines(reader, header.vertices, FORMAT)?,
        PlyEncoding::Binary(endian) => {
            let mut data = Vec::new();
            reader.read_to_end(&mut data)?;
            layout.decode(&data, header.vertices, endian, FORMAT)?
        }
    };
    into_cloud(storage, header.vertices, 1, FORMAT)
}

pub fn read_ply_file(path: impl AsRef<Path>) -> Result<PointCloud<PointXyzI<f64>>, IoError> {
    let file = File::open(path.as_ref())?;
    read_ply_scan(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii() {
        let text = "ply\nformat ascii 1.0\ncomment scanner 7\nelement vertex 2\n\
            property float x\nproperty float y\nproperty float z\nproperty uchar intensity\n\
            element face 1\nproperty list uchar int vertex_indices\nend_header\n\
            1 2 3 40\n-4.5 0 6 255\n3 0 1 2\n";
        let cloud = read_ply_scan(text.as_bytes()).unwrap();
        assert_eq!(
            cloud.into_vec(),
            [
                PointXyzI::with_intensity(1., 2., 3., 40.),
                PointXyzI::with_intensity(-4.5, 0., 6., 255.),
            ]
        );
    }

    #[test]
    fn test_binary() {
        for (format, endian) in [
            ("binary_little_endian", Endian::Little),
            ("binary_big_endian", Endian::Big),
        ] {
            let mut data = format!(
                "ply\nformat {format} 1.0\nelement vertex 2\nproperty double x\n\
                 property double y\nproperty double z\nproperty float intensity\n\
                 property ushort ring\nend_header\n"
            )
            .into_bytes();
            for (xyz, intensity) in [([1f64, -2., 0.5], 3f32), ([8., 16., -32.], 0.25)] {
                for value in xyz {
                    data.extend(match endian {
                        Endian::Little => value.to_le_bytes(),
                        Endian::Big => value.to_be_bytes(),
                    });
                }
                data.extend(match endian {
                    Endian::Little => intensity.to_le_bytes(),
                    Endian::Big => intensity.to_be_bytes(),
                });
                data.extend([0, 1]);
            }

            let cloud = read_ply_scan(&data[..]).unwrap();
            assert_eq!(cloud.len(), 2, "{format}");
            assert_eq!(cloud[0], PointXyzI::with_intensity(1., -2., 0.5, 3.));
            assert_eq!(cloud[1], PointXyzI::with_intensity(8., 16., -32., 0.25));
        }
    }

    #[test]
    fn test_malformed() {
        for text in [
            "PLY\nformat ascii 1.0\nelement vertex 0\nend_header\n",
            "ply\nelement vertex 0\nend_header\n",
            "ply\nformat ascii 1.0\nelement face 1\nelement vertex 0\nend_header\n",
            "ply\nformat ascii 1.0\nelement vertex 1\nproperty half x\nend_header\n",
            "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\n",
            "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nproperty float y\n\
             end_header\n1 2\n",
        ] {
            assert!(
                matches!(read_ply_scan(text.as_bytes()), Err(IoError::MalformedScan { .. })),
                "{text:?}"
            );
        }
    }
}
