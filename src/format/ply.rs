use ply_rs::{
    parser::Parser,
    ply::{DefaultElement, Encoding, Ply, Property},
    writer::Writer,
};

use crate::{
    error::{FilterError, Result},
    point::Point,
    point_cloud::PointCloud,
    retain_mask::RetainMask,
};

const VERTEX: &str = "vertex";

/// Reads the `vertex` element of a PLY file. The whole document is kept so
/// that every other property and element can be written back untouched.
pub(crate) fn decode(bytes: &[u8]) -> Result<(PointCloud, Ply<DefaultElement>)> {
    let mut reader = bytes;
    let parser = Parser::<DefaultElement>::new();
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|e| FilterError::malformed(format!("PLY parse error: {}", e)))?;

    let element = ply
        .header
        .elements
        .get(VERTEX)
        .ok_or_else(|| FilterError::malformed("PLY file has no vertex element"))?;
    for name in ["x", "y", "z"] {
        if !element.properties.contains_key(name) {
            return Err(FilterError::malformed(format!(
                "PLY vertex element has no {:?} property",
                name
            )));
        }
    }

    let vertices = ply.payload.get(VERTEX).map(Vec::as_slice).unwrap_or(&[]);
    let points = vertices
        .iter()
        .enumerate()
        .map(|(i, vertex)| {
            Ok(Point::new(
                coordinate(vertex, "x", i)?,
                coordinate(vertex, "y", i)?,
                coordinate(vertex, "z", i)?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    log::debug!(
        "decoded {} PLY vertices ({:?}, {} properties)",
        points.len(),
        ply.header.encoding,
        element.properties.len()
    );
    Ok((PointCloud::new(points), ply))
}

/// Writes the retained vertices as binary little endian PLY.
pub(crate) fn encode(mut ply: Ply<DefaultElement>, mask: &RetainMask) -> std::io::Result<Vec<u8>> {
    if let Some(vertices) = ply.payload.get_mut(VERTEX) {
        let all = std::mem::take(vertices);
        *vertices = mask.retain(all);
    }
    ply.header.encoding = Encoding::BinaryLittleEndian;
    ply.make_consistent().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("inconsistent PLY document: {:?}", e),
        )
    })?;

    let mut out = vec![];
    Writer::<DefaultElement>::new().write_ply(&mut out, &mut ply)?;
    Ok(out)
}

fn coordinate(vertex: &DefaultElement, name: &str, index: usize) -> Result<f64> {
    let v = match vertex.get(name) {
        Some(Property::Float(v)) => *v as f64,
        Some(Property::Double(v)) => *v,
        Some(Property::Int(v)) => *v as f64,
        Some(Property::UInt(v)) => *v as f64,
        Some(Property::Short(v)) => *v as f64,
        Some(Property::UShort(v)) => *v as f64,
        Some(Property::Char(v)) => *v as f64,
        Some(Property::UChar(v)) => *v as f64,
        _ => {
            return Err(FilterError::malformed(format!(
                "vertex {}: missing or non-scalar {:?} property",
                index, name
            )))
        }
    };
    if v.is_finite() {
        Ok(v)
    } else {
        Err(FilterError::malformed(format!(
            "vertex {}: non-finite {:?} coordinate",
            index, name
        )))
    }
}

#[cfg(test)]
mod tests {
    use ply_rs::ply::{Encoding, Property};

    use super::{decode, encode};
    use crate::{error::FilterError, point::Point, retain_mask::RetainMask};

    const COLORED: &str = "ply
format ascii 1.0
comment written by hand
element vertex 3
property float x
property float y
property double z
property uchar red
property uchar green
property uchar blue
property float opacity
end_header
0 0 0 255 0 0 0.5
1 1 1 0 255 0 0.25
2 2 2 0 0 255 1
";

    #[test]
    fn attributes_survive_filtering() {
        let (cloud, ply) = decode(COLORED.as_bytes()).unwrap();
        assert_eq!(cloud.len(), 3);
        assert_eq!(cloud.get(2), Some(&Point::new(2., 2., 2.)));

        let bytes = encode(ply, &RetainMask::new(vec![true, false, true])).unwrap();
        let (cloud, ply) = decode(&bytes).unwrap();
        assert_eq!(ply.header.encoding, Encoding::BinaryLittleEndian);
        assert_eq!(ply.header.elements["vertex"].count, 2);
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.get(1), Some(&Point::new(2., 2., 2.)));

        let vertices = &ply.payload["vertex"];
        assert_eq!(vertices[0]["red"], Property::UChar(255));
        assert_eq!(vertices[0]["opacity"], Property::Float(0.5));
        assert_eq!(vertices[1]["blue"], Property::UChar(255));
        assert_eq!(vertices[1]["opacity"], Property::Float(1.));
    }

    #[test]
    fn missing_coordinate_property_is_malformed() {
        let text = "ply
format ascii 1.0
element vertex 1
property float x
property float y
end_header
0 0
";
        assert!(matches!(
            decode(text.as_bytes()),
            Err(FilterError::MalformedInput(_))
        ));
    }

    #[test]
    fn non_finite_coordinate_is_malformed() {
        for bad in [f32::NAN, f32::INFINITY] {
            let mut bytes = b"ply
format binary_little_endian 1.0
element vertex 2
property float x
property float y
property float z
end_header
"
            .to_vec();
            for v in [0., 0., 0., 1., bad, 1.] {
                bytes.extend_from_slice(&f32::to_le_bytes(v));
            }
            match decode(&bytes) {
                Err(FilterError::MalformedInput(msg)) => assert!(msg.starts_with("vertex 1"), "{}", msg),
                other => panic!("unexpected {:?}", other.map(|(c, _)| c.len())),
            }
        }
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            decode(b"not a ply file"),
            Err(FilterError::MalformedInput(_))
        ));
    }
}
