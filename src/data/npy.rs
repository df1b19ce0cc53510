//! Minimal reader/writer for NumPy `.npy` vectors.
//!
//! COMMIT dumps one coefficient vector per solver iteration with `np.save`.
//! Only floating point payloads are needed here; any shape is read flattened
//! in C order.

use std::io::{Cursor, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Scalar type of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dtype {
    F4,
    F8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Header {
    big_endian: bool,
    dtype: Dtype,
    fortran_order: bool,
    shape: Vec<usize>,
}

/// Read an `.npy` file as a flat `Vec<f64>`.
pub fn read_f64(path: &Path) -> Result<Vec<f64>> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    parse_f64(&bytes).with_context(|| format!("parsing {}", path.display()))
}

/// Decode an in-memory `.npy` image.
pub fn parse_f64(bytes: &[u8]) -> Result<Vec<f64>> {
    if bytes.len() < 10 || &bytes[..6] != MAGIC {
        bail!("not a .npy file (bad magic)");
    }
    let major = bytes[6];
    let mut cursor = Cursor::new(&bytes[8..]);
    let header_len = match major {
        1 => cursor.read_u16::<LittleEndian>()? as usize,
        2 | 3 => cursor.read_u32::<LittleEndian>()? as usize,
        v => bail!("unsupported .npy version {v}"),
    };
    let header_start = 8 + cursor.position() as usize;
    let data_start = header_start + header_len;
    if bytes.len() < data_start {
        bail!("truncated .npy header");
    }
    let text = std::str::from_utf8(&bytes[header_start..data_start])
        .context("header is not valid text")?;
    let header = parse_header(text)?;

    if header.fortran_order && header.shape.len() > 1 {
        bail!("Fortran-ordered arrays are not supported");
    }
    let width = match header.dtype {
        Dtype::F4 => 4,
        Dtype::F8 => 8,
    };
    let (count, n_bytes) = header
        .shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .and_then(|count| Some((count, count.checked_mul(width)?)))
        .with_context(|| format!("shape {:?} overflows", header.shape))?;
    let payload = &bytes[data_start..];
    if payload.len() < n_bytes {
        bail!("payload holds {} bytes, expected {n_bytes}", payload.len());
    }
    let payload = &payload[..n_bytes];

    Ok(match (header.dtype, header.big_endian) {
        (Dtype::F8, false) => decode_f8::<LittleEndian>(payload, count),
        (Dtype::F8, true) => decode_f8::<BigEndian>(payload, count),
        (Dtype::F4, false) => decode_f4::<LittleEndian>(payload, count),
        (Dtype::F4, true) => decode_f4::<BigEndian>(payload, count),
    })
}

fn decode_f8<B: ByteOrder>(payload: &[u8], count: usize) -> Vec<f64> {
    let mut out = vec![0.0; count];
    B::read_f64_into(payload, &mut out);
    out
}

fn decode_f4<B: ByteOrder>(payload: &[u8], count: usize) -> Vec<f64> {
    let mut out = vec![0.0_f32; count];
    B::read_f32_into(payload, &mut out);
    out.into_iter().map(f64::from).collect()
}

// -- header dictionary --

fn parse_header(text: &str) -> Result<Header> {
    let descr = value_after(text, "descr")
        .and_then(|rest| {
            let rest = rest.trim_start().strip_prefix('\'')?;
            rest.split('\'').next()
        })
        .context("header has no 'descr'")?;
    let (big_endian, dtype) = match descr {
        "<f8" | "=f8" => (false, Dtype::F8),
        ">f8" => (true, Dtype::F8),
        "<f4" | "=f4" => (false, Dtype::F4),
        ">f4" => (true, Dtype::F4),
        other => bail!("unsupported dtype '{other}', expected a float array"),
    };

    let fortran_order = value_after(text, "fortran_order")
        .map(|rest| rest.trim_start().starts_with("True"))
        .context("header has no 'fortran_order'")?;

    let shape_text = value_after(text, "shape")
        .and_then(|rest| {
            let rest = rest.trim_start().strip_prefix('(')?;
            rest.split(')').next()
        })
        .context("header has no 'shape'")?;
    let shape = shape_text
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.trim_end_matches('L')
                .parse::<usize>()
                .with_context(|| format!("bad dimension '{s}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Header {
        big_endian,
        dtype,
        fortran_order,
        shape,
    })
}

/// Text following `'key':` in the header dictionary.
fn value_after<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    let pattern = format!("'{key}':");
    let idx = text.find(&pattern)?;
    Some(&text[idx + pattern.len()..])
}

/// Write a 1-D little-endian `f64` array in `.npy` v1 format.
pub fn write_f64(path: &Path, values: &[f64]) -> Result<()> {
    let mut header = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({},), }}",
        values.len()
    );
    // magic + version + u16 length + header + '\n' must align to 64 bytes
    let unpadded = MAGIC.len() + 2 + 2 + header.len() + 1;
    header.push_str(&" ".repeat((64 - unpadded % 64) % 64));
    header.push('\n');

    let mut buf = Vec::with_capacity(10 + header.len() + values.len() * 8);
    buf.write_all(MAGIC)?;
    buf.write_all(&[1, 0])?;
    buf.write_u16::<LittleEndian>(header.len() as u16)?;
    buf.write_all(header.as_bytes())?;
    for &v in values {
        buf.write_f64::<LittleEndian>(v)?;
    }
    std::fs::write(path, buf).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handmade(descr: &str, shape: &str, payload: &[u8]) -> Vec<u8> {
        let header =
            format!("{{'descr': '{descr}', 'fortran_order': False, 'shape': {shape}, }}\n");
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&[1, 0]);
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn test_write_is_aligned_and_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0.npy");
        write_f64(&path, &[0.25, 1.5, -3.0]).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!((bytes.len() - 3 * 8) % 64, 0);
        assert_eq!(read_f64(&path).unwrap(), vec![0.25, 1.5, -3.0]);
    }

    #[test]
    fn test_reads_big_endian_f4_matrix_flattened() {
        let mut payload = Vec::new();
        for v in [1.0_f32, 2.0, 3.0, 4.0] {
            payload.extend_from_slice(&v.to_be_bytes());
        }
        let bytes = handmade(">f4", "(2, 2)", &payload);
        assert_eq!(parse_f64(&bytes).unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_rejects_integer_dtype_and_truncation() {
        let bytes = handmade("<i8", "(1,)", &7_i64.to_le_bytes());
        assert!(parse_f64(&bytes).is_err());

        let bytes = handmade("<f8", "(4,)", &1.0_f64.to_le_bytes());
        assert!(parse_f64(&bytes).is_err());
    }

    #[test]
    fn test_rejects_overflowing_shape() {
        let bytes = handmade("<f8", "(4294967296, 4294967296)", &[]);
        let err = parse_f64(&bytes).unwrap_err();
        assert!(err.to_string().contains("overflows"));

        let bytes = handmade("<f8", &format!("({},)", usize::MAX / 4), &[]);
        assert!(parse_f64(&bytes).is_err());

        assert!(parse_f64(b"not numpy at all").is_err());
    }
}
