//! TrackVis `.trk` tractogram reader/writer.
//!
//! Layout: a fixed 1000-byte header followed by one record per track:
//! `i32 n_points`, then `n_points * (3 + n_scalars)` `f32`, then
//! `n_properties` `f32`. Endianness is detected from `hdr_size`.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::Vec3;

use super::model::Streamline;

const HEADER_SIZE: usize = 1000;
const OFFSET_N_SCALARS: usize = 36;
const OFFSET_N_PROPERTIES: usize = 238;
const OFFSET_N_COUNT: usize = 988;
const OFFSET_VERSION: usize = 992;
const OFFSET_HDR_SIZE: usize = 996;
/// Track payloads are read in pieces of at most this many values.
const READ_CHUNK: usize = 1 << 16;

/// The header fields the viewer needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrkHeader {
    pub n_scalars: usize,
    pub n_properties: usize,
    /// Track count stored in the header; 0 means "unknown".
    pub n_count: usize,
    pub big_endian: bool,
}

/// Result of reading a tractogram with a streamline limit.
#[derive(Debug, Clone)]
pub struct Tractogram {
    pub header: TrkHeader,
    /// The first `limit` tracks.
    pub streamlines: Vec<Streamline>,
    /// Number of tracks in the whole file.
    pub total: usize,
}

/// Read at most `limit` streamlines, while still establishing the total
/// track count of the file.
pub fn read(path: &Path, limit: usize) -> Result<Tractogram> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let file_len = file.metadata().map(|m| m.len()).ok();
    let mut reader = BufReader::new(file);
    read_sized(&mut reader, limit, file_len).with_context(|| format!("reading {}", path.display()))
}

pub fn read_from<R: Read>(reader: &mut R, limit: usize) -> Result<Tractogram> {
    read_sized(reader, limit, None)
}

/// `file_len`, when known, lets oversized track records be rejected before
/// any of their payload is read.
fn read_sized<R: Read>(reader: &mut R, limit: usize, file_len: Option<u64>) -> Result<Tractogram> {
    let mut raw = [0u8; HEADER_SIZE];
    reader.read_exact(&mut raw).context("file is shorter than a TrackVis header")?;
    if &raw[..5] != b"TRACK" {
        bail!("missing TRACK signature");
    }
    let header = if LittleEndian::read_i32(&raw[OFFSET_HDR_SIZE..]) == HEADER_SIZE as i32 {
        parse_header::<LittleEndian>(&raw, false)?
    } else if BigEndian::read_i32(&raw[OFFSET_HDR_SIZE..]) == HEADER_SIZE as i32 {
        parse_header::<BigEndian>(&raw, true)?
    } else {
        bail!("hdr_size is not {HEADER_SIZE} in either byte order");
    };

    let body_len = file_len.map(|len| len.saturating_sub(HEADER_SIZE as u64));
    if header.big_endian {
        read_tracks::<BigEndian, R>(reader, header, limit, body_len)
    } else {
        read_tracks::<LittleEndian, R>(reader, header, limit, body_len)
    }
}

fn parse_header<B: ByteOrder>(raw: &[u8; HEADER_SIZE], big_endian: bool) -> Result<TrkHeader> {
    let n_scalars = B::read_i16(&raw[OFFSET_N_SCALARS..]);
    let n_properties = B::read_i16(&raw[OFFSET_N_PROPERTIES..]);
    let n_count = B::read_i32(&raw[OFFSET_N_COUNT..]);
    if n_scalars < 0 || n_properties < 0 || n_count < 0 {
        bail!("negative counts in header");
    }
    Ok(TrkHeader {
        n_scalars: n_scalars as usize,
        n_properties: n_properties as usize,
        n_count: n_count as usize,
        big_endian,
    })
}

fn read_tracks<B: ByteOrder, R: Read>(
    reader: &mut R,
    header: TrkHeader,
    limit: usize,
    body_len: Option<u64>,
) -> Result<Tractogram> {
    let stride = 3 + header.n_scalars;
    let mut streamlines = Vec::with_capacity(limit.min(header.n_count.max(1)));
    let mut total = 0usize;
    let mut consumed = 0u64;
    let mut values: Vec<f32> = Vec::new();

    loop {
        if header.n_count > 0 && total == header.n_count {
            break;
        }
        if header.n_count > 0 && streamlines.len() == limit {
            total = header.n_count;
            break;
        }
        let n_points = match reader.read_i32::<B>() {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof && header.n_count == 0 => break,
            Err(e) => return Err(e).with_context(|| format!("reading track {total}")),
        };
        if n_points < 0 {
            bail!("track {total} has a negative point count");
        }
        let record_bytes = (n_points as u64)
            .checked_mul(stride as u64)
            .and_then(|v| v.checked_add(header.n_properties as u64))
            .and_then(|v| v.checked_mul(4))
            .with_context(|| format!("track {total} declares an impossible size"))?;
        consumed += 4;
        if let Some(body_len) = body_len {
            if record_bytes > body_len.saturating_sub(consumed) {
                bail!(
                    "track {total} declares {n_points} points but only {} bytes remain",
                    body_len.saturating_sub(consumed)
                );
            }
        }
        let n_values = usize::try_from(record_bytes / 4)
            .with_context(|| format!("track {total} is too large"))?;
        read_values::<B, R>(reader, n_values, &mut values)
            .with_context(|| format!("track {total} is truncated"))?;
        consumed += record_bytes;

        if streamlines.len() < limit {
            let points = values[..n_points as usize * stride]
                .chunks_exact(stride)
                .map(|p| Vec3::new(p[0], p[1], p[2]))
                .collect();
            streamlines.push(Streamline::new(points));
        }
        total += 1;
    }

    Ok(Tractogram {
        header,
        streamlines,
        total,
    })
}

/// Fill `values` with exactly `n` floats, growing the buffer only as data
/// arrives.
fn read_values<B: ByteOrder, R: Read>(
    reader: &mut R,
    n: usize,
    values: &mut Vec<f32>,
) -> Result<()> {
    values.clear();
    while values.len() < n {
        let start = values.len();
        let take = (n - start).min(READ_CHUNK);
        values.resize(start + take, 0.0);
        reader.read_f32_into::<B>(&mut values[start..])?;
    }
    Ok(())
}

/// Write little-endian tracks without scalars or properties.
pub fn write(path: &Path, streamlines: &[Streamline]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);

    let mut header = [0u8; HEADER_SIZE];
    header[..6].copy_from_slice(b"TRACK\0");
    for (i, voxel) in [1.0_f32; 3].iter().enumerate() {
        LittleEndian::write_f32(&mut header[12 + i * 4..], *voxel);
    }
    header[948..951].copy_from_slice(b"LAS");
    LittleEndian::write_i32(&mut header[OFFSET_N_COUNT..], streamlines.len() as i32);
    LittleEndian::write_i32(&mut header[OFFSET_VERSION..], 2);
    LittleEndian::write_i32(&mut header[OFFSET_HDR_SIZE..], HEADER_SIZE as i32);
    out.write_all(&header)?;

    for s in streamlines {
        out.write_i32::<LittleEndian>(s.points.len() as i32)?;
        for p in &s.points {
            out.write_f32::<LittleEndian>(p.x)?;
            out.write_f32::<LittleEndian>(p.y)?;
            out.write_f32::<LittleEndian>(p.z)?;
        }
    }
    out.flush()?;
    Ok(())
}
