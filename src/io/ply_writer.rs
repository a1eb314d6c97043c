// Copyright @yucwang 2026

use crate::core::error::SampleError;
use crate::math::constants::{Float, Vector3f};

use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::ops::{BitOr, BitOrAssign};
use std::path::{Path, PathBuf};

/// Bytes per stored component, used to turn a byte budget into a sample
/// count.
pub const BYTES_PER_COMPONENT: usize = std::mem::size_of::<Float>();

/// Set of per-sample attributes written to the point cloud.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttributeMask(u8);

impl AttributeMask {
    pub const VERTICES: AttributeMask = AttributeMask(1);
    pub const COLORS: AttributeMask = AttributeMask(2);
    pub const NORMALS: AttributeMask = AttributeMask(4);

    pub fn empty() -> Self {
        AttributeMask(0)
    }

    pub fn from_bits(bits: u8) -> Self {
        AttributeMask(bits & 0b111)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: AttributeMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn count(&self) -> usize {
        self.0.count_ones() as usize
    }
}

impl Default for AttributeMask {
    fn default() -> Self {
        AttributeMask::VERTICES
    }
}

impl BitOr for AttributeMask {
    type Output = AttributeMask;

    fn bitor(self, rhs: AttributeMask) -> AttributeMask {
        AttributeMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for AttributeMask {
    fn bitor_assign(&mut self, rhs: AttributeMask) {
        self.0 |= rhs.0;
    }
}

/// One evaluated surface sample. Fields outside the writer's mask are
/// ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointSample {
    pub position: Vector3f,
    pub normal: Vector3f,
    pub color: Vector3f,
}

/// Samples that fit in `byte_budget`, counting three components per active
/// attribute. Never less than one.
pub fn chunk_capacity(byte_budget: usize, mask: AttributeMask) -> usize {
    let per_sample = BYTES_PER_COMPONENT * mask.count() * 3;
    if per_sample == 0 {
        return 1;
    }
    (byte_budget / per_sample).max(1)
}

/// Binary little-endian PLY header for `count` vertices with the properties
/// selected by `mask`, in position, normal, color order.
pub fn header(mask: AttributeMask, count: usize) -> String {
    let mut out = String::with_capacity(256);
    out.push_str("ply\n");
    out.push_str("format binary_little_endian 1.0\n");
    out.push_str(&format!("element vertex {}\n", count));
    if mask.contains(AttributeMask::VERTICES) {
        out.push_str("property float x\nproperty float y\nproperty float z\n");
    }
    if mask.contains(AttributeMask::NORMALS) {
        out.push_str("property float nx\nproperty float ny\nproperty float nz\n");
    }
    if mask.contains(AttributeMask::COLORS) {
        out.push_str("property uchar red\nproperty uchar green\nproperty uchar blue\n");
    }
    out.push_str("end_header\n");
    out
}

/// Size in bytes of one body record for `mask`.
pub fn record_size(mask: AttributeMask) -> usize {
    let mut size = 0;
    if mask.contains(AttributeMask::VERTICES) {
        size += 3 * BYTES_PER_COMPONENT;
    }
    if mask.contains(AttributeMask::NORMALS) {
        size += 3 * BYTES_PER_COMPONENT;
    }
    if mask.contains(AttributeMask::COLORS) {
        size += 3;
    }
    size
}

fn quantize(c: Float) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Scratch storage holding the record body until the final count is known.
pub trait ScratchBody: Read + Write + Seek {}

impl<T: Read + Write + Seek> ScratchBody for T {}

/// Streams samples into a PLY file whose vertex count is only known at the
/// end.
///
/// Samples are buffered per attribute up to `capacity`, then appended to an
/// unnamed scratch file next to the destination. `finalize` writes the
/// header with the true count into the destination followed by the scratch
/// body. The scratch file is removed by the OS once closed; the destination
/// is removed when the writer is dropped without a successful `finalize`.
pub struct PlyChunkWriter {
    path: PathBuf,
    destination: Option<File>,
    body: Option<BufWriter<Box<dyn ScratchBody>>>,
    mask: AttributeMask,
    capacity: usize,
    positions: Vec<Vector3f>,
    normals: Vec<Vector3f>,
    colors: Vec<[u8; 3]>,
    buffered: usize,
    peak_buffered: usize,
    written: usize,
    chunks_flushed: usize,
    finished: bool,
}

impl PlyChunkWriter {
    /// Opens an unnamed scratch file next to `path`, then the destination.
    /// Failing to create either is reported as `SampleError::Output`.
    pub fn create<P: AsRef<Path>>(path: P, mask: AttributeMask, byte_budget: usize) -> Result<Self, SampleError> {
        if mask.count() == 0 {
            return Err(SampleError::NoAttributes);
        }

        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let body = tempfile::tempfile_in(&dir).map_err(|source| SampleError::Output {
            path: path.to_path_buf(),
            source,
        })?;

        Self::with_body(path, mask, byte_budget, Box::new(body))
    }

    /// Like `create`, but streams the record body into `body`.
    pub fn with_body<P: AsRef<Path>>(
        path: P,
        mask: AttributeMask,
        byte_budget: usize,
        body: Box<dyn ScratchBody>,
    ) -> Result<Self, SampleError> {
        if mask.count() == 0 {
            return Err(SampleError::NoAttributes);
        }

        let path = path.as_ref().to_path_buf();
        let destination = File::create(&path).map_err(|source| SampleError::Output {
            path: path.clone(),
            source,
        })?;

        let capacity = chunk_capacity(byte_budget, mask);
        let reserve = |flag: AttributeMask| if mask.contains(flag) { capacity } else { 0 };
        log::debug!("PLY writer for {}: {} samples per chunk.", path.display(), capacity);

        Ok(Self {
            destination: Some(destination),
            body: Some(BufWriter::new(body)),
            mask,
            capacity,
            positions: Vec::with_capacity(reserve(AttributeMask::VERTICES)),
            normals: Vec::with_capacity(reserve(AttributeMask::NORMALS)),
            colors: Vec::with_capacity(reserve(AttributeMask::COLORS)),
            buffered: 0,
            peak_buffered: 0,
            written: 0,
            chunks_flushed: 0,
            finished: false,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mask(&self) -> AttributeMask {
        self.mask
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn buffered(&self) -> usize {
        self.buffered
    }

    pub fn peak_buffered(&self) -> usize {
        self.peak_buffered
    }

    /// Samples appended so far, flushed or not.
    pub fn total(&self) -> usize {
        self.written + self.buffered
    }

    pub fn chunks_flushed(&self) -> usize {
        self.chunks_flushed
    }

    /// Buffers the active fields of `sample`. Colors are quantized to 8 bits
    /// here.
    pub fn append(&mut self, sample: &PointSample) {
        if self.mask.contains(AttributeMask::VERTICES) {
            self.positions.push(sample.position);
        }
        if self.mask.contains(AttributeMask::NORMALS) {
            self.normals.push(sample.normal);
        }
        if self.mask.contains(AttributeMask::COLORS) {
            let c = &sample.color;
            self.colors.push([quantize(c.x), quantize(c.y), quantize(c.z)]);
        }
        self.buffered += 1;
        self.peak_buffered = self.peak_buffered.max(self.buffered);
    }

    pub fn is_full(&self) -> bool {
        self.buffered >= self.capacity
    }

    /// Flushes when the buffers hold `capacity` samples. Returns whether a
    /// flush happened.
    pub fn flush_if_full(&mut self) -> Result<bool, SampleError> {
        if !self.is_full() {
            return Ok(false);
        }
        self.flush()?;
        Ok(true)
    }

    /// Appends every buffered sample to the body and clears the buffers.
    pub fn flush(&mut self) -> Result<(), SampleError> {
        if self.buffered == 0 {
            return Ok(());
        }

        let body = self.body.as_mut().ok_or_else(finalized_error)?;
        for i in 0..self.buffered {
            if self.mask.contains(AttributeMask::VERTICES) {
                write_vector(body, &self.positions[i])?;
            }
            if self.mask.contains(AttributeMask::NORMALS) {
                write_vector(body, &self.normals[i])?;
            }
            if self.mask.contains(AttributeMask::COLORS) {
                body.write_all(&self.colors[i])?;
            }
        }
        body.flush()?;

        self.positions.clear();
        self.normals.clear();
        self.colors.clear();
        self.written += self.buffered;
        self.buffered = 0;
        self.chunks_flushed += 1;
        log::debug!("Flushed chunk {} ({} samples on disk).", self.chunks_flushed, self.written);
        Ok(())
    }

    /// Flushes what is left, then writes header and body to the destination.
    /// Returns the element count recorded in the header.
    pub fn finalize(mut self) -> Result<usize, SampleError> {
        self.flush()?;

        let mut body = self
            .body
            .take()
            .ok_or_else(finalized_error)?
            .into_inner()
            .map_err(|e| e.into_error())?;
        body.seek(SeekFrom::Start(0))?;

        let destination = self.destination.take().ok_or_else(finalized_error)?;
        let mut out = BufWriter::new(destination);
        out.write_all(header(self.mask, self.written).as_bytes())?;
        io::copy(&mut body, &mut out)?;
        out.flush()?;

        self.finished = true;
        Ok(self.written)
    }
}

impl Drop for PlyChunkWriter {
    fn drop(&mut self) {
        if !self.finished {
            self.body.take();
            self.destination.take();
            let _ = fs::remove_file(&self.path);
        }
    }
}

fn write_vector<W: Write>(out: &mut W, v: &Vector3f) -> io::Result<()> {
    out.write_f32::<LittleEndian>(v.x)?;
    out.write_f32::<LittleEndian>(v.y)?;
    out.write_f32::<LittleEndian>(v.z)
}

fn finalized_error() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "ply writer already finalized")
}
