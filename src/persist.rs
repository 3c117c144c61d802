//! Flat binary model files.
//!
//! Layout, in order, host-native sizes and byte order:
//!
//! ```text
//! feature_size   usize
//! num_classes    usize
//! learning_rate  f32
//! weights        f64 x (num_classes * feature_size), row-major by class
//! biases         f64 x num_classes
//! ```
//!
//! Reading is strict: a truncated file is an I/O error (unexpected EOF) and trailing bytes after
//! the biases are rejected, so a successful load always yields a fully defined model.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::mem::size_of;
use std::path::Path;

use log::debug;

use crate::model::{param_len, validate_learning_rate};
use crate::{Error, Model, Result};

const HEADER_LEN: usize = 2 * size_of::<usize>() + size_of::<f32>();

/// Upper bound on parameters reserved ahead of reading them.
const READ_CHUNK: usize = 1 << 16;

impl Model {
    /// Number of bytes [`Model::write_to`] produces for this model.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + (self.weights().len() + self.biases().len()) * size_of::<f64>()
    }

    /// Write the binary layout to `w`.
    ///
    /// Parameters are written as-is, non-finite values included; [`Model::read_from`] accepts
    /// them back unchanged.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.to_bytes())
    }

    /// Read the binary layout from `r`, consuming exactly one model.
    ///
    /// I/O failures (including a truncated stream) surface as [`io::Error`] wrapped in
    /// [`Error::Io`] by the path-based helpers; malformed headers are [`Error::InvalidData`].
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        Self::read_inner(r).map_err(|e| match e {
            ReadError::Io(source) => Error::io("<reader>", source),
            ReadError::Model(e) => e,
        })
    }

    fn read_inner<R: Read>(r: &mut R) -> std::result::Result<Self, ReadError> {
        let feature_size = usize::from_ne_bytes(read_array(r)?);
        let num_classes = usize::from_ne_bytes(read_array(r)?);
        let learning_rate = f32::from_ne_bytes(read_array(r)?);

        if feature_size == 0 || num_classes == 0 {
            return Err(Error::InvalidData(format!(
                "model header has zero dims: feature_size={feature_size} num_classes={num_classes}"
            ))
            .into());
        }
        validate_learning_rate(learning_rate)
            .map_err(|e| Error::InvalidData(format!("model header: {e}")))?;
        let len = param_len(feature_size, num_classes)
            .map_err(|e| Error::InvalidData(format!("model header: {e}")))?;

        let weights = read_f64s(r, len)?;
        let biases = read_f64s(r, num_classes)?;

        Ok(Model::from_raw_parts(
            feature_size,
            num_classes,
            learning_rate,
            weights,
            biases,
        )?)
    }

    /// Encode into a new buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&self.feature_size().to_ne_bytes());
        out.extend_from_slice(&self.num_classes().to_ne_bytes());
        out.extend_from_slice(&self.learning_rate().to_ne_bytes());
        for v in self.weights().iter().chain(self.biases()) {
            out.extend_from_slice(&v.to_ne_bytes());
        }
        out
    }

    /// Decode a buffer holding exactly one model.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut cursor = bytes;
        let model = Self::read_inner(&mut cursor).map_err(|e| match e {
            ReadError::Io(source) => Error::InvalidData(format!("model bytes: {source}")),
            ReadError::Model(e) => e,
        })?;
        if !cursor.is_empty() {
            return Err(Error::InvalidData(format!(
                "{} trailing bytes after model",
                cursor.len()
            )));
        }
        Ok(model)
    }

    /// Save to `path`, creating or truncating the file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let p = path.as_ref();
        let file = File::create(p).map_err(|e| Error::io(p, e))?;
        let mut w = BufWriter::new(file);
        self.write_to(&mut w)
            .and_then(|()| w.flush())
            .map_err(|e| Error::io(p, e))?;
        debug!(
            "saved {}x{} model to {}",
            self.num_classes(),
            self.feature_size(),
            p.display()
        );
        Ok(())
    }

    /// Load a model saved with [`Model::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let file = File::open(p).map_err(|e| Error::io(p, e))?;
        let mut r = BufReader::new(file);

        let model = Self::read_inner(&mut r).map_err(|e| match e {
            ReadError::Io(source) => Error::io(p, source),
            ReadError::Model(e) => e,
        })?;

        let mut probe = [0_u8; 1];
        match r.read(&mut probe) {
            Ok(0) => {}
            Ok(_) => {
                return Err(Error::InvalidData(format!(
                    "trailing bytes after model in {}",
                    p.display()
                )));
            }
            Err(e) => return Err(Error::io(p, e)),
        }

        debug!(
            "loaded {}x{} model from {}",
            model.num_classes(),
            model.feature_size(),
            p.display()
        );
        Ok(model)
    }
}

enum ReadError {
    Io(io::Error),
    Model(Error),
}

impl From<io::Error> for ReadError {
    fn from(e: io::Error) -> Self {
        ReadError::Io(e)
    }
}

impl From<Error> for ReadError {
    fn from(e: Error) -> Self {
        ReadError::Model(e)
    }
}

fn read_array<R: Read, const N: usize>(r: &mut R) -> io::Result<[u8; N]> {
    let mut buf = [0_u8; N];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

/// Reads `len` values, growing the buffer as data arrives so a corrupt header cannot force a
/// huge allocation before the stream runs out.
fn read_f64s<R: Read>(r: &mut R, len: usize) -> std::result::Result<Vec<f64>, ReadError> {
    let mut out = Vec::new();
    while out.len() < len {
        let chunk = (len - out.len()).min(READ_CHUNK);
        out.try_reserve_exact(chunk).map_err(|e| {
            Error::Allocation(format!("cannot allocate {len} parameters: {e}"))
        })?;
        for _ in 0..chunk {
            out.push(f64::from_ne_bytes(read_array(r)?));
        }
    }
    Ok(out)
}
