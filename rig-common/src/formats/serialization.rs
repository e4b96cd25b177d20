//! Bounds-checked reading and shared write helpers for pack streams.
//!
//! Writers use `byteorder` directly on any [`Write`]. Readers walk a fully
//! loaded buffer with [`PackReader`], which never reads past the end and
//! reports how much of the buffer is left so callers can enforce exact
//! consumption with [`PackReader::finish`].

use byteorder::{LittleEndian, WriteBytesExt};
use glam::{Mat4, Quat, Vec3};
use std::io::{self, Write};

/// Errors produced while decoding a pack buffer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unexpected end of data at offset {offset}: needed {needed} bytes, {remaining} left")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("{remaining} trailing bytes after offset {offset}")]
    TrailingBytes { offset: usize, remaining: usize },

    #[error("bone id {0} is outside the fixed bone capacity")]
    BoneIdOutOfRange(i32),

    #[error("{what} count {count} does not fit in the remaining {remaining} bytes")]
    CountTooLarge {
        what: &'static str,
        count: u32,
        remaining: usize,
    },
}

/// Cursor over an in-memory pack buffer
#[derive(Debug, Clone)]
pub struct PackReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> PackReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Current byte offset from the start of the buffer
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes not consumed yet
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Take the next `len` bytes, advancing the cursor
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if len > self.remaining() {
            return Err(DecodeError::UnexpectedEof {
                offset: self.offset,
                needed: len,
                remaining: self.remaining(),
            });
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.take_array().map(u32::from_le_bytes)
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        self.take_array().map(i32::from_le_bytes)
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        self.take_array().map(f32::from_le_bytes)
    }

    pub fn read_f32_array<const N: usize>(&mut self) -> Result<[f32; N], DecodeError> {
        let mut out = [0.0f32; N];
        for value in &mut out {
            *value = self.read_f32()?;
        }
        Ok(out)
    }

    pub fn read_i32_array<const N: usize>(&mut self) -> Result<[i32; N], DecodeError> {
        let mut out = [0i32; N];
        for value in &mut out {
            *value = self.read_i32()?;
        }
        Ok(out)
    }

    pub fn read_vec3(&mut self) -> Result<Vec3, DecodeError> {
        self.read_f32_array::<3>().map(Vec3::from_array)
    }

    /// Quaternion stored as (w, x, y, z)
    pub fn read_quat(&mut self) -> Result<Quat, DecodeError> {
        let [w, x, y, z] = self.read_f32_array::<4>()?;
        Ok(Quat::from_xyzw(x, y, z, w))
    }

    /// Row-major 4x4 matrix
    pub fn read_mat4(&mut self) -> Result<Mat4, DecodeError> {
        let rows = self.read_f32_array::<16>()?;
        Ok(Mat4::from_cols_array(&rows).transpose())
    }

    /// Read an element count and check that `count * element_size` bytes are
    /// still available before anything is allocated for them.
    pub fn read_count(
        &mut self,
        what: &'static str,
        element_size: usize,
    ) -> Result<usize, DecodeError> {
        let count = self.read_u32()?;
        let needed = (count as usize).checked_mul(element_size);
        match needed {
            Some(needed) if needed <= self.remaining() => Ok(count as usize),
            _ => Err(DecodeError::CountTooLarge {
                what,
                count,
                remaining: self.remaining(),
            }),
        }
    }

    /// Require that the whole buffer has been consumed
    pub fn finish(self) -> Result<(), DecodeError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::TrailingBytes {
                offset: self.offset,
                remaining: self.remaining(),
            })
        }
    }
}

pub(crate) fn write_f32s<W: Write>(w: &mut W, values: &[f32]) -> io::Result<()> {
    for &value in values {
        w.write_f32::<LittleEndian>(value)?;
    }
    Ok(())
}

pub(crate) fn write_vec3<W: Write>(w: &mut W, v: Vec3) -> io::Result<()> {
    write_f32s(w, &v.to_array())
}

pub(crate) fn write_quat<W: Write>(w: &mut W, q: Quat) -> io::Result<()> {
    write_f32s(w, &[q.w, q.x, q.y, q.z])
}

pub(crate) fn write_mat4<W: Write>(w: &mut W, m: &Mat4) -> io::Result<()> {
    // Columns of the transpose are the rows of `m`
    write_f32s(w, &m.transpose().to_cols_array())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_primitives() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&7u32.to_le_bytes());
        bytes.extend_from_slice(&(-3i32).to_le_bytes());
        bytes.extend_from_slice(&1.5f32.to_le_bytes());

        let mut reader = PackReader::new(&bytes);
        assert_eq!(reader.read_u32().unwrap(), 7);
        assert_eq!(reader.read_i32().unwrap(), -3);
        assert_eq!(reader.read_f32().unwrap(), 1.5);
        assert!(reader.is_empty());
        reader.finish().unwrap();
    }

    #[test]
    fn test_reader_reports_eof() {
        let bytes = [1u8, 2, 3];
        let mut reader = PackReader::new(&bytes);
        assert_eq!(
            reader.read_u32(),
            Err(DecodeError::UnexpectedEof {
                offset: 0,
                needed: 4,
                remaining: 3
            })
        );
    }

    #[test]
    fn test_reader_rejects_trailing_bytes() {
        let bytes = [0u8; 6];
        let mut reader = PackReader::new(&bytes);
        reader.read_u32().unwrap();
        assert_eq!(
            reader.finish(),
            Err(DecodeError::TrailingBytes {
                offset: 4,
                remaining: 2
            })
        );
    }

    #[test]
    fn test_count_larger_than_buffer() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1000u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 8]);
        let mut reader = PackReader::new(&bytes);
        assert!(matches!(
            reader.read_count("index", 4),
            Err(DecodeError::CountTooLarge { count: 1000, .. })
        ));
    }

    #[test]
    fn test_mat4_is_row_major_on_disk() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let mut bytes = Vec::new();
        write_mat4(&mut bytes, &m).unwrap();

        // Translation sits in the last column, i.e. element 3 of each row
        let floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(floats[3], 1.0);
        assert_eq!(floats[7], 2.0);
        assert_eq!(floats[11], 3.0);
        assert_eq!(floats[15], 1.0);

        let mut reader = PackReader::new(&bytes);
        assert_eq!(reader.read_mat4().unwrap(), m);
    }

    #[test]
    fn test_quat_is_wxyz_on_disk() {
        let q = Quat::from_xyzw(0.1, 0.2, 0.3, 0.9);
        let mut bytes = Vec::new();
        write_quat(&mut bytes, q).unwrap();
        assert_eq!(&bytes[0..4], &0.9f32.to_le_bytes());

        let mut reader = PackReader::new(&bytes);
        assert_eq!(reader.read_quat().unwrap(), q);
    }
}
