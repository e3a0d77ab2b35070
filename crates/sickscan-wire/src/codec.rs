//! Little-endian primitives over byte buffers.
//!
//! Every integer the scanner puts on the wire goes through this module, so the
//! byte-order policy lives here and nowhere else. Reads take an offset into a
//! borrowed slice; writes take an offset into a mutable slice and return the
//! next free offset, so sequential layouts can be chained:
//!
//! ```
//! use sickscan_wire::codec::{write_u16_le, write_u8};
//!
//! let mut buf = [0u8; 3];
//! let next = write_u8(&mut buf, 0, 0xAA).unwrap();
//! let next = write_u16_le(&mut buf, next, 0x1234).unwrap();
//! assert_eq!(next, 3);
//! assert_eq!(buf, [0xAA, 0x34, 0x12]);
//! ```

use crate::error::{Result, WireError};

fn bounds(available: usize, offset: usize, len: usize) -> Result<std::ops::Range<usize>> {
    match offset.checked_add(len) {
        Some(end) if end <= available => Ok(offset..end),
        _ => Err(WireError::BufferUnderrun {
            offset,
            len,
            available,
        }),
    }
}

fn read_array<const N: usize>(buf: &[u8], offset: usize) -> Result<[u8; N]> {
    let range = bounds(buf.len(), offset, N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[range]);
    Ok(out)
}

fn write_array<const N: usize>(buf: &mut [u8], offset: usize, bytes: [u8; N]) -> Result<usize> {
    let range = bounds(buf.len(), offset, N)?;
    let next = range.end;
    buf[range].copy_from_slice(&bytes);
    Ok(next)
}

/// Check that `len` bytes starting at `offset` lie inside `buf`.
pub fn ensure(buf: &[u8], offset: usize, len: usize) -> Result<()> {
    bounds(buf.len(), offset, len).map(|_| ())
}

/// Borrow `len` bytes starting at `offset`.
pub fn read_slice(buf: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    let range = bounds(buf.len(), offset, len)?;
    Ok(&buf[range])
}

pub fn read_u8(buf: &[u8], offset: usize) -> Result<u8> {
    Ok(read_array::<1>(buf, offset)?[0])
}

pub fn read_u16_le(buf: &[u8], offset: usize) -> Result<u16> {
    read_array(buf, offset).map(u16::from_le_bytes)
}

pub fn read_i16_le(buf: &[u8], offset: usize) -> Result<i16> {
    read_array(buf, offset).map(i16::from_le_bytes)
}

pub fn read_u32_le(buf: &[u8], offset: usize) -> Result<u32> {
    read_array(buf, offset).map(u32::from_le_bytes)
}

pub fn read_i32_le(buf: &[u8], offset: usize) -> Result<i32> {
    read_array(buf, offset).map(i32::from_le_bytes)
}

pub fn write_u8(buf: &mut [u8], offset: usize, value: u8) -> Result<usize> {
    write_array(buf, offset, [value])
}

pub fn write_u16_le(buf: &mut [u8], offset: usize, value: u16) -> Result<usize> {
    write_array(buf, offset, value.to_le_bytes())
}

pub fn write_i16_le(buf: &mut [u8], offset: usize, value: i16) -> Result<usize> {
    write_array(buf, offset, value.to_le_bytes())
}

pub fn write_u32_le(buf: &mut [u8], offset: usize, value: u32) -> Result<usize> {
    write_array(buf, offset, value.to_le_bytes())
}

pub fn write_i32_le(buf: &mut [u8], offset: usize, value: i32) -> Result<usize> {
    write_array(buf, offset, value.to_le_bytes())
}

/// Copy `bytes` into `buf` at `offset`, returning the next free offset.
pub fn write_slice(buf: &mut [u8], offset: usize, bytes: &[u8]) -> Result<usize> {
    let range = bounds(buf.len(), offset, bytes.len())?;
    let next = range.end;
    buf[range].copy_from_slice(bytes);
    Ok(next)
}
