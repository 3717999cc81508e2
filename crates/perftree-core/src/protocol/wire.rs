//! リトルエンディアンの読み書きヘルパー

use byteorder::{LittleEndian, ReadBytesExt};

use super::error::{ProtocolError, ProtocolResult};

/// バイト列からの逐次読み出し（不足は Truncated）
pub(crate) struct Decoder<'a> {
    data: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn i32(&mut self, what: &'static str) -> ProtocolResult<i32> {
        self.data.read_i32::<LittleEndian>().map_err(|_| ProtocolError::Truncated(what))
    }

    pub(crate) fn i64(&mut self, what: &'static str) -> ProtocolResult<i64> {
        self.data.read_i64::<LittleEndian>().map_err(|_| ProtocolError::Truncated(what))
    }

    pub(crate) fn u64(&mut self, what: &'static str) -> ProtocolResult<u64> {
        self.data.read_u64::<LittleEndian>().map_err(|_| ProtocolError::Truncated(what))
    }

    pub(crate) fn f32(&mut self, what: &'static str) -> ProtocolResult<f32> {
        self.data.read_f32::<LittleEndian>().map_err(|_| ProtocolError::Truncated(what))
    }

    /// i32 の長さを読み、負なら NegativeLength
    pub(crate) fn length(&mut self, what: &'static str) -> ProtocolResult<usize> {
        let n = self.i32(what)?;
        usize::try_from(n).map_err(|_| ProtocolError::NegativeLength(n))
    }

    pub(crate) fn bytes(&mut self, n: usize, what: &'static str) -> ProtocolResult<&'a [u8]> {
        if self.data.len() < n {
            return Err(ProtocolError::Truncated(what));
        }
        let (head, tail) = self.data.split_at(n);
        self.data = tail;
        Ok(head)
    }

    /// 読み残しがないことを確認
    pub(crate) fn finish(self) -> ProtocolResult<()> {
        match self.data.len() {
            0 => Ok(()),
            n => Err(ProtocolError::TrailingBytes(n)),
        }
    }
}

/// 長さを i32 で書く
pub(crate) fn put_len(out: &mut Vec<u8>, len: usize) {
    debug_assert!(len <= i32::MAX as usize);
    put_i32(out, len as i32);
}

pub(crate) fn put_i32(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn put_i64(out: &mut Vec<u8>, v: i64) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn put_u64(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn put_f32(out: &mut Vec<u8>, v: f32) {
    out.extend_from_slice(&v.to_le_bytes());
}
