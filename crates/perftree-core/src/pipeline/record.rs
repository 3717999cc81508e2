//! 固定長レコード
//!
//! ```text
//! BoardRecord   (46 bytes): hash u64 | order u64 | occurrences u32 | board [u8; 26]
//! OrderedRecord (38 bytes):            order u64 | occurrences u32 | board [u8; 26]
//! ```
//!
//! 数値は全てリトルエンディアン。

use std::io::{self, Read, Write};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use crate::position::{COMPACT_BOARD_SIZE, CompactBoard};

/// ファイルに書き出す固定長レコード
pub trait Record: Sized {
    /// 1レコードのバイト数
    const SIZE: usize;

    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()>;

    /// 1レコード読む（レコード途中を含め、ストリーム終端なら None）
    fn read_from<R: Read>(reader: &mut R) -> io::Result<Option<Self>>;
}

/// バッファを埋める（終端に達したら false）
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

fn board_from(bytes: &[u8]) -> CompactBoard {
    let mut board = [0u8; COMPACT_BOARD_SIZE];
    board.copy_from_slice(&bytes[..COMPACT_BOARD_SIZE]);
    board
}

/// ハッシュ順のバッチファイルのレコード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardRecord {
    pub hash: u64,
    pub order: u64,
    pub occurrences: u32,
    pub board: CompactBoard,
}

impl BoardRecord {
    pub fn new(hash: u64, order: u64, occurrences: u32, board: CompactBoard) -> Self {
        Self {
            hash,
            order,
            occurrences,
            board,
        }
    }

    /// ハッシュを落とした形
    pub fn to_ordered(&self) -> OrderedRecord {
        OrderedRecord::new(self.order, self.occurrences, self.board)
    }
}

impl Record for BoardRecord {
    const SIZE: usize = 8 + 8 + 4 + COMPACT_BOARD_SIZE;

    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u64::<LittleEndian>(self.hash)?;
        writer.write_u64::<LittleEndian>(self.order)?;
        writer.write_u32::<LittleEndian>(self.occurrences)?;
        writer.write_all(&self.board)
    }

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Option<Self>> {
        let mut buf = [0u8; BoardRecord::SIZE];
        if !read_full(reader, &mut buf)? {
            return Ok(None);
        }
        Ok(Some(Self {
            hash: LittleEndian::read_u64(&buf[0..8]),
            order: LittleEndian::read_u64(&buf[8..16]),
            occurrences: LittleEndian::read_u32(&buf[16..20]),
            board: board_from(&buf[20..]),
        }))
    }
}

/// マージ後のレコード（初出順とコンパクト表現）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderedRecord {
    pub order: u64,
    pub occurrences: u32,
    pub board: CompactBoard,
}

impl OrderedRecord {
    pub fn new(order: u64, occurrences: u32, board: CompactBoard) -> Self {
        Self {
            order,
            occurrences,
            board,
        }
    }
}

impl Record for OrderedRecord {
    const SIZE: usize = 8 + 4 + COMPACT_BOARD_SIZE;

    fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u64::<LittleEndian>(self.order)?;
        writer.write_u32::<LittleEndian>(self.occurrences)?;
        writer.write_all(&self.board)
    }

    fn read_from<R: Read>(reader: &mut R) -> io::Result<Option<Self>> {
        let mut buf = [0u8; OrderedRecord::SIZE];
        if !read_full(reader, &mut buf)? {
            return Ok(None);
        }
        Ok(Some(Self {
            order: LittleEndian::read_u64(&buf[0..8]),
            occurrences: LittleEndian::read_u32(&buf[8..12]),
            board: board_from(&buf[12..]),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{Position, codec};

    #[test]
    fn test_record_sizes() {
        assert_eq!(BoardRecord::SIZE, 46);
        assert_eq!(OrderedRecord::SIZE, 38);
    }

    #[test]
    fn test_board_record_layout() {
        let board = codec::serialize(&Position::startpos());
        let rec = BoardRecord::new(0x0102_0304_0506_0708, 9, 3, board);
        let mut bytes = Vec::new();
        rec.write_to(&mut bytes).unwrap();
        assert_eq!(bytes.len(), BoardRecord::SIZE);
        assert_eq!(&bytes[0..8], &[8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(&bytes[8..16], &9u64.to_le_bytes());
        assert_eq!(&bytes[16..20], &3u32.to_le_bytes());
        assert_eq!(&bytes[20..], &board);

        let back = BoardRecord::read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(back, Some(rec));
    }

    #[test]
    fn test_truncated_record_is_end_of_data() {
        let rec = OrderedRecord::new(1, 1, [0; COMPACT_BOARD_SIZE]);
        let mut bytes = Vec::new();
        rec.write_to(&mut bytes).unwrap();
        bytes.truncate(OrderedRecord::SIZE - 1);
        assert_eq!(OrderedRecord::read_from(&mut bytes.as_slice()).unwrap(), None);
        let mut empty: &[u8] = &[];
        assert_eq!(OrderedRecord::read_from(&mut empty).unwrap(), None);
    }
}
