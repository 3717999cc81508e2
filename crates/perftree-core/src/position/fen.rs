//! FEN 形式の読み書き

use super::board::{Position, PositionError};
use crate::types::{CastlingRights, Color, Piece, Square};

/// 平手初期局面の FEN
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// FEN 解析エラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    #[error("missing FEN field: {0}")]
    MissingField(&'static str),
    #[error("too many FEN fields: {0}")]
    TooManyFields(usize),
    #[error("expected 8 ranks, found {0}")]
    RankCount(usize),
    #[error("invalid rank layout: {0}")]
    InvalidRank(String),
    #[error("invalid piece character: {0}")]
    InvalidPiece(char),
    #[error("invalid side to move: {0}")]
    InvalidSideToMove(String),
    #[error("invalid castling rights: {0}")]
    InvalidCastling(String),
    #[error("invalid en passant square: {0}")]
    InvalidEnPassant(String),
    #[error("invalid move counter: {0}")]
    InvalidCounter(String),
    #[error("invalid position: {0}")]
    Invalid(#[from] PositionError),
}

impl Position {
    /// FEN から局面を生成
    ///
    /// 手数の2フィールドは省略可能（0 と 1）。
    pub fn from_fen(fen: &str) -> Result<Position, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() > 6 {
            return Err(FenError::TooManyFields(fields.len()));
        }
        let placement = fields.first().ok_or(FenError::MissingField("placement"))?;
        let side = fields.get(1).ok_or(FenError::MissingField("side to move"))?;
        let castling = fields.get(2).ok_or(FenError::MissingField("castling"))?;
        let en_passant = fields.get(3).ok_or(FenError::MissingField("en passant"))?;

        let mut pos = Position::empty();
        parse_placement(&mut pos, placement)?;

        let side_to_move = match *side {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::InvalidSideToMove(other.to_string())),
        };
        pos.set_side_to_move(side_to_move);

        let rights = CastlingRights::from_fen(castling)
            .ok_or_else(|| FenError::InvalidCastling(castling.to_string()))?;
        pos.set_castling_rights(rights);

        if *en_passant != "-" {
            let sq = Square::from_algebraic(en_passant)
                .ok_or_else(|| FenError::InvalidEnPassant(en_passant.to_string()))?;
            let expected_rank = match side_to_move {
                Color::White => 5,
                Color::Black => 2,
            };
            if sq.rank() != expected_rank {
                return Err(FenError::InvalidEnPassant(en_passant.to_string()));
            }
            pos.set_ep_file(Some(sq.file()));
        }

        let halfmove = parse_counter(fields.get(4).copied(), 0)?;
        let fullmove = parse_counter(fields.get(5).copied(), 1)?;
        pos.set_counters(halfmove, fullmove);

        pos.finish_setup()?;
        Ok(pos)
    }

    /// FEN を出力（局面が持つ手数を使用）
    pub fn to_fen(&self) -> String {
        self.to_fen_with_counters(self.halfmove_clock(), self.fullmove_number())
    }

    /// 手数を指定して FEN を出力
    pub fn to_fen_with_counters(&self, halfmove_clock: u32, fullmove_number: u32) -> String {
        let mut fen = String::with_capacity(90);
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                let pc = self.piece_on(Square::from_u8_masked(rank * 8 + file));
                if pc.is_none() {
                    empty += 1;
                    continue;
                }
                if empty > 0 {
                    fen.push(char::from(b'0' + empty));
                    empty = 0;
                }
                fen.push(pc.to_char());
            }
            if empty > 0 {
                fen.push(char::from(b'0' + empty));
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(self.side_to_move().to_char());
        fen.push(' ');
        fen.push_str(&self.castling_rights().to_string());
        fen.push(' ');
        match self.ep_square() {
            Some(sq) => fen.push_str(&sq.to_string()),
            None => fen.push('-'),
        }
        fen.push_str(&format!(" {halfmove_clock} {fullmove_number}"));
        fen
    }
}

fn parse_placement(pos: &mut Position, placement: &str) -> Result<(), FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::RankCount(ranks.len()));
    }
    for (i, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - i as u8;
        let mut file = 0u8;
        for c in rank_str.chars() {
            if let Some(skip) = c.to_digit(10) {
                if skip == 0 || skip > 8 {
                    return Err(FenError::InvalidRank(rank_str.to_string()));
                }
                file += skip as u8;
            } else {
                let pc = Piece::from_char(c).ok_or(FenError::InvalidPiece(c))?;
                let sq = Square::from_file_rank(file, rank)
                    .ok_or_else(|| FenError::InvalidRank(rank_str.to_string()))?;
                pos.put_piece(pc, sq);
                file += 1;
            }
            if file > 8 {
                return Err(FenError::InvalidRank(rank_str.to_string()));
            }
        }
        if file != 8 {
            return Err(FenError::InvalidRank(rank_str.to_string()));
        }
    }
    Ok(())
}

fn parse_counter(field: Option<&str>, default: u32) -> Result<u32, FenError> {
    match field {
        None => Ok(default),
        Some(s) => s.parse().map_err(|_| FenError::InvalidCounter(s.to_string())),
    }
}
