//! 局面（Position）と指し手の適用・取り消し

use std::fmt;

use super::zobrist::{zobrist_castling, zobrist_en_passant, zobrist_psq, zobrist_side};
use crate::bitboard::{
    Bitboard, bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks,
};
use crate::types::{CastlingRights, Color, Move, MoveKind, Piece, PieceType, Square};

/// 局面の整合性エラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("expected exactly one {0:?} king, found {1}")]
    KingCount(Color, u32),
    #[error("pawn on back rank: {0}")]
    PawnOnBackRank(Square),
    #[error("castling rights {0} do not match king and rook placement")]
    CastlingMismatch(CastlingRights),
    #[error("en passant square {0} is not consistent with the position")]
    EnPassantMismatch(Square),
    #[error("side not to move is in check")]
    OpponentInCheck,
}

/// do_move で失われる情報（undo_move で復元する）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoInfo {
    captured: Piece,
    castling: CastlingRights,
    ep_file: Option<u8>,
    halfmove_clock: u32,
    hash: u64,
}

impl UndoInfo {
    /// 取った駒
    #[inline]
    pub fn captured(&self) -> Piece {
        self.captured
    }
}

/// 局面
#[derive(Clone, PartialEq, Eq)]
pub struct Position {
    /// 駒種ごとの配置 [PieceType]
    by_type: [Bitboard; PieceType::NUM],
    /// 手番ごとの配置 [Color]
    by_color: [Bitboard; Color::NUM],
    /// 升ごとの駒
    board: [Piece; Square::NUM],
    side_to_move: Color,
    castling: CastlingRights,
    /// アンパッサンの筋（直前の2歩前進）
    ep_file: Option<u8>,
    halfmove_clock: u32,
    fullmove_number: u32,
    hash: u64,
}

impl Position {
    /// 駒のない局面（組み立て用）
    pub(crate) fn empty() -> Position {
        Position {
            by_type: [Bitboard::EMPTY; PieceType::NUM],
            by_color: [Bitboard::EMPTY; Color::NUM],
            board: [Piece::NONE; Square::NUM],
            side_to_move: Color::White,
            castling: CastlingRights::NONE,
            ep_file: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
        }
    }

    /// 平手初期局面
    pub fn startpos() -> Position {
        let mut pos = Position::empty();
        const BACK_RANK: [PieceType; 8] = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];
        for file in 0..8u8 {
            let pt = BACK_RANK[file as usize];
            pos.put_piece(Piece::new(Color::White, pt), Square::from_u8_masked(file));
            pos.put_piece(Piece::new(Color::White, PieceType::Pawn), Square::from_u8_masked(8 + file));
            pos.put_piece(Piece::new(Color::Black, PieceType::Pawn), Square::from_u8_masked(48 + file));
            pos.put_piece(Piece::new(Color::Black, pt), Square::from_u8_masked(56 + file));
        }
        pos.castling = CastlingRights::ALL;
        pos.hash = pos.compute_hash();
        pos
    }

    // ===== 参照 =====

    #[inline]
    pub fn piece_on(&self, sq: Square) -> Piece {
        self.board[sq.index()]
    }

    /// 駒種の配置（両手番）
    #[inline]
    pub fn pieces(&self, pt: PieceType) -> Bitboard {
        self.by_type[pt.index()]
    }

    /// 手番と駒種の配置
    #[inline]
    pub fn pieces_of(&self, color: Color, pt: PieceType) -> Bitboard {
        self.by_type[pt.index()] & self.by_color[color.index()]
    }

    /// 手番の全駒
    #[inline]
    pub fn color_bb(&self, color: Color) -> Bitboard {
        self.by_color[color.index()]
    }

    #[inline]
    pub fn occupied(&self) -> Bitboard {
        self.by_color[0] | self.by_color[1]
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        self.pieces_of(color, PieceType::King).lsb_unchecked()
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    /// アンパッサンの筋（0..8）
    #[inline]
    pub fn ep_file(&self) -> Option<u8> {
        self.ep_file
    }

    /// アンパッサンで移動する先の升
    #[inline]
    pub fn ep_square(&self) -> Option<Square> {
        let rank = match self.side_to_move {
            Color::White => 5,
            Color::Black => 2,
        };
        self.ep_file.and_then(|file| Square::from_file_rank(file, rank))
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Zobristハッシュ（直前の2歩前進があればアンパッサン筋を常に含む）
    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// ハッシュの16進表記（小文字16桁）
    pub fn hash_hex(&self) -> String {
        format!("{:016x}", self.hash)
    }

    /// 実際にはアンパッサンできない場合にアンパッサン筋のキーを除いたハッシュ
    ///
    /// 同じ駒配置・権利・手番の局面は、この値が一致する。
    pub fn normalized_hash(&self) -> u64 {
        match self.ep_file {
            Some(file) if !self.has_legal_en_passant() => self.hash ^ zobrist_en_passant(file),
            _ => self.hash,
        }
    }

    /// 実際に指せるアンパッサンの筋（指せなければ None）
    pub fn executable_ep_file(&self) -> Option<u8> {
        self.ep_file.filter(|_| self.has_legal_en_passant())
    }

    /// 全駒からハッシュを計算し直す
    pub fn compute_hash(&self) -> u64 {
        let mut hash = 0;
        for sq in self.occupied() {
            hash ^= zobrist_psq(self.piece_on(sq), sq);
        }
        hash ^= zobrist_castling(self.castling);
        if let Some(file) = self.ep_file {
            hash ^= zobrist_en_passant(file);
        }
        if self.side_to_move == Color::White {
            hash ^= zobrist_side();
        }
        hash
    }

    // ===== 利き =====

    /// sq に利いている駒（両手番）
    pub fn attackers_to(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        let rooks = self.pieces(PieceType::Rook) | self.pieces(PieceType::Queen);
        let bishops = self.pieces(PieceType::Bishop) | self.pieces(PieceType::Queen);
        (pawn_attacks(Color::White, sq) & self.pieces_of(Color::Black, PieceType::Pawn))
            | (pawn_attacks(Color::Black, sq) & self.pieces_of(Color::White, PieceType::Pawn))
            | (knight_attacks(sq) & self.pieces(PieceType::Knight))
            | (king_attacks(sq) & self.pieces(PieceType::King))
            | (rook_attacks(sq, occupied) & rooks)
            | (bishop_attacks(sq, occupied) & bishops)
    }

    /// by 側の駒が sq に利いているか
    #[inline]
    pub fn is_attacked(&self, sq: Square, by: Color, occupied: Bitboard) -> bool {
        (self.attackers_to(sq, occupied) & self.color_bb(by)).is_not_empty()
    }

    /// 手番側の玉に王手している駒
    #[inline]
    pub fn checkers(&self) -> Bitboard {
        let us = self.side_to_move;
        self.attackers_to(self.king_square(us), self.occupied()) & self.color_bb(!us)
    }

    #[inline]
    pub fn in_check(&self) -> bool {
        self.checkers().is_not_empty()
    }

    // ===== 盤面操作（ハッシュは更新しない） =====

    pub(crate) fn put_piece(&mut self, pc: Piece, sq: Square) {
        let bb = Bitboard::from_square(sq);
        self.by_type[pc.piece_type().index()] |= bb;
        self.by_color[pc.color().index()] |= bb;
        self.board[sq.index()] = pc;
    }

    fn remove_piece(&mut self, sq: Square) -> Piece {
        let pc = self.board[sq.index()];
        let bb = Bitboard::from_square(sq);
        self.by_type[pc.piece_type().index()] ^= bb;
        self.by_color[pc.color().index()] ^= bb;
        self.board[sq.index()] = Piece::NONE;
        pc
    }

    fn move_piece(&mut self, from: Square, to: Square) {
        let pc = self.board[from.index()];
        let bb = Bitboard::from_square(from) | Bitboard::from_square(to);
        self.by_type[pc.piece_type().index()] ^= bb;
        self.by_color[pc.color().index()] ^= bb;
        self.board[from.index()] = Piece::NONE;
        self.board[to.index()] = pc;
    }

    pub(crate) fn set_side_to_move(&mut self, color: Color) {
        self.side_to_move = color;
    }

    pub(crate) fn set_castling_rights(&mut self, rights: CastlingRights) {
        self.castling = rights;
    }

    pub(crate) fn set_ep_file(&mut self, file: Option<u8>) {
        self.ep_file = file;
    }

    pub(crate) fn set_counters(&mut self, halfmove_clock: u32, fullmove_number: u32) {
        self.halfmove_clock = halfmove_clock;
        self.fullmove_number = fullmove_number;
    }

    /// 組み立てた局面を検証してハッシュを確定する
    pub(crate) fn finish_setup(&mut self) -> Result<(), PositionError> {
        for color in [Color::White, Color::Black] {
            let kings = self.pieces_of(color, PieceType::King).count();
            if kings != 1 {
                return Err(PositionError::KingCount(color, kings));
            }
        }

        let back_ranks = Bitboard::RANK_1 | Bitboard::RANK_8;
        if let Some(sq) = (self.pieces(PieceType::Pawn) & back_ranks).lsb() {
            return Err(PositionError::PawnOnBackRank(sq));
        }

        for color in [Color::White, Color::Black] {
            let (king_sq, rook_k, rook_q) = castling_squares(color);
            let king_home = self.piece_on(king_sq) == Piece::new(color, PieceType::King);
            let rook = Piece::new(color, PieceType::Rook);
            let king_side = CastlingRights::king_side(color);
            let queen_side = CastlingRights::queen_side(color);
            if (self.castling.contains(king_side) && !(king_home && self.piece_on(rook_k) == rook))
                || (self.castling.contains(queen_side)
                    && !(king_home && self.piece_on(rook_q) == rook))
            {
                return Err(PositionError::CastlingMismatch(self.castling));
            }
        }

        if let Some(ep_sq) = self.ep_square() {
            // 直前に2歩前進したポーンが ep_sq の一つ先にいて、ep_sq とその手前が空いていること
            let them = !self.side_to_move;
            let pawn_sq = ep_sq.offset(them.pawn_push());
            let origin_sq = ep_sq.offset(-them.pawn_push());
            let valid = match (pawn_sq, origin_sq) {
                (Some(pawn_sq), Some(origin_sq)) => {
                    self.piece_on(pawn_sq) == Piece::new(them, PieceType::Pawn)
                        && self.piece_on(ep_sq).is_none()
                        && self.piece_on(origin_sq).is_none()
                }
                _ => false,
            };
            if !valid {
                return Err(PositionError::EnPassantMismatch(ep_sq));
            }
        }

        let them = !self.side_to_move;
        if self.is_attacked(self.king_square(them), self.side_to_move, self.occupied()) {
            return Err(PositionError::OpponentInCheck);
        }

        self.hash = self.compute_hash();
        Ok(())
    }

    // ===== 指し手の適用 =====

    /// 指し手を適用する（合法手であること）
    pub fn do_move(&mut self, mv: Move) -> UndoInfo {
        let us = self.side_to_move;
        let from = mv.from();
        let to = mv.to();
        let mut undo = UndoInfo {
            captured: Piece::NONE,
            castling: self.castling,
            ep_file: self.ep_file,
            halfmove_clock: self.halfmove_clock,
            hash: self.hash,
        };
        let mut hash = self.hash;

        if let Some(file) = self.ep_file.take() {
            hash ^= zobrist_en_passant(file);
        }
        self.halfmove_clock += 1;

        match mv.kind() {
            MoveKind::EnPassant => {
                let cap_sq = Square::from_u8_masked(to.raw() ^ 8);
                let captured = self.remove_piece(cap_sq);
                hash ^= zobrist_psq(captured, cap_sq);
                undo.captured = captured;
                let pc = self.board[from.index()];
                self.move_piece(from, to);
                hash ^= zobrist_psq(pc, from) ^ zobrist_psq(pc, to);
                self.halfmove_clock = 0;
            }
            MoveKind::CastleKing | MoveKind::CastleQueen => {
                let king = self.board[from.index()];
                self.move_piece(from, to);
                hash ^= zobrist_psq(king, from) ^ zobrist_psq(king, to);
                let (rook_from, rook_to) = castling_rook_squares(us, mv.kind());
                let rook = self.board[rook_from.index()];
                self.move_piece(rook_from, rook_to);
                hash ^= zobrist_psq(rook, rook_from) ^ zobrist_psq(rook, rook_to);
            }
            MoveKind::Normal | MoveKind::DoublePush | MoveKind::Promotion => {
                let captured = self.board[to.index()];
                if captured.is_some() {
                    self.remove_piece(to);
                    hash ^= zobrist_psq(captured, to);
                    undo.captured = captured;
                    self.halfmove_clock = 0;
                }
                let pc = self.remove_piece(from);
                hash ^= zobrist_psq(pc, from);
                let placed = match mv.promotion() {
                    Some(pt) => Piece::new(us, pt),
                    None => pc,
                };
                self.put_piece(placed, to);
                hash ^= zobrist_psq(placed, to);

                if mv.piece() == PieceType::Pawn {
                    self.halfmove_clock = 0;
                    if mv.kind() == MoveKind::DoublePush {
                        let file = from.file();
                        self.ep_file = Some(file);
                        hash ^= zobrist_en_passant(file);
                    }
                }
            }
        }

        let mut castling = self.castling;
        castling.retain(CastlingRights::mask_for(from));
        castling.retain(CastlingRights::mask_for(to));
        if castling != self.castling {
            hash ^= zobrist_castling(self.castling) ^ zobrist_castling(castling);
            self.castling = castling;
        }

        if us == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = !us;
        self.hash = hash ^ zobrist_side();
        undo
    }

    /// do_move を取り消す
    pub fn undo_move(&mut self, mv: Move, undo: UndoInfo) {
        let us = !self.side_to_move;
        self.side_to_move = us;
        if us == Color::Black {
            self.fullmove_number -= 1;
        }
        let from = mv.from();
        let to = mv.to();

        match mv.kind() {
            MoveKind::EnPassant => {
                self.move_piece(to, from);
                let cap_sq = Square::from_u8_masked(to.raw() ^ 8);
                self.put_piece(undo.captured, cap_sq);
            }
            MoveKind::CastleKing | MoveKind::CastleQueen => {
                let (rook_from, rook_to) = castling_rook_squares(us, mv.kind());
                self.move_piece(rook_to, rook_from);
                self.move_piece(to, from);
            }
            MoveKind::Normal | MoveKind::DoublePush | MoveKind::Promotion => {
                self.remove_piece(to);
                self.put_piece(Piece::new(us, mv.piece()), from);
                if undo.captured.is_some() {
                    self.put_piece(undo.captured, to);
                }
            }
        }

        self.castling = undo.castling;
        self.ep_file = undo.ep_file;
        self.halfmove_clock = undo.halfmove_clock;
        self.hash = undo.hash;
    }
}

/// キャスリングに関わる升（キング初期位置、キングサイドのルーク、クイーンサイドのルーク）
#[inline]
pub(crate) const fn castling_squares(color: Color) -> (Square, Square, Square) {
    match color {
        Color::White => (Square::E1, Square::H1, Square::A1),
        Color::Black => (Square::E8, Square::H8, Square::A8),
    }
}

/// キャスリング時のルークの移動元と移動先
#[inline]
pub(crate) const fn castling_rook_squares(color: Color, kind: MoveKind) -> (Square, Square) {
    match (color, kind) {
        (Color::White, MoveKind::CastleKing) => (Square::H1, Square::F1),
        (Color::White, _) => (Square::A1, Square::D1),
        (Color::Black, MoveKind::CastleKing) => (Square::H8, Square::F8),
        (Color::Black, _) => (Square::A8, Square::D8),
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::startpos()
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8u8).rev() {
            for file in 0..8u8 {
                let sq = Square::from_file_rank(file, rank).unwrap_or_default();
                write!(f, "{}", self.piece_on(sq).to_char())?;
            }
            writeln!(f)?;
        }
        write!(f, "{} hash={}", self.to_fen(), self.hash_hex())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fen())
    }
}
