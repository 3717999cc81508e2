//! 合法手生成
//!
//! 王手駒とピンを先に求め、自玉を王手に晒す手を生成段階で除く。
//! 両王手ではキングの手のみ。アンパッサンは取った後の盤面で飛び駒の利きを確認する。

use super::MoveList;
use crate::bitboard::{
    Bitboard, between_bb, bishop_attacks, bishop_pseudo_attacks, king_attacks, knight_attacks,
    line_bb, pawn_attacks, queen_attacks, rook_attacks, rook_pseudo_attacks,
};
use crate::position::{Position, castling_rook_squares};
use crate::types::{CastlingRights, Color, Move, MoveKind, PieceType, Square};

/// 手番側の全合法手を list に生成する（list は先にクリアされる）
pub fn generate_moves(pos: &Position, list: &mut MoveList) {
    list.clear();
    let us = pos.side_to_move();
    let them = !us;
    let ksq = pos.king_square(us);
    let occupied = pos.occupied();
    let ours = pos.color_bb(us);
    let checkers = pos.checkers();

    // キングの手（玉を除いた盤面で利きを判定し、飛び駒の延長線上へ逃げる手を除く）
    let without_king = occupied ^ Bitboard::from_square(ksq);
    for to in king_attacks(ksq) & !ours {
        if !pos.is_attacked(to, them, without_king) {
            push_move(pos, list, ksq, to, PieceType::King, MoveKind::Normal);
        }
    }

    if checkers.more_than_one() {
        return;
    }

    let check_mask = match checkers.lsb() {
        Some(checker) => checkers | between_bb(ksq, checker),
        None => Bitboard::ALL,
    };
    let pinned = pinned_pieces(pos, us, ksq);
    let targets = !ours & check_mask;

    for from in pos.pieces_of(us, PieceType::Knight) & !pinned {
        for to in knight_attacks(from) & targets {
            push_move(pos, list, from, to, PieceType::Knight, MoveKind::Normal);
        }
    }

    for pt in [PieceType::Bishop, PieceType::Rook, PieceType::Queen] {
        for from in pos.pieces_of(us, pt) {
            let mut moves = slider_attacks(pt, from, occupied) & targets;
            if pinned.contains(from) {
                moves &= line_bb(ksq, from);
            }
            for to in moves {
                push_move(pos, list, from, to, pt, MoveKind::Normal);
            }
        }
    }

    generate_pawn_moves(pos, list, ksq, pinned, check_mask);

    if checkers.is_empty() {
        generate_castling(pos, list, ksq);
    }
}

/// 合法手のリストを返す
pub fn legal_moves(pos: &Position) -> MoveList {
    let mut list = MoveList::new();
    generate_moves(pos, &mut list);
    list
}

/// UCI 表記の指し手を合法手から探す
pub fn find_uci_move(pos: &Position, uci: &str) -> Option<Move> {
    legal_moves(pos).iter().copied().find(|mv| mv.to_uci() == uci)
}

impl Position {
    /// 手番側がアンパッサンを実際に指せるか
    pub fn has_legal_en_passant(&self) -> bool {
        let Some(ep) = self.ep_square() else {
            return false;
        };
        let us = self.side_to_move();
        let candidates = pawn_attacks(!us, ep) & self.pieces_of(us, PieceType::Pawn);
        candidates.iter().any(|from| en_passant_is_legal(self, from, ep))
    }
}

#[inline]
fn slider_attacks(pt: PieceType, from: Square, occupied: Bitboard) -> Bitboard {
    match pt {
        PieceType::Bishop => bishop_attacks(from, occupied),
        PieceType::Rook => rook_attacks(from, occupied),
        _ => queen_attacks(from, occupied),
    }
}

#[inline]
fn push_move(pos: &Position, list: &mut MoveList, from: Square, to: Square, pt: PieceType, kind: MoveKind) {
    let target = pos.piece_on(to);
    let captured = if target.is_some() { Some(target.piece_type()) } else { None };
    list.push(Move::new(from, to, pt, captured, None, kind));
}

/// 自玉にピンされている自駒
fn pinned_pieces(pos: &Position, us: Color, ksq: Square) -> Bitboard {
    let them = !us;
    let queens = pos.pieces_of(them, PieceType::Queen);
    let snipers = (rook_pseudo_attacks(ksq) & (pos.pieces_of(them, PieceType::Rook) | queens))
        | (bishop_pseudo_attacks(ksq) & (pos.pieces_of(them, PieceType::Bishop) | queens));
    let occupied = pos.occupied();
    let ours = pos.color_bb(us);

    let mut pinned = Bitboard::EMPTY;
    for sniper in snipers {
        let blockers = between_bb(ksq, sniper) & occupied;
        if blockers.is_not_empty() && !blockers.more_than_one() && (blockers & ours).is_not_empty() {
            pinned |= blockers;
        }
    }
    pinned
}

fn generate_pawn_moves(
    pos: &Position,
    list: &mut MoveList,
    ksq: Square,
    pinned: Bitboard,
    check_mask: Bitboard,
) {
    let us = pos.side_to_move();
    let push = us.pawn_push();
    let theirs = pos.color_bb(!us);
    let empty = !pos.occupied();
    let (double_rank, promotion_rank) = match us {
        Color::White => (Bitboard::RANK_3, 7),
        Color::Black => (Bitboard::RANK_6, 0),
    };
    let ep_square = pos.ep_square();

    for from in pos.pieces_of(us, PieceType::Pawn) {
        let allowed = if pinned.contains(from) {
            check_mask & line_bb(ksq, from)
        } else {
            check_mask
        };

        if let Some(to) = from.offset(push).filter(|&to| empty.contains(to)) {
            if allowed.contains(to) {
                push_pawn_move(list, from, to, None, promotion_rank);
            }
            if double_rank.contains(to) {
                if let Some(to2) = to.offset(push).filter(|&to2| empty.contains(to2)) {
                    if allowed.contains(to2) {
                        list.push(Move::new(
                            from,
                            to2,
                            PieceType::Pawn,
                            None,
                            None,
                            MoveKind::DoublePush,
                        ));
                    }
                }
            }
        }

        let attacks = pawn_attacks(us, from);
        for to in attacks & theirs & allowed {
            push_pawn_move(list, from, to, Some(pos.piece_on(to).piece_type()), promotion_rank);
        }

        if let Some(ep) = ep_square {
            if attacks.contains(ep) && en_passant_is_legal(pos, from, ep) {
                list.push(Move::new(
                    from,
                    ep,
                    PieceType::Pawn,
                    Some(PieceType::Pawn),
                    None,
                    MoveKind::EnPassant,
                ));
            }
        }
    }
}

#[inline]
fn push_pawn_move(
    list: &mut MoveList,
    from: Square,
    to: Square,
    captured: Option<PieceType>,
    promotion_rank: u8,
) {
    if to.rank() == promotion_rank {
        for pt in PieceType::PROMOTIONS {
            list.push(Move::new(from, to, PieceType::Pawn, captured, Some(pt), MoveKind::Promotion));
        }
    } else {
        list.push(Move::new(from, to, PieceType::Pawn, captured, None, MoveKind::Normal));
    }
}

/// アンパッサンの合法性（取った後に自玉が利かされていないか）
///
/// 王手中・ピン・横一列に並んだ2つのポーンの抜けをまとめて扱う。
fn en_passant_is_legal(pos: &Position, from: Square, ep: Square) -> bool {
    let us = pos.side_to_move();
    let ksq = pos.king_square(us);
    let captured = Bitboard::from_square(Square::from_u8_masked(ep.raw() ^ 8));
    let occupied = (pos.occupied() ^ Bitboard::from_square(from) ^ captured) | Bitboard::from_square(ep);
    let attackers = pos.attackers_to(ksq, occupied) & pos.color_bb(!us) & !captured;
    attackers.is_empty()
}

fn generate_castling(pos: &Position, list: &mut MoveList, ksq: Square) {
    let us = pos.side_to_move();
    let them = !us;
    let rights = pos.castling_rights();
    let occupied = pos.occupied();

    for kind in [MoveKind::CastleKing, MoveKind::CastleQueen] {
        let right = match kind {
            MoveKind::CastleKing => CastlingRights::king_side(us),
            _ => CastlingRights::queen_side(us),
        };
        if !rights.contains(right) {
            continue;
        }
        let (rook_from, _) = castling_rook_squares(us, kind);
        if (between_bb(ksq, rook_from) & occupied).is_not_empty() {
            continue;
        }
        let king_to = match kind {
            MoveKind::CastleKing => Square::from_u8_masked(ksq.raw() + 2),
            _ => Square::from_u8_masked(ksq.raw() - 2),
        };
        let path = between_bb(ksq, king_to) | Bitboard::from_square(king_to);
        if path.iter().any(|sq| pos.is_attacked(sq, them, occupied)) {
            continue;
        }
        list.push(Move::new(ksq, king_to, PieceType::King, None, None, kind));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::START_FEN;

    fn count(fen: &str) -> usize {
        legal_moves(&Position::from_fen(fen).unwrap()).len()
    }

    #[test]
    fn test_startpos_moves() {
        let list = legal_moves(&Position::from_fen(START_FEN).unwrap());
        assert_eq!(list.len(), 20);
        assert_eq!(list.iter().filter(|mv| mv.kind() == MoveKind::DoublePush).count(), 8);
    }

    #[test]
    fn test_kiwipete_moves() {
        assert_eq!(
            count("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"),
            48
        );
    }

    #[test]
    fn test_double_check_only_king_moves() {
        // e8 の黒キングに e1 のルークと d6 のナイトが王手
        let pos = Position::from_fen("4k3/8/3N4/8/8/8/8/K3R3 b - - 0 1").unwrap();
        assert!(pos.checkers().more_than_one());
        let list = legal_moves(&pos);
        assert!(list.iter().all(|mv| mv.piece() == PieceType::King));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_pinned_piece_stays_on_line() {
        // e2 のルークは e8 のルークにピンされている
        let pos = Position::from_fen("4r1k1/8/8/8/8/8/4R3/4K3 w - - 0 1").unwrap();
        let list = legal_moves(&pos);
        let rook_moves: Vec<_> = list.iter().filter(|mv| mv.piece() == PieceType::Rook).collect();
        assert_eq!(rook_moves.len(), 6);
        assert!(rook_moves.iter().all(|mv| mv.to().file() == 4));
    }

    #[test]
    fn test_en_passant_horizontal_pin() {
        // 取ると5段目の2つのポーンが消えて h5 のルークが a5 のキングに利く
        let pos = Position::from_fen("8/8/8/KPp4r/8/8/8/7k w - c6 0 1").unwrap();
        assert!(!pos.has_legal_en_passant());
        assert!(legal_moves(&pos).iter().all(|mv| !mv.is_en_passant()));
    }

    #[test]
    fn test_en_passant_captures_checker() {
        // e5 の黒ポーンが f4 のキングに王手、アンパッサンで取って解消できる
        let pos = Position::from_fen("8/8/8/3Pp3/5K2/8/8/7k w - e6 0 1").unwrap();
        assert!(pos.in_check());
        let ep = find_uci_move(&pos, "d5e6").unwrap();
        assert!(ep.is_en_passant());
    }

    #[test]
    fn test_castling_generation() {
        let pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let list = legal_moves(&pos);
        assert_eq!(list.iter().filter(|mv| mv.is_castle()).count(), 2);

        // f1 に利きがあるとキングサイドは不可
        let pos = Position::from_fen("r3kr2/8/8/8/8/8/8/R3K2R w KQq - 0 1").unwrap();
        let castles: Vec<_> = legal_moves(&pos).iter().filter(|mv| mv.is_castle()).copied().collect();
        assert_eq!(castles.len(), 1);
        assert_eq!(castles[0].kind(), MoveKind::CastleQueen);

        // b1 が利かされていてもクイーンサイドは可能
        let pos = Position::from_fen("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1").unwrap();
        assert!(find_uci_move(&pos, "e1c1").is_some());
    }

    #[test]
    fn test_promotions() {
        let pos = Position::from_fen("1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let list = legal_moves(&pos);
        let promos = list.iter().filter(|mv| mv.is_promotion()).count();
        // a8 への前進4種 + b8 のナイトを取る4種
        assert_eq!(promos, 8);
        assert!(find_uci_move(&pos, "a7b8q").unwrap().is_capture());
    }

    #[test]
    fn test_checkmate_has_no_moves() {
        // フールズメイト
        let pos = Position::from_fen(
            "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3",
        )
        .unwrap();
        assert!(pos.in_check());
        assert!(legal_moves(&pos).is_empty());
    }
}
