//! 統計付き perft

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::MAX_DEPTH;
use crate::movegen::{MoveList, generate_moves};
use crate::position::{Position, castling_rook_squares};
use crate::tt::HashTable;
use crate::types::Move;

/// 統計値の数（タスクIDとチェックサムを除く）
pub const SUMMARY_FIELDS: usize = 13;

/// 重み付き合算で統計値が u64 を超えた
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("statistic overflow while combining weighted results")]
pub struct SummaryOverflow;

/// 末端の指し手の分類集計
///
/// 王手の4分類は互いに排他。詰みになる手は詰みの分類にのみ数える。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Summary {
    pub nodes: u64,
    pub captures: u64,
    pub enpassants: u64,
    pub castles: u64,
    pub promotions: u64,
    /// 動かした駒のみが王手
    pub direct_checks: u64,
    /// 動かした駒以外の1駒が王手（開き王手）
    pub single_discovered_checks: u64,
    /// 動かした駒と開いた駒の両王手
    pub direct_discovered_checks: u64,
    /// 動かした駒以外の2駒による両王手
    pub double_discovered_checks: u64,
    pub direct_mates: u64,
    pub single_discovered_mates: u64,
    pub direct_discovered_mates: u64,
    pub double_discovered_mates: u64,
}

impl Summary {
    /// 加算
    ///
    /// 探索中の部分木の合算に使う。1回の探索で数える値は u64 に収まるものとして検査しない
    /// （開始局面の perft(13) でも約 2e18）。
    pub fn add(&mut self, other: &Summary) {
        let mut values = self.to_array();
        for (v, o) in values.iter_mut().zip(other.to_array()) {
            *v += o;
        }
        *self = Summary::from_array(values);
    }

    /// other を factor 倍して加算
    ///
    /// 出現回数による重み付け用。いずれかの値が u64 を超える場合はエラーで、self は変わらない。
    pub fn add_scaled(&mut self, other: &Summary, factor: u64) -> Result<(), SummaryOverflow> {
        let mut values = self.to_array();
        for (v, o) in values.iter_mut().zip(other.to_array()) {
            *v = o
                .checked_mul(factor)
                .and_then(|scaled| v.checked_add(scaled))
                .ok_or(SummaryOverflow)?;
        }
        *self = Summary::from_array(values);
        Ok(())
    }

    /// 王手（詰みを除く）の合計
    pub fn total_checks(&self) -> u64 {
        self.direct_checks
            + self.single_discovered_checks
            + self.direct_discovered_checks
            + self.double_discovered_checks
    }

    /// 詰みの合計
    pub fn total_mates(&self) -> u64 {
        self.direct_mates
            + self.single_discovered_mates
            + self.direct_discovered_mates
            + self.double_discovered_mates
    }

    /// 統計ベクトル順の配列に変換
    pub fn to_array(&self) -> [u64; SUMMARY_FIELDS] {
        [
            self.nodes,
            self.captures,
            self.enpassants,
            self.castles,
            self.promotions,
            self.direct_checks,
            self.single_discovered_checks,
            self.direct_discovered_checks,
            self.double_discovered_checks,
            self.direct_mates,
            self.single_discovered_mates,
            self.direct_discovered_mates,
            self.double_discovered_mates,
        ]
    }

    /// 統計ベクトル順の配列から復元
    pub fn from_array(values: [u64; SUMMARY_FIELDS]) -> Summary {
        let [
            nodes,
            captures,
            enpassants,
            castles,
            promotions,
            direct_checks,
            single_discovered_checks,
            direct_discovered_checks,
            double_discovered_checks,
            direct_mates,
            single_discovered_mates,
            direct_discovered_mates,
            double_discovered_mates,
        ] = values;
        Summary {
            nodes,
            captures,
            enpassants,
            castles,
            promotions,
            direct_checks,
            single_discovered_checks,
            direct_discovered_checks,
            double_discovered_checks,
            direct_mates,
            single_discovered_mates,
            direct_discovered_mates,
            double_discovered_mates,
        }
    }
}

impl std::ops::AddAssign for Summary {
    fn add_assign(&mut self, rhs: Summary) {
        self.add(&rhs);
    }
}

/// 統計付き perft
pub struct StatsPerft {
    table: HashTable<Summary>,
}

impl StatsPerft {
    /// 置換表サイズ（MB）を指定して作成
    pub fn new(hash_mb: usize) -> Self {
        Self {
            table: HashTable::new(hash_mb),
        }
    }

    /// 置換表をクリア
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// depth 手目に指された全ての手を分類して集計
    ///
    /// depth 0 は局面そのものを1ノードとして返す。
    pub fn perft(&mut self, pos: &mut Position, depth: u32) -> Summary {
        debug_assert!(depth <= MAX_DEPTH);
        if depth == 0 {
            return Summary {
                nodes: 1,
                ..Summary::default()
            };
        }
        if depth >= 2 {
            if let Some(summary) = self.table.probe(pos, depth) {
                return summary;
            }
        }

        let mut list = MoveList::new();
        generate_moves(pos, &mut list);
        let mut summary = Summary::default();

        if depth == 1 {
            let mut replies = MoveList::new();
            for &mv in &list {
                classify(pos, mv, &mut replies, &mut summary);
            }
            return summary;
        }

        for &mv in &list {
            let undo = pos.do_move(mv);
            summary.add(&self.perft(pos, depth - 1));
            pos.undo_move(mv, undo);
        }
        self.table.store(pos, depth, summary);
        summary
    }
}

/// 1手を指して分類する（replies は詰み判定用の作業バッファ）
fn classify(pos: &mut Position, mv: Move, replies: &mut MoveList, summary: &mut Summary) {
    summary.nodes += 1;
    if mv.is_capture() {
        summary.captures += 1;
    }
    if mv.is_en_passant() {
        summary.enpassants += 1;
    }
    if mv.is_castle() {
        summary.castles += 1;
    }
    if mv.is_promotion() {
        summary.promotions += 1;
    }

    // キャスリングでは王手をかけうるのはルーク
    let moved_to = if mv.is_castle() {
        castling_rook_squares(pos.side_to_move(), mv.kind()).1
    } else {
        mv.to()
    };

    let undo = pos.do_move(mv);
    let checkers = pos.checkers();
    if checkers.is_not_empty() {
        let direct = checkers.contains(moved_to);
        let double = checkers.more_than_one();
        generate_moves(pos, replies);
        let mate = replies.is_empty();
        let slot = match (double, direct, mate) {
            (false, true, false) => &mut summary.direct_checks,
            (false, false, false) => &mut summary.single_discovered_checks,
            (true, true, false) => &mut summary.direct_discovered_checks,
            (true, false, false) => &mut summary.double_discovered_checks,
            (false, true, true) => &mut summary.direct_mates,
            (false, false, true) => &mut summary.single_discovered_mates,
            (true, true, true) => &mut summary.direct_discovered_mates,
            (true, false, true) => &mut summary.double_discovered_mates,
        };
        *slot += 1;
    }
    pos.undo_move(mv, undo);
}

#[cfg(test)]
mod tests {
    use super::*;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    #[test]
    fn test_stats_startpos_depth3() {
        let mut engine = StatsPerft::new(16);
        let mut pos = Position::startpos();
        let s = engine.perft(&mut pos, 3);
        assert_eq!(s.nodes, 8902);
        assert_eq!(s.captures, 34);
        assert_eq!(s.enpassants, 0);
        assert_eq!(s.castles, 0);
        assert_eq!(s.promotions, 0);
        assert_eq!(s.total_checks(), 12);
        assert_eq!(s.total_mates(), 0);
    }

    #[test]
    fn test_stats_kiwipete_depth2() {
        let mut engine = StatsPerft::new(16);
        let mut pos = Position::from_fen(KIWIPETE).unwrap();
        let s = engine.perft(&mut pos, 2);
        assert_eq!(s.nodes, 2039);
        assert_eq!(s.captures, 351);
        assert_eq!(s.enpassants, 1);
        assert_eq!(s.castles, 91);
        assert_eq!(s.promotions, 0);
        assert_eq!(s.total_checks(), 3);
        assert_eq!(s.total_mates(), 0);
    }

    #[test]
    fn test_stats_depth_zero_and_one() {
        let mut engine = StatsPerft::new(1);
        let mut pos = Position::startpos();
        assert_eq!(engine.perft(&mut pos, 0).nodes, 1);
        let s = engine.perft(&mut pos, 1);
        assert_eq!(s.nodes, 20);
        assert_eq!(s.captures, 0);
    }

    #[test]
    fn test_stats_mate_categories() {
        // Qh5xf7# 相当: 動かした駒による詰みのみ
        let mut pos = Position::from_fen(
            "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4",
        )
        .unwrap();
        let mut engine = StatsPerft::new(1);
        let s = engine.perft(&mut pos, 1);
        assert_eq!(s.direct_mates, 1);
        assert_eq!(s.total_mates(), 1);
    }

    #[test]
    fn test_stats_discovered_check() {
        // e4 のナイトが動くと e1 のルークが e8 のキングに開き王手
        let mut pos = Position::from_fen("4k3/8/8/8/4N3/8/8/K3R3 w - - 0 1").unwrap();
        let mut engine = StatsPerft::new(1);
        let s = engine.perft(&mut pos, 1);
        // ナイトの8手は全て開き王手、うち d6 と f6 は直接の王手も兼ねる
        assert_eq!(s.single_discovered_checks + s.single_discovered_mates, 6);
        assert_eq!(s.direct_discovered_checks + s.direct_discovered_mates, 2);
    }

    #[test]
    fn test_stats_discovered_check_fields() {
        let mut pos = Position::from_fen("4k3/8/8/8/4N3/8/8/K3R3 w - - 0 1").unwrap();
        let s = StatsPerft::new(1).perft(&mut pos, 1);
        // ナイト8手、ルーク8手、キング3手。詰みはない
        assert_eq!(
            s,
            Summary {
                nodes: 19,
                single_discovered_checks: 6,
                direct_discovered_checks: 2,
                ..Summary::default()
            }
        );
        assert_eq!(s.total_checks(), 8);
    }

    #[test]
    fn test_stats_double_discovered_check() {
        // exd6 e.p. で e5 と d5 のポーンが同時に消え、e8 のルークと a8 のビショップが両王手になる
        let mut pos = Position::from_fen("B3R3/8/8/3pP3/4k3/8/8/7K w - d6 0 1").unwrap();
        let s = StatsPerft::new(1).perft(&mut pos, 1);
        // ルーク8手、ビショップ3手（Bxd5 は直接の王手）、ポーン2手、キング3手。
        // どちらの王手もキングが逃げられるので詰みではない
        assert_eq!(
            s,
            Summary {
                nodes: 16,
                captures: 2,
                enpassants: 1,
                direct_checks: 1,
                double_discovered_checks: 1,
                ..Summary::default()
            }
        );
        assert_eq!(s.total_checks(), 2);
        assert_eq!(s.total_mates(), 0);
    }

    #[test]
    fn test_summary_add_scaled_and_arrays() {
        let mut a = Summary {
            nodes: 10,
            captures: 2,
            direct_checks: 1,
            ..Summary::default()
        };
        let b = Summary {
            nodes: 5,
            double_discovered_mates: 1,
            ..Summary::default()
        };
        a.add_scaled(&b, 3).unwrap();
        assert_eq!(a.nodes, 25);
        assert_eq!(a.double_discovered_mates, 3);
        assert_eq!(a.total_mates(), 3);
        assert_eq!(Summary::from_array(a.to_array()), a);

        let mut c = Summary::default();
        c += b;
        assert_eq!(c, b);
    }

    #[test]
    fn test_summary_add_scaled_overflow_leaves_value() {
        let big = Summary {
            nodes: u64::MAX / 2 + 1,
            captures: 1,
            ..Summary::default()
        };
        let mut total = Summary {
            captures: 7,
            ..Summary::default()
        };
        // 乗算のオーバーフロー
        assert_eq!(total.add_scaled(&big, 2), Err(SummaryOverflow));
        assert_eq!(total.captures, 7);
        assert_eq!(total.nodes, 0);

        // 加算のオーバーフロー
        total.add_scaled(&big, 1).unwrap();
        assert_eq!(total.add_scaled(&big, 1), Err(SummaryOverflow));
        assert_eq!(total.nodes, u64::MAX / 2 + 1);
        assert_eq!(total.captures, 8);
    }
}
