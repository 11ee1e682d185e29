//! Position features for the linear evaluation function.
//!
//! A [`Feature`] is one named signal extracted from a position, always measured from the
//! point of view of one side (the *friendly* side; the other side is the *enemy*). Every
//! feature produces an integer raw value, and its [`FeatureSignal`] says whether more of the
//! signal is good (`Positive`) or bad (`Negative`) for the friendly side. The contribution of
//! a feature to the final score is `sign × raw × weight`.
//!
//! # Flag features
//!
//! Boolean conditions (check, checkmate, castling rights, en passant, material majority) are
//! encoded as `+1` when the condition holds and `-1` when it does not. A flag therefore always
//! contributes its full weight with one sign or the other and never contributes zero.
//!
//! | feature kind | raw value |
//! |---|---|
//! | material counts | number of pieces of one type and color |
//! | `we_have_more` | `+1` if the friendly side has more pieces, else `-1` |
//! | `friendly_protected_pieces` | friendly pieces defended by another friendly piece |
//! | check / checkmate flags | `+1` if that side is to move and in check (mated), else `-1` |
//! | king proximity | sum of king-step distances from one side's pieces to the other king |
//! | center control | pieces on d4, d5, e4, e5 |
//! | threatening unprotected | attacked pieces that have no defender |
//! | pawn promotion distance | sum of ranks left for every pawn to promote |
//! | `can_castle` / `can_en_passant` | flags as above |
//! | `num_legal_moves` | legal moves of the side to move |

use std::{fmt, str::FromStr};

use evochess_engine::{BitBoard, Color, Piece, Position, Square, square_distance};
use serde::{Deserialize, Serialize};

const CENTER_SQUARES: [Square; 4] = [Square::D4, Square::D5, Square::E4, Square::E5];

const MATERIAL: [Piece; 6] = [
    Piece::Pawn,
    Piece::Knight,
    Piece::Bishop,
    Piece::Rook,
    Piece::Queen,
    Piece::King,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSignal {
    Positive,
    Negative,
}

impl FeatureSignal {
    #[must_use]
    pub fn sign(self) -> f32 {
        match self {
            FeatureSignal::Positive => 1.0,
            FeatureSignal::Negative => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
    FriendlyPawnCount,
    FriendlyKnightCount,
    FriendlyBishopCount,
    FriendlyRookCount,
    FriendlyQueenCount,
    FriendlyKingCount,
    EnemyPawnCount,
    EnemyKnightCount,
    EnemyBishopCount,
    EnemyRookCount,
    EnemyQueenCount,
    EnemyKingCount,
    WeHaveMore,
    FriendlyProtectedPieces,
    FriendlyInCheck,
    EnemyInCheck,
    FriendlyInCheckmate,
    EnemyInCheckmate,
    EnemyProximityToFriendlyKing,
    FriendlyProximityToEnemyKing,
    FriendlyCenterControl,
    EnemyCenterControl,
    FriendlyThreateningUnprotected,
    EnemyThreateningUnprotected,
    FriendlyPawnPromotionDistance,
    EnemyPawnPromotionDistance,
    CanCastle,
    CanEnPassant,
    NumLegalMoves,
}

impl Feature {
    pub const COUNT: usize = 29;

    pub const ALL: [Feature; Self::COUNT] = [
        Feature::FriendlyPawnCount,
        Feature::FriendlyKnightCount,
        Feature::FriendlyBishopCount,
        Feature::FriendlyRookCount,
        Feature::FriendlyQueenCount,
        Feature::FriendlyKingCount,
        Feature::EnemyPawnCount,
        Feature::EnemyKnightCount,
        Feature::EnemyBishopCount,
        Feature::EnemyRookCount,
        Feature::EnemyQueenCount,
        Feature::EnemyKingCount,
        Feature::WeHaveMore,
        Feature::FriendlyProtectedPieces,
        Feature::FriendlyInCheck,
        Feature::EnemyInCheck,
        Feature::FriendlyInCheckmate,
        Feature::EnemyInCheckmate,
        Feature::EnemyProximityToFriendlyKing,
        Feature::FriendlyProximityToEnemyKing,
        Feature::FriendlyCenterControl,
        Feature::EnemyCenterControl,
        Feature::FriendlyThreateningUnprotected,
        Feature::EnemyThreateningUnprotected,
        Feature::FriendlyPawnPromotionDistance,
        Feature::EnemyPawnPromotionDistance,
        Feature::CanCastle,
        Feature::CanEnPassant,
        Feature::NumLegalMoves,
    ];

    /// Position of this feature in [`Feature::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Feature::FriendlyPawnCount => "friendly_pawn_count",
            Feature::FriendlyKnightCount => "friendly_knight_count",
            Feature::FriendlyBishopCount => "friendly_bishop_count",
            Feature::FriendlyRookCount => "friendly_rook_count",
            Feature::FriendlyQueenCount => "friendly_queen_count",
            Feature::FriendlyKingCount => "friendly_king_count",
            Feature::EnemyPawnCount => "enemy_pawn_count",
            Feature::EnemyKnightCount => "enemy_knight_count",
            Feature::EnemyBishopCount => "enemy_bishop_count",
            Feature::EnemyRookCount => "enemy_rook_count",
            Feature::EnemyQueenCount => "enemy_queen_count",
            Feature::EnemyKingCount => "enemy_king_count",
            Feature::WeHaveMore => "we_have_more",
            Feature::FriendlyProtectedPieces => "friendly_protected_pieces",
            Feature::FriendlyInCheck => "friendly_in_check",
            Feature::EnemyInCheck => "enemy_in_check",
            Feature::FriendlyInCheckmate => "friendly_in_checkmate",
            Feature::EnemyInCheckmate => "enemy_in_checkmate",
            Feature::EnemyProximityToFriendlyKing => "enemy_proximity_to_friendly_king",
            Feature::FriendlyProximityToEnemyKing => "friendly_proximity_to_enemy_king",
            Feature::FriendlyCenterControl => "friendly_center_control",
            Feature::EnemyCenterControl => "enemy_center_control",
            Feature::FriendlyThreateningUnprotected => "friendly_threatening_unprotected",
            Feature::EnemyThreateningUnprotected => "enemy_threatening_unprotected",
            Feature::FriendlyPawnPromotionDistance => "friendly_pawn_promotion_distance",
            Feature::EnemyPawnPromotionDistance => "enemy_pawn_promotion_distance",
            Feature::CanCastle => "can_castle",
            Feature::CanEnPassant => "can_en_passant",
            Feature::NumLegalMoves => "num_legal_moves",
        }
    }

    #[must_use]
    pub fn signal(self) -> FeatureSignal {
        use FeatureSignal::{Negative, Positive};
        match self {
            Feature::FriendlyPawnCount
            | Feature::FriendlyKnightCount
            | Feature::FriendlyBishopCount
            | Feature::FriendlyRookCount
            | Feature::FriendlyQueenCount
            | Feature::FriendlyKingCount
            | Feature::WeHaveMore
            | Feature::FriendlyProtectedPieces
            | Feature::EnemyInCheck
            | Feature::EnemyInCheckmate
            | Feature::EnemyProximityToFriendlyKing
            | Feature::FriendlyCenterControl
            | Feature::FriendlyThreateningUnprotected
            | Feature::EnemyPawnPromotionDistance
            | Feature::NumLegalMoves => Positive,
            Feature::EnemyPawnCount
            | Feature::EnemyKnightCount
            | Feature::EnemyBishopCount
            | Feature::EnemyRookCount
            | Feature::EnemyQueenCount
            | Feature::EnemyKingCount
            | Feature::FriendlyInCheck
            | Feature::FriendlyInCheckmate
            | Feature::FriendlyProximityToEnemyKing
            | Feature::EnemyCenterControl
            | Feature::EnemyThreateningUnprotected
            | Feature::FriendlyPawnPromotionDistance
            | Feature::CanCastle
            | Feature::CanEnPassant => Negative,
        }
    }

    /// Returns `true` for features whose raw value is always `+1` or `-1`.
    #[must_use]
    pub fn is_flag(self) -> bool {
        matches!(
            self,
            Feature::WeHaveMore
                | Feature::FriendlyInCheck
                | Feature::EnemyInCheck
                | Feature::FriendlyInCheckmate
                | Feature::EnemyInCheckmate
                | Feature::CanCastle
                | Feature::CanEnPassant
        )
    }

    /// Extracts the raw value of this feature.
    #[must_use]
    pub fn extract_raw(self, analysis: &PositionAnalysis<'_>) -> i32 {
        let (friendly, enemy) = (analysis.friendly, analysis.enemy);
        match self {
            Feature::FriendlyPawnCount => analysis.material(friendly, Piece::Pawn),
            Feature::FriendlyKnightCount => analysis.material(friendly, Piece::Knight),
            Feature::FriendlyBishopCount => analysis.material(friendly, Piece::Bishop),
            Feature::FriendlyRookCount => analysis.material(friendly, Piece::Rook),
            Feature::FriendlyQueenCount => analysis.material(friendly, Piece::Queen),
            Feature::FriendlyKingCount => analysis.material(friendly, Piece::King),
            Feature::EnemyPawnCount => analysis.material(enemy, Piece::Pawn),
            Feature::EnemyKnightCount => analysis.material(enemy, Piece::Knight),
            Feature::EnemyBishopCount => analysis.material(enemy, Piece::Bishop),
            Feature::EnemyRookCount => analysis.material(enemy, Piece::Rook),
            Feature::EnemyQueenCount => analysis.material(enemy, Piece::Queen),
            Feature::EnemyKingCount => analysis.material(enemy, Piece::King),
            Feature::WeHaveMore => {
                flag(analysis.total_material(friendly) > analysis.total_material(enemy))
            }
            Feature::FriendlyProtectedPieces => analysis.protected_pieces(friendly),
            Feature::FriendlyInCheck => flag(analysis.in_check(friendly)),
            Feature::EnemyInCheck => flag(analysis.in_check(enemy)),
            Feature::FriendlyInCheckmate => flag(analysis.in_checkmate(friendly)),
            Feature::EnemyInCheckmate => flag(analysis.in_checkmate(enemy)),
            Feature::EnemyProximityToFriendlyKing => analysis.king_proximity(enemy, friendly),
            Feature::FriendlyProximityToEnemyKing => analysis.king_proximity(friendly, enemy),
            Feature::FriendlyCenterControl => analysis.center_control(friendly),
            Feature::EnemyCenterControl => analysis.center_control(enemy),
            Feature::FriendlyThreateningUnprotected => {
                analysis.unprotected_under_attack(enemy)
            }
            Feature::EnemyThreateningUnprotected => analysis.unprotected_under_attack(friendly),
            Feature::FriendlyPawnPromotionDistance => analysis.promotion_distance(friendly),
            Feature::EnemyPawnPromotionDistance => analysis.promotion_distance(enemy),
            Feature::CanCastle => flag(analysis.position.has_castling_rights(friendly)),
            Feature::CanEnPassant => flag(analysis.position.has_legal_en_passant()),
            Feature::NumLegalMoves => count(analysis.position.legal_move_count()),
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("unknown feature id '{id}'")]
pub struct UnknownFeatureError {
    pub id: String,
}

impl FromStr for Feature {
    type Err = UnknownFeatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|f| f.id() == s)
            .ok_or_else(|| UnknownFeatureError { id: s.to_owned() })
    }
}

fn flag(condition: bool) -> i32 {
    if condition { 1 } else { -1 }
}

fn count(n: impl TryInto<i32>) -> i32 {
    n.try_into().unwrap_or(i32::MAX)
}

/// A position viewed from one side.
#[derive(Debug, Clone, Copy)]
pub struct PositionAnalysis<'a> {
    position: &'a Position,
    friendly: Color,
    enemy: Color,
}

impl<'a> PositionAnalysis<'a> {
    #[must_use]
    pub fn new(position: &'a Position, perspective: Color) -> Self {
        Self {
            position,
            friendly: perspective,
            enemy: !perspective,
        }
    }

    fn material(&self, color: Color, piece: Piece) -> i32 {
        count(self.position.pieces(piece, color).popcnt())
    }

    fn total_material(&self, color: Color) -> i32 {
        MATERIAL.iter().map(|p| self.material(color, *p)).sum()
    }

    fn in_check(&self, color: Color) -> bool {
        self.position.side_to_move() == color && self.position.is_check()
    }

    fn in_checkmate(&self, color: Color) -> bool {
        self.position.side_to_move() == color && self.position.is_checkmate()
    }

    fn protected_pieces(&self, color: Color) -> i32 {
        let pieces = self.position.occupied_by(color);
        count(
            pieces
                .filter(|sq| popcnt(self.position.attackers(color, *sq)) > 0)
                .count(),
        )
    }

    /// Sum of distances from every piece of `color` to the king of `king_color`.
    fn king_proximity(&self, color: Color, king_color: Color) -> i32 {
        let king = self.position.king_square(king_color);
        let total: u32 = self
            .position
            .occupied_by(color)
            .map(|sq| square_distance(sq, king))
            .sum();
        count(total)
    }

    fn center_control(&self, color: Color) -> i32 {
        count(
            CENTER_SQUARES
                .iter()
                .filter(|sq| self.position.color_on(**sq) == Some(color))
                .count(),
        )
    }

    /// Pieces of `color` attacked by the other side and defended by nobody.
    fn unprotected_under_attack(&self, color: Color) -> i32 {
        count(
            self.position
                .occupied_by(color)
                .filter(|sq| {
                    popcnt(self.position.attackers(!color, *sq)) > 0
                        && popcnt(self.position.attackers(color, *sq)) == 0
                })
                .count(),
        )
    }

    /// Sum over pawns of `color` of the ranks left before promotion.
    fn promotion_distance(&self, color: Color) -> i32 {
        let total: usize = self
            .position
            .pieces(Piece::Pawn, color)
            .map(|sq| {
                let rank = sq.get_rank().to_index();
                match color {
                    Color::White => 7 - rank,
                    Color::Black => rank,
                }
            })
            .sum();
        count(total)
    }
}

fn popcnt(bitboard: BitBoard) -> u32 {
    bitboard.popcnt()
}
