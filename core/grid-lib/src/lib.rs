//! 三消棋盤核心函式庫
//!
//! - 棋盤生成（避免初始三連）
//! - 相鄰交換與試探交換
//! - 三連偵測與連鎖消除
//! - 敵方 AI 的暴力搜尋走法
use serde::{Deserialize, Serialize};

mod ai;
mod color;
mod error;
mod grid;

pub use ai::*;
pub use color::*;
pub use error::*;
pub use grid::*;

pub type CellIndex = usize;
pub type MatchSize = usize;

/// 成立消除所需的最少連續數
pub const MIN_MATCH: MatchSize = 3;
/// 連鎖消除的步數上限，超過視為內部錯誤
pub const MAX_CASCADE_STEPS: usize = 50;
/// 生成棋盤時重新洗牌的次數上限
pub const MAX_GENERATION_ATTEMPTS: usize = 10_000;

/// 一次交換：`from` 與 `to` 為扁平化後的格子索引
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: CellIndex,
    pub to: CellIndex,
}
