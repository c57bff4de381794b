// 棋盤錯誤型別；交換相關的錯誤皆為可恢復，只有 CascadeOverflow 代表內部不變式被破壞
use crate::*;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("棋盤大小 {size} 無效，至少需要 {min}")]
    InvalidSize { size: usize, min: usize },

    #[error("調色盤為空")]
    EmptyPalette,

    #[error("格子數量 {actual} 與棋盤 {size}x{size} 不符")]
    CellCountMismatch { size: usize, actual: usize },

    #[error("無法解析的符號 `{symbol}`")]
    UnknownSymbol { symbol: String },

    #[error("索引 {index} 超出棋盤範圍（共 {len} 格）")]
    OutOfBounds { index: CellIndex, len: usize },

    #[error("{from} 與 {to} 不相鄰")]
    NotAdjacent { from: CellIndex, to: CellIndex },

    #[error("棋盤已鎖定")]
    Locked,

    #[error("重新洗牌 {attempts} 次後仍存在三連")]
    GenerationFailed { attempts: usize },

    #[error("連鎖消除超過 {limit} 步")]
    CascadeOverflow { limit: usize },
}

impl GridError {
    /// 是否為玩家的無效操作（非內部錯誤）
    pub fn is_invalid_move(&self) -> bool {
        matches!(
            self,
            Self::OutOfBounds { .. } | Self::NotAdjacent { .. } | Self::Locked
        )
    }
}
