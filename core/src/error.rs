//! 錯誤處理系統
//!
//! 頂層錯誤保留原始種類與 context 鏈；
//! 玩家操作失敗（`CombatError`）同時會轉成戰鬥通知。

use crate::{skills::Targeting, Power, SkillID};
use grid_lib::{Color, GridError};
use thiserror::Error as ThisError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// 頂層錯誤，包含原始錯誤和 context 鏈
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    contexts: Vec<String>,
}

/// 錯誤種類
#[derive(Debug, ThisError)]
pub enum ErrorKind {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error(transparent)]
    Combat(#[from] CombatError),
}

/// 設定錯誤
#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("無法讀取設定檔 {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("設定解析失敗: {0}")]
    Parse(String),
    #[error("棋盤大小 {0} 太小，至少需要 3")]
    GridTooSmall(usize),
    #[error("調色盤至少需要 {min} 種顏色，目前只有 {actual}")]
    PaletteTooSmall { min: usize, actual: usize },
    #[error("技能 {skill} 的顏色 {color} 不在調色盤內")]
    SkillColorOutsidePalette { skill: SkillID, color: Color },
    #[error("顏色 {0} 設定了多個技能")]
    DuplicateSkillColor(Color),
    #[error("調色盤重複列出顏色 {0}")]
    DuplicatePaletteColor(Color),
    #[error("技能 {skill} 的目標 {targeting} 與效果不符")]
    SkillTargetMismatch { skill: SkillID, targeting: Targeting },
    #[error("{owner} 的 {stat} 不合法: {value}")]
    InvalidStat {
        owner: String,
        stat: &'static str,
        value: f64,
    },
    #[error("計時間隔不可為 0")]
    ZeroTickInterval,
    #[error("回合時間不可為 0")]
    ZeroTurnTime,
    #[error("找不到等級 {0} 的敵人")]
    NoEnemyForLevel(u32),
    #[error("任務 {0} 沒有任何戰鬥")]
    EmptyMission(String),
    #[error("找不到任務: {0}")]
    MissionNotFound(String),
}

/// 存檔錯誤
#[derive(Debug, ThisError)]
pub enum SaveError {
    #[error("讀取存檔 {path} 失敗: {reason}")]
    Read { path: String, reason: String },
    #[error("寫入存檔 {path} 失敗: {reason}")]
    Write { path: String, reason: String },
    #[error("{format} 反序列化失敗: {reason}")]
    Deserialize { format: String, reason: String },
    #[error("{format} 序列化失敗: {reason}")]
    Serialize { format: String, reason: String },
}

/// 玩家操作被拒絕；訊息直接顯示給玩家
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum CombatError {
    #[error("Combat is not active")]
    Inactive,
    #[error("Wait for your turn")]
    NotPlayerTurn,
    #[error("No skill bound to {0}")]
    NoSkill(Color),
    #[error("Not enough power for {skill}")]
    InsufficientPower {
        skill: String,
        current: Power,
        required: Power,
    },
    #[error("{skill} cannot target that side")]
    InvalidTarget { skill: String },
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn contexts(&self) -> &[String] {
        &self.contexts
    }

    /// 添加錯誤上下文，自動記錄呼叫位置
    #[track_caller]
    pub fn context<C: Into<String>>(mut self, context: C) -> Self {
        let loc = std::panic::Location::caller();
        let msg = format!("{} [{}:{}]", context.into(), loc.file(), loc.line());
        self.contexts.push(msg);
        self
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        for ctx in &self.contexts {
            write!(f, "\n  {}", ctx)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl<E: Into<ErrorKind>> From<E> for Error {
    fn from(error: E) -> Self {
        Self {
            kind: error.into(),
            contexts: Vec::new(),
        }
    }
}

/// Result 擴展 trait，用於添加錯誤上下文
pub trait Context<T> {
    fn context<C: Into<String>>(self, context: C) -> Result<T>;
}

impl<T> Context<T> for Result<T> {
    #[track_caller]
    fn context<C: Into<String>>(self, context: C) -> Result<T> {
        let loc = std::panic::Location::caller();
        self.map_err(|e| {
            let msg = format!("{} [{}:{}]", context.into(), loc.file(), loc.line());
            let mut e = e;
            e.contexts.push(msg);
            e
        })
    }
}
