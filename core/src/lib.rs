//! 三消回合制戰鬥核心函式庫
//!
//! 此函式庫實作三消棋盤上的回合制戰鬥規則，包括：
//! - 角色屬性、傷害公式與狀態效果
//! - 消除累積能量與技能施放
//! - 玩家／敵方回合狀態機（邏輯時鐘排程）
//! - 敵方 AI
//! - 存檔與任務進度
//!
//! 畫面層透過 `CombatEngine::drain_events` 取得事件，自行決定如何呈現。

pub mod character;
pub mod combat;
pub mod config;
pub mod enemy;
pub mod error;
pub mod events;
pub mod mission;
pub mod player;
pub mod save;
pub mod schedule;
pub mod skills;

// 重新導出常用類型
pub use character::{CombatStats, Combatant, StatKind, StatusEffect};
pub use combat::{CombatEngine, SwapResult, TurnState};
pub use config::{BaseStats, CombatConfig};
pub use enemy::{Enemy, EnemyAction, EnemyTemplate};
pub use error::{CombatError, ConfigError, Context, Error, ErrorKind, Result, SaveError};
pub use events::{AmountKind, CombatEvent, Outcome, Severity, Side, StatsView};
pub use mission::{BattleSpec, Mission, MissionProgress, MissionStep, Rewards};
pub use player::Player;
pub use save::{load_player, JsonFileStore, MemoryStore, SaveRecord, SaveStore};
pub use skills::{ActiveBuff, PowerTable, SkillDef, SkillEffect, Targeting};

pub use grid_lib::{Color, Grid, GridError, Move};

pub type Hp = i32;
pub type Power = u32;
pub type Exp = u32;
pub type SkillID = String;
