//! 戰鬥事件
//!
//! 引擎只把狀態變化排入佇列，畫面層自行取出並播放動畫。

use crate::{
    character::Combatant,
    mission::Rewards,
    Hp, Power,
};
use grid_lib::{CellIndex, Color, MatchSize};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Player,
    Enemy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum AmountKind {
    Damage,
    Heal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Victory,
    Defeat,
}

/// 血條與屬性面板需要的快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsView {
    pub name: String,
    pub level: u32,
    pub hp: Hp,
    pub max_hp: Hp,
    pub attack: i32,
    pub defense: i32,
}

impl StatsView {
    pub fn of<C: Combatant + ?Sized>(combatant: &C) -> Self {
        Self {
            name: combatant.name().to_string(),
            level: combatant.level(),
            hp: combatant.hp(),
            max_hp: combatant.max_hp(),
            attack: combatant.attack(),
            defense: combatant.defense(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CombatEvent {
    MatchOccurred {
        color: Color,
        size: MatchSize,
    },
    PowerChanged {
        color: Color,
        power: Power,
    },
    StatsChanged {
        player: StatsView,
        enemy: StatsView,
    },
    TurnChanged {
        label: String,
        remaining: u32,
    },
    TimerChanged {
        remaining: u32,
    },
    DamageDealt {
        amount: Hp,
        target: Side,
        kind: AmountKind,
    },
    EnemyMoveProposed {
        from: CellIndex,
        to: CellIndex,
    },
    CombatEnded {
        outcome: Outcome,
        rewards: Option<Rewards>,
    },
    Notification {
        message: String,
        severity: Severity,
    },
    Swapped {
        from: CellIndex,
        to: CellIndex,
    },
}
