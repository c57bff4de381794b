//! 任務系統
//!
//! 一個任務由數場依序進行的戰鬥組成，只有打完最後一場才發放任務獎勵。
//! 中途落敗會讓進度歸零。

use crate::Exp;
use serde::{Deserialize, Serialize};

/// 戰鬥獎勵
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rewards {
    pub exp: Exp,
    pub coins: u32,
    pub item: Option<String>,
}

impl Rewards {
    pub fn exp(exp: Exp) -> Self {
        Self {
            exp,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSpec {
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    pub name: String,
    pub battles: Vec<BattleSpec>,
    #[serde(default)]
    pub rewards: Rewards,
}

/// 一場戰鬥勝利後的下一步
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissionStep {
    NextBattle { level: u32 },
    Complete { rewards: Rewards },
}

/// 任務進度；`current_battle` 從 0 起算
///
/// 保存完整的戰鬥列表與獎勵，讀回後不需要原本的 `Mission`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionProgress {
    pub mission_id: String,
    pub current_battle: usize,
    pub total_battles: usize,
    battles: Vec<BattleSpec>,
    rewards: Rewards,
}

impl MissionProgress {
    pub fn start(mission: &Mission) -> Self {
        Self {
            mission_id: mission.id.clone(),
            current_battle: 0,
            total_battles: mission.battles.len(),
            battles: mission.battles.clone(),
            rewards: mission.rewards.clone(),
        }
    }

    /// 目前這場戰鬥的敵人等級
    pub fn current_level(&self) -> Option<u32> {
        self.battles.get(self.current_battle).map(|battle| battle.level)
    }

    /// 例如 "Battle 2 of 3"
    pub fn label(&self) -> String {
        format!(
            "Battle {} of {}",
            self.current_battle + 1,
            self.total_battles
        )
    }

    pub fn is_last_battle(&self) -> bool {
        self.current_battle + 1 >= self.total_battles
    }

    /// 本場勝利時交給戰鬥引擎的獎勵；中間場次沒有經驗
    pub fn battle_reward(&self) -> Rewards {
        if self.is_last_battle() {
            self.rewards.clone()
        } else {
            Rewards::default()
        }
    }

    pub fn record_victory(&mut self) -> MissionStep {
        if self.is_last_battle() {
            log::info!("任務 {} 完成", self.mission_id);
            self.current_battle = self.total_battles;
            return MissionStep::Complete {
                rewards: self.rewards.clone(),
            };
        }
        self.current_battle += 1;
        match self.current_level() {
            Some(level) => MissionStep::NextBattle { level },
            None => MissionStep::Complete {
                rewards: self.rewards.clone(),
            },
        }
    }

    pub fn record_defeat(&mut self) {
        log::info!("任務 {} 失敗，進度重置", self.mission_id);
        self.current_battle = 0;
    }
}
