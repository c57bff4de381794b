//! 玩家角色
//!
//! 經驗與升級、各顏色的技能能量、金幣與食物

use crate::{
    character::{CombatStats, Combatant},
    config::BaseStats,
    skills::PowerTable,
    Exp, Power,
};
use grid_lib::{Color, MatchSize};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 每次升級的屬性成長倍率
pub const GROWTH_FACTOR: f64 = 1.1;

/// 升到下一級所需經驗：`floor(100 * 1.5^(level-1))`
pub fn next_level_exp(level: u32) -> Exp {
    let exponent = level.saturating_sub(1) as i32;
    (100.0 * 1.5f64.powi(exponent)).floor() as Exp
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub stats: CombatStats,
    pub experience: Exp,
    pub next_level_exp: Exp,
    pub skills: BTreeMap<Color, Power>,
    pub coins: u32,
    pub food: u32,
}

impl Player {
    pub fn new(base: &BaseStats, palette: &[Color]) -> Self {
        let mut player = Self {
            stats: CombatStats::new(base, 1),
            experience: 0,
            next_level_exp: next_level_exp(1),
            skills: BTreeMap::new(),
            coins: 0,
            food: 0,
        };
        player.ensure_skill_slots(palette);
        player
    }

    /// 補上調色盤中缺少的能量欄位
    pub fn ensure_skill_slots(&mut self, palette: &[Color]) {
        for &color in palette {
            self.skills.entry(color).or_insert(0);
        }
    }

    /// 獲得經驗，足夠時連續升級；回傳獲得量
    pub fn gain_experience(&mut self, amount: Exp) -> Exp {
        self.experience += amount;
        while self.experience >= self.next_level_exp {
            self.level_up();
        }
        amount
    }

    fn level_up(&mut self) {
        self.experience -= self.next_level_exp;
        self.stats.level += 1;
        self.next_level_exp = next_level_exp(self.stats.level);

        let stats = &mut self.stats;
        stats.max_hp = (f64::from(stats.max_hp) * GROWTH_FACTOR).floor() as i32;
        stats.base_attack = (stats.base_attack * GROWTH_FACTOR).floor();
        stats.base_defense = (stats.base_defense * GROWTH_FACTOR).floor();
        stats.hp = stats.max_hp;
        log::info!("升級到 {} 級，最大 HP {}", stats.level, stats.max_hp);
    }

    /// 扣除經驗（最低 0），回傳要求扣除的量
    pub fn lose_experience(&mut self, amount: Exp) -> Exp {
        self.experience = self.experience.saturating_sub(amount);
        amount
    }

    /// 目前等級的經驗百分比
    pub fn exp_progress(&self) -> f64 {
        if self.next_level_exp == 0 {
            return 0.0;
        }
        f64::from(self.experience) / f64::from(self.next_level_exp) * 100.0
    }

    /// 花費 1 點經驗回滿 HP；HP 已滿或經驗不足時不做任何事
    pub fn heal_to_full(&mut self) -> bool {
        if self.stats.hp >= self.stats.max_hp || self.experience < 1 {
            return false;
        }
        self.stats.hp = self.stats.max_hp;
        self.experience -= 1;
        true
    }

    pub fn add_skill_power(&mut self, color: Color, size: MatchSize, table: &PowerTable) -> Power {
        let power = self.skills.entry(color).or_insert(0);
        *power += table.power_for(size);
        *power
    }

    pub fn skill_power(&self, color: Color) -> Power {
        self.skills.get(&color).copied().unwrap_or(0)
    }

    pub fn reset_skill_power(&mut self, color: Color) {
        self.skills.insert(color, 0);
    }
}

impl Combatant for Player {
    fn stats(&self) -> &CombatStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut CombatStats {
        &mut self.stats
    }

    fn name(&self) -> &str {
        "Player"
    }
}
