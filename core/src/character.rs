//! 角色系統
//!
//! 玩家與敵人共用的屬性、傷害公式與狀態效果

use crate::{config::BaseStats, Hp};
use serde::{Deserialize, Serialize};

/// 狀態效果作用的屬性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    Attack,
    Defense,
}

/// 暫時性的乘法修正
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatKind,
    pub multiplier: f64,
    /// 剩餘回合數
    pub duration: u32,
}

impl StatusEffect {
    /// 未指定（或為 0）的持續時間視為 1 回合
    pub fn new(kind: StatKind, multiplier: f64, duration: Option<u32>) -> Self {
        Self {
            kind,
            multiplier,
            duration: duration.filter(|d| *d > 0).unwrap_or(1),
        }
    }
}

/// 戰鬥數值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    pub max_hp: Hp,
    /// 0 <= hp <= max_hp
    pub hp: Hp,
    pub base_attack: f64,
    pub base_defense: f64,
    pub level: u32,
    pub status_effects: Vec<StatusEffect>,
}

impl CombatStats {
    pub fn new(base: &BaseStats, level: u32) -> Self {
        Self {
            max_hp: base.max_hp,
            hp: base.max_hp,
            base_attack: base.base_attack,
            base_defense: base.base_defense,
            level,
            status_effects: Vec::new(),
        }
    }

    /// 指定目前 HP（讀檔時使用，不會重設為滿血）
    pub fn with_hp(mut self, hp: Hp) -> Self {
        self.hp = hp.clamp(0, self.max_hp);
        self
    }

    /// 依插入順序把同類效果乘上基礎值，最後取整
    pub fn modified(&self, kind: StatKind) -> i32 {
        let base = match kind {
            StatKind::Attack => self.base_attack,
            StatKind::Defense => self.base_defense,
        };
        self.status_effects
            .iter()
            .filter(|effect| effect.kind == kind)
            .fold(base, |value, effect| value * effect.multiplier)
            .floor() as i32
    }

    /// 扣除已計算好的傷害，回傳實際扣除量
    pub fn lose_hp(&mut self, amount: Hp) -> Hp {
        let before = self.hp;
        self.hp = (self.hp - amount.max(0)).max(0);
        before - self.hp
    }
}

/// 玩家與敵人共用的能力
pub trait Combatant {
    fn stats(&self) -> &CombatStats;
    fn stats_mut(&mut self) -> &mut CombatStats;
    fn name(&self) -> &str;

    fn hp(&self) -> Hp {
        self.stats().hp
    }

    fn max_hp(&self) -> Hp {
        self.stats().max_hp
    }

    fn level(&self) -> u32 {
        self.stats().level
    }

    fn attack(&self) -> i32 {
        self.stats().modified(StatKind::Attack)
    }

    fn defense(&self) -> i32 {
        self.stats().modified(StatKind::Defense)
    }

    /// 承受傷害
    ///
    /// 防禦以 `100 / (100 + defense)` 的比例減傷，取整後至少 1 點。
    fn take_damage(&mut self, amount: f64) -> Hp {
        let defense = f64::from(self.defense());
        let actual = ((amount * (100.0 / (100.0 + defense))).floor() as Hp).max(1);
        let stats = self.stats_mut();
        stats.hp = (stats.hp - actual).max(0);
        actual
    }

    /// 治療，回傳實際回復量（不超過最大 HP）
    fn heal(&mut self, amount: Hp) -> Hp {
        let stats = self.stats_mut();
        let before = stats.hp;
        stats.hp = (stats.hp + amount.max(0)).min(stats.max_hp);
        stats.hp - before
    }

    fn is_dead(&self) -> bool {
        self.stats().hp <= 0
    }

    fn add_status_effect(&mut self, effect: StatusEffect) {
        self.stats_mut().status_effects.push(effect);
    }

    /// 所有效果剩餘回合減一，歸零者移除；每個敵方回合只呼叫一次
    fn update_status_effects(&mut self) {
        let effects = &mut self.stats_mut().status_effects;
        for effect in effects.iter_mut() {
            effect.duration = effect.duration.saturating_sub(1);
        }
        effects.retain(|effect| effect.duration > 0);
    }
}
