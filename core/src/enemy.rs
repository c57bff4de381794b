//! 敵人
//!
//! 敵人依等級從名單中隨機挑選並放大屬性；
//! AI 只是在棋盤上找第一個可行的交換，有冷卻時間。

use crate::{
    character::{CombatStats, Combatant},
    config::BaseStats,
    error::ConfigError,
    Exp,
};
use grid_lib::{find_first_move, Color, Move};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 敵人名單中的一筆
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    pub name: String,
    pub level: u32,
    pub stats: BaseStats,
}

/// 敵人的行動
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnemyAction {
    Attack { damage: f64 },
}

/// 擊敗敵人可得的經驗：`floor(10 * 1.2^(level-1))`
pub fn exp_value(level: u32) -> Exp {
    let exponent = level.saturating_sub(1) as i32;
    (10.0 * 1.2f64.powi(exponent)).floor() as Exp
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub name: String,
    pub stats: CombatStats,
    pub exp_value: Exp,
    pub pattern: Vec<EnemyAction>,
    cooldown: Duration,
    acting: bool,
}

impl Enemy {
    pub fn new(name: impl Into<String>, base: &BaseStats, level: u32, damage: f64) -> Self {
        Self {
            name: name.into(),
            stats: CombatStats::new(base, level),
            exp_value: exp_value(level),
            pattern: vec![EnemyAction::Attack { damage }],
            cooldown: Duration::ZERO,
            acting: false,
        }
    }

    /// 依等級放大最大 HP 與攻擊力
    pub fn from_template(template: &EnemyTemplate, level: u32, damage: f64) -> Self {
        let scale = level.max(1);
        let base = BaseStats {
            max_hp: template.stats.max_hp * scale as i32,
            base_attack: template.stats.base_attack * f64::from(scale),
            base_defense: template.stats.base_defense,
        };
        Self::new(template.name.clone(), &base, level, damage)
    }

    /// 從同等級的敵人中隨機挑一個
    pub fn for_level<R: Rng + ?Sized>(
        templates: &[EnemyTemplate],
        level: u32,
        damage: f64,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        let candidates: Vec<&EnemyTemplate> =
            templates.iter().filter(|t| t.level == level).collect();
        if candidates.is_empty() {
            return Err(ConfigError::NoEnemyForLevel(level));
        }
        let template = candidates[rng.random_range(0..candidates.len())];
        Ok(Self::from_template(template, level, damage))
    }

    /// HP 比例乘上攻擊力的粗略威脅值
    pub fn threat_level(&self) -> f64 {
        if self.stats.max_hp <= 0 {
            return 0.0;
        }
        f64::from(self.stats.hp) / f64::from(self.stats.max_hp) * (f64::from(self.attack()) / 10.0)
    }

    pub fn is_on_cooldown(&self) -> bool {
        !self.cooldown.is_zero()
    }

    /// 冷卻中或正在行動時不出手；找到走法後進入冷卻
    pub fn decide_move(&mut self, cells: &[Color], size: usize, cooldown: Duration) -> Option<Move> {
        if self.acting || self.is_on_cooldown() {
            return None;
        }
        let found = find_first_move(cells, size)?;
        self.cooldown = cooldown;
        Some(found)
    }

    pub fn tick(&mut self, dt: Duration) {
        self.cooldown = self.cooldown.saturating_sub(dt);
    }

    /// 從行動模式中隨機挑一個並標記為行動中
    pub fn begin_action<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<EnemyAction> {
        if self.pattern.is_empty() {
            return None;
        }
        self.acting = true;
        Some(self.pattern[rng.random_range(0..self.pattern.len())])
    }

    pub fn finish_action(&mut self) {
        self.acting = false;
    }
}

impl Combatant for Enemy {
    fn stats(&self) -> &CombatStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut CombatStats {
        &mut self.stats
    }

    fn name(&self) -> &str {
        &self.name
    }
}
