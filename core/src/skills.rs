//! 技能系統
//!
//! 每種顏色綁定一個技能；消除累積的能量用來施放對應技能

use crate::{Power, SkillID};
use grid_lib::{Color, MatchSize};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// 防禦增益未指定持續回合時的預設值
pub const DEFAULT_BUFF_TURNS: u32 = 3;

/// 消除長度對應的能量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerTable {
    pub three: Power,
    pub four: Power,
    pub five_plus: Power,
}

impl Default for PowerTable {
    fn default() -> Self {
        Self {
            three: 25,
            four: 50,
            five_plus: 100,
        }
    }
}

impl PowerTable {
    /// 舊版戰鬥引擎使用的小數值表
    pub fn classic() -> Self {
        Self {
            three: 1,
            four: 5,
            five_plus: 15,
        }
    }

    pub fn power_for(&self, size: MatchSize) -> Power {
        match size {
            0..=2 => 0,
            3 => self.three,
            4 => self.four,
            _ => self.five_plus,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum SkillEffect {
    Damage,
    Heal,
    BuffDefense,
    DebuffAttack,
}

impl SkillEffect {
    pub fn targeting(&self) -> Targeting {
        match self {
            Self::Damage | Self::DebuffAttack => Targeting::Enemy,
            Self::Heal | Self::BuffDefense => Targeting::Caster,
        }
    }
}

/// 技能目標
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Targeting {
    Enemy,
    Caster,
}

/// 技能定義
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDef {
    pub color: Color,
    pub id: SkillID,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub power_required: Power,
    pub effect: SkillEffect,
    /// 傷害量、治療量或倍率，依 `effect` 解讀
    pub magnitude: f64,
    #[serde(default)]
    pub duration_turns: Option<u32>,
    /// 未指定時由效果推導
    #[serde(default)]
    pub targeting: Option<Targeting>,
}

impl SkillDef {
    pub fn targeting(&self) -> Targeting {
        self.targeting.unwrap_or_else(|| self.effect.targeting())
    }

    /// 明確指定的目標必須和效果一致
    pub fn targeting_consistent(&self) -> bool {
        self.targeting() == self.effect.targeting()
    }

    /// 預設技能表
    pub fn defaults() -> Vec<SkillDef> {
        vec![
            SkillDef {
                color: Color::Red,
                id: "fire_strike".to_string(),
                name: "Fire Strike".to_string(),
                description: "Deal 50 damage".to_string(),
                power_required: 100,
                effect: SkillEffect::Damage,
                magnitude: 50.0,
                duration_turns: None,
                targeting: None,
            },
            SkillDef {
                color: Color::Blue,
                id: "ice_shield".to_string(),
                name: "Ice Shield".to_string(),
                description: "Increase defense by 50% for 3 turns".to_string(),
                power_required: 75,
                effect: SkillEffect::BuffDefense,
                magnitude: 1.5,
                duration_turns: Some(DEFAULT_BUFF_TURNS),
                targeting: None,
            },
            SkillDef {
                color: Color::Green,
                id: "heal".to_string(),
                name: "Nature's Healing".to_string(),
                description: "Restore 30 HP".to_string(),
                power_required: 50,
                effect: SkillEffect::Heal,
                magnitude: 30.0,
                duration_turns: None,
                targeting: None,
            },
            SkillDef {
                color: Color::Yellow,
                id: "thunder".to_string(),
                name: "Thunder Bolt".to_string(),
                description: "Deal 40 damage".to_string(),
                power_required: 75,
                effect: SkillEffect::Damage,
                magnitude: 40.0,
                duration_turns: None,
                targeting: None,
            },
            SkillDef {
                color: Color::Purple,
                id: "curse".to_string(),
                name: "Dark Curse".to_string(),
                description: "Reduce enemy attack by 30%".to_string(),
                power_required: 100,
                effect: SkillEffect::DebuffAttack,
                magnitude: 0.7,
                duration_turns: None,
                targeting: None,
            },
        ]
    }
}

/// 進行中的增益，由戰鬥持有
///
/// 只記錄倍率；實際數值由戰鬥依所有生效中的倍率重新計算。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveBuff {
    pub active: bool,
    pub turns_left: u32,
    pub multiplier: f64,
}

impl ActiveBuff {
    pub fn activate(&mut self, multiplier: f64, turns: u32) {
        self.active = true;
        self.turns_left = turns;
        self.multiplier = multiplier;
    }

    /// 已啟用時只重設回合數
    pub fn refresh(&mut self, turns: u32) {
        self.turns_left = turns;
    }

    /// 經過一回合；這一回合到期時回傳 true
    pub fn tick(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.turns_left = self.turns_left.saturating_sub(1);
        if self.turns_left == 0 {
            self.revert()
        } else {
            false
        }
    }

    /// 立即結束增益；原本未啟用時回傳 false
    pub fn revert(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        self.turns_left = 0;
        true
    }

    /// 生效中的倍率，未啟用時為 1
    pub fn factor(&self) -> f64 {
        if self.active {
            self.multiplier
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_table() {
        let table = PowerTable::default();
        assert_eq!(table.power_for(2), 0);
        assert_eq!(table.power_for(3), 25);
        assert_eq!(table.power_for(4), 50);
        assert_eq!(table.power_for(5), 100);
        assert_eq!(table.power_for(7), 100);

        let classic = PowerTable::classic();
        assert_eq!(classic.power_for(3), 1);
        assert_eq!(classic.power_for(4), 5);
        assert_eq!(classic.power_for(6), 15);
    }

    #[test]
    fn test_targeting() {
        let skills = SkillDef::defaults();
        let by_id = |id: &str| skills.iter().find(|s| s.id == id).unwrap();
        assert_eq!(by_id("fire_strike").targeting(), Targeting::Enemy);
        assert_eq!(by_id("heal").targeting(), Targeting::Caster);
        assert_eq!(by_id("ice_shield").targeting(), Targeting::Caster);
        assert_eq!(by_id("curse").targeting(), Targeting::Enemy);

        let mut overridden = by_id("heal").clone();
        overridden.targeting = Some(Targeting::Caster);
        assert!(overridden.targeting_consistent());
        overridden.targeting = Some(Targeting::Enemy);
        assert!(!overridden.targeting_consistent());
    }

    #[test]
    fn test_buff_lifecycle() {
        let mut buff = ActiveBuff::default();
        assert!(!buff.tick());
        assert_eq!(buff.factor(), 1.0);

        buff.activate(1.5, 2);
        assert_eq!(buff.factor(), 1.5);
        assert!(!buff.tick());
        assert_eq!(buff.turns_left, 1);
        buff.refresh(3);
        assert!(!buff.tick());
        assert!(!buff.tick());
        assert!(buff.tick());
        assert!(!buff.active);
        assert_eq!(buff.factor(), 1.0);
        assert!(!buff.revert());
    }

    #[test]
    fn test_buff_revert() {
        let mut buff = ActiveBuff::default();
        buff.activate(2.0, 3);
        assert!(buff.revert());
        assert_eq!(buff.turns_left, 0);
        assert!(!buff.tick());
    }
}
