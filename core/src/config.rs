//! 戰鬥設定
//!
//! 所有遊戲數值集中在 `CombatConfig`，由呼叫端明確傳入戰鬥引擎。
//! 可從 TOML 載入；缺少的欄位使用預設值。

use crate::{
    enemy::EnemyTemplate,
    error::{ConfigError, Context, Result},
    mission::{BattleSpec, Mission, Rewards},
    skills::{PowerTable, SkillDef},
    Exp, Hp,
};
use grid_lib::{Color, MIN_MATCH};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fs, path::Path, time::Duration};
use strum::IntoEnumIterator;

/// 調色盤至少需要的顏色數
pub const MIN_PALETTE: usize = 3;

/// 基礎屬性
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    pub max_hp: Hp,
    pub base_attack: f64,
    pub base_defense: f64,
}

impl BaseStats {
    /// HP 必須為正，攻擊與防禦不可為負
    pub fn validate(&self, owner: &str) -> Result<(), ConfigError> {
        let invalid = |stat, value| ConfigError::InvalidStat {
            owner: owner.to_string(),
            stat,
            value,
        };
        if self.max_hp <= 0 {
            return Err(invalid("max_hp", f64::from(self.max_hp)));
        }
        if !(self.base_attack.is_finite() && self.base_attack >= 0.0) {
            return Err(invalid("base_attack", self.base_attack));
        }
        if !(self.base_defense.is_finite() && self.base_defense >= 0.0) {
            return Err(invalid("base_defense", self.base_defense));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub size: usize,
    pub colors: Vec<Color>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 7,
            colors: Color::iter().collect(),
        }
    }
}

/// 回合節奏與敵方傷害
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// 玩家回合的倒數次數
    pub turn_time: u32,
    pub tick_interval_ms: u64,
    pub enemy_turn_delay_ms: u64,
    pub player_turn_delay_ms: u64,
    pub ai_cooldown_ms: u64,
    /// 敵方攻擊的基礎傷害
    pub enemy_damage: f64,
    /// 勝利時每個敵人等級給的經驗
    pub victory_exp_per_level: Exp,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            turn_time: 15,
            tick_interval_ms: 1000,
            enemy_turn_delay_ms: 1500,
            player_turn_delay_ms: 1000,
            ai_cooldown_ms: 1000,
            enemy_damage: 10.0,
            victory_exp_per_level: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub grid: GridConfig,
    pub match_power: PowerTable,
    pub skills: Vec<SkillDef>,
    pub player: BaseStats,
    pub enemy: BaseStats,
    pub timing: TimingConfig,
    pub enemies: Vec<EnemyTemplate>,
    pub missions: Vec<Mission>,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            match_power: PowerTable::default(),
            skills: SkillDef::defaults(),
            player: BaseStats {
                max_hp: 100,
                base_attack: 10.0,
                base_defense: 5.0,
            },
            enemy: BaseStats {
                max_hp: 80,
                base_attack: 8.0,
                base_defense: 3.0,
            },
            timing: TimingConfig::default(),
            enemies: default_enemies(),
            missions: default_missions(),
        }
    }
}

fn default_enemies() -> Vec<EnemyTemplate> {
    let template = |name: &str, level, max_hp, base_attack, base_defense| EnemyTemplate {
        name: name.to_string(),
        level,
        stats: BaseStats {
            max_hp,
            base_attack,
            base_defense,
        },
    };
    vec![
        template("Slime", 1, 80, 8.0, 3.0),
        template("Goblin", 1, 70, 9.0, 2.0),
        template("Wolf", 2, 55, 7.0, 3.0),
        template("Bandit", 2, 60, 6.5, 4.0),
        template("Orc Warrior", 3, 50, 6.0, 6.0),
    ]
}

fn default_missions() -> Vec<Mission> {
    let battles = |levels: &[u32]| {
        levels
            .iter()
            .map(|&level| BattleSpec { level })
            .collect::<Vec<_>>()
    };
    vec![
        Mission {
            id: "forest_patrol".to_string(),
            name: "Forest Patrol".to_string(),
            battles: battles(&[1, 1, 2]),
            rewards: Rewards {
                exp: 50,
                coins: 30,
                item: None,
            },
        },
        Mission {
            id: "orc_camp".to_string(),
            name: "Orc Camp".to_string(),
            battles: battles(&[2, 3]),
            rewards: Rewards {
                exp: 120,
                coins: 80,
                item: Some("Iron Shield".to_string()),
            },
        },
    ]
}

impl CombatConfig {
    /// 從 TOML 字串解析並驗證
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 從指定路徑載入 TOML 檔案
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Self::from_toml_str(&content).context(format!("載入設定 {}", path.display()))
    }

    /// 轉換為 TOML 格式
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|err| ConfigError::Parse(err.to_string()).into())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid.size < MIN_MATCH {
            return Err(ConfigError::GridTooSmall(self.grid.size));
        }
        let palette: BTreeSet<Color> = self.grid.colors.iter().copied().collect();
        if palette.len() < MIN_PALETTE {
            return Err(ConfigError::PaletteTooSmall {
                min: MIN_PALETTE,
                actual: palette.len(),
            });
        }

        if palette.len() != self.grid.colors.len() {
            let mut seen = BTreeSet::new();
            if let Some(color) = self.grid.colors.iter().find(|color| !seen.insert(**color)) {
                return Err(ConfigError::DuplicatePaletteColor(*color));
            }
        }

        let mut bound = BTreeSet::new();
        for skill in &self.skills {
            if !skill.targeting_consistent() {
                return Err(ConfigError::SkillTargetMismatch {
                    skill: skill.id.clone(),
                    targeting: skill.targeting(),
                });
            }
            if !palette.contains(&skill.color) {
                return Err(ConfigError::SkillColorOutsidePalette {
                    skill: skill.id.clone(),
                    color: skill.color,
                });
            }
            if !bound.insert(skill.color) {
                return Err(ConfigError::DuplicateSkillColor(skill.color));
            }
        }

        self.player.validate("player")?;
        self.enemy.validate("enemy")?;
        for template in &self.enemies {
            template.stats.validate(&template.name)?;
        }

        if self.timing.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        if self.timing.turn_time == 0 {
            return Err(ConfigError::ZeroTurnTime);
        }
        if let Some(mission) = self.missions.iter().find(|m| m.battles.is_empty()) {
            return Err(ConfigError::EmptyMission(mission.id.clone()));
        }
        Ok(())
    }

    pub fn palette(&self) -> &[Color] {
        &self.grid.colors
    }

    pub fn skill_for(&self, color: Color) -> Option<&SkillDef> {
        self.skills.iter().find(|skill| skill.color == color)
    }

    pub fn skill_by_id(&self, id: &str) -> Option<&SkillDef> {
        self.skills.iter().find(|skill| skill.id == id)
    }

    pub fn mission(&self, id: &str) -> Result<&Mission, ConfigError> {
        self.missions
            .iter()
            .find(|mission| mission.id == id)
            .ok_or_else(|| ConfigError::MissionNotFound(id.to_string()))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.timing.tick_interval_ms)
    }

    pub fn enemy_turn_delay(&self) -> Duration {
        Duration::from_millis(self.timing.enemy_turn_delay_ms)
    }

    pub fn player_turn_delay(&self) -> Duration {
        Duration::from_millis(self.timing.player_turn_delay_ms)
    }

    pub fn ai_cooldown(&self) -> Duration {
        Duration::from_millis(self.timing.ai_cooldown_ms)
    }
}
