//! 存檔
//!
//! 玩家進度以 camelCase JSON 保存。讀檔保留當時的 HP，不會補滿。

use crate::{
    character::CombatStats,
    config::CombatConfig,
    error::{Result, SaveError},
    player::{next_level_exp, Player},
    Exp, Hp, Power,
};
use grid_lib::Color;
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecord {
    pub level: u32,
    pub experience: Exp,
    pub next_level_exp: Exp,
    pub max_hp: Hp,
    pub hp: Hp,
    pub base_attack: f64,
    pub base_defense: f64,
    #[serde(default)]
    pub skills: BTreeMap<Color, Power>,
    #[serde(default)]
    pub coins: u32,
    #[serde(default)]
    pub food: u32,
}

impl SaveRecord {
    pub fn from_player(player: &Player) -> Self {
        Self {
            level: player.stats.level,
            experience: player.experience,
            next_level_exp: player.next_level_exp,
            max_hp: player.stats.max_hp,
            hp: player.stats.hp,
            base_attack: player.stats.base_attack,
            base_defense: player.stats.base_defense,
            skills: player.skills.clone(),
            coins: player.coins,
            food: player.food,
        }
    }

    /// 還原玩家；調色盤中沒有存到的顏色能量為 0
    pub fn into_player(self, palette: &[Color]) -> Player {
        let level = self.level.max(1);
        let stats = CombatStats {
            max_hp: self.max_hp,
            hp: self.max_hp,
            base_attack: self.base_attack,
            base_defense: self.base_defense,
            level,
            status_effects: Vec::new(),
        }
        .with_hp(self.hp);
        let next_level_exp = if self.next_level_exp == 0 {
            next_level_exp(level)
        } else {
            self.next_level_exp
        };
        let mut player = Player {
            stats,
            experience: self.experience,
            next_level_exp,
            skills: self.skills,
            coins: self.coins,
            food: self.food,
        };
        player.ensure_skill_slots(palette);
        player
    }
}

/// 存檔後端
pub trait SaveStore {
    /// 沒有存檔時回傳 `Ok(None)`
    fn load(&self) -> Result<Option<SaveRecord>>;
    fn save(&mut self, record: &SaveRecord) -> Result<()>;
}

/// 磁碟上的 JSON 檔
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveStore for JsonFileStore {
    fn load(&self) -> Result<Option<SaveRecord>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|err| SaveError::Read {
            path: self.path.display().to_string(),
            reason: err.to_string(),
        })?;
        parse_record(&content).map(Some)
    }

    fn save(&mut self, record: &SaveRecord) -> Result<()> {
        let content = to_json(record)?;
        let write_error = |err: std::io::Error| SaveError::Write {
            path: self.path.display().to_string(),
            reason: err.to_string(),
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(&self.path, content).map_err(write_error)?;
        Ok(())
    }
}

/// 記憶體中的存檔，內容同樣經過 JSON 序列化
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接放入原始內容
    pub fn with_raw(content: impl Into<String>) -> Self {
        Self {
            data: Some(content.into()),
        }
    }

    pub fn raw(&self) -> Option<&str> {
        self.data.as_deref()
    }
}

impl SaveStore for MemoryStore {
    fn load(&self) -> Result<Option<SaveRecord>> {
        self.data.as_deref().map(parse_record).transpose()
    }

    fn save(&mut self, record: &SaveRecord) -> Result<()> {
        self.data = Some(to_json(record)?);
        Ok(())
    }
}

fn parse_record(content: &str) -> Result<SaveRecord> {
    serde_json::from_str(content).map_err(|err| {
        SaveError::Deserialize {
            format: "JSON".to_string(),
            reason: err.to_string(),
        }
        .into()
    })
}

fn to_json(record: &SaveRecord) -> Result<String> {
    serde_json::to_string_pretty(record).map_err(|err| {
        SaveError::Serialize {
            format: "JSON".to_string(),
            reason: err.to_string(),
        }
        .into()
    })
}

/// 讀取玩家；沒有存檔或存檔損毀時建立新角色
pub fn load_player(store: &dyn SaveStore, config: &CombatConfig) -> Player {
    match store.load() {
        Ok(Some(record)) => record.into_player(config.palette()),
        Ok(None) => Player::new(&config.player, config.palette()),
        Err(err) => {
            warn!("讀取存檔失敗，使用新角色: {err}");
            Player::new(&config.player, config.palette())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::Combatant;

    fn config() -> CombatConfig {
        CombatConfig::default()
    }

    #[test]
    fn test_camel_case_fields() {
        let player = Player::new(&config().player, config().palette());
        let json = serde_json::to_value(SaveRecord::from_player(&player)).unwrap();
        for key in ["level", "experience", "nextLevelExp", "maxHp", "hp", "baseAttack", "baseDefense", "skills", "coins", "food"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["skills"]["red"], 0);
    }

    #[test]
    fn test_missing_coins_and_food_default() {
        let store = MemoryStore::with_raw(
            r#"{"level":2,"experience":7,"nextLevelExp":150,"maxHp":110,"hp":42,
                "baseAttack":11.0,"baseDefense":5.0,"skills":{"red":3}}"#,
        );
        let player = load_player(&store, &config());
        assert_eq!(player.stats.level, 2);
        assert_eq!(player.hp(), 42);
        assert_eq!(player.coins, 0);
        assert_eq!(player.food, 0);
        assert_eq!(player.skill_power(Color::Red), 3);
        assert_eq!(player.skill_power(Color::Blue), 0);
    }

    #[test]
    fn test_memory_round_trip_keeps_hp() {
        let mut player = Player::new(&config().player, config().palette());
        player.stats.hp = 76;
        player.coins = 12;
        player.skills.insert(Color::Yellow, 40);

        let mut store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());
        store.save(&SaveRecord::from_player(&player)).unwrap();
        assert_eq!(load_player(&store, &config()), player);
    }

    #[test]
    fn test_corrupt_data_falls_back() {
        let store = MemoryStore::with_raw("{not json");
        assert!(store.load().is_err());
        let player = load_player(&store, &config());
        assert_eq!(player, Player::new(&config().player, config().palette()));
    }

    #[test]
    fn test_json_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("saves").join("player.json"));
        assert!(store.load().unwrap().is_none());

        let mut player = Player::new(&config().player, config().palette());
        player.gain_experience(120);
        player.stats.hp = 33;
        store.save(&SaveRecord::from_player(&player)).unwrap();

        let loaded = load_player(&store, &config());
        assert_eq!(loaded.hp(), 33);
        assert_eq!(loaded.stats.level, 2);
        assert_eq!(loaded, player);
    }
}
