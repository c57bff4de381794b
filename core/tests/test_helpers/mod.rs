//! 整合測試共用的建構函式
#![allow(dead_code)]

use match_combat::{BaseStats, CombatConfig, CombatEngine, CombatEvent, Enemy, Grid, Player};
use rand::{rngs::StdRng, SeedableRng};
use std::time::Duration;

pub const SEED: u64 = 42;

/// 沒有三連，交換 2 <-> 5 會讓第 0 列成為 R R R
pub const SWAP_BOARD: &str = r#"
R R B
G B R
B G G
"#;

pub fn config() -> CombatConfig {
    CombatConfig::default()
}

pub fn player_with_hp(hp: i32) -> Player {
    let config = config();
    let mut player = Player::new(&config.player, config.palette());
    player.stats.hp = hp;
    player
}

pub fn enemy(max_hp: i32, base_attack: f64, base_defense: f64) -> Enemy {
    Enemy::new(
        "Dummy",
        &BaseStats {
            max_hp,
            base_attack,
            base_defense,
        },
        1,
        config().timing.enemy_damage,
    )
}

pub fn default_enemy() -> Enemy {
    let config = config();
    Enemy::new("Slime", &config.enemy, 1, config.timing.enemy_damage)
}

pub fn engine_with(config: CombatConfig, player: Player, enemy: Enemy) -> CombatEngine {
    let grid = Grid::from_ascii(SWAP_BOARD).unwrap();
    CombatEngine::with_grid(config, player, enemy, grid, StdRng::seed_from_u64(SEED)).unwrap()
}

/// 已開始戰鬥、事件佇列已清空的引擎
pub fn started(player: Player, enemy: Enemy) -> CombatEngine {
    let mut engine = engine_with(config(), player, enemy);
    engine.start_combat();
    engine.drain_events();
    engine
}

pub fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

pub fn notifications(events: &[CombatEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            CombatEvent::Notification { message, .. } => Some(message.clone()),
            _ => None,
        })
        .collect()
}

pub fn damage_events(events: &[CombatEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, CombatEvent::DamageDealt { .. }))
        .count()
}
