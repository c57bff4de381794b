//! 技能施放與增益／減益

mod test_helpers;

use match_combat::{
    load_player, AmountKind, Color, CombatError, CombatEvent, Combatant, JsonFileStore, Outcome,
    Rewards, Severity, Side, SkillEffect, TurnState,
};
use test_helpers::*;

#[test]
fn test_fire_strike_damages_enemy_and_ends_turn() {
    let mut engine = started(player_with_hp(100), default_enemy());
    engine.handle_match(Color::Red, 5);
    assert_eq!(engine.player().skill_power(Color::Red), 100);
    engine.drain_events();

    engine.use_skill(Color::Red).unwrap();
    // 防禦 3 => floor(50 * 100 / 103) = 48
    assert_eq!(engine.enemy().hp(), 32);
    assert_eq!(engine.player().skill_power(Color::Red), 0);
    assert_eq!(engine.state(), TurnState::EnemyTurn);
    assert!(!engine.grid().is_enabled());

    let events = engine.drain_events();
    assert!(events.contains(&CombatEvent::PowerChanged {
        color: Color::Red,
        power: 0
    }));
    assert!(events.contains(&CombatEvent::DamageDealt {
        amount: 48,
        target: Side::Enemy,
        kind: AmountKind::Damage,
    }));
    assert!(notifications(&events).contains(&"Fire Strike used!".to_string()));
}

#[test]
fn test_insufficient_power_changes_nothing() {
    let mut engine = started(player_with_hp(100), default_enemy());
    engine.handle_match(Color::Red, 3);
    engine.drain_events();

    let err = engine.use_skill(Color::Red).unwrap_err();
    assert_eq!(
        err,
        CombatError::InsufficientPower {
            skill: "Fire Strike".to_string(),
            current: 25,
            required: 100,
        }
    );
    assert_eq!(
        engine.drain_events(),
        vec![CombatEvent::Notification {
            message: "Not enough power for Fire Strike".to_string(),
            severity: Severity::Warning,
        }]
    );
    assert_eq!(engine.player().skill_power(Color::Red), 25);
    assert_eq!(engine.enemy().hp(), 80);
    assert!(engine.is_player_turn());
    assert!(engine.grid().is_enabled());
}

#[test]
fn test_skill_outside_player_turn() {
    let mut engine = engine_with(config(), player_with_hp(100), default_enemy());
    engine.drain_events();
    assert_eq!(engine.use_skill(Color::Green), Err(CombatError::Inactive));
    assert!(engine.drain_events().is_empty());

    engine.start_combat();
    engine.handle_match(Color::Green, 5);
    engine.end_player_turn();
    engine.drain_events();
    assert_eq!(engine.use_skill(Color::Green), Err(CombatError::NotPlayerTurn));
    assert_eq!(
        notifications(&engine.drain_events()),
        vec!["Wait for your turn".to_string()]
    );
    assert_eq!(engine.player().skill_power(Color::Green), 100);
}

#[test]
fn test_unbound_color() {
    let mut config = config();
    config.skills.retain(|skill| skill.color != Color::Yellow);
    let mut engine = engine_with(config, player_with_hp(100), default_enemy());
    engine.start_combat();
    engine.handle_match(Color::Yellow, 5);
    assert_eq!(
        engine.use_skill(Color::Yellow),
        Err(CombatError::NoSkill(Color::Yellow))
    );
    assert!(engine.is_player_turn());
}

#[test]
fn test_heal_and_invalid_target() {
    let mut engine = started(player_with_hp(50), default_enemy());
    engine.handle_match(Color::Green, 4);

    let err = engine.use_skill_on(Color::Green, Side::Enemy).unwrap_err();
    assert_eq!(
        err,
        CombatError::InvalidTarget {
            skill: "Nature's Healing".to_string()
        }
    );
    assert_eq!(engine.player().skill_power(Color::Green), 50);
    assert_eq!(engine.player().hp(), 50);
    engine.drain_events();

    engine.use_skill(Color::Green).unwrap();
    assert_eq!(engine.player().hp(), 80);
    assert!(engine.drain_events().contains(&CombatEvent::DamageDealt {
        amount: 30,
        target: Side::Player,
        kind: AmountKind::Heal,
    }));
}

/// 推進一整輪：敵方回合 → 玩家回合 → 玩家結束回合
fn next_round(engine: &mut match_combat::CombatEngine) {
    engine.advance(ms(1500));
    engine.advance(ms(1000));
    engine.end_player_turn();
}

#[test]
fn test_ice_shield_lasts_three_enemy_turns() {
    let mut engine = started(player_with_hp(100), default_enemy());
    engine.handle_match(Color::Blue, 4);
    engine.handle_match(Color::Blue, 3);
    engine.drain_events();

    engine.use_skill(Color::Blue).unwrap();
    assert_eq!(engine.player().stats.base_defense, 7.5);
    assert_eq!(engine.player().defense(), 7);
    assert!(notifications(&engine.drain_events())
        .contains(&"Defense increased for 3 turns!".to_string()));
    assert_eq!(engine.active_buff("ice_shield").unwrap().turns_left, 3);

    next_round(&mut engine);
    assert_eq!(engine.active_buff("ice_shield").unwrap().turns_left, 2);
    next_round(&mut engine);
    assert_eq!(engine.active_buff("ice_shield").unwrap().turns_left, 1);
    engine.drain_events();

    engine.advance(ms(1500));
    assert!(engine.active_buff("ice_shield").is_none());
    assert_eq!(engine.player().stats.base_defense, 5.0);
    assert!(notifications(&engine.drain_events()).contains(&"Ice Shield wore off!".to_string()));
}

#[test]
fn test_ice_shield_refresh() {
    let mut engine = started(player_with_hp(100), default_enemy());
    engine.handle_match(Color::Blue, 5);
    engine.use_skill(Color::Blue).unwrap();
    engine.advance(ms(1500));
    engine.advance(ms(1000));
    assert_eq!(engine.active_buff("ice_shield").unwrap().turns_left, 2);

    engine.handle_match(Color::Blue, 5);
    engine.drain_events();
    engine.use_skill(Color::Blue).unwrap();
    assert_eq!(engine.player().stats.base_defense, 7.5);
    assert_eq!(engine.active_buff("ice_shield").unwrap().turns_left, 3);
    assert!(notifications(&engine.drain_events())
        .contains(&"Ice Shield duration refreshed!".to_string()));
}

#[test]
fn test_buff_reverted_when_combat_ends() {
    let mut engine = started(player_with_hp(100), default_enemy());
    engine.handle_match(Color::Blue, 5);
    engine.use_skill(Color::Blue).unwrap();
    engine.abort();
    assert_eq!(engine.player().stats.base_defense, 5.0);
    assert!(engine.active_buff("ice_shield").is_none());
}

/// 把黃色技能換成第二個防禦增益（x2，5 回合）
fn stone_skin_config() -> match_combat::CombatConfig {
    let mut config = config();
    for skill in config.skills.iter_mut() {
        if skill.color == Color::Yellow {
            skill.id = "stone_skin".to_string();
            skill.name = "Stone Skin".to_string();
            skill.power_required = 25;
            skill.effect = SkillEffect::BuffDefense;
            skill.magnitude = 2.0;
            skill.duration_turns = Some(5);
        }
    }
    config
}

#[test]
fn test_overlapping_defense_buffs_restore_base() {
    let mut engine = engine_with(stone_skin_config(), player_with_hp(100), default_enemy());
    engine.start_combat();
    engine.handle_match(Color::Blue, 5);
    engine.use_skill(Color::Blue).unwrap();
    assert_eq!(engine.player().stats.base_defense, 7.5);

    engine.advance(ms(1500));
    engine.advance(ms(1000));
    engine.handle_match(Color::Yellow, 3);
    engine.use_skill(Color::Yellow).unwrap();
    assert_eq!(engine.player().stats.base_defense, 15.0);
    assert_eq!(engine.active_buff("ice_shield").unwrap().turns_left, 2);
    assert_eq!(engine.active_buff("stone_skin").unwrap().turns_left, 5);

    // 冰盾先結束，只剩石膚的倍率
    next_round(&mut engine);
    next_round(&mut engine);
    assert!(engine.active_buff("ice_shield").is_none());
    assert_eq!(engine.active_buff("stone_skin").unwrap().turns_left, 3);
    assert_eq!(engine.player().stats.base_defense, 10.0);

    next_round(&mut engine);
    next_round(&mut engine);
    assert_eq!(engine.active_buff("stone_skin").unwrap().turns_left, 1);
    engine.advance(ms(1500));
    assert!(engine.active_buff("stone_skin").is_none());
    assert_eq!(engine.player().stats.base_defense, 5.0);
}

#[test]
fn test_overlapping_defense_buffs_reverted_on_abort() {
    let mut engine = engine_with(stone_skin_config(), player_with_hp(100), default_enemy());
    engine.start_combat();
    engine.handle_match(Color::Blue, 5);
    engine.use_skill(Color::Blue).unwrap();
    engine.advance(ms(1500));
    engine.advance(ms(1000));
    engine.handle_match(Color::Yellow, 3);
    engine.use_skill(Color::Yellow).unwrap();
    assert_eq!(engine.player().stats.base_defense, 15.0);

    engine.abort();
    assert_eq!(engine.player().stats.base_defense, 5.0);
    assert!(engine.active_buff("ice_shield").is_none());
    assert!(engine.active_buff("stone_skin").is_none());
}

#[test]
fn test_curse_is_permanent_by_default() {
    let mut engine = started(player_with_hp(100), default_enemy());
    engine.handle_match(Color::Purple, 5);
    engine.use_skill(Color::Purple).unwrap();
    assert_eq!(engine.enemy().attack(), 5);
    assert!(notifications(&engine.drain_events()).contains(&"Enemy attack reduced!".to_string()));

    next_round(&mut engine);
    next_round(&mut engine);
    assert_eq!(engine.enemy().attack(), 5);
}

#[test]
fn test_timed_curse_expires() {
    let mut config = config();
    for skill in config.skills.iter_mut() {
        if skill.id == "curse" {
            skill.duration_turns = Some(2);
        }
    }
    let mut engine = engine_with(config, player_with_hp(100), default_enemy());
    engine.start_combat();
    engine.handle_match(Color::Purple, 5);
    engine.use_skill(Color::Purple).unwrap();
    assert_eq!(engine.enemy().stats.base_attack, 8.0);
    assert_eq!(engine.enemy().attack(), 5);

    // 第一個敵方回合：剩 1 回合，攻擊 5 => floor(5 * 100 / 105) = 4
    engine.advance(ms(1500));
    assert_eq!(engine.enemy().attack(), 5);
    assert_eq!(engine.player().hp(), 96);

    engine.advance(ms(1000));
    engine.end_player_turn();
    engine.advance(ms(1500));
    assert_eq!(engine.enemy().attack(), 8);
    assert_eq!(engine.player().hp(), 89);
}

#[test]
fn test_lethal_skill_wins_immediately() {
    let mut engine = started(player_with_hp(100), enemy(10, 8.0, 3.0));
    engine.handle_match(Color::Red, 5);
    engine.drain_events();

    engine.use_skill(Color::Red).unwrap();
    assert_eq!(engine.state(), TurnState::Ended(Outcome::Victory));
    assert_eq!(engine.enemy().hp(), 0);
    assert_eq!(engine.player().experience, 2);

    let events = engine.drain_events();
    assert!(events.contains(&CombatEvent::CombatEnded {
        outcome: Outcome::Victory,
        rewards: Some(Rewards::exp(2)),
    }));
    assert!(!events.iter().any(|event| matches!(
        event,
        CombatEvent::TurnChanged { label, .. } if label == "Enemy's Turn"
    )));

    engine.advance(ms(10_000));
    assert!(engine.drain_events().is_empty());
}

#[test]
fn test_mission_reward_override_and_persist() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("player.json");

    let mut engine = engine_with(config(), player_with_hp(60), enemy(10, 8.0, 3.0))
        .with_store(Box::new(JsonFileStore::new(&path)));
    engine.set_reward(Some(Rewards {
        exp: 120,
        coins: 30,
        item: Some("Iron Shield".to_string()),
    }));
    engine.start_combat();
    engine.handle_match(Color::Yellow, 5);
    engine.use_skill(Color::Yellow).unwrap();
    assert_eq!(engine.state(), TurnState::Ended(Outcome::Victory));

    let player = engine.player();
    assert_eq!(player.stats.level, 2);
    assert_eq!(player.experience, 20);
    assert_eq!(player.coins, 30);
    // 升級時補滿
    assert_eq!(player.hp(), 110);

    let loaded = load_player(&JsonFileStore::new(&path), &config());
    assert_eq!(&loaded, engine.player());
}
