//! 無畫面的自動對戰
//!
//! 玩家方由簡單策略操作：能量足夠就施放技能，否則走第一個可行的交換。
//! 事件以文字或 JSON 行輸出，方便調整數值。

#![allow(clippy::print_stdout)]

use anyhow::{bail, Context as _};
use clap::Parser;
use grid_lib::find_first_move;
use match_combat::{
    load_player, CombatConfig, CombatEngine, CombatEvent, Enemy, JsonFileStore, MemoryStore,
    MissionProgress, MissionStep, Outcome, Player, PowerTable, Rewards, SaveStore, SwapResult,
    TurnState,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{path::PathBuf, time::Duration};

/// 單場戰鬥最多推進的步數
const MAX_STEPS: usize = 10_000;

#[derive(Parser, Debug)]
#[command(name = "autoplay")]
#[command(about = "Run match-3 combats without a UI", long_about = None)]
struct Args {
    /// TOML config file (default: built-in data)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Random seed (default: random)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Save file to load from and write back to
    #[arg(long)]
    save: Option<PathBuf>,

    /// Play every battle of this mission
    #[arg(short, long)]
    mission: Option<String>,

    /// Enemy level for a single battle
    #[arg(short, long, default_value = "1")]
    level: u32,

    /// Use the small 1/5/15 power table
    #[arg(long)]
    classic_power: bool,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => CombatConfig::load(path)?,
        None => CombatConfig::default(),
    };
    if args.classic_power {
        config.match_power = PowerTable::classic();
    }
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut player = match &args.save {
        Some(path) => load_player(&JsonFileStore::new(path), &config),
        None => load_player(&MemoryStore::new(), &config),
    };

    let Some(mission_id) = args.mission.clone() else {
        let enemy = Enemy::for_level(&config.enemies, args.level, config.timing.enemy_damage, &mut rng)?;
        run_battle(&args, &config, player, enemy, &mut rng, None)?;
        return Ok(());
    };

    let mission = config.mission(&mission_id)?.clone();
    let mut progress = MissionProgress::start(&mission);
    println!("== {} ==", mission.name);
    while let Some(level) = progress.current_level() {
        println!("-- {} --", progress.label());
        let enemy = Enemy::for_level(&config.enemies, level, config.timing.enemy_damage, &mut rng)
            .with_context(|| format!("{} 的敵人", progress.label()))?;
        let reward = Some(progress.battle_reward());
        let (survivor, won) = run_battle(&args, &config, player, enemy, &mut rng, reward)?;
        player = survivor;
        if !won {
            progress.record_defeat();
            println!("Mission failed");
            break;
        }
        match progress.record_victory() {
            MissionStep::NextBattle { .. } => continue,
            MissionStep::Complete { rewards } => {
                println!("Mission complete: {:?}", rewards);
                break;
            }
        }
    }
    Ok(())
}

fn run_battle(
    args: &Args,
    config: &CombatConfig,
    player: Player,
    enemy: Enemy,
    rng: &mut StdRng,
    reward: Option<Rewards>,
) -> anyhow::Result<(Player, bool)> {
    let seed: u64 = rng.random();
    let mut engine = CombatEngine::new(config.clone(), player, enemy, StdRng::seed_from_u64(seed))?;
    if let Some(path) = &args.save {
        let store: Box<dyn SaveStore> = Box::new(JsonFileStore::new(path));
        engine = engine.with_store(store);
    }
    engine.set_reward(reward);
    engine.start_combat();

    let tick = config.tick_interval();
    for _ in 0..MAX_STEPS {
        if engine.is_player_turn() {
            play_step(&mut engine)?;
        }
        print_events(args, engine.drain_events())?;
        if let TurnState::Ended(outcome) = engine.state() {
            let won = outcome == Outcome::Victory;
            return Ok((engine.into_player(), won));
        }
        let dt = engine.next_due_in().unwrap_or(tick).min(tick).max(Duration::from_millis(1));
        engine.advance(dt);
    }
    bail!("{MAX_STEPS} 步內沒有分出勝負")
}

/// 玩家策略：先放技能，再走第一個可行的交換，都不行就結束回合
fn play_step(engine: &mut CombatEngine) -> anyhow::Result<()> {
    let ready = engine
        .config()
        .skills
        .iter()
        .find(|skill| engine.player().skill_power(skill.color) >= skill.power_required)
        .map(|skill| skill.color);
    if let Some(color) = ready {
        if engine.use_skill(color).is_ok() {
            return Ok(());
        }
    }

    let grid = engine.grid();
    match find_first_move(grid.cells(), grid.size()) {
        Some(found) => match engine.request_swap(found.from, found.to)? {
            SwapResult::Resolved(_) | SwapResult::Reverted => {}
            SwapResult::Rejected(reason) => bail!("自動交換被拒絕: {reason}"),
        },
        None => engine.end_player_turn(),
    }
    Ok(())
}

fn print_events(args: &Args, events: Vec<CombatEvent>) -> anyhow::Result<()> {
    for event in events {
        if args.json {
            println!("{}", serde_json::to_string(&event)?);
            continue;
        }
        match event {
            CombatEvent::Notification { message, severity } => println!("[{severity}] {message}"),
            CombatEvent::TurnChanged { label, .. } => println!("== {label} =="),
            CombatEvent::DamageDealt {
                amount,
                target,
                kind,
            } => println!("{target} {kind} {amount}"),
            CombatEvent::CombatEnded { outcome, rewards } => {
                println!("{outcome}: {:?}", rewards.unwrap_or_default())
            }
            _ => {}
        }
    }
    Ok(())
}
