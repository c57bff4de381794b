//! 戰鬥系統
//!
//! 回合狀態機：玩家回合（倒數計時、可交換與施放技能）→ 敵方回合（自動攻擊）→ ...
//! 直到一方倒下。所有延遲都是 `Scheduler` 上的任務，每個任務執行前都重新檢查
//! 戰鬥是否仍在進行，結束戰鬥會取消全部任務。

use crate::{
    character::{Combatant, StatKind, StatusEffect},
    config::CombatConfig,
    enemy::{Enemy, EnemyAction},
    error::{CombatError, Error, Result},
    events::{AmountKind, CombatEvent, Outcome, Severity, Side, StatsView},
    mission::Rewards,
    player::Player,
    save::{SaveRecord, SaveStore},
    schedule::{Scheduler, Task},
    skills::{ActiveBuff, PowerTable, SkillDef, SkillEffect, Targeting, DEFAULT_BUFF_TURNS},
    Hp, SkillID,
};
use grid_lib::{
    CellIndex, Color, Grid, GridError, GridObserver, Match, MatchSize, Resolution, SwapOutcome,
};
use log::{debug, error, info, warn};
use rand::{rngs::StdRng, Rng};
use std::{collections::BTreeMap, time::Duration};

pub const PLAYER_TURN_LABEL: &str = "Your Turn";
pub const ENEMY_TURN_LABEL: &str = "Enemy's Turn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// 尚未呼叫 `start_combat`
    Ready,
    PlayerTurn,
    EnemyTurn,
    Ended(Outcome),
}

/// 玩家交換的結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapResult {
    /// 無效操作，棋盤沒有變化
    Rejected(GridError),
    /// 沒有形成三連，已換回
    Reverted,
    Resolved(Resolution),
}

/// 把棋盤的消除通知轉成能量
struct MatchSink<'a> {
    player: &'a mut Player,
    events: &'a mut Vec<CombatEvent>,
    table: &'a PowerTable,
    accepting: bool,
}

impl GridObserver for MatchSink<'_> {
    fn on_swap(&mut self, from: CellIndex, to: CellIndex) {
        self.events.push(CombatEvent::Swapped { from, to });
    }

    fn on_match(&mut self, matched: &Match) {
        accrue_power(
            self.player,
            self.events,
            self.table,
            self.accepting,
            matched.color,
            matched.size(),
        );
    }
}

fn accrue_power(
    player: &mut Player,
    events: &mut Vec<CombatEvent>,
    table: &PowerTable,
    accepting: bool,
    color: Color,
    size: MatchSize,
) {
    if !accepting {
        debug!("忽略過期的消除 {color} x{size}");
        return;
    }
    events.push(CombatEvent::MatchOccurred { color, size });
    let power = player.add_skill_power(color, size, table);
    events.push(CombatEvent::PowerChanged { color, power });
}

pub struct CombatEngine<R: Rng = StdRng> {
    config: CombatConfig,
    player: Player,
    enemy: Enemy,
    grid: Grid,
    rng: R,
    state: TurnState,
    combat_active: bool,
    remaining: u32,
    scheduler: Scheduler,
    buffs: BTreeMap<SkillID, ActiveBuff>,
    /// 第一個防禦增益生效前的基礎防禦
    unbuffed_defense: Option<f64>,
    reward_override: Option<Rewards>,
    store: Option<Box<dyn SaveStore>>,
    events: Vec<CombatEvent>,
}

impl<R: Rng> CombatEngine<R> {
    pub fn new(config: CombatConfig, mut player: Player, enemy: Enemy, mut rng: R) -> Result<Self> {
        config.validate()?;
        let mut grid = Grid::new(config.grid.size, config.grid.colors.clone(), &mut rng)?;
        grid.disable();
        player.ensure_skill_slots(config.palette());
        Ok(Self::assemble(config, player, enemy, grid, rng))
    }

    /// 使用指定的棋盤，方便重現固定盤面
    pub fn with_grid(
        config: CombatConfig,
        mut player: Player,
        enemy: Enemy,
        mut grid: Grid,
        rng: R,
    ) -> Result<Self> {
        config.validate()?;
        grid.disable();
        player.ensure_skill_slots(config.palette());
        Ok(Self::assemble(config, player, enemy, grid, rng))
    }

    fn assemble(config: CombatConfig, player: Player, enemy: Enemy, grid: Grid, rng: R) -> Self {
        let mut engine = Self {
            remaining: config.timing.turn_time,
            config,
            player,
            enemy,
            grid,
            rng,
            state: TurnState::Ready,
            combat_active: false,
            scheduler: Scheduler::default(),
            buffs: BTreeMap::new(),
            unbuffed_defense: None,
            reward_override: None,
            store: None,
            events: Vec::new(),
        };
        engine.push_stats();
        engine
    }

    /// 戰鬥結束時寫入存檔
    pub fn with_store(mut self, store: Box<dyn SaveStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// 勝利時改用指定獎勵（任務流程使用）
    pub fn set_reward(&mut self, rewards: Option<Rewards>) {
        self.reward_override = rewards;
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn enemy(&self) -> &Enemy {
        &self.enemy
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_combat_active(&self) -> bool {
        self.combat_active
    }

    pub fn is_player_turn(&self) -> bool {
        self.state == TurnState::PlayerTurn
    }

    pub fn remaining_time(&self) -> u32 {
        self.remaining
    }

    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    /// 距離下一個排程任務的時間；沒有任務時為 `None`
    pub fn next_due_in(&self) -> Option<Duration> {
        self.scheduler.next_due_in()
    }

    pub fn active_buff(&self, id: &str) -> Option<&ActiveBuff> {
        self.buffs.get(id).filter(|buff| buff.active)
    }

    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    /// 取回玩家（例如戰鬥結束後帶到下一場）
    pub fn into_player(self) -> Player {
        self.player
    }

    pub fn start_combat(&mut self) {
        if self.state != TurnState::Ready {
            debug!("戰鬥已開始過，忽略 start_combat");
            return;
        }
        info!("戰鬥開始：{} vs {}", self.player.name(), self.enemy.name());
        self.combat_active = true;
        self.notify("Battle Start!", Severity::Info);
        self.push_stats();
        self.start_player_turn();
    }

    fn start_player_turn(&mut self) {
        if !self.combat_active {
            return;
        }
        self.state = TurnState::PlayerTurn;
        self.grid.enable();
        self.remaining = self.config.timing.turn_time;
        info!("玩家回合，{} 秒", self.remaining);
        self.events.push(CombatEvent::TurnChanged {
            label: PLAYER_TURN_LABEL.to_string(),
            remaining: self.remaining,
        });
        self.scheduler.cancel(Task::TimerTick);
        self.scheduler
            .schedule(self.config.tick_interval(), Task::TimerTick);
    }

    fn on_timer_tick(&mut self) {
        if !self.combat_active || !self.is_player_turn() {
            debug!("忽略過期的倒數");
            return;
        }
        self.remaining = self.remaining.saturating_sub(1);
        self.events.push(CombatEvent::TimerChanged {
            remaining: self.remaining,
        });
        if self.remaining == 0 {
            info!("玩家回合時間到");
            self.end_player_turn();
        } else {
            self.scheduler
                .schedule(self.config.tick_interval(), Task::TimerTick);
        }
    }

    pub fn end_player_turn(&mut self) {
        if !self.combat_active || !self.is_player_turn() {
            debug!("不在玩家回合，忽略 end_player_turn");
            return;
        }
        self.scheduler.cancel(Task::TimerTick);
        self.grid.disable();
        self.state = TurnState::EnemyTurn;
        info!("敵方回合");
        self.events.push(CombatEvent::TurnChanged {
            label: ENEMY_TURN_LABEL.to_string(),
            remaining: 0,
        });
        self.scheduler
            .schedule(self.config.enemy_turn_delay(), Task::EnemyTurn);
    }

    /// 消除累積能量；只在玩家回合且戰鬥進行中生效
    pub fn handle_match(&mut self, color: Color, size: MatchSize) {
        let accepting = self.combat_active && self.is_player_turn();
        accrue_power(
            &mut self.player,
            &mut self.events,
            &self.config.match_power,
            accepting,
            color,
            size,
        );
    }

    /// 玩家交換兩格
    ///
    /// 無效操作回傳 `Rejected`；連鎖超過上限屬於內部錯誤，回傳 `Err`。
    pub fn request_swap(&mut self, from: CellIndex, to: CellIndex) -> Result<SwapResult> {
        let mut sink = MatchSink {
            player: &mut self.player,
            events: &mut self.events,
            table: &self.config.match_power,
            accepting: self.combat_active && self.state == TurnState::PlayerTurn,
        };
        match self.grid.swap(from, to, &mut self.rng, &mut sink) {
            Ok(SwapOutcome::Reverted) => Ok(SwapResult::Reverted),
            Ok(SwapOutcome::Resolved(resolution)) => Ok(SwapResult::Resolved(resolution)),
            Err(err) if err.is_invalid_move() => {
                debug!("拒絕交換 {from} <-> {to}: {err}");
                Ok(SwapResult::Rejected(err))
            }
            Err(err) => {
                error!("交換 {from} <-> {to} 失敗: {err}");
                Err(Error::from(err).context(format!("交換 {from} <-> {to}")))
            }
        }
    }

    /// 施放顏色對應的技能，目標依技能設定
    pub fn use_skill(&mut self, color: Color) -> Result<(), CombatError> {
        let target = match self.config.skill_for(color).map(SkillDef::targeting) {
            Some(Targeting::Caster) => Side::Player,
            _ => Side::Enemy,
        };
        self.use_skill_on(color, target)
    }

    /// 對指定目標施放技能
    ///
    /// 失敗時只發出警告通知，不改變任何狀態。
    pub fn use_skill_on(&mut self, color: Color, target: Side) -> Result<(), CombatError> {
        if !self.combat_active {
            debug!("戰鬥未進行，忽略技能 {color}");
            return Err(CombatError::Inactive);
        }
        let result = self.check_skill(color, target);
        let skill = match result {
            Ok(skill) => skill,
            Err(err) => {
                warn!("技能 {color} 無法施放: {err}");
                self.notify(err.to_string(), Severity::Warning);
                return Err(err);
            }
        };

        self.player.reset_skill_power(color);
        self.events
            .push(CombatEvent::PowerChanged { color, power: 0 });
        self.grid.disable();
        self.apply_skill(&skill);
        self.push_stats();
        self.notify(format!("{} used!", skill.name), Severity::Info);
        info!("施放 {}", skill.name);

        if self.enemy.is_dead() {
            self.end_combat(Outcome::Victory);
        } else {
            self.end_player_turn();
        }
        Ok(())
    }

    fn check_skill(&self, color: Color, target: Side) -> Result<SkillDef, CombatError> {
        if !self.is_player_turn() {
            return Err(CombatError::NotPlayerTurn);
        }
        let skill = self
            .config
            .skill_for(color)
            .ok_or(CombatError::NoSkill(color))?;
        let expected = match skill.targeting() {
            Targeting::Caster => Side::Player,
            Targeting::Enemy => Side::Enemy,
        };
        if target != expected {
            return Err(CombatError::InvalidTarget {
                skill: skill.name.clone(),
            });
        }
        let current = self.player.skill_power(color);
        if current < skill.power_required {
            return Err(CombatError::InsufficientPower {
                skill: skill.name.clone(),
                current,
                required: skill.power_required,
            });
        }
        Ok(skill.clone())
    }

    fn apply_skill(&mut self, skill: &SkillDef) {
        match skill.effect {
            SkillEffect::Damage => {
                let amount = self.enemy.take_damage(skill.magnitude);
                self.events.push(CombatEvent::DamageDealt {
                    amount,
                    target: Side::Enemy,
                    kind: AmountKind::Damage,
                });
            }
            SkillEffect::Heal => {
                let amount = self.player.heal(skill.magnitude.floor() as Hp);
                self.events.push(CombatEvent::DamageDealt {
                    amount,
                    target: Side::Player,
                    kind: AmountKind::Heal,
                });
            }
            SkillEffect::BuffDefense => {
                let turns = skill.duration_turns.unwrap_or(DEFAULT_BUFF_TURNS);
                if self.unbuffed_defense.is_none() {
                    self.unbuffed_defense = Some(self.player.stats.base_defense);
                }
                let buff = self.buffs.entry(skill.id.clone()).or_default();
                let message = if buff.active {
                    buff.refresh(turns);
                    format!("{} duration refreshed!", skill.name)
                } else {
                    buff.activate(skill.magnitude, turns);
                    format!("Defense increased for {turns} turns!")
                };
                self.apply_defense_buffs();
                self.notify(message, Severity::Info);
            }
            SkillEffect::DebuffAttack => {
                match skill.duration_turns {
                    None => self.enemy.stats.base_attack *= skill.magnitude,
                    Some(turns) => self.enemy.add_status_effect(StatusEffect::new(
                        StatKind::Attack,
                        skill.magnitude,
                        Some(turns),
                    )),
                }
                self.notify("Enemy attack reduced!", Severity::Info);
            }
        }
    }

    /// 增益剩餘回合減一，到期的從防禦中移除
    fn update_buff_durations(&mut self) {
        let mut expired = Vec::new();
        for (id, buff) in self.buffs.iter_mut() {
            if buff.tick() {
                expired.push(id.clone());
            }
        }
        if expired.is_empty() {
            return;
        }
        self.apply_defense_buffs();
        for id in expired {
            let name = self
                .config
                .skill_by_id(&id)
                .map_or(id.clone(), |skill| skill.name.clone());
            info!("{name} 結束");
            self.notify(format!("{name} wore off!"), Severity::Info);
        }
    }

    fn revert_buffs(&mut self) {
        for buff in self.buffs.values_mut() {
            buff.revert();
        }
        self.apply_defense_buffs();
    }

    /// 依增益前的基礎防禦與所有生效中的倍率重算防禦；全部結束時還原
    fn apply_defense_buffs(&mut self) {
        let Some(base) = self.unbuffed_defense else {
            return;
        };
        let multiplier: f64 = self.buffs.values().map(ActiveBuff::factor).product();
        self.player.stats.base_defense = base * multiplier;
        if self.buffs.values().all(|buff| !buff.active) {
            self.player.stats.base_defense = base;
            self.unbuffed_defense = None;
        }
    }

    /// 敵方行動
    ///
    /// 狀態效果與增益在這裡各結算一次，接著敵人攻擊；
    /// 之後依雙方 HP 決定勝負或排程下一個玩家回合。
    pub fn enemy_turn(&mut self) {
        if !self.combat_active {
            debug!("戰鬥已結束，忽略敵方回合");
            return;
        }
        self.scheduler.cancel(Task::TimerTick);
        self.scheduler.cancel(Task::EnemyTurn);
        self.state = TurnState::EnemyTurn;

        self.update_buff_durations();
        self.player.update_status_effects();
        self.enemy.update_status_effects();
        self.grid.disable();

        let cooldown = self.config.ai_cooldown();
        if let Some(proposed) = self
            .enemy
            .decide_move(self.grid.cells(), self.grid.size(), cooldown)
        {
            debug!("敵方 AI 看中 {} <-> {}", proposed.from, proposed.to);
            self.events.push(CombatEvent::EnemyMoveProposed {
                from: proposed.from,
                to: proposed.to,
            });
        }

        let action = self.enemy.begin_action(&mut self.rng);
        match action {
            Some(EnemyAction::Attack { damage }) => self.enemy_attack(damage),
            None => warn!("{} 沒有可用的行動", self.enemy.name()),
        }
        self.enemy.finish_action();
        self.push_stats();

        if self.player.is_dead() {
            self.end_combat(Outcome::Defeat);
        } else if self.enemy.is_dead() {
            self.end_combat(Outcome::Victory);
        } else {
            self.scheduler
                .schedule(self.config.player_turn_delay(), Task::PlayerTurn);
        }
    }

    /// 敵方攻擊只看玩家的基礎防禦
    fn enemy_attack(&mut self, damage: f64) {
        let raw = damage * (f64::from(self.enemy.attack()) / 10.0);
        let defense = self.player.stats.base_defense;
        let reduction = defense / (defense + 100.0);
        let reduced = (raw * (1.0 - reduction)).floor().max(0.0) as Hp;
        let amount = self.player.stats.lose_hp(reduced);
        info!("{} 造成 {amount} 點傷害（原始 {raw}）", self.enemy.name());

        self.events.push(CombatEvent::DamageDealt {
            amount,
            target: Side::Player,
            kind: AmountKind::Damage,
        });
        let raw_floor = raw.floor() as Hp;
        let message = if reduced < raw_floor {
            format!("Enemy attacked for {reduced} damage (reduced from {raw_floor})")
        } else {
            format!("Enemy attacked for {reduced} damage")
        };
        self.notify(message, Severity::Warning);
    }

    /// 撤退：以落敗結算
    pub fn abort(&mut self) {
        info!("玩家撤退");
        self.end_combat(Outcome::Defeat);
    }

    fn end_combat(&mut self, outcome: Outcome) {
        if matches!(self.state, TurnState::Ended(_)) {
            return;
        }
        self.combat_active = false;
        self.scheduler.cancel_all();
        self.grid.disable();
        self.revert_buffs();
        self.state = TurnState::Ended(outcome);

        let rewards = match outcome {
            Outcome::Victory => {
                let rewards = self.reward_override.clone().unwrap_or_else(|| {
                    Rewards::exp(self.config.timing.victory_exp_per_level * self.enemy.level())
                });
                self.player.gain_experience(rewards.exp);
                self.player.coins += rewards.coins;
                info!("勝利，獲得 {} 經驗與 {} 金幣", rewards.exp, rewards.coins);
                Some(rewards)
            }
            Outcome::Defeat => {
                self.player.lose_experience(1);
                info!("戰敗");
                None
            }
        };
        self.persist();
        self.push_stats();
        self.events
            .push(CombatEvent::CombatEnded { outcome, rewards });
    }

    fn persist(&mut self) {
        let Some(store) = self.store.as_mut() else {
            return;
        };
        if let Err(err) = store.save(&SaveRecord::from_player(&self.player)) {
            warn!("存檔失敗: {err}");
            self.notify("Failed to save progress", Severity::Error);
        }
    }

    /// 推進邏輯時鐘並依序執行到期的任務
    pub fn advance(&mut self, dt: Duration) {
        let until = self.scheduler.now() + dt;
        self.enemy.tick(dt);
        while let Some(task) = self.scheduler.pop_due(until) {
            match task {
                Task::TimerTick => self.on_timer_tick(),
                Task::EnemyTurn => self.enemy_turn(),
                Task::PlayerTurn => self.start_player_turn(),
            }
        }
        self.scheduler.advance_to(until);
    }

    fn notify(&mut self, message: impl Into<String>, severity: Severity) {
        self.events.push(CombatEvent::Notification {
            message: message.into(),
            severity,
        });
    }

    fn push_stats(&mut self) {
        self.events.push(CombatEvent::StatsChanged {
            player: StatsView::of(&self.player),
            enemy: StatsView::of(&self.enemy),
        });
    }
}
