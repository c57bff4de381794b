//! 邏輯時鐘排程
//!
//! 回合倒數與回合間的延遲都是排程任務，由 `advance` 推進時間觸發。
//! 不使用真實時鐘，測試可以精確控制時間。

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// 玩家回合倒數一格
    TimerTick,
    EnemyTurn,
    PlayerTurn,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    due: Duration,
    seq: u64,
    task: Task,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    next_seq: u64,
    pending: Vec<Pending>,
}

impl Scheduler {
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, delay: Duration, task: Task) {
        self.pending.push(Pending {
            due: self.now + delay,
            seq: self.next_seq,
            task,
        });
        self.next_seq += 1;
    }

    /// 取消所有同種任務
    pub fn cancel(&mut self, task: Task) {
        self.pending.retain(|pending| pending.task != task);
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_scheduled(&self, task: Task) -> bool {
        self.pending.iter().any(|pending| pending.task == task)
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// 距離下一個任務的時間
    pub fn next_due_in(&self) -> Option<Duration> {
        self.pending
            .iter()
            .map(|pending| pending.due.saturating_sub(self.now))
            .min()
    }

    /// 取出 `until` 之前到期的最早任務，同時把時鐘推到該任務的時間點
    ///
    /// 同一時間點的任務依排程順序執行。
    pub fn pop_due(&mut self, until: Duration) -> Option<Task> {
        let (position, pending) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, pending)| pending.due <= until)
            .min_by_key(|(_, pending)| (pending.due, pending.seq))
            .map(|(position, pending)| (position, *pending))?;
        self.pending.remove(position);
        self.now = self.now.max(pending.due);
        Some(pending.task)
    }

    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}
