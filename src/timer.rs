use std::time::{Duration, Instant};

const TICK: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountdownState
{
    Running,
    Expired,
}

#[derive(Clone, Debug)]
pub struct Countdown
{
    remaining: u32,
    next_tick: Instant,
}

impl Countdown
{
    pub fn start(limit: Duration, now: Instant) -> Self
    {
        let remaining = u32::try_from(limit.as_secs()).unwrap_or(u32::MAX);
        Self {
            remaining,
            next_tick: now + TICK,
        }
    }

    pub fn remaining_secs(&self) -> u32
    {
        self.remaining
    }

    pub fn tick(&mut self, now: Instant) -> CountdownState
    {
        while self.remaining > 0 && now >= self.next_tick {
            self.remaining -= 1;
            self.next_tick += TICK;
        }
        if self.remaining == 0 {
            CountdownState::Expired
        } else {
            CountdownState::Running
        }
    }
}

#[derive(Debug)]
struct Scheduled<T>
{
    due: Instant,
    epoch: u64,
    task: T,
}

/// `cancel_all` starts a new epoch; tasks stamped with an older one never fire
/// and are dropped on the next `take_due`.
#[derive(Debug)]
pub struct Scheduler<T>
{
    epoch: u64,
    pending: Vec<Scheduled<T>>,
}

impl<T> Default for Scheduler<T>
{
    fn default() -> Self
    {
        Self {
            epoch: 0,
            pending: Vec::new(),
        }
    }
}

impl<T> Scheduler<T>
{
    pub fn schedule(&mut self, due: Instant, task: T)
    {
        self.pending.push(Scheduled {
            due,
            epoch: self.epoch,
            task,
        });
    }

    pub fn cancel_all(&mut self)
    {
        self.epoch += 1;
    }

    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&T) -> bool)
    {
        self.pending.retain(|scheduled| !predicate(&scheduled.task));
    }

    pub fn is_pending(&self, mut predicate: impl FnMut(&T) -> bool) -> bool
    {
        self.pending
            .iter()
            .any(|scheduled| scheduled.epoch == self.epoch && predicate(&scheduled.task))
    }

    pub fn take_due(&mut self, now: Instant) -> Vec<T>
    {
        let epoch = self.epoch;
        self.pending.retain(|scheduled| scheduled.epoch == epoch);
        self.pending.sort_by_key(|scheduled| scheduled.due);

        let split = self
            .pending
            .iter()
            .position(|scheduled| scheduled.due > now)
            .unwrap_or(self.pending.len());
        self.pending
            .drain(..split)
            .map(|scheduled| scheduled.task)
            .collect()
    }
}
