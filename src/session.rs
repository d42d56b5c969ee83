use crate::config::SessionConfig;
use crate::timer::{Countdown, CountdownState, Scheduler};
use log::{debug, info};
use std::fmt;
use std::time::{Duration, Instant};

pub const AUTO_ADVANCE_DELAY: Duration = Duration::from_millis(200);

pub trait Puzzle
{
    type Input;
    type Effect: fmt::Debug + PartialEq;

    const NAME: &'static str;

    fn level_count(&self) -> usize;

    fn time_limit(&self) -> Duration;

    fn load_level(&mut self, level: usize, now: Instant);

    fn handle_input(
        &mut self,
        input: Self::Input,
        now: Instant,
        effects: &mut Effects<'_, Self::Effect>,
    ) -> Option<u32>;

    fn apply_effect(&mut self, effect: Self::Effect);
}

#[derive(Debug, PartialEq)]
enum Task<E>
{
    Advance,
    Puzzle(E),
}

pub struct Effects<'a, E>
{
    scheduler: &'a mut Scheduler<Task<E>>,
    now: Instant,
}

impl<E: PartialEq> Effects<'_, E>
{
    pub fn after(&mut self, delay: Duration, effect: E)
    {
        self.scheduler.schedule(self.now + delay, Task::Puzzle(effect));
    }

    pub fn cancel(&mut self, effect: &E)
    {
        self.scheduler
            .cancel_where(|task| matches!(task, Task::Puzzle(pending) if pending == effect));
    }

    pub fn is_pending(&self, effect: &E) -> bool
    {
        self.scheduler
            .is_pending(|task| matches!(task, Task::Puzzle(pending) if pending == effect))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelOutcome
{
    Solved { score: u32 },
    TimedOut,
}

impl LevelOutcome
{
    pub fn score(self) -> u32
    {
        match self {
            LevelOutcome::Solved { score } => score,
            LevelOutcome::TimedOut => 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase
{
    Loading,
    Playing,
    LevelComplete(LevelOutcome),
    Finished,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Summary
{
    pub outcomes: Vec<LevelOutcome>,
    pub total_score: u32,
}

pub struct Session<P: Puzzle>
{
    puzzle: P,
    config: SessionConfig,
    phase: Phase,
    level: usize,
    countdown: Option<Countdown>,
    tasks: Scheduler<Task<P::Effect>>,
    outcomes: Vec<LevelOutcome>,
    total_score: u32,
}

impl<P: Puzzle> Session<P>
{
    pub fn new(puzzle: P, config: SessionConfig) -> Self
    {
        Self {
            puzzle,
            config,
            phase: Phase::Loading,
            level: 0,
            countdown: None,
            tasks: Scheduler::default(),
            outcomes: Vec::new(),
            total_score: 0,
        }
    }

    pub fn start(&mut self, now: Instant)
    {
        if self.phase != Phase::Loading {
            return;
        }
        let last = self.puzzle.level_count().saturating_sub(1);
        self.load(self.config.start_level.min(last), now);
    }

    pub fn puzzle(&self) -> &P
    {
        &self.puzzle
    }

    pub fn phase(&self) -> Phase
    {
        self.phase
    }

    pub fn level(&self) -> usize
    {
        self.level
    }

    pub fn level_count(&self) -> usize
    {
        self.puzzle.level_count()
    }

    pub fn is_last_level(&self) -> bool
    {
        self.level + 1 >= self.puzzle.level_count()
    }

    pub fn total_score(&self) -> u32
    {
        self.total_score
    }

    pub fn remaining_secs(&self) -> u32
    {
        self.countdown
            .as_ref()
            .map_or(0, Countdown::remaining_secs)
    }

    pub fn summary(&self) -> Summary
    {
        Summary {
            outcomes: self.outcomes.clone(),
            total_score: self.total_score,
        }
    }

    pub fn input(&mut self, input: P::Input, now: Instant)
    {
        if self.phase != Phase::Playing {
            return;
        }
        let mut effects = Effects {
            scheduler: &mut self.tasks,
            now,
        };
        if let Some(score) = self.puzzle.handle_input(input, now, &mut effects) {
            self.complete(LevelOutcome::Solved { score });
        }
    }

    pub fn tick(&mut self, now: Instant)
    {
        for task in self.tasks.take_due(now) {
            debug!("{}: running scheduled {:?}", P::NAME, task);
            match task {
                Task::Puzzle(effect) => {
                    if self.phase == Phase::Playing {
                        self.puzzle.apply_effect(effect);
                    }
                }
                Task::Advance => {
                    self.advance(now);
                    return;
                }
            }
        }

        if self.phase != Phase::Playing {
            return;
        }
        let expired = self
            .countdown
            .as_mut()
            .is_some_and(|countdown| countdown.tick(now) == CountdownState::Expired);
        if expired {
            info!("{}: level {} timed out", P::NAME, self.level + 1);
            self.complete(LevelOutcome::TimedOut);
            self.tasks.schedule(now + AUTO_ADVANCE_DELAY, Task::Advance);
        }
    }

    /// The "next" action. Returns false when there is no completed level to leave.
    pub fn advance(&mut self, now: Instant) -> bool
    {
        if !matches!(self.phase, Phase::LevelComplete(_)) {
            return false;
        }
        if self.is_last_level() {
            self.tasks.cancel_all();
            self.phase = Phase::Finished;
            info!("{}: finished with score {}", P::NAME, self.total_score);
        } else {
            self.load(self.level + 1, now);
        }
        true
    }

    fn load(&mut self, level: usize, now: Instant)
    {
        self.tasks.cancel_all();
        self.level = level;
        self.puzzle.load_level(level, now);
        let limit = self.config.time_limit.unwrap_or_else(|| self.puzzle.time_limit());
        self.countdown = Some(Countdown::start(limit, now));
        self.phase = Phase::Playing;
        info!("{}: level {} started ({}s)", P::NAME, level + 1, limit.as_secs());
    }

    fn complete(&mut self, outcome: LevelOutcome)
    {
        self.tasks.cancel_all();
        self.total_score += outcome.score();
        self.outcomes.push(outcome);
        self.phase = Phase::LevelComplete(outcome);
        if let LevelOutcome::Solved { score } = outcome {
            info!("{}: level {} solved for {} points", P::NAME, self.level + 1, score);
        }
    }
}
