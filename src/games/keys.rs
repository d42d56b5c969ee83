use crate::error::GameError;
use crate::grid::{Direction, Position};
use crate::session::{Effects, LevelOutcome, Puzzle};
use crate::terminal::TerminalGame;
use crossterm::event::KeyCode;
use log::{debug, error};
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

pub const TIME_LIMIT: Duration = Duration::from_secs(60);
pub const RESET_DELAY: Duration = Duration::from_millis(500);

const BASE_SCORE: u32 = 500;
const ATTEMPT_PENALTY: u32 = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyLevel
{
    pub size: i32,
    pub start: Position,
    pub key: Position,
    pub safe_cells: Vec<Position>,
}

impl KeyLevel
{
    fn from_table(size: i32, key: (i32, i32), cells: &[(i32, i32)]) -> Self
    {
        Self {
            size,
            start: Position::new(0, 0),
            key: Position::new(key.0, key.1),
            safe_cells: cells.iter().map(|&(x, y)| Position::new(x, y)).collect(),
        }
    }

    pub fn contains(&self, position: Position) -> bool
    {
        position.x >= 0 && position.x < self.size && position.y >= 0 && position.y < self.size
    }

    pub fn is_safe(&self, position: Position) -> bool
    {
        self.safe_cells.contains(&position)
    }

    pub fn is_solvable(&self) -> bool
    {
        if !self.is_safe(self.start) {
            return false;
        }
        let mut seen = HashSet::from([self.start]);
        let mut queue = VecDeque::from([self.start]);
        while let Some(cell) = queue.pop_front() {
            if cell == self.key {
                return true;
            }
            for direction in Direction::ALL {
                let next = cell.step(direction);
                if self.is_safe(next) && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }
}

pub fn levels() -> Vec<KeyLevel>
{
    vec![
        KeyLevel::from_table(4, (3, 2), &[(0, 0), (1, 0), (2, 0), (2, 1), (2, 2), (3, 2)]),
        KeyLevel::from_table(
            5,
            (4, 4),
            &[(0, 0), (0, 1), (1, 1), (1, 2), (2, 2), (2, 3), (3, 3), (3, 4), (4, 4)],
        ),
        KeyLevel::from_table(
            6,
            (5, 5),
            &[
                (0, 0), (0, 1), (1, 1), (1, 2), (2, 2), (2, 1), (3, 1), (3, 2), (3, 3),
                (4, 3), (4, 4), (5, 4), (5, 5),
            ],
        ),
    ]
}

pub fn validate_levels() -> Result<(), GameError>
{
    for (index, level) in levels().iter().enumerate() {
        if !level.is_solvable() {
            return Err(GameError::UnsolvableLevel {
                game: KeyPuzzle::NAME,
                level: index + 1,
            });
        }
    }
    Ok(())
}

/// Score for finding the key after `attempts` earlier probes.
pub fn level_score(level: usize, attempts: u32) -> u32
{
    let base = BASE_SCORE.saturating_sub(attempts.saturating_mul(ATTEMPT_PENALTY));
    base * (level as u32 + 1)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reveal
{
    Safe,
    Unsafe,
}

#[derive(Debug, PartialEq)]
pub enum KeyEffect
{
    ResetToStart,
}

#[derive(Clone, Debug)]
pub struct KeyRun
{
    pub index: usize,
    pub level: KeyLevel,
    pub player: Position,
    pub revealed: HashMap<Position, Reveal>,
    pub attempts: u32,
    pub found_key: bool,
    pub resetting: bool,
}

pub struct KeyPuzzle
{
    levels: Vec<KeyLevel>,
    run: Option<KeyRun>,
}

impl KeyPuzzle
{
    pub fn new() -> Self
    {
        Self {
            levels: levels(),
            run: None,
        }
    }

    pub fn run(&self) -> Option<&KeyRun>
    {
        self.run.as_ref()
    }
}

impl Default for KeyPuzzle
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl Puzzle for KeyPuzzle
{
    type Input = Position;
    type Effect = KeyEffect;

    const NAME: &'static str = "keys";

    fn level_count(&self) -> usize
    {
        self.levels.len()
    }

    fn time_limit(&self) -> Duration
    {
        TIME_LIMIT
    }

    fn load_level(&mut self, level: usize, _now: Instant)
    {
        if self.levels.get(level).is_some_and(|definition| !definition.is_solvable()) {
            error!("key level {} has no safe path to the key", level + 1);
        }
        self.run = self.levels.get(level).cloned().map(|definition| KeyRun {
            index: level,
            player: definition.start,
            level: definition,
            revealed: HashMap::new(),
            attempts: 0,
            found_key: false,
            resetting: false,
        });
    }

    fn handle_input(
        &mut self,
        target: Position,
        _now: Instant,
        effects: &mut Effects<'_, KeyEffect>,
    ) -> Option<u32>
    {
        let run = self.run.as_mut()?;
        if run.resetting || !run.player.is_adjacent(target) || !run.level.contains(target) {
            debug!("keys: ignoring probe at {:?}", target);
            return None;
        }

        let earlier_attempts = run.attempts;
        run.attempts += 1;

        if !run.level.is_safe(target) {
            run.revealed.insert(target, Reveal::Unsafe);
            run.resetting = true;
            effects.after(RESET_DELAY, KeyEffect::ResetToStart);
            return None;
        }

        run.revealed.insert(target, Reveal::Safe);
        run.player = target;
        if target != run.level.key {
            return None;
        }
        run.found_key = true;
        Some(level_score(run.index, earlier_attempts))
    }

    fn apply_effect(&mut self, effect: KeyEffect)
    {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        match effect {
            KeyEffect::ResetToStart => {
                run.revealed.clear();
                run.player = run.level.start;
                run.resetting = false;
            }
        }
    }
}

impl TerminalGame for KeyPuzzle
{
    const TITLE: &'static str = "Door & Key Puzzle";
    const CONTROLS: &'static str = "Arrow keys probe the neighbouring cell. A wrong cell sends you back to the door.";

    fn map_key(&self, code: KeyCode) -> Option<Position>
    {
        let player = self.run.as_ref()?.player;
        let direction = match code {
            KeyCode::Up => Direction::Up,
            KeyCode::Down => Direction::Down,
            KeyCode::Left => Direction::Left,
            KeyCode::Right => Direction::Right,
            _ => return None,
        };
        Some(player.step(direction))
    }

    fn draw_level(&self, lines: &mut Vec<String>)
    {
        let Some(run) = &self.run else {
            return;
        };
        lines.push(format!("Attempts: {}", run.attempts));
        lines.push(String::new());
        for y in 0..run.level.size {
            let mut row = String::new();
            for x in 0..run.level.size {
                row.push_str(&render_cell(run, Position::new(x, y)));
            }
            lines.push(row);
        }
    }

    fn draw_result(&self, outcome: LevelOutcome, lines: &mut Vec<String>)
    {
        if let (LevelOutcome::Solved { .. }, Some(run)) = (outcome, &self.run) {
            lines.push(format!("Key found after {} attempts.", run.attempts));
        }
    }
}

fn render_cell(run: &KeyRun, cell: Position) -> String
{
    let (label, (r, g, b)) = if cell == run.level.key && run.found_key {
        ('K', (250, 204, 21))
    } else {
        match run.revealed.get(&cell) {
            Some(Reveal::Safe) if cell == run.player => ('@', (34, 197, 94)),
            Some(Reveal::Safe) => (' ', (34, 197, 94)),
            Some(Reveal::Unsafe) => ('x', (239, 68, 68)),
            None if cell == run.player => ('@', (251, 146, 60)),
            None => (' ', (70, 70, 70)),
        }
    };
    format!("\x1b[48;2;{};{};{}m {} \x1b[0m", r, g, b, label)
}
