//! Walls are segments on grid lines: a vertical wall at `x = W` separates
//! columns `W - 1` and `W` for the rows in its half-open span `[min, max)`,
//! and a horizontal wall does the same for rows. Moves are single
//! orthogonal steps, scored against a breadth-first shortest path.

use crate::error::GameError;
use crate::grid::{Direction, Position};
use crate::session::{Effects, LevelOutcome, Puzzle};
use crate::terminal::TerminalGame;
use crossterm::event::KeyCode;
use log::{debug, error};
use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::time::{Duration, Instant};

pub const TIME_LIMIT: Duration = Duration::from_secs(300);

const PATH_BONUS: f64 = 100.0;
const TIME_BONUS_SECS: f64 = 100.0;
const LEVEL_BONUS: f64 = 50.0;

const LEVEL_1_WALLS: &[[i32; 4]] = &[
    [1, 0, 1, 3], [3, 0, 3, 2], [3, 3, 3, 5], [5, 2, 5, 5], [5, 6, 5, 7],
    [0, 2, 2, 2], [1, 4, 4, 4], [3, 6, 6, 6], [5, 1, 7, 1],
];

const LEVEL_2_WALLS: &[[i32; 4]] = &[
    [1, 0, 1, 4], [3, 1, 3, 3], [3, 5, 3, 8], [5, 2, 5, 5], [5, 7, 5, 9],
    [7, 0, 7, 2], [7, 4, 7, 6], [9, 3, 9, 6],
    [0, 2, 2, 2], [2, 4, 5, 4], [1, 6, 4, 6], [4, 2, 6, 2], [6, 5, 9, 5],
    [7, 8, 9, 8], [2, 8, 4, 8],
];

const LEVEL_3_WALLS: &[[i32; 4]] = &[
    [1, 0, 1, 3], [1, 5, 1, 8], [3, 2, 3, 5], [3, 7, 3, 10],
    [5, 1, 5, 4], [5, 6, 5, 9], [7, 0, 7, 3], [7, 5, 7, 8],
    [9, 2, 9, 5], [9, 7, 9, 10], [11, 4, 11, 7],
    [0, 2, 2, 2], [2, 4, 5, 4], [1, 6, 4, 6], [4, 2, 7, 2],
    [6, 5, 9, 5], [8, 3, 11, 3], [7, 7, 10, 7], [2, 9, 5, 9],
    [5, 11, 8, 11], [9, 1, 11, 1], [10, 9, 11, 9],
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Wall
{
    pub a: Position,
    pub b: Position,
}

impl Wall
{
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self
    {
        Self {
            a: Position::new(x1, y1),
            b: Position::new(x2, y2),
        }
    }

    pub fn is_vertical(&self) -> bool
    {
        self.a.x == self.b.x
    }

    pub fn is_horizontal(&self) -> bool
    {
        self.a.y == self.b.y
    }

    pub fn blocks(&self, from: Position, to: Position) -> bool
    {
        if self.is_vertical()
            && crosses(from.x, to.x, self.a.x)
            && in_span(from.y, self.a.y, self.b.y)
        {
            return true;
        }
        self.is_horizontal()
            && crosses(from.y, to.y, self.a.y)
            && in_span(from.x, self.a.x, self.b.x)
    }
}

fn crosses(from: i32, to: i32, line: i32) -> bool
{
    (from < line && to >= line) || (from >= line && to < line)
}

fn in_span(value: i32, a: i32, b: i32) -> bool
{
    value >= a.min(b) && value < a.max(b)
}

pub fn is_valid_move(walls: &[Wall], from: Position, to: Position) -> bool
{
    !walls.iter().any(|wall| wall.blocks(from, to))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MazeLevel
{
    pub width: i32,
    pub height: i32,
    pub walls: Vec<Wall>,
    pub start: Position,
    pub end: Position,
}

impl MazeLevel
{
    fn from_table(width: i32, height: i32, walls: &[[i32; 4]], start: Position, end: Position) -> Self
    {
        Self {
            width,
            height,
            walls: walls
                .iter()
                .map(|&[x1, y1, x2, y2]| Wall::new(x1, y1, x2, y2))
                .collect(),
            start,
            end,
        }
    }

    pub fn contains(&self, position: Position) -> bool
    {
        position.x >= 0 && position.x < self.width && position.y >= 0 && position.y < self.height
    }

    pub fn can_step(&self, from: Position, to: Position) -> bool
    {
        from.is_adjacent(to) && self.contains(to) && is_valid_move(&self.walls, from, to)
    }
}

pub fn levels() -> Vec<MazeLevel>
{
    vec![
        MazeLevel::from_table(8, 8, LEVEL_1_WALLS, Position::new(0, 3), Position::new(7, 1)),
        MazeLevel::from_table(10, 10, LEVEL_2_WALLS, Position::new(0, 4), Position::new(9, 7)),
        MazeLevel::from_table(12, 12, LEVEL_3_WALLS, Position::new(0, 5), Position::new(11, 6)),
    ]
}

pub fn validate_levels() -> Result<(), GameError>
{
    for (index, level) in levels().iter().enumerate() {
        if shortest_path(level).is_none() {
            return Err(GameError::UnsolvableLevel {
                game: MazePuzzle::NAME,
                level: index + 1,
            });
        }
    }
    Ok(())
}

pub fn shortest_path(level: &MazeLevel) -> Option<Vec<Position>>
{
    shortest_path_with_order(level, &Direction::ALL)
}

/// The order only picks between equally short paths.
pub fn shortest_path_with_order(level: &MazeLevel, order: &[Direction]) -> Option<Vec<Position>>
{
    if !level.contains(level.start) || !level.contains(level.end) {
        return None;
    }

    let mut parents: HashMap<Position, Option<Position>> = HashMap::new();
    let mut queue = VecDeque::new();
    parents.insert(level.start, None);
    queue.push_back(level.start);

    while let Some(cell) = queue.pop_front() {
        if cell == level.end {
            return Some(trace_back(&parents, cell));
        }

        for &direction in order {
            let next = cell.step(direction);
            if parents.contains_key(&next) || !level.can_step(cell, next) {
                continue;
            }
            parents.insert(next, Some(cell));
            queue.push_back(next);
        }
    }

    None
}

fn trace_back(parents: &HashMap<Position, Option<Position>>, end: Position) -> Vec<Position>
{
    let mut path = vec![end];
    let mut cursor = end;
    while let Some(&Some(parent)) = parents.get(&cursor) {
        path.push(parent);
        cursor = parent;
    }
    path.reverse();
    path
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MazeScore
{
    pub path_bonus: f64,
    pub time_bonus: f64,
    pub level_bonus: f64,
}

impl MazeScore
{
    /// `optimal_len` counts cells including the start, `player_len` counts moves.
    pub fn compute(level: usize, optimal_len: Option<usize>, player_len: usize, elapsed: Duration) -> Self
    {
        let path_bonus = match optimal_len {
            Some(optimal) if player_len > 0 => (optimal as f64 / player_len as f64 * PATH_BONUS).max(0.0),
            _ => 0.0,
        };
        Self {
            path_bonus,
            time_bonus: (TIME_BONUS_SECS - elapsed.as_secs_f64()).max(0.0),
            level_bonus: (level as f64 + 1.0) * LEVEL_BONUS,
        }
    }

    pub fn total(&self) -> u32
    {
        (self.path_bonus + self.time_bonus + self.level_bonus).round() as u32
    }
}

#[derive(Clone, Debug)]
pub struct MazeRun
{
    pub index: usize,
    pub level: MazeLevel,
    pub player: Position,
    pub path: Vec<Position>,
    pub optimal: Option<Vec<Position>>,
    pub started_at: Instant,
    pub finished_in: Option<Duration>,
    pub score: Option<MazeScore>,
}

pub struct MazePuzzle
{
    levels: Vec<MazeLevel>,
    run: Option<MazeRun>,
}

impl MazePuzzle
{
    pub fn new() -> Self
    {
        Self::with_levels(levels())
    }

    pub fn with_levels(levels: Vec<MazeLevel>) -> Self
    {
        Self { levels, run: None }
    }

    pub fn run(&self) -> Option<&MazeRun>
    {
        self.run.as_ref()
    }
}

impl Default for MazePuzzle
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl Puzzle for MazePuzzle
{
    type Input = Direction;
    type Effect = Infallible;

    const NAME: &'static str = "maze";

    fn level_count(&self) -> usize
    {
        self.levels.len()
    }

    fn time_limit(&self) -> Duration
    {
        TIME_LIMIT
    }

    fn load_level(&mut self, level: usize, now: Instant)
    {
        let Some(definition) = self.levels.get(level).cloned() else {
            self.run = None;
            return;
        };
        let optimal = shortest_path(&definition);
        if optimal.is_none() {
            error!("maze level {} has no path from start to end", level + 1);
        }
        self.run = Some(MazeRun {
            index: level,
            player: definition.start,
            path: vec![definition.start],
            level: definition,
            optimal,
            started_at: now,
            finished_in: None,
            score: None,
        });
    }

    fn handle_input(
        &mut self,
        direction: Direction,
        now: Instant,
        _effects: &mut Effects<'_, Infallible>,
    ) -> Option<u32>
    {
        let run = self.run.as_mut()?;
        let target = run.player.step(direction);
        if !run.level.can_step(run.player, target) {
            debug!("maze: blocked step {:?} -> {:?}", run.player, target);
            return None;
        }

        run.player = target;
        run.path.push(target);
        if target != run.level.end {
            return None;
        }

        let elapsed = now.saturating_duration_since(run.started_at);
        let score = MazeScore::compute(
            run.index,
            run.optimal.as_ref().map(Vec::len),
            run.path.len() - 1,
            elapsed,
        );
        run.finished_in = Some(elapsed);
        run.score = Some(score);
        Some(score.total())
    }

    fn apply_effect(&mut self, effect: Infallible)
    {
        match effect {}
    }
}

impl TerminalGame for MazePuzzle
{
    const TITLE: &'static str = "Maze / Spaceship Puzzle";
    const CONTROLS: &'static str = "Arrow keys move the ship (@). Reach the goal (E).";

    fn map_key(&self, code: KeyCode) -> Option<Direction>
    {
        match code {
            KeyCode::Up => Some(Direction::Up),
            KeyCode::Down => Some(Direction::Down),
            KeyCode::Left => Some(Direction::Left),
            KeyCode::Right => Some(Direction::Right),
            _ => None,
        }
    }

    fn draw_level(&self, lines: &mut Vec<String>)
    {
        if let Some(run) = &self.run {
            lines.extend(render_maze(run));
        }
    }

    fn draw_result(&self, outcome: LevelOutcome, lines: &mut Vec<String>)
    {
        let Some(run) = &self.run else {
            return;
        };
        if let LevelOutcome::Solved { .. } = outcome {
            let optimal = run.optimal.as_ref().map_or(0, Vec::len);
            lines.push(format!("Your moves: {} | Optimal path: {}", run.path.len() - 1, optimal));
            if let Some(elapsed) = run.finished_in {
                lines.push(format!("Time: {:.2}s", elapsed.as_secs_f64()));
            }
            if let Some(score) = run.score {
                lines.push(format!(
                    "Path bonus: {:.0} | Time bonus: {:.0} | Level bonus: {:.0}",
                    score.path_bonus, score.time_bonus, score.level_bonus
                ));
            }
        }
    }
}

fn render_maze(run: &MazeRun) -> Vec<String>
{
    let width = run.level.width.max(0) as usize;
    let height = run.level.height.max(0) as usize;
    let mut canvas = vec![vec![' '; width * 4 + 1]; height * 2 + 1];

    let border = [
        Wall::new(0, 0, width as i32, 0),
        Wall::new(0, height as i32, width as i32, height as i32),
        Wall::new(0, 0, 0, height as i32),
        Wall::new(width as i32, 0, width as i32, height as i32),
    ];
    for wall in border.iter().chain(run.level.walls.iter()) {
        draw_wall(&mut canvas, wall);
    }

    for cell in &run.path {
        put_cell(&mut canvas, *cell, '.');
    }
    put_cell(&mut canvas, run.level.end, 'E');
    put_cell(&mut canvas, run.player, '@');

    canvas.iter().map(|row| paint_row(row)).collect()
}

fn draw_wall(canvas: &mut [Vec<char>], wall: &Wall)
{
    let (x1, x2) = (wall.a.x.min(wall.b.x), wall.a.x.max(wall.b.x));
    let (y1, y2) = (wall.a.y.min(wall.b.y), wall.a.y.max(wall.b.y));
    if wall.is_horizontal() {
        for col in (x1 * 4)..=(x2 * 4) {
            let ch = if col % 4 == 0 { '+' } else { '-' };
            put(canvas, col, y1 * 2, ch);
        }
    }
    if wall.is_vertical() {
        for row in (y1 * 2)..=(y2 * 2) {
            let ch = if row % 2 == 0 { '+' } else { '|' };
            put(canvas, x1 * 4, row, ch);
        }
    }
}

fn put_cell(canvas: &mut [Vec<char>], cell: Position, ch: char)
{
    put(canvas, cell.x * 4 + 2, cell.y * 2 + 1, ch);
}

fn put(canvas: &mut [Vec<char>], col: i32, row: i32, ch: char)
{
    let (Ok(col), Ok(row)) = (usize::try_from(col), usize::try_from(row)) else {
        return;
    };
    if let Some(slot) = canvas.get_mut(row).and_then(|line| line.get_mut(col)) {
        *slot = ch;
    }
}

fn paint_row(row: &[char]) -> String
{
    let mut line = String::with_capacity(row.len() + 32);
    for &ch in row {
        match ch {
            '@' => line.push_str("\x1b[38;2;249;115;22m@\x1b[0m"),
            'E' => line.push_str("\x1b[38;2;59;130;246mE\x1b[0m"),
            '.' => line.push_str("\x1b[38;2;251;191;36m.\x1b[0m"),
            _ => line.push(ch),
        }
    }
    line
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::session::{Phase, Session};
    use crate::config::SessionConfig;

    fn corridor() -> MazeLevel
    {
        MazeLevel {
            width: 3,
            height: 1,
            walls: Vec::new(),
            start: Position::new(0, 0),
            end: Position::new(2, 0),
        }
    }

    #[test]
    fn vertical_wall_blocks_rows_inside_half_open_span()
    {
        let wall = Wall::new(1, 0, 1, 3);
        for y in 0..3 {
            assert!(wall.blocks(Position::new(0, y), Position::new(1, y)));
            assert!(wall.blocks(Position::new(1, y), Position::new(0, y)));
        }
        assert!(!wall.blocks(Position::new(0, 3), Position::new(1, 3)));
    }

    #[test]
    fn horizontal_wall_blocks_columns_inside_half_open_span()
    {
        let wall = Wall::new(0, 2, 2, 2);
        assert!(wall.blocks(Position::new(0, 1), Position::new(0, 2)));
        assert!(wall.blocks(Position::new(1, 2), Position::new(1, 1)));
        assert!(!wall.blocks(Position::new(2, 1), Position::new(2, 2)));
    }

    #[test]
    fn wall_only_blocks_its_own_line()
    {
        let wall = Wall::new(3, 0, 3, 5);
        assert!(!wall.blocks(Position::new(0, 0), Position::new(1, 0)));
        assert!(!wall.blocks(Position::new(2, 0), Position::new(2, 1)));
        assert!(wall.blocks(Position::new(2, 0), Position::new(3, 0)));
    }

    #[test]
    fn reversed_endpoints_cover_same_span()
    {
        let forward = Wall::new(5, 2, 5, 5);
        let reversed = Wall::new(5, 5, 5, 2);
        for y in 0..8 {
            let from = Position::new(4, y);
            let to = Position::new(5, y);
            assert_eq!(forward.blocks(from, to), reversed.blocks(from, to));
        }
    }

    #[test]
    fn level_one_shortest_path_has_ten_cells()
    {
        let level = &levels()[0];
        let path = shortest_path(level).expect("level 1 is solvable");
        assert_eq!(path.len(), 10);
        assert_eq!(path.first(), Some(&Position::new(0, 3)));
        assert_eq!(path.last(), Some(&Position::new(7, 1)));
        for step in path.windows(2) {
            assert!(level.can_step(step[0], step[1]), "illegal step {:?}", step);
        }
    }

    #[test]
    fn authored_levels_are_solvable()
    {
        validate_levels().expect("authored levels must be solvable");
        let lengths: Vec<usize> = levels()
            .iter()
            .map(|level| shortest_path(level).map_or(0, |path| path.len()))
            .collect();
        assert_eq!(lengths, vec![10, 13, 21]);
    }

    #[test]
    fn sealed_goal_has_no_path()
    {
        let level = MazeLevel {
            width: 2,
            height: 1,
            walls: vec![Wall::new(1, 0, 1, 1)],
            start: Position::new(0, 0),
            end: Position::new(1, 0),
        };
        assert_eq!(shortest_path(&level), None);
    }

    #[test]
    fn unsolvable_level_still_loads_and_plays()
    {
        let level = MazeLevel {
            width: 3,
            height: 1,
            walls: vec![Wall::new(2, 0, 2, 1)],
            start: Position::new(0, 0),
            end: Position::new(2, 0),
        };
        let now = Instant::now();
        let mut session = Session::new(MazePuzzle::with_levels(vec![level]), SessionConfig::default());
        session.start(now);
        session.input(Direction::Right, now);
        session.input(Direction::Right, now);

        assert_eq!(session.phase(), Phase::Playing);
        let run = session.puzzle().run().unwrap();
        assert_eq!(run.optimal, None);
        assert_eq!(run.player, Position::new(1, 0));
    }

    #[test]
    fn start_equal_to_end_is_a_single_cell_path()
    {
        let mut level = corridor();
        level.end = level.start;
        assert_eq!(shortest_path(&level), Some(vec![Position::new(0, 0)]));
    }

    #[test]
    fn score_rewards_short_fast_paths()
    {
        let best = MazeScore::compute(0, Some(10), 9, Duration::from_secs(20));
        assert_eq!(best.total(), 111 + 80 + 50);

        let slow_detour = MazeScore::compute(2, Some(10), 20, Duration::from_secs(150));
        assert_eq!(slow_detour.time_bonus, 0.0);
        assert_eq!(slow_detour.total(), 50 + 150);

        let unsolvable = MazeScore::compute(0, None, 5, Duration::ZERO);
        assert_eq!(unsolvable.path_bonus, 0.0);
    }

    #[test]
    fn blocked_and_out_of_bounds_moves_are_ignored()
    {
        let now = Instant::now();
        let mut session = Session::new(MazePuzzle::new(), SessionConfig::default());
        session.start(now);

        // (0,3) has the grid edge to the left and wall x=1 spans rows 0..3 only.
        session.input(Direction::Left, now);
        session.input(Direction::Down, now);
        let run = session.puzzle().run().unwrap();
        assert_eq!(run.player, Position::new(0, 4));
        assert_eq!(run.path, vec![Position::new(0, 3), Position::new(0, 4)]);

        session.input(Direction::Up, now);
        session.input(Direction::Up, now);
        let run = session.puzzle().run().unwrap();
        assert_eq!(run.player, Position::new(0, 2));

        // horizontal wall y=2 spans x in [0, 2)
        session.input(Direction::Up, now);
        assert_eq!(session.puzzle().run().unwrap().player, Position::new(0, 2));
        assert_eq!(session.phase(), Phase::Playing);
    }

    #[test]
    fn reaching_the_end_completes_with_score()
    {
        let now = Instant::now();
        let mut session = Session::new(MazePuzzle::with_levels(vec![corridor()]), SessionConfig::default());
        session.start(now);
        session.input(Direction::Right, now);
        session.input(Direction::Right, now + Duration::from_secs(10));

        assert_eq!(session.phase(), Phase::LevelComplete(LevelOutcome::Solved { score: 290 }));
        let run = session.puzzle().run().unwrap();
        assert_eq!(run.finished_in, Some(Duration::from_secs(10)));
    }

    #[test]
    fn optimal_route_scores_cells_over_moves()
    {
        let start = Instant::now();
        let mut session = Session::new(MazePuzzle::new(), SessionConfig::default());
        session.start(start);

        let path = shortest_path(&levels()[0]).unwrap();
        let finish = start + Duration::from_secs(10);
        for step in path.windows(2) {
            let direction = Direction::ALL
                .into_iter()
                .find(|direction| step[0].step(*direction) == step[1])
                .unwrap();
            session.input(direction, finish);
        }

        // 10 cells over 9 moves, 90 s left of the time bonus, level 1
        assert_eq!(session.phase(), Phase::LevelComplete(LevelOutcome::Solved { score: 251 }));
        let score = session.puzzle().run().unwrap().score.unwrap();
        assert!((score.path_bonus - 1000.0 / 9.0).abs() < 1e-9);

        let mut lines = Vec::new();
        session.puzzle().draw_result(LevelOutcome::Solved { score: 251 }, &mut lines);
        assert!(lines[0].contains("Your moves: 9"));
        assert!(lines.iter().any(|line| line.contains("Path bonus: 111")));
    }

    #[test]
    fn render_marks_player_goal_and_walls()
    {
        let mut puzzle = MazePuzzle::new();
        puzzle.load_level(0, Instant::now());
        let mut lines = Vec::new();
        puzzle.draw_level(&mut lines);

        assert_eq!(lines.len(), 17);
        assert!(lines[0].starts_with("+---+"));
        assert!(lines[7].contains('@'));
        assert!(lines[3].contains('E'));
    }
}
