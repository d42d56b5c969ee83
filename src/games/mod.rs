pub mod bubble;
pub mod keys;
pub mod maze;

use crate::config::SessionConfig;
use crate::error::GameError;
use crate::session::Summary;
use crate::terminal;

pub const LEVELS_PER_GAME: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameKind
{
    Maze,
    Keys,
    Bubble,
}

pub struct GameDescriptor
{
    pub kind: GameKind,
    pub name: &'static str,
    pub description: &'static str,
}

pub fn registry() -> Vec<GameDescriptor>
{
    vec![
        GameDescriptor {
            kind: GameKind::Maze,
            name: "maze",
            description: "Navigate from start to spaceship using the shortest path",
        },
        GameDescriptor {
            kind: GameKind::Keys,
            name: "keys",
            description: "Find the key by remembering which cells are safe",
        },
        GameDescriptor {
            kind: GameKind::Bubble,
            name: "bubble",
            description: "Select arithmetic bubbles in ascending order of their results",
        },
    ]
}

pub fn find(name: &str) -> Option<GameDescriptor>
{
    registry()
        .into_iter()
        .find(|game| game.name.eq_ignore_ascii_case(name))
}

pub fn play(kind: GameKind, config: SessionConfig) -> Result<Summary, GameError>
{
    match kind {
        GameKind::Maze => terminal::run(maze::MazePuzzle::new(), config),
        GameKind::Keys => terminal::run(keys::KeyPuzzle::new(), config),
        GameKind::Bubble => {
            let puzzle = bubble::BubblePuzzle::new(config.seed)?;
            terminal::run(puzzle, config)
        }
    }
}
