#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position
{
    pub x: i32,
    pub y: i32,
}

impl Position
{
    pub const fn new(x: i32, y: i32) -> Self
    {
        Self { x, y }
    }

    pub fn step(self, direction: Direction) -> Self
    {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn manhattan(self, other: Position) -> u32
    {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn is_adjacent(self, other: Position) -> bool
    {
        self.manhattan(other) == 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction
{
    Down,
    Up,
    Right,
    Left,
}

impl Direction
{
    pub const ALL: [Direction; 4] = [Direction::Down, Direction::Up, Direction::Right, Direction::Left];

    pub fn delta(self) -> (i32, i32)
    {
        match self {
            Direction::Down => (0, 1),
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Left => (-1, 0),
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn step_moves_one_cell()
    {
        let origin = Position::new(2, 2);
        assert_eq!(origin.step(Direction::Down), Position::new(2, 3));
        assert_eq!(origin.step(Direction::Up), Position::new(2, 1));
        assert_eq!(origin.step(Direction::Right), Position::new(3, 2));
        assert_eq!(origin.step(Direction::Left), Position::new(1, 2));
    }

    #[test]
    fn adjacency_excludes_diagonals_and_self()
    {
        let origin = Position::new(1, 1);
        assert!(origin.is_adjacent(Position::new(1, 0)));
        assert!(!origin.is_adjacent(Position::new(2, 2)));
        assert!(!origin.is_adjacent(origin));
        assert!(!origin.is_adjacent(Position::new(3, 1)));
    }
}
