use crate::error::GameError;
use crate::session::{Effects, LevelOutcome, Puzzle};
use crate::terminal::TerminalGame;
use crossterm::event::KeyCode;
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

pub const TIME_LIMIT: Duration = Duration::from_secs(60);
pub const RETRY_DELAY: Duration = Duration::from_millis(2000);

const TIME_BONUS_SECS: f64 = 200.0;
const LEVEL_BONUS: f64 = 100.0;

const LEVEL_EXPRESSIONS: [&[&str]; 3] = [
    &["15 - 11", "15 / 5", "2 * 1"],
    &["10 / 4", "7 - 5", "3 * 3", "1 + 1"],
    &["8 / 3", "12 / 5", "5 - 2", "2 * 2", "9 / 4"],
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator
{
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expression
{
    pub lhs: f64,
    pub op: Operator,
    pub rhs: f64,
}

impl Expression
{
    pub fn value(&self) -> f64
    {
        match self.op {
            Operator::Add => self.lhs + self.rhs,
            Operator::Sub => self.lhs - self.rhs,
            Operator::Mul => self.lhs * self.rhs,
            Operator::Div => self.lhs / self.rhs,
        }
    }
}

impl FromStr for Expression
{
    type Err = GameError;

    fn from_str(text: &str) -> Result<Self, Self::Err>
    {
        let malformed = || GameError::MalformedExpression(text.to_string());
        let mut parts = text.split_whitespace();
        let (Some(lhs), Some(op), Some(rhs), None) = (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        let op = match op {
            "+" => Operator::Add,
            "-" => Operator::Sub,
            "*" => Operator::Mul,
            "/" => Operator::Div,
            _ => return Err(malformed()),
        };
        Ok(Self {
            lhs: lhs.parse().map_err(|_| malformed())?,
            op,
            rhs: rhs.parse().map_err(|_| malformed())?,
        })
    }
}

impl fmt::Display for Expression
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let op = match self.op {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
        };
        write!(f, "{} {} {}", self.lhs, op, self.rhs)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Bubble
{
    pub id: usize,
    pub expression: Expression,
    pub value: f64,
}

pub fn levels() -> Result<Vec<Vec<Bubble>>, GameError>
{
    LEVEL_EXPRESSIONS
        .iter()
        .map(|expressions| {
            expressions
                .iter()
                .enumerate()
                .map(|(id, text)| {
                    let expression: Expression = text.parse()?;
                    Ok(Bubble {
                        id,
                        value: expression.value(),
                        expression,
                    })
                })
                .collect::<Result<Vec<Bubble>, GameError>>()
        })
        .collect()
}

/// Non-decreasing check; equal values may come in either order.
pub fn is_ascending(values: &[f64]) -> bool
{
    values.windows(2).all(|pair| pair[1] >= pair[0])
}

pub fn level_score(level: usize, elapsed: Duration) -> u32
{
    let time_bonus = (TIME_BONUS_SECS - elapsed.as_secs_f64()).max(0.0);
    let level_bonus = (level as f64 + 1.0) * LEVEL_BONUS;
    (time_bonus + level_bonus).round() as u32
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BubbleInput
{
    Toggle(usize),
    Submit,
    Reset,
}

#[derive(Debug, PartialEq)]
pub enum BubbleEffect
{
    ClearSelection,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Feedback
{
    Incomplete,
    Incorrect,
    Correct,
}

#[derive(Clone, Debug)]
pub struct BubbleRun
{
    pub index: usize,
    pub bubbles: Vec<Bubble>,
    pub selected: Vec<usize>,
    pub feedback: Option<Feedback>,
    pub started_at: Instant,
}

impl BubbleRun
{
    fn value_of(&self, id: usize) -> Option<f64>
    {
        self.bubbles
            .iter()
            .find(|bubble| bubble.id == id)
            .map(|bubble| bubble.value)
    }

    fn selected_values(&self) -> Vec<f64>
    {
        self.selected
            .iter()
            .filter_map(|&id| self.value_of(id))
            .collect()
    }
}

pub struct BubblePuzzle
{
    levels: Vec<Vec<Bubble>>,
    rng: StdRng,
    run: Option<BubbleRun>,
}

impl BubblePuzzle
{
    pub fn new(seed: Option<u64>) -> Result<Self, GameError>
    {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            levels: levels()?,
            rng,
            run: None,
        })
    }

    pub fn run(&self) -> Option<&BubbleRun>
    {
        self.run.as_ref()
    }
}

impl Puzzle for BubblePuzzle
{
    type Input = BubbleInput;
    type Effect = BubbleEffect;

    const NAME: &'static str = "bubble";

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
        let Some(mut bubbles) = self.levels.get(level).cloned() else {
            self.run = None;
            return;
        };
        bubbles.shuffle(&mut self.rng);
        self.run = Some(BubbleRun {
            index: level,
            bubbles,
            selected: Vec::new(),
            feedback: None,
            started_at: now,
        });
    }

    fn handle_input(
        &mut self,
        input: BubbleInput,
        now: Instant,
        effects: &mut Effects<'_, BubbleEffect>,
    ) -> Option<u32>
    {
        let run = self.run.as_mut()?;
        let retry_pending = effects.is_pending(&BubbleEffect::ClearSelection);

        match input {
            BubbleInput::Reset => {
                effects.cancel(&BubbleEffect::ClearSelection);
                run.selected.clear();
                run.feedback = None;
                None
            }
            _ if retry_pending => {
                debug!("bubble: ignoring {:?} until the selection resets", input);
                None
            }
            BubbleInput::Toggle(id) => {
                if run.value_of(id).is_none() {
                    return None;
                }
                if let Some(position) = run.selected.iter().position(|&selected| selected == id) {
                    run.selected.remove(position);
                } else {
                    run.selected.push(id);
                }
                if run.feedback == Some(Feedback::Incomplete) {
                    run.feedback = None;
                }
                None
            }
            BubbleInput::Submit => {
                if run.selected.len() != run.bubbles.len() {
                    run.feedback = Some(Feedback::Incomplete);
                    return None;
                }
                if is_ascending(&run.selected_values()) {
                    run.feedback = Some(Feedback::Correct);
                    let elapsed = now.saturating_duration_since(run.started_at);
                    return Some(level_score(run.index, elapsed));
                }
                run.feedback = Some(Feedback::Incorrect);
                effects.after(RETRY_DELAY, BubbleEffect::ClearSelection);
                None
            }
        }
    }

    fn apply_effect(&mut self, effect: BubbleEffect)
    {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        match effect {
            BubbleEffect::ClearSelection => {
                run.selected.clear();
                run.feedback = None;
            }
        }
    }
}

impl TerminalGame for BubblePuzzle
{
    const TITLE: &'static str = "Select Bubbles";
    const CONTROLS: &'static str = "Number keys select bubbles. ENTER submits, R resets.";

    fn map_key(&self, code: KeyCode) -> Option<BubbleInput>
    {
        let run = self.run.as_ref()?;
        match code {
            KeyCode::Enter => Some(BubbleInput::Submit),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(BubbleInput::Reset),
            KeyCode::Char(ch) => {
                let slot = ch.to_digit(10)? as usize;
                let bubble = run.bubbles.get(slot.checked_sub(1)?)?;
                Some(BubbleInput::Toggle(bubble.id))
            }
            _ => None,
        }
    }

    fn draw_level(&self, lines: &mut Vec<String>)
    {
        let Some(run) = &self.run else {
            return;
        };
        lines.push("Select the bubbles from the smallest result to the largest.".to_string());
        lines.push(String::new());
        for (slot, bubble) in run.bubbles.iter().enumerate() {
            let marker = match run.selected.iter().position(|&id| id == bubble.id) {
                Some(order) => format!("\x1b[48;2;147;51;234m {} \x1b[0m", order + 1),
                None => "   ".to_string(),
            };
            lines.push(format!("  [{}] {:<10} {}", slot + 1, bubble.expression.to_string(), marker));
        }
        lines.push(String::new());
        lines.push(format!("Selected: {}/{}", run.selected.len(), run.bubbles.len()));
        match run.feedback {
            Some(Feedback::Incomplete) => lines.push("Please select all bubbles!".to_string()),
            Some(Feedback::Incorrect) => lines.push("Incorrect order. Resetting...".to_string()),
            Some(Feedback::Correct) | None => {}
        }
    }

    fn draw_result(&self, outcome: LevelOutcome, lines: &mut Vec<String>)
    {
        let (LevelOutcome::Solved { .. }, Some(run)) = (outcome, &self.run) else {
            return;
        };
        lines.push("Correct! Your order:".to_string());
        for (order, id) in run.selected.iter().enumerate() {
            if let Some(bubble) = run.bubbles.iter().find(|bubble| bubble.id == *id) {
                lines.push(format!("  {}. {} = {}", order + 1, bubble.expression, format_value(bubble.value)));
            }
        }
    }
}

fn format_value(value: f64) -> String
{
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}
