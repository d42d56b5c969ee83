use crate::config::SessionConfig;
use crate::error::GameError;
use crate::session::{LevelOutcome, Phase, Puzzle, Session, Summary};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

const TICK_MS: u64 = 33;

pub trait TerminalGame: Puzzle + Sized
{
    const TITLE: &'static str;
    const CONTROLS: &'static str;

    fn map_key(&self, code: KeyCode) -> Option<Self::Input>;

    fn draw_level(&self, lines: &mut Vec<String>);

    fn draw_result(&self, _outcome: LevelOutcome, _lines: &mut Vec<String>) {}
}

struct TerminalGuard
{
    stdout: Stdout,
}

impl TerminalGuard
{
    fn enter() -> io::Result<Self>
    {
        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, Hide)?;
        Ok(Self { stdout })
    }

    fn stdout(&mut self) -> &mut Stdout
    {
        &mut self.stdout
    }
}

impl Drop for TerminalGuard
{
    fn drop(&mut self)
    {
        let _ = execute!(self.stdout, Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

pub fn run<G: TerminalGame>(puzzle: G, config: SessionConfig) -> Result<Summary, GameError>
{
    let mut term = TerminalGuard::enter()?;
    let mut session = Session::new(puzzle, config);
    present(term.stdout(), &[format!("{} - Loading...", G::TITLE)])?;
    session.start(Instant::now());

    let mut last_tick: Option<Instant> = None;
    loop {
        if session.phase() == Phase::Finished {
            break;
        }
        if handle_input(&mut session)? {
            break;
        }

        let now = Instant::now();
        session.tick(now);

        if last_tick.is_none_or(|tick| now.saturating_duration_since(tick) >= Duration::from_millis(TICK_MS)) {
            present(term.stdout(), &frame(&session))?;
            last_tick = Some(now);
        }

        std::thread::sleep(Duration::from_millis(1));
    }

    let summary = session.summary();
    present(term.stdout(), &summary_lines::<G>(&summary, session.level_count()))?;
    wait_for_space()?;
    Ok(summary)
}

fn handle_input<G: TerminalGame>(session: &mut Session<G>) -> Result<bool, GameError>
{
    while event::poll(Duration::from_millis(0))? {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind,
            ..
        }) = event::read()?
        else {
            continue;
        };
        if kind == KeyEventKind::Release {
            continue;
        }

        match code {
            KeyCode::Esc => return Ok(true),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
            KeyCode::Enter | KeyCode::Char(' ') if matches!(session.phase(), Phase::LevelComplete(_)) => {
                session.advance(Instant::now());
            }
            _ => {
                if let Some(input) = session.puzzle().map_key(code) {
                    session.input(input, Instant::now());
                }
            }
        }
    }

    Ok(false)
}

pub fn frame<G: TerminalGame>(session: &Session<G>) -> Vec<String>
{
    let mut lines = Vec::new();
    lines.push(format!("Assessment Games - {}", G::TITLE));
    lines.push(format!(
        "Level {} of {} | Score: {}",
        session.level() + 1,
        session.level_count(),
        session.total_score()
    ));
    lines.push(format!("Time left: {}", format_clock(session.remaining_secs())));
    lines.push(String::new());

    session.puzzle().draw_level(&mut lines);
    lines.push(String::new());

    match session.phase() {
        Phase::LevelComplete(outcome) => {
            match outcome {
                LevelOutcome::Solved { score } => {
                    lines.push(format!("Level complete! +{score} points"));
                }
                LevelOutcome::TimedOut => lines.push("Time's up!".to_string()),
            }
            session.puzzle().draw_result(outcome, &mut lines);
            let next = if session.is_last_level() { "finish" } else { "next level" };
            lines.push(format!("Press ENTER for {next}."));
        }
        _ => lines.push(G::CONTROLS.to_string()),
    }
    lines.push("Esc quits to the menu.".to_string());
    lines
}

fn summary_lines<G: TerminalGame>(summary: &Summary, level_count: usize) -> Vec<String>
{
    let mut lines = Vec::new();
    lines.push(format!("{} - Session over", G::TITLE));
    lines.push(String::new());
    for (idx, outcome) in summary.outcomes.iter().enumerate() {
        let result = match outcome {
            LevelOutcome::Solved { score } => format!("solved, {score} points"),
            LevelOutcome::TimedOut => "timed out".to_string(),
        };
        lines.push(format!("  Level {}: {}", idx + 1, result));
    }
    if summary.outcomes.len() == level_count {
        lines.push(format!("You did it! Final score: {}", summary.total_score));
    } else {
        lines.push(format!("Final score: {}", summary.total_score));
    }
    lines.push(String::new());
    lines.push("Press SPACE to return.".to_string());
    lines
}

pub fn format_clock(secs: u32) -> String
{
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn present(stdout: &mut Stdout, lines: &[String]) -> Result<(), GameError>
{
    let output = format!("{}\r\n", lines.join("\r\n"));
    queue!(stdout, MoveTo(0, 0), Clear(ClearType::All))?;
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn wait_for_space() -> Result<(), GameError>
{
    while event::poll(Duration::from_millis(0))? {
        let _ = event::read()?;
    }

    loop {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(KeyEvent { code: KeyCode::Char(' '), .. }) = event::read()? {
                break;
            }
        }
    }

    Ok(())
}
