use assessment_games::games::{self, GameKind};
use assessment_games::logging;
use assessment_games::{GameError, SessionConfig};
use log::info;
use std::env;
use std::io::Write;

fn main()
{
    logging::init();

    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), GameError>
{
    let mut args = env::args().skip(1);
    let command = args.next();
    let rest: Vec<String> = args.collect();
    match command.as_deref() {
        None => interactive_menu(),
        Some("list") => {
            list_games();
            Ok(())
        }
        Some("-h") | Some("--help") => {
            print_help();
            Ok(())
        }
        Some(name) => {
            let game = games::find(name).ok_or_else(|| GameError::UnknownGame(name.to_string()))?;
            let config = SessionConfig::from_args(&rest)?;
            run_game(game.kind, config)
        }
    }
}

fn run_game(kind: GameKind, config: SessionConfig) -> Result<(), GameError>
{
    let summary = games::play(kind, config)?;
    info!(
        "{:?} session ended: {} levels played, score {}",
        kind,
        summary.outcomes.len(),
        summary.total_score
    );
    Ok(())
}

fn interactive_menu() -> Result<(), GameError>
{
    let registry = games::registry();
    loop {
        println!("Gamified Assessment Portal");
        println!();
        println!("Select a game:");
        for (idx, game) in registry.iter().enumerate() {
            println!("  {}. {} - {}", idx + 1, game.name, game.description);
        }
        println!();
        print!("Enter number or name (default 1, q to quit): ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input)? == 0 {
            return Ok(());
        }
        let choice = input.trim();

        if choice.eq_ignore_ascii_case("q") {
            return Ok(());
        }
        let kind = if choice.is_empty() {
            registry[0].kind
        } else if let Some(game) = choice
            .parse::<usize>()
            .ok()
            .and_then(|index| index.checked_sub(1))
            .and_then(|index| registry.get(index))
        {
            game.kind
        } else if let Some(game) = games::find(choice) {
            game.kind
        } else {
            return Err(GameError::InvalidSelection);
        };

        run_game(kind, SessionConfig::default())?;
        println!();
    }
}

fn list_games()
{
    println!("Available games:");
    for game in games::registry() {
        println!("  {:<8} - {}", game.name, game.description);
    }
}

fn print_help()
{
    println!("assessment-games");
    println!("\nUsage:");
    println!("  assessment-games                      interactive menu");
    println!("  assessment-games list");
    println!("  assessment-games maze   [--level=N] [--time=SECS]");
    println!("  assessment-games keys   [--level=N] [--time=SECS]");
    println!("  assessment-games bubble [--level=N] [--time=SECS] [--seed=N]");
    println!("\nNotes:");
    println!("  Each game has 3 levels with increasing difficulty.");
    println!(
        "  Log records go to {} when stderr is a terminal; RUST_LOG=debug adds level transitions.",
        logging::log_file_path().display()
    );
}
