use assessment_games::SessionConfig;
use assessment_games::games::bubble::{BubbleInput, BubblePuzzle};
use assessment_games::games::keys::KeyPuzzle;
use assessment_games::games::maze::{self, MazePuzzle};
use assessment_games::grid::{Direction, Position};
use assessment_games::session::{AUTO_ADVANCE_DELAY, LevelOutcome, Phase, Session};
use std::time::{Duration, Instant};

fn direction_between(from: Position, to: Position) -> Direction
{
    Direction::ALL
        .into_iter()
        .find(|direction| from.step(*direction) == to)
        .expect("path steps are adjacent")
}

fn follow_optimal_path(session: &mut Session<MazePuzzle>, now: Instant)
{
    let level = session.puzzle().run().unwrap().level.clone();
    let path = maze::shortest_path(&level).unwrap();
    for step in path.windows(2) {
        session.input(direction_between(step[0], step[1]), now);
    }
}

#[test]
fn maze_session_plays_all_levels_on_optimal_paths()
{
    let start = Instant::now();
    let mut session = Session::new(MazePuzzle::new(), SessionConfig::default());
    session.start(start);

    // 10/9, 13/12 and 21/20 path ratios, 90 s time bonus, 50 per level
    let expected = [251, 298, 345];
    let mut now = start;
    for level in 0..3 {
        assert_eq!(session.level(), level);
        now += Duration::from_secs(10);
        follow_optimal_path(&mut session, now);

        assert_eq!(session.phase(), Phase::LevelComplete(LevelOutcome::Solved { score: expected[level] }));
        assert!(session.advance(now));
    }

    assert_eq!(session.phase(), Phase::Finished);
    assert_eq!(session.total_score(), 251 + 298 + 345);
}

#[test]
fn timeout_matches_manual_completion_with_zero_score()
{
    let start = Instant::now();
    let mut session = Session::new(KeyPuzzle::new(), SessionConfig::default());
    session.start(start);
    session.input(Position::new(1, 0), start);

    let expiry = start + Duration::from_secs(60);
    session.tick(expiry - Duration::from_millis(1));
    assert_eq!(session.phase(), Phase::Playing);
    assert_eq!(session.remaining_secs(), 1);

    session.tick(expiry);
    assert_eq!(session.phase(), Phase::LevelComplete(LevelOutcome::TimedOut));
    assert_eq!(session.total_score(), 0);

    session.input(Position::new(2, 0), expiry);
    assert_eq!(session.puzzle().run().unwrap().player, Position::new(1, 0));

    session.tick(expiry + AUTO_ADVANCE_DELAY);
    assert_eq!(session.phase(), Phase::Playing);
    assert_eq!(session.level(), 1);
    assert_eq!(session.puzzle().run().unwrap().attempts, 0);
}

#[test]
fn next_action_before_auto_advance_cancels_it()
{
    let start = Instant::now();
    let config = SessionConfig {
        time_limit: Some(Duration::from_secs(1)),
        ..SessionConfig::default()
    };
    let mut session = Session::new(MazePuzzle::new(), config);
    session.start(start);

    let expiry = start + Duration::from_secs(1);
    session.tick(expiry);
    assert!(session.advance(expiry));
    assert_eq!(session.level(), 1);

    session.tick(expiry + AUTO_ADVANCE_DELAY);
    assert_eq!(session.level(), 1);
    assert_eq!(session.phase(), Phase::Playing);
}

#[test]
fn timed_out_last_level_finishes_session()
{
    let start = Instant::now();
    let config = SessionConfig {
        start_level: 2,
        time_limit: Some(Duration::from_secs(5)),
        seed: Some(3),
    };
    let mut session = Session::new(BubblePuzzle::new(config.seed).unwrap(), config);
    session.start(start);
    session.input(BubbleInput::Submit, start);

    let expiry = start + Duration::from_secs(5);
    session.tick(expiry);
    session.tick(expiry + AUTO_ADVANCE_DELAY);

    assert_eq!(session.phase(), Phase::Finished);
    let summary = session.summary();
    assert_eq!(summary.outcomes, vec![LevelOutcome::TimedOut]);
    assert_eq!(summary.total_score, 0);
}

#[test]
fn sessions_do_not_share_state()
{
    let now = Instant::now();
    let mut first = Session::new(MazePuzzle::new(), SessionConfig::default());
    let mut second = Session::new(MazePuzzle::new(), SessionConfig::default());
    first.start(now);
    second.start(now);

    first.input(Direction::Down, now);
    assert_eq!(first.puzzle().run().unwrap().path.len(), 2);
    assert_eq!(second.puzzle().run().unwrap().path.len(), 1);
}
