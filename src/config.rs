use crate::error::GameError;
use crate::games::LEVELS_PER_GAME;
use std::time::Duration;

const MAX_TIME_SECS: u64 = 3600;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionConfig
{
    pub start_level: usize,
    pub time_limit: Option<Duration>,
    pub seed: Option<u64>,
}

impl SessionConfig
{
    pub fn from_args(args: &[String]) -> Result<Self, GameError>
    {
        let mut config = Self::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            let (name, inline) = match arg.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (arg.as_str(), None),
            };
            match name {
                "--level" => config.start_level = parse_level(option_value(name, inline, &mut iter)?)?,
                "--time" => config.time_limit = Some(parse_time(option_value(name, inline, &mut iter)?)?),
                "--seed" => config.seed = Some(parse_seed(option_value(name, inline, &mut iter)?)?),
                _ => return Err(GameError::InvalidOption(format!("Unknown option '{arg}'"))),
            }
        }
        Ok(config)
    }
}

fn option_value<'a>(
    name: &str,
    inline: Option<&'a str>,
    rest: &mut std::slice::Iter<'a, String>,
) -> Result<&'a str, GameError>
{
    match inline {
        Some(value) => Ok(value),
        None => rest
            .next()
            .map(String::as_str)
            .ok_or_else(|| GameError::InvalidOption(format!("Expected value after {name}"))),
    }
}

fn parse_level(value: &str) -> Result<usize, GameError>
{
    let level = value
        .parse::<usize>()
        .map_err(|_| GameError::InvalidOption("Level must be a number".to_string()))?;
    if level == 0 || level > LEVELS_PER_GAME {
        return Err(GameError::InvalidOption(format!(
            "Level must be between 1 and {LEVELS_PER_GAME}"
        )));
    }
    Ok(level - 1)
}

fn parse_time(value: &str) -> Result<Duration, GameError>
{
    let secs = value
        .parse::<u64>()
        .map_err(|_| GameError::InvalidOption("Time must be a whole number of seconds".to_string()))?;
    if secs == 0 || secs > MAX_TIME_SECS {
        return Err(GameError::InvalidOption(format!(
            "Time must be between 1 and {MAX_TIME_SECS} seconds"
        )));
    }
    Ok(Duration::from_secs(secs))
}

fn parse_seed(value: &str) -> Result<u64, GameError>
{
    value
        .parse::<u64>()
        .map_err(|_| GameError::InvalidOption("Seed must be a number".to_string()))
}
