use env_logger::{Builder, Env, Target};
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

const LOG_FILE: &str = "assessment-games.log";

pub fn log_file_path() -> PathBuf
{
    std::env::temp_dir().join(LOG_FILE)
}

pub fn init()
{
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    // raw-mode frames share the terminal with stderr
    if io::stderr().is_terminal() {
        match File::create(log_file_path()) {
            Ok(file) => {
                builder.target(Target::Pipe(Box::new(file)));
            }
            Err(err) => eprintln!("Cannot open {}: {err}", log_file_path().display()),
        }
    }
    builder.init();
}
