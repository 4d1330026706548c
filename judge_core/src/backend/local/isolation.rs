use std::path::PathBuf;
use std::process::Command;

use crate::config::IsolationConfig;
use crate::error::{Error, Result};

/// Hook deciding how a submitted program is launched. Stronger sandboxes
/// plug in here.
pub trait Isolation: Send + Sync {
    fn name(&self) -> &str;
    fn command(&self, argv: &[String]) -> Result<Command>;
}

fn split(argv: &[String]) -> Result<(&String, &[String])> {
    argv.split_first()
        .ok_or_else(|| Error::Argument("empty command line".into()))
}

/// Runs the program as is.
pub struct Unconfined;

impl Isolation for Unconfined {
    fn name(&self) -> &str {
        "none"
    }

    fn command(&self, argv: &[String]) -> Result<Command> {
        let (program, rest) = split(argv)?;
        let mut command = Command::new(program);
        command.args(rest);
        Ok(command)
    }
}

/// Runs the program through the `judge_cell` loader, which applies address
/// space and cpu time rlimits before exec.
pub struct Cell {
    path: PathBuf,
    memory_limit_mb: u64,
    cpu_time_limit_s: u64,
}

pub fn get_path_of_judge_cell() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("judge_cell")))
        .unwrap_or_else(|| PathBuf::from("judge_cell"))
}

impl Cell {
    pub fn new(path: Option<PathBuf>, memory_limit_mb: u64, cpu_time_limit_s: u64) -> Self {
        Self {
            path: path.unwrap_or_else(get_path_of_judge_cell),
            memory_limit_mb,
            cpu_time_limit_s,
        }
    }
}

impl Isolation for Cell {
    fn name(&self) -> &str {
        "cell"
    }

    fn command(&self, argv: &[String]) -> Result<Command> {
        let (program, rest) = split(argv)?;
        // the cell execs an exact path, it does not search PATH
        let program = which::which(program)
            .map_err(|_| Error::Environment(format!("`{}` not found", program)))?;

        let mut command = Command::new(&self.path);
        command
            .arg(program)
            .arg("-m")
            .arg(self.memory_limit_mb.to_string())
            .arg("-t")
            .arg(self.cpu_time_limit_s.to_string())
            .arg("--")
            .args(rest);
        Ok(command)
    }
}

pub fn from_config(config: &IsolationConfig) -> Box<dyn Isolation> {
    match config {
        IsolationConfig::None => Box::new(Unconfined),
        IsolationConfig::Cell {
            cell_path,
            memory_limit_mb,
            cpu_time_limit_s,
        } => Box::new(Cell::new(cell_path.clone(), *memory_limit_mb, *cpu_time_limit_s)),
    }
}
