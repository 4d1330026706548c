use std::fs;
use std::process;

use clap::{Parser, Subcommand};
use judge_core::{
    backend::{local::toolchain::CompilerEnvironmentStatus, LocalBackend},
    config::JudgeConfig,
    error::Result,
    judge::Judge,
    problem::ProblemConfig,
    store::MemoryStore,
    submission::SubmissionStatus,
};
use log::info;

#[derive(Parser)]
#[clap(
    version = "0.1.0",
    name = "judge",
    about = "Judge submissions locally, on a remote judge or with the stub backend."
)]
struct Opts {
    #[clap(subcommand)]
    subcmd: SubCommand,
}

#[derive(Subcommand)]
enum SubCommand {
    #[clap(about = "Judge one source file against a problem.yaml")]
    Run(RunConfig),
    #[clap(about = "Show which local toolchains are installed")]
    Toolchains(ToolchainsConfig),
}

#[derive(Parser, Debug)]
struct RunConfig {
    #[clap(help = "problem config")]
    problem: String,
    #[clap(help = "path of code")]
    src_path: String,
    #[clap(short, long, help = "language of the code, e.g. java, cpp, python3")]
    language: String,
    #[clap(short, long, help = "backend: local, remote or stub")]
    backend: Option<String>,
    #[clap(short, long, help = "engine config (YAML)")]
    config: Option<String>,
}

#[derive(Parser, Debug)]
struct ToolchainsConfig {
    #[clap(short, long, help = "engine config (YAML)")]
    config: Option<String>,
}

fn run(config: RunConfig) -> Result<bool> {
    let mut engine = JudgeConfig::load(config.config.as_deref())?;
    if let Some(backend) = config.backend {
        engine.backend = backend;
    }

    let code = fs::read_to_string(&config.src_path)?;
    let problem = ProblemConfig::from_file(&config.problem)?.load()?;
    info!("problem `{}` with {} cases", problem.name, problem.cases.len());

    let store = MemoryStore::new();
    let problem = store.add_problem(problem);
    let id = store.submit(problem, &code, &config.language)?;

    let judge = Judge::from_config(store, &engine);
    let submission = judge.judge(id)?;
    print!("{}", serde_yaml::to_string(&submission)?);

    Ok(submission.status == SubmissionStatus::Accepted)
}

fn toolchains(config: ToolchainsConfig) -> Result<()> {
    let engine = JudgeConfig::load(config.config.as_deref())?;
    let backend = LocalBackend::new(&engine.local);
    for toolchain in backend.toolchains().iter() {
        match toolchain.check_environment() {
            CompilerEnvironmentStatus::OK { version, path } => {
                println!("{:<10} {} ({})", toolchain.language, path, version)
            }
            CompilerEnvironmentStatus::Missing => println!("{:<10} missing", toolchain.language),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let opts: Opts = Opts::parse();

    match opts.subcmd {
        SubCommand::Run(config) => {
            if !run(config)? {
                process::exit(1);
            }
        }
        SubCommand::Toolchains(config) => toolchains(config)?,
    }

    Ok(())
}
