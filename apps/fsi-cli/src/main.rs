use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fsi_app::{
    AppError, AppResult, CheartMeshIo, CheartRunner, DEFAULT_WORKERS, RunOptions, RunOutcome,
    run_service,
};
use fsi_project::{ProblemDescription, load_batch, load_problem};

#[derive(Parser)]
#[command(name = "fsi-cli")]
#[command(about = "Assemble and run inflation problems for the coupled ventricle model", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Re-run problems whose results are already complete
    #[arg(long)]
    overwrite: bool,
    /// Directory with the `fluid` and `solid` source meshes to regenerate from
    #[arg(long)]
    mesh_source: Option<PathBuf>,
    /// Solver executable
    #[arg(long, default_value = "cheartsolver.out")]
    solver: PathBuf,
}

impl RunArgs {
    fn options(&self) -> RunOptions {
        RunOptions {
            overwrite: self.overwrite,
            mesh_source: self.mesh_source.clone(),
        }
    }

    fn runner(&self) -> CheartRunner {
        CheartRunner {
            program: self.solver.clone(),
            ..CheartRunner::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a problem file (single problem or list)
    Validate {
        /// Path to the JSON or YAML problem file
        config: PathBuf,
    },
    /// Assemble problems and write their solver input documents
    Build {
        /// Path to the JSON or YAML problem file
        config: PathBuf,
    },
    /// Run a single problem
    Run {
        /// Path to the JSON or YAML problem file
        config: PathBuf,
        #[command(flatten)]
        args: RunArgs,
    },
    /// Run every problem of a list on a worker pool
    Batch {
        /// Path to the JSON or YAML problem list
        config: PathBuf,
        #[command(flatten)]
        args: RunArgs,
        /// Number of worker threads
        #[arg(long, default_value_t = DEFAULT_WORKERS)]
        workers: usize,
    },
    /// Report which problems have complete results
    Check {
        /// Path to the JSON or YAML problem file
        config: PathBuf,
    },
    /// Write pressure-difference tables for finished problems
    Summarize {
        /// Path to the JSON or YAML problem file
        config: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    dispatch(cli.command)
}

fn dispatch(command: Commands) -> AppResult<()> {
    let result = match command {
        Commands::Validate { config } => cmd_validate(&config),
        Commands::Build { config } => cmd_build(&config),
        Commands::Run { config, args } => cmd_run(&config, &args),
        Commands::Batch {
            config,
            args,
            workers,
        } => cmd_batch(&config, &args, workers),
        Commands::Check { config } => cmd_check(&config),
        Commands::Summarize { config } => cmd_summarize(&config),
    };
    if let Err(err) = &result {
        error!(error = %err, "command failed");
    }
    result
}

fn load(config: &Path) -> AppResult<Vec<ProblemDescription>> {
    Ok(load_batch(config)?)
}

fn cmd_validate(config: &Path) -> AppResult<()> {
    println!("Validating: {}", config.display());
    let problems = load(config)?;
    info!(config = %config.display(), problems = problems.len(), "validated");
    for p in &problems {
        println!(
            "  {} - steps {}..={}, {} segment(s), {}",
            p.prefix,
            p.time.start,
            p.time.end,
            p.loading.time.len(),
            p.material.law()
        );
    }
    println!("✓ {} problem(s) valid", problems.len());
    Ok(())
}

fn cmd_build(config: &Path) -> AppResult<()> {
    for p in load(config)? {
        let path = run_service::write_document(&p)?;
        info!(prefix = %p.prefix, document = %path.display(), "built");
        println!("✓ {} -> {}", p.prefix, path.display());
    }
    Ok(())
}

fn print_outcome(prefix: &str, outcome: &RunOutcome) {
    match outcome {
        RunOutcome::AlreadyComplete => println!("<<< {prefix} is already complete"),
        RunOutcome::Completed { .. } => println!("<<< {prefix} is complete"),
    }
}

fn cmd_run(config: &Path, args: &RunArgs) -> AppResult<()> {
    let problem = load_problem(config)?;
    let outcome = run_service::run(&problem, &args.options(), &CheartMeshIo, &args.runner())?;
    info!(prefix = %problem.prefix, ?outcome, "run finished");
    print_outcome(&problem.prefix, &outcome);
    Ok(())
}

fn cmd_batch(config: &Path, args: &RunArgs, workers: usize) -> AppResult<()> {
    let problems = load(config)?;
    let report = fsi_app::run_batch(
        &problems,
        &args.options(),
        workers,
        &CheartMeshIo,
        &args.runner(),
    )?;
    let mut failed = 0;
    for (prefix, result) in &report.results {
        match result {
            Ok(outcome) => print_outcome(prefix, outcome),
            Err(err) => {
                failed += 1;
                warn!(%prefix, error = %err, "problem failed");
                println!("✗ {prefix}: {err}");
            }
        }
    }
    if failed > 0 {
        return Err(AppError::Batch {
            failed,
            total: report.results.len(),
        });
    }
    Ok(())
}

fn cmd_check(config: &Path) -> AppResult<()> {
    let problems = load(config)?;
    let mut complete = 0;
    for p in &problems {
        match fsi_results::check_complete(p) {
            Ok(()) => {
                complete += 1;
                println!("✓ {}", p.prefix);
            }
            Err(err) => println!("✗ {}: {err}", p.prefix),
        }
    }
    info!(complete, total = problems.len(), "checked results");
    println!("{complete}/{} complete", problems.len());
    Ok(())
}

fn cmd_summarize(config: &Path) -> AppResult<()> {
    let problems = load(config)?;
    for p in &problems {
        match fsi_results::write_pressure_diff(p) {
            Ok(path) => println!("✓ {} -> {}", p.prefix, path.display()),
            Err(err) => println!("✗ {}: {err}", p.prefix),
        }
    }
    let report = fsi_results::summarize_all(&problems);
    if let Some(path) = &report.written {
        info!(runs = report.labels.len(), path = %path.display(), "summarized");
        println!("✓ {} run(s) -> {}", report.labels.len(), path.display());
    }
    for (prefix, err) in &report.failures {
        println!("  no data for {prefix}: {err}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn logged(command: Commands) -> (AppResult<()>, String) {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let result = tracing::subscriber::with_default(subscriber, || dispatch(command));
        let text = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        (result, text)
    }

    #[test]
    fn failed_command_is_logged() {
        let config = std::env::temp_dir().join("fsi_cli_missing_config.json");
        let _ = std::fs::remove_file(&config);
        let (result, text) = logged(Commands::Validate { config });
        assert!(result.is_err());
        assert!(text.contains("ERROR"));
        assert!(text.contains("command failed"));
    }

    #[test]
    fn validate_logs_problem_count() {
        let config = std::env::temp_dir().join("fsi_cli_validate_config.json");
        std::fs::write(
            &config,
            r#"{
                "prefix": "cli_logged",
                "time": {"start": 1, "end": 10, "step": 0.1},
                "loading": [{"type": "Hold", "duration": 1.0}],
                "material": {"type": "NeoHookean", "k": [30000]}
            }"#,
        )
        .unwrap();
        let (result, text) = logged(Commands::Validate { config });
        assert!(result.is_ok());
        assert!(text.contains("validated"));
        assert!(text.contains("problems=1"));
    }
}
