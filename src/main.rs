// Usage:
//   niveau_lacs                  serve GET / (default)
//   niveau_lacs sync             one sync, then exit
//   niveau_lacs verify [--json]  fetch and extract only, print what would be written
//   niveau_lacs replay <file>    sync from a saved copy of the page

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use niveau_lacs::config::Config;
use niveau_lacs::ingest::{FileFetcher, HttpFetcher};
use niveau_lacs::logging::{self, Component};
use niveau_lacs::server::{self, AppState};
use niveau_lacs::sync;
use niveau_lacs::verify::{self, VerificationStatus};

enum Mode {
    Serve,
    Sync,
    Verify { json: bool },
    Replay(String),
}

fn main() -> ExitCode {
    let mode = match parse_args(std::env::args().skip(1)) {
        Ok(mode) => mode,
        Err(msg) => {
            eprintln!("{}", msg);
            eprintln!("Usage: niveau_lacs [serve | sync | verify [--json] | replay <file>]");
            return ExitCode::from(2);
        }
    };

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    // validate() has already checked the level
    let level = config.logging.min_level().unwrap_or(logging::LogLevel::Info);
    logging::init_logger(level, config.logging.file.as_deref(), config.logging.timestamps);

    match mode {
        Mode::Serve => serve(config),
        Mode::Sync => exit_code(sync::run_once(&config).is_ok()),
        Mode::Verify { json } => run_verify(&config, json),
        Mode::Replay(path) => {
            let result = sync::run_with_fetcher(&config, FileFetcher::new(&path));
            if let Err(ref e) = result {
                logging::log_sync_failure(e);
            }
            exit_code(result.is_ok())
        }
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Mode, String> {
    let mode = match args.next().as_deref() {
        None | Some("serve") => Mode::Serve,
        Some("sync") => Mode::Sync,
        Some("verify") => match args.next().as_deref() {
            None => Mode::Verify { json: false },
            Some("--json") => Mode::Verify { json: true },
            Some(other) => return Err(format!("Unknown verify option: {}", other)),
        },
        Some("replay") => Mode::Replay(args.next().ok_or("Missing page file for replay")?),
        Some(other) => return Err(format!("Unknown command: {}", other)),
    };
    if let Some(extra) = args.next() {
        return Err(format!("Unexpected argument: {}", extra));
    }
    Ok(mode)
}

fn serve(config: Config) -> ExitCode {
    let config = Arc::new(config);
    let job_config = Arc::clone(&config);
    let state = AppState::new(Arc::new(move || sync::run_once(&job_config)));

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            logging::error(Component::System, None, &format!("Cannot start runtime: {}", e));
            return ExitCode::FAILURE;
        }
    };
    match runtime.block_on(server::serve(&config.server.bind, state)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logging::error(Component::Http, None, &format!("Server stopped: {}", e));
            ExitCode::FAILURE
        }
    }
}

fn run_verify(config: &Config, json: bool) -> ExitCode {
    let locator = match config.locator() {
        Ok(locator) => locator,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let fetcher = match HttpFetcher::new(
        Duration::from_secs(config.source.timeout_secs),
        config.source.user_agent.as_deref(),
    ) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let report = verify::verify_source(
        &fetcher,
        &locator,
        &config.source.url,
        config.verify.max_age_days,
        chrono::Utc::now(),
    );

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Cannot encode report: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        verify::print_summary(&report);
    }
    exit_code(report.status != VerificationStatus::Failed)
}

fn exit_code(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
