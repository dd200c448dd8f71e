use clap::Parser;
use job_tracker::app::{parse_intent, SessionIntent, TerminalPresenter};
use job_tracker::config::{Command, LogFormat};
use job_tracker::core::{FeedSource, Presenter, Storage};
use job_tracker::domain::model::{ReconcileOutcome, ReconcileReport};
use job_tracker::utils::error::ErrorSeverity;
use job_tracker::utils::{logger, validation::Validate};
use job_tracker::{
    CliConfig, FeedLocation, LocalStorage, ReconciliationEngine, Result, TrackerError,
};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    match cli.log_format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }

    tracing::info!("Starting job-tracker");

    // 載入並驗證配置
    let config = match cli.resolve().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => exit_with(e),
    };
    tracing::debug!("Resolved config: {:?}", config);

    let feed = match FeedLocation::from_location(&config.feed_location, config.fetch_timeout()) {
        Ok(feed) => feed,
        Err(e) => exit_with(e),
    };
    let mut engine = ReconciliationEngine::from_config(
        LocalStorage::new(config.store_path.clone()),
        feed,
        &config,
    );
    let mut presenter = TerminalPresenter::new(std::io::stdout());

    let result = match cli.command() {
        Command::Sync => {
            let report = engine.reconcile().await;
            print_summary(&report);
            presenter.render(&engine.board(&report.jobs))
        }
        Command::List => {
            let jobs = engine.snapshot().await;
            presenter.render(&engine.board(&jobs))
        }
        Command::Toggle { id } => {
            let jobs = engine.snapshot().await;
            if !jobs.iter().any(|job| job.id == id) {
                eprintln!("⚠️  No job with id {}; nothing changed", id);
            }
            let jobs = engine.toggle_mark(jobs, &id).await;
            presenter.render(&engine.board(&jobs))
        }
        Command::Session => run_session(&mut engine, &mut presenter).await,
    };

    if let Err(e) = result {
        exit_with(e);
    }

    Ok(())
}

async fn run_session<S, F, W>(
    engine: &mut ReconciliationEngine<S, F>,
    presenter: &mut TerminalPresenter<W>,
) -> Result<()>
where
    S: Storage,
    F: FeedSource,
    W: Write,
{
    let report = engine.reconcile().await;
    print_summary(&report);

    let mut jobs = report.jobs;
    presenter.render(&engine.board(&jobs))?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_intent(&line) {
            SessionIntent::Blank => continue,
            SessionIntent::Toggle(id) => {
                jobs = engine.toggle_mark(jobs, &id).await;
                presenter.render(&engine.board(&jobs))?;
            }
            SessionIntent::List => presenter.render(&engine.board(&jobs))?,
            SessionIntent::Quit => break,
            SessionIntent::Unknown => eprintln!(
                "Unknown command: {}. Use `toggle <id>`, `list` or `quit`.",
                line.trim()
            ),
        }
    }

    tracing::info!(
        marked_this_session = engine.session_marks().len(),
        "Session ended"
    );
    Ok(())
}

fn print_summary(report: &ReconcileReport) {
    match report.outcome {
        ReconcileOutcome::FeedFallback => {
            println!("⚠️  Feed unavailable, showing {} saved jobs", report.jobs.len());
        }
        _ => {
            println!(
                "✅ {} jobs ({} kept, {} new, {} discarded, {} blocked)",
                report.jobs.len(),
                report.retained,
                report.introduced,
                report.discarded,
                report.blocked
            );
        }
    }
}

fn exit_with(e: TrackerError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ job-tracker failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
