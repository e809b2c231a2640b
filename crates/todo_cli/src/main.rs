//! `todo` command-line entry point.
//!
//! # Responsibility
//! - Wire configuration, logging, storage and the reconciler together.
//! - Offer small local commands over the core services.

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use todo_core::db::open_db;
use todo_core::{
    init_logging, seed_sample_items, AppConfig, BroadcastNotifier, Clock, CreateTodoRequest,
    FilterSpec, Latch, Reconciler, SqliteTodoRepository, SystemClock, TodoService, TodoStatus,
    MIN_PAGE_SIZE,
};

#[derive(Debug, Parser)]
#[command(name = "todo", version, about = "Task tracker with overdue reconciliation")]
struct Cli {
    /// SQLite database file (overrides TODO_DB_PATH).
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// trace|debug|info|warn|error (overrides TODO_LOG_LEVEL).
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Absolute directory for rolling log files (overrides TODO_LOG_DIR).
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the reconciler until Ctrl-C, printing change notifications.
    Serve {
        /// Seconds between cycles (overrides TODO_RECONCILE_INTERVAL_SECS).
        #[arg(long)]
        interval_secs: Option<u64>,
        /// Insert sample items first if the store is empty.
        #[arg(long)]
        seed: bool,
    },
    /// Create a pending item.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// `YYYY-MM-DD` or `YYYY-MM-DD HH:MM`.
        #[arg(long, value_parser = parse_due)]
        due: NaiveDateTime,
    },
    /// List items as JSON lines.
    List(ListArgs),
    /// Run one reconciliation cycle and exit.
    Reconcile,
    /// Insert sample items if the store is empty.
    Seed,
}

#[derive(Debug, Args)]
struct ListArgs {
    #[arg(long, value_parser = parse_status)]
    status: Option<TodoStatus>,
    /// Created on or before this date (`YYYY-MM-DD`).
    #[arg(long)]
    created_before: Option<NaiveDate>,
    /// Due on or before this date (`YYYY-MM-DD`).
    #[arg(long)]
    due_before: Option<NaiveDate>,
    /// Case-sensitive title substring.
    #[arg(long)]
    title: Option<String>,
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long, default_value_t = MIN_PAGE_SIZE)]
    page_size: u32,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(dir) = cli.log_dir {
        config.log_dir = Some(dir);
    }
    if let Command::Serve {
        interval_secs: Some(secs),
        ..
    } = &cli.command
    {
        config.reconcile_interval = todo_core::config::parse_interval(&secs.to_string())?;
    }

    init_logging(&config.log_level, config.log_dir.as_deref())?;

    let conn = open_db(&config.db_path)
        .with_context(|| format!("opening {}", config.db_path.display()))?;
    let store = Arc::new(SqliteTodoRepository::new(conn));

    match cli.command {
        Command::Serve { seed, .. } => serve(&config, store, seed),
        Command::Add {
            title,
            description,
            due,
        } => {
            let service = TodoService::new(store, SystemClock);
            let view = service.create(CreateTodoRequest {
                title,
                description,
                due_date: due,
            })?;
            println!("{}", serde_json::to_string(&view)?);
            Ok(())
        }
        Command::List(args) => {
            let service = TodoService::new(store, SystemClock);
            let page = service.list(&FilterSpec {
                status: args.status,
                created_on_or_before: args.created_before,
                due_on_or_before: args.due_before,
                title: args.title,
                page_index: args.page,
                page_size: args.page_size,
            })?;
            for item in &page.items {
                println!("{}", serde_json::to_string(item)?);
            }
            eprintln!(
                "page {}/{} (next: {}, previous: {})",
                page.page_index, page.total_pages, page.has_next_page, page.has_previous_page
            );
            Ok(())
        }
        Command::Reconcile => {
            let reconciler = Reconciler::new(
                store,
                Arc::new(BroadcastNotifier::default()),
                Arc::new(SystemClock),
                config.reconciler(),
            );
            let report = reconciler.run_once();
            println!(
                "scanned={} changed={} failed={}",
                report.scanned, report.changed, report.failed
            );
            if report.read_failed {
                return Err(anyhow!("reconciliation scan failed; see logs"));
            }
            Ok(())
        }
        Command::Seed => {
            let inserted = seed_sample_items(store.as_ref(), SystemClock.now())?;
            println!("inserted={inserted}");
            Ok(())
        }
    }
}

fn serve(config: &AppConfig, store: Arc<SqliteTodoRepository>, seed: bool) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    runtime.block_on(async move {
        let notifier = Arc::new(BroadcastNotifier::default());
        let started = Latch::new();
        let cancel = Latch::new();

        let reconciler = Arc::new(Reconciler::new(
            Arc::clone(&store),
            Arc::clone(&notifier),
            Arc::new(SystemClock),
            config.reconciler(),
        ));
        let loop_handle = reconciler.spawn(started.handle(), cancel.handle());

        let mut observer = notifier.subscribe();
        let mut observer_cancel = cancel.handle();
        let observer_handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = observer_cancel.triggered() => break,
                    received = observer.recv() => match received {
                        Ok(notification) => {
                            println!("{}: {}", notification.topic, notification.message);
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                            eprintln!("observer lagged; skipped {skipped} notifications");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        if seed {
            let seed_store = Arc::clone(&store);
            tokio::task::spawn_blocking(move || {
                seed_sample_items(seed_store.as_ref(), SystemClock.now())
            })
            .await??;
        }

        started.trigger();
        info!("event=serve module=cli status=ok db={}", config.db_path.display());

        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("event=serve module=cli status=error error={err}");
        }
        cancel.trigger();

        let summary = loop_handle.await?;
        observer_handle.await?;
        info!(
            "event=serve module=cli status=stopped cycles={} changed_cycles={}",
            summary.cycles, summary.changed_cycles
        );
        Ok(())
    })
}

fn parse_due(raw: &str) -> Result<NaiveDateTime, String> {
    let raw = raw.trim();
    if let Ok(value) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M") {
        return Ok(value);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| format!("expected YYYY-MM-DD or `YYYY-MM-DD HH:MM`, got `{raw}`"))
}

fn parse_status(raw: &str) -> Result<TodoStatus, String> {
    TodoStatus::parse(&raw.trim().to_ascii_lowercase())
        .ok_or_else(|| format!("expected pending|completed|overdue, got `{raw}`"))
}
