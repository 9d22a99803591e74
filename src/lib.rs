use std::time::Duration;

#[cfg(feature = "console")]
use std::sync::Arc;

#[cfg(feature = "console")]
use tokio::io::{AsyncBufReadExt, BufReader};

#[cfg(feature = "console")]
use crate::console::{Command, HELP, execute, spawn_renderer};
#[cfg(feature = "console")]
use crate::domain::types::{BatchId, UserId};
#[cfg(feature = "console")]
use crate::models::config::AppConfig;
#[cfg(feature = "console")]
use crate::repository::memory::InMemoryRepository;
#[cfg(feature = "console")]
use crate::services::errors::ErrorNormalizer;
#[cfg(feature = "console")]
use crate::services::notifications::{LogNotificationSink, NotificationCenter};
#[cfg(feature = "console")]
use crate::services::orders::{OrderQueryController, OrderView};

#[cfg(feature = "console")]
pub mod console;
pub mod domain;
pub mod dto;
pub mod error_conversions;
pub mod forms;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod runtime;
pub mod services;

pub const DEFAULT_ITEMS_PER_PAGE: usize = 20;
/// Quiet period before a typed search is applied.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
/// How long an identical notification stays suppressed.
pub const TOAST_COOLDOWN: Duration = Duration::from_secs(5);
/// `assignedTo` value that asks the backend for unassigned orders.
pub const UNASSIGNED_SENTINEL: i32 = 0;

/// Runs the console front-end over the in-memory backend until stdin closes
/// or `quit` is entered.
#[cfg(feature = "console")]
pub async fn run(config: AppConfig) -> std::io::Result<()> {
    let repo = match &config.seed_file {
        Some(path) => InMemoryRepository::from_json_file(path)
            .map_err(|e| std::io::Error::other(format!("Failed to load seed orders: {e}")))?,
        None => InMemoryRepository::default(),
    }
    .with_latency(config.latency());

    // One notification channel shared by every view of the process.
    let notifications = Arc::new(
        NotificationCenter::new(Arc::new(LogNotificationSink))
            .with_cooldown(config.toast_cooldown()),
    );
    let errors = ErrorNormalizer::new(notifications).with_mapping(config.field_mapping.clone());

    let controller = OrderQueryController::with_settings(
        Arc::new(repo),
        OrderView::new(config.scope),
        errors,
        config.controller_settings(),
    )
    .map_err(|e| std::io::Error::other(format!("Failed to create order view: {e}")))?;

    let batch = config
        .batch_id
        .map(BatchId::new)
        .transpose()
        .map_err(|e| std::io::Error::other(format!("Invalid batch_id: {e}")))?;
    let acting_user = config
        .acting_user_id
        .map(UserId::new)
        .transpose()
        .map_err(|e| std::io::Error::other(format!("Invalid acting_user_id: {e}")))?;

    log::info!("Starting order console with scope {:?}", config.scope);
    println!("{HELP}");

    let renderer = spawn_renderer(&controller);

    // Nothing can be queried before the acting user is known.
    let _ = controller.set_batch(batch);
    execute(&controller, Command::User(acting_user)).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => execute(&controller, command).await,
            Err(e) => println!("{e}"),
        }
    }

    controller.dispose();
    renderer.abort();
    log::info!("Order console stopped");
    Ok(())
}
