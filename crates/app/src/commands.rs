use std::io::Write;

use services::{AppServices, ProgressStore, QueueStore};
use spark_core::model::{ProgressRecord, QueueItem};
use spark_core::time::to_iso8601;

use crate::args::{ProgressCommand, QueueCommand};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

fn describe_progress(record: &ProgressRecord) -> String {
    let state = if record.completed() {
        "completed"
    } else {
        "in progress"
    };
    format!(
        "{}/{} cards ({}%), {state}, last opened {}",
        record.current_card_index(),
        record.total_cards(),
        record.progress_percentage(),
        to_iso8601(record.last_accessed()),
    )
}

fn describe_item(item: &QueueItem) -> String {
    let icon = item.icon.as_deref().map_or(String::new(), |i| format!("{i} "));
    format!(
        "{icon}{} [{}] {} articles, added {}",
        item.title,
        item.topic_id,
        item.articles_count,
        to_iso8601(item.added_at),
    )
}

pub async fn run_progress(
    services: &AppServices,
    command: ProgressCommand,
    out: &mut impl Write,
) -> CommandResult {
    let store = services.progress();
    match command {
        ProgressCommand::List => list_progress(&store, out).await,
        ProgressCommand::Show { module } => {
            match store.try_get_module_progress(&module).await? {
                Some(record) => writeln!(out, "{module}: {}", describe_progress(&record))?,
                None => writeln!(out, "{module}: not started")?,
            }
            Ok(())
        }
        ProgressCommand::Save {
            module,
            index,
            total,
            completed,
        } => {
            let record = store
                .try_save_module_progress(&module, index, total, completed)
                .await?;
            writeln!(out, "saved {module}: {}", describe_progress(&record))?;
            Ok(())
        }
        ProgressCommand::Complete { module, total } => {
            let record = store.try_complete_module(&module, total).await?;
            writeln!(out, "completed {module}: {}", describe_progress(&record))?;
            Ok(())
        }
        ProgressCommand::Reset { module } => {
            if store.try_reset_module_progress(&module).await? {
                writeln!(out, "reset {module}")?;
            } else {
                writeln!(out, "{module}: no progress to reset")?;
            }
            Ok(())
        }
        ProgressCommand::Clear => {
            store.try_clear_all_progress().await?;
            writeln!(out, "cleared all progress")?;
            Ok(())
        }
    }
}

async fn list_progress(store: &ProgressStore, out: &mut impl Write) -> CommandResult {
    let map = store.try_get_all().await?;
    if map.is_empty() {
        writeln!(out, "no progress recorded")?;
        return Ok(());
    }
    for (id, record) in map.iter() {
        writeln!(out, "{id}: {}", describe_progress(record))?;
    }
    Ok(())
}

pub async fn run_queue(
    services: &AppServices,
    command: QueueCommand,
    out: &mut impl Write,
) -> CommandResult {
    let store = services.queue();
    match command {
        QueueCommand::List => list_queue(&store, out).await,
        QueueCommand::Status => {
            let status = store.try_get_queue_status().await?;
            writeln!(
                out,
                "{} queued, {} remaining{}{}",
                status.size,
                status.remaining,
                if status.is_near_limit { ", nearly full" } else { "" },
                if status.is_full { ", full" } else { "" },
            )?;
            Ok(())
        }
        QueueCommand::Add(topic) => {
            let result = store.add_to_queue(topic).await;
            writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
            Ok(())
        }
        QueueCommand::Remove { topic } => {
            if store.try_remove_from_queue(&topic).await? {
                writeln!(out, "removed {topic}")?;
            } else {
                writeln!(out, "{topic} was not queued")?;
            }
            Ok(())
        }
        QueueCommand::Clear => {
            store.try_clear_queue().await?;
            writeln!(out, "cleared queue")?;
            Ok(())
        }
    }
}

async fn list_queue(store: &QueueStore, out: &mut impl Write) -> CommandResult {
    let queue = store.try_get_queue().await?;
    if queue.is_empty() {
        writeln!(out, "queue is empty")?;
        return Ok(());
    }
    for (position, item) in queue.items().iter().enumerate() {
        writeln!(out, "{:>2}. {}", position + 1, describe_item(item))?;
    }
    Ok(())
}
