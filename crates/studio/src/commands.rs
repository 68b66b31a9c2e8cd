// Subcommand handlers

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::Path;
use tabled::{Table, Tabled};
use tracing::warn;

use crate::app::Studio;
use openreel_core::application::{GenerationPhase, GenerationState};
use openreel_core::domain::{GenerationConfig, GenerationJob, JobStatus};
use openreel_core::AppError;
use openreel_core::port::secret_store::{
    has_kling_credentials, save_or_clear, KLING_ACCESS_KEY_ACCOUNT, KLING_SECRET_KEY_ACCOUNT,
};

const PROMPT_PREVIEW_CHARS: usize = 40;

pub async fn generate(studio: &Studio, prompt: &str, config: GenerationConfig) -> Result<()> {
    let service = studio.generation_service().await?;
    let mut updates = service.subscribe();

    let job_id = service.start(prompt, config).await?;
    println!(
        "{} {} ({})",
        "▶ Generation started".cyan().bold(),
        job_id,
        service.provider_id()
    );
    println!("Press Ctrl+C to cancel");

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                if state.job_id.as_ref() != Some(&job_id) {
                    continue;
                }
                render_state(&state);
                if !state.phase.is_active() {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(error = %e, "Failed to listen for Ctrl+C");
                }
                service.cancel().await;
                render_state(&service.state());
                break;
            }
        }
    }

    let final_state = service.state();
    match final_state.phase {
        GenerationPhase::Completed => {
            if let Some(job) = studio.repo.find_by_id(&job_id).await? {
                if let Some(url) = job.remote_url() {
                    println!("  {} {}", "Video:".bold(), url);
                }
            }
            if let Some(folder) = studio.bookmarks.load().await? {
                println!("  {} {}", "Output folder:".bold(), folder.display());
            }
            Ok(())
        }
        GenerationPhase::Cancelled => Ok(()),
        phase => bail!(
            "Generation {} ended as {}: {}",
            job_id,
            phase,
            final_state.message.unwrap_or_default()
        ),
    }
}

fn render_state(state: &GenerationState) {
    let line = match state.phase {
        GenerationPhase::Idle => return,
        GenerationPhase::Submitting => "… Submitting".normal(),
        GenerationPhase::Polling => match state.progress {
            Some(p) => format!("… Processing {:>3.0}%", p * 100.0).normal(),
            None => "… Processing".normal(),
        },
        GenerationPhase::Completed => "✓ Completed".green().bold(),
        GenerationPhase::Failed => "✗ Failed".red().bold(),
        GenerationPhase::TimedOut => "✗ Timed out".red().bold(),
        GenerationPhase::Cancelled => "○ Cancelled".yellow().bold(),
    };
    println!("{}", line);

    if let Some(message) = &state.message {
        println!("  {}", message.yellow());
    }
}

#[derive(Tabled)]
struct HistoryRow {
    id: String,
    created: String,
    status: String,
    provider: String,
    format: String,
    prompt: String,
    result: String,
}

impl From<GenerationJob> for HistoryRow {
    fn from(job: GenerationJob) -> Self {
        let status = match job.progress() {
            Some(p) if matches!(job.status, JobStatus::Processing { .. }) => {
                format!("{} {:.0}%", job.status, p * 100.0)
            }
            _ => job.status.to_string(),
        };
        let result = match &job.status {
            JobStatus::Completed { remote_url } => remote_url.clone(),
            JobStatus::Failed { reason } => reason.clone(),
            _ => String::new(),
        };

        Self {
            created: format_timestamp(job.created_at),
            status,
            format: format!(
                "{} / {}s",
                job.config.aspect_ratio, job.config.duration_seconds
            ),
            prompt: preview(&job.prompt),
            provider: job.provider_id,
            result,
            id: job.id,
        }
    }
}

fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn preview(prompt: &str) -> String {
    if prompt.chars().count() <= PROMPT_PREVIEW_CHARS {
        return prompt.to_string();
    }
    let head: String = prompt.chars().take(PROMPT_PREVIEW_CHARS - 1).collect();
    format!("{}…", head)
}

pub async fn history(studio: &Studio, limit: usize, json: bool) -> Result<()> {
    let jobs = studio.repo.list_recent(limit).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&jobs)?);
        return Ok(());
    }
    if jobs.is_empty() {
        println!("{}", "No generations yet".yellow());
        return Ok(());
    }

    let rows: Vec<HistoryRow> = jobs.into_iter().map(HistoryRow::from).collect();
    println!("{}", Table::new(rows));
    Ok(())
}

pub async fn delete(studio: &Studio, id: &str) -> Result<()> {
    if studio.repo.delete(&id.to_string()).await? {
        println!("{}", format!("✓ Generation {} deleted", id).green().bold());
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Generation {}", id)).into())
    }
}

pub async fn set_keys(
    studio: &Studio,
    access_key: Option<&str>,
    secret_key: Option<&str>,
) -> Result<()> {
    if access_key.is_none() && secret_key.is_none() {
        bail!("Nothing to set: pass --access-key and/or --secret-key");
    }

    let secrets = studio.secrets.as_ref();
    if let Some(value) = access_key {
        save_or_clear(secrets, KLING_ACCESS_KEY_ACCOUNT, value)
            .await
            .context("Failed to save access key")?;
    }
    if let Some(value) = secret_key {
        save_or_clear(secrets, KLING_SECRET_KEY_ACCOUNT, value)
            .await
            .context("Failed to save secret key")?;
    }

    println!("{}", "✓ Keys saved".green().bold());
    keys_status(studio).await
}

pub async fn clear_keys(studio: &Studio) -> Result<()> {
    for account in [KLING_ACCESS_KEY_ACCOUNT, KLING_SECRET_KEY_ACCOUNT] {
        studio.secrets.delete(account).await?;
    }
    println!("{}", "✓ Keys cleared".green().bold());
    Ok(())
}

pub async fn keys_status(studio: &Studio) -> Result<()> {
    let provider = if has_kling_credentials(studio.secrets.as_ref()).await? {
        "kling".green()
    } else {
        "mock (no Kling keys)".yellow()
    };
    println!("  {} {}", "Provider:".bold(), provider);
    Ok(())
}

pub async fn set_output_folder(studio: &Studio, path: &Path) -> Result<()> {
    studio
        .bookmarks
        .save(path)
        .await
        .with_context(|| format!("Failed to remember {}", path.display()))?;
    println!("{}", "✓ Output folder saved".green().bold());
    show_output_folder(studio).await
}

pub async fn show_output_folder(studio: &Studio) -> Result<()> {
    match studio.bookmarks.load().await? {
        Some(folder) => println!("  {} {}", "Output folder:".bold(), folder.display()),
        None => println!("  {} {}", "Output folder:".bold(), "not set".yellow()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use openreel_core::domain::AspectRatio;

    fn job() -> GenerationJob {
        GenerationJob::new(
            "gen-1",
            0,
            "a lighthouse in a storm",
            GenerationConfig::new(AspectRatio::Portrait, 6),
            "mock",
        )
    }

    #[test]
    fn test_preview_truncates_long_prompts() {
        assert_eq!(preview("short"), "short");

        let long = "x".repeat(100);
        let shown = preview(&long);
        assert_eq!(shown.chars().count(), PROMPT_PREVIEW_CHARS);
        assert!(shown.ends_with('…'));
    }

    #[test]
    fn test_history_row_processing() {
        let mut job = job();
        job.mark_processing(Some(0.42)).unwrap();

        let row = HistoryRow::from(job);
        assert_eq!(row.status, "PROCESSING 42%");
        assert_eq!(row.format, "9:16 / 6s");
        assert_eq!(row.result, "");
    }

    #[test]
    fn test_history_row_terminal_states() {
        let mut done = job();
        done.complete("https://cdn.example/v.mp4", 10).unwrap();
        let row = HistoryRow::from(done);
        assert_eq!(row.status, "COMPLETED");
        assert_eq!(row.result, "https://cdn.example/v.mp4");

        let mut failed = job();
        failed.fail("invalid token", 10).unwrap();
        let row = HistoryRow::from(failed);
        assert_eq!(row.status, "FAILED");
        assert_eq!(row.result, "invalid token");
    }
}
