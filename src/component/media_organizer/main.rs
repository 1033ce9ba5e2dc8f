use super::date_extractor::DateExtractor;
use super::organizer::{OrganizeSummary, Organizer};
use super::resume_checkpoint::{CheckpointStore, FileCheckpointStore};
use crate::config::save::{add_recent_path, save_settings};
use crate::config::Config;
use crate::tools::{ensure_directory_exists, validate_directory_exists};
use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use log::{info, warn};
use rust_i18n::t;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 依拍攝日期整理媒體檔案元件
pub struct MediaOrganizer {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
}

impl MediaOrganizer {
    pub const fn new(config: Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            config,
            shutdown_signal,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        println!("{}", style(t!("media_organizer.title")).cyan().bold());
        println!("{}", style(t!("common.esc_hint")).dim());

        let Some(source_input) = prompt_path(
            &t!("media_organizer.prompt_source"),
            &self.config.settings.recent_source_paths,
        )?
        else {
            return Ok(());
        };
        let source = PathBuf::from(&source_input);
        validate_directory_exists(&source)?;
        let source = source
            .canonicalize()
            .with_context(|| format!("無法解析路徑: {}", source.display()))?;

        let Some(dest_input) = prompt_path(
            &t!("media_organizer.prompt_destination"),
            &self.config.settings.recent_destination_paths,
        )?
        else {
            return Ok(());
        };
        let dest = PathBuf::from(&dest_input);
        ensure_directory_exists(&dest)?;
        let dest = dest
            .canonicalize()
            .with_context(|| format!("無法解析路徑: {}", dest.display()))?;

        if source == dest {
            bail!("{}", t!("media_organizer.same_path_error"));
        }

        self.remember_paths(&source_input, &dest_input);

        let mut store = FileCheckpointStore::new(&dest);
        if !self.confirm_resume(&store)? {
            return Ok(());
        }

        if !Confirm::new()
            .with_prompt(t!("media_organizer.confirm"))
            .default(true)
            .interact()?
        {
            println!("{}", style(t!("media_organizer.cancelled")).yellow());
            return Ok(());
        }

        if self.shutdown_signal.load(Ordering::SeqCst) {
            warn!("收到中斷訊號，停止處理");
            return Ok(());
        }

        println!("{}", style(t!("media_organizer.running")).cyan());
        let organizer = Organizer::new(
            &source,
            &dest,
            self.config.media_type_table.clone(),
            DateExtractor::default(),
            Arc::clone(&self.shutdown_signal),
        )
        .with_progress(true);

        let summary = organizer.run(&mut store)?;
        print_summary(&summary);

        Ok(())
    }

    /// 更新路徑歷史並儲存
    fn remember_paths(&mut self, source: &str, dest: &str) {
        let settings = &mut self.config.settings;
        add_recent_path(&mut settings.recent_source_paths, source);
        add_recent_path(&mut settings.recent_destination_paths, dest);
        if let Err(e) = save_settings(settings) {
            warn!("無法儲存路徑歷史: {e}");
        }
    }

    /// 已有檢查點時詢問要續跑或重新開始，回傳是否繼續執行
    fn confirm_resume(&self, store: &FileCheckpointStore) -> Result<bool> {
        let Some(last) = store.load()? else {
            return Ok(true);
        };

        println!(
            "{}",
            style(t!("media_organizer.checkpoint_found", path = last)).yellow()
        );

        let options = vec![
            t!("media_organizer.resume"),
            t!("media_organizer.start_over"),
            t!("media_organizer.cancel"),
        ];
        let selection = Select::with_theme(&ColorfulTheme::default())
            .items(&options)
            .default(0)
            .interact_opt()?;

        match selection {
            Some(0) => Ok(true),
            Some(1) => {
                store.clear()?;
                info!("使用者選擇重新開始，已清除檢查點: {}", store.path().display());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// 從歷史路徑選擇或輸入新路徑，ESC 回傳 None
fn prompt_path(prompt: &str, recent_paths: &[String]) -> Result<Option<String>> {
    if recent_paths.is_empty() {
        let path: String = Input::new().with_prompt(prompt).interact_text()?;
        return Ok(Some(path.trim().to_string()));
    }

    let mut options: Vec<String> = recent_paths
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let indicator = if Path::new(p).exists() { "✓" } else { "✗" };
            format!("{} [{}] {}", i + 1, indicator, p)
        })
        .collect();
    options.push(t!("media_organizer.new_path").to_string());

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .items(&options)
        .default(0)
        .interact_opt()?;

    match selection {
        None => Ok(None),
        Some(idx) if idx < recent_paths.len() => Ok(Some(recent_paths[idx].clone())),
        Some(_) => {
            let path: String = Input::new().with_prompt(prompt).interact_text()?;
            Ok(Some(path.trim().to_string()))
        }
    }
}

fn print_summary(summary: &OrganizeSummary) {
    println!();
    println!("{}", style(t!("media_organizer.summary_title")).cyan().bold());

    if let Some(resumed_after) = &summary.resumed_after {
        println!(
            "  {}",
            style(t!("media_organizer.resumed_after", path = resumed_after)).dim()
        );
    }
    if summary.resume_point_missing {
        println!("  {}", style(t!("media_organizer.resume_missing")).yellow());
    }

    println!(
        "  {}: {}",
        t!("media_organizer.copied"),
        style(summary.files_copied).green()
    );
    println!(
        "  {}: {}",
        t!("media_organizer.duplicates"),
        style(summary.duplicates_skipped).yellow()
    );
    println!("  {}: {}", t!("media_organizer.dated"), summary.files_dated);
    println!(
        "  {}: {}",
        t!("media_organizer.unclassified"),
        summary.files_unclassified
    );
    println!(
        "  {}: {}/{}",
        t!("media_organizer.subfolders"),
        summary.subfolders_completed,
        summary.subfolders_total - summary.subfolders_skipped
    );

    if summary.errors > 0 {
        println!(
            "  {}: {}",
            t!("media_organizer.errors"),
            style(summary.errors).red()
        );
    }
    if let Some(frozen_at) = &summary.checkpoint_frozen_at {
        println!(
            "  {}",
            style(t!("media_organizer.checkpoint_frozen", path = frozen_at)).red()
        );
    }
    if summary.interrupted {
        println!("  {}", style(t!("media_organizer.interrupted")).yellow());
    }
}
