use crate::component::MediaOrganizer;
use crate::config::Config;
use crate::pause;
use anyhow::Result;
use console::{Term, style};
use rust_i18n::t;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn run_media_organizer(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
) -> Result<()> {
    let mut organizer = MediaOrganizer::new(config.clone(), Arc::clone(shutdown_signal));

    if let Err(e) = organizer.run() {
        eprintln!("{} {:#}", style(t!("common.error_prefix")).red().bold(), e);
    }

    // 元件可能更新了路徑歷史
    if let Ok(reloaded) = Config::new() {
        config.settings = reloaded.settings;
    }

    pause(term)?;
    Ok(())
}
