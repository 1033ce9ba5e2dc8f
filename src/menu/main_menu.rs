use crate::config::save::save_settings;
use crate::config::types::{Config, Language};
use crate::menu::handlers::run_media_organizer;
use anyhow::Result;
use console::{Term, style};
use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;
use log::warn;
use rust_i18n::t;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn show_main_menu(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
) -> Result<bool> {
    term.clear_screen()?;

    println!("{}", style(t!("main_menu.title")).cyan().bold());
    println!("{}", style(t!("common.esc_hint")).dim());

    let options = vec![
        t!("main_menu.opt_organize"),
        t!("main_menu.opt_settings"),
        t!("main_menu.exit"),
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("main_menu.prompt"))
        .items(&options)
        .default(0)
        .interact_on_opt(term)?;

    match selection {
        Some(0) => {
            run_media_organizer(term, shutdown_signal, config)?;
            Ok(true)
        }
        Some(1) => {
            show_settings_menu(term, config)?;
            Ok(true)
        }
        _ => Ok(false), // 離開或 ESC
    }
}

/// 設定選單
fn show_settings_menu(term: &Term, config: &mut Config) -> Result<()> {
    term.clear_screen()?;
    println!("{}", style(t!("settings.title")).cyan().bold());

    let languages = Language::all();
    let options: Vec<&str> = languages.iter().map(Language::display_name).collect();
    let current = languages
        .iter()
        .position(|l| *l == config.settings.language)
        .unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(t!("settings.language"))
        .items(&options)
        .default(current)
        .interact_on_opt(term)?;

    if let Some(idx) = selection {
        config.settings.language = languages[idx];
        rust_i18n::set_locale(config.settings.language.as_str());
        if let Err(e) = save_settings(&config.settings) {
            warn!("無法儲存設定: {e}");
        }
    }

    Ok(())
}
