//! Settings command - shows and changes the site settings.
//!
//! A running server keeps the settings it loaded at startup; restart it to
//! pick up changes made here.

use startpage::{Startpages, settings::GlobalSettings};

use crate::backend::{create_backend, save_snapshot};
use crate::cli::{SettingsArgs, SettingsCommand, SettingsSetArgs, SettingsShowArgs};
use crate::output::{OutputFormat, print_table};

/// Run the settings command
pub async fn run(args: &SettingsArgs) -> Result<(), Box<dyn std::error::Error>> {
    match &args.command {
        SettingsCommand::Show(args) => show(args).await,
        SettingsCommand::Set(args) => set(args).await,
    }
}

fn yes_no(value: bool) -> String {
    if value { "on" } else { "off" }.to_string()
}

fn rows(settings: &GlobalSettings) -> Vec<Vec<String>> {
    vec![
        vec!["ntfy".to_string(), yes_no(settings.ntfy_active)],
        vec!["daily-mail".to_string(), yes_no(settings.daily_mail_active)],
        vec![
            "include-registrations".to_string(),
            yes_no(settings.daily_mail_include_registrations),
        ],
    ]
}

/// `current` with every switch given on the command line applied.
fn apply(current: GlobalSettings, args: &SettingsSetArgs) -> GlobalSettings {
    GlobalSettings {
        ntfy_active: args.ntfy.unwrap_or(current.ntfy_active),
        daily_mail_active: args.daily_mail.unwrap_or(current.daily_mail_active),
        daily_mail_include_registrations: args
            .include_registrations
            .unwrap_or(current.daily_mail_include_registrations),
    }
}

async fn show(args: &SettingsShowArgs) -> Result<(), Box<dyn std::error::Error>> {
    let backend = create_backend(&args.backend_config).await?;
    let startpages = Startpages::open(backend).await?;
    let settings = startpages.global_settings().await?;

    match OutputFormat::from_json_flag(args.json) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&*settings)?),
        OutputFormat::Human => print_table(&["SETTING", "VALUE"], &rows(&settings)),
    }
    Ok(())
}

async fn set(args: &SettingsSetArgs) -> Result<(), Box<dyn std::error::Error>> {
    let backend = create_backend(&args.backend_config).await?;
    let startpages = Startpages::open(backend).await?;

    let current = *startpages.global_settings().await?;
    let updated = apply(current, args);
    if updated == current {
        println!("Nothing to change");
        return Ok(());
    }
    startpages.update_settings(updated).await?;
    save_snapshot(&startpages, &args.backend_config).await?;

    print_table(&["SETTING", "VALUE"], &rows(&updated));
    println!("Restart running servers to apply the change");
    Ok(())
}
