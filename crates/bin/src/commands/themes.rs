//! Themes command - manages the color schemes accounts can pick from.

use startpage::{
    ColorSchemeId, Startpages,
    settings::{ColorScheme, NewColorScheme},
};

use crate::backend::{create_backend, save_snapshot};
use crate::cli::{ThemesAddArgs, ThemesArgs, ThemesCommand, ThemesDeleteArgs, ThemesListArgs};
use crate::output::{OutputFormat, print_table};

/// Run the themes command
pub async fn run(args: &ThemesArgs) -> Result<(), Box<dyn std::error::Error>> {
    match &args.command {
        ThemesCommand::List(args) => list(args).await,
        ThemesCommand::Add(args) => add(args).await,
        ThemesCommand::Delete(args) => delete(args).await,
    }
}

fn rows(schemes: &[ColorScheme]) -> Vec<Vec<String>> {
    schemes
        .iter()
        .map(|s| {
            vec![
                s.id.to_string(),
                s.name.clone(),
                if s.is_dark { "yes" } else { "" }.to_string(),
                s.preview_colors.join(" "),
            ]
        })
        .collect()
}

async fn list(args: &ThemesListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let backend = create_backend(&args.backend_config).await?;
    let startpages = Startpages::open(backend).await?;
    let schemes = startpages.list_color_schemes().await?;

    match OutputFormat::from_json_flag(args.json) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&schemes)?),
        OutputFormat::Human => {
            if schemes.is_empty() {
                println!("No color schemes defined");
                return Ok(());
            }
            print_table(&["ID", "NAME", "DARK", "PREVIEW"], &rows(&schemes));
        }
    }
    Ok(())
}

async fn new_scheme(args: &ThemesAddArgs) -> std::io::Result<NewColorScheme> {
    let css_variables = match (&args.css, &args.css_file) {
        (Some(css), _) => css.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path).await?,
        (None, None) => String::new(),
    };
    Ok(NewColorScheme {
        name: args.name.clone(),
        is_dark: args.dark,
        preview_colors: args.preview_colors.clone(),
        css_variables,
    })
}

async fn add(args: &ThemesAddArgs) -> Result<(), Box<dyn std::error::Error>> {
    let scheme = new_scheme(args).await?;
    let backend = create_backend(&args.backend_config).await?;
    let startpages = Startpages::open(backend).await?;

    let created = startpages.add_color_scheme(scheme).await?;
    save_snapshot(&startpages, &args.backend_config).await?;
    println!("Added color scheme '{}' (id {})", created.name, created.id);
    Ok(())
}

async fn delete(args: &ThemesDeleteArgs) -> Result<(), Box<dyn std::error::Error>> {
    let backend = create_backend(&args.backend_config).await?;
    let startpages = Startpages::open(backend).await?;

    startpages.delete_color_scheme(ColorSchemeId(args.id)).await?;
    save_snapshot(&startpages, &args.backend_config).await?;
    println!("Deleted color scheme {}", args.id);
    Ok(())
}
