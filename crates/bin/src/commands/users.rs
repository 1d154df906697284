//! Users command - lists and creates accounts.

use serde_json::{Value, json};
use startpage::{Startpages, User};

use crate::backend::{create_backend, save_snapshot};
use crate::cli::{UsersArgs, UsersCommand, UsersCreateArgs, UsersListArgs};
use crate::output::{OutputFormat, print_table};

/// Run the users command
pub async fn run(args: &UsersArgs) -> Result<(), Box<dyn std::error::Error>> {
    match &args.command {
        UsersCommand::List(args) => list(args).await,
        UsersCommand::Create(args) => create(args).await,
    }
}

/// Account listing without password hashes.
fn listing(users: &[User]) -> Value {
    users
        .iter()
        .map(|u| {
            json!({
                "id": u.id,
                "username": u.username,
                "email": u.email,
                "is_staff": u.is_staff,
                "date_joined": u.date_joined,
                "color_scheme": u.color_scheme,
            })
        })
        .collect()
}

async fn list(args: &UsersListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let backend = create_backend(&args.backend_config).await?;
    let startpages = Startpages::open(backend).await?;
    let users = startpages.list_users().await?;

    match OutputFormat::from_json_flag(args.json) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&listing(&users))?);
        }
        OutputFormat::Human => {
            if users.is_empty() {
                println!("No accounts registered");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = users
                .iter()
                .map(|u| {
                    vec![
                        u.id.to_string(),
                        u.username.clone(),
                        u.email.clone(),
                        if u.is_staff { "yes" } else { "" }.to_string(),
                        u.date_joined.format("%Y-%m-%d %H:%M").to_string(),
                    ]
                })
                .collect();
            print_table(&["ID", "USERNAME", "EMAIL", "STAFF", "JOINED"], &rows);
        }
    }
    Ok(())
}

async fn create_account(startpages: &Startpages, args: &UsersCreateArgs) -> startpage::Result<User> {
    if args.staff {
        startpages
            .register_staff(&args.username, &args.email, &args.password)
            .await
    } else {
        startpages
            .register(&args.username, &args.email, &args.password)
            .await
    }
}

async fn create(args: &UsersCreateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let backend = create_backend(&args.backend_config).await?;
    let startpages = Startpages::open(backend).await?;

    let user = create_account(&startpages, args).await?;
    save_snapshot(&startpages, &args.backend_config).await?;

    let role = if user.is_staff { "staff account" } else { "account" };
    println!("Created {role} '{}' (id {})", user.username, user.id);
    if user.is_staff && user.email.is_empty() {
        println!("No email address given; this account will not receive the daily mail");
    }
    Ok(())
}
