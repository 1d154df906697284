//! Digest command - sends the daily summary mail to staff.
//!
//! Meant to be run once a day by an external scheduler (cron, a systemd
//! timer). Mails are written to an outbox directory for the local mail
//! transfer agent to pick up.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::FixedOffset;
use startpage::{
    Startpages,
    digest::{DigestOutcome, MailMessage, Mailer},
};

use crate::backend::create_backend;
use crate::cli::DigestArgs;

/// Writes each mail as an RFC 5322 style text file.
#[derive(Debug)]
pub struct FileOutbox {
    dir: PathBuf,
}

impl FileOutbox {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_for(&self, message: &MailMessage) -> PathBuf {
        let recipient: String = message
            .to
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
            .collect();
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f");
        self.dir.join(format!("{stamp}-{recipient}.eml"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn render(message: &MailMessage) -> String {
    format!(
        "From: {}\r\nTo: {}\r\nSubject: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}",
        message.from, message.to, message.subject, message.body
    )
}

#[async_trait]
impl Mailer for FileOutbox {
    async fn send(&self, message: &MailMessage) -> startpage::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.file_for(message);
        tokio::fs::write(&path, render(message)).await?;
        tracing::debug!(path = %path.display(), "Mail written to outbox");
        Ok(())
    }
}

/// Run the digest command
pub async fn run(args: &DigestArgs) -> Result<(), Box<dyn std::error::Error>> {
    let offset = FixedOffset::east_opt(args.utc_offset_hours * 3600)
        .ok_or_else(|| format!("UTC offset out of range: {} hours", args.utc_offset_hours))?;

    let backend = create_backend(&args.backend_config).await?;
    let startpages = Startpages::open(backend).await?;

    let outbox = FileOutbox::new(
        args.outbox
            .clone()
            .unwrap_or_else(|| args.backend_config.data_dir().join("outbox")),
    );

    match startpages
        .send_digest(&outbox, &args.from_email, offset)
        .await?
    {
        DigestOutcome::Disabled => println!("Daily mail is disabled in site settings"),
        DigestOutcome::NothingToReport => println!("No updates for the period, no mail sent"),
        DigestOutcome::NoRecipients => println!("No staff accounts with email addresses"),
        DigestOutcome::Sent { delivered, failed } => {
            println!(
                "Daily mail written to {} for {delivered} recipient(s)",
                outbox.dir().display()
            );
            if failed > 0 {
                return Err(format!("{failed} mail(s) could not be written").into());
            }
        }
    }
    Ok(())
}
