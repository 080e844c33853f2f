//! Shared helpers for the `filehub` binaries: tracing setup, client wiring,
//! and table/JSON output.

use anyhow::Context;
use chrono::Utc;
use clap::ValueEnum;
use filehub_client::FileHub;
use filehub_core::format::{format_bytes, format_upload_date};
use filehub_core::models::{DashboardStats, FileRecord, SortField, User};
use filehub_core::{ClientConfig, ClientError};
use serde::Serialize;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Sort key accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortKey {
    Name,
    Size,
    #[default]
    Date,
}

impl From<SortKey> for SortField {
    fn from(key: SortKey) -> Self {
        match key {
            SortKey::Name => SortField::Name,
            SortKey::Size => SortField::Size,
            SortKey::Date => SortField::UploadDate,
        }
    }
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Initialize tracing for CLI binaries. Logs go to stderr so JSON output on
/// stdout stays machine-readable.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Load `.env`, read the environment, and apply a command-line URL override.
pub fn load_config(api_url: Option<String>) -> anyhow::Result<ClientConfig> {
    dotenvy::dotenv().ok();
    let config = ClientConfig::from_env().context("Invalid FileHub configuration")?;
    Ok(match api_url {
        Some(url) => config.with_api_url(url),
        None => config,
    })
}

/// Restore the stored session and return the logged-in user.
pub async fn require_login(hub: &FileHub) -> anyhow::Result<User> {
    hub.session.initialize().await;
    hub.session
        .current_user()
        .ok_or(ClientError::NotAuthenticated)
        .context("Run `filehub login` first")
}

/// Whether this error was already logged by the gateway's failure notifier.
pub fn already_reported(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ClientError>()
        .is_some_and(ClientError::is_gateway_failure)
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

pub fn print_user(user: &User) {
    println!("\n=== Profile ===\n");
    println!("Username:  {}", user.username);
    println!("Email:     {}", user.email);
    if let Some(picture) = &user.profile_picture {
        println!("Picture:   {}", picture);
    }
    if let (Some(used), Some(limit)) = (user.storage_used, user.storage_limit) {
        let percent = user.storage_usage_percent().unwrap_or_default();
        println!(
            "Storage:   {} of {} ({:.1}%)",
            format_bytes(used, 2),
            format_bytes(limit, 2),
            percent
        );
    }
    println!();
}

pub fn print_file_table(files: &[&FileRecord]) {
    println!("\n=== Files ===\n");

    if files.is_empty() {
        println!("No files found.");
        println!();
        return;
    }

    println!(
        "{:>6}  {:<36} {:<12} {:>10}  {:<20}",
        "ID", "Name", "Type", "Size", "Uploaded"
    );
    println!("{}", "-".repeat(90));

    let now = Utc::now();
    for file in files {
        println!(
            "{:>6}  {:<36} {:<12} {:>10}  {:<20}",
            file.id,
            truncate_string(file.display_name(), 36),
            file.category(),
            format_bytes(file.file_size, 1),
            format_upload_date(file.uploaded_at, now)
        );
    }

    println!("\nTotal: {} files", files.len());
    println!();
}

pub fn print_file_detail(file: &FileRecord) {
    println!("\n=== File {} ===\n", file.id);
    println!("Name:      {}", file.display_name());
    println!("Type:      {} ({})", file.file_type(), file.category());
    println!("Size:      {}", format_bytes(file.file_size, 2));
    println!(
        "Uploaded:  {} ({})",
        file.uploaded_at.format("%Y-%m-%d %H:%M"),
        format_upload_date(file.uploaded_at, Utc::now())
    );
    if !file.file.is_empty() {
        println!("URL:       {}", file.file);
    }
    println!();
}

pub fn print_stats_table(stats: &DashboardStats, user: Option<&User>) {
    println!("\n=== Storage Statistics ===\n");
    println!("Total files:   {}", stats.total_files);
    println!(
        "Storage used:  {}",
        format_bytes(stats.total_storage_used, 2)
    );

    if let Some(user) = user {
        if let (Some(limit), Some(percent)) = (user.storage_limit, user.storage_usage_percent()) {
            println!(
                "Quota:         {} ({:.1}% used)",
                format_bytes(limit, 2),
                percent
            );
        }
    }

    if !stats.file_type_distribution.is_empty() {
        println!("\n--- By Type ---");
        for entry in &stats.file_type_distribution {
            println!("  {:<14} {:>6}", entry.file_type, entry.count);
        }
    }

    if !stats.recent_uploads.is_empty() {
        println!("\n--- Recent Uploads ---");
        let now = Utc::now();
        for file in &stats.recent_uploads {
            println!(
                "  {:<36} {:>10}  {}",
                truncate_string(file.display_name(), 36),
                format_bytes(file.file_size, 1),
                format_upload_date(file.uploaded_at, now)
            );
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_exact() {
        assert_eq!(truncate_string("hello", 5), "hello");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("abc", 2), "...");
    }

    #[test]
    fn truncate_string_counts_characters() {
        assert_eq!(truncate_string("résumé final.pdf", 9), "résumé...");
    }

    #[test]
    fn sort_key_maps_to_field() {
        assert_eq!(SortField::from(SortKey::Date), SortField::UploadDate);
        assert_eq!(SortField::from(SortKey::default()), SortField::default());
    }

    #[test]
    fn gateway_errors_count_as_reported() {
        let reported = anyhow::Error::new(ClientError::Server {
            status: 500,
            message: "boom".into(),
        });
        assert!(already_reported(&reported));

        let local = anyhow::Error::new(ClientError::validation("Please fill in all fields"))
            .context("login");
        assert!(!already_reported(&local));
        assert!(!already_reported(&anyhow::anyhow!("plain")));

        let missing_token = anyhow::Error::new(ClientError::MissingToken);
        assert!(!already_reported(&missing_token));
    }
}
