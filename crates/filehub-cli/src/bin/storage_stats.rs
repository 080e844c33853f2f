use anyhow::Result;
use clap::Parser;

use filehub_cli::{init_tracing, load_config, print_json, print_stats_table, require_login, OutputFormat};
use filehub_client::connect;
use filehub_core::format::format_bytes;
use filehub_core::models::DashboardStats;

#[derive(Parser, Debug)]
#[command(name = "storage_stats")]
#[command(about = "Get statistics about stored files")]
struct Args {
    /// Output format: json or table (default: table)
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// API base URL override
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let hub = connect(&load_config(args.api_url.clone())?)?;
    let user = require_login(&hub).await?;

    // Fall back to totals computed from the file list when the dashboard
    // endpoint is unavailable.
    let stats = match hub.gateway().dashboard_stats().await {
        Ok(stats) => stats.normalized(),
        Err(e) if !e.is_session_expired() => {
            eprintln!(
                "Warning: Failed to fetch dashboard ({}), computing from the file list",
                e
            );
            let mut files = hub.gateway().list_files().await?;
            files.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
            DashboardStats {
                total_files: files.len() as u64,
                total_storage_used: files.iter().map(|f| f.file_size).sum(),
                recent_uploads: files.into_iter().take(5).collect(),
                file_type_distribution: Vec::new(),
            }
            .normalized()
        }
        Err(e) => return Err(e.into()),
    };

    match args.format {
        OutputFormat::Json => print_json(&stats)?,
        OutputFormat::Table => {
            print_stats_table(&stats, Some(&user));
            if stats.total_files > 0 {
                println!(
                    "Average file size: {}",
                    format_bytes(stats.total_storage_used / stats.total_files, 2)
                );
            }
        }
    }

    Ok(())
}
