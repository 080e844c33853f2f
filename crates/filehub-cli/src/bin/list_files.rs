use anyhow::Result;
use clap::Parser;

use filehub_cli::{
    init_tracing, load_config, print_file_table, print_json, require_login, OutputFormat, SortKey,
};
use filehub_client::connect;
use filehub_core::models::{filter_and_sort, SortDirection};

#[derive(Parser, Debug)]
#[command(name = "list_files")]
#[command(about = "List stored files with search and sorting")]
struct Args {
    /// Case-insensitive filename filter
    #[arg(long)]
    search: Option<String>,

    /// Sort key (default: date)
    #[arg(long, value_enum, default_value_t = SortKey::Date)]
    sort: SortKey,

    /// Sort ascending instead of descending
    #[arg(long)]
    asc: bool,

    /// Show at most this many files
    #[arg(long)]
    limit: Option<usize>,

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
    require_login(&hub).await?;

    let files = hub.gateway().list_files().await?;
    let direction = if args.asc {
        SortDirection::Asc
    } else {
        SortDirection::Desc
    };
    let mut shown = filter_and_sort(&files, args.search.as_deref(), args.sort.into(), direction);
    if let Some(limit) = args.limit {
        shown.truncate(limit);
    }

    match args.format {
        OutputFormat::Json => print_json(&shown)?,
        OutputFormat::Table => {
            print_file_table(&shown);
            if shown.len() < files.len() {
                println!("({} of {} files shown)", shown.len(), files.len());
            }
        }
    }

    Ok(())
}
