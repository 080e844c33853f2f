//! FileHub CLI: command-line client for the FileHub API.
//!
//! Set FILEHUB_API_URL (or API_URL), or pass --api-url. The session token is
//! stored at FILEHUB_TOKEN_PATH (default: the user config directory).

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use filehub_api_client::FileRef;
use filehub_cli::{
    already_reported, init_tracing, load_config, print_file_detail, print_file_table, print_json,
    print_stats_table, print_user, require_login, OutputFormat, SortKey,
};
use filehub_client::{connect, FileHub, JobId, JobStatus, QueueEvent};
use filehub_core::format::format_bytes;
use filehub_core::models::{filter_and_sort, SortDirection};

#[derive(Parser)]
#[command(name = "filehub", about = "FileHub storage CLI")]
struct Cli {
    /// API base URL, e.g. http://127.0.0.1:8000/api
    #[arg(long, global = true, env = "FILEHUB_API_URL")]
    api_url: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "FILEHUB_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Create an account (does not log in)
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
    /// Show the logged-in user
    Whoami,
    /// Profile operations
    Profile {
        #[command(subcommand)]
        sub: ProfileCommands,
    },
    /// Password operations
    Password {
        #[command(subcommand)]
        sub: PasswordCommands,
    },
    /// File listing and management
    Files {
        #[command(subcommand)]
        sub: FileCommands,
    },
    /// Download a file by ID
    Download {
        id: i64,
        /// Directory to save into
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Upload one or more files, one after another
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Storage usage dashboard
    Stats,
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Change username and email
    Update {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
    },
    /// Profile picture operations
    Picture {
        #[command(subcommand)]
        sub: PictureCommands,
    },
}

#[derive(Subcommand)]
enum PictureCommands {
    /// Upload a new profile picture (image, at most 5 MB)
    Set { path: PathBuf },
    /// Fetch the current profile picture
    Get {
        /// Keep a copy in this directory
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PasswordCommands {
    /// Change the password of the logged-in user
    Change {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
    /// Request a password reset email
    Forgot {
        #[arg(long)]
        email: String,
    },
    /// Set a new password from a reset link
    Reset {
        #[arg(long)]
        uid: String,
        #[arg(long)]
        token: String,
        #[arg(long)]
        new_password: String,
    },
}

#[derive(Subcommand)]
enum FileCommands {
    /// List files with optional search and sorting
    List {
        /// Case-insensitive name filter
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum, default_value_t = SortKey::Date)]
        sort: SortKey,
        /// Ascending order (default is descending)
        #[arg(long)]
        asc: bool,
    },
    /// Show a single file record
    Show { id: i64 },
    /// Delete a file by ID
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let hub = match load_config(cli.api_url.clone()).and_then(|config| {
        connect(&config).context("Failed to create API client")
    }) {
        Ok(hub) => hub,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            return ExitCode::FAILURE;
        }
    };

    let result = run(&hub, cli.command, cli.format).await;

    if hub.take_login_redirect() {
        eprintln!("Your session has expired. Please log in again with `filehub login`.");
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if !already_reported(&err) {
                eprintln!("Error: {:#}", err);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(hub: &FileHub, command: Commands, format: OutputFormat) -> anyhow::Result<()> {
    match command {
        Commands::Login { username, password } => {
            let user = hub.session.login(&username, &password).await?;
            match format {
                OutputFormat::Json => print_json(&user)?,
                OutputFormat::Table => println!("Logged in as {}", user.username),
            }
        }
        Commands::Logout => {
            hub.session.logout();
            println!("Logged out");
        }
        Commands::Register {
            username,
            email,
            password,
            confirm_password,
        } => {
            hub.session
                .register(&username, &email, &password, &confirm_password)
                .await?;
            println!("Account created. Log in with `filehub login --username {}`", username);
        }
        Commands::Whoami => {
            let user = require_login(hub).await?;
            match format {
                OutputFormat::Json => print_json(&user)?,
                OutputFormat::Table => print_user(&user),
            }
        }
        Commands::Profile { sub } => {
            require_login(hub).await?;
            match sub {
                ProfileCommands::Update { username, email } => {
                    let user = hub.session.update_profile(&username, &email).await?;
                    match format {
                        OutputFormat::Json => print_json(&user)?,
                        OutputFormat::Table => print_user(&user),
                    }
                }
                ProfileCommands::Picture { sub } => match sub {
                    PictureCommands::Set { path } => {
                        let user = hub.session.upload_profile_picture(&path).await?;
                        println!(
                            "Profile picture updated{}",
                            user.profile_picture
                                .map(|p| format!(": {}", p))
                                .unwrap_or_default()
                        );
                    }
                    PictureCommands::Get { dir } => {
                        let Some(blob) = hub.session.profile_picture().await? else {
                            println!("No profile picture set");
                            return Ok(());
                        };
                        println!(
                            "{} ({}, {})",
                            blob.filename(),
                            blob.content_type().unwrap_or("unknown type"),
                            format_bytes(blob.len(), 1)
                        );
                        if let Some(dir) = dir {
                            let target = dir.join(blob.filename());
                            std::fs::copy(blob.path(), &target)
                                .with_context(|| format!("Failed to save {}", target.display()))?;
                            println!("Saved to {}", target.display());
                        }
                        blob.release()?;
                    }
                },
            }
        }
        Commands::Password { sub } => match sub {
            PasswordCommands::Change {
                current,
                new,
                confirm,
            } => {
                require_login(hub).await?;
                hub.session
                    .change_password(&current, &new, &confirm)
                    .await?;
                println!("Password changed");
            }
            PasswordCommands::Forgot { email } => {
                hub.session.forgot_password(&email).await?;
                println!("If an account exists for {}, a reset link has been sent", email);
            }
            PasswordCommands::Reset {
                uid,
                token,
                new_password,
            } => {
                hub.session
                    .reset_password(&uid, &token, &new_password)
                    .await?;
                println!("Password reset. You can now log in with the new password");
            }
        },
        Commands::Files { sub } => {
            require_login(hub).await?;
            match sub {
                FileCommands::List { search, sort, asc } => {
                    let files = hub.gateway().list_files().await?;
                    let direction = if asc {
                        SortDirection::Asc
                    } else {
                        SortDirection::Desc
                    };
                    let shown = filter_and_sort(&files, search.as_deref(), sort.into(), direction);
                    match format {
                        OutputFormat::Json => print_json(&shown)?,
                        OutputFormat::Table => print_file_table(&shown),
                    }
                }
                FileCommands::Show { id } => {
                    let file = hub.gateway().get_file(id).await?;
                    match format {
                        OutputFormat::Json => print_json(&file)?,
                        OutputFormat::Table => print_file_detail(&file),
                    }
                }
                FileCommands::Delete { id } => {
                    hub.gateway().delete_file(id).await?;
                    match format {
                        OutputFormat::Json => print_json(
                            &serde_json::json!({ "success": true, "message": format!("File {} deleted", id) }),
                        )?,
                        OutputFormat::Table => println!("File {} deleted", id),
                    }
                }
            }
        }
        Commands::Download { id, dir } => {
            require_login(hub).await?;
            let file = hub.gateway().download_file(id).await?;
            let saved = file.save_into(&dir).await?;
            println!("Saved {} ({})", saved.display(), format_bytes(file.data.len() as u64, 1));
        }
        Commands::Upload { paths } => {
            require_login(hub).await?;
            upload(hub, paths, format).await?;
        }
        Commands::Stats => {
            let user = require_login(hub).await?;
            let stats = hub.gateway().dashboard_stats().await?.normalized();
            match format {
                OutputFormat::Json => print_json(&stats)?,
                OutputFormat::Table => print_stats_table(&stats, Some(&user)),
            }
        }
    }

    Ok(())
}

async fn upload(hub: &FileHub, paths: Vec<PathBuf>, format: OutputFormat) -> anyhow::Result<()> {
    let mut files = Vec::with_capacity(paths.len());
    for path in &paths {
        files.push(FileRef::from_path(path).await?);
    }

    let mut queue = hub.upload_queue();
    let mut events = queue.subscribe();
    queue.enqueue(files);

    let names: std::collections::HashMap<_, _> = queue
        .jobs()
        .iter()
        .map(|job| (job.id(), job.file().name.clone()))
        .collect();
    let show_progress = format == OutputFormat::Table;
    let printer = tokio::spawn(async move {
        let mut last_step = std::collections::HashMap::new();
        while let Some(event) = events.recv().await {
            if !show_progress {
                continue;
            }
            let name = |id: JobId| names.get(&id).map(String::as_str).unwrap_or("?");
            match event {
                QueueEvent::JobStarted { id } => eprintln!("Uploading {}", name(id)),
                QueueEvent::Progress { id, percent } => {
                    // One line per 10% step.
                    let step = percent / 10;
                    if last_step.insert(id, step) != Some(step) {
                        eprintln!("  {} {}%", name(id), percent);
                    }
                }
                QueueEvent::JobFailed { id, message } => {
                    eprintln!("  {} failed: {}", name(id), message)
                }
                QueueEvent::JobSucceeded { .. } | QueueEvent::BatchComplete => {}
            }
        }
    });

    let outcome = queue.submit_all_pending().await;

    let rows: Vec<serde_json::Value> = queue
        .jobs()
        .iter()
        .map(|job| {
            serde_json::json!({
                "name": job.file().name,
                "size": job.file().size,
                "status": job.status().to_string(),
                "progress": job.progress(),
                "error": job.error_detail(),
                "id": job.record().map(|record| record.id),
            })
        })
        .collect();
    let failed: Vec<String> = queue
        .jobs()
        .iter()
        .filter(|job| job.status() == JobStatus::Error)
        .map(|job| job.file().name.clone())
        .collect();
    let left_pending = queue.pending_count();
    drop(queue);
    printer.await.ok();

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "attempted": outcome.attempted,
            "succeeded": outcome.succeeded,
            "failed": outcome.failed,
            "aborted": outcome.aborted,
            "complete": outcome.complete,
            "pending": left_pending,
            "jobs": rows,
        }))?,
        OutputFormat::Table => {
            println!("\n{:<36} {:>10} {:<10} Detail", "Name", "Size", "Status");
            println!("{}", "-".repeat(80));
            for row in &rows {
                println!(
                    "{:<36} {:>10} {:<10} {}",
                    filehub_cli::truncate_string(row["name"].as_str().unwrap_or_default(), 36),
                    format_bytes(row["size"].as_u64().unwrap_or_default(), 1),
                    row["status"].as_str().unwrap_or_default(),
                    row["error"].as_str().unwrap_or_default()
                );
            }
            println!();
            if outcome.attempted == 0 {
                println!("No files to upload");
            } else if outcome.complete {
                println!("All files uploaded successfully");
            } else if outcome.aborted {
                println!(
                    "Upload stopped: session expired, {} file(s) left pending",
                    left_pending
                );
            }
        }
    }

    if !failed.is_empty() {
        anyhow::bail!("{} upload(s) failed: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}
