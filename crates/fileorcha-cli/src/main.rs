//! FileOrcha CLI: upload self-destructing files, preview and download them.
//!
//! Set FILEORCHA_API_URL (or API_URL) to point at the server. Without a
//! subcommand an interactive shell starts.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use fileorcha_api_client::{ApiClient, Transfer};
use fileorcha_cli::controller::Completion;
use fileorcha_cli::shell::{load_file, progress_callback, upload_progress_bar, wait_for_enter};
use fileorcha_cli::{init_tracing, render, shell, Controller, ControllerSettings};
use fileorcha_core::format::escape_text;
use fileorcha_core::{ClientConfig, FileId, FileMeta, UploadResult};
use serde::Serialize;
use tokio::io::BufReader;

#[derive(Parser)]
#[command(name = "fileorcha", about = "Share files that expire", version)]
struct Cli {
    /// Server base URL (overrides FILEORCHA_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print machine-readable JSON where supported
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file and print its share link
    Upload {
        /// Path to the file to upload
        file: PathBuf,
        /// Number of downloads allowed (1-10)
        #[arg(long, default_value = "1")]
        downloads: i64,
        /// Minutes until the file expires (1-10080)
        #[arg(long, default_value = "5")]
        expiry: i64,
        /// Password required to download
        #[arg(long)]
        password: Option<String>,
        /// Custom short link
        #[arg(long)]
        slug: Option<String>,
        /// Also print the share link as a QR code
        #[arg(long)]
        qr: bool,
    },
    /// Download a file by ID
    Download {
        /// File ID
        id: String,
        #[arg(long)]
        password: Option<String>,
        /// Directory to save into (overrides FILEORCHA_DOWNLOAD_DIR)
        #[arg(long, short)]
        output_dir: Option<PathBuf>,
    },
    /// Preview a file by ID without consuming a download
    Preview {
        /// File ID
        id: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Download the file a share link points to
    Open {
        /// Link of the form {origin}/download.html?id=...
        link: String,
        #[arg(long, short)]
        output_dir: Option<PathBuf>,
    },
    /// Show the summary card of a file
    Info {
        /// File ID
        id: String,
    },
    /// Check that the server is up
    Health,
    /// Toggle between light and dark theme
    Theme,
    /// Interactive shell (default)
    Shell,
}

#[derive(Serialize)]
struct UploadOutput<'a> {
    #[serde(flatten)]
    result: &'a UploadResult,
    share_url: String,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

fn print_notifications<T: Transfer + ?Sized>(controller: &mut Controller<T>) {
    for notification in controller.notifications_mut().take_unseen() {
        println!("{}", render::notification_line(&notification));
    }
}

fn outcome<T, E>(result: Result<Completion<T>, E>) -> ExitCode {
    match result {
        Ok(Completion::Applied(_)) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env().context("Failed to load configuration")?;
    if let Some(api_url) = &cli.api_url {
        config = config.with_api_url(api_url);
        config.validate()?;
    }
    if let Some(Commands::Download {
        output_dir: Some(dir),
        ..
    })
    | Some(Commands::Open {
        output_dir: Some(dir),
        ..
    }) = &cli.command
    {
        config.download_dir = dir.clone();
    }

    let client = Arc::new(
        ApiClient::from_config(&config)
            .context("Failed to create API client. Check FILEORCHA_API_URL (or API_URL)")?,
    );
    let mut controller = Controller::new(Arc::clone(&client), ControllerSettings::from_config(&config));

    let code = match cli.command.unwrap_or(Commands::Shell) {
        Commands::Upload {
            file,
            downloads,
            expiry,
            password,
            slug,
            qr,
        } => {
            let file = load_file(&file).await?;
            {
                let form = controller.upload_form_mut();
                form.file = Some(file);
                form.downloads = downloads;
                form.expiry_minutes = expiry;
                form.password = password.unwrap_or_default();
                form.slug = slug.unwrap_or_default();
            }

            let pb = upload_progress_bar();
            let result = controller.submit_upload(Some(progress_callback(&pb))).await;
            pb.finish_and_clear();

            if let Ok(Completion::Applied(uploaded)) = &result {
                if cli.json {
                    print_json(&UploadOutput {
                        result: uploaded,
                        share_url: controller.copy_link().unwrap_or_default(),
                    })?;
                } else {
                    print_notifications(&mut controller);
                    match controller.success_view() {
                        Some(view) => {
                            let qr_text = if qr { controller.qr_terminal() } else { None };
                            println!(
                                "{}",
                                render::success_view(controller.theme(), &view, qr_text.as_deref())
                            );
                        }
                        None => println!("{}", render::screen(&controller)),
                    }
                }
            } else {
                print_notifications(&mut controller);
            }
            outcome(result)
        }
        Commands::Download { id, password, .. } => {
            controller.show_download();
            {
                let form = controller.download_form_mut();
                form.file_id = id;
                form.password = password.unwrap_or_default();
            }
            let result = controller.submit_download().await;
            if let Ok(Completion::Applied(saved)) = &result {
                println!("{} Saved {}", style("✓").green(), saved.path.display());
            }
            print_notifications(&mut controller);
            outcome(result)
        }
        Commands::Open { link, .. } => {
            let result = match controller.open_share_link(&link) {
                Ok(()) => controller.submit_download().await,
                Err(e) => Err(e),
            };
            if let Ok(Completion::Applied(saved)) = &result {
                println!("{} Saved {}", style("✓").green(), saved.path.display());
            }
            print_notifications(&mut controller);
            outcome(result)
        }
        Commands::Preview { id, password } => {
            controller.show_download();
            {
                let form = controller.download_form_mut();
                form.file_id = id;
                form.password = password.unwrap_or_default();
            }
            let result = controller.submit_preview().await;
            print_notifications(&mut controller);
            if let Some(open) = controller.preview() {
                println!("{}", render::preview_view(controller.theme(), open));
                if open.media.is_some() {
                    // The temp file is removed when the preview closes.
                    println!("Press Enter to close the preview");
                    let _ = wait_for_enter(&mut BufReader::new(tokio::io::stdin())).await;
                }
            }
            controller.close_preview();
            outcome(result)
        }
        Commands::Info { id } => {
            let id = FileId::parse(&id)?;
            match client.fetch_meta(&id).await {
                Ok(meta) => {
                    print_meta(cli.json, controller.theme(), &meta)?;
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    println!("{} {}", style("✗").red(), escape_text(&e.to_string()));
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Health => match client.health().await {
            Ok(true) => {
                println!("{} {} is up", style("✓").green(), client.base_url());
                ExitCode::SUCCESS
            }
            Ok(false) => {
                println!("{} {} is unhealthy", style("✗").red(), client.base_url());
                ExitCode::FAILURE
            }
            Err(e) => {
                println!("{} {}", style("✗").red(), escape_text(&e.to_string()));
                ExitCode::FAILURE
            }
        },
        Commands::Theme => {
            controller.toggle_theme();
            print_notifications(&mut controller);
            ExitCode::SUCCESS
        }
        Commands::Shell => {
            shell::run(&mut controller).await?;
            ExitCode::SUCCESS
        }
    };

    Ok(code)
}

fn print_meta(
    json: bool,
    theme: fileorcha_cli::preferences::Theme,
    meta: &FileMeta,
) -> anyhow::Result<()> {
    if json {
        print_json(meta)
    } else {
        println!("{}", render::meta_view(theme, meta));
        Ok(())
    }
}
