//! Interactive shell.
//!
//! Reads one command per line from stdin. Transfers run on spawned tasks and
//! report back over a channel, so the prompt stays usable while an upload or
//! download is in progress. Only the controller mutates state.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use console::style;
use fileorcha_api_client::{ProgressCallback, Transfer};
use fileorcha_core::format::guess_content_type;
use fileorcha_core::validation::normalize_slug;
use fileorcha_core::{
    DownloadedFile, FileId, FileSource, PreviewMetadata, TransferError, UploadResult,
};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::controller::request::RequestToken;
use crate::controller::section::{Accelerator, Section};
use crate::controller::{Completion, Controller};
use crate::render;

const PROGRESS_SCALE: u64 = 1000;

/// Read a local file into an upload source, guessing its content type from
/// the name.
pub async fn load_file(path: &Path) -> anyhow::Result<FileSource> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    let content_type = guess_content_type(&name);
    Ok(FileSource::new(name, content_type, Bytes::from(bytes)))
}

/// Block until a line (or end of input) arrives on `reader`.
pub async fn wait_for_enter<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<()> {
    let mut line = String::new();
    reader.read_line(&mut line).await?;
    Ok(())
}

/// Progress bar for an upload, driven by fractions in `[0, 1]`.
pub fn upload_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(PROGRESS_SCALE);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Uploading [{bar:40.cyan/blue}] {percent}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

pub fn progress_callback(pb: &ProgressBar) -> ProgressCallback {
    let pb = pb.clone();
    Arc::new(move |fraction: f64| {
        pb.set_position((fraction.clamp(0.0, 1.0) * PROGRESS_SCALE as f64) as u64);
    })
}

#[derive(Debug, Parser)]
#[command(no_binary_name = true, disable_help_subcommand = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Debug, Subcommand)]
enum ShellCommand {
    /// Select a file to upload and preview it
    File { path: PathBuf },
    /// Number of downloads allowed (1-10)
    Downloads { count: i64 },
    /// Minutes until the file expires (1-10080)
    Expiry { minutes: i64 },
    /// Set the password of the active form; omit to clear it
    Password { value: Option<String> },
    /// Custom short link (lowercase letters, digits, hyphens)
    Slug { value: Option<String> },
    /// Upload the selected file
    Upload,
    /// Set the file ID of the download form
    Id { id: String },
    /// Download the file named in the form
    Download,
    /// Preview the file named in the form (or the uploaded file)
    Preview,
    /// Close the preview
    Close,
    /// Open a share link
    Open { link: String },
    /// Switch to the upload form
    #[command(name = "upload-mode")]
    UploadMode,
    /// Switch to the download form
    #[command(name = "download-mode")]
    DownloadMode,
    /// Start over with a new upload
    Another,
    /// Download the file just uploaded
    Test,
    /// Print the share link
    Link,
    /// Print the file ID
    #[command(name = "copy-id")]
    CopyId,
    /// Save the share link QR code as SVG
    Qr { dir: Option<PathBuf> },
    /// Toggle light/dark theme
    Theme,
    /// Dismiss a notification (the latest when no id is given)
    Dismiss { id: Option<u64> },
    /// Redraw the current screen
    Status,
    /// List commands
    Help,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

/// Split a line the way a POSIX shell would, so `file "my photo.png"` names
/// one path.
fn parse_line(line: &str) -> Result<ShellCommand, clap::Error> {
    let words = shlex::split(line).ok_or_else(|| {
        <ShellLine as CommandFactory>::command()
            .error(ErrorKind::InvalidValue, "unterminated quote in command")
    })?;
    ShellLine::try_parse_from(words).map(|parsed| parsed.command)
}

/// The progress bar of the latest upload. A superseded upload keeps reporting
/// through its callback, so its bar is detached from the terminal.
#[derive(Default)]
struct UploadBar {
    current: Option<(RequestToken, ProgressBar)>,
}

impl UploadBar {
    fn start(&mut self, token: RequestToken, pb: ProgressBar) {
        if let Some((_, old)) = self.current.replace((token, pb)) {
            old.finish_and_clear();
            old.set_draw_target(ProgressDrawTarget::hidden());
        }
    }

    /// Clear the bar if it belongs to `token`. Returns whether it did.
    fn finish(&mut self, token: RequestToken) -> bool {
        match self.current.take() {
            Some((owner, pb)) if owner == token => {
                pb.finish_and_clear();
                true
            }
            other => {
                self.current = other;
                false
            }
        }
    }
}

enum Finished {
    Upload(RequestToken, Result<UploadResult, TransferError>),
    Download(RequestToken, Result<DownloadedFile, TransferError>),
    Preview(RequestToken, FileId, Result<(Bytes, PreviewMetadata), TransferError>),
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct Shell<'a, T: Transfer + ?Sized> {
    controller: &'a mut Controller<T>,
    finished_tx: mpsc::UnboundedSender<Finished>,
    upload_bar: UploadBar,
    expired_shown: bool,
}

/// Run the shell until `quit` or end of input.
pub async fn run<T: Transfer + ?Sized + 'static>(controller: &mut Controller<T>) -> anyhow::Result<()> {
    let (finished_tx, mut finished_rx) = mpsc::unbounded_channel();
    let mut shell = Shell {
        controller,
        finished_tx,
        upload_bar: UploadBar::default(),
        expired_shown: false,
    };
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    println!("{}", render::screen(&*shell.controller));
    println!("{}", style("Type `help` for commands.").dim());
    prompt();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                if shell.handle_line(&line).await == Flow::Quit {
                    break;
                }
                shell.flush_notifications();
                prompt();
            }
            Some(finished) = finished_rx.recv() => {
                shell.apply(finished).await;
                shell.flush_notifications();
                prompt();
            }
            _ = ticker.tick() => {
                shell.controller.notifications_mut().prune(chrono::Utc::now());
                shell.announce_expiry();
            }
        }
    }

    shell.controller.close_preview();
    tracing::debug!("Shell closed");
    Ok(())
}

fn prompt() {
    print!("{} ", style(">").bold());
    let _ = std::io::stdout().flush();
}

impl<T: Transfer + ?Sized + 'static> Shell<'_, T> {
    async fn handle_line(&mut self, line: &str) -> Flow {
        let line = line.trim();
        if line.is_empty() {
            return Flow::Continue;
        }
        if let Some(accelerator) = Accelerator::parse(line) {
            self.controller.accelerator(accelerator);
            self.redraw();
            return Flow::Continue;
        }

        let command = match parse_line(line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e.render());
                return Flow::Continue;
            }
        };
        self.dispatch(command).await
    }

    async fn dispatch(&mut self, command: ShellCommand) -> Flow {
        match command {
            ShellCommand::File { path } => match load_file(&path).await {
                Ok(file) => {
                    self.controller.select_file(file);
                    self.redraw();
                }
                Err(e) => println!("{} {:#}", style("✗").red(), e),
            },
            ShellCommand::Downloads { count } => self.controller.upload_form_mut().downloads = count,
            ShellCommand::Expiry { minutes } => {
                self.controller.upload_form_mut().expiry_minutes = minutes
            }
            ShellCommand::Password { value } => {
                let value = value.unwrap_or_default();
                match self.controller.section() {
                    Section::Download => self.controller.download_form_mut().password = value,
                    _ => self.controller.upload_form_mut().password = value,
                }
            }
            ShellCommand::Slug { value } => {
                let slug = normalize_slug(&value.unwrap_or_default());
                println!("  {} {}", style("Custom link:").dim(), slug);
                self.controller.upload_form_mut().slug = slug;
            }
            ShellCommand::Upload => self.start_upload(),
            ShellCommand::Id { id } => self.controller.download_form_mut().file_id = id,
            ShellCommand::Download => self.start_download(),
            ShellCommand::Preview => self.start_preview(),
            ShellCommand::Close => {
                self.controller.close_preview();
                self.redraw();
            }
            ShellCommand::Open { link } => {
                if self.controller.open_share_link(&link).is_ok() {
                    self.redraw();
                }
            }
            ShellCommand::UploadMode => {
                self.controller.accelerator(Accelerator::UploadMode);
                self.redraw();
            }
            ShellCommand::DownloadMode => {
                self.controller.accelerator(Accelerator::DownloadMode);
                self.redraw();
            }
            ShellCommand::Another => {
                self.controller.upload_another();
                self.redraw();
            }
            ShellCommand::Test => {
                if self.controller.test_download() {
                    self.redraw();
                }
            }
            ShellCommand::Link => match self.controller.copy_link() {
                Some(link) => println!("{}", link),
                None => println!("{} No file uploaded yet", style("!").yellow()),
            },
            ShellCommand::CopyId => match self.controller.copy_id() {
                Some(id) => println!("{}", id),
                None => println!("{} No file uploaded yet", style("!").yellow()),
            },
            ShellCommand::Qr { dir } => {
                let dir = dir.unwrap_or_else(|| self.controller.settings().download_dir.clone());
                let _ = self.controller.save_qr(&dir);
            }
            ShellCommand::Theme => {
                self.controller.toggle_theme();
            }
            ShellCommand::Dismiss { id } => {
                let id = id.or_else(|| self.controller.notifications().latest().map(|n| n.id));
                if let Some(id) = id {
                    self.controller.notifications_mut().dismiss(id);
                }
            }
            ShellCommand::Status => self.redraw(),
            ShellCommand::Help => {
                let mut cmd = ShellLine::command();
                println!("{}", cmd.render_long_help());
                println!("Shortcuts: ctrl-u (upload form), ctrl-d (download form), esc");
            }
            ShellCommand::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    fn start_upload(&mut self) {
        let Ok(pending) = self.controller.begin_upload() else {
            return;
        };
        let pb = upload_progress_bar();
        let callback = progress_callback(&pb);
        self.upload_bar.start(pending.token, pb);

        let transport = self.controller.transport();
        let tx = self.finished_tx.clone();
        tokio::spawn(async move {
            let outcome = transport.upload(&pending.request, Some(callback)).await;
            let _ = tx.send(Finished::Upload(pending.token, outcome));
        });
    }

    fn start_download(&mut self) {
        let Ok(pending) = self.controller.begin_download() else {
            return;
        };
        println!("{} Downloading...", style("→").cyan());
        let transport = self.controller.transport();
        let tx = self.finished_tx.clone();
        tokio::spawn(async move {
            let outcome = transport.download(&pending.query).await;
            let _ = tx.send(Finished::Download(pending.token, outcome));
        });
    }

    fn start_preview(&mut self) {
        let Ok(pending) = self.controller.begin_preview() else {
            return;
        };
        let transport = self.controller.transport();
        let tx = self.finished_tx.clone();
        tokio::spawn(async move {
            let outcome = transport.fetch_preview(&pending.query).await;
            let _ = tx.send(Finished::Preview(pending.token, pending.query.id, outcome));
        });
    }

    async fn apply(&mut self, finished: Finished) {
        match finished {
            Finished::Upload(token, outcome) => {
                self.upload_bar.finish(token);
                if let Ok(Completion::Applied(_)) = self.controller.finish_upload(token, outcome) {
                    self.expired_shown = false;
                    self.redraw();
                }
            }
            Finished::Download(token, outcome) => {
                if let Ok(Completion::Applied(saved)) =
                    self.controller.finish_download(token, outcome).await
                {
                    println!(
                        "{} Saved {}",
                        style("✓").green(),
                        style(saved.path.display()).bold()
                    );
                }
            }
            Finished::Preview(token, id, outcome) => {
                if let Ok(Completion::Applied(())) =
                    self.controller.finish_preview(token, id, outcome)
                {
                    self.redraw();
                }
            }
        }
    }

    /// Print "Expired" once when the countdown on the success screen runs out.
    fn announce_expiry(&mut self) {
        if self.expired_shown || self.controller.section() != Section::Success {
            return;
        }
        let expired = self
            .controller
            .success_view()
            .and_then(|view| view.countdown)
            .is_some_and(|c| c.is_expired());
        if expired {
            self.expired_shown = true;
            println!("\n{} {}", style("Time left:").dim(), style("Expired").red());
            prompt();
        }
    }

    fn flush_notifications(&mut self) {
        for notification in self.controller.notifications_mut().take_unseen() {
            println!("{}", render::notification_line(&notification));
        }
    }

    fn redraw(&self) {
        println!("{}", render::screen(&*self.controller));
    }
}
