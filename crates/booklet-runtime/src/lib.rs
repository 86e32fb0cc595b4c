use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// Re-export types from the engine crate
pub use booklet_impose::{BookletOptions, BookletRequest, BookletResponse, BookletStatistics};

/// Commands sent from UI to worker
#[derive(Debug)]
pub enum BookletCommand {
    Create { request: BookletRequest },
    CalculateStats { input_path: PathBuf },
    /// Replace the worker's options with ones loaded from a JSON file
    LoadOptions { path: PathBuf },
}

/// Updates sent from worker to UI
#[derive(Debug, Clone)]
pub enum BookletUpdate {
    Progress { operation: String },
    /// Terminal response for a `Create` command, successful or not
    Created { response: BookletResponse },
    StatsCalculated { stats: BookletStatistics },
    OptionsLoaded { options: BookletOptions },
    Error { message: String },
}

/// Channels and task of a running worker
pub struct WorkerHandle {
    pub commands: mpsc::UnboundedSender<BookletCommand>,
    pub updates: mpsc::UnboundedReceiver<BookletUpdate>,
    pub task: JoinHandle<()>,
}

/// Spawn a worker on the current tokio runtime
pub fn spawn_worker(options: BookletOptions) -> WorkerHandle {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(worker_task(command_rx, update_tx, options));
    WorkerHandle {
        commands: command_tx,
        updates: update_rx,
        task,
    }
}

/// Async worker task that processes booklet commands and sends updates.
///
/// Commands are handled one at a time, in order; the task ends when every
/// command sender has been dropped.
pub async fn worker_task(
    mut command_rx: mpsc::UnboundedReceiver<BookletCommand>,
    update_tx: mpsc::UnboundedSender<BookletUpdate>,
    mut options: BookletOptions,
) {
    while let Some(cmd) = command_rx.recv().await {
        process_command(cmd, &mut options, &update_tx).await;
    }
    log::debug!("Booklet worker stopped");
}

async fn process_command(
    cmd: BookletCommand,
    options: &mut BookletOptions,
    update_tx: &mpsc::UnboundedSender<BookletUpdate>,
) {
    match cmd {
        BookletCommand::Create { request } => {
            send(
                update_tx,
                BookletUpdate::Progress {
                    operation: format!("Creating booklet from {}", request.input_path.display()),
                },
            );
            let response = booklet_impose::respond(&request, options).await;
            send(update_tx, BookletUpdate::Created { response });
        }
        BookletCommand::CalculateStats { input_path } => {
            send(
                update_tx,
                BookletUpdate::Progress {
                    operation: "Calculating statistics".to_string(),
                },
            );
            match booklet_impose::document_statistics(&input_path, options.padded).await {
                Ok(stats) => send(update_tx, BookletUpdate::StatsCalculated { stats }),
                Err(e) => send(
                    update_tx,
                    BookletUpdate::Error {
                        message: format!("Failed to calculate statistics: {}", e),
                    },
                ),
            }
        }
        BookletCommand::LoadOptions { path } => match BookletOptions::load(&path).await {
            Ok(loaded) => {
                *options = loaded.clone();
                send(update_tx, BookletUpdate::OptionsLoaded { options: loaded });
            }
            Err(e) => send(
                update_tx,
                BookletUpdate::Error {
                    message: format!("Failed to load options: {}", e),
                },
            ),
        },
    }
}

fn send(update_tx: &mpsc::UnboundedSender<BookletUpdate>, update: BookletUpdate) {
    if update_tx.send(update).is_err() {
        log::debug!("Update receiver dropped");
    }
}
