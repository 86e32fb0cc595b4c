use anyhow::{Context, Result};
use booklet_impose::{
    BookletError, BookletOptions, BookletRequest, BookletResponse, PaperSize, RotateRule,
    SheetSizePolicy, Slot,
};
use booklet_runtime::{BookletCommand, BookletUpdate, spawn_worker};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Parser)]
#[command(name = "booklet", about = "Saddle-stitch booklet imposition", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Impose a PDF as a 2-up saddle-stitch booklet
    Create {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file (default: <input>_booklet.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Rotate every page 180°
        #[arg(long)]
        rotate_all: bool,

        /// Rotate the slots selected by the rotate rule 180°
        #[arg(long)]
        rotate: bool,

        #[arg(long)]
        flip_horizontal: bool,

        #[arg(long)]
        flip_vertical: bool,

        #[command(flatten)]
        engine: EngineArgs,

        /// Print the JSON response instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Show sheet and padding statistics for a PDF
    Stats {
        input: PathBuf,

        /// Drop sheet faces that would be entirely blank
        #[arg(long)]
        unpadded: bool,
    },

    /// Print the sheet order for a page count without touching any files
    Plan {
        pages: usize,

        #[arg(long)]
        unpadded: bool,
    },

    /// Read one JSON request per stdin line, answer one JSON response per line
    Serve {
        #[command(flatten)]
        engine: EngineArgs,
    },
}

#[derive(clap::Args)]
struct EngineArgs {
    /// JSON options file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output sheet size
    #[arg(long, value_enum)]
    paper: Option<PaperArg>,

    /// Slots affected by --rotate
    #[arg(long, value_enum)]
    rotate_rule: Option<RotateRuleArg>,

    /// Keep landscape pages landscape instead of turning them to fit a half
    #[arg(long)]
    no_auto_orient: bool,

    #[arg(long)]
    unpadded: bool,

    /// Directory for preview images
    #[arg(long)]
    preview_dir: Option<PathBuf>,

    /// Earlier request preview directories to keep
    #[arg(long)]
    preview_retention: Option<usize>,

    /// Concurrent composition workers
    #[arg(long)]
    workers: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PaperArg {
    A3,
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
    /// Two of the largest source pages side by side
    Source,
}

#[derive(Clone, Copy, ValueEnum)]
enum RotateRuleArg {
    BackSide,
    LeftSlots,
}

impl From<PaperArg> for SheetSizePolicy {
    fn from(arg: PaperArg) -> Self {
        match arg {
            PaperArg::A3 => Self::Fixed(PaperSize::A3),
            PaperArg::A4 => Self::Fixed(PaperSize::A4),
            PaperArg::A5 => Self::Fixed(PaperSize::A5),
            PaperArg::Letter => Self::Fixed(PaperSize::Letter),
            PaperArg::Legal => Self::Fixed(PaperSize::Legal),
            PaperArg::Tabloid => Self::Fixed(PaperSize::Tabloid),
            PaperArg::Source => Self::DeriveFromSource,
        }
    }
}

impl From<RotateRuleArg> for RotateRule {
    fn from(arg: RotateRuleArg) -> Self {
        match arg {
            RotateRuleArg::BackSide => Self::BackSide,
            RotateRuleArg::LeftSlots => Self::LeftSlots,
        }
    }
}

impl EngineArgs {
    /// Options from `--config` (or defaults) with flag overrides applied
    async fn options(&self) -> Result<BookletOptions> {
        let mut options = match &self.config {
            Some(path) => BookletOptions::load(path)
                .await
                .with_context(|| format!("loading {}", path.display()))?,
            None => BookletOptions::default(),
        };

        if let Some(paper) = self.paper {
            options.sheet_size = paper.into();
        }
        if let Some(rule) = self.rotate_rule {
            options.rotate_rule = rule.into();
        }
        if self.no_auto_orient {
            options.auto_orient = false;
        }
        if self.unpadded {
            options.padded = false;
        }
        if let Some(dir) = &self.preview_dir {
            options.preview_dir = dir.clone();
        }
        if let Some(keep) = self.preview_retention {
            options.preview_retention = keep;
        }
        if self.workers.is_some() {
            options.workers = self.workers;
        }

        options.validate()?;
        Ok(options)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Create {
            input,
            output,
            rotate_all,
            rotate,
            flip_horizontal,
            flip_vertical,
            engine,
            json,
        } => {
            let options = engine.options().await?;
            let output = output.unwrap_or_else(|| booklet_impose::default_output_path(&input));
            let request = BookletRequest {
                input_path: input,
                output_path: output,
                rotate_all,
                rotate,
                flip_horizontal,
                flip_vertical,
            };

            if json {
                let response = booklet_impose::respond(&request, &options).await;
                println!("{}", serde_json::to_string_pretty(&response)?);
                if !response.is_success() {
                    anyhow::bail!(response.message);
                }
                return Ok(());
            }

            let outcome = booklet_impose::create_booklet(&request, &options).await?;
            println!("{}", outcome.response.message);
            println!("  Sheets: {}", outcome.plan.sheet_count());
            println!("  Blank pages added: {}", outcome.plan.blank_count());
            println!("  Previews: {}", outcome.preview_dir.display());
            for item in &outcome.response.gallery_pages {
                println!(
                    "  {:>3} {}  [{} | {}]",
                    item.page_number,
                    if item.is_back_side { "back " } else { "front" },
                    page_label(item.left_page_num),
                    page_label(item.right_page_num),
                );
            }
        }

        Commands::Stats { input, unpadded } => {
            let stats = booklet_impose::document_statistics(&input, !unpadded).await?;
            println!("Booklet Statistics:");
            println!("  Source pages: {}", stats.source_pages);
            println!("  Padded pages: {}", stats.padded_pages);
            println!("  Blank pages added: {}", stats.blank_pages_added);
            println!("  Sheets: {}", stats.sheets);
            println!("  Sheet sides: {}", stats.sheet_sides);
        }

        Commands::Plan { pages, unpadded } => {
            let plan = booklet_impose::plan(pages, !unpadded)?;
            plan.verify()?;
            println!("sheet  face    left  right");
            for side in &plan.sides {
                println!(
                    "{:>5}  {:<6} {:>5}  {:>5}",
                    side.sheet_index + 1,
                    if side.is_back_side() { "back" } else { "front" },
                    slot_label(side.left),
                    slot_label(side.right),
                );
            }
        }

        Commands::Serve { engine } => serve(engine.options().await?).await?,
    }

    Ok(())
}

fn page_label(page: Option<usize>) -> String {
    page.map_or_else(|| "-".to_string(), |n| n.to_string())
}

fn slot_label(slot: Slot) -> String {
    page_label(slot.page())
}

/// JSON-lines front end over the runtime worker
async fn serve(options: BookletOptions) -> Result<()> {
    let mut worker = spawn_worker(options);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<BookletRequest>(&line) {
            Ok(request) => {
                worker
                    .commands
                    .send(BookletCommand::Create { request })
                    .context("worker stopped")?;
                wait_for_response(&mut worker.updates).await?
            }
            Err(e) => BookletResponse::from_error(&BookletError::InvalidRequest(format!(
                "malformed request: {}",
                e
            ))),
        };

        let mut out = serde_json::to_string(&response)?;
        out.push('\n');
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
    }

    drop(worker.commands);
    worker.task.await?;
    Ok(())
}

async fn wait_for_response(
    updates: &mut tokio::sync::mpsc::UnboundedReceiver<BookletUpdate>,
) -> Result<BookletResponse> {
    while let Some(update) = updates.recv().await {
        match update {
            BookletUpdate::Created { response } => return Ok(response),
            BookletUpdate::Progress { operation } => log::info!("{}", operation),
            BookletUpdate::Error { message } => log::error!("{}", message),
            _ => {}
        }
    }
    anyhow::bail!("worker stopped without responding")
}
