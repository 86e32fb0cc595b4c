//! The request pipeline
//!
//! read → plan → resolve → rasterize → compose (parallel) → assemble → report

use crate::assemble::assemble;
use crate::compose::{ComposedSide, PreviewSettings, SheetCompositor, sheet_size};
use crate::options::BookletOptions;
use crate::plan::{ImpositionPlan, SheetSide, plan};
use crate::raster::{PageRasterizer, default_rasterizer};
use crate::report::{BookletRequest, BookletResponse, report};
use crate::source::{self, SourceDocument};
use crate::transform::TransformResolver;
use crate::types::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Everything produced by a successful request
#[derive(Debug, Clone)]
pub struct BookletOutcome {
    pub result_path: PathBuf,
    /// Directory holding this request's preview images
    pub preview_dir: PathBuf,
    pub plan: ImpositionPlan,
    pub response: BookletResponse,
}

/// Create a booklet using the best available rasterizer
pub async fn create_booklet(
    request: &BookletRequest,
    options: &BookletOptions,
) -> Result<BookletOutcome> {
    let rasterizer = tokio::task::spawn_blocking(default_rasterizer).await?;
    create_booklet_with(request, options, rasterizer).await
}

/// Serve a request and always produce a response
pub async fn respond(request: &BookletRequest, options: &BookletOptions) -> BookletResponse {
    match create_booklet(request, options).await {
        Ok(outcome) => outcome.response,
        Err(e) => {
            log::error!("Booklet creation failed: {}", e);
            BookletResponse::from_error(&e)
        }
    }
}

/// Create a booklet, rendering previews with `rasterizer`
pub async fn create_booklet_with(
    request: &BookletRequest,
    options: &BookletOptions,
    rasterizer: Arc<dyn PageRasterizer>,
) -> Result<BookletOutcome> {
    request.validate()?;
    options.validate()?;

    match prune_previews(&options.preview_dir, options.preview_retention).await {
        Ok(0) => {}
        Ok(removed) => log::debug!("Removed {} old preview directories", removed),
        Err(e) => log::warn!("Could not prune {}: {}", options.preview_dir.display(), e),
    }

    log::info!(
        "Creating booklet {} -> {}",
        request.input_path.display(),
        request.output_path.display()
    );

    let source = Arc::new(source::open(&request.input_path).await?);
    let plan = plan(source.page_count(), options.padded)?;
    plan.verify()?;
    log::info!(
        "Planned {} pages on {} sheets ({} blank slots)",
        source.page_count(),
        plan.sheet_count(),
        plan.blank_count()
    );

    let preview_dir = options.preview_dir.join(uuid::Uuid::new_v4().to_string());
    match render_and_write(request, options, rasterizer, source, &plan, &preview_dir).await {
        Ok((result_path, response)) => {
            log::info!("{}", response.message);
            Ok(BookletOutcome {
                result_path,
                preview_dir,
                plan,
                response,
            })
        }
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_dir_all(&preview_dir).await {
                log::debug!("Could not remove {}: {}", preview_dir.display(), cleanup);
            }
            Err(e)
        }
    }
}

async fn render_and_write(
    request: &BookletRequest,
    options: &BookletOptions,
    rasterizer: Arc<dyn PageRasterizer>,
    source: Arc<SourceDocument>,
    plan: &ImpositionPlan,
    preview_dir: &Path,
) -> Result<(PathBuf, BookletResponse)> {
    tokio::fs::create_dir_all(preview_dir)
        .await
        .map_err(|source| BookletError::PathNotWritable {
            path: preview_dir.to_path_buf(),
            source,
        })?;

    let max_dimension = options.preview_max_dimension;
    let images = {
        let source = source.clone();
        log::debug!("Rasterizing with {}", rasterizer.name());
        tokio::task::spawn_blocking(move || rasterizer.rasterize(&source, max_dimension)).await??
    };

    let compositor = Arc::new(SheetCompositor {
        sheet: sheet_size(&source, options),
        resolver: TransformResolver::new(request.flags(), options.rotate_rule),
        auto_orient: options.auto_orient,
        pages: source.pages.clone(),
        images,
        preview: PreviewSettings {
            max_dimension,
            quality: options.preview_quality,
            dir: preview_dir.to_path_buf(),
        },
    });

    let sides: Arc<[ComposedSide]> =
        compose_all(compositor, &plan.sides, options.worker_count()).await?.into();

    let result_path = assemble(source, sides.clone(), request.output_path.clone()).await?;
    let response = report(&result_path, &sides);
    Ok((result_path, response))
}

/// Remove earlier request directories under `preview_root`, keeping the
/// `keep` most recently modified. Only uuid-named directories are touched.
pub async fn prune_previews(preview_root: &Path, keep: usize) -> Result<usize> {
    let mut entries = match tokio::fs::read_dir(preview_root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut requests = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let is_request = entry
            .file_name()
            .to_str()
            .is_some_and(|name| uuid::Uuid::parse_str(name).is_ok());
        if !is_request {
            continue;
        }
        let metadata = entry.metadata().await?;
        if metadata.is_dir() {
            requests.push((metadata.modified()?, entry.path()));
        }
    }

    requests.sort_by(|a, b| b.0.cmp(&a.0));
    let mut removed = 0;
    for (_, path) in requests.into_iter().skip(keep) {
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => removed += 1,
            Err(e) => log::warn!("Could not remove {}: {}", path.display(), e),
        }
    }
    Ok(removed)
}

/// Compose every face with at most `workers` in flight, returning them in
/// printer order regardless of completion order.
pub async fn compose_all(
    compositor: Arc<SheetCompositor>,
    sides: &[SheetSide],
    workers: usize,
) -> Result<Vec<ComposedSide>> {
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = JoinSet::new();
    for side in sides.iter().copied() {
        tasks.spawn(compose_side(compositor.clone(), semaphore.clone(), side));
    }

    // After the first failure, queued faces stop at the closed semaphore and
    // faces already in a blocking task are waited for, so no preview write
    // outlives this call.
    let mut composed = Vec::with_capacity(sides.len());
    let mut failure = None;
    while let Some(joined) = tasks.join_next().await {
        match joined.map_err(BookletError::from).and_then(|side| side) {
            Ok(side) => composed.push(side),
            Err(e) if failure.is_none() => {
                semaphore.close();
                failure = Some(e);
            }
            Err(e) => log::debug!("Discarding later composition error: {}", e),
        }
    }
    if let Some(e) = failure {
        return Err(e);
    }

    composed.sort_by_key(|c| c.side.order_key());
    Ok(composed)
}

async fn compose_side(
    compositor: Arc<SheetCompositor>,
    semaphore: Arc<Semaphore>,
    side: SheetSide,
) -> Result<ComposedSide> {
    let _permit = semaphore
        .acquire_owned()
        .await
        .map_err(|e| BookletError::Render {
            page_number: side.page_number,
            message: e.to_string(),
        })?;
    tokio::task::spawn_blocking(move || compositor.compose(&side)).await?
}
