//! Batch transcoding of a directory of images.
//!
//! Lists the files in a source directory whose names match a shell-style
//! pattern, runs each through decode, a [`Transform`] pipeline and encode,
//! and writes `<stem>.<extension>` into a destination directory.
//!
//! ## Failure Model
//!
//! Job-level problems (unknown output extension, unreadable source
//! directory, destination that cannot be created) are returned as
//! [`BatchError`] before any file is touched. Everything that goes wrong
//! with a single file is recorded in the [`BatchReport`] as a
//! [`BatchFailure`] with a [`FailureKind`], and the run continues.
//!
//! ```text
//! img/a.png  ──read──decode──transform──encode──write──► out/a.jpg   ✓
//! img/b.png  ──read──decode ✗ (Decode)                                ✗
//! ```
//!
//! Two matched files with the same stem (`a.PNG`, `a.png`) would write the
//! same output; the later one in lexical order fails with
//! [`FailureKind::OutputCollision`].
//!
//! ## Parallel Processing
//!
//! Files are processed in parallel using [rayon](https://docs.rs/rayon). The
//! file list is sorted first; outcomes are collected in that order and
//! folded into the report on the calling thread, so the report is identical
//! regardless of thread count. Progress events go out over an optional
//! `mpsc` channel as each file finishes, in completion order.

use crate::imaging::{
    BackendError, ImagingBackend, OutputFormat, Quality, RustBackend, fit_within, resize_to,
};
use crate::naming::{matches_pattern, output_file_name};
use crate::palette::posterize;
use crate::raster::{PixelMode, RasterBuffer, RasterError};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported output format: {0:?}")]
    UnsupportedFormat(String),
}

/// Caller-supplied pixel transformation.
pub type TransformFn = Arc<dyn Fn(&RasterBuffer) -> Result<RasterBuffer, RasterError> + Send + Sync>;

/// One stage of a [`Transform`].
#[derive(Clone)]
pub enum TransformStep {
    /// Convert to another pixel mode through the backend.
    ConvertMode(PixelMode),
    /// Resize to exact dimensions through the backend.
    Resize { width: u32, height: u32 },
    /// Downscale so the longer edge is at most `max_edge` (never upscales).
    Fit { max_edge: u32 },
    /// Keep the top `bits` bits of every color sample.
    Posterize { bits: u8 },
    Custom(TransformFn),
}

impl fmt::Debug for TransformStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformStep::ConvertMode(mode) => f.debug_tuple("ConvertMode").field(mode).finish(),
            TransformStep::Resize { width, height } => f
                .debug_struct("Resize")
                .field("width", width)
                .field("height", height)
                .finish(),
            TransformStep::Fit { max_edge } => {
                f.debug_struct("Fit").field("max_edge", max_edge).finish()
            }
            TransformStep::Posterize { bits } => {
                f.debug_struct("Posterize").field("bits", bits).finish()
            }
            TransformStep::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Ordered list of steps applied to every decoded image.
#[derive(Debug, Clone, Default)]
pub struct Transform {
    steps: Vec<TransformStep>,
}

impl Transform {
    /// The identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step.
    pub fn then(mut self, step: TransformStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }

    pub fn apply(
        &self,
        backend: &impl ImagingBackend,
        image: RasterBuffer,
    ) -> Result<RasterBuffer, BackendError> {
        self.steps.iter().try_fold(image, |img, step| match step {
            TransformStep::ConvertMode(mode) if img.mode() == *mode => Ok(img),
            TransformStep::ConvertMode(mode) => backend.convert_mode(&img, *mode),
            TransformStep::Resize { width, height } => resize_to(backend, &img, (*width, *height)),
            TransformStep::Fit { max_edge } => fit_within(backend, &img, *max_edge),
            TransformStep::Posterize { bits } => Ok(posterize(&img, *bits)?),
            TransformStep::Custom(f) => Ok(f(&img)?),
        })
    }
}

/// One batch invocation.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub source_dir: PathBuf,
    /// Shell-style pattern matched against file names, e.g. `*.png`.
    pub pattern: String,
    pub dest_dir: PathBuf,
    pub transform: Transform,
    /// Output extension without the dot; also selects the encoder.
    pub extension: String,
    pub quality: Quality,
}

impl BatchJob {
    /// PNG sources to JPEG at quality 80, no transform.
    pub fn new(source_dir: impl Into<PathBuf>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            pattern: "*.png".to_string(),
            dest_dir: dest_dir.into(),
            transform: Transform::new(),
            extension: "jpg".to_string(),
            quality: Quality::new(80),
        }
    }
}

/// Which stage a file failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Read,
    Decode,
    Transform,
    Encode,
    Write,
    /// Another matched file earlier in lexical order maps to the same output.
    OutputCollision,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Read => "read",
            FailureKind::Decode => "decode",
            FailureKind::Transform => "transform",
            FailureKind::Encode => "encode",
            FailureKind::Write => "write",
            FailureKind::OutputCollision => "output collision",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of a whole run. `total == succeeded + failed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<BatchFailure>,
    /// Written files, in source order.
    pub outputs: Vec<PathBuf>,
}

/// Progress events emitted while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Started {
        total: usize,
    },
    Converted {
        source: PathBuf,
        output: PathBuf,
    },
    Failed {
        source: PathBuf,
        kind: FailureKind,
        message: String,
    },
}

type FileOutcome = Result<PathBuf, (FailureKind, String)>;

/// A source file and where its output goes, or why it has nowhere to go.
enum Planned {
    Convert { source: PathBuf, output: PathBuf },
    Skip { source: PathBuf, kind: FailureKind, message: String },
}

/// Run `job` with the production backend.
pub fn run(job: &BatchJob, progress: Option<Sender<BatchEvent>>) -> Result<BatchReport, BatchError> {
    run_with_backend(&RustBackend::new(), job, progress)
}

/// Run `job` using a specific backend (allows testing with mock).
pub fn run_with_backend(
    backend: &impl ImagingBackend,
    job: &BatchJob,
    progress: Option<Sender<BatchEvent>>,
) -> Result<BatchReport, BatchError> {
    let extension = job.extension.trim_start_matches('.');
    let format = OutputFormat::from_extension(extension)
        .ok_or_else(|| BatchError::UnsupportedFormat(job.extension.clone()))?;
    let sources = list_sources(&job.source_dir, &job.pattern)?;
    std::fs::create_dir_all(&job.dest_dir)?;

    tracing::debug!(
        source = %job.source_dir.display(),
        pattern = %job.pattern,
        matched = sources.len(),
        %format,
        "starting batch"
    );
    if let Some(tx) = &progress {
        tx.send(BatchEvent::Started {
            total: sources.len(),
        })
        .ok();
    }

    let plan = plan_outputs(sources, &job.dest_dir, extension);

    let outcomes: Vec<(PathBuf, FileOutcome)> = plan
        .into_par_iter()
        .map_with(progress, |tx, planned| {
            let (source, outcome) = match planned {
                Planned::Convert { source, output } => {
                    let outcome = process_file(backend, job, format, &source, &output);
                    (source, outcome)
                }
                Planned::Skip {
                    source,
                    kind,
                    message,
                } => (source, Err((kind, message))),
            };
            match &outcome {
                Ok(output) => {
                    tracing::debug!(source = %source.display(), output = %output.display(), "converted");
                }
                Err((kind, message)) => {
                    tracing::warn!(source = %source.display(), %kind, "{message}");
                }
            }
            if let Some(tx) = tx {
                let event = match &outcome {
                    Ok(output) => BatchEvent::Converted {
                        source: source.clone(),
                        output: output.clone(),
                    },
                    Err((kind, message)) => BatchEvent::Failed {
                        source: source.clone(),
                        kind: *kind,
                        message: message.clone(),
                    },
                };
                tx.send(event).ok();
            }
            (source, outcome)
        })
        .collect();

    Ok(summarize(outcomes))
}

/// Regular files directly inside `dir` whose names match `pattern`, in
/// lexical order. Symlinks are not followed.
///
/// `dir` itself must be a directory; a missing path or a plain file is an
/// error rather than an empty listing.
pub fn list_sources(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, BatchError> {
    if !std::fs::metadata(dir)?.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotADirectory,
            format!("{} is not a directory", dir.display()),
        )
        .into());
    }
    let mut sources = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            tracing::debug!(path = %entry.path().display(), "skipping non-UTF-8 file name");
            continue;
        };
        if matches_pattern(pattern, name) {
            sources.push(entry.into_path());
        }
    }
    Ok(sources)
}

/// Assign output paths in source order. A file whose output path was
/// already claimed by an earlier file is planned as a collision.
fn plan_outputs(sources: Vec<PathBuf>, dest_dir: &Path, extension: &str) -> Vec<Planned> {
    let mut claimed: HashSet<PathBuf> = HashSet::new();
    sources
        .into_iter()
        .map(|source| match output_file_name(&source, extension) {
            None => Planned::Skip {
                message: format!("no file stem in {}", source.display()),
                kind: FailureKind::Write,
                source,
            },
            Some(name) => {
                let output = dest_dir.join(name);
                if claimed.insert(output.clone()) {
                    Planned::Convert { source, output }
                } else {
                    Planned::Skip {
                        message: format!("{} is produced by an earlier file", output.display()),
                        kind: FailureKind::OutputCollision,
                        source,
                    }
                }
            }
        })
        .collect()
}

fn process_file(
    backend: &impl ImagingBackend,
    job: &BatchJob,
    format: OutputFormat,
    source: &Path,
    output: &Path,
) -> FileOutcome {
    let bytes = std::fs::read(source).map_err(|e| (FailureKind::Read, e.to_string()))?;
    let image = backend
        .decode(&bytes)
        .map_err(|e| (FailureKind::Decode, e.to_string()))?;
    let image = job
        .transform
        .apply(backend, image)
        .map_err(|e| (FailureKind::Transform, e.to_string()))?;
    let encoded = backend
        .encode(&image, format, job.quality)
        .map_err(|e| (FailureKind::Encode, e.to_string()))?;
    let partial = partial_path(output);
    let written = std::fs::write(&partial, encoded).and_then(|()| std::fs::rename(&partial, output));
    if let Err(e) = written {
        std::fs::remove_file(&partial).ok();
        return Err((FailureKind::Write, e.to_string()));
    }
    Ok(output.to_path_buf())
}

/// Hidden sibling of `output` that receives the bytes before the rename.
fn partial_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!(".{name}.part"))
}

fn summarize(outcomes: Vec<(PathBuf, FileOutcome)>) -> BatchReport {
    let mut report = BatchReport {
        total: outcomes.len(),
        ..Default::default()
    };
    for (source, outcome) in outcomes {
        match outcome {
            Ok(output) => {
                report.succeeded += 1;
                report.outputs.push(output);
            }
            Err((kind, message)) => {
                report.failed += 1;
                report.failures.push(BatchFailure {
                    path: source,
                    kind,
                    message,
                });
            }
        }
    }
    report
}
