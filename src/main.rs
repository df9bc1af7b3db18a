use clap::{Parser, Subcommand};
use rasterkit::batch::{self, BatchJob, Transform, TransformStep};
use rasterkit::imaging::{self, Quality, RustBackend};
use rasterkit::palette::{self, PaletteStrategy, QuantizeOptions};
use rasterkit::raster::parse_color;
use rasterkit::{composite, config, gradient, output};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rasterkit")]
#[command(about = "Raster synthesis, compositing, palette quantization and batch transcoding")]
#[command(long_about = "\
Raster synthesis, compositing, palette quantization and batch transcoding

Every command reads its defaults from config.toml (working directory, or the
file given with --config); flags override the file.

Examples:

  rasterkit gradient --start '#0080ff' --end white -o logo.png
  rasterkit composite background.jpg overlay.png -o combined.png
  rasterkit stack scan-1.png scan-2.png -o combined.png
  rasterkit palette --output-dir out/
  rasterkit quantize photo.jpg --colors 16 --posterize 3 -o photo-16.png
  rasterkit batch img/ --dest img/batch --extension jpg --quality 80

Run 'rasterkit gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./config.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a vertical two-color gradient
    Gradient {
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        /// Top color: #rrggbb, #rgb, r,g,b or a name
        #[arg(long)]
        start: Option<String>,
        /// Bottom color
        #[arg(long)]
        end: Option<String>,
    },
    /// Alpha-composite an overlay onto a background (overlay is resized to fit)
    Composite {
        background: PathBuf,
        overlay: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Stack images top to bottom on one canvas
    Stack {
        #[arg(required = true)]
        images: Vec<PathBuf>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write the synthetic red-ramp palette, a gray ramp, and the ramp quantized
    Palette {
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        #[arg(long, default_value_t = 256)]
        width: u32,
        #[arg(long, default_value_t = 1)]
        height: u32,
    },
    /// Reduce an image to an adaptive (or random) palette
    Quantize {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Maximum palette size (1-256)
        #[arg(long)]
        colors: Option<usize>,
        /// Bits kept per channel before palette selection (1-8)
        #[arg(long)]
        posterize: Option<u8>,
        /// Replace the palette with random colors
        #[arg(long)]
        random: bool,
        /// Seed for --random
        #[arg(long, requires = "random")]
        seed: Option<u64>,
    },
    /// Transcode every matching file in a directory
    Batch {
        source: PathBuf,
        /// Destination directory (default: <source>/batch)
        #[arg(long)]
        dest: Option<PathBuf>,
        #[arg(long)]
        pattern: Option<String>,
        #[arg(long)]
        extension: Option<String>,
        #[arg(long)]
        quality: Option<u32>,
        /// Downscale so the longer edge is at most this many pixels
        #[arg(long)]
        max_edge: Option<u32>,
        /// Write the JSON report to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => config::load_config_file(path)?,
        None => config::load_config(Path::new("."))?,
    };
    let backend = RustBackend::new();

    match cli.command {
        Command::Gradient {
            output,
            width,
            height,
            start,
            end,
        } => {
            let (default_start, default_end) = config.gradient.colors()?;
            let start = start.as_deref().map(parse_color).transpose()?;
            let end = end.as_deref().map(parse_color).transpose()?;
            let image = gradient::gradient(
                width.unwrap_or(config.gradient.width),
                height.unwrap_or(config.gradient.height),
                start.unwrap_or(default_start),
                end.unwrap_or(default_end),
            )?;
            imaging::save_image(&backend, &image, &output, Quality::default())?;
            output::print_image_written("gradient", &output, &image);
        }
        Command::Composite {
            background,
            overlay,
            output,
        } => {
            let background = imaging::load_image(&backend, &background)?;
            let overlay = imaging::load_image(&backend, &overlay)?;
            let image = composite::composite_fitted(&backend, &background, &overlay)?;
            imaging::save_image(&backend, &image, &output, config.batch.quality())?;
            output::print_image_written("composite", &output, &image);
        }
        Command::Stack { images, output } => {
            let images = images
                .iter()
                .map(|path| imaging::load_image(&backend, path))
                .collect::<Result<Vec<_>, _>>()?;
            let image = composite::stack_vertical(&images)?;
            imaging::save_image(&backend, &image, &output, config.batch.quality())?;
            output::print_image_written("stack", &output, &image);
        }
        Command::Palette {
            output_dir,
            width,
            height,
        } => {
            std::fs::create_dir_all(&output_dir)?;
            let palette_image = palette::build_palette_image(width, height)?;
            let path = output_dir.join("palette_image.png");
            imaging::save_indexed(&backend, &palette_image, &path)?;
            output::print_indexed_written("palette", &path, &palette_image);

            let ramp = gradient::gray_ramp(width, height)?;
            let path = output_dir.join("grayscale_image.png");
            imaging::save_image(&backend, &ramp, &path, Quality::default())?;
            output::print_image_written("grayscale", &path, &ramp);

            let applied = palette::quantize(&ramp, &QuantizeOptions::default())?;
            let path = output_dir.join("palette_applied_image.png");
            imaging::save_indexed(&backend, &applied, &path)?;
            output::print_indexed_written("palette applied", &path, &applied);
        }
        Command::Quantize {
            input,
            output,
            colors,
            posterize,
            random,
            seed,
        } => {
            let source = imaging::load_image(&backend, &input)?;
            let options = QuantizeOptions {
                colors: colors.unwrap_or(config.quantize.colors),
                posterize_bits: posterize.or(config.quantize.posterize()),
                palette: if random {
                    PaletteStrategy::Random {
                        seed: seed.or(config.quantize.seed),
                    }
                } else {
                    PaletteStrategy::Adaptive
                },
            };
            let image = palette::quantize(&source, &options)?;
            imaging::save_indexed(&backend, &image, &output)?;
            output::print_indexed_written("quantize", &output, &image);
        }
        Command::Batch {
            source,
            dest,
            pattern,
            extension,
            quality,
            max_edge,
            report,
        } => {
            init_thread_pool(&config.processing);
            let settings = &config.batch;
            let mut transform = Transform::new();
            if let Some(mode) = settings.mode {
                transform = transform.then(TransformStep::ConvertMode(mode));
            }
            let max_edge = max_edge.unwrap_or(settings.max_edge);
            if max_edge > 0 {
                transform = transform.then(TransformStep::Fit { max_edge });
            }
            let job = BatchJob {
                dest_dir: dest.unwrap_or_else(|| source.join("batch")),
                source_dir: source,
                pattern: pattern.unwrap_or_else(|| settings.pattern.clone()),
                transform,
                extension: extension.unwrap_or_else(|| settings.extension.clone()),
                quality: quality.map(Quality::new).unwrap_or(settings.quality()),
            };

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_batch_event(&event);
                }
            });
            let result = batch::run(&job, Some(tx))?;
            printer.join().ok();
            output::print_batch_report(&result);

            if let Some(path) = report {
                let json = serde_json::to_string_pretty(&result)?;
                std::fs::write(&path, json)?;
            }
        }
        Command::GenConfig => {}
    }

    Ok(())
}

/// Install the stderr log subscriber. `--verbose` shows batch diagnostics.
fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. Users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
