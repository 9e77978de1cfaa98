use std::{
    io::BufRead as _,
    path::{Path, PathBuf},
    sync::mpsc,
    time::{Duration, Instant},
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vidfx::{
    AffineParams, BackendKind, BenchConfig, BenchDriver, Bgr8, BuiltinShaders, CONTROLS_HELP,
    ControlInput, ControlState, DirShaderLoader, FilterKind, FilterParams, Frame, FrameLog,
    FrameSettings, FrameSource, ImageSource, LiveSession, MonotonicClock, Resolution,
    ShaderLoader, StopFlag, SyntheticSource,
};

#[derive(Parser, Debug)]
#[command(name = "vidfx", version)]
struct Cli {
    /// More log output (-v debug, -vv trace). `RUST_LOG` wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Load WGSL programs from this directory instead of the built-in copies.
    #[arg(long, global = true)]
    shaders: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sweep backend x filter x transform x resolution and write a CSV summary.
    Bench(BenchArgs),
    /// Process one image and write the result as PNG.
    Frame(FrameArgs),
    /// Run both backends on one image and report the largest channel difference.
    Compare(CompareArgs),
    /// Interactive loop driven by key names read from stdin.
    Live(LiveArgs),
}

#[derive(Args, Debug)]
struct BenchArgs {
    /// JSON bench config; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resolution to sweep, e.g. 1280x720 (repeatable).
    #[arg(long = "resolution")]
    resolutions: Vec<Resolution>,

    /// Filter to sweep: none, pixelate, keep_color (repeatable).
    #[arg(long = "filter")]
    filters: Vec<FilterKind>,

    /// Backend to sweep: cpu, gpu (repeatable).
    #[arg(long = "backend")]
    backends: Vec<BackendKind>,

    /// Warmup seconds per configuration.
    #[arg(long)]
    warmup: Option<f64>,

    /// Sampling seconds per configuration.
    #[arg(long)]
    sample: Option<f64>,

    /// Replay this image instead of synthetic frames.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Summary CSV path (default: perf_summary_<build>.csv).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Also write the summary as JSON.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Per-frame fps log CSV.
    #[arg(long)]
    frame_log: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct ProcessArgs {
    #[arg(long, default_value = "none")]
    filter: FilterKind,

    /// Pixelate block size.
    #[arg(long, default_value_t = 8, allow_hyphen_values = true)]
    block: i32,

    /// KeepColor reference colour as B,G,R.
    #[arg(long, default_value = "20,20,200", value_parser = parse_bgr)]
    keep_color: Bgr8,

    /// KeepColor distance threshold.
    #[arg(long, default_value_t = 60, allow_hyphen_values = true)]
    threshold: i32,

    /// Enable the affine transform.
    #[arg(long, default_value_t = false)]
    transform: bool,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    tx: f64,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    ty: f64,

    #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
    scale: f64,

    /// Rotation in degrees, counter-clockwise.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    rotate: f64,
}

impl ProcessArgs {
    fn settings(&self) -> FrameSettings {
        FrameSettings {
            filter: self.filter,
            filter_params: FilterParams {
                block_size: self.block,
                keep_color: self.keep_color,
                threshold: self.threshold,
            },
            affine_params: AffineParams {
                translate_x: self.tx,
                translate_y: self.ty,
                scale: self.scale,
                rotation_deg: self.rotate,
            },
            transform_enabled: self.transform,
        }
        .sanitized()
    }
}

#[derive(Args, Debug)]
struct FrameArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value = "cpu")]
    backend: BackendKind,

    #[command(flatten)]
    process: ProcessArgs,
}

#[derive(Args, Debug)]
struct CompareArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Largest accepted per-channel difference.
    #[arg(long, default_value_t = 2)]
    tolerance: u8,

    #[command(flatten)]
    process: ProcessArgs,
}

#[derive(Args, Debug)]
struct LiveArgs {
    /// Replay this image instead of synthetic frames.
    #[arg(long)]
    image: Option<PathBuf>,

    #[arg(long, default_value = "640x480")]
    resolution: Resolution,

    /// Starting backend (default: gpu when built with it).
    #[arg(long)]
    backend: Option<BackendKind>,

    /// Stop after this many ticks.
    #[arg(long)]
    ticks: Option<u64>,

    /// Write the last presented frame here on exit.
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

fn parse_bgr(s: &str) -> Result<Bgr8, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<u8>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("colour '{s}': {e}"))?;
    match parts.as_slice() {
        [b, g, r] => Ok(Bgr8::new(*b, *g, *r)),
        _ => Err(format!("colour '{s}' must be B,G,R")),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let loader: Box<dyn ShaderLoader> = match &cli.shaders {
        Some(dir) => Box::new(DirShaderLoader::new(dir)),
        None => Box::new(BuiltinShaders),
    };
    match cli.cmd {
        Command::Bench(args) => cmd_bench(args, loader.as_ref()),
        Command::Frame(args) => cmd_frame(args, loader.as_ref()),
        Command::Compare(args) => cmd_compare(args, loader.as_ref()),
        Command::Live(args) => cmd_live(args, loader),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Raise `stop` when the operator types `q` on stdin. EOF is not a stop request.
fn spawn_stop_reader(stop: StopFlag) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().eq_ignore_ascii_case("q") {
                tracing::info!("stop requested, writing completed configurations");
                stop.raise();
                break;
            }
        }
    });
}

fn cmd_bench(args: BenchArgs, loader: &dyn ShaderLoader) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => BenchConfig::from_json_file(path)
            .with_context(|| format!("load bench config '{}'", path.display()))?,
        None => BenchConfig::default(),
    };
    if !args.resolutions.is_empty() {
        config.resolutions = args.resolutions;
    }
    if !args.filters.is_empty() {
        config.filters = args.filters;
    }
    if !args.backends.is_empty() {
        config.backends = args.backends;
    }
    if let Some(w) = args.warmup {
        config.warmup_secs = w;
    }
    if let Some(s) = args.sample {
        config.sample_secs = s;
    }

    let mut source: Box<dyn FrameSource> = match &args.image {
        Some(path) => Box::new(ImageSource::open(path)?),
        None => Box::new(SyntheticSource::new(config.seed)),
    };

    let stop = StopFlag::new();
    spawn_stop_reader(stop.clone());
    eprintln!("type q + enter to stop early");

    let mut driver = BenchDriver::new(config, MonotonicClock::new(), stop)?;
    if let Some(path) = &args.frame_log {
        driver = driver.with_frame_log(
            FrameLog::create(path)
                .with_context(|| format!("create frame log '{}'", path.display()))?,
        );
    }
    let results = driver.run(source.as_mut(), &mut |kind| {
        vidfx::create_backend(kind, loader)
    })?;

    let out = args
        .out
        .unwrap_or_else(|| vidfx::default_report_path(vidfx::build_label()));
    create_parent(&out)?;
    vidfx::write_csv_file(&out, &results)
        .with_context(|| format!("write summary '{}'", out.display()))?;
    if let Some(json) = &args.json {
        create_parent(json)?;
        vidfx::write_json_file(json, &results)
            .with_context(|| format!("write summary '{}'", json.display()))?;
    }

    println!("==== Summary ====");
    for r in &results {
        println!("{}", r.summary_line());
    }
    eprintln!("wrote {}", out.display());
    Ok(())
}

fn load_frame(path: &Path) -> anyhow::Result<Frame> {
    let mut source = ImageSource::open(path)?;
    let resolution = source.native_resolution();
    source
        .next_frame(resolution)
        .with_context(|| format!("decode '{}'", path.display()))
}

fn process(
    kind: BackendKind,
    loader: &dyn ShaderLoader,
    frame: &Frame,
    settings: &FrameSettings,
) -> anyhow::Result<Frame> {
    let mut backend = vidfx::create_backend(kind, loader)?;
    backend.resize(frame.resolution())?;
    let t0 = Instant::now();
    backend.render(frame, settings)?;
    tracing::info!(backend = %kind, elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0, "frame processed");
    Ok(backend.readback()?)
}

fn cmd_frame(args: FrameArgs, loader: &dyn ShaderLoader) -> anyhow::Result<()> {
    let frame = load_frame(&args.in_path)?;
    let out = process(args.backend, loader, &frame, &args.process.settings())?;
    write_png(&args.out, &out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_compare(args: CompareArgs, loader: &dyn ShaderLoader) -> anyhow::Result<()> {
    let frame = load_frame(&args.in_path)?;
    let settings = args.process.settings();
    let cpu = process(BackendKind::Cpu, loader, &frame, &settings)?;
    let gpu = process(BackendKind::Gpu, loader, &frame, &settings)?;
    let diff = cpu.max_channel_diff(&gpu)?;
    println!("max channel difference: {diff}");
    if diff > args.tolerance {
        anyhow::bail!("backends differ by {diff} levels (tolerance {})", args.tolerance);
    }
    Ok(())
}

fn cmd_live(args: LiveArgs, loader: Box<dyn ShaderLoader>) -> anyhow::Result<()> {
    let mut source: Box<dyn FrameSource> = match &args.image {
        Some(path) => Box::new(ImageSource::open(path)?),
        None => Box::new(SyntheticSource::default()),
    };
    let mut state = ControlState::default();
    if let Some(b) = args.backend {
        state.backend = b;
    }
    let factory = Box::new(move |kind| vidfx::create_backend(kind, loader.as_ref()));
    let mut session = LiveSession::new(state, args.resolution, MonotonicClock::new(), factory)?;

    let (tx, rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    eprintln!("{CONTROLS_HELP}");

    let mut last_title = Instant::now();
    let mut ticks = 0u64;
    loop {
        for line in rx.try_iter() {
            match ControlInput::from_key(&line) {
                Some(input) => {
                    if let Err(e) = session.handle(input) {
                        tracing::warn!(error = %e, "input ignored");
                    }
                }
                None => tracing::warn!(key = %line.trim(), "unknown key"),
            }
        }
        if session.state().quit {
            break;
        }

        let report = session.tick(source.as_mut())?;
        ticks += 1;
        if last_title.elapsed() >= Duration::from_secs(1) {
            eprintln!("{}", report.title());
            last_title = Instant::now();
        }
        if args.ticks.is_some_and(|n| ticks >= n) {
            eprintln!("{}", report.title());
            break;
        }
    }

    if let Some(path) = &args.snapshot {
        let frame = session.last_output()?;
        write_png(path, &frame)?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn create_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn write_png(path: &Path, frame: &Frame) -> anyhow::Result<()> {
    create_parent(path)?;
    let rgb = frame.to_rgb_image()?;
    image::save_buffer_with_format(
        path,
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}
