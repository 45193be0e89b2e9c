use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSetBuilder};
use image::{DynamicImage, ImageReader};
use print_sheet_core::caption::CaptionFont;
use print_sheet_core::density::{DensityOutcome, read_density, stamp_density_in_place};
use print_sheet_core::sizes::{IdPhotoSize, PagePreset, PhysicalSize};
use print_sheet_core::{
    FitMode, LayoutConfig, PlacementRequest, PrintItem, ResampleFilter, SheetBuilder,
    plan_layout, resize_photo,
};
use serde::Deserialize;
use tracing::{error, info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "print-sheet",
    about = "Lay out photo prints on a page and prepare print-ready JPEGs",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress false or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build one print sheet from a YAML job file
    Sheet(SheetArgs),
    /// Resize photos to a physical print size
    Resize(ResizeArgs),
    /// Write a DPI into the JFIF header of existing JPEG files
    Stamp(StampArgs),
    /// Print the JFIF density of JPEG files
    Inspect(InspectArgs),
}

#[derive(Parser, Debug, Clone)]
struct SheetArgs {
    // Input/Output
    /// Job file (YAML)
    #[arg(help_heading = "Input/Output")]
    job: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Sheet base name (written as name.jpg)
    #[arg(short, long, default_value = "sheet", help_heading = "Input/Output")]
    name: String,

    // Page (flags override the job file)
    /// Page preset: a4 | short | long
    #[arg(long, help_heading = "Page")]
    page: Option<String>,
    /// Top margin in pixels
    #[arg(long, help_heading = "Page")]
    margin: Option<u32>,
    /// Print density
    #[arg(long, help_heading = "Page")]
    dpi: Option<u16>,
    /// JPEG quality (1..=100)
    #[arg(long, help_heading = "Page")]
    quality: Option<u8>,
    /// Caption font (TTF/OTF); a system bold sans is used when omitted
    #[arg(long, help_heading = "Page")]
    font: Option<PathBuf>,
    /// Composite photos in parallel (requires core feature `parallel`)
    #[arg(long, default_value_t = false, help_heading = "Page")]
    parallel: bool,

    // Export
    /// Write the layout (placements, unfit copies, stats) as JSON to this file
    #[arg(long, help_heading = "Export")]
    export_layout: Option<PathBuf>,
    /// Fail when any copy did not fit on the page
    #[arg(long, default_value_t = false, help_heading = "Export")]
    strict: bool,
    /// Print the merged configuration (after job file/flags) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute the layout and report unfit copies without rendering
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct ResizeArgs {
    /// Input file or directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "resized", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,
    /// Print size: cute | wallet | 3r | 4r | 5r | 8r | a4 | short | long | WxH (inches)
    #[arg(long, default_value = "4r", help_heading = "Output")]
    size: String,
    /// Fit mode: cover (crop to fill) | contain (fit with border)
    #[arg(long, default_value = "cover", help_heading = "Output")]
    fit: String,
    /// Print density
    #[arg(long, default_value_t = 300, help_heading = "Output")]
    dpi: u16,
    /// JPEG quality (1..=100)
    #[arg(long, default_value_t = 95, help_heading = "Output")]
    quality: u8,
    /// Resampling filter: nearest | triangle | catmullrom | gaussian | lanczos3
    #[arg(long, default_value = "lanczos3", help_heading = "Output")]
    filter: String,
}

#[derive(Parser, Debug, Clone)]
struct StampArgs {
    /// JPEG files to update in place
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Density to declare (dots per inch)
    #[arg(long, default_value_t = 300)]
    dpi: u16,
}

#[derive(Parser, Debug, Clone)]
struct InspectArgs {
    /// JPEG files
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Sheet(args) => run_sheet(args),
        Commands::Resize(args) => run_resize(args, cli.progress && !cli.quiet),
        Commands::Stamp(args) => run_stamp(args),
        Commands::Inspect(args) => run_inspect(args),
    }
}

/// Page as written in a job file: a preset name or explicit pixels.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum PageSpec {
    Preset(String),
    Pixels { width: u32, height: u32 },
}

#[derive(Debug, Deserialize)]
struct JobRequest {
    image: PathBuf,
    /// ID photo size code (`2x2`, `passport`, `1.5x1.5`, `1x1`)
    size: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    #[serde(default = "default_copies")]
    copies: u32,
    caption: Option<String>,
}

fn default_copies() -> u32 {
    1
}

#[derive(Debug, Deserialize, Default)]
struct JobFile {
    page: Option<PageSpec>,
    margin: Option<u32>,
    dpi: Option<u16>,
    jpeg_quality: Option<u8>,
    border_width: Option<u32>,
    filter: Option<String>,
    font: Option<PathBuf>,
    #[serde(default)]
    requests: Vec<JobRequest>,
}

impl JobFile {
    fn load(path: &Path) -> anyhow::Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("read job {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parse job {}", path.display()))
    }

    /// Job values first, then command-line overrides.
    fn layout_config(&self, args: &SheetArgs) -> anyhow::Result<LayoutConfig> {
        let mut cfg = LayoutConfig::default();
        if let Some(v) = args.dpi.or(self.dpi) {
            cfg.dpi = v;
        }
        let page = args
            .page
            .clone()
            .map(PageSpec::Preset)
            .or_else(|| self.page.clone());
        match page {
            Some(PageSpec::Preset(name)) => {
                let preset: PagePreset = name
                    .parse()
                    .map_err(|_| anyhow::anyhow!("unknown page preset: {}", name))?;
                (cfg.page_width, cfg.page_height) = preset.pixel_size(cfg.dpi);
            }
            Some(PageSpec::Pixels { width, height }) => {
                cfg.page_width = width;
                cfg.page_height = height;
            }
            None => {
                (cfg.page_width, cfg.page_height) = PagePreset::A4.pixel_size(cfg.dpi);
            }
        }
        if let Some(v) = args.margin.or(self.margin) {
            cfg.margin = v;
        }
        if let Some(v) = args.quality.or(self.jpeg_quality) {
            cfg.jpeg_quality = v;
        }
        if let Some(v) = self.border_width {
            cfg.border_width = v;
        }
        if let Some(v) = &self.filter {
            cfg.filter = parse_filter(v)?;
        }
        cfg.parallel = args.parallel;
        cfg.validate()?;
        Ok(cfg)
    }
}

fn request_size(req: &JobRequest) -> anyhow::Result<(u32, u32)> {
    match (&req.size, req.width, req.height) {
        (Some(code), _, _) => {
            let s = IdPhotoSize::from_code(code)
                .ok_or_else(|| anyhow::anyhow!("unknown photo size: {}", code))?;
            Ok((s.width, s.height))
        }
        (None, Some(w), Some(h)) => Ok((w, h)),
        _ => anyhow::bail!(
            "request for {} needs `size` or both `width` and `height`",
            req.image.display()
        ),
    }
}

fn run_sheet(args: &SheetArgs) -> anyhow::Result<()> {
    let job = JobFile::load(&args.job)?;
    let cfg = job.layout_config(args)?;

    if args.print_config {
        match args.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    let base = args.job.parent().unwrap_or_else(|| Path::new("."));
    let mut sizes = Vec::with_capacity(job.requests.len());
    for req in &job.requests {
        let (w, h) = request_size(req)?;
        sizes.push(print_sheet_core::LayoutRequest::new(w, h, req.copies));
    }

    if args.dry_run {
        let layout = plan_layout(&sizes, &cfg)?;
        let stats = layout.stats();
        println!("{}", stats.summary());
        if let Some(path) = &args.export_layout {
            let json = serde_json::to_string_pretty(&print_sheet_core::to_json(&layout))?;
            fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        }
        return strict_check(args.strict, layout.unfit_count());
    }

    let mut requests = Vec::with_capacity(job.requests.len());
    for (req, size) in job.requests.iter().zip(&sizes) {
        let path = base.join(&req.image);
        let image = load_image(&path).with_context(|| format!("load {}", path.display()))?;
        let mut item = PrintItem::new(image, size.width, size.height);
        if let Some(text) = &req.caption {
            item = item.with_caption(text.clone());
        }
        requests.push(PlacementRequest::new(item, req.copies));
    }

    let mut builder = SheetBuilder::new(cfg);
    let font_path = args.font.clone().or_else(|| job.font.as_ref().map(|p| base.join(p)));
    let font = match font_path {
        Some(p) => Some(
            CaptionFont::from_path(&p).with_context(|| format!("load font {}", p.display()))?,
        ),
        None => CaptionFont::discover(),
    };
    match font {
        Some(f) => builder = builder.with_font(f),
        None if requests.iter().any(|r| r.item.caption_enabled) => {
            warn!("no caption font found; captions will be blank bands (use --font)")
        }
        None => {}
    }

    let start = Instant::now();
    let out = builder.build_page(&requests)?;
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create out_dir {}", args.out_dir.display()))?;
    let jpg_path = args.out_dir.join(format!("{}.jpg", args.name));
    fs::write(&jpg_path, &out.jpeg).with_context(|| format!("write {}", jpg_path.display()))?;
    info!(
        ?jpg_path,
        placed = out.layout.placements.len(),
        unfit = out.unfit_count(),
        ms = start.elapsed().as_millis() as u64,
        "sheet written"
    );

    if let Some(path) = &args.export_layout {
        let json = serde_json::to_string_pretty(&print_sheet_core::to_json(&out.layout))?;
        fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        info!(?path, "layout exported");
    }

    for u in &out.layout.unfit {
        let image = &job.requests[u.request].image;
        warn!(
            image = %image.display(),
            copy = u.copy + 1,
            w = u.width,
            h = u.height,
            "did not fit"
        );
    }
    println!("{}", out.stats().summary());
    strict_check(args.strict, out.unfit_count())
}

fn strict_check(strict: bool, unfit: usize) -> anyhow::Result<()> {
    if strict && unfit > 0 {
        anyhow::bail!("{} cop{} did not fit on the page", unfit, if unfit == 1 { "y" } else { "ies" });
    }
    Ok(())
}

fn parse_filter(s: &str) -> anyhow::Result<ResampleFilter> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown resampling filter: {}", s))
}

fn parse_print_size(s: &str) -> anyhow::Result<PhysicalSize> {
    if let Some(size) = PhysicalSize::from_code(s) {
        return Ok(size);
    }
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow::anyhow!("unknown print size: {}", s))?;
    let w: f64 = w.trim().parse().with_context(|| format!("print size width in {s}"))?;
    let h: f64 = h.trim().parse().with_context(|| format!("print size height in {s}"))?;
    if w <= 0.0 || h <= 0.0 {
        anyhow::bail!("print size must be positive: {}", s);
    }
    Ok(PhysicalSize::new(w.min(h), w.max(h)))
}

fn run_resize(args: &ResizeArgs, show_progress: bool) -> anyhow::Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};

    let size = parse_print_size(&args.size)?;
    let mode: FitMode = args
        .fit
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown fit mode: {}", args.fit))?;
    let cfg = LayoutConfig::builder()
        .dpi(args.dpi)
        .jpeg_quality(args.quality)
        .filter(parse_filter(&args.filter)?)
        .build();
    cfg.validate()?;

    let paths = gather_paths(&args.input, &args.include, &args.exclude)?;
    if paths.is_empty() {
        anyhow::bail!("no images found under {}", args.input.display());
    }
    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create out_dir {}", args.out_dir.display()))?;

    let bar = if show_progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} resizing {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };

    let mut written = 0usize;
    for p in &paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        match resize_one(p, &size, mode, &cfg, &args.out_dir) {
            Ok(out_path) => {
                written += 1;
                info!(?out_path, "resized");
            }
            Err(e) => {
                error!(?p, error = %e, "skip image");
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    info!(written, total = paths.len(), size = size.label, "resize finished");
    Ok(())
}

fn resize_one(
    path: &Path,
    size: &PhysicalSize,
    mode: FitMode,
    cfg: &LayoutConfig,
    out_dir: &Path,
) -> anyhow::Result<PathBuf> {
    let image = load_image(path)?;
    let out = resize_photo(&image, size, mode, cfg)?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("photo");
    let out_path = out_dir.join(format!("{}_{}.jpg", stem, size.code));
    fs::write(&out_path, &out.jpeg).with_context(|| format!("write {}", out_path.display()))?;
    Ok(out_path)
}

fn run_stamp(args: &StampArgs) -> anyhow::Result<()> {
    if args.dpi == 0 {
        anyhow::bail!("--dpi must be non-zero");
    }
    for path in &args.files {
        let mut bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        match stamp_density_in_place(&mut bytes, args.dpi) {
            DensityOutcome::Stamped => {
                fs::write(path, &bytes).with_context(|| format!("write {}", path.display()))?;
                info!(?path, dpi = args.dpi, "stamped");
            }
            DensityOutcome::NotJpeg => warn!(?path, "not a JPEG file; skipped"),
            DensityOutcome::MissingJfif => warn!(?path, "no JFIF header; left unchanged"),
        }
    }
    Ok(())
}

fn run_inspect(args: &InspectArgs) -> anyhow::Result<()> {
    for path in &args.files {
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        match read_density(&bytes) {
            Some(d) => println!("{}: {:?} {}x{}", path.display(), d.unit, d.x, d.y),
            None => println!("{}: no JFIF density", path.display()),
        }
    }
    Ok(())
}

fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<Vec<PathBuf>> {
    let inc_set = build_globset(include)?;
    let exc_set = build_globset(exclude)?;
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else {
        for entry in WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    }
    Ok(list)
}

fn build_globset(patterns: &[String]) -> anyhow::Result<Option<globset::GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut b = GlobSetBuilder::new();
    for pat in patterns {
        b.add(Glob::new(pat)?);
    }
    Ok(Some(b.build()?))
}

fn should_skip(
    p: &Path,
    include: Option<&globset::GlobSet>,
    exclude: Option<&globset::GlobSet>,
) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if let Some(ex) = exclude {
        if ex.is_match(&s) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(&s) {
            return true;
        }
    }
    false
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "bmp" | "gif" | "webp")
    )
}

fn load_image(p: &Path) -> anyhow::Result<DynamicImage> {
    let img = ImageReader::open(p)?.with_guessed_format()?.decode()?;
    Ok(img)
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}
