use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use drawsteps::{PaperSize, PlanConfig, StepPlan, StepPlanGenerator};

#[derive(Parser, Debug)]
#[command(name = "drawsteps", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a step plan and print a summary.
    Plan(PlanArgs),
    /// Write the edge mask and tone classification of an image as PNGs.
    Analyze(AnalyzeArgs),
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// Input image (PNG, JPEG, ...).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Optional JSON tuning file; flags below override its paper and density.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Paper size: a4, a3 or square.
    #[arg(long)]
    paper: Option<PaperSize>,

    /// Grid cells per axis (4-16).
    #[arg(long)]
    density: Option<u32>,

    /// Skip shading steps.
    #[arg(long, default_value_t = false)]
    no_shading: bool,

    /// Print the summary as JSON instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Parser, Debug)]
struct AnalyzeArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Output directory for `edges.png` and `tones.png`.
    #[arg(long)]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Plan(args) => cmd_plan(args),
        Command::Analyze(args) => cmd_analyze(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PlanConfig> {
    Ok(match path {
        Some(p) => PlanConfig::from_path(p)?,
        None => PlanConfig::default(),
    })
}

fn read_image(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(args.common.config.as_deref())?;
    if let Some(paper) = args.paper {
        cfg.paper_size = paper;
    }
    if let Some(density) = args.density {
        cfg.grid_density = density;
    }
    if args.no_shading {
        cfg.include_shading = false;
    }

    let bytes = read_image(&args.common.in_path)?;
    let plan = StepPlanGenerator::new(cfg)?.generate(&bytes)?;

    if args.json {
        let summary = PlanSummary::from_plan(&plan);
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("serialize plan summary")?
        );
    } else {
        print!("{}", plan.dump());
    }
    Ok(())
}

#[derive(serde::Serialize)]
struct PlanSummary<'a> {
    paper_size: PaperSize,
    grid_density: u32,
    contours: usize,
    tone_zones: usize,
    marker_anchor: [f64; 2],
    tone_summary: drawsteps::ToneSummary,
    fingerprint: String,
    steps: Vec<StepSummary<'a>>,
}

#[derive(serde::Serialize)]
struct StepSummary<'a> {
    index: usize,
    phase: drawsteps::Phase,
    title: &'a str,
    instruction: &'a str,
    new: usize,
    total_before: usize,
    marker: bool,
    tone_band: Option<drawsteps::ToneBand>,
}

impl<'a> PlanSummary<'a> {
    fn from_plan(plan: &'a StepPlan) -> Self {
        let grid = plan.grid();
        let anchor = plan.marker_anchor();
        let (hi, lo) = plan.fingerprint();
        Self {
            paper_size: grid.paper_size,
            grid_density: grid.density,
            contours: plan.contours().len(),
            tone_zones: plan.tones().zones().len(),
            marker_anchor: [anchor.x, anchor.y],
            tone_summary: plan.tone_summary(),
            fingerprint: format!("{hi:016x}{lo:016x}"),
            steps: plan
                .steps()
                .iter()
                .map(|s| StepSummary {
                    index: s.step_index,
                    phase: s.phase,
                    title: &s.title,
                    instruction: &s.instruction,
                    new: s.incremental.len(),
                    total_before: s.cumulative.len(),
                    marker: s.marker,
                    tone_band: s.tone_band,
                })
                .collect(),
        }
    }
}

fn cmd_analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.common.config.as_deref())?;
    cfg.validate()?;
    let bytes = read_image(&args.common.in_path)?;

    let prepared = drawsteps::preprocess_bytes(&bytes, &cfg.preprocess)?;
    let tones = drawsteps::classify_tones(&prepared.gray, &cfg.tone);
    let analysis = drawsteps::analyze_prepared(&prepared, &cfg)?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;
    write_gray(&args.out_dir.join("edges.png"), prepared.edges.as_image())?;
    write_gray(&args.out_dir.join("tones.png"), &tones)?;

    eprintln!(
        "{}x{} working image, edge density {:.4}, {} contours, {} tone zones",
        prepared.width(),
        prepared.height(),
        prepared.edges.density(),
        analysis.contours.len(),
        analysis.tones.zones().len()
    );
    eprintln!("wrote {}", args.out_dir.display());
    Ok(())
}

fn write_gray(path: &Path, img: &image::GrayImage) -> anyhow::Result<()> {
    image::save_buffer_with_format(
        path,
        img.as_raw(),
        img.width(),
        img.height(),
        image::ColorType::L8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}
