use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use flipbook_core::{
    FlipbookConfig, OutputFormat, OutputTarget, build_flipbook, generate_flipbook,
    load_frame_sequence, load_frames, plan_pages, plan_to_json, prepare_frames, template_frames,
};
use image::RgbaImage;
use serde::Deserialize;
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "flipbook",
    about = "Turn an animated image into printable flip-book pages",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --progress=false or --quiet)
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
    /// (1) Scale and crop every frame to the flip-book frame ratio
    Prepare(FlipArgs),
    /// (2) Add glue margin, cut margin and frame numbers to prepared frames
    Template(FlipArgs),
    /// (3) Tile templated frames onto print pages and export them
    Generate(FlipArgs),
    /// Run prepare, template and generate in one go
    Run(FlipArgs),
    /// Print the pagination plan (JSON) without rendering anything
    Plan(PlanArgs),
}

#[derive(Parser, Debug, Clone)]
struct FlipArgs {
    // Input/Output
    /// Animated GIF/APNG, still image, or directory of frame images
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Base name of the output files (default: input file stem)
    #[arg(short, long, help_heading = "Input/Output")]
    name: Option<String>,
    /// YAML config file path
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,

    // Layout
    /// Width of one templated frame (margins included)
    #[arg(long, help_heading = "Layout")]
    page_width: Option<u32>,
    /// Height of one templated frame (margins included)
    #[arg(long, help_heading = "Layout")]
    page_height: Option<u32>,
    /// Glue (binding) margin on the left of each frame
    #[arg(long, help_heading = "Layout")]
    glue_margin: Option<u32>,
    /// Cut margin around each frame
    #[arg(long, help_heading = "Layout")]
    cut_margin: Option<u32>,
    /// Frames per print page, vertically
    #[arg(long, help_heading = "Layout")]
    rows: Option<u32>,
    /// Frames per print page, horizontally
    #[arg(long, help_heading = "Layout")]
    cols: Option<u32>,
    /// Factor the print page is grown by before export
    #[arg(long, help_heading = "Layout")]
    print_margin: Option<f64>,

    // Numbering
    /// TTF/OTF font for frame numbers (default: built-in digits)
    #[arg(long, help_heading = "Numbering")]
    font: Option<PathBuf>,
    /// Pixel height of frame numbers
    #[arg(long, help_heading = "Numbering")]
    number_size: Option<f32>,

    // Export
    /// Page format: jpeg | png
    #[arg(long, help_heading = "Export")]
    format: Option<String>,
    /// JPEG quality (1..=100)
    #[arg(long, help_heading = "Export")]
    quality: Option<u8>,
    /// Also write <name>-fbook.json describing the pages (generate/run)
    #[arg(long, default_value_t = false, help_heading = "Export")]
    manifest: bool,
    /// Print the merged configuration (after YAML/CLI) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: compute and render but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct PlanArgs {
    /// Input to count frames from (ignored when --frames is given)
    input: Option<PathBuf>,
    /// Number of frames
    #[arg(long)]
    frames: Option<usize>,
    /// YAML config file path
    #[arg(long)]
    config: Option<PathBuf>,
    /// Frames per print page, vertically
    #[arg(long)]
    rows: Option<u32>,
    /// Frames per print page, horizontally
    #[arg(long)]
    cols: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Prepare,
    Template,
    Generate,
    Run,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    let progress = cli.progress && !cli.quiet;
    match &cli.command {
        Commands::Prepare(args) => run_step(Step::Prepare, args, progress),
        Commands::Template(args) => run_step(Step::Template, args, progress),
        Commands::Generate(args) => run_step(Step::Generate, args, progress),
        Commands::Run(args) => run_step(Step::Run, args, progress),
        Commands::Plan(args) => run_plan(args),
    }
}

fn run_step(step: Step, cli: &FlipArgs, show_progress: bool) -> anyhow::Result<()> {
    let cfg = merged_config(cli)?;
    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }
    cfg.validate()?;

    let frames = load_input(&cli.input, show_progress)?;
    info!(
        count = frames.len(),
        per_page = cfg.grid_capacity(),
        "loaded frames"
    );

    if !cli.dry_run {
        fs::create_dir_all(&cli.out_dir)
            .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
    }
    let name = base_name(cli);

    match step {
        Step::Prepare => {
            let prepared = prepare_frames(&frames, &cfg)?;
            write_frames(&prepared, &cli.out_dir, cli.dry_run, show_progress)?;
        }
        Step::Template => {
            let templated = template_frames(&frames, &cfg)?;
            write_frames(&templated, &cli.out_dir, cli.dry_run, show_progress)?;
        }
        Step::Generate | Step::Run => {
            let target = OutputTarget::new(&cli.out_dir, &name);
            let out = if step == Step::Run {
                build_flipbook(&frames, &cfg, &target, cli.dry_run)?
            } else {
                generate_flipbook(&frames, &cfg, &target, cli.dry_run)?
            };
            info!(stats = %out.plan.stats().summary(), "pagination");
            if out.files.is_empty() {
                warn!("no frames, no pages written");
            }
            if cli.manifest && !cli.dry_run {
                let names: Vec<String> = out
                    .files
                    .iter()
                    .filter_map(|p| p.file_name().map(|s| s.to_string_lossy().into_owned()))
                    .collect();
                let json_path = cli.out_dir.join(format!("{}-fbook.json", name));
                let json = serde_json::to_string_pretty(&plan_to_json(&out.plan, &names))?;
                fs::write(&json_path, json)
                    .with_context(|| format!("write {}", json_path.display()))?;
                info!(?json_path, pages = out.files.len(), "manifest written");
            }
            if !cli.dry_run && !out.files.is_empty() {
                println!(
                    "Finished! You will find the flip-book images in {}",
                    cli.out_dir.display()
                );
            }
        }
    }
    Ok(())
}

fn run_plan(args: &PlanArgs) -> anyhow::Result<()> {
    let mut cfg = match &args.config {
        Some(path) => load_yaml(path)?.into_flipbook_config(FlipbookConfig::default()),
        None => FlipbookConfig::default(),
    };
    if let Some(v) = args.rows {
        cfg.grid_rows = v;
    }
    if let Some(v) = args.cols {
        cfg.grid_cols = v;
    }
    let frame_count = match (args.frames, &args.input) {
        (Some(n), _) => n,
        (None, Some(input)) => load_input(input, false)?.len(),
        (None, None) => anyhow::bail!("plan needs either --frames or an input"),
    };
    let plan = plan_pages(frame_count, cfg.grid_rows, cfg.grid_cols)?;
    println!("{}", serde_json::to_string_pretty(&plan_to_json(&plan, &[]))?);
    Ok(())
}

fn merged_config(cli: &FlipArgs) -> anyhow::Result<FlipbookConfig> {
    // defaults < YAML file < explicit flags
    let mut cfg = match &cli.config {
        Some(path) => load_yaml(path)?.into_flipbook_config(FlipbookConfig::default()),
        None => FlipbookConfig::default(),
    };
    if let Some(v) = cli.page_width {
        cfg.page_width = v;
    }
    if let Some(v) = cli.page_height {
        cfg.page_height = v;
    }
    if let Some(v) = cli.glue_margin {
        cfg.glue_margin = v;
    }
    if let Some(v) = cli.cut_margin {
        cfg.cut_margin = v;
    }
    if let Some(v) = cli.rows {
        cfg.grid_rows = v;
    }
    if let Some(v) = cli.cols {
        cfg.grid_cols = v;
    }
    if let Some(v) = cli.print_margin {
        cfg.print_margin_factor = v;
    }
    if let Some(v) = &cli.font {
        cfg.number_font = Some(v.clone());
    }
    if let Some(v) = cli.number_size {
        cfg.number_size = v;
    }
    if let Some(v) = &cli.format {
        cfg.output_format = parse_output_format(v)?;
    }
    if let Some(v) = cli.quality {
        cfg.jpeg_quality = v;
    }
    Ok(cfg)
}

fn load_yaml(path: &Path) -> anyhow::Result<YamlConfig> {
    let file =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let y: YamlConfig = serde_yaml::from_str(&file)?;
    Ok(y)
}

fn base_name(cli: &FlipArgs) -> String {
    if let Some(n) = &cli.name {
        return n.clone();
    }
    cli.input
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "flipbook".to_string())
}

fn load_input(path: &Path, progress: bool) -> anyhow::Result<Vec<RgbaImage>> {
    if path.is_dir() {
        let paths = gather_paths(path)?;
        if paths.is_empty() {
            anyhow::bail!("no frame images found in {}", path.display());
        }
        load_sequence_with_progress(&paths, progress)
    } else {
        load_frames(path).with_context(|| format!("decode {}", path.display()))
    }
}

fn gather_paths(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut list: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(path)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let p = entry.path();
        if p.is_file() && is_image(p) {
            list.push(p.to_path_buf());
        }
    }
    Ok(list)
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "bmp" | "tga" | "gif")
    )
}

fn progress_bar(len: usize, verb: &str) -> anyhow::Result<indicatif::ProgressBar> {
    use indicatif::{ProgressBar, ProgressStyle};
    let b = ProgressBar::new(len as u64);
    b.set_style(ProgressStyle::with_template(&format!(
        "{{spinner:.green}} {verb} {{pos}}/{{len}} [{{elapsed_precise}}] {{wide_msg}}"
    ))?);
    Ok(b)
}

fn load_sequence_with_progress(
    paths: &[PathBuf],
    progress: bool,
) -> anyhow::Result<Vec<RgbaImage>> {
    let bar = if progress {
        Some(progress_bar(paths.len(), "loading")?)
    } else {
        None
    };
    let mut frames = Vec::with_capacity(paths.len());
    for p in paths {
        if let Some(b) = &bar {
            let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
            b.set_message(msg.to_string());
        }
        let mut one = load_frame_sequence(std::slice::from_ref(p))
            .with_context(|| format!("decode {}", p.display()))?;
        frames.append(&mut one);
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(frames)
}

/// Writes `frame_0000.png`, `frame_0001.png`, ... so the next step can read the
/// directory back in order.
fn write_frames(
    frames: &[RgbaImage],
    out_dir: &Path,
    dry_run: bool,
    progress: bool,
) -> anyhow::Result<()> {
    if dry_run {
        info!(count = frames.len(), "dry run: frames not written");
        return Ok(());
    }
    let bar = if progress {
        Some(progress_bar(frames.len(), "writing")?)
    } else {
        None
    };
    for (i, frame) in frames.iter().enumerate() {
        let path = out_dir.join(frame_file_name(i));
        frame
            .save(&path)
            .with_context(|| format!("write {}", path.display()))?;
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    info!(count = frames.len(), dir = %out_dir.display(), "frames written");
    Ok(())
}

fn frame_file_name(index: usize) -> String {
    format!("frame_{:04}.png", index)
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

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    page_width: Option<u32>,
    page_height: Option<u32>,
    glue_margin: Option<u32>,
    cut_margin: Option<u32>,
    grid_rows: Option<u32>,
    grid_cols: Option<u32>,
    print_margin_factor: Option<f64>,
    glue_color: Option<[u8; 4]>,
    cut_color: Option<[u8; 4]>,
    number_color: Option<[u8; 4]>,
    number_size: Option<f32>,
    number_offset: Option<(u32, u32)>,
    number_font: Option<PathBuf>,
    page_background: Option<[u8; 4]>,
    output_format: Option<String>,
    jpeg_quality: Option<u8>,
}

impl YamlConfig {
    fn into_flipbook_config(self, mut cfg: FlipbookConfig) -> FlipbookConfig {
        if let Some(v) = self.page_width {
            cfg.page_width = v;
        }
        if let Some(v) = self.page_height {
            cfg.page_height = v;
        }
        if let Some(v) = self.glue_margin {
            cfg.glue_margin = v;
        }
        if let Some(v) = self.cut_margin {
            cfg.cut_margin = v;
        }
        if let Some(v) = self.grid_rows {
            cfg.grid_rows = v;
        }
        if let Some(v) = self.grid_cols {
            cfg.grid_cols = v;
        }
        if let Some(v) = self.print_margin_factor {
            cfg.print_margin_factor = v;
        }
        if let Some(v) = self.glue_color {
            cfg.glue_color = v;
        }
        if let Some(v) = self.cut_color {
            cfg.cut_color = v;
        }
        if let Some(v) = self.number_color {
            cfg.number_color = v;
        }
        if let Some(v) = self.number_size {
            cfg.number_size = v;
        }
        if let Some(v) = self.number_offset {
            cfg.number_offset = v;
        }
        if let Some(v) = self.number_font {
            cfg.number_font = Some(v);
        }
        if let Some(v) = self.page_background {
            cfg.page_background = v;
        }
        if let Some(v) = self.output_format {
            match v.parse() {
                Ok(fmt) => cfg.output_format = fmt,
                Err(()) => warn!(value = %v, "unknown output_format in config; keeping default"),
            }
        }
        if let Some(v) = self.jpeg_quality {
            cfg.jpeg_quality = v;
        }
        cfg
    }
}

fn parse_output_format(s: &str) -> anyhow::Result<OutputFormat> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown output format: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_overrides_only_given_fields() {
        let y: YamlConfig = serde_yaml::from_str("grid_rows: 4\noutput_format: png\n").unwrap();
        let cfg = y.into_flipbook_config(FlipbookConfig::default());
        assert_eq!(cfg.grid_rows, 4);
        assert_eq!(cfg.grid_cols, 2);
        assert_eq!(cfg.output_format, OutputFormat::Png);
        assert_eq!(cfg.page_width, 900);
    }

    #[test]
    fn flags_override_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("cfg.yaml");
        fs::write(&yaml, "grid_cols: 5\ncut_margin: 2\n").unwrap();
        let cli = Cli::parse_from([
            "flipbook",
            "generate",
            "in.gif",
            "--config",
            yaml.to_str().unwrap(),
            "--cols",
            "3",
        ]);
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        let cfg = merged_config(&args).unwrap();
        assert_eq!(cfg.grid_cols, 3);
        assert_eq!(cfg.cut_margin, 2);
        assert_eq!(base_name(&args), "in");
    }

    #[test]
    fn frame_files_sort_in_sequence_order() {
        let mut names: Vec<String> = [10, 2, 0, 1].iter().map(|&i| frame_file_name(i)).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["frame_0000.png", "frame_0001.png", "frame_0002.png", "frame_0010.png"]
        );
    }
}
