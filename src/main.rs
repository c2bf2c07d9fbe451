//! Factory Layout CLI
//!
//! Usage:
//!   factory-layout [OPTIONS] [PROJECT]
//!
//! Options:
//!   -t, --time-limit <S>     Solver time limit in seconds
//!   -w, --workers <N>        Parallel search workers
//!       --scale <K>          Fixed-point factor for lengths
//!   -o, --output <FILE>      Write the placement JSON to a file
//!       --svg <FILE>         Write a floor plan
//!   -s, --stylesheet <FILE>  Floor-plan palette (TOML format)
//!       --audit              Re-check the placement for overlaps
//!   -r, --rules              Show the rule reference
//!   -v, --verbose            More logging (repeatable)
//!   -h, --help               Print help

use std::fs;
use std::path::PathBuf;
use clap::Parser;

use factory_layout::layout::audit;
use factory_layout::layout::config::capped_duration;
use factory_layout::{place, render_floor_plan, PlaceError, PlacerConfig, Project, Stylesheet, SvgConfig};

#[derive(Parser)]
#[command(name = "factory-layout")]
#[command(about = "Rule-driven equipment placement for rectangular rooms")]
struct Cli {
    /// Project file (.json or .toml)
    project: Option<PathBuf>,

    /// Solver time limit in seconds (overrides solver_options.time_limit_sec)
    #[arg(short, long)]
    time_limit: Option<f64>,

    /// Parallel search workers (overrides solver_options.workers)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Fixed-point factor applied to every length
    #[arg(long)]
    scale: Option<i64>,

    /// Write the placement JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write an SVG floor plan of the placement
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Floor-plan palette (TOML format)
    #[arg(short, long)]
    stylesheet: Option<PathBuf>,

    /// Re-check the placement for overlaps and wall violations
    #[arg(long)]
    audit: bool,

    /// Show the rule reference
    #[arg(short, long)]
    rules: bool,

    /// More logging (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if cli.rules {
        print_rules();
        return;
    }

    let Some(path) = &cli.project else {
        print_intro();
        return;
    };

    let project = match Project::from_file(path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error loading project '{}': {}", path.display(), e);
            std::process::exit(1);
        }
    };

    let stylesheet = match &cli.stylesheet {
        Some(path) => match Stylesheet::from_file(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error loading stylesheet '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Stylesheet::default(),
    };

    let mut config = PlacerConfig::new();
    if let Some(secs) = cli.time_limit {
        if secs.is_nan() || secs <= 0.0 {
            eprintln!("Error: --time-limit must be a positive number of seconds");
            std::process::exit(1);
        }
        config = config.with_time_limit(capped_duration(secs));
    }
    if let Some(workers) = cli.workers {
        config = config.with_workers(workers);
    }
    if let Some(scale) = cli.scale {
        config = config.with_scale(scale);
    }

    let report = match place(&project, &config) {
        Ok(report) => report,
        Err(e) => {
            report_failure(&e);
            std::process::exit(1);
        }
    };

    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
    eprintln!(
        "{} in {:.2}s (objective {})",
        report.status,
        report.elapsed.as_secs_f64(),
        report.objective
    );

    let json = match report.solution.to_json_pretty() {
        Ok(json) => json,
        Err(e) => {
            eprintln!("Error serializing placement: {}", e);
            std::process::exit(1);
        }
    };
    match &cli.output {
        Some(out) => {
            if let Err(e) = fs::write(out, json) {
                eprintln!("Error writing '{}': {}", out.display(), e);
                std::process::exit(1);
            }
        }
        None => println!("{}", json),
    }

    if let Some(svg_path) = &cli.svg {
        let svg = render_floor_plan(&project, &report.solution, &SvgConfig::default(), &stylesheet);
        if let Err(e) = fs::write(svg_path, svg) {
            eprintln!("Error writing '{}': {}", svg_path.display(), e);
            std::process::exit(1);
        }
    }

    if cli.audit {
        let findings = audit::check(&project, &report.solution);
        if findings.is_empty() {
            eprintln!("audit: no defects");
        }
        for finding in &findings {
            eprintln!("audit: {}", finding);
        }
        if !findings.is_empty() {
            std::process::exit(2);
        }
    }
}

fn report_failure(err: &PlaceError) {
    eprintln!("Error: {}", err);
    for warning in err.warnings() {
        eprintln!("warning: {}", warning);
    }
    if !err.applied_rules().is_empty() {
        eprintln!("Applied rules:");
        for rule in err.applied_rules() {
            eprintln!("  {}", rule);
        }
    }
}

fn print_intro() {
    println!(
        r#"Factory Layout - rule-driven equipment placement

USAGE:
    factory-layout [OPTIONS] <PROJECT>

OPTIONS:
    -t, --time-limit   Solver time limit in seconds
    -w, --workers      Parallel search workers
    --scale            Fixed-point factor for lengths (default 1000)
    -o, --output       Write the placement JSON to a file
    --svg              Write an SVG floor plan
    -s, --stylesheet   Floor-plan palette (TOML file)
    --audit            Re-check the placement
    -r, --rules        Show the rule reference
    -v, --verbose      More logging
    -h, --help         Print help

QUICK START:
    factory-layout plant.json --svg plant.svg

Prints a map of item id to {{x, y, rotation_deg}} on success.
Run --rules for the rule reference."#
    );
}

fn print_rules() {
    println!(
        r#"FACTORY LAYOUT RULES
====================

Every rule is {{ "type": ..., "target"?, "target1"?, "target2"?, "params": {{ ... }}, "comment"? }}.
Item references match an id first, then a display name. Targets may also be
given inside params. Lengths are in the project's units.

ZONES
-----
AVOID_ZONE       params.area [x1, y1, x2, y2]
                 No item's clearance box intersects the area.
PLACE_IN_ZONE    target, params.area [x1, y1, x2, y2]   (alias PRODUCTION_ZONE)
                 The target's clearance box lies inside the area.
CORRIDOR         params.from [x, y], params.to [x, y], params.width, params.soft?
                 Keeps the swept rectangle clear; soft corridors may be
                 blocked at a penalty.

POSITION
--------
ATTACH_TO_WALL   target, params.side Xmin|Xmax|Ymin|Ymax, params.distance?
PLACE_AT         target, params.position [x, y], params.rotation_deg?
ORIENTATION      target, params.rotation_deg

RELATIONS
---------
ALIGN            target1, target2, params.axis X|Y
PLACE_AFTER      target, params.anchor, params.direction X|Y (default Y),
                 params.distance?, params.alignment center|none
MIN_DISTANCE     target1, target2, params.distance
PARALLEL_LINE    target1, target2, params.offset?, params.axis? (default X)
SERVICE_ZONE     target, params.margin
COMPACT_GROUP    params.members [id, ...]

Rules that name unknown items or carry malformed parameters are skipped
with a warning; the rest still apply."#
    );
}
