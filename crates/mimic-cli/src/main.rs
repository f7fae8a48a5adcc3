//! mimic CLI - inspect projection targets and replay drawing sessions

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mimic_draw::{DrawSettings, DrawingSession, ReplaySource, StrokeRecorder};
use mimic_math::Point3;
use mimic_project::{PoseFrame, Target, TargetSettings};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mimic")]
#[command(about = "Anchored surface projection for drawing on 3D models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display information about a target
    Info {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Project one point onto a target
    Project {
        #[command(flatten)]
        target: TargetArgs,
        /// Point in the target's frame, as x,y,z
        #[arg(value_parser = parse_point, allow_hyphen_values = true)]
        point: Point3,
        /// Projection to run
        #[arg(short, long, value_enum, default_value_t = Method::Smooth)]
        method: Method,
    },
    /// Replay recorded frames and write the strokes they draw as JSON
    Replay {
        /// Drawing settings (.toml)
        #[arg(short, long)]
        config: PathBuf,
        /// Recorded frames (.json)
        frames: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct TargetArgs {
    /// Base name of the target's files
    name: String,
    /// Directory holding the target's files
    #[arg(short, long, default_value = "assets")]
    assets: PathBuf,
    /// Also load the inner offset surface
    #[arg(long)]
    inner: bool,
}

impl TargetArgs {
    fn settings(&self) -> TargetSettings {
        TargetSettings {
            load_inner_offset: self.inner,
            ..TargetSettings::new(&self.name, &self.assets)
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Method {
    /// Exact closest point
    Closest,
    /// Smooth projection, falling back to the closest point
    Smooth,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { target } => {
            show_info(&target.settings())?;
        }
        Commands::Project {
            target,
            point,
            method,
        } => {
            project_point(&target.settings(), &point, method)?;
        }
        Commands::Replay {
            config,
            frames,
            output,
        } => {
            replay(&config, &frames, output.as_deref())?;
        }
    }

    Ok(())
}

fn parse_point(s: &str) -> std::result::Result<Point3, String> {
    let coords = s
        .split(',')
        .map(|c| c.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid coordinate: {e}"))?;
    match coords.as_slice() {
        &[x, y, z] => Ok(Point3::new(x, y, z)),
        _ => Err(format!("expected x,y,z but got {} values", coords.len())),
    }
}

fn show_info(settings: &TargetSettings) -> Result<()> {
    let target = Target::load(settings)
        .with_context(|| format!("loading target {}", settings.name))?;

    let surface = target.surface();
    println!("target: {}", target.name());
    println!("  Vertices: {}", surface.vertex_count());
    println!("  Triangles: {}", surface.triangle_count());
    let bounds = surface.bounds();
    println!(
        "  Bounds: [{:.4}, {:.4}, {:.4}] - [{:.4}, {:.4}, {:.4}]",
        bounds.min.x, bounds.min.y, bounds.min.z, bounds.max.x, bounds.max.y, bounds.max.z
    );

    match target.smooth() {
        Some(smooth) => {
            let tets = smooth.locator().mesh();
            println!("\nSmooth projection: available");
            println!("  Tet vertices: {}", tets.vertex_count());
            println!("  Tets: {}", tets.tet_count());
            println!("  Lifted triangles: {}", smooth.embedding().triangle_count());
            println!("  Solver mode: {:?}", smooth.mode());
        }
        None => {
            println!("\nSmooth projection: unavailable (closest point only)");
        }
    }

    Ok(())
}

fn project_point(settings: &TargetSettings, point: &Point3, method: Method) -> Result<()> {
    let mut target = Target::load(settings)
        .with_context(|| format!("loading target {}", settings.name))?;

    let frame = PoseFrame {
        pen_position: *point,
        ..PoseFrame::default()
    };
    let hit = match method {
        Method::Closest => target.project_closest(point, &frame),
        Method::Smooth => target.project_smooth(point, &frame),
    };

    println!("{}", serde_json::to_string_pretty(&hit)?);
    if let Some(stats) = target.locate_stats() {
        log::info!("tet locator: {}", stats);
    }
    Ok(())
}

fn replay(config: &Path, frames: &Path, output: Option<&Path>) -> Result<()> {
    let settings = DrawSettings::load(config)?;
    let mut source = ReplaySource::load(frames)?;
    let mut session = DrawingSession::load(settings)
        .context("loading the configured target")?;

    let mut sink = StrokeRecorder::default();
    let count = session.run(&mut source, &mut sink);
    if let Some(diagnostics) = session.target().smooth_diagnostics() {
        log::info!(
            "smooth projection: {} attempts, {} succeeded, {} outside volume, {} not located, {} solver failures",
            diagnostics.attempts,
            diagnostics.succeeded,
            diagnostics.outside_volume,
            diagnostics.point_not_located,
            diagnostics.projection_failure
        );
    }

    let strokes = sink.into_strokes();
    let json = serde_json::to_string_pretty(&strokes)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            println!(
                "Replayed {} frames: {} stroke(s) written to {}",
                count,
                strokes.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("0.5,-1,2").unwrap(), Point3::new(0.5, -1.0, 2.0));
        assert_eq!(parse_point(" 1 , 2 , 3 ").unwrap(), Point3::new(1.0, 2.0, 3.0));
        assert!(parse_point("1,2").is_err());
        assert!(parse_point("a,b,c").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli =
            Cli::try_parse_from(["mimic", "project", "bunny", "0.1,-0.2,0.3", "-m", "closest"])
                .unwrap();
        match cli.command {
            Commands::Project { target, point, method } => {
                assert_eq!(target.name, "bunny");
                assert_eq!(target.assets, PathBuf::from("assets"));
                assert_eq!(point, Point3::new(0.1, -0.2, 0.3));
                assert!(matches!(method, Method::Closest));
            }
            _ => panic!("expected project"),
        }
    }
}
