use anyhow::Context;
use clap::{Parser, Subcommand};
use glam::UVec2;
use prism_kernel::{DeviceState, Parameterized};
use prism_render::{Frame, RenderMode};
use prism_scene::SceneDesc;
use prism_tools::SceneInspector;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "prism", about = "CLI tool for prism scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Build a scene and print its committed structure
    Inspect {
        /// Scene file (.yaml, .yml or .json); the built-in demo when omitted
        scene: Option<PathBuf>,
    },
    /// Render a scene to a PNG
    Render {
        /// Scene file (.yaml, .yml or .json); the built-in demo when omitted
        #[arg(short, long)]
        scene: Option<PathBuf>,
        /// Output image path
        #[arg(short, long, default_value = "prism.png")]
        out: PathBuf,
        #[arg(long, default_value = "640")]
        width: u32,
        #[arg(long, default_value = "480")]
        height: u32,
        /// Override the scene's render mode (default, primitiveId, objectId,
        /// instanceId, normal)
        #[arg(short, long)]
        mode: Option<String>,
    },
    /// Write the built-in demo scene as YAML
    Demo {
        #[arg(short, long, default_value = "demo.yaml")]
        out: PathBuf,
    },
}

fn load_scene(path: Option<&Path>) -> anyhow::Result<SceneDesc> {
    tracing::debug!(scene = ?path, "loading scene");
    match path {
        Some(path) => SceneDesc::load(path).with_context(|| format!("loading {}", path.display())),
        None => Ok(SceneDesc::demo()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("prism v{}", env!("CARGO_PKG_VERSION"));
            println!("kernel: {}", prism_kernel::crate_info());
            println!("render: {}", prism_render::crate_info());
            println!("scene: {}", prism_scene::crate_info());
            println!("tools: {}", prism_tools::crate_info());
        }
        Commands::Inspect { scene } => {
            let desc = load_scene(scene.as_deref())?;
            let device = DeviceState::new();
            let built = desc.build(&device)?;

            println!("{}", SceneInspector::summary(&built.world, &device));
            for index in 0..built.world.instances().len() {
                if let Some(info) = SceneInspector::inspect_instance(&built.world, index) {
                    println!("  {info}");
                }
            }
        }
        Commands::Render {
            scene,
            out,
            width,
            height,
            mode,
        } => {
            let mut desc = load_scene(scene.as_deref())?;
            if let Some(mode) = mode {
                anyhow::ensure!(
                    RenderMode::parse(&mode).is_some(),
                    "unknown render mode '{mode}'"
                );
                desc.renderer.mode = Some(mode);
            }
            let device = DeviceState::new();
            let mut built = desc.build(&device)?;

            // match the image aspect
            built
                .camera
                .set_param("aspect", width as f32 / height.max(1) as f32);
            built.camera.commit();

            let mut frame = Frame::new(UVec2::new(width, height))?;
            frame.render(&built.world, &built.renderer, &built.camera);

            let image = image::RgbaImage::from_raw(width, height, frame.to_rgba8())
                .context("framebuffer does not match image size")?;
            image
                .save(&out)
                .with_context(|| format!("writing {}", out.display()))?;

            let hits = frame.samples().iter().filter(|s| !s.is_background()).count();
            println!(
                "Rendered {width}x{height} ({} mode) in {:?}: {hits} pixels hit -> {}",
                built.renderer.mode().name(),
                frame.duration().unwrap_or_default(),
                out.display()
            );
        }
        Commands::Demo { out } => {
            std::fs::write(&out, SceneDesc::demo().to_yaml_string()?)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("Wrote demo scene -> {}", out.display());
        }
    }

    Ok(())
}
