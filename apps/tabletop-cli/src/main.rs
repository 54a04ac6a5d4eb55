use clap::{Parser, Subcommand};
use tabletop_physics::{
    BearingOptions, CircleOptions, DEFAULT_DT, RailOptions, RectangleOptions, Surface,
    SurfaceOptions,
};
use tabletop_render::{DebugTextRenderer, RenderView, Renderer};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tabletop-cli", about = "Headless demos for the tabletop physics layer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info
    Info,
    /// Attractor demo: bodies held in an orbit band around a hub
    Orbit {
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "120")]
        ticks: u64,
        /// Number of orbiting bodies
        #[arg(short, long, default_value = "4")]
        bodies: usize,
    },
    /// Slider rail demo: bearings pushed along a rail
    Rail {
        #[arg(short, long, default_value = "120")]
        ticks: u64,
    },
    /// Factory/query/deletion walkthrough on a crowded table
    Field {
        #[arg(short, long, default_value = "12")]
        bodies: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("tabletop-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("render: {}", tabletop_render::crate_info());
            let surface = Surface::new(SurfaceOptions::default())?;
            println!(
                "default surface: {}x{}, {} wall(s)",
                surface.options().width,
                surface.options().height,
                surface.body_count()
            );
        }
        Commands::Orbit { ticks, bodies } => {
            let mut surface = Surface::new(SurfaceOptions::sized(800.0, 600.0))?;
            let hub = surface.create_circle(
                CircleOptions::new(400.0, 300.0, 25.0)
                    .with_body(tabletop_physics::BodyOptions::fixed()),
            )?;
            surface.set_attractor_orbit(hub, 100.0, 150.0)?;
            surface.set_attraction_strength(hub, 5e5)?;

            for i in 0..bodies {
                let angle = i as f32 * std::f32::consts::TAU / bodies as f32;
                let x = 400.0 + 250.0 * angle.cos();
                let y = 300.0 + 200.0 * angle.sin();
                let moon = surface.create_circle(CircleOptions::new(x, y, 10.0))?;
                surface.add_attracted(hub, moon)?;
            }

            for _ in 0..ticks {
                surface.step(DEFAULT_DT);
            }

            let distances: Vec<String> = surface
                .attractors()
                .iter()
                .flat_map(|entry| entry.attracted.iter().map(|r| r.body))
                .filter_map(|id| surface.distance_between(hub, id).ok())
                .map(|d| format!("{d:.1}"))
                .collect();
            println!("orbit distances after {ticks} ticks: {}", distances.join(", "));
            print!(
                "{}",
                DebugTextRenderer::new().render(&surface, &RenderView::of(&surface))
            );
        }
        Commands::Rail { ticks } => {
            let mut surface = Surface::new(SurfaceOptions::sized(800.0, 600.0))?;
            let cargo = surface.create_rectangle(RectangleOptions::new(400.0, 450.0, 40.0, 40.0))?;
            let handles = surface.create_rail(
                RailOptions::new(400.0, 300.0, 500.0, 20.0)
                    .bearing(BearingOptions::new(12.0).at(0.1))
                    .bearing(BearingOptions::new(12.0).at(0.9).linked_to(cargo)),
            )?;

            surface.apply_impulse(handles.bearings[0], [30.0, 0.0])?;
            for _ in 0..ticks {
                surface.step(DEFAULT_DT);
            }

            for (i, bearing) in handles.bearings.iter().enumerate() {
                let [x, y] = surface.position(*bearing)?;
                println!("bearing {i}: ({x:.1}, {y:.1})");
            }
            print!(
                "{}",
                DebugTextRenderer::new().render(&surface, &RenderView::of(&surface))
            );
        }
        Commands::Field { bodies } => {
            let mut surface = Surface::new(SurfaceOptions::sized(800.0, 600.0))?;
            let mut placed = Vec::new();
            for _ in 0..bodies {
                match surface.suggest_position(60.0, 60.0) {
                    Some([x, y]) => {
                        placed.push(surface.create_rectangle(RectangleOptions::new(
                            x, y, 60.0, 60.0,
                        ))?);
                    }
                    None => {
                        tracing::info!("table is full, stopping early");
                        break;
                    }
                }
            }
            println!("placed {} of {bodies} requested bodies", placed.len());
            println!(
                "center occupied: {}",
                surface.is_space_occupied(400.0, 300.0, 60.0, 60.0)
            );

            // drop every other body and show the registry shrinking
            for id in placed.iter().step_by(2) {
                surface.delete_body(*id)?;
            }
            surface.step(DEFAULT_DT);
            println!("bodies remaining: {}", surface.body_count());
            println!("events this run: {}", surface.drain_events().len());
        }
    }

    Ok(())
}
