use std::error::Error;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cavern::{CaveConfig, CaveSystem, FlightPath};
use cavern_geom::Vec3;
use cavern_mesh_cpu::ChunkMesh;
use cavern_runtime::{ChunkKey, ChunkPool, ParentId, RenderSink};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "cavern", about = "Headless cave streaming fly-through")]
struct Cli {
    /// TOML config; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Simulation ticks to run
    #[arg(long, default_value_t = 600)]
    ticks: u32,
    /// Seconds per tick
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,
    /// Mirror logs into this file
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Number of observers sharing the pool
    #[arg(long, default_value_t = 1)]
    observers: usize,
    /// Observer flight speed in world units per second
    #[arg(long, default_value_t = 8.0)]
    speed: f32,
    /// Sleep for `dt` after every tick
    #[arg(long)]
    realtime: bool,
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<(), Box<dyn Error>> {
    match log_file {
        Some(path) => {
            use simplelog::{
                ColorChoice, CombinedLogger, Config, LevelFilter, TermLogger, TerminalMode,
                WriteLogger,
            };
            CombinedLogger::init(vec![
                TermLogger::new(
                    LevelFilter::Info,
                    Config::default(),
                    TerminalMode::Mixed,
                    ColorChoice::Auto,
                ),
                WriteLogger::new(LevelFilter::Debug, Config::default(), File::create(path)?),
            ])?;
        }
        None => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .init();
        }
    }
    Ok(())
}

#[derive(Default)]
struct CountingSink {
    shown: usize,
    hidden: usize,
    colliders: usize,
    triangles: usize,
}

impl RenderSink for CountingSink {
    fn show(&mut self, _key: ChunkKey, _origin: Vec3, mesh: &Arc<ChunkMesh>) {
        self.shown += 1;
        self.triangles += mesh.triangle_count();
    }

    fn hide(&mut self, _key: ChunkKey) {
        self.hidden += 1;
    }

    fn collider_attached(&mut self, _key: ChunkKey) {
        self.colliders += 1;
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    let cfg = match &cli.config {
        Some(path) => CaveConfig::load(path)?,
        None => {
            let cfg = CaveConfig::default();
            cfg.validate()?;
            cfg
        }
    };
    if !(cli.dt > 0.0 && cli.dt.is_finite()) {
        return Err(format!("--dt must be positive, got {}", cli.dt).into());
    }

    let field = Arc::new(cfg.noise_field());
    let mut pool = ChunkPool::new(cfg.pool_settings(), field);
    let chunk_size = cfg.chunk_size();
    let spacing = (chunk_size.x * (cfg.cave.extents[0] * 2 + 1)) as f32;
    let flights = FlightPath::fleet(cli.observers, spacing, cli.speed);
    let mut caves: Vec<CaveSystem> = (0..cli.observers)
        .map(|i| CaveSystem::new(ParentId(i as u32), chunk_size, cfg.cave_settings()))
        .collect();

    let dt = Duration::from_secs_f32(cli.dt);
    let reclaim_period = cfg.reclaim_period();
    let mut now = Duration::ZERO;
    let mut since_reclaim = Duration::ZERO;
    let mut sink = CountingSink::default();
    let mut updates = 0usize;
    let mut reclaimed = 0usize;

    log::info!(
        "flying {} observer(s) for {} ticks at dt={:.4}s",
        cli.observers,
        cli.ticks,
        cli.dt
    );
    for tick in 0..cli.ticks {
        now += dt;
        let t = now.as_secs_f32();
        for (cave, flight) in caves.iter_mut().zip(&flights) {
            if cave.update(&mut pool, &flight.observer_at(t)) {
                updates += 1;
            }
        }
        pool.tick(now);

        since_reclaim += dt;
        if since_reclaim >= reclaim_period {
            since_reclaim -= reclaim_period;
            reclaimed += pool.reclaim();
        }
        pool.flush_events(&mut sink);

        if tick % 60 == 0 {
            let stats = pool.stats();
            let ready = caves
                .iter_mut()
                .filter_map(|c| c.all_chunks_active(&pool).then_some(()))
                .count();
            log::debug!(
                "tick {tick}: records={} indexed={} free={} scheduled={} busy={}/{} visible={} ready_observers={ready}",
                stats.records,
                stats.indexed,
                stats.free_records,
                stats.scheduled,
                stats.busy_workers,
                stats.busy_workers + stats.available_workers,
                stats.visible,
            );
        }
        if cli.realtime {
            std::thread::sleep(dt);
        }
    }

    let stats = pool.stats();
    let ready = caves
        .iter_mut()
        .filter_map(|c| c.all_chunks_active(&pool).then_some(()))
        .count();
    log::info!(
        "done: {} updates, {} shown, {} hidden, {} colliders, {} triangles, {} reclaimed",
        updates,
        sink.shown,
        sink.hidden,
        sink.colliders,
        sink.triangles,
        reclaimed
    );
    log::info!(
        "pool: {} records ({} free), {} handles ({} visible), {} still scheduled, {}/{} observers ready",
        stats.records,
        stats.free_records,
        stats.chunks,
        stats.visible,
        stats.scheduled,
        ready,
        caves.len()
    );

    for cave in &mut caves {
        cave.reset(&mut pool);
    }
    pool.shutdown();
    Ok(())
}
