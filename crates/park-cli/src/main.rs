mod overlay;
mod pipeline;
mod source;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use park_store::{doctor as store_doctor, FileStore, MemoryStore, OccupancyStore};
use park_vision::zones::{load_zones_json, ZoneDef};
use park_vision::{doctor as zone_doctor, Zone, ZoneSet, DEFAULT_OCCUPIED_THRESHOLD, DEFAULT_TRAIL_LEN};

use overlay::OverlaySink;
use pipeline::{Pipeline, PipelineConfig};
use source::FrameSource;

#[derive(Debug, Parser)]
#[command(name = "parkwatch", version, about = "parkwatch - parking lot occupancy from tracked detections")]
struct Cli {
    #[arg(long)]
    config: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Doctor,
    Run {
        /// Stop after this many frames.
        #[arg(long)]
        max_frames: Option<u64>,
        /// Reconcile against an in-memory store instead of the configured one.
        #[arg(long)]
        dry_run: bool,
    },
    Zones { #[command(subcommand)] cmd: ZonesCmd },
}

#[derive(Debug, Subcommand)]
enum ZonesCmd {
    /// Print the validated zone definitions.
    Inspect,
    /// Print the persisted occupancy of every zone.
    Status,
}

#[derive(Debug, serde::Deserialize)]
struct Config {
    zones: ZonesCfg,
    #[serde(default)]
    occupancy: OccupancyCfg,
    source: SourceCfg,
    store: StoreCfg,
    overlay: Option<OverlayCfg>,
    #[serde(default)]
    classes: ClassesCfg,
}

#[derive(Debug, serde::Deserialize)]
struct ZonesCfg {
    /// JSON lot file, `[["A", x1, y1, x2, y2], ...]`.
    file: Option<String>,
    #[serde(default)]
    lot: Vec<ZoneDef>,
    frame_w: Option<u32>,
    frame_h: Option<u32>,
}

#[derive(Debug, serde::Deserialize)]
struct OccupancyCfg {
    #[serde(default = "default_threshold")]
    threshold: f64,
    #[serde(default = "default_trail_len")]
    trail_len: usize,
}

impl Default for OccupancyCfg {
    fn default() -> Self {
        Self { threshold: default_threshold(), trail_len: default_trail_len() }
    }
}

fn default_threshold() -> f64 { DEFAULT_OCCUPIED_THRESHOLD }
fn default_trail_len() -> usize { DEFAULT_TRAIL_LEN }

#[derive(Debug, serde::Deserialize)]
struct SourceCfg {
    path: String,
    #[serde(default)]
    follow: bool,
}

#[derive(Debug, serde::Deserialize)]
struct StoreCfg {
    backend: String, // "file" | "memory"
    dir: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct OverlayCfg {
    path: String,
}

#[derive(Debug, Default, serde::Deserialize)]
struct ClassesCfg {
    #[serde(default)]
    names: Vec<String>,
}

fn load_config(path: &str) -> Result<Config> {
    let s = std::fs::read_to_string(path).context("read config")?;
    parse_config(&s)
}

fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config toml")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;

    match cli.cmd {
        Command::Doctor => doctor(&cfg)?,
        Command::Run { max_frames, dry_run } => run(&cfg, max_frames, dry_run).await?,
        Command::Zones { cmd } => zones_cmd(&cfg, cmd)?,
    }
    Ok(())
}

/// Zone file entries first, then inline `[[zones.lot]]` entries.
/// Invalid definitions are fatal: the pipeline never starts with them.
fn load_zone_set(cfg: &Config) -> Result<ZoneSet> {
    let mut zones: Vec<Zone> = Vec::new();
    if let Some(file) = &cfg.zones.file {
        zones.extend(load_zones_json(file)?);
    }
    zones.extend(cfg.zones.lot.iter().cloned().map(Zone::from));
    ZoneSet::new(zones).context("invalid zone definitions")
}

/// Opens the configured store and refuses zone names it cannot key by.
fn open_store(cfg: &Config, zones: &ZoneSet) -> Result<Box<dyn OccupancyStore>> {
    let store: Box<dyn OccupancyStore> = match cfg.store.backend.as_str() {
        "file" => {
            let dir = cfg.store.dir.as_ref().context("store.dir missing (backend=file)")?;
            Box::new(FileStore::new(dir)?)
        }
        "memory" => Box::new(MemoryStore::new()),
        other => anyhow::bail!("unknown store.backend: {}", other),
    };
    check_zone_keys(store.as_ref(), zones)?;
    Ok(store)
}

fn check_zone_keys(store: &dyn OccupancyStore, zones: &ZoneSet) -> Result<()> {
    for name in zones.names() {
        store.check_key(name).with_context(|| format!("zone {:?} unusable with store.backend", name))?;
    }
    Ok(())
}

fn check_occupancy(occ: &OccupancyCfg) -> Result<()> {
    anyhow::ensure!(
        occ.threshold > 0.0 && occ.threshold <= 1.0,
        "occupancy.threshold must be in (0, 1], got {}",
        occ.threshold
    );
    anyhow::ensure!(occ.trail_len >= 1, "occupancy.trail_len must be >= 1");
    Ok(())
}

fn doctor(cfg: &Config) -> Result<()> {
    info!("doctor: starting");

    let zones = load_zone_set(cfg)?;
    let overlapping = zone_doctor::check_zones(&zones, cfg.zones.frame_w, cfg.zones.frame_h)?;
    info!("doctor: {} zones ({} overlapping pairs)", zones.len(), overlapping);

    check_occupancy(&cfg.occupancy)?;

    match cfg.store.backend.as_str() {
        "file" => {
            let dir = cfg.store.dir.as_deref().context("store.dir missing (backend=file)")?;
            store_doctor::check_store_dir(dir)?;
            for name in zones.names() {
                FileStore::validate_key(name).with_context(|| format!("zone {:?} unusable as a store key", name))?;
            }
        }
        "memory" => warn!("doctor: store.backend=memory, occupancy will not be persisted"),
        other => anyhow::bail!("unknown store.backend: {}", other),
    }

    if cfg.source.path != "-" {
        anyhow::ensure!(
            std::path::Path::new(&cfg.source.path).exists() || cfg.source.follow,
            "source.path missing: {}",
            cfg.source.path
        );
    }
    if cfg.classes.names.is_empty() {
        warn!("doctor: classes.names empty, labels will show raw class ids");
    }

    info!("doctor: OK");
    Ok(())
}

fn zones_cmd(cfg: &Config, cmd: ZonesCmd) -> Result<()> {
    let zones = load_zone_set(cfg)?;
    match cmd {
        ZonesCmd::Inspect => {
            for z in &zones {
                println!(
                    "{} x1={} y1={} x2={} y2={} area={}",
                    z.name, z.rect.x1, z.rect.y1, z.rect.x2, z.rect.y2, z.area()
                );
            }
        }
        ZonesCmd::Status => {
            let mut store = open_store(cfg, &zones)?;
            for name in zones.names() {
                match store.read(name) {
                    Ok(Some(true)) => println!("{} occupied", name),
                    Ok(Some(false)) => println!("{} vacant", name),
                    Ok(None) => println!("{} unknown", name),
                    Err(e) => println!("{} error: {:#}", name, e),
                }
            }
        }
    }
    Ok(())
}

async fn run(cfg: &Config, max_frames: Option<u64>, dry_run: bool) -> Result<()> {
    info!("run: starting");

    check_occupancy(&cfg.occupancy)?;
    let zones = load_zone_set(cfg)?;
    info!("run: {} zones loaded", zones.len());

    let mut store: Box<dyn OccupancyStore> = if dry_run {
        info!("run: dry run, using in-memory store");
        let store: Box<dyn OccupancyStore> = Box::new(MemoryStore::new());
        check_zone_keys(store.as_ref(), &zones)?;
        store
    } else {
        open_store(cfg, &zones)?
    };

    let mut src = FrameSource::open(&cfg.source.path, cfg.source.follow)?;
    let mut sink = match &cfg.overlay {
        Some(o) => Some(OverlaySink::create(&o.path).await?),
        None => None,
    };

    let mut pipeline = Pipeline::new(
        zones,
        PipelineConfig {
            threshold: cfg.occupancy.threshold,
            trail_len: cfg.occupancy.trail_len,
            class_names: cfg.classes.names.clone(),
        },
    );

    let mut dropped = 0usize;

    // Frames are processed one at a time; stopping only happens between frames,
    // so no zone is ever left mid-reconciliation.
    loop {
        if max_frames.is_some_and(|m| pipeline.frames() >= m) {
            info!("run: reached max_frames");
            break;
        }

        let next = tokio::select! {
            r = src.next_frame() => r?,
            _ = tokio::signal::ctrl_c() => {
                info!("run: interrupted");
                break;
            }
        };
        let Some(frame) = next else {
            info!("run: end of feed");
            break;
        };

        let res = pipeline.process(&frame, &mut store);
        dropped += res.dropped;
        if res.sync.writes() > 0 {
            let states: Vec<String> = res
                .occupancy
                .iter()
                .map(|z| format!("{}={}", z.name, if z.occupied { "occupied" } else { "vacant" }))
                .collect();
            info!("run: frame {} {}", frame.frame, states.join(" "));
        }

        if let Some(s) = sink.as_mut() {
            if let Err(e) = s.write(&res.overlay).await {
                warn!("overlay write failed: {:#}", e);
            }
        }
    }

    if let Some(s) = sink.as_mut() {
        s.flush().await?;
        info!("run: {} overlay frames written", s.written());
    }
    let health = pipeline.synchronizer().health();
    info!(
        "run: done after {} frames ({} writes, {} store failures, {} dropped detections, {} live tracks)",
        pipeline.frames(), health.total_writes, health.total_failures, dropped, pipeline.trails().len()
    );
    Ok(())
}
