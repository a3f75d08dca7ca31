//! q3bsp - inspect a Quake III level from the command line.
//!
//! Points are engine coordinates (Y up) written as `x,y,z`.
//!
//! ```bash
//! cargo run -- --root ./baseq3 info q3dm1
//! cargo run -- leaf q3dm1 0,40,0
//! cargo run -- trace q3dm1 --kind box 0,40,0 200,40,0
//! cargo run -- walk q3dm1 --steps 70
//! cargo run -- frame q3dm1 0,40,0
//! ```

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use glam::Vec3;
use log::LevelFilter;

use q3bsp_rs::{
    config::{DEFAULT_GAMMA, DEFAULT_ROOT, LevelConfig},
    renderer::{BspScene, FaceDraw, FaceRenderer, FrameStats, Scene},
    sim::{Collidable, InputCmd, PLAYER_MAXS, PLAYER_MINS, Player, SIM_FPS, Trace},
    world::{Level, TextureBank, patch::BEZIER_LEVEL},
};

/// CLI options handled via `clap` derive.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Opts {
    /// Asset root holding `maps/` and `textures/`
    #[arg(long, value_name = "DIR", default_value = DEFAULT_ROOT, global = true)]
    root: PathBuf,

    /// Lightmap brightness factor
    #[arg(long, default_value_t = DEFAULT_GAMMA, global = true)]
    gamma: f32,

    /// Bezier patch subdivisions per control block
    #[arg(long, default_value_t = BEZIER_LEVEL, global = true)]
    bezier: usize,

    /// Skip reading texture images
    #[arg(long, global = true)]
    no_textures: bool,

    /// Skip lightmap upload
    #[arg(long, global = true)]
    no_lightmaps: bool,

    /// -v info, -vv debug, -vvv trace (otherwise `RUST_LOG`)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Table counts, spawn points and clusters
    Info { map: String },

    /// Leaf and cluster containing a point
    Leaf {
        map: String,
        #[arg(value_parser = parse_point, allow_hyphen_values = true)]
        at: Vec3,
    },

    /// Sweep a ray, sphere or the player box between two points
    Trace {
        map: String,
        #[arg(long, value_enum, default_value_t = Kind::Ray)]
        kind: Kind,
        /// Sphere radius
        #[arg(long, default_value_t = 16.0)]
        radius: f32,
        #[arg(value_parser = parse_point, allow_hyphen_values = true)]
        start: Vec3,
        #[arg(value_parser = parse_point, allow_hyphen_values = true)]
        end: Vec3,
    },

    /// Drop the player at the first spawn point and walk forward
    Walk {
        map: String,
        /// Number of tics to run
        #[arg(long, default_value_t = SIM_FPS)]
        steps: u32,
        /// Forward input, -1 … 1
        #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
        speed: f32,
    },

    /// Select the faces visible from a point
    Frame {
        map: String,
        #[arg(value_parser = parse_point, allow_hyphen_values = true)]
        at: Vec3,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Kind {
    Ray,
    Sphere,
    Box,
}

fn parse_point(s: &str) -> Result<Vec3, String> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("'{p}': {e}")))
        .collect::<Result<_, _>>()?;
    match parts[..] {
        [x, y, z] => Ok(Vec3::new(x, y, z)),
        _ => Err(format!("expected x,y,z, got '{s}'")),
    }
}

/// Counts what a back-end would have been asked to draw.
#[derive(Default)]
struct CountingRenderer {
    faces: usize,
    triangles: usize,
    lightmapped: usize,
}

impl FaceRenderer for CountingRenderer {
    fn draw_face(&mut self, draw: &FaceDraw<'_>) {
        self.faces += 1;
        self.triangles += draw.indices.len() / 3;
        if draw.lightmap.is_some() {
            self.lightmapped += 1;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    let mut logger = env_logger::Builder::from_default_env();
    match opts.verbose {
        0 => {}
        1 => {
            logger.filter_level(LevelFilter::Info);
        }
        2 => {
            logger.filter_level(LevelFilter::Debug);
        }
        _ => {
            logger.filter_level(LevelFilter::Trace);
        }
    }
    logger.init();

    let map = match &opts.cmd {
        Cmd::Info { map }
        | Cmd::Leaf { map, .. }
        | Cmd::Trace { map, .. }
        | Cmd::Walk { map, .. }
        | Cmd::Frame { map, .. } => map.clone(),
    };
    let config = LevelConfig::default()
        .with_root(&opts.root)
        .with_map(map)
        .with_gamma(opts.gamma)
        .with_bezier_level(opts.bezier)
        .with_textures(!opts.no_textures)
        .with_lightmaps(!opts.no_lightmaps);

    let mut bank = TextureBank::new();
    let mut scene = BspScene::open(&config, &mut bank)
        .with_context(|| format!("opening {}", config.map_path().display()))?;

    match opts.cmd {
        Cmd::Info { .. } => info(scene.level(), &bank),
        Cmd::Leaf { at, .. } => {
            let lvl = scene.level();
            let leaf = lvl.find_leaf(at);
            let cluster = lvl.leaves[leaf].cluster;
            let visible = lvl.vis.visible_clusters(cluster).count();
            println!("leaf {leaf}  cluster {cluster}  sees {visible} cluster(s)");
        }
        Cmd::Trace {
            kind,
            radius,
            start,
            end,
            ..
        } => {
            let lvl = scene.level();
            let t = match kind {
                Kind::Ray => lvl.trace_ray(start, end),
                Kind::Sphere => lvl.trace_sphere(start, end, radius),
                Kind::Box => lvl.trace_box(start, end, PLAYER_MINS, PLAYER_MAXS),
            };
            print_trace(&t);
        }
        Cmd::Walk { steps, speed, .. } => {
            let Some(&spawn) = scene.level().spawn_points().first() else {
                bail!("map has no spawn point");
            };
            let mut player = Player::new(spawn, 0.0);
            let cmd = InputCmd {
                forward: speed.clamp(-1.0, 1.0),
                ..Default::default()
            };
            for tic in 0..steps {
                player.tick(cmd, &mut scene);
                println!(
                    "{tic:4}  pos {:8.2} {:8.2} {:8.2}  ground {}  blocked {}",
                    player.position.x,
                    player.position.y,
                    player.position.z,
                    player.on_ground,
                    scene.collided()
                );
            }
        }
        Cmd::Frame { at, .. } => {
            let mut out = CountingRenderer::default();
            let stats = scene.render(at, &mut out);
            print_frame(&stats, &out);
        }
    }
    Ok(())
}

fn info(lvl: &Level, bank: &TextureBank) {
    println!("map {}", lvl.name);
    for (label, n) in [
        ("entities", lvl.entities.len()),
        ("textures", lvl.textures.len()),
        ("planes", lvl.planes.len()),
        ("nodes", lvl.nodes.len()),
        ("leaves", lvl.leaves.len()),
        ("leaf faces", lvl.leaf_faces.len()),
        ("leaf brushes", lvl.leaf_brushes.len()),
        ("models", lvl.models.len()),
        ("brushes", lvl.brushes.len()),
        ("brush sides", lvl.brush_sides.len()),
        ("vertices", lvl.vertices.len()),
        ("indices", lvl.indices.len()),
        ("effects", lvl.effects.len()),
        ("faces", lvl.faces.len()),
        ("light volumes", lvl.light_volumes.len()),
    ] {
        println!("  {label:<14}{n:>8}");
    }
    println!(
        "  clusters {}  ({} bytes each)",
        lvl.vis.cluster_count(),
        lvl.vis.bytes_per_cluster()
    );
    println!("  images {}  lightmaps {}", bank.len(), bank.lightmap_count());
    if let Some(world) = lvl.models.first() {
        println!("  bounds {} .. {}", world.bounds.min, world.bounds.max);
    }
    for p in lvl.spawn_points() {
        println!("  spawn {p}");
    }
}

fn print_trace(t: &Trace) {
    println!(
        "end {}  collided {}  grounded {}  normal {}",
        t.position, t.collided, t.grounded, t.normal
    );
}

fn print_frame(stats: &FrameStats, out: &CountingRenderer) {
    println!(
        "camera leaf {}  cluster {}  visible leaves {}  faces {}",
        stats.camera_leaf, stats.camera_cluster, stats.visible_leaves, stats.visible_faces
    );
    println!(
        "  drawn {}  triangles {}  lightmapped {}",
        out.faces, out.triangles, out.lightmapped
    );
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_level_config() {
        let opts = Opts::try_parse_from(["q3bsp", "info", "q3dm1"]).unwrap();
        let cfg = LevelConfig::default();
        assert_eq!(opts.bezier, cfg.bezier_level);
        assert_eq!(opts.gamma, cfg.gamma);
        assert_eq!(opts.root, cfg.root);
    }

    #[test]
    fn negative_points_parse() {
        let opts = Opts::try_parse_from(["q3bsp", "trace", "m", "--kind", "box", "-10,0,5", "20,-4,0"]).unwrap();
        match opts.cmd {
            Cmd::Trace { start, end, .. } => {
                assert_eq!(start, Vec3::new(-10.0, 0.0, 5.0));
                assert_eq!(end, Vec3::new(20.0, -4.0, 0.0));
            }
            other => panic!("parsed {other:?}"),
        }
        assert!(parse_point("1,2").is_err());
    }
}
