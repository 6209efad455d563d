//! Scripted run of the built-in enchantments against the sandbox world.
//!
//! Useful for eyeballing effect timing and settings changes without a game
//! server: every engine call is logged at debug level and summarised at the
//! end.

use std::path::PathBuf;

use clap::Parser;
use glam::DVec3;
use tracing_subscriber::filter::EnvFilter;

use enchantry_core::builtin::{
    GravitationalCollapse, Inferno, MagicMirror, SeekerStrike, SoulSiphon, Swift,
};
use enchantry_core::dispatch::{Interact, InteractKind, MeleeHit, MoveCell, RangedLaunch};
use enchantry_core::engine::{EngineCall, EntityKind, WorldId};
use enchantry_core::{
    EnchantSession, EntityId, GameAction, GameEngine, Item, Location, SandboxWorld,
    default_settings_path, install_all, load_settings, save_settings,
};
use enchantry_types::{EngineSettings, ItemKind};

#[derive(Parser)]
#[command(version, about = "Run the built-in enchantments against a sandbox world")]
struct Cli {
    /// Settings file. Defaults to the per-user config location.
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Ticks to simulate after the scripted actions.
    #[arg(short, long, default_value_t = 300)]
    ticks: u64,

    /// Write the effective settings back to the settings file and exit.
    #[arg(long)]
    write_defaults: bool,
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    // If ENCHANTRY_LOG_PATH is set, append to that file
    if let Ok(path) = std::env::var("ENCHANTRY_LOG_PATH") {
        if let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
        {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(file)
                .init();
            return;
        }
    }

    // Fallback to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), String> {
    init_logging();
    let cli = Cli::parse();

    let path = cli.settings.or_else(default_settings_path);
    let settings = match &path {
        Some(path) => load_settings(path).map_err(|e| e.to_string())?,
        None => {
            tracing::warn!("No config directory, using default settings");
            EngineSettings::default()
        }
    };

    if cli.write_defaults {
        let path = path.ok_or("No settings path to write to")?;
        save_settings(&path, &settings).map_err(|e| e.to_string())?;
        println!("Wrote settings to {}", path.display());
        return Ok(());
    }

    let mut session = EnchantSession::new(settings);
    install_all(&mut session);
    let mut world = SandboxWorld::new();

    let cast = Cast::spawn(&mut world);
    let pearl = script(&mut session, &mut world, &cast)?;

    let mut summary = Summary::default();
    for _ in 0..cli.ticks {
        let report = session.tick(&mut world);
        summary.completed += report.completed();
        summary.cancelled += report.cancelled();
        summary.timed_out += report.timed_out();
        world.advance_physics();
    }
    // Recalling again inside the cooldown is refused with the time left.
    let recall = interact(cast.player, InteractKind::RightClick, &pearl, &world);
    session.handle_action(&mut world, &recall);
    summary.cancelled += session.shutdown(&mut world);

    summary.print(&session, &world, &cast);
    Ok(())
}

// ─── Scripted actions ───────────────────────────────────────────────────────

struct Cast {
    player: EntityId,
    zombie: EntityId,
    skeleton: EntityId,
}

impl Cast {
    fn spawn(world: &mut SandboxWorld) -> Self {
        let origin = Location::new(WorldId(0), 0.5, 64.0, 0.5);
        Self {
            player: world.spawn(EntityKind::Player, origin),
            zombie: world.spawn(EntityKind::Monster, origin.offset(DVec3::new(8.0, 0.0, 0.0))),
            skeleton: world.spawn(EntityKind::Monster, origin.offset(DVec3::new(2.0, 0.0, 1.0))),
        }
    }
}

fn enchant(
    session: &EnchantSession,
    kind: ItemKind,
    enchantments: &[(&str, u32)],
) -> Result<Item, String> {
    let mut item = Item::new(kind);
    for (name, level) in enchantments {
        item = session
            .apply(&item, name, *level)
            .map_err(|e| format!("cannot apply {name} {level}: {e}"))?;
    }
    Ok(item)
}

fn interact(
    subject: EntityId,
    kind: InteractKind,
    item: &Item,
    world: &SandboxWorld,
) -> GameAction {
    let location = world
        .location_of(subject)
        .unwrap_or(Location::new(WorldId(0), 0.0, 0.0, 0.0));
    GameAction::Interact(Interact {
        subject,
        kind,
        item: Some(item.clone()),
        location,
    })
}

/// Runs the opening actions and returns the enchanted pearl.
fn script(
    session: &mut EnchantSession,
    world: &mut SandboxWorld,
    cast: &Cast,
) -> Result<Item, String> {
    let sword = enchant(
        session,
        ItemKind::Sword,
        &[
            (Inferno::NAME, 2),
            (SoulSiphon::NAME, 3),
            (GravitationalCollapse::NAME, 3),
        ],
    )?;
    let trident = enchant(session, ItemKind::Trident, &[(SeekerStrike::NAME, 3)])?;
    let boots = enchant(session, ItemKind::Boots, &[(Swift::NAME, 2)])?;
    let pearl = enchant(session, ItemKind::EnderPearl, &[(MagicMirror::NAME, 2)])?;
    for line in &sword.lore {
        tracing::info!(line = %line, "Sword lore");
    }

    session.handle_action(
        world,
        &GameAction::MeleeHit(MeleeHit {
            attacker: cast.player,
            victim: cast.skeleton,
            damage: 7.0,
            main_hand: Some(sword),
        }),
    );

    let from = world
        .location_of(cast.player)
        .ok_or("player vanished before the script ran")?;
    session.handle_action(
        world,
        &GameAction::MoveCell(MoveCell {
            subject: cast.player,
            from,
            to: from.offset(DVec3::new(1.0, 0.0, 0.0)),
            armor: vec![boots],
            sprinting: true,
        }),
    );

    let set_home = interact(cast.player, InteractKind::LeftClick, &pearl, world);
    session.handle_action(world, &set_home);

    let projectile = world.spawn(EntityKind::Projectile, from.offset(DVec3::Y));
    world.set_velocity(projectile, DVec3::X);
    session.handle_action(
        world,
        &GameAction::RangedLaunch(RangedLaunch {
            shooter: cast.player,
            projectile,
            launcher: Some(trident),
        }),
    );

    world.move_entity(cast.player, from.offset(DVec3::new(0.0, 0.0, 40.0)));
    let recall = interact(cast.player, InteractKind::RightClick, &pearl, world);
    session.handle_action(world, &recall);
    Ok(pearl)
}

// ─── Report ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Summary {
    completed: usize,
    cancelled: usize,
    timed_out: usize,
}

impl Summary {
    fn print(&self, session: &EnchantSession, world: &SandboxWorld, cast: &Cast) {
        let stats = session.dispatch_stats();
        let mut visuals = 0;
        let mut sounds = 0;
        let mut damage = 0.0;
        for call in world.calls() {
            match call {
                EngineCall::Visual { .. } => visuals += 1,
                EngineCall::Sound { .. } => sounds += 1,
                EngineCall::Damage { amount, .. } => damage += amount,
                _ => {}
            }
        }

        println!("ticks simulated:     {}", session.now());
        println!("enchantments:        {}", session.registry().len());
        println!(
            "actions:             {} ({} invocations, {} coalesced moves)",
            stats.actions, stats.invocations, stats.coalesced_moves
        );
        println!(
            "sequences:           {} completed, {} cancelled, {} timed out",
            self.completed, self.cancelled, self.timed_out
        );
        println!("visuals / sounds:    {visuals} / {sounds}");
        println!("total damage:        {damage:.1}");
        for (name, id) in [("zombie", cast.zombie), ("skeleton", cast.skeleton)] {
            match world.entity(id) {
                Some(entity) => println!("{name:<20} {:.1} health", entity.health),
                None => println!("{name:<20} dead"),
            }
        }
        for message in world.messages_for(cast.player) {
            println!("  > {message}");
        }
    }
}
