pub mod actions;
pub mod assets;
pub mod config;
pub mod entities;
pub mod interaction;
pub mod persistence;
pub mod scripting;
pub mod telemetry;
pub mod world;

use anyhow::Context;
use assets::{CachedTextSource, FsTextSource, TextSource};
use config::AppConfig;
use interaction::{ActionEntry, Interaction};
use persistence::store::SaveStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use world::events::{drain, EventDispatcher, GameEvent};
use world::movement::MoveOutcome;
use world::state::{SessionOptions, WorldState};

pub fn run(args: &[String]) -> anyhow::Result<()> {
    let config = AppConfig::from_args(args)?;
    telemetry::logging::init(&config.root, config.log_to_file)?;
    let summary = assets::scan(&config.root)?;
    println!("glyphwalk: asset scan");
    println!("- root: {}", config.root.display());
    println!("- world files: {}", summary.world_files);
    println!("- npc files: {}", summary.npc_files);
    println!("- zone files: {}", summary.zone_files);
    println!("- save files: {}", summary.save_files);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    runtime.block_on(replay(&config))
}

async fn replay(config: &AppConfig) -> anyhow::Result<()> {
    let source: Arc<dyn TextSource> = Arc::new(CachedTextSource::new(
        FsTextSource::new(config.root.clone()),
        config.cache_size,
    ));
    let store = SaveStore::from_root(&config.root);
    let (events, mut receiver) = EventDispatcher::channel();
    let options = SessionOptions {
        player_name: config.player_name.clone(),
        viewport: config.viewport,
        marker: config.marker,
        ..SessionOptions::default()
    };

    let saved = match &config.slot {
        Some(slot) => store.load(slot)?,
        None => None,
    };
    let mut state = match saved {
        Some(save) => {
            println!("glyphwalk: resuming {} in {}", save.player_name, save.world);
            WorldState::restore(source, save, options, events)
                .await
                .context("failed to restore save")?
        }
        None => WorldState::load(
            source,
            &config.start_world,
            config.start_position,
            options,
            events,
        )
        .await
        .with_context(|| format!("failed to load start world {}", config.start_world))?,
    };
    log_events(&mut receiver);
    print_view(&state);

    for (index, direction) in config.moves.iter().enumerate() {
        state.tick();
        match state.step(*direction).await {
            Ok(outcome) => println!("glyphwalk: step {} {:?}: {}", index + 1, direction, describe(&outcome)),
            Err(err) => {
                tracing::warn!(step = index + 1, error = %err, "step failed");
                eprintln!("glyphwalk: step {} failed: {}", index + 1, err);
            }
        }
        log_events(&mut receiver);
        print_view(&state);
    }

    if let Some(slot) = &config.slot {
        store.save(slot, &state.snapshot())?;
        println!("glyphwalk: saved slot {}", slot);
    }
    Ok(())
}

fn log_events(receiver: &mut mpsc::UnboundedReceiver<GameEvent>) {
    for event in drain(receiver) {
        tracing::debug!(?event, "event");
    }
}

fn describe(outcome: &MoveOutcome) -> String {
    match outcome {
        MoveOutcome::Moved { position, .. } => format!("moved to {}", position),
        MoveOutcome::Bumped { target, .. } => format!("bumped {}", target),
        MoveOutcome::Confirmed { target } => format!("confirmed {}", target),
        MoveOutcome::Teleported { position, .. } => format!("teleported to {}", position),
        MoveOutcome::Transition(destination) => match &destination.world_file {
            Some(file) => format!("entered {} at {}", file, destination.coordinates),
            None => format!("moved to {}", destination.coordinates),
        },
        MoveOutcome::Locked { text, .. } => format!("locked: {}", text),
        MoveOutcome::Blocked { target } => format!("blocked at {}", target),
    }
}

fn print_view(state: &WorldState) {
    let marker = state.marker();
    let mut rows = state.layers().composite();
    if let Some(overlay) = state.overlay_layer() {
        rows = rows
            .iter()
            .zip(&overlay)
            .map(|(row, cells)| {
                row.chars()
                    .zip(cells)
                    .map(|(base, cell)| if *cell == ' ' || base == marker { base } else { *cell })
                    .collect::<String>()
            })
            .collect();
    }
    println!(
        "[{} ({}) {} gold:{} frame:{}]",
        state.world().name,
        state.world_file(),
        state.player().position,
        state.inventory().gold,
        state.frame()
    );
    if let Some(zone) = &state.player().zone {
        println!(
            "  zone {} fg:{} bg:{}",
            zone.spec.overlay_file,
            zone.spec.fg().unwrap_or("-"),
            zone.spec.bg().unwrap_or("-")
        );
    }
    for row in rows {
        println!("  {}", row);
    }
    if let Some(interaction) = state.interaction() {
        print_interaction(interaction);
    }
}

fn print_interaction(interaction: &Interaction) {
    let names: Vec<&str> = interaction
        .visible_actions()
        .map(|action| action.name.as_str())
        .collect();
    println!("  {}: {}", interaction.display_name(), names.join(", "));
    for action in interaction.visible_actions() {
        match &action.entry {
            ActionEntry::Text(text) => println!("    {}: {}", action.name, text),
            ActionEntry::Menu(items) => {
                for item in items {
                    match item.gold {
                        Some(gold) => println!("    {} > {} ({:+})", action.name, item.name, gold),
                        None => println!("    {} > {}", action.name, item.name),
                    }
                }
            }
            ActionEntry::Event { text: Some(text), .. } => println!("    {}: {}", action.name, text),
            ActionEntry::Event { .. } => {}
        }
    }
}
