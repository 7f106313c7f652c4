use crate::assets::{world_path, zone_path, FetchError, TextSource};
use crate::entities::inventory::{Inventory, InventoryError};
use crate::entities::item::ItemId;
use crate::interaction::hydrate::{self, HydrationContext};
use crate::interaction::{ActionEntry, ActionEvent, Interaction, MenuItem};
use crate::persistence::store::SaveState;
use crate::world::events::{Destination, EventDispatcher, GameEvent};
use crate::world::format::WorldError;
use crate::world::model::WorldModel;
use crate::world::movement::{BumpSubject, MoveOutcome, PlayerState};
use crate::world::position::{Direction, Position};
use crate::world::viewport::{bump_layer, Layers, Viewport, ViewportSize, PLAYER_MARKER};
use crate::world::zone::{animation_offset, ZoneOverlay};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("world {name}: {source}")]
    World {
        name: String,
        #[source]
        source: WorldError,
    },
    #[error("spawn {position} lies outside world {name}")]
    SpawnOutOfBounds { name: String, position: Position },
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    #[error("no interaction is active")]
    NoInteraction,
    #[error("no action '{0}' in the current interaction")]
    UnknownAction(String),
    #[error("menu entry {path:?} missing in '{action}'")]
    UnknownEntry { action: String, path: Vec<usize> },
}

/// Player-facing settings a session starts with.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub player_name: String,
    pub viewport: ViewportSize,
    pub marker: char,
    pub inventory: Inventory,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            player_name: "Hero".to_string(),
            viewport: ViewportSize::default(),
            marker: PLAYER_MARKER,
            inventory: Inventory::default(),
        }
    }
}

struct Hydrated {
    generation: u64,
    target: Position,
    subject: Position,
    interaction: Interaction,
}

/// One player's session: the active world, the player on it and the
/// interaction in front of them.
pub struct WorldState {
    source: Arc<dyn TextSource>,
    world: Arc<WorldModel>,
    world_file: String,
    generation: u64,
    player: PlayerState,
    context: HydrationContext,
    interaction: Option<Interaction>,
    resolved: Option<Position>,
    viewport: ViewportSize,
    marker: char,
    overlay: Option<ZoneOverlay>,
    overlay_stale: bool,
    frame: u64,
    pending_destination: Option<Destination>,
    hydrations: Vec<JoinHandle<()>>,
    hydrated_tx: mpsc::UnboundedSender<Hydrated>,
    hydrated_rx: mpsc::UnboundedReceiver<Hydrated>,
    events: EventDispatcher,
}

impl WorldState {
    pub async fn load(
        source: Arc<dyn TextSource>,
        world_file: &str,
        spawn: Position,
        options: SessionOptions,
        events: EventDispatcher,
    ) -> Result<Self, SessionError> {
        let world = fetch_world(source.as_ref(), world_file).await?;
        check_spawn(&world, spawn)?;
        let (hydrated_tx, hydrated_rx) = mpsc::unbounded_channel();
        let player = PlayerState::spawn(&world, spawn);
        let mut state = Self {
            source,
            world: Arc::new(world),
            world_file: world_file.to_string(),
            generation: 0,
            player,
            context: HydrationContext {
                player_name: options.player_name,
                inventory: options.inventory,
            },
            interaction: None,
            resolved: None,
            viewport: options.viewport,
            marker: options.marker,
            overlay: None,
            overlay_stale: true,
            frame: 0,
            pending_destination: None,
            hydrations: Vec::new(),
            hydrated_tx,
            hydrated_rx,
            events,
        };
        state.announce_world();
        state.load_overlay().await;
        Ok(state)
    }

    /// Resumes a saved slot.
    pub async fn restore(
        source: Arc<dyn TextSource>,
        save: SaveState,
        mut options: SessionOptions,
        events: EventDispatcher,
    ) -> Result<Self, SessionError> {
        if !save.player_name.is_empty() {
            options.player_name = save.player_name;
        }
        options.inventory = save.inventory;
        Self::load(source, &save.world, save.position, options, events).await
    }

    pub fn snapshot(&self) -> SaveState {
        SaveState {
            world: self.world_file.clone(),
            position: self.player.position,
            zone: self
                .player
                .zone
                .as_ref()
                .map(|zone| zone.spec.overlay_file.clone()),
            player_name: self.context.player_name.clone(),
            inventory: self.context.inventory.clone(),
        }
    }

    pub fn world(&self) -> &WorldModel {
        &self.world
    }

    pub fn world_file(&self) -> &str {
        &self.world_file
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn inventory(&self) -> &Inventory {
        &self.context.inventory
    }

    pub fn interaction(&self) -> Option<&Interaction> {
        self.interaction.as_ref()
    }

    pub fn marker(&self) -> char {
        self.marker
    }

    pub fn overlay(&self) -> Option<&ZoneOverlay> {
        self.overlay.as_ref()
    }

    /// Applies one directional input. Never waits on I/O; NPC hydration is
    /// spawned and picked up by [`WorldState::settle`]. Must run inside a
    /// Tokio runtime.
    pub fn input(&mut self, direction: Direction) -> MoveOutcome {
        let outcome = self
            .player
            .apply_move(&self.world, direction, &self.context.inventory);
        match &outcome {
            MoveOutcome::Moved {
                position,
                zone_changed,
            } => {
                self.events.emit(GameEvent::Moved {
                    position: *position,
                });
                self.clear_interaction();
                if *zone_changed {
                    self.zone_changed();
                }
            }
            MoveOutcome::Teleported {
                position,
                zone_changed,
            } => {
                tracing::debug!(position = %position, "teleported");
                self.events.emit(GameEvent::Destination(Destination {
                    coordinates: *position,
                    world_file: None,
                }));
                self.events.emit(GameEvent::Moved {
                    position: *position,
                });
                self.clear_interaction();
                if *zone_changed {
                    self.zone_changed();
                }
            }
            MoveOutcome::Bumped { target, subject } => {
                self.clear_interaction();
                self.request_hydration(*target, *subject);
            }
            MoveOutcome::Transition(destination) => {
                tracing::info!(
                    world = ?destination.world_file,
                    coordinates = %destination.coordinates,
                    "world transition requested"
                );
                self.events.emit(GameEvent::Destination(destination.clone()));
                self.pending_destination = Some(destination.clone());
            }
            MoveOutcome::Locked { target, text } => {
                self.events.emit(GameEvent::Locked {
                    target: *target,
                    text: text.clone(),
                });
            }
            MoveOutcome::Blocked { .. } => self.clear_interaction(),
            MoveOutcome::Confirmed { .. } => {}
        }
        outcome
    }

    /// Input followed by [`WorldState::settle`].
    pub async fn step(&mut self, direction: Direction) -> Result<MoveOutcome, SessionError> {
        let outcome = self.input(direction);
        self.settle().await?;
        Ok(outcome)
    }

    /// Waits for in-flight hydrations, then performs any pending transition
    /// and overlay load.
    pub async fn settle(&mut self) -> Result<(), SessionError> {
        for task in std::mem::take(&mut self.hydrations) {
            if let Err(err) = task.await {
                tracing::warn!(error = %err, "hydration task failed");
            }
        }
        while let Ok(hydrated) = self.hydrated_rx.try_recv() {
            self.commit(hydrated);
        }
        if let Some(destination) = self.pending_destination.take() {
            self.travel(destination).await?;
        }
        if self.overlay_stale {
            self.load_overlay().await;
        }
        Ok(())
    }

    /// Moves to `destination`. A new world is fetched and parsed completely
    /// before anything is replaced.
    pub async fn travel(&mut self, destination: Destination) -> Result<(), SessionError> {
        let Some(world_file) = destination.world_file else {
            check_spawn(&self.world, destination.coordinates)?;
            let previous = self.player.zone.as_ref().map(|zone| zone.index);
            self.player = PlayerState::spawn(&self.world, destination.coordinates);
            self.events.emit(GameEvent::Moved {
                position: destination.coordinates,
            });
            self.clear_interaction();
            if previous != self.player.zone.as_ref().map(|zone| zone.index) {
                self.zone_changed();
                self.load_overlay().await;
            }
            return Ok(());
        };

        let world = fetch_world(self.source.as_ref(), &world_file).await?;
        check_spawn(&world, destination.coordinates)?;
        self.generation += 1;
        self.player = PlayerState::spawn(&world, destination.coordinates);
        self.world = Arc::new(world);
        self.world_file = world_file;
        self.interaction = None;
        self.resolved = None;
        self.pending_destination = None;
        self.announce_world();
        self.load_overlay().await;
        Ok(())
    }

    /// Runs the named entry of the current interaction. `path` selects a menu
    /// entry, descending into sub-menus.
    pub fn choose(&mut self, action: &str, path: &[usize]) -> Result<Option<ActionEvent>, SessionError> {
        let interaction = self.interaction.as_mut().ok_or(SessionError::NoInteraction)?;
        let entry = &mut interaction
            .actions
            .iter_mut()
            .find(|candidate| candidate.name == action)
            .ok_or_else(|| SessionError::UnknownAction(action.to_string()))?
            .entry;

        let event = match entry {
            ActionEntry::Text(_) => return Ok(None),
            ActionEntry::Event { event, .. } => event.clone(),
            ActionEntry::Menu(items) => {
                let unknown = || SessionError::UnknownEntry {
                    action: action.to_string(),
                    path: path.to_vec(),
                };
                let Some((last, parents)) = path.split_last() else {
                    return Ok(None);
                };
                let mut menu = items;
                for index in parents {
                    menu = &mut menu.get_mut(*index).ok_or_else(unknown)?.children;
                }
                let chosen: &MenuItem = menu.get(*last).ok_or_else(unknown)?;
                let Some(event) = chosen.event.clone() else {
                    return Ok(None);
                };
                apply_trade(&mut self.context.inventory, &event, chosen.gold)?;
                if chosen.consume {
                    menu.remove(*last);
                }
                event
            }
        };

        if let ActionEvent::Destination(destination) = &event {
            self.pending_destination = Some(destination.clone());
        }
        self.events.emit(GameEvent::Action(event.clone()));
        Ok(Some(event))
    }

    /// NPCs in this world that react to the ambient event `name`.
    pub async fn ambient(&self, name: &str) -> Vec<Interaction> {
        hydrate::ambient(&self.world, name, &self.context, self.source.as_ref()).await
    }

    pub fn tick(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::paged(self.player.position, self.viewport)
    }

    pub fn layers(&self) -> Layers {
        Layers::compute(&self.world, &self.viewport(), self.marker)
    }

    pub fn bump_layer(&self) -> Vec<Vec<char>> {
        bump_layer(&self.viewport(), self.player.bump, self.resolved)
    }

    /// The zone overlay for the current frame, when the player stands in a
    /// zone whose overlay loaded.
    pub fn overlay_layer(&self) -> Option<Vec<Vec<char>>> {
        let zone = self.player.zone.as_ref()?;
        let overlay = self.overlay.as_ref()?;
        let offset = animation_offset(&zone.spec.directions, self.frame);
        Some(overlay.render(&self.viewport(), zone.bounds, offset))
    }

    fn request_hydration(&mut self, target: Position, subject: BumpSubject) {
        if let Some(interaction) = hydrate::hydrate_static(&self.world, subject, &self.context) {
            self.commit(Hydrated {
                generation: self.generation,
                target,
                subject: subject.position(),
                interaction,
            });
            return;
        }
        let world = Arc::clone(&self.world);
        let source = Arc::clone(&self.source);
        let context = self.context.clone();
        let sender = self.hydrated_tx.clone();
        let generation = self.generation;
        self.hydrations.retain(|task| !task.is_finished());
        self.hydrations.push(tokio::spawn(async move {
            let interaction = hydrate::hydrate(&world, subject, &context, source.as_ref()).await;
            let _ = sender.send(Hydrated {
                generation,
                target,
                subject: subject.position(),
                interaction,
            });
        }));
    }

    fn commit(&mut self, hydrated: Hydrated) {
        if hydrated.generation != self.generation || self.player.bump != Some(hydrated.target) {
            tracing::debug!(target = %hydrated.target, "stale interaction discarded");
            return;
        }
        self.resolved = Some(hydrated.subject);
        self.events
            .emit(GameEvent::Interaction(Some(Box::new(hydrated.interaction.clone()))));
        self.interaction = Some(hydrated.interaction);
    }

    fn clear_interaction(&mut self) {
        self.resolved = None;
        if self.interaction.take().is_some() {
            self.events.emit(GameEvent::Interaction(None));
        }
    }

    fn zone_changed(&mut self) {
        self.overlay = None;
        self.overlay_stale = true;
        self.events.emit(GameEvent::ZoneChanged {
            overlay_file: self
                .player
                .zone
                .as_ref()
                .map(|zone| zone.spec.overlay_file.clone()),
        });
    }

    fn announce_world(&self) {
        tracing::info!(
            world = %self.world_file,
            rows = self.world.rows(),
            cols = self.world.cols(),
            objects = self.world.points.len(),
            zones = self.world.zones.len(),
            "world loaded"
        );
        self.events.emit(GameEvent::WorldLoaded {
            name: self.world_file.clone(),
        });
        self.events.emit(GameEvent::Moved {
            position: self.player.position,
        });
        self.events.emit(GameEvent::Interaction(None));
        self.events.emit(GameEvent::ZoneChanged {
            overlay_file: self
                .player
                .zone
                .as_ref()
                .map(|zone| zone.spec.overlay_file.clone()),
        });
    }

    async fn load_overlay(&mut self) {
        self.overlay_stale = false;
        self.overlay = None;
        let Some(file) = self
            .player
            .zone
            .as_ref()
            .map(|zone| zone.spec.overlay_file.clone())
        else {
            return;
        };
        match self.source.fetch_text(&zone_path(&file)).await {
            Ok(text) => self.overlay = Some(ZoneOverlay::parse(&text)),
            Err(err) => tracing::warn!(overlay = %file, error = %err, "zone overlay unavailable"),
        }
    }
}

async fn fetch_world(source: &dyn TextSource, world_file: &str) -> Result<WorldModel, SessionError> {
    let text = source.fetch_text(&world_path(world_file)).await?;
    WorldModel::parse(world_file, &text).map_err(|source| SessionError::World {
        name: world_file.to_string(),
        source,
    })
}

fn check_spawn(world: &WorldModel, position: Position) -> Result<(), SessionError> {
    if world.in_bounds(position) {
        Ok(())
    } else {
        Err(SessionError::SpawnOutOfBounds {
            name: world.name.clone(),
            position,
        })
    }
}

/// Applies a chosen menu entry's gold and item effects.
fn apply_trade(inventory: &mut Inventory, event: &ActionEvent, gold: Option<i64>) -> Result<(), SessionError> {
    match event {
        ActionEvent::Acquire(item) => {
            match gold {
                Some(delta) if delta < 0 => {
                    let mut bought = item.clone();
                    bought.id = None;
                    inventory.buy(bought)?;
                }
                _ => {
                    inventory.add(item.clone());
                }
            }
            tracing::info!(item = %item.name, gold = inventory.gold, "item acquired");
        }
        ActionEvent::Sell(item) => {
            let id = item.id.unwrap_or(ItemId(0));
            let price = inventory.sell(&item.kind, id)?;
            tracing::info!(item = %item.name, price, gold = inventory.gold, "item sold");
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryTextSource;
    use crate::entities::item::Item;
    use crate::world::events::drain;

    const VILLAGE: &str = "\
##########
#........#
#........#
#........#
##########
---
#:Wall#Look=Old stones.
---
(2,4):Well#Look=A deep well.
(2,6):Merchant/merchant.txt
(4,6):Ghost/ghost.txt
(2,9)=(4,9):Stairs
(4,2)=(2,2):Cave/cave.txt
rain.txt@>1:[4,8,4,9]
";

    const CAVE: &str = "\
#####
#...#
#####
---
#:Rock
";

    const MERCHANT: &str = "\
Look
A merchant.
---
Greet
Hi ${playerName}.
---
Buy
weapon/sword/1/IronSword/5
";

    fn source() -> Arc<dyn TextSource> {
        Arc::new(
            MemoryTextSource::default()
                .with("world/village.txt", VILLAGE)
                .with("world/cave.txt", CAVE)
                .with("world/broken.txt", "..\n---\nnonsense line\n")
                .with("npc/merchant.txt", MERCHANT)
                .with("zone/rain.txt", "'\n"),
        )
    }

    async fn session(gold: i64) -> (WorldState, mpsc::UnboundedReceiver<GameEvent>) {
        let (events, receiver) = EventDispatcher::channel();
        let options = SessionOptions {
            player_name: "Ada".to_string(),
            viewport: ViewportSize { width: 5, height: 5 },
            inventory: Inventory::with_gold(gold),
            ..SessionOptions::default()
        };
        let state = WorldState::load(source(), "village.txt", Position::at(1, 1), options, events)
            .await
            .expect("session");
        (state, receiver)
    }

    #[tokio::test]
    async fn load_announces_the_world() {
        let (_state, mut receiver) = session(0).await;
        let events = drain(&mut receiver);
        assert_eq!(
            events[0],
            GameEvent::WorldLoaded {
                name: "village.txt".to_string()
            }
        );
        assert!(events.contains(&GameEvent::Moved {
            position: Position::at(1, 1)
        }));
    }

    #[tokio::test]
    async fn static_interactions_commit_immediately() {
        let (mut state, _receiver) = session(0).await;
        state.input(Direction::East);
        assert_eq!(state.player().position, Position::at(1, 2));
        let outcome = state.input(Direction::East);
        assert!(matches!(outcome, MoveOutcome::Bumped { .. }));
        let interaction = state.interaction().expect("interaction");
        assert_eq!(interaction.label, "Well");
        assert_eq!(state.bump_layer()[1][3], crate::world::viewport::BUMP_RESOLVED);

        state.input(Direction::South);
        assert!(state.interaction().is_none());
    }

    #[tokio::test]
    async fn npc_interactions_arrive_on_settle() {
        let (mut state, mut receiver) = session(0).await;
        state.input(Direction::South);
        for _ in 0..4 {
            state.input(Direction::East);
        }
        assert_eq!(state.player().position, Position::at(2, 5));
        drain(&mut receiver);
        state.input(Direction::North);
        assert!(state.interaction().is_none());
        state.settle().await.expect("settle");
        let interaction = state.interaction().expect("interaction");
        assert_eq!(interaction.name.as_deref(), Some("Merchant"));
        let events = drain(&mut receiver);
        assert!(events
            .iter()
            .any(|event| matches!(event, GameEvent::Interaction(Some(found)) if found.label == "Merchant")));
    }

    #[tokio::test]
    async fn superseded_hydration_is_discarded() {
        let (mut state, _receiver) = session(0).await;
        state.input(Direction::South);
        for _ in 0..4 {
            state.input(Direction::East);
        }
        state.input(Direction::North);
        state.input(Direction::West);
        state.settle().await.expect("settle");
        assert!(state.interaction().is_none());
        assert_eq!(state.player().position, Position::at(2, 4));
    }

    #[tokio::test]
    async fn buying_charges_gold_and_consumes_the_entry() {
        let (mut state, _receiver) = session(20).await;
        state.input(Direction::South);
        for _ in 0..4 {
            state.input(Direction::East);
        }
        state.step(Direction::North).await.expect("step");
        let event = state.choose("Buy", &[0]).expect("buy");
        assert!(matches!(event, Some(ActionEvent::Acquire(item)) if item.name == "IronSword"));
        assert_eq!(state.inventory().gold, 8);
        assert!(state.inventory().owns_named("weapon", "IronSword"));
        let Some(ActionEntry::Menu(menu)) = state
            .interaction()
            .and_then(|interaction| interaction.action("Buy"))
            .map(|action| &action.entry)
        else {
            panic!("buy menu expected");
        };
        assert!(menu.is_empty());
        assert!(matches!(
            state.choose("Buy", &[0]),
            Err(SessionError::UnknownEntry { .. })
        ));
    }

    #[tokio::test]
    async fn buying_without_gold_fails() {
        let (mut state, _receiver) = session(3).await;
        state.input(Direction::South);
        for _ in 0..4 {
            state.input(Direction::East);
        }
        state.step(Direction::North).await.expect("step");
        assert!(matches!(
            state.choose("Buy", &[0]),
            Err(SessionError::Inventory(InventoryError::InsufficientGold { needed: 12, available: 3 }))
        ));
        assert_eq!(state.inventory().gold, 3);
    }

    #[tokio::test]
    async fn missing_npc_file_settles_to_a_placeholder() {
        let (mut state, _receiver) = session(0).await;
        state.input(Direction::South);
        for _ in 0..4 {
            state.input(Direction::East);
        }
        state.step(Direction::South).await.expect("step");
        let interaction = state.interaction().expect("interaction");
        assert_eq!(interaction.name.as_deref(), Some("Ghost"));
        assert!(interaction.action("Look").is_some());
    }

    #[tokio::test]
    async fn world_transition_swaps_world_and_player() {
        let (mut state, mut receiver) = session(0).await;
        state.input(Direction::South);
        state.step(Direction::South).await.expect("bump");
        let outcome = state.step(Direction::South).await.expect("transition");
        assert!(matches!(outcome, MoveOutcome::Transition(_)));
        assert_eq!(state.world_file(), "cave.txt");
        assert_eq!(state.player().position, Position::at(1, 1));
        assert_eq!(state.player().bump, None);
        assert!(state.interaction().is_none());
        let events = drain(&mut receiver);
        assert!(events.contains(&GameEvent::WorldLoaded {
            name: "cave.txt".to_string()
        }));
    }

    #[tokio::test]
    async fn broken_world_is_not_installed() {
        let (mut state, _receiver) = session(0).await;
        let err = state
            .travel(Destination {
                coordinates: Position::at(0, 0),
                world_file: Some("broken.txt".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::World { .. }));
        assert_eq!(state.world_file(), "village.txt");
        assert_eq!(state.player().position, Position::at(1, 1));

        let err = state
            .travel(Destination {
                coordinates: Position::at(9, 9),
                world_file: Some("cave.txt".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::SpawnOutOfBounds { .. }));
        assert_eq!(state.world_file(), "village.txt");
    }

    #[tokio::test]
    async fn stairs_teleport_within_the_world_and_enter_the_zone() {
        let (mut state, mut receiver) = session(0).await;
        state.input(Direction::South);
        for _ in 0..7 {
            state.input(Direction::East);
        }
        assert_eq!(state.player().position, Position::at(2, 8));
        state.input(Direction::North);
        let outcome = state.step(Direction::North).await.expect("teleport");
        assert_eq!(
            outcome,
            MoveOutcome::Teleported {
                position: Position::at(3, 8),
                zone_changed: true
            }
        );
        assert!(state.overlay().is_some());
        assert!(state.overlay_layer().is_some());
        let events = drain(&mut receiver);
        assert!(events.contains(&GameEvent::ZoneChanged {
            overlay_file: Some("rain.txt".to_string())
        }));
    }

    #[tokio::test]
    async fn snapshot_restores_the_session() {
        let (mut state, _receiver) = session(5).await;
        state.input(Direction::East);
        let mut save = state.snapshot();
        save.inventory
            .add(Item::parse_spec("ring/gold/0/Gold ring/0").expect("ring"));
        let (events, _receiver) = EventDispatcher::channel();
        let restored = WorldState::restore(source(), save, SessionOptions::default(), events)
            .await
            .expect("restore");
        assert_eq!(restored.player().position, Position::at(1, 2));
        assert_eq!(restored.inventory().gold, 5);
        assert_eq!(restored.snapshot().player_name, "Ada");
        assert_eq!(restored.inventory().items("ring").len(), 1);
    }

    #[tokio::test]
    async fn ambient_uses_the_current_world() {
        let (state, _receiver) = session(0).await;
        let found = state.ambient("Greet").await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start.as_deref(), Some("Greet"));
    }

    struct BrokenNpcSource(MemoryTextSource);

    #[async_trait::async_trait]
    impl TextSource for BrokenNpcSource {
        async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
            if path.starts_with("npc/") {
                panic!("npc store unavailable");
            }
            self.0.fetch_text(path).await
        }
    }

    #[tokio::test]
    async fn bumping_elsewhere_clears_the_shown_interaction() {
        let (mut state, mut receiver) = session(0).await;
        state.input(Direction::South);
        for _ in 0..4 {
            state.input(Direction::East);
        }
        state.step(Direction::North).await.expect("merchant");
        assert!(state.interaction().is_some());
        drain(&mut receiver);

        state.input(Direction::South);
        state.input(Direction::West);
        state.settle().await.expect("settle");
        assert!(state.interaction().is_none());
        let shown: Vec<GameEvent> = drain(&mut receiver)
            .into_iter()
            .filter(|event| matches!(event, GameEvent::Interaction(_)))
            .collect();
        assert_eq!(shown, vec![GameEvent::Interaction(None)]);
    }

    #[tokio::test]
    async fn failed_hydration_task_does_not_stall_settle() {
        let (events, _receiver) = EventDispatcher::channel();
        let source: Arc<dyn TextSource> = Arc::new(BrokenNpcSource(
            MemoryTextSource::default().with("world/village.txt", VILLAGE),
        ));
        let mut state = WorldState::load(source, "village.txt", Position::at(1, 1), SessionOptions::default(), events)
            .await
            .expect("session");
        state.input(Direction::South);
        for _ in 0..4 {
            state.input(Direction::East);
        }
        state.step(Direction::North).await.expect("step");
        assert!(state.interaction().is_none());
        assert_eq!(state.player().bump, Some(Position::at(1, 5)));

        state.input(Direction::West);
        assert_eq!(state.player().position, Position::at(2, 4));
    }
}
