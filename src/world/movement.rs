use crate::entities::inventory::Possesses;
use crate::world::events::Destination;
use crate::world::model::WorldModel;
use crate::world::object_spec::ObjectSpec;
use crate::world::position::{Direction, Position};
use crate::world::zone::ActiveZone;

/// What a bump resolves to: a placed object, or the terrain glyph itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpSubject {
    Object(Position),
    Terrain(Position),
}

impl BumpSubject {
    pub fn position(self) -> Position {
        match self {
            BumpSubject::Object(position) | BumpSubject::Terrain(position) => position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved { position: Position, zone_changed: bool },
    /// First bump; the subject's interaction should be resolved.
    Bumped { target: Position, subject: BumpSubject },
    /// Second bump into something with nowhere to go.
    Confirmed { target: Position },
    Teleported { position: Position, zone_changed: bool },
    Transition(Destination),
    Locked { target: Position, text: String },
    Blocked { target: Position },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerState {
    pub position: Position,
    pub bump: Option<Position>,
    pub zone: Option<ActiveZone>,
}

impl PlayerState {
    pub fn spawn(world: &WorldModel, position: Position) -> Self {
        Self {
            position,
            bump: None,
            zone: world.zone_at(position),
        }
    }

    pub fn apply_move(
        &mut self,
        world: &WorldModel,
        direction: Direction,
        possesses: &dyn Possesses,
    ) -> MoveOutcome {
        let Some(target) = self.position.step(direction) else {
            self.bump = None;
            return MoveOutcome::Blocked {
                target: self.position,
            };
        };
        if !world.in_bounds(target) {
            self.bump = None;
            return MoveOutcome::Blocked { target };
        }

        let subject = bump_subject(world, target, direction);
        if world.is_passable(target) && subject.is_none() {
            self.bump = None;
            let zone_changed = self.relocate(world, target);
            return MoveOutcome::Moved {
                position: target,
                zone_changed,
            };
        }

        if self.bump == Some(target) {
            return self.confirm(world, target, subject, possesses);
        }

        self.bump = Some(target);
        MoveOutcome::Bumped {
            target,
            subject: subject.unwrap_or(BumpSubject::Terrain(target)),
        }
    }

    fn confirm(
        &mut self,
        world: &WorldModel,
        target: Position,
        subject: Option<BumpSubject>,
        possesses: &dyn Possesses,
    ) -> MoveOutcome {
        let object = match subject {
            Some(BumpSubject::Object(position)) => world.object_at(position),
            _ => None,
        };
        match object {
            Some(ObjectSpec::Door(door)) => {
                if let Some(key) = door.key() {
                    if !possesses.possesses("ring", key) {
                        return MoveOutcome::Locked {
                            target,
                            text: door.locked_text().to_string(),
                        };
                    }
                }
                self.bump = None;
                let zone_changed = self.relocate(world, door.destination);
                MoveOutcome::Teleported {
                    position: door.destination,
                    zone_changed,
                }
            }
            Some(ObjectSpec::WorldTransition(transition)) => {
                self.bump = None;
                MoveOutcome::Transition(Destination {
                    coordinates: transition.destination,
                    world_file: Some(transition.world_file.clone()),
                })
            }
            _ => MoveOutcome::Confirmed { target },
        }
    }

    fn relocate(&mut self, world: &WorldModel, position: Position) -> bool {
        self.position = position;
        let zone = world.zone_at(position);
        let changed = zone.as_ref().map(|zone| zone.index) != self.zone.as_ref().map(|zone| zone.index);
        self.zone = zone;
        changed
    }
}

/// Finds the interactable a bump at `target` refers to. Blocking short terrain
/// with nothing on it lets the bump reach the cell behind.
pub fn bump_subject(world: &WorldModel, target: Position, direction: Direction) -> Option<BumpSubject> {
    if world.object_at(target).is_some() {
        return Some(BumpSubject::Object(target));
    }
    let short = world.sprite_at(target).is_some_and(|sprite| sprite.short);
    if short && !world.is_passable(target) {
        let behind = target.step(direction)?;
        if world.object_at(behind).is_some() {
            return Some(BumpSubject::Object(behind));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const HALL: &str = "\
#########
#.......#
#.~.....#
#.......#
#########
---
#:Wall
~:~Counter
---
(2,5):Sign#Read=Hello
(4,3):Clerk/clerk.txt
(2,8)=(4,8):Trapdoor
(4,6)=(2,2):Gate#key=gold#text=Bolted shut.
(4,2)=(1,1):Cellar/cellar.txt
zone.txt@>1:[2,2,3,4]
";

    fn world() -> WorldModel {
        WorldModel::parse("hall.txt", HALL).expect("world")
    }

    fn nothing(_: &str, _: &str) -> bool {
        false
    }

    #[test]
    fn walking_into_open_ground_moves_and_clears_bump() {
        let world = world();
        let mut player = PlayerState::spawn(&world, Position::at(1, 6));
        player.bump = Some(Position::at(0, 6));
        let outcome = player.apply_move(&world, Direction::South, &nothing);
        assert_eq!(
            outcome,
            MoveOutcome::Moved {
                position: Position::at(2, 6),
                zone_changed: false
            }
        );
        assert_eq!(player.bump, None);
    }

    #[test]
    fn first_bump_resolves_without_moving() {
        let world = world();
        let mut player = PlayerState::spawn(&world, Position::at(1, 3));
        let outcome = player.apply_move(&world, Direction::East, &nothing);
        assert_eq!(
            outcome,
            MoveOutcome::Bumped {
                target: Position::at(1, 4),
                subject: BumpSubject::Object(Position::at(1, 4))
            }
        );
        assert_eq!(player.position, Position::at(1, 3));
        assert_eq!(player.bump, Some(Position::at(1, 4)));

        let outcome = player.apply_move(&world, Direction::East, &nothing);
        assert_eq!(
            outcome,
            MoveOutcome::Confirmed {
                target: Position::at(1, 4)
            }
        );
    }

    #[test]
    fn walls_resolve_to_terrain() {
        let world = world();
        let mut player = PlayerState::spawn(&world, Position::at(1, 1));
        let outcome = player.apply_move(&world, Direction::North, &nothing);
        assert_eq!(
            outcome,
            MoveOutcome::Bumped {
                target: Position::at(0, 1),
                subject: BumpSubject::Terrain(Position::at(0, 1))
            }
        );
    }

    #[test]
    fn second_bump_into_a_door_teleports() {
        let world = world();
        let mut player = PlayerState::spawn(&world, Position::at(1, 6));
        player.apply_move(&world, Direction::East, &nothing);
        let outcome = player.apply_move(&world, Direction::East, &nothing);
        assert_eq!(
            outcome,
            MoveOutcome::Teleported {
                position: Position::at(3, 7),
                zone_changed: false
            }
        );
        assert_eq!(player.position, Position::at(3, 7));
        assert_eq!(player.bump, None);
    }

    #[test]
    fn locked_door_needs_the_ring() {
        let world = world();
        let mut player = PlayerState::spawn(&world, Position::at(3, 4));
        player.apply_move(&world, Direction::East, &nothing);
        let outcome = player.apply_move(&world, Direction::East, &nothing);
        assert_eq!(
            outcome,
            MoveOutcome::Locked {
                target: Position::at(3, 5),
                text: "Bolted shut.".to_string()
            }
        );
        assert_eq!(player.position, Position::at(3, 4));

        let ring = |kind: &str, id: &str| kind == "ring" && id == "gold";
        let outcome = player.apply_move(&world, Direction::East, &ring);
        assert_eq!(
            outcome,
            MoveOutcome::Teleported {
                position: Position::at(1, 1),
                zone_changed: true
            }
        );
        assert_eq!(player.zone.as_ref().map(|zone| zone.index), Some(0));
    }

    #[test]
    fn world_transition_emits_destination() {
        let world = world();
        let mut player = PlayerState::spawn(&world, Position::at(2, 1));
        player.apply_move(&world, Direction::South, &nothing);
        let outcome = player.apply_move(&world, Direction::South, &nothing);
        assert_eq!(
            outcome,
            MoveOutcome::Transition(Destination {
                coordinates: Position::at(0, 0),
                world_file: Some("cellar.txt".to_string()),
            })
        );
    }

    #[test]
    fn short_terrain_reaches_the_object_behind() {
        let world = world();
        let mut player = PlayerState::spawn(&world, Position::at(1, 2));
        let outcome = player.apply_move(&world, Direction::South, &nothing);
        assert_eq!(
            outcome,
            MoveOutcome::Bumped {
                target: Position::at(2, 2),
                subject: BumpSubject::Object(Position::at(3, 2))
            }
        );
    }

    #[test]
    fn leaving_the_grid_is_blocked() {
        let world = WorldModel::parse("tiny.txt", "..\n---\n").expect("world");
        let mut player = PlayerState::spawn(&world, Position::at(0, 0));
        player.bump = Some(Position::at(0, 1));
        let outcome = player.apply_move(&world, Direction::North, &nothing);
        assert_eq!(
            outcome,
            MoveOutcome::Blocked {
                target: Position::at(-1, 0)
            }
        );
        assert_eq!(player.bump, None);
        assert_eq!(player.position, Position::at(0, 0));
    }

    #[test]
    fn zone_follows_the_player() {
        let world = world();
        let mut player = PlayerState::spawn(&world, Position::at(2, 3));
        assert!(player.zone.is_some());
        let outcome = player.apply_move(&world, Direction::East, &nothing);
        assert_eq!(
            outcome,
            MoveOutcome::Moved {
                position: Position::at(2, 4),
                zone_changed: true
            }
        );
        assert!(player.zone.is_none());
    }

    const MARSH: &str = "\
.~..
.,..
.,..
---
~:~Reeds#passable=yes
,:~Fence
---
(1,3):Sign
(2,3)=(1,4):Gate
(3,3)=(1,1):Burrow/burrow.txt
";

    #[test]
    fn passable_short_terrain_is_walked_onto() {
        let world = WorldModel::parse("marsh.txt", MARSH).expect("world");
        let mut player = PlayerState::spawn(&world, Position::at(0, 0));
        let outcome = player.apply_move(&world, Direction::East, &nothing);
        assert_eq!(
            outcome,
            MoveOutcome::Moved {
                position: Position::at(0, 1),
                zone_changed: false
            }
        );
        let outcome = player.apply_move(&world, Direction::East, &nothing);
        assert_eq!(
            outcome,
            MoveOutcome::Bumped {
                target: Position::at(0, 2),
                subject: BumpSubject::Object(Position::at(0, 2))
            }
        );
    }

    #[test]
    fn confirmed_bump_reaches_a_door_behind_short_terrain() {
        let world = WorldModel::parse("marsh.txt", MARSH).expect("world");
        let mut player = PlayerState::spawn(&world, Position::at(1, 0));
        let outcome = player.apply_move(&world, Direction::East, &nothing);
        assert_eq!(
            outcome,
            MoveOutcome::Bumped {
                target: Position::at(1, 1),
                subject: BumpSubject::Object(Position::at(1, 2))
            }
        );
        let outcome = player.apply_move(&world, Direction::East, &nothing);
        assert_eq!(
            outcome,
            MoveOutcome::Teleported {
                position: Position::at(0, 3),
                zone_changed: false
            }
        );
        assert_eq!(player.bump, None);
    }

    #[test]
    fn confirmed_bump_reaches_a_world_transition_behind_short_terrain() {
        let world = WorldModel::parse("marsh.txt", MARSH).expect("world");
        let mut player = PlayerState::spawn(&world, Position::at(2, 0));
        player.apply_move(&world, Direction::East, &nothing);
        let outcome = player.apply_move(&world, Direction::East, &nothing);
        assert_eq!(
            outcome,
            MoveOutcome::Transition(Destination {
                coordinates: Position::at(0, 0),
                world_file: Some("burrow.txt".to_string()),
            })
        );
        assert_eq!(player.position, Position::at(2, 0));
    }
}
