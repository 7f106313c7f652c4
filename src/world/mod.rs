pub mod events;
pub mod format;
pub mod model;
pub mod movement;
pub mod object_spec;
pub mod position;
pub mod state;
pub mod viewport;
pub mod zone;
