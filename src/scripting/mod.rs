pub mod dialogue;
pub mod template;
