pub mod quest_organizer;

pub use quest_organizer::{move_file, QuestOrganizer};
