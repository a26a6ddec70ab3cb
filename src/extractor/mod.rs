pub mod aggregate;
pub mod loot_table;
pub mod mod_classifier;
pub mod quest_text;

pub use aggregate::{RecordSet, Sourced};
pub use loot_table::{LootEntry, LootTableExtractor};
pub use mod_classifier::ModClassifier;
pub use quest_text::{QuestItems, QuestTextExtractor};
