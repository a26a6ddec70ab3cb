pub mod reward_generator;

pub use reward_generator::{
    load_fragment_list, IdSource, QuestDefinition, RandomHexIds, RewardGenerator,
};
