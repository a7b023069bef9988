pub mod contract_registry;
pub mod display_vote;
pub mod network;
pub mod prompt;
