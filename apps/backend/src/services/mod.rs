pub mod duel_flow;
pub mod engine;
pub mod illustration;

pub use engine::DuelEngine;
