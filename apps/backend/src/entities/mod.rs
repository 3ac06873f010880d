pub mod duel_rounds;
pub mod duels;

pub use duel_rounds::Entity as DuelRounds;
pub use duel_rounds::Model as DuelRound;
pub use duels::Entity as Duels;
pub use duels::Model as Duel;
