pub mod caller;
pub mod path_ids;
pub mod validated_json;

pub use caller::Caller;
pub use path_ids::{DuelId, RoundId, RoundNumber};
pub use validated_json::ValidatedJson;
