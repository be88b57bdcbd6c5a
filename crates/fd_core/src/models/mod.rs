pub mod bonus;
pub mod familiar;

pub use bonus::{normalize_multiplier, BonusItem, ConditionalBonus};
pub use familiar::{Familiar, Rank};
