mod assemblies;
pub mod layout;
mod test_result;
mod theme;

pub use layout::{draw, DeckState, InputMode};
