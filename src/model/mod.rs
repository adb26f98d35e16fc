mod assembly;

pub use assembly::{assembly_display_name, TestAssembly};
pub use test::{TestCase, TestState};
