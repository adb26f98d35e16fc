use std::path::{Path, PathBuf};

use super::TestCase;

/// Tests grouped under the project or assembly they were discovered in.
#[derive(Debug, Clone)]
pub struct TestAssembly {
    pub path: PathBuf,
    pub tests: Vec<TestCase>,
}

impl TestAssembly {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            tests: Vec::new(),
        }
    }

    pub fn name(&self) -> String {
        assembly_display_name(&self.path.to_string_lossy())
    }

    pub fn test_count(&self) -> usize {
        self.tests.len()
    }
}

/// File name without its extension, e.g. `bin/Debug/Foo.Tests.dll` -> `Foo.Tests`.
pub fn assembly_display_name(group_key: &str) -> String {
    Path::new(group_key)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
