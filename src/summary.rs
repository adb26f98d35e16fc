use crate::model::TestState;

/// Display class for a summary; the UI maps it to a concrete color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorClass {
    #[default]
    Neutral,
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub text: String,
    /// One of `Passed`, `Failed` or `NotRun`.
    pub state: TestState,
    pub color: ColorClass,
}

impl Default for Summary {
    fn default() -> Self {
        Self {
            text: String::new(),
            state: TestState::NotRun,
            color: ColorClass::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateCounts {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub not_run: usize,
}

impl StateCounts {
    pub fn tally(states: impl IntoIterator<Item = TestState>) -> Self {
        let mut counts = Self::default();
        for state in states {
            match state {
                TestState::Passed => counts.passed += 1,
                TestState::Failed => counts.failed += 1,
                TestState::Skipped => counts.skipped += 1,
                TestState::NotRun => counts.not_run += 1,
                TestState::All => panic!("`All` is a filter selector, not a test result"),
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped + self.not_run
    }
}

/// Roll a set of test outcomes up into one status line.
///
/// `previous` is the summary currently on display. Its state is kept when
/// nothing was found, and the whole summary is kept when no test has run and
/// the previous state already records an outcome.
pub fn summarize(states: impl IntoIterator<Item = TestState>, previous: &Summary) -> Summary {
    let counts = StateCounts::tally(states);
    let count = counts.total();

    if count == 0 {
        return Summary {
            text: "no test was found inside this assembly".to_string(),
            state: previous.state,
            color: ColorClass::Neutral,
        };
    }

    let StateCounts {
        passed,
        failed,
        skipped,
        not_run,
    } = counts;

    if failed == 0 && not_run == 0 {
        Summary {
            text: format!("Success! {} test{}", passed, if passed == 1 { "" } else { "s" }),
            state: TestState::Passed,
            color: ColorClass::Success,
        }
    } else if failed > 0 || (not_run > 0 && not_run < count) {
        // singular for zero as well: "0 failure, 0 skip"
        Summary {
            text: format!(
                "{} success, {} failure{}, {} skip{}, {} not run",
                passed,
                failed,
                if failed > 1 { "s" } else { "" },
                skipped,
                if skipped > 1 { "s" } else { "" },
                not_run
            ),
            state: TestState::Failed,
            color: ColorClass::Failure,
        }
    } else if previous.state == TestState::NotRun {
        Summary {
            text: format!(
                "{} test case{}, {}",
                count,
                if count == 1 { "" } else { "s" },
                previous.state
            ),
            state: previous.state,
            color: ColorClass::Success,
        }
    } else {
        previous.clone()
    }
}
