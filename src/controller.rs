//! View-model for one test assembly.
//!
//! The controller is owned by a single task. Filter edits are debounced and
//! applied when that task calls [`TestCollectionController::pump`] or awaits
//! [`TestCollectionController::next_event`]; runner results arrive over a
//! channel and are applied the same way.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::busy::BusyFlag;
use crate::debounce::Debouncer;
use crate::error::{DeckError, Result};
use crate::model::{assembly_display_name, TestCase, TestState};
use crate::observable::{Observable, Subscription};
use crate::runner::{ResultSink, ResultUpdate, TestRunner};
use crate::summary::{summarize, Summary};
use crate::view::filter::{compare_tests, is_test_filter_match, TestFilter};
use crate::view::{FilteredSortedView, ViewChange};

/// What [`TestCollectionController::next_event`] applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    FilterApplied,
    ResultApplied(String),
}

pub struct TestCollectionController {
    display_name: String,
    tests: Vec<TestCase>,
    positions: HashMap<String, usize>,
    view: FilteredSortedView<TestCase, TestFilter>,
    search_text: Observable<String>,
    result_filter: Observable<TestState>,
    summary: Observable<Summary>,
    debouncer: Debouncer<TestFilter>,
    busy: BusyFlag,
    updates_tx: mpsc::UnboundedSender<ResultUpdate>,
    updates_rx: mpsc::UnboundedReceiver<ResultUpdate>,
}

impl TestCollectionController {
    pub fn new(group_key: &str, tests: Vec<TestCase>, debounce: Duration) -> Result<Self> {
        let positions = index_tests(&tests)?;
        let filter = TestFilter::default();
        let view = FilteredSortedView::new(&tests, is_test_filter_match, filter.clone(), compare_tests);
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();

        let mut controller = Self {
            display_name: assembly_display_name(group_key),
            tests,
            positions,
            view,
            search_text: Observable::new(filter.search),
            result_filter: Observable::new(filter.state),
            summary: Observable::default(),
            debouncer: Debouncer::new(debounce),
            busy: BusyFlag::new(),
            updates_tx,
            updates_rx,
        };
        controller.refresh_summary();
        Ok(controller)
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Every test, unfiltered, in discovery order.
    pub fn tests(&self) -> &[TestCase] {
        &self.tests
    }

    pub fn visible_tests(&self) -> impl Iterator<Item = &TestCase> + '_ {
        self.view.iter(&self.tests)
    }

    pub fn visible_len(&self) -> usize {
        self.view.len()
    }

    pub fn visible_test(&self, position: usize) -> Option<&TestCase> {
        self.view.get(&self.tests, position)
    }

    /// The filter the view currently applies, which lags the edited
    /// properties while a debounce is pending.
    pub fn applied_filter(&self) -> &TestFilter {
        self.view.argument()
    }

    pub fn search_text(&self) -> &str {
        self.search_text.get()
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        if self.search_text.set(text.into()) {
            self.filter_after_delay();
        }
    }

    pub fn result_filter(&self) -> TestState {
        *self.result_filter.get()
    }

    pub fn set_result_filter(&mut self, state: TestState) {
        if self.result_filter.set(state) {
            self.filter_after_delay();
        }
    }

    pub fn summary(&self) -> &Summary {
        self.summary.get()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_set()
    }

    /// Follow the busy flag from any task; the run's guard flips it back.
    pub fn subscribe_busy(&self) -> watch::Receiver<bool> {
        self.busy.subscribe()
    }

    pub fn filter_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn subscribe_summary(&mut self, handler: impl FnMut(&Summary) + 'static) -> Subscription {
        self.summary.subscribe(handler)
    }

    pub fn unsubscribe_summary(&mut self, subscription: Subscription) -> bool {
        self.summary.unsubscribe(subscription)
    }

    pub fn subscribe_search_text(&mut self, handler: impl FnMut(&String) + 'static) -> Subscription {
        self.search_text.subscribe(handler)
    }

    pub fn subscribe_result_filter(&mut self, handler: impl FnMut(&TestState) + 'static) -> Subscription {
        self.result_filter.subscribe(handler)
    }

    pub fn subscribe_view(&mut self, handler: impl FnMut(&ViewChange) + 'static) -> Subscription {
        self.view.subscribe(handler)
    }

    pub fn unsubscribe_view(&mut self, subscription: Subscription) -> bool {
        self.view.unsubscribe(subscription)
    }

    /// Channel a runner reports into; results are applied by `pump`/`next_event`.
    pub fn result_sink(&self) -> ResultSink {
        ResultSink::new(self.updates_tx.clone())
    }

    pub fn add_test(&mut self, test: TestCase) -> Result<()> {
        if self.positions.contains_key(&test.unique_name) {
            return Err(DeckError::DuplicateTest(test.unique_name));
        }
        self.positions.insert(test.unique_name.clone(), self.tests.len());
        self.tests.push(test);
        self.collection_changed();
        Ok(())
    }

    pub fn remove_test(&mut self, unique_name: &str) -> Option<TestCase> {
        let index = self.positions.remove(unique_name)?;
        let removed = self.tests.remove(index);
        for position in self.positions.values_mut() {
            if *position > index {
                *position -= 1;
            }
        }
        self.collection_changed();
        Some(removed)
    }

    /// Apply one runner outcome. Returns false for tests this assembly does
    /// not contain.
    pub fn apply_result(&mut self, update: ResultUpdate) -> bool {
        let Some(&index) = self.positions.get(&update.unique_name) else {
            debug!(assembly = %self.display_name, test = %update.unique_name, "ignoring result for unknown test");
            return false;
        };

        let test = &mut self.tests[index];
        test.set_result(update.state);
        if update.duration_ms.is_some() {
            test.duration_ms = update.duration_ms;
        }
        if update.state != TestState::Failed {
            test.error_message = None;
        } else if update.error_message.is_some() {
            test.error_message = update.error_message;
        }

        self.view.notify_item_changed(&self.tests, index);
        self.refresh_summary();
        true
    }

    /// Apply a pending filter immediately instead of waiting out the delay.
    pub fn flush_filter(&mut self) -> bool {
        match self.debouncer.cancel() {
            Some(filter) => self.apply_filter(filter),
            None => false,
        }
    }

    /// Apply whatever is ready without waiting: an expired filter and any
    /// queued results. Returns true if anything was applied.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        if let Some(filter) = self.debouncer.poll_expired() {
            self.apply_filter(filter);
            changed = true;
        }
        while let Ok(update) = self.updates_rx.try_recv() {
            changed |= self.apply_result(update);
        }
        changed
    }

    /// Wait for the next debounced filter or runner result and apply it.
    pub async fn next_event(&mut self) -> ControllerEvent {
        enum Ready {
            Filter(TestFilter),
            Update(ResultUpdate),
        }

        // `updates_tx` lives in self, so `recv` never yields `None`
        let ready = tokio::select! {
            filter = self.debouncer.fired() => Ready::Filter(filter),
            Some(update) = self.updates_rx.recv() => Ready::Update(update),
        };

        match ready {
            Ready::Filter(filter) => {
                self.apply_filter(filter);
                ControllerEvent::FilterApplied
            }
            Ready::Update(update) => {
                let name = update.unique_name.clone();
                self.apply_result(update);
                ControllerEvent::ResultApplied(name)
            }
        }
    }

    /// Start `runner` over every test, filtered or not.
    ///
    /// The busy flag is held until the spawned run ends, fails, or is
    /// aborted. Awaiting the returned handle yields the runner's own result.
    /// Must be called within a tokio runtime.
    pub fn run_tests<R: TestRunner>(&self, runner: Arc<R>) -> Result<JoinHandle<Result<()>>> {
        let guard = self.busy.try_acquire().ok_or(DeckError::RunInProgress)?;
        let tests = self.tests.clone();
        let sink = self.result_sink();
        let assembly = self.display_name.clone();
        info!(%assembly, tests = tests.len(), "test run started");

        Ok(tokio::spawn(async move {
            let _busy = guard;
            let result = runner.run(tests, sink).await;
            match &result {
                Ok(()) => info!(%assembly, "test run finished"),
                Err(e) => warn!(%assembly, error = %e, "test run failed"),
            }
            result
        }))
    }

    /// Run `runner` and keep applying its results until it finishes.
    pub async fn run_to_completion<R: TestRunner>(&mut self, runner: Arc<R>) -> Result<()> {
        let mut handle = self.run_tests(runner)?;
        let joined = loop {
            tokio::select! {
                joined = &mut handle => break joined,
                _ = self.next_event() => {}
            }
        };
        self.pump();
        joined.map_err(|e| DeckError::RunnerTask(e.to_string()))?
    }

    fn filter_after_delay(&mut self) {
        let filter = TestFilter::new(self.search_text.get().clone(), *self.result_filter.get());
        debug!(assembly = %self.display_name, search = %filter.search, state = %filter.state, "filter scheduled");
        self.debouncer.schedule(filter);
    }

    fn apply_filter(&mut self, filter: TestFilter) -> bool {
        let changed = self.view.set_filter_argument(&self.tests, filter);
        if changed {
            self.refresh_summary();
        }
        changed
    }

    fn collection_changed(&mut self) {
        self.view.notify_collection_changed(&self.tests);
        self.refresh_summary();
    }

    fn refresh_summary(&mut self) {
        let next = summarize(self.tests.iter().map(TestCase::result), self.summary.get());
        self.summary.set(next);
    }
}

fn index_tests(tests: &[TestCase]) -> Result<HashMap<String, usize>> {
    let mut positions = HashMap::with_capacity(tests.len());
    for (index, test) in tests.iter().enumerate() {
        if positions.insert(test.unique_name.clone(), index).is_some() {
            return Err(DeckError::DuplicateTest(test.unique_name.clone()));
        }
    }
    Ok(positions)
}

/// Await a run started by [`TestCollectionController::run_tests`].
pub async fn join_run(handle: JoinHandle<Result<()>>) -> Result<()> {
    handle
        .await
        .map_err(|e| DeckError::RunnerTask(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::ColorClass;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tokio::sync::Notify;

    const DELAY: Duration = Duration::from_millis(500);

    fn case(unique_name: &str, display_name: &str) -> TestCase {
        TestCase::new(unique_name.to_string(), display_name.to_string())
    }

    fn controller() -> TestCollectionController {
        TestCollectionController::new(
            "bin/Debug/Calc.Tests.dll",
            vec![
                case("Calc.MathTests.Subtracts", "Subtracts"),
                case("Calc.MathTests.Adds", "Adds"),
                case("Calc.ParserTests.Parses", "Parses"),
            ],
            DELAY,
        )
        .unwrap()
    }

    fn visible(controller: &TestCollectionController) -> Vec<String> {
        controller
            .visible_tests()
            .map(|t| t.display_name.clone())
            .collect()
    }

    struct ScriptedRunner {
        outcomes: Vec<(&'static str, TestState)>,
        fail: bool,
    }

    impl TestRunner for ScriptedRunner {
        async fn run(&self, _tests: Vec<TestCase>, sink: ResultSink) -> Result<()> {
            for (name, state) in &self.outcomes {
                sink.report(ResultUpdate::new(*name, *state));
            }
            if self.fail {
                Err(DeckError::DotnetExecution("exit code 1".to_string()))
            } else {
                Ok(())
            }
        }
    }

    struct BlockingRunner {
        release: Notify,
    }

    impl TestRunner for BlockingRunner {
        async fn run(&self, _tests: Vec<TestCase>, _sink: ResultSink) -> Result<()> {
            self.release.notified().await;
            Ok(())
        }
    }

    #[test]
    fn test_new_derives_display_name_and_summary() {
        let controller = controller();
        assert_eq!(controller.display_name(), "Calc.Tests");
        assert_eq!(visible(&controller), vec!["Adds", "Parses", "Subtracts"]);
        assert_eq!(controller.summary().text, "3 test cases, NotRun");
        assert_eq!(controller.summary().state, TestState::NotRun);
        assert_eq!(controller.summary().color, ColorClass::Success);
        assert_eq!(controller.result_filter(), TestState::All);
        assert_eq!(controller.search_text(), "");
        assert!(!controller.is_busy());
    }

    #[test]
    fn test_new_with_no_tests() {
        let controller = TestCollectionController::new("Empty.dll", Vec::new(), DELAY).unwrap();
        assert_eq!(controller.summary().text, "no test was found inside this assembly");
        assert_eq!(controller.summary().color, ColorClass::Neutral);
        assert_eq!(controller.visible_len(), 0);
    }

    #[test]
    fn test_new_rejects_duplicate_names() {
        let result = TestCollectionController::new(
            "A.dll",
            vec![case("NS.C.M", "M"), case("NS.C.M", "M")],
            DELAY,
        );
        assert!(matches!(result, Err(DeckError::DuplicateTest(name)) if name == "NS.C.M"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_applies_after_quiet_period() {
        let mut controller = controller();
        controller.set_search_text("math");
        assert!(controller.filter_pending());

        tokio::time::advance(Duration::from_millis(499)).await;
        assert!(!controller.pump());
        assert_eq!(controller.visible_len(), 3);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(controller.pump());
        assert_eq!(visible(&controller), vec!["Adds", "Subtracts"]);
        assert_eq!(controller.applied_filter(), &TestFilter::new("math", TestState::All));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_edits_produce_one_reset_with_last_filter() {
        let mut controller = controller();
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&changes);
        controller.subscribe_view(move |change| sink.borrow_mut().push(change.clone()));

        for text in ["p", "pa", "par", "pars"] {
            controller.set_search_text(text);
            tokio::time::advance(Duration::from_millis(200)).await;
            controller.pump();
        }

        assert_eq!(controller.next_event().await, ControllerEvent::FilterApplied);
        assert_eq!(changes.borrow().len(), 1);
        assert!(matches!(changes.borrow()[0], ViewChange::Reset(_)));
        assert_eq!(visible(&controller), vec!["Parses"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_and_state_combine() {
        let mut controller = controller();
        controller.apply_result(ResultUpdate::new("Calc.MathTests.Adds", TestState::Passed));
        controller.apply_result(ResultUpdate::new("Calc.MathTests.Subtracts", TestState::Failed));

        controller.set_search_text(" MATH ");
        controller.set_result_filter(TestState::Failed);
        assert_eq!(controller.next_event().await, ControllerEvent::FilterApplied);

        assert_eq!(visible(&controller), vec!["Subtracts"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_setting_same_value_schedules_nothing() {
        let mut controller = controller();
        let seen = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&seen);
        controller.subscribe_result_filter(move |_| *counter.borrow_mut() += 1);

        controller.set_result_filter(TestState::All);
        controller.set_search_text("");
        assert!(!controller.filter_pending());
        assert_eq!(*seen.borrow(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverting_edit_before_fire_leaves_view_alone() {
        let mut controller = controller();
        let resets = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&resets);
        controller.subscribe_view(move |_| *counter.borrow_mut() += 1);

        controller.set_search_text("x");
        controller.set_search_text("");
        tokio::time::advance(DELAY).await;
        controller.pump();

        // structurally equal to the applied filter
        assert_eq!(*resets.borrow(), 0);
        assert_eq!(controller.visible_len(), 3);
    }

    #[test]
    fn test_flush_filter_applies_immediately() {
        let mut controller = controller();
        controller.set_result_filter(TestState::Passed);
        assert!(controller.flush_filter());
        assert_eq!(controller.visible_len(), 0);
        assert!(!controller.flush_filter());
    }

    #[test]
    fn test_apply_result_updates_view_and_summary() {
        let mut controller = controller();
        controller.set_result_filter(TestState::Passed);
        controller.flush_filter();

        let summaries = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&summaries);
        controller.subscribe_summary(move |s| sink.borrow_mut().push(s.text.clone()));

        assert!(controller.apply_result(ResultUpdate::new("Calc.MathTests.Adds", TestState::Passed)));
        assert_eq!(visible(&controller), vec!["Adds"]);
        assert_eq!(controller.summary().state, TestState::Failed);
        assert_eq!(controller.summary().text, "1 success, 0 failure, 0 skip, 2 not run");

        controller.apply_result(ResultUpdate::new("Calc.MathTests.Subtracts", TestState::Passed));
        controller.apply_result(ResultUpdate::new("Calc.ParserTests.Parses", TestState::Passed));
        assert_eq!(visible(&controller), vec!["Adds", "Parses", "Subtracts"]);
        assert_eq!(controller.summary().text, "Success! 3 tests");
        assert_eq!(
            *summaries.borrow(),
            vec![
                "1 success, 0 failure, 0 skip, 2 not run",
                "2 success, 0 failure, 0 skip, 1 not run",
                "Success! 3 tests",
            ]
        );
    }

    #[test]
    fn test_apply_result_unknown_test() {
        let mut controller = controller();
        assert!(!controller.apply_result(ResultUpdate::new("Nope", TestState::Passed)));
        assert_eq!(controller.summary().text, "3 test cases, NotRun");
    }

    #[test]
    fn test_apply_result_tracks_errors_and_durations() {
        let mut controller = controller();
        let mut failed = ResultUpdate::new("Calc.MathTests.Adds", TestState::Failed);
        failed.duration_ms = Some(12);
        failed.error_message = Some("Assert.Equal() Failure".to_string());
        controller.apply_result(failed);

        let test = &controller.tests()[1];
        assert_eq!(test.result(), TestState::Failed);
        assert_eq!(test.duration_ms, Some(12));
        assert_eq!(test.error_message.as_deref(), Some("Assert.Equal() Failure"));

        // a progress line carries no details; keep the earlier ones
        controller.apply_result(ResultUpdate::new("Calc.MathTests.Adds", TestState::Failed));
        assert_eq!(controller.tests()[1].error_message.as_deref(), Some("Assert.Equal() Failure"));

        controller.apply_result(ResultUpdate::new("Calc.MathTests.Adds", TestState::Passed));
        assert!(controller.tests()[1].error_message.is_none());
        assert_eq!(controller.tests()[1].duration_ms, Some(12));
    }

    #[test]
    fn test_add_and_remove_tests() {
        let mut controller = controller();
        controller.add_test(case("Calc.MathTests.Multiplies", "Multiplies")).unwrap();
        assert_eq!(visible(&controller), vec!["Adds", "Multiplies", "Parses", "Subtracts"]);
        assert_eq!(controller.summary().text, "4 test cases, NotRun");

        let err = controller.add_test(case("Calc.MathTests.Adds", "Adds")).unwrap_err();
        assert!(matches!(err, DeckError::DuplicateTest(_)));

        let removed = controller.remove_test("Calc.MathTests.Subtracts").unwrap();
        assert_eq!(removed.display_name, "Subtracts");
        assert_eq!(visible(&controller), vec!["Adds", "Multiplies", "Parses"]);
        assert!(controller.remove_test("Calc.MathTests.Subtracts").is_none());

        // positions shifted after removal
        assert!(controller.apply_result(ResultUpdate::new("Calc.MathTests.Multiplies", TestState::Failed)));
        assert_eq!(controller.tests()[2].unique_name, "Calc.MathTests.Multiplies");
        assert_eq!(controller.tests()[2].result(), TestState::Failed);
    }

    #[test]
    fn test_remove_last_test_reports_nothing_found() {
        let mut controller =
            TestCollectionController::new("One.dll", vec![case("NS.C.Only", "Only")], DELAY).unwrap();
        controller.apply_result(ResultUpdate::new("NS.C.Only", TestState::Failed));
        controller.remove_test("NS.C.Only");
        assert_eq!(controller.summary().text, "no test was found inside this assembly");
        assert_eq!(controller.summary().state, TestState::Failed);
    }

    #[tokio::test]
    async fn test_run_tests_applies_results() {
        let mut controller = controller();
        let runner = Arc::new(ScriptedRunner {
            outcomes: vec![
                ("Calc.MathTests.Adds", TestState::Passed),
                ("Calc.MathTests.Subtracts", TestState::Passed),
                ("Calc.ParserTests.Parses", TestState::Skipped),
            ],
            fail: false,
        });

        let handle = controller.run_tests(runner).unwrap();
        join_run(handle).await.unwrap();
        assert!(!controller.is_busy());

        assert!(controller.pump());
        assert_eq!(controller.summary().state, TestState::Passed);
        assert_eq!(controller.summary().text, "Success! 2 tests");
    }

    #[tokio::test]
    async fn test_run_failure_propagates_and_clears_busy() {
        let mut controller = controller();
        let runner = Arc::new(ScriptedRunner {
            outcomes: vec![("Calc.MathTests.Adds", TestState::Failed)],
            fail: true,
        });

        let handle = controller.run_tests(runner).unwrap();
        let result = join_run(handle).await;
        assert!(matches!(result, Err(DeckError::DotnetExecution(_))));
        assert!(!controller.is_busy());

        assert_eq!(
            controller.next_event().await,
            ControllerEvent::ResultApplied("Calc.MathTests.Adds".to_string())
        );
        assert_eq!(controller.summary().state, TestState::Failed);
    }

    #[tokio::test]
    async fn test_run_to_completion_applies_every_result() {
        let mut controller = controller();
        let runner = Arc::new(ScriptedRunner {
            outcomes: vec![
                ("Calc.MathTests.Adds", TestState::Passed),
                ("Calc.MathTests.Subtracts", TestState::Failed),
            ],
            fail: false,
        });

        controller.run_to_completion(runner).await.unwrap();
        assert!(!controller.is_busy());
        assert!(!controller.pump());
        assert_eq!(controller.summary().state, TestState::Failed);
        assert_eq!(controller.summary().text, "1 success, 1 failure, 0 skip, 1 not run");
    }

    #[tokio::test]
    async fn test_run_to_completion_returns_runner_error() {
        let mut controller = controller();
        let runner = Arc::new(ScriptedRunner {
            outcomes: Vec::new(),
            fail: true,
        });

        let result = controller.run_to_completion(runner).await;
        assert!(matches!(result, Err(DeckError::DotnetExecution(_))));
        assert!(!controller.is_busy());
    }

    #[tokio::test]
    async fn test_busy_subscriber_follows_run() {
        let controller = controller();
        let mut busy = controller.subscribe_busy();
        assert!(!*busy.borrow_and_update());

        let runner = Arc::new(BlockingRunner {
            release: Notify::new(),
        });
        let handle = controller.run_tests(Arc::clone(&runner)).unwrap();
        busy.changed().await.unwrap();
        assert!(*busy.borrow_and_update());

        runner.release.notify_one();
        busy.changed().await.unwrap();
        assert!(!*busy.borrow_and_update());
        join_run(handle).await.unwrap();
    }

    #[tokio::test]
    async fn test_overlapping_run_is_rejected() {
        let controller = controller();
        let runner = Arc::new(BlockingRunner {
            release: Notify::new(),
        });

        let handle = controller.run_tests(Arc::clone(&runner)).unwrap();
        assert!(controller.is_busy());
        assert!(matches!(
            controller.run_tests(Arc::clone(&runner)),
            Err(DeckError::RunInProgress)
        ));

        runner.release.notify_one();
        join_run(handle).await.unwrap();
        assert!(!controller.is_busy());
        assert!(controller.run_tests(Arc::clone(&runner)).is_ok());
    }

    #[tokio::test]
    async fn test_aborted_run_clears_busy() {
        let controller = controller();
        let runner = Arc::new(BlockingRunner {
            release: Notify::new(),
        });

        let handle = controller.run_tests(runner).unwrap();
        handle.abort();
        let result = join_run(handle).await;
        assert!(matches!(result, Err(DeckError::RunnerTask(_))));
        assert!(!controller.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_applies_while_run_in_progress() {
        let mut controller = controller();
        let runner = Arc::new(BlockingRunner {
            release: Notify::new(),
        });
        let handle = controller.run_tests(Arc::clone(&runner)).unwrap();

        controller.set_search_text("parser");
        assert_eq!(controller.next_event().await, ControllerEvent::FilterApplied);
        assert_eq!(visible(&controller), vec!["Parses"]);
        assert!(controller.is_busy());

        runner.release.notify_one();
        join_run(handle).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_controller_never_applies_pending_filter() {
        let mut controller = controller();
        let resets = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&resets);
        controller.subscribe_view(move |_| *counter.borrow_mut() += 1);

        controller.set_search_text("adds");
        drop(controller);
        tokio::time::advance(DELAY * 2).await;

        assert_eq!(*resets.borrow(), 0);
    }
}
