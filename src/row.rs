//! Per-indexer action state
//!
//! Each row of the indexer table runs at most one action at a time. The
//! transition function `apply` is the whole state machine; the controller
//! around it decides which registry call each accepted action needs and
//! folds the call's outcome back into row state.
//!
//! Outstanding calls are never cancelled and have no timeout: a row stays in
//! its active state until the call completes.

use std::fmt;

use crate::backend::error::ConsoleError;
use crate::backend::types::{Config, Indexer, SearchResult, TestOutcome};
use crate::banner::BannerMessage;
use crate::form::{self, ConfigForm};
use crate::search::{self, SortColumn, SortOrder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    Edit,
    Test,
    Disable,
    Search,
}

impl RowAction {
    pub const ALL: [RowAction; 4] = [
        RowAction::Edit,
        RowAction::Test,
        RowAction::Disable,
        RowAction::Search,
    ];

    fn active_state(self) -> RowState {
        match self {
            RowAction::Edit => RowState::Editing,
            RowAction::Test => RowState::Testing,
            RowAction::Disable => RowState::Disabling,
            RowAction::Search => RowState::Searching,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowState {
    #[default]
    Idle,
    Editing,
    Testing,
    Disabling,
    Searching,
}

impl RowState {
    pub fn is_idle(self) -> bool {
        self == RowState::Idle
    }

    pub fn action(self) -> Option<RowAction> {
        match self {
            RowState::Idle => None,
            RowState::Editing => Some(RowAction::Edit),
            RowState::Testing => Some(RowAction::Test),
            RowState::Disabling => Some(RowAction::Disable),
            RowState::Searching => Some(RowAction::Search),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowEvent {
    /// User asks to start an action
    Start(RowAction),
    /// The action's registry call completed, successfully or not
    Resolved(RowAction),
    /// The user closed the action with nothing in flight
    Closed(RowAction),
}

/// The row state machine. Events that do not apply leave the state unchanged.
pub fn apply(state: RowState, event: RowEvent) -> RowState {
    match (state, event) {
        (RowState::Idle, RowEvent::Start(action)) => action.active_state(),
        (current, RowEvent::Resolved(action) | RowEvent::Closed(action))
            if current.action() == Some(action) =>
        {
            RowState::Idle
        }
        (current, _) => current,
    }
}

/// Outcome of the most recent test, shown independently of the action state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestStatus {
    #[default]
    Untested,
    Testing,
    Ok,
    Failed,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TestStatus::Untested => "-",
            TestStatus::Testing => "Testing",
            TestStatus::Ok => "OK",
            TestStatus::Failed => "Failed",
        })
    }
}

/// Registry call a row needs issued on its behalf
#[derive(Debug, Clone, PartialEq)]
pub enum RowCommand {
    FetchConfig { indexer_id: String },
    SaveConfig { indexer_id: String, config: Config },
    Test { indexer_id: String },
    Disable { indexer_id: String },
    Search { indexer_id: String, keywords: String },
}

/// Search panel of a row. `results` keep backend order; sorting only
/// affects what `displayed` returns.
#[derive(Debug, Clone, Default)]
pub struct SearchPanel {
    pub keywords: String,
    pub results: Vec<SearchResult>,
    sort: Option<(SortColumn, SortOrder)>,
}

impl SearchPanel {
    pub fn sort(&self) -> Option<(SortColumn, SortOrder)> {
        self.sort
    }

    /// Sort by `column`, flipping the order when it is already the sort column
    pub fn sort_by(&mut self, column: SortColumn) {
        self.sort = match self.sort {
            Some((current, order)) if current == column => Some((column, order.flip())),
            _ => Some((column, SortOrder::Ascending)),
        };
    }

    pub fn displayed(&self) -> Vec<SearchResult> {
        let mut results = self.results.clone();
        if let Some((column, order)) = self.sort {
            search::sort_results(&mut results, column, order);
        }
        results
    }
}

#[derive(Debug, Clone)]
pub struct IndexerRowController {
    indexer_id: String,
    state: RowState,
    status: TestStatus,
    in_flight: bool,
    form: Option<ConfigForm>,
    search: Option<SearchPanel>,
}

impl IndexerRowController {
    pub fn new(indexer_id: impl Into<String>) -> Self {
        Self {
            indexer_id: indexer_id.into(),
            state: RowState::Idle,
            status: TestStatus::Untested,
            in_flight: false,
            form: None,
            search: None,
        }
    }

    pub fn state(&self) -> RowState {
        self.state
    }

    pub fn status(&self) -> TestStatus {
        self.status
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Whether the affordance for `action` should be enabled
    pub fn can_start(&self, action: RowAction) -> bool {
        apply(self.state, RowEvent::Start(action)) != self.state
    }

    pub fn form(&self) -> Option<&ConfigForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut ConfigForm> {
        self.form.as_mut()
    }

    pub fn search_panel(&self) -> Option<&SearchPanel> {
        self.search.as_ref()
    }

    pub fn search_panel_mut(&mut self) -> Option<&mut SearchPanel> {
        self.search.as_mut()
    }

    fn start(&mut self, action: RowAction) -> bool {
        let next = apply(self.state, RowEvent::Start(action));
        if next == self.state {
            tracing::debug!("Row {} busy ({:?}), rejecting {:?}", self.indexer_id, self.state, action);
            return false;
        }
        self.state = next;
        true
    }

    fn resolve(&mut self, action: RowAction) {
        self.state = apply(self.state, RowEvent::Resolved(action));
        self.in_flight = false;
    }

    fn issue(&mut self, command: RowCommand) -> Option<RowCommand> {
        self.in_flight = true;
        Some(command)
    }

    pub fn begin_edit(&mut self) -> Option<RowCommand> {
        if !self.start(RowAction::Edit) {
            return None;
        }
        let indexer_id = self.indexer_id.clone();
        self.issue(RowCommand::FetchConfig { indexer_id })
    }

    /// Config arrived for the edit form. The row stays in `Editing` unless
    /// the fetch failed or `indexer` is no longer known.
    pub fn config_loaded(
        &mut self,
        indexer: Option<&Indexer>,
        result: Result<Config, ConsoleError>,
    ) -> Option<BannerMessage> {
        if self.state != RowState::Editing {
            return None;
        }
        self.in_flight = false;
        let scope = format!(
            "whilst loading config for {}",
            indexer.map_or(self.indexer_id.as_str(), |i| i.name.as_str())
        );
        match (indexer, result) {
            (Some(indexer), Ok(config)) => {
                self.form = Some(form::build_fields(indexer, &config));
                None
            }
            (None, Ok(_)) => {
                self.resolve(RowAction::Edit);
                let err = ConsoleError::Backend(format!("Unknown indexer {}", self.indexer_id));
                Some(BannerMessage::new(err, scope))
            }
            (_, Err(err)) => {
                self.resolve(RowAction::Edit);
                Some(BannerMessage::new(err, scope))
            }
        }
    }

    /// Submit the open form
    pub fn submit_edit(&mut self) -> Option<RowCommand> {
        if self.state != RowState::Editing || self.in_flight {
            return None;
        }
        let config = form::collect_values(self.form.as_ref()?);
        let indexer_id = self.indexer_id.clone();
        self.issue(RowCommand::SaveConfig { indexer_id, config })
    }

    /// Close the form without saving. Refused while a call is outstanding.
    pub fn cancel_edit(&mut self) -> bool {
        if self.state != RowState::Editing || self.in_flight {
            return false;
        }
        self.state = apply(self.state, RowEvent::Closed(RowAction::Edit));
        self.form = None;
        true
    }

    pub fn config_saved(&mut self, indexer_name: &str, result: Result<(), ConsoleError>) -> Option<BannerMessage> {
        if self.state != RowState::Editing {
            return None;
        }
        self.resolve(RowAction::Edit);
        self.form = None;
        result
            .err()
            .map(|err| BannerMessage::new(err, format!("whilst saving {}", indexer_name)))
    }

    pub fn begin_test(&mut self) -> Option<RowCommand> {
        if !self.start(RowAction::Test) {
            return None;
        }
        self.status = TestStatus::Testing;
        let indexer_id = self.indexer_id.clone();
        self.issue(RowCommand::Test { indexer_id })
    }

    /// Test failures stay on the row; they never reach the banner
    pub fn test_finished(&mut self, result: Result<TestOutcome, ConsoleError>) {
        if self.state != RowState::Testing {
            return;
        }
        self.resolve(RowAction::Test);
        self.status = match result {
            Ok(TestOutcome { ok: true, .. }) => TestStatus::Ok,
            Ok(TestOutcome { error, .. }) => {
                tracing::debug!("Row {} test failed: {:?}", self.indexer_id, error);
                TestStatus::Failed
            }
            Err(err) => {
                tracing::debug!("Row {} test errored: {}", self.indexer_id, err);
                TestStatus::Failed
            }
        };
    }

    pub fn begin_disable(&mut self) -> Option<RowCommand> {
        if !self.start(RowAction::Disable) {
            return None;
        }
        let indexer_id = self.indexer_id.clone();
        self.issue(RowCommand::Disable { indexer_id })
    }

    pub fn disable_finished(&mut self, indexer_name: &str, result: Result<(), ConsoleError>) -> Option<BannerMessage> {
        if self.state != RowState::Disabling {
            return None;
        }
        self.resolve(RowAction::Disable);
        result
            .err()
            .map(|err| BannerMessage::new(err, format!("whilst disabling {}", indexer_name)))
    }

    /// Show the search panel. Opening it does not occupy the row.
    pub fn open_search(&mut self) {
        if self.search.is_none() {
            self.search = Some(SearchPanel::default());
        }
    }

    /// Hide the search panel. Refused while a search is running.
    pub fn close_search(&mut self) -> bool {
        if self.state == RowState::Searching {
            return false;
        }
        self.search = None;
        true
    }

    pub fn begin_search(&mut self, keywords: impl Into<String>) -> Option<RowCommand> {
        if !self.start(RowAction::Search) {
            return None;
        }
        let keywords = keywords.into();
        let panel = self.search.get_or_insert_with(SearchPanel::default);
        panel.keywords = keywords.clone();
        let indexer_id = self.indexer_id.clone();
        self.issue(RowCommand::Search { indexer_id, keywords })
    }

    pub fn search_finished(
        &mut self,
        indexer_name: &str,
        result: Result<Vec<SearchResult>, ConsoleError>,
    ) -> Option<BannerMessage> {
        if self.state != RowState::Searching {
            return None;
        }
        self.resolve(RowAction::Search);
        match result {
            Ok(results) => {
                if let Some(panel) = self.search.as_mut() {
                    panel.results = results;
                }
                None
            }
            Err(err) => Some(BannerMessage::new(err, format!("whilst searching {}", indexer_name))),
        }
    }
}
