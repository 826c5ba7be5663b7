//! Console application state and Iced Application implementation
//!
//! The registry holds the domain state; this module only owns screen state,
//! the per-row controllers and the error banner. Every backend call runs as a
//! `Task` and reports back through a `Message`.

use std::collections::BTreeMap;
use std::fmt;

use iced::futures::SinkExt;
use iced::widget::{button, column, container, pick_list, row, scrollable, text, text_input, Space};
use iced::{Background, Border, Color, Element, Length, Padding, Subscription, Task, Theme};

use crate::backend::error::ConsoleError;
use crate::backend::types::{Config, Indexer, SearchResult, TestOutcome};
use crate::banner::{BannerMessage, ErrorBanner};
use crate::registry::IndexerRegistry;
use crate::row::{IndexerRowController, RowAction, RowCommand, RowState, TestStatus};
use crate::search::{self, SortColumn};
use crate::session;

// ============================================================================
// Theme Colors
// ============================================================================

mod colors {
    use iced::Color;

    pub const SURFACE: Color = Color::from_rgb(0.12, 0.12, 0.14);
    pub const BORDER: Color = Color::from_rgb(0.25, 0.25, 0.28);
    pub const TEXT_MUTED: Color = Color::from_rgb(0.55, 0.55, 0.6);
    pub const DANGER: Color = Color::from_rgb(0.85, 0.3, 0.3);
    pub const DANGER_SURFACE: Color = Color::from_rgb(0.3, 0.12, 0.12);
    pub const OK: Color = Color::from_rgb(0.35, 0.75, 0.45);
}

// ============================================================================
// UI State Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Login,
    Registry,
}

/// Entry of the "add indexer" picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerChoice {
    pub id: String,
    pub name: String,
}

impl fmt::Display for IndexerChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ============================================================================
// Application State
// ============================================================================

pub struct Console {
    registry: IndexerRegistry,
    screen: Screen,
    passphrase: String,
    login_error: Option<String>,
    logging_in: bool,
    loading: bool,
    rows: BTreeMap<String, IndexerRowController>,
    banner: ErrorBanner,
    add_selection: Option<IndexerChoice>,
}

#[derive(Debug, Clone)]
pub enum Message {
    PassphraseChanged(String),
    LoginSubmit,
    LoginFinished(Result<(), ConsoleError>),
    Logout,
    Reload,
    IndexersLoaded(Result<Vec<Indexer>, ConsoleError>),
    RegistryChanged,
    DismissBanner,
    AddSelected(IndexerChoice),
    AddIndexer,
    Edit(String),
    ConfigLoaded(String, Result<Config, ConsoleError>),
    FieldChanged(String, String, String),
    SaveEdit(String),
    CancelEdit(String),
    ConfigSaved(String, Result<(), ConsoleError>),
    Test(String),
    TestFinished(String, Result<TestOutcome, ConsoleError>),
    Disable(String),
    DisableFinished(String, Result<(), ConsoleError>),
    OpenSearch(String),
    CloseSearch(String),
    KeywordsChanged(String, String),
    SubmitSearch(String),
    SearchFinished(String, Result<Vec<SearchResult>, ConsoleError>),
    SortBy(String, SortColumn),
}

impl Console {
    /// Initial state: the registry view when a session token is stored,
    /// the login screen otherwise
    pub fn new(registry: IndexerRegistry) -> (Self, Task<Message>) {
        let authenticated = registry.session().is_authenticated();
        let mut console = Self {
            registry,
            screen: if authenticated { Screen::Registry } else { Screen::Login },
            passphrase: String::new(),
            login_error: None,
            logging_in: false,
            loading: false,
            rows: BTreeMap::new(),
            banner: ErrorBanner::default(),
            add_selection: None,
        };

        let task = if authenticated {
            console.load()
        } else {
            Task::none()
        };
        (console, task)
    }

    pub fn title(&self) -> String {
        String::from("Indexer Console")
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PassphraseChanged(passphrase) => {
                self.passphrase = passphrase;
                Task::none()
            }

            Message::LoginSubmit => {
                if self.logging_in {
                    return Task::none();
                }
                self.logging_in = true;
                self.login_error = None;
                let backend = self.registry.backend().clone();
                let session = self.registry.session().clone();
                let passphrase = self.passphrase.clone();
                Task::perform(
                    async move { session::login(&backend, &session, &passphrase).await },
                    Message::LoginFinished,
                )
            }

            Message::LoginFinished(result) => {
                self.logging_in = false;
                match result {
                    Ok(()) => {
                        self.passphrase.clear();
                        self.screen = Screen::Registry;
                        self.load()
                    }
                    Err(err) => {
                        self.login_error = Some(match err {
                            ConsoleError::Network(_) => "Network connection error".to_string(),
                            other => BannerMessage::new(other, "whilst logging in").message,
                        });
                        Task::none()
                    }
                }
            }

            Message::Logout => {
                if let Err(e) = self.registry.session().clear() {
                    tracing::warn!("Could not clear stored session: {}", e);
                }
                self.registry.reset();
                self.rows.clear();
                self.banner.dismiss();
                self.screen = Screen::Login;
                Task::none()
            }

            Message::Reload => self.load(),

            Message::IndexersLoaded(result) => {
                self.loading = false;
                match result {
                    Ok(_) => self.sync_rows(),
                    Err(err) => self.report(BannerMessage::new(err, "whilst loading indexers")),
                }
                Task::none()
            }

            Message::RegistryChanged => {
                self.sync_rows();
                Task::none()
            }

            Message::DismissBanner => {
                self.banner.dismiss();
                Task::none()
            }

            Message::AddSelected(choice) => {
                self.add_selection = Some(choice);
                Task::none()
            }

            Message::AddIndexer => match self.add_selection.take() {
                Some(choice) => self.update(Message::Edit(choice.id)),
                None => Task::none(),
            },

            Message::Edit(id) => {
                let command = self.row_mut(&id).begin_edit();
                self.dispatch(command)
            }

            Message::ConfigLoaded(id, result) => {
                let indexer = self.registry.get(&id);
                if let Some(banner) = self.row_mut(&id).config_loaded(indexer.as_ref(), result) {
                    self.report(banner);
                }
                Task::none()
            }

            Message::FieldChanged(id, field, value) => {
                if let Some(form) = self.row_mut(&id).form_mut() {
                    form.set_value(&field, value);
                }
                Task::none()
            }

            Message::SaveEdit(id) => {
                let command = self.row_mut(&id).submit_edit();
                self.dispatch(command)
            }

            Message::CancelEdit(id) => {
                self.row_mut(&id).cancel_edit();
                Task::none()
            }

            Message::ConfigSaved(id, result) => {
                let name = self.indexer_name(&id);
                if let Some(banner) = self.row_mut(&id).config_saved(&name, result) {
                    self.report(banner);
                }
                Task::none()
            }

            Message::Test(id) => {
                let command = self.row_mut(&id).begin_test();
                self.dispatch(command)
            }

            Message::TestFinished(id, result) => {
                self.row_mut(&id).test_finished(result);
                Task::none()
            }

            Message::Disable(id) => {
                let command = self.row_mut(&id).begin_disable();
                self.dispatch(command)
            }

            Message::DisableFinished(id, result) => {
                let name = self.indexer_name(&id);
                if let Some(banner) = self.row_mut(&id).disable_finished(&name, result) {
                    self.report(banner);
                }
                Task::none()
            }

            Message::OpenSearch(id) => {
                self.row_mut(&id).open_search();
                Task::none()
            }

            Message::CloseSearch(id) => {
                self.row_mut(&id).close_search();
                Task::none()
            }

            Message::KeywordsChanged(id, keywords) => {
                if let Some(panel) = self.row_mut(&id).search_panel_mut() {
                    panel.keywords = keywords;
                }
                Task::none()
            }

            Message::SubmitSearch(id) => {
                let row = self.row_mut(&id);
                let keywords = row
                    .search_panel()
                    .map(|p| p.keywords.clone())
                    .unwrap_or_default();
                let command = row.begin_search(keywords);
                self.dispatch(command)
            }

            Message::SearchFinished(id, result) => {
                let name = self.indexer_name(&id);
                if let Some(banner) = self.row_mut(&id).search_finished(&name, result) {
                    self.report(banner);
                }
                Task::none()
            }

            Message::SortBy(id, column) => {
                if let Some(panel) = self.row_mut(&id).search_panel_mut() {
                    panel.sort_by(column);
                }
                Task::none()
            }
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        Subscription::run_with_id("registry-updates", registry_updates(self.registry.clone()))
    }

    // ========================================================================
    // Business Logic
    // ========================================================================

    fn load(&mut self) -> Task<Message> {
        if !self.registry.session().is_authenticated() {
            self.screen = Screen::Login;
            return Task::none();
        }
        self.loading = true;
        let registry = self.registry.clone();
        Task::perform(
            async move { registry.load_indexers().await },
            Message::IndexersLoaded,
        )
    }

    fn report(&mut self, banner: BannerMessage) {
        if banner.auth {
            self.screen = Screen::Login;
            self.login_error = Some(banner.message.clone());
        }
        self.banner.show(banner);
    }

    fn row_mut(&mut self, id: &str) -> &mut IndexerRowController {
        self.rows
            .entry(id.to_string())
            .or_insert_with(|| IndexerRowController::new(id))
    }

    fn indexer_name(&self, id: &str) -> String {
        self.registry
            .get(id)
            .map(|i| i.name)
            .unwrap_or_else(|| id.to_string())
    }

    /// Keep one controller per known indexer. Busy rows are never dropped.
    fn sync_rows(&mut self) {
        let snapshot = self.registry.snapshot();
        for indexer in &snapshot.indexers {
            self.row_mut(&indexer.id);
        }
        self.rows
            .retain(|id, row| snapshot.get(id).is_some() || !row.state().is_idle());
    }

    /// Issue the registry call a row asked for
    fn dispatch(&mut self, command: Option<RowCommand>) -> Task<Message> {
        let Some(command) = command else {
            return Task::none();
        };
        let registry = self.registry.clone();

        match command {
            RowCommand::FetchConfig { indexer_id } => {
                let id = indexer_id.clone();
                Task::perform(
                    async move { registry.fetch_config(&indexer_id).await },
                    move |result| Message::ConfigLoaded(id.clone(), result),
                )
            }
            RowCommand::SaveConfig { indexer_id, config } => {
                let id = indexer_id.clone();
                Task::perform(
                    async move {
                        let indexer = lookup(&registry, &indexer_id)?;
                        registry.save_config(&indexer, config).await
                    },
                    move |result| Message::ConfigSaved(id.clone(), result),
                )
            }
            RowCommand::Test { indexer_id } => {
                let id = indexer_id.clone();
                Task::perform(
                    async move {
                        let indexer = lookup(&registry, &indexer_id)?;
                        registry.test_indexer(&indexer).await
                    },
                    move |result| Message::TestFinished(id.clone(), result),
                )
            }
            RowCommand::Disable { indexer_id } => {
                let id = indexer_id.clone();
                Task::perform(
                    async move {
                        let indexer = lookup(&registry, &indexer_id)?;
                        registry.disable_indexer(&indexer).await
                    },
                    move |result| Message::DisableFinished(id.clone(), result),
                )
            }
            RowCommand::Search { indexer_id, keywords } => {
                let id = indexer_id.clone();
                Task::perform(
                    async move {
                        let indexer = lookup(&registry, &indexer_id)?;
                        registry.search(&indexer, &keywords).await
                    },
                    move |result| Message::SearchFinished(id.clone(), result),
                )
            }
        }
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub fn view(&self) -> Element<'_, Message> {
        let content = match self.screen {
            Screen::Login => self.view_login(),
            Screen::Registry => self.view_registry(),
        };

        container(content)
            .padding(16)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn view_login(&self) -> Element<'_, Message> {
        let submit = (!self.logging_in).then_some(Message::LoginSubmit);

        let mut form = column![
            text("Login").size(24),
            text_input("Passphrase", &self.passphrase)
                .secure(true)
                .on_input(Message::PassphraseChanged)
                .on_submit(Message::LoginSubmit)
                .padding(10),
            button(text(if self.logging_in { "Logging in..." } else { "Login" })).on_press_maybe(submit),
        ]
        .spacing(12)
        .max_width(400);

        if let Some(error) = &self.login_error {
            form = form.push(text(error.as_str()).size(13).color(colors::DANGER));
        }

        container(form).center_x(Length::Fill).into()
    }

    fn view_registry(&self) -> Element<'_, Message> {
        let snapshot = self.registry.snapshot();

        let header = row![
            text("Indexer Console").size(24),
            Space::with_width(Length::Fill),
            text(if self.loading { "Loading..." } else { "" }).color(colors::TEXT_MUTED),
            button(text("Reload")).on_press_maybe((!self.loading).then_some(Message::Reload)),
            button(text("Logout")).on_press(Message::Logout),
        ]
        .spacing(8)
        .align_y(iced::Alignment::Center);

        let choices: Vec<IndexerChoice> = snapshot
            .addable_indexers()
            .into_iter()
            .map(|i| IndexerChoice { id: i.id, name: i.name })
            .collect();
        let add_bar = row![
            pick_list(choices, self.add_selection.clone(), Message::AddSelected)
                .placeholder("Add indexer..."),
            button(text("Add")).on_press_maybe(self.add_selection.as_ref().map(|_| Message::AddIndexer)),
        ]
        .spacing(8);

        let mut page = column![header].spacing(12);
        if let Some(banner) = self.banner.current() {
            page = page.push(view_banner(banner));
        }
        page = page.push(add_bar);

        for (id, controller) in &self.rows {
            if controller.form().is_some() || controller.search_panel().is_some() {
                page = page.push(self.view_row_panels(id, controller));
            }
        }

        let mut table = column![row![
            text("Indexer").width(Length::FillPortion(2)),
            text("Feeds").width(Length::FillPortion(5)),
            text("State").width(Length::FillPortion(1)),
            text("Actions").width(Length::FillPortion(3)),
        ]
        .spacing(8)]
        .spacing(6);

        for indexer in snapshot.enabled_indexers() {
            if let Some(controller) = self.rows.get(&indexer.id) {
                table = table.push(view_indexer_row(&indexer, controller));
            }
        }

        page.push(scrollable(table).height(Length::Fill)).into()
    }

    fn view_row_panels<'a>(&'a self, id: &'a str, controller: &'a IndexerRowController) -> Element<'a, Message> {
        let mut panels = column![].spacing(12);

        if let Some(form) = controller.form() {
            let mut fields = column![text(format!("Configuration for {}", form.indexer_name)).size(18)].spacing(8);
            for field in &form.fields {
                let (indexer_id, name) = (id.to_string(), field.name().to_string());
                fields = fields.push(
                    row![
                        text(field.label()).width(Length::FillPortion(1)),
                        text_input(field.placeholder(), &field.value)
                            .secure(field.is_secret())
                            .on_input(move |value| Message::FieldChanged(indexer_id.clone(), name.clone(), value))
                            .width(Length::FillPortion(4)),
                    ]
                    .spacing(8)
                    .align_y(iced::Alignment::Center),
                );
            }
            let idle = !controller.is_busy();
            fields = fields.push(
                row![
                    button(text(if idle { "Save and Close" } else { "Saving..." }))
                        .on_press_maybe(idle.then(|| Message::SaveEdit(id.to_string()))),
                    button(text("Cancel")).on_press_maybe(idle.then(|| Message::CancelEdit(id.to_string()))),
                ]
                .spacing(8),
            );
            panels = panels.push(panel(fields.into()));
        }

        if let Some(search_panel) = controller.search_panel() {
            let searching = controller.state() == RowState::Searching;
            let submit = controller
                .can_start(RowAction::Search)
                .then(|| Message::SubmitSearch(id.to_string()));
            let indexer_id = id.to_string();

            let mut keywords = text_input("Keywords", &search_panel.keywords)
                .on_input(move |k| Message::KeywordsChanged(indexer_id.clone(), k));
            if let Some(message) = submit.clone() {
                keywords = keywords.on_submit(message);
            }

            let form = row![
                keywords,
                button(text(if searching { "Searching..." } else { "Go" })).on_press_maybe(submit),
                button(text("Close")).on_press_maybe((!searching).then(|| Message::CloseSearch(id.to_string()))),
            ]
            .spacing(8);

            let sort_header = SortColumn::ALL.iter().fold(row![].spacing(4), |header, column| {
                header.push(
                    button(text(column.label()).size(12))
                        .on_press(Message::SortBy(id.to_string(), *column))
                        .width(if *column == SortColumn::Title { Length::FillPortion(6) } else { Length::FillPortion(1) }),
                )
            });

            let results = search_panel.displayed().into_iter().fold(column![].spacing(2), |list, result| {
                let link = search::title_link(&result);
                list.push(
                    row![
                        text(link.label).width(Length::FillPortion(6)),
                        text(search::format_file_size(result.size)).width(Length::FillPortion(1)),
                        text(result.category).width(Length::FillPortion(1)),
                        text(result.seeders.to_string()).width(Length::FillPortion(1)),
                        text(result.peers.to_string()).width(Length::FillPortion(1)),
                        text(result.site).width(Length::FillPortion(1)),
                    ]
                    .spacing(4),
                )
            });

            let name = self.indexer_name(id);
            panels = panels.push(panel(
                column![
                    text(format!("Search on {}", name)).size(18),
                    form,
                    sort_header,
                    scrollable(results).height(Length::Fixed(240.0)),
                ]
                .spacing(8)
                .into(),
            ));
        }

        panels.into()
    }
}

fn lookup(registry: &IndexerRegistry, id: &str) -> Result<Indexer, ConsoleError> {
    registry
        .get(id)
        .ok_or_else(|| ConsoleError::Backend(format!("Unknown indexer {}", id)))
}

/// Stream of `RegistryChanged` messages, one per registry mutation
fn registry_updates(registry: IndexerRegistry) -> impl iced::futures::Stream<Item = Message> {
    iced::stream::channel(16, move |mut output| async move {
        let mut updates = registry.subscribe();
        while updates.changed().await.is_ok() {
            if output.send(Message::RegistryChanged).await.is_err() {
                break;
            }
        }
    })
}

fn view_indexer_row<'a>(indexer: &Indexer, controller: &'a IndexerRowController) -> Element<'a, Message> {
    let id = &indexer.id;
    let action = |action: RowAction, message: Message| controller.can_start(action).then_some(message);
    let saving = controller.state() == RowState::Editing && controller.is_busy();

    let status = controller.status();
    let status_color = match status {
        TestStatus::Ok => colors::OK,
        TestStatus::Failed => colors::DANGER,
        _ => colors::TEXT_MUTED,
    };

    row![
        text(indexer.name.clone()).width(Length::FillPortion(2)),
        text(indexer.torznab_feed().unwrap_or_default().to_string())
            .size(12)
            .width(Length::FillPortion(5)),
        text(status.to_string()).color(status_color).width(Length::FillPortion(1)),
        row![
            button(text(if saving { "Saving..." } else { "Edit" }).size(12))
                .on_press_maybe(action(RowAction::Edit, Message::Edit(id.clone()))),
            button(text("Test").size(12)).on_press_maybe(action(RowAction::Test, Message::Test(id.clone()))),
            button(text("Search").size(12)).on_press(Message::OpenSearch(id.clone())),
            button(text("Disable").size(12))
                .style(button::danger)
                .on_press_maybe(action(RowAction::Disable, Message::Disable(id.clone()))),
        ]
        .spacing(4)
        .width(Length::FillPortion(3)),
    ]
    .spacing(8)
    .align_y(iced::Alignment::Center)
    .into()
}

fn view_banner(banner: &BannerMessage) -> Element<'_, Message> {
    container(
        row![
            text(banner.to_string()).color(Color::WHITE),
            Space::with_width(Length::Fill),
            button(text("Dismiss").size(12)).on_press(Message::DismissBanner),
        ]
        .align_y(iced::Alignment::Center),
    )
    .padding(Padding::from([8.0, 12.0]))
    .width(Length::Fill)
    .style(|_theme| container::Style {
        background: Some(Background::Color(colors::DANGER_SURFACE)),
        border: Border {
            color: colors::DANGER,
            width: 1.0,
            radius: 8.0.into(),
        },
        ..Default::default()
    })
    .into()
}

fn panel(content: Element<'_, Message>) -> Element<'_, Message> {
    container(content)
        .padding(12)
        .width(Length::Fill)
        .style(|_theme| container::Style {
            background: Some(Background::Color(colors::SURFACE)),
            border: Border {
                color: colors::BORDER,
                width: 1.0,
                radius: 8.0.into(),
            },
            ..Default::default()
        })
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;
    use crate::testing::{FakeBackend, TOKEN};

    async fn console(backend: &FakeBackend, token: Option<&str>) -> Console {
        let registry = IndexerRegistry::new(backend.config(), SessionStore::in_memory(token.map(str::to_string)));
        let (mut console, _) = Console::new(registry.clone());
        if token.is_some() {
            let result = registry.load_indexers().await;
            let _ = console.update(Message::IndexersLoaded(result));
        }
        console
    }

    #[tokio::test]
    async fn test_initial_screen_follows_session() {
        let backend = FakeBackend::start().await;
        assert_eq!(console(&backend, None).await.screen, Screen::Login);
        assert_eq!(console(&backend, Some(TOKEN)).await.screen, Screen::Registry);
    }

    #[tokio::test]
    async fn test_failed_test_is_not_bannered() {
        let backend = FakeBackend::start().await;
        let mut console = console(&backend, Some(TOKEN)).await;
        let _ = console.update(Message::Test("flaky".into()));
        assert_eq!(console.rows["flaky"].state(), RowState::Testing);

        let flaky = console.registry.get("flaky").unwrap();
        let result = console.registry.test_indexer(&flaky).await;
        let _ = console.update(Message::TestFinished("flaky".into(), result));

        assert_eq!(console.rows["flaky"].state(), RowState::Idle);
        assert_eq!(console.rows["flaky"].status().to_string(), "Failed");
        assert!(console.banner.current().is_none());
    }

    #[tokio::test]
    async fn test_failed_save_shows_banner() {
        let backend = FakeBackend::start().await;
        let mut console = console(&backend, Some(TOKEN)).await;

        let _ = console.update(Message::Edit("example".into()));
        let config = console.registry.fetch_config("example").await;
        let _ = console.update(Message::ConfigLoaded("example".into(), config));
        let _ = console.update(Message::FieldChanged("example".into(), "url".into(), "http://unreachable".into()));
        let _ = console.update(Message::SaveEdit("example".into()));
        assert!(console.rows["example"].is_busy());

        let example = console.registry.get("example").unwrap();
        let patch = console.rows["example"].form().map(crate::form::collect_values).unwrap();
        let result = console.registry.save_config(&example, patch).await;
        let _ = console.update(Message::ConfigSaved("example".into(), result));

        let banner = console.banner.current().unwrap();
        assert_eq!(banner.message, "Failed to reach indexer");
        assert_eq!(banner.scope.as_deref(), Some("whilst saving Example"));
        assert_eq!(console.rows["example"].state(), RowState::Idle);
        assert!(!console.registry.is_enabled("example"));
    }

    #[tokio::test]
    async fn test_config_for_vanished_indexer_frees_row() {
        let backend = FakeBackend::start().await;
        let mut console = console(&backend, Some(TOKEN)).await;

        let _ = console.update(Message::Edit("example".into()));
        console.registry.reset();
        let _ = console.update(Message::ConfigLoaded("example".into(), Ok(Config::new())));

        let row = &console.rows["example"];
        assert_eq!(row.state(), RowState::Idle);
        assert!(!row.is_busy());
        assert!(row.form().is_none());
        assert_eq!(console.banner.current().unwrap().message, "Unknown indexer example");
    }

    #[tokio::test]
    async fn test_search_results_arrive_unsorted() {
        let backend = FakeBackend::start().await;
        let mut console = console(&backend, Some(TOKEN)).await;
        let found = |title: &str| SearchResult {
            title: title.into(),
            link: format!("http://l/{}", title),
            size: 1024,
            category: "5040".into(),
            seeders: 1,
            peers: 1,
            site: "bithdtv".into(),
        };

        let _ = console.update(Message::OpenSearch("bithdtv".into()));
        let _ = console.update(Message::KeywordsChanged("bithdtv".into(), "foo".into()));
        let _ = console.update(Message::SubmitSearch("bithdtv".into()));
        let _ = console.update(Message::SearchFinished(
            "bithdtv".into(),
            Ok(vec![found("zeta"), found("alpha")]),
        ));

        let shown = |console: &Console| -> Vec<String> {
            let panel = console.rows["bithdtv"].search_panel().unwrap();
            panel.displayed().into_iter().map(|r| r.title).collect()
        };
        assert_eq!(shown(&console), vec!["zeta", "alpha"]);

        let _ = console.update(Message::SortBy("bithdtv".into(), SortColumn::Title));
        assert_eq!(shown(&console), vec!["alpha", "zeta"]);
        // sorting one panel leaves the others alone
        let _ = console.update(Message::OpenSearch("flaky".into()));
        assert!(console.rows["flaky"].search_panel().unwrap().sort().is_none());
    }

    #[tokio::test]
    async fn test_auth_failure_routes_to_login() {
        let backend = FakeBackend::start().await;
        let mut console = console(&backend, Some("stale")).await;
        let result = console.registry.load_indexers().await;
        let _ = console.update(Message::IndexersLoaded(result));

        assert_eq!(console.screen, Screen::Login);
        assert_eq!(console.login_error.as_deref(), Some("Not Authorized"));
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let backend = FakeBackend::start().await;
        let mut console = console(&backend, Some(TOKEN)).await;
        let _ = console.update(Message::Logout);

        assert_eq!(console.screen, Screen::Login);
        assert!(console.rows.is_empty());
        assert!(!console.registry.session().is_authenticated());
        assert!(console.registry.indexers().is_empty());
    }
}
