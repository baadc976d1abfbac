//! View state container.
//!
//! All UI state lives in [`ViewState`] and changes only through
//! [`ViewState::apply`]. Fetch results arrive as [`Action::Loaded`] or
//! [`Action::LoadFailed`]; whether a failure swaps in the bundled demo
//! data is decided here, by the [`FallbackPolicy`] the state was built
//! with.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{debug, warn};

use super::demo;
use crate::aggregate::{build_leaderboard, build_overview, CompanyRow, Leaderboard, Overview};
use crate::model::{CompanyKey, Contact, Deal, PipelineCatalog, Task};

/// Top-level navigation tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Dashboard,
    Companies,
    Contacts,
    Deals,
    Tasks,
    Settings,
}

impl Tab {
    pub const ALL: [Self; 6] = [
        Self::Dashboard,
        Self::Companies,
        Self::Contacts,
        Self::Deals,
        Self::Tasks,
        Self::Settings,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Companies => "companies",
            Self::Contacts => "contacts",
            Self::Deals => "deals",
            Self::Tasks => "tasks",
            Self::Settings => "settings",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Companies => "Companies",
            Self::Contacts => "Contacts",
            Self::Deals => "Deals",
            Self::Tasks => "Tasks",
            Self::Settings => "Settings",
        }
    }

    /// One-line description shown under the tab title.
    #[must_use]
    pub const fn blurb(self) -> &'static str {
        match self {
            Self::Dashboard => "Monitor revenue health, tasks, and top deals.",
            Self::Companies => "Track account health and engagement at a glance.",
            Self::Contacts => "Grow relationships and keep details current.",
            Self::Deals => "Move opportunities forward across every stage.",
            Self::Tasks => "Prioritise follow-ups and stay on schedule.",
            Self::Settings => "Tune Salesesy to match your team's workflow.",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|tab| tab.as_str() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|t| t.as_str()).collect();
                format!("unknown tab '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

/// Dialogs that can be open over the current tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Modal {
    AddTask,
    AddContact,
    AddDeal,
}

/// Where the data on screen came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    Unloaded,
    Live,
    Demo,
}

/// What to do when a fetch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Keep what is loaded and record the error
    #[default]
    Strict,
    /// Replace everything with the bundled demo data
    Demo,
}

/// The API resources the view loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Health,
    Pipelines,
    Contacts,
    Deals,
    Tasks,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Health => "health",
            Self::Pipelines => "pipelines",
            Self::Contacts => "contacts",
            Self::Deals => "deals",
            Self::Tasks => "tasks",
        })
    }
}

/// A successfully fetched resource.
#[derive(Debug, Clone)]
pub enum Loaded {
    Health(String),
    Pipelines(PipelineCatalog),
    Contacts(Vec<Contact>),
    Deals(Vec<Deal>),
    Tasks(Vec<Task>),
}

impl Loaded {
    #[must_use]
    pub const fn resource(&self) -> Resource {
        match self {
            Self::Health(_) => Resource::Health,
            Self::Pipelines(_) => Resource::Pipelines,
            Self::Contacts(_) => Resource::Contacts,
            Self::Deals(_) => Resource::Deals,
            Self::Tasks(_) => Resource::Tasks,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    SelectTab(Tab),
    ToggleTheme,
    OpenModal(Modal),
    CloseModal,
    /// Show one company's profile; blank names clear the selection
    SelectCompany(String),
    ClearCompany,
    Loaded(Loaded),
    LoadFailed { resource: Resource, message: String },
    /// Drop all data and go back to `Unloaded`
    Reset,
}

/// A fetch failure the view kept instead of falling back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadError {
    pub resource: Resource,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub tab: Tab,
    pub theme: Theme,
    pub modal: Option<Modal>,
    pub source: DataSource,
    pub fallback: FallbackPolicy,
    /// `ok` from the API, `demo` under demo data
    pub health: Option<String>,
    pub catalog: PipelineCatalog,
    pub contacts: Vec<Contact>,
    pub deals: Vec<Deal>,
    pub tasks: Vec<Task>,
    pub selected_company: Option<CompanyKey>,
    pub errors: Vec<LoadError>,
}

impl ViewState {
    #[must_use]
    pub fn new(fallback: FallbackPolicy) -> Self {
        Self {
            fallback,
            ..Self::default()
        }
    }

    /// Apply one action.
    ///
    /// Under demo data, later successful loads are ignored so that the
    /// screen never mixes demo and live records.
    pub fn apply(&mut self, action: Action) {
        match action {
            Action::SelectTab(tab) => {
                self.tab = tab;
                self.modal = None;
            }
            Action::ToggleTheme => self.theme = self.theme.toggled(),
            Action::OpenModal(modal) => self.modal = Some(modal),
            Action::CloseModal => self.modal = None,
            Action::SelectCompany(name) => match CompanyKey::normalize(&name) {
                Some(key) => {
                    self.selected_company = Some(key);
                    self.tab = Tab::Companies;
                }
                None => self.selected_company = None,
            },
            Action::ClearCompany => self.selected_company = None,
            Action::Loaded(loaded) => self.on_loaded(loaded),
            Action::LoadFailed { resource, message } => self.on_failed(resource, message),
            Action::Reset => {
                *self = Self {
                    tab: self.tab,
                    theme: self.theme,
                    fallback: self.fallback,
                    ..Self::default()
                };
            }
        }
    }

    /// Apply a sequence of actions in order.
    pub fn apply_all(&mut self, actions: impl IntoIterator<Item = Action>) {
        for action in actions {
            self.apply(action);
        }
    }

    fn on_loaded(&mut self, loaded: Loaded) {
        if self.source == DataSource::Demo {
            debug!(resource = %loaded.resource(), "Ignoring live data while showing demo data");
            return;
        }
        match loaded {
            Loaded::Health(status) => self.health = Some(status),
            Loaded::Pipelines(catalog) => self.catalog = catalog,
            Loaded::Contacts(contacts) => self.contacts = contacts,
            Loaded::Deals(deals) => self.deals = deals,
            Loaded::Tasks(tasks) => self.tasks = tasks,
        }
        self.source = DataSource::Live;
    }

    fn on_failed(&mut self, resource: Resource, message: String) {
        match self.fallback {
            FallbackPolicy::Demo => {
                if self.source != DataSource::Demo {
                    warn!(%resource, error = %message, "Falling back to demo data");
                    self.enable_demo();
                }
            }
            FallbackPolicy::Strict => {
                warn!(%resource, error = %message, "Load failed");
                self.errors.push(LoadError { resource, message });
            }
        }
    }

    fn enable_demo(&mut self) {
        self.source = DataSource::Demo;
        self.health = Some("demo".to_string());
        self.catalog = demo::catalog();
        self.contacts = demo::contacts();
        self.deals = demo::deals();
        self.tasks = demo::tasks();
    }

    #[must_use]
    pub fn is_demo(&self) -> bool {
        self.source == DataSource::Demo
    }

    #[must_use]
    pub fn leaderboard(&self) -> Leaderboard {
        build_leaderboard(&self.contacts, &self.deals)
    }

    #[must_use]
    pub fn overview(&self) -> Overview {
        build_overview(&self.catalog, &self.deals, &self.tasks)
    }

    /// Leaderboard row of the selected company, if it has one.
    #[must_use]
    pub fn selected_row(&self) -> Option<CompanyRow> {
        let key = self.selected_company.as_ref()?;
        self.leaderboard()
            .companies
            .into_iter()
            .find(|row| &row.key == key)
    }
}
