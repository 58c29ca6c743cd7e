use crate::dataset::{StudentsDataset, YearRecord};
use crate::table::{SortKey, SortState};
use serde::{Deserialize, Serialize};

/// Year preferred as the initial selection when the dataset lists it.
pub const DEFAULT_YEAR: i32 = 67;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Overview,
    Departments,
}

impl Tab {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Overview => "overview",
            Tab::Departments => "departments",
        }
    }
}

/// Everything the user has chosen on the page.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct DashboardState {
    pub year: i32,
    pub tab: Tab,
    pub query: String,
    pub sort: SortState,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            year: DEFAULT_YEAR,
            tab: Tab::Overview,
            query: String::new(),
            sort: SortState::default(),
        }
    }
}

/// User or loader events that change [`DashboardState`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    DatasetLoaded(Vec<i32>),
    SelectYear(i32),
    SelectTab(Tab),
    Search(String),
    SortBy(SortKey),
}

/// Picks the year shown right after the dataset arrives.
pub fn initial_year(years: &[i32]) -> Option<i32> {
    if years.contains(&DEFAULT_YEAR) {
        Some(DEFAULT_YEAR)
    } else {
        years.last().copied()
    }
}

/// Applies one action. `years` is the list the year selector offers;
/// selecting a year outside it leaves the state unchanged.
pub fn reduce(state: DashboardState, action: Action, years: &[i32]) -> DashboardState {
    match action {
        Action::DatasetLoaded(loaded) => match initial_year(&loaded) {
            Some(year) => DashboardState { year, ..state },
            None => state,
        },
        Action::SelectYear(year) if years.contains(&year) => DashboardState { year, ..state },
        Action::SelectYear(year) => {
            log::debug!("ignoring selection of unlisted year {}", year);
            state
        }
        Action::SelectTab(tab) => DashboardState { tab, ..state },
        Action::Search(query) => DashboardState { query, ..state },
        Action::SortBy(key) => DashboardState {
            sort: state.sort.toggle(key),
            ..state
        },
    }
}

impl DashboardState {
    /// Returns the state after `action`, leaving `self` untouched. Used to
    /// build the links a control would follow.
    pub fn after(&self, action: Action, years: &[i32]) -> DashboardState {
        reduce(self.clone(), action, years)
    }
}

/// Record for the selected year, or the first record when the year has
/// none. Returns `None` only for a dataset without records.
pub fn selected_record(dataset: &StudentsDataset, year: i32) -> Option<&YearRecord> {
    match dataset.record_for_year(year) {
        Some(record) => Some(record),
        None => {
            let fallback = dataset.records.first();
            if let Some(record) = fallback {
                log::warn!(
                    "no record for year {}, showing year {} instead",
                    year,
                    record.year
                );
            }
            fallback
        }
    }
}
