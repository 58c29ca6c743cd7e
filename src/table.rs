use crate::dataset::DepartmentRow;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::{Add, AddAssign};

/// Column a department table can be sorted by
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Department,
    IntakePlan,
    NewIntake,
    Retained,
    NotOpen,
    #[default]
    Total,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::Department,
        SortKey::IntakePlan,
        SortKey::NewIntake,
        SortKey::Retained,
        SortKey::NotOpen,
        SortKey::Total,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Department => "department",
            SortKey::IntakePlan => "intake_plan",
            SortKey::NewIntake => "new_intake",
            SortKey::Retained => "retained",
            SortKey::NotOpen => "not_open",
            SortKey::Total => "total",
        }
    }

    /// Direction a column starts in when it is first selected.
    pub fn default_direction(&self) -> SortDirection {
        match self {
            SortKey::Department => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    fn numeric(&self, row: &DepartmentRow) -> u64 {
        match self {
            SortKey::Department => 0,
            SortKey::IntakePlan => row.intake_plan,
            SortKey::NewIntake => row.new_intake,
            SortKey::Retained => row.retained,
            SortKey::NotOpen => row.not_open,
            SortKey::Total => row.total,
        }
    }

    fn compare(&self, a: &DepartmentRow, b: &DepartmentRow) -> Ordering {
        match self {
            SortKey::Department => locale_cmp(&a.department, &b.department),
            _ => self.numeric(a).cmp(&self.numeric(b)),
        }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Current sort column and direction of the department table.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Header click: the same column flips direction, a new column starts
    /// in its default direction.
    pub fn toggle(self, key: SortKey) -> Self {
        if key == self.key {
            Self {
                key,
                direction: self.direction.flip(),
            }
        } else {
            Self {
                key,
                direction: key.default_direction(),
            }
        }
    }
}

/// Column sums over a set of department rows. Sums saturate at `u64::MAX`.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct Totals {
    pub intake_plan: u64,
    pub new_intake: u64,
    pub retained: u64,
    pub not_open: u64,
    pub total: u64,
}

impl Totals {
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a DepartmentRow>,
    {
        rows.into_iter().fold(Totals::default(), |mut acc, row| {
            acc += Totals::from(row);
            acc
        })
    }
}

impl From<&DepartmentRow> for Totals {
    fn from(row: &DepartmentRow) -> Self {
        Totals {
            intake_plan: row.intake_plan,
            new_intake: row.new_intake,
            retained: row.retained,
            not_open: row.not_open,
            total: row.total,
        }
    }
}

impl Add for Totals {
    type Output = Totals;

    fn add(mut self, rhs: Totals) -> Totals {
        self += rhs;
        self
    }
}

impl AddAssign for Totals {
    fn add_assign(&mut self, rhs: Totals) {
        self.intake_plan = self.intake_plan.saturating_add(rhs.intake_plan);
        self.new_intake = self.new_intake.saturating_add(rhs.new_intake);
        self.retained = self.retained.saturating_add(rhs.retained);
        self.not_open = self.not_open.saturating_add(rhs.not_open);
        self.total = self.total.saturating_add(rhs.total);
    }
}

/// Filtered and sorted rows plus their column sums.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct DepartmentView {
    pub rows: Vec<DepartmentRow>,
    pub totals: Totals,
}

/// Builds the department table for one record.
///
/// Rows whose department contains the trimmed query (case-insensitively)
/// are kept; a blank query keeps every row. The kept rows are stably
/// sorted by `sort` and summed. Totals cover the filtered rows only.
///
/// # Examples
/// ```
/// use enrollment_dashboard::dataset::DepartmentRow;
/// use enrollment_dashboard::table::{view, SortDirection, SortKey, SortState};
///
/// let row = |name: &str, total| DepartmentRow {
///     department: name.to_string(),
///     intake_plan: 0,
///     new_intake: 0,
///     retained: 0,
///     not_open: 0,
///     total,
/// };
/// let rows = vec![row("EE", 50), row("CS", 100)];
///
/// let v = view(&rows, "", SortState::new(SortKey::Total, SortDirection::Desc));
/// assert_eq!(v.rows[0].department, "CS");
/// assert_eq!(v.totals.total, 150);
/// ```
pub fn view(rows: &[DepartmentRow], query: &str, sort: SortState) -> DepartmentView {
    let mut filtered = filter_rows(rows, query);
    sort_rows(&mut filtered, sort);
    let totals = Totals::from_rows(&filtered);

    DepartmentView {
        rows: filtered,
        totals,
    }
}

/// Case-insensitive substring filter on the department name.
pub fn filter_rows(rows: &[DepartmentRow], query: &str) -> Vec<DepartmentRow> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return rows.to_vec();
    }

    rows.iter()
        .filter(|r| r.department.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Stable in-place sort; rows with equal keys keep their input order.
pub fn sort_rows(rows: &mut [DepartmentRow], sort: SortState) {
    rows.sort_by(|a, b| sort.direction.apply(sort.key.compare(a, b)));
}

/// Thai leading vowels, written before the consonant they follow in speech.
fn is_leading_vowel(c: char) -> bool {
    matches!(c, '\u{0E40}'..='\u{0E44}')
}

/// Thai tone marks and the thanthakhat, ignored at the primary level.
fn is_tone_mark(c: char) -> bool {
    matches!(c, '\u{0E48}'..='\u{0E4C}')
}

/// Primary collation key: lowercased, tone marks dropped, and each Thai
/// leading vowel moved after the consonant that follows it.
fn primary_key(s: &str) -> Vec<char> {
    let mut key: Vec<char> = Vec::with_capacity(s.len());
    let mut pending_vowel: Option<char> = None;

    for c in s.chars().flat_map(char::to_lowercase) {
        if is_tone_mark(c) {
            continue;
        }
        if is_leading_vowel(c) {
            if let Some(v) = pending_vowel.replace(c) {
                key.push(v);
            }
            continue;
        }
        key.push(c);
        if let Some(v) = pending_vowel.take() {
            key.push(v);
        }
    }
    if let Some(v) = pending_vowel {
        key.push(v);
    }

    key
}

/// Department name ordering used by the table.
///
/// Compares by [`primary_key`] first, then by tone marks, then by raw
/// code points so that distinct names never compare equal.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    primary_key(a)
        .cmp(&primary_key(b))
        .then_with(|| {
            let tones_a: Vec<char> = a.chars().filter(|c| is_tone_mark(*c)).collect();
            let tones_b: Vec<char> = b.chars().filter(|c| is_tone_mark(*c)).collect();
            tones_a.cmp(&tones_b)
        })
        .then_with(|| a.cmp(b))
}
