use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// The whole enrollment document as published in the data file.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct StudentsDataset {
    pub meta: DatasetMeta,
    pub records: Vec<YearRecord>,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct DatasetMeta {
    pub faculty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
    pub academic_years: Vec<i32>,
    /// Timestamp of the export that produced the file (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

/// Faculty-wide figures for one academic year.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct YearRecord {
    pub year: i32,
    pub intake_plan: u64,
    pub new_intake: u64,
    pub retained: u64,
    pub not_open: u64,
    pub total: u64,
    #[serde(default)]
    pub by_department: Vec<DepartmentRow>,
}

/// Per-department breakdown inside a [`YearRecord`]. The department name
/// is the row key within its record.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct DepartmentRow {
    pub department: String,
    pub intake_plan: u64,
    pub new_intake: u64,
    pub retained: u64,
    pub not_open: u64,
    pub total: u64,
}

impl StudentsDataset {
    /// Years offered by the year selector.
    ///
    /// Uses `meta.academic_years` as published. When the list is empty the
    /// years found in the records are used instead, sorted and deduplicated.
    pub fn available_years(&self) -> Vec<i32> {
        if !self.meta.academic_years.is_empty() {
            return self.meta.academic_years.clone();
        }

        self.records
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn record_for_year(&self, year: i32) -> Option<&YearRecord> {
        self.records.iter().find(|r| r.year == year)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A cross-field mismatch found in the dataset.
///
/// These are reported as found. Nothing in the crate rewrites the
/// numbers to make them agree.
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inconsistency {
    YearNotListed {
        year: i32,
    },
    DuplicateYear {
        year: i32,
    },
    RecordTotalMismatch {
        year: i32,
        total: u64,
        components: u64,
    },
    DepartmentTotalMismatch {
        year: i32,
        department: String,
        total: u64,
        components: u64,
    },
    DepartmentSumMismatch {
        year: i32,
        field: &'static str,
        record: u64,
        departments: u64,
    },
    EmptyDepartmentName {
        year: i32,
        index: usize,
    },
    DuplicateDepartment {
        year: i32,
        department: String,
    },
    /// A sum that does not fit in a `u64`; `department` is `None` for
    /// record-level sums.
    SumOverflow {
        year: i32,
        department: Option<String>,
        field: &'static str,
    },
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inconsistency::YearNotListed { year } => {
                write!(f, "year {} has a record but is not in academic_years", year)
            }
            Inconsistency::DuplicateYear { year } => {
                write!(f, "year {} has more than one record", year)
            }
            Inconsistency::RecordTotalMismatch {
                year,
                total,
                components,
            } => write!(
                f,
                "year {}: total {} != new_intake + retained + not_open ({})",
                year, total, components
            ),
            Inconsistency::DepartmentTotalMismatch {
                year,
                department,
                total,
                components,
            } => write!(
                f,
                "year {} department '{}': total {} != new_intake + retained + not_open ({})",
                year, department, total, components
            ),
            Inconsistency::DepartmentSumMismatch {
                year,
                field,
                record,
                departments,
            } => write!(
                f,
                "year {}: {} is {} but departments sum to {}",
                year, field, record, departments
            ),
            Inconsistency::EmptyDepartmentName { year, index } => {
                write!(f, "year {}: department row {} has an empty name", year, index)
            }
            Inconsistency::DuplicateDepartment { year, department } => {
                write!(f, "year {}: department '{}' appears more than once", year, department)
            }
            Inconsistency::SumOverflow {
                year,
                department: Some(department),
                field,
            } => write!(f, "year {} department '{}': {} overflows", year, department, field),
            Inconsistency::SumOverflow {
                year,
                department: None,
                field,
            } => write!(f, "year {}: {} overflows", year, field),
        }
    }
}

/// Checks the cross-field relationships the data file is expected to
/// hold and returns every mismatch found.
///
/// Department sums are only compared when the record has department rows,
/// since a record without a breakdown is valid.
pub fn check_consistency(dataset: &StudentsDataset) -> Vec<Inconsistency> {
    let mut findings = Vec::new();
    let listed: HashSet<i32> = dataset.meta.academic_years.iter().copied().collect();
    let mut seen_years = HashSet::new();

    for record in &dataset.records {
        let year = record.year;

        if !listed.contains(&year) {
            findings.push(Inconsistency::YearNotListed { year });
        }
        if !seen_years.insert(year) {
            findings.push(Inconsistency::DuplicateYear { year });
        }

        match components(record.new_intake, record.retained, record.not_open) {
            Some(components) if components != record.total => {
                findings.push(Inconsistency::RecordTotalMismatch {
                    year,
                    total: record.total,
                    components,
                });
            }
            Some(_) => {}
            None => findings.push(Inconsistency::SumOverflow {
                year,
                department: None,
                field: COMPONENTS,
            }),
        }

        let mut names = HashSet::new();
        for (index, row) in record.by_department.iter().enumerate() {
            if row.department.trim().is_empty() {
                findings.push(Inconsistency::EmptyDepartmentName { year, index });
            } else if !names.insert(row.department.as_str()) {
                findings.push(Inconsistency::DuplicateDepartment {
                    year,
                    department: row.department.clone(),
                });
            }

            match components(row.new_intake, row.retained, row.not_open) {
                Some(components) if components != row.total => {
                    findings.push(Inconsistency::DepartmentTotalMismatch {
                        year,
                        department: row.department.clone(),
                        total: row.total,
                        components,
                    });
                }
                Some(_) => {}
                None => findings.push(Inconsistency::SumOverflow {
                    year,
                    department: Some(row.department.clone()),
                    field: COMPONENTS,
                }),
            }
        }

        if record.by_department.is_empty() {
            continue;
        }

        let rows = &record.by_department;
        let pairs: [(&'static str, u64, fn(&DepartmentRow) -> u64); 5] = [
            ("intake_plan", record.intake_plan, |r| r.intake_plan),
            ("new_intake", record.new_intake, |r| r.new_intake),
            ("retained", record.retained, |r| r.retained),
            ("not_open", record.not_open, |r| r.not_open),
            ("total", record.total, |r| r.total),
        ];
        for (field, record_value, column) in pairs {
            let sum = rows.iter().try_fold(0u64, |acc, row| acc.checked_add(column(row)));
            match sum {
                Some(departments) if departments != record_value => {
                    findings.push(Inconsistency::DepartmentSumMismatch {
                        year,
                        field,
                        record: record_value,
                        departments,
                    });
                }
                Some(_) => {}
                None => findings.push(Inconsistency::SumOverflow {
                    year,
                    department: None,
                    field,
                }),
            }
        }
    }

    findings
}

const COMPONENTS: &str = "new_intake + retained + not_open";

fn components(new_intake: u64, retained: u64, not_open: u64) -> Option<u64> {
    new_intake.checked_add(retained)?.checked_add(not_open)
}
