#![allow(dead_code)]

use enrollment_dashboard::dataset::{DatasetMeta, DepartmentRow, StudentsDataset, YearRecord};

pub const FIXTURE_JSON: &str = include_str!("../../public/data/students_65_67.json");

// Parsed copy of the bundled data file (years 65-67, six departments each)
pub fn fixture() -> StudentsDataset {
    serde_json::from_str(FIXTURE_JSON).expect("bundled dataset should parse")
}

pub fn row(department: &str, total: u64) -> DepartmentRow {
    DepartmentRow {
        department: department.to_string(),
        intake_plan: 0,
        new_intake: 0,
        retained: 0,
        not_open: 0,
        total,
    }
}

pub fn full_row(department: &str, plan: u64, new: u64, retained: u64, not_open: u64) -> DepartmentRow {
    DepartmentRow {
        department: department.to_string(),
        intake_plan: plan,
        new_intake: new,
        retained,
        not_open,
        total: new + retained + not_open,
    }
}

pub fn record(year: i32, rows: Vec<DepartmentRow>) -> YearRecord {
    let sum = |f: fn(&DepartmentRow) -> u64| rows.iter().map(f).sum::<u64>();
    YearRecord {
        year,
        intake_plan: sum(|r| r.intake_plan),
        new_intake: sum(|r| r.new_intake),
        retained: sum(|r| r.retained),
        not_open: sum(|r| r.not_open),
        total: sum(|r| r.total),
        by_department: rows,
    }
}

pub fn dataset(years: Vec<i32>, records: Vec<YearRecord>) -> StudentsDataset {
    StudentsDataset {
        meta: DatasetMeta {
            faculty: "คณะวิศวกรรมศาสตร์".to_string(),
            university: None,
            academic_years: years,
            generated_at: None,
        },
        records,
    }
}
