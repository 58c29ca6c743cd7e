mod common;

use common::{FIXTURE_JSON, dataset, fixture, full_row, record};
use enrollment_dashboard::dataset::{Inconsistency, StudentsDataset, check_consistency};

#[test]
fn bundled_file_parses() {
    let ds = fixture();

    assert_eq!(ds.meta.faculty, "คณะวิศวกรรมศาสตร์");
    assert_eq!(ds.meta.academic_years, vec![65, 66, 67]);
    assert!(ds.meta.generated_at.is_some());
    assert_eq!(ds.records.len(), 3);
    for r in &ds.records {
        assert_eq!(r.by_department.len(), 6);
    }
    println!("✓ bundled dataset parsed with {} records", ds.records.len());
}

#[test]
fn optional_meta_fields_may_be_absent() {
    let json = r#"{
        "meta": { "faculty": "Engineering", "academic_years": [66] },
        "records": [
            { "year": 66, "intake_plan": 10, "new_intake": 8, "retained": 20,
              "not_open": 0, "total": 28 }
        ]
    }"#;

    let ds: StudentsDataset = serde_json::from_str(json).unwrap();
    assert!(ds.meta.university.is_none());
    assert!(ds.meta.generated_at.is_none());
    assert!(ds.records[0].by_department.is_empty());
}

#[test]
fn serialises_back_to_same_document() {
    let ds = fixture();
    let original: serde_json::Value = serde_json::from_str(FIXTURE_JSON).unwrap();
    assert_eq!(serde_json::to_value(&ds).unwrap(), original);
}

#[test]
fn available_years_uses_meta_list() {
    let ds = dataset(vec![67, 65], vec![record(66, Vec::new())]);
    assert_eq!(ds.available_years(), vec![67, 65]);
}

#[test]
fn available_years_derived_from_records_when_unlisted() {
    let ds = dataset(
        Vec::new(),
        vec![record(67, Vec::new()), record(65, Vec::new()), record(67, Vec::new())],
    );
    assert_eq!(ds.available_years(), vec![65, 67]);
}

#[test]
fn bundled_file_is_consistent() {
    assert!(check_consistency(&fixture()).is_empty());
}

#[test]
fn mismatched_totals_are_reported_not_fixed() {
    let mut ds = dataset(vec![67], vec![record(67, vec![full_row("CS", 10, 5, 5, 0)])]);
    ds.records[0].total = 11;

    let findings = check_consistency(&ds);

    assert!(findings.contains(&Inconsistency::RecordTotalMismatch {
        year: 67,
        total: 11,
        components: 10,
    }));
    assert!(findings.contains(&Inconsistency::DepartmentSumMismatch {
        year: 67,
        field: "total",
        record: 11,
        departments: 10,
    }));
    // Data is left as it was
    assert_eq!(ds.records[0].total, 11);
}

#[test]
fn row_level_problems_are_reported() {
    let mut bad = full_row("CS", 1, 1, 1, 0);
    bad.total = 5;
    let rows = vec![bad, full_row("CS", 1, 1, 1, 0), full_row(" ", 0, 0, 0, 0)];
    let ds = dataset(vec![66], vec![record(66, rows), record(67, Vec::new())]);

    let findings = check_consistency(&ds);

    assert!(findings.contains(&Inconsistency::DepartmentTotalMismatch {
        year: 66,
        department: "CS".to_string(),
        total: 5,
        components: 2,
    }));
    assert!(findings.contains(&Inconsistency::DuplicateDepartment {
        year: 66,
        department: "CS".to_string(),
    }));
    assert!(findings.contains(&Inconsistency::EmptyDepartmentName { year: 66, index: 2 }));
    assert!(findings.contains(&Inconsistency::YearNotListed { year: 67 }));
}

#[test]
fn duplicate_years_are_reported() {
    let ds = dataset(vec![65], vec![record(65, Vec::new()), record(65, Vec::new())]);
    assert!(check_consistency(&ds).contains(&Inconsistency::DuplicateYear { year: 65 }));
}

#[test]
fn overflowing_sums_are_reported() {
    let ds: StudentsDataset = serde_json::from_str(
        r#"{
            "meta": {"faculty": "F", "academic_years": [67]},
            "records": [{
                "year": 67,
                "intake_plan": 0,
                "new_intake": 18446744073709551615,
                "retained": 1,
                "not_open": 0,
                "total": 1,
                "by_department": [
                    {"department": "A", "intake_plan": 0, "new_intake": 18446744073709551615,
                     "retained": 0, "not_open": 0, "total": 18446744073709551615},
                    {"department": "B", "intake_plan": 0, "new_intake": 1,
                     "retained": 0, "not_open": 0, "total": 1}
                ]
            }]
        }"#,
    )
    .unwrap();

    let findings = check_consistency(&ds);

    assert!(findings.contains(&Inconsistency::SumOverflow {
        year: 67,
        department: None,
        field: "new_intake + retained + not_open",
    }));
    assert!(findings.contains(&Inconsistency::SumOverflow {
        year: 67,
        department: None,
        field: "total",
    }));
    assert!(!findings.iter().any(|f| matches!(f, Inconsistency::RecordTotalMismatch { .. })));
    let text = findings
        .iter()
        .find(|f| matches!(f, Inconsistency::SumOverflow { .. }))
        .unwrap()
        .to_string();
    assert!(text.contains("overflows"));
}

#[test]
fn findings_have_readable_messages() {
    let text = Inconsistency::RecordTotalMismatch {
        year: 67,
        total: 11,
        components: 10,
    }
    .to_string();
    assert!(text.contains("67"));
    assert!(text.contains("11"));
}
