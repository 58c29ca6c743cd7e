#![cfg(feature = "web")]

mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use common::{dataset, fixture};
use enrollment_dashboard::app::{AppState, DashboardQuery, LoadState, router};
use enrollment_dashboard::loader::LoadError;
use enrollment_dashboard::render::{ERROR_TITLE, LOADING_TEXT, NO_DATA_TEXT};
use enrollment_dashboard::selection::Tab;
use enrollment_dashboard::table::{SortDirection, SortKey};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

fn app(state: AppState) -> Router {
    router(Arc::new(state), Path::new("public"))
}

async fn get(app: Router, uri: &str) -> (StatusCode, String, Option<String>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8_lossy(&body).into_owned(), content_type)
}

fn failed_state() -> AppState {
    let state = AppState::new();
    state.finish_load(Err(LoadError::Status {
        status: 404,
        reason: "Not Found".to_string(),
    }));
    state
}

#[test]
fn query_defaults_to_initial_year_and_total_desc() {
    let state = DashboardQuery::default().into_state(&[65, 66, 67]);
    assert_eq!(state.year, 67);
    assert_eq!(state.tab, Tab::Overview);
    assert_eq!(state.sort.key, SortKey::Total);
    assert_eq!(state.sort.direction, SortDirection::Desc);

    let state = DashboardQuery::default().into_state(&[63, 64]);
    assert_eq!(state.year, 64);
}

#[test]
fn query_values_are_applied() {
    let query = DashboardQuery {
        year: Some(65),
        tab: Some(Tab::Departments),
        q: Some("คอม".to_string()),
        sort: Some(SortKey::Department),
        dir: None,
    };

    let state = query.into_state(&[65, 66, 67]);

    assert_eq!(state.year, 65);
    assert_eq!(state.tab, Tab::Departments);
    assert_eq!(state.query, "คอม");
    assert_eq!(state.sort.key, SortKey::Department);
    assert_eq!(state.sort.direction, SortDirection::Asc);
}

#[test]
fn unlisted_year_in_query_is_ignored() {
    let query = DashboardQuery {
        year: Some(99),
        ..Default::default()
    };
    assert_eq!(query.into_state(&[65, 66, 67]).year, 67);
}

#[test]
fn load_after_close_is_discarded() {
    let state = AppState::new();
    state.close();

    assert!(!state.finish_load(Ok(fixture())));
    assert!(matches!(state.snapshot(), LoadState::Loading));
}

#[test]
fn close_keeps_the_state_already_recorded() {
    let state = AppState::with_dataset(fixture());
    state.close();

    assert!(!state.finish_load(Err(LoadError::InvalidLocation(String::new()))));
    assert!(matches!(state.snapshot(), LoadState::Ready(_)));
}

#[test]
fn overflowing_counts_still_finish_loading() {
    let mut ds = fixture();
    ds.records[0].new_intake = u64::MAX;
    ds.records[0].by_department[0].retained = u64::MAX;
    ds.records[0].by_department[1].retained = u64::MAX;

    let state = AppState::new();

    assert!(state.finish_load(Ok(ds)));
    assert!(matches!(state.snapshot(), LoadState::Ready(_)));
}

#[tokio::test]
async fn page_shows_loading_until_dataset_arrives() {
    let (status, body, _) = get(app(AppState::new()), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(LOADING_TEXT));
}

#[tokio::test]
async fn page_shows_error_banner_with_status() {
    let (status, body, _) = get(app(failed_state()), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(ERROR_TITLE));
    assert!(body.contains("404"));
    assert!(body.contains("DASHBOARD_DATA_URL"));
}

#[tokio::test]
async fn empty_dataset_shows_no_data() {
    let state = AppState::with_dataset(dataset(vec![67], Vec::new()));

    let (_, body, _) = get(app(state), "/").await;

    assert!(body.contains(NO_DATA_TEXT));
    assert!(!body.contains(ERROR_TITLE));
}

#[tokio::test]
async fn overview_page_shows_cards_for_selected_year() {
    let (status, body, content_type) = get(app(AppState::with_dataset(fixture())), "/?year=66").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));
    // Year 66: plan 610, new intake 527, retained 1,470
    assert!(body.contains("610"));
    assert!(body.contains("527"));
    assert!(body.contains("1,470"));
    assert!(body.contains("คณะวิศวกรรมศาสตร์"));
    assert!(body.contains("อัปเดต: 15/1/2568 9:30:00"));
    // The department table belongs to the other tab
    assert!(!body.contains("<tfoot>"));
    // Panel headings are printed once, not repeated inside the charts
    assert_eq!(body.matches("กราฟวงกลม: สัดส่วนภาพรวม").count(), 1);
    assert_eq!(body.matches("กราฟแท่ง: เปรียบเทียบปีการศึกษา").count(), 1);
}

#[tokio::test]
async fn departments_page_filters_and_totals() {
    let uri = format!("/?year=67&tab=departments&q={}", urlencoding::encode("คอม"));

    let (status, body, _) = get(app(AppState::with_dataset(fixture())), &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<tfoot>"));
    assert!(body.contains("วิศวกรรมคอมพิวเตอร์"));
    assert!(!body.contains("วิศวกรรมโยธา"));
    assert!(body.contains("618"));
    assert_eq!(body.matches("กราฟแท่งรายสาขา").count(), 1);
}

#[tokio::test]
async fn departments_api_returns_view() {
    let uri = "/api/departments?year=67&sort=department&dir=asc";

    let (status, body, _) = get(app(AppState::with_dataset(fixture())), uri).await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["year"], 67);
    assert_eq!(json["rows"][0]["department"], "วิศวกรรมคอมพิวเตอร์");
    assert_eq!(json["rows"].as_array().unwrap().len(), 6);
    assert_eq!(json["totals"]["total"], 2125);
    assert_eq!(json["sort"]["key"], "department");
    assert_eq!(json["sort"]["direction"], "asc");
}

#[tokio::test]
async fn departments_api_falls_back_to_first_record() {
    let mut ds = fixture();
    ds.meta.academic_years.push(68);

    let (status, body, _) = get(app(AppState::with_dataset(ds)), "/api/departments?year=68").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["year"], 65);
}

#[tokio::test]
async fn dataset_api_reflects_load_state() {
    let (status, _, _) = get(app(AppState::new()), "/api/dataset").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, body, _) = get(app(failed_state()), "/api/dataset").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("404"));

    let (status, body, _) = get(app(AppState::with_dataset(fixture())), "/api/dataset").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["records"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn consistency_api_lists_findings() {
    let mut ds = fixture();
    ds.records[0].total += 1;

    let (status, body, _) = get(app(AppState::with_dataset(ds)), "/api/consistency").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    let kinds: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["kind"].as_str())
        .collect();
    assert!(kinds.contains(&"record_total_mismatch"));
}

#[tokio::test]
async fn csv_export_matches_table() {
    let uri = format!("/export/departments.csv?year=67&q={}", urlencoding::encode("เคมี"));

    let (status, body, content_type) = get(app(AppState::with_dataset(fixture())), &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/csv"));
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "วิศวกรรมเคมี,60,41,30,0,71");
    assert_eq!(lines[2], "รวม,60,41,30,0,71");
}

#[tokio::test]
async fn xlsx_export_is_a_zip_archive() {
    let app = app(AppState::with_dataset(fixture()));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/export/departments.xlsx?year=65")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..2], b"PK");
}

#[tokio::test]
async fn serves_bundled_data_file() {
    let (status, body, _) = get(app(AppState::new()), "/data/students_65_67.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("academic_years"));
}
