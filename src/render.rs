#![cfg(feature = "web")]

use crate::dataset::{StudentsDataset, YearRecord};
use crate::format::{format_number, format_thai_datetime};
use crate::graph::{self, ChartOptions};
use crate::selection::{Action, DashboardState, Tab, selected_record};
use crate::table::{self, DepartmentView, SortDirection, SortKey, Totals};
use handlebars::{Handlebars, RenderError};
use lazy_static::lazy_static;
use serde::Serialize;

lazy_static! {
    static ref TEMPLATES: Handlebars<'static> = {
        let mut hb = Handlebars::new();
        hb.register_template_string("dashboard", include_str!("./static/dashboard.hbs"))
            .expect("dashboard template must parse");
        hb
    };
}

pub const DEFAULT_FACULTY: &str = "คณะวิศวกรรมศาสตร์";
pub const PAGE_TITLE: &str = "แดชบอร์ดจำนวนนักศึกษา";
pub const ERROR_TITLE: &str = "เกิดข้อผิดพลาดในการโหลดข้อมูล";
pub const LOADING_TEXT: &str = "กำลังโหลดข้อมูล…";
pub const NO_DATA_TEXT: &str = "ไม่พบข้อมูล";
const FOOTER: &str = "ข้อมูล: ปีการศึกษา 65–67 • รายสาขา: by_department";

/// What the page has to show, from the dataset load's point of view.
#[derive(Clone, Copy, Debug)]
pub enum PageData<'a> {
    Loading,
    Failed(&'a str),
    Ready(&'a StudentsDataset),
}

#[derive(Serialize)]
struct ErrorBanner {
    title: &'static str,
    message: String,
    hint: &'static str,
}

#[derive(Serialize)]
struct YearOption {
    value: i32,
    selected: bool,
}

#[derive(Serialize)]
struct TabLink {
    label: &'static str,
    href: String,
    active: bool,
}

#[derive(Serialize)]
struct Card {
    title: &'static str,
    value: String,
    hint: &'static str,
    color: &'static str,
    icon: &'static str,
}

#[derive(Serialize)]
struct HeaderLink {
    label: &'static str,
    href: String,
    indicator: &'static str,
}

#[derive(Serialize)]
struct RowCells {
    department: String,
    intake_plan: String,
    new_intake: String,
    retained: String,
    not_open: String,
    total: String,
}

impl RowCells {
    fn new(department: String, t: &Totals) -> Self {
        Self {
            department,
            intake_plan: format_number(t.intake_plan),
            new_intake: format_number(t.new_intake),
            retained: format_number(t.retained),
            not_open: format_number(t.not_open),
            total: format_number(t.total),
        }
    }
}

#[derive(Serialize)]
struct Overview {
    year: i32,
    pie_svg: String,
    bar_svg: String,
}

#[derive(Serialize)]
struct Departments {
    year: i32,
    headers: Vec<HeaderLink>,
    rows: Vec<RowCells>,
    totals: RowCells,
    chart_svg: String,
    csv_href: String,
    xlsx_href: String,
}

#[derive(Serialize)]
struct Hidden {
    year: i32,
    tab: &'static str,
    query: String,
    sort: &'static str,
    dir: &'static str,
}

#[derive(Serialize)]
struct PageModel {
    title: &'static str,
    subtitle: String,
    years: Vec<YearOption>,
    hidden: Hidden,
    error: Option<ErrorBanner>,
    message: Option<&'static str>,
    tabs: Vec<TabLink>,
    cards: Vec<Card>,
    overview: Option<Overview>,
    departments: Option<Departments>,
    footer: &'static str,
}

/// Serialises `state` as the page's query string, leading `?` included.
pub fn query_string(state: &DashboardState) -> String {
    format!(
        "?year={}&tab={}&q={}&sort={}&dir={}",
        state.year,
        state.tab.as_str(),
        urlencoding::encode(&state.query),
        state.sort.key.as_str(),
        state.sort.direction.as_str()
    )
}

fn subtitle(dataset: Option<&StudentsDataset>) -> String {
    let meta = dataset.map(|d| &d.meta);
    let mut out = meta
        .map(|m| m.faculty.clone())
        .unwrap_or_else(|| DEFAULT_FACULTY.to_string());

    if let Some(university) = meta.and_then(|m| m.university.as_deref()) {
        out.push_str(" • ");
        out.push_str(university);
    }
    if let Some(generated_at) = meta.and_then(|m| m.generated_at.as_deref()) {
        let shown = format_thai_datetime(generated_at).unwrap_or_else(|| generated_at.to_string());
        out.push_str(" • อัปเดต: ");
        out.push_str(&shown);
    }

    out
}

fn error_banner(message: &str) -> ErrorBanner {
    ErrorBanner {
        title: ERROR_TITLE,
        message: message.to_string(),
        hint: "ตรวจสอบว่าไฟล์ JSON อยู่ที่ public/data/students_65_67.json หรือกำหนด DASHBOARD_DATA_URL ถูกต้อง",
    }
}

fn summary_cards(record: &YearRecord) -> Vec<Card> {
    vec![
        Card {
            title: "แผนการรับ",
            value: format_number(record.intake_plan),
            hint: "เป้าหมายรับเข้า",
            color: "#17cdc7",
            icon: "📋",
        },
        Card {
            title: "นศ.แรกเข้า",
            value: format_number(record.new_intake),
            hint: "รับเข้าแล้ว/ยืนยันสิทธิ",
            color: "#eb8f25",
            icon: "🎓",
        },
        Card {
            title: "จำนวนคงอยู่",
            value: format_number(record.retained),
            hint: "ยังศึกษาอยู่",
            color: "#059669",
            icon: "👥",
        },
    ]
}

fn tab_links(state: &DashboardState, years: &[i32]) -> Vec<TabLink> {
    [(Tab::Overview, "ภาพรวม"), (Tab::Departments, "รายสาขา (ครบ)")]
        .into_iter()
        .map(|(tab, label)| TabLink {
            label,
            href: query_string(&state.after(Action::SelectTab(tab), years)),
            active: state.tab == tab,
        })
        .collect()
}

fn column_label(key: SortKey) -> &'static str {
    match key {
        SortKey::Department => "สาขา",
        SortKey::IntakePlan => "แผน",
        SortKey::NewIntake => "แรกเข้า",
        SortKey::Retained => "คงอยู่",
        SortKey::NotOpen => "ยังไม่เปิด",
        SortKey::Total => "รวม",
    }
}

fn header_links(state: &DashboardState, years: &[i32]) -> Vec<HeaderLink> {
    SortKey::ALL
        .into_iter()
        .map(|key| HeaderLink {
            label: column_label(key),
            href: query_string(&state.after(Action::SortBy(key), years)),
            indicator: match (state.sort.key == key, state.sort.direction) {
                (false, _) => "",
                (true, SortDirection::Asc) => "▲",
                (true, SortDirection::Desc) => "▼",
            },
        })
        .collect()
}

/// Renders a chart, swapping in an empty string when drawing fails so a
/// broken chart never takes the page down with it.
fn chart_or_placeholder(name: &str, result: Result<String, Box<dyn std::error::Error>>) -> String {
    match result {
        Ok(svg) => svg,
        Err(e) => {
            log::warn!("{} chart not rendered: {}", name, e);
            String::new()
        }
    }
}

fn overview(dataset: &StudentsDataset, record: &YearRecord) -> Overview {
    let pie = graph::render_pie(
        &graph::status_breakdown(record),
        &ChartOptions {
            width: 480,
            height: 360,
            ..ChartOptions::default()
        },
    );
    let bars = graph::render_grouped_bars(
        &graph::year_comparison(&dataset.records),
        &ChartOptions {
            width: 640,
            height: 360,
            ..ChartOptions::default()
        },
    );

    Overview {
        year: record.year,
        pie_svg: chart_or_placeholder("status pie", pie),
        bar_svg: chart_or_placeholder("year comparison", bars),
    }
}

fn departments(record: &YearRecord, state: &DashboardState, years: &[i32]) -> Departments {
    let DepartmentView { rows, totals } = table::view(&record.by_department, &state.query, state.sort);

    let chart = graph::render_grouped_bars(
        &graph::department_breakdown(&rows),
        &ChartOptions {
            width: 960,
            height: 420,
            ..ChartOptions::default()
        },
    );
    let query = query_string(state);

    Departments {
        year: record.year,
        headers: header_links(state, years),
        rows: rows
            .iter()
            .map(|r| RowCells::new(r.department.clone(), &Totals::from(r)))
            .collect(),
        totals: RowCells::new("รวม".to_string(), &totals),
        chart_svg: chart_or_placeholder("department", chart),
        csv_href: format!("/export/departments.csv{}", query),
        xlsx_href: format!("/export/departments.xlsx{}", query),
    }
}

/// Renders the full dashboard page for one request.
pub fn render_page(data: PageData<'_>, state: &DashboardState) -> Result<String, RenderError> {
    let dataset = match data {
        PageData::Ready(dataset) => Some(dataset),
        _ => None,
    };
    let years = dataset.map(StudentsDataset::available_years).unwrap_or_default();

    let mut model = PageModel {
        title: PAGE_TITLE,
        subtitle: subtitle(dataset),
        years: years
            .iter()
            .map(|&value| YearOption {
                value,
                selected: value == state.year,
            })
            .collect(),
        hidden: Hidden {
            year: state.year,
            tab: state.tab.as_str(),
            query: state.query.clone(),
            sort: state.sort.key.as_str(),
            dir: state.sort.direction.as_str(),
        },
        error: None,
        message: None,
        tabs: Vec::new(),
        cards: Vec::new(),
        overview: None,
        departments: None,
        footer: FOOTER,
    };

    match data {
        PageData::Loading => model.message = Some(LOADING_TEXT),
        PageData::Failed(message) => model.error = Some(error_banner(message)),
        PageData::Ready(dataset) => match selected_record(dataset, state.year) {
            None => model.message = Some(NO_DATA_TEXT),
            Some(record) => {
                model.tabs = tab_links(state, &years);
                model.cards = summary_cards(record);
                match state.tab {
                    Tab::Overview => model.overview = Some(overview(dataset, record)),
                    Tab::Departments => model.departments = Some(departments(record, state, &years)),
                }
            }
        },
    }

    TEMPLATES.render("dashboard", &model)
}
