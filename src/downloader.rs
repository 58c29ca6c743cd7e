#![cfg(not(tarpaulin_include))]

use crate::table::{DepartmentView, Totals};
#[cfg(feature = "web")]
use std::error::Error;

/// Column headings shared by both export formats
pub const HEADERS: [&str; 6] = ["สาขา", "แผน", "แรกเข้า", "คงอยู่", "ยังไม่เปิด", "รวม"];

/// Label of the summary row appended after the department rows
pub const TOTAL_LABEL: &str = "รวม";

fn numbers(t: &Totals) -> [u64; 5] {
    [t.intake_plan, t.new_intake, t.retained, t.not_open, t.total]
}

/// Convert a department view to CSV format
///
/// Rows are written in the view's order, followed by a totals row over
/// the same rows. Department names containing commas, quotes or newlines
/// are quoted.
///
/// # Examples
/// ```
/// use enrollment_dashboard::downloader::to_csv;
/// use enrollment_dashboard::table::{view, SortState};
///
/// let csv = to_csv(&view(&[], "", SortState::default()));
/// assert!(csv.ends_with("รวม,0,0,0,0,0\n"));
/// ```
pub fn to_csv(view: &DepartmentView) -> String {
    let mut csv_content = HEADERS.join(",");
    csv_content.push('\n');

    for row in &view.rows {
        csv_content.push_str(&escape_csv(&row.department));
        for n in numbers(&Totals::from(row)) {
            csv_content.push(',');
            csv_content.push_str(&n.to_string());
        }
        csv_content.push('\n');
    }

    csv_content.push_str(TOTAL_LABEL);
    for n in numbers(&view.totals) {
        csv_content.push(',');
        csv_content.push_str(&n.to_string());
    }
    csv_content.push('\n');

    csv_content
}

fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Convert a department view to XLSX format
///
/// Produces a single worksheet named after the academic year with a bold
/// header row and a bold totals row.
#[cfg(feature = "web")]
pub fn to_xlsx(view: &DepartmentView, year: i32) -> Result<Vec<u8>, Box<dyn Error>> {
    use rust_xlsxwriter::{Format, Workbook, Worksheet};

    let bold = Format::new().set_bold();
    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    worksheet.set_name(format!("ปี {}", year))?;

    for (c, header) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, c as u16, *header, &bold)?;
    }

    for (r, row) in view.rows.iter().enumerate() {
        let line = (r + 1) as u32;
        worksheet.write_string(line, 0, row.department.as_str())?;
        for (c, n) in numbers(&Totals::from(row)).into_iter().enumerate() {
            worksheet.write_number(line, (c + 1) as u16, n as f64)?;
        }
    }

    let last = (view.rows.len() + 1) as u32;
    worksheet.write_string_with_format(last, 0, TOTAL_LABEL, &bold)?;
    for (c, n) in numbers(&view.totals).into_iter().enumerate() {
        worksheet.write_number_with_format(last, (c + 1) as u16, n as f64, &bold)?;
    }

    workbook.push_worksheet(worksheet);
    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}
