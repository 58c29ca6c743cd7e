#![cfg(not(tarpaulin_include))]
#![cfg(feature = "web")]
use crate::dataset::{DepartmentRow, YearRecord};
use crate::format::format_number;
use plotters::prelude::*;
use std::error::Error;

/// Configuration options for chart generation
#[derive(Clone, Debug)]
pub struct ChartOptions {
    /// Title displayed at the top of the chart, if not empty
    pub title: String,

    /// Width of the chart in pixels
    pub width: u32,

    /// Height of the chart in pixels
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            width: 800,
            height: 400,
        }
    }
}

/// One coloured series of a grouped bar chart
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub name: &'static str,
    pub color: RGBColor,
    pub values: Vec<u64>,
}

/// Bars grouped by category, one bar per series in every group
#[derive(Clone, Debug, PartialEq)]
pub struct GroupedBars {
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

impl GroupedBars {
    fn max_value(&self) -> u64 {
        self.series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .max()
            .unwrap_or(0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PieSlice {
    pub name: &'static str,
    pub color: RGBColor,
    pub value: u64,
}

const PLAN: RGBColor = RGBColor(0x0e, 0x56, 0xd2);
const YEAR_NEW: RGBColor = RGBColor(0xf1, 0xf9, 0x00);
const YEAR_RETAINED: RGBColor = RGBColor(0x3f, 0xdd, 0x54);
const YEAR_NOT_OPEN: RGBColor = RGBColor(0xc5, 0x71, 0x0a);

const DEPT_NEW: RGBColor = RGBColor(0x03, 0x7f, 0xf3);
const DEPT_RETAINED: RGBColor = RGBColor(0x00, 0xb1, 0x44);
const DEPT_NOT_OPEN: RGBColor = RGBColor(0xcb, 0x2f, 0x51);

const PIE_COLORS: [RGBColor; 3] = [
    RGBColor(0x2b, 0xff, 0x2b),
    RGBColor(0x45, 0x4b, 0xc4),
    RGBColor(0xff, 0xae, 0x00),
];

/// Faculty-wide plan, new intake, retained and not-open figures for
/// every year, in record order.
pub fn year_comparison(records: &[YearRecord]) -> GroupedBars {
    let pick = |f: fn(&YearRecord) -> u64| records.iter().map(f).collect::<Vec<_>>();

    GroupedBars {
        categories: records.iter().map(|r| r.year.to_string()).collect(),
        series: vec![
            Series {
                name: "แผนการรับ",
                color: PLAN,
                values: pick(|r| r.intake_plan),
            },
            Series {
                name: "นศ.แรกเข้า",
                color: YEAR_NEW,
                values: pick(|r| r.new_intake),
            },
            Series {
                name: "จำนวนคงอยู่",
                color: YEAR_RETAINED,
                values: pick(|r| r.retained),
            },
            Series {
                name: "ยังไม่เปิดรับ",
                color: YEAR_NOT_OPEN,
                values: pick(|r| r.not_open),
            },
        ],
    }
}

/// New, retained and not-open counts for each department row, in the
/// order the rows are given (the table's current order).
pub fn department_breakdown(rows: &[DepartmentRow]) -> GroupedBars {
    let pick = |f: fn(&DepartmentRow) -> u64| rows.iter().map(f).collect::<Vec<_>>();

    GroupedBars {
        categories: rows.iter().map(|r| r.department.clone()).collect(),
        series: vec![
            Series {
                name: "นศ.แรกเข้า",
                color: DEPT_NEW,
                values: pick(|r| r.new_intake),
            },
            Series {
                name: "คงอยู่",
                color: DEPT_RETAINED,
                values: pick(|r| r.retained),
            },
            Series {
                name: "ยังไม่เปิดรับ",
                color: DEPT_NOT_OPEN,
                values: pick(|r| r.not_open),
            },
        ],
    }
}

/// Slices of the selected year's status pie. Empty slices are left out.
pub fn status_breakdown(record: &YearRecord) -> Vec<PieSlice> {
    [
        ("นศ.แรกเข้า", record.new_intake),
        ("จำนวนคงอยู่", record.retained),
        ("ยังไม่เปิดรับ", record.not_open),
    ]
    .into_iter()
    .zip(PIE_COLORS)
    .filter(|((_, value), _)| *value > 0)
    .map(|((name, value), color)| PieSlice { name, color, value })
    .collect()
}

/// Pass-through wrapper around a key-pointed f64 axis. plotters 0.3.7 gives
/// `WithKeyPoints<RangedCoordf64>` no `ValueFormatter`, which `configure_mesh`
/// requires; this delegates every `Ranged` method unchanged and opts into the
/// default formatter (labels come from `x_label_formatter` anyway).
struct KeyPointAxis(plotters::coord::combinators::WithKeyPoints<plotters::coord::types::RangedCoordf64>);

impl Ranged for KeyPointAxis {
    type FormatOption = plotters::coord::ranged1d::DefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.0.map(value, limit)
    }

    fn key_points<Hint: plotters::coord::ranged1d::KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        self.0.key_points(hint)
    }

    fn range(&self) -> std::ops::Range<f64> {
        self.0.range()
    }

    fn axis_pixel_range(&self, limit: (i32, i32)) -> std::ops::Range<i32> {
        self.0.axis_pixel_range(limit)
    }
}

/// Draws a grouped bar chart as an SVG document.
///
/// Each category takes one unit on the x axis; its bars share the middle
/// 80% of that unit.
pub fn render_grouped_bars(bars: &GroupedBars, options: &ChartOptions) -> Result<String, Box<dyn Error>> {
    let groups = bars.categories.len();
    if groups == 0 || bars.series.is_empty() {
        return Err("no data to chart".into());
    }

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let y_max = (bars.max_value().max(1) as f64) * 1.1;
        let key_points: Vec<f64> = (0..groups).map(|i| i as f64 + 0.5).collect();
        let categories = &bars.categories;
        let label_for = |x: &f64| {
            categories
                .get(x.floor().max(0.0) as usize)
                .cloned()
                .unwrap_or_default()
        };

        let mut builder = ChartBuilder::on(&root);
        if !options.title.is_empty() {
            builder.caption(&options.title, ("sans-serif", 20).into_font());
        }
        let mut chart = builder
            .margin(10)
            .x_label_area_size(if groups > 4 { 90 } else { 30 })
            .y_label_area_size(60)
            .build_cartesian_2d(KeyPointAxis((0f64..groups as f64).with_key_points(key_points)), 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_label_formatter(&label_for)
            .y_label_formatter(&|v| format_number(*v as u64))
            .draw()?;

        let width = 0.8 / bars.series.len() as f64;
        for (j, series) in bars.series.iter().enumerate() {
            let color = series.color;
            chart
                .draw_series(series.values.iter().enumerate().map(|(i, v)| {
                    let left = i as f64 + 0.1 + j as f64 * width;
                    Rectangle::new([(left, 0.0), (left + width, *v as f64)], color.filled())
                }))?
                .label(series.name)
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
    }

    Ok(svg)
}

// Inner radius 70 on an outer radius of 110
const DONUT_HOLE_RATIO: f64 = 70.0 / 110.0;

/// Draws the status chart as an SVG donut. An empty title draws no caption.
pub fn render_pie(slices: &[PieSlice], options: &ChartOptions) -> Result<String, Box<dyn Error>> {
    if slices.is_empty() {
        return Err("no data to chart".into());
    }

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE)?;
        let root = if options.title.is_empty() {
            root
        } else {
            root.titled(&options.title, ("sans-serif", 20))?
        };

        let (w, h) = root.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        let radius = w.min(h) as f64 * 0.35;

        let sizes: Vec<f64> = slices.iter().map(|s| s.value as f64).collect();
        let colors: Vec<RGBColor> = slices.iter().map(|s| s.color).collect();
        let labels: Vec<String> = slices
            .iter()
            .map(|s| format!("{}: {}", s.name, format_number(s.value)))
            .collect();

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.donut_hole(radius * DONUT_HOLE_RATIO);
        pie.label_style(("sans-serif", 14).into_font().color(&BLACK));
        root.draw(&pie)?;

        root.present()?;
    }

    Ok(svg)
}
