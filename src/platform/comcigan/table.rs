//! Parsing of the timetable markup the upstream renderer produces for one class.
//!
//! The rendered table looks like:
//!
//! ```text
//! row 0      | title                                   |
//! row 1      |      | 월 | 화 | 수 | 목 | 금 |          |
//! row 2      | 1(…) | 국어<br>김* | ... |  ...  |      |
//! ...
//! ```
//!
//! The two header rows, the leading label column and the trailing column (index 6)
//! carry no period data.

use scraper::{ElementRef, Html, Selector};

use super::{
    errors::ParseError,
    markers::WEEKDAY_LABELS,
    timetable::{PeriodEntry, Week},
};

const HEADER_ROWS: usize = 2;
const LABEL_COLUMN: usize = 0;
const TRAILING_COLUMN: usize = 6;

/// Parses one class's rendered table into a [`Week`].
///
/// Cells yield one [`PeriodEntry`] each: the subject is the text of the first
/// child node of the cell, the teacher the text of the last one. Missing cells
/// are left as `None`.
pub(super) fn parse(fragment: &str, grade: u8, class: u8) -> Result<Week, ParseError> {
    let html = Html::parse_fragment(fragment);

    let row_selector = Selector::parse("tr").expect("`tr` should be a valid selector");
    let cell_selector = Selector::parse("td").expect("`td` should be a valid selector");

    let mut week = Week::new();
    let mut rows = 0_usize;

    for (row, tr) in html.select(&row_selector).enumerate() {
        rows += 1;

        let Some(period_idx) = row.checked_sub(HEADER_ROWS) else {
            continue;
        };

        let Ok(period) = u8::try_from(period_idx + 1) else {
            tracing::warn!(grade, class, row, "skipping row beyond the last representable period");
            continue;
        };

        for (column, cell) in tr.select(&cell_selector).enumerate() {
            if column == LABEL_COLUMN || column == TRAILING_COLUMN {
                continue;
            }

            let weekday = column - 1;

            let Ok(weekday_idx) = u8::try_from(weekday) else {
                continue;
            };

            let (subject, teacher) = subject_and_teacher(cell);

            let entry = PeriodEntry {
                grade,
                class_number: class,
                weekday: weekday_idx,
                weekday_label: WEEKDAY_LABELS
                    .get(column)
                    .copied()
                    .unwrap_or_default()
                    .to_owned(),
                period,
                subject,
                teacher,
            };

            if week.len() <= weekday {
                week.resize_with(weekday + 1, Vec::new);
            }

            let day = &mut week[weekday];

            if day.len() <= period_idx {
                day.resize(period_idx + 1, None);
            }

            day[period_idx] = Some(entry);
        }
    }

    if rows == 0 {
        return Err(ParseError::NoRows { grade, class });
    }

    Ok(week)
}

/// Texts of the first and the last child node of `cell`.
///
/// A cell with a single child gives the same text for both.
fn subject_and_teacher(cell: ElementRef<'_>) -> (String, String) {
    let texts: Vec<String> = cell
        .children()
        .map(|node| match ElementRef::wrap(node) {
            Some(element) => element.text().collect(),
            None => node
                .value()
                .as_text()
                .map(|text| text.to_string())
                .unwrap_or_default(),
        })
        .collect();

    let subject = texts.first().cloned().unwrap_or_default();
    let teacher = texts.last().cloned().unwrap_or_default();

    (subject, teacher)
}
