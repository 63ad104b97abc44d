use crate::keys::{day_key, month_label};
use crate::records::DayRecords;
use crate::store::KvStore;
use chrono::{Datelike, NaiveDate};

/// A year/month pair the calendar overlay is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub day: u32,
    pub key: String,
    pub is_selected: bool,
    pub is_today: bool,
    pub has_tasks: bool,
    pub has_journal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Blank,
    Day(DayCell),
}

impl CalendarMonth {
    pub fn of(date: NaiveDate) -> Self {
        CalendarMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn prev(&self) -> Self {
        self.shifted(-1)
    }

    pub fn next(&self) -> Self {
        self.shifted(1)
    }

    /// The 1st of the following month, minus one day.
    pub fn day_count(&self) -> u32 {
        self.next()
            .first_day()
            .pred_opt()
            .map(|d| d.day())
            .unwrap_or(28)
    }

    /// Blank cells before day 1 in a Sunday-first week.
    pub fn leading_blanks(&self) -> u32 {
        self.first_day().weekday().num_days_from_sunday()
    }

    pub fn label(&self) -> String {
        month_label(self.year, self.month)
    }

    pub fn date(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    fn shifted(&self, delta: i32) -> Self {
        let index = self.year * 12 + self.month as i32 - 1 + delta;
        CalendarMonth {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }
}

impl Cell {
    pub fn as_day(&self) -> Option<&DayCell> {
        match self {
            Cell::Day(day) => Some(day),
            Cell::Blank => None,
        }
    }
}

/// Lays out `view` with leading blanks and annotates each day. Presence flags
/// come from key existence only; nothing is decoded.
pub fn build_grid<S: KvStore>(
    view: CalendarMonth,
    selected: NaiveDate,
    today: NaiveDate,
    records: &DayRecords<'_, S>,
) -> Vec<Cell> {
    let selected_key = day_key(selected);
    let today_key = day_key(today);
    let mut cells = Vec::new();
    for _ in 0..view.leading_blanks() {
        cells.push(Cell::Blank);
    }
    for day in 1..=view.day_count() {
        let Some(date) = view.date(day) else {
            continue;
        };
        let key = day_key(date);
        cells.push(Cell::Day(DayCell {
            date,
            day,
            is_selected: key == selected_key,
            is_today: key == today_key,
            has_tasks: records.has_tasks(date),
            has_journal: records.has_journal(date),
            key,
        }));
    }
    cells
}

pub fn weeks(cells: &[Cell]) -> Vec<&[Cell]> {
    cells.chunks(7).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::store::KvStore;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn month(year: i32, month: u32) -> CalendarMonth {
        CalendarMonth { year, month }
    }

    #[test]
    fn month_starting_wednesday_has_three_blanks() {
        // January 2025 begins on a Wednesday.
        let store = MemoryStore::new();
        let grid = build_grid(
            month(2025, 1),
            ymd(2025, 1, 10),
            ymd(2025, 1, 2),
            &DayRecords::new(&store),
        );
        assert_eq!(grid.len(), 3 + 31);
        assert!(grid[..3].iter().all(|c| *c == Cell::Blank));
        assert_eq!(grid[3].as_day().map(|d| d.day), Some(1));
    }

    #[test]
    fn sunday_start_has_no_blanks() {
        // June 2025 begins on a Sunday.
        assert_eq!(month(2025, 6).leading_blanks(), 0);
        assert_eq!(month(2025, 2).leading_blanks(), 6);
    }

    #[test]
    fn day_counts_follow_the_calendar() {
        assert_eq!(month(2024, 2).day_count(), 29);
        assert_eq!(month(2025, 2).day_count(), 28);
        assert_eq!(month(1900, 2).day_count(), 28);
        assert_eq!(month(2000, 2).day_count(), 29);
        assert_eq!(month(2025, 4).day_count(), 30);
        assert_eq!(month(2025, 12).day_count(), 31);
    }

    #[test]
    fn navigation_rolls_over_years() {
        assert_eq!(month(2025, 1).prev(), month(2024, 12));
        assert_eq!(month(2024, 12).next(), month(2025, 1));
        assert_eq!(month(2025, 6).next().prev(), month(2025, 6));
    }

    #[test]
    fn cells_are_annotated() {
        let mut store = MemoryStore::new();
        store.set("tasks_2025-01-04", "[]").unwrap();
        store.set("journal_2025-01-09", "").unwrap();
        let grid = build_grid(
            month(2025, 1),
            ymd(2025, 1, 9),
            ymd(2025, 1, 4),
            &DayRecords::new(&store),
        );
        let days: Vec<&DayCell> = grid.iter().filter_map(Cell::as_day).collect();
        assert_eq!(days.len(), 31);

        let fourth = days[3];
        assert_eq!(fourth.key, "2025-01-04");
        assert!(fourth.is_today && fourth.has_tasks);
        assert!(!fourth.is_selected && !fourth.has_journal);

        let ninth = days[8];
        assert!(ninth.is_selected && ninth.has_journal);
        assert!(!ninth.is_today && !ninth.has_tasks);

        assert_eq!(days.iter().filter(|d| d.is_selected).count(), 1);
    }

    #[test]
    fn selection_outside_view_marks_nothing() {
        let store = MemoryStore::new();
        let grid = build_grid(
            month(2025, 2),
            ymd(2025, 1, 9),
            ymd(2025, 1, 9),
            &DayRecords::new(&store),
        );
        assert!(grid
            .iter()
            .filter_map(Cell::as_day)
            .all(|d| !d.is_selected && !d.is_today));
    }

    #[test]
    fn weeks_chunk_by_seven() {
        let store = MemoryStore::new();
        let grid = build_grid(
            month(2025, 1),
            ymd(2025, 1, 1),
            ymd(2025, 1, 1),
            &DayRecords::new(&store),
        );
        let rows = weeks(&grid);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[4].len(), 34 - 28);
    }
}
