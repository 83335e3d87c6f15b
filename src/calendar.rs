use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};

/// Month-grid date picker. Moving the cursor never changes the active date;
/// only `confirm` hands a date back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePicker {
    /// First day of the displayed month.
    pub displayed_month: NaiveDate,
    pub cursor: NaiveDate,
    /// The date that was active when the picker opened.
    pub original: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerMove {
    PrevDay,
    NextDay,
    PrevWeek,
    NextWeek,
    PrevMonth,
    NextMonth,
    Today(NaiveDate),
}

impl DatePicker {
    pub fn open(active: NaiveDate) -> Self {
        Self {
            displayed_month: first_of_month(active),
            cursor: active,
            original: active,
        }
    }

    pub fn apply(&mut self, mv: PickerMove) {
        let next = match mv {
            PickerMove::PrevDay => self.cursor.checked_sub_signed(Duration::days(1)),
            PickerMove::NextDay => self.cursor.checked_add_signed(Duration::days(1)),
            PickerMove::PrevWeek => self.cursor.checked_sub_signed(Duration::days(7)),
            PickerMove::NextWeek => self.cursor.checked_add_signed(Duration::days(7)),
            // chrono clamps to the last valid day, e.g. Mar 31 -> Feb 28.
            PickerMove::PrevMonth => self.cursor.checked_sub_months(Months::new(1)),
            PickerMove::NextMonth => self.cursor.checked_add_months(Months::new(1)),
            PickerMove::Today(today) => Some(today),
        };
        if let Some(next) = next {
            self.cursor = next;
            self.displayed_month = first_of_month(next);
        }
    }

    pub fn confirm(&self) -> NaiveDate {
        self.cursor
    }

    /// Six Monday-first weeks covering the displayed month.
    pub fn weeks(&self) -> Vec<[NaiveDate; 7]> {
        month_grid(self.displayed_month)
    }
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Six weeks of dates starting on the Monday on or before the first of the
/// month containing `date`.
pub fn month_grid(date: NaiveDate) -> Vec<[NaiveDate; 7]> {
    let first = first_of_month(date);
    let offset = first.weekday().num_days_from_monday() as i64;
    let start = first - Duration::days(offset);
    (0..6)
        .map(|week| std::array::from_fn(|day| start + Duration::days(week * 7 + day as i64)))
        .collect()
}

pub const WEEKDAY_LABELS: [&str; 7] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
