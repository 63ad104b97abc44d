use crate::calendar::{build_grid, CalendarMonth, Cell};
use crate::model::{DayRecord, PlannerError, Task, TaskId};
use crate::records::{DayRecords, DayRecordsMut, MonthRecords, MonthRecordsMut};
use crate::store::KvStore;
use crate::tasks::TaskList;
use chrono::{Duration, NaiveDate};

/// What a listener should recompute after a planner update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    DateSelected(NaiveDate),
    TasksChanged,
    JournalChanged,
    ReflectionChanged,
    CalendarMoved(CalendarMonth),
    CalendarToggled(bool),
}

type Listener = Box<dyn FnMut(&Change)>;

/// Owns the selection, the loaded day/month records and the store behind them.
pub struct Planner<S: KvStore> {
    store: S,
    today: NaiveDate,
    selected: NaiveDate,
    calendar: CalendarMonth,
    calendar_open: bool,
    tasks: TaskList,
    journal: String,
    reflection: String,
    listeners: Vec<Listener>,
}

impl<S: KvStore> Planner<S> {
    /// Selects `today` and loads its records.
    pub fn open(store: S, today: NaiveDate) -> Self {
        let DayRecord { tasks, journal } = DayRecords::new(&store).load(today);
        let reflection = MonthRecords::new(&store).load(today);
        Planner {
            store,
            today,
            selected: today,
            calendar: CalendarMonth::of(today),
            calendar_open: false,
            tasks: TaskList::from_tasks(today, tasks),
            journal,
            reflection,
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Change) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn selected(&self) -> NaiveDate {
        self.selected
    }

    pub fn tasks(&self) -> &[Task] {
        self.tasks.tasks()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.completed_count()
    }

    pub fn journal(&self) -> &str {
        &self.journal
    }

    pub fn reflection(&self) -> &str {
        &self.reflection
    }

    pub fn calendar_month(&self) -> CalendarMonth {
        self.calendar
    }

    pub fn calendar_open(&self) -> bool {
        self.calendar_open
    }

    /// Replaces all in-memory day and month state with what is stored for `date`.
    pub fn select_date(&mut self, date: NaiveDate) {
        self.selected = date;
        let DayRecord { tasks, journal } = DayRecords::new(&self.store).load(date);
        self.tasks.replace(date, tasks);
        self.journal = journal;
        self.reflection = MonthRecords::new(&self.store).load(date);
        log::debug!("selected {}", date);
        self.emit(Change::DateSelected(date));
    }

    pub fn select_today(&mut self) {
        self.select_date(self.today);
    }

    pub fn step_day(&mut self, days: i64) {
        if let Some(date) = self.selected.checked_add_signed(Duration::days(days)) {
            self.select_date(date);
        }
    }

    pub fn add_task(&mut self, text: &str) -> Result<Option<Task>, PlannerError> {
        let added = self.tasks.add(&mut self.store, text)?;
        if added.is_some() {
            self.emit(Change::TasksChanged);
        }
        Ok(added)
    }

    pub fn toggle_task(&mut self, id: TaskId) -> Result<(), PlannerError> {
        self.tasks.toggle(&mut self.store, id)?;
        self.emit(Change::TasksChanged);
        Ok(())
    }

    pub fn remove_task(&mut self, id: TaskId) -> Result<(), PlannerError> {
        self.tasks.remove(&mut self.store, id)?;
        self.emit(Change::TasksChanged);
        Ok(())
    }

    pub fn set_journal(&mut self, text: &str) -> Result<(), PlannerError> {
        DayRecordsMut::new(&mut self.store).save_journal(self.selected, text)?;
        self.journal = text.to_string();
        self.emit(Change::JournalChanged);
        Ok(())
    }

    pub fn set_reflection(&mut self, text: &str) -> Result<(), PlannerError> {
        MonthRecordsMut::new(&mut self.store).save(self.selected, text)?;
        self.reflection = text.to_string();
        self.emit(Change::ReflectionChanged);
        Ok(())
    }

    pub fn open_calendar(&mut self) {
        self.calendar_open = true;
        self.emit(Change::CalendarToggled(true));
    }

    pub fn close_calendar(&mut self) {
        self.calendar_open = false;
        self.emit(Change::CalendarToggled(false));
    }

    pub fn show_month(&mut self, month: CalendarMonth) {
        self.calendar = month;
        self.emit(Change::CalendarMoved(month));
    }

    /// Moves the overlay only; the selected date stays until a cell is picked.
    pub fn prev_month(&mut self) {
        self.show_month(self.calendar.prev());
    }

    pub fn next_month(&mut self) {
        self.show_month(self.calendar.next());
    }

    pub fn calendar_grid(&self) -> Vec<Cell> {
        build_grid(
            self.calendar,
            self.selected,
            self.today,
            &DayRecords::new(&self.store),
        )
    }

    /// Reflection of the month on display, which may differ from the selected one.
    pub fn calendar_reflection(&self) -> String {
        MonthRecords::new(&self.store).load(self.calendar.first_day())
    }

    /// Commits a calendar cell: day cells select and close the overlay, blanks do nothing.
    pub fn pick(&mut self, cell: &Cell) {
        if let Cell::Day(day) = cell {
            self.select_date(day.date);
            self.close_calendar();
        }
    }

    fn emit(&mut self, change: Change) {
        for listener in self.listeners.iter_mut() {
            listener(&change);
        }
    }
}
