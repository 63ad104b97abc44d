use crate::keys::{journal_key, monthly_key, tasks_key};
use crate::model::{DayRecord, PlannerError, Task};
use crate::store::KvStore;
use chrono::NaiveDate;

/// Per-day tasks and journal, read and written through the store.
pub struct DayRecords<'a, S: KvStore> {
    store: &'a S,
}

pub struct DayRecordsMut<'a, S: KvStore> {
    store: &'a mut S,
}

pub struct MonthRecords<'a, S: KvStore> {
    store: &'a S,
}

pub struct MonthRecordsMut<'a, S: KvStore> {
    store: &'a mut S,
}

impl<'a, S: KvStore> DayRecords<'a, S> {
    pub fn new(store: &'a S) -> Self {
        DayRecords { store }
    }

    pub fn load(&self, date: NaiveDate) -> DayRecord {
        DayRecord {
            tasks: self.load_tasks(date),
            journal: self.store.get(&journal_key(date)).unwrap_or_default(),
        }
    }

    pub fn load_tasks(&self, date: NaiveDate) -> Vec<Task> {
        let key = tasks_key(date);
        let Some(raw) = self.store.get(&key) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(tasks) => tasks,
            Err(err) => {
                log::warn!("ignoring unreadable task list at {}: {}", key, err);
                Vec::new()
            }
        }
    }

    pub fn has_tasks(&self, date: NaiveDate) -> bool {
        self.store.has(&tasks_key(date))
    }

    pub fn has_journal(&self, date: NaiveDate) -> bool {
        self.store.has(&journal_key(date))
    }
}

impl<'a, S: KvStore> DayRecordsMut<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        DayRecordsMut { store }
    }

    pub fn save_tasks(&mut self, date: NaiveDate, tasks: &[Task]) -> Result<(), PlannerError> {
        let encoded = serde_json::to_string(tasks)?;
        self.store.set(&tasks_key(date), &encoded)?;
        Ok(())
    }

    /// Writes verbatim; an empty string still marks the day as journaled.
    pub fn save_journal(&mut self, date: NaiveDate, text: &str) -> Result<(), PlannerError> {
        self.store.set(&journal_key(date), text)?;
        Ok(())
    }
}

impl<'a, S: KvStore> MonthRecords<'a, S> {
    pub fn new(store: &'a S) -> Self {
        MonthRecords { store }
    }

    pub fn load(&self, date: NaiveDate) -> String {
        self.store.get(&monthly_key(date)).unwrap_or_default()
    }
}

impl<'a, S: KvStore> MonthRecordsMut<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        MonthRecordsMut { store }
    }

    pub fn save(&mut self, date: NaiveDate, text: &str) -> Result<(), PlannerError> {
        self.store.set(&monthly_key(date), text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KvStore, MemoryStore};
    use pretty_assertions::assert_eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn absent_day_loads_defaults() {
        let store = MemoryStore::new();
        let record = DayRecords::new(&store).load(ymd(2025, 1, 5));
        assert_eq!(record, DayRecord::default());
    }

    #[test]
    fn saved_tasks_round_trip_in_order() {
        let mut store = MemoryStore::new();
        let date = ymd(2025, 1, 5);
        let tasks = vec![
            Task::new(3, "third id, first in list"),
            Task {
                id: 1,
                text: "done".into(),
                completed: true,
            },
            Task::new(2, "middle"),
        ];
        DayRecordsMut::new(&mut store)
            .save_tasks(date, &tasks)
            .unwrap();
        assert_eq!(DayRecords::new(&store).load(date).tasks, tasks);
    }

    #[test]
    fn tasks_use_json_wire_shape() {
        let mut store = MemoryStore::new();
        let date = ymd(2025, 1, 5);
        DayRecordsMut::new(&mut store)
            .save_tasks(date, &[Task::new(17, "Buy milk")])
            .unwrap();
        assert_eq!(
            store.get("tasks_2025-01-05").as_deref(),
            Some(r#"[{"id":17,"text":"Buy milk","completed":false}]"#)
        );
    }

    #[test]
    fn unreadable_tasks_fail_open_to_empty() {
        let mut store = MemoryStore::new();
        let date = ymd(2025, 1, 5);
        store.set("tasks_2025-01-05", "{not json").unwrap();
        store.set("journal_2025-01-05", "kept").unwrap();

        let records = DayRecords::new(&store);
        let record = records.load(date);
        assert!(record.tasks.is_empty());
        assert_eq!(record.journal, "kept");
        assert!(records.has_tasks(date));
    }

    #[test]
    fn empty_journal_still_counts_as_present() {
        let mut store = MemoryStore::new();
        let date = ymd(2025, 6, 1);
        assert!(!DayRecords::new(&store).has_journal(date));
        DayRecordsMut::new(&mut store)
            .save_journal(date, "")
            .unwrap();
        let records = DayRecords::new(&store);
        assert!(records.has_journal(date));
        assert!(!records.has_tasks(date));
        assert_eq!(records.load(date).journal, "");
    }

    #[test]
    fn reflection_is_shared_across_the_month() {
        let mut store = MemoryStore::new();
        MonthRecordsMut::new(&mut store)
            .save(ymd(2025, 3, 5), "Slow down")
            .unwrap();
        let months = MonthRecords::new(&store);
        assert_eq!(months.load(ymd(2025, 3, 20)), "Slow down");
        assert_eq!(months.load(ymd(2025, 3, 31)), "Slow down");
        assert_eq!(months.load(ymd(2025, 4, 1)), "");
    }
}
