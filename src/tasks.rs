use crate::model::{PlannerError, Task, TaskId};
use crate::records::DayRecordsMut;
use crate::store::KvStore;
use chrono::{NaiveDate, Utc};

/// Hands out millisecond timestamps, bumped past the last id issued this session.
#[derive(Debug, Default, Clone)]
pub struct IdClock {
    last: TaskId,
}

impl IdClock {
    pub fn next_id(&mut self) -> TaskId {
        self.next_id_at(Utc::now().timestamp_millis())
    }

    /// Keeps future ids above ids already present in a loaded list.
    pub fn observe(&mut self, tasks: &[Task]) {
        if let Some(max) = tasks.iter().map(|t| t.id).max() {
            self.last = self.last.max(max);
        }
    }

    fn next_id_at(&mut self, now: TaskId) -> TaskId {
        let id = if now > self.last { now } else { self.last.saturating_add(1) };
        self.last = id;
        id
    }
}

/// In-memory tasks for the selected day. Each mutation re-saves the whole list
/// and commits in memory only once the write succeeded.
#[derive(Debug, Clone)]
pub struct TaskList {
    date: NaiveDate,
    tasks: Vec<Task>,
    ids: IdClock,
}

impl TaskList {
    /// Wraps an already-decoded list, keeping new ids above the loaded ones.
    pub fn from_tasks(date: NaiveDate, tasks: Vec<Task>) -> Self {
        let mut ids = IdClock::default();
        ids.observe(&tasks);
        TaskList { date, tasks, ids }
    }

    /// Swaps in the list stored for `date`; nothing carries over.
    pub fn replace(&mut self, date: NaiveDate, tasks: Vec<Task>) {
        self.date = date;
        self.tasks = tasks;
        self.ids.observe(&self.tasks);
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    /// Returns `Ok(None)` without touching the store when `text` is blank.
    pub fn add<S: KvStore>(
        &mut self,
        store: &mut S,
        text: &str,
    ) -> Result<Option<Task>, PlannerError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let task = Task::new(self.ids.next_id(), trimmed);
        let mut updated = self.tasks.clone();
        updated.push(task.clone());
        self.commit(store, updated)?;
        Ok(Some(task))
    }

    pub fn toggle<S: KvStore>(&mut self, store: &mut S, id: TaskId) -> Result<(), PlannerError> {
        let updated = self
            .tasks
            .iter()
            .map(|task| {
                if task.id == id {
                    Task {
                        completed: !task.completed,
                        ..task.clone()
                    }
                } else {
                    task.clone()
                }
            })
            .collect();
        self.commit(store, updated)
    }

    pub fn remove<S: KvStore>(&mut self, store: &mut S, id: TaskId) -> Result<(), PlannerError> {
        let updated = self
            .tasks
            .iter()
            .filter(|task| task.id != id)
            .cloned()
            .collect();
        self.commit(store, updated)
    }

    fn commit<S: KvStore>(&mut self, store: &mut S, updated: Vec<Task>) -> Result<(), PlannerError> {
        DayRecordsMut::new(store).save_tasks(self.date, &updated)?;
        self.tasks = updated;
        Ok(())
    }
}
