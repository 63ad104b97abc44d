use crate::calendar::{weeks, CalendarMonth, Cell};
use crate::config::Config;
use crate::keys::{display_label, parse_day, parse_month};
use crate::model::TaskId;
use crate::planner::Planner;
use crate::store::{init_project_store, locate_store, FileStore, KvStore};
use crate::ui;
use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use std::env;

pub fn init() -> Result<()> {
    let location = init_project_store()?;
    println!("Initialized store at {}", location.path.display());
    Ok(())
}

pub fn show(config: &Config, date: Option<String>) -> Result<()> {
    let planner = open_planner(config, date.as_deref())?;
    print_day(&planner);
    Ok(())
}

pub fn add(config: &Config, text: String, date: Option<String>) -> Result<()> {
    let mut planner = open_planner(config, date.as_deref())?;
    match planner.add_task(&text).context("adding task")? {
        Some(task) => println!("Added task {}: {}", task.id, task.text),
        None => println!("Nothing to add"),
    }
    Ok(())
}

pub fn toggle(config: &Config, id: TaskId, date: Option<String>) -> Result<()> {
    let mut planner = open_planner(config, date.as_deref())?;
    ensure_known(&planner, id)?;
    planner
        .toggle_task(id)
        .with_context(|| format!("toggling task {}", id))?;
    if let Some(task) = planner.tasks().iter().find(|t| t.id == id) {
        let state = if task.completed { "done" } else { "open" };
        println!("Task {} is now {}", id, state);
    }
    Ok(())
}

pub fn remove(config: &Config, id: TaskId, date: Option<String>) -> Result<()> {
    let mut planner = open_planner(config, date.as_deref())?;
    ensure_known(&planner, id)?;
    planner
        .remove_task(id)
        .with_context(|| format!("removing task {}", id))?;
    println!("Removed task {}", id);
    Ok(())
}

pub fn journal(config: &Config, text: String, date: Option<String>) -> Result<()> {
    let mut planner = open_planner(config, date.as_deref())?;
    planner.set_journal(&text).context("saving journal")?;
    println!("Saved journal for {}", display_label(planner.selected()));
    Ok(())
}

pub fn reflect(config: &Config, text: String, date: Option<String>) -> Result<()> {
    let mut planner = open_planner(config, date.as_deref())?;
    planner.set_reflection(&text).context("saving reflection")?;
    println!(
        "Saved reflection for {}",
        CalendarMonth::of(planner.selected()).label()
    );
    Ok(())
}

pub fn calendar(config: &Config, month: Option<String>, date: Option<String>) -> Result<()> {
    let mut planner = open_planner(config, date.as_deref())?;
    print!("{}", month_report(&mut planner, month.as_deref())?);
    Ok(())
}

/// Month grid plus theme; without `month` the grid shows the selected day's month.
fn month_report<S: KvStore>(planner: &mut Planner<S>, month: Option<&str>) -> Result<String> {
    let view = match month {
        Some(raw) => {
            let (year, month) = parse_month(raw)?;
            CalendarMonth { year, month }
        }
        None => CalendarMonth::of(planner.selected()),
    };
    planner.show_month(view);
    let mut out = render_month(planner.calendar_month(), &planner.calendar_grid());
    let reflection = planner.calendar_reflection();
    if !reflection.is_empty() {
        out.push_str(&format!("\nMonthly theme: {}\n", reflection));
    }
    Ok(out)
}

pub fn tui(config: &Config, date: Option<String>) -> Result<()> {
    let planner = open_planner(config, date.as_deref())?;
    ui::run(planner, config)
}

fn open_planner(config: &Config, date: Option<&str>) -> Result<Planner<FileStore>> {
    let cwd = env::current_dir()?;
    let location = locate_store(&cwd, config.store.as_deref())?;
    let store = FileStore::open(location)?;
    let mut planner = Planner::open(store, today());
    if let Some(raw) = date {
        planner.select_date(parse_day(raw)?);
    }
    Ok(planner)
}

fn ensure_known(planner: &Planner<FileStore>, id: TaskId) -> Result<()> {
    if planner.tasks().iter().any(|t| t.id == id) {
        return Ok(());
    }
    bail!("task {} not found on {}", id, planner.selected())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn print_day(planner: &Planner<FileStore>) {
    let location = planner.store().location();
    println!(
        "{} ({})",
        display_label(planner.selected()),
        location.scope.label()
    );
    println!();
    let tasks = planner.tasks();
    if tasks.is_empty() {
        println!("  No tasks yet for this day");
    } else {
        println!(
            "  {} of {} tasks completed",
            planner.completed_count(),
            tasks.len()
        );
        for task in tasks {
            let mark = if task.completed { "x" } else { " " };
            println!("  [{}] {}: {}", mark, task.id, task.text);
        }
    }
    println!();
    println!("Journal:");
    if planner.journal().is_empty() {
        println!("  (empty)");
    } else {
        for line in planner.journal().lines() {
            println!("  {}", line);
        }
    }
    println!();
    println!(
        "Monthly reflection: {}",
        if planner.reflection().is_empty() {
            "(none)"
        } else {
            planner.reflection()
        }
    );
}

/// Plain-text month grid: `[d]` selected, `*` today, `•` tasks, `+` journal.
pub fn render_month(month: CalendarMonth, cells: &[Cell]) -> String {
    let mut out = format!("{}\n", month.label());
    out.push_str(" Sun   Mon   Tue   Wed   Thu   Fri   Sat\n");
    for week in weeks(cells) {
        let row: Vec<String> = week.iter().map(render_cell).collect();
        out.push_str(row.join(" ").trim_end());
        out.push('\n');
    }
    out
}

fn render_cell(cell: &Cell) -> String {
    let Cell::Day(day) = cell else {
        return " ".repeat(5);
    };
    let number = if day.is_selected {
        format!("[{:>2}]", day.day)
    } else if day.is_today {
        format!("*{:>2} ", day.day)
    } else {
        format!(" {:>2} ", day.day)
    };
    let marker = match (day.has_tasks, day.has_journal) {
        (true, true) => "±",
        (true, false) => "•",
        (false, true) => "+",
        (false, false) => " ",
    };
    format!("{}{}", number, marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::build_grid;
    use crate::records::DayRecords;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn renders_marked_month() {
        let mut store = MemoryStore::new();
        store.set("tasks_2025-02-03", "[]").unwrap();
        store.set("journal_2025-02-03", "").unwrap();
        store.set("journal_2025-02-10", "x").unwrap();
        let month = CalendarMonth {
            year: 2025,
            month: 2,
        };
        let selected = NaiveDate::from_ymd_opt(2025, 2, 10).unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let grid = build_grid(month, selected, today, &DayRecords::new(&store));
        let text = render_month(month, &grid);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "February 2025");
        assert_eq!(lines.len(), 2 + 5);
        assert!(lines[2].ends_with("* 1"));
        assert!(lines[3].contains("  3 ±"));
        assert!(lines[4].contains("[10]+"));
    }

    #[test]
    fn calendar_defaults_to_selected_month() {
        let mut store = MemoryStore::new();
        store.set("journal_2025-03-10", "").unwrap();
        store.set("monthly_2025-03", "Spring cleaning").unwrap();
        let mut planner = Planner::open(store, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        planner.select_date(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());

        let text = month_report(&mut planner, None).unwrap();
        assert!(text.starts_with("March 2025\n"));
        assert!(text.contains("[10]+"));
        assert!(text.ends_with("Monthly theme: Spring cleaning\n"));

        let text = month_report(&mut planner, Some("2025-04")).unwrap();
        assert!(text.starts_with("April 2025\n"));
        assert!(!text.contains('['));
    }
}
