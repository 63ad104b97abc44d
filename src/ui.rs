use crate::calendar::{weeks, CalendarMonth, Cell};
use crate::config::Config;
use crate::keys::display_label;
use crate::model::{PlannerError, TaskId};
use crate::planner::{Change, Planner};
use crate::store::{FileStore, KvStore};
use anyhow::Result;
use chrono::Datelike;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use std::cell::RefCell;
use std::io::{stdout, Stdout};
use std::rc::Rc;
use std::time::{Duration, Instant};

const JOURNAL_PROMPTS: [&str; 5] = [
    "What did I experience today?",
    "What made me feel proud?",
    "Where did I struggle?",
    "What am I grateful for?",
    "What is one lesson I want to carry forward?",
];

pub fn run(planner: Planner<FileStore>, config: &Config) -> Result<()> {
    let location = planner.store().location();
    let store_label = format!("{} {}", location.scope.label(), location.path.display());
    let mut terminal = setup_terminal()?;
    let mut app = App::new(planner, config.greeting(), store_label);
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    result
}

struct App<S: KvStore> {
    planner: Planner<S>,
    greeting: String,
    store_label: String,
    focus: Pane,
    mode: Mode,
    selected_task: usize,
    task_offset: usize,
    calendar_cursor: u32,
    last_save: Instant,
    status: String,
    changes: Rc<RefCell<Vec<Change>>>,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Pane {
    Tasks,
    Journal,
    Reflection,
}

enum Mode {
    Normal,
    NewTask(FieldValue),
    Journal(FieldValue),
    Reflection(FieldValue),
    Calendar,
}

impl Pane {
    fn next(self) -> Self {
        match self {
            Pane::Tasks => Pane::Journal,
            Pane::Journal => Pane::Reflection,
            Pane::Reflection => Pane::Tasks,
        }
    }

    fn prev(self) -> Self {
        match self {
            Pane::Tasks => Pane::Reflection,
            Pane::Journal => Pane::Tasks,
            Pane::Reflection => Pane::Journal,
        }
    }
}

/// Editable text with a byte cursor that always sits on a char boundary.
#[derive(Clone, Debug)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        self.cursor = self.value[..self.cursor]
            .char_indices()
            .last()
            .map(|(idx, _)| idx)
            .unwrap_or(0);
    }

    fn move_right(&mut self) {
        if let Some(ch) = self.value[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    fn move_up(&mut self) {
        let (line_start, col) = self.line_and_col();
        if line_start == 0 {
            return;
        }
        let prev_start = self.value[..line_start - 1]
            .rfind('\n')
            .map(|idx| idx + 1)
            .unwrap_or(0);
        self.cursor = self.index_at_col(prev_start, col);
    }

    fn move_down(&mut self) {
        let (_, col) = self.line_and_col();
        if let Some(offset) = self.value[self.cursor..].find('\n') {
            let next_start = self.cursor + offset + 1;
            self.cursor = self.index_at_col(next_start, col);
        }
    }

    /// Returns whether anything was deleted.
    fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let end = self.cursor;
        self.move_left();
        self.value.drain(self.cursor..end);
        true
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }

    fn line_and_col(&self) -> (usize, usize) {
        let start = self.value[..self.cursor]
            .rfind('\n')
            .map(|idx| idx + 1)
            .unwrap_or(0);
        (start, self.value[start..self.cursor].chars().count())
    }

    fn index_at_col(&self, line_start: usize, col: usize) -> usize {
        let line = &self.value[line_start..];
        let line_len = line.find('\n').unwrap_or(line.len());
        line[..line_len]
            .char_indices()
            .nth(col)
            .map(|(idx, _)| line_start + idx)
            .unwrap_or(line_start + line_len)
    }
}

impl<S: KvStore> App<S> {
    fn new(mut planner: Planner<S>, greeting: String, store_label: String) -> Self {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&changes);
        planner.subscribe(move |change| sink.borrow_mut().push(*change));
        let status = format!("Viewing {}", display_label(planner.selected()));
        let calendar_cursor = planner.selected().day();
        App {
            planner,
            greeting,
            store_label,
            focus: Pane::Tasks,
            mode: Mode::Normal,
            selected_task: 0,
            task_offset: 0,
            calendar_cursor,
            last_save: Instant::now(),
            status,
            changes,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key) {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns true when the user asked to quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let quit = match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::NewTask(_) => {
                self.handle_new_task_key(key);
                false
            }
            Mode::Journal(_) | Mode::Reflection(_) => {
                self.handle_text_key(key);
                false
            }
            Mode::Calendar => {
                self.handle_calendar_key(key);
                false
            }
        };
        self.apply_changes();
        quit
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        let on_tasks = self.focus == Pane::Tasks;
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            KeyCode::Char('c') => self.open_calendar(),
            KeyCode::Char('t') => self.planner.select_today(),
            KeyCode::Left | KeyCode::Char('h') => self.planner.step_day(-1),
            KeyCode::Right | KeyCode::Char('l') => self.planner.step_day(1),
            KeyCode::Char('a') | KeyCode::Char('n') => {
                self.focus = Pane::Tasks;
                self.mode = Mode::NewTask(FieldValue::new(""));
                self.status = "New task (Enter add, Esc cancel)".into();
            }
            KeyCode::Up | KeyCode::Char('k') if on_tasks => {
                self.selected_task = self.selected_task.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') if on_tasks => {
                if self.selected_task + 1 < self.planner.tasks().len() {
                    self.selected_task += 1;
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('x') if on_tasks => {
                self.toggle_selected()
            }
            KeyCode::Char('d') | KeyCode::Delete if on_tasks => self.remove_selected(),
            KeyCode::Enter | KeyCode::Char('e') => match self.focus {
                Pane::Journal => {
                    self.mode = Mode::Journal(FieldValue::new(self.planner.journal()));
                    self.status = "Writing journal (saved as you type, Esc done)".into();
                }
                Pane::Reflection => {
                    self.mode = Mode::Reflection(FieldValue::new(self.planner.reflection()));
                    self.status = "Writing monthly reflection (Enter/Esc done)".into();
                }
                Pane::Tasks => {}
            },
            _ => {}
        }
        false
    }

    fn handle_new_task_key(&mut self, key: KeyEvent) {
        let Mode::NewTask(mut field) = std::mem::replace(&mut self.mode, Mode::Normal) else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.status = "Canceled".into();
                return;
            }
            KeyCode::Enter => match self.planner.add_task(&field.value) {
                Ok(Some(task)) => {
                    self.status = format!("Added \"{}\"", task.text);
                    self.selected_task = self.planner.tasks().len().saturating_sub(1);
                    field = FieldValue::new("");
                }
                Ok(None) => self.status = "Task text is empty".into(),
                Err(err) => self.report_failure("Could not add task", err),
            },
            _ => {
                apply_edit(&mut field, key, false);
            }
        }
        self.mode = Mode::NewTask(field);
    }

    fn handle_text_key(&mut self, key: KeyEvent) {
        match std::mem::replace(&mut self.mode, Mode::Normal) {
            Mode::Journal(mut field) => {
                if key.code == KeyCode::Esc {
                    self.status = "Journal saved".into();
                    return;
                }
                if apply_edit(&mut field, key, true) {
                    if let Err(err) = self.planner.set_journal(&field.value) {
                        self.report_failure("Could not save journal", err);
                        field = FieldValue::new(self.planner.journal());
                    }
                }
                self.mode = Mode::Journal(field);
            }
            Mode::Reflection(mut field) => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                    self.status = "Reflection saved".into();
                    return;
                }
                if apply_edit(&mut field, key, false) {
                    if let Err(err) = self.planner.set_reflection(&field.value) {
                        self.report_failure("Could not save reflection", err);
                        field = FieldValue::new(self.planner.reflection());
                    }
                }
                self.mode = Mode::Reflection(field);
            }
            other => self.mode = other,
        }
    }

    fn handle_calendar_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('c') | KeyCode::Char('q') => {
                self.planner.close_calendar();
                self.status = "Calendar closed".into();
            }
            KeyCode::Left | KeyCode::Char('h') => self.move_cursor(-1),
            KeyCode::Right | KeyCode::Char('l') => self.move_cursor(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-7),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(7),
            KeyCode::PageUp | KeyCode::Char('[') | KeyCode::Char('<') => {
                self.planner.prev_month();
                self.calendar_cursor = 1;
            }
            KeyCode::PageDown | KeyCode::Char(']') | KeyCode::Char('>') => {
                self.planner.next_month();
                self.calendar_cursor = 1;
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                let cursor = self.calendar_cursor;
                let picked = self
                    .planner
                    .calendar_grid()
                    .into_iter()
                    .find(|cell| cell.as_day().map(|d| d.day) == Some(cursor));
                if let Some(cell) = picked {
                    self.planner.pick(&cell);
                }
            }
            _ => {}
        }
    }

    fn apply_changes(&mut self) {
        let changes: Vec<Change> = self.changes.borrow_mut().drain(..).collect();
        for change in changes {
            match change {
                Change::DateSelected(date) => {
                    self.selected_task = 0;
                    self.task_offset = 0;
                    self.status = format!("Viewing {}", display_label(date));
                }
                Change::TasksChanged => {
                    self.last_save = Instant::now();
                    self.clamp_task_selection();
                }
                Change::JournalChanged | Change::ReflectionChanged => {
                    self.last_save = Instant::now();
                }
                Change::CalendarMoved(month) => {
                    self.status = format!("Calendar: {}", month.label());
                }
                Change::CalendarToggled(open) => {
                    if !open && matches!(self.mode, Mode::Calendar) {
                        self.mode = Mode::Normal;
                    }
                }
            }
        }
    }

    /// Always opens on the selected day's month with the cursor on that day.
    fn open_calendar(&mut self) {
        let selected = self.planner.selected();
        self.planner.show_month(CalendarMonth::of(selected));
        self.calendar_cursor = selected.day();
        self.planner.open_calendar();
        self.mode = Mode::Calendar;
    }

    fn move_cursor(&mut self, delta: i64) {
        let days = self.planner.calendar_month().day_count() as i64;
        self.calendar_cursor = (self.calendar_cursor as i64 + delta).clamp(1, days) as u32;
    }

    fn current_task_id(&self) -> Option<TaskId> {
        self.planner.tasks().get(self.selected_task).map(|t| t.id)
    }

    fn toggle_selected(&mut self) {
        let Some(id) = self.current_task_id() else {
            self.status = "No task selected".into();
            return;
        };
        match self.planner.toggle_task(id) {
            Ok(()) => self.status = "Task updated".into(),
            Err(err) => self.report_failure("Could not update task", err),
        }
    }

    fn remove_selected(&mut self) {
        let Some(id) = self.current_task_id() else {
            self.status = "No task selected".into();
            return;
        };
        match self.planner.remove_task(id) {
            Ok(()) => self.status = "Task deleted".into(),
            Err(err) => self.report_failure("Could not delete task", err),
        }
    }

    fn clamp_task_selection(&mut self) {
        let len = self.planner.tasks().len();
        self.selected_task = self.selected_task.min(len.saturating_sub(1));
    }

    fn report_failure(&mut self, what: &str, err: PlannerError) {
        log::error!("{}: {}", what, err);
        self.status = format!("{}: {}", what, err);
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
                Constraint::Length(4),
            ])
            .split(f.size());
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(layout[1]);

        self.draw_header(f, layout[0]);
        self.draw_tasks(f, body[0]);
        self.draw_journal(f, body[1]);
        self.draw_reflection(f, layout[2]);
        self.draw_footer(f, layout[3]);
        if self.planner.calendar_open() {
            self.draw_calendar(f);
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let title = Line::from(vec![
            Span::styled(
                self.greeting.clone(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(
                display_label(self.planner.selected()),
                Style::default()
                    .fg(Color::LightYellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(self.store_label.clone(), Style::default().fg(Color::DarkGray)),
            Span::raw("  •  "),
            Span::styled(
                format!("saved {}", format_elapsed(self.last_save)),
                Style::default().fg(Color::Gray),
            ),
        ]);
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_tasks(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let focused = self.focus == Pane::Tasks;
        let tasks = self.planner.tasks();
        let mut title = "Daily Tasks & Habits".to_string();
        if !tasks.is_empty() {
            title.push_str(&format!(
                " ({} of {} completed)",
                self.planner.completed_count(),
                tasks.len()
            ));
        }
        let block = pane_block(title, focused);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(1)])
            .split(inner);

        let input = match &self.mode {
            Mode::NewTask(field) => Line::from(Span::styled(
                format!("+ {}", field.with_caret()),
                Style::default().fg(Color::Cyan),
            )),
            _ => Line::from(Span::styled(
                "+ Add a new task... (a)",
                Style::default().fg(Color::DarkGray),
            )),
        };
        f.render_widget(Paragraph::new(input), rows[0]);

        if tasks.is_empty() {
            let empty = Paragraph::new(vec![
                Line::from("No tasks yet for this day"),
                Line::from(Span::styled(
                    "Add your first task above to get started",
                    Style::default().fg(Color::DarkGray),
                )),
            ])
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow));
            f.render_widget(empty, rows[1]);
            return;
        }

        let width = rows[1].width.saturating_sub(6) as usize;
        let items: Vec<ListItem> = tasks
            .iter()
            .map(|task| {
                let (mark, style) = if task.completed {
                    (
                        "[x]",
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::CROSSED_OUT),
                    )
                } else {
                    ("[ ]", Style::default().fg(Color::White))
                };
                let mark_color = if task.completed {
                    Color::LightGreen
                } else {
                    Color::Yellow
                };
                ListItem::new(Line::from(vec![
                    Span::styled(mark, Style::default().fg(mark_color)),
                    Span::raw(" "),
                    Span::styled(truncate_text(&task.text, width), style),
                ]))
            })
            .collect();
        let viewport = rows[1].height as usize;
        self.task_offset = adjust_offset(self.selected_task, self.task_offset, viewport, items.len());
        let mut state = ListState::default();
        *state.offset_mut() = self.task_offset;
        if focused {
            state.select(Some(self.selected_task));
        }
        let list = List::new(items).highlight_style(
            Style::default()
                .bg(Color::Rgb(60, 52, 32))
                .add_modifier(Modifier::BOLD),
        );
        f.render_stateful_widget(list, rows[1], &mut state);
    }

    fn draw_journal(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let focused = self.focus == Pane::Journal;
        let lines: Vec<Line> = match &self.mode {
            Mode::Journal(field) => text_lines(&field.with_caret(), Style::default().fg(Color::Cyan)),
            _ if self.planner.journal().is_empty() => JOURNAL_PROMPTS
                .iter()
                .flat_map(|prompt| {
                    [
                        Line::from(Span::styled(*prompt, Style::default().fg(Color::DarkGray))),
                        Line::from(""),
                    ]
                })
                .collect(),
            _ => text_lines(self.planner.journal(), Style::default().fg(Color::White)),
        };
        let paragraph = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(pane_block("Daily Reflection".to_string(), focused));
        f.render_widget(paragraph, area);
    }

    fn draw_reflection(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let focused = self.focus == Pane::Reflection;
        let month = CalendarMonth::of(self.planner.selected());
        let line = match &self.mode {
            Mode::Reflection(field) => {
                Line::from(Span::styled(field.with_caret(), Style::default().fg(Color::Cyan)))
            }
            _ if self.planner.reflection().is_empty() => Line::from(Span::styled(
                "What's the theme or focus for this month?",
                Style::default().fg(Color::DarkGray),
            )),
            _ => Line::from(Span::styled(
                self.planner.reflection().to_string(),
                Style::default().fg(Color::LightMagenta),
            )),
        };
        let title = format!("Monthly Reflection: {}", month.label());
        let paragraph = Paragraph::new(line).block(pane_block(title, focused));
        f.render_widget(paragraph, area);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);
        let help = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help, rows[0]);
        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(Color::Gray));
        f.render_widget(status, rows[1]);
    }

    fn footer_help_line(&self) -> Line<'static> {
        let keys: &[(&str, &str, Color)] = match self.mode {
            Mode::Normal => &[
                ("Tab", " pane  ", Color::LightCyan),
                ("←→", " day  ", Color::LightCyan),
                ("t", " today  ", Color::LightCyan),
                ("c", " calendar  ", Color::LightYellow),
                ("a", " add  ", Color::LightMagenta),
                ("space", " toggle  ", Color::LightGreen),
                ("d", " delete  ", Color::LightRed),
                ("e", " write  ", Color::LightYellow),
                ("q", " quit", Color::LightRed),
            ],
            Mode::NewTask(_) => &[
                ("Enter", " add  ", Color::LightGreen),
                ("Esc", " cancel", Color::LightRed),
            ],
            Mode::Journal(_) => &[
                ("Enter", " newline  ", Color::LightCyan),
                ("↑↓←→", " move  ", Color::LightCyan),
                ("Esc", " done", Color::LightGreen),
            ],
            Mode::Reflection(_) => &[
                ("←→", " move  ", Color::LightCyan),
                ("Enter/Esc", " done", Color::LightGreen),
            ],
            Mode::Calendar => &[
                ("←↑↓→", " day  ", Color::LightCyan),
                ("[ ]", " month  ", Color::LightCyan),
                ("Enter", " select  ", Color::LightGreen),
                ("Esc", " close", Color::LightRed),
            ],
        };
        let spans: Vec<Span<'static>> = keys
            .iter()
            .flat_map(|(key, label, color)| {
                [
                    Span::styled(*key, Style::default().fg(*color)),
                    Span::raw(*label),
                ]
            })
            .collect();
        Line::from(spans)
    }

    fn draw_calendar(&self, f: &mut ratatui::Frame<'_>) {
        let area = centered_rect(60, 70, f.size());
        let month = self.planner.calendar_month();
        let grid = self.planner.calendar_grid();

        let mut lines = vec![
            Line::from(Span::styled(
                month.label(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        let headings = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
        lines.push(Line::from(
            headings
                .iter()
                .map(|h| Span::styled(format!("{:^6}", h), Style::default().fg(Color::Gray)))
                .collect::<Vec<_>>(),
        ));
        for week in weeks(&grid) {
            let spans: Vec<Span<'static>> = week
                .iter()
                .map(|cell| self.calendar_cell(cell))
                .collect();
            lines.push(Line::from(spans));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("•", Style::default().fg(Color::LightBlue)),
            Span::raw(" tasks  "),
            Span::styled("•", Style::default().fg(Color::LightMagenta)),
            Span::raw(" journal"),
        ]));

        let reflection = self.planner.calendar_reflection();
        if !reflection.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Monthly Theme",
                Style::default().fg(Color::Yellow),
            )));
            lines.push(Line::from(Span::styled(
                reflection,
                Style::default()
                    .fg(Color::LightMagenta)
                    .add_modifier(Modifier::ITALIC),
            )));
        }

        let dialog = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title(Span::styled(
                        "Calendar",
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn calendar_cell(&self, cell: &Cell) -> Span<'static> {
        let Cell::Day(day) = cell else {
            return Span::raw(" ".repeat(6));
        };
        let tasks_mark = if day.has_tasks { "•" } else { " " };
        let journal_mark = if day.has_journal { "+" } else { " " };
        let text = format!(" {:>2}{}{} ", day.day, tasks_mark, journal_mark);
        let mut style = Style::default().fg(Color::Gray);
        if day.has_tasks || day.has_journal {
            style = style.fg(Color::White);
        }
        if day.is_today {
            style = style.fg(Color::LightYellow).add_modifier(Modifier::BOLD);
        }
        if day.is_selected {
            style = style.bg(Color::Yellow).fg(Color::Black);
        }
        if day.day == self.calendar_cursor {
            style = style
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD);
        }
        Span::styled(text, style)
    }
}

/// Returns true when the value changed.
fn apply_edit(field: &mut FieldValue, key: KeyEvent, multiline: bool) -> bool {
    match key.code {
        KeyCode::Left => field.move_left(),
        KeyCode::Right => field.move_right(),
        KeyCode::Up if multiline => field.move_up(),
        KeyCode::Down if multiline => field.move_down(),
        KeyCode::Backspace => return field.backspace(),
        KeyCode::Enter if multiline => {
            field.insert_char('\n');
            return true;
        }
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            field.insert_char(c);
            return true;
        }
        _ => {}
    }
    false
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    let color = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .title(Span::styled(
            title,
            Style::default()
                .fg(if focused { Color::Cyan } else { Color::Gray })
                .add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
}

fn text_lines(text: &str, style: Style) -> Vec<Line<'static>> {
    text.split('\n')
        .map(|line| Line::from(Span::styled(line.to_string(), style)))
        .collect()
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Keeps `selected` inside the visible window, scrolling as little as possible.
fn adjust_offset(selected: usize, current_offset: usize, viewport: usize, len: usize) -> usize {
    if viewport == 0 || len == 0 {
        return 0;
    }
    let max_offset = len.saturating_sub(viewport);
    let mut offset = current_offset.min(max_offset);
    if selected < offset {
        offset = selected;
    } else if selected >= offset + viewport {
        offset = selected + 1 - viewport;
    }
    offset.min(max_offset)
}

fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let mut out: String = text.chars().take(max - 3).collect();
    out.push_str("...");
    out
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;
    use ratatui::backend::TestBackend;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn app() -> App<MemoryStore> {
        let planner = Planner::open(MemoryStore::new(), ymd(2025, 1, 5));
        App::new(planner, "Hey Sam".into(), "memory".into())
    }

    fn press(app: &mut App<MemoryStore>, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App<MemoryStore>, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    #[test]
    fn adding_through_the_input_line() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, " Buy milk ");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.planner.tasks().len(), 1);
        assert_eq!(app.planner.tasks()[0].text, "Buy milk");
        assert!(matches!(&app.mode, Mode::NewTask(field) if field.value.is_empty()));
    }

    #[test]
    fn blank_input_is_kept_for_the_user() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);
        assert!(app.planner.tasks().is_empty());
        assert!(matches!(&app.mode, Mode::NewTask(field) if field.value == "   "));
        assert_eq!(app.status, "Task text is empty");
    }

    #[test]
    fn toggle_and_delete_selected_task() {
        let mut app = app();
        app.planner.add_task("one").unwrap();
        app.planner.add_task("two").unwrap();
        app.apply_changes();

        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char(' '));
        assert!(app.planner.tasks()[1].completed);
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.planner.tasks().len(), 1);
        assert_eq!(app.selected_task, 0);
    }

    #[test]
    fn journal_saves_each_keystroke() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('e'));
        type_text(&mut app, "hi");
        assert_eq!(app.planner.journal(), "hi");
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.planner.journal(), "h");
        press(&mut app, KeyCode::Esc);
        assert!(matches!(app.mode, Mode::Normal));
        assert!(app.planner.store().has("journal_2025-01-05"));
    }

    #[test]
    fn calendar_pick_selects_and_closes() {
        let mut app = app();
        press(&mut app, KeyCode::Char('c'));
        assert!(matches!(app.mode, Mode::Calendar));
        assert_eq!(app.calendar_cursor, 5);
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.calendar_cursor, 1);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.planner.selected(), ymd(2025, 2, 8));
        assert!(!app.planner.calendar_open());
        assert!(matches!(app.mode, Mode::Normal));
    }

    #[test]
    fn calendar_cursor_stays_in_month() {
        let mut app = app();
        press(&mut app, KeyCode::Char('c'));
        for _ in 0..10 {
            press(&mut app, KeyCode::Down);
        }
        assert_eq!(app.calendar_cursor, 31);
        for _ in 0..10 {
            press(&mut app, KeyCode::Up);
        }
        assert_eq!(app.calendar_cursor, 1);
    }

    #[test]
    fn field_cursor_moves_between_lines() {
        let mut field = FieldValue::new("abc\nde");
        field.move_up();
        assert_eq!(field.cursor, 2);
        field.move_down();
        assert_eq!(field.cursor, 6);
        field.insert_char('é');
        assert_eq!(field.value, "abc\ndeé");
        assert!(field.backspace());
        assert_eq!(field.value, "abc\nde");
    }

    fn render(app: &mut App<MemoryStore>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn renders_all_panes() {
        let mut app = app();
        app.planner.add_task("Stretch").unwrap();
        app.apply_changes();

        let text = render(&mut app);
        assert!(text.contains("Hey Sam"));
        assert!(text.contains("Sunday, January 5, 2025"));
        assert!(text.contains("Daily Tasks & Habits (0 of 1 completed)"));
        assert!(text.contains("Stretch"));
        assert!(text.contains("What did I experience today?"));
        assert!(text.contains("Monthly Reflection: January 2025"));

        press(&mut app, KeyCode::Char('c'));
        let text = render(&mut app);
        assert!(text.contains("Calendar"));
        assert!(text.contains("Sun"));
        assert!(text.contains("Sat"));
    }

    #[test]
    fn offsets_follow_selection() {
        assert_eq!(adjust_offset(0, 0, 5, 10), 0);
        assert_eq!(adjust_offset(7, 0, 5, 10), 3);
        assert_eq!(adjust_offset(2, 3, 5, 10), 2);
        assert_eq!(adjust_offset(9, 0, 5, 3), 0);
    }
}
