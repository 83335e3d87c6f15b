//! State of the diary screen: the active date, the entry editor, the date
//! picker and the transient status line. Drawing lives in `ui`, terminal
//! handling in `app`.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{error, warn};

use crate::calendar::{DatePicker, PickerMove};
use crate::models::{NO_ENTRY_SENTINEL, date_key};
use crate::notes::NoteStore;
use crate::prefs::PreferenceStore;

pub const STATUS_MESSAGE_SECS: u64 = 2;
pub const NAV_HINT: &str =
    "Ctrl+S save | Ctrl+D delete | Ctrl+G date | Ctrl+E editor | Ctrl+Y copy | Ctrl+T theme | Esc quit";
pub const PICKER_HINT: &str =
    "←/→ day | ↑/↓ week | PgUp/PgDn month | t today | Enter confirm | Esc cancel";
pub const SAVED_MESSAGE: &str = "Entry saved successfully";
pub const DELETED_MESSAGE: &str = "Entry deleted successfully";
pub const DELETE_FAILED_MESSAGE: &str = "Error: Couldn't delete the entry. Try Again!";
pub const LOAD_FAILED_SAVE_MESSAGE: &str =
    "Error: the entry could not be read, so it was not overwritten";

/// Multi-line text buffer with a character-based cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextArea {
    lines: Vec<String>,
    row: usize,
    col: usize,
}

impl Default for TextArea {
    fn default() -> Self {
        Self {
            lines: vec![String::new()],
            row: 0,
            col: 0,
        }
    }
}

impl TextArea {
    /// Buffer holding `text`, cursor at the end.
    pub fn from_text(text: &str) -> Self {
        let lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        let row = lines.len() - 1;
        let col = lines[row].chars().count();
        Self { lines, row, col }
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.len() == 1 && self.lines[0].is_empty()
    }

    fn byte_index(&self) -> usize {
        let line = &self.lines[self.row];
        line.char_indices()
            .nth(self.col)
            .map(|(idx, _)| idx)
            .unwrap_or(line.len())
    }

    fn line_len(&self, row: usize) -> usize {
        self.lines[row].chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        let idx = self.byte_index();
        self.lines[self.row].insert(idx, c);
        self.col += 1;
    }

    pub fn newline(&mut self) {
        let idx = self.byte_index();
        let rest = self.lines[self.row].split_off(idx);
        self.lines.insert(self.row + 1, rest);
        self.row += 1;
        self.col = 0;
    }

    pub fn backspace(&mut self) {
        if self.col > 0 {
            self.col -= 1;
            let idx = self.byte_index();
            self.lines[self.row].remove(idx);
        } else if self.row > 0 {
            let line = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.line_len(self.row);
            self.lines[self.row].push_str(&line);
        }
    }

    pub fn delete(&mut self) {
        if self.col < self.line_len(self.row) {
            let idx = self.byte_index();
            self.lines[self.row].remove(idx);
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
        }
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.line_len(self.row);
        }
    }

    pub fn move_right(&mut self) {
        if self.col < self.line_len(self.row) {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
            self.col = self.col.min(self.line_len(self.row));
        }
    }

    pub fn move_down(&mut self) {
        if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = self.col.min(self.line_len(self.row));
        }
    }

    pub fn home(&mut self) {
        self.col = 0;
    }

    pub fn end(&mut self) {
        self.col = self.line_len(self.row);
    }
}

/// Work the screen cannot do on its own because it needs the terminal or
/// the system clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenAction {
    None,
    Quit,
    OpenEditor(String),
    CopyToClipboard(String),
}

pub struct DiaryScreen {
    date: NaiveDate,
    editor: TextArea,
    saved_text: String,
    placeholder: bool,
    /// Set while the active date's note could not be read; saving is refused
    /// so the unreadable file is not replaced.
    load_failed: bool,
    picker: Option<DatePicker>,
    delete_confirm: bool,
    quit_confirm: bool,
    dark_mode: bool,
    marked: BTreeSet<NaiveDate>,
    status: String,
    status_until: Option<Instant>,
    today: NaiveDate,
}

impl DiaryScreen {
    pub fn new(date: NaiveDate, today: NaiveDate, dark_mode: bool) -> Self {
        Self {
            date,
            editor: TextArea::default(),
            saved_text: String::new(),
            placeholder: true,
            load_failed: false,
            picker: None,
            delete_confirm: false,
            quit_confirm: false,
            dark_mode,
            marked: BTreeSet::new(),
            status: NAV_HINT.to_string(),
            status_until: None,
            today,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn editor(&self) -> &TextArea {
        &self.editor
    }

    pub fn picker(&self) -> Option<&DatePicker> {
        self.picker.as_ref()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn marked(&self) -> &BTreeSet<NaiveDate> {
        &self.marked
    }

    pub fn delete_confirm(&self) -> bool {
        self.delete_confirm
    }

    pub fn quit_confirm(&self) -> bool {
        self.quit_confirm
    }

    /// Placeholder shown in the empty editor when the date has no entry.
    pub fn placeholder(&self) -> Option<&str> {
        (self.placeholder && self.editor.is_empty()).then_some(NO_ENTRY_SENTINEL)
    }

    pub fn load_failed(&self) -> bool {
        self.load_failed
    }

    pub fn is_dirty(&self) -> bool {
        self.editor.text() != self.saved_text
    }

    pub fn set_dark_mode(&mut self, dark_mode: bool) {
        self.dark_mode = dark_mode;
    }

    /// Shows `message` until the status timeout passes.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
        self.status_until = Some(Instant::now() + Duration::from_secs(STATUS_MESSAGE_SECS));
    }

    /// Restores the key hint once a transient message has expired.
    pub fn tick(&mut self, now: Instant) {
        if let Some(until) = self.status_until {
            if now >= until {
                self.status = self.hint().to_string();
                self.status_until = None;
            }
        }
    }

    fn hint(&self) -> &'static str {
        if self.picker.is_some() { PICKER_HINT } else { NAV_HINT }
    }

    fn show_hint(&mut self) {
        self.status = self.hint().to_string();
        self.status_until = None;
    }

    /// Rescans which dates have entries, for the calendar marks.
    pub fn refresh_marks(&mut self, notes: &NoteStore) {
        match notes.dates() {
            Ok(dates) => self.marked = dates.into_iter().collect(),
            Err(e) => warn!("event=marks_refresh status=error error={e}"),
        }
    }

    /// Makes `date` active and fills the editor from the note store.
    pub fn load(&mut self, date: NaiveDate, notes: &NoteStore) {
        self.date = date;
        self.load_failed = false;
        match notes.read(date) {
            Ok(text) if text == NO_ENTRY_SENTINEL => self.reset_editor(String::new(), true),
            Ok(text) => self.reset_editor(text, false),
            Err(e) => {
                error!("event=note_read date={} status=error error={e}", date_key(date));
                self.reset_editor(String::new(), false);
                self.load_failed = true;
                self.set_status(format!("Error: couldn't read the entry ({e})"));
            }
        }
    }

    fn reset_editor(&mut self, text: String, placeholder: bool) {
        self.editor = TextArea::from_text(&text);
        self.saved_text = text;
        self.placeholder = placeholder;
    }

    /// Replaces the editor content, e.g. after an external editor session.
    pub fn replace_text(&mut self, text: &str) {
        self.editor = TextArea::from_text(text);
    }

    pub fn save(&mut self, notes: &NoteStore) {
        if self.load_failed {
            warn!(
                "event=note_write date={} status=refused reason=unreadable",
                date_key(self.date)
            );
            self.set_status(LOAD_FAILED_SAVE_MESSAGE);
            return;
        }
        let text = self.editor.text();
        match notes.write(self.date, &text) {
            Ok(()) => {
                self.saved_text = text;
                self.marked.insert(self.date);
                self.set_status(SAVED_MESSAGE);
            }
            Err(e) => {
                error!(
                    "event=note_write date={} status=error error={e}",
                    date_key(self.date)
                );
                self.set_status(format!("Error: couldn't save the entry ({e})"));
            }
        }
    }

    pub fn delete(&mut self, notes: &NoteStore) {
        match notes.delete(self.date) {
            Ok(true) => {
                self.load_failed = false;
                self.reset_editor(String::new(), true);
                self.marked.remove(&self.date);
                self.set_status(DELETED_MESSAGE);
            }
            Ok(false) => self.set_status(DELETE_FAILED_MESSAGE),
            Err(e) => {
                error!(
                    "event=note_delete date={} status=error error={e}",
                    date_key(self.date)
                );
                self.set_status(format!("{DELETE_FAILED_MESSAGE} ({e})"));
            }
        }
    }

    pub fn toggle_theme(&mut self, prefs: &PreferenceStore) {
        match prefs.toggle() {
            Ok(true) => self.set_status("Dark mode on"),
            Ok(false) => self.set_status("Dark mode off"),
            Err(e) => {
                error!("event=pref_write status=error error={e}");
                self.set_status(format!("Error: couldn't save the theme ({e})"));
            }
        }
    }

    pub fn handle_key(
        &mut self,
        key: KeyEvent,
        notes: &NoteStore,
        prefs: &PreferenceStore,
    ) -> ScreenAction {
        if key.kind != KeyEventKind::Press {
            return ScreenAction::None;
        }

        if self.quit_confirm {
            match key.code {
                KeyCode::Char('y') => return ScreenAction::Quit,
                KeyCode::Char('n') | KeyCode::Esc => {
                    self.quit_confirm = false;
                    self.show_hint();
                }
                _ => {}
            }
            return ScreenAction::None;
        }

        if self.delete_confirm {
            match key.code {
                KeyCode::Char('y') => {
                    self.delete_confirm = false;
                    self.delete(notes);
                }
                KeyCode::Char('n') | KeyCode::Esc => {
                    self.delete_confirm = false;
                    self.set_status("Delete cancelled");
                }
                _ => {}
            }
            return ScreenAction::None;
        }

        if self.picker.is_some() {
            self.handle_picker_key(key, notes);
            return ScreenAction::None;
        }

        // AltGr arrives as Ctrl+Alt on some platforms and produces text.
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && !key.modifiers.contains(KeyModifiers::ALT)
        {
            return match key.code {
                KeyCode::Char('s') => {
                    self.save(notes);
                    ScreenAction::None
                }
                KeyCode::Char('d') => {
                    self.delete_confirm = true;
                    self.set_status("Confirm delete with y/n");
                    ScreenAction::None
                }
                KeyCode::Char('g') => {
                    self.open_picker();
                    ScreenAction::None
                }
                KeyCode::Char('t') => {
                    self.toggle_theme(prefs);
                    ScreenAction::None
                }
                KeyCode::Char('e') => ScreenAction::OpenEditor(self.editor.text()),
                KeyCode::Char('y') => ScreenAction::CopyToClipboard(self.editor.text()),
                _ => ScreenAction::None,
            };
        }

        match key.code {
            KeyCode::Esc if !self.is_dirty() => return ScreenAction::Quit,
            KeyCode::Esc => {
                self.quit_confirm = true;
                self.status = "Unsaved changes. Quit anyway? y/n".to_string();
                self.status_until = None;
            }
            KeyCode::F(2) => self.open_picker(),
            KeyCode::Char(c) => self.editor.insert_char(c),
            KeyCode::Enter => self.editor.newline(),
            KeyCode::Tab => {
                for _ in 0..4 {
                    self.editor.insert_char(' ');
                }
            }
            KeyCode::Backspace => self.editor.backspace(),
            KeyCode::Delete => self.editor.delete(),
            KeyCode::Left => self.editor.move_left(),
            KeyCode::Right => self.editor.move_right(),
            KeyCode::Up => self.editor.move_up(),
            KeyCode::Down => self.editor.move_down(),
            KeyCode::Home => self.editor.home(),
            KeyCode::End => self.editor.end(),
            _ => {}
        }
        ScreenAction::None
    }

    fn open_picker(&mut self) {
        self.picker = Some(DatePicker::open(self.date));
        self.show_hint();
    }

    fn handle_picker_key(&mut self, key: KeyEvent, notes: &NoteStore) {
        let mv = match key.code {
            KeyCode::Left => PickerMove::PrevDay,
            KeyCode::Right => PickerMove::NextDay,
            KeyCode::Up => PickerMove::PrevWeek,
            KeyCode::Down => PickerMove::NextWeek,
            KeyCode::PageUp => PickerMove::PrevMonth,
            KeyCode::PageDown => PickerMove::NextMonth,
            KeyCode::Char('t') => PickerMove::Today(self.today),
            KeyCode::Enter => {
                if let Some(picker) = self.picker.take() {
                    let chosen = picker.confirm();
                    self.show_hint();
                    self.load(chosen, notes);
                }
                return;
            }
            KeyCode::Esc => {
                self.picker = None;
                self.show_hint();
                return;
            }
            _ => return,
        };
        if let Some(picker) = self.picker.as_mut() {
            picker.apply(mv);
        }
    }
}
