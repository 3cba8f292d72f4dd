use std::collections::VecDeque;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use dialdeck_core::domain::{CallDirection, CallStatus, ContactId, OutcomeLabel};
use dialdeck_core::dto::{CallLogDto, QueueDto, QueueItemDto};

use crate::actions::{Action, Report};

const QUEUE_EMPTY: &str = "Calling list is empty.";
const QUEUE_COMPLETE: &str = "Calling list complete. Press 'q' to leave.";

#[derive(Debug, Clone)]
pub enum Mode {
    Dialer,
    Record(RecordForm),
    Digits(String),
}

/// Snapshot of the call controller for drawing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallView {
    pub status: CallStatus,
    pub direction: CallDirection,
    pub number: Option<String>,
    pub contact_id: Option<ContactId>,
    pub elapsed: String,
    pub muted: bool,
    pub ready: bool,
    pub readiness_error: Option<String>,
}

impl Default for CallView {
    fn default() -> Self {
        Self {
            status: CallStatus::Idle,
            direction: CallDirection::Outbound,
            number: None,
            contact_id: None,
            elapsed: "00:00".to_string(),
            muted: false,
            ready: false,
            readiness_error: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct App {
    pub mode: Mode,
    pub show_help: bool,
    pub show_history: bool,
    pub should_quit: bool,
    pub status: Option<String>,
    pub error: Option<String>,
    pub queue: QueueDto,
    pub call: CallView,
    pub outcomes: Vec<OutcomeLabel>,
    pub pending_count: i64,
    pub history: Vec<CallLogDto>,
    actions: VecDeque<Action>,
}

impl App {
    pub fn new(outcomes: Vec<OutcomeLabel>) -> Self {
        let mut app = Self {
            mode: Mode::Dialer,
            show_help: false,
            show_history: false,
            should_quit: false,
            status: None,
            error: None,
            queue: QueueDto {
                cursor: 0,
                complete: false,
                items: Vec::new(),
            },
            call: CallView::default(),
            outcomes,
            pending_count: 0,
            history: Vec::new(),
            actions: VecDeque::new(),
        };
        app.enqueue(Action::Refresh);
        app
    }

    pub fn enqueue(&mut self, action: Action) {
        self.actions.push_back(action);
    }

    pub fn next_action(&mut self) -> Option<Action> {
        self.actions.pop_front()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn current_item(&self) -> Option<&QueueItemDto> {
        if self.queue.complete {
            return None;
        }
        self.queue.items.get(self.queue.cursor)
    }

    /// Steps that no longer block the cursor.
    pub fn settled_count(&self) -> usize {
        self.queue
            .items
            .iter()
            .filter(|item| matches!(item.step.as_str(), "recorded" | "queued" | "skipped"))
            .count()
    }

    pub fn empty_hint(&self) -> &'static str {
        if self.queue.complete {
            QUEUE_COMPLETE
        } else {
            QUEUE_EMPTY
        }
    }

    /// Opens the outcome form unless another form is already up.
    pub fn prompt_outcome(&mut self) {
        if matches!(self.mode, Mode::Dialer) && !self.outcomes.is_empty() {
            self.mode = Mode::Record(RecordForm::new());
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press && key.kind != KeyEventKind::Repeat {
            return;
        }

        if self.show_help {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
                self.show_help = false;
            }
            return;
        }

        if matches!(
            key,
            KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            }
        ) {
            self.should_quit = true;
            return;
        }

        let mut mode = std::mem::replace(&mut self.mode, Mode::Dialer);
        match &mut mode {
            Mode::Dialer => {
                if let Some(next) = self.handle_dialer_key(key) {
                    mode = next;
                }
            }
            Mode::Record(form) => {
                if let Some(next) = self.handle_record_key(form, key) {
                    mode = next;
                }
            }
            Mode::Digits(digits) => {
                if let Some(next) = self.handle_digits_key(digits, key) {
                    mode = next;
                }
            }
        }
        self.mode = mode;
    }

    fn handle_dialer_key(&mut self, key: KeyEvent) -> Option<Mode> {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Enter | KeyCode::Char('c') => self.enqueue(Action::PlaceCall),
            KeyCode::Char('h') => self.enqueue(Action::HangUp),
            KeyCode::Char('a') => self.enqueue(Action::Accept),
            KeyCode::Char('x') => self.enqueue(Action::Reject),
            KeyCode::Char('m') => self.enqueue(Action::ToggleMute),
            KeyCode::Char('d') => {
                if self.call.status == CallStatus::Connected {
                    return Some(Mode::Digits(String::new()));
                }
                self.set_error("digits can only be sent during a connected call");
            }
            KeyCode::Char('o') => {
                if self.outcomes.is_empty() {
                    self.set_error("no outcome labels configured");
                } else {
                    return Some(Mode::Record(RecordForm::new()));
                }
            }
            KeyCode::Char('p') => self.enqueue(Action::QueueFailed),
            KeyCode::Char('s') => self.enqueue(Action::Skip),
            KeyCode::Char('n') => self.enqueue(Action::Advance),
            KeyCode::Char('f') => self.enqueue(Action::FlushPending),
            KeyCode::Char('R') => self.enqueue(Action::Reset),
            KeyCode::Char('i') => self.enqueue(Action::Reinitialize),
            KeyCode::Char('l') => {
                self.show_history = !self.show_history;
                if self.show_history {
                    self.enqueue(Action::LoadHistory);
                }
            }
            KeyCode::Char('r') => self.enqueue(Action::Report(Report::Ringing)),
            KeyCode::Char('y') => self.enqueue(Action::Report(Report::Answered)),
            KeyCode::Char('e') => self.enqueue(Action::Report(Report::RemoteHangUp)),
            KeyCode::Char('I') => self.enqueue(Action::Report(Report::Incoming)),
            KeyCode::Char('E') => self.enqueue(Action::Report(Report::Error)),
            _ => {}
        }
        None
    }

    fn handle_record_key(&mut self, form: &mut RecordForm, key: KeyEvent) -> Option<Mode> {
        match key.code {
            KeyCode::Esc => return Some(Mode::Dialer),
            KeyCode::Tab | KeyCode::BackTab => form.editing_notes = !form.editing_notes,
            KeyCode::Enter => {
                let label = self.outcomes.get(form.selected)?.label.clone();
                self.enqueue(Action::Record {
                    label,
                    notes: form.notes(),
                });
                return Some(Mode::Dialer);
            }
            _ if form.editing_notes => apply_text_input(&mut form.notes, key),
            KeyCode::Down | KeyCode::Char('j') => form.move_selection(1, self.outcomes.len()),
            KeyCode::Up | KeyCode::Char('k') => form.move_selection(-1, self.outcomes.len()),
            KeyCode::Char(ch) if ch.is_ascii_digit() && ch != '0' => {
                let index = ch as usize - '1' as usize;
                if index < self.outcomes.len() {
                    form.selected = index;
                }
            }
            _ => {}
        }
        None
    }

    fn handle_digits_key(&mut self, digits: &mut String, key: KeyEvent) -> Option<Mode> {
        match key.code {
            KeyCode::Esc => return Some(Mode::Dialer),
            KeyCode::Enter => {
                if !digits.is_empty() {
                    self.enqueue(Action::SendDigits(std::mem::take(digits)));
                }
                return Some(Mode::Dialer);
            }
            KeyCode::Backspace => {
                digits.pop();
            }
            KeyCode::Char(ch) if ch.is_ascii_digit() || matches!(ch, '*' | '#') => {
                digits.push(ch);
            }
            _ => {}
        }
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordForm {
    pub selected: usize,
    pub notes: String,
    pub editing_notes: bool,
}

impl RecordForm {
    pub fn new() -> Self {
        Self::default()
    }

    fn move_selection(&mut self, delta: isize, len: usize) {
        if len == 0 {
            return;
        }
        let next = (self.selected as isize + delta).clamp(0, len as isize - 1);
        self.selected = next as usize;
    }

    fn notes(&self) -> Option<String> {
        let trimmed = self.notes.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

fn apply_text_input(target: &mut String, key: KeyEvent) {
    match key.code {
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            target.clear();
        }
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            delete_last_word(target);
        }
        KeyCode::Char(ch) => {
            if !key.modifiers.contains(KeyModifiers::CONTROL) {
                target.push(ch);
            }
        }
        KeyCode::Backspace => {
            target.pop();
        }
        _ => {}
    }
}

fn delete_last_word(value: &mut String) {
    while value.ends_with(|ch: char| ch.is_whitespace()) {
        value.pop();
    }
    while value.ends_with(|ch: char| !ch.is_whitespace()) {
        value.pop();
    }
}
