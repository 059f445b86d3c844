//! Console sink for model output.
//!
//! Hosts register a single [`ConsoleCallback`]; compiled models call the
//! free functions in this module, which forward to the callback. With no
//! callback registered every call is a silent no-op and [`start_message`]
//! returns `false`, so a model can skip assembling the message entirely.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use once_cell::sync::Lazy;

use crate::variant::Variant;

/// Category of a console message.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Information = 0,
    Warning = 1,
    Error = 2,
    Debug = 3,
}

/// Letter case applied to numeric tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LetterCase {
    #[default]
    Unchanged,
    Upper,
    Lower,
}

/// Receiver for console traffic. Every method takes the logical thread the
/// message belongs to; implementations keep per-thread state.
pub trait ConsoleCallback: Send + Sync {
    fn initialize(&self, thread_count: usize);

    /// Begin a message. Returning `false` drops everything until `end_message`.
    fn start_message(&self, thread: usize, kind: MessageKind) -> bool;

    fn end_message(&self, thread: usize);

    fn append(&self, thread: usize, token: &Variant);

    fn append_text(&self, thread: usize, text: &str);

    /// Radix for integer tokens, 2 through 36.
    fn set_base(&self, thread: usize, base: u32);

    /// Minimum width of the next token.
    fn set_width(&self, thread: usize, width: usize);

    fn set_pad(&self, thread: usize, pad: char);

    fn set_upper_case(&self, thread: usize);

    fn set_lower_case(&self, thread: usize);

    fn reset_case(&self, thread: usize);
}

static CALLBACK: Lazy<RwLock<Option<Arc<dyn ConsoleCallback>>>> = Lazy::new(|| RwLock::new(None));

fn current() -> Option<Arc<dyn ConsoleCallback>> {
    CALLBACK
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Install `callback`, returning the one it replaces.
pub fn register_callback(callback: Arc<dyn ConsoleCallback>) -> Option<Arc<dyn ConsoleCallback>> {
    tracing::debug!("console callback registered");
    CALLBACK
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .replace(callback)
}

/// Remove the registered callback, if any.
pub fn release_callback() -> Option<Arc<dyn ConsoleCallback>> {
    tracing::debug!("console callback released");
    CALLBACK
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .take()
}

pub fn has_callback() -> bool {
    current().is_some()
}

pub fn initialize(thread_count: usize) {
    if let Some(callback) = current() {
        callback.initialize(thread_count);
    }
}

pub fn start_message(thread: usize, kind: MessageKind) -> bool {
    current().is_some_and(|callback| callback.start_message(thread, kind))
}

pub fn end_message(thread: usize) {
    if let Some(callback) = current() {
        callback.end_message(thread);
    }
}

pub fn append(thread: usize, token: &Variant) {
    if let Some(callback) = current() {
        callback.append(thread, token);
    }
}

pub fn append_text(thread: usize, text: &str) {
    if let Some(callback) = current() {
        callback.append_text(thread, text);
    }
}

pub fn set_base(thread: usize, base: u32) {
    if let Some(callback) = current() {
        callback.set_base(thread, base);
    }
}

pub fn set_width(thread: usize, width: usize) {
    if let Some(callback) = current() {
        callback.set_width(thread, width);
    }
}

pub fn set_pad(thread: usize, pad: char) {
    if let Some(callback) = current() {
        callback.set_pad(thread, pad);
    }
}

pub fn set_upper_case(thread: usize) {
    if let Some(callback) = current() {
        callback.set_upper_case(thread);
    }
}

pub fn set_lower_case(thread: usize) {
    if let Some(callback) = current() {
        callback.set_lower_case(thread);
    }
}

pub fn reset_case(thread: usize) {
    if let Some(callback) = current() {
        callback.reset_case(thread);
    }
}

// ========== StringConsole ==========

#[derive(Debug, Clone)]
struct ThreadState {
    open: Option<MessageKind>,
    buffer: String,
    messages: Vec<(MessageKind, String)>,
    base: u32,
    width: usize,
    pad: char,
    case: LetterCase,
}

impl Default for ThreadState {
    fn default() -> Self {
        ThreadState {
            open: None,
            buffer: String::new(),
            messages: Vec::new(),
            base: 10,
            width: 0,
            pad: ' ',
            case: LetterCase::Unchanged,
        }
    }
}

impl ThreadState {
    fn push_token(&mut self, token: &str) {
        if self.open.is_none() {
            return;
        }
        let token = match self.case {
            LetterCase::Unchanged => token.to_owned(),
            LetterCase::Upper => token.to_uppercase(),
            LetterCase::Lower => token.to_lowercase(),
        };
        let fill = self.width.saturating_sub(token.chars().count());
        self.buffer.extend(std::iter::repeat(self.pad).take(fill));
        self.buffer.push_str(&token);
        // Width applies to one token only.
        self.width = 0;
    }
}

/// Integer `value` in `base` (2 through 36), digits above 9 in lower case.
fn integer_in_base(value: i64, base: u32) -> String {
    if base == 10 || !(2..=36).contains(&base) {
        return value.to_string();
    }
    let mut magnitude = value.unsigned_abs();
    let mut digits = Vec::new();
    loop {
        let digit = (magnitude % u64::from(base)) as u32;
        digits.push(char::from_digit(digit, base).unwrap_or('?'));
        magnitude /= u64::from(base);
        if magnitude == 0 {
            break;
        }
    }
    let mut text = String::with_capacity(digits.len() + 1);
    if value < 0 {
        text.push('-');
    }
    text.extend(digits.iter().rev());
    text
}

/// Console that renders each thread's messages into strings.
#[derive(Debug, Default)]
pub struct StringConsole {
    threads: Mutex<Vec<ThreadState>>,
}

impl StringConsole {
    pub fn new() -> Self {
        Self::default()
    }

    fn threads(&self) -> MutexGuard<'_, Vec<ThreadState>> {
        self.threads
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_thread(&self, thread: usize, f: impl FnOnce(&mut ThreadState)) {
        let mut threads = self.threads();
        if threads.len() <= thread {
            threads.resize_with(thread + 1, ThreadState::default);
        }
        f(&mut threads[thread]);
    }

    /// Completed messages of one thread, oldest first.
    pub fn messages(&self, thread: usize) -> Vec<(MessageKind, String)> {
        self.threads()
            .get(thread)
            .map(|state| state.messages.clone())
            .unwrap_or_default()
    }

    /// Completed message texts of one thread, removing them from the console.
    pub fn take_messages(&self, thread: usize) -> Vec<String> {
        let mut threads = self.threads();
        match threads.get_mut(thread) {
            Some(state) => state.messages.drain(..).map(|(_, text)| text).collect(),
            None => Vec::new(),
        }
    }
}

impl ConsoleCallback for StringConsole {
    fn initialize(&self, thread_count: usize) {
        let mut threads = self.threads();
        threads.clear();
        threads.resize_with(thread_count, ThreadState::default);
    }

    fn start_message(&self, thread: usize, kind: MessageKind) -> bool {
        self.with_thread(thread, |state| {
            state.open = Some(kind);
            state.buffer.clear();
        });
        true
    }

    fn end_message(&self, thread: usize) {
        self.with_thread(thread, |state| {
            if let Some(kind) = state.open.take() {
                let text = std::mem::take(&mut state.buffer);
                state.messages.push((kind, text));
            }
        });
    }

    fn append(&self, thread: usize, token: &Variant) {
        self.with_thread(thread, |state| {
            let text = match token {
                Variant::Integer(i) => integer_in_base(*i, state.base),
                other => other.to_string(),
            };
            state.push_token(&text);
        });
    }

    fn append_text(&self, thread: usize, text: &str) {
        self.with_thread(thread, |state| {
            if state.open.is_some() {
                state.buffer.push_str(text);
            }
        });
    }

    fn set_base(&self, thread: usize, base: u32) {
        self.with_thread(thread, |state| state.base = base);
    }

    fn set_width(&self, thread: usize, width: usize) {
        self.with_thread(thread, |state| state.width = width);
    }

    fn set_pad(&self, thread: usize, pad: char) {
        self.with_thread(thread, |state| state.pad = pad);
    }

    fn set_upper_case(&self, thread: usize) {
        self.with_thread(thread, |state| state.case = LetterCase::Upper);
    }

    fn set_lower_case(&self, thread: usize) {
        self.with_thread(thread, |state| state.case = LetterCase::Lower);
    }

    fn reset_case(&self, thread: usize) {
        self.with_thread(thread, |state| state.case = LetterCase::Unchanged);
    }
}
