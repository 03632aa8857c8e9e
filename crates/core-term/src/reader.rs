//! Raw byte stream → logical [`Item`] state machine with the editable line
//! buffer.
//!
//! The reader owns the only blocking point of the REPL thread (the terminal
//! read) and converts keypresses and escape sequences into one `Item` per
//! [`TermReader::next_item`] call. States are explicit data stepped one at a
//! time, which keeps single-step tests trivial.
//!
//! View discipline: `buf` is a 256-byte rolling window. Bytes already decoded
//! into the line have been consumed from the view; bytes forming a partial
//! UTF-8 scalar or escape sequence stay in the view for the next read.

use std::io::{self, Read};

use tracing::trace;

use crate::color::Color;
use crate::writer::TermWriter;

const VIEW_CAPACITY: usize = 256;

const KEY_CTRL_C: u8 = 0x03;
const KEY_BACKSPACE: u8 = 0x08;
const KEY_TAB: u8 = 0x09;
const KEY_CTRL_L: u8 = 0x0C;
const KEY_CTRL_N: u8 = 0x0E;
const KEY_CTRL_P: u8 = 0x10;
const KEY_ESCAPE: u8 = 0x1B;
const KEY_DELETE: u8 = 0x7F;

const PASTE_START: &[u8] = b"\x1b[200~";
const PASTE_END: &[u8] = b"\x1b[201~";

/// One classified keypress or line submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    LineSubmitted(String),
    Tab,
    Up,
    Down,
    CtrlC,
    CtrlL,
    /// Emitted after the reader has already applied the deletion and echoed
    /// the cursor motion, so the driver can refresh inline hints.
    Backspace,
    Error(String),
    Eof,
}

/// Queried after every line edit with the current line; a returned string is
/// painted as a dimmed suggestion after the cursor.
pub type HintHook = Box<dyn FnMut(&str) -> Option<String> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Advance,
    ReadInput,
    ReadKey,
    HandleKey,
    HandleEnter,
    ReadPaste,
}

enum Step {
    Continue(State),
    Emit(Item),
}

pub struct TermReader {
    source: Box<dyn Read + Send>,
    writer: TermWriter,
    prompt: String,

    line: Vec<char>,
    buf: [u8; VIEW_CAPACITY],
    view_start: usize,
    view_end: usize,

    paste_mode: bool,
    finished: bool,
    hint_hook: Option<HintHook>,
}

impl TermReader {
    pub fn new(source: Box<dyn Read + Send>, writer: TermWriter) -> Self {
        Self {
            source,
            writer,
            prompt: String::new(),
            line: Vec::new(),
            buf: [0; VIEW_CAPACITY],
            view_start: 0,
            view_end: 0,
            paste_mode: false,
            finished: false,
            hint_hook: None,
        }
    }

    pub fn set_prompt(&mut self, prompt: &str) {
        self.prompt = prompt.to_string();
    }

    pub fn set_hint_hook(&mut self, hook: HintHook) {
        self.hint_hook = Some(hook);
    }

    /// Current line content.
    pub fn line(&self) -> String {
        self.line.iter().collect()
    }

    /// Drop the line buffer without repainting.
    pub fn clear_line(&mut self) {
        self.line.clear();
    }

    /// Block until the next logical item.
    pub fn next_item(&mut self) -> Item {
        if self.finished {
            return Item::Eof;
        }
        let mut state = State::ReadInput;
        loop {
            state = match self.step(state) {
                Step::Continue(next) => next,
                Step::Emit(item) => {
                    trace!(target: "term.reader", item = ?std::mem::discriminant(&item), "emit");
                    return item;
                }
            };
        }
    }

    /// Replace the line buffer and repaint prompt + content on the current
    /// row.
    pub fn replace_with(&mut self, content: &str) -> io::Result<()> {
        self.line = content.chars().collect();
        self.writer.stage(b"\r\x1b[K");
        self.writer.stage_str(&self.prompt);
        self.writer.stage_str(content);
        self.writer.commit_all()?;
        Ok(())
    }

    /// Repaint prompt + current line (used after external screen writes).
    pub fn redraw(&mut self) -> io::Result<()> {
        let line = self.line();
        self.replace_with(&line)
    }

    /// Paint a dimmed suggestion after the cursor, leaving the cursor where
    /// it was.
    pub fn suggest(&mut self, text: &str) -> io::Result<()> {
        self.stage_hint(text);
        self.writer.commit_all()?;
        Ok(())
    }

    fn stage_hint(&self, text: &str) {
        self.writer.stage(b"\x1b[0K");
        if text.is_empty() {
            return;
        }
        self.writer.stage_push_foreground(Color::Grey);
        self.writer.stage_str(text);
        self.writer.stage_move(-(text.chars().count() as isize));
        self.writer.stage_pop_foreground();
    }

    // ---------------------------------------------------------------------
    // State machine
    // ---------------------------------------------------------------------

    fn step(&mut self, state: State) -> Step {
        match state {
            State::Advance => self.advance(),
            State::ReadInput => Step::Continue(State::ReadKey),
            State::ReadKey => self.read_key(),
            State::HandleKey => self.handle_key(),
            State::HandleEnter => self.handle_enter(),
            State::ReadPaste => self.read_paste(),
        }
    }

    fn view(&self) -> &[u8] {
        &self.buf[self.view_start..self.view_end]
    }

    fn consume(&mut self, n: usize) {
        debug_assert!(self.view_start + n <= self.view_end);
        self.view_start += n;
    }

    /// Read more bytes into the view, compacting consumed space first.
    fn advance(&mut self) -> Step {
        if self.view_start > 0 {
            self.buf.copy_within(self.view_start..self.view_end, 0);
            self.view_end -= self.view_start;
            self.view_start = 0;
        }
        if self.view_end == VIEW_CAPACITY {
            // A well-formed sequence never comes close to the view size.
            self.finished = true;
            return Step::Emit(Item::Error("input view overflow".to_string()));
        }

        match self.source.read(&mut self.buf[self.view_end..]) {
            Ok(0) => {
                self.finished = true;
                Step::Emit(Item::Eof)
            }
            Ok(n) => {
                self.view_end += n;
                Step::Continue(State::ReadInput)
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => Step::Continue(State::Advance),
            Err(err) => {
                self.finished = true;
                Step::Emit(Item::Error(format!("advance: {err}")))
            }
        }
    }

    /// Classify the leading byte of the view.
    fn read_key(&mut self) -> Step {
        if self.view().is_empty() {
            return Step::Continue(State::Advance);
        }
        if self.paste_mode {
            return Step::Continue(State::ReadPaste);
        }

        match self.view()[0] {
            KEY_CTRL_C => {
                self.consume(1);
                Step::Emit(Item::CtrlC)
            }
            KEY_TAB => {
                self.consume(1);
                Step::Emit(Item::Tab)
            }
            KEY_CTRL_L => {
                self.consume(1);
                Step::Emit(Item::CtrlL)
            }
            KEY_CTRL_N => {
                self.consume(1);
                Step::Emit(Item::Down)
            }
            KEY_CTRL_P => {
                self.consume(1);
                Step::Emit(Item::Up)
            }
            KEY_BACKSPACE | KEY_DELETE => {
                self.consume(1);
                self.backspace()
            }
            KEY_ESCAPE => self.read_escape(),
            _ => Step::Continue(State::HandleKey),
        }
    }

    fn read_escape(&mut self) -> Step {
        let view = self.view();
        if view.len() < 2 {
            return Step::Continue(State::Advance);
        }
        if view[1] != b'[' {
            // Lone ESC (or an alt-chord we do not model): drop the ESC and
            // let the following byte be handled on its own.
            self.consume(1);
            return Step::Continue(State::ReadInput);
        }
        if view.len() < 3 {
            return Step::Continue(State::Advance);
        }
        match view[2] {
            b'A' => {
                self.consume(3);
                Step::Emit(Item::Up)
            }
            b'B' => {
                self.consume(3);
                Step::Emit(Item::Down)
            }
            _ => {
                if view.len() < PASTE_START.len() && PASTE_START.starts_with(&view[..view.len()]) {
                    return Step::Continue(State::Advance);
                }
                if view.starts_with(PASTE_START) {
                    self.consume(PASTE_START.len());
                    self.paste_mode = true;
                    return Step::Continue(State::ReadPaste);
                }
                self.skip_csi()
            }
        }
    }

    /// Consume an unrecognized CSI sequence: parameter/intermediate bytes
    /// followed by one final byte in `0x40..=0x7E`.
    fn skip_csi(&mut self) -> Step {
        let view = self.view();
        let mut idx = 2;
        while idx < view.len() {
            let b = view[idx];
            idx += 1;
            if (0x40..=0x7E).contains(&b) {
                self.consume(idx);
                return Step::Continue(State::ReadInput);
            }
        }
        // Final byte not buffered yet.
        Step::Continue(State::Advance)
    }

    fn backspace(&mut self) -> Step {
        if self.line.is_empty() {
            return Step::Continue(State::ReadInput);
        }
        self.line.pop();
        self.writer.stage(b"\x1b[1D\x1b[0K");
        self.refresh_hint();
        let _ = self.writer.commit_all();
        Step::Emit(Item::Backspace)
    }

    /// Decode one UTF-8 scalar from the view, waiting for more bytes when it
    /// is only partially buffered.
    fn handle_key(&mut self) -> Step {
        let view = self.view();
        let Some(need) = utf8_len(view[0]) else {
            // Invalid leading byte; drop it.
            self.consume(1);
            return Step::Continue(State::ReadInput);
        };
        if view.len() < need {
            return Step::Continue(State::Advance);
        }
        let Some(key) = decode_char(&view[..need]) else {
            self.consume(1);
            return Step::Continue(State::ReadInput);
        };
        self.consume(need);

        match key {
            '\r' => {
                if self.view().first() == Some(&b'\n') {
                    self.consume(1);
                }
                Step::Continue(State::HandleEnter)
            }
            '\n' => Step::Continue(State::HandleEnter),
            c if (c as u32) >= 32 => self.add_to_line(c),
            _ => Step::Continue(State::ReadInput),
        }
    }

    fn add_to_line(&mut self, c: char) -> Step {
        self.line.push(c);
        self.writer.stage_char(c);
        self.refresh_hint();
        let _ = self.writer.commit_all();
        Step::Continue(State::ReadInput)
    }

    fn refresh_hint(&mut self) {
        let Some(hook) = self.hint_hook.as_mut() else {
            return;
        };
        let line: String = self.line.iter().collect();
        let hint = if line.is_empty() { None } else { hook(&line) };
        // Stale suggestion text right of the cursor is cleared either way; a
        // fresh one is painted when the hook produced it.
        self.stage_hint(hint.as_deref().unwrap_or(""));
    }

    fn handle_enter(&mut self) -> Step {
        let line: String = self.line.iter().collect();
        self.line.clear();
        self.writer.stage(b"\x1b[0K\r\n");
        if let Err(err) = self.writer.commit_all() {
            trace!(target: "term.reader", error = %err, "echo failed on submit");
        }
        Step::Emit(Item::LineSubmitted(line))
    }

    /// Bracketed paste: append printable content to the line until the end
    /// marker arrives. No items are produced while pasting.
    fn read_paste(&mut self) -> Step {
        loop {
            let view = self.view();
            if view.is_empty() {
                let _ = self.writer.commit_all();
                return Step::Continue(State::Advance);
            }
            if view[0] == KEY_ESCAPE {
                let probe = view.len().min(PASTE_END.len());
                if view[..probe] == PASTE_END[..probe] {
                    if probe == PASTE_END.len() {
                        self.consume(PASTE_END.len());
                        self.paste_mode = false;
                        let _ = self.writer.commit_all();
                        return Step::Continue(State::ReadInput);
                    }
                    let _ = self.writer.commit_all();
                    return Step::Continue(State::Advance);
                }
                self.consume(1);
                continue;
            }
            let Some(need) = utf8_len(view[0]) else {
                self.consume(1);
                continue;
            };
            if view.len() < need {
                let _ = self.writer.commit_all();
                return Step::Continue(State::Advance);
            }
            let Some(c) = decode_char(&view[..need]) else {
                self.consume(1);
                continue;
            };
            self.consume(need);
            if (c as u32) >= 32 {
                self.line.push(c);
                self.writer.stage_char(c);
            }
        }
    }
}

fn utf8_len(leading: u8) -> Option<usize> {
    match leading {
        0x00..=0x7F => Some(1),
        0xC0..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF7 => Some(4),
        _ => None,
    }
}

fn decode_char(bytes: &[u8]) -> Option<char> {
    std::str::from_utf8(bytes).ok().and_then(|s| s.chars().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::SharedBuf;
    use std::io::Cursor;

    fn reader_over(bytes: &[u8]) -> (TermReader, SharedBuf) {
        let buf = SharedBuf::default();
        let writer = TermWriter::new(Box::new(buf.clone()));
        let mut reader = TermReader::new(Box::new(Cursor::new(bytes.to_vec())), writer);
        reader.set_prompt("$ ");
        (reader, buf)
    }

    fn items(reader: &mut TermReader) -> Vec<Item> {
        let mut out = Vec::new();
        loop {
            let item = reader.next_item();
            let done = item == Item::Eof || matches!(item, Item::Error(_));
            out.push(item);
            if done {
                return out;
            }
        }
    }

    #[test]
    fn submits_typed_line() {
        let (mut reader, buf) = reader_over(b"echo hi\r");
        assert_eq!(
            items(&mut reader),
            vec![Item::LineSubmitted("echo hi".to_string()), Item::Eof]
        );
        let echoed = String::from_utf8(buf.contents()).unwrap();
        assert!(echoed.starts_with("echo hi"), "typed chars are echoed");
        assert!(echoed.ends_with("\r\n"));
    }

    #[test]
    fn crlf_counts_as_one_enter() {
        let (mut reader, _) = reader_over(b"a\r\nb\r");
        assert_eq!(
            items(&mut reader),
            vec![
                Item::LineSubmitted("a".to_string()),
                Item::LineSubmitted("b".to_string()),
                Item::Eof
            ]
        );
    }

    #[test]
    fn empty_enter_submits_empty_line() {
        let (mut reader, _) = reader_over(b"\r");
        assert_eq!(
            reader.next_item(),
            Item::LineSubmitted(String::new()),
            "bare enter submits the empty string"
        );
    }

    #[test]
    fn control_keys_classify() {
        let (mut reader, _) = reader_over(b"\x03\x09\x0c\x10\x0e\x1b[A\x1b[B");
        assert_eq!(
            items(&mut reader),
            vec![
                Item::CtrlC,
                Item::Tab,
                Item::CtrlL,
                Item::Up,
                Item::Down,
                Item::Up,
                Item::Down,
                Item::Eof
            ]
        );
    }

    #[test]
    fn backspace_edits_line_and_echoes_erase() {
        let (mut reader, buf) = reader_over(b"ab\x7f\r");
        let mut saw_backspace = false;
        loop {
            match reader.next_item() {
                Item::Backspace => saw_backspace = true,
                Item::LineSubmitted(line) => {
                    assert_eq!(line, "a");
                    break;
                }
                other => panic!("unexpected item {other:?}"),
            }
        }
        assert!(saw_backspace);
        let echoed = String::from_utf8(buf.contents()).unwrap();
        assert!(echoed.contains("\x1b[1D\x1b[0K"), "erase sequence emitted");
    }

    #[test]
    fn backspace_on_empty_line_is_silent() {
        let (mut reader, _) = reader_over(b"\x7f\r");
        assert_eq!(reader.next_item(), Item::LineSubmitted(String::new()));
    }

    #[test]
    fn multibyte_rune_split_across_reads() {
        // One byte per read forces the partial-rune path through Advance.
        struct OneByte(Cursor<Vec<u8>>);
        impl Read for OneByte {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                let len = 1.min(buf.len());
                self.0.read(&mut buf[..len])
            }
        }

        let buf = SharedBuf::default();
        let writer = TermWriter::new(Box::new(buf.clone()));
        let source = OneByte(Cursor::new("héllo\r".as_bytes().to_vec()));
        let mut reader = TermReader::new(Box::new(source), writer);
        assert_eq!(reader.next_item(), Item::LineSubmitted("héllo".to_string()));
    }

    #[test]
    fn replace_with_repaints_prompt_and_content() {
        let (mut reader, buf) = reader_over(b"");
        reader.replace_with("echo old").unwrap();
        assert_eq!(reader.line(), "echo old");
        let painted = String::from_utf8(buf.contents()).unwrap();
        assert_eq!(painted, "\r\x1b[K$ echo old");
    }

    #[test]
    fn hint_hook_paints_dimmed_suffix() {
        let (mut reader, buf) = reader_over(b"ec\r");
        reader.set_hint_hook(Box::new(|line: &str| {
            "echo".strip_prefix(line).map(|rest| rest.to_string())
        }));
        assert_eq!(reader.next_item(), Item::LineSubmitted("ec".to_string()));
        let painted = String::from_utf8(buf.contents()).unwrap();
        assert!(painted.contains("\x1b[90mho\x1b[2D\x1b[0m"), "got: {painted:?}");
    }

    #[test]
    fn suggest_paints_and_restores_cursor() {
        let (mut reader, buf) = reader_over(b"");
        reader.suggest("int").unwrap();
        assert_eq!(
            buf.contents(),
            b"\x1b[0K\x1b[90mint\x1b[3D\x1b[0m".to_vec(),
            "clear right, dim text, move back, restore color"
        );
    }

    #[test]
    fn bracketed_paste_appends_without_items() {
        let (mut reader, _) = reader_over(b"\x1b[200~hi there\x1b[201~\r");
        assert_eq!(
            reader.next_item(),
            Item::LineSubmitted("hi there".to_string())
        );
    }

    #[test]
    fn read_error_surfaces_and_terminates() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("tty gone"))
            }
        }
        let writer = TermWriter::new(Box::new(SharedBuf::default()));
        let mut reader = TermReader::new(Box::new(Broken), writer);
        assert!(matches!(reader.next_item(), Item::Error(_)));
        assert_eq!(reader.next_item(), Item::Eof, "machine stays terminated");
    }

    #[test]
    fn eof_without_bytes() {
        let (mut reader, _) = reader_over(b"");
        assert_eq!(reader.next_item(), Item::Eof);
    }
}
