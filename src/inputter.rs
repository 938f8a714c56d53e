use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

/// Single line text input for the command line. The cursor counts chars,
/// not bytes.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    curser_pos: usize,
    finished: bool,
    canceled: bool,
    changed: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    /// The text differs from before the last key.
    pub changed: bool,
    pub curser_pos: usize,
}

impl Inputter {
    pub fn read(&mut self, key: KeyEvent) -> InputResult {
        self.changed = false;
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => self.finished = true,
            (KeyCode::Esc, _) => self.escape(),
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Left, _) => self.curser_pos = self.curser_pos.saturating_sub(1),
            (KeyCode::Right, _) => self.curser_pos = (self.curser_pos + 1).min(self.len()),
            (KeyCode::Home, _) => self.curser_pos = 0,
            (KeyCode::End, _) => self.curser_pos = self.len(),
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => self.kill_line(),
            (KeyCode::Char(chr), m) if !m.contains(KeyModifiers::CONTROL) => self.insert(chr),
            (kc, km) => trace!("Ignored input key {kc:?} {km:?}"),
        }
        self.get()
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            input: self.current_input.clone(),
            finished: self.finished,
            canceled: self.canceled,
            changed: self.changed,
            curser_pos: self.curser_pos,
        }
    }

    /// Start over with `s` as the text, cursor at its end.
    pub fn set(&mut self, s: &str) {
        self.clear();
        self.current_input = s.to_string();
        self.curser_pos = self.len();
    }

    pub fn clear(&mut self) {
        self.current_input.clear();
        self.curser_pos = 0;
        self.finished = false;
        self.canceled = false;
        self.changed = false;
    }

    fn len(&self) -> usize {
        self.current_input.chars().count()
    }

    fn escape(&mut self) {
        self.changed = !self.current_input.is_empty();
        self.current_input.clear();
        self.curser_pos = 0;
        self.canceled = true;
        self.finished = true;
    }

    fn insert(&mut self, chr: char) {
        let at = self.byte_pos(self.curser_pos);
        self.current_input.insert(at, chr);
        self.curser_pos += 1;
        self.changed = true;
    }

    fn backspace(&mut self) {
        if self.curser_pos > 0 {
            let at = self.byte_pos(self.curser_pos - 1);
            self.current_input.remove(at);
            self.curser_pos -= 1;
            self.changed = true;
        }
    }

    fn delete(&mut self) {
        if self.curser_pos < self.len() {
            let at = self.byte_pos(self.curser_pos);
            self.current_input.remove(at);
            self.changed = true;
        }
    }

    fn kill_line(&mut self) {
        self.changed = !self.current_input.is_empty();
        self.current_input.clear();
        self.curser_pos = 0;
    }

    fn byte_pos(&self, char_pos: usize) -> usize {
        self.current_input
            .char_indices()
            .nth(char_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(input: &mut Inputter, s: &str) -> InputResult {
        let mut last = input.get();
        for c in s.chars() {
            last = input.read(key(KeyCode::Char(c)));
        }
        last
    }

    #[test]
    fn typing_marks_changes() {
        let mut input = Inputter::default();
        let res = type_str(&mut input, "äb");
        assert_eq!(res.input, "äb");
        assert!(res.changed);
        assert_eq!(res.curser_pos, 2);
        let res = input.read(key(KeyCode::Left));
        assert!(!res.changed);
    }

    #[test]
    fn backspace_removes_char_before_cursor() {
        let mut input = Inputter::default();
        type_str(&mut input, "añc");
        input.read(key(KeyCode::Left));
        let res = input.read(key(KeyCode::Backspace));
        assert_eq!(res.input, "ac");
        assert_eq!(res.curser_pos, 1);
        let res = input.read(key(KeyCode::Delete));
        assert_eq!(res.input, "a");
    }

    #[test]
    fn enter_and_escape() {
        let mut input = Inputter::default();
        type_str(&mut input, "x");
        let res = input.read(key(KeyCode::Enter));
        assert!(res.finished && !res.canceled);
        assert_eq!(res.input, "x");

        input.set("query");
        let res = input.read(key(KeyCode::Esc));
        assert!(res.finished && res.canceled && res.changed);
        assert!(res.input.is_empty());
    }

    #[test]
    fn control_keys_do_not_insert() {
        let mut input = Inputter::default();
        type_str(&mut input, "abc");
        let res = input.read(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(res.input, "");
        let res = input.read(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL));
        assert_eq!(res.input, "");
        assert!(!res.changed);
    }
}
