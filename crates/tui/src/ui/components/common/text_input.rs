//! UTF-8 safe text buffer with cursor management.
//!
//! The buffer is the editing primitive behind [`super::InputFieldState`]; it
//! knows nothing about labels or validation.

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextInputState {
    /// The underlying text buffer
    input: String,
    /// Cursor byte index into `input` (always on a UTF-8 boundary)
    cursor: usize,
}

impl TextInputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Number of scalar values before the cursor (the cursor column for narrow text).
    pub fn cursor_chars(&self) -> usize {
        self.input[..self.cursor].chars().count()
    }

    /// Replace the buffer and place the cursor at its end.
    pub fn set_input<S: Into<String>>(&mut self, s: S) {
        self.input = s.into();
        self.cursor = self.input.len();
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.cursor = 0;
    }

    pub fn move_left(&mut self) {
        if let Some(prev) = self.input[..self.cursor].chars().next_back() {
            self.cursor -= prev.len_utf8();
        }
    }

    pub fn move_right(&mut self) {
        if let Some(next) = self.input[self.cursor..].chars().next() {
            self.cursor += next.len_utf8();
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.input.len();
    }

    pub fn insert_char(&mut self, c: char) {
        self.input.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    /// Remove the char immediately before the cursor. Returns `false` at the start of the buffer.
    pub fn backspace(&mut self) -> bool {
        let Some(prev) = self.input[..self.cursor].chars().next_back() else {
            return false;
        };
        let start = self.cursor - prev.len_utf8();
        self.input.drain(start..self.cursor);
        self.cursor = start;
        true
    }

    /// Remove the char under the cursor. Returns `false` at the end of the buffer.
    pub fn delete(&mut self) -> bool {
        let Some(next) = self.input[self.cursor..].chars().next() else {
            return false;
        };
        self.input.drain(self.cursor..self.cursor + next.len_utf8());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_move_insert_backspace() {
        let mut st = TextInputState::new();
        st.set_input("h🙂llo");
        st.move_home();
        st.move_right();
        st.insert_char('e');
        assert_eq!(st.input(), "he🙂llo");
        st.move_right();
        assert!(st.backspace());
        assert_eq!(st.input(), "hello");
        assert_eq!(st.cursor_chars(), 2);
        st.move_home();
        assert!(!st.backspace());
        assert!(st.delete());
        assert_eq!(st.input(), "ello");
    }

    #[test]
    fn clear_empties_multibyte_input() {
        let mut st = TextInputState::new();
        st.set_input("né🙂");
        assert_eq!(st.input().len(), 7);
        st.clear();
        assert!(st.is_empty());
        assert_eq!(st.cursor(), 0);
    }
}
