use unicode_width::UnicodeWidthStr;

/// Single-line input with the cursor pinned to the end
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    text: String,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn insert(&mut self, c: char) {
        if !c.is_control() {
            self.text.push(c);
        }
    }

    pub fn insert_str(&mut self, s: &str) {
        // Pasted newlines become spaces
        for c in s.chars() {
            self.insert(if c == '\n' || c == '\r' { ' ' } else { c });
        }
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }

    /// Drop the last word, like Ctrl+W in a shell
    pub fn delete_word(&mut self) {
        let trimmed = self.text.trim_end().len();
        self.text.truncate(trimmed);
        let cut = self.text.rfind(' ').map(|i| i + 1).unwrap_or(0);
        self.text.truncate(cut);
    }

    pub fn value(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Display columns, for cursor placement
    pub fn width(&self) -> usize {
        self.text.width()
    }
}
