/// Typewriter reveal over a dialogue line. Ticked with the frame dt;
/// characters appear at a fixed rate until the line is complete or the
/// player skips ahead.
#[derive(Debug)]
pub(crate) struct DialogueBox {
    full_text: String,
    chars_per_sec: f32,
    revealed_chars: f32,
    total_chars: usize,
}

impl DialogueBox {
    pub(crate) fn new(text: impl Into<String>, chars_per_sec: f32) -> Self {
        let full_text = text.into();
        let total_chars = full_text.chars().count();
        Self {
            full_text,
            chars_per_sec,
            revealed_chars: 0.0,
            total_chars,
        }
    }

    /// Advances the reveal. Returns true on the tick the line completes.
    pub(crate) fn tick(&mut self, dt_seconds: f32) -> bool {
        if self.is_complete() || dt_seconds <= 0.0 {
            return false;
        }
        self.revealed_chars =
            (self.revealed_chars + self.chars_per_sec * dt_seconds).min(self.total_chars as f32);
        self.is_complete()
    }

    pub(crate) fn complete_now(&mut self) {
        self.revealed_chars = self.total_chars as f32;
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.revealed_chars as usize >= self.total_chars
    }

    pub(crate) fn full_text(&self) -> &str {
        &self.full_text
    }

    pub(crate) fn visible_text(&self) -> &str {
        let visible = (self.revealed_chars as usize).min(self.total_chars);
        match self.full_text.char_indices().nth(visible) {
            Some((byte_offset, _)) => &self.full_text[..byte_offset],
            None => &self.full_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reveals_characters_at_the_configured_rate() {
        let mut dialogue = DialogueBox::new("hello world", 10.0);
        assert_eq!(dialogue.visible_text(), "");

        dialogue.tick(0.5);
        assert_eq!(dialogue.visible_text(), "hello");
        assert!(!dialogue.is_complete());

        let completed = dialogue.tick(0.6);
        assert!(completed);
        assert_eq!(dialogue.visible_text(), "hello world");
    }

    #[test]
    fn complete_now_skips_to_the_full_line() {
        let mut dialogue = DialogueBox::new("a longer line of dialogue", 5.0);
        dialogue.tick(0.1);
        dialogue.complete_now();
        assert!(dialogue.is_complete());
        assert_eq!(dialogue.visible_text(), dialogue.full_text());
    }

    #[test]
    fn completion_is_reported_exactly_once() {
        let mut dialogue = DialogueBox::new("hi", 100.0);
        assert!(dialogue.tick(1.0));
        assert!(!dialogue.tick(1.0));
    }

    #[test]
    fn partial_reveal_respects_multibyte_characters() {
        let mut dialogue = DialogueBox::new("¿Tu hablas español?", 1.0);
        dialogue.tick(1.0);
        assert_eq!(dialogue.visible_text(), "¿");
    }
}
