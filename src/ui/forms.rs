use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::Child;

/// Single-field form used by both the add dialog and the rename dialog.
#[derive(Default, Clone)]
pub(crate) struct NameForm {
    pub(crate) name: String,
    pub(crate) error: Option<String>,
}

impl NameForm {
    /// Pre-fill the form with the current name when renaming.
    pub(crate) fn from_child(child: &Child) -> Self {
        Self {
            name: child.name.clone(),
            error: None,
        }
    }

    /// Append a character, ignoring control keys.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.name.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.name.pop();
    }

    pub(crate) fn build_line(&self, field_name: &str) -> Line<'static> {
        let (display, style) = if self.name.is_empty() {
            ("<required>".to_string(), Style::default().fg(Color::DarkGray))
        } else {
            (self.name.clone(), Style::default().fg(Color::Yellow))
        };

        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(display, style),
        ])
    }

    pub(crate) fn value_len(&self) -> usize {
        self.name.chars().count()
    }
}

/// Pending removal waiting for a yes/no answer.
#[derive(Clone)]
pub(crate) struct ConfirmRemove {
    pub(crate) name: String,
    pub(crate) rating: i64,
}

impl From<&Child> for ConfirmRemove {
    fn from(child: &Child) -> Self {
        Self {
            name: child.name.clone(),
            rating: child.rating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_char_skips_control_characters() {
        let mut form = NameForm::default();
        assert!(form.push_char('K'));
        assert!(!form.push_char('\u{7}'));
        assert!(form.push_char('ö'));
        assert_eq!(form.name, "Kö");
        assert_eq!(form.value_len(), 2);

        form.backspace();
        assert_eq!(form.name, "K");
    }

    #[test]
    fn rename_form_starts_with_current_name() {
        let form = NameForm::from_child(&Child::with_rating("Rudolph", 88));
        assert_eq!(form.name, "Rudolph");
        assert!(form.error.is_none());
    }
}
