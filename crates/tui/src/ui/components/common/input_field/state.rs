//! Labeled text input with validation.
//!
//! The field derives at most one [`StatusMessage`] at a time. While focused no
//! validation runs; losing focus evaluates an ordered rule chain where the
//! first rule that reports a status wins:
//!
//! 1. the caller-supplied validator,
//! 2. `required` with an empty value,
//! 3. a configured `limit` that is exceeded,
//! 4. a configured `min_length` that is not met (an empty value counts).
//!
//! A caller-supplied message takes precedence over the derived one until the
//! caller clears it or the user types. Typing clears both. A programmatic
//! value change while unfocused clears an active error and re-validates
//! non-empty values, so errors never linger after the caller fills the field
//! itself.
//!
//! Callers may also force the error styling without a message, or disable
//! the field, which then ignores focus and user edits.

use std::fmt;
use std::rc::Rc;

use murmur_types::{StatusKind, StatusMessage};

use crate::ui::components::common::TextInputState;

/// Caller-supplied validation hook; `None` means "no opinion".
pub type Validator = Rc<dyn Fn(&str) -> Option<StatusMessage>>;

type Rule<'a> = Box<dyn Fn(&str) -> Option<StatusMessage> + 'a>;

pub const REQUIRED_MESSAGE: &str = "This field is required";

pub fn max_length_message(limit: usize) -> String {
    format!("Must be no more than {limit} characters")
}

pub fn min_length_message(min_length: usize) -> String {
    format!("Must be at least {min_length} characters")
}

#[derive(Clone, Default)]
pub struct InputFieldState {
    label: Option<String>,
    placeholder: Option<String>,
    required: bool,
    limit: Option<usize>,
    min_length: Option<usize>,
    clearable: bool,
    forced_error: bool,
    disabled: bool,
    validator: Option<Validator>,

    text: TextInputState,
    focused: bool,
    derived: Option<StatusMessage>,
    custom: Option<StatusMessage>,
}

impl fmt::Debug for InputFieldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputFieldState")
            .field("label", &self.label)
            .field("value", &self.text.input())
            .field("focused", &self.focused)
            .field("disabled", &self.disabled)
            .field("derived", &self.derived)
            .field("custom", &self.custom)
            .finish_non_exhaustive()
    }
}

impl InputFieldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    pub fn clearable(mut self, clearable: bool) -> Self {
        self.clearable = clearable;
        self
    }

    /// Draw the field in its error style even when no message is showing.
    pub fn with_error(mut self, forced: bool) -> Self {
        self.forced_error = forced;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        if disabled {
            self.focused = false;
        }
        self
    }

    pub fn with_validator(mut self, validator: impl Fn(&str) -> Option<StatusMessage> + 'static) -> Self {
        self.validator = Some(Rc::new(validator));
        self
    }

    pub fn value(&self) -> &str {
        self.text.input()
    }

    pub fn text(&self) -> &TextInputState {
        &self.text
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// The message on display: the caller's, else the derived one.
    pub fn message(&self) -> Option<&StatusMessage> {
        self.custom.as_ref().or(self.derived.as_ref())
    }

    pub fn has_error(&self) -> bool {
        self.message().is_some_and(StatusMessage::is_error)
    }

    /// Whether the border uses the error color: forced by the caller or an error is showing.
    pub fn shows_error_style(&self) -> bool {
        self.forced_error || self.has_error()
    }

    fn clear_messages(&mut self) {
        self.derived = None;
        self.custom = None;
    }

    pub fn focus_gained(&mut self) {
        self.focused = !self.disabled;
    }

    pub fn focus_lost(&mut self) {
        self.focused = false;
        self.validate();
    }

    /// Apply a user edit to the buffer; any active message is cleared.
    /// Disabled fields ignore edits.
    pub fn edit(&mut self, apply: impl FnOnce(&mut TextInputState)) {
        if self.disabled {
            return;
        }
        let before = self.text.input().to_string();
        apply(&mut self.text);
        if self.text.input() != before {
            self.clear_messages();
        }
    }

    pub fn insert_char(&mut self, c: char) {
        self.edit(|text| text.insert_char(c));
    }

    pub fn backspace(&mut self) {
        self.edit(|text| {
            text.backspace();
        });
    }

    /// The clear affordance: empties the value as a user edit.
    pub fn clear(&mut self) {
        self.edit(TextInputState::clear);
    }

    /// Replace the value from code (not typing).
    ///
    /// While unfocused with an error showing, the error is dropped and the
    /// chain re-runs for non-empty values.
    pub fn set_value(&mut self, value: impl Into<String>) {
        let value = value.into();
        if value == self.text.input() {
            return;
        }
        self.text.set_input(value);
        if !self.focused && self.has_error() {
            self.clear_messages();
            if !self.text.is_empty() {
                self.validate();
            }
        }
    }

    /// Adopt a caller-supplied message. `None` or an empty text clears the active message.
    pub fn set_custom_message(&mut self, message: Option<StatusMessage>) {
        self.custom = message.filter(|message| !message.text.is_empty());
    }

    /// Run the rule chain against the current value and return what is now on display.
    pub fn validate(&mut self) -> Option<&StatusMessage> {
        let outcome = {
            let value = self.text.input();
            self.rule_chain().iter().find_map(|rule| rule(value))
        };
        self.derived = outcome;
        self.message()
    }

    fn rule_chain(&self) -> Vec<Rule<'_>> {
        let mut rules: Vec<Rule<'_>> = Vec::with_capacity(4);
        if let Some(validator) = self.validator.as_ref() {
            rules.push(Box::new(move |value: &str| validator(value)));
        }
        if self.required {
            rules.push(Box::new(|value: &str| value.is_empty().then(|| StatusMessage::error(REQUIRED_MESSAGE))));
        }
        if let Some(limit) = self.limit.filter(|limit| *limit > 0) {
            rules.push(Box::new(move |value: &str| {
                (value.chars().count() > limit).then(|| StatusMessage::error(max_length_message(limit)))
            }));
        }
        if let Some(min_length) = self.min_length.filter(|min| *min > 0) {
            rules.push(Box::new(move |value: &str| {
                (value.chars().count() < min_length).then(|| StatusMessage::error(min_length_message(min_length)))
            }));
        }
        rules
    }

    /// Legend (floating label) is shown while focused or holding a value.
    pub fn show_legend(&self) -> bool {
        self.focused || !self.text.is_empty()
    }

    pub fn show_clear_button(&self) -> bool {
        self.clearable && !self.disabled && !self.text.is_empty()
    }

    /// Text for the legend: the label, falling back to the placeholder.
    pub fn legend(&self) -> Option<&str> {
        self.label.as_deref().or(self.placeholder.as_deref())
    }

    /// Placeholder shown inside the empty input.
    ///
    /// Focused fields prefer the placeholder (the label already moved into the
    /// legend); unfocused ones show the label.
    pub fn placeholder_text(&self) -> Option<&str> {
        if self.focused {
            match (self.label.as_deref(), self.placeholder.as_deref()) {
                (Some(_), Some(placeholder)) => Some(placeholder),
                (label, _) => label,
            }
        } else {
            self.label.as_deref().or(self.placeholder.as_deref())
        }
    }

    pub fn message_kind(&self) -> Option<StatusKind> {
        self.message().map(|message| message.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(field: &mut InputFieldState, text: &str) {
        text.chars().for_each(|c| field.insert_char(c));
    }

    #[test]
    fn required_empty_value_fails_on_blur() {
        let mut field = InputFieldState::new().with_label("Name").required(true);
        field.focus_gained();
        assert!(field.message().is_none());
        field.focus_lost();
        assert_eq!(field.message(), Some(&StatusMessage::error(REQUIRED_MESSAGE)));
    }

    #[test]
    fn custom_validator_wins_over_builtin_rules() {
        let mut field = InputFieldState::new()
            .required(true)
            .with_min_length(3)
            .with_validator(|_| Some(StatusMessage::warning("Looks odd")));
        field.focus_lost();
        assert_eq!(field.message(), Some(&StatusMessage::warning("Looks odd")));
        assert!(!field.has_error());
    }

    #[test]
    fn validator_without_opinion_falls_through() {
        let mut field = InputFieldState::new().required(true).with_validator(|_| None);
        field.focus_lost();
        assert_eq!(field.message().map(|m| m.text.as_str()), Some(REQUIRED_MESSAGE));
    }

    #[test]
    fn min_length_and_limit_rules() {
        let mut field = InputFieldState::new().with_min_length(3);
        field.set_value("ab");
        field.focus_lost();
        assert_eq!(field.message(), Some(&StatusMessage::error("Must be at least 3 characters")));

        let mut field = InputFieldState::new().with_limit(5);
        field.set_value("abcdef");
        field.focus_lost();
        assert_eq!(field.message(), Some(&StatusMessage::error("Must be no more than 5 characters")));

        field.focus_gained();
        field.backspace();
        assert!(field.message().is_none());
    }

    #[test]
    fn required_takes_precedence_over_min_length() {
        let mut field = InputFieldState::new().required(true).with_min_length(3);
        field.focus_lost();
        assert_eq!(field.message().map(|m| m.text.as_str()), Some(REQUIRED_MESSAGE));
        // Empty values still fail the minimum length when not required.
        let mut field = InputFieldState::new().with_min_length(3);
        field.focus_lost();
        assert_eq!(field.message().map(|m| m.text.as_str()), Some("Must be at least 3 characters"));
    }

    #[test]
    fn length_is_measured_in_scalar_values() {
        let mut field = InputFieldState::new().with_limit(3);
        field.set_value("🙂🙂🙂");
        field.focus_lost();
        assert!(field.message().is_none());
    }

    #[test]
    fn programmatic_change_revalidates_stale_error() {
        let mut field = InputFieldState::new().required(true).with_min_length(3);
        field.focus_lost();
        assert!(field.has_error());

        field.set_value("alice");
        assert!(field.message().is_none());

        field.set_value("al");
        assert!(field.message().is_none(), "no error active, nothing to revalidate");
        field.focus_lost();
        assert!(field.has_error());
        field.set_value("");
        assert!(field.message().is_none(), "empty values are not revalidated");
    }

    #[test]
    fn custom_message_is_adopted_and_cleared() {
        let mut field = InputFieldState::new();
        field.set_custom_message(Some(StatusMessage::info("Searching")));
        assert_eq!(field.message_kind(), Some(StatusKind::Info));
        field.set_custom_message(Some(StatusMessage::info("")));
        assert!(field.message().is_none());
        field.set_custom_message(Some(StatusMessage::error("Search failed")));
        field.set_custom_message(None);
        assert!(field.message().is_none());
    }

    #[test]
    fn custom_message_survives_a_passing_blur() {
        let mut field = InputFieldState::new().required(true);
        field.set_value("ada");
        field.set_custom_message(Some(StatusMessage::error("Search failed")));
        field.focus_gained();
        field.focus_lost();
        assert_eq!(field.message(), Some(&StatusMessage::error("Search failed")));

        field.set_custom_message(None);
        assert!(field.message().is_none());
    }

    #[test]
    fn typing_clears_any_message() {
        let mut field = InputFieldState::new();
        field.set_custom_message(Some(StatusMessage::error("Search failed")));
        field.focus_gained();
        typed(&mut field, "b");
        assert!(field.message().is_none());
        assert_eq!(field.value(), "b");
    }

    #[test]
    fn forced_error_styles_without_a_message() {
        let mut field = InputFieldState::new().with_error(true);
        assert!(field.shows_error_style());
        assert!(!field.has_error());
        assert!(field.message().is_none());
        field.focus_lost();
        assert!(field.message().is_none(), "forcing the style adds no message");

        let plain = InputFieldState::new().required(true);
        assert!(!plain.shows_error_style());
    }

    #[test]
    fn disabled_field_ignores_focus_and_edits() {
        let mut field = InputFieldState::new().clearable(true).disabled(true);
        field.set_value("ada");
        field.focus_gained();
        assert!(!field.is_focused());
        typed(&mut field, "x");
        field.backspace();
        field.clear();
        assert_eq!(field.value(), "ada");
        assert!(!field.show_clear_button());

        let mut field = InputFieldState::new().disabled(false);
        typed(&mut field, "x");
        assert_eq!(field.value(), "x");
    }

    #[test]
    fn presentation_follows_focus_and_value() {
        let mut field = InputFieldState::new()
            .with_label("Search")
            .with_placeholder("Type a name")
            .clearable(true);
        assert!(!field.show_legend());
        assert!(!field.show_clear_button());
        assert_eq!(field.placeholder_text(), Some("Search"));

        field.focus_gained();
        assert!(field.show_legend());
        assert_eq!(field.placeholder_text(), Some("Type a name"));

        typed(&mut field, "al");
        assert!(field.show_clear_button());
        field.clear();
        assert_eq!(field.value(), "");

        let label_only = InputFieldState::new().with_label("Search");
        let mut focused = label_only.clone();
        focused.focus_gained();
        assert_eq!(focused.placeholder_text(), Some("Search"));
        assert_eq!(label_only.legend(), Some("Search"));
    }
}
