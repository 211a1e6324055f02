mod debounce;
mod input_field;

pub mod text_input;

pub use debounce::Debouncer;
pub use input_field::{INPUT_FIELD_HEIGHT, InputFieldState, render_input_field};
pub use text_input::TextInputState;
