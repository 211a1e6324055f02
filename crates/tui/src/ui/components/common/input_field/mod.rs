mod input_field_view;
mod state;

pub use input_field_view::{INPUT_FIELD_HEIGHT, render_input_field};
pub use state::InputFieldState;
