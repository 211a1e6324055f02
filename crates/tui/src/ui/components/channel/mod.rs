mod channel_component;
mod state;

pub use channel_component::ChannelComponent;
pub use state::{ChannelViewState, DIRECT_MESSAGES_FOCUS};
