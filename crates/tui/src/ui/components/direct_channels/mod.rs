mod direct_channels_component;
mod selection;
mod state;

pub use direct_channels_component::DirectChannelsComponent;
pub use selection::{ConversationRequest, RecipientSelection, channel_path};
pub use state::DirectChannelsState;
