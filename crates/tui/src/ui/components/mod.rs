//! UI components: channel view, Direct Messages modal, shared input widgets.

pub mod channel;
pub mod common;
pub mod component;
pub mod direct_channels;

pub use channel::ChannelComponent;
pub use component::*;
pub use direct_channels::DirectChannelsComponent;
