use murmur_types::{DirectChannelsRequest, Effect, UserProfile};
use rat_focus::{FocusBuilder, FocusFlag, HasFocus};
use ratatui::layout::Rect;

/// Focus name of the "Direct Messages" button; the modal hands focus back to it.
pub const DIRECT_MESSAGES_FOCUS: &str = "channel.direct_messages";

/// State for the home route: where the user is and what they can open from there.
#[derive(Debug, Clone)]
pub struct ChannelViewState {
    pub container_focus: FocusFlag,
    pub f_direct_messages: FocusFlag,
    /// Members of the conversation last opened from the modal, acting user included.
    pub current_members: Vec<UserProfile>,
    pub last_area: Rect,
    pub button_area: Rect,
}

impl Default for ChannelViewState {
    fn default() -> Self {
        Self {
            container_focus: FocusFlag::named("channel"),
            f_direct_messages: FocusFlag::named(DIRECT_MESSAGES_FOCUS),
            current_members: Vec::new(),
            last_area: Rect::default(),
            button_area: Rect::default(),
        }
    }
}

impl ChannelViewState {
    pub fn focus_flags(&self) -> Vec<FocusFlag> {
        vec![self.f_direct_messages.clone()]
    }

    /// `true` when the current location is a conversation opened from the modal.
    pub fn in_conversation(&self) -> bool {
        !self.current_members.is_empty()
    }

    /// Options for a fresh Direct Messages modal.
    pub fn direct_messages_request(&self) -> DirectChannelsRequest {
        DirectChannelsRequest {
            focus_origin: Some(DIRECT_MESSAGES_FOCUS.to_string()),
            existing_members: Vec::new(),
            on_exit: vec![Effect::Log("Direct Messages closed".to_string())],
        }
    }

    /// Options for adding people to the current conversation.
    pub fn add_people_request(&self) -> Option<DirectChannelsRequest> {
        self.in_conversation().then(|| DirectChannelsRequest {
            existing_members: self.current_members.clone(),
            ..self.direct_messages_request()
        })
    }
}

impl HasFocus for ChannelViewState {
    fn build(&self, builder: &mut FocusBuilder) {
        let tag = builder.start(self);
        builder.leaf_widget(&self.f_direct_messages);
        builder.end(tag);
    }

    fn focus(&self) -> FocusFlag {
        self.container_focus.clone()
    }

    fn area(&self) -> Rect {
        self.last_area
    }
}
