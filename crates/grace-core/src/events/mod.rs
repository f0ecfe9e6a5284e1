//! Change events emitted after committed writes

mod domain_event;

pub use domain_event::{
    CommentAddedEvent, CommunityEvent, PostCreatedEvent, ReactionChangedEvent,
};
