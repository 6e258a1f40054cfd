//! Entity modules.

mod admin;
mod catalog;
mod character;
mod scenario;
mod session;
mod story;
mod user;

pub use admin::Admin;
pub use catalog::{CatalogEntry, CatalogKind};
pub use character::{Character, CharacterAbility, CharacterItem};
pub use scenario::Scenario;
pub use session::{
    ChoiceRecord, HistoryStep, PlayMode, PlaySession, SessionStatus, StorySession,
};
pub use story::{Choice, Moment, Story};
pub use user::User;
