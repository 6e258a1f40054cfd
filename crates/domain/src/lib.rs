//! Taleforge domain types.
//!
//! Entity structs, typed IDs and the structured document types stored in
//! JSON columns. No I/O lives here.

pub mod entities;
pub mod ids;

pub use entities::{
    Admin, CatalogEntry, CatalogKind, Character, CharacterAbility, CharacterItem, Choice,
    ChoiceRecord, HistoryStep, Moment, PlayMode, PlaySession, Scenario, SessionStatus, Story,
    StorySession, User,
};

pub use ids::{
    AdminId, CharacterId, ChoiceId, DifficultyId, GenreId, ModeId, MomentId, ScenarioId,
    SessionId, StoryId, UserId,
};
