//! Per-user session reporting: story-mode progress and single/multi play
//! history, with referenced rows resolved into embedded summaries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use taleforge_domain::{
    CatalogKind, CharacterAbility, CharacterItem, ChoiceId, ChoiceRecord, HistoryStep, MomentId,
    PlayMode, SessionId, SessionStatus, StoryId, UserId,
};
use uuid::Uuid;

use crate::infrastructure::ports::{
    CatalogRepo, CharacterRepo, RepoError, ScenarioRepo, SessionRepo, StoryRepo, UserRepo,
};
use crate::use_cases::story_graph::is_ending;

/// Placeholder title for a choice that ends the story.
const STORY_FINISHED: &str = "story finished";
/// Placeholders for a session that has not entered its first moment.
const NOT_STARTED_TITLE: &str = "story not started";
const NOT_STARTED_DESCRIPTION: &str = "no moment in progress";

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

// =============================================================================
// Views
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryRef {
    pub id: StoryId,
    pub title: String,
    pub image_path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextMomentRef {
    pub id: Option<MomentId>,
    pub title: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionChoiceView {
    pub id: ChoiceId,
    pub action_type: String,
    pub next_moment: NextMomentRef,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentMomentView {
    pub id: Option<MomentId>,
    pub title: String,
    pub description: String,
    pub is_ending: bool,
    pub choices: Vec<SessionChoiceView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorySessionView {
    pub id: SessionId,
    pub story: Option<StoryRef>,
    pub current_moment: CurrentMomentView,
    pub progress: f64,
    pub status: SessionStatus,
    pub history: Vec<HistoryStep>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRef {
    pub id: taleforge_domain::ScenarioId,
    pub title: String,
    pub description: String,
    pub image_path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRef {
    pub id: taleforge_domain::CharacterId,
    pub name: String,
    pub role: String,
    pub description: String,
    pub image_path: Option<String>,
    pub items: Vec<CharacterItem>,
    pub ability: CharacterAbility,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaySessionView {
    pub id: SessionId,
    pub play_mode: PlayMode,
    pub scenario: Option<ScenarioRef>,
    pub genre: Option<NamedRef>,
    pub difficulty: Option<NamedRef>,
    pub mode: Option<NamedRef>,
    pub character: Option<CharacterRef>,
    pub choice_history: Vec<ChoiceRecord>,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Use case
// =============================================================================

pub struct SessionReports {
    sessions: Arc<dyn SessionRepo>,
    users: Arc<dyn UserRepo>,
    stories: Arc<dyn StoryRepo>,
    scenarios: Arc<dyn ScenarioRepo>,
    characters: Arc<dyn CharacterRepo>,
    genres: Arc<dyn CatalogRepo>,
    difficulties: Arc<dyn CatalogRepo>,
    modes: Arc<dyn CatalogRepo>,
}

impl SessionReports {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sessions: Arc<dyn SessionRepo>,
        users: Arc<dyn UserRepo>,
        stories: Arc<dyn StoryRepo>,
        scenarios: Arc<dyn ScenarioRepo>,
        characters: Arc<dyn CharacterRepo>,
        genres: Arc<dyn CatalogRepo>,
        difficulties: Arc<dyn CatalogRepo>,
        modes: Arc<dyn CatalogRepo>,
    ) -> Self {
        debug_assert_eq!(genres.kind(), CatalogKind::Genre);
        debug_assert_eq!(difficulties.kind(), CatalogKind::Difficulty);
        debug_assert_eq!(modes.kind(), CatalogKind::Mode);
        Self {
            sessions,
            users,
            stories,
            scenarios,
            characters,
            genres,
            difficulties,
            modes,
        }
    }

    async fn require_user(&self, user_id: UserId) -> Result<(), ReportError> {
        self.users
            .get(user_id)
            .await?
            .ok_or_else(|| ReportError::UserNotFound(user_id.to_string()))?;
        Ok(())
    }

    pub async fn story_sessions(
        &self,
        user_id: UserId,
    ) -> Result<Vec<StorySessionView>, ReportError> {
        self.require_user(user_id).await?;

        let sessions = self.sessions.story_sessions_for_user(user_id).await?;
        let mut views = Vec::with_capacity(sessions.len());
        for session in sessions {
            let story = self.stories.get(session.story_id).await?.map(|s| StoryRef {
                id: s.id,
                title: s.title,
                image_path: s.image_path,
            });

            let current_moment = match session.current_moment_id {
                Some(moment_id) => self.render_current_moment(moment_id).await?,
                None => CurrentMomentView {
                    id: None,
                    title: NOT_STARTED_TITLE.to_string(),
                    description: NOT_STARTED_DESCRIPTION.to_string(),
                    is_ending: false,
                    choices: Vec::new(),
                },
            };

            views.push(StorySessionView {
                id: session.id,
                story,
                current_moment,
                progress: session.progress_pct,
                status: session.status,
                history: session.history,
                start_at: session.start_at,
                end_at: session.end_at,
                updated_at: session.updated_at,
            });
        }

        Ok(views)
    }

    async fn render_current_moment(
        &self,
        moment_id: MomentId,
    ) -> Result<CurrentMomentView, ReportError> {
        let Some(moment) = self.stories.get_moment(moment_id).await? else {
            // A dangling pointer renders like an unstarted session rather
            // than failing the whole report.
            return Ok(CurrentMomentView {
                id: None,
                title: NOT_STARTED_TITLE.to_string(),
                description: NOT_STARTED_DESCRIPTION.to_string(),
                is_ending: false,
                choices: Vec::new(),
            });
        };

        let choices = self.stories.choices_for_moment(moment.id).await?;
        let mut choice_views = Vec::with_capacity(choices.len());
        for choice in &choices {
            let next_moment = match choice.next_moment_id {
                Some(next_id) => NextMomentRef {
                    id: Some(next_id),
                    title: self
                        .stories
                        .get_moment(next_id)
                        .await?
                        .map(|m| m.title)
                        .unwrap_or_else(|| STORY_FINISHED.to_string()),
                },
                None => NextMomentRef {
                    id: None,
                    title: STORY_FINISHED.to_string(),
                },
            };
            choice_views.push(SessionChoiceView {
                id: choice.id,
                action_type: choice.action_type.clone(),
                next_moment,
            });
        }

        Ok(CurrentMomentView {
            id: Some(moment.id),
            title: moment.title,
            description: moment.description,
            is_ending: is_ending(&choices),
            choices: choice_views,
        })
    }

    pub async fn play_sessions(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PlaySessionView>, ReportError> {
        self.require_user(user_id).await?;

        let sessions = self.sessions.play_sessions_for_user(user_id).await?;
        let mut views = Vec::with_capacity(sessions.len());
        for session in sessions {
            let scenario = match session.scenario_id {
                Some(id) => self.scenarios.get(id).await?.map(|s| ScenarioRef {
                    id: s.id,
                    title: s.title,
                    description: s.description,
                    image_path: s.image_path,
                }),
                None => None,
            };
            let character = match session.character_id {
                Some(id) => self.characters.get(id).await?.map(|c| CharacterRef {
                    id: c.id,
                    name: c.name,
                    role: c.role,
                    description: c.description,
                    image_path: c.image_path,
                    items: c.items,
                    ability: c.ability,
                }),
                None => None,
            };

            let genre = self
                .named_ref(&*self.genres, session.genre_id.map(|id| id.to_uuid()))
                .await?;
            let difficulty = self
                .named_ref(
                    &*self.difficulties,
                    session.difficulty_id.map(|id| id.to_uuid()),
                )
                .await?;
            let mode = self
                .named_ref(&*self.modes, session.mode_id.map(|id| id.to_uuid()))
                .await?;

            views.push(PlaySessionView {
                id: session.id,
                play_mode: session.play_mode,
                scenario,
                genre,
                difficulty,
                mode,
                character,
                choice_history: session.choice_history,
                status: session.status,
                started_at: session.started_at,
                ended_at: session.ended_at,
            });
        }

        Ok(views)
    }

    async fn named_ref(
        &self,
        repo: &dyn CatalogRepo,
        id: Option<Uuid>,
    ) -> Result<Option<NamedRef>, ReportError> {
        let Some(id) = id else {
            return Ok(None);
        };
        Ok(repo.get(id).await?.map(|entry| NamedRef {
            id: entry.id,
            name: entry.name,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{
        MockCatalogRepo, MockCharacterRepo, MockScenarioRepo, MockSessionRepo, MockStoryRepo,
        MockUserRepo,
    };
    use taleforge_domain::{Choice, Moment, Story, StorySession, User};

    fn user_repo_with_user() -> (MockUserRepo, UserId) {
        let user = User {
            id: UserId::new(),
            name: "player".to_string(),
            email: "player@example.com".to_string(),
            social_type: String::new(),
            joined_at: Utc::now(),
            login_at: None,
            is_active: true,
            is_deleted: false,
        };
        let user_id = user.id;
        let mut users = MockUserRepo::new();
        users.expect_get().returning(move |_| Ok(Some(user.clone())));
        (users, user_id)
    }

    fn catalog_mock(kind: CatalogKind) -> MockCatalogRepo {
        let mut repo = MockCatalogRepo::new();
        repo.expect_kind().return_const(kind);
        repo
    }

    fn reports(
        sessions: MockSessionRepo,
        users: MockUserRepo,
        stories: MockStoryRepo,
    ) -> SessionReports {
        SessionReports::new(
            Arc::new(sessions),
            Arc::new(users),
            Arc::new(stories),
            Arc::new(MockScenarioRepo::new()),
            Arc::new(MockCharacterRepo::new()),
            Arc::new(catalog_mock(CatalogKind::Genre)),
            Arc::new(catalog_mock(CatalogKind::Difficulty)),
            Arc::new(catalog_mock(CatalogKind::Mode)),
        )
    }

    fn session_at(story: &Story, moment: Option<MomentId>, user_id: UserId) -> StorySession {
        StorySession {
            id: SessionId::new(),
            user_id,
            story_id: story.id,
            current_moment_id: moment,
            progress_pct: 40.0,
            status: SessionStatus::InProgress,
            history: Vec::new(),
            start_at: Some(Utc::now()),
            end_at: None,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn ending_choice_gets_the_finished_placeholder() {
        let (users, user_id) = user_repo_with_user();

        let story = Story::new("The Fox", "a fable");
        let current = Moment::new(story.id, "Climax", "the fox speaks");
        let choices = vec![Choice::new(current.id, "BAD", None)];

        let session = session_at(&story, Some(current.id), user_id);
        let mut sessions = MockSessionRepo::new();
        sessions
            .expect_story_sessions_for_user()
            .returning(move |_| Ok(vec![session.clone()]));

        let story_clone = story.clone();
        let current_clone = current.clone();
        let mut stories = MockStoryRepo::new();
        stories
            .expect_get()
            .returning(move |_| Ok(Some(story_clone.clone())));
        stories
            .expect_get_moment()
            .returning(move |_| Ok(Some(current_clone.clone())));
        stories
            .expect_choices_for_moment()
            .returning(move |_| Ok(choices.clone()));

        let reports = reports(sessions, users, stories);
        let views = reports.story_sessions(user_id).await.expect("reports");

        assert_eq!(views.len(), 1);
        let view = &views[0];
        assert_eq!(view.progress, 40.0);
        assert!(!view.current_moment.is_ending);
        assert_eq!(view.current_moment.choices[0].next_moment.title, "story finished");
        assert!(view.current_moment.choices[0].next_moment.id.is_none());
    }

    #[tokio::test]
    async fn session_without_a_moment_renders_placeholders() {
        let (users, user_id) = user_repo_with_user();
        let story = Story::new("The Fox", "a fable");

        let session = session_at(&story, None, user_id);
        let mut sessions = MockSessionRepo::new();
        sessions
            .expect_story_sessions_for_user()
            .returning(move |_| Ok(vec![session.clone()]));

        let mut stories = MockStoryRepo::new();
        stories
            .expect_get()
            .returning(move |_| Ok(Some(story.clone())));

        let reports = reports(sessions, users, stories);
        let views = reports.story_sessions(user_id).await.expect("reports");

        let moment = &views[0].current_moment;
        assert!(moment.id.is_none());
        assert_eq!(moment.title, "story not started");
        assert!(moment.choices.is_empty());
    }

    #[tokio::test]
    async fn moment_with_no_choices_is_an_ending() {
        let (users, user_id) = user_repo_with_user();

        let story = Story::new("The Fox", "a fable");
        let ending = Moment::new(story.id, "Ending", "all is well");

        let session = session_at(&story, Some(ending.id), user_id);
        let mut sessions = MockSessionRepo::new();
        sessions
            .expect_story_sessions_for_user()
            .returning(move |_| Ok(vec![session.clone()]));

        let story_clone = story.clone();
        let ending_clone = ending.clone();
        let mut stories = MockStoryRepo::new();
        stories
            .expect_get()
            .returning(move |_| Ok(Some(story_clone.clone())));
        stories
            .expect_get_moment()
            .returning(move |_| Ok(Some(ending_clone.clone())));
        stories
            .expect_choices_for_moment()
            .returning(|_| Ok(Vec::new()));

        let reports = reports(sessions, users, stories);
        let views = reports.story_sessions(user_id).await.expect("reports");

        assert!(views[0].current_moment.is_ending);
    }

    #[tokio::test]
    async fn unknown_user_is_a_report_error() {
        let mut users = MockUserRepo::new();
        users.expect_get().returning(|_| Ok(None));

        let reports = reports(MockSessionRepo::new(), users, MockStoryRepo::new());
        let result = reports.story_sessions(UserId::new()).await;

        assert!(matches!(result, Err(ReportError::UserNotFound(_))));
    }
}
