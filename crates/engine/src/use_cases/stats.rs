//! Platform statistics: the most-selected value per (mode, dimension) pair.

use std::sync::Arc;

use serde::Serialize;

use taleforge_domain::PlayMode;

use crate::infrastructure::ports::{RepoError, SessionRepo, StatDimension, TopSelection};

/// Top picks for one play mode. A dimension with no sessions is null, never
/// an error.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeStats {
    pub scenario: Option<TopSelection>,
    pub genre: Option<TopSelection>,
    pub difficulty: Option<TopSelection>,
    pub character: Option<TopSelection>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub single: ModeStats,
    pub multi: ModeStats,
}

pub struct ComputeStats {
    sessions: Arc<dyn SessionRepo>,
}

impl ComputeStats {
    pub fn new(sessions: Arc<dyn SessionRepo>) -> Self {
        Self { sessions }
    }

    pub async fn execute(&self) -> Result<PlatformStats, RepoError> {
        Ok(PlatformStats {
            single: self.mode_stats(PlayMode::Single).await?,
            multi: self.mode_stats(PlayMode::Multi).await?,
        })
    }

    async fn mode_stats(&self, mode: PlayMode) -> Result<ModeStats, RepoError> {
        Ok(ModeStats {
            scenario: self
                .sessions
                .top_selection(mode, StatDimension::Scenario)
                .await?,
            genre: self
                .sessions
                .top_selection(mode, StatDimension::Genre)
                .await?,
            difficulty: self
                .sessions
                .top_selection(mode, StatDimension::Difficulty)
                .await?,
            character: self
                .sessions
                .top_selection(mode, StatDimension::Character)
                .await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockSessionRepo;
    use uuid::Uuid;

    #[tokio::test]
    async fn all_eight_cells_are_queried_and_gaps_stay_null() {
        let mut sessions = MockSessionRepo::new();
        sessions
            .expect_top_selection()
            .times(8)
            .returning(|mode, dimension| {
                // Only single-mode genre has any sessions.
                if mode == PlayMode::Single && dimension == StatDimension::Genre {
                    Ok(Some(TopSelection {
                        id: Uuid::new_v4(),
                        name: "fantasy".to_string(),
                        count: 12,
                    }))
                } else {
                    Ok(None)
                }
            });

        let stats = ComputeStats::new(Arc::new(sessions))
            .execute()
            .await
            .expect("computes");

        assert_eq!(stats.single.genre.as_ref().map(|t| t.count), Some(12));
        assert!(stats.single.scenario.is_none());
        assert!(stats.multi.genre.is_none());
        assert!(stats.multi.character.is_none());
    }
}
