//! Read side of the branching-narrative graph.
//!
//! Renders each visible story as an insertion-ordered moment map with the
//! start moment pulled to the front. No topological sort: cycles are legal
//! and persisted order is the narrative order.

use std::sync::Arc;

use serde::Serialize;

use taleforge_domain::{Choice, Moment, MomentId, Story, StoryId};

use crate::infrastructure::ports::{RepoError, StoryRepo};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceView {
    pub action_type: String,
    pub next_moment_id: Option<MomentId>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MomentView {
    pub title: String,
    pub description: String,
    pub image_path: Option<String>,
    pub choices: Vec<ChoiceView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryGraphView {
    pub id: StoryId,
    pub title: String,
    pub description: String,
    pub image_path: Option<String>,
    pub start_moment_id: Option<MomentId>,
    pub start_moment_title: Option<String>,
    /// Moment id -> view, start moment first, then persisted order.
    pub moments: serde_json::Map<String, serde_json::Value>,
    pub is_display: bool,
    pub is_deleted: bool,
}

/// A moment with no outgoing choices ends the story.
pub fn is_ending(choices: &[Choice]) -> bool {
    choices.is_empty()
}

pub struct RenderStoryGraphs {
    stories: Arc<dyn StoryRepo>,
}

impl RenderStoryGraphs {
    pub fn new(stories: Arc<dyn StoryRepo>) -> Self {
        Self { stories }
    }

    pub async fn execute(&self) -> Result<Vec<StoryGraphView>, RepoError> {
        let stories = self.stories.list_visible().await?;

        let mut views = Vec::with_capacity(stories.len());
        for story in stories {
            let moments = self.stories.moments_for_story(story.id).await?;
            let choices = self.stories.choices_for_story(story.id).await?;
            views.push(render_story(story, moments, choices)?);
        }

        Ok(views)
    }
}

fn render_story(
    story: Story,
    moments: Vec<Moment>,
    choices: Vec<Choice>,
) -> Result<StoryGraphView, RepoError> {
    let start_moment_title = story
        .start_moment_id
        .and_then(|start| moments.iter().find(|m| m.id == start))
        .map(|m| m.title.clone());

    // Start moment first, remaining moments in persisted order.
    let mut ordered: Vec<&Moment> = Vec::with_capacity(moments.len());
    if let Some(start) = story.start_moment_id {
        ordered.extend(moments.iter().filter(|m| m.id == start));
    }
    ordered.extend(moments.iter().filter(|m| Some(m.id) != story.start_moment_id));

    let mut moment_map = serde_json::Map::with_capacity(ordered.len());
    for moment in ordered {
        let view = MomentView {
            title: moment.title.clone(),
            description: moment.description.clone(),
            image_path: moment.image_path.clone(),
            choices: choices
                .iter()
                .filter(|c| c.moment_id == moment.id)
                .map(|c| ChoiceView {
                    action_type: c.action_type.clone(),
                    next_moment_id: c.next_moment_id,
                })
                .collect(),
        };
        let value = serde_json::to_value(&view)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;
        moment_map.insert(moment.id.to_string(), value);
    }

    Ok(StoryGraphView {
        id: story.id,
        title: story.title,
        description: story.description,
        image_path: story.image_path,
        start_moment_id: story.start_moment_id,
        start_moment_title,
        moments: moment_map,
        is_display: story.is_display,
        is_deleted: story.is_deleted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockStoryRepo;

    fn fable() -> (Story, Vec<Moment>, Vec<Choice>) {
        let mut story = Story::new("The Fox and the Crow", "a fable");
        let opening = Moment::new(story.id, "Opening", "a crow finds cheese");
        let conflict = Moment::new(story.id, "Conflict", "a fox flatters");
        let ending = Moment::new(story.id, "Ending", "the cheese drops");
        // Persisted with the start moment in the middle on purpose.
        story.start_moment_id = Some(conflict.id);

        let choices = vec![
            Choice::new(opening.id, "NEUTRAL", Some(conflict.id)),
            Choice::new(conflict.id, "BAD", Some(ending.id)),
        ];

        (story, vec![opening, conflict, ending], choices)
    }

    #[tokio::test]
    async fn start_moment_leads_the_map() {
        let (story, moments, choices) = fable();
        let start = story.start_moment_id.expect("set");

        let mut repo = MockStoryRepo::new();
        repo.expect_list_visible()
            .returning(move || Ok(vec![story.clone()]));
        repo.expect_moments_for_story()
            .returning(move |_| Ok(moments.clone()));
        repo.expect_choices_for_story()
            .returning(move |_| Ok(choices.clone()));

        let render = RenderStoryGraphs::new(Arc::new(repo));
        let views = render.execute().await.expect("renders");

        assert_eq!(views.len(), 1);
        let view = &views[0];
        assert_eq!(view.start_moment_title.as_deref(), Some("Conflict"));

        let keys: Vec<&String> = view.moments.keys().collect();
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[0], &start.to_string());
    }

    #[tokio::test]
    async fn ending_moments_render_with_no_choices() {
        let (story, moments, choices) = fable();
        let ending_id = moments[2].id;

        let mut repo = MockStoryRepo::new();
        repo.expect_list_visible()
            .returning(move || Ok(vec![story.clone()]));
        repo.expect_moments_for_story()
            .returning(move |_| Ok(moments.clone()));
        repo.expect_choices_for_story()
            .returning(move |_| Ok(choices.clone()));

        let render = RenderStoryGraphs::new(Arc::new(repo));
        let views = render.execute().await.expect("renders");

        let ending = &views[0].moments[&ending_id.to_string()];
        assert_eq!(ending["choices"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn ending_detection_is_structural() {
        let moment = Moment::new(StoryId::new(), "End", "done");
        assert!(is_ending(&[]));
        assert!(!is_ending(&[Choice::new(moment.id, "GOOD", None)]));
    }
}
