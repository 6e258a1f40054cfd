//! Image generation and deletion for scenarios, characters and stories.
//!
//! Generation is expensive, so the deterministic blob path doubles as a
//! cache key: if the blob already exists, its URL is reused and no model
//! call is made. The owning record's image path is only written after every
//! storage-side step has succeeded.

use std::sync::Arc;

use taleforge_domain::{CharacterId, ScenarioId, StoryId};

use crate::infrastructure::blob_storage::parse_blob_path;
use crate::infrastructure::ports::{
    CharacterRepo, ClockPort, ImageGenPort, LlmPort, LlmRequest, RepoError, ScenarioRepo,
    StorageError, StoragePort, StoryRepo,
};
use crate::prompt_templates;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("image prompt rewrite failed: {0}")]
    Prompt(String),
    #[error("image generation failed for {id}: {reason}")]
    Generation { id: String, reason: String },
    #[error("image fetch failed for {id}: {reason}")]
    Fetch { id: String, reason: String },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Which record an image operation targets.
#[derive(Debug, Clone, Copy)]
pub enum ImageTarget {
    Scenario(ScenarioId),
    Character(CharacterId),
    Story(StoryId),
}

impl ImageTarget {
    pub fn entity(&self) -> &'static str {
        match self {
            Self::Scenario(_) => "scenario",
            Self::Character(_) => "character",
            Self::Story(_) => "story",
        }
    }

    fn id_string(&self) -> String {
        match self {
            Self::Scenario(id) => id.to_string(),
            Self::Character(id) => id.to_string(),
            Self::Story(id) => id.to_string(),
        }
    }
}

/// Blob naming key: lower-cased, spaces to hyphens.
pub fn slug(title: &str) -> String {
    title.trim().to_lowercase().replace(' ', "-")
}

#[derive(Debug)]
pub struct ImageOutcome {
    pub url: String,
    /// False when the blob already existed and generation was skipped.
    pub generated: bool,
}

struct ResolvedTarget {
    container: String,
    blob: String,
    name: String,
    description: String,
}

pub struct EntityImages {
    llm: Arc<dyn LlmPort>,
    image_gen: Arc<dyn ImageGenPort>,
    storage: Arc<dyn StoragePort>,
    scenarios: Arc<dyn ScenarioRepo>,
    characters: Arc<dyn CharacterRepo>,
    stories: Arc<dyn StoryRepo>,
    clock: Arc<dyn ClockPort>,
}

impl EntityImages {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        llm: Arc<dyn LlmPort>,
        image_gen: Arc<dyn ImageGenPort>,
        storage: Arc<dyn StoragePort>,
        scenarios: Arc<dyn ScenarioRepo>,
        characters: Arc<dyn CharacterRepo>,
        stories: Arc<dyn StoryRepo>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            llm,
            image_gen,
            storage,
            scenarios,
            characters,
            stories,
            clock,
        }
    }

    /// One container per owning scenario/story, blobs named by entity title.
    /// Request-supplied `title`/`description` override the stored record.
    async fn resolve(
        &self,
        target: ImageTarget,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<ResolvedTarget, AssetError> {
        let missing = || AssetError::NotFound {
            entity: target.entity(),
            id: target.id_string(),
        };

        match target {
            ImageTarget::Scenario(id) => {
                let scenario = self.scenarios.get(id).await?.ok_or_else(missing)?;
                let name = title.unwrap_or(&scenario.title).to_string();
                Ok(ResolvedTarget {
                    container: slug(&name),
                    blob: format!("{}.png", slug(&name)),
                    description: description.unwrap_or(&scenario.description).to_string(),
                    name,
                })
            }
            ImageTarget::Character(id) => {
                let character = self.characters.get(id).await?.ok_or_else(missing)?;
                let scenario = self
                    .scenarios
                    .get(character.scenario_id)
                    .await?
                    .ok_or_else(|| AssetError::NotFound {
                        entity: "scenario",
                        id: character.scenario_id.to_string(),
                    })?;
                let name = title.unwrap_or(&character.name).to_string();
                Ok(ResolvedTarget {
                    container: slug(&scenario.title),
                    blob: format!("{}.png", slug(&name)),
                    description: description.unwrap_or(&character.description).to_string(),
                    name,
                })
            }
            ImageTarget::Story(id) => {
                let story = self.stories.get(id).await?.ok_or_else(missing)?;
                let name = title.unwrap_or(&story.title).to_string();
                Ok(ResolvedTarget {
                    container: slug(&name),
                    blob: format!("{}.png", slug(&name)),
                    description: description.unwrap_or(&story.description).to_string(),
                    name,
                })
            }
        }
    }

    async fn persist_url(&self, target: ImageTarget, url: Option<&str>) -> Result<(), AssetError> {
        match target {
            ImageTarget::Scenario(id) => self.scenarios.set_image_path(id, url).await?,
            ImageTarget::Character(id) => self.characters.set_image_path(id, url).await?,
            ImageTarget::Story(id) => self.stories.set_image_path(id, url).await?,
        }
        Ok(())
    }

    pub async fn generate(
        &self,
        target: ImageTarget,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<ImageOutcome, AssetError> {
        let resolved = self.resolve(target, title, description).await?;

        if self.storage.exists(&resolved.container, &resolved.blob).await? {
            // Cache-busting suffix so clients refetch after a regeneration.
            let url = format!(
                "{}?t={}",
                self.storage.url_for(&resolved.container, &resolved.blob),
                self.clock.now().timestamp()
            );
            self.persist_url(target, Some(&url)).await?;
            tracing::info!(blob = %resolved.blob, "image already present, reused");
            return Ok(ImageOutcome {
                url,
                generated: false,
            });
        }

        let request =
            LlmRequest::new(prompt_templates::image_prompt_rewrite(
                &resolved.name,
                &resolved.description,
            ))
            .with_system_prompt(prompt_templates::IMAGE_PROMPT_SYSTEM)
            .with_temperature(0.7);

        let prompt = self
            .llm
            .generate(request)
            .await
            .map_err(|e| AssetError::Prompt(e.to_string()))?
            .content;

        let image = self
            .image_gen
            .generate(&prompt)
            .await
            .map_err(|e| AssetError::Generation {
                id: target.id_string(),
                reason: e.to_string(),
            })?;

        let bytes = self
            .image_gen
            .download(&image.url)
            .await
            .map_err(|e| AssetError::Fetch {
                id: target.id_string(),
                reason: e.to_string(),
            })?;

        let url = self
            .storage
            .upload(&resolved.container, &resolved.blob, bytes, "image/png")
            .await?;

        self.persist_url(target, Some(&url)).await?;
        tracing::info!(blob = %resolved.blob, "image generated and stored");
        Ok(ImageOutcome {
            url,
            generated: true,
        })
    }

    /// Storage delete runs strictly before the DB write; an already-absent
    /// blob still clears the record.
    pub async fn delete(&self, target: ImageTarget) -> Result<bool, AssetError> {
        let image_path = match target {
            ImageTarget::Scenario(id) => {
                self.scenarios
                    .get(id)
                    .await?
                    .ok_or(AssetError::NotFound {
                        entity: "scenario",
                        id: id.to_string(),
                    })?
                    .image_path
            }
            ImageTarget::Character(id) => {
                self.characters
                    .get(id)
                    .await?
                    .ok_or(AssetError::NotFound {
                        entity: "character",
                        id: id.to_string(),
                    })?
                    .image_path
            }
            ImageTarget::Story(id) => {
                self.stories
                    .get(id)
                    .await?
                    .ok_or(AssetError::NotFound {
                        entity: "story",
                        id: id.to_string(),
                    })?
                    .image_path
            }
        };

        let Some(image_path) = image_path else {
            return Ok(false);
        };

        let (container, blob) = parse_blob_path(&image_path)?;
        self.storage.delete(&container, &blob).await?;
        self.persist_url(target, None).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::ports::{
        GeneratedImage, ImageGenError, LlmResponse, MockCharacterRepo, MockImageGenPort,
        MockLlmPort, MockScenarioRepo, MockStoragePort, MockStoryRepo,
    };
    use taleforge_domain::Scenario;

    fn scenario_repo_with(scenario: Scenario) -> MockScenarioRepo {
        let mut scenarios = MockScenarioRepo::new();
        scenarios
            .expect_get()
            .returning(move |_| Ok(Some(scenario.clone())));
        scenarios
    }

    fn images(
        llm: MockLlmPort,
        image_gen: MockImageGenPort,
        storage: MockStoragePort,
        scenarios: MockScenarioRepo,
    ) -> EntityImages {
        EntityImages::new(
            Arc::new(llm),
            Arc::new(image_gen),
            Arc::new(storage),
            Arc::new(scenarios),
            Arc::new(MockCharacterRepo::new()),
            Arc::new(MockStoryRepo::new()),
            Arc::new(SystemClock::new()),
        )
    }

    #[test]
    fn slug_lowercases_and_hyphenates() {
        assert_eq!(slug("The Old Village"), "the-old-village");
        assert_eq!(slug("  Fox  "), "fox");
    }

    #[tokio::test]
    async fn existing_blob_skips_generation_entirely() {
        let mut scenarios = scenario_repo_with(Scenario::new("Old Village", "a village"));
        scenarios
            .expect_set_image_path()
            .withf(|_, url| url.is_some_and(|u| u.contains("old-village.png?t=")))
            .returning(|_, _| Ok(()));

        let mut storage = MockStoragePort::new();
        storage
            .expect_exists()
            .withf(|container, blob| container == "old-village" && blob == "old-village.png")
            .returning(|_, _| Ok(true));
        storage
            .expect_url_for()
            .returning(|c, b| format!("https://storage.example.com/{c}/{b}"));

        let mut llm = MockLlmPort::new();
        llm.expect_generate().never();
        let mut image_gen = MockImageGenPort::new();
        image_gen.expect_generate().never();

        let images = images(llm, image_gen, storage, scenarios);
        let outcome = images
            .generate(ImageTarget::Scenario(ScenarioId::new()), None, None)
            .await
            .expect("reuses");

        assert!(!outcome.generated);
    }

    #[tokio::test]
    async fn full_chain_persists_only_after_upload() {
        let mut scenarios = scenario_repo_with(Scenario::new("Old Village", "a village"));
        scenarios
            .expect_set_image_path()
            .withf(|_, url| url == &Some("https://storage.example.com/old-village/old-village.png"))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut storage = MockStoragePort::new();
        storage.expect_exists().returning(|_, _| Ok(false));
        storage
            .expect_upload()
            .withf(|container, blob, bytes, content_type| {
                container == "old-village"
                    && blob == "old-village.png"
                    && bytes == b"png-bytes"
                    && content_type == "image/png"
            })
            .returning(|c, b, _, _| Ok(format!("https://storage.example.com/{c}/{b}")));

        let mut llm = MockLlmPort::new();
        llm.expect_generate().returning(|_| {
            Ok(LlmResponse {
                content: "pixel art of a village".to_string(),
                usage: None,
            })
        });

        let mut image_gen = MockImageGenPort::new();
        image_gen
            .expect_generate()
            .withf(|prompt| prompt == "pixel art of a village")
            .returning(|_| {
                Ok(GeneratedImage {
                    url: "https://temp.example.com/abc".to_string(),
                })
            });
        image_gen
            .expect_download()
            .returning(|_| Ok(b"png-bytes".to_vec()));

        let images = images(llm, image_gen, storage, scenarios);
        let outcome = images
            .generate(ImageTarget::Scenario(ScenarioId::new()), None, None)
            .await
            .expect("generates");

        assert!(outcome.generated);
    }

    #[tokio::test]
    async fn fetch_failure_leaves_the_record_untouched() {
        let mut scenarios = scenario_repo_with(Scenario::new("Old Village", "a village"));
        scenarios.expect_set_image_path().never();

        let mut storage = MockStoragePort::new();
        storage.expect_exists().returning(|_, _| Ok(false));
        storage.expect_upload().never();

        let mut llm = MockLlmPort::new();
        llm.expect_generate().returning(|_| {
            Ok(LlmResponse {
                content: "prompt".to_string(),
                usage: None,
            })
        });

        let mut image_gen = MockImageGenPort::new();
        image_gen.expect_generate().returning(|_| {
            Ok(GeneratedImage {
                url: "https://temp.example.com/abc".to_string(),
            })
        });
        image_gen
            .expect_download()
            .returning(|_| Err(ImageGenError::FetchFailed("status 410".to_string())));

        let images = images(llm, image_gen, storage, scenarios);
        let result = images
            .generate(ImageTarget::Scenario(ScenarioId::new()), None, None)
            .await;

        assert!(matches!(result, Err(AssetError::Fetch { .. })));
    }

    #[tokio::test]
    async fn request_text_overrides_the_stored_record() {
        let scenarios = scenario_repo_with(Scenario::new("Old Village", "a village"));

        let mut storage = MockStoragePort::new();
        storage
            .expect_exists()
            .withf(|container, blob| container == "night-market" && blob == "night-market.png")
            .returning(|_, _| Ok(true));
        storage
            .expect_url_for()
            .returning(|c, b| format!("https://storage.example.com/{c}/{b}"));

        let mut scenarios = scenarios;
        scenarios
            .expect_set_image_path()
            .withf(|_, url| url.is_some_and(|u| u.contains("night-market.png?t=")))
            .returning(|_, _| Ok(()));

        let mut llm = MockLlmPort::new();
        llm.expect_generate().never();
        let mut image_gen = MockImageGenPort::new();
        image_gen.expect_generate().never();

        let images = images(llm, image_gen, storage, scenarios);
        let outcome = images
            .generate(
                ImageTarget::Scenario(ScenarioId::new()),
                Some("Night Market"),
                Some("lantern-lit stalls"),
            )
            .await
            .expect("reuses under the requested title");

        assert!(!outcome.generated);
    }

    #[tokio::test]
    async fn delete_clears_storage_then_record() {
        let mut scenario = Scenario::new("Old Village", "a village");
        scenario.image_path =
            Some("https://storage.example.com/old-village/old-village.png".to_string());
        let mut scenarios = scenario_repo_with(scenario);
        scenarios
            .expect_set_image_path()
            .withf(|_, url| url.is_none())
            .times(1)
            .returning(|_, _| Ok(()));

        let mut storage = MockStoragePort::new();
        storage
            .expect_delete()
            .withf(|container, blob| container == "old-village" && blob == "old-village.png")
            .times(1)
            .returning(|_, _| Ok(()));

        let images = images(
            MockLlmPort::new(),
            MockImageGenPort::new(),
            storage,
            scenarios,
        );
        let deleted = images
            .delete(ImageTarget::Scenario(ScenarioId::new()))
            .await
            .expect("deletes");

        assert!(deleted);
    }

    #[tokio::test]
    async fn delete_without_an_image_is_a_no_op() {
        let scenarios = scenario_repo_with(Scenario::new("Old Village", "a village"));
        let mut storage = MockStoragePort::new();
        storage.expect_delete().never();

        let images = images(
            MockLlmPort::new(),
            MockImageGenPort::new(),
            storage,
            scenarios,
        );
        let deleted = images
            .delete(ImageTarget::Scenario(ScenarioId::new()))
            .await
            .expect("no-op");

        assert!(!deleted);
    }
}
