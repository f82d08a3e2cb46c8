//! Content loading and validation
//!
//! Chapter and puzzle definitions arrive as JSON. The repository trait
//! abstracts where they come from; the bundled implementation reads a
//! content directory. Validation runs once at load and catches authoring
//! errors (dangling labels, unknown scene targets) before play starts.

use crate::types::content::{Chapter, CommandBody, Target};
use crate::types::puzzle::PuzzleDefinition;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced while loading or validating content
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {file}: {message}")]
    Io { file: String, message: String },

    #[error("failed to parse {file}: {message}")]
    Parse { file: String, message: String },

    #[error("undefined label '{label}' referenced in scene '{scene}'")]
    UndefinedLabel { scene: String, label: String },

    #[error("duplicate label '{label}' in scene '{scene}'")]
    DuplicateLabel { scene: String, label: String },

    #[error("unknown scene '{target}' targeted from scene '{scene}'")]
    UnknownScene { scene: String, target: String },

    #[error("duplicate scene id '{scene}' in chapter '{chapter}'")]
    DuplicateScene { chapter: String, scene: String },
}

/// Everything the engine needs to run: chapters plus puzzle definitions
#[derive(Debug, Clone, Default)]
pub struct ContentSet {
    pub chapters: Vec<Chapter>,
    pub puzzles: Vec<PuzzleDefinition>,
}

impl ContentSet {
    pub fn new(chapters: Vec<Chapter>, puzzles: Vec<PuzzleDefinition>) -> Self {
        Self { chapters, puzzles }
    }

    /// md5 over the chapter data, stored in save records so a load against
    /// patched content can be noticed.
    pub fn content_hash(&self) -> String {
        let json = serde_json::to_string(&self.chapters).unwrap_or_default();
        format!("{:x}", md5::compute(json.as_bytes()))
    }
}

/// Source of chapter and puzzle definitions
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn load_chapters(&self) -> Result<Vec<Chapter>, ContentError>;
    async fn load_puzzles(&self) -> Result<Vec<PuzzleDefinition>, ContentError>;

    async fn load_all(&self) -> Result<ContentSet, ContentError> {
        Ok(ContentSet::new(
            self.load_chapters().await?,
            self.load_puzzles().await?,
        ))
    }
}

/// Reads `chapters.json` and `puzzles.json` from a content directory
pub struct FsContentRepository {
    base_path: PathBuf,
}

impl FsContentRepository {
    pub fn new<P: Into<PathBuf>>(base_path: P) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<T, ContentError> {
        let path = self.base_path.join(name);
        let content =
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| ContentError::Io {
                    file: path.display().to_string(),
                    message: e.to_string(),
                })?;
        serde_json::from_str(&content).map_err(|e| ContentError::Parse {
            file: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl ContentRepository for FsContentRepository {
    async fn load_chapters(&self) -> Result<Vec<Chapter>, ContentError> {
        self.read_json("chapters.json").await
    }

    /// A missing puzzle file is not fatal: chapters without puzzles are
    /// perfectly playable, and unknown puzzle ids degrade to the generic
    /// fallback at runtime anyway.
    async fn load_puzzles(&self) -> Result<Vec<PuzzleDefinition>, ContentError> {
        let path = self.base_path.join("puzzles.json");
        if !path.exists() {
            log::warn!("no puzzles.json in {}; continuing without", self.base_path.display());
            return Ok(Vec::new());
        }
        self.read_json("puzzles.json").await
    }
}

/// Validate cross-references before play: labels must be defined exactly
/// once per scene, label jumps must resolve, and scene transfers must name
/// a scene that exists somewhere. Unknown puzzle ids only warn, since the
/// factory degrades those to the generic fallback.
pub fn validate(content: &ContentSet) -> Result<(), ContentError> {
    let all_scenes: HashSet<&str> = content
        .chapters
        .iter()
        .flat_map(|c| c.scenes.iter().map(|s| s.id.as_str()))
        .collect();
    let puzzle_ids: HashSet<&str> = content.puzzles.iter().map(|p| p.id.as_str()).collect();

    for chapter in &content.chapters {
        let mut seen_scenes = HashSet::new();
        for scene in &chapter.scenes {
            if !seen_scenes.insert(scene.id.as_str()) {
                return Err(ContentError::DuplicateScene {
                    chapter: chapter.id.clone(),
                    scene: scene.id.clone(),
                });
            }

            let mut labels = HashSet::new();
            for command in &scene.content {
                if let CommandBody::Label { name } = &command.body
                    && !labels.insert(name.as_str())
                {
                    return Err(ContentError::DuplicateLabel {
                        scene: scene.id.clone(),
                        label: name.clone(),
                    });
                }
            }

            let check_target = |target: &Target| match target {
                Target::Label { label } => {
                    if !labels.contains(label.as_str()) {
                        return Err(ContentError::UndefinedLabel {
                            scene: scene.id.clone(),
                            label: label.clone(),
                        });
                    }
                    Ok(())
                }
                Target::Scene { scene: target } => {
                    if !all_scenes.contains(target.as_str()) {
                        return Err(ContentError::UnknownScene {
                            scene: scene.id.clone(),
                            target: target.clone(),
                        });
                    }
                    Ok(())
                }
            };

            for command in &scene.content {
                match &command.body {
                    CommandBody::Jump { target } => check_target(target)?,
                    CommandBody::Choice { options, .. } => {
                        for option in options {
                            if let Some(target) = &option.goto {
                                check_target(target)?;
                            }
                        }
                    }
                    CommandBody::Puzzle { id } => {
                        if !puzzle_ids.contains(id.as_str()) {
                            log::warn!(
                                "scene '{}' invokes unknown puzzle '{id}'; it will run as generic",
                                scene.id
                            );
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    Ok(())
}
