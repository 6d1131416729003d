use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything the site displays besides the conversation itself: the
/// owner blurb for the info popup, the quick-question chips, and the
/// publication and project cards. The browser version had all of this
/// baked into the HTML; here it loads from a JSON file with sane
/// compiled-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteContent {
    #[serde(default)]
    pub welcome: String,
    #[serde(default)]
    pub owner: OwnerInfo,
    #[serde(default)]
    pub quick_questions: Vec<String>,
    #[serde(default)]
    pub publications: Vec<Publication>,
    #[serde(default)]
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnerInfo {
    pub name: String,
    pub role: String,
    pub affiliation: String,
    pub email: String,
    pub blurb: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Publication {
    pub title: String,
    pub authors: String,
    pub venue: String,
    pub year: Option<i32>,
    pub summary: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub title: String,
    pub status: String,
    pub summary: String,
    pub link: Option<String>,
}

impl SiteContent {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading site content from {}", path.display()))?;
        let content: SiteContent = serde_json::from_str(&raw)
            .with_context(|| format!("parsing site content in {}", path.display()))?;
        Ok(content)
    }

    /// Explicit path wins; otherwise the content file in the config
    /// directory is used if present, and the built-in sample content
    /// if not.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        if let Some(default) = Self::default_path() {
            if default.exists() {
                return Self::load(&default);
            }
        }
        Ok(Self::default())
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("papertalk").join("content.json"))
    }
}

impl Default for SiteContent {
    fn default() -> Self {
        Self {
            welcome: "Hello! I'm an AI assistant with access to the research on this site. \
                      Ask me anything about the papers, the methods, or the ongoing projects."
                .to_string(),
            owner: OwnerInfo {
                name: "Site Owner".to_string(),
                role: "Researcher".to_string(),
                affiliation: "Independent".to_string(),
                email: "owner@example.org".to_string(),
                blurb: "This is the sample site content. Put your own bio, publications \
                        and projects in content.json inside the papertalk config directory, \
                        or pass --content with a path to your own file."
                    .to_string(),
            },
            quick_questions: vec![
                "What is the main research focus?".to_string(),
                "Summarize the most recent paper.".to_string(),
                "Which methods come up across the projects?".to_string(),
            ],
            publications: vec![
                Publication {
                    title: "Retrieval-Augmented Answering over a Personal Paper Archive"
                        .to_string(),
                    authors: "S. Owner, A. Collaborator".to_string(),
                    venue: "Preprint".to_string(),
                    year: Some(2024),
                    summary: "Describes the document pipeline behind this site: papers are \
                              split into passages, embedded locally, and retrieved as context \
                              for a language model that answers visitor questions."
                        .to_string(),
                    link: Some("https://example.org/papers/rag-archive".to_string()),
                },
                Publication {
                    title: "Evaluating Answer Faithfulness in Small Local Models".to_string(),
                    authors: "S. Owner".to_string(),
                    venue: "Workshop notes".to_string(),
                    year: Some(2023),
                    summary: "A short study on how often compact local models invent citations \
                              when asked about a fixed document set."
                        .to_string(),
                    link: None,
                },
            ],
            projects: vec![
                Project {
                    title: "Research Assistant Backend".to_string(),
                    status: "active".to_string(),
                    summary: "The Flask service this client talks to: a RAG pipeline over the \
                              paper archive, exposed as a single question/answer endpoint."
                        .to_string(),
                    link: None,
                },
                Project {
                    title: "Paper Archive Tooling".to_string(),
                    status: "maintenance".to_string(),
                    summary: "Scripts that watch the papers directory and rebuild the vector \
                              store when documents change."
                        .to_string(),
                    link: None,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_content_is_usable() {
        let content = SiteContent::default();
        assert!(!content.welcome.is_empty());
        assert!(!content.quick_questions.is_empty());
        assert!(!content.publications.is_empty());
        assert!(!content.projects.is_empty());
    }

    #[test]
    fn loads_partial_json_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"owner": {{"name": "C. Fischer"}}, "quick_questions": ["Tell me about the site"]}}"#
        )
        .expect("write");

        let content = SiteContent::load(file.path()).expect("load");
        assert_eq!(content.owner.name, "C. Fischer");
        assert_eq!(content.quick_questions, vec!["Tell me about the site"]);
        // Unspecified fields fall back to serde defaults, not samples.
        assert!(content.publications.is_empty());
    }

    #[test]
    fn rejects_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "not json at all").expect("write");
        assert!(SiteContent::load(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(SiteContent::load(Path::new("/definitely/not/here.json")).is_err());
    }

    #[test]
    fn round_trips_through_json() {
        let content = SiteContent::default();
        let raw = serde_json::to_string_pretty(&content).expect("serialize");
        let back: SiteContent = serde_json::from_str(&raw).expect("deserialize");
        assert_eq!(back.publications.len(), content.publications.len());
        assert_eq!(back.owner.name, content.owner.name);
    }
}
