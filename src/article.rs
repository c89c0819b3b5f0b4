use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::annotation::{decode, false_claim_count, Span};

static ARTICLE_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/articles");

#[derive(Debug, thiserror::Error)]
pub enum ArticleError {
    #[error("article pack not found: {0}")]
    UnknownPack(String),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed article collection: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("article collection {0:?} has no articles")]
    Empty(String),

    #[error("article {0} has no false claim to find")]
    NothingToFind(u32),
}

/// A level: annotated text plus the labels shown around it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: u32,
    #[serde(default)]
    pub title: String,
    pub text: String,
    pub category: String,
    #[serde(default)]
    pub link: Option<String>,
}

impl Article {
    pub fn spans(&self) -> Vec<Span> {
        decode(&self.text)
    }
}

/// Ordered level sequence for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleCollection {
    pub name: String,
    pub articles: Vec<Article>,
}

impl ArticleCollection {
    /// One of the packs compiled into the binary, e.g. `headlines`
    pub fn embedded(pack: &str) -> Result<Self, ArticleError> {
        let file = ARTICLE_DIR
            .get_file(format!("{pack}.json"))
            .ok_or_else(|| ArticleError::UnknownPack(pack.to_string()))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| ArticleError::UnknownPack(pack.to_string()))?;

        Self::from_json(contents)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ArticleError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ArticleError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, ArticleError> {
        let collection: ArticleCollection = serde_json::from_str(json)?;
        collection.validate()
    }

    /// Every level must be winnable: at least one article, each with a false claim
    fn validate(self) -> Result<Self, ArticleError> {
        if self.articles.is_empty() {
            return Err(ArticleError::Empty(self.name));
        }
        if let Some(article) = self
            .articles
            .iter()
            .find(|a| false_claim_count(&a.spans()) == 0)
        {
            return Err(ArticleError::NothingToFind(article.id));
        }
        Ok(self)
    }

    pub fn embedded_names() -> Vec<String> {
        ARTICLE_DIR
            .files()
            .filter_map(|f| f.path().file_stem())
            .filter_map(|stem| stem.to_str())
            .map(str::to_string)
            .collect()
    }
}
