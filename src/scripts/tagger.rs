//! Part-of-speech tagging through NLP Cloud.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::error::{ScriptError, ScriptResult};

const NLP_CLOUD_BASE_URL: &str = "https://api.nlpcloud.io/v1";

/// A token with its Penn Treebank tag (`JJ`, `NNS`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaggedWord {
    pub text: String,
    pub tag: String,
}

impl TaggedWord {
    pub fn new(text: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tag: tag.into(),
        }
    }
}

/// Tokenizes and tags a sentence.
#[async_trait]
pub trait PosTagger: Send + Sync {
    async fn tag(&self, text: &str) -> ScriptResult<Vec<TaggedWord>>;
}

#[derive(Serialize)]
struct DependenciesRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct DependenciesResponse {
    #[serde(default)]
    words: Vec<TaggedWord>,
}

/// NLP Cloud `dependencies` endpoint.
pub struct NlpCloudTagger {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl NlpCloudTagger {
    pub fn new(client: Client, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: NLP_CLOUD_BASE_URL.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}/dependencies", self.base_url, self.model)
    }
}

#[async_trait]
impl PosTagger for NlpCloudTagger {
    async fn tag(&self, text: &str) -> ScriptResult<Vec<TaggedWord>> {
        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Token {}", self.api_key))
            .json(&DependenciesRequest { text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScriptError::Status {
                status: status.as_u16(),
            });
        }

        let body: DependenciesResponse = response.json().await?;
        if body.words.is_empty() {
            return Err(ScriptError::Empty);
        }
        debug!("NLP Cloud tagged {} words", body.words.len());
        Ok(body.words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let tagger = NlpCloudTagger::new(Client::new(), "key", "en_core_web_lg");
        assert_eq!(
            tagger.endpoint(),
            "https://api.nlpcloud.io/v1/en_core_web_lg/dependencies"
        );
    }

    #[test]
    fn test_response_shape() {
        let json = r#"{"words":[{"text":"big","tag":"JJ","dep":"amod"},{"text":"dogs","tag":"NNS"}],"arcs":[]}"#;
        let parsed: DependenciesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.words,
            vec![TaggedWord::new("big", "JJ"), TaggedWord::new("dogs", "NNS")]
        );
    }
}
