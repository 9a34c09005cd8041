use super::{AnalysisService, ModelCatalog};
use crate::models::{AnalysisRequest, ModelInfo};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Recorded view of a request the mock received.
#[derive(Debug, Clone, PartialEq)]
pub struct SeenRequest {
    pub model_id: String,
    pub prompt_text: String,
    pub image_len: usize,
}

#[derive(Clone)]
pub struct MockAnalysisClient {
    replies: Arc<Mutex<Vec<String>>>,
    failure: Option<String>,
    call_count: Arc<Mutex<usize>>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl MockAnalysisClient {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            failure: None,
            call_count: Arc::new(Mutex::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_reply(self, reply: String) -> Self {
        self.replies.lock().unwrap().push(reply);
        self
    }

    /// Every call fails with a remote invocation error carrying `message`.
    pub fn failing_with(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Default for MockAnalysisClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisService for MockAnalysisClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        self.seen.lock().unwrap().push(SeenRequest {
            model_id: request.model_id.clone(),
            prompt_text: request.prompt_text.clone(),
            image_len: request.image.len(),
        });

        if let Some(message) = &self.failure {
            return Err(Error::RemoteInvocation(message.clone()));
        }

        let replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            Ok("이름: 테스트 와인\n바디: 3\n타닌: 3\n산도: 3\n당도: 3\n[리뷰] 무난합니다.".to_string())
        } else {
            let index = (*count - 1) % replies.len();
            Ok(replies[index].clone())
        }
    }
}

#[derive(Clone)]
pub struct MockModelCatalog {
    models: Vec<ModelInfo>,
    failure: Option<String>,
    call_count: Arc<Mutex<usize>>,
}

impl MockModelCatalog {
    pub fn new() -> Self {
        Self {
            models: Vec::new(),
            failure: None,
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_model(mut self, model: ModelInfo) -> Self {
        self.models.push(model);
        self
    }

    pub fn failing_with(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockModelCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelCatalog for MockModelCatalog {
    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        *self.call_count.lock().unwrap() += 1;

        match &self.failure {
            Some(message) => Err(Error::RemoteInvocation(message.clone())),
            None => Ok(self.models.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AnalysisRequest {
        AnalysisRequest::new(vec![1, 2, 3], "prompt".to_string(), "m".to_string())
    }

    #[tokio::test]
    async fn test_mock_replies_cycle() {
        let client = MockAnalysisClient::new()
            .with_reply("first".to_string())
            .with_reply("second".to_string());

        assert_eq!(client.analyze(&request()).await.unwrap(), "first");
        assert_eq!(client.analyze(&request()).await.unwrap(), "second");
        assert_eq!(client.analyze(&request()).await.unwrap(), "first");
        assert_eq!(client.get_call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_records_requests() {
        let client = MockAnalysisClient::new();
        client.analyze(&request()).await.unwrap();

        let seen = client.get_requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].model_id, "m");
        assert_eq!(seen[0].image_len, 3);
    }

    #[tokio::test]
    async fn test_mock_catalog_failure() {
        let catalog = MockModelCatalog::new().failing_with("permission denied");
        let err = catalog.list_models().await.unwrap_err();
        assert!(matches!(err, Error::RemoteInvocation(_)));
        assert_eq!(catalog.get_call_count(), 1);
    }
}
