pub mod analysis;
pub mod catalog;
pub mod client;
pub mod types;

pub use analysis::GeminiAnalysisClient;
pub use catalog::GeminiModelCatalog;

#[cfg(test)]
pub(crate) mod test_support {
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockBuilder};

    pub const GENERATE_CONTENT_PATH_REGEX: &str = r"^/v1beta/models/[^/]+:generateContent$";
    pub const LIST_MODELS_PATH: &str = "/v1beta/models";

    pub fn post_path_regex(path_pattern: &str) -> MockBuilder {
        Mock::given(method("POST")).and(path_regex(path_pattern))
    }

    pub fn get_path(exact: &str) -> MockBuilder {
        Mock::given(method("GET")).and(path(exact))
    }

    pub fn text_reply(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{ "text": text }]
                },
                "finishReason": "STOP"
            }]
        })
    }
}
