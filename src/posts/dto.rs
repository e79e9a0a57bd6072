use serde::Deserialize;

/// Body of `POST /post` and `POST /post/comment/:id`.
#[derive(Debug, Default, Deserialize)]
pub struct TextRequest {
    pub text: Option<String>,
}
