use serde::{Deserialize, Serialize};

/// Register the model is asked to answer in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStyle {
    #[default]
    Concise,
    Detailed,
    Technical,
}

impl ResponseStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Concise => "concise",
            Self::Detailed => "detailed",
            Self::Technical => "technical",
        }
    }
}

impl std::fmt::Display for ResponseStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON body of `POST /projects/{project_id}/chat`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestBody {
    #[serde(default)]
    pub message: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_style: Option<ResponseStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

/// One unit of work for the session controller
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRequest {
    pub project_id: String,
    pub message: String,
    pub session_id: String,
    pub style: ResponseStyle,
    pub images: Vec<String>,
}

impl SessionRequest {
    pub fn from_body(project_id: impl Into<String>, body: ChatRequestBody) -> Self {
        Self {
            project_id: project_id.into(),
            message: body.message,
            session_id: body.session_id,
            style: body.context_style.unwrap_or_default(),
            images: body.images.unwrap_or_default(),
        }
    }
}
