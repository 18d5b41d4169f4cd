use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============ Statements ============

/// A problem statement known to the backend.
///
/// `name` doubles as the statement id in every statement endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// Statement name (also its id).
    pub name: String,
    /// Statement language (`en`, `pt`, ...), when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Any additional metadata the backend attaches.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Statement {
    /// Statement with just a name and language.
    #[must_use]
    pub fn new(name: impl Into<String>, language: Option<&str>) -> Self {
        Self {
            name: name.into(),
            language: language.map(str::to_string),
            extra: Map::new(),
        }
    }
}

/// `GET /statements` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementsResponse {
    pub statements: Vec<Statement>,
}

/// Source file returned by every code endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeResponse {
    /// Path of the file inside the problem package.
    pub path: String,
    /// File contents.
    pub code: String,
    /// Source language, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Body of every `PUT` code endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveCodeRequest {
    pub code: String,
}

/// `POST /statement/{id}/build` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementBuildResponse {
    /// Reference to the built artifact.
    pub path: String,
}

// ============ Code templates ============

/// Kind of a package code file that can be edited as a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Validator,
    Checker,
    Interactor,
}

impl TemplateKind {
    /// All kinds, in menu order.
    pub const ALL: [Self; 3] = [Self::Validator, Self::Checker, Self::Interactor];

    /// Wire name (`validator`, `checker`, `interactor`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validator => "validator",
            Self::Checker => "checker",
            Self::Interactor => "interactor",
        }
    }

    /// Endpoint path for get/put.
    #[must_use]
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Validator => "/validator",
            Self::Checker => "/checker",
            Self::Interactor => "/interactor",
        }
    }

    /// Human title for editor headers.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Validator => "Validator",
            Self::Checker => "Checker",
            Self::Interactor => "Interactor",
        }
    }
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "validator" => Ok(Self::Validator),
            "checker" => Ok(Self::Checker),
            "interactor" => Ok(Self::Interactor),
            other => Err(format!("Unknown code template type: {other}")),
        }
    }
}

// ============ LLM review ============

/// `POST /llm/review` body.
///
/// Exactly one of `checker` / `interactor` is expected, depending on whether the
/// problem is interactive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub statement: String,
    pub language: String,
    pub validator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactor: Option<String>,
    pub model: String,
}

/// `POST /llm/review/statement` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLanguageReviewRequest {
    pub statement: String,
    pub language: String,
    pub model: String,
}

/// `GET /llm/models` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
}

/// A review report as delivered by the backend.
///
/// Current backends return markdown (as text or a JSON string). Older backends returned a
/// structured issue list, which is kept as raw JSON for conversion by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewReport {
    Markdown(String),
    Legacy(Value),
}
