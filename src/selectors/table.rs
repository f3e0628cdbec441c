use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Page-area namespaces the selector configuration is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Login,
    Search,
    NoteDetail,
    Explore,
    Trending,
    Publish,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Login => "login",
            Namespace::Search => "search",
            Namespace::NoteDetail => "note_detail",
            Namespace::Explore => "explore",
            Namespace::Trending => "trending",
            Namespace::Publish => "publish",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "login" => Some(Namespace::Login),
            "search" => Some(Namespace::Search),
            "note_detail" => Some(Namespace::NoteDetail),
            "explore" => Some(Namespace::Explore),
            "trending" => Some(Namespace::Trending),
            "publish" => Some(Namespace::Publish),
            _ => None,
        }
    }
}

/// One candidate query for a logical field. Candidates are tried in declared
/// order: most overlay-specific first, generic fallbacks last. `scope` is a
/// selector resolved under the caller's scope root before `selector` runs,
/// tying the candidate to a containing element; `attr` switches extraction
/// from text content to an attribute value.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorCandidate {
    #[serde(default)]
    pub scope: Option<String>,
    pub selector: String,
    #[serde(default)]
    pub attr: Option<String>,
}

#[derive(Debug, Error)]
pub enum SelectorConfigError {
    #[error("failed to read selector file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("selector configuration is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown selector namespace `{0}`")]
    UnknownNamespace(String),

    #[error("selector field {ns}.{field} has no candidates")]
    EmptyField { ns: &'static str, field: String },

    #[error(
        "selector candidate {index} of {ns}.{field} must carry a scope prefix: \
         overlay fields may never fall back to document-global queries"
    )]
    UnscopedCandidate {
        ns: &'static str,
        field: String,
        index: usize,
    },
}

/// The field the overlay container itself is looked up by. Its candidates
/// *are* scope roots, so the containment-prefix rule does not apply to it.
pub const OVERLAY_CONTAINER_FIELD: &str = "container";

const BUILTIN_SELECTORS: &str = include_str!("../../resources/selectors.json");

/// Immutable selector configuration, loaded once at process start. Keyed by
/// (namespace, field name); each entry is an ordered candidate list.
#[derive(Debug)]
pub struct SelectorTable {
    fields: HashMap<(Namespace, String), Vec<SelectorCandidate>>,
}

impl SelectorTable {
    pub fn load(path: &Path) -> Result<Self, SelectorConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SelectorConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Compiled-in default table. Parsing it is infallible by construction,
    /// same as the crate's static regexes.
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_SELECTORS).expect("builtin selector table is valid")
    }

    pub fn from_json(raw: &str) -> Result<Self, SelectorConfigError> {
        let parsed: HashMap<String, HashMap<String, Vec<SelectorCandidate>>> =
            serde_json::from_str(raw)?;

        let mut fields = HashMap::new();
        for (ns_name, ns_fields) in parsed {
            let ns = Namespace::parse(&ns_name)
                .ok_or_else(|| SelectorConfigError::UnknownNamespace(ns_name.clone()))?;
            for (field, candidates) in ns_fields {
                validate_field(ns, &field, &candidates)?;
                fields.insert((ns, field), candidates);
            }
        }
        Ok(Self { fields })
    }

    /// Ordered candidates for a field; empty when the field is unconfigured,
    /// which the resolver reports as a miss rather than an error.
    pub fn candidates(&self, ns: Namespace, field: &str) -> &[SelectorCandidate] {
        self.fields
            .get(&(ns, field.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn validate_field(
    ns: Namespace,
    field: &str,
    candidates: &[SelectorCandidate],
) -> Result<(), SelectorConfigError> {
    if candidates.is_empty() {
        return Err(SelectorConfigError::EmptyField {
            ns: ns.as_str(),
            field: field.to_string(),
        });
    }
    if ns == Namespace::NoteDetail && field != OVERLAY_CONTAINER_FIELD {
        for (index, candidate) in candidates.iter().enumerate() {
            let scoped = candidate
                .scope
                .as_deref()
                .map(|s| !s.trim().is_empty())
                .unwrap_or(false);
            if !scoped {
                return Err(SelectorConfigError::UnscopedCandidate {
                    ns: ns.as_str(),
                    field: field.to_string(),
                    index,
                });
            }
        }
    }
    Ok(())
}
