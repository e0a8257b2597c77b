//! Parsing of structured model output into artifacts.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::domain::{ArtifactKind, GeneratedTestArtifact, Result, RiskgateError};

#[derive(Debug, Deserialize)]
struct RawFile {
    #[serde(default, alias = "path")]
    filename: String,
    #[serde(default, alias = "type")]
    kind: Option<ArtifactKind>,
    #[serde(default, alias = "content")]
    code: String,
    #[serde(default)]
    dependencies: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawResponse {
    Wrapped {
        #[serde(alias = "tests")]
        files: Vec<RawFile>,
    },
    Bare(Vec<RawFile>),
}

fn fence_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```[a-zA-Z]*\s*\n(.*?)```").ok())
        .as_ref()
}

/// Strip a surrounding markdown code fence, if any.
pub fn strip_fence(text: &str) -> &str {
    match fence_re()
        .and_then(|re| re.captures(text))
        .and_then(|c| c.get(1))
    {
        Some(body) => body.as_str().trim(),
        None => text.trim(),
    }
}

/// Parse model output into artifacts tagged with `framework`.
///
/// Entries missing a filename or code are dropped.
pub fn parse_artifacts(text: &str, framework: &str) -> Result<Vec<GeneratedTestArtifact>> {
    let body = strip_fence(text);
    let raw: RawResponse =
        serde_json::from_str(body).map_err(|e| RiskgateError::Parse(e.to_string()))?;
    let files = match raw {
        RawResponse::Wrapped { files } => files,
        RawResponse::Bare(files) => files,
    };

    Ok(files
        .into_iter()
        .filter(|f| !f.filename.trim().is_empty() && !f.code.trim().is_empty())
        .map(|f| {
            GeneratedTestArtifact::new(
                f.filename.trim(),
                framework,
                f.kind.unwrap_or_default(),
                f.code,
            )
            .with_dependencies(f.dependencies)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wrapped_files() {
        let text = r#"{"files": [
            {"filename": "tests/login.spec.ts", "kind": "test", "code": "test('a', () => {})", "dependencies": ["@playwright/test"]},
            {"filename": "tests/pages/LoginPage.ts", "kind": "page_object", "code": "export class LoginPage {}"}
        ]}"#;
        let artifacts = parse_artifacts(text, "playwright").unwrap();
        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].kind, ArtifactKind::Test);
        assert_eq!(artifacts[1].kind, ArtifactKind::PageObject);
        assert_eq!(artifacts[0].framework_tag, "playwright");
        assert!(artifacts[0].dependencies.contains("@playwright/test"));
        assert!(artifacts[0].validation.is_none());
    }

    #[test]
    fn test_parse_fenced_bare_array() {
        let text = "Here you go:\n```json\n[{\"path\": \"a.spec.ts\", \"content\": \"it('x', () => {})\"}]\n```\n";
        let artifacts = parse_artifacts(text, "jest").unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].filename, "a.spec.ts");
        assert_eq!(artifacts[0].kind, ArtifactKind::Test);
    }

    #[test]
    fn test_parse_drops_incomplete_entries() {
        let text = r#"{"tests": [{"filename": "", "code": "x"}, {"filename": "b.spec.ts", "code": "  "}, {"filename": "c.spec.ts", "code": "ok"}]}"#;
        let artifacts = parse_artifacts(text, "jest").unwrap();
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].filename, "c.spec.ts");
    }

    #[test]
    fn test_parse_malformed_is_parse_error() {
        let err = parse_artifacts("I could not generate tests.", "jest").unwrap_err();
        assert!(matches!(err, RiskgateError::Parse(_)));
    }
}
