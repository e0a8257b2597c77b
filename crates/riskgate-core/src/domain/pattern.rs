//! Inferred test conventions of a target repository.

use serde::{Deserialize, Serialize};

/// Framework assumed when nothing can be detected.
pub const DEFAULT_FRAMEWORK: &str = "playwright";

/// Directory layout style of an existing test suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructureType {
    Pom,
    Flat,
    FeatureBased,
    Unknown,
}

/// Where tests, page objects and helpers live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDirectories {
    pub tests: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utils: Option<String>,
}

impl TestDirectories {
    /// Built-in page-object layout used when detection finds nothing.
    pub fn default_pom() -> Self {
        Self {
            tests: "tests".to_string(),
            pages: Some("tests/pages".to_string()),
            utils: Some("tests/utils".to_string()),
        }
    }

    pub fn flat(tests: impl Into<String>) -> Self {
        Self {
            tests: tests.into(),
            pages: None,
            utils: None,
        }
    }
}

/// Role of an exemplar file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExampleKind {
    Test,
    PageObject,
    Utility,
}

/// An existing file used as a style exemplar for generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeExample {
    pub path: String,
    pub kind: ExampleKind,
    pub content: String,
}

/// Result of pattern detection. Built once per generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPattern {
    pub detected: bool,
    pub framework: String,
    pub structure_type: StructureType,
    pub directories: TestDirectories,
    #[serde(default)]
    pub examples: Vec<CodeExample>,
}

impl TestPattern {
    /// Undetected pattern with the built-in POM layout.
    pub fn fallback() -> Self {
        Self {
            detected: false,
            framework: DEFAULT_FRAMEWORK.to_string(),
            structure_type: StructureType::Pom,
            directories: TestDirectories::default_pom(),
            examples: Vec::new(),
        }
    }

    /// Undetected patterns are generated in page-object style.
    pub fn prefers_page_objects(&self) -> bool {
        !self.detected || self.structure_type == StructureType::Pom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_is_undetected_pom() {
        let pattern = TestPattern::fallback();
        assert!(!pattern.detected);
        assert_eq!(pattern.structure_type, StructureType::Pom);
        assert_eq!(pattern.directories, TestDirectories::default_pom());
        assert!(pattern.prefers_page_objects());
    }

    #[test]
    fn test_structure_type_kebab_case() {
        let json = serde_json::to_string(&StructureType::FeatureBased).unwrap();
        assert_eq!(json, "\"feature-based\"");
    }

    #[test]
    fn test_detected_flat_does_not_prefer_page_objects() {
        let pattern = TestPattern {
            detected: true,
            framework: "jest".to_string(),
            structure_type: StructureType::Flat,
            directories: TestDirectories::flat("__tests__"),
            examples: Vec::new(),
        };
        assert!(!pattern.prefers_page_objects());
    }
}
