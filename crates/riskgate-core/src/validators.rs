//! Built-in syntax validators.
//!
//! A validator is resolved once at start-up; [`NoopSyntaxValidator`] is the
//! required default when no language-aware validator is configured.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use crate::collaborators::SyntaxValidator;
use crate::domain::{ValidationResult, ValidationWarning};

/// Accepts everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSyntaxValidator;

#[async_trait]
impl SyntaxValidator for NoopSyntaxValidator {
    async fn validate(&self, _filename: &str, _code: &str) -> ValidationResult {
        ValidationResult::valid()
    }
}

/// Structural check for JS/TS/Python sources.
///
/// Rejects empty files and unbalanced `()[]{}` outside literals and comments.
/// Warns (without rejecting) when a test file declares no test.
#[derive(Debug, Default, Clone, Copy)]
pub struct DelimiterSyntaxValidator;

#[async_trait]
impl SyntaxValidator for DelimiterSyntaxValidator {
    async fn validate(&self, filename: &str, code: &str) -> ValidationResult {
        check_source(filename, code)
    }
}

fn test_declaration_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)\b(test|it|describe)(\.\w+)?\s*\(|^\s*(async\s+)?def\s+test_|^\s*Scenario:")
            .ok()
    })
    .as_ref()
}

/// Whether `filename` follows a common test-file naming convention.
pub fn is_test_filename(filename: &str) -> bool {
    let base = filename.rsplit('/').next().unwrap_or(filename);
    base.contains(".spec.")
        || base.contains(".test.")
        || base.contains(".cy.")
        || base.starts_with("test_")
        || base.ends_with("_test.py")
        || base.ends_with(".feature")
}

/// Why `filename` may not be written into the target repository, if it may not.
///
/// Generated files must stay relative to the repository root and out of
/// hidden directories such as `.github/`, where CI configuration lives.
pub fn unsafe_path_reason(filename: &str) -> Option<&'static str> {
    if filename.starts_with('/') || filename.contains('\\') {
        return Some("absolute or non-portable path");
    }
    if filename.len() > 1 && filename.as_bytes()[1] == b':' {
        return Some("absolute or non-portable path");
    }
    for segment in filename.split('/') {
        match segment {
            "" => return Some("empty path segment"),
            ".." => return Some("parent directory reference"),
            s if s.starts_with('.') => return Some("hidden file or directory"),
            _ => {}
        }
    }
    None
}

fn check_source(filename: &str, code: &str) -> ValidationResult {
    if code.trim().is_empty() {
        return ValidationResult::invalid(
            ValidationWarning::new(format!("{filename} is empty"))
                .with_suggestion("regenerate the file"),
        );
    }

    let python = filename.ends_with(".py");
    if let Err(message) = balance(code, python) {
        return ValidationResult::invalid(ValidationWarning::new(message));
    }

    let mut warnings = Vec::new();
    let declares_test = test_declaration_re().map_or(true, |re| re.is_match(code));
    if is_test_filename(filename) && !declares_test {
        warnings.push(
            ValidationWarning::new(format!("{filename} declares no test"))
                .with_suggestion("add at least one test block"),
        );
    }
    ValidationResult {
        valid: true,
        warnings,
    }
}

fn closing_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

fn balance(code: &str, python: bool) -> Result<(), String> {
    let chars: Vec<char> = code.chars().collect();
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut line = 1usize;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            '\n' => line += 1,
            '/' if !python && next == Some('/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '#' if python => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '/' if !python && next == Some('*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    if chars[i] == '\n' {
                        line += 1;
                    }
                    i += 1;
                }
                i += 2;
                continue;
            }
            '"' | '\'' | '`' => {
                let quote = c;
                i += 1;
                while i < chars.len() && chars[i] != quote {
                    if chars[i] == '\\' {
                        i += 1;
                    } else if chars[i] == '\n' {
                        if quote != '`' && !python {
                            return Err(format!("unterminated string literal on line {line}"));
                        }
                        line += 1;
                    }
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(format!("unterminated string literal on line {line}"));
                }
            }
            '(' | '[' | '{' => stack.push((c, line)),
            ')' | ']' | '}' => match stack.pop() {
                Some((open, _)) if closing_for(open) == c => {}
                Some((open, open_line)) => {
                    return Err(format!(
                        "mismatched '{c}' on line {line}; '{open}' opened on line {open_line}"
                    ))
                }
                None => return Err(format!("unexpected '{c}' on line {line}")),
            },
            _ => {}
        }
        i += 1;
    }

    match stack.pop() {
        Some((open, open_line)) => Err(format!("unclosed '{open}' opened on line {open_line}")),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_accepts_anything() {
        let result = NoopSyntaxValidator.validate("x.spec.ts", "}{").await;
        assert!(result.valid);
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_balanced_typescript_is_valid() {
        let code = r#"
import { test, expect } from '@playwright/test';
// a comment with ( unbalanced
test('login works', async ({ page }) => {
  await page.goto(`/login?next=${encodeURIComponent("/")}`);
  /* block ) comment */
  expect([1, 2]).toHaveLength(2);
});
"#;
        let result = DelimiterSyntaxValidator.validate("login.spec.ts", code).await;
        assert!(result.valid, "{:?}", result.warnings);
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_unclosed_brace_is_invalid() {
        let code = "test('a', () => {\n  expect(1).toBe(1);\n";
        let result = DelimiterSyntaxValidator.validate("a.spec.ts", code).await;
        assert!(!result.valid);
        assert!(result.warnings[0].message.contains("unclosed '{'"));
    }

    #[tokio::test]
    async fn test_mismatched_delimiter_is_invalid() {
        let result = DelimiterSyntaxValidator.validate("a.ts", "foo(]").await;
        assert!(!result.valid);
        assert!(result.warnings[0].message.contains("mismatched"));
    }

    #[tokio::test]
    async fn test_empty_file_is_invalid() {
        let result = DelimiterSyntaxValidator.validate("a.spec.ts", "  \n").await;
        assert!(!result.valid);
        assert!(result.warnings[0].suggestion.is_some());
    }

    #[tokio::test]
    async fn test_missing_test_declaration_only_warns() {
        let code = "export const helper = () => 1;\n";
        let result = DelimiterSyntaxValidator.validate("helper.spec.ts", code).await;
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_python_comments_and_tests() {
        let code = "# (unbalanced in comment\ndef test_login(page):\n    assert page.title() == 'x'\n";
        let result = DelimiterSyntaxValidator.validate("test_login.py", code).await;
        assert!(result.valid, "{:?}", result.warnings);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_unsafe_paths_are_flagged() {
        assert_eq!(unsafe_path_reason("tests/login.spec.ts"), None);
        assert_eq!(unsafe_path_reason("login.spec.ts"), None);
        assert_eq!(
            unsafe_path_reason("../../.github/workflows/pwn.yml"),
            Some("parent directory reference")
        );
        assert_eq!(
            unsafe_path_reason(".github/workflows/pwn.yml"),
            Some("hidden file or directory")
        );
        assert_eq!(
            unsafe_path_reason("tests/../../x.ts"),
            Some("parent directory reference")
        );
        assert!(unsafe_path_reason("/etc/passwd").is_some());
        assert!(unsafe_path_reason("C:/temp/a.ts").is_some());
        assert!(unsafe_path_reason("tests\\a.ts").is_some());
        assert!(unsafe_path_reason("tests//a.ts").is_some());
        assert!(unsafe_path_reason("").is_some());
    }

    #[test]
    fn test_is_test_filename() {
        assert!(is_test_filename("tests/login.spec.ts"));
        assert!(is_test_filename("cart.cy.js"));
        assert!(is_test_filename("test_cart.py"));
        assert!(!is_test_filename("pages/LoginPage.ts"));
    }
}
