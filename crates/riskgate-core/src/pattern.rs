//! Test pattern detection over a repository snapshot.
//!
//! Detection never fails: every probe is best-effort and an unrecognisable
//! repository yields [`TestPattern::fallback`].

use serde_json::Value;
use tracing::{debug, info};

use crate::collaborators::{probe, DirEntry, RepoSnapshot};
use crate::domain::{
    CodeExample, ExampleKind, StructureType, TestDirectories, TestPattern, DEFAULT_FRAMEWORK,
};
use crate::validators::is_test_filename;

/// Framework config files, probed in order.
pub const FRAMEWORK_CONFIG_FILES: &[(&str, &str)] = &[
    ("playwright.config.ts", "playwright"),
    ("playwright.config.js", "playwright"),
    ("cypress.config.ts", "cypress"),
    ("cypress.config.js", "cypress"),
    ("cypress.json", "cypress"),
    ("wdio.conf.ts", "webdriverio"),
    ("wdio.conf.js", "webdriverio"),
    ("vitest.config.ts", "vitest"),
    ("jest.config.ts", "jest"),
    ("jest.config.js", "jest"),
    ("pytest.ini", "pytest"),
];

/// Manifest dependency names, probed in order.
pub const MANIFEST_FRAMEWORKS: &[(&str, &str)] = &[
    ("@playwright/test", "playwright"),
    ("playwright", "playwright"),
    ("cypress", "cypress"),
    ("webdriverio", "webdriverio"),
    ("@wdio/cli", "webdriverio"),
    ("vitest", "vitest"),
    ("jest", "jest"),
    ("mocha", "mocha"),
];

/// Paired POM layouts `(tests, pages, utils)`, probed first.
pub const POM_LAYOUTS: &[(&str, &str, &str)] = &[
    ("tests", "tests/pages", "tests/utils"),
    ("e2e", "e2e/pages", "e2e/utils"),
    ("tests/e2e", "tests/e2e/pages", "tests/e2e/utils"),
    ("cypress/e2e", "cypress/pages", "cypress/support"),
];

/// Feature-file layouts `(features, step definitions)`.
pub const FEATURE_LAYOUTS: &[(&str, &str)] = &[
    ("features", "features/step_definitions"),
    ("tests/features", "tests/features/steps"),
];

/// Flat test directories, probed last.
pub const FLAT_LAYOUTS: &[&str] = &["tests", "e2e", "test", "__tests__", "cypress/e2e"];

/// Exemplar caps per kind.
pub const MAX_TEST_EXAMPLES: usize = 2;
pub const MAX_PAGE_EXAMPLES: usize = 1;
pub const MAX_UTIL_EXAMPLES: usize = 1;

/// Exemplar content is truncated to this many bytes (on a char boundary).
pub const MAX_EXAMPLE_BYTES: usize = 4_000;

const SOURCE_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".mjs", ".py", ".feature"];

/// Infers framework and layout of an existing test suite.
pub struct TestPatternDetector<'a> {
    snapshot: &'a dyn RepoSnapshot,
}

impl<'a> TestPatternDetector<'a> {
    pub fn new(snapshot: &'a dyn RepoSnapshot) -> Self {
        Self { snapshot }
    }

    /// Run all probes and assemble a [`TestPattern`].
    pub async fn detect(&self) -> TestPattern {
        let framework = self.detect_framework().await;

        let Some((structure_type, directories)) = self.detect_structure().await else {
            let mut pattern = TestPattern::fallback();
            if let Some(framework) = framework {
                pattern.framework = framework;
            }
            info!(framework = %pattern.framework, "no test layout found; using default POM layout");
            return pattern;
        };

        let examples = self.collect_examples(&directories).await;
        let pattern = TestPattern {
            detected: true,
            framework: framework.unwrap_or_else(|| DEFAULT_FRAMEWORK.to_string()),
            structure_type,
            directories,
            examples,
        };
        info!(
            framework = %pattern.framework,
            structure = ?pattern.structure_type,
            tests_dir = %pattern.directories.tests,
            examples = pattern.examples.len(),
            "test pattern detected"
        );
        pattern
    }

    async fn detect_framework(&self) -> Option<String> {
        for (file, framework) in FRAMEWORK_CONFIG_FILES {
            if probe(file, self.snapshot.read_file(file)).await.is_some() {
                debug!(config = %file, framework = %framework, "framework config found");
                return Some(framework.to_string());
            }
        }

        let manifest = probe("package.json", self.snapshot.read_file("package.json")).await?;
        let framework = framework_from_manifest(&manifest);
        if let Some(framework) = &framework {
            debug!(framework = %framework, "framework found in package.json");
        }
        framework
    }

    async fn detect_structure(&self) -> Option<(StructureType, TestDirectories)> {
        for (tests, pages, utils) in POM_LAYOUTS {
            if self.has_dir(tests).await && self.has_dir(pages).await {
                let utils = if self.has_dir(utils).await {
                    Some(utils.to_string())
                } else {
                    None
                };
                return Some((
                    StructureType::Pom,
                    TestDirectories {
                        tests: tests.to_string(),
                        pages: Some(pages.to_string()),
                        utils,
                    },
                ));
            }
        }

        for (features, steps) in FEATURE_LAYOUTS {
            if self.has_dir(features).await {
                let utils = if self.has_dir(steps).await {
                    Some(steps.to_string())
                } else {
                    None
                };
                return Some((
                    StructureType::FeatureBased,
                    TestDirectories {
                        tests: features.to_string(),
                        pages: None,
                        utils,
                    },
                ));
            }
        }

        for tests in FLAT_LAYOUTS {
            if self.has_dir(tests).await {
                return Some((StructureType::Flat, TestDirectories::flat(*tests)));
            }
        }

        None
    }

    async fn has_dir(&self, path: &str) -> bool {
        probe(path, self.snapshot.list_dir(path)).await.is_some()
    }

    async fn collect_examples(&self, dirs: &TestDirectories) -> Vec<CodeExample> {
        let mut examples = Vec::new();
        self.collect_from(&dirs.tests, ExampleKind::Test, MAX_TEST_EXAMPLES, &mut examples)
            .await;
        if let Some(pages) = &dirs.pages {
            self.collect_from(pages, ExampleKind::PageObject, MAX_PAGE_EXAMPLES, &mut examples)
                .await;
        }
        if let Some(utils) = &dirs.utils {
            self.collect_from(utils, ExampleKind::Utility, MAX_UTIL_EXAMPLES, &mut examples)
                .await;
        }
        examples
    }

    async fn collect_from(
        &self,
        dir: &str,
        kind: ExampleKind,
        limit: usize,
        out: &mut Vec<CodeExample>,
    ) {
        let Some(entries) = probe(dir, self.snapshot.list_dir(dir)).await else {
            return;
        };

        let mut taken = 0usize;
        for entry in candidate_files(&entries, kind) {
            if taken >= limit {
                break;
            }
            let path = format!("{}/{}", dir.trim_end_matches('/'), entry.name);
            // Individual fetch failures only skip the file.
            if let Some(content) = probe(&path, self.snapshot.read_file(&path)).await {
                out.push(CodeExample {
                    path,
                    kind,
                    content: truncate(content, MAX_EXAMPLE_BYTES),
                });
                taken += 1;
            }
        }
    }
}

fn candidate_files(entries: &[DirEntry], kind: ExampleKind) -> Vec<&DirEntry> {
    let mut files: Vec<&DirEntry> = entries
        .iter()
        .filter(|e| !e.is_dir)
        .filter(|e| SOURCE_EXTENSIONS.iter().any(|ext| e.name.ends_with(ext)))
        .filter(|e| kind != ExampleKind::Test || is_test_filename(&e.name))
        .collect();
    files.sort_by(|a, b| a.name.cmp(&b.name));
    files
}

/// First known test framework among `dependencies` and `devDependencies`.
pub fn framework_from_manifest(manifest: &str) -> Option<String> {
    let value: Value = match serde_json::from_str(manifest) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "package.json is not valid JSON");
            return None;
        }
    };

    let has_dep = |name: &str| {
        ["devDependencies", "dependencies"]
            .iter()
            .any(|section| value[*section].get(name).is_some())
    };

    MANIFEST_FRAMEWORKS
        .iter()
        .find(|(dep, _)| has_dep(dep))
        .map(|(_, framework)| framework.to_string())
}

fn truncate(mut content: String, max: usize) -> String {
    if content.len() > max {
        let mut cut = max;
        while !content.is_char_boundary(cut) {
            cut -= 1;
        }
        content.truncate(cut);
    }
    content
}
