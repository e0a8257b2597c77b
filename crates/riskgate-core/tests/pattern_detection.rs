//! Pattern detection against in-memory and on-disk repositories.

use riskgate_core::fakes::MemoryRepoSnapshot;
use riskgate_core::{
    ExampleKind, LocalRepoSnapshot, StructureType, TestDirectories, TestPatternDetector,
};

#[tokio::test]
async fn test_unrecognisable_repo_falls_back_to_default_pom() {
    let repo = MemoryRepoSnapshot::new()
        .with_file("src/main.ts", "export {}")
        .with_file("README.md", "# app");

    let pattern = TestPatternDetector::new(&repo).detect().await;

    assert!(!pattern.detected);
    assert_eq!(pattern.structure_type, StructureType::Pom);
    assert_eq!(pattern.directories, TestDirectories::default_pom());
    assert_eq!(pattern.framework, "playwright");
    assert!(pattern.examples.is_empty());
}

#[tokio::test]
async fn test_framework_known_but_no_layout_stays_undetected() {
    let repo = MemoryRepoSnapshot::new()
        .with_file("package.json", r#"{"devDependencies": {"cypress": "^13"}}"#);

    let pattern = TestPatternDetector::new(&repo).detect().await;

    assert!(!pattern.detected);
    assert_eq!(pattern.framework, "cypress");
    assert_eq!(pattern.structure_type, StructureType::Pom);
}

#[tokio::test]
async fn test_pom_layout_with_examples() {
    let repo = MemoryRepoSnapshot::new()
        .with_file("playwright.config.ts", "export default {}")
        .with_file("e2e/login.spec.ts", "test('login', async () => {})")
        .with_file("e2e/cart.spec.ts", "test('cart', async () => {})")
        .with_file("e2e/search.spec.ts", "test('search', async () => {})")
        .with_file("e2e/pages/LoginPage.ts", "export class LoginPage {}")
        .with_file("e2e/pages/CartPage.ts", "export class CartPage {}")
        .with_file("e2e/utils/auth.ts", "export const login = () => {}");

    let pattern = TestPatternDetector::new(&repo).detect().await;

    assert!(pattern.detected);
    assert_eq!(pattern.framework, "playwright");
    assert_eq!(pattern.structure_type, StructureType::Pom);
    assert_eq!(pattern.directories.tests, "e2e");
    assert_eq!(pattern.directories.pages.as_deref(), Some("e2e/pages"));
    assert_eq!(pattern.directories.utils.as_deref(), Some("e2e/utils"));

    let kinds: Vec<ExampleKind> = pattern.examples.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ExampleKind::Test,
            ExampleKind::Test,
            ExampleKind::PageObject,
            ExampleKind::Utility
        ]
    );
    assert_eq!(pattern.examples[0].path, "e2e/cart.spec.ts");
}

#[tokio::test]
async fn test_flat_layout_detected_from_manifest() {
    let repo = MemoryRepoSnapshot::new()
        .with_file("package.json", r#"{"devDependencies": {"jest": "^29"}}"#)
        .with_file("__tests__/math.test.js", "it('adds', () => {})");

    let pattern = TestPatternDetector::new(&repo).detect().await;

    assert!(pattern.detected);
    assert_eq!(pattern.framework, "jest");
    assert_eq!(pattern.structure_type, StructureType::Flat);
    assert_eq!(pattern.directories, TestDirectories::flat("__tests__"));
    assert_eq!(pattern.examples.len(), 1);
}

#[tokio::test]
async fn test_feature_layout_detected() {
    let repo = MemoryRepoSnapshot::new()
        .with_file("features/login.feature", "Feature: login")
        .with_file("features/step_definitions/login.steps.ts", "Given(...)");

    let pattern = TestPatternDetector::new(&repo).detect().await;

    assert!(pattern.detected);
    assert_eq!(pattern.structure_type, StructureType::FeatureBased);
    assert_eq!(
        pattern.directories.utils.as_deref(),
        Some("features/step_definitions")
    );
}

#[tokio::test]
async fn test_probe_failures_degrade_gracefully() {
    let repo = MemoryRepoSnapshot::new()
        .with_failure("playwright.config.ts")
        .with_failure("package.json")
        .with_file("tests/a.spec.ts", "test('a', () => {})")
        .with_file("tests/b.spec.ts", "test('b', () => {})")
        .with_failure("tests/a.spec.ts");

    let pattern = TestPatternDetector::new(&repo).detect().await;

    assert!(pattern.detected);
    assert_eq!(pattern.structure_type, StructureType::Flat);
    assert_eq!(pattern.examples.len(), 1);
    assert_eq!(pattern.examples[0].path, "tests/b.spec.ts");
}

#[tokio::test]
async fn test_local_checkout_detection() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::create_dir_all(root.join("tests/pages")).unwrap();
    std::fs::write(root.join("cypress.config.ts"), "export default {}").unwrap();
    std::fs::write(root.join("tests/home.cy.ts"), "it('home', () => {})").unwrap();
    std::fs::write(root.join("tests/pages/Home.ts"), "export class Home {}").unwrap();

    let repo = LocalRepoSnapshot::new(root);
    let pattern = TestPatternDetector::new(&repo).detect().await;

    assert!(pattern.detected);
    assert_eq!(pattern.framework, "cypress");
    assert_eq!(pattern.structure_type, StructureType::Pom);
    assert_eq!(pattern.directories.utils, None);
    assert_eq!(pattern.examples.len(), 2);
}
