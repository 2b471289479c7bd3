use std::path::{Path, PathBuf};

use super::*;

fn builtin() -> CommandsetRegistry {
    CommandsetRegistry::builtin().expect("builtin catalog must parse")
}

fn definition(name: &str) -> CommandsetDefinition {
    CommandsetDefinition {
        name: name.to_string(),
        description: "test commandset".to_string(),
        category: "utility".to_string(),
        version: "1.0.0".to_string(),
        dependencies: Default::default(),
        roots: Vec::new(),
        commands: vec![format!(".claude/commands/{name}/run.md")],
        agents: Vec::new(),
        settings: Vec::new(),
    }
}

fn invalid_reason(definition: &CommandsetDefinition) -> String {
    match CommandsetRegistry::validate_definition(definition) {
        Err(CommandsetError::InvalidDefinition { reason }) => reason,
        other => panic!("expected InvalidDefinition, got {other:?}"),
    }
}

fn test_dir() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    std::env::temp_dir().join(format!("cmdkit-core-tests-{nanos}"))
}

#[test]
fn builtin_catalog_loads_every_commandset() {
    let registry = builtin();
    let names = registry.names().collect::<Vec<_>>();
    assert_eq!(names, vec!["bug", "cc-sdd", "cc-sdd-agent", "document-review"]);

    for definition in registry.definitions() {
        CommandsetRegistry::validate_definition(definition).expect("builtin must validate");
    }
    assert!(registry.contains(PRIMARY_WORKFLOW));
    assert!(registry.contains(AUXILIARY_COMMANDSET));
}

#[test]
fn builtin_document_review_depends_on_primary_workflow() {
    let registry = builtin();
    let review = registry.get_definition("document-review");
    assert!(review.dependencies.contains(PRIMARY_WORKFLOW));
    assert!(registry.get_definition(PRIMARY_WORKFLOW).dependencies.is_empty());
}

#[test]
fn get_definition_unknown_name_returns_placeholder() {
    let registry = builtin();
    let placeholder = registry.get_definition("does-not-exist");
    assert_eq!(placeholder.name, "does-not-exist");
    assert_eq!(placeholder.version, "0.0.0");
    assert_eq!(placeholder.file_count(), 0);
    assert_eq!(registry.get_version("does-not-exist"), "0.0.0");
}

#[test]
fn get_all_versions_matches_definitions() {
    let registry = builtin();
    let versions = registry.get_all_versions();
    assert_eq!(versions.len(), 4);
    assert_eq!(versions.get("cc-sdd").map(String::as_str), Some("2.1.0"));
    assert_eq!(registry.load_all_definitions().len(), 4);
}

#[test]
fn validate_definition_reports_distinct_reasons() {
    let mut empty_name = definition("x");
    empty_name.name = "  ".to_string();
    let mut no_description = definition("x");
    no_description.description = String::new();
    let mut bad_category = definition("x");
    bad_category.category = "plugin".to_string();
    let mut bad_version = definition("x");
    bad_version.version = "1.0".to_string();
    let mut no_files = definition("x");
    no_files.commands.clear();

    let reasons = [
        invalid_reason(&empty_name),
        invalid_reason(&no_description),
        invalid_reason(&bad_category),
        invalid_reason(&bad_version),
        invalid_reason(&no_files),
    ];
    assert!(reasons[0].contains("name"));
    assert!(reasons[1].contains("description"));
    assert!(reasons[2].contains("category"));
    assert!(reasons[3].contains("version"));
    assert!(reasons[4].contains("no files"));

    let unique = reasons.iter().collect::<std::collections::BTreeSet<_>>();
    assert_eq!(unique.len(), reasons.len());
}

#[test]
fn validate_definition_rejects_build_metadata() {
    let mut with_build = definition("x");
    with_build.version = "1.0.0+build.5".to_string();
    assert!(invalid_reason(&with_build).contains("version"));

    let mut prerelease = definition("x");
    prerelease.version = "1.0.0-beta.2".to_string();
    CommandsetRegistry::validate_definition(&prerelease).expect("prerelease is valid");
}

#[test]
fn from_toml_rejects_duplicate_names() {
    let catalog = r#"
[[commandsets]]
name = "dup"
description = "first"
category = "utility"
version = "1.0.0"
commands = ["a.md"]

[[commandsets]]
name = "dup"
description = "second"
category = "utility"
version = "1.0.1"
commands = ["b.md"]
"#;
    let err = CommandsetRegistry::from_toml_str(catalog).expect_err("must reject duplicates");
    assert_eq!(err.code(), "INVALID_DEFINITION");
}

#[test]
fn from_toml_rejects_malformed_catalog() {
    let err = CommandsetRegistry::from_toml_str("[[commandsets]]\nname = 3\n")
        .expect_err("must reject malformed catalog");
    assert_eq!(err.code(), "SERIALIZATION_ERROR");
}

#[test]
fn owned_roots_fall_back_to_file_parents() {
    let mut def = definition("x");
    def.settings = vec![".kiro/settings/x.json".to_string()];
    assert_eq!(
        def.owned_roots(),
        vec![".claude/commands/x".to_string(), ".kiro/settings".to_string()]
    );

    def.roots = vec!["custom".to_string()];
    assert_eq!(def.owned_roots(), vec!["custom".to_string()]);
}

#[test]
fn files_are_tagged_with_category() {
    let registry = builtin();
    let agent = registry.get_definition("cc-sdd-agent");
    let agents = agent
        .files()
        .filter(|file| file.category == FileCategory::Agents)
        .count();
    assert_eq!(agents, agent.agents.len());
    assert_eq!(agent.files().count(), agent.file_count());
}

#[test]
fn is_newer_version_treats_missing_installed_as_first_install() {
    assert!(is_newer_version(None, "1.0.0"));
    assert!(is_newer_version(Some(""), "1.0.0"));
    assert!(is_newer_version(Some("   "), "1.0.0"));
}

#[test]
fn is_newer_version_compares_numeric_triples() {
    assert!(is_newer_version(Some("1.0.0"), "1.0.1"));
    assert!(is_newer_version(Some("1.9.9"), "2.0.0"));
    assert!(is_newer_version(Some("1.2.10"), "1.10.0"));
    assert!(!is_newer_version(Some("1.0.0"), "1.0.0"));
    assert!(!is_newer_version(Some("2.0.0"), "1.9.9"));
}

#[test]
fn is_newer_version_orders_prerelease_before_release() {
    assert!(is_newer_version(Some("2.0.0-beta.1"), "2.0.0"));
    assert!(!is_newer_version(Some("2.0.0"), "2.0.0-beta.1"));
    assert!(is_newer_version(Some("2.0.0-alpha"), "2.0.0-beta"));
}

#[test]
fn is_newer_version_is_asymmetric_over_sample() {
    let versions = ["0.1.0", "1.0.0-alpha", "1.0.0-rc.1", "1.0.0", "1.0.1", "1.1.0", "2.0.0"];
    for (i, lower) in versions.iter().enumerate() {
        for (j, upper) in versions.iter().enumerate() {
            let expected = i < j;
            assert_eq!(
                is_newer_version(Some(*lower), upper),
                expected,
                "{lower} vs {upper}"
            );
        }
    }
}

#[test]
fn is_newer_version_handles_unparseable_inputs() {
    assert!(is_newer_version(Some("garbage"), "1.0.0"));
    assert!(!is_newer_version(Some("1.0.0"), "garbage"));
    assert!(!is_newer_version(None, "garbage"));
}

#[test]
fn io_error_distinguishes_permission_denied() {
    let denied = CommandsetError::io(
        "failed to write",
        Path::new("a.md"),
        std::io::Error::from(std::io::ErrorKind::PermissionDenied),
    );
    assert_eq!(denied.code(), "PERMISSION_DENIED");

    let other = CommandsetError::io(
        "failed to write",
        Path::new("a.md"),
        std::io::Error::from(std::io::ErrorKind::Other),
    );
    assert_eq!(other.code(), "IO_ERROR");
    assert_eq!(other.to_string(), "failed to write: a.md");
}

#[test]
fn memory_storage_lists_relative_files_recursively() {
    let storage = MemoryStorage::new();
    storage
        .write(Path::new("/p/a/one.md"), b"1")
        .expect("must write");
    storage
        .write(Path::new("/p/a/b/two.md"), b"2")
        .expect("must write");
    storage
        .write(Path::new("/p/other.md"), b"3")
        .expect("must write");

    let listed = storage.list(Path::new("/p/a")).expect("must list");
    assert_eq!(
        listed,
        vec![PathBuf::from("b/two.md"), PathBuf::from("one.md")]
    );
    assert!(storage.is_dir(Path::new("/p/a/b")));
    assert!(storage
        .list(Path::new("/missing"))
        .expect("must list")
        .is_empty());
}

#[test]
fn memory_storage_remove_drops_subtree() {
    let storage = MemoryStorage::new();
    storage
        .write(Path::new("/p/a/one.md"), b"1")
        .expect("must write");
    storage
        .write(Path::new("/p/keep.md"), b"2")
        .expect("must write");
    storage.remove(Path::new("/p/a")).expect("must remove");

    assert!(!storage.exists(Path::new("/p/a")));
    assert!(!storage.exists(Path::new("/p/a/one.md")));
    assert!(storage.exists(Path::new("/p/keep.md")));
}

#[test]
fn memory_storage_denied_prefix_reports_permission_denied() {
    let storage = MemoryStorage::new();
    storage.deny_writes("/p/locked");
    let err = storage
        .write(Path::new("/p/locked/file.md"), b"x")
        .expect_err("write must fail");
    assert_eq!(err.kind(), std::io::ErrorKind::PermissionDenied);

    storage.allow_writes();
    storage
        .write(Path::new("/p/locked/file.md"), b"x")
        .expect("write must succeed once allowed");
}

#[test]
fn fs_storage_round_trip_and_listing() {
    let root = test_dir();
    let storage = FsStorage;
    storage
        .write(&root.join("nested/deep/file.txt"), b"hello")
        .expect("must write");
    storage
        .copy(&root.join("nested/deep/file.txt"), &root.join("copy/file.txt"))
        .expect("must copy");

    assert_eq!(
        storage
            .read_to_string(&root.join("copy/file.txt"))
            .expect("must read"),
        "hello"
    );
    let listed = storage.list(&root).expect("must list");
    assert_eq!(
        listed,
        vec![
            PathBuf::from("copy/file.txt"),
            PathBuf::from("nested/deep/file.txt")
        ]
    );

    storage.remove(&root.join("nested")).expect("must remove dir");
    assert!(!root.join("nested").exists());
    storage
        .remove(&root.join("never-existed"))
        .expect("missing path is fine");

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn create_new_refuses_existing_paths() {
    let storage = MemoryStorage::new();
    storage
        .create_new(Path::new("/p/.lock"), b"1")
        .expect("first claim must succeed");
    let err = storage
        .create_new(Path::new("/p/.lock"), b"2")
        .expect_err("second claim must fail");
    assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);
    assert_eq!(storage.read(Path::new("/p/.lock")).expect("read"), b"1".to_vec());

    storage.remove(Path::new("/p/.lock")).expect("release");
    storage
        .create_new(Path::new("/p/.lock"), b"3")
        .expect("claim after release must succeed");

    let root = test_dir();
    let fs_storage = FsStorage;
    let lock = root.join("state/.lock");
    fs_storage.create_new(&lock, b"1").expect("must create");
    let err = fs_storage
        .create_new(&lock, b"2")
        .expect_err("existing file must be refused");
    assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);
    assert_eq!(fs_storage.read(&lock).expect("read"), b"1".to_vec());

    let _ = std::fs::remove_dir_all(&root);
}
