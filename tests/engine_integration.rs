//! End-to-end tests for the generation pipeline.
//!
//! Each test copies Go sources into a temporary module root, runs the
//! engine and checks the shadow files and the overlay manifest.

use std::fs;
use std::path::{Path, PathBuf};

use inco::manifest::MANIFEST_FILE;
use inco::{Config, Engine, IncoError, Manifest};
use tempfile::TempDir;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

/// Temp root holding a copy of `testdata/<fixture>`.
fn fixture_root(fixture: &str) -> (TempDir, PathBuf) {
    let temp = TempDir::new().expect("should create temp dir");
    let root = temp.path().canonicalize().unwrap();
    for entry in fs::read_dir(testdata_path().join(fixture)).unwrap() {
        let path = entry.unwrap().path();
        fs::copy(&path, root.join(path.file_name().unwrap())).unwrap();
    }
    (temp, root)
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn shadow_of(manifest: &Manifest, original: &Path) -> String {
    let shadow = manifest
        .replace
        .get(&original.display().to_string())
        .unwrap_or_else(|| panic!("{} not in manifest", original.display()));
    fs::read_to_string(shadow).expect("should read shadow")
}

fn run(root: &Path) -> Manifest {
    Engine::new(root)
        .expect("should create engine")
        .run()
        .expect("pipeline should succeed")
}

#[test]
fn test_manifest_lists_files_with_contracts() {
    let (_temp, root) = fixture_root("contracts");
    let manifest = run(&root);

    let mut originals: Vec<_> = manifest.replace.keys().cloned().collect();
    originals.sort();
    let expected: Vec<_> = ["loader.go", "transfer.go", "user.go"]
        .iter()
        .map(|f| root.join(f).display().to_string())
        .collect();
    assert_eq!(originals, expected);

    let cache = root.join(".inco_cache");
    for shadow in manifest.replace.values() {
        let shadow = Path::new(shadow);
        assert!(shadow.is_absolute());
        assert_eq!(shadow.parent().unwrap(), cache);
        assert!(shadow.is_file());
    }

    let json = fs::read_to_string(cache.join(MANIFEST_FILE)).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["Replace"].as_object().unwrap().len(), 3);
    assert!(json.contains("\"Replace\""));
}

#[test]
fn test_nil_pointer_guard() {
    let (_temp, root) = fixture_root("contracts");
    let manifest = run(&root);
    let user = root.join("user.go");
    let shadow = shadow_of(&manifest, &user);

    let guard = format!(
        "\tif u == nil {{\n\t\tpanic(\"inco // require -nd violation: [u] is defaulted (nil) at {}:19\")\n\t}}\n",
        user.display()
    );
    assert!(shadow.contains(&guard), "{shadow}");
    assert!(!shadow.contains("@require"));
}

#[test]
fn test_expression_guard_with_message() {
    let (_temp, root) = fixture_root("contracts");
    let manifest = run(&root);
    let user = root.join("user.go");
    let shadow = shadow_of(&manifest, &user);

    let guard = format!(
        "\tif !(len(name) > 0) {{\n\t\tpanic(\"name required at {0}:24\")\n\t}}\n//line {0}:25\n\tu.Name = name\n",
        user.display()
    );
    assert!(shadow.contains(&guard), "{shadow}");
}

#[test]
fn test_multiline_must_renames_placeholder() {
    let (_temp, root) = fixture_root("contracts");
    let manifest = run(&root);
    let user = root.join("user.go");
    let shadow = shadow_of(&manifest, &user);

    let expected = format!(
        "\tfile, _inco_err_34 := os.Open(\n\t\tpath,\n\t)\n\tif _inco_err_34 != nil {{\n\t\tpanic(\"inco // must violation at {}:34: \" + _inco_err_34.Error())\n\t}}\n",
        user.display()
    );
    assert!(shadow.contains(&expected), "{shadow}");
}

#[test]
fn test_custom_return_values() {
    let (_temp, root) = fixture_root("contracts");
    let manifest = run(&root);
    let shadow = shadow_of(&manifest, &root.join("user.go"));

    assert!(
        shadow.contains("\tif db == nil {\n\t\treturn nil, ErrNotFound\n\t}\n"),
        "{shadow}"
    );
}

#[test]
fn test_guards_follow_source_order() {
    let (_temp, root) = fixture_root("contracts");
    let manifest = run(&root);
    let shadow = shadow_of(&manifest, &root.join("transfer.go"));

    let positions: Vec<usize> = ["if from == nil", "if to == nil", "if !(amount > 0)"]
        .iter()
        .map(|needle| shadow.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{shadow}");
}

#[test]
fn test_inline_log_must_adds_import() {
    let (_temp, root) = fixture_root("contracts");
    let manifest = run(&root);
    let loader = root.join("loader.go");
    let shadow = shadow_of(&manifest, &loader);

    assert!(shadow.contains("import \"log\""), "{shadow}");
    assert!(shadow.contains("\tdata, err := os.ReadFile(path)\n\tif err != nil {\n"));
    assert!(shadow.contains(&format!(
        "\t\tlog.Println(\"inco // must -log violation at {}:6: \" + err.Error())\n\t\treturn nil, err\n\t}}\n",
        loader.display()
    )));
}

#[test]
fn test_line_markers_point_at_original_lines() {
    let (_temp, root) = fixture_root("contracts");
    let manifest = run(&root);
    let user = root.join("user.go");
    let shadow = shadow_of(&manifest, &user);

    let marker = format!(
        "//line {}:20\n\treturn \"hello \" + u.Name\n",
        user.display()
    );
    assert!(shadow.contains(&marker), "{shadow}");
    assert!(shadow.contains(&format!("//line {}:38\n\treturn file\n", user.display())));
    for line in shadow.lines().filter(|l| l.contains("//line ")) {
        assert!(line.starts_with("//line "), "marker not at column 0: {line}");
    }
}

#[test]
fn test_pipeline_is_deterministic() {
    let (_temp, root) = fixture_root("contracts");
    let first = run(&root);
    let contents: Vec<String> = first.replace.values().map(|p| fs::read_to_string(p).unwrap()).collect();

    let second = run(&root);
    assert_eq!(first, second);
    let again: Vec<String> = second.replace.values().map(|p| fs::read_to_string(p).unwrap()).collect();
    assert_eq!(contents, again);
}

#[test]
fn test_no_directives_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    fs::copy(
        testdata_path().join("contracts/plain.go"),
        root.join("plain.go"),
    )
    .unwrap();

    let manifest = run(&root);
    assert!(manifest.is_empty());
    assert!(!root.join(".inco_cache").exists());
}

#[test]
fn test_nested_ignore_file_is_scoped() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    let contract = |pkg: &str| {
        format!("package {pkg}\n\nfunc F(x int) {{\n\t// @require x > 0\n\tprintln(x)\n}}\n")
    };
    write(&root, "api.pb.go", &contract("api"));
    write(&root, "gen/types.pb.go", &contract("gen"));
    write(&root, "gen/service.go", &contract("gen"));
    write(&root, "gen/.incoignore", "# generated\n*.pb.go\n");

    let manifest = run(&root);
    let mut originals: Vec<_> = manifest.replace.keys().cloned().collect();
    originals.sort();
    assert_eq!(
        originals,
        vec![
            root.join("api.pb.go").display().to_string(),
            root.join("gen/service.go").display().to_string(),
        ]
    );
}

#[test]
fn test_invalid_expression_aborts_run() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    write(
        &root,
        "a.go",
        "package a\n\nfunc F(x int) {\n\t// @require x > 0\n\tprintln(x)\n}\n",
    );
    write(
        &root,
        "b.go",
        "package a\n\nfunc G(x int) {\n\t// @require x >\n\tprintln(x)\n}\n",
    );

    let err = Engine::new(&root).unwrap().run().unwrap_err();
    assert!(matches!(err, IncoError::InvalidExpression { .. }));
    assert!(!root.join(".inco_cache").join(MANIFEST_FILE).exists());
}

#[test]
fn test_explicit_config() {
    let (_temp, root) = fixture_root("contracts");
    let config = Config {
        excluded_paths: vec!["user.go".to_string()],
        ..Config::default()
    };
    let mut engine = Engine::with_config(&root, config).unwrap();
    let manifest = engine.run().unwrap();
    assert_eq!(manifest.len(), 2);
    assert!(!manifest
        .replace
        .contains_key(&root.join("user.go").display().to_string()));

    assert!(engine.clean().unwrap());
    assert!(!root.join(".inco_cache").exists());
}
