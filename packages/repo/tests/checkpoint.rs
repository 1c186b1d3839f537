use std::cell::RefCell;
use std::fs;
use std::path::Path;

use paramfs_repo::{
    load_staged, Checkpoints, Config, Error, JsonParamStore, Repository, Result, VersionControl,
    FILTER_NAME,
};
use paramfs_tree::{keypath, Tree};
use serde_json::json;
use tempfile::TempDir;

/// Records every call instead of running git.
#[derive(Default)]
struct RecordingVcs {
    calls: RefCell<Vec<String>>,
}

impl RecordingVcs {
    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl VersionControl for RecordingVcs {
    fn add(&self, path: &Path) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("add {}", path.display()));
        Ok(())
    }

    fn lfs_install(&self) -> Result<()> {
        self.calls.borrow_mut().push("lfs install".to_string());
        Ok(())
    }

    fn lfs_track(&self, directory: &Path) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("lfs track {}", directory.display()));
        Ok(())
    }
}

fn setup(config: Config) -> (TempDir, Checkpoints<JsonParamStore, RecordingVcs>) {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join(".git")).unwrap();
    let repo = Repository::discover(dir.path(), &config).unwrap();
    let checkpoints = Checkpoints::new(repo, config, JsonParamStore::new(), RecordingVcs::default());
    (dir, checkpoints)
}

fn model() -> Tree<serde_json::Value> {
    Tree::from_json(&json!({
        "encoder": {
            "layer0": {"weight": [[1.0, 2.0], [3.0, 4.0]], "bias": [0.5, -0.5]},
            "layer1": {"weight": [[0.0]]}
        },
        "head": {"scale": 2.0}
    }))
    .unwrap()
}

#[test]
fn save_then_load_round_trips() {
    let (_dir, checkpoints) = setup(Config::default());
    let ckpt = Path::new("model.json");

    let report = checkpoints.save(ckpt, &model()).unwrap();
    assert_eq!(report.written.len(), 4);
    assert!(report.removed.is_empty());

    assert_eq!(checkpoints.load(ckpt).unwrap(), model());
}

#[test]
fn parameters_live_under_control_dir() {
    let (dir, checkpoints) = setup(Config::default());
    checkpoints.save(Path::new("model.json"), &model()).unwrap();

    let root = dir.path().canonicalize().unwrap();
    let leaf = root.join(".paramfs/model/encoder/layer0/bias/params/value.json");
    assert!(leaf.is_file());

    let listed = checkpoints.list(Path::new("model.json")).unwrap();
    assert_eq!(
        listed.get(&keypath!("head/scale")),
        Some(&root.join(".paramfs/model/head/scale"))
    );
}

#[test]
fn save_removes_parameters_missing_from_new_tree() {
    let (dir, checkpoints) = setup(Config::default());
    let ckpt = Path::new("model.json");
    checkpoints.save(ckpt, &model()).unwrap();

    let smaller = Tree::from_json(&json!({
        "encoder": {"layer0": {"weight": [[1.0]], "bias": [0.0]}},
        "head": {"scale": 3.0}
    }))
    .unwrap();
    let report = checkpoints.save(ckpt, &smaller).unwrap();

    assert_eq!(report.removed, vec![keypath!("encoder/layer1/weight")]);
    assert_eq!(checkpoints.load(ckpt).unwrap(), smaller);

    let root = dir.path().canonicalize().unwrap();
    assert!(!root.join(".paramfs/model/encoder/layer1").exists());
}

#[test]
fn leaf_can_become_group_and_back() {
    let (_dir, checkpoints) = setup(Config::default());
    let ckpt = Path::new("model.json");

    let flat = Tree::from_json(&json!({"w": 1})).unwrap();
    let nested = Tree::from_json(&json!({"w": {"a": 1, "b": 2}})).unwrap();

    checkpoints.save(ckpt, &flat).unwrap();
    let report = checkpoints.save(ckpt, &nested).unwrap();
    assert_eq!(report.removed, vec![keypath!("w")]);
    assert_eq!(checkpoints.load(ckpt).unwrap(), nested);

    let report = checkpoints.save(ckpt, &flat).unwrap();
    assert_eq!(report.removed, vec![keypath!("w/a"), keypath!("w/b")]);
    assert_eq!(checkpoints.load(ckpt).unwrap(), flat);
}

#[test]
fn stage_writes_metadata_and_adds_files() {
    let (_dir, checkpoints) = setup(Config::default());
    let ckpt = Path::new("model.json");
    let report = checkpoints.save(ckpt, &model()).unwrap();

    let staged = checkpoints.stage(ckpt, &report).unwrap();
    let metadata = load_staged(&staged).unwrap();
    assert_eq!(metadata["checkpoint"], json!("model"));
    assert_eq!(metadata["checkpoint_format"], json!("json"));
    assert_eq!(metadata["update_strategy"], json!("dense"));
    assert_eq!(
        metadata["params"],
        json!([
            "encoder/layer0/bias",
            "encoder/layer0/weight",
            "encoder/layer1/weight",
            "head/scale"
        ])
    );
    assert_eq!(metadata["removed"], json!([]));

    let ckpt_dir = checkpoints.repository().checkpoint_dir(ckpt).unwrap();
    assert_eq!(
        checkpoints.vcs().calls(),
        vec![
            format!("add {}", ckpt_dir.display()),
            format!("add {}", staged.display()),
        ]
    );
}

#[test]
fn track_adds_attribute_rule_once() {
    let (dir, checkpoints) = setup(Config::default());
    let ckpt = Path::new("models/bert.json");

    assert!(checkpoints.track(ckpt).unwrap());
    assert!(!checkpoints.track(ckpt).unwrap());

    let attributes = fs::read_to_string(dir.path().join(".gitattributes")).unwrap();
    assert_eq!(
        attributes,
        format!(
            "models/bert.json filter={f} diff={f} merge={f}\n",
            f = FILTER_NAME
        )
    );

    let calls = checkpoints.vcs().calls();
    assert_eq!(calls[0], "lfs install");
    assert!(calls[1].starts_with("lfs track "));
    assert!(calls[1].ends_with("bert"));
}

#[test]
fn stray_file_fails_by_default() {
    let (_dir, checkpoints) = setup(Config::default());
    let ckpt = Path::new("model.json");
    checkpoints.save(ckpt, &model()).unwrap();

    let ckpt_dir = checkpoints.repository().checkpoint_dir(ckpt).unwrap();
    fs::write(ckpt_dir.join("encoder/README"), b"notes").unwrap();

    assert!(matches!(
        checkpoints.load(ckpt),
        Err(Error::Tree(paramfs_tree::Error::StrayEntry { .. }))
    ));
}

#[test]
fn stray_file_skipped_when_configured() {
    let config = Config::from_vars([("PARAMFS_STRAY_ENTRIES", "skip")]).unwrap();
    let (_dir, checkpoints) = setup(config);
    let ckpt = Path::new("model.json");
    checkpoints.save(ckpt, &model()).unwrap();

    let ckpt_dir = checkpoints.repository().checkpoint_dir(ckpt).unwrap();
    fs::write(ckpt_dir.join("encoder/README"), b"notes").unwrap();

    assert_eq!(checkpoints.load(ckpt).unwrap(), model());
}

#[test]
fn discover_outside_repository_fails() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a/b");
    fs::create_dir_all(&nested).unwrap();
    // Guard against a stray repository above the temp dir.
    if dir.path().ancestors().any(|p| p.join(".git").exists()) {
        return;
    }
    assert!(matches!(
        Repository::discover(&nested, &Config::default()),
        Err(Error::RepoNotFound { .. })
    ));
}

#[test]
fn discover_from_subdirectory_finds_root() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join(".git")).unwrap();
    let nested = dir.path().join("src/deep");
    fs::create_dir_all(&nested).unwrap();

    let repo = Repository::discover(&nested, &Config::default()).unwrap();
    assert_eq!(repo.root(), dir.path().canonicalize().unwrap());
}

#[test]
fn nested_params_key_is_rejected_before_writing() {
    let (_dir, checkpoints) = setup(Config::default());
    let ckpt = Path::new("m.json");
    checkpoints.save(ckpt, &model()).unwrap();

    let bad = Tree::from_json(&json!({"model": {"params": {"w": 1}, "b": 2}})).unwrap();
    match checkpoints.save(ckpt, &bad) {
        Err(Error::Tree(paramfs_tree::Error::ReservedSegment { path, segment })) => {
            assert_eq!(path, keypath!("model/params/w"));
            assert_eq!(segment, "params");
        }
        other => panic!("unexpected result: {:?}", other),
    }

    // The stored checkpoint is untouched and still loads.
    assert_eq!(checkpoints.load(ckpt).unwrap(), model());
    let ckpt_dir = checkpoints.repository().checkpoint_dir(ckpt).unwrap();
    assert!(!ckpt_dir.join("model").exists());
}

#[test]
fn top_level_params_key_round_trips() {
    let (_dir, checkpoints) = setup(Config::default());
    let ckpt = Path::new("m.json");

    let tree = Tree::from_json(&json!({"params": {"w": 1}, "b": 2})).unwrap();
    checkpoints.save(ckpt, &tree).unwrap();
    assert_eq!(checkpoints.load(ckpt).unwrap(), tree);
}

#[test]
fn key_that_is_not_a_directory_name_is_rejected() {
    let (_dir, checkpoints) = setup(Config::default());
    let ckpt = Path::new("m.json");

    let tree = Tree::from_json(&json!({"dense/kernel:0": 1})).unwrap();
    assert!(matches!(
        checkpoints.save(ckpt, &tree),
        Err(Error::Tree(paramfs_tree::Error::KeyPath(_)))
    ));
    assert!(checkpoints.list(ckpt).unwrap().is_empty());
}

#[test]
fn track_from_subdirectory_uses_root_relative_pattern() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join(".git")).unwrap();
    let models = dir.path().join("models");
    fs::create_dir_all(models.join("sub")).unwrap();

    let config = Config::default();
    let repo = Repository::discover(&models, &config).unwrap();
    let checkpoints = Checkpoints::new(repo, config, JsonParamStore::new(), RecordingVcs::default());

    assert!(checkpoints.track(Path::new("sub/bert.json")).unwrap());
    assert!(checkpoints.track(Path::new("../top.json")).unwrap());

    let attributes = fs::read_to_string(dir.path().join(".gitattributes")).unwrap();
    let patterns: Vec<&str> = attributes
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    assert_eq!(patterns, vec!["models/sub/bert.json", "top.json"]);

    let calls_before = checkpoints.vcs().calls().len();
    assert!(matches!(
        checkpoints.track(Path::new("../../elsewhere.json")),
        Err(Error::OutsideRepository { .. })
    ));
    assert_eq!(checkpoints.vcs().calls().len(), calls_before);
}
