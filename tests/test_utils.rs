//! Shared fixtures for integration tests: a throwaway checkout of the
//! python-starter template.
#![allow(dead_code)]

use git2::{IndexAddOption, Repository};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const PROJECT_DIR: &str = "my-project";

pub const UPSTREAM_URL: &str = "git@github.com:tomsilver/python-starter.git";

pub const VALID_CONFIG: &str = r#"{
    "developer": "Jane Doe",
    "github-username": "janedoe",
    "your-package-name": "mytool",
    "python-version": "3.11"
}"#;

pub const README: &str = "# python-starter\n\nA template by Tom Silver (tomsilver).\n\
                          Requires Python 3.10.\n";

pub const PYPROJECT: &str = "[project]\nname = \"python_starter\"\nrequires-python = \">=3.10\"\n\n\
                             [tool.black]\ntarget-version = [\"py310\"]\n";

pub const STRUCTS: &str = "\"\"\"Data structures.\"\"\"\n";

pub const UTILS: &str = "from python_starter.structs import Dog\n";

/// Lay out the template files under `<tmp>/my-project` and write `config`.
///
/// Returns the temporary directory (keep it alive) and the project root.
pub fn setup_template_files(config: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let root = temp_dir.path().join(PROJECT_DIR);
    let package = root.join("src/python_starter");
    fs::create_dir_all(&package).expect("Failed to create package directory");

    write(&root, "README.md", README);
    write(&root, "pyproject.toml", PYPROJECT);
    write(&root, ".gitignore", "venv/\n");
    write(&root, "apply_configuration.py", "substitutions = {\"python_starter\": name}\n");
    write(&root, "config.json", config);
    write(&package, "__init__.py", "");
    write(&package, "structs.py", STRUCTS);
    write(&package, "utils.py", UTILS);
    fs::write(root.join("logo.bin"), b"python_starter\0\x01\x02").expect("Failed to write binary");
    write(&root, "venv/lib/python_starter.py", "ignored");

    (temp_dir, root)
}

/// Same as [`setup_template_files`] but as a git checkout of the template,
/// with every file staged and `origin` pointing at `remote_url`.
pub fn setup_template_repo(config: &str, remote_url: &str) -> (TempDir, PathBuf) {
    let (temp_dir, root) = setup_template_files(config);

    let repo = Repository::init(&root).expect("Failed to initialize repository");
    repo.remote("origin", remote_url)
        .expect("Failed to add remote");
    let mut index = repo.index().expect("Failed to open index");
    index
        .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
        .expect("Failed to stage files");
    index.write().expect("Failed to write index");

    (temp_dir, root)
}

pub fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).expect("Failed to read file")
}

pub fn is_staged(root: &Path, rel: &str) -> bool {
    let repo = Repository::open(root).expect("Failed to open repository");
    let index = repo.index().expect("Failed to open index");
    index.get_path(Path::new(rel), 0).is_some()
}

pub fn origin_url(root: &Path) -> Option<String> {
    let repo = Repository::open(root).ok()?;
    let remote = repo.find_remote("origin").ok()?;
    remote.url().map(ToString::to_string)
}

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create directory");
    }
    fs::write(path, content).expect("Failed to write file");
}
