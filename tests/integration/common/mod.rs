#![allow(dead_code)]

use std::{
    collections::HashSet,
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use initd::{HostProbe, ServiceDefinition};

/// Initializes test logging once; later calls are no-ops.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Probe with a fixed view of the host filesystem and search path.
#[derive(Clone, Default)]
pub struct FakeProbe {
    files: HashSet<PathBuf>,
    programs: HashSet<String>,
}

impl FakeProbe {
    pub fn new(files: &[&str], programs: &[&str]) -> Self {
        Self {
            files: files.iter().map(PathBuf::from).collect(),
            programs: programs.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl HostProbe for FakeProbe {
    fn file_exists(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    fn find_program(&self, program: &str) -> Option<PathBuf> {
        self.programs
            .contains(program)
            .then(|| PathBuf::from("/usr/sbin").join(program))
    }
}

/// Lays out an `/etc`-like tree under `root` with flat `rc<N>.d` directories
/// and returns a definition whose executable lives inside it.
pub fn flat_fixture(root: &Path) -> ServiceDefinition {
    fs::create_dir_all(root.join("init.d")).expect("create init.d");
    for level in 0..=6 {
        fs::create_dir_all(root.join(format!("rc{level}.d"))).expect("create rc dir");
    }
    write_executable(root, "webd")
}

/// Same as `flat_fixture` but with the Red-Hat-style nested `rc.d` tree.
pub fn nested_fixture(root: &Path) -> ServiceDefinition {
    fs::create_dir_all(root.join("init.d")).expect("create init.d");
    for level in 0..=6 {
        fs::create_dir_all(root.join(format!("rc.d/rc{level}.d")))
            .expect("create rc dir");
    }
    write_executable(root, "webd")
}

fn write_executable(root: &Path, name: &str) -> ServiceDefinition {
    let bin = root.join("bin");
    fs::create_dir_all(&bin).expect("create bin dir");
    let exe = bin.join(name);
    fs::write(&exe, "#!/bin/sh\nexit 0\n").expect("write executable");
    fs::set_permissions(&exe, fs::Permissions::from_mode(0o755))
        .expect("chmod executable");

    let mut def = ServiceDefinition::new(name, exe);
    def.description = "Test service".into();
    def
}

/// Snapshot of every path under `root`, for before/after comparisons.
pub fn tree_snapshot(root: &Path) -> Vec<PathBuf> {
    let mut entries = Vec::new();
    collect(root, &mut entries);
    entries.sort();
    entries
}

fn collect(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(read) = fs::read_dir(dir) else {
        return;
    };
    for entry in read.flatten() {
        let path = entry.path();
        out.push(path.clone());
        if path.is_dir() {
            collect(&path, out);
        }
    }
}
