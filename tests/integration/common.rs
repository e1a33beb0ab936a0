//! Common utilities for integration tests

use assert_cmd::Command;
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway octpkg home with a local file index
pub struct TestEnv {
    pub temp: TempDir,
    index: serde_json::Map<String, serde_json::Value>,
}

impl TestEnv {
    pub fn new() -> Self {
        let env = Self {
            temp: TempDir::new().unwrap(),
            index: serde_json::Map::new(),
        };
        fs::create_dir_all(env.home()).unwrap();
        fs::create_dir_all(env.archives()).unwrap();
        env.write_config();
        env
    }

    pub fn home(&self) -> PathBuf {
        self.temp.path().join("home")
    }

    pub fn local_prefix(&self) -> PathBuf {
        self.temp.path().join("local")
    }

    pub fn global_prefix(&self) -> PathBuf {
        self.temp.path().join("global")
    }

    fn archives(&self) -> PathBuf {
        self.temp.path().join("archives")
    }

    fn index_file(&self) -> PathBuf {
        self.temp.path().join("index.json")
    }

    fn write_config(&self) {
        let config = format!(
            "indices:\n  - url: \"file://{}\"\n    kind: packages\n\
             cache_dir: \"{}\"\nlocal_prefix: \"{}\"\nglobal_prefix: \"{}\"\n\
             host_version: \"9.2.0\"\narch: \"x86_64-linux\"\n",
            self.index_file().display(),
            self.temp.path().join("cache").display(),
            self.local_prefix().display(),
            self.global_prefix().display(),
        );
        fs::write(self.home().join("config.yaml"), config).unwrap();
        fs::write(self.index_file(), "{}").unwrap();
    }

    /// Build a package archive and list it in the index. `depends` uses the
    /// DESCRIPTION shorthand, e.g. `control (>= 2.0.0)`.
    pub fn publish(&mut self, name: &str, version: &str, depends: &[&str]) -> PathBuf {
        let description = format!(
            "Name: {name}\nVersion: {version}\nDate: 2024-01-01\nAuthor: Test\n\
             Maintainer: Test\nTitle: {name} package\nDescription: For tests\n\
             Depends: {}\n",
            if depends.is_empty() {
                "octave (>= 6.0.0)".to_string()
            } else {
                depends.join(", ")
            }
        );
        let function = format!("function r = {name}_fn ()\n  r = 1;\nend\n");
        let files = [
            ("DESCRIPTION", description.as_str()),
            ("COPYING", "GPL-3.0-or-later"),
            ("inst/fn.m", function.as_str()),
        ];
        let archive = write_targz(&self.archives(), &format!("{}-{}", name, version), &files);

        let depends_json: Vec<serde_json::Value> = depends
            .iter()
            .map(|d| serde_json::json!({ "name": d }))
            .collect();
        let versions = self
            .index
            .entry(name.to_string())
            .or_insert_with(|| serde_json::json!({ "versions": [] }));
        versions["versions"]
            .as_array_mut()
            .unwrap()
            .push(serde_json::json!({
                "id": version,
                "url": format!("file://{}", archive.display()),
                "sha256": sha256(&archive),
                "depends": depends_json,
            }));
        fs::write(
            self.index_file(),
            serde_json::to_string_pretty(&self.index).unwrap(),
        )
        .unwrap();
        archive
    }

    /// `octpkg` with its home pointed at this environment
    pub fn octpkg(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_octpkg"));
        cmd.current_dir(self.temp.path())
            .env("OCTPKG_HOME", self.home())
            .env("RUST_LOG", "warn")
            .env_remove("OCTAVE_PATH");
        cmd
    }
}

fn sha256(path: &Path) -> String {
    let bytes = fs::read(path).unwrap();
    hex::encode(Sha256::digest(&bytes))
}

fn write_targz(dir: &Path, root: &str, files: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(format!("{}.tar.gz", root));
    let file = fs::File::create(&path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{}/{}", root, name), content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
    path
}
