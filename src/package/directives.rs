//! `PKG_ADD` / `PKG_DEL` generation
//!
//! Source files may carry lines such as `## PKG_ADD: autoload ("f", "f.oct")`.
//! The commands are collected, in file order, into `PKG_ADD` and `PKG_DEL`
//! files that the interpreter runs when the directory joins or leaves the
//! search path.

use crate::core::OctpkgResult;
use regex::Regex;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

pub const PKG_ADD: &str = "PKG_ADD";
pub const PKG_DEL: &str = "PKG_DEL";

/// Commands found in a set of files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    pub add: Vec<String>,
    pub del: Vec<String>,
}

impl Directives {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.del.is_empty()
    }
}

fn directive_regex() -> OctpkgResult<Regex> {
    Regex::new(r"(?m)^\s*(?:##|%%|//)\s*PKG_(ADD|DEL):\s*(.*?)\s*$").map_err(|e| {
        crate::core::OctpkgError::Package(format!("Invalid directive pattern: {}", e))
    })
}

/// Scan `.m`, `.cc`, `.c` and `.cpp` files below `dir`
pub fn scan(dir: &Path) -> OctpkgResult<Directives> {
    let re = directive_regex()?;
    let mut found = Directives::default();
    if !dir.is_dir() {
        return Ok(found);
    }

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let ext = entry.path().extension().and_then(|e| e.to_str());
        if !matches!(ext, Some("m" | "cc" | "c" | "cpp")) {
            continue;
        }
        let content = match fs::read_to_string(entry.path()) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", entry.path().display(), e);
                continue;
            }
        };
        for caps in re.captures_iter(&content) {
            let command = caps[2].to_string();
            if command.is_empty() {
                continue;
            }
            match &caps[1] {
                "ADD" => found.add.push(command),
                _ => found.del.push(command),
            }
        }
    }

    Ok(found)
}

/// Append the directives to `dir/PKG_ADD` and `dir/PKG_DEL`, keeping any
/// file the package shipped
pub fn write(dir: &Path, directives: &Directives) -> OctpkgResult<()> {
    append(&dir.join(PKG_ADD), &directives.add)?;
    append(&dir.join(PKG_DEL), &directives.del)?;
    Ok(())
}

fn append(path: &Path, commands: &[String]) -> OctpkgResult<()> {
    if commands.is_empty() {
        return Ok(());
    }
    let mut content = if path.exists() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    for command in commands {
        content.push_str(command);
        content.push('\n');
    }
    fs::write(path, content)?;
    Ok(())
}
