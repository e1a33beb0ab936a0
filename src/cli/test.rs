use super::{select_by_name, Session};
use octpkg::core::{OctpkgError, OctpkgResult};
use octpkg::loader::compute_load_order;
use octpkg::registry::InstalledRecord;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Run the `%!test` / `%!assert` blocks of installed packages
pub fn run(names: Vec<String>) -> OctpkgResult<()> {
    let session = Session::open(false)?;
    let mut records = session.store.merged();
    // Tests run in a fresh interpreter, so nothing counts as loaded
    for record in records.iter_mut() {
        record.loaded = false;
    }

    let selected = select_by_name(&records, &names)?;
    let mut failures = Vec::new();
    let mut total = 0;

    for i in selected {
        let search_path = test_search_path(&records, i);
        let files = test_files(&records[i].dir)?;
        if files.is_empty() {
            println!("{}: no tests", records[i].id());
            continue;
        }

        println!("Testing {}", records[i].id());
        for file in files {
            total += 1;
            let passed = session.services.hooks().run_tests(&file, &search_path)?;
            let label = file.strip_prefix(&records[i].dir).unwrap_or(&file).display().to_string();
            if passed {
                println!("  ✓ {}", label);
            } else {
                println!("  ✗ {}", label);
                failures.push(format!("{}: {}", records[i].id(), label));
            }
        }
    }

    if failures.is_empty() {
        println!("\n✓ {} test file(s) passed", total);
        Ok(())
    } else {
        Err(OctpkgError::Package(format!(
            "{} of {} test file(s) failed:\n  {}",
            failures.len(),
            total,
            failures.join("\n  ")
        )))
    }
}

/// Directories of the record and its dependencies, dependencies first
fn test_search_path(records: &[InstalledRecord], index: usize) -> Vec<PathBuf> {
    compute_load_order(records, &[index], true)
        .into_iter()
        .flat_map(|i| records[i].load_dirs().into_iter().map(Path::to_path_buf))
        .collect()
}

/// Function files under `dir` carrying test blocks
fn test_files(dir: &Path) -> OctpkgResult<Vec<PathBuf>> {
    let re = Regex::new(r"(?m)^%!(test|assert|error|fail|warning)")
        .map_err(|e| OctpkgError::Package(format!("Invalid test pattern: {}", e)))?;
    let mut files = Vec::new();
    if !dir.is_dir() {
        return Ok(files);
    }
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("m") {
            continue;
        }
        if path.components().any(|c| c.as_os_str() == "packinfo") {
            continue;
        }
        match fs::read_to_string(path) {
            Ok(content) if re.is_match(&content) => files.push(path.to_path_buf()),
            Ok(_) => {}
            Err(e) => tracing::debug!("Skipping {}: {}", path.display(), e),
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_finds_files_with_test_blocks() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.m"), "function a\nend\n%!assert (a (), 1)\n").unwrap();
        fs::write(temp.path().join("b.m"), "function b\nend\n").unwrap();
        fs::create_dir(temp.path().join("packinfo")).unwrap();
        fs::write(temp.path().join("packinfo").join("on_uninstall.m"), "%!test\n").unwrap();

        let files = test_files(temp.path()).unwrap();
        assert_eq!(files, vec![temp.path().join("a.m")]);
    }
}
