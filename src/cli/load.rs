use super::select_by_name;
use octpkg::config::Config;
use octpkg::core::path::search_path_file;
use octpkg::core::OctpkgResult;
use octpkg::loader::{compute_load_order, compute_unload_safety, SearchPath};
use octpkg::registry::{mark_loaded, InstalledRecord, RegistryStore, Scope};
use std::path::{Path, PathBuf};

fn open() -> OctpkgResult<(Vec<InstalledRecord>, SearchPath, PathBuf)> {
    let config = Config::load()?;
    let local = config.prefix(Scope::Local)?;
    let store = RegistryStore::load(&local, &config.prefix(Scope::Global)?)?;
    let path_file = search_path_file(&local);
    let search_path = SearchPath::load(&path_file)?;

    let mut records = store.merged();
    mark_loaded(&mut records, &search_path);
    Ok((records, search_path, path_file))
}

/// Add packages (and, unless `nodeps`, their dependencies) to the search path
pub fn run_load(names: Vec<String>, nodeps: bool) -> OctpkgResult<()> {
    let (records, mut search_path, path_file) = open()?;
    let requested = select_by_name(&records, &names)?;

    let order = load(&records, &requested, !nodeps, &mut search_path);
    if order.is_empty() {
        println!("Nothing to load; requested packages are already loaded.");
    } else {
        search_path.save(&path_file)?;
        for i in &order {
            println!("  ✓ Loaded {}", records[*i].id());
        }
    }

    println!("export OCTAVE_PATH=\"{}\"", search_path.to_env_string()?);
    Ok(())
}

/// Prepend the directories of the records to load, dependencies first both
/// in the returned order and on the path
pub fn load(records: &[InstalledRecord], requested: &[usize], handle_deps: bool, search_path: &mut SearchPath) -> Vec<usize> {
    let order = compute_load_order(records, requested, handle_deps);
    let dirs: Vec<PathBuf> = order
        .iter()
        .flat_map(|i| records[*i].load_dirs().into_iter().map(Path::to_path_buf))
        .collect();
    search_path.prepend(dirs);
    order
}

/// Remove packages from the search path
pub fn run_unload(names: Vec<String>, nodeps: bool) -> OctpkgResult<()> {
    let (records, mut search_path, path_file) = open()?;
    let selected = select_by_name(&records, &names)?;

    let targets: Vec<usize> = selected
        .into_iter()
        .filter(|i| {
            if !records[*i].loaded {
                tracing::warn!("{} is not loaded", records[*i].id());
            }
            records[*i].loaded
        })
        .collect();

    let removed = unload(&records, &targets, nodeps, &mut search_path)?;
    if removed > 0 {
        search_path.save(&path_file)?;
        for i in &targets {
            println!("  ✓ Unloaded {}", records[*i].id());
        }
    }

    println!("export OCTAVE_PATH=\"{}\"", search_path.to_env_string()?);
    Ok(())
}

/// Drop the directories of `targets` from the search path after checking
/// no other loaded record depends on them. Returns the number removed.
pub fn unload(records: &[InstalledRecord], targets: &[usize], nodeps: bool, search_path: &mut SearchPath) -> OctpkgResult<usize> {
    compute_unload_safety(records, targets, nodeps)?;
    let dirs: Vec<&Path> = targets.iter().flat_map(|i| records[*i].load_dirs()).collect();
    Ok(search_path.remove(dirs))
}
