use octpkg::config::Config;
use octpkg::core::path::search_path_file;
use octpkg::core::OctpkgResult;
use octpkg::loader::SearchPath;
use octpkg::registry::{mark_loaded, InstalledRecord, RegistryStore, Scope};

/// Print installed packages. `scope` limits the listing to one scope;
/// otherwise the merged view is shown.
pub fn run(scope: Option<Scope>) -> OctpkgResult<()> {
    let config = Config::load()?;
    let store = RegistryStore::load(&config.prefix(Scope::Local)?, &config.prefix(Scope::Global)?)?;
    let search_path = SearchPath::load(&search_path_file(&config.prefix(Scope::Local)?))?;

    let mut records = match scope {
        Some(scope) => store.list(scope).to_vec(),
        None => store.merged(),
    };
    mark_loaded(&mut records, &search_path);

    if records.is_empty() {
        println!("No packages installed.");
        return Ok(());
    }

    print!("{}", render(&records));
    Ok(())
}

/// Table of records; loaded ones carry a `*` after the name
pub fn render(records: &[InstalledRecord]) -> String {
    let rows: Vec<(String, &str, String)> = records
        .iter()
        .map(|r| {
            let marker = if r.loaded { "*" } else { "" };
            (format!("{}{}", r.name, marker), r.version.as_str(), r.dir.display().to_string())
        })
        .collect();

    let name_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(0).max("Package Name".len());
    let version_width = rows.iter().map(|r| r.1.len()).max().unwrap_or(0).max("Version".len());

    let mut out = format!(
        "{:<nw$}  | {:<vw$} | Installation directory\n",
        "Package Name",
        "Version",
        nw = name_width,
        vw = version_width
    );
    out.push_str(&format!(
        "{}--+-{}-+-{}\n",
        "-".repeat(name_width),
        "-".repeat(version_width),
        "-".repeat(22)
    ));
    for (name, version, dir) in rows {
        out.push_str(&format!(
            "{:<nw$}  | {:<vw$} | {}\n",
            name,
            version,
            dir,
            nw = name_width,
            vw = version_width
        ));
    }
    out
}
