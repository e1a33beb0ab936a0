use super::{install, select_by_name, Options, Session};
use octpkg::core::version::compare_versions;
use octpkg::core::OctpkgResult;
use octpkg::index::PackageIndex;
use octpkg::registry::InstalledRecord;
use std::cmp::Ordering;

/// Install the newest index version of every installed package (or of
/// `names`) that is behind
pub async fn run(names: Vec<String>, options: Options) -> OctpkgResult<()> {
    let mut session = Session::open(options.nocache)?;

    let records = session.store.list(options.scope).to_vec();
    let selected: Vec<InstalledRecord> = if names.is_empty() {
        records
    } else {
        select_by_name(&records, &names)?
            .into_iter()
            .map(|i| records[i].clone())
            .collect()
    };

    // Compare against a fresh fetch, never a copy held by this session
    session.index.invalidate();
    let requests = {
        let index = session.index.index().await?;
        outdated(index, &selected)
    };

    if requests.is_empty() {
        println!("All packages are up to date.");
        return Ok(());
    }

    install::install(&mut session, &requests, &options).await
}

/// `name@version` requests for records whose newest index version is higher
pub fn outdated(index: &PackageIndex, records: &[InstalledRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| {
            let newest = index.newest(&record.name)?;
            if compare_versions(&newest.id.version, &record.version) == Ordering::Greater {
                println!("  {} {} -> {}", record.name, record.version, newest.id.version);
                Some(newest.id.to_string())
            } else {
                None
            }
        })
        .collect()
}
