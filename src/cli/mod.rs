//! Command implementations for the `octpkg` binary

pub mod install;
pub mod list;
pub mod load;
pub mod rebuild;
pub mod test;
pub mod uninstall;
pub mod update;

use octpkg::cache::Cache;
use octpkg::config::Config;
use octpkg::core::path::search_path_file;
use octpkg::core::{OctpkgError, OctpkgResult};
use octpkg::di::ServiceContainer;
use octpkg::index::IndexClient;
use octpkg::package::InstallOptions;
use octpkg::registry::{InstalledRecord, RegistryStore, Scope};
use octpkg::suggest;
use std::path::PathBuf;

/// Flags shared by the commands, checked by clap before anything runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    pub scope: Scope,
    pub nodeps: bool,
    pub force: bool,
    pub nocache: bool,
    pub resolve_only: bool,
}

/// Rewrite the interpreter-style single-dash long flags (`-nodeps`) into
/// the `--nodeps` form clap parses. Short flags and values are untouched.
pub fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            let is_single_dash_long = i > 0
                && arg.len() > 2
                && arg.starts_with('-')
                && !arg.starts_with("--")
                && arg[1..].chars().all(|c| c.is_ascii_lowercase() || c == '-');
            if is_single_dash_long {
                format!("-{}", arg)
            } else {
                arg
            }
        })
        .collect()
}

/// Everything one command invocation works with
pub struct Session {
    pub config: Config,
    pub cache: Cache,
    pub store: RegistryStore,
    pub services: ServiceContainer,
    pub index: IndexClient,
}

impl Session {
    pub fn open(nocache: bool) -> OctpkgResult<Self> {
        let config = Config::load()?;
        let cache = Cache::new(config.get_cache_dir()?)?;
        cache.init()?;

        let store = RegistryStore::load(&config.prefix(Scope::Local)?, &config.prefix(Scope::Global)?)?;
        let services = ServiceContainer::new(cache.clone())?;
        let index = IndexClient::new(&config, cache.clone(), nocache)?;

        Ok(Self {
            config,
            cache,
            store,
            services,
            index,
        })
    }

    /// File backing the interpreter search path
    pub fn search_path_file(&self) -> OctpkgResult<PathBuf> {
        Ok(search_path_file(&self.config.prefix(Scope::Local)?))
    }

    pub fn install_options(&self, options: &Options) -> OctpkgResult<InstallOptions> {
        Ok(InstallOptions {
            scope: options.scope,
            prefix: self.config.prefix(options.scope)?,
            archprefix: self.config.archprefix(options.scope)?,
            arch: self.config.arch.clone(),
            scratch_dir: self.cache.scratch_dir(),
            host_version: self.config.host_version.clone(),
            nodeps: options.nodeps,
            verify_checksums: self.config.verify_checksums,
        })
    }
}

/// Indices of the merged records named by `names`; `all` selects everything
pub fn select_by_name(records: &[InstalledRecord], names: &[String]) -> OctpkgResult<Vec<usize>> {
    if names.iter().any(|n| n == "all") {
        return Ok((0..records.len()).collect());
    }

    let mut selected = Vec::with_capacity(names.len());
    for name in names {
        let name = name.to_lowercase();
        match records.iter().position(|r| r.name == name) {
            Some(i) if !selected.contains(&i) => selected.push(i),
            Some(_) => {}
            None => {
                let hint = suggest::hint(&name, records.iter().map(|r| r.name.as_str()));
                return Err(OctpkgError::Package(format!(
                    "Package '{}' is not installed{}",
                    name, hint
                )));
            }
        }
    }
    Ok(selected)
}
