use octpkg::config::Config;
use octpkg::core::OctpkgResult;
use octpkg::registry::{rebuild, Registry, Scope};

/// Regenerate the registry of `scope` from its install prefix
pub fn run(scope: Scope) -> OctpkgResult<()> {
    let config = Config::load()?;
    let prefix = config.prefix(scope)?;
    let archprefix = config.archprefix(scope)?;

    let mut registry = Registry::load_prefix(scope, &prefix)?;
    let before = registry.list().len();
    let count = rebuild::rebuild(&mut registry, &prefix, &archprefix, &config.arch)?;

    println!(
        "✓ Rebuilt {} registry: {} package(s) (was {})",
        scope, count, before
    );
    Ok(())
}
