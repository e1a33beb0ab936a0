use super::{Options, Session};
use octpkg::core::OctpkgResult;
use octpkg::package::{PackageUninstaller, UninstallOptions};

pub fn run(names: Vec<String>, options: Options) -> OctpkgResult<()> {
    let mut session = Session::open(options.nocache)?;
    let uninstall_options = UninstallOptions {
        scope: options.scope,
        nodeps: options.nodeps,
        search_path_file: session.search_path_file()?,
    };

    let uninstaller = PackageUninstaller::new(&session.services, uninstall_options);
    let removed = uninstaller.uninstall(&names, &mut session.store)?;

    println!("\n✓ Removed {} package(s) from the {} scope", removed.len(), options.scope);
    Ok(())
}
