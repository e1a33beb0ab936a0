use super::{Options, Session};
use octpkg::core::{OctpkgError, OctpkgResult};
use octpkg::index::PackageIndex;
use octpkg::package::{PackageInstaller, ParallelDownloader};
use octpkg::resolver::{DependencyResolver, PlanItem, Resolution, ResolutionItem, ResolveOptions};

pub async fn run(names: Vec<String>, options: Options) -> OctpkgResult<()> {
    let mut session = Session::open(options.nocache)?;
    install(&mut session, &names, &options).await
}

/// Resolve `requests` and install the resulting plan
pub async fn install(session: &mut Session, requests: &[String], options: &Options) -> OctpkgResult<()> {
    let items = requests
        .iter()
        .map(|r| ResolutionItem::from_input(r))
        .collect::<OctpkgResult<Vec<_>>>()?;

    let plan = {
        let installed = session.store.merged();
        let index = session.index.index().await?;
        let resolver = DependencyResolver::new(index, &installed, session.config.host_version.as_str());
        let resolve_options = ResolveOptions {
            force: options.force,
            nodeps: options.nodeps,
        };
        match resolver.resolve(items, resolve_options)? {
            Resolution::Complete(plan) => plan,
            Resolution::Unresolved(inputs) => return Err(unresolved_error(index, inputs)),
            Resolution::Incomplete(plan) => {
                tracing::warn!(
                    "Dependency resolution stopped at a cycle after {} package(s)",
                    plan.len()
                );
                println!("Plan is incomplete; nothing was installed.");
                print_plan(&plan);
                return Ok(());
            }
        }
    };

    if plan.is_empty() {
        println!("All requested packages are already installed.");
        return Ok(());
    }

    print_plan(&plan);
    if options.resolve_only {
        return Ok(());
    }

    let downloader = ParallelDownloader::new(session.services.fetcher.clone(), None);
    let prepared = downloader.prepare(plan).await?;

    let installer = PackageInstaller::new(&session.services, session.install_options(options)?);
    let installed = installer.install_all(prepared, &mut session.store)?;

    println!("\n✓ Installed {} package(s) into the {} scope", installed.len(), options.scope);
    Ok(())
}

fn print_plan(plan: &[PlanItem]) {
    println!("Installation plan:");
    for item in plan {
        println!("  {}", item.label());
    }
}

/// Unresolved inputs, each with a name suggestion when one exists
fn unresolved_error(index: &PackageIndex, inputs: Vec<String>) -> OctpkgError {
    let described = inputs
        .into_iter()
        .map(|input| {
            let name = input.split('@').next().unwrap_or(&input).to_lowercase();
            match index.suggest(&name) {
                Some(s) if s != name => format!("{} (did you mean '{}'?)", input, s),
                _ => input,
            }
        })
        .collect();
    OctpkgError::Unresolved(described)
}
