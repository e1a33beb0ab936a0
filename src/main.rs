use clap::{Args, Parser, Subcommand};
use octpkg::core::OctpkgResult;
use octpkg::registry::Scope;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Options;

#[derive(Parser)]
#[command(name = "octpkg")]
#[command(about = "Package management for GNU Octave")]
#[command(version)]
struct Cli {
    /// Show debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy, Default)]
struct ScopeArgs {
    /// Use the system-wide prefix
    #[arg(long, conflicts_with = "local")]
    global: bool,
    /// Use the per-user prefix (default)
    #[arg(long)]
    local: bool,
}

impl ScopeArgs {
    fn scope(&self) -> Scope {
        if self.global {
            Scope::Global
        } else {
            Scope::Local
        }
    }

    /// `None` when neither flag was given
    fn explicit(&self) -> Option<Scope> {
        if self.global || self.local {
            Some(self.scope())
        } else {
            None
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Install packages by name, `name@version`, url or archive path
    Install {
        #[arg(required = true)]
        packages: Vec<String>,
        #[command(flatten)]
        scope: ScopeArgs,
        /// Do not resolve or check dependencies
        #[arg(long)]
        nodeps: bool,
        /// Reinstall installed packages and continue past cycles
        #[arg(long)]
        force: bool,
        /// Refetch indices and never fall back to cached copies
        #[arg(long)]
        nocache: bool,
        /// Print the installation plan without installing
        #[arg(long)]
        resolve_only: bool,
    },
    /// Uninstall packages
    Uninstall {
        #[arg(required = true)]
        packages: Vec<String>,
        #[command(flatten)]
        scope: ScopeArgs,
        /// Remove even if other packages depend on them
        #[arg(long)]
        nodeps: bool,
    },
    /// Add packages to the interpreter search path
    Load {
        #[arg(required = true)]
        packages: Vec<String>,
        /// Do not load dependencies
        #[arg(long)]
        nodeps: bool,
    },
    /// Remove packages from the interpreter search path
    Unload {
        #[arg(required = true)]
        packages: Vec<String>,
        /// Unload even if loaded packages depend on them
        #[arg(long)]
        nodeps: bool,
    },
    /// List installed packages (`*` marks loaded ones)
    List {
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Install newer index versions of installed packages
    Update {
        packages: Vec<String>,
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long)]
        nodeps: bool,
        #[arg(long)]
        nocache: bool,
    },
    /// Regenerate the registry from the install prefix
    Rebuild {
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Run the tests shipped with installed packages
    Test {
        #[arg(required = true)]
        packages: Vec<String>,
    },
}

async fn dispatch(command: Commands) -> OctpkgResult<()> {
    match command {
        Commands::Install {
            packages,
            scope,
            nodeps,
            force,
            nocache,
            resolve_only,
        } => {
            let options = Options {
                scope: scope.scope(),
                nodeps,
                force,
                nocache,
                resolve_only,
            };
            cli::install::run(packages, options).await
        }
        Commands::Uninstall {
            packages,
            scope,
            nodeps,
        } => {
            let options = Options {
                scope: scope.scope(),
                nodeps,
                ..Options::default()
            };
            cli::uninstall::run(packages, options)
        }
        Commands::Load { packages, nodeps } => cli::load::run_load(packages, nodeps),
        Commands::Unload { packages, nodeps } => cli::load::run_unload(packages, nodeps),
        Commands::List { scope } => cli::list::run(scope.explicit()),
        Commands::Update {
            packages,
            scope,
            nodeps,
            nocache,
        } => {
            let options = Options {
                scope: scope.scope(),
                nodeps,
                nocache,
                ..Options::default()
            };
            cli::update::run(packages, options).await
        }
        Commands::Rebuild { scope } => cli::rebuild::run(scope.scope()),
        Commands::Test { packages } => cli::test::run(packages),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_from(cli::normalize_args(std::env::args()));

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match dispatch(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\n{}", octpkg::core::error_help::format_error_with_help(&e));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(cli::normalize_args(args.iter().map(|s| s.to_string())))
    }

    #[test]
    fn test_single_dash_flags_parse() {
        let cli = parse(&["octpkg", "install", "-nodeps", "-global", "io"]).unwrap();
        match cli.command {
            Commands::Install {
                packages,
                scope,
                nodeps,
                ..
            } => {
                assert_eq!(packages, vec!["io"]);
                assert!(nodeps);
                assert_eq!(scope.scope(), Scope::Global);
            }
            _ => panic!("expected install"),
        }
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(parse(&["octpkg", "install", "-bogus", "io"]).is_err());
    }

    #[test]
    fn test_global_and_local_conflict() {
        assert!(parse(&["octpkg", "uninstall", "-global", "-local", "io"]).is_err());
    }

    #[test]
    fn test_list_scope_is_optional() {
        match parse(&["octpkg", "list"]).unwrap().command {
            Commands::List { scope } => assert_eq!(scope.explicit(), None),
            _ => panic!("expected list"),
        }
    }
}
