pub mod builder;
pub mod checksum;
pub mod descriptor;
pub mod directives;
pub mod downloader;
pub mod extractor;
pub mod hooks;
pub mod installer;
pub mod rollback;
pub mod uninstaller;

pub use checksum::{ChecksumStatus, ChecksumVerifier};
pub use descriptor::Descriptor;
pub use downloader::{ParallelDownloader, PreparedItem, SourceDownloader};
pub use extractor::PackageExtractor;
pub use installer::{InstallOptions, PackageInstaller};
pub use rollback::{with_rollback, RollbackManager};
pub use uninstaller::{PackageUninstaller, UninstallOptions};
