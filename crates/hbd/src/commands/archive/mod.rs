use std::fs::File;
use std::path::Path;

use miette::{Context, IntoDiagnostic, Result};

pub mod patch;
pub mod scan;

#[derive(clap::Subcommand)]
pub enum ArchiveCommands {
    /// Scan an archive and extract its text
    Scan(scan::ScanArgs),
    /// Re-encode translated text into an archive
    Patch(patch::PatchArgs),
}

impl ArchiveCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            ArchiveCommands::Scan(scan) => scan.handle(),
            ArchiveCommands::Patch(patch) => patch.handle(),
        }
    }
}

pub(crate) fn create_target(path: &Path, overwrite: bool) -> Result<File> {
    if !overwrite {
        File::create_new(path)
            .into_diagnostic()
            .context(format!("creating {}", path.display()))
    } else {
        File::create(path)
            .into_diagnostic()
            .context(format!("creating {}", path.display()))
    }
}
