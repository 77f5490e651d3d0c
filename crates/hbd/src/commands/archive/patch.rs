use clap::Args;
use indexmap::IndexMap;
use miette::{Context, IntoDiagnostic, Result};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use hbd_archive::{AddressIndex, Patcher};

use super::create_target;

#[derive(Args)]
pub struct PatchArgs {
    /// An input HBD archive
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// The address index produced by a scan
    #[arg(short, long, value_name = "FILE")]
    index: PathBuf,

    /// Translations JSON mapping identifier to replacement text
    #[arg(short, long, value_name = "FILE")]
    translations: PathBuf,

    /// A target file for the patched archive
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// A target file for the patch report JSON
    #[arg(short, long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Allow overwriting the targets
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl PatchArgs {
    pub fn handle(&self) -> Result<()> {
        let mut data = std::fs::read(&self.file)
            .into_diagnostic()
            .context(format!("path: {}", &self.file.display()))?;

        let index = AddressIndex::from_reader(
            File::open(&self.index)
                .into_diagnostic()
                .context(format!("path: {}", &self.index.display()))?,
        )?;

        let translations: IndexMap<String, String> = serde_json::from_reader(
            File::open(&self.translations)
                .into_diagnostic()
                .context(format!("path: {}", &self.translations.display()))?,
        )
        .into_diagnostic()?;

        let report = Patcher::new(&mut data).apply_all(&index, &translations);
        info!(
            "patched {} strings, skipped {}",
            report.written(),
            report.skipped()
        );

        let mut out = create_target(&self.output, self.overwrite)?;
        out.write_all(&data)
            .into_diagnostic()
            .context(format!("writing {}", &self.output.display()))?;
        info!("writing {}", self.output.display());

        if let Some(path) = &self.report {
            serde_json::to_writer_pretty(create_target(path, self.overwrite)?, &report)
                .into_diagnostic()?;
            info!("writing {}", path.display());
        }

        Ok(())
    }
}
