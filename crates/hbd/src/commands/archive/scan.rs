use clap::Args;
use indexmap::IndexMap;
use miette::{Context, IntoDiagnostic, Result};
use std::path::PathBuf;
use tracing::info;

use hbd_archive::{extract, AddressIndex};

use super::create_target;

#[derive(Args)]
pub struct ScanArgs {
    /// An input HBD archive
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target file for the address index JSON
    #[arg(short, long, value_name = "FILE")]
    index: PathBuf,

    /// A target file for the extracted texts JSON
    #[arg(short, long, value_name = "FILE")]
    texts: PathBuf,

    /// Allow overwriting the targets
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl ScanArgs {
    pub fn handle(&self) -> Result<()> {
        let data = std::fs::read(&self.file)
            .into_diagnostic()
            .context(format!("path: {}", &self.file.display()))?;

        let strings = extract(&data);
        info!("extracted {} strings", strings.len());

        let index = AddressIndex::from_extraction(&strings);
        index.to_writer(create_target(&self.index, self.overwrite)?)?;
        info!("writing {}", self.index.display());

        let texts: IndexMap<String, String> = strings
            .into_iter()
            .map(|s| (s.identifier, s.text))
            .collect();
        serde_json::to_writer_pretty(create_target(&self.texts, self.overwrite)?, &texts)
            .into_diagnostic()?;
        info!("writing {}", self.texts.display());

        Ok(())
    }
}
