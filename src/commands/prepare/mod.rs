//! Offline data preparation: fetch the Anthology export and turn it into the
//! metadata table the search front end loads.

mod convert;
mod download;
mod error;

pub use convert::bib_to_csv;
pub use error::PrepareError;

use crate::ui::StatusUI;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

const ARCHIVE_FILE: &str = "anthology+abstracts.bib.gz";
const BIB_FILE: &str = "anthology+abstracts.bib";

/// Builds `output` from the bibliography in `data_dir`, downloading it first when
/// asked to. An existing archive is unpacked if the `.bib` is not there yet.
pub async fn prepare(
    data_dir: &Path,
    output: &Path,
    source_url: Option<&str>,
) -> Result<usize, PrepareError> {
    fs::create_dir_all(data_dir).map_err(PrepareError::io(data_dir))?;
    let archive = data_dir.join(ARCHIVE_FILE);
    let bib = data_dir.join(BIB_FILE);

    if let Some(url) = source_url {
        download::download(url, &archive).await?;
    }
    if source_url.is_some() || (!bib.exists() && archive.exists()) {
        let spinner = StatusUI::spinner(&format!("Unpacking {}", archive.display()));
        let size = download::gunzip(&archive, &bib)?;
        StatusUI::finish_spinner_success(
            spinner,
            &format!("Unpacked {}", StatusUI::format_file_size(size as usize)),
        );
    }
    if !bib.exists() {
        return Err(PrepareError::MissingSource(bib));
    }

    let spinner = StatusUI::spinner("Converting bibliography...");
    let source = fs::read_to_string(&bib).map_err(PrepareError::io(&bib))?;
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(PrepareError::io(parent))?;
    }
    let file = File::create(output).map_err(PrepareError::io(output))?;
    let rows = match bib_to_csv(&source, BufWriter::new(file)) {
        Ok(rows) => rows,
        Err(e) => {
            StatusUI::finish_spinner_error(spinner, "Conversion failed");
            return Err(e);
        }
    };
    StatusUI::finish_spinner_success(
        spinner,
        &format!("Wrote {} entries to {}", rows, output.display()),
    );
    Ok(rows)
}
