mod id;
mod paper;
mod text;

pub use id::{ParseRecordIdError, RecordId};
pub use paper::{PaperRecord, RankedPaper};
pub use text::{clean_text, doi_url, normalize_text, truncate_chars};
