// One CSV file per section, same columns as the workbook sheets.

use std::path::{Path, PathBuf};

use super::{SheetWriter, ensure_dir};
use crate::error::OutputError;
use crate::models::{ReportRow, Section};

#[derive(Debug, Clone, Copy, Default)]
pub struct CsvSheetWriter;

impl CsvSheetWriter {
    pub fn file_name(stem: &str, section: Section) -> String {
        format!("{stem}_{}.csv", section.sheet_name().replace(' ', "_"))
    }
}

impl SheetWriter for CsvSheetWriter {
    fn write(
        &self,
        dir: &Path,
        stem: &str,
        sections: &[(Section, Vec<ReportRow>)],
    ) -> Result<Vec<PathBuf>, OutputError> {
        ensure_dir(dir)?;
        let mut written = Vec::with_capacity(sections.len());
        for (section, rows) in sections {
            let path = dir.join(Self::file_name(stem, *section));
            let mut writer = ::csv::Writer::from_path(&path)?;
            writer.write_record(section.columns())?;
            for row in rows {
                writer.write_record(row.cells().iter().map(|c| c.to_string()))?;
            }
            writer.flush()?;
            written.push(path);
        }
        Ok(written)
    }
}
