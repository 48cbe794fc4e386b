// One workbook per report, one worksheet per section.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook};

use super::{SheetWriter, ensure_dir};
use crate::error::OutputError;
use crate::models::{Cell, ReportRow, Section};

const MIN_COLUMN_WIDTH: usize = 12;

#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxSheetWriter;

impl SheetWriter for XlsxSheetWriter {
    fn write(
        &self,
        dir: &Path,
        stem: &str,
        sections: &[(Section, Vec<ReportRow>)],
    ) -> Result<Vec<PathBuf>, OutputError> {
        ensure_dir(dir)?;
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();

        for (section, rows) in sections {
            let sheet = workbook.add_worksheet();
            sheet.set_name(section.sheet_name())?;

            for (col, name) in section.columns().iter().enumerate() {
                let col = col as u16;
                sheet.write_string_with_format(0, col, *name, &header)?;
                sheet.set_column_width(col, name.len().max(MIN_COLUMN_WIDTH) as f64)?;
            }

            for (r, row) in rows.iter().enumerate() {
                let r = (r + 1) as u32;
                for (c, cell) in row.cells().iter().enumerate() {
                    let c = c as u16;
                    // Missing values stay visible as "N/A" text, never as an empty or zero cell.
                    match cell {
                        Cell::Number(v) => sheet.write_number(r, c, *v)?,
                        Cell::Integer(v) => sheet.write_number(r, c, *v as f64)?,
                        other => sheet.write_string(r, c, other.to_string())?,
                    };
                }
            }
        }

        let path = dir.join(format!("{stem}.xlsx"));
        workbook.save(&path)?;
        Ok(vec![path])
    }
}
