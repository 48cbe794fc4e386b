// Report assembly: one insertion-ordered row list per section. No sorting, no dedup.

use tracing::warn;

use crate::models::{ReportRow, Section};

#[derive(Debug, Clone)]
pub struct ReportAssembler {
    sections: Vec<(Section, Vec<ReportRow>)>,
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportAssembler {
    pub fn new() -> Self {
        Self {
            sections: Section::ALL.iter().map(|s| (*s, Vec::new())).collect(),
        }
    }

    /// Appends `row` to `section`. Rows whose width does not match the section schema are dropped.
    pub fn add_row(&mut self, section: Section, row: impl Into<ReportRow>) {
        let row = row.into();
        if row.len() != section.columns().len() {
            warn!(
                section = section.sheet_name(),
                expected = section.columns().len(),
                got = row.len(),
                "row does not match section schema, dropped"
            );
            return;
        }
        if let Some((_, rows)) = self.sections.iter_mut().find(|(s, _)| *s == section) {
            rows.push(row);
        }
    }

    pub fn row_count(&self, section: Section) -> usize {
        self.sections
            .iter()
            .find(|(s, _)| *s == section)
            .map_or(0, |(_, rows)| rows.len())
    }

    /// Every section in sheet order, empty ones included.
    pub fn finalize(self) -> Vec<(Section, Vec<ReportRow>)> {
        self.sections
    }
}
