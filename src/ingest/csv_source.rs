//! Tabular knowledge source.
//!
//! The header row names the columns; `instruction` and `response` are
//! required, `category`, `intent` and `flags` are optional. Extra columns are
//! ignored and short rows read as empty strings.

use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::core::errors::{ApiError, ErrorCode};
use crate::knowledge::RawKnowledgeRecord;

const REQUIRED_COLUMNS: [&str; 2] = ["instruction", "response"];

pub async fn read_records(path: &Path) -> Result<Vec<RawKnowledgeRecord>, ApiError> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        ApiError::with_source(
            ErrorCode::InvalidParameter,
            format!("failed to read source file {}", path.display()),
            e,
        )
    })?;
    parse_records(&contents)
}

pub fn parse_records(contents: &str) -> Result<Vec<RawKnowledgeRecord>, ApiError> {
    if contents.trim().is_empty() {
        return Err(ApiError::invalid_parameter("source file is empty"));
    }

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(contents.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| {
            ApiError::with_source(ErrorCode::InvalidParameter, "failed to read header row", e)
        })?
        .clone();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut records = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row.map_err(|e| {
            ApiError::with_source(
                ErrorCode::InvalidParameter,
                format!("failed to read row {}", line + 1),
                e,
            )
        })?;
        records.push(columns.record(&row));
    }
    Ok(records)
}

struct ColumnMap {
    instruction: usize,
    response: usize,
    category: Option<usize>,
    intent: Option<usize>,
    flags: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self, ApiError> {
        let position = |name: &str| {
            headers.iter().position(|header| {
                header
                    .trim_start_matches('\u{feff}')
                    .trim()
                    .eq_ignore_ascii_case(name)
            })
        };

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| position(*name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ApiError::invalid_parameter(format!(
                "source header is missing required column(s): {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            instruction: position("instruction").unwrap_or_default(),
            response: position("response").unwrap_or_default(),
            category: position("category"),
            intent: position("intent"),
            flags: position("flags"),
        })
    }

    fn record(&self, row: &StringRecord) -> RawKnowledgeRecord {
        let field = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .map(str::to_string)
                .unwrap_or_default()
        };

        RawKnowledgeRecord {
            instruction: field(Some(self.instruction)),
            response: field(Some(self.response)),
            category: field(self.category),
            intent: field(self.intent),
            flags: field(self.flags),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_by_header_name() {
        let csv = "flags,instruction,category,intent,response,extra\n\
                   B,reset password,ACCOUNT,recover_password,\"Go to settings, then security\",x\n";
        let records = parse_records(csv).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].instruction, "reset password");
        assert_eq!(records[0].response, "Go to settings, then security");
        assert_eq!(records[0].category, "ACCOUNT");
        assert_eq!(records[0].intent, "recover_password");
        assert_eq!(records[0].flags, "B");
    }

    #[test]
    fn short_rows_and_missing_optional_columns_read_as_empty() {
        let csv = "instruction,response,category\nq1,a1\nq2,a2,billing\n";
        let records = parse_records(csv).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].category, "");
        assert_eq!(records[1].category, "billing");
        assert_eq!(records[1].flags, "");
    }

    #[test]
    fn empty_file_and_missing_header_are_rejected() {
        let err = parse_records("  \n").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameter);

        let err = parse_records("question,answer\nq,a\n").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameter);
        assert!(err.to_string().contains("instruction, response"));
    }

    #[tokio::test]
    async fn reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data_set.csv");
        std::fs::write(&path, "instruction,response\nhello,world\n").unwrap();

        let records = read_records(&path).await.unwrap();
        assert_eq!(records[0].response, "world");

        let err = read_records(&dir.path().join("missing.csv")).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParameter);
    }
}
