//! Parsing of operator CSV files into sheet rows.
//!
//! A bad line never aborts the import: it is reported with its 1-based line
//! number and the remaining lines are still parsed.

use crate::{
    dao::models::{SheetRow, SheetRowError},
    dto::admin::FirstLine,
    state::division::Division,
};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// A line that could not be turned into a competitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// 1-based line number in the submitted text.
    pub line_number: usize,
    /// Why the line was rejected.
    pub reason: SheetRowError,
}

/// Result of parsing one CSV file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCsv {
    /// Title read from the first line in [`FirstLine::CompetitionName`] mode.
    pub competition_name: Option<String>,
    /// Valid rows, in file order.
    pub rows: Vec<SheetRow>,
    /// Rejected lines, in file order.
    pub errors: Vec<RowError>,
}

/// Parse `text` using the column layout of `division`.
///
/// Blank lines are skipped. The first non-blank line is either a header or the
/// competition name, depending on `first_line`.
pub fn parse_csv(
    division: Division,
    text: &str,
    first_line: FirstLine,
    group_suffix: &str,
) -> ParsedCsv {
    let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
    let mut parsed = ParsedCsv::default();
    let mut seen_first_line = false;

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        if !seen_first_line {
            seen_first_line = true;
            if first_line == FirstLine::CompetitionName {
                parsed.competition_name = line
                    .split(',')
                    .next()
                    .map(|cell| cell.trim().trim_matches('"').trim().to_string())
                    .filter(|name| !name.is_empty());
            }
            continue;
        }

        let cells: Vec<&str> = line.split(',').collect();
        match SheetRow::from_text_cells(division, &cells, group_suffix) {
            Ok(row) => parsed.rows.push(row),
            Err(reason) => parsed.errors.push(RowError {
                line_number: index + 1,
                reason,
            }),
        }
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    const WOMEN_CSV: &str = "class,group,,name,floor,vault,bars,beam\n\
        上級,1,,Aiko,9.5,9.0,8.5,9.1\n\
        上級,1,,Mei,9.0\n\
        中級,2,,Rin,8,8,8,8\n";

    #[test]
    fn collects_valid_rows_and_line_numbered_errors() {
        let parsed = parse_csv(Division::Women, WOMEN_CSV, FirstLine::Header, "組");
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[1].name, "Rin");
        assert_eq!(parsed.rows[1].group, "2組");
        assert_eq!(
            parsed.errors,
            vec![RowError {
                line_number: 3,
                reason: SheetRowError::TooFewColumns {
                    expected: 8,
                    found: 5
                },
            }]
        );
        assert_eq!(parsed.competition_name, None);
    }

    #[test]
    fn strips_bom_crlf_and_blank_lines() {
        let text = "\u{feff}header\r\n\r\n初級,A,,Yui,1,2,3,4\r\n   \r\n";
        let parsed = parse_csv(Division::Women, text, FirstLine::Header, "組");
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].scores, vec![1.0, 2.0, 3.0, 4.0]);
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn first_line_can_carry_competition_name() {
        let text = "\"Autumn Open\",,,\n上級,1,,Ken,1,2,3,4,5,6\n";
        let parsed = parse_csv(Division::Men, text, FirstLine::CompetitionName, "組");
        assert_eq!(parsed.competition_name.as_deref(), Some("Autumn Open"));
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].scores.len(), 6);
    }

    #[test]
    fn blank_required_field_is_reported_with_its_line() {
        let text = "h\n\n上級,,,Ken,1,2,3,4\n";
        let parsed = parse_csv(Division::Women, text, FirstLine::Header, "組");
        assert!(parsed.rows.is_empty());
        assert_eq!(parsed.errors[0].line_number, 3);
        assert_eq!(parsed.errors[0].reason, SheetRowError::MissingField);
    }
}
