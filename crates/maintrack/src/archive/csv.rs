//! Minimal CSV reading and writing.
//!
//! Every written field is double-quoted with embedded quotes doubled.
//! The reader accepts quoted or bare fields, `\n` or `\r\n` line endings,
//! and line breaks inside quoted fields.

use super::ArchiveError;

pub fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Formats one record, without the trailing newline.
pub fn write_record<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| quote(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// One parsed record and the physical line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Parses `input` into records. Blank lines are dropped.
pub fn parse(input: &str) -> Result<Vec<Record>, ArchiveError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut field_quoted = false;
    let mut line = 1usize;
    let mut start = 1usize;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() && !field_quoted => {
                in_quotes = true;
                field_quoted = true;
            }
            '"' => {
                return Err(ArchiveError::Malformed {
                    line,
                    reason: "unexpected quote inside field".to_string(),
                });
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                field_quoted = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                finish_record(&mut records, &mut record, &mut field, field_quoted, start);
                field_quoted = false;
                line += 1;
                start = line;
            }
            _ if field_quoted => {
                return Err(ArchiveError::Malformed {
                    line,
                    reason: "text after closing quote".to_string(),
                });
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ArchiveError::Malformed {
            line,
            reason: "unterminated quoted field".to_string(),
        });
    }
    finish_record(&mut records, &mut record, &mut field, field_quoted, start);
    Ok(records)
}

fn finish_record(
    records: &mut Vec<Record>,
    record: &mut Vec<String>,
    field: &mut String,
    field_quoted: bool,
    line: usize,
) {
    if record.is_empty() && field.is_empty() && !field_quoted {
        return;
    }
    record.push(std::mem::take(field));
    records.push(Record {
        line,
        fields: std::mem::take(record),
    });
}
