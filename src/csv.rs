//! Minimal CSV reader/writer: comma-separated, double-quote escaping, CRLF
//! tolerant. Covers exactly what roster import and report export need.

/// Parse CSV text into rows of cells. Quoted cells may contain commas,
/// newlines, and doubled quotes. Blank lines are skipped.
pub fn parse(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next(); // doubled quote escape
                    cell.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => row.push(std::mem::take(&mut cell)),
            '\r' if !in_quotes => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                flush_row(&mut rows, &mut row, &mut cell);
            }
            '\n' if !in_quotes => flush_row(&mut rows, &mut row, &mut cell),
            _ => cell.push(ch),
        }
    }

    // Trailing row without a final newline
    if !cell.is_empty() || !row.is_empty() {
        row.push(cell);
        rows.push(row);
    }

    rows
}

fn flush_row(rows: &mut Vec<Vec<String>>, row: &mut Vec<String>, cell: &mut String) {
    row.push(std::mem::take(cell));
    // A lone empty cell is a blank line, not a row
    if row.len() == 1 && row[0].is_empty() {
        row.clear();
    } else {
        rows.push(std::mem::take(row));
    }
}

/// Render a header plus data rows as CSV text, quoting only where needed.
pub fn to_string(header: &[String], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    push_row(&mut out, header);
    for row in rows {
        push_row(&mut out, row);
    }
    out
}

fn push_row(out: &mut String, row: &[String]) {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if cell.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push('\n');
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_plain_rows() {
        let rows = parse("a,b,c\nd,e,f\n");
        assert_eq!(rows, vec![row(&["a", "b", "c"]), row(&["d", "e", "f"])]);
    }

    #[test]
    fn parses_quoted_cells() {
        let rows = parse("\"a,b\",\"he said \"\"hi\"\"\",\"two\nlines\"\n");
        assert_eq!(rows, vec![row(&["a,b", "he said \"hi\"", "two\nlines"])]);
    }

    #[test]
    fn tolerates_crlf_and_blank_lines() {
        let rows = parse("a,b\r\n\r\nc,d\r\n");
        assert_eq!(rows, vec![row(&["a", "b"]), row(&["c", "d"])]);
    }

    #[test]
    fn last_row_without_newline() {
        let rows = parse("a,b\nc,d");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], row(&["c", "d"]));
    }

    #[test]
    fn writer_quotes_only_when_needed() {
        let text = to_string(&row(&["plain", "with,comma"]), &[row(&["a\"b", "x"])]);
        assert_eq!(text, "plain,\"with,comma\"\n\"a\"\"b\",x\n");
    }

    #[test]
    fn write_parse_round_trip() {
        let header = row(&["h1", "h2"]);
        let data = vec![row(&["a,b", "line\nbreak"]), row(&["\"q\"", ""])];
        let text = to_string(&header, &data);
        let parsed = parse(&text);
        assert_eq!(parsed[0], header);
        assert_eq!(&parsed[1..], &data[..]);
    }
}
