//! RFC 4180 CSV writer

use super::Table;

/// Quote a field when it holds a comma, quote, CR or LF; quotes are doubled
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn write_record(out: &mut String, fields: &[String]) {
    let line: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
    out.push_str(&line.join(","));
    out.push_str("\r\n");
}

/// Header record followed by one record per row, CRLF terminated
pub fn to_csv(table: &Table) -> String {
    let mut out = String::new();
    write_record(&mut out, &table.headers);
    for row in &table.rows {
        write_record(&mut out, row);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escaping() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_document_layout() {
        let mut table = Table::new("Budget", ["Project", "Amount"]);
        table.push(["Road, Phase 1", "1000.00"]);
        table.push(["Clinic", "250.50"]);
        assert_eq!(
            to_csv(&table),
            "Project,Amount\r\n\"Road, Phase 1\",1000.00\r\nClinic,250.50\r\n"
        );
    }
}
