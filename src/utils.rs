pub fn column_number_to_name(column: u32) -> String {
    let mut column = column;
    let mut name = String::new();
    while column > 0 {
        let rem = ((column - 1) % 26) as u8;
        name.insert(0, (b'A' + rem) as char);
        column = (column - 1) / 26;
    }
    name
}

pub fn cell_address(column: u32, row: u32) -> String {
    format!("{}{}", column_number_to_name(column), row)
}

/// Makes a vendor name safe for use in a filename: characters that are
/// illegal on common filesystems become underscores, whitespace runs
/// collapse to a single underscore, and the result is uppercased.
pub fn sanitize_filename_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect();
    let mut out = String::with_capacity(cleaned.len());
    let mut last_was_gap = true;
    for c in cleaned.trim().chars() {
        if c.is_whitespace() {
            if !last_was_gap {
                out.push('_');
                last_was_gap = true;
            }
        } else {
            out.push(c.to_ascii_uppercase());
            last_was_gap = false;
        }
    }
    if out.is_empty() {
        "UNKNOWN_VENDOR".to_string()
    } else {
        out
    }
}

/// Turns a fiscal report-period token like `FY2025-APR` into the readable
/// `APR 2025` used in filenames. Unrecognized tokens pass through unchanged.
pub fn readable_period(report_month: &str) -> String {
    if let Some(rest) = report_month.strip_prefix("FY") {
        if let Some((year, month)) = rest.split_once('-') {
            if !year.is_empty() && !month.is_empty() {
                return format!("{month} {year}");
            }
        }
    }
    report_month.to_string()
}
