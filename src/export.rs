use crate::diff::coerce_user_id;
use crate::errors::AppResult;
use crate::models::{AssetRecord, AssetStatus, ExportFormat};
use crate::registry::{FieldKind, CATEGORY_FIELD, FIELDS, STATUS};

pub const PLACEHOLDER: &str = "\u{2014}";

pub fn headers() -> Vec<String> {
    std::iter::once("Title")
        .chain(FIELDS.iter().map(|field| field.label))
        .chain(std::iter::once(CATEGORY_FIELD.label))
        .map(ToString::to_string)
        .collect()
}

/// Flattens one record into printable cells, aligned with [`headers`].
///
/// `resolved_user_name` is the assignee's display name when the directory
/// knows the user; `resolved_category_names` lists the linked categories.
pub fn project_row(
    record: &AssetRecord,
    resolved_user_name: Option<&str>,
    resolved_category_names: &[String],
) -> Vec<String> {
    let mut row = Vec::with_capacity(FIELDS.len() + 2);
    row.push(or_placeholder(&record.title));

    for field in FIELDS.iter() {
        let value = record.value(field.name);
        let cell = match field.kind {
            FieldKind::LongText => value.to_string(),
            FieldKind::UserReference => assignee_cell(record, value, resolved_user_name),
            _ => or_placeholder(value),
        };
        row.push(cell);
    }

    if resolved_category_names.is_empty() {
        row.push(PLACEHOLDER.to_string());
    } else {
        row.push(resolved_category_names.join(", "));
    }
    row
}

fn assignee_cell(record: &AssetRecord, value: &str, resolved_user_name: Option<&str>) -> String {
    if coerce_user_id(value) > 0 {
        return resolved_user_name.unwrap_or("Unknown User").to_string();
    }
    if record.value(STATUS) == AssetStatus::Unassigned.as_str() {
        AssetStatus::Unassigned.as_str().to_string()
    } else {
        PLACEHOLDER.to_string()
    }
}

fn or_placeholder(value: &str) -> String {
    if value.trim().is_empty() {
        PLACEHOLDER.to_string()
    } else {
        value.to_string()
    }
}

pub fn render(format: ExportFormat, headers: &[String], rows: &[Vec<String>]) -> AppResult<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
            "headers": headers,
            "rows": rows,
        }))?),
        ExportFormat::Markdown => Ok(render_markdown(headers, rows)),
        ExportFormat::Text => Ok(render_text(headers, rows)),
    }
}

fn render_markdown(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut out = String::from("# Asset List\n\n");
    out.push_str(&format!("| {} |\n", headers.join(" | ")));
    out.push_str(&format!("|{}\n", " --- |".repeat(headers.len())));
    if rows.is_empty() {
        out.push_str("\nNo assets found.\n");
        return out;
    }
    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| cell.replace('|', "\\|").replace('\n', "<br>"))
            .collect();
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    out
}

fn render_text(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut out = String::from("Asset List\n");
    if rows.is_empty() {
        out.push_str("\nNo assets found.\n");
        return out;
    }
    for row in rows {
        out.push('\n');
        for (header, cell) in headers.iter().zip(row) {
            if cell.contains('\n') {
                out.push_str(&format!("{}:\n", header));
                for line in cell.lines() {
                    out.push_str(&format!("    {}\n", line));
                }
            } else {
                out.push_str(&format!("{}: {}\n", header, cell));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValues;
    use crate::testing::fixed_time;

    fn record(values: &[(&str, &str)]) -> AssetRecord {
        AssetRecord {
            id: 1,
            title: "00001".to_string(),
            values: values
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect::<FieldValues>(),
            category: Some(3),
            created_at: fixed_time(),
            updated_at: fixed_time(),
        }
    }

    #[test]
    fn headers_follow_registry_order() {
        let headers = headers();
        assert_eq!(headers.first().map(String::as_str), Some("Title"));
        assert_eq!(headers.last().map(String::as_str), Some("Category"));
        assert_eq!(headers.len(), FIELDS.len() + 2);
        assert_eq!(headers[7], "Issued To");
    }

    #[test]
    fn projects_resolved_names_and_placeholders() {
        let asset = record(&[
            ("asset_tag", "IT-0042"),
            ("brand", "Dell"),
            ("issued_to", "7"),
            ("status", "Assigned"),
            ("description", "Line one\nLine two"),
        ]);
        let row = project_row(&asset, Some("Dana Reyes"), &["Laptops".to_string()]);

        assert_eq!(row.len(), headers().len());
        assert_eq!(row[0], "00001");
        assert_eq!(row[1], "IT-0042");
        assert_eq!(row[2], PLACEHOLDER);
        assert_eq!(row[4], "Dell");
        assert_eq!(row[6], PLACEHOLDER);
        assert_eq!(row[7], "Dana Reyes");
        assert_eq!(row[8], "Assigned");
        assert_eq!(row[9], "Line one\nLine two");
        assert_eq!(row[10], "Laptops");
    }

    #[test]
    fn assignee_cell_depends_on_status_when_unset() {
        let unassigned = record(&[("status", "Unassigned")]);
        assert_eq!(project_row(&unassigned, None, &[])[7], "Unassigned");

        let repairing = record(&[("status", "Repairing")]);
        let row = project_row(&repairing, None, &[]);
        assert_eq!(row[7], PLACEHOLDER);
        assert_eq!(row[10], PLACEHOLDER);

        let orphaned = record(&[("status", "Assigned"), ("issued_to", "41")]);
        assert_eq!(project_row(&orphaned, None, &[])[7], "Unknown User");
    }

    #[test]
    fn markdown_keeps_rows_on_one_line() {
        let headers = headers();
        let asset = record(&[("description", "a|b\nc")]);
        let rows = vec![project_row(&asset, None, &[])];
        let rendered = render(ExportFormat::Markdown, &headers, &rows).expect("render");
        assert!(rendered.contains("a\\|b<br>c"));
        assert_eq!(rendered.lines().filter(|line| line.starts_with('|')).count(), 3);
    }

    #[test]
    fn text_indents_multiline_cells() {
        let headers = headers();
        let asset = record(&[("description", "first\nsecond")]);
        let rendered = render(ExportFormat::Text, &headers, &[project_row(&asset, None, &[])]).expect("render");
        assert!(rendered.contains("Description:\n    first\n    second\n"));
    }
}
