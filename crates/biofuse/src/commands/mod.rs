pub mod decode;
pub mod discover;
pub mod run;

use biofuse_core::types::FieldValue;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

pub(crate) fn summary_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

pub(crate) fn render_value(value: Option<&FieldValue>) -> String {
    match value {
        Some(FieldValue::Number(number)) => format!("{number:.1}"),
        Some(FieldValue::Text(text)) => text.clone(),
        Some(FieldValue::Null) | None => String::new(),
    }
}
