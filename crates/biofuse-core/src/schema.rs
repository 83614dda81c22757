use biofuse_parser::formats::schema::{CO2_PPM, CONTEXT, HR_BPM, HUMIDITY_PCT, SOURCE, TEMP_C};

pub use biofuse_parser::formats::schema::TIMESTAMP;

/// Rendering of the `timestamp` column in text outputs.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Flat cache timestamps keep any sub-second part so a reload sees the same
/// instants. Whole seconds render exactly as `TIMESTAMP_FORMAT`.
pub const FLAT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Field each side must carry for a record to count.
pub const AIR_PRIMARY_FIELD: &str = CO2_PPM;
pub const HEART_RATE_PRIMARY_FIELD: &str = HR_BPM;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Float,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub side: Side,
}

const fn column(name: &'static str, kind: ColumnKind, side: Side) -> ColumnSpec {
    ColumnSpec { name, kind, side }
}

/// Columns after `timestamp` in every fused table, in output order.
pub const FUSED_COLUMNS: [ColumnSpec; 6] = [
    column(CO2_PPM, ColumnKind::Float, Side::Primary),
    column(TEMP_C, ColumnKind::Float, Side::Primary),
    column(HUMIDITY_PCT, ColumnKind::Float, Side::Primary),
    column(HR_BPM, ColumnKind::Float, Side::Secondary),
    column(SOURCE, ColumnKind::Text, Side::Secondary),
    column(CONTEXT, ColumnKind::Text, Side::Secondary),
];

/// Columns after `timestamp` in the flattened heart-rate cache.
pub const FLAT_HEART_RATE_COLUMNS: [ColumnSpec; 3] = [
    column(HR_BPM, ColumnKind::Float, Side::Secondary),
    column(SOURCE, ColumnKind::Text, Side::Secondary),
    column(CONTEXT, ColumnKind::Text, Side::Secondary),
];

pub fn fused_header() -> Vec<&'static str> {
    std::iter::once(TIMESTAMP)
        .chain(FUSED_COLUMNS.iter().map(|column| column.name))
        .collect()
}
