//! The fixed 42-field traffic record layout.

/// How a feature column is represented in the raw file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Parsed as `f64`.
    Numeric,
    /// Kept as a trimmed string and encoded later.
    Categorical,
}

/// One feature column of the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Column name.
    pub name: &'static str,
    /// Raw representation.
    pub kind: ColumnKind,
}

const fn num(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Numeric,
    }
}

const fn cat(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Categorical,
    }
}

/// Number of feature columns.
pub const N_FEATURES: usize = 41;

/// Number of fields per row: every feature plus the trailing label.
pub const FIELD_COUNT: usize = N_FEATURES + 1;

/// Name given to the trailing label field.
pub const LABEL_COLUMN: &str = "label";

/// Index of `protocol_type` among the feature columns.
pub const PROTOCOL_TYPE: usize = 1;
/// Index of `service` among the feature columns.
pub const SERVICE: usize = 2;
/// Index of `flag` among the feature columns.
pub const FLAG: usize = 3;

/// Feature columns in file order.
pub static SCHEMA: [Column; N_FEATURES] = [
    num("duration"),
    cat("protocol_type"),
    cat("service"),
    cat("flag"),
    num("src_bytes"),
    num("dst_bytes"),
    num("land"),
    num("wrong_fragment"),
    num("urgent"),
    num("hot"),
    num("num_failed_logins"),
    num("logged_in"),
    num("num_compromised"),
    num("root_shell"),
    num("su_attempted"),
    num("num_root"),
    num("num_file_creations"),
    num("num_shells"),
    num("num_access_files"),
    num("num_outbound_cmds"),
    num("is_host_login"),
    num("is_guest_login"),
    num("count"),
    num("srv_count"),
    num("serror_rate"),
    num("srv_serror_rate"),
    num("rerror_rate"),
    num("srv_rerror_rate"),
    num("same_srv_rate"),
    num("diff_srv_rate"),
    num("srv_diff_host_rate"),
    num("dst_host_count"),
    num("dst_host_srv_count"),
    num("dst_host_same_srv_rate"),
    num("dst_host_diff_srv_rate"),
    num("dst_host_same_src_port_rate"),
    num("dst_host_srv_diff_host_rate"),
    num("dst_host_serror_rate"),
    num("dst_host_srv_serror_rate"),
    num("dst_host_rerror_rate"),
    num("dst_host_srv_rerror_rate"),
];

/// Return the feature column names in file order.
#[must_use]
pub fn feature_names() -> Vec<String> {
    SCHEMA.iter().map(|c| c.name.to_string()).collect()
}
