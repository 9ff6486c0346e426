use serde::Deserialize;

/// Operator-supplied additions to the built-in Target Identity Set (§4.B).
///
/// Anything listed here is unioned with the compiled-in seed set at startup —
/// the same rule a successful network refresh follows: union, never replace.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TargetsConfig {
    /// Additional IPv4 prefixes, dotted-octet form (e.g. "149.154.").
    #[serde(default)]
    pub prefixes: Vec<String>,
    /// Additional closed IPv4 ranges, each "low-high" in dotted-quad form.
    #[serde(default)]
    pub ranges: Vec<(String, String)>,
    /// Additional case-insensitive SNI substrings.
    #[serde(default)]
    pub sni_patterns: Vec<String>,
}
