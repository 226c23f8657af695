//! Ordering of published versions

use tracing::warn;

use super::specifier::parse_version;

/// Sort version strings newest-first by PEP 440 ordering
///
/// Strings that are not valid PEP 440 versions are dropped with a warning.
pub fn sort_descending<I, S>(versions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut parsed: Vec<_> = versions
        .into_iter()
        .map(Into::into)
        .filter_map(|raw| match parse_version(&raw) {
            Ok(version) => Some((version, raw)),
            Err(e) => {
                warn!("Ignoring unparseable release '{}': {}", raw, e);
                None
            }
        })
        .collect();

    parsed.sort_by(|(a, _), (b, _)| b.cmp(a));
    parsed.into_iter().map(|(_, raw)| raw).collect()
}
