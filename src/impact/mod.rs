//! Change-impact outputs derived from classified flow paths.

mod coupling;
pub use coupling::{CouplingMatrix, NO_RELATIONSHIP};

mod cumulative;
pub use cumulative::CumulativeScores;

mod fan;
pub use fan::FanData;

/// Quote a CSV field if it contains a separator, quote, or newline.
pub(crate) fn csv_field(s: &str) -> std::borrow::Cow<'_, str> {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\"")).into()
    } else {
        s.into()
    }
}
