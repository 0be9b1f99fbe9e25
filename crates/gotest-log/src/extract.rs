//! Failure-diagnostic extraction

/// Substrings marking a line as diagnostic, matched case-sensitively.
const ERROR_MARKERS: [&str; 7] = [
    "FAIL:", "Error:", "panic:", "expected", "actual", "got", "want",
];

/// Lines returned when no marker matches anywhere in the output.
const FALLBACK_LINES: usize = 5;

const NO_DETAILS: &str = "No error details available";

/// Pull a short diagnostic out of a failed test's captured output.
///
/// Keeps every line (trimmed) containing a known failure marker; with no
/// marker hits, the first few lines of the output stand in as a best-effort
/// summary.
pub(crate) fn extract_error(output: &str) -> String {
    if output.is_empty() {
        return NO_DETAILS.to_string();
    }

    let error_lines: Vec<&str> = output
        .lines()
        .map(str::trim)
        .filter(|line| ERROR_MARKERS.iter().any(|marker| line.contains(marker)))
        .collect();

    if !error_lines.is_empty() {
        return error_lines.join("\n");
    }

    output
        .lines()
        .take(FALLBACK_LINES)
        .collect::<Vec<_>>()
        .join("\n")
}
