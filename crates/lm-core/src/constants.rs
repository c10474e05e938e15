/// Characters per estimated token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Default total token budget (a 12,000 character ceiling).
pub const DEFAULT_TOKEN_BUDGET: usize = 3000;

/// Share of the total budget given to governance content, in percent.
/// Daily content receives the remainder.
pub const GOVERNANCE_SHARE_PERCENT: usize = 40;

/// Share of the truncation budget spent on the retained narrative excerpt.
pub const EXCERPT_SHARE_PERCENT: usize = 65;

/// Minimum room (in characters) that must remain after the delta block
/// before the full-note snapshot is attempted.
pub const MIN_SNAPSHOT_CHARS: usize = 160;

/// Separator placed between the governance block and the daily block.
pub const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// Appended whenever the truncator had to drop narrative lines a second time.
pub const TRUNCATION_MARKER: &str = "…(truncated safely: some narrative lines omitted)";

/// Heading for the block of lines added since the previous checkpoint.
pub const DELTA_HEADING: &str = "## Since you last spoke";

/// Heading for the synthesized list of strong-constraint bullets.
pub const ABSOLUTE_CONSTRAINTS_HEADING: &str = "### Absolute Constraints";
