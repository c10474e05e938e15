//! Token-budget allocation and final snapshot assembly.

use crate::constants::{
    BLOCK_SEPARATOR, DEFAULT_TOKEN_BUDGET, DELTA_HEADING, GOVERNANCE_SHARE_PERCENT,
    MIN_SNAPSHOT_CHARS,
};
use crate::text::{char_len, tokens_to_chars, trim_to_chars};
use crate::truncate::truncate_structural;

pub const GOVERNANCE_HEADING: &str = "## Standing Rules";

/// Global token budget with a fixed 40/60 governance/daily split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
    pub total_tokens: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            total_tokens: DEFAULT_TOKEN_BUDGET,
        }
    }
}

impl Budget {
    pub fn new(total_tokens: usize) -> Self {
        Self { total_tokens }
    }

    pub fn governance_tokens(&self) -> usize {
        self.total_tokens * GOVERNANCE_SHARE_PERCENT / 100
    }

    pub fn daily_tokens(&self) -> usize {
        self.total_tokens - self.governance_tokens()
    }

    pub fn total_chars(&self) -> usize {
        tokens_to_chars(self.total_tokens)
    }

    pub fn governance_chars(&self) -> usize {
        tokens_to_chars(self.governance_tokens())
    }

    pub fn daily_chars(&self) -> usize {
        tokens_to_chars(self.daily_tokens())
    }
}

/// Inputs for the daily block. `note` must be normalized.
#[derive(Debug, Clone, Copy)]
pub struct DailyContent<'a> {
    pub date: &'a str,
    pub note: &'a str,
    pub delta: &'a str,
}

/// Heading plus whole-line-trimmed body, or nothing if no body line fits.
fn headed_block(heading: &str, body: &str, limit: usize) -> Option<String> {
    let header_cost = char_len(heading) + 1;
    if body.trim().is_empty() || limit <= header_cost {
        return None;
    }
    let body = trim_to_chars(body.trim(), limit - header_cost);
    if body.is_empty() {
        None
    } else {
        Some(format!("{heading}\n{body}"))
    }
}

/// Governance block trimmed to `limit` characters.
pub fn compose_governance(governance_text: &str, limit: usize) -> String {
    headed_block(GOVERNANCE_HEADING, governance_text, limit).unwrap_or_default()
}

/// Daily block: the delta first (when present), then the structurally
/// truncated note in whatever room remains, all within `limit` characters.
pub fn compose_daily(content: &DailyContent<'_>, limit: usize) -> String {
    let mut blocks: Vec<String> = Vec::new();

    if let Some(block) = headed_block(DELTA_HEADING, content.delta, limit) {
        blocks.push(block);
    }

    let used = blocks.iter().map(|b| char_len(b) + 2).sum::<usize>();
    let remaining = limit.saturating_sub(used);
    let heading = format!("## Today's note ({})", content.date);
    let header_cost = char_len(&heading) + 1;
    let minimum = if blocks.is_empty() {
        header_cost + 1
    } else {
        MIN_SNAPSHOT_CHARS.max(header_cost + 1)
    };
    if remaining >= minimum {
        let body = truncate_structural(content.note, remaining - header_cost);
        if !body.is_empty() {
            blocks.push(format!("{heading}\n{body}"));
        }
    }

    trim_to_chars(&blocks.join("\n\n"), limit)
}

/// Apportion the budget, trim each block to its share and join them.
///
/// Empty blocks are omitted along with the separator; when both are empty
/// the result is the empty string.
pub fn assemble(budget: Budget, governance_text: &str, daily: &DailyContent<'_>) -> String {
    let governance = compose_governance(governance_text, budget.governance_chars());
    let daily_limit = if governance.is_empty() {
        budget.daily_chars()
    } else {
        budget
            .daily_chars()
            .saturating_sub(char_len(BLOCK_SEPARATOR))
    };
    let daily = compose_daily(daily, daily_limit);

    [governance, daily]
        .into_iter()
        .filter(|b| !b.is_empty())
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}
