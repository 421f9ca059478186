//! Output renderers for scored batches: console table, JSON, HTML

use modguard_core::{RiskTier, ScoreBatch};

const COMMENT_HEADER: &str = "Comment";
const PROBABILITY_HEADER: &str = "Probability";
const RISK_HEADER: &str = "Risk Level";

/// Widest comment column before text is cut
const MAX_COMMENT_WIDTH: usize = 60;

/// Cells in the probability bar
const BAR_WIDTH: usize = 20;

/// Console renderer for terminal output.
pub struct ConsoleRenderer {
    pub use_color: bool,
}

impl ConsoleRenderer {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    fn color_start(&self, tier: RiskTier) -> &'static str {
        if !self.use_color {
            return "";
        }
        match tier {
            RiskTier::Low => "\x1b[32m",    // green
            RiskTier::Medium => "\x1b[33m", // yellow
            RiskTier::High => "\x1b[31m",   // red
        }
    }

    fn color_end(&self) -> &'static str {
        if self.use_color {
            "\x1b[0m"
        } else {
            ""
        }
    }

    /// Render a batch as a table followed by a bar for the last result.
    ///
    /// An empty batch renders only its notice.
    pub fn render(&self, batch: &ScoreBatch) -> String {
        let mut output = String::new();

        if let Some(notice) = &batch.notice {
            output.push_str(notice);
            output.push('\n');
        }
        if batch.is_empty() {
            return output;
        }

        let comment_width = batch
            .results
            .iter()
            .map(|r| r.comment.chars().count().min(MAX_COMMENT_WIDTH))
            .max()
            .unwrap_or(0)
            .max(COMMENT_HEADER.len());
        let probability_width = PROBABILITY_HEADER.len();
        let risk_width = RISK_HEADER.len().max(RiskTier::Medium.label().len());

        output.push_str(&format!(
            "{:<cw$}  {:>pw$}  {}\n",
            COMMENT_HEADER,
            PROBABILITY_HEADER,
            RISK_HEADER,
            cw = comment_width,
            pw = probability_width,
        ));
        output.push_str(&format!(
            "{}  {}  {}\n",
            "-".repeat(comment_width),
            "-".repeat(probability_width),
            "-".repeat(risk_width),
        ));

        for result in &batch.results {
            output.push_str(&format!(
                "{:<cw$}  {:>pw$}  {}{}{}\n",
                truncate(&result.comment, MAX_COMMENT_WIDTH),
                result.percentage(),
                self.color_start(result.tier),
                result.tier.label(),
                self.color_end(),
                cw = comment_width,
                pw = probability_width,
            ));
        }

        if let Some(last) = batch.last() {
            output.push('\n');
            output.push_str(&format!(
                "Probability of violation: {}{}{} {}\n",
                self.color_start(last.tier),
                progress_bar(last.probability),
                self.color_end(),
                last.percentage(),
            ));
        }

        if batch.skipped > 0 {
            output.push_str(&format!(
                "\n{} line(s) skipped: nothing left to score after cleanup\n",
                batch.skipped
            ));
        }

        output
    }
}

impl Default for ConsoleRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Fixed-width bar, e.g. `[#######.............]`
fn progress_bar(probability: f64) -> String {
    let filled = ((probability.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

/// Render a batch as pretty-printed JSON
pub fn render_json(batch: &ScoreBatch) -> serde_json::Result<String> {
    serde_json::to_string_pretty(batch)
}

/// Render a batch as an HTML table with colored tier labels
pub fn render_html(batch: &ScoreBatch) -> String {
    if batch.is_empty() {
        return format!(
            "<p>{}</p>",
            escape_html(batch.notice.as_deref().unwrap_or_default())
        );
    }

    let mut html = String::from(
        "<table>\n<tr><th>Comment</th><th>Probability</th><th>Risk Level</th></tr>\n",
    );
    for result in &batch.results {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td><span style='color:{}; font-weight:bold'>{}</span></td></tr>\n",
            escape_html(&result.comment),
            result.percentage(),
            result.tier.color(),
            result.tier.label(),
        ));
    }
    html.push_str("</table>");
    html
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
