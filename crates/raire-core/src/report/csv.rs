use super::ExportContext;
use crate::extrema::{StatValue, Statistic};
use crate::model::StoredAssertion;

pub const EXTREMA_HEADER: &str = "Extreme item,Value,Assertion IDs";

pub const ASSERTION_HEADER: &str = "ID,Type,Winner,Loser,Assumed continuing,Difficulty,Margin,\
Diluted margin,Risk,Estimated samples to audit,Optimistic samples to audit,Two vote over count,\
One vote over count,Other discrepancy count,One vote under count,Two vote under count";

pub fn render_csv(ctx: &ExportContext) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Contest name,{}\n",
        escape(&ctx.request.contest_name)
    ));
    out.push_str(&format!(
        "Candidates,{}\n",
        join_cell(&ctx.request.candidates)
    ));
    out.push('\n');

    out.push_str(EXTREMA_HEADER);
    out.push('\n');
    for statistic in Statistic::ALL {
        // compute_extrema always fills every statistic
        if let Some(e) = ctx.extrema.get(statistic) {
            let positions: Vec<String> = e.positions.iter().map(|p| p.to_string()).collect();
            out.push_str(&format!(
                "{},{},\"{}\"\n",
                statistic.label(),
                format_stat(statistic, e.value),
                positions.join(",")
            ));
        }
    }
    out.push('\n');

    out.push_str(ASSERTION_HEADER);
    out.push('\n');
    for (i, a) in ctx.assertions.iter().enumerate() {
        out.push_str(&assertion_row(i + 1, a));
        out.push('\n');
    }

    out
}

fn assertion_row(index: usize, a: &StoredAssertion) -> String {
    let p = &a.progress;
    let cells = [
        index.to_string(),
        a.shape.type_tag().to_string(),
        escape(a.shape.winner()),
        escape(a.shape.loser()),
        join_cell(a.shape.continuing()),
        a.difficulty.to_string(),
        a.margin.to_string(),
        a.diluted_margin.to_string(),
        format_risk(p.current_risk),
        p.estimated_samples_to_audit.to_string(),
        p.optimistic_samples_to_audit.to_string(),
        p.two_vote_over_count.to_string(),
        p.one_vote_over_count.to_string(),
        p.other_count.to_string(),
        p.one_vote_under_count.to_string(),
        p.two_vote_under_count.to_string(),
    ];
    cells.join(",")
}

fn format_stat(statistic: Statistic, value: StatValue) -> String {
    match (statistic, value) {
        (Statistic::CurrentRisk, StatValue::Real(v)) => format_risk(v),
        (_, v) => v.to_string(),
    }
}

/// Quote a cell if it holds a separator, quote or line break; embedded
/// quotes are doubled.
pub fn escape(s: &str) -> String {
    if s.contains(&[',', '"', '\r', '\n'][..]) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Several values in one cell: escape each, join with ", ", escape again.
pub fn join_cell(items: &[String]) -> String {
    let joined = items
        .iter()
        .map(|s| escape(s))
        .collect::<Vec<_>>()
        .join(", ");
    escape(&joined)
}

/// Risk keeps at least two decimal places.
pub fn format_risk(v: f64) -> String {
    let s = v.to_string();
    if !v.is_finite() {
        return s;
    }
    match s.find('.') {
        None => format!("{}.00", s),
        Some(dot) if s.len() - dot - 1 < 2 => format!("{}0", s),
        Some(_) => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_only_quotes_when_needed() {
        assert_eq!(escape("Alice"), "Alice");
        assert_eq!(escape("Breaking, Bob"), "\"Breaking, Bob\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn join_cell_escapes_twice() {
        let names = vec!["Alice".to_string(), "Breaking, Bob".to_string()];
        assert_eq!(join_cell(&names), "\"Alice, \"\"Breaking, Bob\"\"\"");
        assert_eq!(join_cell(&["Solo".to_string()]), "Solo");
        assert_eq!(join_cell(&[]), "");
    }

    #[test]
    fn risk_has_at_least_two_decimals() {
        assert_eq!(format_risk(1.0), "1.00");
        assert_eq!(format_risk(0.5), "0.50");
        assert_eq!(format_risk(0.25), "0.25");
        assert_eq!(format_risk(0.0347), "0.0347");
    }
}
