//! Keyword-based comment classification and the insight cards built from
//! the dashboard aggregates.

use serde::Serialize;

use crate::config::Config;
use crate::stats::Dashboard;
use crate::types::Record;
use crate::values::parse_int_prefix;

/// One comment shown in a feedback list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackItem {
    pub comment: String,
    pub name: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Feedback {
    /// Responses with a non-blank comment.
    pub comments: usize,
    /// Top rating and a positive keyword in the comment.
    pub positive: usize,
    /// Rating below 5, or any comment at all.
    pub suggestions: usize,
    pub excellent: Vec<FeedbackItem>,
    pub good: Vec<FeedbackItem>,
    pub suggestion_items: Vec<FeedbackItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insight {
    pub title: String,
    pub content: String,
}

struct Classified<'r> {
    record: &'r Record,
    rating: Option<i64>,
    comment: &'r str,
}

#[must_use]
pub fn analyze(records: &[Record], config: &Config) -> Feedback {
    let fields = &config.fields;
    let rows: Vec<Classified<'_>> = records
        .iter()
        .map(|record| Classified {
            record,
            rating: parse_int_prefix(record.get_lenient(&fields.rating)),
            comment: record.get_lenient(&fields.comment),
        })
        .collect();

    let has_comment = |c: &&Classified<'_>| !c.comment.trim().is_empty();
    let item = |c: &Classified<'_>| FeedbackItem {
        comment: c.comment.to_string(),
        name: c.record.get_lenient(&fields.name).to_string(),
        timestamp: c.record.get_lenient(&fields.timestamp).to_string(),
    };

    let positive = rows
        .iter()
        .filter(|c| c.rating == Some(5) && is_positive(c.comment, &config.positive_keywords))
        .count();
    let suggestions: Vec<&Classified<'_>> = rows
        .iter()
        .filter(|c| c.rating.is_some_and(|n| n < 5) || !c.comment.is_empty())
        .collect();

    Feedback {
        comments: rows.iter().filter(has_comment).count(),
        positive,
        suggestions: suggestions.len(),
        excellent: rows
            .iter()
            .filter(|c| c.rating == Some(5))
            .filter(has_comment)
            .map(item)
            .collect(),
        good: rows
            .iter()
            .filter(|c| c.rating == Some(4))
            .filter(has_comment)
            .map(item)
            .collect(),
        suggestion_items: suggestions
            .into_iter()
            .filter(has_comment)
            .map(item)
            .collect(),
    }
}

fn is_positive(comment: &str, keywords: &[String]) -> bool {
    let text = comment.to_lowercase();
    keywords.iter().any(|k| text.contains(k.as_str()))
}

/// The four summary cards shown under the charts.
#[must_use]
pub fn insights(dashboard: &Dashboard, feedback: &Feedback) -> Vec<Insight> {
    let exp = &dashboard.experience;
    let e = &dashboard.expectations;
    vec![
        Insight {
            title: "Overall satisfaction".into(),
            content: format!(
                "Average experience rating is {} and {}% of respondents gave 4 or 5.",
                fixed(exp.average, 2),
                exp.satisfaction_rate
            ),
        },
        Insight {
            title: "Continuous opening hours".into(),
            content: format!(
                "Average rating for the continuous schedule is {}.",
                fixed(dashboard.schedule.average, 2)
            ),
        },
        Insight {
            title: "Expectations met".into(),
            content: format!(
                "{} respondents had their expectations met, {} partially and {} not.",
                e.yes, e.partial, e.no
            ),
        },
        Insight {
            title: "Suggestions".into(),
            content: format!("{} suggestions or comments were recorded.", feedback.comments),
        },
    ]
}

/// `value` with `digits` decimals, or `"0"` when absent.
#[must_use]
pub fn fixed(value: Option<f64>, digits: usize) -> String {
    value.map_or_else(|| "0".to_string(), |v| format!("{v:.digits$}"))
}
