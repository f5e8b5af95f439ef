//! Dashboard aggregates over the full record set.
//!
//! Every reading is lenient: cells that do not yield a number or a date
//! are left out of the aggregate rather than reported.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::Config;
use crate::types::Record;
use crate::values::{extract_date, first_number};

/// Tallest chart bar, in pixels.
pub const BAR_MAX_HEIGHT: f64 = 180.0;

const AGE_BUCKETS: [&str; 6] = ["-19", "20-29", "30-39", "40-49", "50-59", "60+"];

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub total: usize,
    pub experience: RatingSummary,
    pub schedule: RatingSummary,
    pub period: Option<Period>,
    pub age: Option<AgeSummary>,
    pub expectations: Expectations,
}

/// A 1-to-5 rating question.
#[derive(Debug, Clone, Serialize)]
pub struct RatingSummary {
    /// Responses with a rating in 1..=5.
    pub count: usize,
    pub average: Option<f64>,
    /// Ratings of 4 or 5.
    pub satisfied: usize,
    /// Rounded percentage of `satisfied`, 0 when there are no ratings.
    pub satisfaction_rate: u32,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Bar {
    pub score: u32,
    pub count: usize,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Period {
    pub first: NaiveDate,
    pub last: NaiveDate,
    /// Responses whose timestamp carried a date.
    pub dated: usize,
    pub distinct_days: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgeSummary {
    pub count: usize,
    pub min: u32,
    pub max: u32,
    pub average: f64,
    /// Non-empty buckets in age order.
    pub buckets: Vec<(String, usize)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Expectations {
    pub yes: usize,
    pub partial: usize,
    pub no: usize,
}

impl Expectations {
    /// Chart widths in percent for yes/partial/no. All zero when nobody
    /// answered.
    #[must_use]
    pub fn widths(&self) -> [f64; 3] {
        let total = self.yes + self.partial + self.no;
        if total == 0 {
            return [0.0; 3];
        }
        let pct = |n: usize| 100.0 * n as f64 / total as f64;
        [pct(self.yes), pct(self.partial), pct(self.no)]
    }
}

/// Compute every dashboard aggregate in one pass per question.
#[must_use]
pub fn summarize(records: &[Record], config: &Config) -> Dashboard {
    let fields = &config.fields;
    Dashboard {
        total: records.len(),
        experience: rating_summary(&ratings(records, &fields.rating)),
        schedule: rating_summary(&ratings(records, &fields.schedule)),
        period: period(records, &fields.timestamp),
        age: age_summary(records, &fields.age),
        expectations: expectations(records, config),
    }
}

/// Ratings in 1..=5 read with [`first_number`].
#[must_use]
pub fn ratings(records: &[Record], key: &str) -> Vec<u32> {
    records
        .iter()
        .filter_map(|r| first_number(r.get_lenient(key)))
        .filter(|n| (1..=5).contains(n))
        .collect()
}

#[must_use]
pub fn rating_summary(values: &[u32]) -> RatingSummary {
    let count = values.len();
    let satisfied = values.iter().filter(|&&n| n >= 4).count();
    let (average, satisfaction_rate) = if count == 0 {
        (None, 0)
    } else {
        let sum: u32 = values.iter().sum();
        (
            Some(f64::from(sum) / count as f64),
            (100.0 * satisfied as f64 / count as f64).round() as u32,
        )
    };
    RatingSummary {
        count,
        average,
        satisfied,
        satisfaction_rate,
        bars: bar_chart(values),
    }
}

/// Per-score counts for 1..=5, heights scaled to the tallest bar.
#[must_use]
pub fn bar_chart(values: &[u32]) -> Vec<Bar> {
    let counts: Vec<usize> = (1..=5u32)
        .map(|s| values.iter().filter(|&&v| v == s).count())
        .collect();
    let max = counts.iter().copied().max().unwrap_or(0).max(1);
    counts
        .into_iter()
        .zip(1u32..)
        .map(|(count, score)| Bar {
            score,
            count,
            height: BAR_MAX_HEIGHT * count as f64 / max as f64,
        })
        .collect()
}

fn period(records: &[Record], key: &str) -> Option<Period> {
    let dates: Vec<NaiveDate> = records
        .iter()
        .filter_map(|r| extract_date(r.get_lenient(key)))
        .collect();
    let first = dates.iter().min()?;
    let last = dates.iter().max()?;
    let distinct: BTreeSet<&NaiveDate> = dates.iter().collect();
    Some(Period {
        first: *first,
        last: *last,
        dated: dates.len(),
        distinct_days: distinct.len(),
    })
}

fn age_summary(records: &[Record], key: &str) -> Option<AgeSummary> {
    let ages: Vec<u32> = records
        .iter()
        .filter_map(|r| first_number(r.get_lenient(key)))
        .collect();
    let min = *ages.iter().min()?;
    let max = *ages.iter().max()?;
    let sum: u32 = ages.iter().sum();

    let mut counts = [0usize; AGE_BUCKETS.len()];
    for &age in &ages {
        counts[age_bucket(age)] += 1;
    }
    let buckets = AGE_BUCKETS
        .iter()
        .zip(counts)
        .filter(|(_, n)| *n > 0)
        .map(|(label, n)| ((*label).to_string(), n))
        .collect();

    Some(AgeSummary {
        count: ages.len(),
        min,
        max,
        average: f64::from(sum) / ages.len() as f64,
        buckets,
    })
}

fn age_bucket(age: u32) -> usize {
    match age {
        0..20 => 0,
        20..30 => 1,
        30..40 => 2,
        40..50 => 3,
        50..60 => 4,
        _ => 5,
    }
}

fn expectations(records: &[Record], config: &Config) -> Expectations {
    let words = &config.expectations;
    let answers: Vec<String> = records
        .iter()
        .map(|r| r.get_lenient(&config.fields.expectations).to_lowercase())
        .collect();
    Expectations {
        yes: answers.iter().filter(|a| **a == words.yes).count(),
        partial: answers.iter().filter(|a| a.contains(&words.partial)).count(),
        no: answers.iter().filter(|a| **a == words.no).count(),
    }
}
