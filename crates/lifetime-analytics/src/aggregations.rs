//! Per-period lifetime aggregation.
//!
//! Folds observations into one bucket per period (a calendar day by default),
//! each holding the period's total samples plus samples split by group, then
//! turns the buckets into summary rows.

use chrono::NaiveDate;
use lifetime_core::{Granularity, Observation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::stats::Stats;

/// Group name of the all-groups row emitted for every period.
pub const TOTAL_GROUP: &str = "total";

/// One row of the dashboard payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRow {
    /// First day of the period (the day itself for daily granularity).
    pub day: NaiveDate,
    pub group: String,
    pub median_lifetime: f64,
    pub mean_lifetime: f64,
    /// Only computed for group rows.
    #[serde(skip)]
    pub mode_lifetime: Option<f64>,
    #[serde(skip)]
    pub samples: usize,
}

impl SummaryRow {
    pub fn is_total(&self) -> bool {
        self.group == TOTAL_GROUP
    }
}

/// All lifetime samples that landed in one period.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBucket {
    pub day: NaiveDate,
    /// Every sample of the period, across groups.
    pub total: Vec<f64>,
    /// Samples keyed by group, in lexicographic group order.
    pub groups: BTreeMap<String, Vec<f64>>,
}

impl DayBucket {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day,
            total: Vec::new(),
            groups: BTreeMap::new(),
        }
    }

    /// Record one sample under both the total and its group.
    pub fn push(&mut self, group: &str, lifetime_hours: f64) {
        self.total.push(lifetime_hours);
        match self.groups.get_mut(group) {
            Some(samples) => samples.push(lifetime_hours),
            None => {
                self.groups.insert(group.to_string(), vec![lifetime_hours]);
            }
        }
    }

    /// Total row first, then one row per group.
    pub fn rows(&self) -> Vec<SummaryRow> {
        let mut rows = Vec::with_capacity(self.groups.len() + 1);

        if let Some(stats) = Stats::from_samples(&self.total) {
            rows.push(SummaryRow {
                day: self.day,
                group: TOTAL_GROUP.to_string(),
                median_lifetime: stats.median,
                mean_lifetime: stats.mean,
                mode_lifetime: None,
                samples: stats.count,
            });
        }

        for (group, samples) in &self.groups {
            if let Some(stats) = Stats::from_samples(samples) {
                rows.push(SummaryRow {
                    day: self.day,
                    group: group.clone(),
                    median_lifetime: stats.median,
                    mean_lifetime: stats.mean,
                    mode_lifetime: Some(stats.mode),
                    samples: stats.count,
                });
            }
        }

        rows
    }
}

/// Accumulates observations into period buckets.
pub struct Aggregator {
    granularity: Granularity,
    buckets: BTreeMap<NaiveDate, DayBucket>,
}

impl Aggregator {
    pub fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            buckets: BTreeMap::new(),
        }
    }

    /// Fold a single observation into its period bucket.
    pub fn add(&mut self, observation: &Observation) {
        let day = self.granularity.period_start(observation.day);
        self.buckets
            .entry(day)
            .or_insert_with(|| DayBucket::new(day))
            .push(&observation.group, observation.lifetime_hours);
    }

    /// Fold many observations.
    pub fn extend<'a>(&mut self, observations: impl IntoIterator<Item = &'a Observation>) {
        for observation in observations {
            self.add(observation);
        }
    }

    /// Buckets in ascending period order.
    pub fn buckets(&self) -> impl Iterator<Item = &DayBucket> {
        self.buckets.values()
    }

    /// Number of populated periods.
    pub fn active_days(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of samples folded in.
    pub fn total_samples(&self) -> usize {
        self.buckets.values().map(|b| b.total.len()).sum()
    }

    /// Summary rows ordered by period, total row first within a period,
    /// then groups lexicographically.
    pub fn summarize(&self) -> Vec<SummaryRow> {
        self.buckets.values().flat_map(DayBucket::rows).collect()
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(Granularity::Day)
    }
}

/// Aggregate a complete observation set in one call.
pub fn aggregate<'a>(
    observations: impl IntoIterator<Item = &'a Observation>,
    granularity: Granularity,
) -> Vec<SummaryRow> {
    let mut aggregator = Aggregator::new(granularity);
    aggregator.extend(observations);
    aggregator.summarize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn obs(date: NaiveDate, group: &str, hours: f64) -> Observation {
        Observation::new(date, group, hours)
    }

    fn sample_observations() -> Vec<Observation> {
        vec![
            obs(day(2021, 3, 2), "teamB", 10.0),
            obs(day(2021, 3, 1), "teamA", 2.0),
            obs(day(2021, 3, 2), "platform/infra", 1.0),
            obs(day(2021, 3, 1), "teamB", 6.0),
            obs(day(2021, 3, 1), "teamA", 4.0),
            obs(day(2021, 3, 2), "teamB", 3.0),
        ]
    }

    #[test]
    fn test_empty_observations() {
        let observations: Vec<Observation> = Vec::new();
        let rows = aggregate(&observations, Granularity::Day);
        assert!(rows.is_empty());
        assert_eq!(Aggregator::default().active_days(), 0);
    }

    #[test]
    fn test_single_day_scenario() {
        let observations = vec![
            obs(day(2021, 3, 1), "teamA", 2.0),
            obs(day(2021, 3, 1), "teamA", 4.0),
            obs(day(2021, 3, 1), "teamB", 6.0),
        ];

        let rows = aggregate(&observations, Granularity::Day);
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].group, TOTAL_GROUP);
        assert_eq!(rows[0].median_lifetime, 4.0);
        assert_eq!(rows[0].mean_lifetime, 4.0);
        assert!(rows[0].mode_lifetime.is_none());

        assert_eq!(rows[1].group, "teamA");
        assert_eq!(rows[1].median_lifetime, 3.0);
        assert_eq!(rows[1].mean_lifetime, 3.0);
        assert_eq!(rows[1].mode_lifetime, Some(2.0));

        assert_eq!(rows[2].group, "teamB");
        assert_eq!(rows[2].median_lifetime, 6.0);
        assert_eq!(rows[2].mean_lifetime, 6.0);
        assert_eq!(rows[2].mode_lifetime, Some(6.0));

        assert!(rows.iter().all(|r| r.day == day(2021, 3, 1)));
    }

    #[test]
    fn test_row_ordering() {
        let rows = aggregate(&sample_observations(), Granularity::Day);
        let keys: Vec<(NaiveDate, &str)> =
            rows.iter().map(|r| (r.day, r.group.as_str())).collect();

        assert_eq!(
            keys,
            vec![
                (day(2021, 3, 1), "total"),
                (day(2021, 3, 1), "teamA"),
                (day(2021, 3, 1), "teamB"),
                (day(2021, 3, 2), "total"),
                (day(2021, 3, 2), "platform/infra"),
                (day(2021, 3, 2), "teamB"),
            ]
        );
    }

    #[test]
    fn test_total_matches_group_sums() {
        let mut aggregator = Aggregator::default();
        aggregator.extend(&sample_observations());

        for bucket in aggregator.buckets() {
            let group_len: usize = bucket.groups.values().map(Vec::len).sum();
            let group_sum: f64 = bucket.groups.values().flatten().sum();
            let total_sum: f64 = bucket.total.iter().sum();
            assert_eq!(bucket.total.len(), group_len);
            assert!((total_sum - group_sum).abs() < 1e-9);
        }
        assert_eq!(aggregator.total_samples(), 6);
        assert_eq!(aggregator.active_days(), 2);
    }

    #[test]
    fn test_aggregate_is_repeatable() {
        let observations = sample_observations();
        let first = aggregate(&observations, Granularity::Day);
        let second = aggregate(&observations, Granularity::Day);
        assert_eq!(first, second);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let observations = sample_observations();
        let mut reversed = observations.clone();
        reversed.reverse();
        assert_eq!(
            aggregate(&observations, Granularity::Day),
            aggregate(&reversed, Granularity::Day)
        );
    }

    #[test]
    fn test_single_sample_group() {
        let rows = aggregate(&[obs(day(2021, 5, 5), "solo", 9.5)], Granularity::Day);
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.median_lifetime, 9.5);
            assert_eq!(row.mean_lifetime, 9.5);
            assert_eq!(row.samples, 1);
        }
        assert_eq!(rows[1].mode_lifetime, Some(9.5));
    }

    #[test]
    fn test_weekly_granularity() {
        // Monday 2021-03-01 through Sunday 2021-03-07 share a bucket.
        let observations = vec![
            obs(day(2021, 3, 1), "teamA", 1.0),
            obs(day(2021, 3, 7), "teamA", 3.0),
            obs(day(2021, 3, 8), "teamA", 5.0),
        ];

        let rows = aggregate(&observations, Granularity::Week);
        let totals: Vec<&SummaryRow> = rows.iter().filter(|r| r.is_total()).collect();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].day, day(2021, 3, 1));
        assert_eq!(totals[0].samples, 2);
        assert_eq!(totals[0].median_lifetime, 2.0);
        assert_eq!(totals[1].day, day(2021, 3, 8));
    }

    #[test]
    fn test_monthly_granularity() {
        let observations = vec![
            obs(day(2021, 3, 1), "teamA", 1.0),
            obs(day(2021, 3, 31), "teamB", 3.0),
        ];
        let mut aggregator = Aggregator::new(Granularity::Month);
        aggregator.extend(&observations);

        assert_eq!(aggregator.active_days(), 1);
        let bucket = aggregator.buckets().next().unwrap();
        assert_eq!(bucket.day, day(2021, 3, 1));
        assert_eq!(bucket.total.len(), 2);
        assert_eq!(bucket.groups.len(), 2);
    }

    #[test]
    fn test_payload_field_names() {
        let rows = aggregate(&[obs(day(2021, 3, 1), "teamA", 2.0)], Granularity::Day);
        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["day"], "2021-03-01");
        assert_eq!(json["group"], "total");
        assert_eq!(json["medianLifetime"], 2.0);
        assert_eq!(json["meanLifetime"], 2.0);
        assert!(json.get("modeLifetime").is_none());
        assert!(json.get("samples").is_none());
    }
}
