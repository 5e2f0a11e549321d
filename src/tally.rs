//! Tallying of the vote log into per-category summaries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ballot::{Category, Rank};

/// A vote row as read back from the store. Category and rank are kept as
/// the stored text; rows the tally does not understand are skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteRecord {
    pub submitted_at: DateTime<Utc>,
    pub voter: String,
    pub category: String,
    pub rank: String,
    pub nominee: String,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallyEntry {
    pub name: String,
    pub points: f64,
    pub first: u32,
    pub second: u32,
    pub third: u32,
}

impl TallyEntry {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            points: 0.0,
            first: 0,
            second: 0,
            third: 0,
        }
    }

    fn record(&mut self, rank: Option<Rank>, points: f64) {
        self.points += points;
        match rank {
            Some(Rank::First) => self.first += 1,
            Some(Rank::Second) => self.second += 1,
            Some(Rank::Third) => self.third += 1,
            None => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NomineeTotal {
    pub name: String,
    pub points: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub totals: Vec<NomineeTotal>,
    pub table: Vec<TallyEntry>,
}

impl CategorySummary {
    fn from_entries(mut table: Vec<TallyEntry>) -> Self {
        table.sort_by(|a, b| {
            b.points
                .total_cmp(&a.points)
                .then_with(|| a.name.cmp(&b.name))
        });
        let totals = table
            .iter()
            .map(|entry| NomineeTotal {
                name: entry.name.clone(),
                points: entry.points,
            })
            .collect();
        Self { totals, table }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VotesSummary {
    pub favor: CategorySummary,
    pub contra: CategorySummary,
}

impl VotesSummary {
    pub fn category(&self, category: Category) -> &CategorySummary {
        match category {
            Category::Favor => &self.favor,
            Category::Contra => &self.contra,
        }
    }
}

/// Sums points and rank counts per nominee for each category.
///
/// Rows with an unknown category or a blank nominee are dropped. Rows with
/// an unknown rank still add their points but no rank count. Entries are
/// ordered by points, highest first, with ties broken by name so the result
/// does not depend on the order the store returned the rows in.
pub fn summarize(records: &[VoteRecord]) -> VotesSummary {
    let mut favor: BTreeMap<&str, TallyEntry> = BTreeMap::new();
    let mut contra: BTreeMap<&str, TallyEntry> = BTreeMap::new();

    for record in records {
        let Some(category) = Category::parse(&record.category) else {
            continue;
        };
        let nominee = record.nominee.trim();
        if nominee.is_empty() {
            continue;
        }

        let bucket = match category {
            Category::Favor => &mut favor,
            Category::Contra => &mut contra,
        };
        let points = if record.points.is_finite() {
            record.points
        } else {
            0.0
        };
        bucket
            .entry(nominee)
            .or_insert_with(|| TallyEntry::new(nominee))
            .record(Rank::parse(&record.rank), points);
    }

    VotesSummary {
        favor: CategorySummary::from_entries(favor.into_values().collect()),
        contra: CategorySummary::from_entries(contra.into_values().collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(category: &str, rank: &str, nominee: &str, points: f64) -> VoteRecord {
        VoteRecord {
            submitted_at: Utc::now(),
            voter: "Ana".to_string(),
            category: category.to_string(),
            rank: rank.to_string(),
            nominee: nominee.to_string(),
            points,
        }
    }

    #[test]
    fn empty_log_yields_empty_summaries() {
        let summary = summarize(&[]);
        assert_eq!(summary, VotesSummary::default());

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "favor": {"totals": [], "table": []},
                "contra": {"totals": [], "table": []}
            })
        );
    }

    #[test]
    fn points_and_rank_counts_accumulate_per_nominee() {
        let records = vec![
            record("favor", "first", "Luis", 2.0),
            record("favor", "second", "Luis", 1.5),
            record("favor", "second", "Marta", 1.5),
            record("contra", "third", "Luis", 1.0),
        ];
        let summary = summarize(&records);

        let luis = &summary.favor.table[0];
        assert_eq!(luis.name, "Luis");
        assert_eq!(luis.points, 3.5);
        assert_eq!((luis.first, luis.second, luis.third), (1, 1, 0));

        let marta = &summary.favor.table[1];
        assert_eq!(marta.points, 1.5);
        assert_eq!(marta.second, 1);

        assert_eq!(summary.contra.table.len(), 1);
        assert_eq!(summary.contra.table[0].third, 1);
    }

    #[test]
    fn entries_sort_by_points_descending() {
        let records = vec![
            record("favor", "first", "Bea", 5.0),
            record("favor", "first", "Carla", 1.0),
            record("favor", "first", "Alba", 5.0),
        ];
        let totals = summarize(&records).favor.totals;
        let names: Vec<_> = totals.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Alba", "Bea", "Carla"]);
        assert_eq!(totals[2].points, 1.0);
    }

    #[test]
    fn unknown_category_is_dropped_and_unknown_rank_only_adds_points() {
        let records = vec![
            record("neutral", "first", "Luis", 2.0),
            record("FAVOR", "fourth", "Luis", 0.5),
            record("favor", " First ", "Luis", 2.0),
            record("favor", "first", "  ", 2.0),
        ];
        let summary = summarize(&records);

        assert!(summary.contra.table.is_empty());
        assert_eq!(summary.favor.table.len(), 1);
        let luis = &summary.favor.table[0];
        assert_eq!(luis.points, 2.5);
        assert_eq!((luis.first, luis.second, luis.third), (1, 0, 0));
    }

    #[test]
    fn non_finite_points_count_as_zero() {
        let records = vec![
            record("contra", "first", "Irene", f64::NAN),
            record("contra", "second", "Irene", 1.5),
        ];
        let irene = &summarize(&records).contra.table[0];
        assert_eq!(irene.points, 1.5);
        assert_eq!(irene.first, 1);
    }

    #[test]
    fn summary_is_independent_of_record_order() {
        let mut records = vec![
            record("favor", "first", "Luis", 2.0),
            record("favor", "first", "Marta", 2.0),
            record("favor", "third", "Sara", 1.0),
            record("contra", "second", "Pablo", 1.5),
        ];
        let forward = summarize(&records);
        assert_eq!(forward, summarize(&records));

        records.reverse();
        assert_eq!(forward, summarize(&records));
    }

    #[test]
    fn totals_mirror_table_order() {
        let records = vec![
            record("favor", "third", "Sara", 1.0),
            record("favor", "first", "Luis", 2.0),
        ];
        let summary = summarize(&records);
        let favor = summary.category(Category::Favor);
        assert_eq!(favor.totals.len(), favor.table.len());
        for (total, entry) in favor.totals.iter().zip(&favor.table) {
            assert_eq!(total.name, entry.name);
            assert_eq!(total.points, entry.points);
        }
    }
}
