use std::cmp::Ordering;

use super::model::{Observation, Panel, ScoreColumn};

// ---------------------------------------------------------------------------
// Subsets of the panel
// ---------------------------------------------------------------------------

/// All observations for one year, in file order.
pub fn year_subset(panel: &Panel, year: i32) -> Vec<&Observation> {
    panel.observations.iter().filter(|o| o.year == year).collect()
}

/// All observations for one province, ordered by year ascending.
/// Rows sharing a year keep their file order.
pub fn province_subset<'a>(panel: &'a Panel, province: &str) -> Vec<&'a Observation> {
    let mut rows: Vec<&Observation> = panel
        .observations
        .iter()
        .filter(|o| o.province == province)
        .collect();
    rows.sort_by_key(|o| o.year);
    rows
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// One line of the ranking table.
#[derive(Debug, Clone, PartialEq)]
pub struct RankEntry {
    pub province: String,
    pub score: f64,
}

/// Order two scores high-to-low with NaN last.
fn descending_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

/// The `n` best rows of a subset by `score`, highest first.
///
/// Equal scores are ordered by province name, then by input order.
pub fn top_ranked(subset: &[&Observation], score: ScoreColumn, n: usize) -> Vec<RankEntry> {
    let mut ranked: Vec<&Observation> = subset.to_vec();
    ranked.sort_by(|a, b| {
        descending_nan_last(score.value(a), score.value(b))
            .then_with(|| a.province.cmp(&b.province))
    });
    ranked
        .into_iter()
        .take(n)
        .map(|o| RankEntry {
            province: o.province.clone(),
            score: score.value(o),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::{obs, panel};

    fn sample() -> Panel {
        panel(vec![
            obs("Beijing", 2021, 11.0, 5.5, 0.82, 0.71),
            obs("Beijing", 2020, 10.0, 5.0, 0.8, 0.7),
            obs("Shanghai", 2020, 20.0, 8.0, 0.6, 0.9),
            obs("Hebei", 2020, 15.0, 12.0, 0.4, 0.3),
            obs("Shanghai", 2021, 21.0, 8.5, 0.65, 0.92),
            obs("Hebei", 2019, 14.0, 11.0, 0.35, 0.28),
        ])
    }

    #[test]
    fn year_filters_partition_the_panel() {
        let p = sample();
        let mut total = 0;
        for &year in &p.years {
            let rows = year_subset(&p, year);
            assert!(rows.iter().all(|o| o.year == year));
            total += rows.len();
        }
        assert_eq!(total, p.len());
    }

    #[test]
    fn absent_year_yields_empty_subset() {
        assert!(year_subset(&sample(), 1999).is_empty());
    }

    #[test]
    fn province_subset_is_exact_and_year_sorted() {
        let p = sample();
        for province in &p.provinces {
            let rows = province_subset(&p, province);
            let expected = p.observations.iter().filter(|o| &o.province == province).count();
            assert_eq!(rows.len(), expected);
            assert!(rows.iter().all(|o| &o.province == province));
            assert!(rows.windows(2).all(|w| w[0].year <= w[1].year));
        }
        let years: Vec<i32> = province_subset(&p, "Beijing").iter().map(|o| o.year).collect();
        assert_eq!(years, vec![2020, 2021]);
    }

    #[test]
    fn ranking_matches_reference_scenario() {
        let p = panel(vec![
            obs("Beijing", 2020, 10.0, 5.0, 0.8, 0.7),
            obs("Shanghai", 2020, 20.0, 8.0, 0.6, 0.9),
        ]);
        let rows = year_subset(&p, 2020);
        let ranking = top_ranked(&rows, ScoreColumn::Bann, 5);
        assert_eq!(
            ranking,
            vec![
                RankEntry { province: "Shanghai".into(), score: 0.9 },
                RankEntry { province: "Beijing".into(), score: 0.7 },
            ]
        );
    }

    #[test]
    fn ranking_is_truncated_and_descending() {
        let rows: Vec<Observation> = (0..8)
            .map(|i| obs(&format!("P{i}"), 2020, 1.0, 1.0, (i * 7 % 8) as f64 / 10.0, 0.0))
            .collect();
        let refs: Vec<&Observation> = rows.iter().collect();
        let ranking = top_ranked(&refs, ScoreColumn::Dea, 5);
        assert_eq!(ranking.len(), 5);
        assert!(ranking.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(ranking[0].score, 0.7);
    }

    #[test]
    fn ties_break_by_province_and_nan_sinks() {
        let rows = vec![
            obs("Zhejiang", 2020, 1.0, 1.0, 0.5, 0.0),
            obs("Anhui", 2020, 1.0, 1.0, f64::NAN, 0.0),
            obs("Fujian", 2020, 1.0, 1.0, 0.5, 0.0),
        ];
        let refs: Vec<&Observation> = rows.iter().collect();
        let names: Vec<String> = top_ranked(&refs, ScoreColumn::Dea, 5)
            .into_iter()
            .map(|e| e.province)
            .collect();
        assert_eq!(names, vec!["Fujian", "Zhejiang", "Anhui"]);
    }
}
