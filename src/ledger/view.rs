//! Externally facing territory view.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::projection::project;
use crate::config::ScoringConfig;
use crate::territory::{Category, Team, Territory, TerritoryId};

/// A territory as handed to the presentation layer. Point fields are
/// projected to the moment the view was built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerritoryView {
    pub id: TerritoryId,
    pub name: String,
    pub category: Category,
    pub lat: f64,
    pub lng: f64,
    pub controlling_team: Option<Team>,
    pub available_points: u64,
    pub points_by_team: BTreeMap<Team, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_visit_bonus_date: Option<DateTime<Utc>>,
}

impl TerritoryView {
    pub fn project(
        snapshot: &Territory,
        now: DateTime<Utc>,
        config: &ScoringConfig,
        next_visit_bonus_date: Option<DateTime<Utc>>,
    ) -> Self {
        let projection = project(snapshot, now, config);
        TerritoryView {
            id: snapshot.id.clone(),
            name: snapshot.name.clone(),
            category: snapshot.category,
            lat: snapshot.coordinates.lat,
            lng: snapshot.coordinates.lng,
            controlling_team: snapshot.controlling_team.clone(),
            available_points: projection.available,
            points_by_team: projection.points,
            next_visit_bonus_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::territory::Coordinates;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    #[test]
    fn serializes_camel_case_with_projected_values() {
        let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let mut snapshot = Territory::new(
            TerritoryId::new("abc"),
            "Loeb",
            Category::Retail,
            Coordinates::new(46.948, 7.439).unwrap(),
            240,
            t0,
        );
        snapshot
            .points_by_team
            .insert(Team::new("red").unwrap(), 1000);
        snapshot.controlling_team = Some(Team::new("red").unwrap());

        let config = ScoringConfig::default();
        let view = TerritoryView::project(&snapshot, t0 + Duration::days(1), &config, None);
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "abc",
                "name": "Loeb",
                "category": "retail",
                "lat": 46.948,
                "lng": 7.439,
                "controllingTeam": "red",
                "availablePoints": 480,
                "pointsByTeam": {"blue": 0, "green": 0, "red": 900},
            })
        );
    }

    #[test]
    fn includes_next_visit_bonus_date_when_known() {
        let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let snapshot = Territory::new(
            TerritoryId::new("abc"),
            "Loeb",
            Category::Retail,
            Coordinates::new(46.948, 7.439).unwrap(),
            240,
            t0,
        );
        let view = TerritoryView::project(&snapshot, t0, &ScoringConfig::default(), Some(t0));
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["nextVisitBonusDate"], json!("2024-06-01T08:00:00Z"));
        assert_eq!(value["controllingTeam"], json!(null));
    }
}
