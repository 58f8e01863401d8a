//! Mock workforce analytics: productivity series, insights, team snapshots.

use std::ops::Range;

use axum::extract::{Path, Query};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Days, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const PRODUCTIVITY: Range<u8> = 75..95;
const ENGAGEMENT: Range<u8> = 70..90;
const SATISFACTION: Range<u8> = 72..92;

/// Number of daily points returned for any timeframe other than `7d`.
const ROLLING_DAYS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductivityPoint {
    pub date: NaiveDate,
    pub productivity: u8,
    pub engagement: u8,
    pub satisfaction: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct Insight {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub impact: &'static str,
    pub timeframe: &'static str,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPerformance {
    pub team_id: String,
    pub productivity: u8,
    pub engagement: u8,
    pub satisfaction: u8,
}

const WEEK: [(u32, u8, u8, u8); 7] = [
    (1, 85, 78, 82),
    (2, 88, 81, 85),
    (3, 82, 75, 79),
    (4, 90, 85, 88),
    (5, 87, 83, 86),
    (6, 92, 88, 91),
    (7, 89, 86, 88),
];

/// Productivity series for `timeframe`.
///
/// `7d` is a fixed week in January 2025. Anything else yields a random
/// daily series ending on `today`.
pub fn productivity(timeframe: &str, today: NaiveDate, rng: &mut impl Rng) -> Vec<ProductivityPoint> {
    if timeframe == "7d" {
        return WEEK
            .iter()
            .filter_map(|&(day, productivity, engagement, satisfaction)| {
                Some(ProductivityPoint {
                    date: NaiveDate::from_ymd_opt(2025, 1, day)?,
                    productivity,
                    engagement,
                    satisfaction,
                })
            })
            .collect();
    }

    (0..ROLLING_DAYS)
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back)))
        .map(|date| ProductivityPoint {
            date,
            productivity: rng.gen_range(PRODUCTIVITY),
            engagement: rng.gen_range(ENGAGEMENT),
            satisfaction: rng.gen_range(SATISFACTION),
        })
        .collect()
}

pub fn insights() -> Vec<Insight> {
    vec![
        Insight {
            id: 1,
            kind: "optimization",
            title: "Meeting Optimization Opportunity",
            description: "Reduce daily meetings by 30 minutes to increase focus time",
            impact: "high",
            timeframe: "1 week",
            confidence: 0.87,
        },
        Insight {
            id: 2,
            kind: "collaboration",
            title: "Cross-team Communication",
            description: "Increase collaboration between Sales and Marketing teams",
            impact: "medium",
            timeframe: "2 weeks",
            confidence: 0.73,
        },
        Insight {
            id: 3,
            kind: "automation",
            title: "Workflow Automation",
            description: "Automate status report generation to save 2 hours weekly",
            impact: "high",
            timeframe: "3 days",
            confidence: 0.92,
        },
    ]
}

pub fn team_performance(team_id: &str, rng: &mut impl Rng) -> TeamPerformance {
    TeamPerformance {
        team_id: team_id.to_string(),
        productivity: rng.gen_range(PRODUCTIVITY),
        engagement: rng.gen_range(ENGAGEMENT),
        satisfaction: rng.gen_range(SATISFACTION),
    }
}

// ── Routes ──────────────────────────────────────────────────────────────

pub fn analytics_routes() -> Router {
    Router::new()
        .route("/api/analytics/productivity", get(get_productivity))
        .route("/api/analytics/insights", get(get_insights))
        .route("/api/analytics/team/{team_id}", get(get_team_performance))
}

#[derive(Deserialize)]
struct ProductivityQuery {
    #[serde(default)]
    timeframe: Option<String>,
}

/// GET /api/analytics/productivity?timeframe=
async fn get_productivity(Query(query): Query<ProductivityQuery>) -> Json<Vec<ProductivityPoint>> {
    let timeframe = query.timeframe.unwrap_or_default();
    let mut rng = StdRng::from_entropy();
    Json(productivity(&timeframe, Utc::now().date_naive(), &mut rng))
}

/// GET /api/analytics/insights
async fn get_insights() -> Json<Vec<Insight>> {
    Json(insights())
}

/// GET /api/analytics/team/{team_id}
async fn get_team_performance(Path(team_id): Path<String>) -> Json<TeamPerformance> {
    let mut rng = StdRng::from_entropy();
    Json(team_performance(&team_id, &mut rng))
}
