//! Descriptive statistics of the ticketing trip log: per route, per day and
//! per month.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::derive::frequency::{parse_date, trip_minutes};
use crate::derive::{RowIssue, parse_optional_number};
use crate::indicators::utility::MeanAccumulator;
use crate::input::{IntegrationRow, TripLogRow};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub linha: String,
    pub viagens: usize,
    #[serde(skip)]
    pub passageiros_total: f64,
    pub media_passageiros: Option<f64>,
    pub valor_arrecadado: f64,
    pub duracao_media_min: Option<f64>,
    /// Whether the route originates a fare integration; empty when no
    /// integration table was given.
    pub integrada: Option<bool>,
}

/// Passengers and revenue of one route on one service day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotals {
    pub data: NaiveDate,
    pub linha: String,
    pub passageiros: f64,
    pub valor_arrecadado: f64,
}

/// Mean trip duration of one route over one calendar month (`YYYY-MM`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyDuration {
    pub mes: String,
    pub linha: String,
    pub duracao_media_min: f64,
}

#[derive(Debug, Clone, Default)]
pub struct OperationSummary {
    /// One entry per route, highest demand first.
    pub routes: Vec<RouteSummary>,
    /// Ordered by date, then route.
    pub daily: Vec<DailyTotals>,
    /// Ordered by month, then route.
    pub monthly: Vec<MonthlyDuration>,
    pub issues: Vec<RowIssue>,
}

impl OperationSummary {
    /// Reorders the routes by revenue collected, highest first. Ties keep
    /// the demand order.
    pub fn rank_by_revenue(&mut self) {
        self.routes
            .sort_by(|a, b| b.valor_arrecadado.total_cmp(&a.valor_arrecadado));
    }

    /// Flags each route as integrated or not.
    pub fn mark_integrated(&mut self, integrated: &BTreeSet<String>) {
        for route in &mut self.routes {
            route.integrada = Some(integrated.contains(&route.linha));
        }
    }
}

#[derive(Debug, Default)]
struct Totals {
    trips: usize,
    passengers: MeanAccumulator,
    revenue: f64,
    duration: MeanAccumulator,
}

#[derive(Debug, Default)]
struct DayTotals {
    passengers: f64,
    revenue: f64,
}

/// Summarises the trip log. Routes are ordered by total passengers (highest
/// demand first; ties by route id).
///
/// Days come from `datai`, so a trip crossing midnight counts for the day
/// it started.
pub fn summarize(rows: &[TripLogRow]) -> OperationSummary {
    let mut totals: BTreeMap<String, Totals> = BTreeMap::new();
    let mut days: BTreeMap<(NaiveDate, String), DayTotals> = BTreeMap::new();
    let mut months: BTreeMap<(String, String), MeanAccumulator> = BTreeMap::new();
    let mut issues = Vec::new();

    for (idx, row) in rows.iter().enumerate() {
        let route = row.linha.trim();
        if route.is_empty() {
            issues.push(RowIssue::new(TripLogRow::SOURCE, idx, "empty route id"));
            continue;
        }
        let mut number = |raw: Option<&str>| match parse_optional_number(raw) {
            Ok(value) => value,
            Err(e) => {
                issues.push(RowIssue::new(TripLogRow::SOURCE, idx, e));
                None
            }
        };
        let passengers = number(row.qtpsg.as_deref());
        let revenue = number(row.valor_jornada.as_deref());

        let entry = totals.entry(route.to_string()).or_default();
        entry.trips += 1;
        if let Some(p) = passengers {
            entry.passengers.push(p);
        }
        entry.revenue += revenue.unwrap_or(0.0);

        // An unreadable start date is reported by trip_minutes below.
        let date = parse_date(&row.datai).ok();
        if let Some(date) = date {
            let day = days.entry((date, route.to_string())).or_default();
            day.passengers += passengers.unwrap_or(0.0);
            day.revenue += revenue.unwrap_or(0.0);
        }

        match trip_minutes(row) {
            Ok(minutes) => {
                entry.duration.push(minutes as f64);
                if let Some(date) = date {
                    months
                        .entry((date.format("%Y-%m").to_string(), route.to_string()))
                        .or_default()
                        .push(minutes as f64);
                }
            }
            Err(e) => issues.push(RowIssue::new(TripLogRow::SOURCE, idx, e)),
        }
    }

    let mut routes: Vec<RouteSummary> = totals
        .into_iter()
        .map(|(linha, t)| RouteSummary {
            linha,
            viagens: t.trips,
            passageiros_total: t.passengers.sum,
            media_passageiros: t.passengers.mean(),
            valor_arrecadado: t.revenue,
            duracao_media_min: t.duration.mean(),
            integrada: None,
        })
        .collect();
    routes.sort_by(|a, b| b.passageiros_total.total_cmp(&a.passageiros_total));

    let daily = days
        .into_iter()
        .map(|((data, linha), d)| DailyTotals {
            data,
            linha,
            passageiros: d.passengers,
            valor_arrecadado: d.revenue,
        })
        .collect();

    let monthly = months
        .into_iter()
        .filter_map(|((mes, linha), acc)| {
            acc.mean().map(|duracao_media_min| MonthlyDuration {
                mes,
                linha,
                duracao_media_min,
            })
        })
        .collect();

    OperationSummary {
        routes,
        daily,
        monthly,
        issues,
    }
}

/// Distinct routes that originate a fare integration.
pub fn integrated_routes(rows: &[IntegrationRow]) -> BTreeSet<String> {
    rows.iter()
        .map(|r| r.linha_origem.trim())
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}
