//! Data types used by the scoring pipeline.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::ComputationError;
use crate::route::RouteKey;

/// The ten service indicators, in canonical column order I1..I10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Indicator {
    Pavement,
    StopSpacing,
    Integration,
    Punctuality,
    Frequency,
    ItineraryCompliance,
    NetworkCoverage,
    DriverTraining,
    InfoAvailability,
    FareTrend,
}

impl Indicator {
    pub const ALL: [Indicator; 10] = [
        Indicator::Pavement,
        Indicator::StopSpacing,
        Indicator::Integration,
        Indicator::Punctuality,
        Indicator::Frequency,
        Indicator::ItineraryCompliance,
        Indicator::NetworkCoverage,
        Indicator::DriverTraining,
        Indicator::InfoAvailability,
        Indicator::FareTrend,
    ];

    /// Nomenclature code (`I1`..`I10`), also the output column name.
    pub fn code(&self) -> &'static str {
        match self {
            Indicator::Pavement => "I1",
            Indicator::StopSpacing => "I2",
            Indicator::Integration => "I3",
            Indicator::Punctuality => "I4",
            Indicator::Frequency => "I5",
            Indicator::ItineraryCompliance => "I6",
            Indicator::NetworkCoverage => "I7",
            Indicator::DriverTraining => "I8",
            Indicator::InfoAvailability => "I9",
            Indicator::FareTrend => "I10",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Indicator::Pavement => "Porcentagem das vias pavimentadas",
            Indicator::StopSpacing => "Distância entre pontos",
            Indicator::Integration => "Integração municipal do sistema de transporte",
            Indicator::Punctuality => "Pontualidade – cumprir horários",
            Indicator::Frequency => "Frequência de atendimento",
            Indicator::ItineraryCompliance => "Cumprimento dos itinerários",
            Indicator::NetworkCoverage => "Abrangência da rede – atender a cidade",
            Indicator::DriverTraining => "Treinamento e capacitação dos motoristas",
            Indicator::InfoAvailability => "Existência Sistema de informação pela internet",
            Indicator::FareTrend => "Valor da Tarifa",
        }
    }

    /// Priority weight of the indicator in the IQT sum.
    pub fn weight(&self) -> f64 {
        match self {
            Indicator::Punctuality => 0.2269,
            Indicator::Pavement => 0.1526,
            Indicator::StopSpacing => 0.1121,
            Indicator::Integration => 0.0997,
            Indicator::Frequency => 0.0992,
            Indicator::NetworkCoverage => 0.0954,
            Indicator::ItineraryCompliance => 0.0831,
            Indicator::DriverTraining => 0.0756,
            Indicator::InfoAvailability => 0.0277,
            Indicator::FareTrend => 0.0277,
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Raw, unscored metrics for one route key after every source has been joined.
///
/// `None` means the metric was unavailable for this route; it scores 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteMetricRecord {
    pub key: RouteKey,
    pub pavement: Option<f64>,
    pub stop_spacing_m: Option<f64>,
    pub integration: Option<String>,
    pub punctuality: Option<f64>,
    pub interval_minutes: Option<f64>,
    pub itinerary_ratio: Option<f64>,
    pub network_coverage: Option<f64>,
    pub training: Option<f64>,
    pub info_availability: Option<String>,
    pub fare_trend: Option<String>,
}

/// Ordinal scores for one route key, one named field per indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRow {
    pub key: RouteKey,
    pub pavement: u8,
    pub stop_spacing: u8,
    pub integration: u8,
    pub punctuality: u8,
    pub frequency: u8,
    pub itinerary_compliance: u8,
    pub network_coverage: u8,
    pub driver_training: u8,
    pub info_availability: u8,
    pub fare_trend: u8,
}

impl ScoreRow {
    /// A row with the same score for every indicator.
    pub fn uniform(key: RouteKey, score: u8) -> Self {
        Self {
            key,
            pavement: score,
            stop_spacing: score,
            integration: score,
            punctuality: score,
            frequency: score,
            itinerary_compliance: score,
            network_coverage: score,
            driver_training: score,
            info_availability: score,
            fare_trend: score,
        }
    }

    pub fn get(&self, indicator: Indicator) -> u8 {
        match indicator {
            Indicator::Pavement => self.pavement,
            Indicator::StopSpacing => self.stop_spacing,
            Indicator::Integration => self.integration,
            Indicator::Punctuality => self.punctuality,
            Indicator::Frequency => self.frequency,
            Indicator::ItineraryCompliance => self.itinerary_compliance,
            Indicator::NetworkCoverage => self.network_coverage,
            Indicator::DriverTraining => self.driver_training,
            Indicator::InfoAvailability => self.info_availability,
            Indicator::FareTrend => self.fare_trend,
        }
    }

    fn slot(&mut self, indicator: Indicator) -> &mut u8 {
        match indicator {
            Indicator::Pavement => &mut self.pavement,
            Indicator::StopSpacing => &mut self.stop_spacing,
            Indicator::Integration => &mut self.integration,
            Indicator::Punctuality => &mut self.punctuality,
            Indicator::Frequency => &mut self.frequency,
            Indicator::ItineraryCompliance => &mut self.itinerary_compliance,
            Indicator::NetworkCoverage => &mut self.network_coverage,
            Indicator::DriverTraining => &mut self.driver_training,
            Indicator::InfoAvailability => &mut self.info_availability,
            Indicator::FareTrend => &mut self.fare_trend,
        }
    }

    /// Scores paired with their indicator, in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Indicator, u8)> + '_ {
        Indicator::ALL.iter().map(move |i| (*i, self.get(*i)))
    }

    /// Builds a row from a positional vector in canonical I1..I10 order.
    ///
    /// This is the only place where position carries meaning, so it checks
    /// the length and that every value is an integral ordinal in 0..=3.
    pub fn from_values(key: RouteKey, values: &[f64]) -> Result<Self, ComputationError> {
        if values.len() != Indicator::ALL.len() {
            return Err(ComputationError::LengthMismatch {
                expected: Indicator::ALL.len(),
                found: values.len(),
            });
        }

        let mut row = ScoreRow::uniform(key, 0);
        for (indicator, value) in Indicator::ALL.iter().zip(values) {
            let ordinal = value.is_finite() && value.fract() == 0.0 && (0.0..=3.0).contains(value);
            if !ordinal {
                return Err(ComputationError::NotOrdinal {
                    indicator: indicator.code(),
                    value: value.to_string(),
                });
            }
            *row.slot(*indicator) = *value as u8;
        }
        Ok(row)
    }
}

/// Qualitative IQT band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IqtClass {
    Excelente,
    Bom,
    Suficiente,
    Insuficiente,
}

impl IqtClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            IqtClass::Excelente => "Excelente",
            IqtClass::Bom => "Bom",
            IqtClass::Suficiente => "Suficiente",
            IqtClass::Insuficiente => "Insuficiente",
        }
    }

    /// Display colour handed to the map renderer.
    pub fn color(&self) -> IqtColor {
        match self {
            IqtClass::Excelente => IqtColor::Green,
            IqtClass::Bom => IqtColor::Blue,
            IqtClass::Suficiente => IqtColor::Red,
            IqtClass::Insuficiente => IqtColor::Pink,
        }
    }
}

impl fmt::Display for IqtClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The renderer's palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IqtColor {
    Green,
    Blue,
    Red,
    Pink,
}

impl IqtColor {
    pub fn hex(&self) -> &'static str {
        match self {
            IqtColor::Green => "#2ca02c",
            IqtColor::Blue => "#1f77b4",
            IqtColor::Red => "#d62728",
            IqtColor::Pink => "#e377c2",
        }
    }
}

impl Serialize for IqtColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.hex())
    }
}

/// A scored route.
#[derive(Debug, Clone, PartialEq)]
pub struct IqtResult {
    pub scores: ScoreRow,
    pub iqt: f64,
    pub class: IqtClass,
    pub color: IqtColor,
}

impl IqtResult {
    pub fn key(&self) -> &RouteKey {
        &self.scores.key
    }
}

/// A route whose IQT could not be computed. Kept out of the mapped output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteFailure {
    #[serde(rename = "linha")]
    pub route: String,
    #[serde(rename = "sentido")]
    pub direction: String,
    pub reason: String,
}

impl RouteFailure {
    pub fn new(key: &RouteKey, reason: impl fmt::Display) -> Self {
        Self {
            route: key.route.clone(),
            direction: key.direction_label().to_string(),
            reason: reason.to_string(),
        }
    }
}
