//! Closed tier enumerations for the three qualitative indicators.
//!
//! Upstream tiers arrive as free text. Each indicator has a fixed
//! vocabulary of four phrases matched exactly (case-sensitive, surrounding
//! whitespace ignored); anything else is `Unrecognized` and scores 0.

use tracing::trace;

/// Four-level ordinal tier shared by the qualitative indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Tier3,
    Tier2,
    Tier1,
    Tier0,
    Unrecognized,
}

impl Tier {
    pub fn score(&self) -> u8 {
        match self {
            Tier::Tier3 => 3,
            Tier::Tier2 => 2,
            Tier::Tier1 => 1,
            Tier::Tier0 | Tier::Unrecognized => 0,
        }
    }

    fn lookup(vocabulary: &[(&str, Tier); 4], indicator: &'static str, raw: &str) -> Tier {
        let text = raw.trim();
        match vocabulary.iter().find(|(phrase, _)| *phrase == text) {
            Some((_, tier)) => *tier,
            None => {
                trace!(indicator, text, "Unrecognized tier label");
                Tier::Unrecognized
            }
        }
    }
}

/// Municipal integration of the transport system.
pub const INTEGRATION_TIERS: [(&str, Tier); 4] = [
    (
        "Sistema de transporte público totalmente integrado com terminais com o uso de bilhete eletrônico para integração intra e intermodal",
        Tier::Tier3,
    ),
    (
        "Sistema de transporte público totalmente integrado com terminais com o uso de bilhete eletrônico para integração intramodal somente",
        Tier::Tier2,
    ),
    (
        "Integração tarifária temporal ocorre em determinados pontos, apenas com transferências intramodais",
        Tier::Tier1,
    ),
    ("Sem integração", Tier::Tier0),
];

/// Online information availability.
pub const INFO_TIERS: [(&str, Tier); 4] = [
    (
        "Possuir informações em site e aplicativo atualizados",
        Tier::Tier3,
    ),
    (
        "Possuir informações em site parcialmente atualizado",
        Tier::Tier2,
    ),
    ("Possuir informação em site desatualizado", Tier::Tier1),
    ("Sem informações", Tier::Tier0),
];

/// Fare change relative to the inflation index.
pub const FARE_TIERS: [(&str, Tier); 4] = [
    ("Não houve aumento da tarifa", Tier::Tier3),
    ("Aumento inferior ao índice", Tier::Tier2),
    ("Aumento equivalente ao índice", Tier::Tier1),
    ("Aumento superior ao índice", Tier::Tier0),
];

pub fn parse_integration(raw: &str) -> Tier {
    Tier::lookup(&INTEGRATION_TIERS, "integration", raw)
}

pub fn parse_info_availability(raw: &str) -> Tier {
    Tier::lookup(&INFO_TIERS, "info_availability", raw)
}

pub fn parse_fare_trend(raw: &str) -> Tier {
    Tier::lookup(&FARE_TIERS, "fare_trend", raw)
}
