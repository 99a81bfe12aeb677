use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ExplorerError;

/// Collectible materials, keyed the way the game writes them into the inventory
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Material {
    #[serde(rename = "basalt")]
    Basalt,
    #[serde(rename = "water")]
    Water,
    #[serde(rename = "regolith")]
    Regolith,
    // The game spells the key without the "t"
    #[serde(rename = "smeciteClay")]
    SmectiteClay,
    #[serde(rename = "gypsum")]
    Gypsum,
    #[serde(rename = "carbonateRock")]
    CarbonateRock,
}

impl Material {
    pub const ALL: [Material; 6] = [
        Material::Basalt,
        Material::Water,
        Material::Regolith,
        Material::SmectiteClay,
        Material::Gypsum,
        Material::CarbonateRock,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Material::Basalt => "basalt",
            Material::Water => "water",
            Material::Regolith => "regolith",
            Material::SmectiteClay => "smeciteClay",
            Material::Gypsum => "gypsum",
            Material::CarbonateRock => "carbonateRock",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Material::Basalt => "Basalt",
            Material::Water => "Water",
            Material::Regolith => "Regolith",
            Material::SmectiteClay => "Smecite Clay",
            Material::Gypsum => "Gypsum",
            Material::CarbonateRock => "Carbonate Rock",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Material::ALL.iter().copied().find(|m| m.key() == key)
    }
}

/// Ranking dimension: the overall score or one material's high score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Metric {
    TotalScore,
    Material(Material),
}

impl Default for Metric {
    fn default() -> Self {
        Metric::TotalScore
    }
}

impl Metric {
    /// Every selectable metric in tab order
    pub fn all() -> Vec<Metric> {
        let mut metrics = vec![Metric::TotalScore];
        metrics.extend(Material::ALL.iter().copied().map(Metric::Material));
        metrics
    }

    pub fn key(&self) -> &'static str {
        match self {
            Metric::TotalScore => "totalScore",
            Metric::Material(m) => m.key(),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Metric::TotalScore => "Total Score",
            Metric::Material(m) => m.display_name(),
        }
    }

    /// Column header for the score column
    pub fn score_header(&self) -> &'static str {
        match self {
            Metric::TotalScore => "Total Score",
            Metric::Material(_) => "High Score",
        }
    }

    pub fn next(&self) -> Metric {
        let all = Metric::all();
        let idx = all.iter().position(|m| m == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }

    pub fn previous(&self) -> Metric {
        let all = Metric::all();
        let idx = all.iter().position(|m| m == self).unwrap_or(0);
        all[(idx + all.len() - 1) % all.len()]
    }
}

impl FromStr for Metric {
    type Err = ExplorerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "totalScore" {
            return Ok(Metric::TotalScore);
        }
        Material::from_key(s)
            .map(Metric::Material)
            .ok_or_else(|| ExplorerError::InvalidMetric(s.to_string()))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
