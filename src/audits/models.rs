//! Audit inputs and scoring rules.
//!
//! Inputs are explicit numeric fields; missing fields default to zero,
//! negatives clamp to zero and category inputs clamp to their documented
//! maxima. All reported figures are rounded to two decimals.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

/// Emission factor for grid electricity, kg CO2 per kWh (India average).
const ELECTRICITY_FACTOR: f64 = 0.82;
/// Emission factor for natural gas, kg CO2 per m3.
const NATURAL_GAS_FACTOR: f64 = 2.04;
/// Emission factor for water, kg CO2 per m3.
const WATER_FACTOR: f64 = 0.34;
/// Emission factor for waste, kg CO2 per kg.
const WASTE_FACTOR: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuditKind {
    Carbon,
    Esg,
    Igbc,
}

impl AuditKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Carbon => "carbon",
            Self::Esg => "esg",
            Self::Igbc => "igbc",
        }
    }
}

impl fmt::Display for AuditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "carbon" => Ok(Self::Carbon),
            "esg" => Ok(Self::Esg),
            "igbc" => Ok(Self::Igbc),
            _ => Err(()),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn clamp(value: f64, max: f64) -> f64 {
    value.clamp(0.0, max)
}

/// Facility consumption figures for a carbon footprint audit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CarbonInput {
    /// kWh over the audit period.
    pub electricity_consumption: f64,
    /// m3 over the audit period.
    pub natural_gas_consumption: f64,
    /// m3 over the audit period.
    pub water_consumption: f64,
    /// kg over the audit period.
    pub waste_generated: f64,
    /// Share of electricity from renewable sources, 0-100.
    pub renewable_energy_percentage: f64,
}

impl Default for CarbonInput {
    fn default() -> Self {
        Self {
            electricity_consumption: 0.0,
            natural_gas_consumption: 0.0,
            water_consumption: 0.0,
            waste_generated: 0.0,
            renewable_energy_percentage: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CarbonReport {
    pub electricity_emissions: f64,
    pub natural_gas_emissions: f64,
    pub water_emissions: f64,
    pub waste_emissions: f64,
    pub renewable_energy_offset: f64,
    /// Sum of all sources, kg CO2.
    pub total_carbon_footprint: f64,
}

impl CarbonInput {
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            electricity_consumption: clamp(self.electricity_consumption, f64::MAX),
            natural_gas_consumption: clamp(self.natural_gas_consumption, f64::MAX),
            water_consumption: clamp(self.water_consumption, f64::MAX),
            waste_generated: clamp(self.waste_generated, f64::MAX),
            renewable_energy_percentage: clamp(self.renewable_energy_percentage, 100.0),
        }
    }

    /// Compute emissions per source; renewable share offsets electricity.
    #[must_use]
    pub fn report(self) -> CarbonReport {
        let input = self.normalized();

        let gross_electricity = input.electricity_consumption * ELECTRICITY_FACTOR;
        let renewable_offset = gross_electricity * input.renewable_energy_percentage / 100.0;
        let electricity_emissions = gross_electricity - renewable_offset;

        let natural_gas_emissions = input.natural_gas_consumption * NATURAL_GAS_FACTOR;
        let water_emissions = input.water_consumption * WATER_FACTOR;
        let waste_emissions = input.waste_generated * WASTE_FACTOR;

        let total = electricity_emissions + natural_gas_emissions + water_emissions
            + waste_emissions;

        CarbonReport {
            electricity_emissions: round2(electricity_emissions),
            natural_gas_emissions: round2(natural_gas_emissions),
            water_emissions: round2(water_emissions),
            waste_emissions: round2(waste_emissions),
            renewable_energy_offset: round2(renewable_offset),
            total_carbon_footprint: round2(total),
        }
    }
}

/// ESG category inputs, each rated 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct EsgInput {
    pub carbon_management: f64,
    pub water_management: f64,
    pub waste_management: f64,
    pub renewable_energy: f64,
    pub employee_satisfaction: f64,
    pub community_impact: f64,
    pub health_safety: f64,
    pub diversity_inclusion: f64,
    pub ethics_compliance: f64,
    pub audit_controls: f64,
    pub board_diversity: f64,
    pub transparency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EsgReport {
    pub environmental_score: f64,
    pub social_score: f64,
    pub governance_score: f64,
    /// Mean of the three pillar scores.
    pub esg_score: f64,
    pub esg_rating: String,
}

impl EsgInput {
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            carbon_management: clamp(self.carbon_management, 100.0),
            water_management: clamp(self.water_management, 100.0),
            waste_management: clamp(self.waste_management, 100.0),
            renewable_energy: clamp(self.renewable_energy, 100.0),
            employee_satisfaction: clamp(self.employee_satisfaction, 100.0),
            community_impact: clamp(self.community_impact, 100.0),
            health_safety: clamp(self.health_safety, 100.0),
            diversity_inclusion: clamp(self.diversity_inclusion, 100.0),
            ethics_compliance: clamp(self.ethics_compliance, 100.0),
            audit_controls: clamp(self.audit_controls, 100.0),
            board_diversity: clamp(self.board_diversity, 100.0),
            transparency: clamp(self.transparency, 100.0),
        }
    }

    /// Weighted pillar scores, overall mean and rating band.
    #[must_use]
    pub fn report(self) -> EsgReport {
        let input = self.normalized();

        let environmental = input.carbon_management * 0.3
            + input.water_management * 0.3
            + input.waste_management * 0.2
            + input.renewable_energy * 0.2;
        let social = input.employee_satisfaction * 0.3
            + input.community_impact * 0.3
            + input.health_safety * 0.2
            + input.diversity_inclusion * 0.2;
        let governance = input.ethics_compliance * 0.35
            + input.audit_controls * 0.35
            + input.board_diversity * 0.15
            + input.transparency * 0.15;

        let esg_score = (environmental + social + governance) / 3.0;
        let esg_rating = if esg_score >= 80.0 {
            "EXCELLENT"
        } else if esg_score >= 70.0 {
            "VERY GOOD"
        } else if esg_score >= 60.0 {
            "GOOD"
        } else if esg_score >= 50.0 {
            "ADEQUATE"
        } else {
            "NEEDS IMPROVEMENT"
        };

        EsgReport {
            environmental_score: round2(environmental),
            social_score: round2(social),
            governance_score: round2(governance),
            esg_score: round2(esg_score),
            esg_rating: esg_rating.to_string(),
        }
    }
}

/// IGBC category points. Maxima: site 10, water 10, energy 15, environment
/// 10, health 10, construction 10, management 10, innovation 5.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct IgbcInput {
    pub site_selection: f64,
    pub water_conservation: f64,
    pub energy_conservation: f64,
    pub environment_protection: f64,
    pub health_wellbeing: f64,
    pub construction_practices: f64,
    pub management_operations: f64,
    pub innovation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IgbcReport {
    pub site_selection: f64,
    pub water_conservation: f64,
    pub energy_conservation: f64,
    pub environment_protection: f64,
    pub health_wellbeing: f64,
    pub construction_practices: f64,
    pub management_operations: f64,
    pub innovation: f64,
    pub total_score: f64,
    pub rating: String,
}

impl IgbcInput {
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            site_selection: clamp(self.site_selection, 10.0),
            water_conservation: clamp(self.water_conservation, 10.0),
            energy_conservation: clamp(self.energy_conservation, 15.0),
            environment_protection: clamp(self.environment_protection, 10.0),
            health_wellbeing: clamp(self.health_wellbeing, 10.0),
            construction_practices: clamp(self.construction_practices, 10.0),
            management_operations: clamp(self.management_operations, 10.0),
            innovation: clamp(self.innovation, 5.0),
        }
    }

    /// Clamp category points and band the total.
    #[must_use]
    pub fn report(self) -> IgbcReport {
        let input = self.normalized();
        let total = input.site_selection
            + input.water_conservation
            + input.energy_conservation
            + input.environment_protection
            + input.health_wellbeing
            + input.construction_practices
            + input.management_operations
            + input.innovation;

        let rating = if total >= 85.0 {
            "PLATINUM"
        } else if total >= 70.0 {
            "GOLD"
        } else if total >= 55.0 {
            "SILVER"
        } else if total >= 40.0 {
            "GREEN"
        } else {
            "NOT RATED"
        };

        IgbcReport {
            site_selection: round2(input.site_selection),
            water_conservation: round2(input.water_conservation),
            energy_conservation: round2(input.energy_conservation),
            environment_protection: round2(input.environment_protection),
            health_wellbeing: round2(input.health_wellbeing),
            construction_practices: round2(input.construction_practices),
            management_operations: round2(input.management_operations),
            innovation: round2(input.innovation),
            total_score: round2(total),
            rating: rating.to_string(),
        }
    }
}
