//! Well-known Azure regions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An Azure region.
///
/// Regions outside the well-known list can be expressed with
/// [`Region::Other`]; the service owns the final say on what is valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Region {
    UsWest,
    UsWest2,
    UsCentral,
    UsEast,
    UsEast2,
    UsNorthCentral,
    UsSouthCentral,
    EuropeNorth,
    EuropeWest,
    AsiaEast,
    AsiaSouthEast,
    JapanEast,
    JapanWest,
    BrazilSouth,
    AustraliaEast,
    AustraliaSouthEast,
    /// Any other region name.
    Other(String),
}

impl Region {
    /// The region name as the service expects it.
    pub fn as_str(&self) -> &str {
        match self {
            Region::UsWest => "westus",
            Region::UsWest2 => "westus2",
            Region::UsCentral => "centralus",
            Region::UsEast => "eastus",
            Region::UsEast2 => "eastus2",
            Region::UsNorthCentral => "northcentralus",
            Region::UsSouthCentral => "southcentralus",
            Region::EuropeNorth => "northeurope",
            Region::EuropeWest => "westeurope",
            Region::AsiaEast => "eastasia",
            Region::AsiaSouthEast => "southeastasia",
            Region::JapanEast => "japaneast",
            Region::JapanWest => "japanwest",
            Region::BrazilSouth => "brazilsouth",
            Region::AustraliaEast => "australiaeast",
            Region::AustraliaSouthEast => "australiasoutheast",
            Region::Other(name) => name,
        }
    }

    /// Parse a region name.
    ///
    /// Matching ignores case and spaces, so both `"westus"` and
    /// `"West US"` resolve to [`Region::UsWest`].
    pub fn parse(name: &str) -> Self {
        let normalized: String = name
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "westus" => Region::UsWest,
            "westus2" => Region::UsWest2,
            "centralus" => Region::UsCentral,
            "eastus" => Region::UsEast,
            "eastus2" => Region::UsEast2,
            "northcentralus" => Region::UsNorthCentral,
            "southcentralus" => Region::UsSouthCentral,
            "northeurope" => Region::EuropeNorth,
            "westeurope" => Region::EuropeWest,
            "eastasia" => Region::AsiaEast,
            "southeastasia" => Region::AsiaSouthEast,
            "japaneast" => Region::JapanEast,
            "japanwest" => Region::JapanWest,
            "brazilsouth" => Region::BrazilSouth,
            "australiaeast" => Region::AustraliaEast,
            "australiasoutheast" => Region::AustraliaSouthEast,
            _ => Region::Other(name.to_string()),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Region {
    fn from(name: String) -> Self {
        Region::parse(&name)
    }
}

impl From<&str> for Region {
    fn from(name: &str) -> Self {
        Region::parse(name)
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.as_str().to_string()
    }
}
