use std::fmt;
use std::str::FromStr;

use crate::error::AllervisError;
use crate::schema::{color_scheme, map_idiom, region};

/// Continent codes carried by the normalized table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Continent {
    Europe,
    Asia,
    Africa,
    NorthAmerica,
    SouthAmerica,
    Oceania,
}

impl Continent {
    pub const ALL: [Continent; 6] = [
        Continent::Europe,
        Continent::Asia,
        Continent::Africa,
        Continent::NorthAmerica,
        Continent::SouthAmerica,
        Continent::Oceania,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Continent::Europe => "EU",
            Continent::Asia => "AS",
            Continent::Africa => "AF",
            Continent::NorthAmerica => "NAM",
            Continent::SouthAmerica => "SA",
            Continent::Oceania => "OC",
        }
    }

    /// Parse a continent code. `NA` is accepted for North America because the
    /// continent lookup file uses it and generic readers mistake it for null.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "EU" => Some(Continent::Europe),
            "AS" => Some(Continent::Asia),
            "AF" => Some(Continent::Africa),
            "NAM" | "NA" => Some(Continent::NorthAmerica),
            "SA" => Some(Continent::SouthAmerica),
            "OC" => Some(Continent::Oceania),
            _ => None,
        }
    }
}

impl fmt::Display for Continent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Region filter chosen in the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    World,
    Continent(Continent),
}

impl FromStr for Region {
    type Err = AllervisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let region = match s {
            region::WORLD => Region::World,
            region::EUROPE => Region::Continent(Continent::Europe),
            region::ASIA => Region::Continent(Continent::Asia),
            region::AFRICA => Region::Continent(Continent::Africa),
            region::NORTH_AMERICA => Region::Continent(Continent::NorthAmerica),
            region::SOUTH_AMERICA => Region::Continent(Continent::SouthAmerica),
            region::OCEANIA => Region::Continent(Continent::Oceania),
            other => {
                return Err(AllervisError::invalid_selector(
                    "region",
                    other,
                    &region::ALL,
                ))
            }
        };
        Ok(region)
    }
}

impl Region {
    pub fn tag(self) -> &'static str {
        match self {
            Region::World => region::WORLD,
            Region::Continent(Continent::Europe) => region::EUROPE,
            Region::Continent(Continent::Asia) => region::ASIA,
            Region::Continent(Continent::Africa) => region::AFRICA,
            Region::Continent(Continent::NorthAmerica) => region::NORTH_AMERICA,
            Region::Continent(Continent::SouthAmerica) => region::SOUTH_AMERICA,
            Region::Continent(Continent::Oceania) => region::OCEANIA,
        }
    }

    /// Whether a row with this continent belongs to the region.
    /// Rows without a continent only show up in the world view.
    pub fn contains(self, continent: Option<Continent>) -> bool {
        match self {
            Region::World => true,
            Region::Continent(c) => continent == Some(c),
        }
    }

    pub fn shows_tick_labels(self) -> bool {
        self != Region::World
    }

    /// Geographic scope handed to the map renderer.
    ///
    /// The renderer has no oceania scope, so Oceania uses the world scope
    /// recentred on the region.
    pub fn geo_scope(self) -> GeoScope {
        match self {
            Region::Continent(Continent::Oceania) => GeoScope {
                scope: region::WORLD,
                viewport: Some(OCEANIA_VIEWPORT),
            },
            other => GeoScope {
                scope: other.tag(),
                viewport: None,
            },
        }
    }
}

/// Recentre/zoom override applied on top of a renderer scope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub lon: f64,
    pub lat: f64,
    pub projection_scale: f64,
}

pub const OCEANIA_VIEWPORT: Viewport = Viewport {
    lon: 130.0,
    lat: -30.0,
    projection_scale: 3.0,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoScope {
    pub scope: &'static str,
    pub viewport: Option<Viewport>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapIdiom {
    Choropleth,
    Bubble,
}

impl FromStr for MapIdiom {
    type Err = AllervisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            map_idiom::CHOROPLETH => Ok(MapIdiom::Choropleth),
            map_idiom::BUBBLE => Ok(MapIdiom::Bubble),
            other => Err(AllervisError::invalid_selector(
                "map idiom",
                other,
                &map_idiom::ALL,
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    /// Continuous scale over `selected_set`.
    Sequential,
    /// Hue per most prevalent allergen.
    Mpa,
    /// Hue per least prevalent allergen.
    Lpa,
}

impl FromStr for ColorScheme {
    type Err = AllervisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            color_scheme::SEQUENTIAL => Ok(ColorScheme::Sequential),
            color_scheme::MPA => Ok(ColorScheme::Mpa),
            color_scheme::LPA => Ok(ColorScheme::Lpa),
            other => Err(AllervisError::invalid_selector(
                "color scheme",
                other,
                &color_scheme::ALL,
            )),
        }
    }
}
