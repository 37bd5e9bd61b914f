/// Column-name constants for the allervis tables.
/// Single source of truth - exported to Python via PyO3.

// ── Per-allergen source columns ─────────────────────────────────────────────
pub mod series {
    pub const ENTITY: &str = "Entity";
    pub const CODE: &str = "Code";
    pub const YEAR: &str = "Year";
}

// ── Continent lookup columns ────────────────────────────────────────────────
pub mod continents {
    pub const ALPHA3: &str = "alpha3";
    pub const CONTINENT: &str = "Continent";
}

// ── Normalized table columns ────────────────────────────────────────────────
pub mod table {
    pub const CODE: &str = "Code";
    pub const ENTITY: &str = "Entity";
    pub const CONTINENT: &str = "Continent";
}

// ── Derived view columns ────────────────────────────────────────────────────
pub mod view {
    pub const SELECTED_SET: &str = "selected_set";
    pub const MOST_PREVALENT_ALLERGEN: &str = "most_prevalent_allergen";
    pub const LEAST_PREVALENT_ALLERGEN: &str = "least_prevalent_allergen";

    /// Human readable label for a derived column, as shown in legends.
    pub fn label(column: &str) -> &str {
        match column {
            SELECTED_SET => "Prevalence",
            MOST_PREVALENT_ALLERGEN => "Most Prevalent Allergen",
            LEAST_PREVALENT_ALLERGEN => "Least Prevalent Allergen",
            other => other,
        }
    }
}

// ── Region values ───────────────────────────────────────────────────────────
pub mod region {
    pub const WORLD: &str = "world";
    pub const EUROPE: &str = "europe";
    pub const ASIA: &str = "asia";
    pub const AFRICA: &str = "africa";
    pub const NORTH_AMERICA: &str = "north america";
    pub const SOUTH_AMERICA: &str = "south america";
    pub const OCEANIA: &str = "oceania";

    pub const ALL: [&str; 7] = [
        WORLD,
        EUROPE,
        ASIA,
        AFRICA,
        NORTH_AMERICA,
        SOUTH_AMERICA,
        OCEANIA,
    ];
}

// ── Map idiom values ────────────────────────────────────────────────────────
pub mod map_idiom {
    pub const CHOROPLETH: &str = "choropleth";
    pub const BUBBLE: &str = "bubble";

    pub const ALL: [&str; 2] = [CHOROPLETH, BUBBLE];
}

// ── Color scheme values ─────────────────────────────────────────────────────
pub mod color_scheme {
    pub const SEQUENTIAL: &str = "sequential";
    pub const MPA: &str = "mpa";
    pub const LPA: &str = "lpa";

    pub const ALL: [&str; 3] = [SEQUENTIAL, MPA, LPA];
}

// ── Allergen selector presets ───────────────────────────────────────────────
pub mod preset {
    pub const COMMON: &str = "common";
    pub const CUSTOM: &str = "custom";
    pub const ALL_ALLERGENS: &str = "all";

    pub const ALL: [&str; 3] = [COMMON, CUSTOM, ALL_ALLERGENS];
}
