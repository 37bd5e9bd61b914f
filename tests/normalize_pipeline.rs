use std::fs;
use std::path::Path;

use _core::{
    normalize_dataset, AllergenCategory, AllergenSource, AllergenTable, AllervisError, Continent,
    DatasetConfig, Region,
};
use approx::assert_relative_eq;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

fn source(name: &str, category: AllergenCategory, file: &str) -> AllergenSource {
    AllergenSource {
        name: name.to_string(),
        category,
        file: file.to_string(),
    }
}

/// Three allergens, six countries, one regional aggregate row and gaps.
/// XKX has no continent entry; ATA is listed under Antarctica.
fn fixture() -> (TempDir, DatasetConfig) {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "milk.csv",
        "Entity,Code,Year,Milk consumption\n\
         France,FRA,2016,200\n\
         France,FRA,2017,250\n\
         Norway,NOR,2017,500\n\
         Japan,JPN,2017,50\n\
         Kosovo,XKX,2017,100\n\
         Europe,,2017,300\n",
    );
    write(
        dir.path(),
        "egg.csv",
        "Entity,Code,Year,Egg consumption\n\
         France,FRA,2017,12\n\
         Norway,NOR,2017,10\n\
         Peru,PER,2017,8\n\
         Antarctica,ATA,2017,9\n",
    );
    write(
        dir.path(),
        "peanut.csv",
        "Entity,Code,Year,Peanut consumption\n\
         France,FRA,2017,1.5\n\
         Japan,JPN,2017,3\n\
         Peru,PER,2017,6\n",
    );
    write(
        dir.path(),
        "continents.csv",
        "alpha3,Continent\nFRA,EU\nNOR,EU\nJPN,AS\nPER,SA\nATA,AN\n",
    );

    let mut config = DatasetConfig::with_data_dir(dir.path());
    config.allergens = vec![
        source("Milk", AllergenCategory::MeatDairy, "milk.csv"),
        source("Egg", AllergenCategory::EggSeafood, "egg.csv"),
        source("Peanut", AllergenCategory::Nut, "peanut.csv"),
    ];
    (dir, config)
}

#[test]
fn normalizes_and_persists_the_table() {
    let (_dir, config) = fixture();
    let table = normalize_dataset(&config).unwrap();

    assert_eq!(table.allergens(), ["Milk", "Egg", "Peanut"]);
    let codes: Vec<&str> = table.rows().iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, ["ATA", "FRA", "JPN", "NOR", "PER", "XKX"]);

    for row in table.rows() {
        for v in &row.values {
            assert!((0.0..=1.0).contains(v), "{} has {}", row.code, v);
        }
    }

    // FRA milk: latest year (250) over max 500.
    assert_relative_eq!(table.rows()[1].values[0], 0.5);
    // PER milk: median of {50, 100, 250, 500} = 175.
    assert_relative_eq!(table.rows()[4].values[0], 0.35);
    // JPN egg: median of {8, 9, 10, 12} = 9.5 over 12.
    assert_relative_eq!(table.rows()[2].values[1], 9.5 / 12.0);
    // NOR peanut: minimum 1.5 over max 6.
    assert_relative_eq!(table.rows()[3].values[2], 0.25);
    assert_eq!(table.rows()[2].continent, Some(Continent::Asia));
    assert_eq!(table.rows()[0].continent, None);
    assert_eq!(table.rows()[5].continent, None);

    let reloaded = AllergenTable::read_csv(&config.output_path()).unwrap();
    assert_eq!(reloaded, table);
}

#[test]
fn rerunning_produces_identical_output() {
    let (_dir, config) = fixture();
    let first = normalize_dataset(&config).unwrap();
    let first_bytes = fs::read(config.output_path()).unwrap();
    let second = normalize_dataset(&config).unwrap();
    let second_bytes = fs::read(config.output_path()).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_bytes, second_bytes);
}

#[test]
fn continent_regions_partition_the_world() {
    let (_dir, config) = fixture();
    let table = normalize_dataset(&config).unwrap();

    let world: Vec<&str> = table.rows_in(Region::World).map(|r| r.code.as_str()).collect();
    assert!(world.contains(&"XKX"));
    assert!(world.contains(&"ATA"));

    let with_continent: Vec<&str> = table
        .rows_in(Region::World)
        .filter(|r| r.continent.is_some())
        .map(|r| r.code.as_str())
        .collect();
    let mut covered: Vec<&str> = Continent::ALL
        .iter()
        .flat_map(|c| table.rows_in(Region::Continent(*c)).map(|r| r.code.as_str()))
        .collect();
    covered.sort_unstable();
    assert_eq!(with_continent, covered);
    assert!(!covered.contains(&"XKX"));
    assert!(!covered.contains(&"ATA"));
}

#[test]
fn missing_allergen_file_is_an_io_error() {
    let (_dir, mut config) = fixture();
    config
        .allergens
        .push(source("Oat", AllergenCategory::Cereal, "oat.csv"));
    assert!(matches!(
        normalize_dataset(&config),
        Err(AllervisError::Io(_)) | Err(AllervisError::Polars(_))
    ));
}

#[test]
fn allergen_with_only_blank_values_stops_the_run() {
    let (dir, mut config) = fixture();
    write(
        dir.path(),
        "pecan.csv",
        "Entity,Code,Year,Pecan consumption\nFrance,FRA,2017,\nNorway,NOR,2017,\n",
    );
    config
        .allergens
        .push(source("Pecan", AllergenCategory::Nut, "pecan.csv"));

    let err = normalize_dataset(&config).unwrap_err();
    assert!(matches!(err, AllervisError::EmptyAllergen(name) if name == "Pecan"));
    assert!(!config.output_path().exists());
}

#[test]
fn json_config_overrides_defaults() {
    let (dir, config) = fixture();
    let path = dir.path().join("dataset.json");
    fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

    let loaded = DatasetConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.output_file, "concatenated.csv");
}
