use _core::allergen::COMMON_ALLERGENS;
use _core::{
    compute_bar_chart_view, compute_map_view, AllergenPreset, AllergenTable, ColorScheme,
    Continent, CountryRow, MapIdiom, Region,
};
use approx::assert_relative_eq;
use proptest::prelude::*;

const NAMES: [&str; 5] = ["Egg", "Milk", "Oat", "Peanut", "Wheat"];

fn table_strategy() -> impl Strategy<Value = AllergenTable> {
    prop::collection::vec(
        (prop::collection::vec(0.0f64..=1.0, NAMES.len()), 0usize..7),
        1..30,
    )
    .prop_map(|rows| {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, (values, continent))| CountryRow {
                code: format!("C{i:02}"),
                entity: format!("Country {i}"),
                continent: Continent::ALL.get(continent).copied(),
                values,
            })
            .collect();
        AllergenTable::new(NAMES.iter().map(|n| n.to_string()).collect(), rows).unwrap()
    })
}

fn selection_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(NAMES.to_vec(), 1..=NAMES.len())
}

proptest! {
    /// selected_set is the plain sum of the selected columns.
    #[test]
    fn selected_set_is_row_sum(table in table_strategy(), selected in selection_strategy()) {
        let bar = compute_bar_chart_view(&table, &selected, Region::World).unwrap();
        prop_assert_eq!(bar.rows.len(), table.len());
        for row in &bar.rows {
            let source = table.rows().iter().find(|r| r.code == row.code).unwrap();
            let expected: f64 = selected
                .iter()
                .map(|n| source.values[table.allergen_index(n).unwrap()])
                .sum();
            assert_relative_eq!(row.selected_set, expected, epsilon = 1e-12);
        }
    }

    /// Most/least prevalent are selected allergens holding the row's extremes.
    #[test]
    fn extremes_come_from_the_selection(
        table in table_strategy(),
        selected in selection_strategy(),
    ) {
        let bar = compute_bar_chart_view(&table, &selected, Region::World).unwrap();
        for row in &bar.rows {
            let max = row.values.iter().copied().fold(f64::MIN, f64::max);
            let min = row.values.iter().copied().fold(f64::MAX, f64::min);
            let names = bar.selection.names();
            let most = names.iter().position(|n| *n == row.most_prevalent_allergen);
            let least = names.iter().position(|n| *n == row.least_prevalent_allergen);
            prop_assert!(most.is_some() && least.is_some());
            prop_assert_eq!(row.values[most.unwrap()], max);
            prop_assert_eq!(row.values[least.unwrap()], min);
        }
    }

    /// Bars are ordered ascending and the region filter keeps only its continent.
    #[test]
    fn bar_rows_sorted_within_region(
        table in table_strategy(),
        selected in selection_strategy(),
        c in 0usize..6,
    ) {
        let region = Region::Continent(Continent::ALL[c]);
        let bar = compute_bar_chart_view(&table, &selected, region).unwrap();
        prop_assert!(bar.rows.windows(2).all(|w| w[0].selected_set <= w[1].selected_set));
        prop_assert!(bar.rows.iter().all(|r| r.continent == Some(Continent::ALL[c])));
        prop_assert!(bar.show_tick_labels);
    }

    /// Categorical maps are ordered by category; computing views leaves the table alone.
    #[test]
    fn map_views_do_not_touch_the_table(
        table in table_strategy(),
        selected in selection_strategy(),
    ) {
        let before = table.clone();
        let map = |idiom, scheme| {
            compute_map_view(&table, &selected, Region::World, idiom, scheme).unwrap()
        };
        let mpa = map(MapIdiom::Bubble, ColorScheme::Mpa);
        let lpa = map(MapIdiom::Choropleth, ColorScheme::Lpa);
        prop_assert!(mpa
            .rows
            .windows(2)
            .all(|w| w[0].most_prevalent_allergen <= w[1].most_prevalent_allergen));
        prop_assert!(lpa
            .rows
            .windows(2)
            .all(|w| w[0].least_prevalent_allergen <= w[1].least_prevalent_allergen));
        prop_assert_eq!(table, before);
    }
}

#[test]
fn common_preset_ignores_the_available_list() {
    let resolved = AllergenPreset::Common.resolve(&["Oat"]);
    let mut expected: Vec<String> = COMMON_ALLERGENS.iter().map(|s| s.to_string()).collect();
    expected.sort();
    assert_eq!(resolved, expected);
    assert_eq!(
        AllergenPreset::All.resolve(&NAMES),
        NAMES.iter().map(|s| s.to_string()).collect::<Vec<_>>()
    );
    assert!(AllergenPreset::Custom.resolve(&NAMES).is_empty());
}
