use serde_json::{json, Value};

use crate::region::MapIdiom;
use crate::schema::view;
use crate::view::{BarChartView, ColorEncoding, MapView, ViewRow};

// ── Styling constants ───────────────────────────────────────────────────────

pub const BAR_TITLE: &str = "Aggregated Prevalence";
const BAR_HEIGHT_PX: u32 = 400;
const MAP_HEIGHT_PX: u32 = 340;
/// Largest bubble diameter, in pixels.
const BUBBLE_SIZE_MAX: f64 = 20.0;

/// Plotly's default qualitative palette; categories cycle through it.
pub const QUALITATIVE_PALETTE: [&str; 10] = [
    "#636efa", "#EF553B", "#00cc96", "#ab63fa", "#FFA15A", "#19d3f3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

// ── Bar chart ───────────────────────────────────────────────────────────────

/// Stacked bar chart: one trace per selected allergen, countries on x.
///
/// The host hands the returned plotly document to its charting library as-is.
pub fn bar_chart_figure(bar: &BarChartView) -> Value {
    let entities: Vec<&str> = bar.rows.iter().map(|r| r.entity.as_str()).collect();

    let traces: Vec<Value> = bar
        .stack_order()
        .into_iter()
        .map(|(j, name)| {
            let values: Vec<f64> = bar.rows.iter().map(|r| r.values[j]).collect();
            json!({
                "type": "bar",
                "name": name,
                "legendgroup": name,
                "orientation": "v",
                "x": entities,
                "y": values,
                "hovertemplate": format!(
                    "Allergen={name}<br>Country=%{{x}}<br>value=%{{y}}<extra></extra>"
                ),
            })
        })
        .collect();

    json!({
        "data": traces,
        "layout": {
            "title": { "text": BAR_TITLE },
            "height": BAR_HEIGHT_PX,
            "barmode": "relative",
            "legend": {
                "title": { "text": "Allergen" },
                "orientation": "h",
                "yanchor": "bottom",
                "y": 1.02,
                "xanchor": "right",
                "x": 1,
            },
            "margin": { "l": 10, "r": 10, "b": 20, "t": 20, "pad": 4 },
            "xaxis": { "showticklabels": bar.show_tick_labels, "title": Value::Null },
            "yaxis": { "title": Value::Null },
        },
    })
}

// ── Map ─────────────────────────────────────────────────────────────────────

/// Choropleth or bubble map colored per the view's color encoding.
pub fn map_figure(map: &MapView) -> Value {
    let traces = match &map.color {
        ColorEncoding::Continuous { column, scale } => {
            vec![continuous_trace(map, &map.rows, column, scale)]
        }
        ColorEncoding::Categorical { column, categories } => categories
            .iter()
            .enumerate()
            .map(|(i, category)| {
                let rows: Vec<&ViewRow> = map
                    .rows
                    .iter()
                    .filter(|r| category_of(r, column) == category.as_str())
                    .collect();
                let color = QUALITATIVE_PALETTE[i % QUALITATIVE_PALETTE.len()];
                categorical_trace(map, &rows, column, category, color)
            })
            .collect(),
    };

    let margin_lr = match map.idiom {
        MapIdiom::Choropleth => 10,
        MapIdiom::Bubble => 5,
    };

    json!({
        "data": traces,
        "layout": {
            "height": MAP_HEIGHT_PX,
            "margin": { "l": margin_lr, "r": margin_lr, "b": 0, "t": 0, "pad": 4 },
            "geo": geo_layout(map),
            "legend": { "title": { "text": view::label(map.color.column()) } },
        },
    })
}

fn geo_layout(map: &MapView) -> Value {
    let mut projection = json!({ "type": "natural earth" });
    let mut geo = json!({
        "scope": map.scope.scope,
        "landcolor": "lightgray",
        "showland": true,
        "showcountries": true,
        "countrycolor": "gray",
        "countrywidth": 0.5,
    });
    if let Some(viewport) = map.scope.viewport {
        geo["center"] = json!({ "lon": viewport.lon, "lat": viewport.lat });
        projection["scale"] = json!(viewport.projection_scale);
    }
    geo["projection"] = projection;
    if map.hide_base_geography {
        geo["visible"] = json!(false);
    }
    geo
}

fn category_of<'a>(row: &'a ViewRow, column: &str) -> &'a str {
    if column == view::LEAST_PREVALENT_ALLERGEN {
        &row.least_prevalent_allergen
    } else {
        &row.most_prevalent_allergen
    }
}

fn continuous_trace(map: &MapView, rows: &[ViewRow], column: &str, scale: &str) -> Value {
    let codes: Vec<&str> = rows.iter().map(|r| r.code.as_str()).collect();
    let names: Vec<&str> = rows.iter().map(|r| r.entity.as_str()).collect();
    let values: Vec<f64> = rows.iter().map(|r| r.selected_set).collect();
    let colorbar = json!({ "title": { "text": view::label(column) } });

    match map.idiom {
        MapIdiom::Choropleth => json!({
            "type": "choropleth",
            "locations": codes,
            "z": values,
            "hovertext": names,
            "colorscale": scale,
            "colorbar": colorbar,
        }),
        MapIdiom::Bubble => json!({
            "type": "scattergeo",
            "mode": "markers",
            "locations": codes,
            "hovertext": names,
            "marker": {
                "color": values,
                "colorscale": scale,
                "showscale": true,
                "colorbar": colorbar,
                "size": values,
                "sizemode": "area",
                "sizeref": bubble_sizeref(&map.rows),
            },
        }),
    }
}

fn categorical_trace(
    map: &MapView,
    rows: &[&ViewRow],
    column: &str,
    category: &str,
    color: &str,
) -> Value {
    let codes: Vec<&str> = rows.iter().map(|r| r.code.as_str()).collect();
    let names: Vec<&str> = rows.iter().map(|r| r.entity.as_str()).collect();
    let hover = format!("{}={}", view::label(column), category);

    match map.idiom {
        MapIdiom::Choropleth => {
            // A single-color scale turns the choropleth into one legend entry.
            let ones = vec![1; rows.len()];
            json!({
                "type": "choropleth",
                "name": category,
                "legendgroup": category,
                "showlegend": true,
                "showscale": false,
                "locations": codes,
                "z": ones,
                "hovertext": names,
                "hovertemplate": format!("<b>%{{hovertext}}</b><br>{hover}<extra></extra>"),
                "colorscale": [[0.0, color], [1.0, color]],
            })
        }
        MapIdiom::Bubble => {
            let sizes: Vec<f64> = rows.iter().map(|r| r.selected_set).collect();
            json!({
                "type": "scattergeo",
                "mode": "markers",
                "name": category,
                "legendgroup": category,
                "showlegend": true,
                "locations": codes,
                "hovertext": names,
                "hovertemplate": format!("<b>%{{hovertext}}</b><br>{hover}<extra></extra>"),
                "marker": {
                    "color": color,
                    "size": sizes,
                    "sizemode": "area",
                    "sizeref": bubble_sizeref(&map.rows),
                },
            })
        }
    }
}

/// Marker area scale shared by every trace so the largest `selected_set`
/// gets a `BUBBLE_SIZE_MAX` pixel marker.
fn bubble_sizeref(rows: &[ViewRow]) -> f64 {
    let max = rows.iter().map(|r| r.selected_set).fold(0.0, f64::max);
    if max > 0.0 {
        2.0 * max / (BUBBLE_SIZE_MAX * BUBBLE_SIZE_MAX)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{ColorScheme, Continent, Region};
    use crate::table::{AllergenTable, CountryRow};
    use crate::view::{compute_bar_chart_view, compute_map_view};

    fn table() -> AllergenTable {
        let row = |code: &str, continent, values: &[f64]| CountryRow {
            code: code.to_string(),
            entity: format!("Country {code}"),
            continent,
            values: values.to_vec(),
        };
        AllergenTable::new(
            vec!["Wheat".into(), "Egg".into()],
            vec![
                row("AUS", Some(Continent::Oceania), &[0.4, 0.9]),
                row("NZL", Some(Continent::Oceania), &[0.6, 0.2]),
                row("PER", Some(Continent::SouthAmerica), &[0.1, 0.3]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn bar_traces_follow_stack_order() {
        let bar = compute_bar_chart_view(&table(), &["Wheat", "Egg"], Region::World).unwrap();
        let fig = bar_chart_figure(&bar);

        let traces = fig["data"].as_array().unwrap();
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[0]["name"], "Egg");
        assert_eq!(traces[1]["name"], "Wheat");
        // Rows ascending by selected_set: PER 0.4, NZL 0.8, AUS 1.3.
        assert_eq!(traces[0]["x"][0], "Country PER");
        assert_eq!(fig["layout"]["xaxis"]["showticklabels"], false);
        assert_eq!(fig["layout"]["title"]["text"], "Aggregated Prevalence");
    }

    #[test]
    fn oceania_map_is_recentred_and_hidden_for_choropleth() {
        let oceania = Region::Continent(Continent::Oceania);
        let map = compute_map_view(
            &table(),
            &["Egg"],
            oceania,
            MapIdiom::Choropleth,
            ColorScheme::Sequential,
        )
        .unwrap();
        let fig = map_figure(&map);
        let geo = &fig["layout"]["geo"];

        assert_eq!(geo["scope"], "world");
        assert_eq!(geo["center"]["lon"], 130.0);
        assert_eq!(geo["center"]["lat"], -30.0);
        assert_eq!(geo["projection"]["scale"], 3.0);
        assert_eq!(geo["projection"]["type"], "natural earth");
        assert_eq!(geo["visible"], false);
        assert_eq!(fig["data"][0]["colorscale"], "Blues");
        assert_eq!(fig["data"][0]["locations"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn bubble_map_keeps_base_geography() {
        let map = compute_map_view(
            &table(),
            &["Egg"],
            Region::World,
            MapIdiom::Bubble,
            ColorScheme::Sequential,
        )
        .unwrap();
        let fig = map_figure(&map);
        assert!(fig["layout"]["geo"].get("visible").is_none());
        assert_eq!(fig["data"][0]["type"], "scattergeo");
        assert_eq!(fig["data"][0]["marker"]["sizemode"], "area");
    }

    #[test]
    fn categorical_map_has_one_trace_per_allergen() {
        let map = compute_map_view(
            &table(),
            &["Wheat", "Egg"],
            Region::World,
            MapIdiom::Choropleth,
            ColorScheme::Mpa,
        )
        .unwrap();
        let fig = map_figure(&map);
        let traces = fig["data"].as_array().unwrap();

        // AUS -> Egg; NZL -> Wheat; PER -> Egg.
        assert_eq!(traces.len(), 2);
        assert_eq!(traces[0]["name"], "Egg");
        assert_eq!(traces[0]["locations"], json!(["AUS", "PER"]));
        assert_eq!(traces[1]["name"], "Wheat");
        assert_eq!(traces[1]["colorscale"][0][1], QUALITATIVE_PALETTE[1]);
        assert_eq!(
            fig["layout"]["legend"]["title"]["text"],
            "Most Prevalent Allergen"
        );
    }
}
