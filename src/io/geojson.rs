use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::{json, Map, Value};

use crate::dataset::{DataSource, Dataset, Feature, FeatureId, FeatureKind, Metadata};

/// Ring as `[[lon, lat], ...]`.
fn ring_json(ring: &LineString<f64>) -> Value {
    Value::Array(ring.coords().map(|c| json!([c.x, c.y])).collect())
}

/// Polygon as `[exterior, hole, hole, ...]`.
fn polygon_json(polygon: &Polygon<f64>) -> Value {
    Value::Array(
        std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .map(ring_json)
            .collect()
    )
}

/// GeoJSON geometry: `Polygon` for single-part features, `MultiPolygon` otherwise.
fn geometry_json(mp: &MultiPolygon<f64>) -> Value {
    match mp.0.as_slice() {
        [polygon] => json!({ "type": "Polygon", "coordinates": polygon_json(polygon) }),
        polygons => json!({
            "type": "MultiPolygon",
            "coordinates": polygons.iter().map(polygon_json).collect::<Vec<_>>(),
        }),
    }
}

fn feature_json(feature: &Feature) -> Result<Value> {
    Ok(json!({
        "type": "Feature",
        "id": serde_json::to_value(&feature.id)?,
        "properties": {
            "name": feature.name,
            "district": feature.district,
            "subdistrict": feature.subdistrict,
            "population": feature.population,
            "census_id": feature.census_id,
            "kind": feature.kind,
        },
        "geometry": geometry_json(&feature.geometry),
    }))
}

/// Build the transport payload: a `FeatureCollection` with a sibling
/// `metadata` block tagged with `data_format`.
pub fn to_feature_collection(dataset: &Dataset, data_format: &str) -> Result<Value> {
    let features = dataset.features().iter()
        .map(feature_json)
        .collect::<Result<Vec<_>>>()?;

    let mut metadata = serde_json::to_value(dataset.metadata())
        .context("Failed to serialize dataset metadata")?;
    if let Some(block) = metadata.as_object_mut() {
        block.insert("data_format".into(), json!(data_format));
    }

    Ok(json!({
        "type": "FeatureCollection",
        "features": features,
        "metadata": metadata,
    }))
}

/// Parse a ring from `[[x, y], ...]`, closing it if needed.
fn parse_ring(value: &Value) -> Result<LineString<f64>> {
    let coords = value.as_array().ok_or_else(|| anyhow!("Invalid ring: expected an array"))?;
    let mut points = Vec::with_capacity(coords.len());
    for pair in coords {
        let x = pair.get(0).and_then(Value::as_f64)
            .ok_or_else(|| anyhow!("Invalid coordinate: x must be a number"))?;
        let y = pair.get(1).and_then(Value::as_f64)
            .ok_or_else(|| anyhow!("Invalid coordinate: y must be a number"))?;
        points.push(Coord { x, y });
    }
    if !points.is_empty() && points[0] != points[points.len() - 1] {
        points.push(points[0]);
    }
    Ok(LineString(points))
}

fn parse_polygon(value: &Value) -> Result<Polygon<f64>> {
    let rings = value.as_array().ok_or_else(|| anyhow!("Invalid polygon: expected an array of rings"))?;
    let (exterior, interiors) = rings.split_first()
        .ok_or_else(|| anyhow!("Invalid polygon: missing exterior ring"))?;
    Ok(Polygon::new(
        parse_ring(exterior)?,
        interiors.iter().map(parse_ring).collect::<Result<_>>()?,
    ))
}

fn parse_geometry(value: &Value) -> Result<MultiPolygon<f64>> {
    let coordinates = &value["coordinates"];
    match value["type"].as_str() {
        Some("Polygon") => Ok(MultiPolygon(vec![parse_polygon(coordinates)?])),
        Some("MultiPolygon") => Ok(MultiPolygon(
            coordinates.as_array()
                .ok_or_else(|| anyhow!("Invalid MultiPolygon: expected an array of polygons"))?
                .iter()
                .map(parse_polygon)
                .collect::<Result<_>>()?
        )),
        other => bail!("Unsupported geometry type: {other:?}"),
    }
}

fn parse_feature(index: usize, value: &Value) -> Result<Feature> {
    let empty = Map::new();
    let properties = value["properties"].as_object().unwrap_or(&empty);
    let text = |key: &str| properties.get(key).and_then(Value::as_str).unwrap_or_default().to_string();

    let id: FeatureId = match value.get("id") {
        Some(id) if !id.is_null() => serde_json::from_value(id.clone())
            .with_context(|| format!("Invalid id on feature {index}"))?,
        _ => FeatureId::Num(index as u64),
    };
    let kind: FeatureKind = match properties.get("kind") {
        Some(kind) => serde_json::from_value(kind.clone())
            .with_context(|| format!("Invalid kind on feature {index}"))?,
        None => FeatureKind::Village,
    };

    Ok(Feature {
        id,
        name: text("name"),
        district: text("district"),
        subdistrict: text("subdistrict"),
        census_id: text("census_id"),
        population: properties.get("population").and_then(Value::as_u64).unwrap_or(0),
        geometry: parse_geometry(&value["geometry"])
            .with_context(|| format!("Invalid geometry on feature {index}"))?,
        kind,
    })
}

/// Rebuild a dataset from a payload written by [`to_feature_collection`].
///
/// Metadata is recomputed from the features; the stored block must agree on
/// the village count and total population.
pub fn from_feature_collection(value: &Value) -> Result<(Dataset, String)> {
    if value["type"].as_str() != Some("FeatureCollection") {
        bail!("Payload is not a FeatureCollection");
    }
    let features = value["features"].as_array()
        .ok_or_else(|| anyhow!("FeatureCollection has no features array"))?
        .iter().enumerate()
        .map(|(i, f)| parse_feature(i, f))
        .collect::<Result<Vec<_>>>()?;

    let stored: Option<Metadata> = value.get("metadata")
        .map(|m| serde_json::from_value(m.clone()))
        .transpose()
        .context("Invalid metadata block")?;
    let source = stored.as_ref().map_or(DataSource::Authoritative, |m| m.source);
    let data_format = value["metadata"]["data_format"].as_str().unwrap_or_default().to_string();

    let dataset = Dataset::new(features, source)?;
    if let Some(stored) = stored {
        let rebuilt = dataset.metadata();
        if stored.total_count != rebuilt.total_count || stored.total_population != rebuilt.total_population {
            bail!(
                "Metadata disagrees with features: {} villages / {} people stored, {} / {} found",
                stored.total_count, stored.total_population, rebuilt.total_count, rebuilt.total_population,
            );
        }
    }
    Ok((dataset, data_format))
}
