use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, MapCoords, MultiPolygon};
use proj4rs::{proj::Proj as Proj4, transform::transform};
use regex::Regex;

const WGS84_PROJ4: &str = "+proj=longlat +datum=WGS84 +no_defs +type=crs";

/// Coordinate reference system of a shapefile, as far as its `.prj` tells us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Crs {
    /// Lon/lat degrees. Also assumed when there is no `.prj`.
    Geographic,
    /// Spherical (web) Mercator in metres.
    WebMercator,
    Utm { zone: u8, south: bool },
    /// A projected CRS we cannot build a transform for.
    Unsupported(String),
}

impl Crs {
    /// Classify the WKT found in a `.prj` sidecar.
    pub fn from_prj(wkt: &str) -> Crs {
        let text = wkt.trim();
        if text.is_empty() || !text.starts_with("PROJCS") {
            return Crs::Geographic;
        }

        let lower = text.to_lowercase();
        if lower.contains("mercator") && (lower.contains("auxiliary_sphere") || lower.contains("pseudo") || lower.contains("3857")) {
            return Crs::WebMercator;
        }

        let utm = Regex::new(r"(?i)utm[ _]zone[ _](\d{1,2})([ns])").ok()
            .and_then(|re| re.captures(text))
            .and_then(|caps| {
                let zone: u8 = caps.get(1)?.as_str().parse().ok()?;
                let south = caps.get(2)?.as_str().eq_ignore_ascii_case("s");
                (1..=60).contains(&zone).then_some(Crs::Utm { zone, south })
            });

        utm.unwrap_or_else(|| {
            let name = text.split('"').nth(1).unwrap_or("unknown");
            Crs::Unsupported(name.to_string())
        })
    }

    /// PROJ.4 definition of the source CRS, or `None` when already lon/lat.
    fn proj4(&self) -> Result<Option<String>> {
        Ok(match self {
            Crs::Geographic => None,
            Crs::WebMercator => Some(
                "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs +type=crs".to_string()
            ),
            Crs::Utm { zone, south } => {
                let south = if *south { " +south" } else { "" };
                Some(format!("+proj=utm +zone={zone}{south} +datum=WGS84 +units=m +no_defs +type=crs"))
            }
            Crs::Unsupported(name) => bail!("unsupported projected CRS: {name}"),
        })
    }
}

/// Reproject shapes into WGS84 lon/lat degrees. Geographic input is returned as-is.
pub fn reproject_to_wgs84(shapes: Vec<MultiPolygon<f64>>, crs: &Crs) -> Result<Vec<MultiPolygon<f64>>> {
    let Some(proj_string) = crs.proj4()? else { return Ok(shapes) };

    let from = Proj4::from_proj_string(&proj_string)
        .with_context(|| anyhow!("failed to build source PROJ.4: {proj_string}"))?;
    let to = Proj4::from_proj_string(WGS84_PROJ4)
        .with_context(|| anyhow!("failed to build target PROJ.4: {WGS84_PROJ4}"))?;

    // Metres in, radians out.
    shapes.iter()
        .map(|shape| shape.try_map_coords(|coord: Coord<f64>| -> Result<Coord<f64>> {
            let mut point = (coord.x, coord.y, 0.0);
            transform(&from, &to, &mut point)
                .map_err(|e| anyhow!("CRS transform failed at ({}, {}): {e:?}", coord.x, coord.y))?;
            Ok(Coord { x: point.0.to_degrees(), y: point.1.to_degrees() })
        }))
        .collect()
}
