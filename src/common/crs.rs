use std::{fs, path::Path, sync::LazyLock};

use regex::Regex;
use tracing::debug;

static EPSG_AUTHORITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"AUTHORITY\s*\[\s*"EPSG"\s*,\s*"?(\d+)"?\s*\]"#).expect("valid EPSG regex")
});

/// Geographic coordinate systems whose ESRI `.prj` files usually omit an authority clause.
const KNOWN_GEOGCS: &[(&str, u32)] = &[
    ("GCS_North_American_1983", 4269),
    ("NAD83", 4269),
    ("GCS_WGS_1984", 4326),
    ("WGS 84", 4326),
];

/// Detect an EPSG code from the text of a `.prj` file.
///
/// WKT lists nested authorities before the outer one, so the last `AUTHORITY["EPSG",..]`
/// wins. Without one, only top-level geographic systems from a small table are recognized.
pub(crate) fn epsg_from_wkt(wkt: &str) -> Option<u32> {
    if let Some(code) = EPSG_AUTHORITY.captures_iter(wkt).last()
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
    {
        return Some(code);
    }

    let wkt = wkt.trim_start();
    if !wkt.starts_with("GEOGCS") {
        return None;
    }
    let name = wkt.split('"').nth(1)?;
    KNOWN_GEOGCS.iter()
        .find(|(known, _)| *known == name)
        .map(|&(_, code)| code)
}

/// Detect the EPSG code of a shapefile from its sibling `.prj` file, if any.
pub(crate) fn epsg_from_shapefile(path: &Path) -> Option<u32> {
    let prj = path.with_extension("prj");
    let text = match fs::read_to_string(&prj) {
        Ok(text) => text,
        Err(err) => {
            debug!(path = %prj.display(), %err, "no readable projection file");
            return None;
        }
    };

    let epsg = epsg_from_wkt(&text);
    if epsg.is_none() {
        debug!(path = %prj.display(), "unrecognized projection, EPSG left unset");
    }
    epsg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authority_clause_is_used() {
        let wkt = r#"GEOGCS["NAD83",DATUM["North_American_Datum_1983",SPHEROID["GRS 1980",6378137,298.257222101,AUTHORITY["EPSG","7019"]],AUTHORITY["EPSG","6269"]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","4269"]]"#;
        assert_eq!(epsg_from_wkt(wkt), Some(4269));
    }

    #[test]
    fn esri_geographic_names_are_recognized() {
        let nad83 = r#"GEOGCS["GCS_North_American_1983",DATUM["D_North_American_1983",SPHEROID["GRS_1980",6378137.0,298.257222101]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;
        let wgs84 = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;
        assert_eq!(epsg_from_wkt(nad83), Some(4269));
        assert_eq!(epsg_from_wkt(wgs84), Some(4326));
    }

    #[test]
    fn projected_without_authority_is_unknown() {
        let wkt = r#"PROJCS["NAD_1983_UTM_Zone_16N",GEOGCS["GCS_North_American_1983",DATUM["D_North_American_1983",SPHEROID["GRS_1980",6378137.0,298.257222101]]],PROJECTION["Transverse_Mercator"]]"#;
        assert_eq!(epsg_from_wkt(wkt), None);
    }

    #[test]
    fn missing_prj_is_unknown() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(epsg_from_shapefile(&dir.path().join("blocks.shp")), None);

        std::fs::write(dir.path().join("tracts.prj"), r#"GEOGCS["GCS_WGS_1984"]"#).unwrap();
        assert_eq!(epsg_from_shapefile(&dir.path().join("tracts.shp")), Some(4326));
    }
}
