use polars::prelude::*;
use tracing::info;

use crate::{
    assign::{assign, Assignment},
    error::{Error, Result},
    layer::{Layer, ID_COLUMN},
};

const TARGET_ROW: &str = "__target_row";
const ROW: &str = "__row";

/// Integer attributes are summed as Int64, float attributes as Float64.
fn sum_dtype(dtype: &DataType) -> Option<DataType> {
    if dtype.is_integer() {
        Some(DataType::Int64)
    } else if dtype.is_float() {
        Some(DataType::Float64)
    } else {
        None
    }
}

/// Resolve requested attributes against the source layer, dropping repeated names.
fn check_attributes<'a>(target: &Layer, source: &Layer, attributes: &[&'a str]) -> Result<Vec<(&'a str, DataType)>> {
    let mut resolved: Vec<(&str, DataType)> = Vec::with_capacity(attributes.len());
    for &name in attributes {
        if resolved.iter().any(|(seen, _)| *seen == name) { continue }
        if name == ID_COLUMN {
            return Err(Error::InvalidLayer(format!("layer {:?}: {ID_COLUMN:?} is reserved", target.name())));
        }
        let column = source.column(name).ok_or_else(|| Error::MissingAttribute {
            attribute: name.to_string(),
            layer: source.name().to_string(),
        })?;
        let dtype = sum_dtype(column.dtype()).ok_or_else(|| Error::NonNumericAttribute {
            attribute: name.to_string(),
            layer: source.name().to_string(),
        })?;
        resolved.push((name, dtype));
    }
    Ok(resolved)
}

/// Sum source attributes into the target rows they are assigned to.
///
/// Returns a copy of `target` with one column per attribute (overwriting same-named columns).
/// Targets with no assigned rows get zero; unassigned source rows are dropped from every sum.
/// Every attribute is validated before anything is computed, so a failure writes nothing.
pub fn aggregate(target: &Layer, source: &Layer, assignment: &Assignment, attributes: &[&str]) -> Result<Layer> {
    assignment.validate(source, target)?;
    let attributes = check_attributes(target, source, attributes)?;
    if attributes.is_empty() { return Ok(target.clone()) }

    // Source rows tagged with their target row (null = unassigned).
    let mut columns = vec![Column::new(TARGET_ROW.into(), assignment.as_slice())];
    for (name, _) in &attributes {
        columns.push(source.data().column(name)?.clone());
    }
    let tagged = DataFrame::new(columns)?;

    let sums = tagged.lazy()
        .filter(col(TARGET_ROW).is_not_null())
        .group_by([col(TARGET_ROW)])
        .agg(attributes.iter()
            .map(|(name, dtype)| col(*name).cast(dtype.clone()).sum().alias(*name))
            .collect::<Vec<_>>());

    // Left join every target row so that rows without sources get zero instead of null.
    let rows = DataFrame::new(vec![Column::new(ROW.into(), (0..target.len() as u32).collect::<Vec<_>>())])?;
    let filled = rows.lazy()
        .join(sums, [col(ROW)], [col(TARGET_ROW)], JoinArgs::new(JoinType::Left))
        .with_columns(attributes.iter()
            .map(|(name, dtype)| col(*name).fill_null(lit(0)).cast(dtype.clone()).alias(*name))
            .collect::<Vec<_>>())
        .sort([ROW], SortMultipleOptions::default())
        .collect()?;

    let mut enriched = target.clone();
    for (name, _) in &attributes {
        enriched.set_column(filled.column(name)?.clone())?;
    }

    info!(
        source = source.name(),
        target = target.name(),
        attributes = attributes.len(),
        dropped_rows = assignment.num_unassigned(),
        "aggregated attributes",
    );

    Ok(enriched)
}

/// Assign population and VAP attributes from two (possibly different) block layers onto `target`.
///
/// Each source layer gets its own assignment. Returns the enriched target; on error
/// nothing is written.
pub fn assign_population_data(
    target: &Layer,
    population: &Layer,
    vap: &Layer,
    pop_columns: &[&str],
    vap_columns: &[&str],
) -> Result<Layer> {
    check_attributes(target, population, pop_columns)?;
    check_attributes(target, vap, vap_columns)?;

    let pop_assignment = assign(population, target)?;
    let vap_assignment = assign(vap, target)?;

    let enriched = aggregate(target, population, &pop_assignment, pop_columns)?;
    aggregate(&enriched, vap, &vap_assignment, vap_columns)
}

#[cfg(test)]
mod tests {
    use geo::{point, Coord, Geometry, Rect};

    use super::*;

    fn squares() -> Layer {
        Layer::new("precincts", vec!["p0".into(), "p1".into()], vec![
            Geometry::Rect(Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 })),
            Geometry::Rect(Rect::new(Coord { x: 1.0, y: 0.0 }, Coord { x: 2.0, y: 1.0 })),
        ], None).unwrap()
    }

    fn blocks(points: &[(f64, f64)], pop: &[i64]) -> Layer {
        Layer::new(
            "blocks",
            (0..points.len()).map(|i| format!("b{i}")).collect(),
            points.iter().map(|&(x, y)| Geometry::Point(point!(x: x, y: y))).collect(),
            None,
        ).unwrap()
            .with_column(Column::new("POP".into(), pop)).unwrap()
    }

    fn i64_column(layer: &Layer, name: &str) -> Vec<i64> {
        layer.column(name).unwrap().i64().unwrap().into_no_null_iter().collect()
    }

    #[test]
    fn sums_assigned_rows_and_zero_fills() {
        let target = squares();
        let source = blocks(&[(0.5, 0.5), (0.2, 0.2), (9.0, 9.0)], &[3, 4, 100]);
        let assignment = Assignment::new(vec![Some(0), Some(0), None]);

        let enriched = aggregate(&target, &source, &assignment, &["POP"]).unwrap();
        assert_eq!(i64_column(&enriched, "POP"), vec![7, 0]);
        // the input layer is untouched
        assert!(target.column("POP").is_none());
    }

    #[test]
    fn float_attributes_stay_float() {
        let target = squares();
        let source = blocks(&[(0.5, 0.5), (1.5, 0.5)], &[1, 2])
            .with_column(Column::new("AREA".into(), &[0.25f64, 0.5])).unwrap();
        let assignment = Assignment::new(vec![Some(1), Some(1)]);

        let enriched = aggregate(&target, &source, &assignment, &["AREA"]).unwrap();
        let area = enriched.column("AREA").unwrap().f64().unwrap().into_no_null_iter().collect::<Vec<_>>();
        assert_eq!(area, vec![0.0, 0.75]);
    }

    #[test]
    fn non_numeric_attribute_is_rejected() {
        let source = blocks(&[(0.5, 0.5)], &[1])
            .with_column(Column::new("NAME".into(), &["x"])).unwrap();
        let err = aggregate(&squares(), &source, &Assignment::new(vec![Some(0)]), &["NAME"]).unwrap_err();
        assert!(matches!(err, Error::NonNumericAttribute { attribute, .. } if attribute == "NAME"));
    }

    #[test]
    fn reserved_id_column_is_rejected() {
        let source = blocks(&[(0.5, 0.5)], &[1]);
        let err = aggregate(&squares(), &source, &Assignment::new(vec![Some(0)]), &[ID_COLUMN]).unwrap_err();
        assert!(matches!(err, Error::InvalidLayer(_)));
    }

    #[test]
    fn repeated_attribute_names_are_summed_once() {
        let source = blocks(&[(0.5, 0.5), (1.5, 0.5)], &[5, 6]);
        let enriched = aggregate(&squares(), &source, &Assignment::new(vec![Some(0), Some(1)]), &["POP", "POP"]).unwrap();
        assert_eq!(i64_column(&enriched, "POP"), vec![5, 6]);
    }

    #[test]
    fn foreign_assignment_is_rejected() {
        let source = blocks(&[(0.5, 0.5)], &[1]);
        let err = aggregate(&squares(), &source, &Assignment::new(vec![Some(0), Some(1)]), &["POP"]).unwrap_err();
        assert!(matches!(err, Error::GeometryMismatch(_)));
    }
}
