//! Behavioural scenarios for table assembly and export submission.

#[path = "common/test_constants.rs"]
mod test_constants;

use rstest::{fixture, rstest};
use zonal_export::expression::Value;
use zonal_export::test_support::RecordingBackend;
use zonal_export::{
    CombinedTable, EarthEngineConfig, ExportOrchestrator, ExportPlan, TableAssembler, Variable,
    YearRange,
};

use test_constants::{BOUNDARY_ASSET, POLYGONS};

#[fixture]
fn assembler() -> TableAssembler {
    TableAssembler::new(BOUNDARY_ASSET, "EPSG:4326")
}

fn parts(table: &CombinedTable) -> Vec<Value> {
    let Some(Value::Array(items)) = table
        .collection()
        .as_value()
        .argument("collection")
        .and_then(|inner| inner.argument("features"))
    else {
        panic!("combined table should flatten an array of parts");
    };
    items.clone()
}

fn reduce_regions(part: &Value) -> &Value {
    part.argument("collection")
        .unwrap_or_else(|| panic!("stamped part should map over reduceRegions"))
}

fn stamped(part: &Value, column: &str) -> Value {
    let Some(Value::Function { body, .. }) = part.argument("baseAlgorithm") else {
        panic!("stamped part should map a function over rows");
    };
    let Some(Value::Dictionary(properties)) = body.argument("properties") else {
        panic!("stamping function should set a property dictionary");
    };
    properties
        .get(column)
        .cloned()
        .unwrap_or_else(|| panic!("missing {column} column"))
}

#[rstest]
fn cropland_2021_reads_worldcover_at_30_metres(assembler: TableAssembler) {
    let table = assembler
        .assemble(Variable::Cropland, &YearRange::from(vec![2021]))
        .unwrap_or_else(|err| panic!("assemble: {err}"));

    let [part] = parts(&table).try_into().unwrap_or_else(|items: Vec<Value>| {
        panic!("expected a single part, got {}", items.len())
    });
    let reduction = reduce_regions(&part);

    assert_eq!(reduction.argument("scale"), Some(&Value::from(30_u32)));
    assert_eq!(reduction.argument("crs"), Some(&Value::string("EPSG:4326")));
    assert_eq!(
        reduction.argument("reducer"),
        Some(&Value::call("Reducer.sum").build())
    );
    assert!(reduction.invokes("Image.selfMask"));
    assert!(!reduction.invokes("ImageCollection.load"), "2021 is a single image");
    assert_eq!(stamped(&part, "year"), Value::integer(2021));
    assert_eq!(stamped(&part, "variable"), Value::string("cropland"));
    assert_eq!(table.expected_rows(POLYGONS), POLYGONS);
}

#[rstest]
fn builtup_epochs_yield_one_part_per_year(assembler: TableAssembler) {
    let table = assembler
        .assemble(Variable::Builtup, &YearRange::from(vec![2000, 2025]))
        .unwrap_or_else(|err| panic!("assemble: {err}"));
    let found = parts(&table);

    assert_eq!(found.len(), 2);
    assert_eq!(table.expected_rows(POLYGONS), 2 * POLYGONS);
    for (part, year) in found.iter().zip([2000_i64, 2025]) {
        let reduction = reduce_regions(part);
        let image = reduction
            .argument("image")
            .and_then(|select| select.argument("input"))
            .unwrap_or_else(|| panic!("built surface band selection"));
        assert_eq!(
            image.argument("id"),
            Some(&Value::string(format!("JRC/GHSL/P2023A/GHS_BUILT_S/{year}")))
        );
        assert_eq!(reduction.argument("scale"), Some(&Value::from(100_u32)));
        assert_eq!(stamped(part, "year"), Value::integer(year));
        assert_eq!(stamped(part, "variable"), Value::string("builtup"));
    }
}

#[tokio::test]
async fn default_run_queues_three_csv_exports_in_order() {
    let backend = RecordingBackend::new();
    let orchestrator = ExportOrchestrator::new(backend.clone(), EarthEngineConfig::default());

    let handles = orchestrator
        .execute(&ExportPlan::all())
        .await
        .unwrap_or_else(|err| panic!("execute: {err}"));

    let descriptions: Vec<&str> = handles
        .iter()
        .map(|handle| handle.description.as_str())
        .collect();
    assert_eq!(
        descriptions,
        [
            "Cropland_Punjab_Buffer_AllYears",
            "Builtup_Punjab_Buffer_AllYears",
            "Nightlight_Punjab_Buffer_AllYears"
        ]
    );

    for request in backend.submissions() {
        assert_eq!(request.folder, "GEE_exports");
        assert_eq!(request.file_format, "CSV");
        assert_eq!(request.table.years(), &request.variable().year_range());
    }
}

#[tokio::test]
async fn narrowed_plan_only_submits_selected_variable() {
    let backend = RecordingBackend::new();
    let orchestrator = ExportOrchestrator::new(backend.clone(), EarthEngineConfig::default());
    let plan = ExportPlan::for_variables(&[Variable::Nightlight])
        .with_years(&YearRange::inclusive(2012, 2014));

    let handles = orchestrator
        .execute(&plan)
        .await
        .unwrap_or_else(|err| panic!("execute: {err}"));

    assert_eq!(handles.len(), 1);
    let submissions = backend.submissions();
    let [request] = submissions.as_slice() else {
        panic!("expected one submission");
    };
    assert_eq!(request.file_name_prefix, "nightlight_punjab_buffer");
    assert_eq!(request.table.years().years(), &[2012, 2013, 2014]);
}
