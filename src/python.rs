use crate::autodetect::{AlwaysConfirm, ChangeDetector, NeverConfirm};
use crate::plan::MigrationPlan;
use crate::schema::BlockDef;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use serde_json::Value;

fn value_error(e: impl ToString) -> PyErr {
    PyErr::new::<PyValueError, _>(e.to_string())
}

/// Applies a migration plan to stored block trees.
///
/// The schema and plan are parsed once on construction; `apply` can then be
/// called for every stored value that needs migrating.
#[pyclass(name = "StreamMigrator")]
struct StreamMigratorPy {
    schema: BlockDef,
    plan: MigrationPlan,
}

#[pymethods]
impl StreamMigratorPy {
    /// Args:
    ///     schema_json (str): The schema the stored data conforms to, as
    ///         block definition JSON.
    ///     plan_json (str): The migration plan, as produced by
    ///         `detect_changes` or `henka-cli detect`.
    ///
    /// Raises:
    ///     ValueError: If either JSON document is malformed.
    #[new]
    fn new(schema_json: &str, plan_json: &str) -> PyResult<Self> {
        let schema = BlockDef::from_json(schema_json).map_err(value_error)?;
        let plan = MigrationPlan::from_json(plan_json).map_err(value_error)?;
        Ok(StreamMigratorPy { schema, plan })
    }

    /// Migrates one stored value and returns the rewritten JSON.
    ///
    /// Raises:
    ///     ValueError: If the data is not valid JSON or does not match the
    ///         schema along a plan path.
    fn apply(&self, raw_json: &str) -> PyResult<String> {
        let raw: Value = serde_json::from_str(raw_json).map_err(value_error)?;
        let migrated = self.plan.apply(raw, &self.schema).map_err(value_error)?;
        serde_json::to_string(&migrated).map_err(value_error)
    }

    fn __len__(&self) -> usize {
        self.plan.len()
    }
}

/// Compares two schema versions and returns the migration plan as JSON.
///
/// With `assume_yes` every ambiguous rename and every removal is accepted;
/// otherwise only confident renames are recorded.
#[pyfunction]
#[pyo3(signature = (old_schema_json, new_schema_json, assume_yes = false))]
fn detect_changes(
    old_schema_json: &str,
    new_schema_json: &str,
    assume_yes: bool,
) -> PyResult<String> {
    let old = BlockDef::from_json(old_schema_json).map_err(value_error)?;
    let new = BlockDef::from_json(new_schema_json).map_err(value_error)?;
    let plan = if assume_yes {
        ChangeDetector::new(AlwaysConfirm).detect(&old, &new)
    } else {
        ChangeDetector::new(NeverConfirm).detect(&old, &new)
    }
    .map_err(value_error)?;
    plan.to_json().map_err(value_error)
}

/// Block-tree data migrations.
#[pymodule]
fn henka(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<StreamMigratorPy>()?;
    m.add_function(wrap_pyfunction!(detect_changes, m)?)?;
    Ok(())
}
