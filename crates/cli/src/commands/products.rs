//! Product CSV commands.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::{error, info, warn};

use segishop_admin::services::ProductImportService;
use segishop_core::import::{
    ImportReport, ImportRowError, export_products, parse_products, template as import_template,
};

use super::{CliError, client, write_output};

/// Check a file offline and log every row error.
///
/// # Errors
///
/// Fails when the file cannot be parsed at all, or when any row is invalid.
pub fn validate(path: &Path) -> Result<(), CliError> {
    let parsed = parse_products(BufReader::new(File::open(path)?))?;

    info!(
        path = %path.display(),
        rows = parsed.total_rows,
        valid = parsed.valid.len(),
        invalid = parsed.errors.len(),
        "Validated import file"
    );
    log_row_errors(&parsed.errors);

    if parsed.errors.is_empty() {
        Ok(())
    } else {
        Err(CliError::Incomplete(format!(
            "{} of {} rows have errors",
            row_count(&parsed.errors),
            parsed.total_rows
        )))
    }
}

/// Import every valid row and log the report.
///
/// # Errors
///
/// Fails on configuration or file errors, and when any row was not created.
pub async fn import(path: &Path) -> Result<(), CliError> {
    let api = client()?;
    let file = BufReader::new(File::open(path)?);
    let report = ProductImportService::new(&api).import(file).await?;
    log_row_errors(&report.errors);
    summary(&report).map_or(Ok(()), |message| Err(CliError::Incomplete(message)))
}

/// Export the whole catalog as CSV.
///
/// # Errors
///
/// Fails on configuration, API or write errors.
pub async fn export(output: Option<&Path>) -> Result<(), CliError> {
    let api = client()?;
    let products = ProductImportService::new(&api).fetch_all().await?;
    let body = export_products(&products)?;
    info!(count = products.len(), "Products exported");
    write_output(output, &body)
}

/// Write the import template.
///
/// # Errors
///
/// Fails when the template cannot be written.
pub fn template(output: Option<&Path>) -> Result<(), CliError> {
    write_output(output, &import_template()?)
}

/// Distinct rows among `errors`; one row can fail several fields.
fn row_count(errors: &[ImportRowError]) -> usize {
    errors.iter().map(|e| e.row).collect::<BTreeSet<_>>().len()
}

fn log_row_errors(errors: &[ImportRowError]) {
    for e in errors {
        warn!(row = e.row, field = %e.field, value = %e.value, "{}", e.message);
    }
}

/// `None` when every row was created, otherwise the failure line.
fn summary(report: &ImportReport) -> Option<String> {
    info!(
        total = report.total_rows,
        created = report.success_count,
        failed = report.error_count,
        "Import finished"
    );
    if report.error_count == 0 {
        return None;
    }
    error!("{} rows were not imported", row_count(&report.errors));
    Some(format!(
        "imported {} of {} rows",
        report.success_count, report.total_rows
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row_error(row: usize, field: &str) -> ImportRowError {
        ImportRowError {
            row,
            field: field.to_string(),
            message: "bad".to_string(),
            value: String::new(),
        }
    }

    #[test]
    fn test_row_count_merges_fields_of_one_row() {
        let errors = vec![row_error(2, "name"), row_error(5, "stock"), row_error(2, "general")];
        assert_eq!(row_count(&errors), 2);
        assert_eq!(row_count(&[]), 0);
    }

    #[test]
    fn test_summary_only_on_failures() {
        let clean = ImportReport {
            total_rows: 3,
            success_count: 3,
            error_count: 0,
            errors: Vec::new(),
        };
        assert_eq!(summary(&clean), None);

        let partial = ImportReport {
            total_rows: 3,
            success_count: 2,
            error_count: 1,
            errors: vec![row_error(3, "general")],
        };
        assert_eq!(summary(&partial).as_deref(), Some("imported 2 of 3 rows"));
    }

    #[test]
    fn test_validate_missing_file_is_io_error() {
        let err = validate(Path::new("/nonexistent/segishop-import.csv")).unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }
}
