//! Product CSV import and export.
//!
//! Import is two-phase: [`parse_products`] validates every row up front and
//! splits the file into creatable products and row errors, then the caller
//! creates the valid products one by one and records the outcome of each in
//! an [`ImportReport`]. Created products are never rolled back.

use std::collections::HashMap;
use std::io::Read;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::catalog::{AdminProduct, NewProduct};
use crate::types::CategoryId;
use crate::validation::non_blank;

/// Column order of import files, exports and the template.
pub const PRODUCT_CSV_COLUMNS: [&str; 13] = [
    "name",
    "description",
    "price",
    "salePrice",
    "sku",
    "stock",
    "categoryId",
    "isActive",
    "isFeatured",
    "imageUrl",
    "metaTitle",
    "metaDescription",
    "slug",
];

/// Columns without which no row could ever be valid.
const REQUIRED_COLUMNS: [&str; 4] = ["name", "description", "price", "categoryId"];

/// Field name used for failures that are not tied to one column.
pub const GENERAL_FIELD: &str = "general";

/// Problems with the file as a whole.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV file has no data rows")]
    Empty,

    #[error("CSV file is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// A problem with one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRowError {
    /// Line in the file: the header is row 1, the first data row is row 2.
    pub row: usize,
    pub field: String,
    pub message: String,
    pub value: String,
}

impl ImportRowError {
    fn new(row: usize, field: &str, message: &str, value: &str) -> Self {
        Self {
            row,
            field: field.to_owned(),
            message: message.to_owned(),
            value: value.to_owned(),
        }
    }
}

/// A row that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    pub row: usize,
    pub product: NewProduct,
}

/// Outcome of validating a whole file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedImport {
    pub total_rows: usize,
    pub valid: Vec<ImportRow>,
    pub errors: Vec<ImportRowError>,
}

/// Final counts shown after an import.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub total_rows: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub errors: Vec<ImportRowError>,
}

impl ImportReport {
    /// Start a report from the validation pass; rows already rejected count
    /// as errors.
    #[must_use]
    pub fn from_parsed(parsed: &ParsedImport) -> Self {
        Self {
            total_rows: parsed.total_rows,
            success_count: 0,
            error_count: parsed.errors.len(),
            errors: parsed.errors.clone(),
        }
    }

    pub const fn record_created(&mut self) {
        self.success_count += 1;
    }

    /// The API refused to create the product on `row`.
    pub fn record_failure(&mut self, row: &ImportRow, message: &str) {
        self.errors.push(ImportRowError::new(
            row.row,
            GENERAL_FIELD,
            message,
            &row.product.name,
        ));
        self.error_count += 1;
    }

    #[must_use]
    pub const fn is_complete_success(&self) -> bool {
        self.error_count == 0 && self.success_count == self.total_rows
    }
}

struct Columns(HashMap<String, usize>);

impl Columns {
    fn new(headers: &csv::StringRecord) -> Self {
        Self(
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.trim_start_matches('\u{feff}').trim().to_owned(), i))
                .collect(),
        )
    }

    fn missing_required(&self) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .filter(|c| !self.0.contains_key(**c))
            .map(|c| (*c).to_owned())
            .collect()
    }

    fn value<'r>(&self, record: &'r csv::StringRecord, column: &str) -> &'r str {
        self.0
            .get(column)
            .and_then(|i| record.get(*i))
            .map_or("", str::trim)
    }
}

/// Read and validate a product CSV.
///
/// Columns are matched by header name in any order; unknown columns are
/// ignored. Quoted fields may contain commas, doubled quotes and newlines.
///
/// # Errors
///
/// Fails when the CSV cannot be read, has no data rows, or lacks one of the
/// required columns. Row-level problems are returned in
/// [`ParsedImport::errors`] instead.
pub fn parse_products(reader: impl Read) -> Result<ParsedImport, ImportError> {
    let mut csv = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = Columns::new(csv.headers()?);
    let missing = columns.missing_required();
    if !missing.is_empty() {
        return Err(ImportError::MissingColumns(missing));
    }

    let mut parsed = ParsedImport::default();
    for (index, record) in csv.records().enumerate() {
        let record = record?;
        let row = index + 2;
        parsed.total_rows += 1;
        match validate_row(&columns, &record, row) {
            Ok(product) => parsed.valid.push(ImportRow { row, product }),
            Err(errors) => parsed.errors.extend(errors),
        }
    }

    if parsed.total_rows == 0 {
        return Err(ImportError::Empty);
    }
    Ok(parsed)
}

fn validate_row(
    columns: &Columns,
    record: &csv::StringRecord,
    row: usize,
) -> Result<NewProduct, Vec<ImportRowError>> {
    let mut errors = Vec::new();
    let get = |column: &str| columns.value(record, column);

    let name = get("name");
    if name.is_empty() {
        errors.push(ImportRowError::new(row, "name", "Product name is required", name));
    }

    let description = get("description");
    if description.is_empty() {
        errors.push(ImportRowError::new(
            row,
            "description",
            "Product description is required",
            description,
        ));
    }

    let raw_price = get("price");
    let price = Decimal::from_str(raw_price)
        .ok()
        .filter(|p| *p > Decimal::ZERO);
    if price.is_none() {
        errors.push(ImportRowError::new(row, "price", "Valid price is required", raw_price));
    }

    let raw_category = get("categoryId");
    let category_id = raw_category.parse::<i32>().ok().filter(|id| *id > 0);
    if category_id.is_none() {
        errors.push(ImportRowError::new(
            row,
            "categoryId",
            "Valid category ID is required",
            raw_category,
        ));
    }

    let raw_stock = get("stock");
    let stock = if raw_stock.is_empty() {
        Some(0)
    } else {
        raw_stock.parse::<i32>().ok().filter(|s| *s >= 0)
    };
    if stock.is_none() {
        errors.push(ImportRowError::new(row, "stock", "Stock must be a valid number", raw_stock));
    }

    let raw_sale = get("salePrice");
    let sale_price = if raw_sale.is_empty() {
        Ok(None)
    } else {
        Decimal::from_str(raw_sale)
            .ok()
            .filter(|p| !p.is_sign_negative())
            .map(Some)
            .ok_or(())
    };
    if sale_price.is_err() {
        errors.push(ImportRowError::new(
            row,
            "salePrice",
            "Sale price must be a valid number",
            raw_sale,
        ));
    }

    match (price, category_id, stock, sale_price) {
        (Some(price), Some(category_id), Some(stock), Ok(sale_price)) if errors.is_empty() => {
            let image_url = non_blank(Some(get("imageUrl")));
            Ok(NewProduct {
                name: name.to_owned(),
                description: description.to_owned(),
                price,
                sale_price,
                sku: non_blank(Some(get("sku"))),
                stock,
                image_gallery: image_url.iter().cloned().collect(),
                image_url,
                category_id: CategoryId::new(category_id),
                is_active: parse_flag(get("isActive")),
                is_featured: parse_flag(get("isFeatured")),
                meta_title: non_blank(Some(get("metaTitle"))),
                meta_description: non_blank(Some(get("metaDescription"))),
                slug: non_blank(Some(get("slug"))),
            })
        }
        _ => Err(errors),
    }
}

/// Exactly `true` or `1`; blank and any other spelling are false.
fn parse_flag(value: &str) -> bool {
    value == "true" || value == "1"
}

fn write_csv(rows: impl IntoIterator<Item = [String; 13]>) -> Result<String, ImportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(PRODUCT_CSV_COLUMNS)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn opt(value: Option<&String>) -> String {
    value.cloned().unwrap_or_default()
}

/// Export products with the import columns, so the file can be edited and
/// imported again.
///
/// # Errors
///
/// Only fails if the CSV writer does.
pub fn export_products(products: &[AdminProduct]) -> Result<String, ImportError> {
    write_csv(products.iter().map(|p| {
        [
            p.name.clone(),
            p.description.clone(),
            p.price.to_string(),
            p.sale_price.map(|s| s.to_string()).unwrap_or_default(),
            opt(p.sku.as_ref()),
            p.stock.to_string(),
            p.category_id.to_string(),
            p.is_active.to_string(),
            p.is_featured.to_string(),
            opt(p.image_url.as_ref()),
            opt(p.meta_title.as_ref()),
            opt(p.meta_description.as_ref()),
            opt(p.slug.as_ref()),
        ]
    }))
}

/// Header plus one example row, offered as a download.
///
/// # Errors
///
/// Only fails if the CSV writer does.
pub fn template() -> Result<String, ImportError> {
    write_csv([[
        "Sample Product".to_owned(),
        "A great product description".to_owned(),
        "29.99".to_owned(),
        "24.99".to_owned(),
        "SKU001".to_owned(),
        "100".to_owned(),
        "5".to_owned(),
        "true".to_owned(),
        "false".to_owned(),
        "https://example.com/image1.jpg".to_owned(),
        "Sample Product - Buy Now".to_owned(),
        "Meta description for SEO".to_owned(),
        "sample-product".to_owned(),
    ]])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const HEADER: &str = "name,description,price,salePrice,sku,stock,categoryId,isActive,isFeatured,imageUrl,metaTitle,metaDescription,slug";

    fn parse(body: &str) -> ParsedImport {
        parse_products(format!("{HEADER}\n{body}").as_bytes()).unwrap()
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    #[test]
    fn test_all_valid_rows() {
        let parsed = parse(
            "Candle,Hand poured,12.50,,SKU1,4,2,true,false,,,,\n\
             Soap,\"Lavender, goat milk\",6,5,,,3,,1,,,,",
        );
        assert_eq!(parsed.total_rows, 2);
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.valid.len(), 2);

        let soap = &parsed.valid.get(1).unwrap().product;
        assert_eq!(soap.description, "Lavender, goat milk");
        assert_eq!(soap.stock, 0);
        assert!(!soap.is_active, "blank isActive is inactive");
        assert!(soap.is_featured);
    }

    #[test]
    fn test_flags_match_exact_spelling() {
        let parsed = parse(
            "Candle,Wax,10,,,,1,,,,,,\n\
             Soap,Lye,5,,,,1,TRUE,True,,,,\n\
             Lamp,Brass,30,,,,1,1,true,,,,",
        );
        let flags: Vec<(bool, bool)> = parsed
            .valid
            .iter()
            .map(|row| (row.product.is_active, row.product.is_featured))
            .collect();
        assert_eq!(flags, vec![(false, false), (false, false), (true, true)]);
    }

    #[test]
    fn test_invalid_rows_are_excluded_with_row_numbers() {
        let parsed = parse(
            "Candle,Hand poured,12.50,,,,2,,,,,,\n\
             ,missing name,5,,,,2,,,,,,\n\
             Mug,Stoneware,0,,,,2,,,,,,\n\
             Lamp,Brass,30,,,,x,,,,,,\n\
             Vase,,9,,,,1,,,,,,",
        );
        assert_eq!(parsed.total_rows, 5);
        assert_eq!(parsed.valid.len(), 1);
        assert_eq!(parsed.valid.first().unwrap().row, 2);

        let fields: Vec<_> = parsed
            .errors
            .iter()
            .map(|e| (e.row, e.field.as_str()))
            .collect();
        assert_eq!(
            fields,
            vec![(3, "name"), (4, "price"), (5, "categoryId"), (6, "description")]
        );
    }

    #[test]
    fn test_quoted_fields_with_quotes_and_newlines() {
        let parsed = parse("\"The \"\"Big\"\" Mug\",\"Line one\nLine two\",8,,,,1,,,,,,");
        let product = &parsed.valid.first().unwrap().product;
        assert_eq!(product.name, "The \"Big\" Mug");
        assert_eq!(product.description, "Line one\nLine two");
    }

    #[test]
    fn test_columns_matched_by_name() {
        let parsed = parse_products(
            "categoryId,price,extra,description,name\n7,3.5,ignored,Thing,Widget".as_bytes(),
        )
        .unwrap();
        let product = &parsed.valid.first().unwrap().product;
        assert_eq!(product.name, "Widget");
        assert_eq!(product.category_id, CategoryId::new(7));
    }

    #[test]
    fn test_negative_stock_and_sale_price() {
        let parsed = parse("Candle,Wax,10,-1,,-2,1,,,,,,");
        let fields: Vec<_> = parsed.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["stock", "salePrice"]);
    }

    #[test]
    fn test_file_level_errors() {
        assert!(matches!(
            parse_products(HEADER.as_bytes()),
            Err(ImportError::Empty)
        ));
        assert!(matches!(
            parse_products("name,price\nA,1".as_bytes()),
            Err(ImportError::MissingColumns(cols)) if cols == vec!["description", "categoryId"]
        ));
    }

    // =========================================================================
    // Report
    // =========================================================================

    #[test]
    fn test_report_counts() {
        let parsed = parse(
            "Candle,Wax,10,,,,1,,,,,,\n\
             Soap,Lye,5,,,,1,,,,,,\n\
             ,Nameless,5,,,,1,,,,,,",
        );
        let mut report = ImportReport::from_parsed(&parsed);
        report.record_created();
        report.record_failure(parsed.valid.get(1).unwrap(), "Duplicate SKU");

        assert_eq!(report.total_rows, 3);
        assert_eq!(report.success_count, 1);
        assert_eq!(report.error_count, 2);
        let general = report.errors.last().unwrap();
        assert_eq!(general.row, 3);
        assert_eq!(general.field, GENERAL_FIELD);
        assert_eq!(general.value, "Soap");
    }

    #[test]
    fn test_all_valid_report_is_complete() {
        let parsed = parse("Candle,Wax,10,,,,1,,,,,,");
        let mut report = ImportReport::from_parsed(&parsed);
        report.record_created();
        assert!(report.is_complete_success());
        assert_eq!(report.success_count, report.total_rows);
    }

    // =========================================================================
    // Export
    // =========================================================================

    #[test]
    fn test_template_reimports_cleanly() {
        let csv = template().unwrap();
        assert!(csv.starts_with(HEADER));
        let parsed = parse_products(csv.as_bytes()).unwrap();
        assert_eq!(parsed.valid.len(), 1);
        assert!(parsed.errors.is_empty());
    }
}
