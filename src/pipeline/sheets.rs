use anyhow::Result;

use super::clean::clean;
use crate::models::{Table, Value};

/// System/audit columns excluded from every sheet regardless of content.
pub const OMITTED_COLUMNS: &[&str] = &[
    "SysCreatedDate",
    "SysTimeStamp",
    "SysRecStatus",
    "SysCreatedBy",
    "BorrowerF",
    "CompanyF",
    "SortName",
    "ByLastName",
    "FundControl",
    "ACH_IndividualId",
    "XML",
    "LanguagePreference",
    "InsuranceDocument",
];

pub const PROPERTIES_QUERY: &str = "SELECT l.Account, p.RecID AS _pid, p.* \
     FROM [TDS Properties] p \
     LEFT JOIN [TDS Loans] l ON p.LoanRecID = l.RecID";

pub const INSURANCE_QUERY: &str = "SELECT * FROM [TDS Insurance]";

pub enum SheetSource {
    /// One fixed query, cleaned as-is.
    Query(&'static str),
    /// The merged properties + insurance sheet; see
    /// [`merge_properties_insurance`].
    PropertiesInsurance,
}

pub struct SheetDef {
    pub label: &'static str,
    pub source: SheetSource,
    pub post: Option<fn(Table) -> Table>,
    pub mapping_url: Option<&'static str>,
}

/// The full sheet set, in export order. Adding or removing a sheet is a
/// change to this table, not to the pipeline.
pub const SHEETS: &[SheetDef] = &[
    SheetDef {
        label: "1-Loans",
        source: SheetSource::Query("SELECT * FROM [TDS Loans]"),
        post: Some(append_balance_columns),
        mapping_url: Some("https://help.themortgageoffice.com/knowledge/loan-field-mappings"),
    },
    SheetDef {
        label: "2-Co-Borrowers",
        source: SheetSource::Query(
            "SELECT l.Account, t.* FROM [TDS CoBorrowers] t \
             LEFT JOIN [TDS Loans] l ON t.LoanRecID = l.RecID",
        ),
        post: None,
        mapping_url: Some(
            "https://help.themortgageoffice.com/knowledge/co-borrower-field-mappings",
        ),
    },
    SheetDef {
        label: "3-Fundings",
        source: SheetSource::Query(
            "SELECT l.Account AS Loan_Account, lend.Account AS Lender_Account, f.*, d.* \
             FROM [TDS Funding] f \
             INNER JOIN [TDS Draws] d ON f.RecID = d.FundingRecID \
             LEFT JOIN [TDS Loans] l ON f.LoanRecID = l.RecID \
             LEFT JOIN [TDS Lenders] lend ON f.LenderRecID = lend.RecID",
        ),
        post: Some(normalize_funding_columns),
        mapping_url: Some(
            "https://help.themortgageoffice.com/knowledge/what-are-the-vendor-field-mappings",
        ),
    },
    SheetDef {
        label: "4-Properties_&_Insurance",
        source: SheetSource::PropertiesInsurance,
        post: None,
        mapping_url: Some(
            "https://help.themortgageoffice.com/knowledge/what-are-the-properties-insurance-field-mappings",
        ),
    },
    SheetDef {
        label: "5-Escrow_Vouchers",
        source: SheetSource::Query(
            "SELECT l.Account, t.* FROM [TDS Vouchers] t \
             LEFT JOIN [TDS Loans] l ON t.LoanRecID = l.RecID",
        ),
        post: Some(rename_escrow_account),
        mapping_url: None,
    },
    SheetDef {
        label: "6-Loan_History",
        source: SheetSource::Query(
            "SELECT l.Account, t.* FROM [TDS Loan History] t \
             LEFT JOIN [TDS Loans] l ON t.LoanRecID = l.RecID",
        ),
        post: None,
        mapping_url: None,
    },
];

/// The loans sheet carries two balance columns the servicing team fills in
/// by hand after the export.
fn append_balance_columns(mut table: Table) -> Table {
    let blanks = vec![Value::Text(String::new()); table.row_count()];
    // lengths match by construction
    let _ = table.push_column("ReserveBalance", blanks.clone());
    let _ = table.push_column("ImpoundBalance", blanks);
    table
}

/// Rate columns come back from the funding join as e.g. `LateChargePct`,
/// `WireFeeFlat`, `ServicingMin`; normalize the suffix into `_Pct`/`_Flat`/
/// `_Min` and put the two account columns first.
fn normalize_funding_columns(mut table: Table) -> Table {
    for name in &mut table.columns {
        for suffix in ["Pct", "Flat", "Min"] {
            let normalized = format!("_{suffix}");
            if name.ends_with(suffix) && !name.ends_with(&normalized) {
                let stem = &name[..name.len() - suffix.len()];
                if !stem.is_empty() {
                    let renamed = format!("{stem}{normalized}");
                    *name = renamed;
                }
                break;
            }
        }
    }
    table.move_to_front("Lender_Account");
    table.move_to_front("Loan_Account");
    table
}

fn rename_escrow_account(mut table: Table) -> Table {
    table.rename_column("Account", "Loan Account");
    table
}

/// Builds the merged properties + insurance sheet from the two raw query
/// results. Each side is cleaned independently and prefixed with its
/// entity label; insurance rows are then left-joined onto properties via
/// the property record id, which is dropped from the output. A property
/// with N matching policies expands to N rows; one with none keeps a
/// single row with empty insurance columns.
pub fn merge_properties_insurance(properties: &Table, insurance: &Table) -> Result<Table> {
    let account = properties.column_values("Account")?;
    let property_ids = properties.column_values("_pid")?;

    let mut left = clean(
        &properties.without_columns(&["Account", "_pid"]),
        OMITTED_COLUMNS,
    );
    left.prefix_columns("Property: ");
    left.push_column("Account", account)?;
    left.push_column("_pid", property_ids)?;

    let policy_refs = insurance.column_values("PropRecID")?;
    let mut right = clean(insurance, OMITTED_COLUMNS);
    right.prefix_columns("Insurance: ");
    right.push_column("_pref", policy_refs)?;

    let mut merged = left.left_join(&right, "_pid", "_pref")?;
    merged.drop_columns(&["_pid", "_pref"]);
    merged.move_to_front("Account");
    Ok(merged)
}
