//! Data-source collaboration: query texts, the executor seam, and a
//! CSV-speaking command delegate.
//!
//! The core never connects to the warehouse itself. It renders SQL, hands it
//! to a [`QueryExecutor`], and consumes the tabular result. Any executor
//! failure is fatal to the run; there is no retry.

use crate::error::ReportError;
use crate::model::{CellScalar, ResultSet};
use chrono::NaiveDate;
use std::io::Write;
use std::process::{Command, Stdio};

/// Executes one query and returns its tabular result.
pub trait QueryExecutor {
    fn execute(&self, query: &str) -> Result<ResultSet, ReportError>;
}

/// Extracts a display vendor name from query results: a `VENDOR_NAME` column
/// wins, then the name half of a `"NUMBER - NAME"` `VENDOR` column. Result
/// sets are consulted in order.
pub fn vendor_name_from(result_sets: &[ResultSet]) -> Option<String> {
    for result_set in result_sets {
        if let Some(idx) = result_set.column_index("VENDOR_NAME") {
            if let Some(name) = first_text(result_set, idx) {
                return Some(name);
            }
        }
        if let Some(idx) = result_set.column_index("VENDOR") {
            if let Some(combined) = first_text(result_set, idx) {
                let name = combined
                    .split_once(" - ")
                    .map(|(_, rest)| rest.trim().to_string())
                    .unwrap_or(combined);
                return Some(name);
            }
        }
    }
    None
}

fn first_text(result_set: &ResultSet, column: usize) -> Option<String> {
    result_set.rows().iter().find_map(|row| match row.get(column) {
        Some(CellScalar::Text(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

pub mod queries {
    //! The three report queries, rendered with caller-supplied filters. The
    //! vendor list, report-period token, and date-filter token are passed
    //! through opaquely.

    fn vendor_filter(vendor_numbers: &[String]) -> String {
        vendor_numbers.join("', '")
    }

    /// Per-vendor metric percentages plus the ASN success rate.
    pub fn summary_metrics(
        vendor_numbers: &[String],
        report_month: &str,
        date_filter: &str,
    ) -> String {
        let vendor_filter = vendor_filter(vendor_numbers);
        format!(
            r#"
WITH Metric_Data AS (
    SELECT
        RPT_MONTH,
        VENDOR_NUMBER,
        VENDOR_NAME,
        CASE
            WHEN METRIC LIKE 'First_Receipt_FR_B1D' THEN '1.Shipments_In_Full_1D'
            WHEN METRIC LIKE 'First_Receipt_FR_B28D' THEN '2.Inbound_Fill_Rate_28D'
            WHEN METRIC LIKE 'Units_On_Time_Complete' THEN '3.Units_On_Time_Complete'
        END AS MetricType,
        TO_CHAR((SUM(METRIC_NUMERATOR)/SUM(METRIC_DENOMINATOR)) * 100, 'FM999.9') || '%' AS Metric_Percentage
    FROM VENDOR_PERFORMANCE.COMBINED_IPR_IB_VENDOR_PERFORMANCE
    WHERE
        VENDOR_NUMBER IN ('{vendor_filter}')
        AND RPT_MONTH LIKE '{report_month}'
        AND METRIC IN ('First_Receipt_FR_B1D', 'First_Receipt_FR_B28D', 'Units_On_Time_Complete')
    GROUP BY RPT_MONTH, VENDOR_NUMBER, VENDOR_NAME, MetricType
),

ASN_Data AS (
    SELECT
        LTRIM(IH.LIFNR, 0) AS Vendor_Number,
        V.NAME1 AS Vendor_Name,
        TO_CHAR((TO_DATE(IH.ERDAT, 'YYYYMMDD')), '"FY"YYYY-MON') AS RPT_MONTH,
        CASE
            WHEN IH.VBELN LIKE '06%' AND IH.ERNAM IN ('BPAREMOTE', 'SCEBATCH', 'P2P_IDOC', 'P2PBATCH') THEN 'ASN'
            WHEN IH.VBELN LIKE '10%' THEN 'EGR'
            ELSE 'Manually Created'
        END AS Inbound_Type
    FROM EDP.STD_ECC.LIKP IH
    INNER JOIN EDP.STD_ECC.LFA1 V
        ON IH.MANDT = V.MANDT
        AND IH.LIFNR = V.LIFNR
    INNER JOIN EDP.STD_ECC.LIPS IL
        ON IH.MANDT = IL.MANDT
        AND IH.VBELN = IL.VBELN
    WHERE IH.MANDT = '300'
        AND IH.LFART = 'ZEL'
        AND LTRIM(IH.LIFNR, 0) IN ('{vendor_filter}')
        AND IH.ERDAT LIKE '{date_filter}%'
),

ASN_Metric AS (
    SELECT
        RPT_MONTH,
        Vendor_Number,
        Vendor_Name,
        '4.ASN_Success_Rate' AS MetricType,
        TO_CHAR(COUNT(CASE WHEN Inbound_Type = 'ASN' THEN 1 END) * 100.0 / COUNT(*), 'FM999.9') || '%' AS Metric_Percentage
    FROM ASN_Data
    GROUP BY RPT_MONTH, Vendor_Number, Vendor_Name
)

SELECT * FROM Metric_Data
UNION ALL
SELECT * FROM ASN_Metric
ORDER BY VENDOR_NUMBER, MetricType
"#
        )
    }

    /// Line-level metric detail joined with the latest receipt dates.
    pub fn basic_metrics(vendor_numbers: &[String], report_month: &str) -> String {
        let vendor_filter = vendor_filter(vendor_numbers);
        format!(
            r#"
WITH primary_metric AS (
    SELECT
        VENDOR_NUMBER,
        VENDOR_NAME,
        CONCAT(VENDOR_NUMBER, ' - ', VENDOR_NAME) AS VENDOR,
        PO_NUMBER,
        USN,
        ITEM_DESCRIPTION,
        CONCAT(PO_NUMBER, ':', USN) AS Metric_Concatenate,
        CONCAT(USN, ' - ', ITEM_DESCRIPTION) AS SKU,
        TO_DATE(DATE_ORIG_ORDERED) AS DATE_ORIG_ORDERED,
        TO_DATE(DATE_ORIG_PROMISED) AS DATE_ORIG_PROMISED,
        TO_DATE(DATE_FIRST_RECEIVED) AS DATE_FIRST_RECEIVED,
        WAREHOUSE_NUM,
        WAREHOUSE_NAME,
        CASE
            WHEN METRIC LIKE 'First_Receipt_FR_B1D' THEN 'Shipments_In_Full_1D'
            WHEN METRIC LIKE 'First_Receipt_FR_B28D' THEN 'Inbound_Fill_Rate_28D'
            WHEN METRIC LIKE 'Units_On_Time_Complete' THEN 'Units_On_Time_Complete'
        END AS MetricType,
        RPT_MONTH,
        METRIC_NUMERATOR,
        METRIC_DENOMINATOR,
        NETWORK
    FROM VENDOR_PERFORMANCE.COMBINED_IPR_IB_VENDOR_PERFORMANCE
    WHERE
        VENDOR_NUMBER IN ('{vendor_filter}')
        AND RPT_MONTH = '{report_month}'
        AND METRIC IN ('First_Receipt_FR_B1D', 'First_Receipt_FR_B28D', 'Units_On_Time_Complete')
),

hds_receipts AS (
    SELECT
        CONCAT(EBELN, ':', LTRIM(MATNR, '0')) AS Metric_Concatenate,
        MAX(TRY_TO_DATE(TO_CHAR(BUDAT), 'yyyymmdd')) AS receipt_date
    FROM EDP.STD_ECC.EKBE
    WHERE BWART IN ('101', '102')
    GROUP BY EBELN, MATNR
),

hdp_receipts AS (
    SELECT
        CONCAT(PO_NUMBER, ':', USN) AS Metric_Concatenate,
        MAX(TO_DATE(DATE_RECEIVED)) AS receipt_date
    FROM PRO_INVENTORY_ANALYTICS.REPORT_PURCHASE_ORDER_VISIBILITY_SHIPMENTS
    GROUP BY PO_NUMBER, USN
),

combined_receipts AS (
    SELECT
        Metric_Concatenate,
        MAX(receipt_date) AS receipt_date
    FROM (
        SELECT * FROM hds_receipts
        UNION ALL
        SELECT * FROM hdp_receipts
    ) all_receipts
    GROUP BY Metric_Concatenate
)

SELECT
    pm.RPT_MONTH AS Report_Month,
    pm.NETWORK,
    pm.VENDOR,
    pm.WAREHOUSE_NUM,
    pm.WAREHOUSE_NAME,
    pm.PO_NUMBER,
    pm.SKU,
    pm.DATE_ORIG_ORDERED AS Date_Ordered,
    pm.DATE_FIRST_RECEIVED,
    cr.receipt_date AS Date_Last_Received,
    pm.MetricType AS METRIC,
    ZEROIFNULL(pm.METRIC_NUMERATOR) AS Metric_Units_Received,
    pm.METRIC_DENOMINATOR AS Metric_Units_Ordered,
    CASE
        WHEN Metric_Units_Received < Metric_Units_Ordered THEN 'Non-Compliant'
        ELSE 'Compliant'
    END AS "Result"
FROM primary_metric pm
LEFT JOIN combined_receipts cr
    ON pm.Metric_Concatenate = cr.Metric_Concatenate
ORDER BY pm.VENDOR, pm.PO_NUMBER, pm.SKU
"#
        )
    }

    /// Inbound delivery detail with ASN/EGR/manual classification.
    pub fn asn_data(vendor_numbers: &[String], date_filter: &str) -> String {
        let vendor_filter = vendor_filter(vendor_numbers);
        format!(
            r#"
SELECT
    CASE
        WHEN IH.VBELN LIKE '06%' AND IH.ERNAM IN ('BPAREMOTE', 'SCEBATCH', 'P2P_IDOC', 'P2PBATCH') THEN 'ASN'
        WHEN IH.VBELN LIKE '10%' THEN 'EGR'
        ELSE 'Manually Created'
    END AS Inbound_Type,
    V.NAME1 AS Vendor_Name,
    LTRIM(IH.LIFNR, 0) AS Vendor_Number,
    TO_DATE(IH.ERDAT, 'YYYYMMDD') AS Create_Date,
    IH.VSTEL AS DC,
    ZUKRL AS PO_Number,
    LTRIM(IL.MATNR, 0) AS Material_Number,
    IL.ARKTX AS Material_Description,
    IL.LFIMG AS Quantity,
    IL.MEINS AS Unit_of_Measure,
    LTRIM(IH.VBELN, 0) AS Delivery_Number,
    LIFEX AS Supplier_Provided_ID,
    ZCARRIER_T AS Carrier_Name,
    BOLNR AS Provided_BOL
FROM EDP.STD_ECC.LIKP IH
INNER JOIN EDP.STD_ECC.LIPS IL
    ON IH.MANDT = IL.MANDT
    AND IH.VBELN = IL.VBELN
INNER JOIN EDP.STD_ECC.LFA1 V
    ON IH.MANDT = V.MANDT
    AND IH.LIFNR = V.LIFNR
WHERE IH.MANDT = '300'
    AND IH.LFART = 'ZEL'
    AND LTRIM(IH.LIFNR, 0) IN ('{vendor_filter}')
    AND IH.ERDAT LIKE '{date_filter}%'
ORDER BY IH.ERDAT DESC, V.NAME1, ZUKRL
"#
        )
    }
}

/// Delegates query execution to an external database client command.
///
/// The query text is written to the child's stdin; the child is expected to
/// print the result as CSV (header row first) on stdout. A spawn failure is
/// a connectivity error, a non-zero exit a query error.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    program: String,
    args: Vec<String>,
}

impl CommandExecutor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Builds an executor from a configured command line, e.g.
    /// `["snowsql", "-o", "output_format=csv", "-q"]`.
    pub fn from_command_line(command: &[String]) -> Result<Self, ReportError> {
        match command.split_first() {
            Some((program, args)) => Ok(Self::new(program.clone(), args.to_vec())),
            None => Err(ReportError::InvalidInput(
                "query command is not configured".to_string(),
            )),
        }
    }
}

impl QueryExecutor for CommandExecutor {
    fn execute(&self, query: &str) -> Result<ResultSet, ReportError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ReportError::Connectivity(format!(
                    "failed to launch query command {:?}: {e}",
                    self.program
                ))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(query.as_bytes()).map_err(|e| {
                ReportError::Connectivity(format!("failed to send query to client: {e}"))
            })?;
        }

        let output = child.wait_with_output().map_err(|e| {
            ReportError::Connectivity(format!("query command did not complete: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReportError::Query(format!(
                "query command exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        parse_csv_result(&output.stdout)
    }
}

/// Parses CSV (header row first) into a result set, inferring scalar types
/// per field.
pub fn parse_csv_result(bytes: &[u8]) -> Result<ResultSet, ReportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| ReportError::Query(format!("malformed CSV header: {e}")))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ReportError::Query(format!("malformed CSV row: {e}")))?;
        rows.push(record.iter().map(infer_scalar).collect());
    }

    ResultSet::new("query", columns, rows)
        .map_err(|e| ReportError::Query(format!("inconsistent result shape: {e}")))
}

/// Best-effort typing of a CSV field: empty is null, then number, boolean,
/// ISO date, and finally plain text.
fn infer_scalar(field: &str) -> CellScalar {
    if field.is_empty() {
        return CellScalar::Null;
    }
    if let Ok(number) = field.parse::<f64>() {
        return CellScalar::Number(number);
    }
    match field.to_ascii_lowercase().as_str() {
        "true" => return CellScalar::Bool(true),
        "false" => return CellScalar::Bool(false),
        _ => {}
    }
    if let Ok(date) = NaiveDate::parse_from_str(field, "%Y-%m-%d") {
        return CellScalar::Date(date);
    }
    CellScalar::Text(field.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_fields_are_typed() {
        assert_eq!(infer_scalar(""), CellScalar::Null);
        assert_eq!(infer_scalar("12.5"), CellScalar::Number(12.5));
        assert_eq!(infer_scalar("TRUE"), CellScalar::Bool(true));
        assert_eq!(
            infer_scalar("2025-04-30"),
            CellScalar::Date(NaiveDate::from_ymd_opt(2025, 4, 30).unwrap())
        );
        assert_eq!(
            infer_scalar("94.1%"),
            CellScalar::Text("94.1%".to_string())
        );
    }

    #[test]
    fn csv_parse_builds_result_set() {
        let data = b"VENDOR_NAME,Quantity,Create_Date\nAcme,3,2025-04-01\nAcme,,2025-04-02\n";
        let result = parse_csv_result(data).expect("parse");
        assert_eq!(result.column_count(), 3);
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.rows()[1][1], CellScalar::Null);
    }

    #[test]
    fn vendor_name_prefers_dedicated_column() {
        let with_name = ResultSet::new(
            "Summary_Metrics",
            vec!["VENDOR_NAME".into(), "X".into()],
            vec![vec![CellScalar::Text("Acme Tools".into()), CellScalar::Null]],
        )
        .unwrap();
        assert_eq!(
            vendor_name_from(&[with_name]),
            Some("Acme Tools".to_string())
        );

        let combined = ResultSet::new(
            "Basic_Metrics",
            vec!["VENDOR".into()],
            vec![vec![CellScalar::Text("12345 - Acme Tools".into())]],
        )
        .unwrap();
        assert_eq!(
            vendor_name_from(&[combined]),
            Some("Acme Tools".to_string())
        );
    }

    #[test]
    fn queries_interpolate_filters() {
        let vendors = vec!["12345".to_string(), "67890".to_string()];
        let sql = queries::basic_metrics(&vendors, "FY2025-APR");
        assert!(sql.contains("VENDOR_NUMBER IN ('12345', '67890')"));
        assert!(sql.contains("RPT_MONTH = 'FY2025-APR'"));

        let asn = queries::asn_data(&vendors, "202504");
        assert!(asn.contains("IH.ERDAT LIKE '202504%'"));
    }
}
