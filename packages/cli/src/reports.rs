//! Reading and appending JSON dumps of reports.

use std::path::Path;

use baches_geography::ZoneClassifier;
use baches_report_models::ReportRecord;

/// Reads a JSON array of reports. Records whose zone does not match their
/// location are re-zoned.
pub fn read(
    path: &Path,
    classifier: &ZoneClassifier,
) -> Result<Vec<ReportRecord>, Box<dyn std::error::Error>> {
    log::debug!("Reading reports from {}", path.display());
    let contents = std::fs::read_to_string(path)?;
    let records: Vec<ReportRecord> = serde_json::from_str(&contents)?;

    let mut reports = Vec::with_capacity(records.len());
    for record in records {
        let id = record.id;
        let record = classifier
            .reconcile(record)
            .map_err(|e| format!("Report {id} in {}: {e}", path.display()))?;
        reports.push(record);
    }
    Ok(reports)
}

/// Appends `records` to the JSON array at `path`, creating the file if it
/// does not exist. Returns the number of reports now in the file.
///
/// The new contents go to a sibling temp file that is renamed over `path`.
pub fn append(
    path: &Path,
    records: &[ReportRecord],
    classifier: &ZoneClassifier,
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut all = if path.exists() {
        read(path, classifier)?
    } else {
        Vec::new()
    };
    all.extend_from_slice(records);

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    std::fs::write(&tmp, serde_json::to_string_pretty(&all)?)?;
    std::fs::rename(&tmp, path)?;
    Ok(all.len())
}
