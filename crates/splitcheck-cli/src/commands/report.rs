//! Split report commands

use std::path::Path;

use anyhow::Result;

use super::SessionFile;

const UNBUILDABLE: &str =
    "Unable to generate report. Please make sure orders are assigned to consumers.";

/// Report text for "split for all" mode
pub fn report_all_text(session: SessionFile) -> Result<Option<String>> {
    Ok(session.into_session()?.report_for_all())
}

/// Report text for "split for one" mode
pub fn report_one_text(session: SessionFile) -> Result<Option<String>> {
    Ok(session.into_session()?.report_for_one())
}

fn print_report(report: Option<String>) {
    match report {
        Some(text) => println!("{}", text),
        None => println!("{}", UNBUILDABLE),
    }
}

pub fn cmd_report_all(session_path: &Path) -> Result<()> {
    let session = SessionFile::load(session_path)?;
    print_report(report_all_text(session)?);
    Ok(())
}

pub fn cmd_report_one(session_path: &Path) -> Result<()> {
    let session = SessionFile::load(session_path)?;
    print_report(report_one_text(session)?);
    Ok(())
}
