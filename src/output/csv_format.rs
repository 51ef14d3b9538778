//! CSV output formatting.

use crate::report::ScanReport;
use std::io::{self, Write};

/// Print the report rows as CSV to stdout.
pub fn print_csv(report: &ScanReport) -> io::Result<()> {
    let stdout = io::stdout();
    write_csv(stdout.lock(), report)
}

pub fn write_csv<W: Write>(out: W, report: &ScanReport) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);

    wtr.write_record(["ip", "port", "state", "service", "error"])?;

    for entry in &report.results {
        wtr.write_record([
            report.ip_address.as_str(),
            &entry.port.to_string(),
            &entry.state.to_string(),
            &entry.service,
            entry.error.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::sample_report;

    #[test]
    fn test_csv_rows() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &sample_report()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ip,port,state,service,error");
        assert_eq!(lines[1], "10.0.0.1,22,open,SSH,");
        assert_eq!(lines[2], "10.0.0.1,25,error,SMTP,too many open files");
        assert_eq!(lines.len(), 4);
    }
}
