// src/formatting.rs

use crate::certs::CertificateResultSet;
use crate::config::OutputFormat;
use crate::core::CertificateRecord;

const CERTIFICATE_HEADERS: [&str; 6] = [
    "Logged At",
    "Not Before",
    "Not After",
    "Common Name",
    "Matching Identities",
    "Issuer Name",
];

/// A trait for rendering lookup results for the terminal.
pub trait ResultFormatter: Send + Sync {
    fn format_certificates(&self, certificates: &CertificateResultSet) -> String;
    fn format_domains(&self, domains: &[String]) -> String;
}

/// Returns the formatter for the configured output format.
pub fn formatter_for(format: OutputFormat) -> Box<dyn ResultFormatter> {
    match format {
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::PlainText => Box::new(PlainTextFormatter),
    }
}

/// Tab-separated columns with a header row.
pub struct PlainTextFormatter;

impl PlainTextFormatter {
    fn format_line(&self, record: &CertificateRecord) -> String {
        let identities = record.identities().join(", ");
        [
            record.entry_timestamp.as_str(),
            record.not_before.as_str(),
            record.not_after.as_str(),
            record.common_name.as_str(),
            identities.as_str(),
            record.issuer_name.as_str(),
        ]
        .join("\t")
    }
}

impl ResultFormatter for PlainTextFormatter {
    fn format_certificates(&self, certificates: &CertificateResultSet) -> String {
        if certificates.is_empty() {
            return "No issued certificates found!".to_string();
        }

        let mut lines = vec![CERTIFICATE_HEADERS.join("\t")];
        lines.extend(certificates.iter().map(|record| self.format_line(record)));
        lines.join("\n")
    }

    fn format_domains(&self, domains: &[String]) -> String {
        if domains.is_empty() {
            return "No domains found.".to_string();
        }
        domains.join("\n")
    }
}

/// Pretty-printed JSON, matching the HTTP API's payloads.
pub struct JsonFormatter;

impl ResultFormatter for JsonFormatter {
    fn format_certificates(&self, certificates: &CertificateResultSet) -> String {
        serde_json::to_string_pretty(certificates).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_domains(&self, domains: &[String]) -> String {
        serde_json::to_string_pretty(domains).unwrap_or_else(|_| "[]".to_string())
    }
}
