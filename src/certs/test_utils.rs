use crate::{
    certs::CertificateError,
    core::{CertificateRecord, CertificateSource},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Fake certificate source for testing
#[derive(Default)]
pub struct FakeCertificateSource {
    responses: Arc<Mutex<HashMap<String, Result<Vec<CertificateRecord>, String>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeCertificateSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer queries for `identity` with `records`
    pub fn set_records(&self, identity: &str, records: Vec<CertificateRecord>) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(identity.to_string(), Ok(records));
    }

    /// Fail queries for `identity`
    pub fn set_error(&self, identity: &str, error: &str) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(identity.to_string(), Err(error.to_string()));
    }

    /// Every identity queried so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CertificateSource for FakeCertificateSource {
    async fn query(&self, identity: &str) -> Result<Vec<CertificateRecord>, CertificateError> {
        self.calls.lock().unwrap().push(identity.to_string());

        let responses = self.responses.lock().unwrap();
        match responses.get(identity) {
            Some(Ok(records)) => Ok(records.clone()),
            Some(Err(error)) => Err(CertificateError::Status {
                status: 500,
                body: error.clone(),
            }),
            None => Ok(Vec::new()),
        }
    }
}

/// Builds a record with the fields the aggregation logic looks at.
pub fn certificate(id: u64, common_name: &str, entry_timestamp: &str) -> CertificateRecord {
    CertificateRecord {
        id,
        issuer_ca_id: Some(1),
        issuer_name: "C=US, O=Let's Encrypt, CN=R3".to_string(),
        common_name: common_name.to_string(),
        name_value: common_name.to_string(),
        entry_timestamp: entry_timestamp.to_string(),
        not_before: entry_timestamp.to_string(),
        not_after: entry_timestamp.to_string(),
        serial_number: None,
    }
}
