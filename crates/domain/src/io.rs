use serde::{Deserialize, Serialize};

use crate::{error::DomainError, session::Session};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExportFormat {
    Midi,
    Json,
}

pub trait SessionExporter {
    fn export(&self, session: &Session, format: ExportFormat) -> Result<Vec<u8>, DomainError>;
}

pub struct JsonExporter;

impl SessionExporter for JsonExporter {
    fn export(&self, session: &Session, format: ExportFormat) -> Result<Vec<u8>, DomainError> {
        match format {
            ExportFormat::Json => serde_json::to_vec_pretty(session)
                .map_err(|err| DomainError::Serialization(err.to_string())),
            other => Err(DomainError::validation(format!(
                "JsonExporter cannot handle {:?}",
                other
            ))),
        }
    }
}
