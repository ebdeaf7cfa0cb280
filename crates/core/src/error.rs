#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Profile already exists: {0}")]
    DuplicateProfile(String),

    #[error("Invalid attribute definition: {0}")]
    InvalidDefinition(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}
