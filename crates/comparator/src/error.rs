use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComparatorError {
    #[error("Failed to parse comparison input: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Comparison entity at position {0} has an empty symbol")]
    MissingSymbol(usize),

    #[error("Comparison input must be an array of entities or an object with a `reports` array")]
    UnexpectedShape,
}
