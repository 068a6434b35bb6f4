use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActionDecodeError {
    #[error("line {line}: malformed session action: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}
