pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid numeric result for node \"{node}\": {computation} was {value}")]
    InvalidNumber {
        node: String,
        computation: String,
        value: f64,
    },

    #[error("invalid line coordinates: {computation} was {value}")]
    InvalidLine {
        computation: &'static str,
        value: f64,
    },

    #[error("node \"{node}\" names unknown parent \"{parent}\"")]
    UnknownParent { node: String, parent: String },

    #[error("duplicate node id \"{id}\"")]
    DuplicateId { id: String },

    #[error("node \"{id}\" is missing from the layout registry")]
    MissingNode { id: String },

    #[error("node \"{id}\" is not reachable from a root (cyclic or inconsistent parent chain)")]
    Unreachable { id: String },
}

/// Returns `value` unchanged when it is finite, otherwise the invalid-numeric
/// error naming the owning node and the computation that produced it.
pub(crate) fn ensure_finite(node: &str, computation: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::InvalidNumber {
            node: node.to_string(),
            computation: computation.to_string(),
            value,
        })
    }
}

/// Like [`ensure_finite`], additionally rejecting values below zero.
pub(crate) fn ensure_non_negative(node: &str, computation: &str, value: f64) -> Result<f64> {
    let value = ensure_finite(node, computation, value)?;
    if value < 0.0 {
        return Err(Error::InvalidNumber {
            node: node.to_string(),
            computation: computation.to_string(),
            value,
        });
    }
    Ok(value)
}
