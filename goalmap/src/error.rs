use thiserror::Error;

/// Structural problems in a graph received from outside the session
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("too many nodes: max {max} got {got}")]
    TooManyNodes { max: usize, got: usize },
    #[error("too many edges: max {max} got {got}")]
    TooManyEdges { max: usize, got: usize },
    #[error("duplicate id: {0}")]
    DuplicateId(String),
    #[error("edge {edge} references missing node {node}")]
    DanglingEdge { edge: String, node: String },
    #[error("node {0} has a non-finite or out of range position")]
    PositionOutOfBounds(String),
    #[error("node {node} progress must be 0..=100, got {got}")]
    ProgressOutOfRange { node: String, got: u8 },
    #[error("node {0} has too many tags")]
    TooManyTags(String),
    #[error("node {0} has repeated tags")]
    DuplicateTag(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MutationError {
    #[error("no existing nodes are selected")]
    NothingSelected,
    #[error("node not found: {0}")]
    NodeNotFound(String),
    #[error("edge not found: {0}")]
    EdgeNotFound(String),
    #[error("edge endpoints must be different nodes")]
    SelfLoop,
    #[error("an equivalent edge from {from} to {to} already exists")]
    DuplicateEdge { from: String, to: String },
    #[error("could not allocate a unique id after {attempts} attempts")]
    IdExhausted { attempts: usize },
    #[error("position must be finite and within bounds")]
    InvalidPosition,
}

impl MutationError {
    pub fn code(&self) -> &'static str {
        match self {
            MutationError::NothingSelected => "nothing_selected",
            MutationError::NodeNotFound(_) | MutationError::EdgeNotFound(_) => "invalid_id",
            MutationError::SelfLoop => "self_loop",
            MutationError::DuplicateEdge { .. } => "duplicate_edge",
            MutationError::IdExhausted { .. } => "id_exhausted",
            MutationError::InvalidPosition => "invalid_position",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Mutation(#[from] MutationError),
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
}

impl SessionError {
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::Mutation(e) => e.code(),
            SessionError::NothingToUndo => "nothing_to_undo",
            SessionError::NothingToRedo => "nothing_to_redo",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage is unavailable: {0}")]
    Unavailable(String),
    #[error("storage write failed for {key}: {message}")]
    Write { key: String, message: String },
    #[error("storage read failed for {key}: {message}")]
    Read { key: String, message: String },
    #[error("stored value for {key} is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "storage_unavailable",
            StoreError::Write { .. } => "storage_write",
            StoreError::Read { .. } => "storage_read",
            StoreError::Corrupt { .. } => "storage_corrupt",
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("cannot delete the last remaining map")]
    LastMap,
    #[error("unknown map: {0}")]
    UnknownMap(String),
    #[error("could not allocate a unique map id")]
    IdExhausted,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RegistryError {
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::LastMap => "last_map",
            RegistryError::UnknownMap(_) => "invalid_id",
            RegistryError::IdExhausted => "id_exhausted",
            RegistryError::Store(e) => e.code(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("share token too large: max {max} bytes got {got}")]
    TooLarge { max: usize, got: usize },
    #[error("share token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("share token is not valid escaped text: {0}")]
    Escape(#[from] std::string::FromUtf8Error),
    #[error("share token does not contain a goal map: {0}")]
    Json(#[from] serde_json::Error),
    #[error("shared graph is invalid: {0}")]
    Graph(#[from] GraphError),
    #[error("invalid page url: {0}")]
    Url(#[from] url::ParseError),
}

impl ShareError {
    pub fn code(&self) -> &'static str {
        match self {
            ShareError::TooLarge { .. } => "token_too_large",
            ShareError::Base64(_) | ShareError::Escape(_) => "invalid_token",
            ShareError::Json(_) => "invalid_payload",
            ShareError::Graph(_) => "invalid_graph",
            ShareError::Url(_) => "invalid_url",
        }
    }
}
