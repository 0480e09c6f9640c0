use thiserror::Error;

/// A structural defect in a flow definition, found while building a
/// [`FlowGraph`](crate::flow::FlowGraph).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityViolation {
    #[error("flow defines no nodes")]
    Empty,

    #[error("node '{node}' is defined more than once")]
    DuplicateNode { node: String },

    #[error("entry node '{node}' is not defined")]
    MissingEntry { node: String },

    #[error("node '{node}' offers no options")]
    NoOptions { node: String },

    #[error("node '{node}' lists option '{option}' more than once")]
    DuplicateOption { node: String, option: String },

    #[error("option '{option}' on node '{node}' has no transition")]
    MissingTransition { node: String, option: String },

    #[error("node '{node}' has a transition for '{option}', which it does not offer")]
    StrayTransition { node: String, option: String },

    #[error("option '{option}' on node '{node}' leads to unknown node '{target}'")]
    DanglingTarget {
        node: String,
        option: String,
        target: String,
    },

    #[error("node '{node}' weights option '{option}', which it does not offer")]
    StrayWeight { node: String, option: String },

    #[error("scored node '{node}' is tagged informational")]
    MislabelledCategory { node: String },

    #[error("scored node '{node}' can be revisited through a cycle")]
    Cycle { node: String },

    #[error("the end of the flow cannot be reached from node '{node}'")]
    Unterminated { node: String },
}

#[derive(Debug, Error)]
pub enum ScreeningError {
    #[error("graph integrity: {0}")]
    GraphIntegrity(#[from] IntegrityViolation),

    #[error("unknown node: {node}")]
    UnknownNode { node: String },

    #[error("node '{node}' does not declare option '{option}'")]
    UnknownOption { node: String, option: String },

    #[error("'{option}' is not currently offered at '{node}'")]
    InvalidSelection { node: String, option: String },

    #[error("informational node '{node}' has no option leading toward a question")]
    NoWayForward { node: String },

    #[error("invalid tier table: {0}")]
    InvalidTiers(String),

    #[error("definition parse error: {0}")]
    Definition(#[from] serde_json::Error),
}
