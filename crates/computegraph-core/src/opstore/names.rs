//! Names of ops the engine itself builds or pattern-matches on.

pub const INDEX: &str = "index";
pub const LIMIT: &str = "limit";
pub const OFFSET: &str = "offset";
pub const DROPNA: &str = "dropna";

pub const MAP: &str = "map";
pub const FILTER: &str = "filter";
pub const SORT: &str = "sort";
pub const GROUPBY: &str = "groupby";
pub const JOIN: &str = "join";
pub const JOIN_ALL: &str = "joinAll";

pub const PICK: &str = "pick";
pub const DICT: &str = "dict";
pub const AND: &str = "and";
pub const STRING_EQUAL: &str = "string-equal";
pub const NUMBER_EQUAL: &str = "number-equal";

pub const ARTIFACT_NAME: &str = "artifact-name";
pub const ARTIFACT_VERSION_NAME: &str = "artifactVersion-name";
pub const PROJECT_ARTIFACT: &str = "project-artifact";
pub const PROJECT_ARTIFACT_VERSION: &str = "project-artifactVersion";

/// Ops whose function arguments take one row of their list argument.
pub const HIGHER_ORDER: [&str; 6] = [GROUPBY, FILTER, SORT, JOIN, MAP, JOIN_ALL];

pub fn is_higher_order(name: &str) -> bool {
    HIGHER_ORDER.contains(&name)
}

/// Input names shared by the list ops the engine builds.
pub const ARR_INPUT: &str = "arr";
pub const INDEX_INPUT: &str = "index";
