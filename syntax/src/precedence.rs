use serde::{Deserialize, Serialize};

#[derive(
    Debug, PartialOrd, Ord, PartialEq, Eq, Clone, Copy, Serialize, Deserialize,
)]
pub enum Precedence {
    NONE = 0,
    SEQUENCE = 1,
    DECORATOR = 2,
    ASSIGNMENT = 3,
    CONDITIONAL = 4,
    OR = 5,
    AND = 6,
    EQUALITY = 7,
    COMPARE = 8,
    SUM = 9,
    PRODUCT = 10,
    PREFIX = 11,
    POSTFIX = 12,
    CALL = 13,
}
