//! Data structures for the parsed TestLink tree and the persisted rows.

mod custom_field;
mod enums;
mod records;
mod tree;

pub use custom_field::{CustomField, Keyword, Requirement};
pub use enums::{ExecutionType, Importance};
pub use records::{
    Project, TESTLINK_IMPORT_SOURCE, TestCaseRecord, TestStepRecord, TestSuiteRecord,
};
pub use tree::{ParsedStep, ParsedSuiteNode, ParsedTestCase, ProvidedFields};
