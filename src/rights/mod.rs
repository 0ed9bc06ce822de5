//! Operating-rule records: model, rule-type schema, and file codec.
//!
//! - [`schema`]: static registry of rule types and their optional blocks
//! - [`dumx`]: the packed switch/structure count column
//! - [`model`]: [`OperationalRight`] and its blocks
//! - [`reader`] / [`writer`]: streaming decode and encode of whole files
//! - [`compare`]: total ordering used for sorting and change detection
//! - [`tracking`]: snapshots and change notification for edit sessions

pub mod compare;
pub mod dumx;
pub mod layout;
pub mod model;
pub mod reader;
pub mod schema;
pub mod tracking;
pub mod writer;

pub use compare::compare;
pub use model::{
    InterveningStructure, OperationalRight, RightBody, RioGrandeValues, RuleBlocks,
    SanJuanValues, StructureAccount,
};
pub use reader::{read_rights, RightsParser};
pub use schema::RuleTypeDescriptor;
pub use tracking::{ChangeSink, DirtyFlag, Snapshot};
pub use writer::{encode_right, write_rights, RightsWriter};
