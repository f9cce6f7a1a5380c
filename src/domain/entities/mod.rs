//! Core domain entities representing the redirect data model.
//!
//! Rules and settings are authored and mutated by an external admin
//! collaborator; this crate only reads immutable snapshots of them.
//! [`TransformationResult`] is produced per evaluation and is ephemeral.
//!
//! # Entity Types
//!
//! - [`UrlRule`] - A redirect rule with its search & replace and query sub-rules
//! - [`GlobalSettings`] - Installation-wide defaults and global sub-rules
//! - [`RuleSnapshot`] - Rules and settings of one store version
//! - [`TransformationResult`] - Final URL, score, strategy and trace of one evaluation

pub mod rule;
pub mod settings;
pub mod snapshot;
pub mod transformation;

pub use rule::{
    KeptQueryParam, QueryMode, RedirectType, SearchReplace, StaticQueryParam, UrlRule,
};
pub use settings::{GlobalEntry, GlobalSettings, RedirectMode, SmartSearchRule};
pub use snapshot::RuleSnapshot;
pub use transformation::{
    AppliedGlobalRule, GlobalRuleKind, MatchLevel, RedirectStrategy, StepKind, TraceStep,
    TransformationResult,
};
