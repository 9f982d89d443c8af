//! weft candidate parser
//!
//! Parses raw scanned tokens (`hover:bg-red-500`, `-mt-4`, `w-[32rem]`) into
//! structured utility specifications. This crate is deliberately leaf-level:
//! it knows the candidate grammar and the static table of utility bases, but
//! nothing about themes, variant tables, or CSS output. Resolution happens
//! in `weft-engine`.

pub mod candidate;

pub use candidate::{
    is_utility_root, parse, UtilitySpec, ValueToken, VariantToken, UTILITY_ROOTS,
};

/// Why a token failed to parse as a utility candidate.
///
/// In a scanning context rejections are dropped silently, since scanned
/// content is mostly not utility classes. Inside `@apply` the caller
/// escalates them into a compile error instead; the policy lives with the
/// caller, not here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CandidateRejection {
    #[error("empty candidate")]
    Empty,
    #[error("candidate '{0}' contains whitespace")]
    Whitespace(String),
    #[error("candidate '{0}' has unbalanced brackets")]
    UnbalancedBrackets(String),
    #[error("malformed variant '{0}'")]
    MalformedVariant(String),
    #[error("unknown utility '{0}'")]
    UnknownUtility(String),
}
