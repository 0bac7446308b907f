//! pipal-core: check-evaluation engine for pipal problems.
//!
//! A [`Problem`](problem::Problem) bundles a target (a function the learner
//! defines, or a program they write) with an ordered list of
//! [`Check`](check::Check)s. Verification runs every check against a learner
//! [`Environment`](env::Environment) and reports lines through a
//! [`Logger`](logger::Logger).
//!
//! Code evaluation and shell commands are injected capabilities
//! ([`Evaluator`](evaluator::Evaluator) and
//! [`ShellRunner`](traits::ShellRunner)), as is the
//! [`ProblemRegistry`](traits::ProblemRegistry) problems are fetched from.

pub mod check;
pub mod env;
pub mod error;
pub mod evaluator;
pub mod logger;
pub mod mock;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod problem;
pub mod traits;
pub mod workspace;
