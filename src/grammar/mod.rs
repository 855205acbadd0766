// Copyright (c) 2021 Fabian Schuiki

//! Grammar representation and compilation.
//!
//! This module owns everything between a user-written rule set and the
//! deterministic parsing table the LL(1) driver runs on: the rule model, the
//! transformation passes, the FIRST/FOLLOW machinery, and the table itself.

pub mod rules;
pub mod sets;
pub mod table;
pub mod transform;

pub use self::rules::{BuilderFn, Rule, RuleKind, RuleSet, Symbol};
pub use self::table::{ParsingTable, TableConflict};
pub use self::transform::{eliminate_recursion, factor_prefixes, generate_table, RuleIds};
