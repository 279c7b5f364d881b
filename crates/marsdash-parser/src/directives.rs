//! Beancount directive types understood by the reader

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{Amount, Price};

/// Directive with its source position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpannedDirective {
    pub data: Directive,
    /// 1-based line of the directive's first line
    pub line: usize,
    /// Source file path
    pub source: Option<String>,
}

/// Directives the reader keeps. Everything else in a ledger is skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Directive {
    Transaction(Transaction),
    Open(OpenDirective),
    Include(IncludeDirective),
}

/// Transaction directive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub flag: Option<String>,
    /// Only set when the header carries two strings
    pub payee: Option<String>,
    pub narration: Option<String>,
    pub postings: Vec<Posting>,
}

/// Posting within a transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Posting {
    pub flag: Option<String>,
    pub account: String,
    /// None when the amount is left for the ledger to infer
    pub amount: Option<Amount>,
    /// Per-unit cost from `{...}`
    pub cost: Option<Amount>,
    pub price: Option<Price>,
}

/// Open directive (account declaration)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenDirective {
    pub date: NaiveDate,
    pub account: String,
    pub currencies: Vec<String>,
}

/// Include directive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncludeDirective {
    pub path: String,
}
