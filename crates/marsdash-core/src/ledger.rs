//! In-memory ledger backed by Beancount files

use chrono::NaiveDate;
use marsdash_config::Config;
use marsdash_parser::{Amount, Directive, ParserRef, SpannedDirective, Transaction};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;

use crate::error::{CoreError, CoreResult};
use crate::query::{BalancePoint, LedgerQuery, Posting, PostingQuery};

/// Main ledger structure
pub struct Ledger {
    currency: String,
    parser: ParserRef,
    entry: Option<PathBuf>,
    loaded: bool,
    accounts: BTreeSet<String>,
    /// Reporting-currency postings, stably sorted by date
    postings: Vec<Posting>,
    running: HashMap<String, Vec<BalancePoint>>,
}

/// Counts shown by `/api/summary`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSummary {
    pub currency: String,
    pub accounts: usize,
    pub postings: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub source: Option<String>,
}

impl Ledger {
    /// Create a new ledger with config and parser
    pub fn new(config: &Config, parser: ParserRef) -> Self {
        Self {
            currency: config.dashboard.currency.clone(),
            parser,
            entry: None,
            loaded: false,
            accounts: BTreeSet::new(),
            postings: Vec::new(),
            running: HashMap::new(),
        }
    }

    /// Load ledger from entry point
    pub async fn load(&mut self, entry: PathBuf) -> CoreResult<()> {
        let directives = self.parser.parse_file(entry.clone()).await?;
        self.entry = Some(entry.clone());
        self.process(directives);
        log::info!(
            "Loaded {}: {} accounts, {} {} postings",
            entry.display(),
            self.accounts.len(),
            self.postings.len(),
            self.currency
        );
        Ok(())
    }

    /// Load ledger source text directly (no includes)
    pub async fn load_source(&mut self, content: &str) -> CoreResult<()> {
        let directives = self.parser.parse(content).await?;
        self.process(directives);
        Ok(())
    }

    /// Reload the ledger
    pub async fn reload(&mut self) -> CoreResult<()> {
        match self.entry.clone() {
            Some(entry) if entry.exists() => self.load(entry).await,
            _ => Err(CoreError::NotLoaded),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary {
            currency: self.currency.clone(),
            accounts: self.accounts.len(),
            postings: self.postings.len(),
            first_date: self.postings.first().map(|p| p.date),
            last_date: self.postings.last().map(|p| p.date),
            source: self.entry.as_ref().map(|p| p.display().to_string()),
        }
    }

    fn process(&mut self, directives: Vec<SpannedDirective>) {
        let mut accounts = BTreeSet::new();
        let mut postings = Vec::new();

        for directive in directives {
            match directive.data {
                Directive::Open(open) => {
                    accounts.insert(open.account);
                }
                Directive::Transaction(txn) => {
                    for posting in &txn.postings {
                        accounts.insert(posting.account.clone());
                    }
                    postings.extend(self.reporting_postings(&txn, directive.line));
                }
                _ => {}
            }
        }

        postings.sort_by_key(|p: &Posting| p.date);

        let mut running: HashMap<String, Vec<BalancePoint>> = HashMap::new();
        let mut totals: HashMap<&str, Decimal> = HashMap::new();
        for posting in &postings {
            let total = totals.entry(posting.account.as_str()).or_default();
            *total += posting.amount;
            running
                .entry(posting.account.clone())
                .or_default()
                .push(BalancePoint::new(posting.date, *total));
        }

        self.accounts = accounts;
        self.postings = postings;
        self.running = running;
        self.loaded = true;
    }

    /// Postings of `txn` expressed in the reporting currency.
    ///
    /// A posting's weight is its units times its cost when it is held at
    /// cost, else its price conversion, else the amount itself. A posting
    /// without an amount takes the negative sum of the other weights, and
    /// postings that cannot be put into the reporting currency are left out.
    fn reporting_postings(&self, txn: &Transaction, line: usize) -> Vec<Posting> {
        let mut residual: BTreeMap<String, Decimal> = BTreeMap::new();
        let mut elided = None;
        let mut converted = Vec::with_capacity(txn.postings.len());

        for (index, posting) in txn.postings.iter().enumerate() {
            match &posting.amount {
                Some(amount) => {
                    let weight = match (&posting.cost, &posting.price) {
                        (Some(cost), _) => Amount::new(amount.amount * cost.amount, cost.currency.clone()),
                        (None, Some(price)) => price.convert(amount.amount),
                        (None, None) => amount.clone(),
                    };
                    *residual.entry(weight.currency.clone()).or_default() += weight.amount;
                    converted.push((index, (weight.currency == self.currency).then_some(weight.amount)));
                }
                None if elided.is_none() => elided = Some(index),
                None => {
                    log::warn!(
                        "{} line {}: more than one posting without amount, ignoring {}",
                        txn.date,
                        line,
                        posting.account
                    );
                }
            }
        }

        if let Some(index) = elided {
            let inferred = residual.get(&self.currency).map(|sum| -*sum);
            converted.push((index, inferred));
            converted.sort_by_key(|(index, _)| *index);
        }

        converted
            .into_iter()
            .filter_map(|(index, amount)| {
                Some(Posting {
                    date: txn.date,
                    account: txn.postings[index].account.clone(),
                    amount: amount?,
                    payee: txn.payee.clone(),
                })
            })
            .collect()
    }

    fn not_loaded(query: String) -> CoreError {
        CoreError::UpstreamQuery {
            query,
            message: "ledger not loaded".to_string(),
        }
    }
}

impl LedgerQuery for Ledger {
    fn accounts(&self) -> Vec<String> {
        self.accounts.iter().cloned().collect()
    }

    fn query_postings(&self, query: &PostingQuery) -> CoreResult<Vec<Posting>> {
        if !self.loaded {
            return Err(Self::not_loaded(query.to_string()));
        }
        Ok(self.postings.iter().filter(|p| query.matches(p)).cloned().collect())
    }

    fn account_running_balance(&self, account: &str) -> CoreResult<Vec<BalancePoint>> {
        if !self.loaded {
            return Err(Self::not_loaded(format!(
                "SELECT date, balance WHERE account = '{}'",
                account
            )));
        }
        Ok(self.running.get(account).cloned().unwrap_or_default())
    }

    fn last_posting_date(&self) -> Option<NaiveDate> {
        self.postings.last().map(|p| p.date)
    }
}
