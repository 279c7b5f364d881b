//! Line-based Beancount reader

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::directives::{Directive, IncludeDirective, OpenDirective, Posting, SpannedDirective, Transaction};
use crate::error::ParseError;
use crate::types::{Amount, Price};

static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})\s+(.+)$").unwrap());

// FLAG ["string"] ["string"] [#tags ^links]
static TXN_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^([*!]|txn)\s*(?:"([^"]*)")?\s*(?:"([^"]*)")?\s*(.*)$"#).unwrap()
});

// [FLAG] ACCOUNT [NUMBER CURRENCY] [{COST}] [@|@@ NUMBER CURRENCY] [; comment]
static POSTING_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(?:([!*])\s+)?((?:Assets|Liabilities|Equity|Income|Expenses)(?::[^\s;]+)+)(?:\s+([-+]?[\d,]*\.?\d+)\s+([A-Z][A-Z0-9'._-]*))?(?:\s*\{\s*(?:([-+]?[\d,]*\.?\d+)\s+([A-Z][A-Z0-9'._-]*))?[^}]*\})?(?:\s*(@@?)\s*([-+]?[\d,]*\.?\d+)\s+([A-Z][A-Z0-9'._-]*))?\s*(?:;.*)?$"#,
    )
    .unwrap()
});

static META_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][A-Za-z0-9_-]*:(\s|$)").unwrap());

static INCLUDE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^include\s+"([^"]+)""#).unwrap());

/// Simple line-based parser for Beancount files
pub struct SimpleBeancountParser;

impl SimpleBeancountParser {
    /// Parse Beancount content
    pub fn parse(content: &str) -> Result<Vec<SpannedDirective>, ParseError> {
        Self::parse_with_source(content, None)
    }

    /// Parse Beancount content, tagging each directive with its source file
    pub fn parse_with_source(
        content: &str,
        source: Option<&str>,
    ) -> Result<Vec<SpannedDirective>, ParseError> {
        let lines: Vec<&str> = content.lines().collect();
        let mut directives = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            let trimmed = line.trim();

            // Comments, org-mode headers and stray indented lines
            if trimmed.is_empty() || Self::is_indented(line) || trimmed.starts_with(&[';', '#', '*'][..]) {
                i += 1;
                continue;
            }

            let mut end = i + 1;
            while end < lines.len() && Self::is_indented(lines[end]) && !lines[end].trim().is_empty() {
                end += 1;
            }

            let line_number = i + 1;
            let block: Vec<(usize, &str)> = (i + 1..end).map(|j| (j + 1, lines[j])).collect();
            if let Some(data) = Self::parse_entry(trimmed, &block, line_number, source)? {
                directives.push(SpannedDirective {
                    data,
                    line: line_number,
                    source: source.map(|s| s.to_string()),
                });
            }
            i = end;
        }

        Ok(directives)
    }

    fn is_indented(line: &str) -> bool {
        line.starts_with(' ') || line.starts_with('\t')
    }

    fn location(source: Option<&str>, line: usize) -> String {
        format!("{}:{}", source.unwrap_or("<input>"), line)
    }

    /// Parse one top-level entry with its indented continuation lines
    fn parse_entry(
        header: &str,
        block: &[(usize, &str)],
        line_number: usize,
        source: Option<&str>,
    ) -> Result<Option<Directive>, ParseError> {
        if let Some(caps) = INCLUDE_PATTERN.captures(header) {
            return Ok(Some(Directive::Include(IncludeDirective {
                path: caps[1].to_string(),
            })));
        }

        let Some(caps) = DATE_PATTERN.captures(header) else {
            // option, plugin, pushtag, poptag and friends
            return Ok(None);
        };
        let date = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").map_err(|e| {
            ParseError::SyntaxError {
                location: Self::location(source, line_number),
                message: format!("invalid date '{}': {}", &caps[1], e),
            }
        })?;
        let rest = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

        if rest.starts_with('*') || rest.starts_with('!') || rest.starts_with("txn") {
            Self::parse_transaction(rest, date, block, source).map(|t| Some(Directive::Transaction(t)))
        } else if let Some(args) = rest.strip_prefix("open ") {
            Ok(Self::parse_open(args, date).map(Directive::Open))
        } else {
            // close, balance, pad, price, commodity, note, event, document, custom
            Ok(None)
        }
    }

    /// Parse a transaction header and its postings
    fn parse_transaction(
        rest: &str,
        date: NaiveDate,
        block: &[(usize, &str)],
        source: Option<&str>,
    ) -> Result<Transaction, ParseError> {
        let mut flag = None;
        let mut payee = None;
        let mut narration = None;

        if let Some(caps) = TXN_HEADER.captures(rest) {
            flag = caps.get(1).map(|m| m.as_str().to_string());
            match (caps.get(2), caps.get(3)) {
                (Some(first), Some(second)) => {
                    payee = Some(first.as_str().to_string());
                    narration = Some(second.as_str().to_string());
                }
                // A lone string is the narration
                (Some(only), None) => narration = Some(only.as_str().to_string()),
                _ => {}
            }
        }

        let mut postings = Vec::new();
        for (line_number, line) in block {
            let trimmed = line.trim();
            if trimmed.starts_with(';') || META_PATTERN.is_match(trimmed) {
                continue;
            }
            let posting = Self::parse_posting(trimmed).map_err(|message| ParseError::SyntaxError {
                location: Self::location(source, *line_number),
                message,
            })?;
            postings.push(posting);
        }

        Ok(Transaction {
            date,
            flag,
            payee,
            narration,
            postings,
        })
    }

    fn parse_number(text: &str) -> Result<Decimal, String> {
        let cleaned = text.replace(',', "");
        let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
        cleaned
            .parse::<Decimal>()
            .map_err(|e| format!("invalid number '{}': {}", text, e))
    }

    /// Parse a single posting line
    fn parse_posting(line: &str) -> Result<Posting, String> {
        let caps = POSTING_PATTERN
            .captures(line)
            .ok_or_else(|| format!("unrecognised posting: {}", line))?;

        let amount = match (caps.get(3), caps.get(4)) {
            (Some(number), Some(currency)) => Some(Amount::new(
                Self::parse_number(number.as_str())?,
                currency.as_str(),
            )),
            _ => None,
        };

        // Per-unit cost; dates and labels inside the braces are ignored
        let cost = match (caps.get(5), caps.get(6)) {
            (Some(number), Some(currency)) => Some(Amount::new(
                Self::parse_number(number.as_str())?,
                currency.as_str(),
            )),
            _ => None,
        };

        let price = match (caps.get(7), caps.get(8), caps.get(9)) {
            (Some(kind), Some(number), Some(currency)) => {
                let value = Amount::new(Self::parse_number(number.as_str())?, currency.as_str());
                Some(if kind.as_str() == "@@" {
                    Price::Total(value)
                } else {
                    Price::Single(value)
                })
            }
            _ => None,
        };

        Ok(Posting {
            flag: caps.get(1).map(|m| m.as_str().to_string()),
            account: caps[2].to_string(),
            amount,
            cost,
            price,
        })
    }

    fn parse_open(args: &str, date: NaiveDate) -> Option<OpenDirective> {
        let mut parts = args.split_whitespace();
        let account = parts.next()?.to_string();
        let currencies = parts
            .filter(|p| !p.starts_with('"'))
            .flat_map(|p| p.split(','))
            .filter(|c| !c.is_empty())
            .map(|c| c.to_string())
            .collect();

        Some(OpenDirective {
            date,
            account,
            currencies,
        })
    }
}

// ==================== Tests ====================
