//! Display rows for a presale snapshot.

use crate::protocols::presale::network::NetworkBinding;
use crate::protocols::presale::phase::{Phase, Tone};
use crate::protocols::presale::reader::PresaleSnapshot;
use crate::protocols::presale::types::{BuyerStatus, SaleStatus, SaleTerms, TokenInfo};
use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::Serialize;
use std::fmt;

/// One labelled value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRow {
    pub label: &'static str,
    pub value: String,
}

impl DisplayRow {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

/// A titled group of rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplaySection {
    pub title: &'static str,
    pub rows: Vec<DisplayRow>,
}

/// Phase chip, banner and action button
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseView {
    pub phase: Phase,
    pub label: &'static str,
    pub banner: Option<&'static str>,
    pub tone: Tone,
    pub action: Option<&'static str>,
}

impl From<Phase> for PhaseView {
    fn from(phase: Phase) -> Self {
        let descriptor = phase.descriptor();
        Self {
            phase,
            label: descriptor.label,
            banner: descriptor.banner,
            tone: descriptor.tone,
            action: descriptor.action.map(|a| a.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresaleView {
    pub network: String,
    pub currency: String,
    pub phase: Option<PhaseView>,
    pub sections: Vec<DisplaySection>,
    pub alerts: Vec<&'static str>,
}

impl PresaleView {
    pub fn from_snapshot(snapshot: &PresaleSnapshot) -> Self {
        let network = &snapshot.network;
        let symbol = snapshot.token.as_ref().map(|t| t.symbol.as_str());

        let mut sections = Vec::new();
        if let Some(token) = &snapshot.token {
            sections.push(DisplaySection {
                title: "Token Information",
                rows: token_rows(token, snapshot.terms.as_ref()),
            });
        }
        if let Some(terms) = &snapshot.terms {
            sections.push(DisplaySection {
                title: "Private-sale Information",
                rows: sale_rows(terms, network),
            });
        }
        if let (Some(status), Some(symbol)) = (&snapshot.status, symbol) {
            sections.push(DisplaySection {
                title: "Private-sale Status",
                rows: status_rows(status, network, symbol),
            });
        }
        if let (Some(buyer), Some(symbol)) = (&snapshot.buyer, symbol) {
            sections.push(DisplaySection {
                title: "Buyer Information",
                rows: buyer_rows(buyer, network, symbol),
            });
        }

        Self {
            network: format!("{} (chain id {})", network.name, network.chain_id),
            currency: network.currency_adornment(),
            phase: snapshot.phase.map(PhaseView::from),
            sections,
            alerts: snapshot.failures.iter().map(|f| f.message()).collect(),
        }
    }
}

impl fmt::Display for PresaleView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Network: {}", self.network)?;
        if let Some(phase) = &self.phase {
            writeln!(f, "Status: {}", phase.label)?;
            if let Some(banner) = phase.banner {
                writeln!(f, "{}", banner)?;
            }
            if let Some(action) = phase.action {
                writeln!(f, "Available action: {}", action)?;
            }
        }
        for section in &self.sections {
            writeln!(f)?;
            writeln!(f, "== {} ==", section.title)?;
            let width = section.rows.iter().map(|r| r.label.len()).max().unwrap_or(0);
            for row in &section.rows {
                writeln!(f, "{:<width$}  {}", row.label, row.value, width = width)?;
            }
        }
        for alert in &self.alerts {
            writeln!(f)?;
            write!(f, "! {}", alert)?;
        }
        Ok(())
    }
}

pub fn token_rows(token: &TokenInfo, terms: Option<&SaleTerms>) -> Vec<DisplayRow> {
    let mut rows = vec![
        DisplayRow::new("Token Name:", token.name.clone()),
        DisplayRow::new("Token Symbol:", token.symbol.clone()),
        DisplayRow::new("Token Decimal:", token.decimals.to_string()),
    ];
    if let Some(terms) = terms {
        rows.push(DisplayRow::new("Address:", terms.sale_token.to_string()));
    }
    rows.push(DisplayRow::new(
        "Sale Supply:",
        format!("{} {}", token.sale_supply, token.symbol),
    ));
    rows
}

pub fn sale_rows(terms: &SaleTerms, network: &NetworkBinding) -> Vec<DisplayRow> {
    let currency = &network.currency_symbol;
    let price = terms
        .token_price()
        .map(|p| format!("{} {}", p, currency))
        .unwrap_or_else(|| "-".to_string());
    vec![
        DisplayRow::new("Token Rate:", price),
        DisplayRow::new("Softcap:", format!("{} {}", terms.soft_cap, currency)),
        DisplayRow::new("Hardcap:", format!("{} {}", terms.hard_cap, currency)),
        DisplayRow::new("Buy min:", format!("{} {}", terms.min_contribution, currency)),
        DisplayRow::new("Buy max:", format!("{} {}", terms.max_contribution, currency)),
        DisplayRow::new("Presale Start:", format_deadline(terms.start_time)),
        DisplayRow::new("Presale End:", format_deadline(terms.end_time)),
    ]
}

pub fn status_rows(status: &SaleStatus, network: &NetworkBinding, symbol: &str) -> Vec<DisplayRow> {
    vec![
        DisplayRow::new(
            "Raised Amount",
            format!("{} {}", status.raised_amount, network.currency_symbol),
        ),
        DisplayRow::new("Sold Amount", format!("{} {}", status.sold_amount, symbol)),
    ]
}

pub fn buyer_rows(buyer: &BuyerStatus, network: &NetworkBinding, symbol: &str) -> Vec<DisplayRow> {
    vec![
        DisplayRow::new(
            "Invested",
            format!("{} {}", buyer.invested, network.currency_symbol),
        ),
        DisplayRow::new("Allocated", format!("{} {}", buyer.allocated, symbol)),
    ]
}

/// `5th of Mar, 3 PM UTC`
pub fn format_deadline(time: DateTime<Utc>) -> String {
    let (pm, hour) = time.hour12();
    format!(
        "{}{} of {}, {} {} UTC",
        time.day(),
        ordinal_suffix(time.day()),
        time.format("%b"),
        hour,
        if pm { "PM" } else { "AM" }
    )
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_deadline() {
        let t = Utc.with_ymd_and_hms(2022, 3, 5, 15, 0, 0).unwrap();
        assert_eq!(format_deadline(t), "5th of Mar, 3 PM UTC");

        let t = Utc.with_ymd_and_hms(2022, 1, 1, 0, 30, 0).unwrap();
        assert_eq!(format_deadline(t), "1st of Jan, 12 AM UTC");

        let t = Utc.with_ymd_and_hms(2022, 12, 22, 12, 0, 0).unwrap();
        assert_eq!(format_deadline(t), "22nd of Dec, 12 PM UTC");
    }

    #[test]
    fn test_ordinal_suffix_teens() {
        assert_eq!(ordinal_suffix(11), "th");
        assert_eq!(ordinal_suffix(12), "th");
        assert_eq!(ordinal_suffix(13), "th");
        assert_eq!(ordinal_suffix(23), "rd");
        assert_eq!(ordinal_suffix(31), "st");
    }

    #[test]
    fn test_phase_view_for_each_phase() {
        let active = PhaseView::from(Phase::Active);
        assert_eq!(active.label, "Sale is Active");
        assert_eq!(active.banner, Some("Private-sale is started."));
        assert_eq!(active.tone, Tone::Success);
        assert_eq!(active.action, Some("Buy"));

        let failed = PhaseView::from(Phase::Failed);
        assert_eq!(failed.tone, Tone::Error);
        assert_eq!(failed.action, Some("Withdraw"));

        let inactive = PhaseView::from(Phase::Inactive);
        assert_eq!(inactive.label, "Sale is not Active");
        assert_eq!(inactive.banner, None);
        assert_eq!(inactive.action, None);
    }
}
