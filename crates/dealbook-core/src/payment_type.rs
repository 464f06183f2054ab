//! Payment type normalization
//!
//! The payment terms column is free text ("Аккредитив (подтвержденный)",
//! "100% предоплата", "CAD Qingdao"...). It is reduced to a small fixed
//! vocabulary by case-insensitive substring tests, checked in priority order;
//! the first rule that matches wins.

use serde::{Deserialize, Serialize};

use crate::record::CellValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Advance,
    LetterOfCredit,
    CashAgainstDocuments,
    AgainstDocuments,
    Unspecified,
}

/// Rules in priority order
const RULES: &[(PaymentType, &[&str])] = &[
    (PaymentType::Advance, &["аванс", "предоплат", "advance", "prepay"]),
    (
        PaymentType::LetterOfCredit,
        &["аккредитив", "letter of credit", "l/c"],
    ),
    (PaymentType::CashAgainstDocuments, &["cad", "cash against"]),
    (
        PaymentType::AgainstDocuments,
        &["по документ", "против документ", "against doc"],
    ),
];

impl PaymentType {
    pub const ALL: [PaymentType; 5] = [
        Self::Advance,
        Self::LetterOfCredit,
        Self::CashAgainstDocuments,
        Self::AgainstDocuments,
        Self::Unspecified,
    ];

    /// Display label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Advance => "аванс",
            Self::LetterOfCredit => "аккредитив",
            Self::CashAgainstDocuments => "CAD",
            Self::AgainstDocuments => "оплата по документам",
            Self::Unspecified => "не указано",
        }
    }

    /// Classify raw payment terms
    pub fn normalize(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        if lowered.is_empty() {
            return Self::Unspecified;
        }
        RULES
            .iter()
            .find(|(_, needles)| needles.iter().any(|n| lowered.contains(n)))
            .map(|(kind, _)| *kind)
            .unwrap_or(Self::Unspecified)
    }

    /// Classify a cell; non-text cells are unspecified
    pub fn from_cell(value: Option<&CellValue>) -> Self {
        match value {
            Some(CellValue::Text(s)) => Self::normalize(s),
            _ => Self::Unspecified,
        }
    }
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentType {
    type Err = String;

    /// Parses the labels and the snake_case names
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| {
                t.as_str().to_lowercase() == lowered
                    || serde_json::to_value(t)
                        .ok()
                        .and_then(|v| v.as_str().map(|name| name == lowered))
                        .unwrap_or(false)
            })
            .ok_or_else(|| format!("Unknown payment type: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_letter_of_credit() {
        assert_eq!(
            PaymentType::normalize("Аккредитив (подтвержденный)").as_str(),
            "аккредитив"
        );
        assert_eq!(
            PaymentType::normalize("Irrevocable Letter of Credit"),
            PaymentType::LetterOfCredit
        );
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(PaymentType::normalize("").as_str(), "не указано");
        assert_eq!(PaymentType::normalize("   "), PaymentType::Unspecified);
        assert_eq!(PaymentType::from_cell(None), PaymentType::Unspecified);
        assert_eq!(
            PaymentType::from_cell(Some(&CellValue::Number(1.0))),
            PaymentType::Unspecified
        );
    }

    #[test]
    fn test_normalize_each_rule() {
        assert_eq!(PaymentType::normalize("100% ПРЕДОПЛАТА"), PaymentType::Advance);
        assert_eq!(PaymentType::normalize("Аванс 30%"), PaymentType::Advance);
        assert_eq!(
            PaymentType::normalize("CAD Qingdao"),
            PaymentType::CashAgainstDocuments
        );
        assert_eq!(
            PaymentType::normalize("Оплата по документам"),
            PaymentType::AgainstDocuments
        );
        assert_eq!(PaymentType::normalize("бартер"), PaymentType::Unspecified);
    }

    #[test]
    fn test_priority_order() {
        // Advance wins over letter of credit
        assert_eq!(
            PaymentType::normalize("аванс 20%, остаток аккредитив"),
            PaymentType::Advance
        );
        // CAD wins over against-documents
        assert_eq!(
            PaymentType::normalize("CAD (cash against documents)"),
            PaymentType::CashAgainstDocuments
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!("аккредитив".parse::<PaymentType>(), Ok(PaymentType::LetterOfCredit));
        assert_eq!("letter_of_credit".parse::<PaymentType>(), Ok(PaymentType::LetterOfCredit));
        assert_eq!("cad".parse::<PaymentType>(), Ok(PaymentType::CashAgainstDocuments));
        assert!("swift".parse::<PaymentType>().is_err());
    }
}
