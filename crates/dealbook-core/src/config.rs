//! Configuration
//!
//! Loaded from a TOML file. Lookup order:
//! 1. explicit path (`--config`)
//! 2. `DEALBOOK_CONFIG` environment variable
//! 3. `~/.config/dealbook/config.toml` (platform config dir)
//! 4. built-in defaults
//!
//! Every section is optional; missing keys take the defaults below, which
//! match the column headers of the desk's spreadsheets.
//!
//! ```toml
//! year = 2025
//! utc_offset = "+03:00"
//! sources = ["Итоги_года_2025-12-25.json", "payments_2025-12-25.json"]
//!
//! [fields.deals]
//! buyer = "Покупатель"
//!
//! [export]
//! workbook = "sheets"
//! output_dir = "exports"
//! column_limit = 52
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Environment variable pointing at a config file
pub const CONFIG_ENV: &str = "DEALBOOK_CONFIG";

/// Environment variable overriding the target year
pub const YEAR_ENV: &str = "DEALBOOK_YEAR";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Year the dashboard reports on
    pub year: i32,
    /// Local offset of the spreadsheet's dates, e.g. "+03:00"
    pub utc_offset: String,
    /// Dashboard documents loaded when none are given on the command line
    pub sources: Vec<String>,
    pub fields: FieldMap,
    pub export: ExportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            year: 2025,
            utc_offset: "+03:00".to_string(),
            sources: Vec::new(),
            fields: FieldMap::default(),
            export: ExportConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration, falling back to defaults when no file exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        if let Ok(year) = std::env::var(YEAR_ENV) {
            config.year = year
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{} is not a year: {}", YEAR_ENV, year)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Read a config file; a missing explicit file is an error
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        debug!("Loaded config from {}", path.display());
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parsed local offset
    pub fn offset(&self) -> Result<FixedOffset> {
        parse_utc_offset(&self.utc_offset)
    }

    fn validate(&self) -> Result<()> {
        self.offset()?;
        if !(1900..=9999).contains(&self.year) {
            return Err(Error::Config(format!("year out of range: {}", self.year)));
        }
        Ok(())
    }
}

/// Default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("dealbook").join("config.toml"))
}

/// Parse "+03:00", "-0530", "+3" or "Z" into a fixed offset
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset> {
    let invalid = || Error::Config(format!("Invalid utc_offset: {}", s));
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 && rest.is_ascii() => rest.split_at(2),
        None => (rest, "0"),
    };
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !(digits(hours) && digits(minutes)) {
        return Err(invalid());
    }
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 14 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Column headers for every record kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMap {
    pub deals: DealFields,
    pub purchases: PurchaseFields,
    pub payments: PaymentFields,
    pub supplier_payments: PaymentFields,
    pub debts: DebtFields,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            deals: DealFields::default(),
            purchases: PurchaseFields::default(),
            payments: PaymentFields::default(),
            supplier_payments: PaymentFields::supplier(),
            debts: DebtFields::default(),
        }
    }
}

/// Sales deal columns
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DealFields {
    pub buyer: String,
    pub product: String,
    pub basis: String,
    pub region: String,
    /// Tonnes sold
    pub volume: String,
    /// Deal amount, thousand CNY
    pub amount: String,
    /// Sale price, thousand CNY per tonne
    pub price: String,
    pub date: String,
}

impl Default for DealFields {
    fn default() -> Self {
        Self {
            buyer: "Покупатель".into(),
            product: "Продукт".into(),
            basis: "Базис".into(),
            region: "Регион закупки".into(),
            volume: "Объем продажи".into(),
            amount: "Сумма, тыс. CNY".into(),
            price: "Цена продажи, тыс. CNY".into(),
            date: "Дата подтверждения сделки".into(),
        }
    }
}

/// Procurement columns
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PurchaseFields {
    pub supplier: String,
    pub product: String,
    pub region: String,
    pub volume: String,
    pub price: String,
    pub date: String,
}

impl Default for PurchaseFields {
    fn default() -> Self {
        Self {
            supplier: "Поставщик".into(),
            product: "Продукт".into(),
            region: "Регион".into(),
            volume: "Объем закупки".into(),
            price: "Цена закупки".into(),
            date: "Дата регистрации".into(),
        }
    }
}

/// Payment columns, shared by buyer and supplier payments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentFields {
    pub counterparty: String,
    pub amount: String,
    pub status: String,
    pub payment_type: String,
    pub sent_date: String,
    pub received_date: String,
}

impl Default for PaymentFields {
    fn default() -> Self {
        Self {
            counterparty: "Покупатель".into(),
            amount: "Сумма поступления в cny\n(Самойленко)".into(),
            status: "Статус оплаты".into(),
            payment_type: "Форма оплаты".into(),
            sent_date: "Дата отправки документов".into(),
            received_date: "Дата поступления средств".into(),
        }
    }
}

impl PaymentFields {
    /// Defaults for the supplier payments sheet
    pub fn supplier() -> Self {
        Self {
            counterparty: "Поставщик".into(),
            amount: "Сумма оплаты".into(),
            ..Self::default()
        }
    }
}

/// Debt / claim columns
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebtFields {
    pub initiator: String,
    pub agent: String,
    pub claim_type: String,
    pub amount: String,
    pub status: String,
}

impl Default for DebtFields {
    fn default() -> Self {
        Self {
            initiator: "Инициатор претензии".into(),
            agent: "Ответственный".into(),
            claim_type: "Тип претензии".into(),
            amount: "Сумма".into(),
            status: "Статус".into(),
        }
    }
}

/// Export defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory holding `<sheet>.csv` files
    pub workbook: PathBuf,
    /// Where export files are written
    pub output_dir: PathBuf,
    /// Read at most this many columns (the deals sheet stops at column AZ)
    pub column_limit: Option<usize>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            workbook: PathBuf::from("."),
            output_dir: PathBuf::from("exports"),
            column_limit: None,
        }
    }
}
