//! EMV-style PIX payload encoding.
//!
//! A payload is a flat concatenation of tag-length-value fields: a
//! two-digit tag, a two-digit zero-padded byte length, then the value.
//! The merchant-account and additional-data fields nest one more TLV
//! level. The payload ends with tag 63, length 04, and a CRC16 checksum
//! computed over everything before it (checksum tag and length included).

use chrono::Utc;
use rand::Rng;
use rand::distributions::Alphanumeric;
use rust_decimal::Decimal;

use crate::error::{CheckoutError, Result};

const PAYLOAD_FORMAT: &str = "00";
const MERCHANT_ACCOUNT: &str = "26";
const CATEGORY_CODE: &str = "52";
const CURRENCY: &str = "53";
const AMOUNT: &str = "54";
const COUNTRY: &str = "58";
const MERCHANT_NAME: &str = "59";
const MERCHANT_CITY: &str = "60";
const ADDITIONAL_DATA: &str = "62";

const SUB_DOMAIN: &str = "00";
const SUB_KEY: &str = "01";
const SUB_TXID: &str = "05";

const PIX_DOMAIN: &str = "BR.GOV.BCB.PIX";
const CURRENCY_BRL: &str = "986";
const COUNTRY_BR: &str = "BR";

/// TLV values must fit a two-digit length prefix.
pub const MAX_FIELD_LEN: usize = 99;
/// Hard ceiling on the additional-data transaction id.
pub const MAX_TXID_LEN: usize = 25;

/// A PIX charge ready to be encoded as a copy-and-paste payload.
#[derive(Debug, Clone)]
pub struct PixCharge {
    pub key: String,
    pub amount_cents: i64,
    pub merchant_name: String,
    pub merchant_city: String,
    pub txid: String,
}

impl PixCharge {
    /// Encodes the charge. Pure: identical inputs always produce an
    /// identical payload, checksum included.
    pub fn encode(&self) -> Result<String> {
        if self.amount_cents <= 0 {
            return Err(CheckoutError::Validation(
                "PIX amount must be positive".to_string(),
            ));
        }
        if self.txid.len() > MAX_TXID_LEN {
            return Err(CheckoutError::Validation(format!(
                "PIX transaction id exceeds {MAX_TXID_LEN} characters"
            )));
        }

        let account = format!("{}{}", tlv(SUB_DOMAIN, PIX_DOMAIN)?, tlv(SUB_KEY, &self.key)?);
        let additional = tlv(SUB_TXID, &self.txid)?;

        let mut payload = String::new();
        payload.push_str(&tlv(PAYLOAD_FORMAT, "01")?);
        payload.push_str(&tlv(MERCHANT_ACCOUNT, &account)?);
        payload.push_str(&tlv(CATEGORY_CODE, "0000")?);
        payload.push_str(&tlv(CURRENCY, CURRENCY_BRL)?);
        payload.push_str(&tlv(AMOUNT, &format_amount(self.amount_cents))?);
        payload.push_str(&tlv(COUNTRY, COUNTRY_BR)?);
        payload.push_str(&tlv(MERCHANT_NAME, &self.merchant_name)?);
        payload.push_str(&tlv(MERCHANT_CITY, &self.merchant_city)?);
        payload.push_str(&tlv(ADDITIONAL_DATA, &additional)?);

        payload.push_str("6304");
        let crc = crc16_ccitt(&payload);
        payload.push_str(&format!("{crc:04X}"));
        Ok(payload)
    }
}

/// Encodes one tag-length-value field.
fn tlv(tag: &str, value: &str) -> Result<String> {
    if value.is_empty() {
        return Err(CheckoutError::Validation(format!(
            "PIX field {tag} is empty"
        )));
    }
    if value.len() > MAX_FIELD_LEN {
        return Err(CheckoutError::Validation(format!(
            "PIX field {tag} exceeds {MAX_FIELD_LEN} characters"
        )));
    }
    Ok(format!("{tag}{:02}{value}", value.len()))
}

/// Formats cents as the major-unit decimal string the payload carries,
/// e.g. 19990 -> "199.90".
fn format_amount(cents: i64) -> String {
    Decimal::new(cents, 2).to_string()
}

/// CRC16/CCITT-FALSE: polynomial 0x1021, initial value 0xFFFF, no final
/// XOR, one input byte at a time. Payment readers reject any deviation,
/// so the bit operations here must stay exactly as written.
pub fn crc16_ccitt(data: &str) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for byte in data.bytes() {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Builds an opaque transaction id: millisecond timestamp plus a random
/// alphanumeric suffix, truncated to the sub-field budget.
pub fn generate_txid() -> String {
    let timestamp = Utc::now().timestamp_millis().to_string();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(MAX_TXID_LEN)
        .map(char::from)
        .collect();
    let mut id = format!("{timestamp}{suffix}");
    id.truncate(MAX_TXID_LEN);
    id
}
