use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};

use crate::VnpayApiError;

/// VNPay timestamps are expressed in Indochina Time (UTC+7) as `yyyyMMddHHmmss`.
const GATEWAY_TIME_FORMAT: &str = "%Y%m%d%H%M%S";
const GATEWAY_UTC_OFFSET_SECS: i32 = 7 * 3600;

fn gateway_offset() -> FixedOffset {
    FixedOffset::east_opt(GATEWAY_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Formats a timestamp in the gateway's wire format and timezone.
pub fn format_gateway_time(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&gateway_offset()).format(GATEWAY_TIME_FORMAT).to_string()
}

/// Parses a gateway timestamp (e.g. `vnp_PayDate`) back into UTC.
pub fn parse_gateway_time(s: &str) -> Result<DateTime<Utc>, VnpayApiError> {
    let naive = NaiveDateTime::parse_from_str(s, GATEWAY_TIME_FORMAT)
        .map_err(|e| VnpayApiError::MalformedCallback(format!("Invalid gateway timestamp {s}. {e}")))?;
    gateway_offset()
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| VnpayApiError::MalformedCallback(format!("Ambiguous gateway timestamp {s}")))
}

/// A request id for the merchant web API. It must be unique per merchant per day.
pub fn new_request_id(now: &DateTime<Utc>) -> String {
    let suffix = rand::random::<u32>() % 1_000_000;
    format!("{}{suffix:06}", now.with_timezone(&gateway_offset()).format("%H%M%S%3f"))
}

/// Builds a correctly signed set of callback parameters, as the gateway would send them.
#[cfg(any(test, feature = "test_utils"))]
pub fn signed_callback_params(
    signer: &crate::VnpaySigner,
    txn_ref: &str,
    amount: shop_common::Money,
    response_code: &str,
) -> std::collections::HashMap<String, String> {
    let amount = amount.value().to_string();
    let mut params = std::collections::HashMap::from([
        ("vnp_TmnCode".to_string(), "TESTTMN1".to_string()),
        ("vnp_TxnRef".to_string(), txn_ref.to_string()),
        ("vnp_Amount".to_string(), amount),
        ("vnp_ResponseCode".to_string(), response_code.to_string()),
        ("vnp_TransactionStatus".to_string(), response_code.to_string()),
        ("vnp_TransactionNo".to_string(), "14226112".to_string()),
        ("vnp_BankCode".to_string(), "NCB".to_string()),
        ("vnp_PayDate".to_string(), "20241016153000".to_string()),
        ("vnp_OrderInfo".to_string(), format!("Thanh toan don hang {txn_ref}")),
    ]);
    let (_, signature) = signer.sign_params(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    params.insert(crate::SECURE_HASH_FIELD.to_string(), signature);
    params
}
