use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::error::MarketDataError;
use crate::exchange::protocol::{envelope_status, ApiVariant};

/// Extracts the reference price from a ticker response body.
pub fn parse_mid_price(variant: ApiVariant, body: &str) -> Result<Decimal, MarketDataError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| MarketDataError::Malformed(e.to_string()))?;

    if let Some((code, message)) = envelope_status(&value) {
        if code != 0 {
            return Err(MarketDataError::Api { code, message });
        }
    }

    let result = value.get("result").ok_or(MarketDataError::MissingPrice)?;
    let price = match variant {
        ApiVariant::SpotV1 => decimal_field(result.get("price"))?.ok_or(MarketDataError::MissingPrice)?,
        ApiVariant::V5 => {
            let ticker = result
                .get("list")
                .and_then(Value::as_array)
                .and_then(|list| list.first())
                .ok_or(MarketDataError::MissingPrice)?;
            // An unusable book side falls back to the last trade.
            let bid = decimal_field(ticker.get("bid1Price")).ok().flatten();
            let ask = decimal_field(ticker.get("ask1Price")).ok().flatten();
            match (bid, ask) {
                (Some(bid), Some(ask)) if bid > Decimal::ZERO && ask > Decimal::ZERO => bid
                    .checked_add(ask)
                    .map(|sum| sum / Decimal::TWO)
                    .ok_or_else(|| MarketDataError::InvalidPrice(format!("{bid} + {ask}")))?,
                _ => decimal_field(ticker.get("lastPrice"))?.ok_or(MarketDataError::MissingPrice)?,
            }
        }
    };

    if price <= Decimal::ZERO {
        return Err(MarketDataError::InvalidPrice(price.to_string()));
    }
    Ok(price)
}

// Prices arrive as strings on both API generations, but numbers are tolerated.
fn decimal_field(field: Option<&Value>) -> Result<Option<Decimal>, MarketDataError> {
    match field {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Decimal::from_str(s)
            .map(Some)
            .map_err(|_| MarketDataError::InvalidPrice(s.clone())),
        Some(Value::Number(n)) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .map(Some)
            .map_err(|_| MarketDataError::InvalidPrice(n.to_string())),
        Some(other) => Err(MarketDataError::InvalidPrice(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn spot_v1_price_field() {
        let body = r#"{"ret_code":0,"ret_msg":null,"result":{"symbol":"NXPCUSDT","price":"1.2345"}}"#;
        assert_eq!(parse_mid_price(ApiVariant::SpotV1, body).unwrap(), dec!(1.2345));
    }

    #[test]
    fn v5_prefers_book_mid() {
        let body = r#"{"retCode":0,"retMsg":"OK","result":{"category":"spot","list":[
            {"symbol":"NXPCUSDT","bid1Price":"99.98","ask1Price":"100.02","lastPrice":"100.50"}]}}"#;
        assert_eq!(parse_mid_price(ApiVariant::V5, body).unwrap(), dec!(100));
    }

    #[test]
    fn v5_falls_back_to_last_price() {
        let body = r#"{"retCode":0,"result":{"list":[{"bid1Price":"","ask1Price":"0","lastPrice":"2.5"}]}}"#;
        assert_eq!(parse_mid_price(ApiVariant::V5, body).unwrap(), dec!(2.5));
    }

    #[test]
    fn unparseable_book_side_falls_back_to_last_price() {
        let body = r#"{"retCode":0,"result":{"list":[{"bid1Price":"n/a","ask1Price":"1.1","lastPrice":"1.05"}]}}"#;
        assert_eq!(parse_mid_price(ApiVariant::V5, body).unwrap(), dec!(1.05));
    }

    #[test]
    fn overflowing_book_mid_is_invalid_price() {
        let body = r#"{"retCode":0,"result":{"list":[{"bid1Price":"79228162514264337593543950335",
            "ask1Price":"79228162514264337593543950335","lastPrice":"1"}]}}"#;
        assert!(matches!(
            parse_mid_price(ApiVariant::V5, body),
            Err(MarketDataError::InvalidPrice(_))
        ));
    }

    #[test]
    fn numeric_price_is_accepted() {
        let body = r#"{"result":{"price":0.75}}"#;
        assert_eq!(parse_mid_price(ApiVariant::SpotV1, body).unwrap(), dec!(0.75));
    }

    #[test]
    fn missing_and_invalid_prices() {
        assert!(matches!(
            parse_mid_price(ApiVariant::SpotV1, r#"{"ret_code":0,"result":{}}"#),
            Err(MarketDataError::MissingPrice)
        ));
        assert!(matches!(
            parse_mid_price(ApiVariant::V5, r#"{"retCode":0,"result":{"list":[]}}"#),
            Err(MarketDataError::MissingPrice)
        ));
        assert!(matches!(
            parse_mid_price(ApiVariant::SpotV1, r#"{"result":{"price":"abc"}}"#),
            Err(MarketDataError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_mid_price(ApiVariant::SpotV1, r#"{"result":{"price":"0"}}"#),
            Err(MarketDataError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_mid_price(ApiVariant::SpotV1, "not json"),
            Err(MarketDataError::Malformed(_))
        ));
    }

    #[test]
    fn api_error_code_surfaces() {
        let body = r#"{"retCode":10001,"retMsg":"params error: symbol invalid","result":{}}"#;
        match parse_mid_price(ApiVariant::V5, body) {
            Err(MarketDataError::Api { code, message }) => {
                assert_eq!(code, 10001);
                assert_eq!(message, "params error: symbol invalid");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
