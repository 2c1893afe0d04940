//! Wire formats for the two supported exchange API generations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::SubmissionError;
use crate::exchange::client::{HttpMethod, PreparedRequest, RawResponse, RequestBody};
use crate::exchange::signer::{canonical_header, canonical_query, Signer};
use crate::exchange::types::{
    wire_decimal, OrderKind, OrderRequest, OrderResult, OrderSide, TimeInForce,
};

pub const SPOT_V1_TICKER_PATH: &str = "/spot/quote/v1/ticker/price";
pub const SPOT_V1_ORDER_PATH: &str = "/spot/v1/order";
pub const V5_TICKER_PATH: &str = "/v5/market/tickers";
pub const V5_ORDER_PATH: &str = "/v5/order/create";

pub const HEADER_API_KEY: &str = "X-BAPI-API-KEY";
pub const HEADER_TIMESTAMP: &str = "X-BAPI-TIMESTAMP";
pub const HEADER_RECV_WINDOW: &str = "X-BAPI-RECV-WINDOW";
pub const HEADER_SIGN: &str = "X-BAPI-SIGN";
pub const HEADER_SIGN_TYPE: &str = "X-BAPI-SIGN-TYPE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiVariant {
    /// Legacy spot API, parameters signed as a sorted query string.
    SpotV1,
    /// Unified API, signature carried in headers.
    #[default]
    V5,
}

#[derive(Debug, Clone, Copy)]
pub struct OrderDraft<'a> {
    pub symbol: &'a str,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Decimal,
}

#[derive(Debug, Clone)]
pub struct SignedOrder {
    pub order: OrderRequest,
    pub request: PreparedRequest,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct V5OrderBody<'a> {
    category: &'static str,
    symbol: &'a str,
    side: &'static str,
    order_type: &'static str,
    qty: String,
    price: String,
    time_in_force: &'static str,
}

impl ApiVariant {
    pub fn ticker_request(&self, symbol: &str) -> PreparedRequest {
        let (path, query) = match self {
            ApiVariant::SpotV1 => (SPOT_V1_TICKER_PATH, vec![("symbol", symbol.to_string())]),
            ApiVariant::V5 => (
                V5_TICKER_PATH,
                vec![("category", "spot".to_string()), ("symbol", symbol.to_string())],
            ),
        };
        PreparedRequest {
            method: HttpMethod::Get,
            path,
            query,
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    /// Builds the maker-only limit order and signs it for this API generation.
    pub fn sign_order(
        &self,
        signer: &Signer,
        api_key: &str,
        recv_window_ms: u64,
        draft: OrderDraft<'_>,
        timestamp: i64,
    ) -> Result<SignedOrder, SubmissionError> {
        let qty = wire_decimal(draft.quantity);
        let price = wire_decimal(draft.price);

        let (signature, request) = match self {
            ApiVariant::SpotV1 => {
                let mut params = BTreeMap::new();
                params.insert("apiKey", api_key.to_string());
                params.insert("symbol", draft.symbol.to_string());
                params.insert("orderType", "LIMIT".to_string());
                params.insert("side", draft.side.as_upper().to_string());
                params.insert("qty", qty);
                params.insert("price", price);
                params.insert("timeInForce", "PostOnly".to_string());
                params.insert("timestamp", timestamp.to_string());

                let signature = signer.sign(&canonical_query(&params));
                let mut form: Vec<(String, String)> = params
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect();
                form.push(("sign".to_string(), signature.clone()));

                let request = PreparedRequest {
                    method: HttpMethod::Post,
                    path: SPOT_V1_ORDER_PATH,
                    query: Vec::new(),
                    headers: Vec::new(),
                    body: RequestBody::Form(form),
                };
                (signature, request)
            }
            ApiVariant::V5 => {
                let body = serde_json::to_string(&V5OrderBody {
                    category: "spot",
                    symbol: draft.symbol,
                    side: draft.side.as_title(),
                    order_type: "Limit",
                    qty,
                    price,
                    time_in_force: "PostOnly",
                })?;
                let signature =
                    signer.sign(&canonical_header(timestamp, api_key, recv_window_ms, &body));

                let request = PreparedRequest {
                    method: HttpMethod::Post,
                    path: V5_ORDER_PATH,
                    query: Vec::new(),
                    headers: vec![
                        (HEADER_API_KEY, api_key.to_string()),
                        (HEADER_TIMESTAMP, timestamp.to_string()),
                        (HEADER_RECV_WINDOW, recv_window_ms.to_string()),
                        (HEADER_SIGN, signature.clone()),
                        (HEADER_SIGN_TYPE, "2".to_string()),
                    ],
                    body: RequestBody::Json(body),
                };
                (signature, request)
            }
        };

        Ok(SignedOrder {
            order: OrderRequest {
                symbol: draft.symbol.to_string(),
                side: draft.side,
                kind: OrderKind::Limit,
                time_in_force: TimeInForce::PostOnly,
                quantity: draft.quantity,
                price: draft.price,
                timestamp,
                signature,
            },
            request,
        })
    }
}

/// Return code and message from either envelope spelling (`retCode` / `ret_code`).
pub(crate) fn envelope_status(value: &Value) -> Option<(i64, String)> {
    let code = value.get("retCode").or_else(|| value.get("ret_code"))?;
    let code = code
        .as_i64()
        .or_else(|| code.as_str().and_then(|s| s.parse().ok()))?;
    let message = value
        .get("retMsg")
        .or_else(|| value.get("ret_msg"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some((code, message))
}

#[derive(Deserialize)]
struct OrderAck {
    #[serde(rename = "orderId")]
    order_id: Value,
}

/// Splits a raw order response into accepted, exchange-rejected, or unparseable.
pub fn parse_order_response(raw: &RawResponse) -> Result<OrderResult, SubmissionError> {
    if !raw.is_success() {
        return Err(SubmissionError::Status {
            status: raw.status,
            body: raw.body.clone(),
        });
    }

    let value: Value =
        serde_json::from_str(&raw.body).map_err(|e| SubmissionError::Parse(e.to_string()))?;
    let (code, message) = envelope_status(&value)
        .ok_or_else(|| SubmissionError::Parse("response has no return code".to_string()))?;

    if code != 0 {
        return Ok(OrderResult::rejected(format!("{code}: {message}"), value));
    }

    let order_id = value
        .get("result")
        .cloned()
        .and_then(|result| serde_json::from_value::<OrderAck>(result).ok())
        .and_then(|ack| match ack.order_id {
            Value::String(id) if !id.is_empty() => Some(id),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        })
        .ok_or_else(|| SubmissionError::Parse("accepted response has no order id".to_string()))?;

    Ok(OrderResult::accepted(order_id, value))
}
