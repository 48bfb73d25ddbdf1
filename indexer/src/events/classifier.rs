//! Raw event classification.
//!
//! Maps a raw chain event to a typed [`DomainEvent`]. Classification is pure
//! and total: unknown topics yield `None`, and missing fields default to zero
//! or the empty string instead of failing.
//!
//! The value blob may be a map of named fields (snake_case or camelCase) or
//! the positional tuple the factory contract publishes:
//!
//! | topic | tuple layout |
//! |---|---|
//! | `burn` | `(from, amount, ..)` |
//! | `admin_burn`, `adm_burn` | `(admin, from, amount, ..)` |
//! | `batch_burn` | `(admin, count, total_burned, new_supply)` |
//! | `token_created` | `(creator, name, symbol, decimals, initial_supply)` |
//! | `tok_reg` | `(creator,)` |
//! | `metadata_updated`, `meta_upd` | `(metadata_uri, updated_by)` |
//!
//! A batch burn spans several holders, so it is reported as an admin burn
//! of `total_burned` with an empty `from`.
//!
//! The contract's burn topics name the token by its factory index
//! (`topic[1]` is a number) rather than by address. The index is carried as
//! `token_index`, and `token_address` falls back to the emitting factory
//! contract, so token-scoped subscriptions only match these burns when they
//! are scoped to the factory address.

use launchpad_sdk::{
    Amount, BurnEvent, DomainEvent, MetadataUpdatedEvent, RawEvent, TokenCreatedEvent,
};
use serde_json::Value;

const BURN_LAYOUT: &[&str] = &["from", "amount"];
const ADMIN_BURN_LAYOUT: &[&str] = &["admin", "from", "amount"];
const BATCH_BURN_LAYOUT: &[&str] = &["admin", "count", "total_burned", "new_supply"];
const TOKEN_CREATED_LAYOUT: &[&str] = &["creator", "name", "symbol", "decimals", "initial_supply"];
const TOKEN_REGISTERED_LAYOUT: &[&str] = &["creator"];
const METADATA_LAYOUT: &[&str] = &["metadata_uri", "updated_by"];

/// Classifies a raw event into a domain event.
///
/// Returns `None` for topics that are not token-factory events.
#[must_use]
pub fn classify(raw: &RawEvent) -> Option<DomainEvent> {
    let topic = raw.topic_name()?;

    match topic {
        "burn" => Some(classify_burn(raw, Fields::new(&raw.value, BURN_LAYOUT))),
        "admin_burn" | "adm_burn" => {
            Some(classify_burn(raw, Fields::new(&raw.value, ADMIN_BURN_LAYOUT)))
        }
        "batch_burn" => Some(classify_batch_burn(
            raw,
            Fields::new(&raw.value, BATCH_BURN_LAYOUT),
        )),
        "token_created" => Some(classify_token_created(
            raw,
            Fields::new(&raw.value, TOKEN_CREATED_LAYOUT),
        )),
        "tok_reg" => Some(classify_token_created(
            raw,
            Fields::new(&raw.value, TOKEN_REGISTERED_LAYOUT),
        )),
        "metadata_updated" | "meta_upd" => Some(classify_metadata_updated(
            raw,
            Fields::new(&raw.value, METADATA_LAYOUT),
        )),
        _ => None,
    }
}

fn classify_burn(raw: &RawEvent, fields: Fields<'_>) -> DomainEvent {
    let from = fields.text("from");
    let admin = fields.get("admin").and_then(as_text).filter(|a| !a.is_empty());

    let event = BurnEvent {
        token_address: token_address(raw, &fields),
        tx_hash: raw.tx_hash.clone(),
        ledger: raw.ledger,
        amount: fields.amount("amount"),
        burner: admin.clone().unwrap_or_else(|| from.clone()),
        from: from.clone(),
        token_index: token_index(raw),
    };

    match admin {
        Some(admin) if admin != from => DomainEvent::BurnAdmin(event),
        _ => DomainEvent::BurnSelf(event),
    }
}

fn classify_batch_burn(raw: &RawEvent, fields: Fields<'_>) -> DomainEvent {
    DomainEvent::BurnAdmin(BurnEvent {
        token_address: token_address(raw, &fields),
        tx_hash: raw.tx_hash.clone(),
        ledger: raw.ledger,
        from: String::new(),
        amount: fields.amount("total_burned"),
        burner: fields.text("admin"),
        token_index: token_index(raw),
    })
}

fn classify_token_created(raw: &RawEvent, fields: Fields<'_>) -> DomainEvent {
    DomainEvent::TokenCreated(TokenCreatedEvent {
        token_address: token_address(raw, &fields),
        tx_hash: raw.tx_hash.clone(),
        ledger: raw.ledger,
        creator: fields.text("creator"),
        name: fields.text("name"),
        symbol: fields.text("symbol"),
        decimals: fields.u32("decimals"),
        initial_supply: fields.amount("initial_supply"),
    })
}

fn classify_metadata_updated(raw: &RawEvent, fields: Fields<'_>) -> DomainEvent {
    DomainEvent::MetadataUpdated(MetadataUpdatedEvent {
        token_address: token_address(raw, &fields),
        tx_hash: raw.tx_hash.clone(),
        ledger: raw.ledger,
        metadata_uri: fields.text("metadata_uri"),
        updated_by: fields.text("updated_by"),
    })
}

/// Token address from the value blob, then the second topic, then the
/// emitting contract.
fn token_address(raw: &RawEvent, fields: &Fields<'_>) -> String {
    fields
        .get("token_address")
        .and_then(as_text)
        .or_else(|| {
            raw.topic
                .get(1)
                .and_then(|t| t.as_str().map(str::to_string))
        })
        .unwrap_or_else(|| raw.contract_id.clone())
}

/// Numeric token index in the second topic, if any.
fn token_index(raw: &RawEvent) -> Option<u32> {
    raw.topic
        .get(1)
        .and_then(Value::as_u64)
        .and_then(|index| u32::try_from(index).ok())
}

/// Named or positional view over an event value blob.
struct Fields<'a> {
    value: &'a Value,
    layout: &'static [&'static str],
}

impl<'a> Fields<'a> {
    const fn new(value: &'a Value, layout: &'static [&'static str]) -> Self {
        Self { value, layout }
    }

    fn get(&self, name: &str) -> Option<&'a Value> {
        match self.value {
            Value::Object(map) => map.get(name).or_else(|| map.get(&camel_case(name))),
            Value::Array(items) => self
                .layout
                .iter()
                .position(|field| *field == name)
                .and_then(|i| items.get(i)),
            _ => None,
        }
    }

    fn text(&self, name: &str) -> String {
        self.get(name).and_then(as_text).unwrap_or_default()
    }

    fn amount(&self, name: &str) -> Amount {
        match self.get(name) {
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Amount::from)
                .or_else(|| n.as_u64().map(|v| Amount::new(i128::from(v))))
                .unwrap_or_default(),
            Some(Value::String(s)) => s.parse().unwrap_or_default(),
            _ => Amount::zero(),
        }
    }

    fn u32(&self, name: &str) -> u32 {
        let parsed = match self.get(name) {
            Some(Value::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.unwrap_or(0)
    }
}

/// Reads an address or string value. Addresses may be wrapped as
/// `{"address": ".."}`.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map
            .get("address")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use launchpad_sdk::EventKind;
    use serde_json::json;

    fn raw(topic: Vec<Value>, value: Value) -> RawEvent {
        RawEvent {
            id: "evt-1".to_string(),
            paging_token: "0000100-1".to_string(),
            ledger: 100,
            ledger_closed_at: None,
            contract_id: "CFACTORY".to_string(),
            tx_hash: "tx-1".to_string(),
            topic,
            value,
        }
    }

    #[test]
    fn test_classify_burn_with_distinct_admin() {
        let event = raw(
            vec![json!("burn")],
            json!({"token_address": "CTOKEN", "from": "GHOLDER", "admin": "GADMIN", "amount": "500"}),
        );

        let classified = classify(&event).expect("burn event");
        assert_eq!(classified.kind(), EventKind::BurnAdmin);

        let DomainEvent::BurnAdmin(burn) = classified else {
            unreachable!("expected admin burn");
        };
        assert_eq!(burn.burner, "GADMIN");
        assert_eq!(burn.from, "GHOLDER");
        assert_eq!(burn.amount, Amount::new(500));
    }

    #[test]
    fn test_classify_burn_without_admin_is_self() {
        let event = raw(
            vec![json!("burn")],
            json!({"tokenAddress": "CTOKEN", "from": "GHOLDER", "amount": 10}),
        );

        let classified = classify(&event).expect("burn event");
        assert_eq!(classified.kind(), EventKind::BurnSelf);
        assert_eq!(classified.token_address(), "CTOKEN");
    }

    #[test]
    fn test_classify_burn_admin_equal_to_holder_is_self() {
        let event = raw(
            vec![json!("burn")],
            json!({"from": "GHOLDER", "admin": "GHOLDER", "amount": 10}),
        );
        assert_eq!(classify(&event).map(|e| e.kind()), Some(EventKind::BurnSelf));
    }

    #[test]
    fn test_classify_contract_admin_burn_tuple() {
        let event = raw(
            vec![json!({"symbol": "admin_burn"}), json!(3)],
            json!(["GADMIN", "GHOLDER", "750", "1000"]),
        );

        let Some(DomainEvent::BurnAdmin(burn)) = classify(&event) else {
            unreachable!("expected admin burn");
        };
        assert_eq!(burn.from, "GHOLDER");
        assert_eq!(burn.burner, "GADMIN");
        assert_eq!(burn.amount, Amount::new(750));
        // Numeric topic qualifier is a token index, not an address.
        assert_eq!(burn.token_address, "CFACTORY");
        assert_eq!(burn.token_index, Some(3));
    }

    #[test]
    fn test_classify_batch_burn_tuple() {
        let event = raw(
            vec![json!({"symbol": "batch_burn"}), json!(2)],
            json!(["GADMIN", 4, "1200", "8800"]),
        );

        let classified = classify(&event).expect("batch burn");
        assert_eq!(classified.kind(), EventKind::BurnAdmin);

        let DomainEvent::BurnAdmin(burn) = classified else {
            unreachable!("expected admin burn");
        };
        assert_eq!(burn.burner, "GADMIN");
        assert_eq!(burn.from, "");
        assert_eq!(burn.amount, Amount::new(1200));
        assert_eq!(burn.token_index, Some(2));
        assert_eq!(burn.token_address, "CFACTORY");
    }

    #[test]
    fn test_classify_batch_burn_named_fields() {
        let event = raw(
            vec![json!("batch_burn")],
            json!({"tokenAddress": "CTOKEN", "admin": "GADMIN", "count": 2, "totalBurned": 90}),
        );

        let Some(DomainEvent::BurnAdmin(burn)) = classify(&event) else {
            unreachable!("expected admin burn");
        };
        assert_eq!(burn.token_address, "CTOKEN");
        assert_eq!(burn.amount, Amount::new(90));
        assert!(burn.token_index.is_none());
    }

    #[test]
    fn test_classify_token_created() {
        let event = raw(
            vec![json!("token_created"), json!("CTOKEN")],
            json!({
                "creator": "GCREATOR",
                "name": "Launch",
                "symbol": "LNCH",
                "decimals": 7,
                "initialSupply": "1000000"
            }),
        );

        let Some(DomainEvent::TokenCreated(created)) = classify(&event) else {
            unreachable!("expected token created");
        };
        assert_eq!(created.token_address, "CTOKEN");
        assert_eq!(created.creator, "GCREATOR");
        assert_eq!(created.decimals, 7);
        assert_eq!(created.initial_supply, Amount::new(1_000_000));
        assert_eq!(created.ledger, 100);
        assert_eq!(created.tx_hash, "tx-1");
    }

    #[test]
    fn test_classify_token_registered_alias() {
        let event = raw(vec![json!("tok_reg"), json!("CTOKEN")], json!(["GCREATOR"]));

        let Some(DomainEvent::TokenCreated(created)) = classify(&event) else {
            unreachable!("expected token created");
        };
        assert_eq!(created.creator, "GCREATOR");
        assert_eq!(created.name, "");
        assert_eq!(created.decimals, 0);
        assert!(created.initial_supply.is_zero());
    }

    #[test]
    fn test_classify_metadata_updated() {
        let event = raw(
            vec![json!("metadata_updated")],
            json!({"token_address": "CTOKEN", "metadata_uri": "ipfs://meta", "updated_by": {"address": "GADMIN"}}),
        );

        let Some(DomainEvent::MetadataUpdated(updated)) = classify(&event) else {
            unreachable!("expected metadata update");
        };
        assert_eq!(updated.metadata_uri, "ipfs://meta");
        assert_eq!(updated.updated_by, "GADMIN");
    }

    #[test]
    fn test_classify_missing_fields_default() {
        let event = raw(vec![json!("burn")], Value::Null);

        let Some(DomainEvent::BurnSelf(burn)) = classify(&event) else {
            unreachable!("expected self burn");
        };
        assert_eq!(burn.from, "");
        assert!(burn.amount.is_zero());
    }

    #[test]
    fn test_classify_unknown_topic() {
        assert!(classify(&raw(vec![json!("fee_upd")], json!([1, 2]))).is_none());
        assert!(classify(&raw(vec![], json!({}))).is_none());
        assert!(classify(&raw(vec![json!(42)], json!({}))).is_none());
    }

    #[test]
    fn test_classify_is_deterministic() {
        let event = raw(vec![json!("burn")], json!({"from": "G1", "amount": 5}));
        assert_eq!(classify(&event), classify(&event));
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("token_address"), "tokenAddress");
        assert_eq!(camel_case("from"), "from");
    }
}
