//! REST wire shapes for push and pull.
//!
//! # Responsibility
//! - Encode push envelopes (`PUT /api/<collection>/<id>`) and decode push
//!   acks and pull pages.
//! - Keep decoding strict: any shape mismatch is a decode error, never a
//!   silently-empty result.

use crate::model::cemetery::Cemetery;
use crate::model::photo::Photo;
use crate::model::plot::{Individual, Plot};
use crate::model::{Entity, EntityKind};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of an upsert push: the record plus the local revision being
/// pushed. A conforming backend stores the revision and echoes it back.
#[derive(Debug, Serialize)]
struct PushEnvelope<'a, T: Serialize> {
    revision: u64,
    record: &'a T,
}

/// Backend acknowledgement of one upsert.
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct PushAck {
    pub revision: u64,
}

#[derive(Debug, Deserialize)]
struct PullPage<T> {
    records: Vec<PullItem<T>>,
}

#[derive(Debug, Deserialize)]
struct PullItem<T> {
    revision: u64,
    record: T,
}

/// Encodes one entity as an upsert body.
pub fn encode_push(entity: &Entity, revision: u64) -> Value {
    // Infallible for these types: all fields serialize to plain JSON.
    let result = match entity {
        Entity::Cemetery(cemetery) => serde_json::to_value(PushEnvelope {
            revision,
            record: cemetery,
        }),
        Entity::Plot(plot) => serde_json::to_value(PushEnvelope {
            revision,
            record: plot,
        }),
        Entity::Individual(individual) => serde_json::to_value(PushEnvelope {
            revision,
            record: individual,
        }),
        Entity::Photo(photo) => serde_json::to_value(PushEnvelope {
            revision,
            record: photo,
        }),
    };
    result.unwrap_or(Value::Null)
}

/// Decodes the backend's upsert acknowledgement.
pub fn decode_push_ack(body: &str) -> Result<PushAck, String> {
    serde_json::from_str(body).map_err(|err| err.to_string())
}

/// Decodes one pull page into entities plus their backend revisions.
pub fn decode_pull_page(kind: EntityKind, body: &str) -> Result<Vec<(Entity, u64)>, String> {
    match kind {
        EntityKind::Cemetery => decode_page::<Cemetery>(body, Entity::Cemetery),
        EntityKind::Plot => decode_page::<Plot>(body, Entity::Plot),
        EntityKind::Individual => decode_page::<Individual>(body, Entity::Individual),
        EntityKind::Photo => decode_page::<Photo>(body, Entity::Photo),
    }
}

fn decode_page<T: DeserializeOwned>(
    body: &str,
    wrap: impl Fn(T) -> Entity,
) -> Result<Vec<(Entity, u64)>, String> {
    let page: PullPage<T> = serde_json::from_str(body).map_err(|err| err.to_string())?;
    Ok(page
        .records
        .into_iter()
        .map(|item| (wrap(item.record), item.revision))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{decode_pull_page, decode_push_ack, encode_push};
    use crate::model::cemetery::Cemetery;
    use crate::model::{Entity, EntityKind};
    use uuid::Uuid;

    #[test]
    fn push_envelope_carries_revision_and_record() {
        let cemetery = Cemetery::with_id(Uuid::nil(), "Oakwood");
        let value = encode_push(&Entity::Cemetery(cemetery), 7);
        assert_eq!(value["revision"], 7);
        assert_eq!(value["record"]["name"], "Oakwood");
    }

    #[test]
    fn push_ack_decodes_revision() {
        let ack = decode_push_ack(r#"{"revision": 12}"#).expect("ack should decode");
        assert_eq!(ack.revision, 12);
    }

    #[test]
    fn push_ack_rejects_non_json_body() {
        assert!(decode_push_ack("").is_err());
        assert!(decode_push_ack("<html></html>").is_err());
    }

    #[test]
    fn pull_page_round_trips_entities() {
        let body = format!(
            r#"{{"records": [{{"revision": 3, "record": {{
                "id": "{}", "name": "Oakwood", "location": "", "description": "",
                "coordinate": null
            }}}}]}}"#,
            Uuid::nil()
        );
        let page = decode_pull_page(EntityKind::Cemetery, &body).expect("page should decode");
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].1, 3);
        match &page[0].0 {
            Entity::Cemetery(cemetery) => assert_eq!(cemetery.name, "Oakwood"),
            other => panic!("unexpected entity: {other:?}"),
        }
    }

    #[test]
    fn pull_page_rejects_shape_mismatch() {
        assert!(decode_pull_page(EntityKind::Cemetery, r#"{"records": [{"x": 1}]}"#).is_err());
    }
}
