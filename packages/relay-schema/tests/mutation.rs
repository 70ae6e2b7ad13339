mod test;

use crate::test::prelude::*;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn introduce_ship_echoes_client_mutation_id() {
    let schema = star_wars_schema(RelayConfig::default());

    let response = execute_query(
        &schema,
        r#"
            mutation AddBWingQuery {
                introduceShip(input: { shipName: "B-Wing", factionId: "1", clientMutationId: "abc123" }) {
                    ship {
                        id
                        name
                    }
                    faction {
                        name
                    }
                    clientMutationId
                }
            }
        "#,
    )
    .await
    .unwrap();

    assert_json_snapshot!(response.data, @r###"
    {
      "introduceShip": {
        "ship": {
          "id": "U2hpcDo5",
          "name": "B-Wing"
        },
        "faction": {
          "name": "Alliance to Restore the Republic"
        },
        "clientMutationId": "abc123"
      }
    }
    "###
    );
}

#[tokio::test]
async fn introduced_ship_joins_the_faction() {
    let schema = star_wars_schema(RelayConfig::default());

    query_json(
        &schema,
        r#"mutation { introduceShip(input: { shipName: "B-Wing", factionId: "1", clientMutationId: "x" }) { clientMutationId } }"#,
    )
    .await;

    let data = query_json(
        &schema,
        r#"{ node(id: "RmFjdGlvbjox") { ... on Faction { ships(last: 1) { edges { node { id name } } } } } }"#,
    )
    .await;

    assert_eq!(
        data["node"]["ships"]["edges"][0]["node"],
        json!({ "id": "U2hpcDo5", "name": "B-Wing" })
    );
}

#[tokio::test]
async fn unknown_faction_leaves_payload_fields_null() {
    let schema = star_wars_schema(RelayConfig::default());

    let data = query_json(
        &schema,
        r#"mutation { introduceShip(input: { shipName: "B-Wing", factionId: "9", clientMutationId: "" }) { ship { id } faction { id } clientMutationId } }"#,
    )
    .await;

    assert_eq!(
        data,
        json!({ "introduceShip": { "ship": null, "faction": null, "clientMutationId": "" } })
    );
}

#[tokio::test]
async fn client_mutation_id_is_required() {
    let schema = star_wars_schema(RelayConfig::default());

    let errors = query_errors(
        &schema,
        r#"mutation { introduceShip(input: { shipName: "B-Wing", factionId: "1" }) { clientMutationId } }"#,
    )
    .await;

    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("clientMutationId"));
}

#[tokio::test]
async fn input_and_payload_types() {
    let schema = star_wars_schema(RelayConfig::default());

    let data = query_json(
        &schema,
        r#"
            query {
                input: __type(name: "IntroduceShipInput") {
                    kind
                    inputFields { name type { kind ofType { name } } }
                }
                payload: __type(name: "IntroduceShipPayload") {
                    fields { name }
                }
            }
        "#,
    )
    .await;

    assert_eq!(data["input"]["kind"], "INPUT_OBJECT");
    assert_eq!(
        data["input"]["inputFields"],
        json!([
            { "name": "shipName", "type": { "kind": "NON_NULL", "ofType": { "name": "String" } } },
            { "name": "factionId", "type": { "kind": "NON_NULL", "ofType": { "name": "ID" } } },
            { "name": "clientMutationId", "type": { "kind": "NON_NULL", "ofType": { "name": "String" } } }
        ])
    );
    assert_eq!(
        data["payload"]["fields"],
        json!([
            { "name": "ship" },
            { "name": "faction" },
            { "name": "clientMutationId" }
        ])
    );
}

#[test]
fn mutations_need_mutate_and_get_payload() {
    let mut registry = star_wars_registry(RelayConfig::default()).unwrap();

    assert_matches!(
        registry.register_mutation(MutationDef::new("DestroyShip")),
        Err(RelayError::MissingMutateAndGetPayload(name)) if name == "DestroyShip"
    );
}

#[test]
fn payload_nodes_must_be_registered_nodes() {
    let mut registry = star_wars_registry(RelayConfig::default()).unwrap();
    registry
        .register_mutation(
            MutationDef::new("LandShip")
                .output_field(OutputField::node("planet", "Planet"))
                .mutate_and_get_payload(|_, _| Ok(Payload::new())),
        )
        .unwrap();

    assert_matches!(
        registry.finish().err(),
        Some(RelayError::UnknownType(name)) if name == "Planet"
    );
}

#[tokio::test]
async fn payload_nodes_must_match_their_field() {
    let mut registry = star_wars_registry(RelayConfig::default()).unwrap();
    registry
        .register_mutation(
            MutationDef::<StarWars>::new("CaptureShip")
                .output_field(OutputField::node("ship", "Ship"))
                .mutate_and_get_payload(|_, data: &StarWars| {
                    let empire = data.faction("2").into_iter();
                    Ok(empire.fold(Payload::new(), |payload, node| payload.node("ship", node)))
                }),
        )
        .unwrap();
    let schema = registry.build(StarWars::default()).unwrap();

    let errors = query_errors(
        &schema,
        r#"mutation { captureShip(input: { clientMutationId: "x" }) { ship { id } } }"#,
    )
    .await;

    assert_eq!(
        errors,
        vec![r#"Expected a node of type "Ship", got "Faction""#]
    );
}

#[test]
fn generated_type_names_are_taken() {
    let mut registry = star_wars_registry(RelayConfig::default()).unwrap();

    assert_matches!(
        registry.register_object(ObjectDef::new("IntroduceShipPayload")),
        Err(RelayError::DuplicateType(name)) if name == "IntroduceShipPayload"
    );
    assert_matches!(
        registry.register_object(ObjectDef::new("IntroduceShipInput")),
        Err(RelayError::DuplicateType(name)) if name == "IntroduceShipInput"
    );
}
