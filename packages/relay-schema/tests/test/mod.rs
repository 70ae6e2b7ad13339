#![allow(dead_code)]

pub mod prelude {
    pub use super::star_wars::*;
    pub use super::util::*;
    pub use assert_matches::*;
    pub use async_graphql::dynamic::Schema;
    pub use async_graphql::{Request, Response, ServerError};
    pub use insta::*;
    pub use relay_schema::*;
    pub use serde_json::{json, Value as JsonValue};
}

pub mod util {
    use super::prelude::*;

    pub async fn execute_query(
        schema: &Schema,
        query: impl Into<String>,
    ) -> Result<Response, Vec<ServerError>> {
        let response = schema.execute(Request::new(query)).await;
        response.into_result()
    }

    /// Run a query expected to succeed and return its data as JSON.
    pub async fn query_json(schema: &Schema, query: impl Into<String>) -> JsonValue {
        let response = execute_query(schema, query).await.unwrap();
        response.data.into_json().unwrap()
    }

    /// Run a query expected to fail and return its error messages.
    pub async fn query_errors(schema: &Schema, query: impl Into<String>) -> Vec<String> {
        let errors = execute_query(schema, query).await.unwrap_err();
        errors.into_iter().map(|error| error.message).collect()
    }

    /// Argument names of `type_name.field`, read through introspection.
    pub async fn field_arguments(schema: &Schema, type_name: &str, field: &str) -> Vec<String> {
        let query = format!(
            r#"{{ __type(name: "{type_name}") {{ fields {{ name args {{ name }} }} }} }}"#
        );
        let data = query_json(schema, query).await;
        let fields = data["__type"]["fields"].as_array().unwrap();
        let field = fields.iter().find(|f| f["name"] == field).unwrap();
        field["args"]
            .as_array()
            .unwrap()
            .iter()
            .map(|arg| arg["name"].as_str().unwrap().to_string())
            .collect()
    }
}

/// The Star Wars rebels and empire, with their ships.
pub mod star_wars {
    use super::prelude::*;
    use std::sync::Mutex;

    #[derive(Clone)]
    pub struct Faction {
        pub id: String,
        pub name: String,
        pub ships: Vec<String>,
    }

    pub struct StarWars {
        ships: Mutex<Vec<(String, String)>>,
        factions: Mutex<Vec<Faction>>,
    }

    impl Default for StarWars {
        fn default() -> Self {
            let ships = [
                "X-Wing",
                "Y-Wing",
                "A-Wing",
                "Millenium Falcon",
                "Home One",
                "TIE Fighter",
                "TIE Interceptor",
                "Executor",
            ]
            .iter()
            .enumerate()
            .map(|(i, name)| ((i + 1).to_string(), name.to_string()))
            .collect();
            let factions = vec![
                Faction {
                    id: "1".to_string(),
                    name: "Alliance to Restore the Republic".to_string(),
                    ships: ["1", "2", "3", "4", "5"].map(String::from).to_vec(),
                },
                Faction {
                    id: "2".to_string(),
                    name: "Galactic Empire".to_string(),
                    ships: ["6", "7", "8"].map(String::from).to_vec(),
                },
            ];
            Self {
                ships: Mutex::new(ships),
                factions: Mutex::new(factions),
            }
        }
    }

    impl StarWars {
        pub fn ship(&self, id: &str) -> Option<NodeValue> {
            let ships = self.ships.lock().unwrap();
            ships
                .iter()
                .find(|(ship_id, _)| ship_id == id)
                .map(|(id, name)| NodeValue::new("Ship", id.as_str(), json!({ "name": name })))
        }

        pub fn all_ships(&self) -> Vec<NodeValue> {
            let ids = self
                .ships
                .lock()
                .unwrap()
                .iter()
                .map(|(id, _)| id.clone())
                .collect::<Vec<_>>();
            ids.iter().filter_map(|id| self.ship(id)).collect()
        }

        pub fn faction(&self, id: &str) -> Option<NodeValue> {
            let factions = self.factions.lock().unwrap();
            factions.iter().find(|faction| faction.id == id).map(|faction| {
                NodeValue::new("Faction", faction.id.as_str(), json!({ "name": faction.name }))
            })
        }

        pub fn faction_ships(&self, id: &str) -> Vec<NodeValue> {
            let ship_ids = self
                .factions
                .lock()
                .unwrap()
                .iter()
                .find(|faction| faction.id == id)
                .map(|faction| faction.ships.clone())
                .unwrap_or_default();
            ship_ids.iter().filter_map(|id| self.ship(id)).collect()
        }

        pub fn introduce_ship(&self, name: &str, faction_id: &str) -> Option<NodeValue> {
            let id = {
                let mut ships = self.ships.lock().unwrap();
                let id = (ships.len() + 1).to_string();
                ships.push((id.clone(), name.to_string()));
                id
            };
            let mut factions = self.factions.lock().unwrap();
            let faction = factions.iter_mut().find(|faction| faction.id == faction_id)?;
            faction.ships.push(id.clone());
            drop(factions);
            self.ship(&id)
        }
    }

    pub fn ship_object() -> ObjectDef<StarWars> {
        ObjectDef::<StarWars>::node("Ship")
            .description("A ship in the Star Wars saga")
            .scalar(
                ScalarField::new("name", ScalarKind::String).description("The name of the ship."),
            )
            .get_node(|id, data: &StarWars, _| Ok(data.ship(id)))
    }

    pub fn star_wars_registry(config: RelayConfig) -> RelayResult<SchemaRegistry<StarWars>> {
        let mut registry = SchemaRegistry::<StarWars>::new(config);
        registry.register_object(ship_object())?;

        let ships = registry.connection_for("Ship")?;
        registry.register_object(
            ObjectDef::<StarWars>::node("Faction")
                .description("A faction in the Star Wars saga")
                .scalar(ScalarField::new("name", ScalarKind::String))
                .get_node(|id, data: &StarWars, _| Ok(data.faction(id)))
                .connection(
                    ConnectionField::<StarWars>::new("ships", ships.clone(), |request| {
                        let faction = request.parent.map(NodeValue::local_id).unwrap_or_default();
                        Ok(request.context.faction_ships(faction))
                    })
                    .description("The ships used by the faction."),
                ),
        )?;
        registry.query_connection(ConnectionField::<StarWars>::new("allShips", ships, |request| {
            Ok(request.context.all_ships())
        }))?;

        registry.register_mutation(
            MutationDef::<StarWars>::new("IntroduceShip")
                .input_field(InputField::new("shipName", ScalarKind::String).required())
                .input_field(InputField::new("factionId", ScalarKind::Id).required())
                .output_field(OutputField::node("ship", "Ship"))
                .output_field(OutputField::node("faction", "Faction"))
                .mutate_and_get_payload(|input, data: &StarWars| {
                    let name = input
                        .get("shipName")
                        .and_then(JsonValue::as_str)
                        .unwrap_or_default();
                    let faction_id = input
                        .get("factionId")
                        .and_then(JsonValue::as_str)
                        .unwrap_or_default();
                    let mut payload = Payload::new();
                    if let Some(ship) = data.introduce_ship(name, faction_id) {
                        payload = payload.node("ship", ship);
                    }
                    if let Some(faction) = data.faction(faction_id) {
                        payload = payload.node("faction", faction);
                    }
                    Ok(payload)
                }),
        )?;

        Ok(registry)
    }

    pub fn star_wars_schema(config: RelayConfig) -> Schema {
        star_wars_registry(config)
            .unwrap()
            .build(StarWars::default())
            .unwrap()
    }
}
