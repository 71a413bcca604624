use goas::config::GeneratorConfig;
use goas::error::Error;
use goas::generator::{generate, Generator};
use goas::serializer::{serialize_json, serialize_yaml};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

const GO_MOD: &str = "module example.com/app\n\ngo 1.21\n";
const MAIN_GO: &str = "// @Version 1.0.0\n// @Title Test API\npackage main\n\nfunc main() {}\n";

/// Helper function to create a temporary Go module with the given files
fn create_test_project(files: Vec<(&str, &str)>) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    for (path, content) in files {
        let file_path = temp_dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&file_path, content).expect("Failed to write test file");
    }

    temp_dir
}

/// A module with the default go.mod and main.go plus `files`
fn create_app(files: Vec<(&str, &str)>) -> TempDir {
    let mut all = vec![("go.mod", GO_MOD), ("main.go", MAIN_GO)];
    all.extend(files);
    create_test_project(all)
}

fn create_petstore() -> TempDir {
    create_test_project(vec![
        ("go.mod", include_str!("fixtures/petstore/go.mod")),
        ("main.go", include_str!("fixtures/petstore/main.go")),
        ("models/pet.go", include_str!("fixtures/petstore/models/pet.go")),
        ("models/headers.go", include_str!("fixtures/petstore/models/headers.go")),
        ("handlers/pets.go", include_str!("fixtures/petstore/handlers/pets.go")),
    ])
}

/// Configuration that never falls back to a Go installation on the host
fn isolated_config(dir: &Path) -> GeneratorConfig {
    GeneratorConfig::new(dir)
        .with_go_mod_cache(dir.join("no-module-cache"))
        .with_go_root_src(dir.join("no-go-root"))
}

fn generate_json(config: &GeneratorConfig) -> Value {
    let document = generate(config).expect("Failed to generate document");
    let json = serialize_json(&document).expect("Failed to serialize document");
    serde_json::from_str(&json).expect("Output is not valid JSON")
}

fn property_names(generator: &Generator, id: &str) -> Vec<String> {
    generator.schema_generator().get_schemas()[id]
        .properties
        .as_ref()
        .map(|properties| properties.keys().cloned().collect())
        .unwrap_or_default()
}

#[test]
fn test_end_to_end_petstore() {
    let temp_dir = create_petstore();
    let config = isolated_config(temp_dir.path()).with_schema_without_package(true);

    // Step 1: Generate and serialize the document
    let doc = generate_json(&config);

    // Step 2: Verify general API info
    assert_eq!(doc["openapi"], "3.0.0");
    assert_eq!(doc["info"]["title"], "Petstore API");
    assert_eq!(doc["info"]["version"], "1.0.0");
    assert_eq!(doc["info"]["description"], "Manage the pets in the store.");
    assert_eq!(doc["info"]["contact"]["email"], "support@petstore.example.com");
    assert_eq!(doc["info"]["license"]["name"], "MIT");
    assert_eq!(
        doc["servers"],
        json!([{"url": "https://api.petstore.example.com", "description": "Production"}])
    );
    assert_eq!(doc["security"], json!([{"AuthorizationHeader": []}]));
    assert_eq!(
        doc["components"]["securitySchemes"]["AuthorizationHeader"],
        json!({"type": "http", "description": "Input your token", "scheme": "bearer"})
    );
    assert_eq!(
        doc["tags"],
        json!([{"name": "pets", "description": "Everything about pets"}])
    );

    // Step 3: Verify the paths, hidden operations excluded
    let paths: Vec<&String> = doc["paths"].as_object().unwrap().keys().collect();
    assert_eq!(paths, vec!["/account", "/pets", "/pets/{id}", "/pets/{id}/photo"]);

    // Step 4: Verify individual operations
    assert_eq!(
        doc["paths"]["/pets"]["get"],
        json!({
            "tags": ["pets"],
            "summary": "List pets",
            "description": "Returns all pets. Supports paging.",
            "parameters": [
                {
                    "name": "limit",
                    "in": "query",
                    "description": "Max items",
                    "example": 10,
                    "schema": {"type": "integer"}
                },
                {"$ref": "#/components/parameters/X-Request-Id"}
            ],
            "responses": {
                "200": {
                    "description": "The pets",
                    "content": {"application/json": {"schema": {
                        "type": "array",
                        "items": {"$ref": "#/components/schemas/Pet"}
                    }}}
                },
                "500": {
                    "description": "Server error",
                    "content": {"application/json": {"schema": {
                        "$ref": "#/components/schemas/Error"
                    }}}
                }
            }
        })
    );

    let get_pet = &doc["paths"]["/pets/{id}"]["get"];
    assert_eq!(get_pet["tags"], json!(["pets"]));
    assert_eq!(
        get_pet["parameters"],
        json!([{
            "name": "id",
            "in": "path",
            "description": "Pet id",
            "required": true,
            "schema": {"type": "integer", "format": "int64"}
        }])
    );
    assert_eq!(get_pet["responses"]["404"], json!({"description": "Not found"}));

    let create_pet = &doc["paths"]["/pets"]["post"];
    assert_eq!(create_pet["operationId"], "createPet");
    assert_eq!(
        create_pet["requestBody"],
        json!({
            "description": "Pet to add",
            "required": true,
            "content": {"application/json": {
                "schema": {"$ref": "#/components/schemas/Pet"},
                "example": {"name": "Rex"}
            }}
        })
    );
    assert_eq!(
        create_pet["responses"]["202"]["content"]["application/json"]["schema"],
        json!({"$ref": "#/components/schemas/Handler.CreatePet.response"})
    );

    let upload = &doc["paths"]["/pets/{id}/photo"]["post"];
    assert_eq!(upload["deprecated"], true);
    assert_eq!(
        upload["requestBody"],
        json!({
            "required": true,
            "content": {"multipart/form-data": {"schema": {
                "type": "object",
                "required": ["photo"],
                "properties": {
                    "photo": {"type": "string", "format": "binary", "description": "Photo"},
                    "caption": {"type": "string", "description": "Caption"}
                }
            }}}
        })
    );
    assert_eq!(
        upload["responses"]["200"]["content"],
        json!({"text/plain": {"schema": {"type": "string"}}})
    );

    // Step 5: Verify components
    assert_eq!(
        doc["components"]["schemas"]["Pet"],
        json!({
            "type": "object",
            "required": ["id", "name"],
            "properties": {
                "id": {"type": "integer", "format": "int64", "example": 42},
                "name": {"type": "string", "example": "Rex"},
                "tag": {"type": "string", "enum": ["dog", "cat", "bird"]},
                "owner": {"$ref": "#/components/schemas/Owner"},
                "friends": {"type": "array", "items": {"$ref": "#/components/schemas/Pet"}},
                "labels": {"type": "object", "additionalProperties": {"type": "string"}},
                "created_at": {"type": "string", "format": "date-time"},
                "created_by": {"type": "string"},
                "password": {"type": "string"}
            }
        })
    );
    assert_eq!(
        doc["components"]["schemas"]["Owner"]["properties"]["pets"],
        json!({"type": "array", "items": {"$ref": "#/components/schemas/Pet"}})
    );
    assert_eq!(
        doc["components"]["schemas"]["Handler.CreatePet.response"],
        json!({
            "type": "object",
            "properties": {"id": {"type": "integer", "format": "int64"}}
        })
    );

    let header = &doc["components"]["parameters"]["X-Request-Id"];
    assert_eq!(header["in"], "header");
    assert_eq!(header["required"], true);
    assert_eq!(header["description"], "Correlation id");
    assert_eq!(header["example"], "req-1");
    assert_eq!(header["schema"]["type"], "string");
}

#[test]
fn test_petstore_yaml_output() {
    let temp_dir = create_petstore();
    let config = isolated_config(temp_dir.path());

    let document = generate(&config).unwrap();
    let yaml = serialize_yaml(&document).unwrap();

    assert!(yaml.contains("title: Petstore API"));
    assert!(yaml.contains("/pets/{id}"));
    assert!(yaml.contains("example.com.petstore.models.Pet:"));
}

#[test]
fn test_output_is_deterministic() {
    let temp_dir = create_petstore();
    let config = isolated_config(temp_dir.path());

    let first = serialize_json(&generate(&config).unwrap()).unwrap();
    for _ in 0..10 {
        let again = serialize_json(&generate(&config).unwrap()).unwrap();
        assert_eq!(again, first);
    }
}

#[test]
fn test_package_qualified_schema_ids() {
    let temp_dir = create_petstore();
    let doc = generate_json(&isolated_config(temp_dir.path()));

    let schemas = doc["components"]["schemas"].as_object().unwrap();
    assert!(schemas.contains_key("example.com.petstore.models.Pet"));
    assert!(schemas.contains_key("example.com.petstore.models.Owner"));
    assert!(schemas.contains_key("example.com.petstore.handlers.Handler.CreatePet.response"));
    assert_eq!(
        doc["paths"]["/pets/{id}"]["get"]["responses"]["200"]["content"]["application/json"]
            ["schema"],
        json!({"$ref": "#/components/schemas/example.com.petstore.models.Pet"})
    );
}

#[test]
fn test_package_alias() {
    let temp_dir = create_test_project(vec![
        ("go.mod", GO_MOD),
        (
            "main.go",
            "// @Version 1.0.0\n// @Title Test API\n// @PackageAlias \"models\" \"m\"\n// @PackageAlias \"api\" \"\"\npackage main\n\nfunc main() {}\n",
        ),
        (
            "models/pet.go",
            "package models\n\ntype Pet struct {\n\tName string `json:\"name\"`\n}\n",
        ),
        (
            "api/pets.go",
            r#"package api

import "example.com/app/models"

type Page struct {
	Pets []models.Pet `json:"pets"`
}

// @Title List pets
// @Success 200 {object} Page "ok"
// @Router /pets [get]
func ListPets() {}
"#,
        ),
    ]);

    let doc = generate_json(&isolated_config(temp_dir.path()));
    let schemas = doc["components"]["schemas"].as_object().unwrap();
    assert!(schemas.contains_key("m.Pet"));
    assert!(schemas.contains_key("Page"));
    assert_eq!(
        doc["components"]["schemas"]["Page"]["properties"]["pets"]["items"],
        json!({"$ref": "#/components/schemas/m.Pet"})
    );
}

#[test]
fn test_struct_field_order_and_rename() {
    let temp_dir = create_app(vec![(
        "api/people.go",
        r#"package api

type Person struct {
	Id   int
	Name string
	Age  int
}

type User struct {
	UserName string `json:"user_name" required:"true"`
	Nickname string `json:"nickname,omitempty"`
}

// @Title People
// @Success 200 {object} Person "ok"
// @Failure 400 {object} User "bad"
// @Router /people [get]
func People() {}
"#,
    )]);
    let config = isolated_config(temp_dir.path()).with_schema_without_package(true);

    let mut generator = Generator::new(&config).unwrap();
    generator.parse().unwrap();
    assert_eq!(property_names(&generator, "Person"), vec!["Id", "Name", "Age"]);
    assert_eq!(property_names(&generator, "User"), vec!["user_name", "nickname"]);

    let doc = generate_json(&config);
    let user = &doc["components"]["schemas"]["User"];
    assert_eq!(user["required"], json!(["user_name"]));
    assert!(user["properties"].get("UserName").is_none());

    // The serialized text keeps declaration order too
    let text = serialize_json(&generate(&config).unwrap()).unwrap();
    let person = &text[text.find("\"Person\": {").unwrap()..];
    let id = person.find("\"Id\"").unwrap();
    let name = person.find("\"Name\"").unwrap();
    let age = person.find("\"Age\"").unwrap();
    assert!(id < name && name < age);
}

#[test]
fn test_slice_of_struct_without_package() {
    let temp_dir = create_app(vec![(
        "api/foo.go",
        r#"package api

type Bar struct {
	Name string `json:"name"`
}

type Foo struct {
	Items []Bar `json:"items"`
}

// @Title Foo
// @Success 200 {object} Foo "ok"
// @Router /foo [get]
func GetFoo() {}
"#,
    )]);
    let config = isolated_config(temp_dir.path()).with_schema_without_package(true);

    let doc = generate_json(&config);
    assert_eq!(
        doc["components"]["schemas"],
        json!({
            "Bar": {"type": "object", "properties": {"name": {"type": "string"}}},
            "Foo": {
                "type": "object",
                "properties": {"items": {
                    "type": "array",
                    "items": {"$ref": "#/components/schemas/Bar"}
                }}
            }
        })
    );
}

#[test]
fn test_recursive_types_terminate() {
    let temp_dir = create_app(vec![(
        "api/tree.go",
        r#"package api

type Node struct {
	Value    string  `json:"value"`
	Parent   *Node   `json:"parent"`
	Children []*Node `json:"children"`
}

type Author struct {
	Books []Book `json:"books"`
}

type Book struct {
	Author Author `json:"author"`
}

// @Title Tree
// @Success 200 {object} Node "ok"
// @Failure 400 {object} Author "bad"
// @Router /tree [get]
func Tree() {}
"#,
    )]);
    let config = isolated_config(temp_dir.path()).with_schema_without_package(true);

    let doc = generate_json(&config);
    let schemas = &doc["components"]["schemas"];
    assert_eq!(schemas["Node"]["properties"]["parent"], json!({"$ref": "#/components/schemas/Node"}));
    assert_eq!(
        schemas["Node"]["properties"]["children"]["items"],
        json!({"$ref": "#/components/schemas/Node"})
    );
    assert_eq!(
        schemas["Author"]["properties"]["books"]["items"],
        json!({"$ref": "#/components/schemas/Book"})
    );
    assert_eq!(
        schemas["Book"]["properties"]["author"],
        json!({"$ref": "#/components/schemas/Author"})
    );
}

#[test]
fn test_embedded_field_omission() {
    let temp_dir = create_petstore();
    let config = isolated_config(temp_dir.path()).with_schema_without_package(true);

    let mut generator = Generator::new(&config).unwrap();
    generator.parse().unwrap();
    assert_eq!(property_names(&generator, "Account"), vec!["created_by", "email"]);

    let doc = generate_json(&config);
    let account = &doc["components"]["schemas"]["Account"];
    assert!(account["properties"].get("password").is_none());
    assert_eq!(account["required"], json!(["email"]));
}

#[test]
fn test_compound_response() {
    let temp_dir = create_app(vec![(
        "api/pets.go",
        r#"package api

type Cat struct {
	Indoor bool `json:"indoor"`
}

type Dog struct {
	Breed string `json:"breed"`
}

// @Title Pet
// @Success 200 {object} oneOf(Cat,Dog) "A cat or a dog"
// @Router /pet [get]
func GetPet() {}
"#,
    )]);
    let config = isolated_config(temp_dir.path()).with_schema_without_package(true);

    let doc = generate_json(&config);
    assert_eq!(
        doc["paths"]["/pet"]["get"]["responses"]["200"]["content"]["application/json"]["schema"],
        json!({"oneOf": [
            {"$ref": "#/components/schemas/Cat"},
            {"$ref": "#/components/schemas/Dog"}
        ]})
    );
}

#[test]
fn test_duplicate_route() {
    let temp_dir = create_app(vec![(
        "api/things.go",
        r#"package api

// @Title List things
// @Success 200 string "ok"
// @Router /v1/things [get]
func ListThings() {}

// @Title List things again
// @Success 200 string "ok"
// @Router /v1/things [get]
func ListThingsAgain() {}
"#,
    )]);

    // Lax mode records the duplicate and refuses to build
    let config = isolated_config(temp_dir.path());
    let mut generator = Generator::new(&config).unwrap();
    generator.parse().unwrap();
    assert!(generator
        .diagnostics()
        .iter()
        .any(|d| matches!(d, Error::DuplicateRoute { .. })));

    let err = generate(&config).unwrap_err();
    assert_eq!(err.to_string(), "already exists, /v1/things [get]");

    // Strict mode fails while parsing
    let mut strict = Generator::new(&config.clone().with_strict(true)).unwrap();
    assert!(matches!(strict.parse(), Err(Error::DuplicateRoute { .. })));
}

#[test]
fn test_missing_title_fails_validation() {
    let temp_dir = create_test_project(vec![
        ("go.mod", GO_MOD),
        ("main.go", "// @Version 1.0.0\npackage main\n\nfunc main() {}\n"),
    ]);

    match generate(&isolated_config(temp_dir.path())) {
        Err(Error::Validation(message)) => assert!(message.contains("info.title")),
        other => panic!("expected a validation error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_malformed_operation_is_dropped() {
    let temp_dir = create_app(vec![(
        "api/pets.go",
        r#"package api

// @Title Broken
// @Param id path int64
// @Router /broken [get]
func Broken() {}

// @Title Healthy
// @Success 200 string "ok"
// @Router /healthy [get]
func Healthy() {}
"#,
    )]);
    let config = isolated_config(temp_dir.path());

    let mut generator = Generator::new(&config).unwrap();
    generator.parse().unwrap();
    assert!(matches!(generator.diagnostics(), [Error::Grammar { .. }]));

    let document = generator.build().unwrap();
    assert!(document.paths.contains_key("/healthy"));
    assert!(!document.paths.contains_key("/broken"));

    let strict = generate(&config.with_strict(true));
    assert!(matches!(strict, Err(Error::Grammar { .. })));
}

#[test]
fn test_dependency_from_module_cache() {
    let temp_dir = create_test_project(vec![
        (
            "app/go.mod",
            "module example.com/app\n\ngo 1.21\n\nrequire github.com/Acme/kit v1.2.0\n",
        ),
        ("app/main.go", MAIN_GO),
        (
            "app/api/prices.go",
            r#"package api

import "github.com/Acme/kit/money"

type Price struct {
	Total money.Money `json:"total"`
}

// @Title Price
// @Success 200 {object} Price "ok"
// @Router /price [get]
func GetPrice() {}
"#,
        ),
        (
            "modcache/github.com/!acme/kit@v1.2.0/money/money.go",
            "package money\n\ntype Money struct {\n\tAmount   int64  `json:\"amount\"`\n\tCurrency string `json:\"currency\"`\n}\n",
        ),
    ]);
    let config = isolated_config(&temp_dir.path().join("app"))
        .with_go_mod_cache(temp_dir.path().join("modcache"));

    let doc = generate_json(&config);
    let schemas = &doc["components"]["schemas"];
    assert_eq!(
        schemas["example.com.app.api.Price"]["properties"]["total"],
        json!({"$ref": "#/components/schemas/github.com.Acme.kit.money.Money"})
    );
    assert_eq!(
        schemas["github.com.Acme.kit.money.Money"],
        json!({
            "type": "object",
            "properties": {
                "amount": {"type": "integer", "format": "int64"},
                "currency": {"type": "string"}
            }
        })
    );
}

#[test]
fn test_unresolvable_standard_library_type() {
    let temp_dir = create_app(vec![(
        "api/events.go",
        r#"package api

import "encoding/json"

type Event struct {
	Kind    string          `json:"kind"`
	Payload json.RawMessage `json:"payload"`
}

// @Title Event
// @Success 200 {object} Event "ok"
// @Router /event [get]
func GetEvent() {}
"#,
    )]);
    let config = isolated_config(temp_dir.path()).with_schema_without_package(true);

    // Lax mode degrades the field and reports it
    let mut generator = Generator::new(&config).unwrap();
    generator.parse().unwrap();
    assert!(generator
        .diagnostics()
        .iter()
        .any(|d| matches!(d, Error::PackageNotFound { .. })));
    let components = generator.build().unwrap().components.unwrap();
    let event = &components.schemas["Event"];
    let payload = &event.properties.as_ref().unwrap()["payload"];
    assert_eq!(payload.schema_type.as_deref(), Some("object"));

    // Strict mode refuses
    let strict = generate(&config.with_strict(true));
    assert!(matches!(strict, Err(Error::PackageNotFound { .. })));
}

#[test]
fn test_handler_path_filter() {
    let temp_dir = create_app(vec![
        (
            "api/public.go",
            "package api\n\n// @Title Public\n// @Success 200 string \"ok\"\n// @Router /public [get]\nfunc Public() {}\n",
        ),
        (
            "admin/private.go",
            "package admin\n\n// @Title Private\n// @Success 200 string \"ok\"\n// @Router /private [get]\nfunc Private() {}\n",
        ),
    ]);

    let all = generate(&isolated_config(temp_dir.path())).unwrap();
    assert_eq!(all.paths.len(), 2);

    let filtered = generate(&isolated_config(temp_dir.path()).with_handler_path("api")).unwrap();
    let paths: Vec<&String> = filtered.paths.keys().collect();
    assert_eq!(paths, vec!["/public"]);
}

#[test]
fn test_oauth2_security_schemes() {
    let temp_dir = create_test_project(vec![
        ("go.mod", GO_MOD),
        (
            "main.go",
            r#"// @Version 1.0.0
// @Title Secure API
// @SecurityScheme OAuth oauth2AuthCode https://auth.example.com/authorize https://auth.example.com/token
// @SecurityScheme OAuth oauth2ClientCredentials https://auth.example.com/token
// @SecurityScope OAuth read Read access
// @SecurityScheme ApiKey apiKey header X-API-Key Key for scripts
// @Security OAuth read
package main

func main() {}
"#,
        ),
    ]);

    let doc = generate_json(&isolated_config(temp_dir.path()));
    let schemes = &doc["components"]["securitySchemes"];
    assert_eq!(
        schemes["OAuth"],
        json!({
            "type": "oauth2",
            "flows": {
                "authorizationCode": {
                    "authorizationUrl": "https://auth.example.com/authorize",
                    "tokenUrl": "https://auth.example.com/token",
                    "scopes": {"read": "Read access"}
                },
                "clientCredentials": {
                    "tokenUrl": "https://auth.example.com/token",
                    "scopes": {"read": "Read access"}
                }
            }
        })
    );
    assert_eq!(
        schemes["ApiKey"],
        json!({
            "type": "apiKey",
            "description": "Key for scripts",
            "in": "header",
            "name": "X-API-Key"
        })
    );
    assert_eq!(doc["security"], json!([{"OAuth": ["read"]}]));
    assert_eq!(doc["servers"], json!([{"url": "/", "description": "Default Server URL"}]));
    assert_eq!(doc["paths"], json!({}));
}

#[test]
fn test_missing_type_inside_standard_library_package() {
    let temp_dir = create_test_project(vec![
        ("app/go.mod", GO_MOD),
        ("app/main.go", MAIN_GO),
        (
            "app/api/accounts.go",
            r#"package api

import "database/sql"

type Account struct {
	Nickname sql.NullString `json:"nickname"`
}

// @Title Account
// @Success 200 {object} Account "ok"
// @Router /account [get]
func GetAccount() {}
"#,
        ),
        (
            "goroot/database/sql/sql.go",
            "package sql\n\ntype NullString struct {\n\tString string\n\tValid  bool\n\tconv   converter\n}\n",
        ),
    ]);
    let config = isolated_config(&temp_dir.path().join("app"))
        .with_go_root_src(temp_dir.path().join("goroot"))
        .with_schema_without_package(true);

    // Lax mode degrades the unknown field and keeps the document
    let mut generator = Generator::new(&config).unwrap();
    generator.parse().unwrap();
    assert!(generator
        .diagnostics()
        .iter()
        .any(|d| matches!(d, Error::TypeNotFound { type_name, .. } if type_name == "converter")));
    let doc = serde_json::to_value(generator.build().unwrap()).unwrap();
    assert_eq!(
        doc["components"]["schemas"]["NullString"]["properties"],
        json!({
            "String": {"type": "string"},
            "Valid": {"type": "boolean"},
            "conv": {"type": "object"}
        })
    );

    // Strict mode refuses
    let strict = generate(&config.with_strict(true));
    assert!(matches!(strict, Err(Error::TypeNotFound { .. })));
}

#[test]
fn test_malformed_comment_registers_no_header_parameters() {
    let temp_dir = create_app(vec![(
        "api/things.go",
        r#"package api

type Headers struct {
	Trace string `json:"X-Trace-Id"`
}

// @HeaderParameters Headers
// @Title Things
// @Param id path int64
// @Router /things [get]
func ListThings() {}

// @Title Healthy
// @Success 200 string "ok"
// @Router /healthy [get]
func Healthy() {}
"#,
    )]);
    let config = isolated_config(temp_dir.path()).with_schema_without_package(true);

    let mut generator = Generator::new(&config).unwrap();
    generator.parse().unwrap();
    assert!(matches!(generator.diagnostics(), [Error::Grammar { .. }]));

    let doc = serde_json::to_value(generator.build().unwrap()).unwrap();
    assert!(doc["components"].get("parameters").is_none());
    assert!(doc["paths"].get("/things").is_none());
    assert!(doc["paths"].get("/healthy").is_some());
}
