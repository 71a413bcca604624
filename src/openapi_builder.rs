use crate::annotation::{HttpMethod, InfoDirective, RouteDirective, SecuritySchemeDirective};
use crate::error::{Error, Result};
use crate::schema_generator::Schema;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const OPENAPI_VERSION: &str = "3.0.0";
pub const PARAMETER_REF_PREFIX: &str = "#/components/parameters/";

/// OpenAPI document builder
///
/// Collects general information, operations and reusable components while
/// the generator walks the module, then validates and assembles the final
/// document in [`OpenApiBuilder::build`].
#[derive(Debug, Default)]
pub struct OpenApiBuilder {
    /// OpenAPI info section
    info: Info,
    servers: Vec<Server>,
    /// Paths collection (URL path -> PathItem)
    paths: BTreeMap<String, PathItem>,
    security: Vec<BTreeMap<String, Vec<String>>>,
    security_schemes: BTreeMap<String, SecurityScheme>,
    /// `@SecurityScope` entries, applied to oauth2 flows when building
    scopes: Vec<(String, String, String)>,
    parameters: BTreeMap<String, Parameter>,
    tags: Vec<Tag>,
    /// Routes that were registered more than once
    duplicates: Vec<(String, HttpMethod)>,
}

/// OpenAPI Info object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title
    pub title: String,
    /// API description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "termsOfService", skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    /// API version
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI PathItem object - represents all operations for a single path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    /// GET operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// POST operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// PUT operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// DELETE operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    /// PATCH operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    /// OPTIONS operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    /// HEAD operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    /// TRACE operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
}

impl PathItem {
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Trace => self.trace.as_ref(),
        }
    }

    fn slot_mut(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
            HttpMethod::Trace => &mut self.trace,
        }
    }
}

/// OpenAPI Operation object - represents a single API operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Operation summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Operation description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Operation ID
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Parameters (path, query, header, cookie) and header references
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Request body
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Responses by status code
    pub responses: BTreeMap<String, Response>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

/// OpenAPI Parameter object, or a reference to one in `components.parameters`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Parameter name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Parameter location (path, query, header, cookie)
    #[serde(rename = "in", default, skip_serializing_if = "String::is_empty")]
    pub location: String,
    /// Parameter description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the parameter is required
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Parameter schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

impl Parameter {
    /// `{"$ref": "#/components/parameters/<name>"}`
    pub fn reference_to(name: &str) -> Self {
        Self {
            reference: Some(format!("{}{}", PARAMETER_REF_PREFIX, name)),
            ..Default::default()
        }
    }
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Request body description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the request body is required
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    /// Content types and their schemas
    pub content: BTreeMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema for this media type
    pub schema: Schema,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

/// OpenAPI Response object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Response description
    pub description: String,
    /// Response content
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub content: BTreeMap<String, MediaType>,
}

/// OpenAPI Security Scheme object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// HTTP authorization scheme, e.g. `bearer`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    /// Where an API key is sent
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Name of the API key header, query parameter or cookie
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "openIdConnectUrl", skip_serializing_if = "Option::is_none")]
    pub open_id_connect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flows: Option<OAuthFlows>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OAuthFlows {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit: Option<OAuthFlow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<OAuthFlow>,
    #[serde(rename = "clientCredentials", skip_serializing_if = "Option::is_none")]
    pub client_credentials: Option<OAuthFlow>,
    #[serde(rename = "authorizationCode", skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<OAuthFlow>,
}

impl OAuthFlows {
    fn flows_mut(&mut self) -> impl Iterator<Item = &mut OAuthFlow> {
        [
            self.implicit.as_mut(),
            self.password.as_mut(),
            self.client_credentials.as_mut(),
            self.authorization_code.as_mut(),
        ]
        .into_iter()
        .flatten()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OAuthFlow {
    #[serde(rename = "authorizationUrl", skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,
    #[serde(rename = "tokenUrl", skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    pub scopes: BTreeMap<String, String>,
}

/// OpenAPI Components object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    /// Schema definitions
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, Schema>,
    #[serde(
        rename = "securitySchemes",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub security_schemes: BTreeMap<String, SecurityScheme>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Parameter>,
}

impl Components {
    fn is_empty(&self) -> bool {
        self.schemas.is_empty() && self.security_schemes.is_empty() && self.parameters.is_empty()
    }
}

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    /// API info
    pub info: Info,
    pub servers: Vec<Server>,
    /// API paths
    pub paths: BTreeMap<String, PathItem>,
    /// Components (schemas, security schemes, header parameters)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<BTreeMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl OpenApiBuilder {
    /// Create a new OpenApiBuilder with an empty info section
    pub fn new() -> Self {
        debug!("Initializing OpenApiBuilder");
        Self::default()
    }

    pub fn info(&self) -> &Info {
        &self.info
    }

    pub fn paths(&self) -> &BTreeMap<String, PathItem> {
        &self.paths
    }

    /// Applies one general API information directive.
    ///
    /// `@PackageAlias` only affects schema naming and is left to the caller.
    pub fn apply_info(&mut self, directive: InfoDirective) {
        match directive {
            InfoDirective::Version(version) => self.info.version = version,
            InfoDirective::Title(title) => self.info.title = title,
            InfoDirective::Description(description) => {
                self.info.description = Some(description)
            }
            InfoDirective::TermsOfService(url) => self.info.terms_of_service = Some(url),
            InfoDirective::ContactName(name) => self.contact_mut().name = Some(name),
            InfoDirective::ContactEmail(email) => self.contact_mut().email = Some(email),
            InfoDirective::ContactUrl(url) => self.contact_mut().url = Some(url),
            InfoDirective::LicenseName(name) => {
                self.info.license.get_or_insert_with(License::default).name = name
            }
            InfoDirective::LicenseUrl(url) => {
                self.info.license.get_or_insert_with(License::default).url = Some(url)
            }
            InfoDirective::Server { url, description } => {
                self.servers.push(Server { url, description })
            }
            InfoDirective::Security { scheme, scopes } => {
                self.security.push(BTreeMap::from([(scheme, scopes)]))
            }
            InfoDirective::SecurityScheme(scheme) => self.add_security_scheme(scheme),
            InfoDirective::SecurityScope {
                scheme,
                scope,
                description,
            } => self.scopes.push((scheme, scope, description)),
            InfoDirective::Tag { name, description } => self.add_tag(name, description),
            InfoDirective::PackageAlias { .. } => {}
        }
    }

    fn contact_mut(&mut self) -> &mut Contact {
        self.info.contact.get_or_insert_with(Contact::default)
    }

    /// Registers a security scheme; oauth2 flows of one name merge into one scheme
    pub fn add_security_scheme(&mut self, directive: SecuritySchemeDirective) {
        let (name, scheme) = match directive {
            SecuritySchemeDirective::Http {
                name,
                scheme,
                description,
            } => (
                name,
                SecurityScheme {
                    scheme_type: "http".to_string(),
                    scheme: Some(scheme),
                    description: non_empty(description),
                    ..Default::default()
                },
            ),
            SecuritySchemeDirective::ApiKey {
                name,
                location,
                key,
                description,
            } => (
                name,
                SecurityScheme {
                    scheme_type: "apiKey".to_string(),
                    location: Some(location),
                    name: Some(key),
                    description: non_empty(description),
                    ..Default::default()
                },
            ),
            SecuritySchemeDirective::OpenIdConnect {
                name,
                url,
                description,
            } => (
                name,
                SecurityScheme {
                    scheme_type: "openIdConnect".to_string(),
                    open_id_connect_url: Some(url),
                    description: non_empty(description),
                    ..Default::default()
                },
            ),
            SecuritySchemeDirective::OAuth2AuthCode {
                name,
                authorization_url,
                token_url,
            } => {
                self.oauth2_flows(&name).authorization_code = Some(OAuthFlow {
                    authorization_url: Some(authorization_url),
                    token_url: Some(token_url),
                    scopes: BTreeMap::new(),
                });
                return;
            }
            SecuritySchemeDirective::OAuth2Implicit {
                name,
                authorization_url,
            } => {
                self.oauth2_flows(&name).implicit = Some(OAuthFlow {
                    authorization_url: Some(authorization_url),
                    token_url: None,
                    scopes: BTreeMap::new(),
                });
                return;
            }
            SecuritySchemeDirective::OAuth2Password { name, token_url } => {
                self.oauth2_flows(&name).password = Some(OAuthFlow {
                    authorization_url: None,
                    token_url: Some(token_url),
                    scopes: BTreeMap::new(),
                });
                return;
            }
            SecuritySchemeDirective::OAuth2ClientCredentials { name, token_url } => {
                self.oauth2_flows(&name).client_credentials = Some(OAuthFlow {
                    authorization_url: None,
                    token_url: Some(token_url),
                    scopes: BTreeMap::new(),
                });
                return;
            }
        };
        debug!("Adding security scheme {}", name);
        self.security_schemes.insert(name, scheme);
    }

    fn oauth2_flows(&mut self, name: &str) -> &mut OAuthFlows {
        debug!("Adding oauth2 flow to security scheme {}", name);
        let scheme = self
            .security_schemes
            .entry(name.to_string())
            .or_insert_with(|| SecurityScheme {
                scheme_type: "oauth2".to_string(),
                ..Default::default()
            });
        scheme.flows.get_or_insert_with(OAuthFlows::default)
    }

    /// Adds a document-level tag unless one with the same name exists
    pub fn add_tag(&mut self, name: String, description: Option<String>) {
        if self.tags.iter().any(|tag| tag.name == name) {
            return;
        }
        self.tags.push(Tag { name, description });
    }

    /// Registers a reusable parameter; the first registration of a name wins
    pub fn add_component_parameter(&mut self, name: &str, parameter: Parameter) {
        if self.parameters.contains_key(name) {
            debug!("Parameter {} already registered", name);
            return;
        }
        self.parameters.insert(name.to_string(), parameter);
    }

    pub fn component_parameters(&self) -> &BTreeMap<String, Parameter> {
        &self.parameters
    }

    /// Attaches an operation to a path and method.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateRoute` when the slot is already taken; the
    /// existing operation is kept and the duplicate also fails [`Self::build`].
    pub fn add_operation(&mut self, route: &RouteDirective, operation: Operation) -> Result<()> {
        let path = Self::convert_path_format(&route.path);
        debug!("Adding route: {} {}", route.method, path);

        let slot = self.paths.entry(path.clone()).or_default().slot_mut(route.method);
        if slot.is_some() {
            warn!("Route {} [{}] already exists", path, route.method);
            self.duplicates.push((path.clone(), route.method));
            return Err(Error::DuplicateRoute {
                path,
                method: route.method.to_string().to_lowercase(),
            });
        }
        *slot = Some(operation);
        Ok(())
    }

    /// Convert path format from :param or {param} to OpenAPI {param} format
    fn convert_path_format(path: &str) -> String {
        path.split('/')
            .map(|part| match part.strip_prefix(':') {
                Some(name) => format!("{{{}}}", name),
                None => part.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Checks the fields a document cannot be emitted without
    pub fn validate(&self) -> Result<()> {
        if self.info.title.trim().is_empty() {
            return Err(Error::Validation(
                "info.title cannot not be empty".to_string(),
            ));
        }
        if self.info.version.trim().is_empty() {
            return Err(Error::Validation(
                "info.version cannot not be empty".to_string(),
            ));
        }
        for (index, server) in self.servers.iter().enumerate() {
            if server.url.trim().is_empty() {
                return Err(Error::Validation(format!(
                    "servers[{}].url cannot not be empty",
                    index
                )));
            }
        }
        Ok(())
    }

    /// Build the final OpenAPI document
    ///
    /// # Arguments
    ///
    /// * `schemas` - Registered schemas for `components.schemas`
    ///
    /// # Errors
    ///
    /// Fails when a route was registered twice or validation fails.
    pub fn build(mut self, schemas: BTreeMap<String, Schema>) -> Result<OpenApiDocument> {
        debug!("Building final OpenAPI document");

        if let Some((path, method)) = self.duplicates.first() {
            return Err(Error::DuplicateRoute {
                path: path.clone(),
                method: method.to_string().to_lowercase(),
            });
        }

        self.validate()?;
        if self.servers.is_empty() {
            self.servers.push(Server {
                url: "/".to_string(),
                description: Some("Default Server URL".to_string()),
            });
        }

        for (scheme_name, scope, description) in std::mem::take(&mut self.scopes) {
            let flows = self
                .security_schemes
                .get_mut(&scheme_name)
                .filter(|scheme| scheme.scheme_type == "oauth2")
                .and_then(|scheme| scheme.flows.as_mut());
            match flows {
                Some(flows) => {
                    for flow in flows.flows_mut() {
                        flow.scopes.insert(scope.clone(), description.clone());
                    }
                }
                None => warn!(
                    "Security scope {} refers to unknown oauth2 scheme {}",
                    scope, scheme_name
                ),
            }
        }

        let components = Components {
            schemas,
            security_schemes: self.security_schemes,
            parameters: self.parameters,
        };

        Ok(OpenApiDocument {
            openapi: OPENAPI_VERSION.to_string(),
            info: self.info,
            servers: self.servers,
            paths: self.paths,
            components: (!components.is_empty()).then_some(components),
            security: self.security,
            tags: self.tags,
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn builder_with_info() -> OpenApiBuilder {
        let mut builder = OpenApiBuilder::new();
        builder.apply_info(InfoDirective::Title("Petstore".to_string()));
        builder.apply_info(InfoDirective::Version("1.0.0".to_string()));
        builder
    }

    fn route(path: &str, method: HttpMethod) -> RouteDirective {
        RouteDirective {
            path: path.to_string(),
            method,
        }
    }

    #[test]
    fn test_add_operation_and_build() {
        let mut builder = builder_with_info();
        let operation = Operation {
            summary: Some("List pets".to_string()),
            responses: BTreeMap::from([(
                "200".to_string(),
                Response {
                    description: "ok".to_string(),
                    ..Default::default()
                },
            )]),
            ..Default::default()
        };
        builder
            .add_operation(&route("/pets", HttpMethod::Get), operation)
            .unwrap();

        let document = builder.build(BTreeMap::new()).unwrap();
        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(
            value,
            json!({
                "openapi": "3.0.0",
                "info": {"title": "Petstore", "version": "1.0.0"},
                "servers": [{"url": "/", "description": "Default Server URL"}],
                "paths": {
                    "/pets": {
                        "get": {
                            "summary": "List pets",
                            "responses": {"200": {"description": "ok"}}
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_duplicate_route_is_rejected() {
        let mut builder = builder_with_info();
        let first = Operation {
            operation_id: Some("first".to_string()),
            ..Default::default()
        };
        let second = Operation {
            operation_id: Some("second".to_string()),
            ..Default::default()
        };
        builder
            .add_operation(&route("/v1/things", HttpMethod::Get), first)
            .unwrap();
        let err = builder
            .add_operation(&route("/v1/things", HttpMethod::Get), second)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRoute { .. }));
        assert_eq!(err.to_string(), "already exists, /v1/things [get]");

        let kept = builder.paths()["/v1/things"].operation(HttpMethod::Get).unwrap();
        assert_eq!(kept.operation_id.as_deref(), Some("first"));

        assert!(matches!(
            builder.build(BTreeMap::new()),
            Err(Error::DuplicateRoute { .. })
        ));
    }

    #[test]
    fn test_validation_errors() {
        let builder = OpenApiBuilder::new();
        let err = builder.build(BTreeMap::new()).unwrap_err();
        assert_eq!(err.to_string(), "info.title cannot not be empty");

        let mut builder = OpenApiBuilder::new();
        builder.apply_info(InfoDirective::Title("Petstore".to_string()));
        let err = builder.build(BTreeMap::new()).unwrap_err();
        assert_eq!(err.to_string(), "info.version cannot not be empty");

        let mut builder = builder_with_info();
        builder.apply_info(InfoDirective::Server {
            url: " ".to_string(),
            description: None,
        });
        let err = builder.build(BTreeMap::new()).unwrap_err();
        assert_eq!(err.to_string(), "servers[0].url cannot not be empty");
    }

    #[test]
    fn test_convert_path_format() {
        assert_eq!(OpenApiBuilder::convert_path_format("/users/:id"), "/users/{id}");
        assert_eq!(OpenApiBuilder::convert_path_format("/users/{id}"), "/users/{id}");
        assert_eq!(OpenApiBuilder::convert_path_format("/users"), "/users");
    }

    #[test]
    fn test_security_schemes_and_scopes() {
        let mut builder = builder_with_info();
        builder.apply_info(InfoDirective::SecurityScope {
            scheme: "oauth".to_string(),
            scope: "read".to_string(),
            description: "Read access".to_string(),
        });
        builder.apply_info(InfoDirective::SecurityScheme(
            SecuritySchemeDirective::OAuth2Implicit {
                name: "oauth".to_string(),
                authorization_url: "https://auth/authorize".to_string(),
            },
        ));
        builder.apply_info(InfoDirective::SecurityScheme(
            SecuritySchemeDirective::OAuth2Password {
                name: "oauth".to_string(),
                token_url: "https://auth/token".to_string(),
            },
        ));
        builder.apply_info(InfoDirective::SecurityScheme(SecuritySchemeDirective::Http {
            name: "basic".to_string(),
            scheme: "basic".to_string(),
            description: String::new(),
        }));
        builder.apply_info(InfoDirective::Security {
            scheme: "oauth".to_string(),
            scopes: vec!["read".to_string()],
        });

        let document = builder.build(BTreeMap::new()).unwrap();
        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(
            value["components"]["securitySchemes"],
            json!({
                "basic": {"type": "http", "scheme": "basic"},
                "oauth": {
                    "type": "oauth2",
                    "flows": {
                        "implicit": {
                            "authorizationUrl": "https://auth/authorize",
                            "scopes": {"read": "Read access"}
                        },
                        "password": {
                            "tokenUrl": "https://auth/token",
                            "scopes": {"read": "Read access"}
                        }
                    }
                }
            })
        );
        assert_eq!(value["security"], json!([{"oauth": ["read"]}]));
    }

    #[test]
    fn test_info_contact_license_and_tags() {
        let mut builder = builder_with_info();
        builder.apply_info(InfoDirective::ContactName("Team".to_string()));
        builder.apply_info(InfoDirective::ContactEmail("team@example.com".to_string()));
        builder.apply_info(InfoDirective::LicenseName("MIT".to_string()));
        builder.apply_info(InfoDirective::Tag {
            name: "pets".to_string(),
            description: Some("Pet operations".to_string()),
        });
        builder.apply_info(InfoDirective::Tag {
            name: "pets".to_string(),
            description: None,
        });

        let document = builder.build(BTreeMap::new()).unwrap();
        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(
            value["info"]["contact"],
            json!({"name": "Team", "email": "team@example.com"})
        );
        assert_eq!(value["info"]["license"], json!({"name": "MIT"}));
        assert_eq!(
            value["tags"],
            json!([{"name": "pets", "description": "Pet operations"}])
        );
    }

    #[test]
    fn test_component_parameters_first_writer_wins() {
        let mut builder = builder_with_info();
        builder.add_component_parameter(
            "X-Request-Id",
            Parameter {
                name: "X-Request-Id".to_string(),
                location: "header".to_string(),
                required: true,
                ..Default::default()
            },
        );
        builder.add_component_parameter(
            "X-Request-Id",
            Parameter {
                name: "X-Request-Id".to_string(),
                location: "header".to_string(),
                ..Default::default()
            },
        );
        assert!(builder.component_parameters()["X-Request-Id"].required);
        assert_eq!(
            serde_json::to_value(Parameter::reference_to("X-Request-Id")).unwrap(),
            json!({"$ref": "#/components/parameters/X-Request-Id"})
        );
    }
}
