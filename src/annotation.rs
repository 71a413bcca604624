//! Comment directive grammar.
//!
//! Turns single comment lines into typed directives. Nothing here resolves
//! types; references are carried as text for the schema generator.
//! Struct field tags are parsed here as well since they are the other
//! source of annotation data.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// HTTP methods a route directive may name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Trace,
}

impl FromStr for HttpMethod {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s.trim().to_ascii_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "post" => Ok(HttpMethod::Post),
            "put" => Ok(HttpMethod::Put),
            "delete" => Ok(HttpMethod::Delete),
            "patch" => Ok(HttpMethod::Patch),
            "options" => Ok(HttpMethod::Options),
            "head" => Ok(HttpMethod::Head),
            "trace" => Ok(HttpMethod::Trace),
            _ => Err(()),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Trace => "TRACE",
        };
        write!(f, "{}", name)
    }
}

/// Where a `@Param` value travels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
    Body,
    /// Single multipart file upload
    File,
    /// Multipart array of files
    Files,
    /// Multipart form field
    Form,
}

impl ParamLocation {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "path" => Some(ParamLocation::Path),
            "query" => Some(ParamLocation::Query),
            "header" => Some(ParamLocation::Header),
            "cookie" => Some(ParamLocation::Cookie),
            "body" => Some(ParamLocation::Body),
            "file" => Some(ParamLocation::File),
            "files" => Some(ParamLocation::Files),
            "form" => Some(ParamLocation::Form),
            _ => None,
        }
    }

    /// Value of the parameter object's `in` field
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
            ParamLocation::Cookie => "cookie",
            ParamLocation::Body => "body",
            ParamLocation::File => "file",
            ParamLocation::Files => "files",
            ParamLocation::Form => "form",
        }
    }
}

/// `@Param name location type required "description" ["example"]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDirective {
    pub name: String,
    pub location: ParamLocation,
    /// Type reference with `[N]` already normalized to `[]`
    pub go_type: String,
    pub required: bool,
    pub description: String,
    /// Raw example with `\"` unescaped
    pub example: Option<String>,
}

/// `@Success` / `@Failure status [jsonType] [type] ["description"]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDirective {
    pub status: u16,
    pub json_type: Option<String>,
    pub go_type: Option<String>,
    pub description: String,
}

/// `@Router path [method]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDirective {
    pub path: String,
    pub method: HttpMethod,
}

/// A directive found in an operation's doc comment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Title(String),
    Description(String),
    OperationId(String),
    Param(ParamDirective),
    Response(ResponseDirective),
    Route(RouteDirective),
    Tag(String),
    Header(String),
    HeaderParameters(String),
    Deprecated,
    Hidden,
}

/// A general API information directive from the main file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoDirective {
    Version(String),
    Title(String),
    Description(String),
    TermsOfService(String),
    ContactName(String),
    ContactEmail(String),
    ContactUrl(String),
    LicenseName(String),
    LicenseUrl(String),
    Server {
        url: String,
        description: Option<String>,
    },
    Security {
        scheme: String,
        scopes: Vec<String>,
    },
    SecurityScheme(SecuritySchemeDirective),
    SecurityScope {
        scheme: String,
        scope: String,
        description: String,
    },
    Tag {
        name: String,
        description: Option<String>,
    },
    PackageAlias {
        original: String,
        alias: String,
    },
}

/// `@SecurityScheme name kind args...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecuritySchemeDirective {
    Http {
        name: String,
        scheme: String,
        description: String,
    },
    ApiKey {
        name: String,
        location: String,
        key: String,
        description: String,
    },
    OpenIdConnect {
        name: String,
        url: String,
        description: String,
    },
    OAuth2AuthCode {
        name: String,
        authorization_url: String,
        token_url: String,
    },
    OAuth2Implicit {
        name: String,
        authorization_url: String,
    },
    OAuth2Password {
        name: String,
        token_url: String,
    },
    OAuth2ClientCredentials {
        name: String,
        token_url: String,
    },
}

static PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"([-\w]+)\s+(\w+)\s+([\w./\[\]\\(),]+)\s+(\w+)\s+"([^"]+)"(?:\s+"((?:[^"\\]|\\")*)")?"#,
    )
    .expect("valid param regex")
});
static ROUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\w./\-{}:]+)[^\[]+\[([^\]]+)").expect("valid route regex"));
static QUOTED: Lazy<Regex> = Lazy::new(|| Regex::new(r#""([^"]*)""#).expect("valid quote regex"));
static ARRAY_LEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\w*\]").expect("valid regex"));
static JSON_TYPES: [&str; 4] = ["object", "array", "{object}", "{array}"];

/// Removes leading comment slashes and surrounding whitespace
pub fn comment_text(line: &str) -> &str {
    line.trim_start().trim_start_matches('/').trim()
}

/// Splits `@Attribute value` into the lowercased attribute and the value
pub fn split_attribute(line: &str) -> Option<(String, &str)> {
    let text = comment_text(line);
    if !text.starts_with('@') {
        return None;
    }
    let attribute = text.split_whitespace().next()?;
    let value = text[attribute.len()..].trim();
    Some((attribute.to_ascii_lowercase(), value))
}

/// Whether a doc comment carries `@Hidden`
pub fn is_hidden(lines: &[String]) -> bool {
    lines
        .iter()
        .filter_map(|line| split_attribute(line))
        .any(|(attribute, _)| attribute == "@hidden")
}

/// Parses one line of an operation's doc comment.
///
/// Returns `Ok(None)` for prose and for directives that do not belong to
/// operations.
///
/// # Errors
///
/// Returns `Error::Grammar` when a recognised directive is malformed.
pub fn parse_operation_line(line: &str) -> Result<Option<Directive>> {
    let Some((attribute, value)) = split_attribute(line) else {
        return Ok(None);
    };
    let directive = match attribute.as_str() {
        "@title" => Directive::Title(value.to_string()),
        "@description" => Directive::Description(value.to_string()),
        "@operationid" => Directive::OperationId(value.to_string()),
        "@param" => Directive::Param(parse_param(value)?),
        "@success" | "@failure" => Directive::Response(parse_response(&attribute, value)?),
        "@resource" | "@tag" => Directive::Tag(if value.is_empty() {
            "others".to_string()
        } else {
            value.to_string()
        }),
        "@route" | "@router" => Directive::Route(parse_route(&attribute, value)?),
        "@header" => {
            if value.is_empty() {
                return Err(Error::grammar("@Header", line, "type reference missing"));
            }
            Directive::Header(value.to_string())
        }
        "@headerparameters" => {
            if value.is_empty() {
                return Err(Error::grammar(
                    "@HeaderParameters",
                    line,
                    "type reference missing",
                ));
            }
            Directive::HeaderParameters(value.to_string())
        }
        "@deprecated" => Directive::Deprecated,
        "@hidden" => Directive::Hidden,
        _ => return Ok(None),
    };
    Ok(Some(directive))
}

/// Parses the value of a `@Param` directive
pub fn parse_param(value: &str) -> Result<ParamDirective> {
    let captures = PARAM
        .captures(value)
        .ok_or_else(|| Error::grammar("@Param", value, "expected name, location, type, required and \"description\""))?;

    let location = ParamLocation::parse(&captures[2]).ok_or_else(|| {
        Error::grammar(
            "@Param",
            value,
            format!("unknown parameter location {}", &captures[2]),
        )
    })?;
    let go_type = ARRAY_LEN.replace_all(&captures[3], "[]").to_string();
    let required = matches!(
        captures[4].to_ascii_lowercase().as_str(),
        "true" | "required"
    );

    Ok(ParamDirective {
        name: captures[1].to_string(),
        location,
        go_type,
        required,
        description: captures[5].to_string(),
        example: captures.get(6).map(|m| m.as_str().replace("\\\"", "\"")),
    })
}

/// Parses the value of a `@Success` or `@Failure` directive
pub fn parse_response(attribute: &str, value: &str) -> Result<ResponseDirective> {
    let (head, description) = match value.find('"') {
        Some(pos) => (&value[..pos], value[pos..].trim().trim_matches('"').to_string()),
        None => (value, String::new()),
    };
    let tokens: Vec<&str> = head.split_whitespace().collect();
    let Some((status, rest)) = tokens.split_first() else {
        return Err(Error::grammar(attribute, value, "status code missing"));
    };
    let status = status
        .parse::<u16>()
        .map_err(|_| Error::grammar(attribute, value, format!("invalid status code {}", status)))?;

    let (json_type, go_type) = match rest {
        [] => (None, None),
        [single] if JSON_TYPES.contains(single) => (Some(single.to_string()), None),
        [single] => (None, Some(single.to_string())),
        [json_type, go_type, ..] => {
            if !JSON_TYPES.contains(json_type) {
                return Err(Error::grammar(
                    attribute,
                    value,
                    format!("invalid json type {}", json_type),
                ));
            }
            (Some(json_type.to_string()), Some(go_type.to_string()))
        }
    };

    Ok(ResponseDirective {
        status,
        json_type,
        go_type: go_type.map(|t| ARRAY_LEN.replace_all(&t, "[]").to_string()),
        description,
    })
}

/// Parses the value of a `@Router` directive
pub fn parse_route(attribute: &str, value: &str) -> Result<RouteDirective> {
    let captures = ROUTE
        .captures(value)
        .ok_or_else(|| Error::grammar(attribute, value, "expected path [method]"))?;
    let method = captures[2]
        .parse::<HttpMethod>()
        .map_err(|_| Error::grammar(attribute, value, format!("unknown method {}", &captures[2])))?;
    Ok(RouteDirective {
        path: captures[1].to_string(),
        method,
    })
}

/// Parses one line of the main file's comments.
///
/// Directives with an empty value are ignored, as are attributes that do not
/// belong to the general API information.
pub fn parse_info_line(line: &str) -> Result<Option<InfoDirective>> {
    let Some((attribute, value)) = split_attribute(line) else {
        return Ok(None);
    };
    if value.is_empty() {
        return Ok(None);
    }
    let fields: Vec<&str> = value.split_whitespace().collect();
    let rest_from = |n: usize| fields.get(n..).map(|f| f.join(" ")).unwrap_or_default();

    let directive = match attribute.as_str() {
        "@version" => InfoDirective::Version(value.to_string()),
        "@title" => InfoDirective::Title(value.to_string()),
        "@description" => InfoDirective::Description(value.to_string()),
        "@termsofserviceurl" => InfoDirective::TermsOfService(value.to_string()),
        "@contactname" => InfoDirective::ContactName(value.to_string()),
        "@contactemail" => InfoDirective::ContactEmail(value.to_string()),
        "@contacturl" => InfoDirective::ContactUrl(value.to_string()),
        "@licensename" => InfoDirective::LicenseName(value.to_string()),
        "@licenseurl" => InfoDirective::LicenseUrl(value.to_string()),
        "@server" => {
            let description = rest_from(1);
            InfoDirective::Server {
                url: fields[0].to_string(),
                description: (!description.is_empty()).then_some(description),
            }
        }
        "@security" => InfoDirective::Security {
            scheme: fields[0].to_string(),
            scopes: fields[1..].iter().map(|s| s.to_string()).collect(),
        },
        "@securityscheme" => InfoDirective::SecurityScheme(parse_security_scheme(line, &fields)?),
        "@securityscope" => {
            if fields.len() < 2 {
                return Err(Error::grammar(
                    "@SecurityScope",
                    line,
                    "expected scheme and scope",
                ));
            }
            InfoDirective::SecurityScope {
                scheme: fields[0].to_string(),
                scope: fields[1].to_string(),
                description: rest_from(2),
            }
        }
        "@tags" => {
            let quoted: Vec<String> = QUOTED
                .captures_iter(value)
                .map(|c| c[1].to_string())
                .collect();
            let Some(name) = quoted.first() else {
                return Err(Error::grammar(
                    "@Tags",
                    line,
                    "expected \"<name>\" [\"<description>\"]",
                ));
            };
            InfoDirective::Tag {
                name: name.clone(),
                description: quoted.get(1).cloned(),
            }
        }
        "@packagealias" => {
            let quoted: Vec<String> = QUOTED
                .captures_iter(value)
                .map(|c| c[1].to_string())
                .collect();
            if quoted.len() < 2 {
                return Err(Error::grammar(
                    "@PackageAlias",
                    line,
                    "expected \"<name>\" \"<alias>\"",
                ));
            }
            InfoDirective::PackageAlias {
                original: quoted[0].clone(),
                alias: quoted[1].clone(),
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(directive))
}

fn parse_security_scheme(line: &str, fields: &[&str]) -> Result<SecuritySchemeDirective> {
    let arity_error = |expected: &str| Error::grammar("@SecurityScheme", line, expected.to_string());
    if fields.len() < 3 {
        return Err(arity_error("expected name, kind and arguments"));
    }
    let name = fields[0].to_string();
    let rest_from = |n: usize| fields.get(n..).map(|f| f.join(" ")).unwrap_or_default();

    let scheme = match fields[1] {
        "http" => SecuritySchemeDirective::Http {
            name,
            scheme: fields[2].to_string(),
            description: rest_from(3),
        },
        "apiKey" => {
            if fields.len() < 4 {
                return Err(arity_error("apiKey expects location and key name"));
            }
            SecuritySchemeDirective::ApiKey {
                name,
                location: fields[2].to_string(),
                key: fields[3].to_string(),
                description: rest_from(4),
            }
        }
        "openIdConnect" => SecuritySchemeDirective::OpenIdConnect {
            name,
            url: fields[2].to_string(),
            description: rest_from(3),
        },
        "oauth2AuthCode" => {
            if fields.len() < 4 {
                return Err(arity_error("oauth2AuthCode expects authorization and token urls"));
            }
            SecuritySchemeDirective::OAuth2AuthCode {
                name,
                authorization_url: fields[2].to_string(),
                token_url: fields[3].to_string(),
            }
        }
        "oauth2Implicit" => SecuritySchemeDirective::OAuth2Implicit {
            name,
            authorization_url: fields[2].to_string(),
        },
        "oauth2ResourceOwnerCredentials" => SecuritySchemeDirective::OAuth2Password {
            name,
            token_url: fields[2].to_string(),
        },
        "oauth2ClientCredentials" => SecuritySchemeDirective::OAuth2ClientCredentials {
            name,
            token_url: fields[2].to_string(),
        },
        other => return Err(arity_error(&format!("unknown scheme kind {}", other))),
    };
    Ok(scheme)
}

/// Looks a key up in a Go struct tag, following `reflect.StructTag` rules
pub fn tag_lookup(tag: &str, key: &str) -> Option<String> {
    let mut rest = tag;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return None;
        }
        let colon = rest.find(':')?;
        let name = &rest[..colon];
        if name.is_empty() || name.contains(|c: char| c == ' ' || c == '"') {
            return None;
        }
        let after = &rest[colon + 1..];
        if !after.starts_with('"') {
            return None;
        }
        // Find the closing quote, skipping escaped characters
        let mut end = None;
        let mut escaped = false;
        for (index, c) in after.char_indices().skip(1) {
            match c {
                '\\' if !escaped => escaped = true,
                '"' if !escaped => {
                    end = Some(index);
                    break;
                }
                _ => escaped = false,
            }
        }
        let end = end?;
        if name == key {
            return Some(unquote(&after[1..end]));
        }
        rest = &after[end + 1..];
    }
}

fn unquote(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some(other) => result.push(other),
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Serialization hints read from a struct field's tag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTags {
    /// Property name from the `json` tag
    pub rename: Option<String>,
    /// `json:"-"` or `goas:"-"`
    pub omit: bool,
    pub required: bool,
    pub description: Option<String>,
    pub example: Option<String>,
    pub enum_values: Option<Vec<String>>,
    pub deprecated: bool,
}

impl FieldTags {
    pub fn parse(tag: Option<&str>) -> Self {
        let mut tags = FieldTags::default();
        let Some(tag) = tag else {
            return tags;
        };

        if let Some(goas) = tag_lookup(tag, "goas") {
            for option in goas.split(',') {
                let option = option.trim();
                if option == "-" {
                    tags.omit = true;
                } else if let Some(values) = option.strip_prefix("enum=") {
                    tags.enum_values =
                        Some(values.split_whitespace().map(str::to_string).collect());
                } else if option == "deprecated" {
                    tags.deprecated = true;
                }
            }
        }

        if let Some(json) = tag_lookup(tag, "json") {
            if json == "-" {
                tags.omit = true;
            } else {
                let mut parts = json.split(',');
                let name = parts.next().unwrap_or("").trim();
                if name == "required" {
                    tags.required = true;
                } else if !name.is_empty() {
                    tags.rename = Some(name.to_string());
                }
                if parts.any(|option| option.trim() == "required") {
                    tags.required = true;
                }
            }
        }

        if tag_lookup(tag, "required").is_some() {
            tags.required = true;
        }
        tags.description = tag_lookup(tag, "description");
        tags.example = tag_lookup(tag, "example");
        tags
    }
}

/// Converts an example literal according to the schema type it documents.
///
/// Unparseable scalars keep the literal text; unparseable arrays and objects
/// become the string `invalid example`.
pub fn coerce_example(schema_type: Option<&str>, literal: &str) -> Value {
    match schema_type {
        Some("boolean") => literal
            .parse::<bool>()
            .map(Value::Bool)
            .unwrap_or_else(|_| Value::String(literal.to_string())),
        Some("integer") => literal
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(literal.to_string())),
        Some("number") => literal
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(literal.to_string())),
        Some("array") | Some("object") => serde_json::from_str::<Value>(literal)
            .ok()
            .filter(|v| v.is_array() || v.is_object())
            .unwrap_or_else(|| Value::String("invalid example".to_string())),
        _ => Value::String(literal.to_string()),
    }
}
