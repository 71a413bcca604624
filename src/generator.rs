//! Generation run orchestration.
//!
//! A [`Generator`] owns every cache of one run: the package locator, the
//! declaration indexer, the schema identity cache and the document being
//! assembled. Two generators never share state, so a run can be repeated
//! with fresh results.

use crate::annotation::{
    self, coerce_example, Directive, InfoDirective, ParamDirective, ParamLocation,
    ResponseDirective, RouteDirective,
};
use crate::config::{GeneratorConfig, ResolvedConfig};
use crate::error::{Error, Result};
use crate::gomod::GoMod;
use crate::indexer::DeclarationIndexer;
use crate::locator::{Package, PackageLocator};
use crate::openapi_builder::{
    MediaType, OpenApiBuilder, OpenApiDocument, Operation, Parameter, RequestBody, Response,
};
use crate::parser::AstParser;
use crate::schema_generator::{Schema, SchemaGenerator};
use crate::syntax::{CommentGroup, Decl};
use crate::type_resolver::{TypeRef, TypeResolver};
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

const CONTENT_TYPE_JSON: &str = "application/json";
const CONTENT_TYPE_TEXT: &str = "text/plain";
const CONTENT_TYPE_FORM: &str = "multipart/form-data";

/// An operation parsed from one declaration's doc comment, with its routes
type ParsedOperation = (Vec<RouteDirective>, Operation);

pub struct Generator {
    config: ResolvedConfig,
    schema_generator: SchemaGenerator,
    builder: OpenApiBuilder,
    diagnostics: Vec<Error>,
}

impl Generator {
    /// Validates the configuration and discovers the module's packages.
    ///
    /// # Errors
    ///
    /// Fails when the configuration does not resolve, `go.mod` cannot be
    /// read, or the module tree cannot be walked.
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        let config = config.resolve()?;
        let manifest = GoMod::from_file(&config.go_mod_file)?;
        info!(
            "Generating OpenAPI document for module {} at {}",
            manifest.module,
            config.module_root.display()
        );

        let go_mod_cache = existing_dir(config.go_mod_cache.clone(), "module cache");
        let go_root_src = existing_dir(config.go_root_src.clone(), "Go root source");
        let locator =
            PackageLocator::discover(&config.module_root, manifest, go_mod_cache, go_root_src)?;
        let resolver = TypeResolver::new(
            locator,
            DeclarationIndexer::new(config.strict),
            config.schema_without_package,
        );

        Ok(Self {
            schema_generator: SchemaGenerator::new(resolver, config.strict),
            builder: OpenApiBuilder::new(),
            diagnostics: Vec::new(),
            config,
        })
    }

    /// Reads the general API information and every annotated operation.
    ///
    /// # Errors
    ///
    /// In strict mode any diagnostic is an error. In lax mode only
    /// unrecoverable failures (I/O, unknown same-package types) are.
    pub fn parse(&mut self) -> Result<()> {
        self.parse_info()?;
        self.parse_operations()?;
        let diagnostics = self.schema_generator.take_diagnostics();
        self.diagnostics.extend(diagnostics);
        info!(
            "Parsed {} paths and {} schemas with {} diagnostics",
            self.builder.paths().len(),
            self.schema_generator.get_schemas().len(),
            self.diagnostics.len()
        );
        Ok(())
    }

    fn parse_info(&mut self) -> Result<()> {
        let main_file = self.config.main_file.clone();
        info!("Parsing general API info from {}", main_file.display());
        let parsed = AstParser::parse_file(&main_file)?;

        for group in &parsed.syntax_tree.comments {
            for line in &group.lines {
                let directive = match annotation::parse_info_line(line) {
                    Ok(Some(directive)) => directive,
                    Ok(None) => continue,
                    Err(err) => {
                        self.recover(err)?;
                        continue;
                    }
                };
                match directive {
                    InfoDirective::PackageAlias { original, alias } => {
                        debug!("Package alias {} => {:?}", original, alias);
                        self.schema_generator
                            .type_resolver_mut()
                            .set_package_alias(&original, &alias);
                    }
                    other => self.builder.apply_info(other),
                }
            }
        }
        Ok(())
    }

    fn parse_operations(&mut self) -> Result<()> {
        let packages: Vec<Package> = self
            .schema_generator
            .type_resolver()
            .locator()
            .module_packages()
            .into_iter()
            .filter(|package| match &self.config.handler_root {
                Some(root) => package.path.starts_with(root),
                None => true,
            })
            .collect();

        for package in packages {
            debug!("Parsing operations in package {}", package.name);
            let index = self
                .schema_generator
                .type_resolver_mut()
                .package_index(&package)?;
            for file in &index.files {
                for decl in &file.syntax_tree.decls {
                    let Some(doc) = decl.doc() else {
                        continue;
                    };
                    if annotation::is_hidden(&doc.lines) {
                        debug!("Skipping hidden declaration in {}", file.path.display());
                        continue;
                    }
                    let scope = match decl {
                        Decl::Func(func) => Some(match &func.receiver {
                            Some(receiver) => format!("{}@{}", receiver, func.name),
                            None => func.name.clone(),
                        }),
                        Decl::Gen(_) => None,
                    };
                    match self.parse_declaration(&package, scope.as_deref(), doc) {
                        Ok(Some((routes, operation))) => self.attach(routes, operation)?,
                        Ok(None) => {}
                        Err(err) => {
                            warn!("Dropping operation in {}", file.path.display());
                            self.recover(err)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Interprets one declaration's doc comment.
    ///
    /// Returns `None` when the comment carries no route. Header parameter
    /// groups are registered once every line has been read, so a malformed
    /// comment registers nothing.
    fn parse_declaration(
        &mut self,
        package: &Package,
        scope: Option<&str>,
        doc: &CommentGroup,
    ) -> Result<Option<ParsedOperation>> {
        let mut operation = Operation::default();
        let mut routes = Vec::new();
        let mut descriptions = Vec::new();
        let mut header_parameters = Vec::new();

        for line in &doc.lines {
            let Some(directive) = annotation::parse_operation_line(line)? else {
                continue;
            };
            match directive {
                Directive::Title(title) => operation.summary = Some(title),
                Directive::Description(text) => descriptions.push(text),
                Directive::OperationId(id) => operation.operation_id = Some(id),
                Directive::Param(param) => self.add_param(package, scope, &mut operation, param)?,
                Directive::Response(response) => {
                    self.add_response(package, scope, &mut operation, response)?
                }
                Directive::Route(route) => routes.push(route),
                Directive::Tag(tag) => {
                    if !operation.tags.contains(&tag) {
                        operation.tags.push(tag);
                    }
                }
                Directive::Header(reference) => {
                    for (name, _, _) in self.header_properties(package, scope, &reference)? {
                        operation.parameters.push(Parameter::reference_to(&name));
                    }
                }
                Directive::HeaderParameters(reference) => header_parameters
                    .extend(self.header_parameters(package, scope, &reference)?),
                Directive::Deprecated => operation.deprecated = true,
                Directive::Hidden => return Ok(None),
            }
        }

        for (name, parameter) in header_parameters {
            self.builder.add_component_parameter(&name, parameter);
        }

        let description = descriptions.join(" ").trim().to_string();
        if !description.is_empty() {
            operation.description = Some(description);
        }

        if routes.is_empty() {
            return Ok(None);
        }
        Ok(Some((routes, operation)))
    }

    fn attach(&mut self, routes: Vec<RouteDirective>, operation: Operation) -> Result<()> {
        for route in routes {
            if let Err(err) = self.builder.add_operation(&route, operation.clone()) {
                if self.config.strict {
                    return Err(err);
                }
                self.diagnostics.push(err);
            }
        }
        Ok(())
    }

    fn recover(&mut self, err: Error) -> Result<()> {
        if self.config.strict || !err.is_recoverable() {
            return Err(err);
        }
        warn!("{}", err);
        self.diagnostics.push(err);
        Ok(())
    }

    fn add_param(
        &mut self,
        package: &Package,
        scope: Option<&str>,
        operation: &mut Operation,
        param: ParamDirective,
    ) -> Result<()> {
        let description = (!param.description.is_empty()).then(|| param.description.clone());
        match param.location {
            ParamLocation::Path
            | ParamLocation::Query
            | ParamLocation::Header
            | ParamLocation::Cookie => {
                let schema = self
                    .schema_generator
                    .resolve(package, scope, &param.go_type)?;
                let example = param
                    .example
                    .as_deref()
                    .map(|literal| coerce_example(schema.schema_type.as_deref(), literal));
                operation.parameters.push(Parameter {
                    name: param.name,
                    location: param.location.as_str().to_string(),
                    description,
                    required: param.required || param.location == ParamLocation::Path,
                    example,
                    schema: Some(schema),
                    ..Default::default()
                });
            }
            ParamLocation::Body => {
                let schema = self
                    .schema_generator
                    .resolve(package, scope, &param.go_type)?;
                let example = param.example.map(|literal| {
                    serde_json::from_str::<Value>(&literal).unwrap_or(Value::String(literal))
                });
                let body = operation
                    .request_body
                    .get_or_insert_with(RequestBody::default);
                body.required |= param.required;
                if description.is_some() {
                    body.description = description;
                }
                body.content
                    .insert(CONTENT_TYPE_JSON.to_string(), MediaType { schema, example });
            }
            ParamLocation::File | ParamLocation::Files | ParamLocation::Form => {
                let mut property = match param.location {
                    ParamLocation::File => binary(),
                    ParamLocation::Files => Schema::array(binary()),
                    _ => self
                        .schema_generator
                        .resolve(package, scope, &param.go_type)?,
                };
                property.description = description;

                let body = operation
                    .request_body
                    .get_or_insert_with(RequestBody::default);
                body.required |= param.required;
                let media = body
                    .content
                    .entry(CONTENT_TYPE_FORM.to_string())
                    .or_insert_with(|| MediaType {
                        schema: Schema::object(),
                        example: None,
                    });
                if param.required && !media.schema.required.contains(&param.name) {
                    media.schema.required.push(param.name.clone());
                }
                media
                    .schema
                    .properties
                    .get_or_insert_with(IndexMap::new)
                    .insert(param.name, property);
            }
        }
        Ok(())
    }

    fn add_response(
        &mut self,
        package: &Package,
        scope: Option<&str>,
        operation: &mut Operation,
        directive: ResponseDirective,
    ) -> Result<()> {
        let mut response = Response {
            description: directive.description,
            content: BTreeMap::new(),
        };
        if let Some(go_type) = &directive.go_type {
            let (content_type, schema) = match TypeRef::parse(go_type)? {
                TypeRef::Primitive(_) => (CONTENT_TYPE_TEXT, Schema::string()),
                _ => (
                    CONTENT_TYPE_JSON,
                    self.schema_generator.resolve(package, scope, go_type)?,
                ),
            };
            response.content.insert(
                content_type.to_string(),
                MediaType {
                    schema,
                    example: None,
                },
            );
        }
        operation
            .responses
            .insert(directive.status.to_string(), response);
        Ok(())
    }

    /// Properties of the struct a header directive names, in declaration
    /// order, each with whether the struct requires it
    fn header_properties(
        &mut self,
        package: &Package,
        scope: Option<&str>,
        reference: &str,
    ) -> Result<Vec<(String, Schema, bool)>> {
        let id = self.schema_generator.register(package, scope, reference)?;
        let header_error = || Error::grammar("@Header", reference, "not a struct type");
        let schema = self
            .schema_generator
            .known_schema(&id)
            .ok_or_else(header_error)?;
        let object = self
            .schema_generator
            .object_schema(schema)
            .ok_or_else(header_error)?;

        Ok(object
            .properties
            .iter()
            .flatten()
            .map(|(name, property)| {
                (name.clone(), property.clone(), object.required.contains(name))
            })
            .collect())
    }

    /// One `in: header` component parameter per property of a header group
    fn header_parameters(
        &mut self,
        package: &Package,
        scope: Option<&str>,
        reference: &str,
    ) -> Result<Vec<(String, Parameter)>> {
        Ok(self
            .header_properties(package, scope, reference)?
            .into_iter()
            .map(|(name, property, required)| {
                let parameter = Parameter {
                    name: name.clone(),
                    location: "header".to_string(),
                    description: property.description.clone(),
                    required,
                    example: property.example.clone(),
                    schema: Some(property),
                    ..Default::default()
                };
                (name, parameter)
            })
            .collect())
    }

    /// Diagnostics recorded so far in lax mode
    pub fn diagnostics(&self) -> &[Error] {
        &self.diagnostics
    }

    pub fn builder(&self) -> &OpenApiBuilder {
        &self.builder
    }

    pub fn schema_generator(&self) -> &SchemaGenerator {
        &self.schema_generator
    }

    /// Validates and assembles the document
    ///
    /// # Errors
    ///
    /// Fails on duplicate routes and on missing title, version or server URL.
    pub fn build(self) -> Result<OpenApiDocument> {
        self.builder.build(self.schema_generator.into_schemas())
    }
}

fn binary() -> Schema {
    Schema {
        schema_type: Some("string".to_string()),
        format: Some("binary".to_string()),
        ..Default::default()
    }
}

fn existing_dir(path: Option<PathBuf>, what: &str) -> Option<PathBuf> {
    let path = path?;
    if path.is_dir() {
        Some(path)
    } else {
        warn!("{} {} does not exist, lookups there are skipped", what, path.display());
        None
    }
}

/// Runs a whole generation: configuration, parsing, validation.
///
/// # Errors
///
/// See [`Generator::new`], [`Generator::parse`] and [`Generator::build`].
pub fn generate(config: &GeneratorConfig) -> Result<OpenApiDocument> {
    let mut generator = Generator::new(config)?;
    generator.parse()?;
    generator.build()
}
