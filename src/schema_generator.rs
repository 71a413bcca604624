use crate::annotation::{coerce_example, FieldTags};
use crate::error::{Error, Result};
use crate::indexer::TypeDeclaration;
use crate::locator::Package;
use crate::syntax::Field;
use crate::type_resolver::{CompoundOp, PrimitiveType, Resolution, TypeRef, TypeResolver};
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Prefix of every reference into `components.schemas`
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Schema generator - converts Go types to OpenAPI schemas
///
/// Each named type is synthesized once. Its id is recorded with an empty
/// placeholder before the type's own structure is walked, so a type that
/// refers back to itself (directly or through other types) becomes a
/// `$ref` instead of recursing forever.
pub struct SchemaGenerator {
    /// Type resolver for looking up type definitions
    type_resolver: TypeResolver,
    /// Every synthesized type by schema id, placeholders included
    known: HashMap<String, Schema>,
    /// Package and declaration key each schema id was first built from
    origins: HashMap<String, (String, String)>,
    /// Declarations of the schemas still being populated
    pending: HashMap<String, (Package, TypeDeclaration)>,
    /// Pending declarations currently expanded in place of their placeholder
    expanding: HashSet<String>,
    /// Schemas for `components.schemas`
    schemas: BTreeMap<String, Schema>,
    strict: bool,
    diagnostics: Vec<Error>,
}

/// OpenAPI Schema definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Reference to another schema
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format for primitive types (e.g., "int64", "double", "date-time")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Required property names for object types
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Properties for object types, in declaration order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,
    /// Value schema for map types
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<Box<Schema>>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Enum values for enum types
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(rename = "oneOf", skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Schema>>,
    #[serde(rename = "anyOf", skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<Schema>>,
    #[serde(rename = "allOf", skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Schema>>,
    /// Schema id for named types
    #[serde(skip)]
    pub id: String,
    /// Go field name a property was generated from
    #[serde(skip)]
    pub field_name: String,
    /// Go field names excluded from serialization
    #[serde(skip)]
    pub disabled_field_names: BTreeSet<String>,
}

impl Schema {
    pub fn primitive(primitive: PrimitiveType) -> Self {
        let (schema_type, format) = primitive.oas_type();
        Self {
            schema_type: Some(schema_type.to_string()),
            format: format.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn string() -> Self {
        Self::primitive(PrimitiveType::String)
    }

    pub fn date_time() -> Self {
        Self {
            schema_type: Some("string".to_string()),
            format: Some("date-time".to_string()),
            ..Default::default()
        }
    }

    /// No constraints at all
    pub fn free_form() -> Self {
        Self::default()
    }

    pub fn object() -> Self {
        Self {
            schema_type: Some("object".to_string()),
            ..Default::default()
        }
    }

    pub fn array(items: Schema) -> Self {
        Self {
            schema_type: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    pub fn map(value: Schema) -> Self {
        Self {
            schema_type: Some("object".to_string()),
            additional_properties: Some(Box::new(value)),
            ..Default::default()
        }
    }

    pub fn reference_to(id: &str) -> Self {
        Self {
            reference: Some(format!("{}{}", SCHEMA_REF_PREFIX, id)),
            ..Default::default()
        }
    }

    /// Schema id this schema refers to, if it is a reference
    pub fn referenced_id(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .and_then(|r| r.strip_prefix(SCHEMA_REF_PREFIX))
    }

    /// Copies the structural parts of `other`, leaving identity fields alone
    fn copy_shape_from(&mut self, other: &Schema) {
        self.reference = other.reference.clone();
        self.schema_type = other.schema_type.clone();
        self.format = other.format.clone();
        self.required = other.required.clone();
        self.properties = other.properties.clone();
        self.additional_properties = other.additional_properties.clone();
        self.items = other.items.clone();
        self.enum_values = other.enum_values.clone();
        self.one_of = other.one_of.clone();
        self.any_of = other.any_of.clone();
        self.all_of = other.all_of.clone();
        self.not = other.not.clone();
    }
}

impl SchemaGenerator {
    /// Create a new SchemaGenerator with a TypeResolver
    pub fn new(type_resolver: TypeResolver, strict: bool) -> Self {
        debug!("Initializing SchemaGenerator (strict: {})", strict);
        Self {
            type_resolver,
            known: HashMap::new(),
            origins: HashMap::new(),
            pending: HashMap::new(),
            expanding: HashSet::new(),
            schemas: BTreeMap::new(),
            strict,
            diagnostics: Vec::new(),
        }
    }

    pub fn type_resolver(&self) -> &TypeResolver {
        &self.type_resolver
    }

    pub fn type_resolver_mut(&mut self) -> &mut TypeResolver {
        &mut self.type_resolver
    }

    /// Builds the schema for a type reference as seen from `package`.
    ///
    /// Named types are synthesized and registered on first use and come back
    /// as `$ref` nodes; arrays, maps, primitives and compounds are inline.
    /// `scope` names the function whose local types are visible.
    ///
    /// # Errors
    ///
    /// Fails on a malformed reference, on an unknown same-package type, and,
    /// in strict mode, on any type that cannot be located.
    pub fn resolve(
        &mut self,
        package: &Package,
        scope: Option<&str>,
        reference: &str,
    ) -> Result<Schema> {
        let type_ref = TypeRef::parse(reference)?;
        self.resolve_type_ref(package, scope, &type_ref)
    }

    /// Ensures a named type is in `components.schemas` and returns its id.
    ///
    /// Primitive references return the primitive's name unchanged.
    pub fn register(
        &mut self,
        package: &Package,
        scope: Option<&str>,
        reference: &str,
    ) -> Result<String> {
        match TypeRef::parse(reference)? {
            TypeRef::Primitive(_) => Ok(reference.trim().trim_start_matches('*').to_string()),
            TypeRef::Named(name) => match self.type_resolver.lookup(package, scope, &name)? {
                Resolution::Declared {
                    package,
                    declaration,
                } => self.synthesize(&package, &declaration),
                Resolution::Unresolved { reason, .. } => Err(reason),
            },
            _ => Err(Error::InvalidReference(reference.to_string())),
        }
    }

    fn resolve_type_ref(
        &mut self,
        package: &Package,
        scope: Option<&str>,
        type_ref: &TypeRef,
    ) -> Result<Schema> {
        let schema = match type_ref {
            TypeRef::Primitive(primitive) => Schema::primitive(*primitive),
            TypeRef::Time => Schema::date_time(),
            TypeRef::Any => Schema::free_form(),
            TypeRef::Array(inner) => Schema::array(self.resolve_type_ref(package, scope, inner)?),
            TypeRef::Map(inner) => Schema::map(self.resolve_type_ref(package, scope, inner)?),
            TypeRef::Compound { op, args } => self.compound(package, scope, *op, args)?,
            TypeRef::Struct(fields) => {
                let mut schema = Schema::default();
                self.populate_struct(package, scope, fields, &[], &mut schema)?;
                schema
            }
            TypeRef::Named(name) => self.named(package, scope, name)?,
        };
        Ok(schema)
    }

    fn compound(
        &mut self,
        package: &Package,
        scope: Option<&str>,
        op: CompoundOp,
        args: &[String],
    ) -> Result<Schema> {
        let mut members = Vec::with_capacity(args.len());
        for arg in args {
            members.push(self.resolve(package, scope, arg)?);
        }
        let mut schema = Schema::default();
        match op {
            CompoundOp::OneOf => schema.one_of = Some(members),
            CompoundOp::AnyOf => schema.any_of = Some(members),
            CompoundOp::AllOf => schema.all_of = Some(members),
            CompoundOp::Not => schema.not = members.into_iter().next().map(Box::new),
        }
        Ok(schema)
    }

    /// Reference to a named type, or a degraded schema when it cannot be found
    fn named(&mut self, package: &Package, scope: Option<&str>, name: &str) -> Result<Schema> {
        match self.type_resolver.lookup(package, scope, name)? {
            Resolution::Declared {
                package,
                declaration,
            } => {
                let id = self.synthesize(&package, &declaration)?;
                Ok(Schema::reference_to(&id))
            }
            Resolution::Unresolved { reason, core } => {
                if let Some((alias, type_name)) = name.rsplit_once('.') {
                    if let Some(Resolution::Declared {
                        package,
                        declaration,
                    }) = self.type_resolver.lookup_by_suffix(alias, type_name)?
                    {
                        debug!("Resolved {} through package {}", name, package.name);
                        let id = self.synthesize(&package, &declaration)?;
                        return Ok(Schema::reference_to(&id));
                    }
                }
                self.degrade(reason, core)
            }
        }
    }

    fn degrade(&mut self, reason: Error, core: bool) -> Result<Schema> {
        if self.strict {
            return Err(reason);
        }
        warn!("{}, using a free-form schema", reason);
        self.diagnostics.push(reason);
        Ok(if core {
            Schema::object()
        } else {
            Schema::free_form()
        })
    }

    /// Builds and registers the schema of a declared type, returning its id
    fn synthesize(&mut self, package: &Package, declaration: &TypeDeclaration) -> Result<String> {
        let id = self
            .type_resolver
            .schema_id(&package.name, &declaration.key);
        if self.known.contains_key(&id) {
            if let Some((origin_package, origin_key)) = self.origins.get(&id) {
                if origin_package != &package.name || origin_key != &declaration.key {
                    warn!(
                        "Schema id {} already taken by {}.{}, {}.{} is not emitted",
                        id, origin_package, origin_key, package.name, declaration.key
                    );
                }
            }
            return Ok(id);
        }

        debug!("Generating schema {} from {}", id, declaration.file.display());
        self.origins
            .insert(id.clone(), (package.name.clone(), declaration.key.clone()));
        let mut schema = Schema {
            id: id.clone(),
            ..Default::default()
        };
        self.known.insert(id.clone(), schema.clone());
        self.pending
            .insert(id.clone(), (package.clone(), declaration.clone()));

        let populated = self.populate(package, declaration, &mut schema);
        self.pending.remove(&id);
        populated?;

        self.known.insert(id.clone(), schema.clone());
        self.schemas.entry(id.clone()).or_insert(schema);
        Ok(id)
    }

    fn populate(
        &mut self,
        package: &Package,
        declaration: &TypeDeclaration,
        schema: &mut Schema,
    ) -> Result<()> {
        let scope = declaration.scope.as_deref();
        match TypeRef::from_shape(&declaration.shape, &declaration.type_params) {
            TypeRef::Struct(fields) => {
                self.populate_struct(package, scope, &fields, &declaration.type_params, schema)
            }
            TypeRef::Named(target) if target.contains('.') => {
                // Declared over another package's type: take over its structure
                let resolved = self.named(package, scope, &target)?;
                match self.flatten(&resolved).cloned() {
                    Some(flat) => schema.copy_shape_from(&flat),
                    None => schema.copy_shape_from(&resolved),
                }
                Ok(())
            }
            other => {
                let resolved = self.resolve_type_ref(package, scope, &other)?;
                schema.copy_shape_from(&resolved);
                Ok(())
            }
        }
    }

    fn populate_struct(
        &mut self,
        package: &Package,
        scope: Option<&str>,
        fields: &[Field],
        type_params: &[String],
        schema: &mut Schema,
    ) -> Result<()> {
        schema.schema_type = Some("object".to_string());

        let tags: Vec<FieldTags> = fields
            .iter()
            .map(|field| FieldTags::parse(field.tag.as_deref()))
            .collect();
        for (field, field_tags) in fields.iter().zip(&tags) {
            if field_tags.omit {
                schema.disabled_field_names.extend(field.names.iter().cloned());
                if let Some(name) = field.shape.embedded_name().filter(|_| field.is_embedded()) {
                    schema.disabled_field_names.insert(name.to_string());
                }
            }
        }

        let mut properties: IndexMap<String, Schema> = IndexMap::new();
        let mut required: Vec<String> = Vec::new();
        let mut promoted: HashSet<String> = HashSet::new();

        for (field, field_tags) in fields.iter().zip(&tags) {
            if field_tags.omit {
                continue;
            }
            let field_ref = TypeRef::from_shape(&field.shape, type_params);
            let field_schema = self.resolve_type_ref(package, scope, &field_ref)?;

            if field.is_embedded() && field_tags.rename.is_none() {
                let Some(source) = self.embedded_source(&field_schema)? else {
                    warn!(
                        "Embedded field {} contributes no properties",
                        field.shape.embedded_name().unwrap_or("?")
                    );
                    continue;
                };
                for (key, property) in source.properties.iter().flatten() {
                    if schema.disabled_field_names.contains(&property.field_name)
                        || properties.contains_key(key)
                    {
                        continue;
                    }
                    properties.insert(key.clone(), property.clone());
                    promoted.insert(key.clone());
                    if source.required.contains(key) && !required.contains(key) {
                        required.push(key.clone());
                    }
                }
                continue;
            }

            let names: Vec<String> = if field.is_embedded() {
                field
                    .shape
                    .embedded_name()
                    .map(|n| vec![n.to_string()])
                    .unwrap_or_default()
            } else {
                field.names.clone()
            };
            for name in names {
                let property_name = field_tags.rename.clone().unwrap_or_else(|| name.clone());
                if properties.contains_key(&property_name) {
                    if !promoted.remove(&property_name) {
                        continue;
                    }
                    // The promoted field's requirement does not carry over
                    if !field_tags.required {
                        required.retain(|r| r != &property_name);
                    }
                }
                let mut property = field_schema.clone();
                property.field_name = name;
                apply_field_tags(field_tags, &mut property);
                if field_tags.required && !required.contains(&property_name) {
                    required.push(property_name.clone());
                }
                properties.insert(property_name, property);
            }
        }

        schema.properties = Some(properties);
        schema.required = required;
        Ok(())
    }

    /// The object whose properties an embedded field promotes.
    ///
    /// A type still being populated (embedding cycles) is expanded from its
    /// declaration's own fields instead of its empty placeholder.
    fn embedded_source(&mut self, field_schema: &Schema) -> Result<Option<Schema>> {
        let Some(flat) = self.flatten(field_schema) else {
            return Ok(None);
        };
        if flat.properties.is_some() {
            return Ok(Some(flat.clone()));
        }
        let id = flat.id.clone();
        let Some((package, declaration)) = self.pending.get(&id).cloned() else {
            return Ok(None);
        };
        if !self.expanding.insert(id.clone()) {
            return Ok(None);
        }

        debug!("Expanding {} in place of its placeholder", id);
        let expanded = match TypeRef::from_shape(&declaration.shape, &declaration.type_params) {
            TypeRef::Struct(fields) => {
                let mut schema = Schema::default();
                self.populate_struct(
                    &package,
                    declaration.scope.as_deref(),
                    &fields,
                    &declaration.type_params,
                    &mut schema,
                )
                .map(|_| Some(schema))
            }
            _ => Ok(None),
        };
        self.expanding.remove(&id);
        expanded
    }

    /// Follows `$ref` chains through known schemas to a concrete schema
    fn flatten<'a>(&'a self, schema: &'a Schema) -> Option<&'a Schema> {
        let mut current = schema;
        let mut seen = HashSet::new();
        while let Some(id) = current.referenced_id() {
            if !seen.insert(id.to_string()) {
                return None;
            }
            current = self.known.get(id)?;
        }
        Some(current)
    }

    /// The schema carrying `schema`'s properties, following references
    pub fn object_schema<'a>(&'a self, schema: &'a Schema) -> Option<&'a Schema> {
        self.flatten(schema).filter(|s| s.properties.is_some())
    }

    /// A synthesized schema by id
    pub fn known_schema(&self, id: &str) -> Option<&Schema> {
        self.known.get(id)
    }

    /// Get all registered schemas
    pub fn get_schemas(&self) -> &BTreeMap<String, Schema> {
        &self.schemas
    }

    pub fn into_schemas(self) -> BTreeMap<String, Schema> {
        self.schemas
    }

    /// Drains diagnostics collected since the last call, including the indexer's
    pub fn take_diagnostics(&mut self) -> Vec<Error> {
        let mut diagnostics = std::mem::take(&mut self.diagnostics);
        diagnostics.extend(self.type_resolver.indexer_mut().take_diagnostics());
        diagnostics
    }
}

fn apply_field_tags(tags: &FieldTags, property: &mut Schema) {
    if let Some(description) = &tags.description {
        property.description = Some(description.clone());
    }
    if let Some(values) = &tags.enum_values {
        property.enum_values = Some(values.clone());
    }
    if tags.deprecated {
        property.deprecated = true;
    }
    if let Some(example) = &tags.example {
        property.example = Some(coerce_example(property.schema_type.as_deref(), example));
    }
}
