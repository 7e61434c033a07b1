//! Declarative resource schemas
//!
//! Each resource and data source describes its attributes once. The schema
//! is exported to the host, validates configuration, and drives planning
//! (which computed values carry over, which changes force replacement).

use serde::Serialize;

use crate::diagnostics::Diagnostic;
use crate::state::DynamicValue;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Bool,
    Number,
    List(Box<AttributeType>),
    Set(Box<AttributeType>),
    Map(Box<AttributeType>),
    Object(Vec<Attribute>),
}

impl AttributeType {
    pub fn list_of(element: AttributeType) -> Self {
        AttributeType::List(Box::new(element))
    }

    pub fn set_of(element: AttributeType) -> Self {
        AttributeType::Set(Box::new(element))
    }

    pub fn map_of(element: AttributeType) -> Self {
        AttributeType::Map(Box::new(element))
    }

    fn name(&self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Bool => "bool",
            AttributeType::Number => "number",
            AttributeType::List(_) => "list",
            AttributeType::Set(_) => "set",
            AttributeType::Map(_) => "map",
            AttributeType::Object(_) => "object",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: AttributeType,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub force_new: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
}

impl Attribute {
    fn new(name: &str, ty: AttributeType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            description: String::new(),
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            force_new: false,
            allowed_values: Vec::new(),
        }
    }

    pub fn required(name: &str, ty: AttributeType) -> Self {
        Self {
            required: true,
            ..Self::new(name, ty)
        }
    }

    pub fn optional(name: &str, ty: AttributeType) -> Self {
        Self {
            optional: true,
            ..Self::new(name, ty)
        }
    }

    pub fn computed(name: &str, ty: AttributeType) -> Self {
        Self {
            computed: true,
            ..Self::new(name, ty)
        }
    }

    /// Set by the user or, when left out, by the service
    pub fn optional_computed(name: &str, ty: AttributeType) -> Self {
        Self {
            optional: true,
            computed: true,
            ..Self::new(name, ty)
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.allowed_values = values.iter().map(|v| v.to_string()).collect();
        self
    }

    fn computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub version: i64,
    pub description: String,
    pub attributes: Vec<Attribute>,
}

impl Schema {
    /// A schema with the computed `id` attribute every resource carries
    pub fn new(description: &str) -> Self {
        Self {
            version: 0,
            description: description.to_string(),
            attributes: vec![Attribute::computed("id", AttributeType::String)],
        }
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.retain(|a| a.name != attribute.name);
        self.attributes.push(attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Check a configuration value against the schema
    pub fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        match config {
            DynamicValue::Null => {}
            DynamicValue::Map(_) => validate_object(&self.attributes, config, "", &mut diagnostics),
            _ => diagnostics.push(Diagnostic::error(
                "Invalid configuration",
                "configuration must be an object",
            )),
        }
        diagnostics
    }

    /// The planned state for a proposed configuration.
    ///
    /// Computed attributes the configuration leaves null keep their prior
    /// value unless a replacing change is planned.
    pub fn plan(&self, prior: &DynamicValue, proposed: &DynamicValue) -> DynamicValue {
        let mut planned = match proposed.as_map() {
            Some(m) => m.clone(),
            None => return proposed.clone(),
        };
        if prior.is_null() || !self.requires_replace(prior, proposed).is_empty() {
            return DynamicValue::Map(planned);
        }
        for attr in self.attributes.iter().filter(|a| a.computed) {
            let proposed_value = proposed.attr(&attr.name);
            if proposed_value.is_null() {
                planned.insert(attr.name.clone(), prior.attr(&attr.name).clone());
            }
        }
        DynamicValue::Map(planned)
    }

    /// Force-new attributes whose value would change
    pub fn requires_replace(&self, prior: &DynamicValue, proposed: &DynamicValue) -> Vec<String> {
        if prior.is_null() || proposed.is_null() {
            return Vec::new();
        }
        self.attributes
            .iter()
            .filter(|a| a.force_new)
            .filter(|a| {
                let new = proposed.attr(&a.name);
                // An unset optional+computed value keeps whatever the service chose.
                !(a.computed && new.is_null()) && new != prior.attr(&a.name)
            })
            .map(|a| a.name.clone())
            .collect()
    }
}

fn path_of(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn validate_object(
    attributes: &[Attribute],
    value: &DynamicValue,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(map) = value.as_map() else {
        return;
    };

    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    for key in keys {
        if !attributes.iter().any(|a| &a.name == key) {
            diagnostics.push(
                Diagnostic::error(
                    "Unsupported argument",
                    format!("An argument named \"{}\" is not expected here", key),
                )
                .with_attribute(path_of(prefix, key)),
            );
        }
    }

    for attr in attributes {
        let path = path_of(prefix, &attr.name);
        let v = value.attr(&attr.name);
        if v.is_null() {
            if attr.required {
                diagnostics.push(
                    Diagnostic::error(
                        "Missing required argument",
                        format!("The argument \"{}\" is required, but no definition was found", path),
                    )
                    .with_attribute(path),
                );
            }
            continue;
        }
        if attr.computed_only() && attr.name != "id" {
            diagnostics.push(
                Diagnostic::error(
                    "Value for unconfigurable attribute",
                    format!("\"{}\" is computed and cannot be set", path),
                )
                .with_attribute(path),
            );
            continue;
        }
        validate_value(&attr.ty, v, &path, diagnostics);
        if !attr.allowed_values.is_empty() {
            if let Some(s) = v.as_string() {
                if !attr.allowed_values.iter().any(|a| a == s) {
                    diagnostics.push(
                        Diagnostic::error(
                            "Invalid value",
                            format!(
                                "expected {} to be one of [{}], got {}",
                                path,
                                attr.allowed_values.join(", "),
                                s
                            ),
                        )
                        .with_attribute(path),
                    );
                }
            }
        }
    }
}

fn validate_value(
    ty: &AttributeType,
    value: &DynamicValue,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let ok = match (ty, value) {
        (_, DynamicValue::Null) => true,
        (AttributeType::String, DynamicValue::String(_)) => true,
        (AttributeType::Bool, DynamicValue::Bool(_)) => true,
        (AttributeType::Number, DynamicValue::Number(_)) => true,
        (AttributeType::List(element) | AttributeType::Set(element), DynamicValue::List(items)) => {
            for (i, item) in items.iter().enumerate() {
                validate_value(element, item, &format!("{}[{}]", path, i), diagnostics);
            }
            true
        }
        (AttributeType::Map(element), DynamicValue::Map(entries)) => {
            for (key, item) in entries {
                validate_value(element, item, &format!("{}.{}", path, key), diagnostics);
            }
            true
        }
        (AttributeType::Object(attributes), DynamicValue::Map(_)) => {
            validate_object(attributes, value, path, diagnostics);
            true
        }
        _ => false,
    };
    if !ok {
        diagnostics.push(
            Diagnostic::error(
                "Incorrect attribute value type",
                format!("{} must be a {}", path, ty.name()),
            )
            .with_attribute(path),
        );
    }
}
