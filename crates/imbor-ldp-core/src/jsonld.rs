//! JSON-LD term expansion and compaction.
//!
//! Implements the subset of the JSON-LD algorithms needed for
//! management-object nodes. [`DocumentContext`] expands the terms and compact
//! IRIs an LDP response declares in its own `@context`. [`JsonLdContext`]
//! then replaces full property IRIs by its terms, unwraps single-element
//! arrays and simplifies value objects where the active context allows it.

use std::collections::HashMap;

use serde_json::{Map, Value, json};

const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
const SKOS: &str = "http://www.w3.org/2004/02/skos/core#";

/// One term of a JSON-LD context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermDefinition {
    /// Short name used in compacted output.
    pub term: String,
    /// Full property IRI.
    pub iri: String,
    /// Whether the term is declared `"@type": "@id"`.
    pub id_typed: bool,
}

impl TermDefinition {
    fn new(term: &str, iri: String, id_typed: bool) -> Self {
        Self {
            term: term.to_owned(),
            iri,
            id_typed,
        }
    }
}

/// A JSON-LD context with a default language and a set of terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonLdContext {
    language: Option<String>,
    terms: Vec<TermDefinition>,
}

impl JsonLdContext {
    /// Create a context from a default language and term definitions.
    #[must_use]
    pub fn new(language: Option<String>, terms: Vec<TermDefinition>) -> Self {
        Self { language, terms }
    }

    /// The context for management objects (`beheerobjecten`).
    #[must_use]
    pub fn beheerobject() -> Self {
        Self::new(
            Some("nl-nl".to_owned()),
            vec![
                TermDefinition::new("label", format!("{RDFS}label"), false),
                TermDefinition::new("prefLabel", format!("{SKOS}prefLabel"), false),
                TermDefinition::new("subClassOf", format!("{RDFS}subClassOf"), true),
                TermDefinition::new("guid", format!("{SKOS}notation"), true),
                TermDefinition::new("definition", format!("{SKOS}definition"), false),
            ],
        )
    }

    /// The context as a JSON object, suitable for `@context`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut ctx = Map::new();
        if let Some(language) = &self.language {
            ctx.insert("@language".to_owned(), Value::from(language.as_str()));
        }
        for def in &self.terms {
            let value = if def.id_typed {
                json!({ "@id": def.iri, "@type": "@id" })
            } else {
                Value::from(def.iri.as_str())
            };
            ctx.insert(def.term.clone(), value);
        }
        Value::Object(ctx)
    }

    /// Compact an expanded JSON-LD node (or array of nodes) against this context.
    ///
    /// A single node is returned with `@context` attached. Several nodes are
    /// wrapped as `{"@context": .., "@graph": [..]}`.
    #[must_use]
    pub fn compact(&self, input: &Value) -> Value {
        let compacted = match input {
            Value::Array(nodes) if nodes.len() == 1 => self.compact_element(&nodes[0], None),
            Value::Array(nodes) => {
                let graph = nodes
                    .iter()
                    .map(|n| self.compact_element(n, None))
                    .collect();
                let mut doc = Map::new();
                doc.insert("@graph".to_owned(), Value::Array(graph));
                Value::Object(doc)
            }
            other => self.compact_element(other, None),
        };

        match compacted {
            Value::Object(map) => {
                let mut doc = Map::with_capacity(map.len() + 1);
                doc.insert("@context".to_owned(), self.to_json());
                doc.extend(map);
                Value::Object(doc)
            }
            other => other,
        }
    }

    fn term_for(&self, iri: &str) -> Option<&TermDefinition> {
        self.terms.iter().find(|def| def.iri == iri)
    }

    fn compact_element(&self, element: &Value, term: Option<&TermDefinition>) -> Value {
        match element {
            Value::Array(items) => {
                let mut compacted: Vec<Value> = items
                    .iter()
                    .map(|item| self.compact_element(item, term))
                    .collect();
                if compacted.len() == 1 {
                    compacted.remove(0)
                } else {
                    Value::Array(compacted)
                }
            }
            Value::Object(map) if map.contains_key("@value") => self.compact_value(map),
            Value::Object(map) if term.is_some_and(|t| t.id_typed) && is_reference(map) => {
                map["@id"].clone()
            }
            Value::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, value) in map {
                    if key.starts_with('@') {
                        out.insert(key.clone(), value.clone());
                        continue;
                    }
                    let def = self.term_for(key);
                    let name = def.map_or_else(|| key.clone(), |d| d.term.clone());
                    out.insert(name, self.compact_element(value, def));
                }
                Value::Object(out)
            }
            other => other.clone(),
        }
    }

    fn compact_value(&self, map: &Map<String, Value>) -> Value {
        let value = &map["@value"];
        let language = map.get("@language").and_then(Value::as_str);
        let has_type = map.contains_key("@type");
        let only_value_keys = map
            .keys()
            .all(|k| matches!(k.as_str(), "@value" | "@language" | "@type"));

        if !only_value_keys || has_type {
            return Value::Object(map.clone());
        }

        match (value, language, self.language.as_deref()) {
            (Value::String(_), Some(lang), Some(default)) if lang.eq_ignore_ascii_case(default) => {
                value.clone()
            }
            (Value::String(_), None, None) => value.clone(),
            (Value::String(_), _, _) => Value::Object(map.clone()),
            (native, None, _) => native.clone(),
            _ => Value::Object(map.clone()),
        }
    }
}

/// Term and prefix mappings declared by an input document's `@context`.
///
/// Remote (string) contexts are not dereferenced; only inline definitions
/// are honoured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentContext {
    language: Option<String>,
    terms: HashMap<String, TermDefinition>,
}

impl DocumentContext {
    /// Read the top-level `@context` of a document.
    #[must_use]
    pub fn from_document(document: &Value) -> Self {
        let mut ctx = Self::default();
        if let Some(context) = document.get("@context") {
            ctx.merge(context);
        }
        ctx
    }

    fn merge(&mut self, context: &Value) {
        match context {
            Value::Array(items) => items.iter().for_each(|item| self.merge(item)),
            Value::Object(map) => {
                for (key, def) in map {
                    match (key.as_str(), def) {
                        ("@language", Value::String(lang)) => self.language = Some(lang.clone()),
                        ("@language", Value::Null) => self.language = None,
                        (k, _) if k.starts_with('@') => {}
                        (k, Value::Null) => {
                            self.terms.remove(k);
                        }
                        (k, def) => {
                            if let Some(def) = term_definition(k, def) {
                                self.terms.insert(k.to_owned(), def);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    /// Expand a property name or type: terms first, then `prefix:suffix`.
    #[must_use]
    pub fn expand_iri(&self, value: &str) -> String {
        match self.terms.get(value) {
            Some(def) => self.expand_prefixed(&def.iri),
            None => self.expand_prefixed(value),
        }
    }

    fn expand_prefixed(&self, value: &str) -> String {
        match value.split_once(':') {
            Some((prefix, suffix)) if !suffix.starts_with("//") => match self.terms.get(prefix) {
                Some(def) => format!("{}{suffix}", def.iri),
                None => value.to_owned(),
            },
            _ => value.to_owned(),
        }
    }

    /// Rewrite a node so every key is a full IRI and every literal is a
    /// value object. Node-local `@context` entries are applied and dropped.
    #[must_use]
    pub fn expand(&self, element: &Value) -> Value {
        self.expand_element(element, None)
    }

    fn expand_element(&self, element: &Value, term: Option<&TermDefinition>) -> Value {
        match element {
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.expand_element(item, term))
                    .collect(),
            ),
            Value::Object(map) if map.contains_key("@context") => {
                let mut local = self.clone();
                local.merge(&map["@context"]);
                let mut rest = map.clone();
                rest.remove("@context");
                local.expand_element(&Value::Object(rest), term)
            }
            Value::Object(map) if map.contains_key("@value") => {
                let mut out = map.clone();
                if let Some(Value::String(ty)) = map.get("@type") {
                    out.insert("@type".to_owned(), Value::from(self.expand_iri(ty)));
                }
                Value::Object(out)
            }
            Value::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, value) in map {
                    let expanded = match (key.as_str(), value) {
                        ("@id", Value::String(id)) => Value::from(self.expand_prefixed(id)),
                        ("@type", Value::String(ty)) => Value::from(self.expand_iri(ty)),
                        ("@type", Value::Array(types)) => types
                            .iter()
                            .map(|ty| match ty {
                                Value::String(ty) => Value::from(self.expand_iri(ty)),
                                other => other.clone(),
                            })
                            .collect(),
                        (k, _) if k.starts_with('@') => value.clone(),
                        (k, _) => {
                            let def = self.terms.get(k);
                            out.insert(self.expand_iri(k), self.expand_element(value, def));
                            continue;
                        }
                    };
                    out.insert(key.clone(), expanded);
                }
                Value::Object(out)
            }
            Value::String(s) => match (term, &self.language) {
                (Some(def), _) if def.id_typed => json!({ "@id": self.expand_prefixed(s) }),
                (_, Some(lang)) => json!({ "@value": s, "@language": lang }),
                (_, None) => json!({ "@value": s }),
            },
            other => other.clone(),
        }
    }
}

fn term_definition(term: &str, def: &Value) -> Option<TermDefinition> {
    match def {
        Value::String(iri) => Some(TermDefinition::new(term, iri.clone(), false)),
        Value::Object(def) => {
            let iri = def.get("@id").and_then(Value::as_str)?;
            let id_typed = def.get("@type").and_then(Value::as_str) == Some("@id");
            Some(TermDefinition::new(term, iri.to_owned(), id_typed))
        }
        _ => None,
    }
}

fn is_reference(map: &Map<String, Value>) -> bool {
    map.len() == 1 && map.get("@id").is_some_and(Value::is_string)
}
