//! Fixed SPARQL queries over the IMBOR/OTL vocabulary.
//!
//! Variable names in the SELECT clauses are part of the REST contract: they
//! become the keys of the flattened JSON objects returned to clients.

const PREFIXES: &str = "\
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX skos: <http://www.w3.org/2004/02/skos/core#>
PREFIX owl: <http://www.w3.org/2002/07/owl#>
PREFIX imbor: <https://data.crow.nl/imbor/def/>
PREFIX imbortype: <https://data.crow.nl/imbor/term/>
";

/// Render `value` as a double-quoted SPARQL string literal.
///
/// Backslash, double quote, newline, carriage return and tab are escaped, so
/// the value cannot terminate the literal early.
///
/// # Examples
///
/// ```
/// use imbor_ldp_core::queries::sparql_string_literal;
///
/// assert_eq!(sparql_string_literal(r#"a "b""#), r#""a \"b\"""#);
/// ```
#[must_use]
pub fn sparql_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// All collections (`naam`).
#[must_use]
pub fn collections() -> String {
    format!(
        "{PREFIXES}
SELECT DISTINCT ?naam
WHERE {{
  ?collectie a skos:Collection ;
             skos:prefLabel ?naam .
}}
ORDER BY ?naam"
    )
}

/// All disciplines (`VakdisciplineURI`, `VakdisciplineLabel`).
#[must_use]
pub fn disciplines() -> String {
    format!(
        "{PREFIXES}
SELECT DISTINCT ?VakdisciplineURI ?VakdisciplineLabel
WHERE {{
  ?VakdisciplineURI skos:inScheme imbortype:Vakdiscipline ;
                    skos:prefLabel ?VakdisciplineLabel .
}}
ORDER BY ?VakdisciplineLabel"
    )
}

/// All object type groups (`objecttypegroepURI`, `objecttypegroepLabel`).
#[must_use]
pub fn object_type_groups() -> String {
    format!(
        "{PREFIXES}
SELECT DISTINCT ?objecttypegroepURI ?objecttypegroepLabel
WHERE {{
  ?objecttypegroepURI skos:inScheme imbortype:Objecttypegroep ;
                      skos:prefLabel ?objecttypegroepLabel .
}}
ORDER BY ?objecttypegroepLabel"
    )
}

/// Physical object types belonging to the discipline labelled `discipline`.
#[must_use]
pub fn object_types_per_discipline(discipline: &str) -> String {
    let label = sparql_string_literal(discipline);
    format!(
        "{PREFIXES}
SELECT DISTINCT ?VakdisciplineURI ?VakdisciplineLabel ?FysiekObjectURI ?FysiekObjectLabel
WHERE {{
  ?VakdisciplineURI skos:inScheme imbortype:Vakdiscipline ;
                    skos:prefLabel ?VakdisciplineLabel .
  FILTER (lcase(str(?VakdisciplineLabel)) = lcase({label}))
  ?FysiekObjectURI imbor:vakdiscipline ?VakdisciplineURI ;
                   skos:prefLabel ?FysiekObjectLabel .
}}
ORDER BY ?FysiekObjectLabel"
    )
}

/// All management objects as JSON-LD nodes.
#[must_use]
pub fn management_objects() -> String {
    format!(
        "{PREFIXES}
CONSTRUCT {{
  ?beheerobject rdfs:label ?label ;
                skos:prefLabel ?prefLabel ;
                rdfs:subClassOf ?superklasse ;
                skos:notation ?guid ;
                skos:definition ?definitie .
}}
WHERE {{
  ?beheerobject a owl:Class ;
                rdfs:subClassOf* imbor:Beheerobject ;
                skos:prefLabel ?prefLabel .
  OPTIONAL {{ ?beheerobject rdfs:label ?label }}
  OPTIONAL {{ ?beheerobject rdfs:subClassOf ?superklasse }}
  OPTIONAL {{ ?beheerobject skos:notation ?guid }}
  OPTIONAL {{ ?beheerobject skos:definition ?definitie }}
}}"
    )
}

/// Properties of the management object labelled `object`.
#[must_use]
pub fn properties_per_management_object(object: &str) -> String {
    let label = sparql_string_literal(object);
    format!(
        "{PREFIXES}
SELECT DISTINCT ?FysiekObjectURI ?FysiekObjectLabel ?EigenschapURI ?EigenschapLabel ?EigenschapVanObjectLabel
WHERE {{
  ?FysiekObjectURI rdfs:subClassOf* imbor:Beheerobject ;
                   skos:prefLabel ?FysiekObjectLabel .
  FILTER (lcase(str(?FysiekObjectLabel)) = lcase({label}))
  ?FysiekObjectURI rdfs:subClassOf ?restrictie .
  ?restrictie owl:onProperty ?EigenschapURI .
  ?EigenschapURI skos:prefLabel ?EigenschapLabel .
  OPTIONAL {{
    ?EigenschapURI rdfs:domain ?domein .
    ?domein skos:prefLabel ?EigenschapVanObjectLabel .
  }}
}}
ORDER BY ?EigenschapLabel"
    )
}
