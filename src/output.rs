//! Human-readable views of what the provider serves, for the CLI.

use tabled::settings::Style;
use tabled::{Table, Tabled};
use termtree::Tree;

use crate::terraform::schema::{Attribute, Schema};

#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct TypeRow {
    #[tabled(rename = "Type")]
    pub type_name: String,
    #[tabled(rename = "Kind")]
    pub kind: &'static str,
    #[tabled(rename = "Attributes")]
    pub attributes: usize,
}

impl TypeRow {
    pub fn resource(type_name: &str, schema: &Schema) -> Self {
        Self {
            type_name: type_name.to_string(),
            kind: "resource",
            attributes: schema.attributes.len(),
        }
    }

    pub fn data_source(type_name: &str, schema: &Schema) -> Self {
        Self {
            type_name: type_name.to_string(),
            kind: "data source",
            attributes: schema.attributes.len(),
        }
    }
}

pub fn types_table(rows: Vec<TypeRow>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn label(attr: &Attribute) -> String {
    let mut flags = vec![attr.type_label()];
    if attr.required {
        flags.push("required".to_string());
    }
    if attr.optional {
        flags.push("optional".to_string());
    }
    if attr.computed {
        flags.push("computed".to_string());
    }
    if attr.sensitive {
        flags.push("sensitive".to_string());
    }
    if attr.force_new {
        flags.push("forces replacement".to_string());
    }
    if attr.deprecated {
        flags.push("deprecated".to_string());
    }
    format!("{} ({})", attr.name, flags.join(", "))
}

fn attribute_tree(attr: &Attribute) -> Tree<String> {
    let leaves = attr
        .nested_attributes()
        .unwrap_or_default()
        .iter()
        .map(attribute_tree);
    Tree::new(label(attr)).with_leaves(leaves)
}

/// Renders a schema's attributes as a tree rooted at the type name.
pub fn schema_tree(type_name: &str, schema: &Schema) -> Tree<String> {
    Tree::new(type_name.to_string()).with_leaves(schema.attributes.iter().map(attribute_tree))
}
