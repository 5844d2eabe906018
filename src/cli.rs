mod args;

pub use args::{Cli, Command, SchemaArgs};

use crate::data_sources;
use crate::error::PluginError;
use crate::output::{self, TypeRow};
use crate::resources;

/// Table of every type the provider serves, resources first.
pub fn list_types() -> String {
    let resources = resources::all()
        .into_iter()
        .map(|r| TypeRow::resource(r.type_name(), &r.schema()));
    let data_sources = data_sources::all()
        .into_iter()
        .map(|d| TypeRow::data_source(d.type_name(), &d.schema()));
    output::types_table(resources.chain(data_sources).collect())
}

pub fn describe(args: &SchemaArgs) -> Result<String, PluginError> {
    let schema = if args.data_source {
        data_sources::find(&args.type_name)?.schema()
    } else {
        resources::find(&args.type_name)?.schema()
    };
    Ok(output::schema_tree(&args.type_name, &schema).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_types_includes_both_kinds() {
        let table = list_types();
        assert!(table.contains("octopusdeploy_project_group"));
        assert!(table.contains("octopusdeploy_project_groups"));
        assert!(table.contains("data source"));
    }

    #[test]
    fn test_describe_resource() {
        let tree = describe(&SchemaArgs {
            type_name: "octopusdeploy_environment".to_string(),
            data_source: false,
        })
        .unwrap();
        assert!(tree.starts_with("octopusdeploy_environment\n"));
        assert!(tree.contains("name (string, required)"));
    }

    #[test]
    fn test_describe_unknown_type() {
        let err = describe(&SchemaArgs {
            type_name: "octopusdeploy_environment".to_string(),
            data_source: true,
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "unknown data source type: octopusdeploy_environment");
    }
}
