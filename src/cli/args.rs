use clap::{Parser, Subcommand};

/// Terraform provider for Octopus Deploy.
///
/// Without a subcommand the binary serves the plugin protocol, which is what
/// Terraform expects when it launches the provider.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Serve without the plugin handshake and print TF_REATTACH_PROVIDERS
    /// for attaching Terraform manually.
    #[arg(long, env = "TF_PROVIDER_DEBUG")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List every resource and data source type.
    Resources,
    /// Print the attribute tree of a resource or data source type.
    Schema(SchemaArgs),
}

#[derive(clap::Args, Debug, PartialEq)]
pub struct SchemaArgs {
    /// Type name, e.g. octopusdeploy_environment.
    pub type_name: String,

    /// Look the name up among data sources instead of resources.
    #[arg(long)]
    pub data_source: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serial_test::serial;

    fn with_debug_env<T>(value: Option<&str>, f: impl FnOnce() -> T) -> T {
        let backup = std::env::var("TF_PROVIDER_DEBUG").ok();
        unsafe {
            match value {
                Some(v) => std::env::set_var("TF_PROVIDER_DEBUG", v),
                None => std::env::remove_var("TF_PROVIDER_DEBUG"),
            }
        }

        let result = f();

        unsafe {
            match backup {
                Some(v) => std::env::set_var("TF_PROVIDER_DEBUG", v),
                None => std::env::remove_var("TF_PROVIDER_DEBUG"),
            }
        }
        result
    }

    #[test]
    #[serial]
    fn test_no_arguments_serves() {
        let cli = with_debug_env(None, || Cli::parse_from(["terraform-provider-octopusdeploy"]));
        assert!(!cli.debug);
        assert!(cli.command.is_none());
    }

    #[test]
    #[serial]
    fn test_debug_flag() {
        let cli = with_debug_env(None, || Cli::parse_from(["terraform-provider-octopusdeploy", "--debug"]));
        assert!(cli.debug);
        assert!(cli.command.is_none());
    }

    #[test]
    #[serial]
    fn test_debug_from_env_var_fallback() {
        let cli = with_debug_env(Some("true"), || Cli::parse_from(["terraform-provider-octopusdeploy"]));
        assert!(cli.debug);
    }

    #[test]
    fn test_resources_command() {
        let cli = Cli::parse_from(["terraform-provider-octopusdeploy", "resources"]);
        assert_eq!(cli.command, Some(Command::Resources));
    }

    #[test]
    fn test_schema_command() {
        let cli = Cli::parse_from([
            "terraform-provider-octopusdeploy",
            "schema",
            "octopusdeploy_feeds",
            "--data-source",
        ]);

        if let Some(Command::Schema(args)) = cli.command {
            assert_eq!(args.type_name, "octopusdeploy_feeds");
            assert!(args.data_source);
        } else {
            panic!("Expected Schema command, got {:?}", cli.command);
        }
    }

    #[test]
    fn test_schema_command_requires_type_name() {
        let result = Cli::try_parse_from(["terraform-provider-octopusdeploy", "schema"]);
        assert!(result.is_err());
    }
}
