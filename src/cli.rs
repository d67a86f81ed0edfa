use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "gemctl")]
#[command(version)]
#[command(
    about = "Gemini Enterprise CLI - manage Discovery Engine engines, agents and snapshots",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Clone, Debug, Default)]
pub struct GlobalArgs {
    /// Google Cloud project ID
    #[arg(short, long, global = true, env = "GOOGLE_CLOUD_PROJECT")]
    pub project: Option<String>,

    /// Location for resources (e.g. global, us, eu)
    #[arg(short, long, global = true, env = "AGENTSPACE_LOCATION")]
    pub location: Option<String>,

    /// Collection ID [default: default_collection]
    #[arg(short, long, global = true)]
    pub collection: Option<String>,

    /// Output format [default: table]
    #[arg(short, long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Use Application Default Credentials instead of user credentials
    #[arg(long, global = true)]
    pub use_service_account: bool,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage engines (AI apps)
    #[command(subcommand)]
    Engines(EnginesCommand),

    /// Manage data stores
    #[command(subcommand)]
    DataStores(DataStoresCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Engines
// ============================================================================

#[derive(Subcommand)]
pub enum EnginesCommand {
    /// List all engines in the collection
    List,

    /// Describe an engine
    Describe {
        /// Engine ID or full resource name
        engine: String,

        /// Include the configuration of connected data stores
        #[arg(long)]
        full: bool,
    },

    /// Create a search engine connected to data stores
    Create {
        /// Unique ID for the engine
        engine_id: String,

        /// Display name for the engine
        display_name: String,

        /// Data store IDs to connect
        data_stores: Vec<String>,

        /// Search tier
        #[arg(long, default_value = "SEARCH_TIER_STANDARD")]
        search_tier: String,
    },

    /// Delete an engine
    Delete {
        /// Engine ID or full resource name
        engine: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Manage engine feature flags
    #[command(subcommand)]
    Features(FeaturesCommand),

    /// Manage Dialogflow agents connected to an engine assistant
    #[command(subcommand)]
    Agents(AgentsCommand),

    /// Manage workforce identity for the current project/location
    #[command(subcommand)]
    Workforce(WorkforceCommand),

    /// Manage engine snapshots (export, diff, restore)
    #[command(subcommand)]
    Snapshot(SnapshotCommand),
}

#[derive(Subcommand)]
pub enum FeaturesCommand {
    /// List feature states of an engine
    List {
        /// Engine ID or full resource name
        engine: String,
    },

    /// Enable features (ENGINE FEATURE... or FEATURE... ENGINE)
    Enable {
        /// Engine ID followed by feature names
        #[arg(required = true, num_args = 2..)]
        args: Vec<String>,
    },

    /// Disable features (ENGINE FEATURE... or FEATURE... ENGINE)
    Disable {
        /// Engine ID followed by feature names
        #[arg(required = true, num_args = 2..)]
        args: Vec<String>,
    },
}

// ============================================================================
// Agents
// ============================================================================

/// Dialogflow agent given as a full resource or by its components.
#[derive(Args, Clone, Debug, Default)]
pub struct DialogflowArgs {
    /// Fully qualified Dialogflow agent resource name
    #[arg(long)]
    pub dialogflow_agent: Option<String>,

    /// Dialogflow agent project ID
    #[arg(long = "dialogflow-project-id")]
    pub dialogflow_project: Option<String>,

    /// Dialogflow agent location (e.g. global, us-central1)
    #[arg(long)]
    pub dialogflow_location: Option<String>,

    /// Dialogflow agent ID
    #[arg(long)]
    pub dialogflow_agent_id: Option<String>,
}

impl DialogflowArgs {
    pub fn is_set(&self) -> bool {
        self.dialogflow_agent.is_some()
            || self.dialogflow_project.is_some()
            || self.dialogflow_location.is_some()
            || self.dialogflow_agent_id.is_some()
    }
}

#[derive(Subcommand)]
pub enum AgentsCommand {
    /// List agents registered to an engine
    List {
        /// Engine ID or full resource name
        engine: String,
    },

    /// Describe an agent registration
    Describe {
        /// Engine ID or full resource name
        engine: String,

        /// Agent ID or full resource name
        agent: String,
    },

    /// Register a Dialogflow agent with an engine assistant
    Create(AgentCreateArgs),

    /// Update an existing agent registration
    Update(AgentUpdateArgs),

    /// Delete an agent registration
    Delete {
        /// Engine ID or full resource name
        engine: String,

        /// Agent ID or full resource name
        agent: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Clone, Debug, Default)]
pub struct AgentCreateArgs {
    /// Engine ID or full resource name
    pub engine: String,

    /// Display name for the agent
    #[arg(long)]
    pub display_name: String,

    /// Description of the agent's purpose
    #[arg(long)]
    pub description: String,

    /// Fully qualified reasoning engine resource
    #[arg(long)]
    pub reasoning_engine: String,

    /// Public URI for the agent icon
    #[arg(long)]
    pub icon_uri: Option<String>,

    /// Base64-encoded image content for the agent icon
    #[arg(long)]
    pub icon_content: Option<String>,

    #[command(flatten)]
    pub dialogflow: DialogflowArgs,
}

#[derive(Args, Clone, Debug, Default)]
pub struct AgentUpdateArgs {
    /// Engine ID or full resource name
    pub engine: String,

    /// Agent ID or full resource name
    pub agent: String,

    /// Updated display name
    #[arg(long)]
    pub display_name: Option<String>,

    /// Updated description
    #[arg(long)]
    pub description: Option<String>,

    /// Updated reasoning engine resource
    #[arg(long)]
    pub reasoning_engine: Option<String>,

    /// Updated icon URI
    #[arg(long)]
    pub icon_uri: Option<String>,

    /// Updated icon content (Base64)
    #[arg(long)]
    pub icon_content: Option<String>,

    /// Clear the agent icon
    #[arg(long, conflicts_with_all = ["icon_uri", "icon_content"])]
    pub clear_icon: bool,

    #[command(flatten)]
    pub dialogflow: DialogflowArgs,
}

// ============================================================================
// Workforce identity
// ============================================================================

#[derive(Subcommand)]
pub enum WorkforceCommand {
    /// Show the current workforce identity configuration
    Show,

    /// Configure the workforce identity pool
    Set {
        /// Full workforce pool resource (locations/.../workforcePools/POOL[/providers/PROVIDER])
        #[arg(long, visible_alias = "pool")]
        resource: Option<String>,

        /// Workforce pool ID component
        #[arg(long)]
        workforce_id: Option<String>,

        /// Workforce provider ID component
        #[arg(long = "provider-id")]
        provider_id: Option<String>,

        /// Workforce pool location
        #[arg(long, default_value = "locations/global")]
        workforce_location: String,

        /// Disable workforce identity
        #[arg(long, conflicts_with_all = ["resource", "workforce_id", "provider_id"])]
        clear: bool,
    },
}

// ============================================================================
// Snapshots
// ============================================================================

#[derive(Subcommand)]
pub enum SnapshotCommand {
    /// Capture an engine's configuration, features and agents
    Create {
        /// Engine ID or full resource name
        engine: String,

        /// Path to write the snapshot (default stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Notes stored in the snapshot metadata
        #[arg(long)]
        notes: Option<String>,

        /// Description stored in the snapshot metadata
        #[arg(long)]
        description: Option<String>,
    },

    /// Diff two snapshots, or a snapshot against a live engine
    Diff {
        /// Snapshot file (the current state when two files are given)
        snapshot_a: String,

        /// Second snapshot file (the desired state)
        snapshot_b: Option<String>,

        /// Engine to compare the snapshot against
        #[arg(long, conflicts_with = "snapshot_b")]
        engine: Option<String>,
    },

    /// Restore a snapshot onto an engine
    Restore(RestoreArgs),
}

#[derive(Args, Clone, Debug)]
pub struct RestoreArgs {
    /// Snapshot file
    pub snapshot: String,

    /// Target engine ID (defaults to the engine the snapshot was taken from)
    pub engine: Option<String>,

    /// Target engine ID (takes precedence over the positional argument)
    #[arg(long)]
    pub engine_id: Option<String>,

    /// Create a new engine with this ID (implies --allow-create)
    #[arg(long)]
    pub new_engine_id: Option<String>,

    /// Allow creating the engine if it does not exist
    #[arg(long)]
    pub allow_create: bool,

    /// Update fields of an existing engine
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub update_existing: bool,

    /// Only preview changes
    #[arg(long)]
    pub dry_run: bool,

    /// Apply changes without confirmation
    #[arg(long)]
    pub force: bool,

    /// Override the snapshot notes before restoring
    #[arg(long)]
    pub notes: Option<String>,
}

// ============================================================================
// Data stores
// ============================================================================

#[derive(Subcommand)]
pub enum DataStoresCommand {
    /// List data stores in the collection
    List,

    /// Describe a data store
    Describe {
        /// Data store ID or full resource name
        data_store: String,
    },

    /// Create a data store and import documents from Cloud Storage
    CreateFromGcs {
        /// Unique ID for the data store
        data_store_id: String,

        /// Display name for the data store
        display_name: String,

        /// Cloud Storage URI (e.g. gs://bucket/path/*)
        gcs_uri: String,

        /// Data schema of the imported files
        #[arg(long, default_value = "content", value_parser = ["content", "custom", "csv", "document"])]
        data_schema: String,

        /// Import mode
        #[arg(long, default_value = "INCREMENTAL", value_parser = ["INCREMENTAL", "FULL"])]
        reconciliation_mode: String,
    },

    /// List documents in a data store
    ListDocuments {
        /// Data store ID or full resource name
        data_store: String,

        /// Branch to list
        #[arg(long, default_value = "default_branch")]
        branch: String,
    },

    /// Delete a data store
    Delete {
        /// Data store ID or full resource name
        data_store: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_restore_flags() {
        let cli = Cli::try_parse_from([
            "gemctl",
            "engines",
            "snapshot",
            "restore",
            "snap.json",
            "my-engine",
            "--update-existing=false",
            "--dry-run",
        ])
        .unwrap();
        let Command::Engines(EnginesCommand::Snapshot(SnapshotCommand::Restore(args))) =
            cli.command
        else {
            panic!("expected restore");
        };
        assert_eq!(args.snapshot, "snap.json");
        assert_eq!(args.engine.as_deref(), Some("my-engine"));
        assert!(!args.update_existing);
        assert!(args.dry_run);
        assert!(!args.force);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "gemctl", "engines", "list", "-p", "proj", "-l", "eu", "--format", "yaml", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.global.project.as_deref(), Some("proj"));
        assert_eq!(cli.global.location.as_deref(), Some("eu"));
        assert_eq!(cli.global.format, Some(OutputFormat::Yaml));
        assert_eq!(cli.global.verbose, 2);
    }

    #[test]
    fn test_features_require_engine_and_feature() {
        assert!(Cli::try_parse_from(["gemctl", "engines", "features", "enable", "e"]).is_err());
        assert!(
            Cli::try_parse_from(["gemctl", "engines", "features", "enable", "e", "feedback"])
                .is_ok()
        );
    }

    #[test]
    fn test_data_store_create_from_gcs() {
        let cli = Cli::try_parse_from([
            "gemctl",
            "data-stores",
            "create-from-gcs",
            "docs",
            "Docs",
            "gs://bucket/docs/*",
            "--data-schema",
            "csv",
        ])
        .unwrap();
        let Command::DataStores(DataStoresCommand::CreateFromGcs {
            data_store_id,
            gcs_uri,
            data_schema,
            reconciliation_mode,
            ..
        }) = cli.command
        else {
            panic!("expected create-from-gcs");
        };
        assert_eq!(data_store_id, "docs");
        assert_eq!(gcs_uri, "gs://bucket/docs/*");
        assert_eq!(data_schema, "csv");
        assert_eq!(reconciliation_mode, "INCREMENTAL");

        assert!(
            Cli::try_parse_from([
                "gemctl",
                "data-stores",
                "create-from-gcs",
                "docs",
                "Docs",
                "gs://bucket/docs/*",
                "--reconciliation-mode",
                "MERGE",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_data_store_list_documents_default_branch() {
        let cli =
            Cli::try_parse_from(["gemctl", "data-stores", "list-documents", "docs"]).unwrap();
        let Command::DataStores(DataStoresCommand::ListDocuments { branch, .. }) = cli.command
        else {
            panic!("expected list-documents");
        };
        assert_eq!(branch, "default_branch");
    }

    #[test]
    fn test_workforce_clear_conflicts() {
        assert!(
            Cli::try_parse_from([
                "gemctl", "engines", "workforce", "set", "--clear", "--workforce-id", "x"
            ])
            .is_err()
        );
    }
}
