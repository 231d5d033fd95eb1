use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "entree",
    bin_name = "entree",
    version,
    disable_help_subcommand = true
)]
#[command(about = "Edit entity/attribute hierarchies stored as JSON", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Data file to operate on (overrides entree.toml)
    #[arg(short, long, global = true, value_name = "PATH", help_heading = "Options")]
    pub file: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the hierarchy as a tree
    #[command(alias = "ls", display_order = 1)]
    List {
        /// Only entities owned by this system (All, Both, EAM, iPen, GIS-WN)
        #[arg(short, long)]
        system: Option<String>,

        /// Only entities matching this term
        #[arg(short = 'q', long)]
        search: Option<String>,
    },

    /// Search entities and their attributes
    #[command(display_order = 2)]
    Search { query: String },

    /// Show one entity with its attributes
    #[command(alias = "v", display_order = 3)]
    Show { id: i64 },

    /// Add an entity, optionally under a parent
    #[command(alias = "n", display_order = 10)]
    Add {
        /// Parent entity id
        #[arg(long, short = 'p')]
        parent: Option<i64>,

        /// Entity name (defaults to "New Entity")
        #[arg(long)]
        name: Option<String>,

        /// Owning system
        #[arg(long)]
        system: Option<String>,
    },

    /// Copy an entity (attributes included, children not)
    #[command(alias = "cp", display_order = 11)]
    Copy { id: i64 },

    /// Delete an entity and everything below it
    #[command(alias = "rm", display_order = 12)]
    Delete {
        id: i64,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Change fields of an entity, or move it
    #[command(alias = "e", display_order = 13)]
    Update {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        /// New description (empty clears it)
        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        system: Option<String>,

        /// New entity type (empty clears it)
        #[arg(long = "type")]
        entity_type: Option<String>,

        /// Move under this parent
        #[arg(long, conflicts_with = "root")]
        parent: Option<i64>,

        /// Move to the top level
        #[arg(long)]
        root: bool,
    },

    /// Attribute commands
    #[command(subcommand, display_order = 20)]
    Attr(AttrCommands),

    /// Check tree consistency
    #[command(display_order = 30)]
    Check {
        /// Repair derived fields (child lists, levels, attribute owners)
        #[arg(long)]
        fix: bool,
    },

    /// Replace the data file with a JSON document
    #[command(display_order = 31)]
    Import { path: PathBuf },

    /// Write the hierarchy as an export document
    #[command(display_order = 32)]
    Export {
        /// Directory to write into (defaults to the working directory)
        #[arg(long, short = 'o', value_name = "DIR")]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum AttrCommands {
    /// Add an attribute to an entity
    Add {
        entity: i64,

        /// Attribute name (defaults to "New Attribute")
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Mark as primary key
        #[arg(long)]
        primary_key: bool,

        /// Owning system (defaults to the entity's)
        #[arg(long)]
        system: Option<String>,
    },

    /// Copy an attribute within its entity
    Copy { entity: i64, attribute: i64 },

    /// Remove an attribute
    #[command(alias = "rm")]
    Delete { entity: i64, attribute: i64 },

    /// Change fields of an attribute
    Update {
        entity: i64,
        attribute: i64,

        #[arg(long)]
        name: Option<String>,

        /// New description (empty clears it)
        #[arg(long)]
        description: Option<String>,

        /// Yes or No
        #[arg(long, value_name = "YES|NO")]
        primary_key: Option<String>,

        #[arg(long)]
        system: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_move_to_root() {
        let cli = Cli::try_parse_from(["entree", "update", "4", "--root"]).unwrap();
        match cli.command {
            Some(Commands::Update { id, root, parent, .. }) => {
                assert_eq!(id, 4);
                assert!(root);
                assert!(parent.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parent_and_root_conflict() {
        let result = Cli::try_parse_from(["entree", "update", "4", "--root", "--parent", "1"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_file_after_subcommand() {
        let cli = Cli::try_parse_from(["entree", "list", "--file", "model.json"]).unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("model.json")));
    }
}
