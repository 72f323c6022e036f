//! CLI argument definitions for the `mdr` tool.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use mdr_model::{ConceptKind, LibraryItemStatus, Version};

#[derive(Parser)]
#[command(
    name = "mdr",
    version,
    about = "Clinical metadata repository - manage versioned library items",
    long_about = "Manage versioned library items in a clinical metadata repository.\n\n\
                  Items move through DRAFT, FINAL and RETIRED versions; every \
                  change is kept in the store as an audit trail."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Configuration file (TOML). A missing file means defaults.
    #[arg(long, env = "MDR_CONFIG", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Store file, overriding `[store] path` from the configuration.
    #[arg(long, value_name = "PATH", global = true)]
    pub store: Option<PathBuf>,

    /// Author recorded on every change, overriding `author` from the configuration.
    #[arg(long, env = "MDR_AUTHOR", value_name = "ID", global = true)]
    pub author: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new item from a JSON concept.
    Create(CreateArgs),

    /// Replace the concept of a draft.
    Edit(EditArgs),

    /// Approve a draft, releasing the next major version.
    Approve(TransitionArgs),

    /// Open the next version of a final item.
    NewVersion(NewVersionArgs),

    /// Retire a final item.
    Inactivate(TransitionArgs),

    /// Bring a retired item back to final.
    Reactivate(TransitionArgs),

    /// Delete a draft that was never approved.
    Delete(ItemArgs),

    /// Show one version of an item.
    Show(ShowArgs),

    /// List every version of an item, newest first.
    History(ItemArgs),

    /// List the actions currently available for an item.
    Actions(ItemArgs),

    /// List the latest version of every item of a kind.
    List(ListArgs),

    /// Page through all changes of a kind, newest first.
    Audit(AuditArgs),

    /// Count items per status for every kind.
    Stats,

    /// Manage libraries.
    #[command(subcommand)]
    Library(LibraryCommand),

    /// Manage external reference concepts.
    #[command(subcommand)]
    Reference(ReferenceCommand),
}

#[derive(Args)]
pub struct ItemArgs {
    /// Kind of library item.
    #[arg(value_enum)]
    pub kind: ItemKindArg,

    /// Item uid, e.g. ActivityGroup_000001.
    pub uid: String,
}

#[derive(Args)]
pub struct CreateArgs {
    /// Kind of library item.
    #[arg(value_enum)]
    pub kind: ItemKindArg,

    /// Concept as JSON, or `@path` to read it from a file.
    #[arg(long, value_name = "JSON")]
    pub data: String,

    /// Library the item belongs to.
    #[arg(long, default_value = "Sponsor")]
    pub library: String,
}

#[derive(Args)]
pub struct EditArgs {
    #[command(flatten)]
    pub item: ItemArgs,

    /// Replacement concept as JSON, or `@path`.
    #[arg(long, value_name = "JSON")]
    pub data: String,

    /// Change description recorded with the new version.
    #[arg(long, short = 'm')]
    pub message: String,
}

#[derive(Args)]
pub struct TransitionArgs {
    #[command(flatten)]
    pub item: ItemArgs,

    /// Change description (defaults to a standard label).
    #[arg(long, short = 'm')]
    pub message: Option<String>,
}

#[derive(Args)]
pub struct NewVersionArgs {
    #[command(flatten)]
    pub item: ItemArgs,

    /// Change description (defaults to a standard label).
    #[arg(long, short = 'm')]
    pub message: Option<String>,

    /// Replacement concept as JSON, or `@path`. Requires --message.
    #[arg(long, value_name = "JSON", requires = "message")]
    pub data: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub item: ItemArgs,

    /// Exact version, e.g. 1.0.
    #[arg(long = "item-version", value_name = "MAJOR.MINOR", conflicts_with_all = ["status", "at"])]
    pub item_version: Option<Version>,

    /// Most recent version with this status.
    #[arg(long, conflicts_with = "at")]
    pub status: Option<LibraryItemStatus>,

    /// Version in effect at this RFC 3339 timestamp.
    #[arg(long, value_name = "TIMESTAMP")]
    pub at: Option<DateTime<Utc>>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Kind of library item.
    #[arg(value_enum)]
    pub kind: ItemKindArg,

    /// Only items whose latest version has this status.
    #[arg(long)]
    pub status: Option<LibraryItemStatus>,

    /// Only items in this library.
    #[arg(long)]
    pub library: Option<String>,
}

#[derive(Args)]
pub struct AuditArgs {
    /// Kind of library item.
    #[arg(value_enum)]
    pub kind: ItemKindArg,

    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Entries per page; 0 returns everything.
    #[arg(long = "page-size", default_value_t = 10)]
    pub page_size: usize,

    /// Also report the total number of entries.
    #[arg(long)]
    pub total: bool,
}

#[derive(Subcommand)]
pub enum LibraryCommand {
    /// Register a library, or change its editability.
    Add {
        name: String,

        /// Items in the library cannot be created or changed.
        #[arg(long)]
        locked: bool,
    },

    /// List known libraries.
    List,
}

#[derive(Subcommand)]
pub enum ReferenceCommand {
    /// Register an external concept that library items may point at.
    Add {
        #[arg(value_enum)]
        kind: ReferenceKindArg,

        name: String,
    },

    /// List registered reference concepts.
    List,
}

/// Versioned library item kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ItemKindArg {
    CtTermName,
    ActivityGroup,
    ActivitySubGroup,
    SyntaxTemplate,
    SponsorModel,
}

impl From<ItemKindArg> for ConceptKind {
    fn from(kind: ItemKindArg) -> Self {
        match kind {
            ItemKindArg::CtTermName => ConceptKind::CtTermName,
            ItemKindArg::ActivityGroup => ConceptKind::ActivityGroup,
            ItemKindArg::ActivitySubGroup => ConceptKind::ActivitySubGroup,
            ItemKindArg::SyntaxTemplate => ConceptKind::SyntaxTemplate,
            ItemKindArg::SponsorModel => ConceptKind::SponsorModel,
        }
    }
}

/// Reference concept kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReferenceKindArg {
    CtCodelist,
    TemplateParameter,
    DataModelIg,
}

impl From<ReferenceKindArg> for ConceptKind {
    fn from(kind: ReferenceKindArg) -> Self {
        match kind {
            ReferenceKindArg::CtCodelist => ConceptKind::CtCodelist,
            ReferenceKindArg::TemplateParameter => ConceptKind::TemplateParameter,
            ReferenceKindArg::DataModelIg => ConceptKind::DataModelIg,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
