//! Command execution against a store file.
//!
//! Every command opens the store, runs against its [`Catalog`] and, if it
//! changed anything, writes the store back before returning.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use mdr_concepts::{ActivityGroup, ActivitySubGroup, CtTermName, SponsorModel, SyntaxTemplate};
use mdr_model::{AuthorId, ConceptKind, Library, Uid};
use mdr_repository::{
    Catalog, HasRepository, ItemCache, ItemFilter, LibraryItemRepository, StoreFile,
    VersionSelector, load_store, save_store,
};
use mdr_versioning::{ConceptValue, LibraryItem};

use crate::cli::{
    AuditArgs, Cli, Command, CreateArgs, EditArgs, ItemArgs, ItemKindArg, LibraryCommand,
    ListArgs, NewVersionArgs, ReferenceCommand, ShowArgs, TransitionArgs,
};
use crate::config::MdrConfig;
use crate::summary::{ItemView, Report, VersionRow};

/// Runs `$body` with `$concept` bound to the concept type of `$kind`.
macro_rules! with_concept {
    ($kind:expr, $concept:ident => $body:expr) => {
        match $kind {
            ItemKindArg::CtTermName => {
                type $concept = CtTermName;
                $body
            }
            ItemKindArg::ActivityGroup => {
                type $concept = ActivityGroup;
                $body
            }
            ItemKindArg::ActivitySubGroup => {
                type $concept = ActivitySubGroup;
                $body
            }
            ItemKindArg::SyntaxTemplate => {
                type $concept = SyntaxTemplate;
                $body
            }
            ItemKindArg::SponsorModel => {
                type $concept = SponsorModel;
                $body
            }
        }
    };
}

/// An open store.
pub struct Session {
    store_path: PathBuf,
    author: Option<String>,
    catalog: Catalog,
}

impl Session {
    /// Opens the store named by `store_override` or the configuration.
    ///
    /// A missing store file starts an empty catalog; it is only written once a
    /// command changes something. Libraries from the configuration are added
    /// when the store does not know them yet.
    pub fn open(
        config: &MdrConfig,
        store_override: Option<PathBuf>,
        author: Option<String>,
    ) -> Result<Self> {
        let store_path = store_override.unwrap_or_else(|| config.store.path.clone());
        let mut catalog = if store_path.exists() {
            load_store(&store_path)
                .with_context(|| format!("failed to open store {}", store_path.display()))?
        } else {
            info!(path = %store_path.display(), "store not found, starting empty");
            Catalog::new()
        };
        for library in config.libraries() {
            if catalog.library(&library.name).is_err() {
                catalog.add_library(library);
            }
        }
        let cache_config = config.cache_config();
        if cache_config.enabled {
            catalog = catalog.with_cache(&ItemCache::shared(cache_config));
        }
        Ok(Self {
            store_path,
            author: author.or_else(|| config.author.clone()),
            catalog,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    fn author(&self) -> Result<AuthorId> {
        let Some(author) = self.author.as_deref() else {
            bail!(
                "no author configured: pass --author, set MDR_AUTHOR, or set `author` in the config file"
            );
        };
        Ok(AuthorId::new(author)?)
    }

    fn save(&self) -> Result<()> {
        let mut store = StoreFile::from_catalog(&self.catalog);
        save_store(&mut store, &self.store_path)
            .with_context(|| format!("failed to save store {}", self.store_path.display()))
    }
}

/// Loads the configuration, opens the store and runs the selected command.
pub fn run(cli: &Cli) -> Result<Report> {
    let config = MdrConfig::load(cli.config.as_deref())?;
    let mut session = Session::open(&config, cli.store.clone(), cli.author.clone())?;
    execute(&mut session, &cli.command)
}

pub fn execute(session: &mut Session, command: &Command) -> Result<Report> {
    match command {
        Command::Create(args) => with_concept!(args.kind, C => create::<C>(session, args)),
        Command::Edit(args) => with_concept!(args.item.kind, C => edit::<C>(session, args)),
        Command::Approve(args) => with_concept!(args.item.kind, C => {
            transition::<C>(session, args, Transition::Approve)
        }),
        Command::NewVersion(args) => {
            with_concept!(args.item.kind, C => new_version::<C>(session, args))
        }
        Command::Inactivate(args) => with_concept!(args.item.kind, C => {
            transition::<C>(session, args, Transition::Inactivate)
        }),
        Command::Reactivate(args) => with_concept!(args.item.kind, C => {
            transition::<C>(session, args, Transition::Reactivate)
        }),
        Command::Delete(args) => with_concept!(args.kind, C => delete::<C>(session, args)),
        Command::Show(args) => with_concept!(args.item.kind, C => show::<C>(session, args)),
        Command::History(args) => with_concept!(args.kind, C => history::<C>(session, args)),
        Command::Actions(args) => with_concept!(args.kind, C => actions::<C>(session, args)),
        Command::List(args) => with_concept!(args.kind, C => list::<C>(session, args)),
        Command::Audit(args) => with_concept!(args.kind, C => audit::<C>(session, args)),
        Command::Stats => Ok(Report::Counts(session.catalog.status_counts())),
        Command::Library(LibraryCommand::Add { name, locked }) => {
            session
                .catalog
                .add_library(Library::from_repository_values(name.trim(), !locked));
            session.save()?;
            Ok(Report::Libraries(session.catalog.libraries().cloned().collect()))
        }
        Command::Library(LibraryCommand::List) => {
            Ok(Report::Libraries(session.catalog.libraries().cloned().collect()))
        }
        Command::Reference(ReferenceCommand::Add { kind, name }) => {
            let kind = ConceptKind::from(*kind);
            let uid = session.catalog.add_reference(kind, name)?;
            session.save()?;
            Ok(Report::Message(format!("Registered {} {uid}", kind.label())))
        }
        Command::Reference(ReferenceCommand::List) => {
            Ok(Report::References(session.catalog.references().to_vec()))
        }
    }
}

#[derive(Clone, Copy)]
enum Transition {
    Approve,
    Inactivate,
    Reactivate,
}

fn create<C>(session: &mut Session, args: &CreateArgs) -> Result<Report>
where
    C: ConceptValue + Serialize + DeserializeOwned,
    Catalog: HasRepository<C>,
{
    let concept = read_concept::<C>(&args.data)?;
    let author = session.author()?;
    let item = session.catalog.create(author, concept, &args.library)?;
    session.save()?;
    item_report(&item)
}

fn edit<C>(session: &mut Session, args: &EditArgs) -> Result<Report>
where
    C: ConceptValue + Serialize + DeserializeOwned,
    Catalog: HasRepository<C>,
{
    let uid = parse_uid(&args.item)?;
    let concept = read_concept::<C>(&args.data)?;
    let author = session.author()?;
    let (item, changed) = session.catalog.update::<C, _, _>(&uid, |item, resolver| {
        item.edit_draft(author, &args.message, concept, resolver)
    })?;
    if !changed {
        return Ok(Report::Message(format!(
            "{uid} unchanged at {}",
            item.state()
        )));
    }
    session.save()?;
    item_report(&item)
}

fn transition<C>(
    session: &mut Session,
    args: &TransitionArgs,
    transition: Transition,
) -> Result<Report>
where
    C: ConceptValue + Serialize,
    Catalog: HasRepository<C>,
{
    let uid = parse_uid(&args.item)?;
    let author = session.author()?;
    let message = args.message.as_deref();
    let (item, ()) = session
        .catalog
        .update::<C, _, _>(&uid, |item, _| match transition {
            Transition::Approve => item.approve(author, message),
            Transition::Inactivate => item.inactivate(author, message),
            Transition::Reactivate => item.reactivate(author, message),
        })?;
    session.save()?;
    item_report(&item)
}

fn new_version<C>(session: &mut Session, args: &NewVersionArgs) -> Result<Report>
where
    C: ConceptValue + Serialize + DeserializeOwned,
    Catalog: HasRepository<C>,
{
    let uid = parse_uid(&args.item)?;
    let author = session.author()?;
    let concept = args
        .data
        .as_deref()
        .map(read_concept::<C>)
        .transpose()?;
    let message = args.message.as_deref();
    let (item, ()) = session
        .catalog
        .update::<C, _, _>(&uid, |item, resolver| match concept {
            Some(concept) => {
                let message = message.unwrap_or_default();
                item.create_new_version_with(author, message, concept, resolver)
            }
            None => item.create_new_version(author, message),
        })?;
    session.save()?;
    item_report(&item)
}

fn delete<C>(session: &mut Session, args: &ItemArgs) -> Result<Report>
where
    C: ConceptValue,
    Catalog: HasRepository<C>,
{
    let uid = parse_uid(args)?;
    session
        .catalog
        .update::<C, _, _>(&uid, |item, _| item.soft_delete())?;
    session.save()?;
    Ok(Report::Message(format!("Deleted {} {uid}", C::KIND.label())))
}

fn show<C>(session: &Session, args: &ShowArgs) -> Result<Report>
where
    C: ConceptValue + Serialize,
    Catalog: HasRepository<C>,
{
    let uid = parse_uid(&args.item)?;
    let selector = match (args.item_version, args.status, args.at) {
        (Some(version), _, _) => VersionSelector::Version(version),
        (None, Some(status), _) => VersionSelector::LatestWithStatus(status),
        (None, None, Some(at)) => VersionSelector::AtDate(at),
        (None, None, None) => VersionSelector::Latest,
    };
    let item = session.catalog.items::<C>().find_by_uid(&uid, selector)?;
    item_report(&item)
}

fn history<C>(session: &Session, args: &ItemArgs) -> Result<Report>
where
    C: ConceptValue,
    Catalog: HasRepository<C>,
{
    let uid = parse_uid(args)?;
    let versions = session.catalog.items::<C>().get_all_versions(&uid)?;
    Ok(Report::Versions {
        uid: uid.to_string(),
        rows: versions.iter().map(VersionRow::from_snapshot).collect(),
    })
}

fn actions<C>(session: &Session, args: &ItemArgs) -> Result<Report>
where
    C: ConceptValue,
    Catalog: HasRepository<C>,
{
    let uid = parse_uid(args)?;
    let item = session
        .catalog
        .items::<C>()
        .find_by_uid(&uid, VersionSelector::Latest)?;
    Ok(Report::Actions {
        uid: uid.to_string(),
        state: item.state().to_string(),
        actions: item.possible_actions(),
    })
}

fn list<C>(session: &Session, args: &ListArgs) -> Result<Report>
where
    C: ConceptValue + Serialize,
    Catalog: HasRepository<C>,
{
    let mut filter = ItemFilter::default();
    if let Some(status) = args.status {
        filter = filter.with_status(status);
    }
    if let Some(library) = &args.library {
        filter = filter.with_library(library.as_str());
    }
    let items = session
        .catalog
        .items::<C>()
        .find_all(&filter)
        .iter()
        .map(ItemView::from_item)
        .collect::<serde_json::Result<Vec<_>>>()?;
    Ok(Report::Items {
        kind: C::KIND,
        items,
    })
}

fn audit<C>(session: &Session, args: &AuditArgs) -> Result<Report>
where
    C: ConceptValue,
    Catalog: HasRepository<C>,
{
    let page = session
        .catalog
        .items::<C>()
        .retrieve_audit_trail(args.page, args.page_size, args.total);
    Ok(Report::audit(&page))
}

fn item_report<C: ConceptValue + Serialize>(item: &LibraryItem<C>) -> Result<Report> {
    Ok(Report::Item(ItemView::from_item(item)?))
}

fn parse_uid(args: &ItemArgs) -> Result<Uid> {
    Ok(Uid::new(args.uid.trim())?)
}

/// Parses a concept from inline JSON or from `@path`.
fn read_concept<C: ConceptValue + DeserializeOwned>(data: &str) -> Result<C> {
    let label = C::KIND.label();
    let json = match data.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {label} from {path}"))?,
        None => data.to_string(),
    };
    serde_json::from_str(&json).with_context(|| format!("invalid {label} JSON"))
}
