//! Command results and their table rendering.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde::Serialize;

use mdr_model::{ConceptKind, ItemMetadata, Library, LibraryItemStatus, ObjectAction};
use mdr_repository::{AuditPage, ReferenceRecord, StatusCounts};
use mdr_versioning::{ConceptValue, LibraryItem, VersionSnapshot};

/// Everything a command prints.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Item(ItemView),
    Versions {
        uid: String,
        rows: Vec<VersionRow>,
    },
    Actions {
        uid: String,
        state: String,
        actions: BTreeSet<ObjectAction>,
    },
    Items {
        kind: ConceptKind,
        items: Vec<ItemView>,
    },
    Audit {
        kind: ConceptKind,
        rows: Vec<(String, VersionRow)>,
        total: Option<usize>,
    },
    Counts(Vec<(ConceptKind, StatusCounts)>),
    Libraries(Vec<Library>),
    References(Vec<ReferenceRecord>),
    Message(String),
}

/// One version of an item as shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemView {
    pub kind: ConceptKind,
    pub uid: String,
    pub library: String,
    pub row: VersionRow,
    pub actions: BTreeSet<ObjectAction>,
    pub concept: serde_json::Value,
}

/// Metadata of one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionRow {
    pub name: String,
    pub status: LibraryItemStatus,
    pub version: String,
    pub author: String,
    pub change_description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl VersionRow {
    fn new(name: &str, metadata: &ItemMetadata) -> Self {
        Self {
            name: name.to_string(),
            status: metadata.status(),
            version: metadata.version_string(),
            author: metadata.author_id().to_string(),
            change_description: metadata.change_description().to_string(),
            start_date: metadata.start_date(),
            end_date: metadata.end_date(),
        }
    }

    pub fn from_snapshot<C: ConceptValue>(snapshot: &VersionSnapshot<C>) -> Self {
        Self::new(snapshot.concept.name(), &snapshot.metadata)
    }
}

impl ItemView {
    pub fn from_item<C: ConceptValue + Serialize>(
        item: &LibraryItem<C>,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            kind: C::KIND,
            uid: item.uid().map(ToString::to_string).unwrap_or_default(),
            library: item.library().name.clone(),
            row: VersionRow::new(item.name(), item.metadata()),
            actions: item.possible_actions(),
            concept: serde_json::to_value(item.concept())?,
        })
    }
}

impl Report {
    pub fn audit<C: ConceptValue>(page: &AuditPage<C>) -> Self {
        Self::Audit {
            kind: C::KIND,
            rows: page
                .items
                .iter()
                .map(|entry| (entry.uid.to_string(), VersionRow::from_snapshot(&entry.snapshot)))
                .collect(),
            total: page.total,
        }
    }
}

pub fn print_report(report: &Report, styled: bool) {
    println!("{}", render_report(report, styled));
}

/// Renders `report`. Without `styled` the output carries no ANSI escapes.
pub fn render_report(report: &Report, styled: bool) -> String {
    match report {
        Report::Item(view) => {
            let mut table = item_table(view);
            finish(&mut table, styled);
            table.to_string()
        }
        Report::Versions { uid, rows } => {
            let mut table = versions_table(rows, false);
            finish(&mut table, styled);
            format!("{uid}\n{table}")
        }
        Report::Actions {
            uid,
            state,
            actions,
        } => format!("{uid} ({state}): {}", actions_text(actions)),
        Report::Items { kind, items } => {
            if items.is_empty() {
                return format!("No {} items found.", kind.label());
            }
            let mut table = items_table(items);
            finish(&mut table, styled);
            table.to_string()
        }
        Report::Audit { kind, rows, total } => {
            let mut table = audit_table(rows);
            finish(&mut table, styled);
            match total {
                Some(total) => format!(
                    "{table}\n{} of {total} {} changes",
                    rows.len(),
                    kind.label()
                ),
                None => table.to_string(),
            }
        }
        Report::Counts(counts) => {
            let mut table = counts_table(counts);
            finish(&mut table, styled);
            table.to_string()
        }
        Report::Libraries(libraries) => {
            let mut table = simple_table(vec!["Library", "Editable"]);
            for library in libraries {
                table.add_row(vec![
                    name_cell(&library.name),
                    flag_cell(library.is_editable),
                ]);
            }
            finish(&mut table, styled);
            table.to_string()
        }
        Report::References(references) => {
            let mut table = simple_table(vec!["Kind", "UID", "Name"]);
            for reference in references {
                table.add_row(vec![
                    Cell::new(reference.kind.label()),
                    Cell::new(&reference.uid),
                    Cell::new(&reference.name),
                ]);
            }
            finish(&mut table, styled);
            table.to_string()
        }
        Report::Message(message) => message.clone(),
    }
}

/// Comma separated action names, or `none`.
pub fn actions_text(actions: &BTreeSet<ObjectAction>) -> String {
    if actions.is_empty() {
        return "none".to_string();
    }
    actions
        .iter()
        .map(ObjectAction::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn item_table(view: &ItemView) -> Table {
    let mut table = Table::new();
    apply_detail_table_style(&mut table);
    let concept = serde_json::to_string_pretty(&view.concept).unwrap_or_default();
    let rows = [
        ("Kind", Cell::new(view.kind.label())),
        ("UID", name_cell(&view.uid)),
        ("Name", Cell::new(&view.row.name)),
        ("Library", Cell::new(&view.library)),
        ("Status", status_cell(view.row.status)),
        ("Version", Cell::new(&view.row.version)),
        ("Author", Cell::new(&view.row.author)),
        ("Change", Cell::new(&view.row.change_description)),
        ("Start", Cell::new(format_date(view.row.start_date))),
        ("End", end_cell(view.row.end_date)),
        ("Actions", Cell::new(actions_text(&view.actions))),
        ("Concept", Cell::new(concept)),
    ];
    for (label, value) in rows {
        table.add_row(vec![header_cell(label), value]);
    }
    table
}

fn versions_table(rows: &[VersionRow], with_uid: bool) -> Table {
    let mut headers = Vec::new();
    if with_uid {
        headers.push("UID");
    }
    headers.extend(["Version", "Status", "Name", "Author", "Change", "Start", "End"]);
    let mut table = simple_table(headers);
    let offset = usize::from(with_uid);
    align_column(&mut table, offset, CellAlignment::Right);
    for row in rows {
        table.add_row(version_cells(row));
    }
    table
}

fn version_cells(row: &VersionRow) -> Vec<Cell> {
    vec![
        Cell::new(&row.version),
        status_cell(row.status),
        Cell::new(&row.name),
        Cell::new(&row.author),
        Cell::new(&row.change_description),
        Cell::new(format_date(row.start_date)),
        end_cell(row.end_date),
    ]
}

fn items_table(items: &[ItemView]) -> Table {
    let mut table = simple_table(vec!["UID", "Name", "Library", "Status", "Version", "Actions"]);
    align_column(&mut table, 4, CellAlignment::Right);
    for item in items {
        table.add_row(vec![
            name_cell(&item.uid),
            Cell::new(&item.row.name),
            Cell::new(&item.library),
            status_cell(item.row.status),
            Cell::new(&item.row.version),
            Cell::new(actions_text(&item.actions)),
        ]);
    }
    table
}

fn audit_table(rows: &[(String, VersionRow)]) -> Table {
    let mut table = versions_table(&[], true);
    for (uid, row) in rows {
        let mut cells = vec![name_cell(uid)];
        cells.extend(version_cells(row));
        table.add_row(cells);
    }
    table
}

fn counts_table(counts: &[(ConceptKind, StatusCounts)]) -> Table {
    let mut table = simple_table(vec!["Kind", "Draft", "Final", "Retired", "Total"]);
    for index in 1..=4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let mut total = StatusCounts::default();
    for (kind, count) in counts {
        total.count_draft += count.count_draft;
        total.count_final += count.count_final;
        total.count_retired += count.count_retired;
        table.add_row(vec![
            Cell::new(kind.label()),
            count_cell(count.count_draft, Color::Yellow),
            count_cell(count.count_final, Color::Green),
            count_cell(count.count_retired, Color::DarkGrey),
            Cell::new(count.count_total()),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total.count_draft).add_attribute(Attribute::Bold),
        Cell::new(total.count_final).add_attribute(Attribute::Bold),
        Cell::new(total.count_retired).add_attribute(Attribute::Bold),
        Cell::new(total.count_total()).add_attribute(Attribute::Bold),
    ]);
    table
}

fn simple_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.set_header(headers.into_iter().map(header_cell).collect::<Vec<_>>());
    apply_table_style(&mut table);
    table
}

fn finish(table: &mut Table, styled: bool) {
    if styled {
        table.enforce_styling();
    } else {
        table.force_no_tty();
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn apply_detail_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn name_cell(value: &str) -> Cell {
    Cell::new(value)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn status_cell(status: LibraryItemStatus) -> Cell {
    match status {
        LibraryItemStatus::Draft => Cell::new(status).fg(Color::Yellow),
        LibraryItemStatus::Final => Cell::new(status)
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
        LibraryItemStatus::Retired => dim_cell(status),
    }
}

fn end_cell(end_date: Option<DateTime<Utc>>) -> Cell {
    match end_date {
        Some(date) => Cell::new(format_date(date)),
        None => dim_cell("current"),
    }
}

fn flag_cell(value: bool) -> Cell {
    if value {
        Cell::new("✓")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    } else {
        dim_cell("-")
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
