//! Ordo CLI — scoped ordering engine for todo boards.
//!
//! Usage:
//!   ordo project <subcommand> [--db path]
//!   ordo category <subcommand> [--db path]
//!   ordo item <subcommand> [--db path]

use clap::{Parser, Subcommand};
use ordo::{CategoryId, ItemId, OrderRecord, ProjectId, SqliteStore};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ordo",
    version,
    about = "Linked-list ordered todo boards on SQLite"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage projects
    Project {
        #[command(subcommand)]
        action: ProjectAction,
        /// Path to SQLite database file
        #[arg(long, global = true)]
        db: Option<PathBuf>,
    },
    /// Manage categories on a project board
    Category {
        #[command(subcommand)]
        action: CategoryAction,
        /// Path to SQLite database file
        #[arg(long, global = true)]
        db: Option<PathBuf>,
    },
    /// Manage todo items within a category
    Item {
        #[command(subcommand)]
        action: ItemAction,
        /// Path to SQLite database file
        #[arg(long, global = true)]
        db: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ProjectAction {
    /// Create a new project
    Create {
        /// Title for the new project
        title: String,
    },
    /// List all projects
    List,
    /// Delete a project and any categories attached only to it
    Delete {
        /// Id of the project to delete
        id: i64,
    },
}

#[derive(Subcommand)]
enum CategoryAction {
    /// Create a category at the tail of a project's board
    Create {
        /// Id of the project
        project: i64,
        /// Title for the new category
        title: String,
        /// Optional description
        #[arg(long)]
        description: Option<String>,
    },
    /// Update a category's title or description
    Update {
        /// Id of the category
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        /// Reset the description to empty
        #[arg(long)]
        clear_description: bool,
    },
    /// Attach an existing category to the head of another project's board
    Attach {
        /// Id of the category
        category: i64,
        /// Id of the project to attach to
        project: i64,
    },
    /// Detach a category from a project (deletes it if attached nowhere else)
    Detach {
        /// Id of the category
        category: i64,
        /// Id of the project to detach from
        project: i64,
    },
    /// Move a category between two neighbors on a board
    Move {
        /// Id of the project whose board to reorder
        project: i64,
        /// Id of the category to move
        category: i64,
        /// New left neighbor (omit to place at the head)
        #[arg(long)]
        left: Option<i64>,
        /// New right neighbor (omit to place at the tail)
        #[arg(long)]
        right: Option<i64>,
    },
    /// List a project's categories in board order
    List {
        /// Id of the project
        project: i64,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ItemAction {
    /// Add a todo item to a category
    Add {
        /// Id of the category
        category: i64,
        /// Title for the new item
        title: String,
        /// Optional description
        #[arg(long)]
        description: Option<String>,
    },
    /// Mark an item done
    Done {
        /// Id of the item
        id: i64,
        /// Mark as not done instead
        #[arg(long)]
        undo: bool,
    },
    /// Update an item's title or description
    Update {
        /// Id of the item
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        /// Reset the description to empty
        #[arg(long)]
        clear_description: bool,
    },
    /// Move an item between two neighbors in its category
    Move {
        /// Id of the category
        category: i64,
        /// Id of the item to move
        item: i64,
        /// New left neighbor (omit to place at the head)
        #[arg(long)]
        left: Option<i64>,
        /// New right neighbor (omit to place at the tail)
        #[arg(long)]
        right: Option<i64>,
    },
    /// Move an item to the tail of another category
    MoveTo {
        /// Id of the item
        item: i64,
        /// Id of the destination category
        category: i64,
    },
    /// Delete an item
    Delete {
        /// Id of the item
        id: i64,
    },
    /// List a category's items in display order
    List {
        /// Id of the category
        category: i64,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// Get the default database path (~/.local/share/ordo/ordo.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    let ordo_dir = data_dir.join("ordo");
    std::fs::create_dir_all(&ordo_dir).ok();
    ordo_dir.join("ordo.db")
}

fn open_store(db: Option<PathBuf>) -> Result<SqliteStore, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    SqliteStore::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))
}

/// Fold `--description`/`--clear-description` into the store's update shape
fn description_update(description: Option<&str>, clear: bool) -> Option<Option<&str>> {
    if clear {
        Some(None)
    } else {
        description.map(Some)
    }
}

/// Arrange entries by their neighbor pointers
///
/// Takes `(id, value, record)` rows in the store's stable arbitrary order and
/// repositions each recorded entry next to its named neighbor, repeating
/// until no entry moves. Entries without a record keep their relative base
/// order. Bounded passes, so a pointer cycle that slipped past the engine
/// degrades to the base order instead of hanging.
fn sequence<T>(mut entries: Vec<(i64, T, Option<OrderRecord>)>) -> Vec<(i64, T)> {
    let passes = entries.len() + 1;
    for _ in 0..passes {
        let mut moved = false;
        for idx in 0..entries.len() {
            let Some(record) = entries[idx].2 else {
                continue;
            };
            let desired = if let Some(left) = record.left_id {
                entries.iter().position(|(id, _, _)| *id == left).map(|p| {
                    // Removal below shifts everything after `idx` down one.
                    if p < idx {
                        p + 1
                    } else {
                        p
                    }
                })
            } else if let Some(right) = record.right_id {
                entries
                    .iter()
                    .position(|(id, _, _)| *id == right)
                    .map(|p| if p < idx { p } else { p - 1 })
            } else {
                None
            };
            if let Some(desired) = desired {
                if desired != idx {
                    let entry = entries.remove(idx);
                    entries.insert(desired, entry);
                    moved = true;
                }
            }
        }
        if !moved {
            break;
        }
    }
    entries.into_iter().map(|(id, value, _)| (id, value)).collect()
}

fn cmd_project_create(store: &SqliteStore, title: &str) -> i32 {
    match store.create_project(title) {
        Ok(project) => {
            println!("Created project '{}' ({})", project.title, project.id);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_project_list(store: &SqliteStore) -> i32 {
    let projects = match store.list_projects() {
        Ok(projects) => projects,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    if projects.is_empty() {
        println!("No projects defined.");
        return 0;
    }
    println!("{:>6}  {:<32}  {}", "ID", "TITLE", "CREATED");
    println!("{}", "-".repeat(64));
    for project in projects {
        println!(
            "{:>6}  {:<32}  {}",
            project.id,
            project.title,
            project.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    0
}

fn cmd_project_delete(store: &SqliteStore, id: i64) -> i32 {
    match store.delete_project(ProjectId::new(id)) {
        Ok(true) => {
            println!("Deleted project {}", id);
            0
        }
        Ok(false) => {
            eprintln!("Error: project {} not found", id);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_category_create(
    store: &SqliteStore,
    project: i64,
    title: &str,
    description: Option<&str>,
) -> i32 {
    match store.create_category(ProjectId::new(project), title, description) {
        Ok(category) => {
            println!("Created category '{}' ({})", category.title, category.id);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_category_update(
    store: &SqliteStore,
    id: i64,
    title: Option<&str>,
    description: Option<Option<&str>>,
) -> i32 {
    match store.update_category(CategoryId::new(id), title, description) {
        Ok(category) => {
            println!("Updated category '{}' ({})", category.title, category.id);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_category_attach(store: &SqliteStore, category: i64, project: i64) -> i32 {
    match store.attach_category(CategoryId::new(category), ProjectId::new(project)) {
        Ok(()) => {
            println!("Attached category {} to project {}", category, project);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_category_detach(store: &SqliteStore, category: i64, project: i64) -> i32 {
    match store.detach_category(CategoryId::new(category), ProjectId::new(project)) {
        Ok(true) => {
            println!(
                "Detached category {} from project {} (deleted: no other projects)",
                category, project
            );
            0
        }
        Ok(false) => {
            println!("Detached category {} from project {}", category, project);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_category_move(
    store: &SqliteStore,
    project: i64,
    category: i64,
    left: Option<i64>,
    right: Option<i64>,
) -> i32 {
    match store.move_category(
        ProjectId::new(project),
        CategoryId::new(category),
        left.map(CategoryId::new),
        right.map(CategoryId::new),
    ) {
        Ok(()) => {
            println!("Moved category {}", category);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_category_list(store: &SqliteStore, project: i64, json: bool) -> i32 {
    let categories = match store.list_categories(ProjectId::new(project)) {
        Ok(categories) => categories,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let entries: Vec<_> = categories
        .into_iter()
        .map(|(category, record)| (category.id.get(), category, record))
        .collect();
    let ordered = sequence(entries);

    if json {
        let values: Vec<_> = ordered.iter().map(|(_, c)| c).collect();
        match serde_json::to_string_pretty(&values) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
        return 0;
    }
    if ordered.is_empty() {
        println!("No categories on project {}.", project);
        return 0;
    }
    println!("{:>6}  {:<32}  {}", "ID", "TITLE", "DESCRIPTION");
    println!("{}", "-".repeat(72));
    for (_, category) in ordered {
        println!(
            "{:>6}  {:<32}  {}",
            category.id,
            category.title,
            category.description.as_deref().unwrap_or("")
        );
    }
    0
}

fn cmd_item_add(
    store: &SqliteStore,
    category: i64,
    title: &str,
    description: Option<&str>,
) -> i32 {
    match store.create_item(CategoryId::new(category), title, description) {
        Ok(item) => {
            println!("Added item '{}' ({})", item.title, item.id);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_item_done(store: &SqliteStore, id: i64, undo: bool) -> i32 {
    match store.set_item_done(ItemId::new(id), !undo) {
        Ok(()) => {
            println!(
                "Marked item {} {}",
                id,
                if undo { "not done" } else { "done" }
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_item_update(
    store: &SqliteStore,
    id: i64,
    title: Option<&str>,
    description: Option<Option<&str>>,
) -> i32 {
    match store.update_item(ItemId::new(id), title, description) {
        Ok(item) => {
            println!("Updated item '{}' ({})", item.title, item.id);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_item_move(
    store: &SqliteStore,
    category: i64,
    item: i64,
    left: Option<i64>,
    right: Option<i64>,
) -> i32 {
    match store.move_item(
        CategoryId::new(category),
        ItemId::new(item),
        left.map(ItemId::new),
        right.map(ItemId::new),
    ) {
        Ok(()) => {
            println!("Moved item {}", item);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_item_move_to(store: &SqliteStore, item: i64, category: i64) -> i32 {
    match store.move_item_to_category(ItemId::new(item), CategoryId::new(category)) {
        Ok(moved) => {
            println!("Moved item {} to category {}", moved.id, moved.category_id);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_item_delete(store: &SqliteStore, id: i64) -> i32 {
    match store.delete_item(ItemId::new(id)) {
        Ok(true) => {
            println!("Deleted item {}", id);
            0
        }
        Ok(false) => {
            eprintln!("Error: item {} not found", id);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_item_list(store: &SqliteStore, category: i64, json: bool) -> i32 {
    let items = match store.list_items(CategoryId::new(category)) {
        Ok(items) => items,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let entries: Vec<_> = items
        .into_iter()
        .map(|(item, record)| (item.id.get(), item, record))
        .collect();
    let ordered = sequence(entries);

    if json {
        let values: Vec<_> = ordered.iter().map(|(_, i)| i).collect();
        match serde_json::to_string_pretty(&values) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
        return 0;
    }
    if ordered.is_empty() {
        println!("No items in category {}.", category);
        return 0;
    }
    for (_, item) in ordered {
        println!(
            "[{}] {:>6}  {}",
            if item.is_done { "x" } else { " " },
            item.id,
            item.title
        );
    }
    0
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Project { action, db } => {
            let store = match open_store(db) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            match action {
                ProjectAction::Create { title } => cmd_project_create(&store, &title),
                ProjectAction::List => cmd_project_list(&store),
                ProjectAction::Delete { id } => cmd_project_delete(&store, id),
            }
        }
        Commands::Category { action, db } => {
            let store = match open_store(db) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            match action {
                CategoryAction::Create {
                    project,
                    title,
                    description,
                } => cmd_category_create(&store, project, &title, description.as_deref()),
                CategoryAction::Update {
                    id,
                    title,
                    description,
                    clear_description,
                } => cmd_category_update(
                    &store,
                    id,
                    title.as_deref(),
                    description_update(description.as_deref(), clear_description),
                ),
                CategoryAction::Attach { category, project } => {
                    cmd_category_attach(&store, category, project)
                }
                CategoryAction::Detach { category, project } => {
                    cmd_category_detach(&store, category, project)
                }
                CategoryAction::Move {
                    project,
                    category,
                    left,
                    right,
                } => cmd_category_move(&store, project, category, left, right),
                CategoryAction::List { project, json } => {
                    cmd_category_list(&store, project, json)
                }
            }
        }
        Commands::Item { action, db } => {
            let store = match open_store(db) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            match action {
                ItemAction::Add {
                    category,
                    title,
                    description,
                } => cmd_item_add(&store, category, &title, description.as_deref()),
                ItemAction::Done { id, undo } => cmd_item_done(&store, id, undo),
                ItemAction::Update {
                    id,
                    title,
                    description,
                    clear_description,
                } => cmd_item_update(
                    &store,
                    id,
                    title.as_deref(),
                    description_update(description.as_deref(), clear_description),
                ),
                ItemAction::Move {
                    category,
                    item,
                    left,
                    right,
                } => cmd_item_move(&store, category, item, left, right),
                ItemAction::MoveTo { item, category } => cmd_item_move_to(&store, item, category),
                ItemAction::Delete { id } => cmd_item_delete(&store, id),
                ItemAction::List { category, json } => cmd_item_list(&store, category, json),
            }
        }
    };
    std::process::exit(code);
}
